//! Read-only selectors over the Temporal State Model.
//!
//! Pure lookups shared by command creators: slot resolution through
//! module/adapter nesting, next-tip search, and effective volume
//! limits for a pipette+tiprack pairing.

use stepgen_types::{
    ChannelCount, DeckLocation, EntityCatalog, LabwareId, ModuleId, ModuleState, NozzleLayout,
    PipetteId, RobotState, WellName, COLUMN_4_SLOTS,
};
use tracing::warn;

/// Resolves the deck slot a labware ultimately occupies, looking
/// through module and adapter nesting. `None` when off-deck or when
/// the chain is broken.
#[must_use]
pub fn labware_slot(labware: &LabwareId, state: &RobotState) -> Option<String> {
    let mut location = state.labware.get(labware)?;
    // nesting is at most labware-on-adapter-on-module in practice;
    // bail after a few hops to stay total on malformed state
    for _ in 0..4 {
        match location {
            DeckLocation::Slot(name) => return Some(name.clone()),
            DeckLocation::OffDeck | DeckLocation::WasteChute => return None,
            DeckLocation::Module(module) => {
                return state.modules.get(module).map(|m| m.slot.clone());
            }
            DeckLocation::Labware(adapter) => {
                location = state.labware.get(adapter)?;
            }
        }
    }
    None
}

/// Returns `true` when the labware's resolved slot is a column 4
/// staging slot (either directly or through an adapter).
#[must_use]
pub fn is_in_column_4(labware: &LabwareId, state: &RobotState) -> bool {
    labware_slot(labware, state)
        .is_some_and(|slot| COLUMN_4_SLOTS.contains(&slot.as_str()))
}

/// Labware ids sorted by their occupied slot, column 4 last.
///
/// Determines tiprack consumption order.
#[must_use]
pub fn sort_labware_by_slot(state: &RobotState) -> Vec<LabwareId> {
    let mut ids: Vec<LabwareId> = state.labware.keys().cloned().collect();
    ids.sort_by(|a, b| {
        let slot_a = labware_slot(a, state).unwrap_or_default();
        let slot_b = labware_slot(b, state).unwrap_or_default();
        let a4 = COLUMN_4_SLOTS.contains(&slot_a.as_str());
        let b4 = COLUMN_4_SLOTS.contains(&slot_b.as_str());
        match (a4, b4) {
            (true, true) => a.cmp(b),
            (true, false) => std::cmp::Ordering::Greater,
            (false, true) => std::cmp::Ordering::Less,
            (false, false) => slot_a.cmp(&slot_b).then_with(|| a.cmp(b)),
        }
    });
    ids
}

/// Well name of the next available tip in one tiprack, or `None`.
///
/// Single-channel takes the first free well in ordering; 8-channel
/// (and a 96 in column layout) needs a full free column and returns
/// its top well; a 96 in full layout needs the whole rack.
#[must_use]
pub fn next_tip(
    pipette: &PipetteId,
    tiprack: &LabwareId,
    catalog: &EntityCatalog,
    state: &RobotState,
    nozzles: Option<NozzleLayout>,
) -> Option<WellName> {
    let spec = catalog.pipette(pipette)?;
    let def = catalog.labware_def(tiprack)?;
    let rack_state = state.tip_state.tipracks.get(tiprack)?;
    let has_tip = |well: &WellName| rack_state.get(well).copied().unwrap_or(false);

    match (spec.channels, nozzles) {
        (ChannelCount::Single, _) => def.ordered_wells().into_iter().find(|w| has_tip(w)),
        (ChannelCount::Eight, _) | (ChannelCount::NinetySix, Some(NozzleLayout::Column)) => def
            .ordering
            .iter()
            .find(|col| col.iter().all(|w| has_tip(w)))
            .and_then(|col| col.first().cloned()),
        (ChannelCount::NinetySix, _) => {
            let wells = def.ordered_wells();
            wells
                .iter()
                .all(|w| has_tip(w))
                .then(|| wells.first().cloned())
                .flatten()
        }
    }
}

/// First slot-ordered tiprack of the requested model that still has a
/// usable tip for this pipette, with the well to pick from.
#[must_use]
pub fn next_tiprack(
    pipette: &PipetteId,
    tip_rack_uri: &str,
    catalog: &EntityCatalog,
    state: &RobotState,
    nozzles: Option<NozzleLayout>,
) -> Option<(LabwareId, WellName)> {
    let candidates = sort_labware_by_slot(state).into_iter().filter(|id| {
        let on_deck = state
            .labware
            .get(id)
            .is_some_and(|loc| !loc.is_off_deck());
        let matches_model = catalog
            .labware_def(id)
            .is_some_and(|def| def.is_tiprack() && def.uri == tip_rack_uri);
        on_deck && matches_model
    });
    for tiprack in candidates {
        if let Some(well) = next_tip(pipette, &tiprack, catalog, state, nozzles) {
            return Some((tiprack, well));
        }
    }
    None
}

/// Effective per-tip maximum for a pipette loaded from the given
/// tiprack model: the lesser of pipette capacity and rated tip volume.
#[must_use]
pub fn pipette_with_tip_max_volume(
    pipette: &PipetteId,
    catalog: &EntityCatalog,
    tip_rack_uri: &str,
) -> Option<f64> {
    let spec = catalog.pipette(pipette)?;
    let tip_volume = spec.tip_volume_for(tip_rack_uri).or_else(|| {
        // fall back to the first compatible rack rather than refusing
        // to compute a limit for an unknown URI
        spec.compatible_tipracks.first().map(|t| t.tip_volume)
    })?;
    Some(tip_volume.min(spec.max_volume))
}

/// Number of active channels given the current nozzle layout.
#[must_use]
pub fn active_channels(spec_channels: ChannelCount, nozzles: Option<NozzleLayout>) -> usize {
    match (spec_channels, nozzles) {
        (ChannelCount::NinetySix, Some(NozzleLayout::Column)) => 8,
        (c, _) => c.count(),
    }
}

/// Thermocycler operating state of a module, or `None` when the id is
/// absent or names a different module type.
#[must_use]
pub fn thermocycler_state<'a>(
    state: &'a RobotState,
    module: &ModuleId,
) -> Option<&'a ModuleState> {
    match state.module_state(module) {
        Some(tc @ ModuleState::Thermocycler { .. }) => Some(tc),
        Some(_) => {
            warn!(module = %module, "module is not a thermocycler");
            None
        }
        None => None,
    }
}

#[cfg(test)]
mod tests {
    use crate::fixtures::*;
    use super::*;
    use stepgen_types::WellName;

    #[test]
    fn labware_slot_resolves_through_module() {
        let (_catalog, state) = context_with_thermocycler();
        assert_eq!(
            labware_slot(&LabwareId::new(TC_PLATE), &state).as_deref(),
            Some("B1")
        );
    }

    #[test]
    fn single_channel_next_tip_walks_ordering() {
        let (catalog, mut state) = standard_context();
        let rack = LabwareId::new(TIPRACK_1);
        assert_eq!(
            next_tip(&PipetteId::new(P300_SINGLE), &rack, &catalog, &state, None),
            Some(WellName::new("A1"))
        );
        state
            .tip_state
            .tipracks
            .get_mut(&rack)
            .unwrap()
            .insert(WellName::new("A1"), false);
        assert_eq!(
            next_tip(&PipetteId::new(P300_SINGLE), &rack, &catalog, &state, None),
            Some(WellName::new("B1"))
        );
    }

    #[test]
    fn eight_channel_requires_a_full_column() {
        let (catalog, mut state) = standard_context();
        let rack = LabwareId::new(TIPRACK_1);
        // consume one tip from column 1: the 8-channel must skip to column 2
        state
            .tip_state
            .tipracks
            .get_mut(&rack)
            .unwrap()
            .insert(WellName::new("C1"), false);
        assert_eq!(
            next_tip(&PipetteId::new(P300_MULTI), &rack, &catalog, &state, None),
            Some(WellName::new("A2"))
        );
    }

    #[test]
    fn next_tiprack_skips_exhausted_racks() {
        let (catalog, mut state) = standard_context();
        let rack1 = LabwareId::new(TIPRACK_1);
        if let Some(wells) = state.tip_state.tipracks.get_mut(&rack1) {
            for present in wells.values_mut() {
                *present = false;
            }
        }
        let next = next_tiprack(
            &PipetteId::new(P300_SINGLE),
            TIPRACK_URI,
            &catalog,
            &state,
            None,
        );
        assert_eq!(
            next,
            Some((LabwareId::new(TIPRACK_2), WellName::new("A1")))
        );
    }

    #[test]
    fn effective_max_volume_is_min_of_pipette_and_tip() {
        let (catalog, _) = standard_context();
        assert_eq!(
            pipette_with_tip_max_volume(&PipetteId::new(P300_SINGLE), &catalog, TIPRACK_URI),
            Some(300.0)
        );
    }

    #[test]
    fn column_layout_activates_eight_channels() {
        assert_eq!(
            active_channels(ChannelCount::NinetySix, Some(NozzleLayout::Column)),
            8
        );
        assert_eq!(active_channels(ChannelCount::NinetySix, None), 96);
        assert_eq!(active_channels(ChannelCount::Single, None), 1);
    }
}
