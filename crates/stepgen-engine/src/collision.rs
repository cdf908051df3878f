//! Deck collision and hazard predicates.
//!
//! Pure checks over the catalog and one state snapshot, consumed by
//! the atomic creators' validation batteries. Each predicate answers
//! one question; the creators decide which error the answer maps to.

use crate::selectors::labware_slot;
use stepgen_types::{
    ChannelCount, DeckLocation, EntityCatalog, LabwareId, ModuleId, ModuleState, NozzleLayout,
    PipetteId, RobotState,
};

/// Grid coordinate of a deck slot. Handles both letter-digit names
/// ("A1".."D4") and legacy numeric names ("1".."11", three per row).
fn slot_coords(slot: &str) -> Option<(i8, i8)> {
    if let Ok(n) = slot.parse::<i8>() {
        return (1..=11).contains(&n).then(|| ((n - 1) / 3, (n - 1) % 3));
    }
    let mut chars = slot.chars();
    let row = match chars.next()? {
        'A' => 0,
        'B' => 1,
        'C' => 2,
        'D' => 3,
        _ => return None,
    };
    let col: i8 = chars.as_str().parse().ok()?;
    (1..=4).contains(&col).then_some((row, col - 1))
}

/// Returns `true` when the two slots sit side by side in the same row.
#[must_use]
pub fn slots_east_west(a: &str, b: &str) -> bool {
    match (slot_coords(a), slot_coords(b)) {
        (Some((ra, ca)), Some((rb, cb))) => ra == rb && (ca - cb).abs() == 1,
        _ => false,
    }
}

/// Returns `true` when the two slots touch in the same column.
#[must_use]
pub fn slots_north_south(a: &str, b: &str) -> bool {
    match (slot_coords(a), slot_coords(b)) {
        (Some((ra, ca)), Some((rb, cb))) => ca == cb && (ra - rb).abs() == 1,
        _ => false,
    }
}

/// Returns `true` when the two slots share an edge.
#[must_use]
pub fn slots_adjacent(a: &str, b: &str) -> bool {
    slots_east_west(a, b) || slots_north_south(a, b)
}

/// The module a labware ultimately sits on, looking through adapters.
#[must_use]
pub fn module_under_labware<'a>(
    labware: &LabwareId,
    state: &'a RobotState,
) -> Option<&'a ModuleId> {
    let mut location = state.labware.get(labware)?;
    for _ in 0..4 {
        match location {
            DeckLocation::Module(module) => return state.modules.get_key_value(module).map(|(k, _)| k),
            DeckLocation::Labware(adapter) => location = state.labware.get(adapter)?,
            _ => return None,
        }
    }
    None
}

/// Target labware sits inside a thermocycler whose lid is not
/// confirmed open.
#[must_use]
pub fn thermocycler_lid_blocks(labware: &LabwareId, state: &RobotState) -> bool {
    module_under_labware(labware, state).is_some_and(|module| {
        matches!(
            state.module_state(module),
            Some(ModuleState::Thermocycler { lid_open, .. }) if *lid_open != Some(true)
        )
    })
}

/// Target labware sits on a heater-shaker whose latch is open.
#[must_use]
pub fn heater_shaker_latch_open_blocks(labware: &LabwareId, state: &RobotState) -> bool {
    module_under_labware(labware, state).is_some_and(|module| {
        matches!(
            state.module_state(module),
            Some(ModuleState::HeaterShaker { latch_open: true, .. })
        )
    })
}

/// Target labware sits on a heater-shaker that is shaking.
#[must_use]
pub fn heater_shaker_shaking_blocks(labware: &LabwareId, state: &RobotState) -> bool {
    module_under_labware(labware, state).is_some_and(|module| {
        matches!(
            state.module_state(module),
            Some(ModuleState::HeaterShaker { target_speed: Some(_), .. })
        )
    })
}

/// Heater-shaker modules and their slots, from the state snapshot.
fn heater_shakers(state: &RobotState) -> impl Iterator<Item = (&str, &ModuleState)> {
    state
        .modules
        .values()
        .filter(|m| matches!(m.state, ModuleState::HeaterShaker { .. }))
        .map(|m| (m.slot.as_str(), &m.state))
}

/// An open-latch heater-shaker sits directly east or west of the slot.
#[must_use]
pub fn east_west_heater_shaker_latch_open(slot: &str, state: &RobotState) -> bool {
    heater_shakers(state).any(|(hs_slot, hs_state)| {
        slots_east_west(slot, hs_slot)
            && matches!(hs_state, ModuleState::HeaterShaker { latch_open: true, .. })
    })
}

/// A shaking heater-shaker touches the slot on any side.
#[must_use]
pub fn adjacent_heater_shaker_shaking(slot: &str, state: &RobotState) -> bool {
    heater_shakers(state).any(|(hs_slot, hs_state)| {
        slots_adjacent(slot, hs_slot)
            && matches!(hs_state, ModuleState::HeaterShaker { target_speed: Some(_), .. })
    })
}

/// Any heater-shaker sits directly east or west of the slot. Unsafe
/// for multi-channel pipettes regardless of module activity.
#[must_use]
pub fn east_west_heater_shaker(slot: &str, state: &RobotState) -> bool {
    heater_shakers(state).any(|(hs_slot, _)| slots_east_west(slot, hs_slot))
}

/// Any heater-shaker sits directly north or south of the slot. Unsafe
/// for multi-channel pipettes unless the target is a tiprack.
#[must_use]
pub fn north_south_heater_shaker(slot: &str, state: &RobotState) -> bool {
    heater_shakers(state).any(|(hs_slot, _)| slots_north_south(slot, hs_slot))
}

/// Multi-channel pipette over a labware on an engaged magnetic block.
#[must_use]
pub fn magnetic_module_collision_danger(
    channels: ChannelCount,
    labware: &LabwareId,
    state: &RobotState,
) -> bool {
    channels.is_multi()
        && module_under_labware(labware, state).is_some_and(|module| {
            matches!(
                state.module_state(module),
                Some(ModuleState::Magnetic { engaged: true })
            )
        })
}

/// Whether a 96-channel pipette in column layout can reach the target
/// labware without clipping neighboring hardware.
///
/// Full-layout and lower-channel movements are always considered safe
/// here (their hazards are covered by the heater-shaker predicates).
/// A column layout overhangs to the side, so any module east or west
/// of the target slot is treated as a collision risk.
#[must_use]
pub fn is_safe_pipette_movement(
    pipette: &PipetteId,
    labware: &LabwareId,
    catalog: &EntityCatalog,
    state: &RobotState,
) -> bool {
    let is_column_96 = catalog
        .pipette(pipette)
        .is_some_and(|spec| spec.channels == ChannelCount::NinetySix)
        && state
            .pipettes
            .get(pipette)
            .is_some_and(|p| p.nozzles == Some(NozzleLayout::Column));
    if !is_column_96 {
        return true;
    }
    let Some(slot) = labware_slot(labware, state) else {
        return true;
    };
    !state
        .modules
        .values()
        .any(|m| slots_east_west(&slot, &m.slot))
}
