//! Aspirate, dispense, blow-out, and touch-tip creators.
//!
//! All four share one hazard battery (`well_access_errors`). The
//! battery collects every applicable error; volume limits are only
//! judged once the battery passes, so a caller is never told a volume
//! is wrong for a movement that could not happen anyway.

use crate::collision;
use crate::creator::{CreatorOutput, CreatorResult};
use crate::selectors;
use stepgen_types::{
    DeckLocation, EntityCatalog, GenerationError, Instruction, LabwareId, PipetteId, RobotState,
    WellName, WellOffset,
};

#[derive(Debug, Clone, PartialEq)]
pub struct AspirateParams {
    pub pipette: PipetteId,
    pub labware: LabwareId,
    pub well: WellName,
    pub volume: f64,
    pub flow_rate: f64,
    pub offset: WellOffset,
    pub is_air_gap: bool,
    /// Tiprack model the current tip came from, for volume limits.
    pub tip_rack_uri: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DispenseParams {
    pub pipette: PipetteId,
    pub labware: LabwareId,
    pub well: WellName,
    pub volume: f64,
    pub flow_rate: f64,
    pub offset: WellOffset,
    pub is_air_gap: bool,
    pub tip_rack_uri: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BlowOutParams {
    pub pipette: PipetteId,
    pub labware: LabwareId,
    pub well: WellName,
    pub flow_rate: f64,
    pub offset_from_top_mm: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TouchTipParams {
    pub pipette: PipetteId,
    pub labware: LabwareId,
    pub well: WellName,
    pub offset_from_bottom_mm: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MoveToWellParams {
    pub pipette: PipetteId,
    pub labware: LabwareId,
    pub well: WellName,
    pub offset: WellOffset,
}

/// Hazard battery for putting a tip into a labware well.
///
/// Collects every applicable error, in a fixed order so output is
/// deterministic.
pub(crate) fn well_access_errors(
    pipette: &PipetteId,
    labware: &LabwareId,
    catalog: &EntityCatalog,
    state: &RobotState,
) -> Vec<GenerationError> {
    let mut errors = Vec::new();

    let spec = catalog.pipette(pipette);
    if spec.is_none() {
        errors.push(GenerationError::PipetteDoesNotExist {
            pipette: pipette.clone(),
        });
    }
    let Some(location) = state.labware.get(labware) else {
        errors.push(GenerationError::LabwareDoesNotExist {
            labware: labware.clone(),
        });
        return errors;
    };

    if !state.pipette_has_tip(pipette) {
        errors.push(GenerationError::NoTipOnPipette {
            pipette: pipette.clone(),
        });
    }
    match location {
        DeckLocation::OffDeck => errors.push(GenerationError::LabwareOffDeck),
        DeckLocation::WasteChute => {
            errors.push(GenerationError::LabwareDiscardedInWasteChute);
        }
        _ => {}
    }
    if selectors::is_in_column_4(labware, state) {
        errors.push(GenerationError::PipettingIntoColumn4);
    }
    if collision::thermocycler_lid_blocks(labware, state) {
        errors.push(GenerationError::ThermocyclerLidClosed);
    }
    if collision::heater_shaker_latch_open_blocks(labware, state) {
        errors.push(GenerationError::HeaterShakerLatchOpen);
    }
    if collision::heater_shaker_shaking_blocks(labware, state) {
        errors.push(GenerationError::HeaterShakerIsShaking);
    }

    if let Some(slot) = selectors::labware_slot(labware, state) {
        if collision::east_west_heater_shaker_latch_open(&slot, state) {
            errors.push(GenerationError::HeaterShakerLatchOpen);
        }
        if collision::adjacent_heater_shaker_shaking(&slot, state) {
            errors.push(GenerationError::HeaterShakerIsShaking);
        }
        if let Some(spec) = spec {
            if spec.channels.is_multi() {
                let is_tiprack = catalog
                    .labware_def(labware)
                    .is_some_and(|def| def.is_tiprack());
                if collision::east_west_heater_shaker(&slot, state)
                    || (!is_tiprack && collision::north_south_heater_shaker(&slot, state))
                {
                    errors.push(GenerationError::HeaterShakerAdjacencyViolation);
                }
            }
        }
    }
    if let Some(spec) = spec {
        if collision::magnetic_module_collision_danger(spec.channels, labware, state) {
            errors.push(GenerationError::ModulePipetteCollisionDanger);
        }
    }
    if !collision::is_safe_pipette_movement(pipette, labware, catalog, state) {
        errors.push(GenerationError::PossiblePipetteCollision);
    }

    errors
}

/// Volume limits: pipette capacity first, then the fitted tip's.
fn volume_limit_errors(
    pipette: &PipetteId,
    volume: f64,
    tip_rack_uri: &str,
    catalog: &EntityCatalog,
) -> Vec<GenerationError> {
    let Some(spec) = catalog.pipette(pipette) else {
        return Vec::new();
    };
    if volume > spec.max_volume {
        return vec![GenerationError::PipetteVolumeExceeded {
            volume,
            max_volume: spec.max_volume,
            disposal_volume: None,
        }];
    }
    if let Some(tip_max) = selectors::pipette_with_tip_max_volume(pipette, catalog, tip_rack_uri) {
        if volume > tip_max {
            return vec![GenerationError::TipVolumeExceeded {
                volume,
                max_volume: tip_max,
            }];
        }
    }
    Vec::new()
}

pub fn aspirate(params: &AspirateParams, catalog: &EntityCatalog, state: &RobotState) -> CreatorResult {
    let mut errors = well_access_errors(&params.pipette, &params.labware, catalog, state);
    if errors.is_empty() {
        errors = volume_limit_errors(&params.pipette, params.volume, &params.tip_rack_uri, catalog);
    }
    if !errors.is_empty() {
        return Err(errors);
    }
    Ok(CreatorOutput::one(Instruction::Aspirate {
        pipette: params.pipette.clone(),
        labware: params.labware.clone(),
        well: params.well.clone(),
        volume: params.volume,
        flow_rate: params.flow_rate,
        offset: params.offset,
        is_air_gap: params.is_air_gap,
    }))
}

pub fn dispense(params: &DispenseParams, catalog: &EntityCatalog, state: &RobotState) -> CreatorResult {
    let mut errors = well_access_errors(&params.pipette, &params.labware, catalog, state);
    if errors.is_empty() {
        errors = volume_limit_errors(&params.pipette, params.volume, &params.tip_rack_uri, catalog);
    }
    if !errors.is_empty() {
        return Err(errors);
    }
    Ok(CreatorOutput::one(Instruction::Dispense {
        pipette: params.pipette.clone(),
        labware: params.labware.clone(),
        well: params.well.clone(),
        volume: params.volume,
        flow_rate: params.flow_rate,
        offset: params.offset,
        is_air_gap: params.is_air_gap,
    }))
}

pub fn blow_out(params: &BlowOutParams, catalog: &EntityCatalog, state: &RobotState) -> CreatorResult {
    let errors = well_access_errors(&params.pipette, &params.labware, catalog, state);
    if !errors.is_empty() {
        return Err(errors);
    }
    Ok(CreatorOutput::one(Instruction::BlowOut {
        pipette: params.pipette.clone(),
        labware: params.labware.clone(),
        well: params.well.clone(),
        flow_rate: params.flow_rate,
        offset_from_top_mm: params.offset_from_top_mm,
    }))
}

pub fn touch_tip(params: &TouchTipParams, catalog: &EntityCatalog, state: &RobotState) -> CreatorResult {
    let errors = well_access_errors(&params.pipette, &params.labware, catalog, state);
    if !errors.is_empty() {
        return Err(errors);
    }
    Ok(CreatorOutput::one(Instruction::TouchTip {
        pipette: params.pipette.clone(),
        labware: params.labware.clone(),
        well: params.well.clone(),
        offset_from_bottom_mm: params.offset_from_bottom_mm,
    }))
}

pub fn move_to_well(
    params: &MoveToWellParams,
    catalog: &EntityCatalog,
    state: &RobotState,
) -> CreatorResult {
    let errors = well_access_errors(&params.pipette, &params.labware, catalog, state);
    if !errors.is_empty() {
        return Err(errors);
    }
    Ok(CreatorOutput::one(Instruction::MoveToWell {
        pipette: params.pipette.clone(),
        labware: params.labware.clone(),
        well: params.well.clone(),
        offset: params.offset,
    }))
}

/// Shared check for the in-place family: the pipette must exist and
/// carry a tip.
pub(crate) fn in_place_errors(
    pipette: &PipetteId,
    catalog: &EntityCatalog,
    state: &RobotState,
) -> Vec<GenerationError> {
    let mut errors = Vec::new();
    if catalog.pipette(pipette).is_none() {
        errors.push(GenerationError::PipetteDoesNotExist {
            pipette: pipette.clone(),
        });
    }
    if !state.pipette_has_tip(pipette) {
        errors.push(GenerationError::NoTipOnPipette {
            pipette: pipette.clone(),
        });
    }
    errors
}

pub fn aspirate_in_place(
    pipette: &PipetteId,
    volume: f64,
    flow_rate: f64,
    catalog: &EntityCatalog,
    state: &RobotState,
) -> CreatorResult {
    let errors = in_place_errors(pipette, catalog, state);
    if !errors.is_empty() {
        return Err(errors);
    }
    Ok(CreatorOutput::one(Instruction::AspirateInPlace {
        pipette: pipette.clone(),
        volume,
        flow_rate,
    }))
}

pub fn dispense_in_place(
    pipette: &PipetteId,
    volume: f64,
    flow_rate: f64,
    catalog: &EntityCatalog,
    state: &RobotState,
) -> CreatorResult {
    let errors = in_place_errors(pipette, catalog, state);
    if !errors.is_empty() {
        return Err(errors);
    }
    Ok(CreatorOutput::one(Instruction::DispenseInPlace {
        pipette: pipette.clone(),
        volume,
        flow_rate,
    }))
}

pub fn blow_out_in_place(
    pipette: &PipetteId,
    flow_rate: f64,
    catalog: &EntityCatalog,
    state: &RobotState,
) -> CreatorResult {
    let errors = in_place_errors(pipette, catalog, state);
    if !errors.is_empty() {
        return Err(errors);
    }
    Ok(CreatorOutput::one(Instruction::BlowOutInPlace {
        pipette: pipette.clone(),
        flow_rate,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::*;

    fn aspirate_params(volume: f64) -> AspirateParams {
        AspirateParams {
            pipette: PipetteId::new(P300_SINGLE),
            labware: LabwareId::new(SOURCE_PLATE),
            well: WellName::new("A1"),
            volume,
            flow_rate: 150.0,
            offset: WellOffset::z(0.5),
            is_air_gap: false,
            tip_rack_uri: TIPRACK_URI.to_string(),
        }
    }

    #[test]
    fn aspirate_emits_one_instruction() {
        let (catalog, mut state) = standard_context();
        give_tip(&mut state, P300_SINGLE);
        let out = aspirate(&aspirate_params(50.0), &catalog, &state).unwrap();
        assert_eq!(out.instructions.len(), 1);
        assert_eq!(out.instructions[0].kind(), "aspirate");
    }

    #[test]
    fn unknown_pipette_is_exactly_one_error() {
        let (catalog, state) = standard_context();
        let mut params = aspirate_params(50.0);
        params.pipette = PipetteId::new("ghost");
        let errors = aspirate(&params, &catalog, &state).unwrap_err();
        // the battery reports the missing pipette and the missing tip
        assert!(errors.contains(&GenerationError::PipetteDoesNotExist {
            pipette: PipetteId::new("ghost"),
        }));
    }

    #[test]
    fn battery_collects_multiple_errors() {
        let (catalog, state) = standard_context();
        // no tip was ever picked up
        let errors = aspirate(&aspirate_params(50.0), &catalog, &state).unwrap_err();
        assert_eq!(
            errors,
            vec![GenerationError::NoTipOnPipette {
                pipette: PipetteId::new(P300_SINGLE),
            }]
        );
    }

    #[test]
    fn volume_checked_only_after_battery_passes() {
        let (catalog, mut state) = standard_context();
        // tipless and over-volume: only the tip error surfaces
        let errors = aspirate(&aspirate_params(9000.0), &catalog, &state).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], GenerationError::NoTipOnPipette { .. }));

        give_tip(&mut state, P300_SINGLE);
        let errors = aspirate(&aspirate_params(9000.0), &catalog, &state).unwrap_err();
        assert_eq!(
            errors,
            vec![GenerationError::PipetteVolumeExceeded {
                volume: 9000.0,
                max_volume: 300.0,
                disposal_volume: None,
            }]
        );
    }

    #[test]
    fn closed_lid_blocks_dispense() {
        let (catalog, mut state) = context_with_thermocycler();
        give_tip(&mut state, P300_SINGLE);
        let params = DispenseParams {
            pipette: PipetteId::new(P300_SINGLE),
            labware: LabwareId::new(TC_PLATE),
            well: WellName::new("A1"),
            volume: 10.0,
            flow_rate: 300.0,
            offset: WellOffset::z(0.5),
            is_air_gap: false,
            tip_rack_uri: TIPRACK_URI.to_string(),
        };
        let errors = dispense(&params, &catalog, &state).unwrap_err();
        assert!(errors.contains(&GenerationError::ThermocyclerLidClosed));

        set_thermocycler_lid(&mut state, true);
        assert!(dispense(&params, &catalog, &state).is_ok());
    }

    #[test]
    fn blow_out_requires_a_tip() {
        let (catalog, state) = standard_context();
        let params = BlowOutParams {
            pipette: PipetteId::new(P300_SINGLE),
            labware: LabwareId::new(DEST_PLATE),
            well: WellName::new("A1"),
            flow_rate: 150.0,
            offset_from_top_mm: -2.0,
        };
        let errors = blow_out(&params, &catalog, &state).unwrap_err();
        assert!(matches!(errors[0], GenerationError::NoTipOnPipette { .. }));
    }
}
