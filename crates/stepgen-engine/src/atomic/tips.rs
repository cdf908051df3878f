//! Tip pick-up and drop creators.

use crate::creator::{CreatorOutput, CreatorResult};
use stepgen_types::{
    EntityCatalog, GenerationError, Instruction, LabwareId, PipetteId, RobotState, WellName,
};

#[derive(Debug, Clone, PartialEq)]
pub struct PickUpTipParams {
    pub pipette: PipetteId,
    pub tiprack: LabwareId,
    pub well: WellName,
}

pub fn pick_up_tip(
    params: &PickUpTipParams,
    catalog: &EntityCatalog,
    state: &RobotState,
) -> CreatorResult {
    let mut errors = Vec::new();
    if catalog.pipette(&params.pipette).is_none() {
        errors.push(GenerationError::PipetteDoesNotExist {
            pipette: params.pipette.clone(),
        });
    }
    if !state.labware.contains_key(&params.tiprack) {
        errors.push(GenerationError::LabwareDoesNotExist {
            labware: params.tiprack.clone(),
        });
    } else {
        let has_tip_here = state
            .tip_state
            .tipracks
            .get(&params.tiprack)
            .and_then(|rack| rack.get(&params.well))
            .copied()
            .unwrap_or(false);
        if !has_tip_here {
            errors.push(GenerationError::InsufficientTips);
        }
    }
    if !errors.is_empty() {
        return Err(errors);
    }
    Ok(CreatorOutput::one(Instruction::PickUpTip {
        pipette: params.pipette.clone(),
        tiprack: params.tiprack.clone(),
        well: params.well.clone(),
    }))
}

/// Drops into a trash-style labware well. A tipless pipette is a
/// no-op, not an error, so compound creators can call this
/// unconditionally.
pub fn drop_tip(
    pipette: &PipetteId,
    labware: &LabwareId,
    well: &WellName,
    catalog: &EntityCatalog,
    state: &RobotState,
) -> CreatorResult {
    if catalog.pipette(pipette).is_none() {
        return Err(vec![GenerationError::PipetteDoesNotExist {
            pipette: pipette.clone(),
        }]);
    }
    if !state.pipette_has_tip(pipette) {
        return Ok(CreatorOutput::default());
    }
    if !state.labware.contains_key(labware) {
        return Err(vec![GenerationError::LabwareDoesNotExist {
            labware: labware.clone(),
        }]);
    }
    Ok(CreatorOutput::one(Instruction::DropTip {
        pipette: pipette.clone(),
        labware: labware.clone(),
        well: well.clone(),
    }))
}

pub fn drop_tip_in_place(
    pipette: &PipetteId,
    catalog: &EntityCatalog,
    state: &RobotState,
) -> CreatorResult {
    if catalog.pipette(pipette).is_none() {
        return Err(vec![GenerationError::PipetteDoesNotExist {
            pipette: pipette.clone(),
        }]);
    }
    if !state.pipette_has_tip(pipette) {
        return Ok(CreatorOutput::default());
    }
    Ok(CreatorOutput::one(Instruction::DropTipInPlace {
        pipette: pipette.clone(),
    }))
}
