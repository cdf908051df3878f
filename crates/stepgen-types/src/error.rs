//! The closed error and warning taxonomy.
//!
//! Two disjoint severities, both closed sets of typed conditions:
//!
//! - [`GenerationError`] — fatal. The step's generation is aborted,
//!   no instructions are returned, and the state is not advanced.
//! - [`GenerationWarning`] — informational. Generation continues and
//!   warnings ride alongside the returned instruction list.
//!
//! Every variant carries a stable UPPER_SNAKE code via [`Coded`] so
//! that consumers (UI, tests) can match on machine-readable tags and
//! handle the taxonomy exhaustively. Generation is pure and
//! deterministic, so no error is retryable — the caller's only remedy
//! is to change the step arguments or prior state and regenerate.
//!
//! # Example
//!
//! ```
//! use stepgen_types::{Coded, GenerationError, PipetteId};
//!
//! let err = GenerationError::PipetteDoesNotExist {
//!     pipette: PipetteId::new("p300"),
//! };
//! assert_eq!(err.code(), "PIPETTE_DOES_NOT_EXIST");
//! ```

use crate::id::{LabwareId, ModuleId, PipetteId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stable machine-readable code for an error or warning condition.
///
/// Codes are an API contract: UPPER_SNAKE_CASE, never renamed once
/// defined.
pub trait Coded {
    /// The stable condition code.
    fn code(&self) -> &'static str;
}

/// A fatal condition that aborts generation of the current step.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
pub enum GenerationError {
    #[error("pipette {pipette} does not exist in the entity catalog")]
    PipetteDoesNotExist { pipette: PipetteId },

    #[error("labware {labware} does not exist in this timeline")]
    LabwareDoesNotExist { labware: LabwareId },

    #[error("labware is off-deck and cannot be pipetted to")]
    LabwareOffDeck,

    #[error("destination equipment does not exist in the entity catalog")]
    EquipmentDoesNotExist,

    #[error("drop-tip location does not exist in the entity catalog")]
    DropTipLocationDoesNotExist,

    #[error("pipette {pipette} has no tip attached")]
    NoTipOnPipette { pipette: PipetteId },

    #[error("requested {volume} µL exceeds tip maximum of {max_volume} µL")]
    TipVolumeExceeded { volume: f64, max_volume: f64 },

    #[error("requested {volume} µL exceeds pipette capacity of {max_volume} µL")]
    PipetteVolumeExceeded {
        volume: f64,
        max_volume: f64,
        /// Disposal volume included in the request, when any.
        disposal_volume: Option<f64>,
    },

    #[error("pipette movement would likely collide with deck items")]
    PossiblePipetteCollision,

    #[error("pipette would collide with a module adjacent to the target slot")]
    ModulePipetteCollisionDanger,

    #[error("target labware sits in a thermocycler whose lid is closed")]
    ThermocyclerLidClosed,

    #[error("target labware sits on a heater-shaker whose latch is open")]
    HeaterShakerLatchOpen,

    #[error("heater-shaker latch is closed and blocks this labware move")]
    HeaterShakerLatchClosed,

    #[error("target labware sits on a heater-shaker that is shaking")]
    HeaterShakerIsShaking,

    #[error("pipetting next to an active heater-shaker is unsafe")]
    HeaterShakerAdjacencyViolation,

    #[error("cannot pipette into a column 4 staging slot")]
    PipettingIntoColumn4,

    #[error("module {module} is missing from this timeline")]
    MissingModule { module: ModuleId },

    #[error("no compatible tiprack has tips remaining")]
    InsufficientTips,

    #[error("this labware move requires a gripper")]
    GripperRequired,

    #[error("labware cannot be moved while a pipette holds tips")]
    PipetteHasTip,

    #[error("this labware cannot be moved with a gripper")]
    CannotMoveWithGripper,

    #[error("labware was already discarded into the waste chute")]
    LabwareDiscardedInWasteChute,

    #[error("destination slot is already occupied")]
    MultipleEntitiesOnSameSlot,
}

impl Coded for GenerationError {
    fn code(&self) -> &'static str {
        match self {
            Self::PipetteDoesNotExist { .. } => "PIPETTE_DOES_NOT_EXIST",
            Self::LabwareDoesNotExist { .. } => "LABWARE_DOES_NOT_EXIST",
            Self::LabwareOffDeck => "LABWARE_OFF_DECK",
            Self::EquipmentDoesNotExist => "EQUIPMENT_DOES_NOT_EXIST",
            Self::DropTipLocationDoesNotExist => "DROP_TIP_LOCATION_DOES_NOT_EXIST",
            Self::NoTipOnPipette { .. } => "NO_TIP_ON_PIPETTE",
            Self::TipVolumeExceeded { .. } => "TIP_VOLUME_EXCEEDED",
            Self::PipetteVolumeExceeded { .. } => "PIPETTE_VOLUME_EXCEEDED",
            Self::PossiblePipetteCollision => "POSSIBLE_PIPETTE_COLLISION",
            Self::ModulePipetteCollisionDanger => "MODULE_PIPETTE_COLLISION_DANGER",
            Self::ThermocyclerLidClosed => "THERMOCYCLER_LID_CLOSED",
            Self::HeaterShakerLatchOpen => "HEATER_SHAKER_LATCH_OPEN",
            Self::HeaterShakerLatchClosed => "HEATER_SHAKER_LATCH_CLOSED",
            Self::HeaterShakerIsShaking => "HEATER_SHAKER_IS_SHAKING",
            Self::HeaterShakerAdjacencyViolation => "HEATER_SHAKER_ADJACENCY_VIOLATION",
            Self::PipettingIntoColumn4 => "PIPETTING_INTO_COLUMN_4",
            Self::MissingModule { .. } => "MISSING_MODULE",
            Self::InsufficientTips => "INSUFFICIENT_TIPS",
            Self::GripperRequired => "GRIPPER_REQUIRED",
            Self::PipetteHasTip => "PIPETTE_HAS_TIP",
            Self::CannotMoveWithGripper => "CANNOT_MOVE_WITH_GRIPPER",
            Self::LabwareDiscardedInWasteChute => "LABWARE_DISCARDED_IN_WASTE_CHUTE",
            Self::MultipleEntitiesOnSameSlot => "MULTIPLE_ENTITIES_ON_SAME_SLOT",
        }
    }
}

/// A non-aborting condition surfaced alongside generated instructions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum GenerationWarning {
    #[error("aspirating from a well that has no recorded liquid")]
    AspirateFromPristineWell,

    #[error("aspirating more than the well's recorded contents")]
    AspirateMoreThanWellContents,

    #[error("tiprack moved to the waste chute still holds tips")]
    TiprackInWasteChuteHasTips,

    #[error("labware moved to the waste chute still holds liquid")]
    LabwareInWasteChuteHasLiquid,
}

impl Coded for GenerationWarning {
    fn code(&self) -> &'static str {
        match self {
            Self::AspirateFromPristineWell => "ASPIRATE_FROM_PRISTINE_WELL",
            Self::AspirateMoreThanWellContents => "ASPIRATE_MORE_THAN_WELL_CONTENTS",
            Self::TiprackInWasteChuteHasTips => "TIPRACK_IN_WASTE_CHUTE_HAS_TIPS",
            Self::LabwareInWasteChuteHasLiquid => "LABWARE_IN_WASTE_CHUTE_HAS_LIQUID",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes_are_upper_snake() {
        let err = GenerationError::ThermocyclerLidClosed;
        assert_eq!(err.code(), "THERMOCYCLER_LID_CLOSED");
        assert!(err.code().chars().all(|c| c.is_ascii_uppercase() || c == '_' || c.is_ascii_digit()));
    }

    #[test]
    fn display_strings_are_human_readable() {
        let err = GenerationError::NoTipOnPipette {
            pipette: PipetteId::new("p300SingleId"),
        };
        assert!(err.to_string().contains("p300SingleId"));
    }

    #[test]
    fn warning_codes_are_stable() {
        assert_eq!(
            GenerationWarning::AspirateFromPristineWell.code(),
            "ASPIRATE_FROM_PRISTINE_WELL"
        );
    }
}
