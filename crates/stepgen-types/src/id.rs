//! Identifier newtypes for catalog entities and liquids.
//!
//! Every entity in a protocol is referenced by an opaque string
//! identifier assigned by the authoring layer. Entities never embed
//! pointers to each other, only identifiers, so the catalog stays
//! acyclic and trivially shareable across simulations.
//!
//! # Example
//!
//! ```
//! use stepgen_types::{LabwareId, WellName};
//!
//! let plate = LabwareId::new("destPlateId");
//! let well = WellName::new("A1");
//! assert_eq!(plate.as_str(), "destPlateId");
//! assert_eq!(well.to_string(), "A1");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! string_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wraps a raw identifier string.
            pub fn new(raw: impl Into<String>) -> Self {
                Self(raw.into())
            }

            /// Returns the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(raw: &str) -> Self {
                Self::new(raw)
            }
        }

        impl From<String> for $name {
            fn from(raw: String) -> Self {
                Self(raw)
            }
        }
    };
}

string_id! {
    /// Identifies a loaded pipette.
    PipetteId
}

string_id! {
    /// Identifies a piece of labware (plate, reservoir, tiprack, adapter).
    LabwareId
}

string_id! {
    /// Identifies a deck module (temperature, thermocycler, heater-shaker, magnetic).
    ModuleId
}

string_id! {
    /// Identifies additional equipment (waste chute, trash bin, gripper).
    EquipmentId
}

string_id! {
    /// Identifies a liquid assigned by the authoring layer.
    ///
    /// The reserved value [`LiquidId::AIR`] marks unfilled tip volume
    /// after an over-aspiration; it is excluded from total-volume sums.
    LiquidId
}

string_id! {
    /// A well coordinate within labware, e.g. `"A1"`.
    WellName
}

impl LiquidId {
    /// Reserved pseudo-liquid marking unfilled volume.
    pub const AIR: &'static str = "__air__";

    /// Returns the air pseudo-liquid id.
    #[must_use]
    pub fn air() -> Self {
        Self::new(Self::AIR)
    }

    /// Returns `true` if this is the air pseudo-liquid.
    #[must_use]
    pub fn is_air(&self) -> bool {
        self.0 == Self::AIR
    }
}
