//! The Temporal State Model: one simulated snapshot of the world.
//!
//! A [`RobotState`] captures everything that changes along the command
//! timeline — which channels and tiprack wells hold tips, which wells
//! and tips hold which liquids, where labware and modules sit, and
//! each module's operating sub-state. Exactly one snapshot exists per
//! point in the timeline; every transition derives a fresh value and
//! the previous one stays untouched, so callers can keep whole
//! timelines for display and undo without any aliasing.
//!
//! # Lifecycle
//!
//! ```text
//! RobotState::initial(catalog, ...)        all racks full, wells empty
//!     │
//!     ▼ apply transition for instruction 1
//! RobotState (snapshot 1)
//!     │
//!     ▼ apply transition for instruction 2
//! RobotState (snapshot 2) ...
//! ```

use crate::entities::EntityCatalog;
use crate::id::{LabwareId, LiquidId, ModuleId, PipetteId, WellName};
use crate::liquid::LiquidContents;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Staging slots in the extended deck's fourth column. Pipetting into
/// these is rejected; they are reachable only by labware moves.
pub const COLUMN_4_SLOTS: [&str; 4] = ["A4", "B4", "C4", "D4"];

/// Where a piece of labware or a module currently sits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeckLocation {
    /// A deck slot, e.g. `"C2"`.
    Slot(String),
    /// On top of a module.
    Module(ModuleId),
    /// Stacked on other labware (an adapter).
    Labware(LabwareId),
    /// Discarded into the waste chute. Terminal; the labware cannot
    /// be addressed again.
    WasteChute,
    /// Not on the deck at all.
    OffDeck,
}

impl DeckLocation {
    /// Returns `true` for the synthetic off-deck location.
    #[must_use]
    pub fn is_off_deck(&self) -> bool {
        matches!(self, Self::OffDeck)
    }

    /// The slot name, when located directly in a deck slot.
    #[must_use]
    pub fn slot_name(&self) -> Option<&str> {
        match self {
            Self::Slot(name) => Some(name),
            _ => None,
        }
    }
}

/// Which nozzles of a high-throughput pipette are active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NozzleLayout {
    /// Full rectangular layout (all channels).
    All,
    /// Single-column layout (8 active channels on a 96).
    Column,
}

/// Pipette mount side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mount {
    Left,
    Right,
}

/// Per-timeline pipette state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipetteTemporal {
    pub mount: Mount,
    /// Active nozzle configuration, when one has been applied.
    pub nozzles: Option<NozzleLayout>,
}

/// Temperature module run status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TemperatureStatus {
    Deactivated,
    Approaching,
    AtTarget,
}

/// Operating sub-state, one variant per module type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ModuleState {
    Temperature {
        status: TemperatureStatus,
        target: Option<f64>,
    },
    Thermocycler {
        block_target: Option<f64>,
        lid_target: Option<f64>,
        /// `None` when the lid position has never been commanded.
        lid_open: Option<bool>,
    },
    HeaterShaker {
        target_temp: Option<f64>,
        target_speed: Option<f64>,
        latch_open: bool,
    },
    Magnetic {
        engaged: bool,
    },
}

/// Per-timeline module state: where it sits and what it is doing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleTemporal {
    pub slot: String,
    pub state: ModuleState,
}

/// Tip presence per pipette and per tiprack well.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TipState {
    pub pipettes: BTreeMap<PipetteId, bool>,
    pub tipracks: BTreeMap<LabwareId, BTreeMap<WellName, bool>>,
}

/// Liquid contents per labware well and per pipette channel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LiquidState {
    pub labware: BTreeMap<LabwareId, BTreeMap<WellName, LiquidContents>>,
    /// One entry per physical channel, index 0 first.
    pub pipettes: BTreeMap<PipetteId, Vec<LiquidContents>>,
}

/// One simulated snapshot of robot, labware, and liquid state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RobotState {
    pub pipettes: BTreeMap<PipetteId, PipetteTemporal>,
    pub labware: BTreeMap<LabwareId, DeckLocation>,
    pub modules: BTreeMap<ModuleId, ModuleTemporal>,
    pub tip_state: TipState,
    pub liquid_state: LiquidState,
}

impl RobotState {
    /// Builds the start-of-protocol snapshot: every tiprack full,
    /// every well empty, every pipette tipless.
    #[must_use]
    pub fn initial(
        catalog: &EntityCatalog,
        pipettes: BTreeMap<PipetteId, PipetteTemporal>,
        labware: BTreeMap<LabwareId, DeckLocation>,
        modules: BTreeMap<ModuleId, ModuleTemporal>,
    ) -> Self {
        let mut tip_state = TipState::default();
        let mut liquid_state = LiquidState::default();

        for id in pipettes.keys() {
            tip_state.pipettes.insert(id.clone(), false);
            let channels = catalog
                .pipette(id)
                .map(|spec| spec.channels.count())
                .unwrap_or(1);
            liquid_state
                .pipettes
                .insert(id.clone(), vec![LiquidContents::default(); channels]);
        }

        for id in labware.keys() {
            let Some(def) = catalog.labware_def(id) else {
                continue;
            };
            if def.is_tiprack() {
                let full: BTreeMap<WellName, bool> =
                    def.wells.keys().map(|w| (w.clone(), true)).collect();
                tip_state.tipracks.insert(id.clone(), full);
            }
            let empty: BTreeMap<WellName, LiquidContents> = def
                .wells
                .keys()
                .map(|w| (w.clone(), LiquidContents::default()))
                .collect();
            liquid_state.labware.insert(id.clone(), empty);
        }

        Self {
            pipettes,
            labware,
            modules,
            tip_state,
            liquid_state,
        }
    }

    /// Returns `true` if the pipette currently carries tips.
    #[must_use]
    pub fn pipette_has_tip(&self, pipette: &PipetteId) -> bool {
        self.tip_state.pipettes.get(pipette).copied().unwrap_or(false)
    }

    /// Returns `true` if any well of the tiprack still holds a tip.
    #[must_use]
    pub fn tiprack_has_tips(&self, tiprack: &LabwareId) -> bool {
        self.tip_state
            .tipracks
            .get(tiprack)
            .is_some_and(|wells| wells.values().any(|present| *present))
    }

    /// Returns `true` if any well of the labware holds liquid.
    #[must_use]
    pub fn labware_has_liquid(&self, labware: &LabwareId) -> bool {
        self.liquid_state
            .labware
            .get(labware)
            .is_some_and(|wells| wells.values().any(|c| c.total_volume() > 0.0))
    }

    /// Current operating state of a module, if it exists.
    #[must_use]
    pub fn module_state(&self, module: &ModuleId) -> Option<&ModuleState> {
        self.modules.get(module).map(|m| &m.state)
    }

    /// Seeds a well with a single liquid. Intended for protocol setup
    /// and test fixtures.
    pub fn fill_well(&mut self, labware: &LabwareId, well: &WellName, liquid: LiquidId, volume: f64) {
        if let Some(wells) = self.liquid_state.labware.get_mut(labware) {
            wells.insert(well.clone(), LiquidContents::single(liquid, volume));
        }
    }
}
