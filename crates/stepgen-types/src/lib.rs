//! Core data model for the stepgen liquid-handling engine.
//!
//! This crate defines the vocabulary shared between the authoring
//! layer, the generation engine, and the execution/visualization
//! layers. It contains no generation logic — that lives in
//! `stepgen-engine`.
//!
//! # Crate Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                 Authoring layer (excluded)               │
//! │        produces StepArgs + the EntityCatalog             │
//! ├──────────────────────────────────────────────────────────┤
//! │  stepgen-types : ids, entities, state, commands  ◄── HERE │
//! │  stepgen-engine: creators, transitions, pipeline         │
//! ├──────────────────────────────────────────────────────────┤
//! │           Execution / visualization (excluded)           │
//! │      consumes Instruction lists + RobotState chains      │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! # Data flow
//!
//! [`EntityCatalog`] (immutable per protocol) + previous
//! [`RobotState`] + one [`StepArgs`] flow into the engine, which
//! yields an ordered [`Instruction`] list and the next [`RobotState`],
//! or a non-empty list of [`GenerationError`]s. [`GenerationWarning`]s
//! ride alongside successful output.
//!
//! # Determinism
//!
//! Every type here has value semantics and derives serde; identical
//! inputs to the engine always serialize to identical output, so
//! callers can memoize whole timelines.

mod command;
mod entities;
mod error;
mod id;
mod liquid;
mod state;
mod step;

pub use command::{Instruction, ProfileStep, WellOffset};
pub use entities::{
    ChannelCount, DestinationKind, EntityCatalog, EquipmentKind, EquipmentSpec, LabwareCategory,
    LabwareDefinition, ModuleSpec, ModuleType, PipetteCategory, PipetteSpec,
    TiprackCompatibility, WellShape, WellsForTips,
};
pub use error::{Coded, GenerationError, GenerationWarning};
pub use id::{EquipmentId, LabwareId, LiquidId, ModuleId, PipetteId, WellName};
pub use liquid::{LiquidContents, SplitLiquid};
pub use state::{
    DeckLocation, LiquidState, ModuleState, ModuleTemporal, Mount, NozzleLayout, PipetteTemporal,
    RobotState, TemperatureStatus, TipState, COLUMN_4_SLOTS,
};
pub use step::{
    BlowoutLocation, ChangeTip, ConsolidateArgs, DeactivateTemperatureArgs, DelaySettings,
    DisengageMagnetArgs, DistributeArgs, EngageMagnetArgs, HeaterShakerArgs, MixArgs, MixSettings,
    MoveLabwareArgs, ProfileCycle, SetTemperatureArgs, StepArgs, ThermocyclerProfileArgs,
    ThermocyclerStateArgs, TransferArgs, TransferFamilyOptions, WaitForTemperatureArgs,
};
