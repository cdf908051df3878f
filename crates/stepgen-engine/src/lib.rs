//! Command generation and device-state simulation for liquid-handling
//! protocols.
//!
//! The engine turns one caller-authored [`StepArgs`](stepgen_types::StepArgs)
//! into an ordered machine-instruction list plus the simulated
//! [`RobotState`](stepgen_types::RobotState) left behind, or a
//! non-empty error list when the step cannot run on the current deck.
//!
//! # Layers
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │ pipeline   generate_step / generate_timeline               │
//! │            folds intents, threads state, stops on error    │
//! ├────────────────────────────────────────────────────────────┤
//! │ compound   transfer, consolidate, distribute, mix,         │
//! │            module steps — plan chunk/tip policy as intents │
//! ├────────────────────────────────────────────────────────────┤
//! │ intent     CommandIntent: inspectable unit of work;        │
//! │            execute() validates and emits instructions      │
//! ├────────────────────────────────────────────────────────────┤
//! │ atomic     single-instruction creators with their full     │
//! │            validation batteries                            │
//! ├────────────────────────────────────────────────────────────┤
//! │ transitions  Instruction → next RobotState                 │
//! │ selectors / collision / dest  pure read-only lookups       │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Determinism
//!
//! Generation is a pure function of the entity catalog, the incoming
//! snapshot, and the step arguments. No clocks, no randomness, no
//! hidden state; identical inputs always produce identical serialized
//! output.
//!
//! # Errors and warnings
//!
//! Validation collects every applicable
//! [`GenerationError`](stepgen_types::GenerationError) for a movement
//! before giving up, so a caller can surface all problems at once.
//! Recoverable oddities (aspirating from a well nothing was dispensed
//! into, over-drawing a well) surface as
//! [`GenerationWarning`](stepgen_types::GenerationWarning)s on
//! otherwise successful output.

pub mod atomic;
mod collision;
pub mod compound;
mod creator;
mod dest;
pub mod fixtures;
mod intent;
mod pipeline;
mod selectors;
mod transitions;

pub use collision::{
    adjacent_heater_shaker_shaking, east_west_heater_shaker, east_west_heater_shaker_latch_open,
    heater_shaker_latch_open_blocks, heater_shaker_shaking_blocks, is_safe_pipette_movement,
    magnetic_module_collision_danger, module_under_labware, north_south_heater_shaker,
    slots_adjacent, slots_east_west, slots_north_south, thermocycler_lid_blocks,
};
pub use creator::{CreatorOutput, CreatorResult, StepOutput};
pub use dest::{
    air_gap_at, blow_out_at, dispense_at, drop_tip_at, resolve_destination, trash_bin_area,
    waste_chute_area, LiquidDestination,
};
pub use intent::{execute, CommandIntent};
pub use pipeline::{generate_step, generate_timeline, reduce_intents, Timeline, TimelineError};
pub use selectors::{
    active_channels, is_in_column_4, labware_slot, next_tip, next_tiprack,
    pipette_with_tip_max_volume, sort_labware_by_slot,
};
pub use transitions::apply_instruction;
