//! The generation pipeline: folding intents and steps into timelines.
//!
//! Generation is a pure fold. [`reduce_intents`] threads one state
//! snapshot through a flat intent sequence, validating each intent
//! against the state it will actually execute in and applying the
//! transition for every emitted instruction. The first failing intent
//! aborts the whole fold with its errors; nothing it emitted survives.
//!
//! [`generate_timeline`] lifts the same fold to whole protocols: each
//! step yields a frame (instructions, warnings, resulting state), and
//! the first failing step ends the timeline with the frames generated
//! so far plus the error record.

use crate::compound;
use crate::creator::StepOutput;
use crate::intent::{self, CommandIntent};
use crate::transitions;
use stepgen_types::{EntityCatalog, GenerationError, RobotState, StepArgs};
use tracing::{debug, info};

/// Folds a flat intent sequence into instructions, warnings, and the
/// state after the last instruction.
pub fn reduce_intents(
    intents: &[CommandIntent],
    catalog: &EntityCatalog,
    initial: RobotState,
) -> Result<StepOutput, Vec<GenerationError>> {
    let mut state = initial;
    let mut instructions = Vec::new();
    let mut warnings = Vec::new();

    for intent in intents {
        let out = intent::execute(intent, catalog, &state)?;
        for instruction in &out.instructions {
            transitions::apply_instruction(instruction, catalog, &mut state, &mut warnings);
        }
        instructions.extend(out.instructions);
        warnings.extend(out.warnings);
    }

    Ok(StepOutput {
        instructions,
        warnings,
        state,
    })
}

/// Generates one user step against the previous snapshot.
pub fn generate_step(
    args: &StepArgs,
    catalog: &EntityCatalog,
    state: &RobotState,
) -> Result<StepOutput, Vec<GenerationError>> {
    match args {
        StepArgs::Transfer(args) => compound::transfer(args, catalog, state),
        StepArgs::Consolidate(args) => compound::consolidate(args, catalog, state),
        StepArgs::Distribute(args) => compound::distribute(args, catalog, state),
        StepArgs::Mix(args) => compound::mix(args, catalog, state),
        StepArgs::MoveLabware(args) => compound::move_labware(args, catalog, state),
        StepArgs::ThermocyclerProfile(args) => {
            compound::thermocycler_profile(args, catalog, state)
        }
        StepArgs::ThermocyclerState(args) => compound::thermocycler_state(args, catalog, state),
        StepArgs::SetTemperature(args) => compound::set_temperature(args, catalog, state),
        StepArgs::WaitForTemperature(args) => compound::wait_for_temperature(args, catalog, state),
        StepArgs::DeactivateTemperature(args) => {
            compound::deactivate_temperature(args, catalog, state)
        }
        StepArgs::HeaterShaker(args) => compound::heater_shaker(args, catalog, state),
        StepArgs::EngageMagnet(args) => compound::engage_magnet(args, catalog, state),
        StepArgs::DisengageMagnet(args) => compound::disengage_magnet(args, catalog, state),
    }
}

/// The errors that stopped a timeline, with the index of the step
/// that raised them.
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineError {
    pub step_index: usize,
    pub errors: Vec<GenerationError>,
}

/// A generated protocol prefix: one frame per successful step, plus
/// the error record if generation stopped early.
#[derive(Debug, Clone, PartialEq)]
pub struct Timeline {
    pub frames: Vec<StepOutput>,
    pub error: Option<TimelineError>,
}

impl Timeline {
    /// State after the last successful step, or `None` for an empty
    /// timeline.
    #[must_use]
    pub fn final_state(&self) -> Option<&RobotState> {
        self.frames.last().map(|frame| &frame.state)
    }
}

/// Generates a whole protocol, stopping at the first failing step.
#[must_use]
pub fn generate_timeline(
    steps: &[StepArgs],
    catalog: &EntityCatalog,
    initial: RobotState,
) -> Timeline {
    let mut frames: Vec<StepOutput> = Vec::new();
    let mut state = initial;

    for (step_index, step) in steps.iter().enumerate() {
        match generate_step(step, catalog, &state) {
            Ok(frame) => {
                debug!(
                    step_index,
                    instructions = frame.instructions.len(),
                    warnings = frame.warnings.len(),
                    "step generated"
                );
                state = frame.state.clone();
                frames.push(frame);
            }
            Err(errors) => {
                info!(step_index, errors = errors.len(), "timeline stopped");
                return Timeline {
                    frames,
                    error: Some(TimelineError { step_index, errors }),
                };
            }
        }
    }
    Timeline {
        frames,
        error: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atomic::pipetting::AspirateParams;
    use crate::fixtures::*;
    use stepgen_types::{LabwareId, PipetteId, WellName, WellOffset};

    #[test]
    fn failing_intent_aborts_the_whole_fold() {
        let (catalog, state) = standard_context();
        // no tip: the aspirate fails, so the preceding delay must not
        // leak into any output
        let intents = vec![
            CommandIntent::Delay { seconds: 1.0 },
            CommandIntent::Aspirate(AspirateParams {
                pipette: PipetteId::new(P300_SINGLE),
                labware: LabwareId::new(SOURCE_PLATE),
                well: WellName::new("A1"),
                volume: 10.0,
                flow_rate: 150.0,
                offset: WellOffset::z(0.5),
                is_air_gap: false,
                tip_rack_uri: TIPRACK_URI.to_string(),
            }),
        ];
        assert!(reduce_intents(&intents, &catalog, state).is_err());
    }

    #[test]
    fn fold_threads_state_between_intents() {
        let (catalog, state) = standard_context();
        let intents = vec![
            CommandIntent::ReplaceTip {
                pipette: PipetteId::new(P300_SINGLE),
                tip_rack_uri: TIPRACK_URI.to_string(),
                drop_tip_location: stepgen_types::EquipmentId::new(TRASH_BIN),
                nozzles: None,
            },
            // valid only because the previous intent picked up a tip
            CommandIntent::Aspirate(AspirateParams {
                pipette: PipetteId::new(P300_SINGLE),
                labware: LabwareId::new(SOURCE_PLATE),
                well: WellName::new("A1"),
                volume: 10.0,
                flow_rate: 150.0,
                offset: WellOffset::z(0.5),
                is_air_gap: false,
                tip_rack_uri: TIPRACK_URI.to_string(),
            }),
        ];
        let out = reduce_intents(&intents, &catalog, state).unwrap();
        assert_eq!(out.instructions.len(), 2);
        assert!(out.state.pipette_has_tip(&PipetteId::new(P300_SINGLE)));
    }

    #[test]
    fn fold_reports_each_warning_once() {
        let (catalog, mut state) = standard_context();
        give_tip(&mut state, P300_SINGLE);
        // pristine-well aspirate warns at the fold level; the blow-out
        // expands through a composite, which must not re-report it
        let intents = vec![
            CommandIntent::Aspirate(AspirateParams {
                pipette: PipetteId::new(P300_SINGLE),
                labware: LabwareId::new(DEST_PLATE),
                well: WellName::new("A1"),
                volume: 10.0,
                flow_rate: 150.0,
                offset: WellOffset::z(0.5),
                is_air_gap: false,
                tip_rack_uri: TIPRACK_URI.to_string(),
            }),
            CommandIntent::BlowOutAt {
                pipette: PipetteId::new(P300_SINGLE),
                destination: crate::dest::LiquidDestination::TrashBin(
                    stepgen_types::EquipmentId::new(TRASH_BIN),
                ),
                flow_rate: 300.0,
                offset_from_top_mm: -2.0,
            },
        ];
        let out = reduce_intents(&intents, &catalog, state).unwrap();
        assert_eq!(out.instructions.len(), 3);
        assert_eq!(
            out.warnings,
            vec![stepgen_types::GenerationWarning::AspirateFromPristineWell]
        );
    }
}
