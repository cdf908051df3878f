//! Thermocycler step creators: state targets and full profiles.

use crate::atomic::modules::ThermocyclerAction;
use crate::creator::StepOutput;
use crate::intent::CommandIntent;
use crate::pipeline;
use stepgen_types::{
    EntityCatalog, GenerationError, ModuleId, ModuleState, ModuleType, ProfileStep, RobotState,
    ThermocyclerProfileArgs, ThermocyclerStateArgs,
};
use tracing::debug;

fn require_thermocycler(
    module: &ModuleId,
    catalog: &EntityCatalog,
    state: &RobotState,
) -> Result<(Option<f64>, Option<f64>, Option<bool>), Vec<GenerationError>> {
    let is_tc = catalog
        .module(module)
        .is_some_and(|spec| spec.module_type == ModuleType::Thermocycler);
    match state.module_state(module) {
        Some(ModuleState::Thermocycler {
            block_target,
            lid_target,
            lid_open,
        }) if is_tc => Ok((*block_target, *lid_target, *lid_open)),
        _ => Err(vec![GenerationError::MissingModule {
            module: module.clone(),
        }]),
    }
}

fn tc(module: &ModuleId, action: ThermocyclerAction) -> CommandIntent {
    CommandIntent::Thermocycler {
        module: module.clone(),
        action,
    }
}

/// Drives the thermocycler to a requested lid/block state, emitting
/// only the commands for what actually changes. Lid position moves
/// first so block commands never run against a half-open lid.
pub fn thermocycler_state(
    args: &ThermocyclerStateArgs,
    catalog: &EntityCatalog,
    state: &RobotState,
) -> Result<StepOutput, Vec<GenerationError>> {
    let module = &args.module;
    let (cur_block, cur_lid, cur_lid_open) = require_thermocycler(module, catalog, state)?;

    let mut intents = Vec::new();
    if cur_lid_open != Some(args.lid_open) {
        let action = if args.lid_open {
            ThermocyclerAction::OpenLid
        } else {
            ThermocyclerAction::CloseLid
        };
        intents.push(tc(module, action));
    }
    if cur_block != args.block_target_temp {
        match args.block_target_temp {
            Some(celsius) => intents.push(tc(module, ThermocyclerAction::SetBlockTemperature(celsius))),
            None => intents.push(tc(module, ThermocyclerAction::DeactivateBlock)),
        }
    }
    if cur_lid != args.lid_target_temp {
        match args.lid_target_temp {
            Some(celsius) => intents.push(tc(module, ThermocyclerAction::SetLidTemperature(celsius))),
            None => intents.push(tc(module, ThermocyclerAction::DeactivateLid)),
        }
    }
    debug!(commands = intents.len(), "thermocycler state diff");

    pipeline::reduce_intents(&intents, catalog, state.clone())
}

/// Expands cycles into the flat plateau list the device executes.
fn flatten_cycles(args: &ThermocyclerProfileArgs) -> Vec<ProfileStep> {
    let mut profile = Vec::new();
    for cycle in &args.cycles {
        for _ in 0..cycle.repetitions {
            profile.extend(cycle.steps.iter().copied());
        }
    }
    profile
}

/// Runs a full profile: lid closed and at temperature (skipping
/// whatever already holds), the flattened cycle list, then a state
/// diff from the post-profile snapshot to the requested hold state.
pub fn thermocycler_profile(
    args: &ThermocyclerProfileArgs,
    catalog: &EntityCatalog,
    state: &RobotState,
) -> Result<StepOutput, Vec<GenerationError>> {
    let module = &args.module;
    let (_, cur_lid, cur_lid_open) = require_thermocycler(module, catalog, state)?;

    let mut intents = Vec::new();
    if cur_lid_open != Some(false) {
        intents.push(tc(module, ThermocyclerAction::CloseLid));
    }
    if cur_lid != Some(args.profile_target_lid_temp) {
        intents.push(tc(
            module,
            ThermocyclerAction::SetLidTemperature(args.profile_target_lid_temp),
        ));
        intents.push(tc(module, ThermocyclerAction::WaitForLidTemperature));
    }
    intents.push(tc(
        module,
        ThermocyclerAction::RunProfile {
            profile: flatten_cycles(args),
            block_max_volume: Some(args.profile_volume),
        },
    ));
    let run = pipeline::reduce_intents(&intents, catalog, state.clone())?;

    // the profile leaves the block at the final plateau and the lid at
    // the profile target; the hold only emits what still differs
    let hold = thermocycler_state(
        &ThermocyclerStateArgs {
            module: module.clone(),
            block_target_temp: args.block_target_temp_hold,
            lid_target_temp: args.lid_target_temp_hold,
            lid_open: args.lid_open_hold,
        },
        catalog,
        &run.state,
    )?;

    let mut instructions = run.instructions;
    instructions.extend(hold.instructions);
    let mut warnings = run.warnings;
    warnings.extend(hold.warnings);
    Ok(StepOutput {
        instructions,
        warnings,
        state: hold.state,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::*;
    use stepgen_types::ProfileCycle;

    fn state_args(
        block: Option<f64>,
        lid: Option<f64>,
        lid_open: bool,
    ) -> ThermocyclerStateArgs {
        ThermocyclerStateArgs {
            module: ModuleId::new(TC_MODULE),
            block_target_temp: block,
            lid_target_temp: lid,
            lid_open,
        }
    }

    #[test]
    fn no_change_emits_no_commands() {
        let (catalog, mut state) = context_with_thermocycler();
        set_thermocycler_lid(&mut state, false);
        let out = thermocycler_state(&state_args(None, None, false), &catalog, &state).unwrap();
        assert!(out.instructions.is_empty());
    }

    #[test]
    fn full_state_change_emits_lid_then_block_then_lid_temp() {
        let (catalog, mut state) = context_with_thermocycler();
        set_thermocycler_lid(&mut state, false);
        let out =
            thermocycler_state(&state_args(Some(95.0), Some(105.0), true), &catalog, &state)
                .unwrap();
        let kinds: Vec<&str> = out.instructions.iter().map(|i| i.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                "thermocycler/openLid",
                "thermocycler/setTargetBlockTemperature",
                "thermocycler/setTargetLidTemperature",
            ]
        );
    }

    #[test]
    fn clearing_targets_deactivates() {
        let (catalog, mut state) = context_with_thermocycler();
        set_thermocycler_lid(&mut state, false);
        set_thermocycler_targets(&mut state, Some(95.0), Some(105.0));
        let out = thermocycler_state(&state_args(None, None, false), &catalog, &state).unwrap();
        let kinds: Vec<&str> = out.instructions.iter().map(|i| i.kind()).collect();
        assert_eq!(
            kinds,
            vec!["thermocycler/deactivateBlock", "thermocycler/deactivateLid"]
        );
    }

    #[test]
    fn profile_repeats_cycles_and_holds() {
        let (catalog, mut state) = context_with_thermocycler();
        set_thermocycler_lid(&mut state, true);
        let args = ThermocyclerProfileArgs {
            module: ModuleId::new(TC_MODULE),
            cycles: vec![ProfileCycle {
                steps: vec![
                    ProfileStep {
                        celsius: 95.0,
                        hold_seconds: 30.0,
                    },
                    ProfileStep {
                        celsius: 60.0,
                        hold_seconds: 45.0,
                    },
                ],
                repetitions: 3,
            }],
            profile_target_lid_temp: 105.0,
            profile_volume: 25.0,
            block_target_temp_hold: Some(4.0),
            lid_target_temp_hold: None,
            lid_open_hold: false,
        };
        let out = thermocycler_profile(&args, &catalog, &state).unwrap();
        let kinds: Vec<&str> = out.instructions.iter().map(|i| i.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                "thermocycler/closeLid",
                "thermocycler/setTargetLidTemperature",
                "thermocycler/waitForLidTemperature",
                "thermocycler/runProfile",
                "thermocycler/setTargetBlockTemperature",
                "thermocycler/deactivateLid",
            ]
        );
        match &out.instructions[3] {
            stepgen_types::Instruction::ThermocyclerRunProfile { profile, .. } => {
                assert_eq!(profile.len(), 6);
                assert_eq!(profile[0].celsius, 95.0);
                assert_eq!(profile[5].celsius, 60.0);
            }
            other => panic!("expected runProfile, got {other:?}"),
        }
    }

    #[test]
    fn profile_skips_lid_and_hold_commands_already_in_effect() {
        let (catalog, mut state) = context_with_thermocycler();
        set_thermocycler_lid(&mut state, false);
        set_thermocycler_targets(&mut state, None, Some(105.0));
        let args = ThermocyclerProfileArgs {
            module: ModuleId::new(TC_MODULE),
            cycles: vec![ProfileCycle {
                steps: vec![
                    ProfileStep {
                        celsius: 95.0,
                        hold_seconds: 30.0,
                    },
                    ProfileStep {
                        celsius: 60.0,
                        hold_seconds: 45.0,
                    },
                ],
                repetitions: 1,
            }],
            profile_target_lid_temp: 105.0,
            profile_volume: 25.0,
            // the profile itself leaves the block at 60.0 and the lid
            // target at 105.0, so the hold has nothing left to do
            block_target_temp_hold: Some(60.0),
            lid_target_temp_hold: Some(105.0),
            lid_open_hold: false,
        };
        let out = thermocycler_profile(&args, &catalog, &state).unwrap();
        let kinds: Vec<&str> = out.instructions.iter().map(|i| i.kind()).collect();
        assert_eq!(kinds, vec!["thermocycler/runProfile"]);
    }
}
