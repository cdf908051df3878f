//! Module step creators: temperature module, heater-shaker, magnet.

use crate::creator::StepOutput;
use crate::intent::CommandIntent;
use crate::pipeline;
use stepgen_types::{
    DeactivateTemperatureArgs, DisengageMagnetArgs, EngageMagnetArgs, EntityCatalog,
    GenerationError, HeaterShakerArgs, RobotState, SetTemperatureArgs, WaitForTemperatureArgs,
};

pub fn set_temperature(
    args: &SetTemperatureArgs,
    catalog: &EntityCatalog,
    state: &RobotState,
) -> Result<StepOutput, Vec<GenerationError>> {
    let intents = vec![CommandIntent::SetTemperature {
        module: args.module.clone(),
        celsius: args.celsius,
    }];
    pipeline::reduce_intents(&intents, catalog, state.clone())
}

pub fn wait_for_temperature(
    args: &WaitForTemperatureArgs,
    catalog: &EntityCatalog,
    state: &RobotState,
) -> Result<StepOutput, Vec<GenerationError>> {
    let intents = vec![CommandIntent::WaitForTemperature {
        module: args.module.clone(),
        celsius: args.celsius,
    }];
    pipeline::reduce_intents(&intents, catalog, state.clone())
}

pub fn deactivate_temperature(
    args: &DeactivateTemperatureArgs,
    catalog: &EntityCatalog,
    state: &RobotState,
) -> Result<StepOutput, Vec<GenerationError>> {
    let intents = vec![CommandIntent::DeactivateTemperature {
        module: args.module.clone(),
    }];
    pipeline::reduce_intents(&intents, catalog, state.clone())
}

/// Drives the heater-shaker to the requested combined state. Heating
/// is commanded first, then shaking (closing the latch beforehand),
/// then the latch, and finally the optional timed run that shuts the
/// module back down.
pub fn heater_shaker(
    args: &HeaterShakerArgs,
    catalog: &EntityCatalog,
    state: &RobotState,
) -> Result<StepOutput, Vec<GenerationError>> {
    let module = &args.module;
    let mut intents = Vec::new();

    match args.target_temperature {
        Some(celsius) => intents.push(CommandIntent::HeaterShakerSetTemperature {
            module: module.clone(),
            celsius,
        }),
        None => intents.push(CommandIntent::HeaterShakerDeactivateHeater {
            module: module.clone(),
        }),
    }
    match args.rpm {
        Some(rpm) => {
            intents.push(CommandIntent::HeaterShakerLatch {
                module: module.clone(),
                open: false,
            });
            intents.push(CommandIntent::HeaterShakerShake {
                module: module.clone(),
                rpm,
            });
        }
        None => intents.push(CommandIntent::HeaterShakerStopShake {
            module: module.clone(),
        }),
    }
    if args.latch_open && args.rpm.is_none() {
        intents.push(CommandIntent::HeaterShakerLatch {
            module: module.clone(),
            open: true,
        });
    }
    if let Some(seconds) = args.timer_seconds {
        intents.push(CommandIntent::Delay { seconds });
        intents.push(CommandIntent::HeaterShakerStopShake {
            module: module.clone(),
        });
        intents.push(CommandIntent::HeaterShakerDeactivateHeater {
            module: module.clone(),
        });
    }

    pipeline::reduce_intents(&intents, catalog, state.clone())
}

pub fn engage_magnet(
    args: &EngageMagnetArgs,
    catalog: &EntityCatalog,
    state: &RobotState,
) -> Result<StepOutput, Vec<GenerationError>> {
    let intents = vec![CommandIntent::EngageMagnet {
        module: args.module.clone(),
        height_mm: args.height_mm,
    }];
    pipeline::reduce_intents(&intents, catalog, state.clone())
}

pub fn disengage_magnet(
    args: &DisengageMagnetArgs,
    catalog: &EntityCatalog,
    state: &RobotState,
) -> Result<StepOutput, Vec<GenerationError>> {
    let intents = vec![CommandIntent::DisengageMagnet {
        module: args.module.clone(),
    }];
    pipeline::reduce_intents(&intents, catalog, state.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::*;
    use stepgen_types::{Instruction, ModuleId, ModuleState};

    #[test]
    fn set_temperature_marks_module_approaching() {
        let (catalog, state) = context_with_temperature_module();
        let args = SetTemperatureArgs {
            module: ModuleId::new(TEMP_MODULE),
            celsius: 40.0,
        };
        let out = set_temperature(&args, &catalog, &state).unwrap();
        assert_eq!(
            out.instructions,
            vec![Instruction::TemperatureModuleSetTarget {
                module: ModuleId::new(TEMP_MODULE),
                celsius: 40.0,
            }]
        );
        match out.state.module_state(&ModuleId::new(TEMP_MODULE)) {
            Some(ModuleState::Temperature { target, .. }) => assert_eq!(*target, Some(40.0)),
            other => panic!("unexpected module state: {other:?}"),
        }
    }

    #[test]
    fn timed_shake_winds_the_module_back_down() {
        let (catalog, state) = context_with_heater_shaker();
        let args = HeaterShakerArgs {
            module: ModuleId::new(HS_MODULE),
            target_temperature: Some(37.0),
            rpm: Some(500.0),
            latch_open: false,
            timer_seconds: Some(60.0),
        };
        let out = heater_shaker(&args, &catalog, &state).unwrap();
        let kinds: Vec<&str> = out.instructions.iter().map(|i| i.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                "heaterShaker/setTargetTemperature",
                "heaterShaker/closeLabwareLatch",
                "heaterShaker/setAndWaitForShakeSpeed",
                "waitForDuration",
                "heaterShaker/deactivateShaker",
                "heaterShaker/deactivateHeater",
            ]
        );
        match out.state.module_state(&ModuleId::new(HS_MODULE)) {
            Some(ModuleState::HeaterShaker {
                target_temp,
                target_speed,
                ..
            }) => {
                assert_eq!(*target_temp, None);
                assert_eq!(*target_speed, None);
            }
            other => panic!("unexpected module state: {other:?}"),
        }
    }

    #[test]
    fn engage_magnet_flips_state() {
        let (catalog, state) = context_with_magnetic_module();
        let args = EngageMagnetArgs {
            module: ModuleId::new(MAG_MODULE),
            height_mm: 10.0,
        };
        let out = engage_magnet(&args, &catalog, &state).unwrap();
        assert_eq!(
            out.state.module_state(&ModuleId::new(MAG_MODULE)),
            Some(&ModuleState::Magnetic { engaged: true })
        );
    }
}
