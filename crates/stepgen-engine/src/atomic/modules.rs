//! Module control creators: temperature, heater-shaker, magnetic
//! block, and the thermocycler's atomic commands.

use crate::creator::{CreatorOutput, CreatorResult};
use stepgen_types::{
    EntityCatalog, GenerationError, Instruction, ModuleId, ModuleState, ModuleType, ProfileStep,
    RobotState,
};

fn require_module(
    module: &ModuleId,
    module_type: ModuleType,
    catalog: &EntityCatalog,
    state: &RobotState,
) -> Result<(), Vec<GenerationError>> {
    let present = catalog
        .module(module)
        .is_some_and(|spec| spec.module_type == module_type)
        && state.modules.contains_key(module);
    if present {
        Ok(())
    } else {
        Err(vec![GenerationError::MissingModule {
            module: module.clone(),
        }])
    }
}

pub fn set_temperature(
    module: &ModuleId,
    celsius: f64,
    catalog: &EntityCatalog,
    state: &RobotState,
) -> CreatorResult {
    require_module(module, ModuleType::Temperature, catalog, state)?;
    Ok(CreatorOutput::one(Instruction::TemperatureModuleSetTarget {
        module: module.clone(),
        celsius,
    }))
}

/// Waits until the module reaches a target. With no explicit target
/// the module's commanded target is used; a module that was never
/// given one cannot be waited on.
pub fn wait_for_temperature(
    module: &ModuleId,
    celsius: Option<f64>,
    catalog: &EntityCatalog,
    state: &RobotState,
) -> CreatorResult {
    require_module(module, ModuleType::Temperature, catalog, state)?;
    let current_target = match state.module_state(module) {
        Some(ModuleState::Temperature { target, .. }) => *target,
        _ => None,
    };
    let Some(celsius) = celsius.or(current_target) else {
        return Err(vec![GenerationError::MissingModule {
            module: module.clone(),
        }]);
    };
    Ok(CreatorOutput::one(
        Instruction::TemperatureModuleWaitForTarget {
            module: module.clone(),
            celsius,
        },
    ))
}

pub fn deactivate_temperature(
    module: &ModuleId,
    catalog: &EntityCatalog,
    state: &RobotState,
) -> CreatorResult {
    require_module(module, ModuleType::Temperature, catalog, state)?;
    Ok(CreatorOutput::one(Instruction::TemperatureModuleDeactivate {
        module: module.clone(),
    }))
}

pub fn heater_shaker_set_temperature(
    module: &ModuleId,
    celsius: f64,
    catalog: &EntityCatalog,
    state: &RobotState,
) -> CreatorResult {
    require_module(module, ModuleType::HeaterShaker, catalog, state)?;
    Ok(CreatorOutput::one(
        Instruction::HeaterShakerSetTargetTemperature {
            module: module.clone(),
            celsius,
        },
    ))
}

pub fn heater_shaker_wait_for_temperature(
    module: &ModuleId,
    catalog: &EntityCatalog,
    state: &RobotState,
) -> CreatorResult {
    require_module(module, ModuleType::HeaterShaker, catalog, state)?;
    Ok(CreatorOutput::one(
        Instruction::HeaterShakerWaitForTemperature {
            module: module.clone(),
        },
    ))
}

/// Spinning with the latch open would throw the labware; the latch
/// state is validated, not silently fixed.
pub fn heater_shaker_shake(
    module: &ModuleId,
    rpm: f64,
    catalog: &EntityCatalog,
    state: &RobotState,
) -> CreatorResult {
    require_module(module, ModuleType::HeaterShaker, catalog, state)?;
    if matches!(
        state.module_state(module),
        Some(ModuleState::HeaterShaker {
            latch_open: true,
            ..
        })
    ) {
        return Err(vec![GenerationError::HeaterShakerLatchOpen]);
    }
    Ok(CreatorOutput::one(Instruction::HeaterShakerSetShakeSpeed {
        module: module.clone(),
        rpm,
    }))
}

pub fn heater_shaker_stop_shake(
    module: &ModuleId,
    catalog: &EntityCatalog,
    state: &RobotState,
) -> CreatorResult {
    require_module(module, ModuleType::HeaterShaker, catalog, state)?;
    Ok(CreatorOutput::one(Instruction::HeaterShakerDeactivateShaker {
        module: module.clone(),
    }))
}

pub fn heater_shaker_deactivate_heater(
    module: &ModuleId,
    catalog: &EntityCatalog,
    state: &RobotState,
) -> CreatorResult {
    require_module(module, ModuleType::HeaterShaker, catalog, state)?;
    Ok(CreatorOutput::one(Instruction::HeaterShakerDeactivateHeater {
        module: module.clone(),
    }))
}

pub fn heater_shaker_latch(
    module: &ModuleId,
    open: bool,
    catalog: &EntityCatalog,
    state: &RobotState,
) -> CreatorResult {
    require_module(module, ModuleType::HeaterShaker, catalog, state)?;
    let instruction = if open {
        Instruction::HeaterShakerOpenLatch {
            module: module.clone(),
        }
    } else {
        Instruction::HeaterShakerCloseLatch {
            module: module.clone(),
        }
    };
    Ok(CreatorOutput::one(instruction))
}

pub fn engage_magnet(
    module: &ModuleId,
    height_mm: f64,
    catalog: &EntityCatalog,
    state: &RobotState,
) -> CreatorResult {
    require_module(module, ModuleType::MagneticBlock, catalog, state)?;
    Ok(CreatorOutput::one(Instruction::MagneticModuleEngage {
        module: module.clone(),
        height_mm,
    }))
}

pub fn disengage_magnet(
    module: &ModuleId,
    catalog: &EntityCatalog,
    state: &RobotState,
) -> CreatorResult {
    require_module(module, ModuleType::MagneticBlock, catalog, state)?;
    Ok(CreatorOutput::one(Instruction::MagneticModuleDisengage {
        module: module.clone(),
    }))
}

/// One atomic thermocycler action.
#[derive(Debug, Clone, PartialEq)]
pub enum ThermocyclerAction {
    OpenLid,
    CloseLid,
    SetBlockTemperature(f64),
    WaitForBlockTemperature,
    SetLidTemperature(f64),
    WaitForLidTemperature,
    DeactivateBlock,
    DeactivateLid,
    RunProfile {
        profile: Vec<ProfileStep>,
        block_max_volume: Option<f64>,
    },
}

pub fn thermocycler(
    module: &ModuleId,
    action: &ThermocyclerAction,
    catalog: &EntityCatalog,
    state: &RobotState,
) -> CreatorResult {
    require_module(module, ModuleType::Thermocycler, catalog, state)?;
    let module = module.clone();
    let instruction = match action {
        ThermocyclerAction::OpenLid => Instruction::ThermocyclerOpenLid { module },
        ThermocyclerAction::CloseLid => Instruction::ThermocyclerCloseLid { module },
        ThermocyclerAction::SetBlockTemperature(celsius) => {
            Instruction::ThermocyclerSetTargetBlockTemperature {
                module,
                celsius: *celsius,
            }
        }
        ThermocyclerAction::WaitForBlockTemperature => {
            Instruction::ThermocyclerWaitForBlockTemperature { module }
        }
        ThermocyclerAction::SetLidTemperature(celsius) => {
            Instruction::ThermocyclerSetTargetLidTemperature {
                module,
                celsius: *celsius,
            }
        }
        ThermocyclerAction::WaitForLidTemperature => {
            Instruction::ThermocyclerWaitForLidTemperature { module }
        }
        ThermocyclerAction::DeactivateBlock => Instruction::ThermocyclerDeactivateBlock { module },
        ThermocyclerAction::DeactivateLid => Instruction::ThermocyclerDeactivateLid { module },
        ThermocyclerAction::RunProfile {
            profile,
            block_max_volume,
        } => Instruction::ThermocyclerRunProfile {
            module,
            profile: profile.clone(),
            block_max_volume: *block_max_volume,
        },
    };
    Ok(CreatorOutput::one(instruction))
}
