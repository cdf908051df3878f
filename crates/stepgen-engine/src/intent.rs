//! Command intents and their dispatcher.
//!
//! A [`CommandIntent`] is an inspectable value describing one command
//! to generate: a tag plus fully-specified parameters. Compound
//! creators build flat `Vec<CommandIntent>` sequences; the pipeline
//! folds them through [`execute`], which validates each intent against
//! the state snapshot it will actually run in and emits instructions.
//!
//! Most variants map 1:1 onto an atomic creator. The last few
//! (`ReplaceTip`, `DropTipAt`) are composite: they expand into further
//! intents whose content depends on the threaded state (which tiprack
//! still has tips, what kind of fixture the drop location is), then
//! run the expansion through the same fold.

use crate::atomic::modules::ThermocyclerAction;
use crate::atomic::motion::MoveLabwareParams;
use crate::atomic::pipetting::{
    AspirateParams, BlowOutParams, DispenseParams, MoveToWellParams, TouchTipParams,
};
use crate::atomic::tips::PickUpTipParams;
use crate::atomic::{modules, motion, pipetting, tips};
use crate::creator::{CreatorOutput, CreatorResult};
use crate::dest;
use crate::selectors;
use crate::transitions;
use stepgen_types::{
    ChannelCount, EntityCatalog, EquipmentId, GenerationError, LabwareId, ModuleId, NozzleLayout,
    PipetteId, RobotState, WellName,
};
use tracing::debug;

/// One command to generate, as data.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandIntent {
    Aspirate(AspirateParams),
    Dispense(DispenseParams),
    BlowOut(BlowOutParams),
    TouchTip(TouchTipParams),
    MoveToWell(MoveToWellParams),
    MoveToAddressableArea {
        pipette: PipetteId,
        area: String,
    },
    AspirateInPlace {
        pipette: PipetteId,
        volume: f64,
        flow_rate: f64,
    },
    DispenseInPlace {
        pipette: PipetteId,
        volume: f64,
        flow_rate: f64,
    },
    BlowOutInPlace {
        pipette: PipetteId,
        flow_rate: f64,
    },
    PickUpTip(PickUpTipParams),
    DropTip {
        pipette: PipetteId,
        labware: LabwareId,
        well: WellName,
    },
    DropTipInPlace {
        pipette: PipetteId,
    },
    Delay {
        seconds: f64,
    },
    ConfigureForVolume {
        pipette: PipetteId,
        volume: f64,
    },
    ConfigureNozzleLayout {
        pipette: PipetteId,
        layout: NozzleLayout,
    },
    MoveLabware(MoveLabwareParams),
    SetTemperature {
        module: ModuleId,
        celsius: f64,
    },
    WaitForTemperature {
        module: ModuleId,
        celsius: Option<f64>,
    },
    DeactivateTemperature {
        module: ModuleId,
    },
    HeaterShakerSetTemperature {
        module: ModuleId,
        celsius: f64,
    },
    HeaterShakerWaitForTemperature {
        module: ModuleId,
    },
    HeaterShakerShake {
        module: ModuleId,
        rpm: f64,
    },
    HeaterShakerStopShake {
        module: ModuleId,
    },
    HeaterShakerDeactivateHeater {
        module: ModuleId,
    },
    HeaterShakerLatch {
        module: ModuleId,
        open: bool,
    },
    EngageMagnet {
        module: ModuleId,
        height_mm: f64,
    },
    DisengageMagnet {
        module: ModuleId,
    },
    Thermocycler {
        module: ModuleId,
        action: ThermocyclerAction,
    },
    /// Dispense at a resolved destination: directly into a well, or
    /// move-then-dispense-in-place for a trash fixture.
    DispenseAt {
        pipette: PipetteId,
        destination: dest::LiquidDestination,
        volume: f64,
        flow_rate: f64,
        offset: stepgen_types::WellOffset,
        tip_rack_uri: String,
    },
    /// Draw an air gap over a resolved destination.
    AirGapAt {
        pipette: PipetteId,
        destination: dest::LiquidDestination,
        volume: f64,
        flow_rate: f64,
        tip_rack_uri: String,
    },
    /// Blow out at a resolved destination.
    BlowOutAt {
        pipette: PipetteId,
        destination: dest::LiquidDestination,
        flow_rate: f64,
        offset_from_top_mm: f64,
    },
    /// Drop the current tip (if any) and pick a fresh one from the
    /// next tiprack of the given model, configuring the nozzle layout
    /// when it differs from the requested one.
    ReplaceTip {
        pipette: PipetteId,
        tip_rack_uri: String,
        drop_tip_location: EquipmentId,
        nozzles: Option<NozzleLayout>,
    },
    /// Drop the current tip at a trash bin or waste chute fixture.
    DropTipAt {
        pipette: PipetteId,
        location: EquipmentId,
    },
}

/// Validates one intent against the current snapshot and emits its
/// instructions.
pub fn execute(intent: &CommandIntent, catalog: &EntityCatalog, state: &RobotState) -> CreatorResult {
    match intent {
        CommandIntent::Aspirate(params) => pipetting::aspirate(params, catalog, state),
        CommandIntent::Dispense(params) => pipetting::dispense(params, catalog, state),
        CommandIntent::BlowOut(params) => pipetting::blow_out(params, catalog, state),
        CommandIntent::TouchTip(params) => pipetting::touch_tip(params, catalog, state),
        CommandIntent::MoveToWell(params) => pipetting::move_to_well(params, catalog, state),
        CommandIntent::MoveToAddressableArea { pipette, area } => {
            motion::move_to_addressable_area(pipette, area, catalog, state)
        }
        CommandIntent::AspirateInPlace {
            pipette,
            volume,
            flow_rate,
        } => pipetting::aspirate_in_place(pipette, *volume, *flow_rate, catalog, state),
        CommandIntent::DispenseInPlace {
            pipette,
            volume,
            flow_rate,
        } => pipetting::dispense_in_place(pipette, *volume, *flow_rate, catalog, state),
        CommandIntent::BlowOutInPlace { pipette, flow_rate } => {
            pipetting::blow_out_in_place(pipette, *flow_rate, catalog, state)
        }
        CommandIntent::PickUpTip(params) => tips::pick_up_tip(params, catalog, state),
        CommandIntent::DropTip {
            pipette,
            labware,
            well,
        } => tips::drop_tip(pipette, labware, well, catalog, state),
        CommandIntent::DropTipInPlace { pipette } => {
            tips::drop_tip_in_place(pipette, catalog, state)
        }
        CommandIntent::Delay { seconds } => motion::delay(*seconds),
        CommandIntent::ConfigureForVolume { pipette, volume } => {
            motion::configure_for_volume(pipette, *volume, catalog)
        }
        CommandIntent::ConfigureNozzleLayout { pipette, layout } => {
            motion::configure_nozzle_layout(pipette, *layout, catalog)
        }
        CommandIntent::MoveLabware(params) => motion::move_labware(params, catalog, state),
        CommandIntent::SetTemperature { module, celsius } => {
            modules::set_temperature(module, *celsius, catalog, state)
        }
        CommandIntent::WaitForTemperature { module, celsius } => {
            modules::wait_for_temperature(module, *celsius, catalog, state)
        }
        CommandIntent::DeactivateTemperature { module } => {
            modules::deactivate_temperature(module, catalog, state)
        }
        CommandIntent::HeaterShakerSetTemperature { module, celsius } => {
            modules::heater_shaker_set_temperature(module, *celsius, catalog, state)
        }
        CommandIntent::HeaterShakerWaitForTemperature { module } => {
            modules::heater_shaker_wait_for_temperature(module, catalog, state)
        }
        CommandIntent::HeaterShakerShake { module, rpm } => {
            modules::heater_shaker_shake(module, *rpm, catalog, state)
        }
        CommandIntent::HeaterShakerStopShake { module } => {
            modules::heater_shaker_stop_shake(module, catalog, state)
        }
        CommandIntent::HeaterShakerDeactivateHeater { module } => {
            modules::heater_shaker_deactivate_heater(module, catalog, state)
        }
        CommandIntent::HeaterShakerLatch { module, open } => {
            modules::heater_shaker_latch(module, *open, catalog, state)
        }
        CommandIntent::EngageMagnet { module, height_mm } => {
            modules::engage_magnet(module, *height_mm, catalog, state)
        }
        CommandIntent::DisengageMagnet { module } => {
            modules::disengage_magnet(module, catalog, state)
        }
        CommandIntent::Thermocycler { module, action } => {
            modules::thermocycler(module, action, catalog, state)
        }
        CommandIntent::DispenseAt {
            pipette,
            destination,
            volume,
            flow_rate,
            offset,
            tip_rack_uri,
        } => {
            let expanded = dest::dispense_at(
                pipette,
                destination,
                *volume,
                *flow_rate,
                *offset,
                tip_rack_uri,
                catalog,
                state,
            );
            run_expansion(&expanded, catalog, state)
        }
        CommandIntent::AirGapAt {
            pipette,
            destination,
            volume,
            flow_rate,
            tip_rack_uri,
        } => {
            let expanded = dest::air_gap_at(
                pipette,
                destination,
                *volume,
                *flow_rate,
                crate::compound::AIR_GAP_ABOVE_WELL_TOP_MM,
                tip_rack_uri,
                catalog,
                state,
            );
            run_expansion(&expanded, catalog, state)
        }
        CommandIntent::BlowOutAt {
            pipette,
            destination,
            flow_rate,
            offset_from_top_mm,
        } => {
            let expanded = dest::blow_out_at(
                pipette,
                destination,
                *flow_rate,
                *offset_from_top_mm,
                catalog,
                state,
            );
            run_expansion(&expanded, catalog, state)
        }
        CommandIntent::ReplaceTip {
            pipette,
            tip_rack_uri,
            drop_tip_location,
            nozzles,
        } => replace_tip(pipette, tip_rack_uri, drop_tip_location, *nozzles, catalog, state),
        CommandIntent::DropTipAt { pipette, location } => {
            let expanded = dest::drop_tip_at(pipette, location, catalog, state)?;
            run_expansion(&expanded, catalog, state)
        }
    }
}

/// Runs a composite expansion through its own fold, threading a
/// scratch copy of the state so later sub-intents see earlier effects.
/// The scratch state and the transition warnings it accumulates are
/// both discarded: the caller's fold re-applies every transition to
/// the returned instructions and re-derives those warnings itself, so
/// passing them through would report each one twice. Only warnings
/// raised by the creators are returned.
fn run_expansion(
    intents: &[CommandIntent],
    catalog: &EntityCatalog,
    state: &RobotState,
) -> CreatorResult {
    let mut scratch = state.clone();
    let mut instructions = Vec::new();
    let mut warnings = Vec::new();
    for intent in intents {
        let out = execute(intent, catalog, &scratch)?;
        let mut rederived = Vec::new();
        for instruction in &out.instructions {
            transitions::apply_instruction(instruction, catalog, &mut scratch, &mut rederived);
        }
        instructions.extend(out.instructions);
        warnings.extend(out.warnings);
    }
    Ok(CreatorOutput {
        instructions,
        warnings,
    })
}

fn replace_tip(
    pipette: &PipetteId,
    tip_rack_uri: &str,
    drop_tip_location: &EquipmentId,
    nozzles: Option<NozzleLayout>,
    catalog: &EntityCatalog,
    state: &RobotState,
) -> CreatorResult {
    let Some(spec) = catalog.pipette(pipette) else {
        return Err(vec![GenerationError::PipetteDoesNotExist {
            pipette: pipette.clone(),
        }]);
    };

    let mut intents = Vec::new();
    if state.pipette_has_tip(pipette) {
        intents.push(CommandIntent::DropTipAt {
            pipette: pipette.clone(),
            location: drop_tip_location.clone(),
        });
    }
    // a 96-channel switches layout before searching for tips, since
    // the layout decides whether a column or a full rack is needed
    if spec.channels == ChannelCount::NinetySix {
        let current = state.pipettes.get(pipette).and_then(|p| p.nozzles);
        let wanted = nozzles.unwrap_or(NozzleLayout::All);
        if current != Some(wanted) {
            intents.push(CommandIntent::ConfigureNozzleLayout {
                pipette: pipette.clone(),
                layout: wanted,
            });
        }
    }
    let effective_nozzles = if spec.channels == ChannelCount::NinetySix {
        Some(nozzles.unwrap_or(NozzleLayout::All))
    } else {
        None
    };
    let Some((tiprack, well)) =
        selectors::next_tiprack(pipette, tip_rack_uri, catalog, state, effective_nozzles)
    else {
        return Err(vec![GenerationError::InsufficientTips]);
    };
    debug!(pipette = %pipette, tiprack = %tiprack, well = %well, "replacing tip");
    intents.push(CommandIntent::PickUpTip(PickUpTipParams {
        pipette: pipette.clone(),
        tiprack,
        well,
    }));
    run_expansion(&intents, catalog, state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::*;

    #[test]
    fn replace_tip_picks_from_the_first_rack() {
        let (catalog, state) = standard_context();
        let intent = CommandIntent::ReplaceTip {
            pipette: PipetteId::new(P300_SINGLE),
            tip_rack_uri: TIPRACK_URI.to_string(),
            drop_tip_location: EquipmentId::new(TRASH_BIN),
            nozzles: None,
        };
        let out = execute(&intent, &catalog, &state).unwrap();
        assert_eq!(
            out.instructions,
            vec![stepgen_types::Instruction::PickUpTip {
                pipette: PipetteId::new(P300_SINGLE),
                tiprack: LabwareId::new(TIPRACK_1),
                well: WellName::new("A1"),
            }]
        );
    }

    #[test]
    fn replace_tip_drops_the_old_one_first() {
        let (catalog, mut state) = standard_context();
        give_tip(&mut state, P300_SINGLE);
        let intent = CommandIntent::ReplaceTip {
            pipette: PipetteId::new(P300_SINGLE),
            tip_rack_uri: TIPRACK_URI.to_string(),
            drop_tip_location: EquipmentId::new(TRASH_BIN),
            nozzles: None,
        };
        let out = execute(&intent, &catalog, &state).unwrap();
        let kinds: Vec<&str> = out.instructions.iter().map(|i| i.kind()).collect();
        assert_eq!(
            kinds,
            vec!["moveToAddressableArea", "dropTipInPlace", "pickUpTip"]
        );
    }

    #[test]
    fn replace_tip_with_no_racks_left_fails() {
        let (catalog, mut state) = standard_context();
        for rack in [TIPRACK_1, TIPRACK_2] {
            if let Some(wells) = state.tip_state.tipracks.get_mut(&LabwareId::new(rack)) {
                for present in wells.values_mut() {
                    *present = false;
                }
            }
        }
        let intent = CommandIntent::ReplaceTip {
            pipette: PipetteId::new(P300_SINGLE),
            tip_rack_uri: TIPRACK_URI.to_string(),
            drop_tip_location: EquipmentId::new(TRASH_BIN),
            nozzles: None,
        };
        assert_eq!(
            execute(&intent, &catalog, &state).unwrap_err(),
            vec![GenerationError::InsufficientTips]
        );
    }
}
