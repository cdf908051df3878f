//! The transfer family: transfer, consolidate, distribute, mix.
//!
//! All four plan their work as chunks sized by the pipette's
//! effective capacity (the lesser of pipette and fitted-tip maxima),
//! then emit one flat intent sequence covering every chunk. Tip
//! policy, air gaps, touch-tips, delays, mixes, and blow-outs hang
//! off each chunk in a fixed order so identical arguments always
//! yield an identical instruction stream.

use super::{
    aspirate_intent, delay_in_well_intents, dispense_air_gap_intent, dispense_intent, mix_intents,
    replace_tip_intent, replaces_tip, resolve_blowout_destination, touch_tip_intent,
};
use crate::creator::StepOutput;
use crate::dest::{resolve_destination, LiquidDestination};
use crate::intent::CommandIntent;
use crate::pipeline;
use crate::selectors;
use stepgen_types::{
    ChangeTip, ConsolidateArgs, DistributeArgs, EntityCatalog, GenerationError, LabwareId,
    MixArgs, PipetteId, PipetteSpec, RobotState, TransferArgs, TransferFamilyOptions, WellName,
};
use tracing::debug;

/// Step-level prologue shared by the family: the pipette must exist,
/// and the effective volume ceiling comes from pipette plus tip.
fn effective_max<'a>(
    pipette: &PipetteId,
    tip_rack_uri: &str,
    catalog: &'a EntityCatalog,
) -> Result<(&'a PipetteSpec, f64), Vec<GenerationError>> {
    let Some(spec) = catalog.pipette(pipette) else {
        return Err(vec![GenerationError::PipetteDoesNotExist {
            pipette: pipette.clone(),
        }]);
    };
    let max = selectors::pipette_with_tip_max_volume(pipette, catalog, tip_rack_uri)
        .unwrap_or(spec.max_volume);
    Ok((spec, max))
}

/// End-of-chunk housekeeping: blow-out, then (when the tip will not
/// be reused) a protective air gap and the tip drop.
#[allow(clippy::too_many_arguments)]
fn chunk_epilogue(
    pipette: &PipetteId,
    source: (&LabwareId, &WellName),
    dest: &LiquidDestination,
    options: &TransferFamilyOptions,
    is_last_chunk: bool,
    forced_blowout: bool,
    catalog: &EntityCatalog,
    intents: &mut Vec<CommandIntent>,
) -> Result<(), Vec<GenerationError>> {
    if let Some(location) = &options.blowout_location {
        let blowout_dest = resolve_blowout_destination(location, source, dest, catalog)?;
        intents.push(CommandIntent::BlowOutAt {
            pipette: pipette.clone(),
            destination: blowout_dest,
            flow_rate: options.blowout_flow_rate,
            offset_from_top_mm: options.blowout_offset_from_top_mm,
        });
    } else if forced_blowout {
        // disposal volume must leave the tip somewhere; without a
        // configured location it goes where tips are dropped
        let blowout_dest = super::equipment_destination(&options.drop_tip_location, catalog)?;
        intents.push(CommandIntent::BlowOutAt {
            pipette: pipette.clone(),
            destination: blowout_dest,
            flow_rate: options.blowout_flow_rate,
            offset_from_top_mm: options.blowout_offset_from_top_mm,
        });
    }

    let will_reuse_tip = options.change_tip != ChangeTip::Always && !is_last_chunk;
    if !will_reuse_tip {
        if options.dispense_air_gap_volume > 0.0 {
            intents.push(CommandIntent::AirGapAt {
                pipette: pipette.clone(),
                destination: dest.clone(),
                volume: options.dispense_air_gap_volume,
                flow_rate: options.aspirate_flow_rate,
                tip_rack_uri: options.tip_rack_uri.clone(),
            });
        }
        if is_last_chunk && options.change_tip != ChangeTip::Never {
            intents.push(CommandIntent::DropTipAt {
                pipette: pipette.clone(),
                location: options.drop_tip_location.clone(),
            });
        }
    }
    Ok(())
}

/// Aspirate-side trimmings, in emission order: air gap, touch-tip,
/// delay.
fn after_aspirate(
    pipette: &PipetteId,
    labware: &LabwareId,
    well: &WellName,
    options: &TransferFamilyOptions,
    intents: &mut Vec<CommandIntent>,
) {
    if options.aspirate_air_gap_volume > 0.0 {
        intents.push(CommandIntent::AirGapAt {
            pipette: pipette.clone(),
            destination: LiquidDestination::Well {
                labware: labware.clone(),
                well: well.clone(),
            },
            volume: options.aspirate_air_gap_volume,
            flow_rate: options.aspirate_flow_rate,
            tip_rack_uri: options.tip_rack_uri.clone(),
        });
    }
    if let Some(mm) = options.touch_tip_after_aspirate_mm_from_bottom {
        intents.push(touch_tip_intent(pipette, labware, well, mm));
    }
    if let Some(delay) = &options.aspirate_delay {
        intents.extend(delay_in_well_intents(pipette, labware, well, delay));
    }
}

/// Move a uniform volume from each source well to its paired
/// destination well.
///
/// Wells are paired positionally. A volume above the effective
/// capacity is split evenly across the fewest cycles that fit, so
/// every cycle of a pair moves the same amount.
pub fn transfer(
    args: &TransferArgs,
    catalog: &EntityCatalog,
    state: &RobotState,
) -> Result<StepOutput, Vec<GenerationError>> {
    let options = &args.options;
    let (spec, max) = effective_max(&args.pipette, &options.tip_rack_uri, catalog)?;
    let capacity = max - options.aspirate_air_gap_volume;
    if capacity <= 0.0 {
        return Err(vec![GenerationError::PipetteVolumeExceeded {
            volume: options.aspirate_air_gap_volume,
            max_volume: max,
            disposal_volume: None,
        }]);
    }

    struct Chunk<'a> {
        source: &'a WellName,
        dest: &'a WellName,
        volume: f64,
        first_of_pair: bool,
    }
    let mut chunks = Vec::new();
    for (source, dest) in args.source_wells.iter().zip(&args.dest_wells) {
        let cycles = (args.volume / capacity).ceil().max(1.0) as usize;
        let per_cycle = args.volume / cycles as f64;
        for cycle in 0..cycles {
            chunks.push(Chunk {
                source,
                dest,
                volume: per_cycle,
                first_of_pair: cycle == 0,
            });
        }
    }
    debug!(chunks = chunks.len(), "planned transfer");

    let total = chunks.len();
    let mut intents = Vec::new();
    for (index, chunk) in chunks.iter().enumerate() {
        let is_last = index + 1 == total;
        if replaces_tip(options.change_tip, index) {
            intents.push(replace_tip_intent(&args.pipette, options));
        }
        if spec.is_low_volume {
            intents.push(CommandIntent::ConfigureForVolume {
                pipette: args.pipette.clone(),
                volume: chunk.volume,
            });
        }
        if args.pre_wet_tip && chunk.first_of_pair {
            intents.push(aspirate_intent(
                &args.pipette,
                &args.source_labware,
                chunk.source,
                chunk.volume,
                options,
            ));
            intents.push(dispense_intent(
                &args.pipette,
                &args.source_labware,
                chunk.source,
                chunk.volume,
                options,
            ));
        }
        if let Some(mix) = &args.mix_before_aspirate {
            intents.extend(mix_intents(
                &args.pipette,
                &args.source_labware,
                chunk.source,
                mix.volume,
                mix.times,
                options,
            ));
        }
        intents.push(aspirate_intent(
            &args.pipette,
            &args.source_labware,
            chunk.source,
            chunk.volume,
            options,
        ));
        after_aspirate(
            &args.pipette,
            &args.source_labware,
            chunk.source,
            options,
            &mut intents,
        );

        if options.aspirate_air_gap_volume > 0.0 {
            intents.push(dispense_air_gap_intent(
                &args.pipette,
                &args.dest_labware,
                chunk.dest,
                options.aspirate_air_gap_volume,
                options,
                catalog,
            ));
        }
        intents.push(dispense_intent(
            &args.pipette,
            &args.dest_labware,
            chunk.dest,
            chunk.volume,
            options,
        ));
        if let Some(mix) = &args.mix_in_destination {
            intents.extend(mix_intents(
                &args.pipette,
                &args.dest_labware,
                chunk.dest,
                mix.volume,
                mix.times,
                options,
            ));
        }
        if let Some(mm) = options.touch_tip_after_dispense_mm_from_bottom {
            intents.push(touch_tip_intent(
                &args.pipette,
                &args.dest_labware,
                chunk.dest,
                mm,
            ));
        }
        if let Some(delay) = &options.dispense_delay {
            intents.extend(delay_in_well_intents(
                &args.pipette,
                &args.dest_labware,
                chunk.dest,
                delay,
            ));
        }

        let dest = LiquidDestination::Well {
            labware: args.dest_labware.clone(),
            well: chunk.dest.clone(),
        };
        chunk_epilogue(
            &args.pipette,
            (&args.source_labware, chunk.source),
            &dest,
            options,
            is_last,
            false,
            catalog,
            &mut intents,
        )?;
    }

    pipeline::reduce_intents(&intents, catalog, state.clone())
}

/// Pool several source wells into one destination, as few trips as
/// the tip allows.
pub fn consolidate(
    args: &ConsolidateArgs,
    catalog: &EntityCatalog,
    state: &RobotState,
) -> Result<StepOutput, Vec<GenerationError>> {
    let options = &args.options;
    let (spec, max) = effective_max(&args.pipette, &options.tip_rack_uri, catalog)?;
    let per_well = args.volume + options.aspirate_air_gap_volume;
    let wells_per_chunk = (max / per_well).floor() as usize;
    if wells_per_chunk == 0 {
        return Err(vec![GenerationError::PipetteVolumeExceeded {
            volume: per_well,
            max_volume: max,
            disposal_volume: None,
        }]);
    }
    let dest = resolve_destination(&args.dest, args.dest_well.as_ref(), catalog)?;
    let chunk_count = args.source_wells.chunks(wells_per_chunk).count();
    debug!(chunks = chunk_count, wells_per_chunk, "planned consolidate");

    let mut intents = Vec::new();
    for (index, chunk) in args.source_wells.chunks(wells_per_chunk).enumerate() {
        let is_last = index + 1 == chunk_count;
        if replaces_tip(options.change_tip, index) {
            intents.push(replace_tip_intent(&args.pipette, options));
        }
        if spec.is_low_volume {
            intents.push(CommandIntent::ConfigureForVolume {
                pipette: args.pipette.clone(),
                volume: args.volume,
            });
        }
        for (well_index, source) in chunk.iter().enumerate() {
            if well_index == 0 {
                if args.pre_wet_tip {
                    intents.push(aspirate_intent(
                        &args.pipette,
                        &args.source_labware,
                        source,
                        args.volume,
                        options,
                    ));
                    intents.push(dispense_intent(
                        &args.pipette,
                        &args.source_labware,
                        source,
                        args.volume,
                        options,
                    ));
                }
                if let Some(mix) = &args.mix_first_aspirate {
                    intents.extend(mix_intents(
                        &args.pipette,
                        &args.source_labware,
                        source,
                        mix.volume,
                        mix.times,
                        options,
                    ));
                }
            }
            intents.push(aspirate_intent(
                &args.pipette,
                &args.source_labware,
                source,
                args.volume,
                options,
            ));
            after_aspirate(
                &args.pipette,
                &args.source_labware,
                source,
                options,
                &mut intents,
            );
        }

        let pooled = per_well * chunk.len() as f64;
        intents.push(CommandIntent::DispenseAt {
            pipette: args.pipette.clone(),
            destination: dest.clone(),
            volume: pooled,
            flow_rate: options.dispense_flow_rate,
            offset: stepgen_types::WellOffset {
                x: options.dispense_x_offset,
                y: options.dispense_y_offset,
                z: options.dispense_offset_from_bottom_mm,
            },
            tip_rack_uri: options.tip_rack_uri.clone(),
        });
        if let LiquidDestination::Well { labware, well } = &dest {
            if let Some(mix) = &args.mix_in_destination {
                intents.extend(mix_intents(
                    &args.pipette,
                    labware,
                    well,
                    mix.volume,
                    mix.times,
                    options,
                ));
            }
            if let Some(mm) = options.touch_tip_after_dispense_mm_from_bottom {
                intents.push(touch_tip_intent(&args.pipette, labware, well, mm));
            }
            if let Some(delay) = &options.dispense_delay {
                intents.extend(delay_in_well_intents(&args.pipette, labware, well, delay));
            }
        }

        let first_source = chunk.first().unwrap_or(&args.source_wells[0]);
        chunk_epilogue(
            &args.pipette,
            (&args.source_labware, first_source),
            &dest,
            options,
            is_last,
            false,
            catalog,
            &mut intents,
        )?;
    }

    pipeline::reduce_intents(&intents, catalog, state.clone())
}

/// Spread one source across many destination wells, one aspirate per
/// chunk of destinations.
pub fn distribute(
    args: &DistributeArgs,
    catalog: &EntityCatalog,
    state: &RobotState,
) -> Result<StepOutput, Vec<GenerationError>> {
    let options = &args.options;
    let (spec, max) = effective_max(&args.pipette, &options.tip_rack_uri, catalog)?;
    let disposal = args.disposal_volume.map(|v| v.max(0.0)).unwrap_or(0.0);
    let capacity = max - options.aspirate_air_gap_volume - disposal;
    let wells_per_chunk = (capacity / args.volume).floor() as usize;
    if wells_per_chunk == 0 {
        return Err(vec![GenerationError::PipetteVolumeExceeded {
            volume: args.volume,
            max_volume: max,
            disposal_volume: args.disposal_volume,
        }]);
    }
    let chunk_count = args.dest_wells.chunks(wells_per_chunk).count();
    debug!(chunks = chunk_count, wells_per_chunk, "planned distribute");

    let mut intents = Vec::new();
    for (index, chunk) in args.dest_wells.chunks(wells_per_chunk).enumerate() {
        let is_last = index + 1 == chunk_count;
        if replaces_tip(options.change_tip, index) {
            intents.push(replace_tip_intent(&args.pipette, options));
        }
        if spec.is_low_volume {
            intents.push(CommandIntent::ConfigureForVolume {
                pipette: args.pipette.clone(),
                volume: args.volume,
            });
        }
        if let Some(mix) = &args.mix_before_aspirate {
            intents.extend(mix_intents(
                &args.pipette,
                &args.source_labware,
                &args.source_well,
                mix.volume,
                mix.times,
                options,
            ));
        }
        intents.push(aspirate_intent(
            &args.pipette,
            &args.source_labware,
            &args.source_well,
            args.volume * chunk.len() as f64 + disposal,
            options,
        ));
        after_aspirate(
            &args.pipette,
            &args.source_labware,
            &args.source_well,
            options,
            &mut intents,
        );

        for (well_index, dest_well) in chunk.iter().enumerate() {
            if well_index == 0 && options.aspirate_air_gap_volume > 0.0 {
                intents.push(dispense_air_gap_intent(
                    &args.pipette,
                    &args.dest_labware,
                    dest_well,
                    options.aspirate_air_gap_volume,
                    options,
                    catalog,
                ));
            }
            intents.push(dispense_intent(
                &args.pipette,
                &args.dest_labware,
                dest_well,
                args.volume,
                options,
            ));
            if let Some(mm) = options.touch_tip_after_dispense_mm_from_bottom {
                intents.push(touch_tip_intent(&args.pipette, &args.dest_labware, dest_well, mm));
            }
            if let Some(delay) = &options.dispense_delay {
                intents.extend(delay_in_well_intents(
                    &args.pipette,
                    &args.dest_labware,
                    dest_well,
                    delay,
                ));
            }
        }

        let last_dest = chunk.last().unwrap_or(&args.dest_wells[0]);
        let dest = LiquidDestination::Well {
            labware: args.dest_labware.clone(),
            well: last_dest.clone(),
        };
        chunk_epilogue(
            &args.pipette,
            (&args.source_labware, &args.source_well),
            &dest,
            options,
            is_last,
            disposal > 0.0,
            catalog,
            &mut intents,
        )?;
    }

    pipeline::reduce_intents(&intents, catalog, state.clone())
}

/// Agitate each listed well in place.
pub fn mix(
    args: &MixArgs,
    catalog: &EntityCatalog,
    state: &RobotState,
) -> Result<StepOutput, Vec<GenerationError>> {
    let options = &args.options;
    let (spec, max) = effective_max(&args.pipette, &options.tip_rack_uri, catalog)?;
    if args.volume > max {
        return Err(vec![GenerationError::PipetteVolumeExceeded {
            volume: args.volume,
            max_volume: max,
            disposal_volume: None,
        }]);
    }

    let total = args.wells.len();
    let mut intents = Vec::new();
    for (index, well) in args.wells.iter().enumerate() {
        let is_last = index + 1 == total;
        if replaces_tip(options.change_tip, index) {
            intents.push(replace_tip_intent(&args.pipette, options));
        }
        if spec.is_low_volume {
            intents.push(CommandIntent::ConfigureForVolume {
                pipette: args.pipette.clone(),
                volume: args.volume,
            });
        }
        intents.extend(mix_intents(
            &args.pipette,
            &args.labware,
            well,
            args.volume,
            args.times,
            options,
        ));
        if let Some(mm) = args.touch_tip_mm_from_bottom {
            intents.push(touch_tip_intent(&args.pipette, &args.labware, well, mm));
        }

        let here = LiquidDestination::Well {
            labware: args.labware.clone(),
            well: well.clone(),
        };
        chunk_epilogue(
            &args.pipette,
            (&args.labware, well),
            &here,
            options,
            is_last,
            false,
            catalog,
            &mut intents,
        )?;
    }

    pipeline::reduce_intents(&intents, catalog, state.clone())
}
