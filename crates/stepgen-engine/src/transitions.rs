//! State transition functions, keyed by instruction kind.
//!
//! [`apply_instruction`] folds one emitted [`Instruction`] into a
//! [`RobotState`], pushing any liquid-tracking warnings. Transitions
//! never fail: validation happens in the command creators before an
//! instruction is emitted, so by the time one reaches this layer the
//! only judgement calls left are liquid bookkeeping ones, and those
//! degrade to warnings.
//!
//! Liquid movement follows the split/merge algebra of
//! [`LiquidContents`]: aspirating splits a proportional share out of
//! the well into each active channel, dispensing pushes air out of the
//! tip first and then a proportional share of the liquid. Shortfalls
//! are absorbed by the air pseudo-liquid so total volume is conserved
//! exactly along the whole timeline.

use stepgen_types::{
    ChannelCount, DeckLocation, EntityCatalog, GenerationWarning, Instruction, LabwareId,
    LiquidContents, LiquidId, LiquidState, ModuleState, NozzleLayout, PipetteId, RobotState,
    TemperatureStatus, WellName,
};

const VOLUME_EPSILON: f64 = 1e-9;

/// Channel geometry to use for well mapping: a 96 in column layout
/// addresses the deck like an 8-channel.
fn effective_channels(channels: ChannelCount, nozzles: Option<NozzleLayout>) -> ChannelCount {
    match (channels, nozzles) {
        (ChannelCount::NinetySix, Some(NozzleLayout::Column)) => ChannelCount::Eight,
        (c, _) => c,
    }
}

/// Divides every component of a composition by `n`.
fn per_channel_share(contents: &LiquidContents, n: usize) -> LiquidContents {
    let mut share = LiquidContents::default();
    for (id, v) in contents.iter() {
        share.set(id.clone(), v / n as f64);
    }
    share
}

/// Removes `volume` from a tip, air first, then liquid proportionally.
/// Returns the remaining tip contents and what was delivered.
fn dispense_from_tip(tip: &LiquidContents, volume: f64) -> (LiquidContents, LiquidContents) {
    let air = tip.volume_of(&LiquidId::air());
    let air_out = air.min(volume);
    let liquid_out = volume - air_out;

    let mut remaining = tip.clone();
    remaining.set(LiquidId::air(), air - air_out);
    let split = remaining.split(liquid_out);
    let mut delivered = split.dest;
    if air_out > 0.0 {
        delivered.set(
            LiquidId::air(),
            delivered.volume_of(&LiquidId::air()) + air_out,
        );
    }
    (split.source, delivered)
}

/// Applies one instruction to the state in place.
///
/// The pipeline clones the previous snapshot before calling this, so
/// value semantics hold at the timeline level.
pub fn apply_instruction(
    instruction: &Instruction,
    catalog: &EntityCatalog,
    state: &mut RobotState,
    warnings: &mut Vec<GenerationWarning>,
) {
    match instruction {
        Instruction::Aspirate {
            pipette,
            labware,
            well,
            volume,
            is_air_gap,
            ..
        } => {
            if *is_air_gap {
                air_gap_into_tips(pipette, *volume, catalog, state);
            } else {
                for_aspirate(pipette, labware, well, *volume, catalog, state, warnings);
            }
        }
        Instruction::Dispense {
            pipette,
            labware,
            well,
            volume,
            ..
        } => {
            for_dispense(pipette, labware, well, Some(*volume), catalog, state);
        }
        Instruction::BlowOut {
            pipette, labware, well, ..
        } => {
            for_dispense(pipette, labware, well, None, catalog, state);
        }
        Instruction::AspirateInPlace { pipette, volume, .. } => {
            air_gap_into_tips(pipette, *volume, catalog, state);
        }
        Instruction::DispenseInPlace { pipette, volume, .. } => {
            // delivered liquid leaves the tracked world (waste)
            discard_from_tips(pipette, Some(*volume), state);
        }
        Instruction::BlowOutInPlace { pipette, .. } => {
            discard_from_tips(pipette, None, state);
        }
        Instruction::PickUpTip {
            pipette,
            tiprack,
            well,
        } => {
            for_pick_up_tip(pipette, tiprack, well, catalog, state);
        }
        Instruction::DropTip {
            pipette, labware, well,
        } => {
            for_dispense(pipette, labware, well, None, catalog, state);
            clear_tip(pipette, state);
        }
        Instruction::DropTipInPlace { pipette } => {
            discard_from_tips(pipette, None, state);
            clear_tip(pipette, state);
        }
        Instruction::MoveLabware {
            labware,
            new_location,
            ..
        } => {
            for_move_labware(labware, new_location, catalog, state, warnings);
        }
        Instruction::ConfigureNozzleLayout { pipette, layout } => {
            if let Some(temporal) = state.pipettes.get_mut(pipette) {
                temporal.nozzles = Some(*layout);
            }
        }
        Instruction::TemperatureModuleSetTarget { module, celsius } => {
            if let Some(m) = state.modules.get_mut(module) {
                m.state = ModuleState::Temperature {
                    status: TemperatureStatus::Approaching,
                    target: Some(*celsius),
                };
            }
        }
        Instruction::TemperatureModuleWaitForTarget { module, celsius } => {
            if let Some(m) = state.modules.get_mut(module) {
                m.state = ModuleState::Temperature {
                    status: TemperatureStatus::AtTarget,
                    target: Some(*celsius),
                };
            }
        }
        Instruction::TemperatureModuleDeactivate { module } => {
            if let Some(m) = state.modules.get_mut(module) {
                m.state = ModuleState::Temperature {
                    status: TemperatureStatus::Deactivated,
                    target: None,
                };
            }
        }
        Instruction::HeaterShakerSetTargetTemperature { module, celsius } => {
            if let Some(ModuleState::HeaterShaker { target_temp, .. }) = module_state_mut(state, module)
            {
                *target_temp = Some(*celsius);
            }
        }
        Instruction::HeaterShakerSetShakeSpeed { module, rpm } => {
            if let Some(ModuleState::HeaterShaker {
                target_speed,
                latch_open,
                ..
            }) = module_state_mut(state, module)
            {
                *target_speed = Some(*rpm);
                *latch_open = false;
            }
        }
        Instruction::HeaterShakerDeactivateShaker { module } => {
            if let Some(ModuleState::HeaterShaker { target_speed, .. }) = module_state_mut(state, module)
            {
                *target_speed = None;
            }
        }
        Instruction::HeaterShakerDeactivateHeater { module } => {
            if let Some(ModuleState::HeaterShaker { target_temp, .. }) = module_state_mut(state, module)
            {
                *target_temp = None;
            }
        }
        Instruction::HeaterShakerOpenLatch { module } => {
            if let Some(ModuleState::HeaterShaker { latch_open, .. }) = module_state_mut(state, module)
            {
                *latch_open = true;
            }
        }
        Instruction::HeaterShakerCloseLatch { module } => {
            if let Some(ModuleState::HeaterShaker { latch_open, .. }) = module_state_mut(state, module)
            {
                *latch_open = false;
            }
        }
        Instruction::MagneticModuleEngage { module, .. } => {
            if let Some(ModuleState::Magnetic { engaged }) = module_state_mut(state, module) {
                *engaged = true;
            }
        }
        Instruction::MagneticModuleDisengage { module } => {
            if let Some(ModuleState::Magnetic { engaged }) = module_state_mut(state, module) {
                *engaged = false;
            }
        }
        Instruction::ThermocyclerOpenLid { module } => {
            if let Some(ModuleState::Thermocycler { lid_open, .. }) = module_state_mut(state, module)
            {
                *lid_open = Some(true);
            }
        }
        Instruction::ThermocyclerCloseLid { module } => {
            if let Some(ModuleState::Thermocycler { lid_open, .. }) = module_state_mut(state, module)
            {
                *lid_open = Some(false);
            }
        }
        Instruction::ThermocyclerSetTargetBlockTemperature { module, celsius } => {
            if let Some(ModuleState::Thermocycler { block_target, .. }) =
                module_state_mut(state, module)
            {
                *block_target = Some(*celsius);
            }
        }
        Instruction::ThermocyclerSetTargetLidTemperature { module, celsius } => {
            if let Some(ModuleState::Thermocycler { lid_target, .. }) = module_state_mut(state, module)
            {
                *lid_target = Some(*celsius);
            }
        }
        Instruction::ThermocyclerDeactivateBlock { module } => {
            if let Some(ModuleState::Thermocycler { block_target, .. }) =
                module_state_mut(state, module)
            {
                *block_target = None;
            }
        }
        Instruction::ThermocyclerDeactivateLid { module } => {
            if let Some(ModuleState::Thermocycler { lid_target, .. }) = module_state_mut(state, module)
            {
                *lid_target = None;
            }
        }
        Instruction::ThermocyclerRunProfile {
            module, profile, ..
        } => {
            // block holds the final plateau once the profile ends
            if let Some(ModuleState::Thermocycler { block_target, .. }) =
                module_state_mut(state, module)
            {
                *block_target = profile.last().map(|step| step.celsius);
            }
        }
        // pure motion and annotation: no state effect
        Instruction::TouchTip { .. }
        | Instruction::MoveToWell { .. }
        | Instruction::MoveToAddressableArea { .. }
        | Instruction::ConfigureForVolume { .. }
        | Instruction::WaitForDuration { .. }
        | Instruction::LoadPipette { .. }
        | Instruction::Home
        | Instruction::HeaterShakerWaitForTemperature { .. }
        | Instruction::ThermocyclerWaitForBlockTemperature { .. }
        | Instruction::ThermocyclerWaitForLidTemperature { .. } => {}
    }
}

fn module_state_mut<'a>(
    state: &'a mut RobotState,
    module: &stepgen_types::ModuleId,
) -> Option<&'a mut ModuleState> {
    state.modules.get_mut(module).map(|m| &mut m.state)
}

/// Number of channels that move liquid given the current layout.
fn active_channel_count(
    pipette: &PipetteId,
    catalog: &EntityCatalog,
    state: &RobotState,
) -> usize {
    let Some(spec) = catalog.pipette(pipette) else {
        return 1;
    };
    let nozzles = state.pipettes.get(pipette).and_then(|p| p.nozzles);
    crate::selectors::active_channels(spec.channels, nozzles)
}

/// Draws pure air into every active channel.
fn air_gap_into_tips(
    pipette: &PipetteId,
    volume: f64,
    catalog: &EntityCatalog,
    state: &mut RobotState,
) {
    let channels = active_channel_count(pipette, catalog, state);
    if let Some(tips) = state.liquid_state.pipettes.get_mut(pipette) {
        for tip in tips.iter_mut().take(channels) {
            *tip = tip.merge(&LiquidContents::air(volume));
        }
    }
}

/// Removes liquid from every active channel without a tracked
/// destination. `None` empties the tips entirely.
fn discard_from_tips(pipette: &PipetteId, volume: Option<f64>, state: &mut RobotState) {
    if let Some(tips) = state.liquid_state.pipettes.get_mut(pipette) {
        for tip in tips.iter_mut() {
            let out = volume.unwrap_or_else(|| tip.total_volume_with_air());
            let (remaining, _) = dispense_from_tip(tip, out);
            *tip = remaining;
        }
    }
}

fn clear_tip(pipette: &PipetteId, state: &mut RobotState) {
    state.tip_state.pipettes.insert(pipette.clone(), false);
    if let Some(tips) = state.liquid_state.pipettes.get_mut(pipette) {
        for tip in tips.iter_mut() {
            *tip = LiquidContents::default();
        }
    }
}

/// Liquid update for an aspirate. Four geometric cases fall out of
/// the tip-to-well mapping:
///
/// 1. single channel into one well,
/// 2. all channels sharing one well (trough),
/// 3. one well per channel (plate column),
/// 4. channel groups sharing column wells (96 over a reservoir).
fn for_aspirate(
    pipette: &PipetteId,
    labware: &LabwareId,
    well: &WellName,
    volume: f64,
    catalog: &EntityCatalog,
    state: &mut RobotState,
    warnings: &mut Vec<GenerationWarning>,
) {
    let Some(spec) = catalog.pipette(pipette) else {
        return;
    };
    let Some(def) = catalog.labware_def(labware) else {
        return;
    };
    let nozzles = state.pipettes.get(pipette).and_then(|p| p.nozzles);
    let eff = effective_channels(spec.channels, nozzles);
    let channels = crate::selectors::active_channels(spec.channels, nozzles);
    let Some(wft) = def.wells_for_tips(eff, well) else {
        return;
    };

    let LiquidState {
        labware: well_map,
        pipettes: tip_map,
    } = &mut state.liquid_state;
    let Some(wells) = well_map.get_mut(labware) else {
        return;
    };
    let Some(tips) = tip_map.get_mut(pipette) else {
        return;
    };

    let mut pristine = false;
    let mut over_aspirated = false;

    // (well, channel range) groups for the geometric cases above
    let groups: Vec<(&WellName, std::ops::Range<usize>)> = if wft.all_wells_shared {
        vec![(&wft.wells[0], 0..channels)]
    } else {
        let group = channels / wft.wells.len().max(1);
        wft.wells
            .iter()
            .enumerate()
            .map(|(i, w)| (w, i * group..(i + 1) * group))
            .collect()
    };

    for (target, channel_range) in groups {
        let Some(contents) = wells.get_mut(target) else {
            continue;
        };
        let group_size = channel_range.len();
        let requested = volume * group_size as f64;
        if contents.is_empty() {
            pristine = true;
        } else if requested > contents.total_volume() + VOLUME_EPSILON {
            over_aspirated = true;
        }
        let split = contents.split(requested);
        *contents = split.source;
        let share = per_channel_share(&split.dest, group_size);
        for tip in tips[channel_range].iter_mut() {
            *tip = tip.merge(&share);
        }
    }

    if pristine {
        warnings.push(GenerationWarning::AspirateFromPristineWell);
    }
    if over_aspirated {
        warnings.push(GenerationWarning::AspirateMoreThanWellContents);
    }
}

/// Liquid update for a dispense-like instruction. `volume: None`
/// empties the tips entirely (blow-out, drop-tip).
fn for_dispense(
    pipette: &PipetteId,
    labware: &LabwareId,
    well: &WellName,
    volume: Option<f64>,
    catalog: &EntityCatalog,
    state: &mut RobotState,
) {
    let Some(spec) = catalog.pipette(pipette) else {
        return;
    };
    let Some(def) = catalog.labware_def(labware) else {
        return;
    };
    let nozzles = state.pipettes.get(pipette).and_then(|p| p.nozzles);
    let eff = effective_channels(spec.channels, nozzles);
    let channels = crate::selectors::active_channels(spec.channels, nozzles);
    let Some(wft) = def.wells_for_tips(eff, well) else {
        return;
    };

    let LiquidState {
        labware: well_map,
        pipettes: tip_map,
    } = &mut state.liquid_state;
    let Some(wells) = well_map.get_mut(labware) else {
        return;
    };
    let Some(tips) = tip_map.get_mut(pipette) else {
        return;
    };

    let group = if wft.all_wells_shared {
        channels
    } else {
        channels / wft.wells.len().max(1)
    };
    for (i, tip) in tips.iter_mut().enumerate().take(channels) {
        let target = if wft.all_wells_shared {
            &wft.wells[0]
        } else {
            &wft.wells[i / group.max(1)]
        };
        let out = volume.unwrap_or_else(|| tip.total_volume_with_air());
        let (remaining, delivered) = dispense_from_tip(tip, out);
        *tip = remaining;
        if let Some(contents) = wells.get_mut(target) {
            *contents = contents.merge(&delivered);
        }
    }
}

/// Tip bitmap update for a pick-up: the pipette gains tips and the
/// addressed rack wells lose theirs (a column for an 8-channel, the
/// whole rack for a full 96 layout).
fn for_pick_up_tip(
    pipette: &PipetteId,
    tiprack: &LabwareId,
    well: &WellName,
    catalog: &EntityCatalog,
    state: &mut RobotState,
) {
    state.tip_state.pipettes.insert(pipette.clone(), true);
    if let Some(tips) = state.liquid_state.pipettes.get_mut(pipette) {
        for tip in tips.iter_mut() {
            *tip = LiquidContents::default();
        }
    }

    let Some(spec) = catalog.pipette(pipette) else {
        return;
    };
    let Some(def) = catalog.labware_def(tiprack) else {
        return;
    };
    let nozzles = state.pipettes.get(pipette).and_then(|p| p.nozzles);
    let eff = effective_channels(spec.channels, nozzles);
    let Some(wft) = def.wells_for_tips(eff, well) else {
        return;
    };
    if let Some(rack) = state.tip_state.tipracks.get_mut(tiprack) {
        for w in &wft.wells {
            rack.insert(w.clone(), false);
        }
    }
}

/// Location update for a labware move. Discarding into the waste
/// chute clears tracked tips and liquid, warning when either is
/// nontrivially lost.
fn for_move_labware(
    labware: &LabwareId,
    new_location: &DeckLocation,
    catalog: &EntityCatalog,
    state: &mut RobotState,
    warnings: &mut Vec<GenerationWarning>,
) {
    if *new_location == DeckLocation::WasteChute {
        let is_tiprack = catalog.labware_def(labware).is_some_and(|d| d.is_tiprack());
        if is_tiprack && state.tiprack_has_tips(labware) {
            warnings.push(GenerationWarning::TiprackInWasteChuteHasTips);
        }
        if state.labware_has_liquid(labware) {
            warnings.push(GenerationWarning::LabwareInWasteChuteHasLiquid);
        }
        if let Some(rack) = state.tip_state.tipracks.get_mut(labware) {
            for present in rack.values_mut() {
                *present = false;
            }
        }
        if let Some(wells) = state.liquid_state.labware.get_mut(labware) {
            for contents in wells.values_mut() {
                *contents = LiquidContents::default();
            }
        }
    }
    state
        .labware
        .insert(labware.clone(), new_location.clone());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::*;
    use stepgen_types::WellOffset;

    fn aspirate_instr(volume: f64) -> Instruction {
        Instruction::Aspirate {
            pipette: PipetteId::new(P300_SINGLE),
            labware: LabwareId::new(SOURCE_PLATE),
            well: WellName::new("A1"),
            volume,
            flow_rate: 150.0,
            offset: WellOffset::z(0.5),
            is_air_gap: false,
        }
    }

    #[test]
    fn aspirate_moves_liquid_into_the_tip() {
        let (catalog, mut state) = standard_context();
        fill_source_well(&mut state, "A1", "water", 100.0);
        let mut warnings = Vec::new();
        apply_instruction(&aspirate_instr(40.0), &catalog, &mut state, &mut warnings);

        assert!(warnings.is_empty());
        let tip = &state.liquid_state.pipettes[&PipetteId::new(P300_SINGLE)][0];
        assert!((tip.volume_of(&LiquidId::new("water")) - 40.0).abs() < 1e-9);
        let well = &state.liquid_state.labware[&LabwareId::new(SOURCE_PLATE)]
            [&WellName::new("A1")];
        assert!((well.total_volume() - 60.0).abs() < 1e-9);
    }

    #[test]
    fn aspirate_from_pristine_well_warns_and_draws_air() {
        let (catalog, mut state) = standard_context();
        let mut warnings = Vec::new();
        apply_instruction(&aspirate_instr(25.0), &catalog, &mut state, &mut warnings);

        assert_eq!(warnings, vec![GenerationWarning::AspirateFromPristineWell]);
        let tip = &state.liquid_state.pipettes[&PipetteId::new(P300_SINGLE)][0];
        assert_eq!(tip.volume_of(&LiquidId::air()), 25.0);
        assert_eq!(tip.total_volume(), 0.0);
    }

    #[test]
    fn shared_well_over_aspirate_splits_evenly_and_caps_with_air() {
        let (catalog, mut state) = standard_context();
        fill_trough_well(&mut state, "A1", "buffer", 300.0);
        let mut warnings = Vec::new();
        let instr = Instruction::Aspirate {
            pipette: PipetteId::new(P300_MULTI),
            labware: LabwareId::new(TROUGH),
            well: WellName::new("A1"),
            volume: 50.0,
            flow_rate: 150.0,
            offset: WellOffset::z(0.5),
            is_air_gap: false,
        };
        apply_instruction(&instr, &catalog, &mut state, &mut warnings);

        // 8 channels want 400 from a 300 µL well
        assert_eq!(
            warnings,
            vec![GenerationWarning::AspirateMoreThanWellContents]
        );
        let tips = &state.liquid_state.pipettes[&PipetteId::new(P300_MULTI)];
        for tip in tips {
            assert!((tip.volume_of(&LiquidId::new("buffer")) - 37.5).abs() < 1e-9);
            assert!((tip.volume_of(&LiquidId::air()) - 12.5).abs() < 1e-9);
        }
        let well = &state.liquid_state.labware[&LabwareId::new(TROUGH)][&WellName::new("A1")];
        assert_eq!(well.total_volume(), 0.0);
    }

    #[test]
    fn dispense_pushes_air_out_before_liquid() {
        let (catalog, mut state) = standard_context();
        let pipette = PipetteId::new(P300_SINGLE);
        let mut tip = LiquidContents::single(LiquidId::new("water"), 50.0);
        tip.set(LiquidId::air(), 10.0);
        state.liquid_state.pipettes.insert(pipette.clone(), vec![tip]);

        let instr = Instruction::Dispense {
            pipette: pipette.clone(),
            labware: LabwareId::new(DEST_PLATE),
            well: WellName::new("B2"),
            volume: 30.0,
            flow_rate: 300.0,
            offset: WellOffset::z(0.5),
            is_air_gap: false,
        };
        let mut warnings = Vec::new();
        apply_instruction(&instr, &catalog, &mut state, &mut warnings);

        let tip = &state.liquid_state.pipettes[&pipette][0];
        assert_eq!(tip.volume_of(&LiquidId::air()), 0.0);
        assert!((tip.volume_of(&LiquidId::new("water")) - 30.0).abs() < 1e-9);
        let well = &state.liquid_state.labware[&LabwareId::new(DEST_PLATE)][&WellName::new("B2")];
        assert!((well.total_volume() - 20.0).abs() < 1e-9);
    }

    #[test]
    fn pick_up_with_eight_channel_consumes_a_column() {
        let (catalog, mut state) = standard_context();
        let instr = Instruction::PickUpTip {
            pipette: PipetteId::new(P300_MULTI),
            tiprack: LabwareId::new(TIPRACK_1),
            well: WellName::new("A1"),
        };
        let mut warnings = Vec::new();
        apply_instruction(&instr, &catalog, &mut state, &mut warnings);

        assert!(state.pipette_has_tip(&PipetteId::new(P300_MULTI)));
        let rack = &state.tip_state.tipracks[&LabwareId::new(TIPRACK_1)];
        for row in ["A", "B", "C", "D", "E", "F", "G", "H"] {
            assert_eq!(rack[&WellName::new(format!("{row}1"))], false);
        }
        assert_eq!(rack[&WellName::new("A2")], true);
    }

    #[test]
    fn drop_tip_empties_the_pipette() {
        let (catalog, mut state) = standard_context();
        let pipette = PipetteId::new(P300_SINGLE);
        state.tip_state.pipettes.insert(pipette.clone(), true);
        state.liquid_state.pipettes.insert(
            pipette.clone(),
            vec![LiquidContents::single(LiquidId::new("water"), 12.0)],
        );
        let instr = Instruction::DropTipInPlace {
            pipette: pipette.clone(),
        };
        let mut warnings = Vec::new();
        apply_instruction(&instr, &catalog, &mut state, &mut warnings);

        assert!(!state.pipette_has_tip(&pipette));
        assert!(state.liquid_state.pipettes[&pipette][0].is_empty());
    }

    #[test]
    fn discarding_a_full_tiprack_warns() {
        let (catalog, mut state) = standard_context();
        let instr = Instruction::MoveLabware {
            labware: LabwareId::new(TIPRACK_1),
            new_location: DeckLocation::WasteChute,
            use_gripper: true,
        };
        let mut warnings = Vec::new();
        apply_instruction(&instr, &catalog, &mut state, &mut warnings);

        assert_eq!(warnings, vec![GenerationWarning::TiprackInWasteChuteHasTips]);
        assert!(!state.tiprack_has_tips(&LabwareId::new(TIPRACK_1)));
        assert_eq!(
            state.labware[&LabwareId::new(TIPRACK_1)],
            DeckLocation::WasteChute
        );
    }

    #[test]
    fn thermocycler_profile_leaves_block_at_final_plateau() {
        let (catalog, mut state) = context_with_thermocycler();
        let instr = Instruction::ThermocyclerRunProfile {
            module: stepgen_types::ModuleId::new(TC_MODULE),
            profile: vec![
                stepgen_types::ProfileStep {
                    celsius: 95.0,
                    hold_seconds: 30.0,
                },
                stepgen_types::ProfileStep {
                    celsius: 72.0,
                    hold_seconds: 60.0,
                },
            ],
            block_max_volume: Some(25.0),
        };
        let mut warnings = Vec::new();
        apply_instruction(&instr, &catalog, &mut state, &mut warnings);

        match state.module_state(&stepgen_types::ModuleId::new(TC_MODULE)) {
            Some(ModuleState::Thermocycler { block_target, .. }) => {
                assert_eq!(*block_target, Some(72.0));
            }
            other => panic!("unexpected module state: {other:?}"),
        }
    }
}
