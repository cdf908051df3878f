//! End-to-end coverage of the transfer family through `generate_step`.

use stepgen_engine::fixtures::*;
use stepgen_engine::{generate_step, StepOutput};
use stepgen_types::{
    ChangeTip, ConsolidateArgs, DistributeArgs, GenerationError, GenerationWarning, Instruction,
    LabwareId, MixArgs, PipetteId, StepArgs, TransferArgs, TransferFamilyOptions, WellName,
};

fn transfer_args(
    pipette: &str,
    source: &str,
    source_wells: &[&str],
    dest: &str,
    dest_wells: &[&str],
    volume: f64,
    options: TransferFamilyOptions,
) -> StepArgs {
    StepArgs::Transfer(TransferArgs {
        pipette: PipetteId::new(pipette),
        source_labware: LabwareId::new(source),
        source_wells: source_wells.iter().copied().map(WellName::new).collect(),
        dest_labware: LabwareId::new(dest),
        dest_wells: dest_wells.iter().copied().map(WellName::new).collect(),
        volume,
        pre_wet_tip: false,
        mix_before_aspirate: None,
        mix_in_destination: None,
        options,
    })
}

fn liquid_aspirates(out: &StepOutput) -> Vec<f64> {
    out.instructions
        .iter()
        .filter_map(|i| match i {
            Instruction::Aspirate {
                volume,
                is_air_gap: false,
                ..
            } => Some(*volume),
            _ => None,
        })
        .collect()
}

fn count_kind(out: &StepOutput, kind: &str) -> usize {
    out.instructions.iter().filter(|i| i.kind() == kind).count()
}

#[test]
fn absent_pipette_fails_with_a_single_error_and_no_output() {
    let (catalog, state) = standard_context();
    let step = transfer_args(
        "ghostPipetteId",
        SOURCE_PLATE,
        &["A1"],
        DEST_PLATE,
        &["A1"],
        50.0,
        default_options(),
    );
    let errors = generate_step(&step, &catalog, &state).unwrap_err();
    assert_eq!(
        errors,
        vec![GenerationError::PipetteDoesNotExist {
            pipette: PipetteId::new("ghostPipetteId"),
        }]
    );
}

#[test]
fn over_capacity_transfer_splits_into_even_cycles() {
    let (catalog, mut state) = context_with_p1000();
    fill_trough_well(&mut state, "A1", "water", 2000.0);

    let mut options = default_options();
    options.tip_rack_uri = TIPRACK_1000_URI.to_string();
    let step = transfer_args(P1000_SINGLE, TROUGH, &["A1"], TROUGH, &["A2"], 1500.0, options);
    let out = generate_step(&step, &catalog, &state).unwrap();

    // 1500 µL with a 1000 µL ceiling: two cycles of 750, never 1000+500
    assert_eq!(liquid_aspirates(&out), vec![750.0, 750.0]);
    assert!(out.warnings.is_empty());

    let wells = &out.state.liquid_state.labware[&LabwareId::new(TROUGH)];
    assert!((wells[&WellName::new("A1")].total_volume() - 500.0).abs() < 1e-9);
    assert!((wells[&WellName::new("A2")].total_volume() - 1500.0).abs() < 1e-9);
}

#[test]
fn change_tip_policy_controls_pick_up_count() {
    let (catalog, mut state) = standard_context();
    for well in ["A1", "A2", "A3"] {
        fill_source_well(&mut state, well, "sample", 100.0);
    }

    let run = |change_tip: ChangeTip, state: &stepgen_types::RobotState| {
        let mut options = default_options();
        options.change_tip = change_tip;
        let step = transfer_args(
            P300_SINGLE,
            SOURCE_PLATE,
            &["A1", "A2", "A3"],
            DEST_PLATE,
            &["A1", "A2", "A3"],
            50.0,
            options,
        );
        generate_step(&step, &catalog, state).unwrap()
    };

    assert_eq!(count_kind(&run(ChangeTip::Always, &state), "pickUpTip"), 3);
    assert_eq!(count_kind(&run(ChangeTip::Once, &state), "pickUpTip"), 1);

    let mut with_tip = state.clone();
    give_tip(&mut with_tip, P300_SINGLE);
    let never = run(ChangeTip::Never, &with_tip);
    assert_eq!(count_kind(&never, "pickUpTip"), 0);
    assert_eq!(count_kind(&never, "dropTipInPlace"), 0);
}

#[test]
fn aspirating_from_an_untouched_well_warns() {
    let (catalog, state) = standard_context();
    let step = transfer_args(
        P300_SINGLE,
        SOURCE_PLATE,
        &["A1"],
        DEST_PLATE,
        &["A1"],
        50.0,
        default_options(),
    );
    let out = generate_step(&step, &catalog, &state).unwrap();
    assert!(out
        .warnings
        .contains(&GenerationWarning::AspirateFromPristineWell));
}

#[test]
fn eight_channel_shared_well_over_draw_caps_with_air() {
    let (catalog, mut state) = standard_context();
    fill_trough_well(&mut state, "A1", "buffer", 300.0);

    let step = transfer_args(
        P300_MULTI,
        TROUGH,
        &["A1"],
        DEST_PLATE,
        &["A1"],
        50.0,
        default_options(),
    );
    let out = generate_step(&step, &catalog, &state).unwrap();

    // 8 channels asked for 400 from a 300 µL well: each tip gets an
    // even share and the shortfall rides along as air
    assert!(out
        .warnings
        .contains(&GenerationWarning::AspirateMoreThanWellContents));
    let dest = &out.state.liquid_state.labware[&LabwareId::new(DEST_PLATE)];
    for row in ["A", "B", "C", "D", "E", "F", "G", "H"] {
        let well = &dest[&WellName::new(format!("{row}1"))];
        assert!((well.volume_of(&stepgen_types::LiquidId::new("buffer")) - 37.5).abs() < 1e-9);
    }
}

#[test]
fn consolidate_pools_as_many_wells_per_trip_as_the_tip_holds() {
    let (catalog, mut state) = standard_context();
    let sources = ["A1", "B1", "C1", "D1", "E1", "F1"];
    for well in sources {
        fill_source_well(&mut state, well, "eluate", 120.0);
    }

    let step = StepArgs::Consolidate(ConsolidateArgs {
        pipette: PipetteId::new(P300_SINGLE),
        source_labware: LabwareId::new(SOURCE_PLATE),
        source_wells: sources.iter().copied().map(WellName::new).collect(),
        dest: TROUGH.to_string(),
        dest_well: Some(WellName::new("A7")),
        volume: 100.0,
        pre_wet_tip: false,
        mix_first_aspirate: None,
        mix_in_destination: None,
        options: default_options(),
    });
    let out = generate_step(&step, &catalog, &state).unwrap();

    // 100 µL per well, 300 µL ceiling: chunks of three wells
    assert_eq!(liquid_aspirates(&out).len(), 6);
    let pooled: Vec<f64> = out
        .instructions
        .iter()
        .filter_map(|i| match i {
            Instruction::Dispense {
                volume,
                is_air_gap: false,
                ..
            } => Some(*volume),
            _ => None,
        })
        .collect();
    assert_eq!(pooled, vec![300.0, 300.0]);
    let dest = &out.state.liquid_state.labware[&LabwareId::new(TROUGH)][&WellName::new("A7")];
    assert!((dest.total_volume() - 600.0).abs() < 1e-9);
}

#[test]
fn distribute_reserves_disposal_volume_and_blows_it_out() {
    let (catalog, mut state) = standard_context();
    fill_trough_well(&mut state, "A1", "reagent", 1000.0);

    let dests = ["A1", "B1", "C1", "D1", "E1", "F1"];
    let step = StepArgs::Distribute(DistributeArgs {
        pipette: PipetteId::new(P300_SINGLE),
        source_labware: LabwareId::new(TROUGH),
        source_well: WellName::new("A1"),
        dest_labware: LabwareId::new(DEST_PLATE),
        dest_wells: dests.iter().copied().map(WellName::new).collect(),
        volume: 60.0,
        disposal_volume: Some(30.0),
        mix_before_aspirate: None,
        options: default_options(),
    });
    let out = generate_step(&step, &catalog, &state).unwrap();

    // capacity 270 after disposal: four wells per trip, then two
    assert_eq!(liquid_aspirates(&out), vec![270.0, 150.0]);
    let dispensed: Vec<f64> = out
        .instructions
        .iter()
        .filter_map(|i| match i {
            Instruction::Dispense {
                volume,
                is_air_gap: false,
                ..
            } => Some(*volume),
            _ => None,
        })
        .collect();
    assert_eq!(dispensed, vec![60.0; 6]);
    // the reserved 30 µL leaves the tip at the drop location each trip
    assert_eq!(count_kind(&out, "blowOutInPlace"), 2);
}

#[test]
fn distribute_with_an_impossible_volume_reports_the_disposal() {
    let (catalog, state) = standard_context();
    let step = StepArgs::Distribute(DistributeArgs {
        pipette: PipetteId::new(P300_SINGLE),
        source_labware: LabwareId::new(TROUGH),
        source_well: WellName::new("A1"),
        dest_labware: LabwareId::new(DEST_PLATE),
        dest_wells: vec![WellName::new("A1")],
        volume: 280.0,
        disposal_volume: Some(50.0),
        mix_before_aspirate: None,
        options: default_options(),
    });
    let errors = generate_step(&step, &catalog, &state).unwrap_err();
    assert_eq!(
        errors,
        vec![GenerationError::PipetteVolumeExceeded {
            volume: 280.0,
            max_volume: 300.0,
            disposal_volume: Some(50.0),
        }]
    );
}

#[test]
fn mix_agitates_each_well_the_requested_number_of_times() {
    let (catalog, mut state) = standard_context();
    for well in ["A1", "A2"] {
        fill_source_well(&mut state, well, "lysate", 200.0);
    }
    let step = StepArgs::Mix(MixArgs {
        pipette: PipetteId::new(P300_SINGLE),
        labware: LabwareId::new(SOURCE_PLATE),
        wells: vec![WellName::new("A1"), WellName::new("A2")],
        volume: 100.0,
        times: 3,
        touch_tip_mm_from_bottom: None,
        options: default_options(),
    });
    let out = generate_step(&step, &catalog, &state).unwrap();

    assert_eq!(liquid_aspirates(&out).len(), 6);
    assert_eq!(count_kind(&out, "dispense"), 6);
    // mixing returns everything where it came from
    let wells = &out.state.liquid_state.labware[&LabwareId::new(SOURCE_PLATE)];
    assert!((wells[&WellName::new("A1")].total_volume() - 200.0).abs() < 1e-9);
    assert!((wells[&WellName::new("A2")].total_volume() - 200.0).abs() < 1e-9);
}
