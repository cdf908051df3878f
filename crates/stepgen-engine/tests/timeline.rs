//! Whole-protocol properties: conservation, determinism, early stop.

use stepgen_engine::fixtures::*;
use stepgen_engine::generate_timeline;
use stepgen_types::{
    ChangeTip, GenerationError, LabwareId, LiquidId, ModuleId, PipetteId, RobotState,
    SetTemperatureArgs, StepArgs, TransferArgs, WellName,
};

fn simple_transfer(pipette: &str, volume: f64) -> StepArgs {
    StepArgs::Transfer(TransferArgs {
        pipette: PipetteId::new(pipette),
        source_labware: LabwareId::new(SOURCE_PLATE),
        source_wells: vec![WellName::new("A1")],
        dest_labware: LabwareId::new(DEST_PLATE),
        dest_wells: vec![WellName::new("A1")],
        volume,
        pre_wet_tip: false,
        mix_before_aspirate: None,
        mix_in_destination: None,
        options: default_options(),
    })
}

fn total_of(state: &RobotState, liquid: &str) -> f64 {
    let id = LiquidId::new(liquid);
    let in_wells: f64 = state
        .liquid_state
        .labware
        .values()
        .flat_map(|wells| wells.values())
        .map(|c| c.volume_of(&id))
        .sum();
    let in_tips: f64 = state
        .liquid_state
        .pipettes
        .values()
        .flatten()
        .map(|c| c.volume_of(&id))
        .sum();
    in_wells + in_tips
}

#[test]
fn liquid_is_conserved_across_a_timeline() {
    let (catalog, mut state) = standard_context();
    fill_source_well(&mut state, "A1", "water", 200.0);

    let steps = vec![simple_transfer(P300_SINGLE, 50.0), {
        let mut args = simple_transfer(P300_SINGLE, 30.0);
        if let StepArgs::Transfer(t) = &mut args {
            t.options.change_tip = ChangeTip::Always;
        }
        args
    }];
    let timeline = generate_timeline(&steps, &catalog, state);

    assert!(timeline.error.is_none());
    assert_eq!(timeline.frames.len(), 2);
    let last = timeline.final_state().unwrap();
    assert!((total_of(last, "water") - 200.0).abs() < 1e-9);
    let dest = &last.liquid_state.labware[&LabwareId::new(DEST_PLATE)][&WellName::new("A1")];
    assert!((dest.volume_of(&LiquidId::new("water")) - 80.0).abs() < 1e-9);
}

#[test]
fn identical_inputs_serialize_identically() {
    let (catalog, mut state) = standard_context();
    fill_source_well(&mut state, "A1", "water", 200.0);
    let steps = vec![
        simple_transfer(P300_SINGLE, 50.0),
        StepArgs::SetTemperature(SetTemperatureArgs {
            module: ModuleId::new(TEMP_MODULE),
            celsius: 37.0,
        }),
    ];
    // the temperature step fails (no module on this deck), which must
    // itself reproduce exactly
    let a = generate_timeline(&steps, &catalog, state.clone());
    let b = generate_timeline(&steps, &catalog, state);

    assert_eq!(a.frames.len(), b.frames.len());
    for (fa, fb) in a.frames.iter().zip(&b.frames) {
        let ja = serde_json::to_string(&fa.instructions).unwrap();
        let jb = serde_json::to_string(&fb.instructions).unwrap();
        assert_eq!(ja, jb);
        assert_eq!(
            serde_json::to_string(&fa.state).unwrap(),
            serde_json::to_string(&fb.state).unwrap()
        );
    }
    assert_eq!(a.error, b.error);
}

#[test]
fn timeline_stops_at_the_first_failing_step() {
    let (catalog, mut state) = standard_context();
    fill_source_well(&mut state, "A1", "water", 200.0);

    let steps = vec![
        simple_transfer(P300_SINGLE, 50.0),
        simple_transfer("ghostPipetteId", 10.0),
        simple_transfer(P300_SINGLE, 20.0),
    ];
    let timeline = generate_timeline(&steps, &catalog, state);

    assert_eq!(timeline.frames.len(), 1);
    let error = timeline.error.expect("timeline should stop");
    assert_eq!(error.step_index, 1);
    assert_eq!(
        error.errors,
        vec![GenerationError::PipetteDoesNotExist {
            pipette: PipetteId::new("ghostPipetteId"),
        }]
    );
}
