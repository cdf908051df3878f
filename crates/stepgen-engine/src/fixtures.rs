//! Canned catalogs and states for tests.
//!
//! The standard deck carries two 300 µL tipracks, a source and a
//! destination plate, a 12-channel trough, a single- and an
//! 8-channel P300, and both trash fixtures. Builders extend it with
//! modules or a P1000 where a test needs them.

use std::collections::BTreeMap;
use stepgen_types::{
    ChannelCount, DeckLocation, EntityCatalog, EquipmentId, EquipmentKind, EquipmentSpec,
    LabwareCategory, LabwareDefinition, LabwareId, LiquidId, ModuleId, ModuleSpec, ModuleState,
    ModuleTemporal, ModuleType, Mount, PipetteCategory, PipetteId, PipetteSpec, PipetteTemporal,
    RobotState, TemperatureStatus, TiprackCompatibility, WellName, WellShape,
};

pub const P300_SINGLE: &str = "p300SingleId";
pub const P300_MULTI: &str = "p300MultiId";
pub const P1000_SINGLE: &str = "p1000SingleId";

pub const TIPRACK_1: &str = "tiprack1Id";
pub const TIPRACK_2: &str = "tiprack2Id";
pub const TIPRACK_1000_1: &str = "tiprack1000Id";
pub const TIPRACK_URI: &str = "fixture/96-tiprack-300ul/1";
pub const TIPRACK_1000_URI: &str = "fixture/96-tiprack-1000ul/1";

pub const SOURCE_PLATE: &str = "sourcePlateId";
pub const DEST_PLATE: &str = "destPlateId";
pub const TROUGH: &str = "troughId";
pub const TC_PLATE: &str = "tcPlateId";

pub const TRASH_BIN: &str = "trashBinId";
pub const WASTE_CHUTE: &str = "wasteChuteId";
pub const GRIPPER: &str = "gripperId";

pub const TC_MODULE: &str = "thermocyclerId";
pub const HS_MODULE: &str = "heaterShakerId";
pub const TEMP_MODULE: &str = "tempModuleId";
pub const MAG_MODULE: &str = "magModuleId";

const ROWS: [&str; 8] = ["A", "B", "C", "D", "E", "F", "G", "H"];

fn grid_96(uri: &str, category: LabwareCategory, depth_mm: f64, total_volume: f64) -> LabwareDefinition {
    let mut wells = BTreeMap::new();
    let mut ordering = Vec::new();
    for col in 1..=12 {
        let mut column = Vec::new();
        for row in ROWS {
            let well = WellName::new(format!("{row}{col}"));
            wells.insert(
                well.clone(),
                WellShape {
                    depth_mm,
                    total_volume,
                },
            );
            column.push(well);
        }
        ordering.push(column);
    }
    LabwareDefinition {
        uri: uri.to_string(),
        display_category: category,
        ordering,
        wells,
    }
}

pub fn plate_96(uri: &str) -> LabwareDefinition {
    grid_96(uri, LabwareCategory::WellPlate, 10.5, 360.0)
}

pub fn tiprack_96(uri: &str) -> LabwareDefinition {
    grid_96(uri, LabwareCategory::TipRack, 60.0, 0.0)
}

pub fn trough_12(uri: &str) -> LabwareDefinition {
    let mut wells = BTreeMap::new();
    let mut ordering = Vec::new();
    for col in 1..=12 {
        let well = WellName::new(format!("A{col}"));
        wells.insert(
            well.clone(),
            WellShape {
                depth_mm: 26.0,
                total_volume: 22_000.0,
            },
        );
        ordering.push(vec![well]);
    }
    LabwareDefinition {
        uri: uri.to_string(),
        display_category: LabwareCategory::Reservoir,
        ordering,
        wells,
    }
}

fn p300_spec(channels: ChannelCount) -> PipetteSpec {
    PipetteSpec {
        channels,
        max_volume: 300.0,
        min_volume: 30.0,
        aspirate_flow_rate: 150.0,
        dispense_flow_rate: 300.0,
        blowout_flow_rate: 300.0,
        display_category: PipetteCategory::Standard,
        is_low_volume: false,
        compatible_tipracks: vec![TiprackCompatibility {
            uri: TIPRACK_URI.to_string(),
            tip_volume: 300.0,
        }],
    }
}

fn p1000_spec() -> PipetteSpec {
    PipetteSpec {
        channels: ChannelCount::Single,
        max_volume: 1000.0,
        min_volume: 100.0,
        aspirate_flow_rate: 500.0,
        dispense_flow_rate: 1000.0,
        blowout_flow_rate: 1000.0,
        display_category: PipetteCategory::Standard,
        is_low_volume: false,
        compatible_tipracks: vec![TiprackCompatibility {
            uri: TIPRACK_1000_URI.to_string(),
            tip_volume: 1000.0,
        }],
    }
}

/// Two P300s, two 300 µL tipracks, three plates, both trash fixtures,
/// and a gripper. No modules.
pub fn standard_context() -> (EntityCatalog, RobotState) {
    let mut catalog = EntityCatalog::default();
    catalog
        .pipettes
        .insert(PipetteId::new(P300_SINGLE), p300_spec(ChannelCount::Single));
    catalog
        .pipettes
        .insert(PipetteId::new(P300_MULTI), p300_spec(ChannelCount::Eight));
    catalog
        .labware
        .insert(LabwareId::new(TIPRACK_1), tiprack_96(TIPRACK_URI));
    catalog
        .labware
        .insert(LabwareId::new(TIPRACK_2), tiprack_96(TIPRACK_URI));
    catalog
        .labware
        .insert(LabwareId::new(SOURCE_PLATE), plate_96("fixture/96-flat/1"));
    catalog
        .labware
        .insert(LabwareId::new(DEST_PLATE), plate_96("fixture/96-flat/1"));
    catalog
        .labware
        .insert(LabwareId::new(TROUGH), trough_12("fixture/12-trough/1"));
    catalog.equipment.insert(
        EquipmentId::new(TRASH_BIN),
        EquipmentSpec {
            kind: EquipmentKind::TrashBin,
            location: Some("A3".to_string()),
        },
    );
    catalog.equipment.insert(
        EquipmentId::new(WASTE_CHUTE),
        EquipmentSpec {
            kind: EquipmentKind::WasteChute,
            location: Some("D3".to_string()),
        },
    );
    catalog.equipment.insert(
        EquipmentId::new(GRIPPER),
        EquipmentSpec {
            kind: EquipmentKind::Gripper,
            location: None,
        },
    );

    let mut pipettes = BTreeMap::new();
    pipettes.insert(
        PipetteId::new(P300_SINGLE),
        PipetteTemporal {
            mount: Mount::Left,
            nozzles: None,
        },
    );
    pipettes.insert(
        PipetteId::new(P300_MULTI),
        PipetteTemporal {
            mount: Mount::Right,
            nozzles: None,
        },
    );
    let mut labware = BTreeMap::new();
    labware.insert(LabwareId::new(TIPRACK_1), DeckLocation::Slot("A1".into()));
    labware.insert(LabwareId::new(TIPRACK_2), DeckLocation::Slot("A2".into()));
    labware.insert(LabwareId::new(SOURCE_PLATE), DeckLocation::Slot("B1".into()));
    labware.insert(LabwareId::new(DEST_PLATE), DeckLocation::Slot("B2".into()));
    labware.insert(LabwareId::new(TROUGH), DeckLocation::Slot("B3".into()));

    let state = RobotState::initial(&catalog, pipettes, labware, BTreeMap::new());
    (catalog, state)
}

/// Standard deck plus a thermocycler in B1 holding its own plate;
/// the source plate moves aside to C1. Lid starts closed and cold.
pub fn context_with_thermocycler() -> (EntityCatalog, RobotState) {
    let (mut catalog, mut state) = standard_context();
    catalog.modules.insert(
        ModuleId::new(TC_MODULE),
        ModuleSpec {
            module_type: ModuleType::Thermocycler,
        },
    );
    catalog
        .labware
        .insert(LabwareId::new(TC_PLATE), plate_96("fixture/96-flat/1"));

    state
        .labware
        .insert(LabwareId::new(SOURCE_PLATE), DeckLocation::Slot("C1".into()));
    state.modules.insert(
        ModuleId::new(TC_MODULE),
        ModuleTemporal {
            slot: "B1".to_string(),
            state: ModuleState::Thermocycler {
                block_target: None,
                lid_target: None,
                lid_open: None,
            },
        },
    );
    state.labware.insert(
        LabwareId::new(TC_PLATE),
        DeckLocation::Module(ModuleId::new(TC_MODULE)),
    );
    let empty_wells: BTreeMap<WellName, stepgen_types::LiquidContents> = catalog
        .labware_def(&LabwareId::new(TC_PLATE))
        .map(|def| {
            def.wells
                .keys()
                .map(|w| (w.clone(), stepgen_types::LiquidContents::default()))
                .collect()
        })
        .unwrap_or_default();
    state
        .liquid_state
        .labware
        .insert(LabwareId::new(TC_PLATE), empty_wells);
    (catalog, state)
}

/// Standard deck plus an idle heater-shaker in C1 (latch closed).
pub fn context_with_heater_shaker() -> (EntityCatalog, RobotState) {
    let (mut catalog, mut state) = standard_context();
    catalog.modules.insert(
        ModuleId::new(HS_MODULE),
        ModuleSpec {
            module_type: ModuleType::HeaterShaker,
        },
    );
    state.modules.insert(
        ModuleId::new(HS_MODULE),
        ModuleTemporal {
            slot: "C1".to_string(),
            state: ModuleState::HeaterShaker {
                target_temp: None,
                target_speed: None,
                latch_open: false,
            },
        },
    );
    (catalog, state)
}

/// Standard deck plus a deactivated temperature module in D1.
pub fn context_with_temperature_module() -> (EntityCatalog, RobotState) {
    let (mut catalog, mut state) = standard_context();
    catalog.modules.insert(
        ModuleId::new(TEMP_MODULE),
        ModuleSpec {
            module_type: ModuleType::Temperature,
        },
    );
    state.modules.insert(
        ModuleId::new(TEMP_MODULE),
        ModuleTemporal {
            slot: "D1".to_string(),
            state: ModuleState::Temperature {
                status: TemperatureStatus::Deactivated,
                target: None,
            },
        },
    );
    (catalog, state)
}

/// Standard deck plus a disengaged magnetic block in D2.
pub fn context_with_magnetic_module() -> (EntityCatalog, RobotState) {
    let (mut catalog, mut state) = standard_context();
    catalog.modules.insert(
        ModuleId::new(MAG_MODULE),
        ModuleSpec {
            module_type: ModuleType::MagneticBlock,
        },
    );
    state.modules.insert(
        ModuleId::new(MAG_MODULE),
        ModuleTemporal {
            slot: "D2".to_string(),
            state: ModuleState::Magnetic { engaged: false },
        },
    );
    (catalog, state)
}

/// Standard deck plus a P1000 and one 1000 µL tiprack in C2.
pub fn context_with_p1000() -> (EntityCatalog, RobotState) {
    let (mut catalog, mut state) = standard_context();
    catalog
        .pipettes
        .insert(PipetteId::new(P1000_SINGLE), p1000_spec());
    catalog
        .labware
        .insert(LabwareId::new(TIPRACK_1000_1), tiprack_96(TIPRACK_1000_URI));

    state.pipettes.insert(
        PipetteId::new(P1000_SINGLE),
        PipetteTemporal {
            mount: Mount::Right,
            nozzles: None,
        },
    );
    state.labware.insert(
        LabwareId::new(TIPRACK_1000_1),
        DeckLocation::Slot("C2".into()),
    );
    let full: BTreeMap<WellName, bool> = catalog
        .labware_def(&LabwareId::new(TIPRACK_1000_1))
        .map(|def| def.wells.keys().map(|w| (w.clone(), true)).collect())
        .unwrap_or_default();
    state
        .tip_state
        .tipracks
        .insert(LabwareId::new(TIPRACK_1000_1), full);
    state.tip_state.pipettes.insert(PipetteId::new(P1000_SINGLE), false);
    state.liquid_state.pipettes.insert(
        PipetteId::new(P1000_SINGLE),
        vec![stepgen_types::LiquidContents::default()],
    );
    (catalog, state)
}

pub fn give_tip(state: &mut RobotState, pipette: &str) {
    state
        .tip_state
        .pipettes
        .insert(PipetteId::new(pipette), true);
}

pub fn fill_source_well(state: &mut RobotState, well: &str, liquid: &str, volume: f64) {
    state.fill_well(
        &LabwareId::new(SOURCE_PLATE),
        &WellName::new(well),
        LiquidId::new(liquid),
        volume,
    );
}

pub fn fill_trough_well(state: &mut RobotState, well: &str, liquid: &str, volume: f64) {
    state.fill_well(
        &LabwareId::new(TROUGH),
        &WellName::new(well),
        LiquidId::new(liquid),
        volume,
    );
}

pub fn set_thermocycler_lid(state: &mut RobotState, open: bool) {
    if let Some(m) = state.modules.get_mut(&ModuleId::new(TC_MODULE)) {
        if let ModuleState::Thermocycler { lid_open, .. } = &mut m.state {
            *lid_open = Some(open);
        }
    }
}

pub fn set_thermocycler_targets(state: &mut RobotState, block: Option<f64>, lid: Option<f64>) {
    if let Some(m) = state.modules.get_mut(&ModuleId::new(TC_MODULE)) {
        if let ModuleState::Thermocycler {
            block_target,
            lid_target,
            ..
        } = &mut m.state
        {
            *block_target = block;
            *lid_target = lid;
        }
    }
}

pub fn set_heater_shaker_speed(state: &mut RobotState, rpm: Option<f64>) {
    if let Some(m) = state.modules.get_mut(&ModuleId::new(HS_MODULE)) {
        if let ModuleState::HeaterShaker { target_speed, .. } = &mut m.state {
            *target_speed = rpm;
        }
    }
}

pub fn set_heater_shaker_latch(state: &mut RobotState, open: bool) {
    if let Some(m) = state.modules.get_mut(&ModuleId::new(HS_MODULE)) {
        if let ModuleState::HeaterShaker { latch_open, .. } = &mut m.state {
            *latch_open = open;
        }
    }
}

pub fn set_temperature_target(state: &mut RobotState, target: Option<f64>) {
    if let Some(m) = state.modules.get_mut(&ModuleId::new(TEMP_MODULE)) {
        if let ModuleState::Temperature {
            target: current, ..
        } = &mut m.state
        {
            *current = target;
        }
    }
}

/// Family options with everything optional switched off.
pub fn default_options() -> stepgen_types::TransferFamilyOptions {
    stepgen_types::TransferFamilyOptions {
        tip_rack_uri: TIPRACK_URI.to_string(),
        nozzles: None,
        drop_tip_location: EquipmentId::new(TRASH_BIN),
        change_tip: stepgen_types::ChangeTip::Once,
        aspirate_flow_rate: 150.0,
        dispense_flow_rate: 300.0,
        aspirate_offset_from_bottom_mm: 1.0,
        dispense_offset_from_bottom_mm: 0.5,
        aspirate_x_offset: 0.0,
        aspirate_y_offset: 0.0,
        dispense_x_offset: 0.0,
        dispense_y_offset: 0.0,
        aspirate_delay: None,
        dispense_delay: None,
        touch_tip_after_aspirate_mm_from_bottom: None,
        touch_tip_after_dispense_mm_from_bottom: None,
        aspirate_air_gap_volume: 0.0,
        dispense_air_gap_volume: 0.0,
        blowout_location: None,
        blowout_flow_rate: 300.0,
        blowout_offset_from_top_mm: -2.0,
    }
}
