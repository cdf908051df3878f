//! The Entity Catalog: static hardware and labware definitions.
//!
//! The catalog is built once per protocol compilation from definition
//! documents validated by the excluded loader layer, then treated as
//! read-only by the engine. Entities reference each other only through
//! identifiers, never embedded pointers, so a single catalog can back
//! any number of concurrent timeline simulations by shared reference.
//!
//! | Entity | Keyed by | Describes |
//! |--------|----------|-----------|
//! | [`PipetteSpec`] | [`PipetteId`] | channels, volume limits, flow rates, tiprack compatibility |
//! | [`LabwareDefinition`] | [`LabwareId`] | well geometry, ordering, display category |
//! | [`ModuleSpec`] | [`ModuleId`] | module type |
//! | [`EquipmentSpec`] | [`EquipmentId`] | waste chute / trash bin / gripper |

use crate::id::{EquipmentId, LabwareId, ModuleId, PipetteId, WellName};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Physical channel count of a pipette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelCount {
    /// Single-channel pipette.
    Single,
    /// 8-channel pipette.
    Eight,
    /// 96-channel pipette.
    NinetySix,
}

impl ChannelCount {
    /// Number of physical channels.
    #[must_use]
    pub fn count(self) -> usize {
        match self {
            Self::Single => 1,
            Self::Eight => 8,
            Self::NinetySix => 96,
        }
    }

    /// Returns `true` for multi-channel pipettes.
    #[must_use]
    pub fn is_multi(self) -> bool {
        !matches!(self, Self::Single)
    }
}

/// Display category distinguishing standard pipettes from
/// high-throughput (96-channel class) hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipetteCategory {
    Standard,
    HighThroughput,
}

/// One tiprack model a pipette may draw tips from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TiprackCompatibility {
    /// Definition URI of the tiprack labware model.
    pub uri: String,
    /// Rated volume of a single tip in µL.
    pub tip_volume: f64,
}

/// Static specification of a loaded pipette.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipetteSpec {
    pub channels: ChannelCount,
    /// Liquid-class maximum volume in µL.
    pub max_volume: f64,
    /// Minimum addressable volume in µL.
    pub min_volume: f64,
    /// Default aspirate flow rate in µL/s.
    pub aspirate_flow_rate: f64,
    /// Default dispense flow rate in µL/s.
    pub dispense_flow_rate: f64,
    /// Default blow-out flow rate in µL/s.
    pub blowout_flow_rate: f64,
    pub display_category: PipetteCategory,
    /// Low-volume models require a configure-for-volume instruction
    /// before each aspirate cycle.
    pub is_low_volume: bool,
    /// Tiprack models this pipette can pick from.
    pub compatible_tipracks: Vec<TiprackCompatibility>,
}

impl PipetteSpec {
    /// Tip volume for the given tiprack URI, if compatible.
    #[must_use]
    pub fn tip_volume_for(&self, tiprack_uri: &str) -> Option<f64> {
        self.compatible_tipracks
            .iter()
            .find(|t| t.uri == tiprack_uri)
            .map(|t| t.tip_volume)
    }
}

/// Display category of a labware definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LabwareCategory {
    TipRack,
    Reservoir,
    WellPlate,
    Trash,
    AluminumBlock,
    Adapter,
}

/// Geometry of a single well.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WellShape {
    /// Depth from well top to bottom in mm.
    pub depth_mm: f64,
    /// Total volume the well can hold in µL.
    pub total_volume: f64,
}

/// The wells a multi-tip pipette movement touches, one entry per
/// channel group, plus whether every channel shares one physical well
/// (a trough aspirated by an 8-channel, for example).
#[derive(Debug, Clone, PartialEq)]
pub struct WellsForTips {
    pub wells: Vec<WellName>,
    pub all_wells_shared: bool,
}

/// Static definition of a labware model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabwareDefinition {
    /// Definition URI, used to match tipracks to pipettes.
    pub uri: String,
    pub display_category: LabwareCategory,
    /// Well ordering as columns, each top-to-bottom; columns left-to-right.
    pub ordering: Vec<Vec<WellName>>,
    pub wells: BTreeMap<WellName, WellShape>,
}

impl LabwareDefinition {
    /// Returns `true` for tiprack definitions.
    #[must_use]
    pub fn is_tiprack(&self) -> bool {
        self.display_category == LabwareCategory::TipRack
    }

    /// Returns `true` for reservoir definitions.
    #[must_use]
    pub fn is_reservoir(&self) -> bool {
        self.display_category == LabwareCategory::Reservoir
    }

    /// Depth of the named well, if present.
    #[must_use]
    pub fn well_depth(&self, well: &WellName) -> Option<f64> {
        self.wells.get(well).map(|w| w.depth_mm)
    }

    /// Wells flattened column-major (top-to-bottom, left-to-right).
    #[must_use]
    pub fn ordered_wells(&self) -> Vec<WellName> {
        self.ordering.iter().flatten().cloned().collect()
    }

    /// Column index containing the given well.
    #[must_use]
    pub fn column_of(&self, well: &WellName) -> Option<usize> {
        self.ordering.iter().position(|col| col.contains(well))
    }

    /// Resolves the wells each tip lands in for a pipette of the given
    /// channel count addressing `primary_well`.
    ///
    /// Returns `None` when the geometry cannot accommodate the channel
    /// layout (e.g. an 8-channel addressing a partial column).
    #[must_use]
    pub fn wells_for_tips(
        &self,
        channels: ChannelCount,
        primary_well: &WellName,
    ) -> Option<WellsForTips> {
        match channels {
            ChannelCount::Single => Some(WellsForTips {
                wells: vec![primary_well.clone()],
                all_wells_shared: true,
            }),
            ChannelCount::Eight => {
                let col = &self.ordering[self.column_of(primary_well)?];
                if col.len() == 1 {
                    // trough: every channel dips into the same well
                    return Some(WellsForTips {
                        wells: vec![primary_well.clone(); 8],
                        all_wells_shared: true,
                    });
                }
                let start = col.iter().position(|w| w == primary_well)?;
                if start + 8 > col.len() {
                    return None;
                }
                Some(WellsForTips {
                    wells: col[start..start + 8].to_vec(),
                    all_wells_shared: false,
                })
            }
            ChannelCount::NinetySix => {
                if self.is_reservoir() {
                    // one entry per column; each well serves a group of
                    // 8 channels
                    let wells: Vec<WellName> = self
                        .ordering
                        .iter()
                        .filter_map(|col| col.first().cloned())
                        .collect();
                    let all_wells_shared = wells.len() == 1;
                    Some(WellsForTips {
                        wells,
                        all_wells_shared,
                    })
                } else {
                    let wells = self.ordered_wells();
                    if wells.len() != 96 {
                        return None;
                    }
                    Some(WellsForTips {
                        wells,
                        all_wells_shared: false,
                    })
                }
            }
        }
    }
}

/// Module hardware type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModuleType {
    Temperature,
    Thermocycler,
    HeaterShaker,
    MagneticBlock,
}

/// Static specification of a deck module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleSpec {
    pub module_type: ModuleType,
}

/// Kind of additional (non-labware, non-module) equipment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EquipmentKind {
    WasteChute,
    TrashBin,
    Gripper,
}

/// Static specification of additional equipment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquipmentSpec {
    pub kind: EquipmentKind,
    /// Deck cutout the equipment occupies, when fixed to the deck.
    pub location: Option<String>,
}

/// What kind of thing a dispense/blow-out destination id refers to.
///
/// Compound creators stay destination-agnostic by resolving the
/// destination id through [`EntityCatalog::destination_kind`] and
/// delegating to the matching emission helper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DestinationKind {
    Labware,
    WasteChute,
    TrashBin,
}

/// Read-only lookup table of every entity in a protocol.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityCatalog {
    pub pipettes: BTreeMap<PipetteId, PipetteSpec>,
    pub labware: BTreeMap<LabwareId, LabwareDefinition>,
    pub modules: BTreeMap<ModuleId, ModuleSpec>,
    pub equipment: BTreeMap<EquipmentId, EquipmentSpec>,
}

impl EntityCatalog {
    #[must_use]
    pub fn pipette(&self, id: &PipetteId) -> Option<&PipetteSpec> {
        self.pipettes.get(id)
    }

    #[must_use]
    pub fn labware_def(&self, id: &LabwareId) -> Option<&LabwareDefinition> {
        self.labware.get(id)
    }

    #[must_use]
    pub fn module(&self, id: &ModuleId) -> Option<&ModuleSpec> {
        self.modules.get(id)
    }

    #[must_use]
    pub fn equipment_spec(&self, id: &EquipmentId) -> Option<&EquipmentSpec> {
        self.equipment.get(id)
    }

    /// Resolves whether a destination identifier names labware, a
    /// waste chute, or a trash bin.
    #[must_use]
    pub fn destination_kind(&self, id: &str) -> Option<DestinationKind> {
        if self.labware.contains_key(&LabwareId::new(id)) {
            return Some(DestinationKind::Labware);
        }
        match self.equipment.get(&EquipmentId::new(id)).map(|e| e.kind) {
            Some(EquipmentKind::WasteChute) => Some(DestinationKind::WasteChute),
            Some(EquipmentKind::TrashBin) => Some(DestinationKind::TrashBin),
            _ => None,
        }
    }

    /// Returns `true` if any waste chute is present.
    #[must_use]
    pub fn has_waste_chute(&self) -> bool {
        self.equipment
            .values()
            .any(|e| e.kind == EquipmentKind::WasteChute)
    }

    /// Returns `true` if a gripper is present.
    #[must_use]
    pub fn has_gripper(&self) -> bool {
        self.equipment
            .values()
            .any(|e| e.kind == EquipmentKind::Gripper)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plate_96() -> LabwareDefinition {
        let mut wells = BTreeMap::new();
        let mut ordering = Vec::new();
        for col in 1..=12 {
            let mut column = Vec::new();
            for row in ["A", "B", "C", "D", "E", "F", "G", "H"] {
                let well = WellName::new(format!("{row}{col}"));
                wells.insert(
                    well.clone(),
                    WellShape {
                        depth_mm: 10.5,
                        total_volume: 360.0,
                    },
                );
                column.push(well);
            }
            ordering.push(column);
        }
        LabwareDefinition {
            uri: "fixture/96-flat/1".to_string(),
            display_category: LabwareCategory::WellPlate,
            ordering,
            wells,
        }
    }

    fn trough_12() -> LabwareDefinition {
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
            uri: "fixture/12-trough/1".to_string(),
            display_category: LabwareCategory::Reservoir,
            ordering,
            wells,
        }
    }

    #[test]
    fn single_channel_targets_one_well() {
        let def = plate_96();
        let wft = def
            .wells_for_tips(ChannelCount::Single, &WellName::new("B3"))
            .unwrap();
        assert_eq!(wft.wells, vec![WellName::new("B3")]);
        assert!(wft.all_wells_shared);
    }

    #[test]
    fn eight_channel_takes_a_full_column() {
        let def = plate_96();
        let wft = def
            .wells_for_tips(ChannelCount::Eight, &WellName::new("A2"))
            .unwrap();
        assert_eq!(wft.wells.len(), 8);
        assert_eq!(wft.wells[0], WellName::new("A2"));
        assert_eq!(wft.wells[7], WellName::new("H2"));
        assert!(!wft.all_wells_shared);
    }

    #[test]
    fn eight_channel_shares_a_trough_well() {
        let def = trough_12();
        let wft = def
            .wells_for_tips(ChannelCount::Eight, &WellName::new("A1"))
            .unwrap();
        assert_eq!(wft.wells.len(), 8);
        assert!(wft.all_wells_shared);
        assert!(wft.wells.iter().all(|w| *w == WellName::new("A1")));
    }

    #[test]
    fn eight_channel_rejects_partial_column() {
        let def = plate_96();
        assert!(def
            .wells_for_tips(ChannelCount::Eight, &WellName::new("B1"))
            .is_none());
    }

    #[test]
    fn ninety_six_on_reservoir_groups_by_column() {
        let def = trough_12();
        let wft = def
            .wells_for_tips(ChannelCount::NinetySix, &WellName::new("A1"))
            .unwrap();
        assert_eq!(wft.wells.len(), 12);
        assert!(!wft.all_wells_shared);
    }

    #[test]
    fn destination_kind_resolution() {
        let mut catalog = EntityCatalog::default();
        catalog
            .labware
            .insert(LabwareId::new("plate"), plate_96());
        catalog.equipment.insert(
            EquipmentId::new("chute"),
            EquipmentSpec {
                kind: EquipmentKind::WasteChute,
                location: Some("D3".to_string()),
            },
        );
        assert_eq!(
            catalog.destination_kind("plate"),
            Some(DestinationKind::Labware)
        );
        assert_eq!(
            catalog.destination_kind("chute"),
            Some(DestinationKind::WasteChute)
        );
        assert_eq!(catalog.destination_kind("nope"), None);
    }
}
