//! Liquid composition bookkeeping and the split/merge algebra.
//!
//! A [`LiquidContents`] maps liquid ids to volumes for one location
//! (a well or one pipette channel's tip). Splitting a volume out of a
//! composition preserves each component's fractional share; merging
//! sums volumes per shared component and unions the rest. The reserved
//! air pseudo-liquid absorbs the shortfall when more volume is drawn
//! than a location holds, which keeps total volume exactly conserved
//! across every transition.
//!
//! # Example
//!
//! ```
//! use stepgen_types::{LiquidContents, LiquidId};
//!
//! let mut well = LiquidContents::default();
//! well.set(LiquidId::new("dye"), 60.0);
//! well.set(LiquidId::new("buffer"), 40.0);
//!
//! let split = well.split(50.0);
//! // composition ratios survive the split
//! assert_eq!(split.dest.volume_of(&LiquidId::new("dye")), 30.0);
//! assert_eq!(split.dest.volume_of(&LiquidId::new("buffer")), 20.0);
//! assert_eq!(split.source.total_volume(), 50.0);
//! ```

use crate::id::LiquidId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Liquid composition of one location (well or tip channel).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LiquidContents {
    volumes: BTreeMap<LiquidId, f64>,
}

/// Result of splitting a volume out of a composition.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitLiquid {
    /// What remains at the source location.
    pub source: LiquidContents,
    /// What was drawn out.
    pub dest: LiquidContents,
}

impl LiquidContents {
    /// A composition holding a single liquid.
    #[must_use]
    pub fn single(id: LiquidId, volume: f64) -> Self {
        let mut contents = Self::default();
        contents.set(id, volume);
        contents
    }

    /// A composition holding only air.
    #[must_use]
    pub fn air(volume: f64) -> Self {
        Self::single(LiquidId::air(), volume)
    }

    /// Sets the volume of one liquid.
    pub fn set(&mut self, id: LiquidId, volume: f64) {
        self.volumes.insert(id, volume);
    }

    /// Volume of one liquid (0 when absent).
    #[must_use]
    pub fn volume_of(&self, id: &LiquidId) -> f64 {
        self.volumes.get(id).copied().unwrap_or(0.0)
    }

    /// Returns `true` when no liquid has ever been recorded here.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.volumes.is_empty()
    }

    /// Total recorded volume, excluding the air pseudo-liquid.
    #[must_use]
    pub fn total_volume(&self) -> f64 {
        self.volumes
            .iter()
            .filter(|(id, _)| !id.is_air())
            .map(|(_, v)| v)
            .sum()
    }

    /// Total recorded volume including air.
    #[must_use]
    pub fn total_volume_with_air(&self) -> f64 {
        self.volumes.values().sum()
    }

    /// Iterates over `(liquid, volume)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&LiquidId, f64)> {
        self.volumes.iter().map(|(id, v)| (id, *v))
    }

    /// Breaks this composition into the part that stays and the part
    /// that is drawn out, assuming the location is evenly mixed.
    ///
    /// Air already present at the source stays there: only real
    /// liquid participates in the proportional draw.
    ///
    /// - Empty source: the draw is pure air.
    /// - `volume` exceeding the liquid total: all liquid is taken and
    ///   air makes up the difference.
    /// - Otherwise each component contributes its fractional share.
    #[must_use]
    pub fn split(&self, volume: f64) -> SplitLiquid {
        let total = self.total_volume();

        if total == 0.0 {
            return SplitLiquid {
                source: self.clone(),
                dest: LiquidContents::air(volume),
            };
        }

        if volume > total {
            let mut source = self.clone();
            let mut dest = LiquidContents::default();
            for (id, v) in &mut source.volumes {
                if !id.is_air() {
                    dest.set(id.clone(), *v);
                    *v = 0.0;
                }
            }
            dest.set(LiquidId::air(), volume - total);
            return SplitLiquid { source, dest };
        }

        let mut source = self.clone();
        let mut dest = LiquidContents::default();
        for (id, v) in &mut source.volumes {
            if id.is_air() {
                continue;
            }
            let dest_vol = (*v / total) * volume;
            *v -= dest_vol;
            dest.set(id.clone(), dest_vol);
        }
        SplitLiquid { source, dest }
    }

    /// Adds all of `other` into this composition, summing volumes of
    /// shared liquids.
    #[must_use]
    pub fn merge(&self, other: &LiquidContents) -> LiquidContents {
        let mut merged = self.clone();
        for (id, v) in &other.volumes {
            *merged.volumes.entry(id.clone()).or_insert(0.0) += v;
        }
        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_liquid_well() -> LiquidContents {
        let mut c = LiquidContents::default();
        c.set(LiquidId::new("ingred1"), 60.0);
        c.set(LiquidId::new("ingred2"), 40.0);
        c
    }

    #[test]
    fn total_volume_excludes_air() {
        let mut c = two_liquid_well();
        c.set(LiquidId::air(), 15.0);
        assert_eq!(c.total_volume(), 100.0);
        assert_eq!(c.total_volume_with_air(), 115.0);
    }

    #[test]
    fn split_preserves_ratios() {
        let split = two_liquid_well().split(50.0);
        assert_eq!(split.dest.volume_of(&LiquidId::new("ingred1")), 30.0);
        assert_eq!(split.dest.volume_of(&LiquidId::new("ingred2")), 20.0);
        assert_eq!(split.source.volume_of(&LiquidId::new("ingred1")), 30.0);
        assert_eq!(split.source.volume_of(&LiquidId::new("ingred2")), 20.0);
    }

    #[test]
    fn split_from_empty_source_yields_air() {
        let split = LiquidContents::default().split(25.0);
        assert!(split.source.is_empty());
        assert_eq!(split.dest.volume_of(&LiquidId::air()), 25.0);
        assert_eq!(split.dest.total_volume(), 0.0);
    }

    #[test]
    fn over_split_takes_everything_plus_air() {
        let well = LiquidContents::single(LiquidId::new("ingred1"), 30.0);
        let split = well.split(50.0);
        assert_eq!(split.source.volume_of(&LiquidId::new("ingred1")), 0.0);
        assert_eq!(split.dest.volume_of(&LiquidId::new("ingred1")), 30.0);
        assert_eq!(split.dest.volume_of(&LiquidId::air()), 20.0);
    }

    #[test]
    fn split_conserves_total_volume() {
        let well = two_liquid_well();
        let before = well.total_volume_with_air();
        let split = well.split(42.0);
        let after = split.source.total_volume_with_air() + split.dest.total_volume_with_air();
        assert!((after - before).abs() < 1e-9);
    }

    #[test]
    fn split_leaves_air_at_source() {
        let mut well = two_liquid_well();
        well.set(LiquidId::air(), 10.0);
        let split = well.split(50.0);
        assert_eq!(split.source.volume_of(&LiquidId::air()), 10.0);
        assert_eq!(split.dest.volume_of(&LiquidId::air()), 0.0);
        assert_eq!(split.dest.total_volume(), 50.0);
    }

    #[test]
    fn merge_sums_shared_components() {
        let a = two_liquid_well();
        let mut b = LiquidContents::single(LiquidId::new("ingred1"), 10.0);
        b.set(LiquidId::new("ingred3"), 5.0);
        let merged = a.merge(&b);
        assert_eq!(merged.volume_of(&LiquidId::new("ingred1")), 70.0);
        assert_eq!(merged.volume_of(&LiquidId::new("ingred2")), 40.0);
        assert_eq!(merged.volume_of(&LiquidId::new("ingred3")), 5.0);
    }

    #[test]
    fn merge_then_split_round_trips_composition() {
        let a = two_liquid_well();
        let split = a.split(30.0);
        let recombined = split.source.merge(&split.dest);
        assert!((recombined.volume_of(&LiquidId::new("ingred1")) - 60.0).abs() < 1e-9);
        assert!((recombined.volume_of(&LiquidId::new("ingred2")) - 40.0).abs() < 1e-9);
    }
}
