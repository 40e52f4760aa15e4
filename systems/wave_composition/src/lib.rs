#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Wave composition: turns fractional archetype weights into an exact,
//! shuffled list of spawn instructions.

use std::num::NonZeroU32;

use hive_invasion_core::{
    Archetype, ArchetypeWeights, SpawnItem, WaveSpec, ARCHETYPE_COUNT,
};
use rand::{seq::SliceRandom, Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use thiserror::Error;

/// Inclusive size range for swarm clusters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SwarmBounds {
    min: NonZeroU32,
    max: NonZeroU32,
}

impl SwarmBounds {
    /// Clusters of three to six swarm units.
    pub const STANDARD: SwarmBounds = SwarmBounds {
        min: match NonZeroU32::new(3) {
            Some(value) => value,
            None => NonZeroU32::MIN,
        },
        max: match NonZeroU32::new(6) {
            Some(value) => value,
            None => NonZeroU32::MIN,
        },
    };

    /// Validates and creates a cluster size range.
    pub fn new(min: u32, max: u32) -> Result<Self, SwarmBoundsError> {
        let min_nz = NonZeroU32::new(min).ok_or(SwarmBoundsError::ZeroMinimum)?;
        if max < min {
            return Err(SwarmBoundsError::Inverted { min, max });
        }
        let max_nz = NonZeroU32::new(max).ok_or(SwarmBoundsError::ZeroMinimum)?;
        Ok(Self {
            min: min_nz,
            max: max_nz,
        })
    }

    /// Smallest nominal cluster size.
    #[must_use]
    pub const fn min(&self) -> u32 {
        self.min.get()
    }

    /// Largest cluster size.
    #[must_use]
    pub const fn max(&self) -> u32 {
        self.max.get()
    }
}

impl Default for SwarmBounds {
    fn default() -> Self {
        Self::STANDARD
    }
}

/// Reasons a [`SwarmBounds`] may be rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum SwarmBoundsError {
    /// Clusters must contain at least one unit.
    #[error("swarm cluster minimum must be at least 1")]
    ZeroMinimum,
    /// The maximum is smaller than the minimum.
    #[error("swarm cluster maximum {max} is below minimum {min}")]
    Inverted {
        /// Requested minimum.
        min: u32,
        /// Requested maximum.
        max: u32,
    },
}

/// Integer unit counts per archetype produced by the allocation step.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ArchetypeCounts {
    counts: [u32; ARCHETYPE_COUNT],
}

impl ArchetypeCounts {
    /// Creates a count vector in [`Archetype::ALL`] order.
    #[must_use]
    pub const fn new(scout: u32, armored: u32, ranged: u32, swarm: u32) -> Self {
        Self {
            counts: [scout, armored, ranged, swarm],
        }
    }

    /// Units allocated to the archetype.
    #[must_use]
    pub const fn get(&self, archetype: Archetype) -> u32 {
        self.counts[archetype.index()]
    }

    /// Total units across every archetype.
    #[must_use]
    pub fn total(&self) -> u32 {
        self.counts.iter().sum()
    }
}

/// Apportions `enemy_count` units across archetypes with the largest-remainder
/// method.
///
/// Weights are normalized first; an all-zero vector sends every unit to the
/// first archetype. Leftover units go one at a time to the largest fractional
/// remainder, ties resolved toward the lower archetype index. A remainder
/// that received a unit is replaced by a strictly decreasing sentinel, so an
/// archetype is picked twice only after every other remainder was consumed.
#[must_use]
pub fn allocate_counts(weights: &ArchetypeWeights, enemy_count: u32) -> ArchetypeCounts {
    let raw = weights.as_array().map(|weight| weight.max(0.0));
    let sum: f64 = raw.iter().sum();
    let normalized = if sum > 0.0 {
        raw.map(|weight| weight / sum)
    } else {
        let mut fallback = [0.0; ARCHETYPE_COUNT];
        fallback[0] = 1.0;
        fallback
    };

    let total = f64::from(enemy_count);
    let mut counts = [0u32; ARCHETYPE_COUNT];
    let mut remainders = [0f64; ARCHETYPE_COUNT];
    for index in 0..ARCHETYPE_COUNT {
        let exact = normalized[index] * total;
        let base = exact.floor();
        counts[index] = base as u32;
        remainders[index] = exact - base;
    }

    let allocated: u32 = counts.iter().sum();
    debug_assert!(allocated <= enemy_count, "floors never exceed the total");
    let remaining = enemy_count.saturating_sub(allocated);

    let mut sentinel = -1.0;
    for _ in 0..remaining {
        let mut best = 0;
        for index in 1..ARCHETYPE_COUNT {
            if remainders[index] > remainders[best] {
                best = index;
            }
        }
        counts[best] += 1;
        remainders[best] = sentinel;
        sentinel -= 1.0;
    }

    ArchetypeCounts { counts }
}

/// Splits `total` swarm units into clusters.
///
/// Totals below the minimum form a single undersized cluster. Otherwise
/// clusters of random size in `[min, max]` are drawn until at most `max`
/// units remain, which form the final cluster; that final cluster may be
/// smaller than `min`.
pub fn partition_swarm<R>(total: u32, bounds: SwarmBounds, rng: &mut R) -> Vec<NonZeroU32>
where
    R: Rng + ?Sized,
{
    let Some(total_nz) = NonZeroU32::new(total) else {
        return Vec::new();
    };
    if total < bounds.min() {
        return vec![total_nz];
    }

    let mut groups = Vec::new();
    let mut remaining = total;
    while let Some(remaining_nz) = NonZeroU32::new(remaining) {
        if remaining <= bounds.max() {
            groups.push(remaining_nz);
            break;
        }
        let size = rng.gen_range(bounds.min()..=bounds.max());
        groups.push(NonZeroU32::new(size).unwrap_or(NonZeroU32::MIN));
        remaining -= size;
    }
    groups
}

/// Configuration parameters required to construct the wave composer.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    rng_seed: u64,
    swarm_bounds: SwarmBounds,
}

impl Config {
    /// Creates a new configuration using the provided seed and cluster bounds.
    #[must_use]
    pub const fn new(rng_seed: u64, swarm_bounds: SwarmBounds) -> Self {
        Self {
            rng_seed,
            swarm_bounds,
        }
    }
}

/// System that composes waves into shuffled spawn instructions.
#[derive(Debug)]
pub struct WaveComposer {
    rng: ChaCha8Rng,
    swarm_bounds: SwarmBounds,
}

impl WaveComposer {
    /// Creates a new composer using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
            swarm_bounds: config.swarm_bounds,
        }
    }

    /// Cluster bounds applied to the swarm archetype.
    #[must_use]
    pub fn swarm_bounds(&self) -> SwarmBounds {
        self.swarm_bounds
    }

    /// Produces the spawn instructions for a wave.
    ///
    /// The instruction counts always sum to the wave's enemy count.
    #[must_use]
    pub fn compose(&mut self, spec: &WaveSpec) -> Vec<SpawnItem> {
        let mut items = Vec::new();
        self.compose_into(spec, &mut items);
        items
    }

    /// Produces the spawn instructions for a wave into `out`.
    ///
    /// The output buffer is cleared before populating it.
    pub fn compose_into(&mut self, spec: &WaveSpec, out: &mut Vec<SpawnItem>) {
        out.clear();
        let counts = allocate_counts(spec.weights(), spec.enemy_count());

        for archetype in [Archetype::Scout, Archetype::Armored, Archetype::Ranged] {
            let count = counts.get(archetype) as usize;
            out.extend(std::iter::repeat(SpawnItem::Single(archetype)).take(count));
        }

        let swarm = counts.get(Archetype::Swarm);
        let groups = partition_swarm(swarm, self.swarm_bounds, &mut self.rng);
        out.extend(groups.into_iter().map(SpawnItem::SwarmGroup));

        out.shuffle(&mut self.rng);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_weights_fall_back_to_first_archetype() {
        let counts = allocate_counts(&ArchetypeWeights::new(0.0, 0.0, 0.0, 0.0), 5);
        assert_eq!(counts, ArchetypeCounts::new(5, 0, 0, 0));
    }

    #[test]
    fn unnormalized_weights_are_normalized() {
        let counts = allocate_counts(&ArchetypeWeights::new(2.0, 2.0, 0.0, 0.0), 6);
        assert_eq!(counts, ArchetypeCounts::new(3, 3, 0, 0));
    }

    #[test]
    fn equal_remainders_favour_lower_index() {
        let counts = allocate_counts(&ArchetypeWeights::new(1.0, 1.0, 1.0, 1.0), 6);
        assert_eq!(counts, ArchetypeCounts::new(2, 2, 1, 1));
    }

    #[test]
    fn leftover_units_go_to_distinct_largest_remainders() {
        // exact = {2.4, 0.8, 0.8, 0.0}
        let counts = allocate_counts(&ArchetypeWeights::new(0.6, 0.2, 0.2, 0.0), 4);
        assert_eq!(counts, ArchetypeCounts::new(2, 1, 1, 0));

        // exact = {1.9, 0.1, 0.0, 0.0}
        let counts = allocate_counts(&ArchetypeWeights::new(0.95, 0.05, 0.0, 0.0), 2);
        assert_eq!(counts, ArchetypeCounts::new(2, 0, 0, 0));
    }

    #[test]
    fn empty_wave_produces_no_items() {
        let spec = WaveSpec::new(1, 0, ArchetypeWeights::new(0.2, 0.2, 0.2, 0.4))
            .expect("valid wave");
        let mut composer = WaveComposer::new(Config::new(11, SwarmBounds::STANDARD));
        assert!(composer.compose(&spec).is_empty());
    }

    #[test]
    fn swarm_bounds_reject_invalid_ranges() {
        assert_eq!(SwarmBounds::new(0, 4), Err(SwarmBoundsError::ZeroMinimum));
        assert_eq!(
            SwarmBounds::new(5, 4),
            Err(SwarmBoundsError::Inverted { min: 5, max: 4 })
        );
        let bounds = SwarmBounds::new(3, 6).expect("valid bounds");
        assert_eq!(bounds, SwarmBounds::STANDARD);
    }
}
