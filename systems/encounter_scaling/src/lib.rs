#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Stepped difficulty scaling applied to agents when they spawn.

use hive_invasion_core::{StatScaling, WaveNumber};

/// Waves between successive speed increases.
const SPEED_STEP_INTERVAL: u32 = 3;
/// Waves between successive health increases.
const HEALTH_STEP_INTERVAL: u32 = 2;

/// Pure scaling curve mapping a wave index to stat multipliers.
///
/// Speed grows by `speed_step` every three waves and health by `health_step`
/// every two waves:
///
/// ```text
/// speed(w)  = 1 + speed_step  * floor((w - 1) / 3)
/// health(w) = 1 + health_step * floor((w - 1) / 2)
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EncounterScaling {
    speed_step: f32,
    health_step: f32,
}

impl EncounterScaling {
    /// Creates a scaling curve with explicit step sizes.
    #[must_use]
    pub const fn new(speed_step: f32, health_step: f32) -> Self {
        Self {
            speed_step,
            health_step,
        }
    }

    /// Movement speed multiplier for the provided wave.
    #[must_use]
    pub fn speed_multiplier(&self, wave: WaveNumber) -> f32 {
        1.0 + self.speed_step * steps(wave, SPEED_STEP_INTERVAL)
    }

    /// Maximum health multiplier for the provided wave.
    #[must_use]
    pub fn health_multiplier(&self, wave: WaveNumber) -> f32 {
        1.0 + self.health_step * steps(wave, HEALTH_STEP_INTERVAL)
    }

    /// Both multipliers for the provided wave.
    #[must_use]
    pub fn scaling_for(&self, wave: WaveNumber) -> StatScaling {
        StatScaling {
            speed: self.speed_multiplier(wave),
            health: self.health_multiplier(wave),
        }
    }
}

impl Default for EncounterScaling {
    fn default() -> Self {
        Self::new(0.05, 0.10)
    }
}

fn steps(wave: WaveNumber, interval: u32) -> f32 {
    ((wave.get() - 1) / interval) as f32
}
