//! Serializable simulation settings and their validation.

use std::time::Duration;

use hive_invasion_core::{
    AgentStats, Archetype, ArchetypeRoster, ArchetypeWeights, WaveSpec, WaveSpecError, WaveTable,
    WaveTableError, WorldPoint,
};
use hive_invasion_system_wave_composition::{SwarmBounds, SwarmBoundsError};
use serde::Deserialize;
use thiserror::Error;

/// Complete description of an encounter. Every field has a default, so an
/// empty TOML document describes the standard ten-wave campaign.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Seed feeding wave composition and swarm jitter.
    pub seed: u64,
    /// Spawn pacing.
    pub scheduler: SchedulerSettings,
    /// Stepped difficulty curve.
    pub scaling: ScalingSettings,
    /// Swarm cluster sizes.
    pub swarm: SwarmSettings,
    /// Navigable area.
    pub arena: ArenaSettings,
    /// Gate guarding the base.
    pub gate: ObjectiveSettings,
    /// Player base.
    pub base: ObjectiveSettings,
    /// Archetype templates.
    pub roster: RosterSettings,
    /// Custom wave table; the standard campaign is used when absent.
    pub waves: Option<Vec<WaveSettings>>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: 0x4856_4956_4153_494f,
            scheduler: SchedulerSettings::default(),
            scaling: ScalingSettings::default(),
            swarm: SwarmSettings::default(),
            arena: ArenaSettings::default(),
            gate: ObjectiveSettings::at(PointSettings { x: 0.0, z: 0.0 }, 2.0, 100),
            base: ObjectiveSettings::at(PointSettings { x: 0.0, z: 20.0 }, 3.0, 1_000),
            roster: RosterSettings::default(),
            waves: None,
        }
    }
}

impl SimulationConfig {
    /// Parses settings from a TOML document.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Wave table described by the settings.
    pub fn wave_table(&self) -> Result<WaveTable, ConfigError> {
        let Some(waves) = &self.waves else {
            return Ok(WaveTable::standard());
        };
        let specs = waves
            .iter()
            .map(WaveSettings::to_spec)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(WaveTable::new(specs)?)
    }

    /// Validated swarm cluster bounds.
    pub fn swarm_bounds(&self) -> Result<SwarmBounds, ConfigError> {
        Ok(SwarmBounds::new(self.swarm.min, self.swarm.max)?)
    }

    /// Validated arena half-extent.
    pub fn arena_half_extent(&self) -> Result<f32, ConfigError> {
        let half_extent = self.arena.half_extent;
        if !half_extent.is_finite() || half_extent <= 0.0 {
            return Err(ConfigError::InvalidArena { half_extent });
        }
        Ok(half_extent)
    }

    /// Rejects distances, rates and coordinates that are negative or not
    /// finite.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let scheduler = &self.scheduler;
        non_negative("scheduler.swarm_jitter", scheduler.swarm_jitter)?;
        finite("scheduler.spawn_point.x", scheduler.spawn_point.x)?;
        finite("scheduler.spawn_point.z", scheduler.spawn_point.z)?;
        non_negative("scaling.speed_step", self.scaling.speed_step)?;
        non_negative("scaling.health_step", self.scaling.health_step)?;
        non_negative("arena.snap_radius", self.arena.snap_radius)?;
        let _ = self.arena_half_extent()?;

        for (name, objective) in [("gate", &self.gate), ("base", &self.base)] {
            finite(format!("{name}.position.x"), objective.position.x)?;
            finite(format!("{name}.position.z"), objective.position.z)?;
            non_negative(format!("{name}.reach"), objective.reach)?;
        }
        for (archetype, stats) in self.roster.overrides() {
            let Some(stats) = stats else { continue };
            let name = archetype.label();
            non_negative(format!("roster.{name}.move_speed"), stats.move_speed)?;
            non_negative(format!("roster.{name}.attack_range"), stats.attack_range)?;
        }
        Ok(())
    }

    /// Archetype templates after overrides and removals.
    #[must_use]
    pub fn roster(&self) -> ArchetypeRoster {
        self.roster.build()
    }
}

/// Errors raised while loading or validating a [`SimulationConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The TOML document could not be parsed.
    #[error("failed to parse simulation config: {0}")]
    Parse(#[from] toml::de::Error),
    /// A wave entry is invalid.
    #[error("invalid wave: {0}")]
    Wave(#[from] WaveSpecError),
    /// Wave entries are not strictly increasing.
    #[error("invalid wave table: {0}")]
    WaveTable(#[from] WaveTableError),
    /// Swarm bounds are invalid.
    #[error("invalid swarm bounds: {0}")]
    Swarm(#[from] SwarmBoundsError),
    /// A numeric setting is negative or not finite.
    #[error("{field} must be finite and non-negative, got {value}")]
    InvalidValue {
        /// Dotted path of the rejected setting.
        field: String,
        /// Rejected value.
        value: f32,
    },
    /// The arena has no usable area.
    #[error("arena half extent must be positive and finite, got {half_extent}")]
    InvalidArena {
        /// Rejected half-extent.
        half_extent: f32,
    },
}

fn finite(field: impl Into<String>, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() {
        return Ok(());
    }
    Err(ConfigError::InvalidValue {
        field: field.into(),
        value,
    })
}

fn non_negative(field: impl Into<String>, value: f32) -> Result<(), ConfigError> {
    let field = field.into();
    finite(field.as_str(), value)?;
    if value < 0.0 {
        return Err(ConfigError::InvalidValue { field, value });
    }
    Ok(())
}

/// Ground-plane coordinates in TOML form.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PointSettings {
    /// Horizontal coordinate.
    pub x: f32,
    /// Depth coordinate.
    pub z: f32,
}

impl From<PointSettings> for WorldPoint {
    fn from(point: PointSettings) -> Self {
        WorldPoint::new(point.x, point.z)
    }
}

/// Spawn pacing and placement.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SchedulerSettings {
    /// Delay before the first wave, in milliseconds.
    pub initial_offset_ms: u64,
    /// Pause after every spawn instruction, in milliseconds.
    pub inter_enemy_delay_ms: u64,
    /// Pause between waves, in milliseconds.
    pub inter_wave_delay_ms: u64,
    /// Maximum per-axis offset of swarm units from the spawn point.
    pub swarm_jitter: f32,
    /// Where every wave enters the arena.
    pub spawn_point: PointSettings,
}

impl SchedulerSettings {
    /// Delay before the first wave.
    #[must_use]
    pub fn initial_offset(&self) -> Duration {
        Duration::from_millis(self.initial_offset_ms)
    }

    /// Pause after every spawn instruction.
    #[must_use]
    pub fn inter_enemy_delay(&self) -> Duration {
        Duration::from_millis(self.inter_enemy_delay_ms)
    }

    /// Pause between waves.
    #[must_use]
    pub fn inter_wave_delay(&self) -> Duration {
        Duration::from_millis(self.inter_wave_delay_ms)
    }
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            initial_offset_ms: 0,
            inter_enemy_delay_ms: 1_000,
            inter_wave_delay_ms: 5_000,
            swarm_jitter: 1.0,
            spawn_point: PointSettings { x: 0.0, z: -40.0 },
        }
    }
}

/// Step sizes of the difficulty curve.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScalingSettings {
    /// Speed gained every three waves.
    pub speed_step: f32,
    /// Health gained every two waves.
    pub health_step: f32,
}

impl Default for ScalingSettings {
    fn default() -> Self {
        Self {
            speed_step: 0.05,
            health_step: 0.10,
        }
    }
}

/// Swarm cluster size range.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SwarmSettings {
    /// Smallest nominal cluster.
    pub min: u32,
    /// Largest cluster.
    pub max: u32,
}

impl Default for SwarmSettings {
    fn default() -> Self {
        Self { min: 3, max: 6 }
    }
}

/// Navigable area settings.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ArenaSettings {
    /// The arena spans `[-half_extent, half_extent]` on both axes.
    pub half_extent: f32,
    /// How far a stranded agent may be moved back onto the arena.
    pub snap_radius: f32,
}

impl Default for ArenaSettings {
    fn default() -> Self {
        Self {
            half_extent: 50.0,
            snap_radius: 4.0,
        }
    }
}

/// Placement and durability of the gate or base.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ObjectiveSettings {
    /// Whether the objective exists at all.
    #[serde(default = "enabled")]
    pub enabled: bool,
    /// Centre of the objective.
    pub position: PointSettings,
    /// Footprint radius; attack range is measured to this edge.
    pub reach: f32,
    /// Starting health.
    pub max_health: u32,
}

impl ObjectiveSettings {
    /// An enabled objective.
    #[must_use]
    pub const fn at(position: PointSettings, reach: f32, max_health: u32) -> Self {
        Self {
            enabled: true,
            position,
            reach,
            max_health,
        }
    }
}

fn enabled() -> bool {
    true
}

/// Stat overrides and removals applied to the standard templates.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RosterSettings {
    /// Scout override.
    pub scout: Option<StatSettings>,
    /// Armored override.
    pub armored: Option<StatSettings>,
    /// Ranged override.
    pub ranged: Option<StatSettings>,
    /// Swarm override.
    pub swarm: Option<StatSettings>,
    /// Archetypes without a template; spawning them is skipped.
    pub disabled: Vec<Archetype>,
}

impl RosterSettings {
    fn overrides(&self) -> [(Archetype, Option<StatSettings>); 4] {
        [
            (Archetype::Scout, self.scout),
            (Archetype::Armored, self.armored),
            (Archetype::Ranged, self.ranged),
            (Archetype::Swarm, self.swarm),
        ]
    }

    fn build(&self) -> ArchetypeRoster {
        let mut roster = ArchetypeRoster::standard();
        for (archetype, stats) in self.overrides() {
            if let Some(stats) = stats {
                roster = roster.with(archetype, stats.into());
            }
        }
        for archetype in &self.disabled {
            roster = roster.without(*archetype);
        }
        roster
    }
}

/// Full stat block for one archetype.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StatSettings {
    /// Unscaled health.
    pub max_health: u32,
    /// Unscaled speed in world units per second.
    pub move_speed: f32,
    /// Distance to an objective's edge from which attacks land.
    pub attack_range: f32,
    /// Damage per attack.
    pub attack_damage: u32,
    /// Minimum time between attacks, in milliseconds.
    pub attack_cooldown_ms: u64,
    /// Marks ranged attackers.
    #[serde(default)]
    pub ranged: bool,
}

impl From<StatSettings> for AgentStats {
    fn from(settings: StatSettings) -> Self {
        AgentStats {
            max_health: settings.max_health,
            move_speed: settings.move_speed,
            attack_range: settings.attack_range,
            attack_damage: settings.attack_damage,
            attack_cooldown: Duration::from_millis(settings.attack_cooldown_ms),
            is_ranged: settings.ranged,
        }
    }
}

/// One row of a custom wave table.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WaveSettings {
    /// One-based wave number.
    pub wave: u32,
    /// Units in the wave.
    pub count: u32,
    /// Scout weight.
    #[serde(default)]
    pub scout: f64,
    /// Armored weight.
    #[serde(default)]
    pub armored: f64,
    /// Ranged weight.
    #[serde(default)]
    pub ranged: f64,
    /// Swarm weight.
    #[serde(default)]
    pub swarm: f64,
    /// Marks a boss wave.
    #[serde(default)]
    pub boss: bool,
}

impl WaveSettings {
    fn to_spec(&self) -> Result<WaveSpec, WaveSpecError> {
        let weights = ArchetypeWeights::new(self.scout, self.armored, self.ranged, self.swarm);
        WaveSpec::new(self.wave, self.count, weights).map(|spec| spec.with_boss(self.boss))
    }
}
