#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Hive Invasion encounter engine.
//!
//! This crate defines the message surface that connects the driver, the
//! authoritative world, and pure systems. Drivers submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to. Systems read immutable snapshots and respond with new command
//! batches or calls into the capability traits declared here
//! ([`UnitFactory`], [`AgentMover`], [`ObjectiveLookup`]).

use std::{num::NonZeroU32, time::Duration};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of hostile archetypes known to the encounter engine.
pub const ARCHETYPE_COUNT: usize = 4;

/// Named hostile-unit template.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Archetype {
    /// Fast, fragile melee unit.
    Scout,
    /// Slow, durable melee unit.
    Armored,
    /// Unit that attacks from a distance.
    Ranged,
    /// Weak unit that always spawns in clusters.
    Swarm,
}

impl Archetype {
    /// Every archetype in allocation order.
    pub const ALL: [Archetype; ARCHETYPE_COUNT] = [
        Archetype::Scout,
        Archetype::Armored,
        Archetype::Ranged,
        Archetype::Swarm,
    ];

    /// Position of the archetype within [`Archetype::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Scout => 0,
            Self::Armored => 1,
            Self::Ranged => 2,
            Self::Swarm => 3,
        }
    }

    /// Human readable label used in logs and summaries.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Scout => "scout",
            Self::Armored => "armored",
            Self::Ranged => "ranged",
            Self::Swarm => "swarm",
        }
    }
}

/// Unique identifier assigned to a hostile agent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AgentId(u32);

impl AgentId {
    /// Creates a new agent identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to an objective (gate or base).
///
/// Identifiers are never reused, so a stale identifier simply stops resolving
/// once its objective is destroyed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectiveId(u32);

impl ObjectiveId {
    /// Creates a new objective identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// One-based index of a wave within the campaign.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WaveNumber(NonZeroU32);

impl WaveNumber {
    /// The opening wave.
    pub const FIRST: WaveNumber = WaveNumber(NonZeroU32::MIN);

    /// Creates a wave number, rejecting zero.
    #[must_use]
    pub const fn new(value: u32) -> Option<Self> {
        match NonZeroU32::new(value) {
            Some(value) => Some(Self(value)),
            None => None,
        }
    }

    /// Retrieves the one-based wave index.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0.get()
    }
}

/// Location on the ground plane measured in world units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldPoint {
    x: f32,
    z: f32,
}

impl WorldPoint {
    /// Creates a new ground-plane point.
    #[must_use]
    pub const fn new(x: f32, z: f32) -> Self {
        Self { x, z }
    }

    /// Horizontal coordinate.
    #[must_use]
    pub const fn x(&self) -> f32 {
        self.x
    }

    /// Depth coordinate.
    #[must_use]
    pub const fn z(&self) -> f32 {
        self.z
    }

    /// Euclidean distance between two points.
    #[must_use]
    pub fn distance_to(self, other: WorldPoint) -> f32 {
        let dx = other.x - self.x;
        let dz = other.z - self.z;
        (dx * dx + dz * dz).sqrt()
    }

    /// Returns the point translated by the provided offsets.
    #[must_use]
    pub fn offset(self, dx: f32, dz: f32) -> Self {
        Self::new(self.x + dx, self.z + dz)
    }

    /// Moves toward `target` by at most `max_step` world units.
    #[must_use]
    pub fn step_toward(self, target: WorldPoint, max_step: f32) -> Self {
        let distance = self.distance_to(target);
        if distance <= max_step || distance <= f32::EPSILON {
            return target;
        }
        let ratio = max_step / distance;
        Self::new(
            self.x + (target.x - self.x) * ratio,
            self.z + (target.z - self.z) * ratio,
        )
    }
}

/// Fractional composition weights for a wave, one per archetype.
///
/// Weights are not required to sum to one; consumers normalize them.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ArchetypeWeights {
    weights: [f64; ARCHETYPE_COUNT],
}

impl ArchetypeWeights {
    /// Creates a weight vector in allocation order.
    #[must_use]
    pub const fn new(scout: f64, armored: f64, ranged: f64, swarm: f64) -> Self {
        Self {
            weights: [scout, armored, ranged, swarm],
        }
    }

    /// Weight assigned to the provided archetype.
    #[must_use]
    pub const fn get(&self, archetype: Archetype) -> f64 {
        self.weights[archetype.index()]
    }

    /// Raw weights in [`Archetype::ALL`] order.
    #[must_use]
    pub const fn as_array(&self) -> [f64; ARCHETYPE_COUNT] {
        self.weights
    }
}

/// Declarative description of a single wave.
#[derive(Clone, Debug, PartialEq)]
pub struct WaveSpec {
    wave: WaveNumber,
    enemy_count: u32,
    weights: ArchetypeWeights,
    boss_wave: bool,
}

impl WaveSpec {
    /// Validates and creates a wave description.
    pub fn new(
        wave_number: u32,
        enemy_count: u32,
        weights: ArchetypeWeights,
    ) -> Result<Self, WaveSpecError> {
        let wave = WaveNumber::new(wave_number).ok_or(WaveSpecError::ZeroWaveNumber)?;
        for archetype in Archetype::ALL {
            let weight = weights.get(archetype);
            if !weight.is_finite() {
                return Err(WaveSpecError::NonFiniteWeight { wave, archetype });
            }
            if weight < 0.0 {
                return Err(WaveSpecError::NegativeWeight {
                    wave,
                    archetype,
                    weight,
                });
            }
        }

        Ok(Self {
            wave,
            enemy_count,
            weights,
            boss_wave: false,
        })
    }

    /// Marks the wave as a boss wave.
    #[must_use]
    pub fn with_boss(mut self, boss_wave: bool) -> Self {
        self.boss_wave = boss_wave;
        self
    }

    /// One-based wave index.
    #[must_use]
    pub const fn wave(&self) -> WaveNumber {
        self.wave
    }

    /// Exact number of units the wave spawns.
    #[must_use]
    pub const fn enemy_count(&self) -> u32 {
        self.enemy_count
    }

    /// Composition weights for the wave.
    #[must_use]
    pub const fn weights(&self) -> &ArchetypeWeights {
        &self.weights
    }

    /// Reports whether the wave is flagged as a boss wave.
    #[must_use]
    pub const fn is_boss_wave(&self) -> bool {
        self.boss_wave
    }
}

/// Reasons a [`WaveSpec`] may be rejected.
#[derive(Clone, Copy, Debug, PartialEq, Error)]
pub enum WaveSpecError {
    /// Wave numbers are one-based.
    #[error("wave numbers start at 1")]
    ZeroWaveNumber,
    /// A weight was NaN or infinite.
    #[error("wave {}: {} weight is not finite", wave.get(), archetype.label())]
    NonFiniteWeight {
        /// Wave carrying the invalid weight.
        wave: WaveNumber,
        /// Archetype whose weight is invalid.
        archetype: Archetype,
    },
    /// A weight was below zero.
    #[error("wave {}: {} weight {weight} is negative", wave.get(), archetype.label())]
    NegativeWeight {
        /// Wave carrying the invalid weight.
        wave: WaveNumber,
        /// Archetype whose weight is invalid.
        archetype: Archetype,
        /// Rejected weight value.
        weight: f64,
    },
}

/// Ordered, read-only progression of waves.
#[derive(Clone, Debug, PartialEq)]
pub struct WaveTable {
    specs: Vec<WaveSpec>,
}

impl WaveTable {
    /// Creates a wave table, requiring strictly increasing wave numbers.
    pub fn new(specs: Vec<WaveSpec>) -> Result<Self, WaveTableError> {
        for pair in specs.windows(2) {
            if pair[1].wave <= pair[0].wave {
                return Err(WaveTableError::OutOfOrder {
                    previous: pair[0].wave,
                    next: pair[1].wave,
                });
            }
        }
        Ok(Self { specs })
    }

    /// Ten-wave campaign progression.
    #[must_use]
    pub fn standard() -> Self {
        const TABLE: [(u32, [f64; ARCHETYPE_COUNT]); 10] = [
            (3, [0.0, 0.0, 0.0, 1.0]),
            (4, [0.7, 0.3, 0.0, 0.0]),
            (5, [0.5, 0.5, 0.0, 0.0]),
            (6, [0.4, 0.4, 0.2, 0.0]),
            (7, [0.3, 0.3, 0.25, 0.15]),
            (8, [0.25, 0.25, 0.3, 0.2]),
            (10, [0.2, 0.3, 0.25, 0.25]),
            (12, [0.15, 0.4, 0.25, 0.2]),
            (15, [0.25, 0.2, 0.35, 0.2]),
            (20, [0.2, 0.25, 0.3, 0.25]),
        ];

        let specs = TABLE
            .iter()
            .zip(1u32..)
            .filter_map(|(&(enemy_count, weights), number)| {
                let wave = WaveNumber::new(number)?;
                Some(WaveSpec {
                    wave,
                    enemy_count,
                    weights: ArchetypeWeights { weights },
                    boss_wave: false,
                })
            })
            .collect();
        Self { specs }
    }

    /// Number of waves in the table.
    #[must_use]
    pub fn len(&self) -> usize {
        self.specs.len()
    }

    /// Reports whether the table holds no waves.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Wave stored at the provided zero-based position.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&WaveSpec> {
        self.specs.get(index)
    }

    /// Iterator over the waves in campaign order.
    pub fn iter(&self) -> impl Iterator<Item = &WaveSpec> {
        self.specs.iter()
    }

    /// Per-wave enemy counts used for progress displays.
    #[must_use]
    pub fn enemy_counts(&self) -> Vec<(WaveNumber, u32)> {
        self.specs
            .iter()
            .map(|spec| (spec.wave, spec.enemy_count))
            .collect()
    }

    /// Last wave of the campaign, if any.
    #[must_use]
    pub fn final_wave(&self) -> Option<WaveNumber> {
        self.specs.last().map(WaveSpec::wave)
    }
}

/// Reasons a [`WaveTable`] may be rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum WaveTableError {
    /// Wave numbers must strictly increase through the table.
    #[error("wave {} follows wave {} out of order", next.get(), previous.get())]
    OutOfOrder {
        /// Wave listed first.
        previous: WaveNumber,
        /// Wave listed immediately afterwards.
        next: WaveNumber,
    },
}

/// One instruction to produce a unit or a clustered group of units.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SpawnItem {
    /// A single unit of the provided archetype.
    Single(Archetype),
    /// A cluster of swarm units spawned together.
    SwarmGroup(NonZeroU32),
}

impl SpawnItem {
    /// Archetype produced by the instruction.
    #[must_use]
    pub const fn archetype(&self) -> Archetype {
        match self {
            Self::Single(archetype) => *archetype,
            Self::SwarmGroup(_) => Archetype::Swarm,
        }
    }

    /// Number of units produced by the instruction.
    #[must_use]
    pub const fn count(&self) -> u32 {
        match self {
            Self::Single(_) => 1,
            Self::SwarmGroup(count) => count.get(),
        }
    }
}

/// Combat statistics of an agent or archetype template.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AgentStats {
    /// Health the agent spawns with.
    pub max_health: u32,
    /// Movement speed in world units per second.
    pub move_speed: f32,
    /// Distance from which the agent can hit an objective's edge.
    pub attack_range: f32,
    /// Damage dealt per attack.
    pub attack_damage: u32,
    /// Minimum simulated time between two attacks.
    pub attack_cooldown: Duration,
    /// Indicates whether the agent attacks from a distance.
    pub is_ranged: bool,
}

impl AgentStats {
    /// Applies spawn-time scaling to the base statistics.
    ///
    /// Health is rounded to the nearest whole point and never drops below one.
    #[must_use]
    pub fn scaled(&self, scaling: StatScaling) -> Self {
        let health = (self.max_health as f32 * scaling.health).round();
        Self {
            max_health: (health.max(1.0)) as u32,
            move_speed: self.move_speed * scaling.speed,
            ..*self
        }
    }
}

/// Speed and health multipliers applied once when an agent spawns.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StatScaling {
    /// Multiplier applied to movement speed.
    pub speed: f32,
    /// Multiplier applied to maximum health.
    pub health: f32,
}

impl StatScaling {
    /// Scaling that leaves statistics untouched.
    pub const IDENTITY: StatScaling = StatScaling {
        speed: 1.0,
        health: 1.0,
    };
}

/// Archetype templates available to the unit factory.
///
/// A missing entry models an unbound template; spawning it fails with
/// [`SpawnError::MissingTemplate`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ArchetypeRoster {
    templates: [Option<AgentStats>; ARCHETYPE_COUNT],
}

impl ArchetypeRoster {
    /// Creates a roster without any templates.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns the roster with `stats` bound to `archetype`.
    #[must_use]
    pub fn with(mut self, archetype: Archetype, stats: AgentStats) -> Self {
        self.templates[archetype.index()] = Some(stats);
        self
    }

    /// Returns the roster with the template for `archetype` removed.
    #[must_use]
    pub fn without(mut self, archetype: Archetype) -> Self {
        self.templates[archetype.index()] = None;
        self
    }

    /// Template bound to the archetype, if any.
    #[must_use]
    pub fn template(&self, archetype: Archetype) -> Option<&AgentStats> {
        self.templates[archetype.index()].as_ref()
    }

    /// Default campaign templates for every archetype.
    #[must_use]
    pub fn standard() -> Self {
        Self::empty()
            .with(
                Archetype::Scout,
                AgentStats {
                    max_health: 60,
                    move_speed: 5.0,
                    attack_range: 2.0,
                    attack_damage: 5,
                    attack_cooldown: Duration::from_millis(1_000),
                    is_ranged: false,
                },
            )
            .with(
                Archetype::Armored,
                AgentStats {
                    max_health: 200,
                    move_speed: 2.5,
                    attack_range: 2.0,
                    attack_damage: 15,
                    attack_cooldown: Duration::from_millis(1_500),
                    is_ranged: false,
                },
            )
            .with(
                Archetype::Ranged,
                AgentStats {
                    max_health: 80,
                    move_speed: 3.5,
                    attack_range: 12.0,
                    attack_damage: 8,
                    attack_cooldown: Duration::from_millis(2_000),
                    is_ranged: true,
                },
            )
            .with(
                Archetype::Swarm,
                AgentStats {
                    max_health: 25,
                    move_speed: 6.0,
                    attack_range: 1.5,
                    attack_damage: 3,
                    attack_cooldown: Duration::from_millis(750),
                    is_ranged: false,
                },
            )
    }
}

/// Immutable representation of a single agent's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AgentSnapshot {
    /// Identifier assigned to the agent.
    pub id: AgentId,
    /// Template the agent was spawned from.
    pub archetype: Archetype,
    /// Remaining health.
    pub health: u32,
    /// Statistics after spawn-time scaling.
    pub stats: AgentStats,
    /// Simulated time of the last resolved attack.
    pub last_attack: Option<Duration>,
}

impl AgentSnapshot {
    /// Reports whether the attack cooldown has elapsed at `now`.
    #[must_use]
    pub fn ready_to_attack(&self, now: Duration) -> bool {
        match self.last_attack {
            Some(last) => now.saturating_sub(last) >= self.stats.attack_cooldown,
            None => true,
        }
    }
}

/// Kinds of damageable objectives agents march toward.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectiveKind {
    /// Gate guarding the approach to the base.
    Gate,
    /// Player base; its destruction ends the game.
    Base,
}

/// Immutable representation of an objective used for targeting.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ObjectiveSnapshot {
    /// Identifier assigned to the objective.
    pub id: ObjectiveId,
    /// Gate or base.
    pub kind: ObjectiveKind,
    /// Centre of the objective.
    pub position: WorldPoint,
    /// Radius of the objective's footprint around its centre.
    pub reach: f32,
    /// Remaining health.
    pub health: u32,
    /// Health the objective started with.
    pub max_health: u32,
}

/// Read access to the objectives present in the world.
pub trait ObjectiveLookup {
    /// Finds the objective of `kind` by its stable identifier.
    ///
    /// An open gate is not discoverable until it closes again.
    fn find(&self, kind: ObjectiveKind) -> Option<ObjectiveId>;

    /// Resolves a previously discovered objective; `None` once destroyed.
    fn resolve(&self, id: ObjectiveId) -> Option<ObjectiveSnapshot>;
}

/// Which objective an agent prefers to attack.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TargetPriority {
    /// Attack the gate while it stands closed.
    Gate,
    /// Head straight for the base.
    Base,
}

/// Signals broadcast about the gate through the objective event bus.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ObjectiveSignal {
    /// The gate was destroyed.
    Destroyed,
    /// The gate was opened and should be bypassed.
    Opened,
    /// The gate was closed and blocks the path again.
    Closed,
}

/// Final result of an encounter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GameOutcome {
    /// Every wave was cleared with the base still standing.
    Victory,
    /// The base was destroyed.
    Defeat,
}

/// Reasons the unit factory may refuse to spawn an agent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum SpawnError {
    /// No template is bound to the archetype.
    #[error("no template bound for archetype {}", archetype.label())]
    MissingTemplate {
        /// Archetype that could not be instantiated.
        archetype: Archetype,
    },
    /// No spawn point is configured for the spawn source.
    #[error("no spawn point configured")]
    MissingSpawnPoint,
}

/// Capability that instantiates agents on behalf of the spawn scheduler.
pub trait UnitFactory {
    /// Instantiates an agent of `archetype` at `position`.
    fn spawn(&mut self, archetype: Archetype, position: WorldPoint) -> Result<AgentId, SpawnError>;

    /// Applies spawn-time scaling to a freshly spawned agent.
    fn scale(&mut self, agent: AgentId, scaling: StatScaling);
}

/// Navigation substrate that moves agents across the traversable surface.
pub trait AgentMover {
    /// Commands the agent to travel toward `point`.
    fn move_to(&mut self, agent: AgentId, point: WorldPoint);

    /// Halts the agent where it stands.
    fn stop(&mut self, agent: AgentId);

    /// Reports whether the agent reached its last destination.
    fn is_arrived(&self, agent: AgentId) -> bool;

    /// Reports whether the agent stands on the traversable surface.
    fn is_on_valid_surface(&self, agent: AgentId) -> bool;

    /// Moves the agent to the nearest valid point within `search_radius`.
    fn snap_to_nearest_valid_surface(&mut self, agent: AgentId, search_radius: f32) -> bool;

    /// Current location of the agent, if it is known to the mover.
    fn position(&self, agent: AgentId) -> Option<WorldPoint>;
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Requests that an agent strike an objective.
    AttackObjective {
        /// Agent performing the attack.
        attacker: AgentId,
        /// Objective being attacked.
        objective: ObjectiveId,
    },
    /// Applies damage to an agent, e.g. from a tower.
    DamageAgent {
        /// Agent receiving the damage.
        agent: AgentId,
        /// Amount of health removed.
        amount: u32,
    },
    /// Removes an agent without killing it.
    DespawnAgent {
        /// Agent to remove.
        agent: AgentId,
    },
    /// Opens the gate so agents bypass it.
    OpenGate,
    /// Closes the gate so agents target it again.
    CloseGate,
}

/// Events broadcast by the world and systems after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// A wave began spawning.
    WaveStarted {
        /// Wave that started.
        wave: WaveNumber,
    },
    /// Every unit of a wave has been spawned.
    WaveCompleted {
        /// Wave that completed.
        wave: WaveNumber,
    },
    /// An agent entered the world.
    AgentSpawned {
        /// Identifier assigned to the agent.
        agent: AgentId,
        /// Template the agent was spawned from.
        archetype: Archetype,
        /// Location the agent spawned at.
        position: WorldPoint,
        /// Wave the agent belongs to.
        wave: WaveNumber,
    },
    /// An agent resolved an attack against an objective.
    AgentAttacked {
        /// Agent that attacked.
        attacker: AgentId,
        /// Objective that was hit.
        objective: ObjectiveId,
        /// Damage dealt.
        damage: u32,
    },
    /// An objective lost health.
    ObjectiveDamaged {
        /// Objective that was hit.
        objective: ObjectiveId,
        /// Gate or base.
        kind: ObjectiveKind,
        /// Remaining health.
        health: u32,
        /// Health the objective started with.
        max_health: u32,
    },
    /// An objective reached zero health and left the world.
    ObjectiveDestroyed {
        /// Objective that was destroyed.
        objective: ObjectiveId,
        /// Gate or base.
        kind: ObjectiveKind,
    },
    /// The gate opened.
    GateOpened,
    /// The gate closed.
    GateClosed,
    /// An agent lost health.
    AgentDamaged {
        /// Agent that was hit.
        agent: AgentId,
        /// Remaining health.
        health: u32,
    },
    /// An agent reached zero health.
    AgentDied {
        /// Agent that died.
        agent: AgentId,
    },
    /// An agent was removed without dying.
    AgentDespawned {
        /// Agent that was removed.
        agent: AgentId,
    },
    /// The encounter reached a terminal state.
    OutcomeDecided {
        /// Result of the encounter.
        outcome: GameOutcome,
    },
}
