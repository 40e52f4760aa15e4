#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Hive Invasion.
//!
//! The world owns the two objectives (gate and base) and every live agent's
//! combat state. It is mutated exclusively through [`apply`] and the spawn
//! entry points, and read through the [`query`] module.

pub mod navigation;

use std::{collections::BTreeMap, time::Duration};

use hive_invasion_core::{
    AgentId, AgentStats, Archetype, ArchetypeRoster, Command, Event, ObjectiveId, ObjectiveKind,
    SpawnError, StatScaling, WorldPoint,
};
use tracing::{debug, info, warn};

pub use navigation::{Navigator, NavigatorConfig};

/// Placement and durability of a single objective.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ObjectivePlacement {
    position: WorldPoint,
    reach: f32,
    max_health: u32,
}

impl ObjectivePlacement {
    /// Creates a placement description.
    #[must_use]
    pub const fn new(position: WorldPoint, reach: f32, max_health: u32) -> Self {
        Self {
            position,
            reach,
            max_health,
        }
    }
}

/// Configuration parameters required to construct the world.
#[derive(Clone, Debug)]
pub struct Config {
    gate: Option<ObjectivePlacement>,
    base: Option<ObjectivePlacement>,
    roster: ArchetypeRoster,
}

impl Config {
    /// Creates a world configuration from objective placements and templates.
    #[must_use]
    pub fn new(
        gate: Option<ObjectivePlacement>,
        base: Option<ObjectivePlacement>,
        roster: ArchetypeRoster,
    ) -> Self {
        Self { gate, base, roster }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(
            Some(ObjectivePlacement::new(WorldPoint::new(0.0, 0.0), 2.0, 100)),
            Some(ObjectivePlacement::new(WorldPoint::new(0.0, 20.0), 3.0, 1_000)),
            ArchetypeRoster::standard(),
        )
    }
}

/// Represents the authoritative Hive Invasion world state.
#[derive(Debug)]
pub struct World {
    clock: Duration,
    gate: Option<Objective>,
    gate_open: bool,
    base: Option<Objective>,
    agents: BTreeMap<AgentId, Agent>,
    roster: ArchetypeRoster,
    next_agent: u32,
}

impl World {
    /// Creates a new world populated with the configured objectives.
    #[must_use]
    pub fn new(config: Config) -> Self {
        let mut next_objective = 0;
        let mut place = |kind: ObjectiveKind, placement: Option<ObjectivePlacement>| {
            placement.map(|placement| {
                next_objective += 1;
                Objective::new(ObjectiveId::new(next_objective), kind, placement)
            })
        };
        let gate = place(ObjectiveKind::Gate, config.gate);
        let base = place(ObjectiveKind::Base, config.base);

        Self {
            clock: Duration::ZERO,
            gate,
            gate_open: false,
            base,
            agents: BTreeMap::new(),
            roster: config.roster,
            next_agent: 0,
        }
    }

    fn objective_mut(&mut self, id: ObjectiveId) -> Option<&mut Objective> {
        [self.gate.as_mut(), self.base.as_mut()]
            .into_iter()
            .flatten()
            .find(|objective| objective.id == id)
    }

    fn resolve_attack(
        &mut self,
        attacker: AgentId,
        objective: ObjectiveId,
        out_events: &mut Vec<Event>,
    ) {
        let now = self.clock;
        let Some(agent) = self.agents.get_mut(&attacker) else {
            debug!(agent = attacker.get(), "attack from unknown agent ignored");
            return;
        };
        if !agent.ready_to_attack(now) {
            return;
        }
        let damage = agent.stats.attack_damage;

        let Some(target) = self.objective_mut(objective) else {
            debug!(
                agent = attacker.get(),
                objective = objective.get(),
                "attack against missing objective ignored"
            );
            return;
        };
        target.health = target.health.saturating_sub(damage);
        let (kind, health, max_health) = (target.kind, target.health, target.max_health);

        if let Some(agent) = self.agents.get_mut(&attacker) {
            agent.last_attack = Some(now);
        }
        out_events.push(Event::AgentAttacked {
            attacker,
            objective,
            damage,
        });
        out_events.push(Event::ObjectiveDamaged {
            objective,
            kind,
            health,
            max_health,
        });

        if health == 0 {
            self.destroy_objective(objective, kind, out_events);
        }
    }

    fn destroy_objective(
        &mut self,
        objective: ObjectiveId,
        kind: ObjectiveKind,
        out_events: &mut Vec<Event>,
    ) {
        match kind {
            ObjectiveKind::Gate => {
                self.gate = None;
                self.gate_open = false;
                info!(objective = objective.get(), "gate destroyed");
                out_events.push(Event::ObjectiveDestroyed { objective, kind });
            }
            ObjectiveKind::Base => {
                self.base = None;
                warn!(objective = objective.get(), "base destroyed");
                out_events.push(Event::ObjectiveDestroyed { objective, kind });
                for agent in std::mem::take(&mut self.agents).into_keys() {
                    out_events.push(Event::AgentDespawned { agent });
                }
            }
        }
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Tick { dt } => {
            world.clock = world.clock.saturating_add(dt);
            out_events.push(Event::TimeAdvanced { dt });
        }
        Command::AttackObjective {
            attacker,
            objective,
        } => world.resolve_attack(attacker, objective, out_events),
        Command::DamageAgent { agent, amount } => {
            let Some(state) = world.agents.get_mut(&agent) else {
                return;
            };
            state.health = state.health.saturating_sub(amount);
            let health = state.health;
            out_events.push(Event::AgentDamaged { agent, health });
            if health == 0 {
                let _ = world.agents.remove(&agent);
                out_events.push(Event::AgentDied { agent });
            }
        }
        Command::DespawnAgent { agent } => {
            if world.agents.remove(&agent).is_some() {
                out_events.push(Event::AgentDespawned { agent });
            }
        }
        Command::OpenGate => {
            if world.gate.is_none() {
                debug!("open request ignored: no gate");
                return;
            }
            if world.gate_open {
                return;
            }
            world.gate_open = true;
            info!("gate opened");
            out_events.push(Event::GateOpened);
        }
        Command::CloseGate => {
            if world.gate.is_none() || !world.gate_open {
                return;
            }
            world.gate_open = false;
            info!("gate closed");
            out_events.push(Event::GateClosed);
        }
    }
}

/// Instantiates an agent from the archetype's template.
///
/// The caller announces the spawn; this only allocates the authoritative
/// state.
pub fn spawn_agent(
    world: &mut World,
    archetype: Archetype,
    position: WorldPoint,
) -> Result<AgentId, SpawnError> {
    let stats = *world
        .roster
        .template(archetype)
        .ok_or(SpawnError::MissingTemplate { archetype })?;

    world.next_agent += 1;
    let id = AgentId::new(world.next_agent);
    let _ = world.agents.insert(id, Agent::new(id, archetype, stats));
    debug!(
        agent = id.get(),
        archetype = archetype.label(),
        x = position.x(),
        z = position.z(),
        "agent spawned"
    );
    Ok(id)
}

/// Applies spawn-time scaling to an agent.
///
/// Returns `false` when the agent is unknown or was already scaled; scaling
/// never compounds.
pub fn scale_agent(world: &mut World, agent: AgentId, scaling: StatScaling) -> bool {
    let Some(state) = world.agents.get_mut(&agent) else {
        return false;
    };
    if state.scaled {
        return false;
    }
    state.stats = state.stats.scaled(scaling);
    state.health = state.stats.max_health;
    state.scaled = true;
    true
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use super::{Objective, World};
    use hive_invasion_core::{
        AgentId, AgentSnapshot, ObjectiveId, ObjectiveKind, ObjectiveLookup, ObjectiveSnapshot,
    };

    /// Simulated time accumulated by the world.
    #[must_use]
    pub fn clock(world: &World) -> Duration {
        world.clock
    }

    /// Reports whether the gate currently stands open.
    #[must_use]
    pub fn is_gate_open(world: &World) -> bool {
        world.gate_open
    }

    /// Snapshot of the objective of the provided kind, if it still stands.
    #[must_use]
    pub fn objective(world: &World, kind: ObjectiveKind) -> Option<ObjectiveSnapshot> {
        let objective = match kind {
            ObjectiveKind::Gate => world.gate.as_ref(),
            ObjectiveKind::Base => world.base.as_ref(),
        };
        objective.map(Objective::snapshot)
    }

    /// Captures a read-only view of the objectives for targeting.
    #[must_use]
    pub fn objective_view(world: &World) -> ObjectiveView {
        ObjectiveView {
            gate: objective(world, ObjectiveKind::Gate),
            gate_open: world.gate_open,
            base: objective(world, ObjectiveKind::Base),
        }
    }

    /// Snapshot of a single agent.
    #[must_use]
    pub fn agent(world: &World, agent: AgentId) -> Option<AgentSnapshot> {
        world.agents.get(&agent).map(super::Agent::snapshot)
    }

    /// Number of agents currently alive.
    #[must_use]
    pub fn agent_count(world: &World) -> usize {
        world.agents.len()
    }

    /// Captures a read-only view of the live agents in id order.
    #[must_use]
    pub fn agent_view(world: &World) -> AgentView {
        AgentView {
            snapshots: world.agents.values().map(super::Agent::snapshot).collect(),
        }
    }

    /// Read-only snapshot describing all live agents.
    #[derive(Clone, Debug, Default)]
    pub struct AgentView {
        snapshots: Vec<AgentSnapshot>,
    }

    impl AgentView {
        /// Iterator over the captured agent snapshots in deterministic order.
        pub fn iter(&self) -> impl Iterator<Item = &AgentSnapshot> {
            self.snapshots.iter()
        }

        /// Consumes the view, yielding the underlying snapshots.
        #[must_use]
        pub fn into_vec(self) -> Vec<AgentSnapshot> {
            self.snapshots
        }
    }

    /// Read-only snapshot of the objectives used to resolve targets.
    #[derive(Clone, Copy, Debug, Default)]
    pub struct ObjectiveView {
        gate: Option<ObjectiveSnapshot>,
        gate_open: bool,
        base: Option<ObjectiveSnapshot>,
    }

    impl ObjectiveLookup for ObjectiveView {
        fn find(&self, kind: ObjectiveKind) -> Option<ObjectiveId> {
            match kind {
                ObjectiveKind::Gate if self.gate_open => None,
                ObjectiveKind::Gate => self.gate.map(|gate| gate.id),
                ObjectiveKind::Base => self.base.map(|base| base.id),
            }
        }

        fn resolve(&self, id: ObjectiveId) -> Option<ObjectiveSnapshot> {
            [self.gate, self.base]
                .into_iter()
                .flatten()
                .find(|objective| objective.id == id)
        }
    }
}

#[derive(Clone, Debug)]
struct Objective {
    id: ObjectiveId,
    kind: ObjectiveKind,
    position: WorldPoint,
    reach: f32,
    health: u32,
    max_health: u32,
}

impl Objective {
    fn new(id: ObjectiveId, kind: ObjectiveKind, placement: ObjectivePlacement) -> Self {
        Self {
            id,
            kind,
            position: placement.position,
            reach: placement.reach,
            health: placement.max_health,
            max_health: placement.max_health,
        }
    }

    fn snapshot(&self) -> hive_invasion_core::ObjectiveSnapshot {
        hive_invasion_core::ObjectiveSnapshot {
            id: self.id,
            kind: self.kind,
            position: self.position,
            reach: self.reach,
            health: self.health,
            max_health: self.max_health,
        }
    }
}

#[derive(Clone, Debug)]
struct Agent {
    id: AgentId,
    archetype: Archetype,
    stats: AgentStats,
    health: u32,
    last_attack: Option<Duration>,
    scaled: bool,
}

impl Agent {
    fn new(id: AgentId, archetype: Archetype, stats: AgentStats) -> Self {
        Self {
            id,
            archetype,
            stats,
            health: stats.max_health,
            last_attack: None,
            scaled: false,
        }
    }

    fn ready_to_attack(&self, now: Duration) -> bool {
        self.snapshot().ready_to_attack(now)
    }

    fn snapshot(&self) -> hive_invasion_core::AgentSnapshot {
        hive_invasion_core::AgentSnapshot {
            id: self.id,
            archetype: self.archetype,
            health: self.health,
            stats: self.stats,
            last_attack: self.last_attack,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hive_invasion_core::ObjectiveLookup;

    fn tick(world: &mut World, millis: u64) -> Vec<Event> {
        let mut events = Vec::new();
        apply(
            world,
            Command::Tick {
                dt: Duration::from_millis(millis),
            },
            &mut events,
        );
        events
    }

    fn attack(world: &mut World, attacker: AgentId, objective: ObjectiveId) -> Vec<Event> {
        let mut events = Vec::new();
        apply(
            world,
            Command::AttackObjective {
                attacker,
                objective,
            },
            &mut events,
        );
        events
    }

    fn small_world(gate_health: u32, base_health: u32) -> World {
        World::new(Config::new(
            Some(ObjectivePlacement::new(
                WorldPoint::new(0.0, 0.0),
                1.0,
                gate_health,
            )),
            Some(ObjectivePlacement::new(
                WorldPoint::new(0.0, 10.0),
                1.0,
                base_health,
            )),
            ArchetypeRoster::standard(),
        ))
    }

    #[test]
    fn spawning_without_template_fails() {
        let mut world = World::new(Config::new(
            None,
            None,
            ArchetypeRoster::standard().without(Archetype::Ranged),
        ));
        let result = spawn_agent(&mut world, Archetype::Ranged, WorldPoint::default());
        assert_eq!(
            result,
            Err(SpawnError::MissingTemplate {
                archetype: Archetype::Ranged
            })
        );
        assert_eq!(query::agent_count(&world), 0);
    }

    #[test]
    fn scaling_applies_exactly_once() {
        let mut world = World::default();
        let agent = spawn_agent(&mut world, Archetype::Scout, WorldPoint::default())
            .expect("scout template");
        let scaling = StatScaling {
            speed: 1.05,
            health: 1.2,
        };

        assert!(scale_agent(&mut world, agent, scaling));
        assert!(!scale_agent(&mut world, agent, scaling));

        let snapshot = query::agent(&world, agent).expect("agent");
        assert_eq!(snapshot.stats.max_health, 72);
        assert_eq!(snapshot.health, 72);
    }

    #[test]
    fn attacks_respect_cooldown_and_destroy_gate() {
        let mut world = small_world(10, 100);
        let agent = spawn_agent(&mut world, Archetype::Scout, WorldPoint::default())
            .expect("scout template");
        let gate = query::objective(&world, ObjectiveKind::Gate)
            .expect("gate")
            .id;

        let events = attack(&mut world, agent, gate);
        assert!(events.contains(&Event::ObjectiveDamaged {
            objective: gate,
            kind: ObjectiveKind::Gate,
            health: 5,
            max_health: 10,
        }));

        let events = attack(&mut world, agent, gate);
        assert!(events.is_empty(), "cooldown should block the second attack");

        let _ = tick(&mut world, 1_000);
        let events = attack(&mut world, agent, gate);
        assert!(events.contains(&Event::ObjectiveDestroyed {
            objective: gate,
            kind: ObjectiveKind::Gate,
        }));
        assert!(query::objective(&world, ObjectiveKind::Gate).is_none());
        assert!(query::objective_view(&world).resolve(gate).is_none());
    }

    #[test]
    fn open_gate_is_hidden_from_lookup_but_still_resolves() {
        let mut world = World::default();
        let gate = query::objective(&world, ObjectiveKind::Gate)
            .expect("gate")
            .id;

        let mut events = Vec::new();
        apply(&mut world, Command::OpenGate, &mut events);
        apply(&mut world, Command::OpenGate, &mut events);
        assert_eq!(events, vec![Event::GateOpened]);

        let view = query::objective_view(&world);
        assert_eq!(view.find(ObjectiveKind::Gate), None);
        assert!(view.resolve(gate).is_some());

        events.clear();
        apply(&mut world, Command::CloseGate, &mut events);
        apply(&mut world, Command::CloseGate, &mut events);
        assert_eq!(events, vec![Event::GateClosed]);
        assert_eq!(
            query::objective_view(&world).find(ObjectiveKind::Gate),
            Some(gate)
        );
    }

    #[test]
    fn base_destruction_despawns_every_agent() {
        let mut world = small_world(10, 5);
        let first = spawn_agent(&mut world, Archetype::Scout, WorldPoint::default())
            .expect("scout template");
        let second = spawn_agent(&mut world, Archetype::Armored, WorldPoint::default())
            .expect("armored template");
        let base = query::objective(&world, ObjectiveKind::Base)
            .expect("base")
            .id;

        let events = attack(&mut world, first, base);
        assert!(events.contains(&Event::AgentDespawned { agent: first }));
        assert!(events.contains(&Event::AgentDespawned { agent: second }));
        assert_eq!(query::agent_count(&world), 0);
    }

    #[test]
    fn lethal_damage_kills_agent() {
        let mut world = World::default();
        let agent = spawn_agent(&mut world, Archetype::Swarm, WorldPoint::default())
            .expect("swarm template");

        let mut events = Vec::new();
        apply(
            &mut world,
            Command::DamageAgent { agent, amount: 10 },
            &mut events,
        );
        apply(
            &mut world,
            Command::DamageAgent { agent, amount: 100 },
            &mut events,
        );
        assert_eq!(
            events,
            vec![
                Event::AgentDamaged { agent, health: 15 },
                Event::AgentDamaged { agent, health: 0 },
                Event::AgentDied { agent },
            ]
        );
        assert!(query::agent(&world, agent).is_none());
    }
}
