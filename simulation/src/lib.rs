#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Headless encounter driver wiring the world to the wave and targeting
//! systems.
//!
//! Each [`Simulation::step`] advances the world clock, applies queued
//! commands, lets the spawn scheduler run, moves agents, ticks targeting and
//! resolves the resulting attacks, relaying objective signals through the
//! objective event bus as they occur.

mod config;
mod progress;

use std::{collections::VecDeque, time::Duration};

use hive_invasion_core::{
    AgentId, Archetype, Command, Event, GameOutcome, ObjectiveKind, ObjectiveSignal, SpawnError,
    StatScaling, UnitFactory, WaveNumber, WorldPoint,
};
use hive_invasion_system_encounter_scaling::EncounterScaling;
use hive_invasion_system_objective_bus::ObjectiveEventBus;
use hive_invasion_system_spawn_scheduler::{Config as SchedulerConfig, SpawnScheduler};
use hive_invasion_system_target_acquisition::{Config as TargetingConfig, Targeting};
use hive_invasion_system_wave_composition::{Config as ComposerConfig, WaveComposer};
use hive_invasion_world::{
    self as world, query, Config as WorldConfig, Navigator, NavigatorConfig, ObjectivePlacement,
    World,
};
use tracing::{debug, info};

pub use config::{
    ArenaSettings, ConfigError, ObjectiveSettings, PointSettings, RosterSettings,
    ScalingSettings, SchedulerSettings, SimulationConfig, StatSettings, SwarmSettings,
    WaveSettings,
};
pub use progress::{WaveProgress, WaveReport};

/// Complete encounter: world, navigation and every system, advanced in
/// lock-step.
#[derive(Debug)]
pub struct Simulation {
    world: World,
    navigator: Navigator,
    bus: ObjectiveEventBus,
    targeting: Targeting,
    scheduler: SpawnScheduler,
    progress: WaveProgress,
    base_destroyed: bool,
    outcome: Option<GameOutcome>,
    pending: VecDeque<Command>,
    events: Vec<Event>,
}

impl Simulation {
    /// Builds a simulation from validated settings.
    pub fn new(config: &SimulationConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let table = config.wave_table()?;
        let swarm_bounds = config.swarm_bounds()?;
        let half_extent = config.arena_half_extent()?;

        let placement = |settings: &ObjectiveSettings| {
            settings.enabled.then(|| {
                ObjectivePlacement::new(
                    settings.position.into(),
                    settings.reach,
                    settings.max_health,
                )
            })
        };
        let world = World::new(WorldConfig::new(
            placement(&config.gate),
            placement(&config.base),
            config.roster(),
        ));

        let scheduling = &config.scheduler;
        let scheduler = SpawnScheduler::new(
            table,
            WaveComposer::new(ComposerConfig::new(config.seed, swarm_bounds)),
            EncounterScaling::new(config.scaling.speed_step, config.scaling.health_step),
            SchedulerConfig::new(Some(scheduling.spawn_point.into()), config.seed)
                .with_initial_offset(scheduling.initial_offset())
                .with_inter_enemy_delay(scheduling.inter_enemy_delay())
                .with_inter_wave_delay(scheduling.inter_wave_delay())
                .with_swarm_jitter(scheduling.swarm_jitter),
        );
        let progress = WaveProgress::new(scheduler.table());

        info!(
            seed = config.seed,
            waves = scheduler.table().len(),
            "simulation ready"
        );

        Ok(Self {
            world,
            navigator: Navigator::new(NavigatorConfig::new(half_extent)),
            bus: ObjectiveEventBus::new(),
            targeting: Targeting::new(TargetingConfig::new(config.arena.snap_radius)),
            scheduler,
            progress,
            base_destroyed: false,
            outcome: None,
            pending: VecDeque::new(),
            events: Vec::new(),
        })
    }

    /// Queues a command for the start of the next step.
    pub fn submit(&mut self, command: Command) {
        self.pending.push_back(command);
    }

    /// Advances the encounter by `dt`. Does nothing once an outcome is decided.
    pub fn step(&mut self, dt: Duration) {
        if self.outcome.is_some() {
            return;
        }

        let mut events = Vec::new();
        world::apply(&mut self.world, Command::Tick { dt }, &mut events);
        while let Some(command) = self.pending.pop_front() {
            world::apply(&mut self.world, command, &mut events);
        }
        self.react(events);

        let mut events = Vec::new();
        {
            let mut factory = SpawnContext {
                world: &mut self.world,
                navigator: &mut self.navigator,
                targeting: &mut self.targeting,
                bus: &mut self.bus,
            };
            self.scheduler.handle(dt, &mut factory, &mut events);
        }
        self.react(events);

        self.navigator.advance(dt);

        let agents = query::agent_view(&self.world);
        let objectives = query::objective_view(&self.world);
        let mut commands = Vec::new();
        self.targeting.handle(
            agents.iter(),
            query::clock(&self.world),
            &objectives,
            &self.bus,
            &mut self.navigator,
            &mut commands,
        );
        let mut events = Vec::new();
        for command in commands {
            world::apply(&mut self.world, command, &mut events);
        }
        self.react(events);

        self.decide_outcome();
    }

    /// Events produced so far, oldest first.
    #[must_use]
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Takes every event produced since the last drain.
    pub fn drain_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    /// Authoritative world state.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Agent positions and movement.
    #[must_use]
    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    /// Objective signal hub.
    #[must_use]
    pub fn bus(&self) -> &ObjectiveEventBus {
        &self.bus
    }

    /// Per-agent targeting state.
    #[must_use]
    pub fn targeting(&self) -> &Targeting {
        &self.targeting
    }

    /// Most recently started wave.
    #[must_use]
    pub fn current_wave(&self) -> Option<WaveNumber> {
        self.scheduler.current_wave()
    }

    /// Planned enemy count of every wave.
    #[must_use]
    pub fn wave_enemy_counts(&self) -> Vec<(WaveNumber, u32)> {
        self.scheduler.table().enemy_counts()
    }

    /// Per-wave progress.
    #[must_use]
    pub fn progress(&self) -> &WaveProgress {
        &self.progress
    }

    /// Final result, once decided.
    #[must_use]
    pub fn outcome(&self) -> Option<GameOutcome> {
        self.outcome
    }

    /// Simulated time elapsed.
    #[must_use]
    pub fn clock(&self) -> Duration {
        query::clock(&self.world)
    }

    fn react(&mut self, events: Vec<Event>) {
        for event in &events {
            self.progress.record(event);
            match *event {
                Event::ObjectiveDestroyed {
                    kind: ObjectiveKind::Gate,
                    ..
                } => self.relay(ObjectiveSignal::Destroyed),
                Event::ObjectiveDestroyed {
                    kind: ObjectiveKind::Base,
                    ..
                } => self.base_destroyed = true,
                Event::GateOpened => self.relay(ObjectiveSignal::Opened),
                Event::GateClosed => self.relay(ObjectiveSignal::Closed),
                Event::AgentDied { agent } | Event::AgentDespawned { agent } => {
                    let _ = self.targeting.detach(agent, &mut self.bus);
                    let _ = self.navigator.remove(agent);
                }
                _ => {}
            }
        }
        self.events.extend(events);
    }

    fn relay(&mut self, signal: ObjectiveSignal) {
        let notified = self.targeting.broadcast(signal, &mut self.bus);
        debug!(?signal, notified, "objective signal relayed");
    }

    fn decide_outcome(&mut self) {
        let outcome = if self.base_destroyed {
            GameOutcome::Defeat
        } else if self.scheduler.is_finished()
            && query::agent_count(&self.world) == 0
            && query::objective(&self.world, ObjectiveKind::Base).is_some()
        {
            GameOutcome::Victory
        } else {
            return;
        };

        info!(
            ?outcome,
            seconds = self.clock().as_secs_f32(),
            "outcome decided"
        );
        self.outcome = Some(outcome);
        self.events.push(Event::OutcomeDecided { outcome });
    }
}

struct SpawnContext<'a> {
    world: &'a mut World,
    navigator: &'a mut Navigator,
    targeting: &'a mut Targeting,
    bus: &'a mut ObjectiveEventBus,
}

impl UnitFactory for SpawnContext<'_> {
    fn spawn(&mut self, archetype: Archetype, position: WorldPoint) -> Result<AgentId, SpawnError> {
        let agent = world::spawn_agent(self.world, archetype, position)?;
        let speed = query::agent(self.world, agent).map_or(0.0, |state| state.stats.move_speed);
        self.navigator.insert(agent, position, speed);

        let objectives = query::objective_view(self.world);
        let _ = self.targeting.attach(agent, &objectives, self.bus);
        Ok(agent)
    }

    fn scale(&mut self, agent: AgentId, scaling: StatScaling) {
        if !world::scale_agent(self.world, agent, scaling) {
            return;
        }
        if let Some(state) = query::agent(self.world, agent) {
            self.navigator.set_speed(agent, state.stats.move_speed);
        }
    }
}
