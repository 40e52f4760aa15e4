#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Objective targeting for hostile agents: which objective each agent marches
//! toward and when it attacks.

mod acquisition;

use std::{collections::BTreeMap, time::Duration};

use hive_invasion_core::{
    AgentId, AgentMover, AgentSnapshot, Command, ObjectiveLookup, ObjectiveSignal,
};
use hive_invasion_system_objective_bus::ObjectiveEventBus;
use tracing::debug;

pub use acquisition::{TargetAcquisition, TargetState, TickContext};

/// Default search radius for snapping stranded agents back onto the surface.
const DEFAULT_SNAP_RADIUS: f32 = 4.0;

/// Configuration parameters required to construct the targeting system.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Config {
    snap_radius: f32,
}

impl Config {
    /// Creates a new configuration with the provided snap search radius.
    #[must_use]
    pub const fn new(snap_radius: f32) -> Self {
        Self { snap_radius }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(DEFAULT_SNAP_RADIUS)
    }
}

/// System owning the targeting state of every live agent.
#[derive(Debug, Default)]
pub struct Targeting {
    config: Config,
    agents: BTreeMap<AgentId, TargetAcquisition>,
}

impl Targeting {
    /// Creates an empty targeting system.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            agents: BTreeMap::new(),
        }
    }

    /// Starts tracking a freshly spawned agent and subscribes it to `bus`.
    pub fn attach<L>(
        &mut self,
        agent: AgentId,
        objectives: &L,
        bus: &mut ObjectiveEventBus,
    ) -> TargetState
    where
        L: ObjectiveLookup + ?Sized,
    {
        let acquisition = TargetAcquisition::spawn(agent, objectives, bus.is_gate_bypassed());
        let state = acquisition.state();
        let _ = self.agents.insert(agent, acquisition);
        let _ = bus.subscribe(agent);
        debug!(agent = agent.get(), ?state, "agent attached to targeting");
        state
    }

    /// Stops tracking an agent and unsubscribes it. Returns `false` if the
    /// agent was unknown.
    pub fn detach(&mut self, agent: AgentId, bus: &mut ObjectiveEventBus) -> bool {
        let _ = bus.unsubscribe(agent);
        self.agents.remove(&agent).is_some()
    }

    /// Publishes `signal` on `bus`, retargeting every subscribed agent.
    ///
    /// Returns the number of agents notified.
    pub fn broadcast(&mut self, signal: ObjectiveSignal, bus: &mut ObjectiveEventBus) -> usize {
        let agents = &mut self.agents;
        bus.publish(signal, |agent, signal, _| {
            if let Some(acquisition) = agents.get_mut(&agent) {
                acquisition.on_signal(signal);
            }
        })
    }

    /// Ticks every tracked agent present in `agents`, emitting attack
    /// commands into `out`.
    pub fn handle<'a, I, L, M>(
        &mut self,
        agents: I,
        now: Duration,
        objectives: &L,
        bus: &ObjectiveEventBus,
        mover: &mut M,
        out: &mut Vec<Command>,
    ) where
        I: IntoIterator<Item = &'a AgentSnapshot>,
        L: ObjectiveLookup + ?Sized,
        M: AgentMover + ?Sized,
    {
        let context = TickContext {
            now,
            objectives,
            gate_bypassed: bus.is_gate_bypassed(),
            snap_radius: self.config.snap_radius,
        };
        for snapshot in agents {
            if let Some(acquisition) = self.agents.get_mut(&snapshot.id) {
                acquisition.tick(snapshot, &context, mover, out);
            }
        }
    }

    /// Targeting state of the provided agent.
    #[must_use]
    pub fn get(&self, agent: AgentId) -> Option<&TargetAcquisition> {
        self.agents.get(&agent)
    }

    /// Number of tracked agents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    /// Reports whether no agents are tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}
