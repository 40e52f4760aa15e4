//! Per-agent objective selection state machine.

use std::time::Duration;

use hive_invasion_core::{
    AgentId, AgentMover, AgentSnapshot, Command, ObjectiveId, ObjectiveKind, ObjectiveLookup,
    ObjectiveSignal, TargetPriority, WorldPoint,
};
use tracing::debug;

/// Observable targeting state of an agent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TargetState {
    /// The agent marches on the gate.
    TargetingGate,
    /// The agent marches on the base.
    TargetingBase,
    /// Neither objective could be found.
    NoTarget,
}

/// Read-only surroundings an agent consults during its tick.
#[derive(Debug)]
pub struct TickContext<'a, L: ?Sized> {
    /// Simulated time of the tick.
    pub now: Duration,
    /// Objective lookup used to resolve targets.
    pub objectives: &'a L,
    /// Whether the gate is currently bypassed.
    pub gate_bypassed: bool,
    /// Search radius for recovering agents that left the traversable surface.
    pub snap_radius: f32,
}

/// Objective selection for one agent.
///
/// Holds only identifiers of objectives; a target whose identifier no longer
/// resolves is stale and triggers re-acquisition on the next tick.
#[derive(Clone, Debug, PartialEq)]
pub struct TargetAcquisition {
    agent: AgentId,
    state: TargetState,
    priority: TargetPriority,
    current: Option<ObjectiveId>,
    cached_gate: Option<ObjectiveId>,
    cached_base: Option<ObjectiveId>,
    last_destination: Option<WorldPoint>,
}

impl TargetAcquisition {
    /// Creates the targeting state for a freshly spawned agent.
    ///
    /// The gate is preferred when it is discoverable and not bypassed.
    #[must_use]
    pub fn spawn<L>(agent: AgentId, objectives: &L, gate_bypassed: bool) -> Self
    where
        L: ObjectiveLookup + ?Sized,
    {
        let mut acquisition = Self {
            agent,
            state: TargetState::NoTarget,
            priority: TargetPriority::Gate,
            current: None,
            cached_gate: None,
            cached_base: None,
            last_destination: None,
        };
        acquisition.acquire(objectives, gate_bypassed);
        acquisition
    }

    /// Agent owning this state.
    #[must_use]
    pub fn agent(&self) -> AgentId {
        self.agent
    }

    /// Current targeting state.
    #[must_use]
    pub fn state(&self) -> TargetState {
        self.state
    }

    /// Objective kind the agent prefers.
    #[must_use]
    pub fn priority(&self) -> TargetPriority {
        self.priority
    }

    /// Objective currently aimed at, if any.
    #[must_use]
    pub fn current_target(&self) -> Option<ObjectiveId> {
        self.current
    }

    /// Gate identifier remembered across open/close cycles.
    #[must_use]
    pub fn cached_gate(&self) -> Option<ObjectiveId> {
        self.cached_gate
    }

    /// Applies an objective signal immediately, independent of ticking.
    pub fn on_signal(&mut self, signal: ObjectiveSignal) {
        match signal {
            ObjectiveSignal::Destroyed => {
                self.cached_gate = None;
                self.force(TargetPriority::Base);
            }
            ObjectiveSignal::Opened => self.force(TargetPriority::Base),
            ObjectiveSignal::Closed => {
                // With no gate left to return to the agent stays on the base.
                if self.cached_gate.is_some() {
                    self.force(TargetPriority::Gate);
                } else {
                    self.force(TargetPriority::Base);
                }
            }
        }
        debug!(agent = self.agent.get(), ?signal, state = ?self.state, "target cleared by signal");
    }

    /// Runs one tick: re-acquires a stale target, then either closes in on
    /// the target or attacks it.
    ///
    /// Attacks are requested through `out`; the world resolves damage.
    pub fn tick<L, M>(
        &mut self,
        agent: &AgentSnapshot,
        context: &TickContext<'_, L>,
        mover: &mut M,
        out: &mut Vec<Command>,
    ) where
        L: ObjectiveLookup + ?Sized,
        M: AgentMover + ?Sized,
    {
        if self.is_stale(context.objectives, context.gate_bypassed) {
            self.acquire(context.objectives, context.gate_bypassed);
        }
        let Some(target) = self
            .current
            .and_then(|id| context.objectives.resolve(id))
        else {
            return;
        };

        if !mover.is_on_valid_surface(self.agent)
            && !mover.snap_to_nearest_valid_surface(self.agent, context.snap_radius)
        {
            debug!(agent = self.agent.get(), "agent off navigable surface; holding");
            return;
        }
        let Some(position) = mover.position(self.agent) else {
            return;
        };

        let gap = position.distance_to(target.position) - target.reach;
        if gap <= agent.stats.attack_range {
            // The mover may still hold a destination from before re-acquisition.
            self.last_destination = None;
            if !mover.is_arrived(self.agent) {
                mover.stop(self.agent);
            }
            if agent.ready_to_attack(context.now) {
                out.push(Command::AttackObjective {
                    attacker: self.agent,
                    objective: target.id,
                });
            }
            return;
        }

        if self.last_destination != Some(target.position) {
            mover.move_to(self.agent, target.position);
            self.last_destination = Some(target.position);
        }
    }

    fn is_stale<L>(&self, objectives: &L, gate_bypassed: bool) -> bool
    where
        L: ObjectiveLookup + ?Sized,
    {
        match self.current {
            None => true,
            Some(id) => {
                objectives.resolve(id).is_none()
                    || (gate_bypassed && self.cached_gate == Some(id))
            }
        }
    }

    fn acquire<L>(&mut self, objectives: &L, gate_bypassed: bool)
    where
        L: ObjectiveLookup + ?Sized,
    {
        if self
            .cached_gate
            .is_some_and(|id| objectives.resolve(id).is_none())
        {
            self.cached_gate = None;
        }
        if self
            .cached_base
            .is_some_and(|id| objectives.resolve(id).is_none())
        {
            self.cached_base = None;
        }
        if self.cached_gate.is_none() && !gate_bypassed {
            self.cached_gate = objectives.find(ObjectiveKind::Gate);
        }
        if self.cached_base.is_none() {
            self.cached_base = objectives.find(ObjectiveKind::Base);
        }

        let gate = self.cached_gate.filter(|_| !gate_bypassed);
        let (state, priority, current) = match (gate, self.cached_base) {
            (Some(gate), _) => (TargetState::TargetingGate, TargetPriority::Gate, Some(gate)),
            (None, Some(base)) => (TargetState::TargetingBase, TargetPriority::Base, Some(base)),
            (None, None) => (TargetState::NoTarget, TargetPriority::Base, None),
        };
        if state != self.state {
            debug!(agent = self.agent.get(), ?state, "target acquired");
        }
        self.state = state;
        self.priority = priority;
        self.current = current;
        self.last_destination = None;
    }

    fn force(&mut self, priority: TargetPriority) {
        self.priority = priority;
        self.state = match priority {
            TargetPriority::Gate => TargetState::TargetingGate,
            TargetPriority::Base => TargetState::TargetingBase,
        };
        self.current = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hive_invasion_core::ObjectiveSnapshot;

    struct Lookup {
        gate: Option<ObjectiveSnapshot>,
        base: Option<ObjectiveSnapshot>,
    }

    impl ObjectiveLookup for Lookup {
        fn find(&self, kind: ObjectiveKind) -> Option<ObjectiveId> {
            match kind {
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

    fn objective(id: u32, kind: ObjectiveKind) -> ObjectiveSnapshot {
        ObjectiveSnapshot {
            id: ObjectiveId::new(id),
            kind,
            position: WorldPoint::new(0.0, 0.0),
            reach: 1.0,
            health: 10,
            max_health: 10,
        }
    }

    fn both() -> Lookup {
        Lookup {
            gate: Some(objective(1, ObjectiveKind::Gate)),
            base: Some(objective(2, ObjectiveKind::Base)),
        }
    }

    #[test]
    fn initial_state_follows_discoverability() {
        let agent = AgentId::new(1);
        assert_eq!(
            TargetAcquisition::spawn(agent, &both(), false).state(),
            TargetState::TargetingGate
        );
        assert_eq!(
            TargetAcquisition::spawn(agent, &both(), true).state(),
            TargetState::TargetingBase
        );
        let base_only = Lookup {
            gate: None,
            base: Some(objective(2, ObjectiveKind::Base)),
        };
        assert_eq!(
            TargetAcquisition::spawn(agent, &base_only, false).state(),
            TargetState::TargetingBase
        );
        let nothing = Lookup {
            gate: None,
            base: None,
        };
        assert_eq!(
            TargetAcquisition::spawn(agent, &nothing, false).state(),
            TargetState::NoTarget
        );
    }

    #[test]
    fn destroyed_then_closed_stays_on_base() {
        let mut acquisition = TargetAcquisition::spawn(AgentId::new(1), &both(), false);
        assert_eq!(acquisition.current_target(), Some(ObjectiveId::new(1)));

        acquisition.on_signal(ObjectiveSignal::Destroyed);
        assert_eq!(acquisition.priority(), TargetPriority::Base);
        assert_eq!(acquisition.current_target(), None);
        assert_eq!(acquisition.cached_gate(), None);

        acquisition.on_signal(ObjectiveSignal::Closed);
        assert_eq!(acquisition.state(), TargetState::TargetingBase);
        assert_eq!(acquisition.priority(), TargetPriority::Base);
    }

    #[test]
    fn opened_keeps_cached_gate_and_closed_restores_it() {
        let mut acquisition = TargetAcquisition::spawn(AgentId::new(1), &both(), false);

        acquisition.on_signal(ObjectiveSignal::Opened);
        assert_eq!(acquisition.state(), TargetState::TargetingBase);
        assert_eq!(acquisition.cached_gate(), Some(ObjectiveId::new(1)));

        acquisition.on_signal(ObjectiveSignal::Closed);
        assert_eq!(acquisition.state(), TargetState::TargetingGate);
        assert_eq!(acquisition.priority(), TargetPriority::Gate);
        assert_eq!(acquisition.current_target(), None);
    }
}
