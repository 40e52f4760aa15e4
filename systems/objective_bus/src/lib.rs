#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Synchronous broadcast of objective signals to subscribed agents.

use std::collections::BTreeSet;

use hive_invasion_core::{AgentId, ObjectiveSignal};
use tracing::debug;

/// Broadcast hub for gate and base signals.
///
/// Delivery follows ascending agent identifiers. Every publish iterates a
/// snapshot of the subscriber set taken before the first delivery, so
/// subscribers may be added or removed while a broadcast is in progress.
#[derive(Debug, Default)]
pub struct ObjectiveEventBus {
    subscribers: BTreeSet<AgentId>,
    gate_bypassed: bool,
}

impl ObjectiveEventBus {
    /// Creates a bus with no subscribers and the gate not bypassed.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an agent for future signals. Returns `false` if it already was.
    pub fn subscribe(&mut self, agent: AgentId) -> bool {
        self.subscribers.insert(agent)
    }

    /// Removes an agent from the subscriber set. Returns `false` if it was absent.
    pub fn unsubscribe(&mut self, agent: AgentId) -> bool {
        self.subscribers.remove(&agent)
    }

    /// Reports whether the agent currently receives signals.
    #[must_use]
    pub fn is_subscribed(&self, agent: AgentId) -> bool {
        self.subscribers.contains(&agent)
    }

    /// Indicates whether agents should ignore the gate.
    #[must_use]
    pub fn is_gate_bypassed(&self) -> bool {
        self.gate_bypassed
    }

    /// Number of subscribed agents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    /// Reports whether nobody is subscribed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    /// Broadcasts `signal` to every subscriber and returns the number of
    /// deliveries.
    ///
    /// The bypass flag is updated before delivery so handlers observe the new
    /// value. `notify` may edit the subscriber set through the provided
    /// [`Subscriptions`] handle: removed agents are skipped for the rest of
    /// the pass, added agents first hear the next publish.
    pub fn publish<F>(&mut self, signal: ObjectiveSignal, mut notify: F) -> usize
    where
        F: FnMut(AgentId, ObjectiveSignal, &mut Subscriptions<'_>),
    {
        match signal {
            ObjectiveSignal::Opened => self.gate_bypassed = true,
            ObjectiveSignal::Closed => self.gate_bypassed = false,
            ObjectiveSignal::Destroyed => {}
        }

        let snapshot: Vec<AgentId> = self.subscribers.iter().copied().collect();
        let mut delivered = 0;
        for agent in snapshot {
            if !self.subscribers.contains(&agent) {
                continue;
            }
            let mut subscriptions = Subscriptions {
                subscribers: &mut self.subscribers,
            };
            notify(agent, signal, &mut subscriptions);
            delivered += 1;
        }

        debug!(?signal, delivered, "objective signal published");
        delivered
    }
}

/// Mutable view of the subscriber set handed to delivery callbacks.
#[derive(Debug)]
pub struct Subscriptions<'a> {
    subscribers: &'a mut BTreeSet<AgentId>,
}

impl Subscriptions<'_> {
    /// Subscribes an agent; it is notified starting with the next publish.
    pub fn subscribe(&mut self, agent: AgentId) -> bool {
        self.subscribers.insert(agent)
    }

    /// Unsubscribes an agent; it receives nothing further from this publish.
    pub fn unsubscribe(&mut self, agent: AgentId) -> bool {
        self.subscribers.remove(&agent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bus_with(ids: &[u32]) -> ObjectiveEventBus {
        let mut bus = ObjectiveEventBus::new();
        for id in ids {
            assert!(bus.subscribe(AgentId::new(*id)));
        }
        bus
    }

    #[test]
    fn delivers_in_ascending_order() {
        let mut bus = bus_with(&[3, 1, 2]);
        let mut seen = Vec::new();
        let delivered = bus.publish(ObjectiveSignal::Destroyed, |agent, signal, _| {
            seen.push((agent.get(), signal));
        });

        assert_eq!(delivered, 3);
        assert_eq!(
            seen,
            vec![
                (1, ObjectiveSignal::Destroyed),
                (2, ObjectiveSignal::Destroyed),
                (3, ObjectiveSignal::Destroyed),
            ]
        );
    }

    #[test]
    fn handler_may_unsubscribe_itself() {
        let mut bus = bus_with(&[1, 2, 3]);
        let delivered = bus.publish(ObjectiveSignal::Opened, |agent, _, subscriptions| {
            if agent == AgentId::new(2) {
                assert!(subscriptions.unsubscribe(agent));
            }
        });

        assert_eq!(delivered, 3);
        assert!(!bus.is_subscribed(AgentId::new(2)));
        assert_eq!(bus.len(), 2);
    }

    #[test]
    fn agents_removed_mid_broadcast_are_skipped() {
        let mut bus = bus_with(&[1, 2, 3]);
        let mut seen = Vec::new();
        let delivered = bus.publish(ObjectiveSignal::Closed, |agent, _, subscriptions| {
            seen.push(agent.get());
            if agent == AgentId::new(1) {
                let _ = subscriptions.unsubscribe(AgentId::new(3));
            }
        });

        assert_eq!(delivered, 2);
        assert_eq!(seen, vec![1, 2]);
    }

    #[test]
    fn agents_added_mid_broadcast_wait_for_next_publish() {
        let mut bus = bus_with(&[1]);
        let mut seen = Vec::new();
        let _ = bus.publish(ObjectiveSignal::Destroyed, |agent, _, subscriptions| {
            seen.push(agent.get());
            let _ = subscriptions.subscribe(AgentId::new(5));
        });
        assert_eq!(seen, vec![1]);

        seen.clear();
        let delivered = bus.publish(ObjectiveSignal::Destroyed, |agent, _, _| {
            seen.push(agent.get());
        });
        assert_eq!(delivered, 2);
        assert_eq!(seen, vec![1, 5]);
    }

    #[test]
    fn bypass_flag_follows_open_and_close() {
        let mut bus = ObjectiveEventBus::new();
        assert!(!bus.is_gate_bypassed());

        assert_eq!(bus.publish(ObjectiveSignal::Opened, |_, _, _| {}), 0);
        assert!(bus.is_gate_bypassed());

        let _ = bus.publish(ObjectiveSignal::Destroyed, |_, _, _| {});
        assert!(bus.is_gate_bypassed());

        let _ = bus.publish(ObjectiveSignal::Closed, |_, _, _| {});
        assert!(!bus.is_gate_bypassed());
    }

    #[test]
    fn duplicate_subscriptions_are_rejected() {
        let mut bus = bus_with(&[4]);
        assert!(!bus.subscribe(AgentId::new(4)));
        assert!(bus.unsubscribe(AgentId::new(4)));
        assert!(!bus.unsubscribe(AgentId::new(4)));
        assert!(bus.is_empty());
    }
}
