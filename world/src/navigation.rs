//! Flat-arena navigation substrate used by the world crate.

use std::{collections::BTreeMap, time::Duration};

use hive_invasion_core::{AgentId, AgentMover, WorldPoint};

/// Distance below which an agent counts as having arrived.
const ARRIVAL_TOLERANCE: f32 = 0.05;

/// Configuration for the [`Navigator`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NavigatorConfig {
    half_extent: f32,
}

impl NavigatorConfig {
    /// Creates a square arena spanning `[-half_extent, half_extent]` on both axes.
    #[must_use]
    pub const fn new(half_extent: f32) -> Self {
        Self { half_extent }
    }
}

impl Default for NavigatorConfig {
    fn default() -> Self {
        Self::new(50.0)
    }
}

/// Straight-line mover over a square, obstacle-free arena.
///
/// Agents standing outside the arena are off the traversable surface and do
/// not move until they are snapped back inside.
#[derive(Clone, Debug, Default)]
pub struct Navigator {
    config: NavigatorConfig,
    bodies: BTreeMap<AgentId, Body>,
}

#[derive(Clone, Copy, Debug)]
struct Body {
    position: WorldPoint,
    destination: Option<WorldPoint>,
    speed: f32,
}

impl Navigator {
    /// Creates an empty navigator.
    #[must_use]
    pub fn new(config: NavigatorConfig) -> Self {
        Self {
            config,
            bodies: BTreeMap::new(),
        }
    }

    /// Registers an agent standing at `position`.
    pub fn insert(&mut self, agent: AgentId, position: WorldPoint, speed: f32) {
        let _ = self.bodies.insert(
            agent,
            Body {
                position,
                destination: None,
                speed,
            },
        );
    }

    /// Forgets an agent. Returns `false` if it was unknown.
    pub fn remove(&mut self, agent: AgentId) -> bool {
        self.bodies.remove(&agent).is_some()
    }

    /// Updates the agent's travel speed.
    pub fn set_speed(&mut self, agent: AgentId, speed: f32) {
        if let Some(body) = self.bodies.get_mut(&agent) {
            body.speed = speed;
        }
    }

    /// Teleports an agent, e.g. after being knocked off the surface.
    pub fn place(&mut self, agent: AgentId, position: WorldPoint) {
        if let Some(body) = self.bodies.get_mut(&agent) {
            body.position = position;
        }
    }

    /// Current destination of the agent, if it is travelling.
    #[must_use]
    pub fn destination(&self, agent: AgentId) -> Option<WorldPoint> {
        self.bodies.get(&agent).and_then(|body| body.destination)
    }

    /// Number of agents known to the navigator.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    /// Reports whether no agents are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    /// Advances every travelling agent by `dt`.
    pub fn advance(&mut self, dt: Duration) {
        let seconds = dt.as_secs_f32();
        let half_extent = self.config.half_extent;
        for body in self.bodies.values_mut() {
            let Some(destination) = body.destination else {
                continue;
            };
            if !within(half_extent, body.position) {
                continue;
            }
            body.position = body.position.step_toward(destination, body.speed * seconds);
        }
    }

    fn clamp(&self, point: WorldPoint) -> WorldPoint {
        let limit = self.config.half_extent;
        WorldPoint::new(point.x().clamp(-limit, limit), point.z().clamp(-limit, limit))
    }
}

impl AgentMover for Navigator {
    fn move_to(&mut self, agent: AgentId, point: WorldPoint) {
        if let Some(body) = self.bodies.get_mut(&agent) {
            body.destination = Some(point);
        }
    }

    fn stop(&mut self, agent: AgentId) {
        if let Some(body) = self.bodies.get_mut(&agent) {
            body.destination = None;
        }
    }

    fn is_arrived(&self, agent: AgentId) -> bool {
        self.bodies.get(&agent).is_some_and(|body| {
            body.destination.map_or(true, |destination| {
                body.position.distance_to(destination) <= ARRIVAL_TOLERANCE
            })
        })
    }

    fn is_on_valid_surface(&self, agent: AgentId) -> bool {
        self.bodies
            .get(&agent)
            .is_some_and(|body| within(self.config.half_extent, body.position))
    }

    fn snap_to_nearest_valid_surface(&mut self, agent: AgentId, search_radius: f32) -> bool {
        let Some(position) = self.bodies.get(&agent).map(|body| body.position) else {
            return false;
        };
        let nearest = self.clamp(position);
        if nearest.distance_to(position) > search_radius {
            return false;
        }
        self.place(agent, nearest);
        true
    }

    fn position(&self, agent: AgentId) -> Option<WorldPoint> {
        self.bodies.get(&agent).map(|body| body.position)
    }
}

fn within(half_extent: f32, point: WorldPoint) -> bool {
    point.x().abs() <= half_extent && point.z().abs() <= half_extent
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn agents_travel_toward_destination_at_their_speed() {
        let mut navigator = Navigator::new(NavigatorConfig::new(20.0));
        let agent = AgentId::new(1);
        navigator.insert(agent, WorldPoint::new(0.0, 0.0), 2.0);
        navigator.move_to(agent, WorldPoint::new(0.0, 10.0));

        navigator.advance(Duration::from_secs(2));
        let position = navigator.position(agent).expect("position");
        assert!((position.z() - 4.0).abs() < 1e-4);
        assert!(!navigator.is_arrived(agent));

        navigator.advance(Duration::from_secs(10));
        assert!(navigator.is_arrived(agent));
    }

    #[test]
    fn off_surface_agents_hold_until_snapped() {
        let mut navigator = Navigator::new(NavigatorConfig::new(10.0));
        let agent = AgentId::new(7);
        navigator.insert(agent, WorldPoint::new(13.0, 0.0), 5.0);
        navigator.move_to(agent, WorldPoint::new(0.0, 0.0));

        navigator.advance(Duration::from_secs(1));
        assert_eq!(navigator.position(agent), Some(WorldPoint::new(13.0, 0.0)));
        assert!(!navigator.is_on_valid_surface(agent));

        assert!(!navigator.snap_to_nearest_valid_surface(agent, 2.0));
        assert!(navigator.snap_to_nearest_valid_surface(agent, 4.0));
        assert_eq!(navigator.position(agent), Some(WorldPoint::new(10.0, 0.0)));
        assert!(navigator.is_on_valid_surface(agent));
    }

    #[test]
    fn stop_clears_destination() {
        let mut navigator = Navigator::default();
        let agent = AgentId::new(3);
        navigator.insert(agent, WorldPoint::new(0.0, 0.0), 1.0);
        navigator.move_to(agent, WorldPoint::new(5.0, 0.0));
        assert_eq!(navigator.destination(agent), Some(WorldPoint::new(5.0, 0.0)));

        navigator.stop(agent);
        assert_eq!(navigator.destination(agent), None);
        assert!(navigator.is_arrived(agent));
        assert!(navigator.remove(agent));
        assert!(navigator.is_empty());
    }
}
