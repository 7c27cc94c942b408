use glam::Vec2;
use hecs::{Entity, World};

use crate::components::{Position, Target, Velocity};

/// What the boss knows about its target this tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TargetView {
    pub entity: Entity,
    pub position: Vec2,
}

/// The target nearest to `from`, if any exists.
pub fn resolve_target(world: &World, from: Vec2) -> Option<TargetView> {
    world
        .query::<&Position>()
        .with::<&Target>()
        .iter()
        .map(|(entity, pos)| TargetView {
            entity,
            position: pos.0,
        })
        .min_by(|a, b| a.position.distance_squared(from).total_cmp(&b.position.distance_squared(from)))
}

pub fn spawn_target(world: &mut World, position: Vec2) -> Entity {
    world.spawn((Position(position), Velocity(Vec2::ZERO), Target))
}

/// Headless stand-in for a player: strafes along a lissajous path around
/// `anchor`. The path is a pure function of the tick, so every peer that runs
/// it agrees on where the target is.
#[derive(Clone, Copy, Debug)]
pub struct TargetScript {
    pub anchor: Vec2,
    pub radius: Vec2,
    /// Radians per tick on the x axis; y runs at twice the rate.
    pub rate: f32,
}

impl Default for TargetScript {
    fn default() -> Self {
        Self {
            anchor: Vec2::ZERO,
            radius: Vec2::new(420.0, 140.0),
            rate: 0.01,
        }
    }
}

impl TargetScript {
    pub fn position_at(&self, tick: u64) -> Vec2 {
        let t = tick as f32 * self.rate;
        self.anchor + Vec2::new(t.sin() * self.radius.x, (2.0 * t).sin() * self.radius.y)
    }

    /// Set each target's velocity so that it lands on the scripted point for `tick`.
    pub fn steer(&self, world: &mut World, tick: u64) {
        let goal = self.position_at(tick);
        for (_entity, (pos, vel)) in world.query_mut::<(&Position, &mut Velocity)>().with::<&Target>() {
            vel.0 = goal - pos.0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nearest_target_wins() {
        let mut world = World::new();
        spawn_target(&mut world, Vec2::new(500.0, 0.0));
        let near = spawn_target(&mut world, Vec2::new(-100.0, 0.0));
        let view = resolve_target(&world, Vec2::ZERO).unwrap();
        assert_eq!(view.entity, near);
    }

    #[test]
    fn no_target_resolves_to_none() {
        let mut world = World::new();
        world.spawn((Position(Vec2::ZERO), Velocity(Vec2::ZERO)));
        assert!(resolve_target(&world, Vec2::ZERO).is_none());
    }

    #[test]
    fn script_is_a_function_of_tick() {
        let script = TargetScript::default();
        assert_eq!(script.position_at(0), script.anchor);
        assert_eq!(script.position_at(77), script.position_at(77));
    }
}
