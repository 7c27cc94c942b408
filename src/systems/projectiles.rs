use glam::Vec2;
use hecs::{Entity, World};

use crate::components::{Lifetime, Position, Projectile, Target, Velocity};
use crate::systems::motion::direction_or;

/// Distance at which a projectile counts as touching a target.
pub const HIT_RADIUS: f32 = 24.0;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ProjectileReport {
    pub expired: u32,
    pub hits: u32,
    pub damage_dealt: i64,
}

/// Advance every projectile by one tick: steer, accelerate, move, age, and
/// despawn the ones that expired or hit the target.
pub fn projectile_step(world: &mut World, target: Option<Vec2>) -> ProjectileReport {
    let mut report = ProjectileReport::default();
    let mut doomed: Vec<Entity> = Vec::new();

    for (entity, (pos, vel, projectile, life)) in
        world.query_mut::<(&mut Position, &mut Velocity, &Projectile, &mut Lifetime)>()
    {
        if let (Some(target), true) = (target, projectile.home > 0.0) {
            let speed = vel.0.length();
            let desired = direction_or(target - pos.0, vel.0) * speed;
            vel.0 = vel.0.lerp(desired, projectile.home);
        }
        vel.0 *= projectile.accel;
        pos.0 += vel.0;

        if let Some(target) = target {
            if pos.0.distance(target) <= HIT_RADIUS {
                report.hits += 1;
                report.damage_dealt += projectile.damage as i64;
                doomed.push(entity);
                continue;
            }
        }

        life.0 = life.0.saturating_sub(1);
        if life.0 == 0 {
            report.expired += 1;
            doomed.push(entity);
        }
    }

    for entity in doomed {
        let _ = world.despawn(entity);
    }
    report
}

/// Move every target by its own velocity.
pub fn target_step(world: &mut World) {
    for (_entity, (pos, vel)) in world.query_mut::<(&mut Position, &Velocity)>().with::<&Target>() {
        pos.0 += vel.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::ProjectileKind;

    #[test]
    fn projectiles_move_and_expire() {
        let mut world = World::new();
        let e = world.spawn((
            Position(Vec2::ZERO),
            Velocity(Vec2::new(2.0, 0.0)),
            Projectile::new(ProjectileKind::StarBolt, 10),
            Lifetime(2),
        ));
        let report = projectile_step(&mut world, None);
        assert_eq!(report.expired, 0);
        assert_eq!(world.get::<&Position>(e).unwrap().0, Vec2::new(2.0, 0.0));
        let report = projectile_step(&mut world, None);
        assert_eq!(report.expired, 1);
        assert!(!world.contains(e));
    }

    #[test]
    fn acceleration_scales_velocity() {
        let mut world = World::new();
        let e = world.spawn((
            Position(Vec2::ZERO),
            Velocity(Vec2::new(1.0, 0.0)),
            Projectile::new(ProjectileKind::AcceleratingRainbow, 10).with_accel(2.0),
            Lifetime(10),
        ));
        projectile_step(&mut world, None);
        projectile_step(&mut world, None);
        assert_eq!(world.get::<&Position>(e).unwrap().0, Vec2::new(6.0, 0.0));
    }

    #[test]
    fn contact_with_target_counts_a_hit() {
        let mut world = World::new();
        world.spawn((
            Position(Vec2::new(-30.0, 0.0)),
            Velocity(Vec2::new(10.0, 0.0)),
            Projectile::new(ProjectileKind::PrismaticBolt, 50),
            Lifetime(100),
        ));
        let report = projectile_step(&mut world, Some(Vec2::ZERO));
        assert_eq!(report.hits, 1);
        assert_eq!(report.damage_dealt, 50);
        assert_eq!(world.len(), 0);
    }

    #[test]
    fn homing_bends_toward_target() {
        let mut world = World::new();
        let e = world.spawn((
            Position(Vec2::ZERO),
            Velocity(Vec2::new(0.0, 5.0)),
            Projectile::new(ProjectileKind::ConvergingMoonlight, 1).with_homing(0.5),
            Lifetime(100),
        ));
        projectile_step(&mut world, Some(Vec2::new(1000.0, 0.0)));
        assert!(world.get::<&Velocity>(e).unwrap().0.x > 0.0);
    }
}
