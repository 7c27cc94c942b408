use glam::Vec2;
use hecs::{Entity, World};

use crate::components::{Companion, Lifetime, OwnedBy, Position, Projectile, ProjectileKind, Velocity};
use crate::engine::net::NetRole;

/// The single place that decides whether this peer may create entities.
///
/// Behaviors call it unconditionally. On an observer every call returns
/// `None` and leaves the world untouched; the authority's entities reach
/// observers through replication instead.
#[derive(Clone, Copy, Debug)]
pub struct Spawner {
    role: NetRole,
    owner: Entity,
}

impl Spawner {
    pub fn new(role: NetRole, owner: Entity) -> Self {
        Self { role, owner }
    }

    pub fn is_authority(&self) -> bool {
        self.role.is_authority()
    }

    pub fn owner(&self) -> Entity {
        self.owner
    }

    pub fn projectile(
        &self,
        world: &mut World,
        kind: ProjectileKind,
        position: Vec2,
        velocity: Vec2,
        damage: i32,
    ) -> Option<Entity> {
        self.spawn_projectile(world, Projectile::new(kind, damage), position, velocity, kind.lifetime())
    }

    /// Like [`projectile`](Self::projectile), with a customised payload and time to live.
    pub fn spawn_projectile(
        &self,
        world: &mut World,
        projectile: Projectile,
        position: Vec2,
        velocity: Vec2,
        lifetime: u32,
    ) -> Option<Entity> {
        if !self.is_authority() {
            return None;
        }
        let entity = world.spawn((
            Position(position),
            Velocity(velocity),
            projectile,
            Lifetime(lifetime),
            OwnedBy(self.owner),
        ));
        tracing::trace!(kind = ?projectile.kind, ?entity, "spawned projectile");
        Some(entity)
    }

    /// Spawn a companion bound to `companion.owner`. Companions have no
    /// lifetime; they decide themselves when to die.
    pub fn companion(&self, world: &mut World, companion: Companion, position: Vec2) -> Option<Entity> {
        if !self.is_authority() {
            return None;
        }
        let entity = world.spawn((Position(position), Velocity(Vec2::ZERO), companion, OwnedBy(self.owner)));
        tracing::trace!(kind = ?companion.kind, ?entity, "spawned companion");
        Some(entity)
    }
}

/// Remove every projectile owned by `owner`. Runs on every peer so replicated
/// copies disappear too. Returns how many were removed.
pub fn clear_owned_projectiles(world: &mut World, owner: Entity) -> usize {
    let doomed: Vec<Entity> = world
        .query::<(&Projectile, &OwnedBy)>()
        .iter()
        .filter(|(_, (_, by))| by.0 == owner)
        .map(|(e, _)| e)
        .collect();
    for &entity in &doomed {
        let _ = world.despawn(entity);
    }
    doomed.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup(role: NetRole) -> (World, Spawner) {
        let mut world = World::new();
        let owner = world.spawn(());
        (world, Spawner::new(role, owner))
    }

    #[test]
    fn authority_spawns_with_lifetime_and_owner() {
        let (mut world, spawner) = setup(NetRole::Authority);
        let e = spawner
            .projectile(&mut world, ProjectileKind::StarBolt, Vec2::ONE, Vec2::X, 200)
            .unwrap();
        assert_eq!(world.get::<&Lifetime>(e).unwrap().0, ProjectileKind::StarBolt.lifetime());
        assert_eq!(world.get::<&OwnedBy>(e).unwrap().0, spawner.owner());
        assert_eq!(world.get::<&Projectile>(e).unwrap().damage, 200);
    }

    #[test]
    fn observer_spawns_nothing() {
        let (mut world, spawner) = setup(NetRole::Observer);
        let before = world.len();
        assert!(spawner
            .projectile(&mut world, ProjectileKind::PrismaticBolt, Vec2::ZERO, Vec2::Y, 10)
            .is_none());
        let companion = Companion {
            kind: crate::components::CompanionKind::DazzlingPetal,
            owner: spawner.owner(),
            damage: 0,
            age: 0,
            angle: 0.0,
            length: 0.0,
            delay: 0,
        };
        assert!(spawner.companion(&mut world, companion, Vec2::ZERO).is_none());
        assert_eq!(world.len(), before);
    }

    #[test]
    fn clearing_only_touches_the_owners_projectiles() {
        let (mut world, spawner) = setup(NetRole::Authority);
        let other = Spawner::new(NetRole::Authority, world.spawn(()));
        for _ in 0..3 {
            spawner.projectile(&mut world, ProjectileKind::StarBolt, Vec2::ZERO, Vec2::X, 1);
        }
        let survivor = other
            .projectile(&mut world, ProjectileKind::StarBolt, Vec2::ZERO, Vec2::X, 1)
            .unwrap();
        assert_eq!(clear_owned_projectiles(&mut world, spawner.owner()), 3);
        assert!(world.contains(survivor));
    }
}
