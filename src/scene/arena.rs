//! Sets up one fight: the target, the boss body, and the machine that drives it.

use glam::Vec2;
use hecs::World;

use crate::components::boss::Boss;
use crate::components::{BossBody, Position};
use crate::config::Tuning;
use crate::effects::{EffectSink, NullEffects};
use crate::engine::net::NetRole;
use crate::error::FsmError;
use crate::systems::boss::{build_machine, Fight, FightPeer};
use crate::systems::target::{spawn_target, TargetScript};

/// Everything needed to start a fight on one peer.
pub struct ArenaSetup {
    pub role: NetRole,
    pub effects: Box<dyn EffectSink>,
    pub tuning: Tuning,
    pub seed: u64,
    pub target_spawn: Vec2,
    pub boss_spawn: Vec2,
    /// Moves the target along a fixed path. `None` leaves it standing still.
    pub script: Option<TargetScript>,
    pub damage_per_tick: i32,
}

impl Default for ArenaSetup {
    fn default() -> Self {
        Self {
            role: NetRole::Authority,
            effects: Box::new(NullEffects),
            tuning: Tuning::default(),
            seed: 0,
            target_spawn: Vec2::ZERO,
            boss_spawn: Vec2::new(0.0, -350.0),
            script: None,
            damage_per_tick: 0,
        }
    }
}

/// Populate a fresh world and wire up the boss.
pub fn spawn_fight(setup: ArenaSetup) -> Result<FightPeer, FsmError> {
    let mut world = World::new();
    spawn_target(&mut world, setup.target_spawn);
    let handle = world.spawn((Position(setup.boss_spawn), BossBody));

    let boss = Boss::new(handle, setup.boss_spawn, setup.tuning.life_max);
    let fight = Fight::new(world, boss, setup.role, setup.tuning, setup.effects, setup.seed);
    let machine = build_machine()?;

    tracing::debug!(role = ?setup.role, seed = setup.seed, "fight spawned");
    let mut peer = FightPeer::new(machine, fight);
    peer.script = setup.script;
    peer.damage_per_tick = setup.damage_per_tick;
    Ok(peer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::boss::BossState;
    use crate::components::Target;

    #[test]
    fn arena_holds_one_target_and_the_boss_body() {
        let peer = spawn_fight(ArenaSetup::default()).unwrap();
        let world = &peer.fight.world;
        assert_eq!(world.query::<&Target>().iter().count(), 1);
        assert!(world.get::<&BossBody>(peer.fight.boss.handle).is_ok());
        assert_eq!(peer.state(), BossState::Awaken);
        assert_eq!(peer.fight.boss.life, peer.fight.boss.life_max);
    }

    #[test]
    fn boss_body_follows_the_boss() {
        let mut peer = spawn_fight(ArenaSetup::default()).unwrap();
        for _ in 0..20 {
            peer.step();
        }
        let body = peer.fight.world.get::<&Position>(peer.fight.boss.handle).unwrap().0;
        assert_eq!(body, peer.fight.boss.center);
    }
}
