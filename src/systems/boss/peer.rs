use crate::components::boss::{BossSnapshot, BossState};
use crate::components::Position;
use crate::fsm::Transitioned;
use crate::systems::companions::companion_step;
use crate::systems::projectiles::{projectile_step, target_step};
use crate::systems::target::TargetScript;

use super::{BossMachine, Fight};

/// Running totals for the end-of-fight summary.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FightTotals {
    pub transitions: u32,
    pub snapshots: u32,
    pub projectile_hits: u32,
    pub projectiles_expired: u32,
    pub damage_to_target: i64,
}

/// What one [`FightPeer::step`] produced.
#[derive(Debug, Default)]
pub struct StepOutcome {
    pub transitioned: Option<Transitioned<BossState>>,
    /// Present when the authority changed replicated state this tick.
    pub snapshot: Option<BossSnapshot>,
}

/// One peer's copy of the fight: the machine plus the context it drives.
pub struct FightPeer {
    pub machine: BossMachine,
    pub fight: Fight,
    pub tick: u64,
    pub script: Option<TargetScript>,
    /// Damage dealt to the boss every tick, standing in for player attacks.
    pub damage_per_tick: i32,
    pub totals: FightTotals,
}

impl FightPeer {
    pub fn new(machine: BossMachine, fight: Fight) -> Self {
        Self {
            machine,
            fight,
            tick: 0,
            script: None,
            damage_per_tick: 0,
            totals: FightTotals::default(),
        }
    }

    pub fn state(&self) -> BossState {
        self.machine.state()
    }

    pub fn is_finished(&self) -> bool {
        self.fight.boss.despawned
    }

    pub fn snapshot(&self) -> BossSnapshot {
        self.fight.boss.snapshot(self.machine.state(), self.machine.timer())
    }

    /// Take the authority's word for state, timer and replicated fields.
    pub fn apply_snapshot(&mut self, snapshot: &BossSnapshot) {
        self.fight.boss.apply_snapshot(snapshot);
        self.machine.sync_to(snapshot.state, snapshot.timer);
    }

    /// Run one simulation frame: move targets, resolve the target, tick the
    /// machine, integrate the boss, then update the arena.
    pub fn step(&mut self) -> StepOutcome {
        self.tick += 1;
        let fight = &mut self.fight;
        fight.effects.begin_tick(self.tick);

        if let Some(script) = &self.script {
            script.steer(&mut fight.world, self.tick);
        }
        target_step(&mut fight.world);
        if self.damage_per_tick > 0 {
            fight.boss.apply_damage(self.damage_per_tick);
        }
        fight.refresh_target();

        let transitioned = self.machine.tick(fight);
        if transitioned.is_some() {
            self.totals.transitions += 1;
        }

        fight.boss.integrate();
        fight.boss.record_history();
        let handle = fight.boss.handle;
        if let Ok(mut body) = fight.world.get::<&mut Position>(handle) {
            body.0 = fight.boss.center;
        }

        let target = fight.target.map(|t| t.position);
        let report = projectile_step(&mut fight.world, target);
        self.totals.projectile_hits += report.hits;
        self.totals.projectiles_expired += report.expired;
        self.totals.damage_to_target += report.damage_dealt;

        let census = companion_step(
            &mut fight.world,
            &fight.spawner,
            fight.effects.as_mut(),
            &fight.tuning.petal_sun,
            &fight.tuning.terraprismas,
            target,
        );
        if fight.is_authority() && census.total() != fight.boss.companions_alive {
            fight.boss.companions_alive = census.total();
            fight.boss.resync.mark();
        }

        if fight.boss.despawned && fight.world.contains(handle) {
            let _ = fight.world.despawn(handle);
            tracing::info!(tick = self.tick, "boss despawned");
        }

        let resync = fight.boss.resync.take();
        let snapshot = if resync && fight.is_authority() {
            self.totals.snapshots += 1;
            Some(self.snapshot())
        } else {
            None
        };
        StepOutcome { transitioned, snapshot }
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use super::super::test_support::*;
    use crate::components::boss::BossState;
    use crate::components::{Projectile, ProjectileKind};
    use crate::engine::net::NetRole;

    #[test]
    fn fight_opens_with_awaken_then_reset() {
        let mut peer = fight(NetRole::Authority);
        let awaken = peer.fight.tuning.awaken_time;
        for _ in 0..awaken - 1 {
            peer.step();
            assert_eq!(peer.state(), BossState::Awaken);
        }
        peer.step();
        assert_eq!(peer.state(), BossState::ResetCycle);
        assert_eq!(peer.machine.timer(), 0);
    }

    #[test]
    fn snapshot_brings_observer_into_line() {
        let mut authority = fight(NetRole::Authority);
        let mut observer = fight(NetRole::Observer);
        for _ in 0..10 {
            authority.step();
            observer.step();
        }
        authority.fight.boss.center.x += 250.0;
        let snap = authority.snapshot();
        observer.apply_snapshot(&snap);
        assert_eq!(observer.state(), authority.state());
        assert_eq!(observer.machine.timer(), authority.machine.timer());
        assert_eq!(observer.fight.boss.center, authority.fight.boss.center);
    }

    #[test]
    fn observers_never_broadcast() {
        let mut observer = fight(NetRole::Observer);
        for _ in 0..400 {
            assert!(observer.step().snapshot.is_none());
        }
    }

    #[test]
    fn totals_count_projectiles_that_run_out() {
        let mut peer = fight(NetRole::Authority);
        let far = Vec2::new(5000.0, 5000.0);
        let bolt = Projectile::new(ProjectileKind::StarBolt, 10);
        peer.fight.spawner.spawn_projectile(&mut peer.fight.world, bolt, far, Vec2::X, 2);
        peer.step();
        assert_eq!(peer.totals.projectiles_expired, 0);
        peer.step();
        assert_eq!(peer.totals.projectiles_expired, 1);
        assert_eq!(peer.totals.projectile_hits, 0);
    }
}
