//! The boss fight: its context, the state machine wiring, and one module
//! per behavior state.
//!
//! Each behavior module exposes `register`, which adds that state's exit
//! transitions and its update routine to the builder. Interrupts that apply
//! to (almost) every state are registered here, before anything else, so
//! their registration order is fixed: death, teleport, phase 2, vanish.

mod butterfly_dashes;
mod lifecycle;
mod peer;
mod petal_sun;
mod phase2;
mod sequential_dashes;
mod star_burst;
mod teleport;
mod terraprismas;

use glam::Vec2;
use hecs::{Entity, World};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::components::boss::{Boss, BossState, TeleportRequest};
use crate::components::{Companion, ProjectileKind};
use crate::config::Tuning;
use crate::effects::EffectSink;
use crate::engine::net::NetRole;
use crate::error::FsmError;
use crate::fsm::{StateMachine, StateMachineBuilder};
use crate::systems::spawn::{clear_owned_projectiles, Spawner};
use crate::systems::target::{resolve_target, TargetView};

pub use peer::{FightPeer, FightTotals, StepOutcome};

pub type BossMachine = StateMachine<BossState, Fight>;

/// Attack rotation before the phase change.
pub const PHASE_ONE_CYCLE: [BossState; 4] = [
    BossState::SequentialDashes,
    BossState::SwirlingStarBurst,
    BossState::ButterflyBurstDashes,
    BossState::TwirlingPetalSun,
];

/// Attack rotation after the phase change. Opens with the terraprismas.
pub const PHASE_TWO_CYCLE: [BossState; 4] = [
    BossState::OrbitReleasedTerraprismas,
    BossState::SwirlingStarBurst,
    BossState::SequentialDashes,
    BossState::TwirlingPetalSun,
];

// ---------------------------------------------------------------------------
// Fight context
// ---------------------------------------------------------------------------

/// Everything a behavior may read or touch during one tick.
pub struct Fight {
    pub world: World,
    pub boss: Boss,
    pub spawner: Spawner,
    pub effects: Box<dyn EffectSink>,
    pub tuning: Tuning,
    pub rng: StdRng,
    /// Resolved once per tick by [`Fight::refresh_target`].
    pub target: Option<TargetView>,
    last_target: Option<Vec2>,
}

impl Fight {
    pub fn new(world: World, boss: Boss, role: NetRole, tuning: Tuning, effects: Box<dyn EffectSink>, seed: u64) -> Self {
        let spawner = Spawner::new(role, boss.handle);
        Self {
            world,
            boss,
            spawner,
            effects,
            tuning,
            rng: StdRng::seed_from_u64(seed),
            target: None,
            last_target: None,
        }
    }

    pub fn is_authority(&self) -> bool {
        self.spawner.is_authority()
    }

    pub fn has_target(&self) -> bool {
        self.target.is_some()
    }

    /// Where behaviors should aim. Falls back to the last place a target was
    /// seen, then to the boss itself, so a missing target holds position.
    pub fn target_center(&self) -> Vec2 {
        self.target
            .map(|t| t.position)
            .or(self.last_target)
            .unwrap_or(self.boss.center)
    }

    pub fn on_right_of_target(&self) -> bool {
        self.boss.center.x >= self.target_center().x
    }

    /// Pick the nearest target and keep the lost-target counter current.
    pub fn refresh_target(&mut self) {
        self.target = resolve_target(&self.world, self.boss.center);
        match self.target {
            Some(t) => {
                self.last_target = Some(t.position);
                self.boss.frames_without_target = 0;
            }
            None => self.boss.frames_without_target = self.boss.frames_without_target.saturating_add(1),
        }
    }

    /// Ask for a teleport to `destination`. `None` uses the default duration.
    ///
    /// No-op on observers. While a teleport is already running, the request
    /// only updates its destination and duration.
    pub fn request_teleport(&mut self, destination: Vec2, duration: Option<u32>) {
        if !self.is_authority() {
            return;
        }
        let duration = duration.unwrap_or(self.tuning.teleport.default_duration).max(1);
        self.effects.screen_shake(Some(self.boss.center), 5.0);

        let teleport = &mut self.boss.teleport;
        teleport.request = Some(TeleportRequest { destination, duration });
        if !teleport.active {
            teleport.pending = true;
            teleport.completion = 0.0;
        }
        self.boss.resync.mark();
        tracing::debug!(?destination, duration, "teleport requested");
    }

    pub fn spawn_projectile(&mut self, kind: ProjectileKind, position: Vec2, velocity: Vec2, damage: i32) -> Option<Entity> {
        self.spawner.projectile(&mut self.world, kind, position, velocity, damage)
    }

    /// Spawn a companion and count it toward `companions_alive`.
    pub fn spawn_companion(&mut self, companion: Companion, position: Vec2) -> Option<Entity> {
        let entity = self.spawner.companion(&mut self.world, companion, position)?;
        self.boss.companions_alive += 1;
        self.boss.resync.mark();
        Some(entity)
    }

    pub fn clear_projectiles(&mut self) -> usize {
        clear_owned_projectiles(&mut self.world, self.spawner.owner())
    }

    pub fn random_f32(&mut self) -> f32 {
        rand::Rng::random(&mut self.rng)
    }

    pub fn random_range(&mut self, low: f32, high: f32) -> f32 {
        if high <= low {
            return low;
        }
        rand::Rng::random_range(&mut self.rng, low..high)
    }

    pub fn random_bool(&mut self, p: f32) -> bool {
        rand::Rng::random_bool(&mut self.rng, p.clamp(0.0, 1.0) as f64)
    }
}

// ---------------------------------------------------------------------------
// Machine wiring
// ---------------------------------------------------------------------------

/// Build the boss state machine. Fails if any state is left unwired.
pub fn build_machine() -> Result<BossMachine, FsmError> {
    let mut builder = StateMachineBuilder::new(BossState::Awaken);

    register_interrupts(&mut builder);

    lifecycle::register(&mut builder)?;
    teleport::register(&mut builder)?;
    phase2::register(&mut builder)?;
    sequential_dashes::register(&mut builder)?;
    butterfly_dashes::register(&mut builder)?;
    star_burst::register(&mut builder)?;
    petal_sun::register(&mut builder)?;
    terraprismas::register(&mut builder)?;

    builder.set_selector(select_next);
    builder.on_enter(|fight: &mut Fight, t| {
        fight.boss.scratch.clear();
        fight.boss.teleport.resumed = t.from == BossState::Teleport && is_attack(t.to);
    });
    builder.build()
}

fn register_interrupts(builder: &mut StateMachineBuilder<BossState, Fight>) {
    use BossState::*;

    builder
        .register_global_transition(Some(Die), true, |f: &Fight, _| f.boss.killed || f.boss.life <= 0, &[Die, Vanish])
        .on_trigger(|f: &mut Fight, tick| {
            f.boss.resync.mark();
            tracing::info!(from = ?tick.state, life = f.boss.life, "boss defeated");
        });

    builder
        .register_global_transition(Some(Teleport), true, |f: &Fight, _| f.boss.teleport.pending, &[Teleport, Die, Vanish])
        .on_trigger(|f: &mut Fight, tick| {
            let teleport = &mut f.boss.teleport;
            teleport.pending = false;
            teleport.active = true;
            teleport.resume = Some(tick.state);
        });

    builder
        .register_global_transition(
            Some(Phase2Transition),
            false,
            |f: &Fight, _| f.boss.phase() == 0 && f.boss.life as f32 <= f.boss.life_max as f32 * f.tuning.phase2_life_ratio,
            &[Phase2Transition, ButterflyBurstDashes, Teleport, Die, Vanish],
        )
        .on_trigger(|f: &mut Fight, tick| {
            f.boss.resync.mark();
            tracing::info!(from = ?tick.state, life = f.boss.life, "entering phase 2 transition");
        });

    builder
        .register_global_transition(
            Some(Vanish),
            false,
            |f: &Fight, _| f.boss.frames_without_target >= f.tuning.vanish_delay,
            &[Teleport, Die, Vanish],
        )
        .on_trigger(|f: &mut Fight, _| {
            tracing::info!(frames = f.boss.frames_without_target, "target lost, boss leaving");
        });
}

/// Resolves every transition registered without an explicit target.
///
/// A teleport goes straight back to the attack it interrupted. Every other
/// exit goes through [`BossState::ResetCycle`], and leaving the reset picks
/// the next attack in the current phase's rotation.
pub fn select_next(fight: &mut Fight, from: BossState) -> BossState {
    match from {
        BossState::Teleport => match fight.boss.teleport.resume.take() {
            Some(state) if is_attack(state) => state,
            _ => BossState::ResetCycle,
        },
        BossState::ResetCycle => next_attack(&mut fight.boss),
        _ => BossState::ResetCycle,
    }
}

pub fn is_attack(state: BossState) -> bool {
    PHASE_ONE_CYCLE.contains(&state) || PHASE_TWO_CYCLE.contains(&state)
}

fn next_attack(boss: &mut Boss) -> BossState {
    let cycle = if boss.phase() == 0 { &PHASE_ONE_CYCLE } else { &PHASE_TWO_CYCLE };
    let next = cycle[boss.attack_cursor as usize % cycle.len()];
    boss.attack_cursor = boss.attack_cursor.wrapping_add(1);
    next
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn machine_wiring_is_complete() {
        assert!(build_machine().is_ok());
    }

    #[test]
    fn selector_walks_the_phase_rotation() {
        let mut peer = fight(NetRole::Authority);
        let picked: Vec<BossState> = (0..5)
            .map(|_| select_next(&mut peer.fight, BossState::ResetCycle))
            .collect();
        assert_eq!(&picked[..4], &PHASE_ONE_CYCLE);
        assert_eq!(picked[4], PHASE_ONE_CYCLE[0]);

        peer.fight.boss.promote_phase(1);
        peer.fight.boss.attack_cursor = 0;
        assert_eq!(select_next(&mut peer.fight, BossState::ResetCycle), BossState::OrbitReleasedTerraprismas);
    }

    #[test]
    fn every_other_exit_goes_through_reset() {
        let mut peer = fight(NetRole::Authority);
        for from in [BossState::Awaken, BossState::Teleport, BossState::Phase2Transition]
            .into_iter()
            .chain(PHASE_ONE_CYCLE)
        {
            assert_eq!(select_next(&mut peer.fight, from), BossState::ResetCycle);
        }
    }

    #[test]
    fn teleport_returns_to_the_attack_it_cut_short() {
        let mut peer = fight(NetRole::Authority);
        peer.fight.boss.attack_cursor = 2;
        peer.fight.boss.teleport.resume = Some(BossState::SwirlingStarBurst);
        assert_eq!(select_next(&mut peer.fight, BossState::Teleport), BossState::SwirlingStarBurst);
        assert_eq!(peer.fight.boss.teleport.resume, None);
        assert_eq!(peer.fight.boss.attack_cursor, 2);
        assert_eq!(select_next(&mut peer.fight, BossState::ResetCycle), PHASE_ONE_CYCLE[2]);
    }

    #[test]
    fn teleport_out_of_a_non_attack_goes_to_reset() {
        let mut peer = fight(NetRole::Authority);
        peer.fight.boss.teleport.resume = Some(BossState::Awaken);
        assert_eq!(select_next(&mut peer.fight, BossState::Teleport), BossState::ResetCycle);
        assert_eq!(peer.fight.boss.teleport.resume, None);
        assert_eq!(select_next(&mut peer.fight, BossState::ResetCycle), PHASE_ONE_CYCLE[0]);
    }

    #[test]
    fn only_attacks_entered_from_teleport_count_as_resumed() {
        let mut peer = fight_in(BossState::SequentialDashes);
        peer.fight.request_teleport(Vec2::new(0.0, -200.0), Some(5));
        peer.step();
        assert_eq!(peer.state(), BossState::Teleport);
        assert!(!peer.fight.boss.teleport.resumed);
        for _ in 0..5 {
            peer.step();
        }
        assert_eq!(peer.state(), BossState::SequentialDashes);
        assert!(peer.fight.boss.teleport.resumed);

        peer.machine.sync_to(BossState::SequentialDashes, 10_000);
        peer.step();
        assert_eq!(peer.state(), BossState::ResetCycle);
        assert!(!peer.fight.boss.teleport.resumed);
    }

    #[test]
    fn observer_teleport_request_is_a_no_op() {
        let mut peer = fight(NetRole::Observer);
        peer.fight.request_teleport(Vec2::new(500.0, 300.0), Some(30));
        assert!(!peer.fight.boss.teleport.pending);
        assert!(peer.fight.boss.teleport.request.is_none());
        assert!(!peer.fight.boss.resync.is_set());
    }

    #[test]
    fn request_while_teleporting_only_retargets() {
        let mut peer = fight(NetRole::Authority);
        peer.fight.boss.teleport.active = true;
        peer.fight.request_teleport(Vec2::new(1.0, 2.0), Some(12));
        assert!(!peer.fight.boss.teleport.pending);
        assert_eq!(
            peer.fight.boss.teleport.request,
            Some(TeleportRequest {
                destination: Vec2::new(1.0, 2.0),
                duration: 12
            })
        );
    }

    #[test]
    fn missing_target_holds_last_known_position() {
        let mut peer = fight(NetRole::Authority);
        peer.fight.refresh_target();
        let seen = peer.fight.target_center();
        peer.fight.world.clear();
        peer.fight.refresh_target();
        assert!(!peer.fight.has_target());
        assert_eq!(peer.fight.target_center(), seen);
        assert_eq!(peer.fight.boss.frames_without_target, 1);
    }
}
