//! The phase 2 transition: a long charge-up, the avatar reveal, and a fixed
//! number of fly-then-deathray cycles, all keyed off the outer timer.

use std::f32::consts::{FRAC_PI_2, FRAC_PI_4, TAU};

use glam::Vec2;

use crate::components::boss::{BossState, HandFrame};
use crate::components::ProjectileKind;
use crate::effects::{ParticleKind, SoundCue};
use crate::error::FsmError;
use crate::fsm::{StateMachineBuilder, Tick};
use crate::systems::motion::{bump, direction_or, ease_in_out_cubic, inverse_lerp, lerp, smooth_fly_near};

use super::Fight;

pub(super) fn register(builder: &mut StateMachineBuilder<BossState, Fight>) -> Result<(), FsmError> {
    builder
        .register_transition(
            BossState::Phase2Transition,
            Some(BossState::OrbitReleasedTerraprismas),
            false,
            |f: &Fight, t| t.timer >= f.tuning.phase2.total_time(),
        )
        .on_trigger(|f: &mut Fight, _| enter_phase_two(f));
    builder.register_behavior(BossState::Phase2Transition, phase2_transition)?;
    Ok(())
}

fn enter_phase_two(fight: &mut Fight) {
    let above_target = fight.target_center() - Vec2::Y * 240.0;
    let boss = &mut fight.boss;
    boss.promote_phase(1);
    boss.z_position = 0.0;
    boss.dont_take_damage = false;
    // The terraprismas open phase 2; the rotation continues after them.
    boss.attack_cursor = 1;
    boss.teleport.resume = None;
    boss.resync.mark();
    fight.request_teleport(above_target, None);
    tracing::info!(phase = fight.boss.phase(), "phase 2 begins");
}

fn phase2_transition(fight: &mut Fight, tick: Tick<BossState>) {
    let tuning = fight.tuning.phase2.clone();
    let timer = tick.timer;
    let t = timer as f32;
    let charge_up = tuning.charge_up_time;
    let target = fight.target_center();

    if timer == 1 {
        let center = fight.boss.center;
        fight.effects.sound(SoundCue::PhaseTransitionStart, Some(center));
        let cleared = fight.clear_projectiles();
        tracing::debug!(cleared, "cleared projectiles for phase transition");
    }

    let shooting_lasers = timer >= charge_up + tuning.shoot_cycle_delay;
    let max_z = lerp(1.4, 0.6, sin01(TAU * t / 60.0).powi(3));

    {
        let boss = &mut fight.boss;
        boss.z_position = ease_in_out_cubic(inverse_lerp(0.0, 60.0, t)) * max_z;
        let z = boss.z_position;
        if timer <= 120 {
            smooth_fly_near(boss.center, &mut boss.velocity, target - Vec2::Y * 270.0, z * 0.1, 1.0 - z * 0.15);
        } else if timer <= charge_up {
            let toward = direction_or(target - boss.center, Vec2::ZERO) * 5.0;
            boss.velocity = boss.velocity.lerp(toward, 0.03);
        }
        boss.rotation = lerp(boss.rotation, 0.0, 0.3);
    }

    let appearance = bump(0.0, 0.4, 0.7, 0.75, t / charge_up.max(1) as f32).powi(2);
    if fight.boss.z_position >= 0.6 && timer % 2 == 0 && appearance >= 0.5 && fight.is_authority() {
        spawn_moonlight(fight);
    }
    let pixels = (appearance * appearance * 16.0).ceil() as u32;
    for _ in 0..pixels {
        let angle = fight.random_range(0.0, TAU);
        let distance = fight.random_range(900.0, 1256.0);
        let position = fight.boss.center + Vec2::from_angle(angle) * distance;
        let inward = direction_or(fight.boss.center - position, Vec2::ZERO);
        let velocity = Vec2::from_angle(FRAC_PI_4).rotate(inward) * fight.random_range(12.0, 30.0);
        fight.effects.particle(ParticleKind::FadeSparkle, position, velocity);
    }

    if timer >= charge_up {
        if timer == charge_up + 10 {
            let center = fight.boss.center;
            fight.effects.sound(SoundCue::PhaseTransitionReveal, Some(center));
            fight.effects.screen_shake(None, 14.0);
            fight.effects.particle(ParticleKind::RevealFlash, center, Vec2::ZERO);
        }

        let boss = &mut fight.boss;
        boss.butterfly_scale = lerp(boss.butterfly_scale, 3.0, 0.04);
        boss.butterfly_opacity = lerp(boss.butterfly_opacity, 1.0, 0.2);
        boss.opacity = lerp(boss.opacity, 0.15, 0.15);

        if shooting_lasers {
            shoot_lasers(fight, timer, timer - charge_up - tuning.shoot_cycle_delay);
        } else {
            let boss = &mut fight.boss;
            smooth_fly_near(boss.center, &mut boss.velocity, target - Vec2::Y * 250.0, 0.04, 0.85);
        }
    }

    let boss = &mut fight.boss;
    boss.set_hands(HandFrame::HandPressedToChest, HandFrame::HandPressedToChest);
    boss.dont_take_damage = true;
    boss.dash_afterimage = lerp(boss.dash_afterimage, inverse_lerp(0.0, 120.0, t), 0.055);
}

/// Moonlight sweeps in from either side and curls around the boss.
fn spawn_moonlight(fight: &mut Fight) {
    let side = if fight.random_bool(0.5) { 1.0 } else { -1.0 };
    let spread = fight.random_range(-FRAC_PI_2, FRAC_PI_2);
    let offset = Vec2::from_angle(spread) * Vec2::new(1100.0, 1200.0) * side;
    let position = fight.boss.center - offset;
    let inward = direction_or(fight.boss.center - position, Vec2::X);
    let velocity = Vec2::from_angle(FRAC_PI_2).rotate(inward) * 32.0;
    fight.spawn_projectile(ProjectileKind::ConvergingMoonlight, position, velocity, 0);
}

/// Avatar sub-cycle. `local` counts from the end of the reveal delay.
fn shoot_lasers(fight: &mut Fight, timer: u32, local: u32) {
    let tuning = fight.tuning.phase2.clone();
    let cycle = tuning.fly_around_time + tuning.deathray_time;
    let target = fight.target_center();

    if local >= tuning.avatar_cycle_time() {
        let boss = &mut fight.boss;
        boss.velocity.x *= 1.04;
        boss.velocity.y -= 3.0;
        boss.z_position = lerp(boss.z_position, 0.0, 0.2);
        return;
    }

    let wrapped = local % cycle.max(1);
    let fly_destination = target - Vec2::Y * 120.0;
    if wrapped <= tuning.fly_around_time {
        let boss = &mut fight.boss;
        if wrapped + 45 <= tuning.fly_around_time {
            boss.velocity += direction_or(fly_destination - boss.center, Vec2::ZERO) * 1.1;
        } else {
            boss.velocity *= 0.98;
        }
        return;
    }

    let center = fight.boss.center;
    if wrapped == tuning.fly_around_time + 1 {
        fight.effects.sound(SoundCue::Deathray, Some(center));
        let aim = direction_or(target - center, Vec2::Y);
        fight.spawn_projectile(ProjectileKind::DazzlingDeathray, center, aim, tuning.deathray_damage);
    }
    if timer % 2 == 0 {
        let velocity = Vec2::from_angle(TAU * timer as f32 / 23.0) * 3.0;
        let rainbow = crate::components::Projectile::new(ProjectileKind::AcceleratingRainbow, tuning.rainbow_damage)
            .with_accel(1.03);
        fight
            .spawner
            .spawn_projectile(&mut fight.world, rainbow, center, velocity, ProjectileKind::AcceleratingRainbow.lifetime());
    }

    let boss = &mut fight.boss;
    boss.velocity *= 0.95;
    boss.center = boss.center.lerp(fly_destination, 0.009);
}

/// `sin` remapped to 0..1.
fn sin01(x: f32) -> f32 {
    x.sin() * 0.5 + 0.5
}

#[cfg(test)]
mod tests {
    use hecs::World;

    use super::super::test_support::*;
    use crate::components::boss::BossState;
    use crate::components::{Projectile, ProjectileKind};
    use crate::effects::SoundCue;
    use crate::systems::boss::FightPeer;

    fn reveals(peer: &FightPeer) -> usize {
        peer.fight.effects.as_log().unwrap().count_sound(SoundCue::PhaseTransitionReveal)
    }

    fn count(world: &World, kind: ProjectileKind) -> usize {
        world.query::<&Projectile>().iter().filter(|(_, p)| p.kind == kind).count()
    }

    #[test]
    fn full_transition_flips_phase_and_schedules_teleport() {
        let mut peer = fight_in(BossState::Phase2Transition);
        let total = peer.fight.tuning.phase2.total_time();
        for _ in 0..total - 1 {
            peer.step();
            assert_eq!(peer.state(), BossState::Phase2Transition);
            assert_eq!(peer.fight.boss.phase(), 0);
            assert!(peer.fight.boss.dont_take_damage);
        }
        peer.step();
        assert_eq!(peer.state(), BossState::OrbitReleasedTerraprismas);
        assert_eq!(peer.fight.boss.phase(), 1);
        assert_eq!(peer.fight.boss.z_position, 0.0);
        assert!(peer.fight.boss.teleport.pending);

        peer.step();
        assert_eq!(peer.state(), BossState::Teleport);
    }

    #[test]
    fn reveal_and_deathrays_fire_on_exact_frames() {
        let mut peer = fight_in(BossState::Phase2Transition);
        let tuning = peer.fight.tuning.phase2.clone();
        for _ in 0..tuning.total_time() - 1 {
            peer.step();
        }
        let log = peer.fight.effects.as_log().unwrap();
        assert_eq!(log.count_sound(SoundCue::PhaseTransitionStart), 1);
        assert_eq!(log.count_sound(SoundCue::PhaseTransitionReveal), 1);
        let reveal_tick = log
            .sounds()
            .find(|(_, c)| *c == SoundCue::PhaseTransitionReveal)
            .map(|(t, _)| t)
            .unwrap();
        assert_eq!(reveal_tick, (tuning.charge_up_time + 10) as u64);
        assert_eq!(log.count_sound(SoundCue::Deathray), tuning.shoot_cycle_count as usize);
    }

    #[test]
    fn entering_the_transition_clears_boss_projectiles() {
        let mut peer = fight_in(BossState::Phase2Transition);
        let center = peer.fight.boss.center;
        for _ in 0..5 {
            peer.fight
                .spawn_projectile(ProjectileKind::StarBolt, center, glam::Vec2::X, 10);
        }
        peer.step();
        assert_eq!(count(&peer.fight.world, ProjectileKind::StarBolt), 0);
    }

    #[test]
    fn reveal_fires_only_on_its_frame_when_the_timer_jumps() {
        let mut peer = fight_in(BossState::Phase2Transition);
        let reveal = peer.fight.tuning.phase2.charge_up_time + 10;

        peer.machine.sync_to(BossState::Phase2Transition, reveal + 1);
        for _ in 0..5 {
            peer.machine.tick(&mut peer.fight);
        }
        assert_eq!(reveals(&peer), 0);

        peer.machine.sync_to(BossState::Phase2Transition, reveal - 5);
        for _ in 0..10 {
            peer.machine.tick(&mut peer.fight);
            let expected = usize::from(peer.machine.timer() >= reveal);
            assert_eq!(reveals(&peer), expected, "timer {}", peer.machine.timer());
        }
    }
}
