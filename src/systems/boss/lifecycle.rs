//! Awaken, the reset pause between attacks, and the two ways a fight ends.

use glam::Vec2;

use crate::components::boss::{BossState, HandFrame};
use crate::effects::{ParticleKind, SoundCue};
use crate::error::FsmError;
use crate::fsm::{StateMachineBuilder, Tick};
use crate::systems::motion::{ease_in_out_cubic, inverse_lerp, lerp, smooth_fly_near};

use super::Fight;

pub(super) fn register(builder: &mut StateMachineBuilder<BossState, Fight>) -> Result<(), FsmError> {
    builder
        .register_transition(BossState::Awaken, None, false, |f: &Fight, t| t.timer >= f.tuning.awaken_time)
        .on_trigger(|f: &mut Fight, _| f.boss.dont_take_damage = false);
    builder.register_transition(BossState::ResetCycle, None, false, |f: &Fight, t| {
        t.timer >= f.tuning.reset_cycle_time
    });

    builder.register_behavior(BossState::Awaken, awaken)?;
    builder.register_behavior(BossState::ResetCycle, reset_cycle)?;
    builder.register_behavior(BossState::Die, die)?;
    builder.register_behavior(BossState::Vanish, vanish)?;
    Ok(())
}

fn awaken(fight: &mut Fight, tick: Tick<BossState>) {
    let boss_center = fight.boss.center;
    if tick.timer == 1 {
        fight.effects.sound(SoundCue::Awaken, Some(boss_center));
    }

    let fade_time = fight.tuning.awaken_time as f32 * 0.75;
    let hover = fight.target_center() - Vec2::Y * 300.0;
    let boss = &mut fight.boss;
    boss.dont_take_damage = true;
    boss.opacity = ease_in_out_cubic(inverse_lerp(0.0, fade_time, tick.timer as f32));
    smooth_fly_near(boss.center, &mut boss.velocity, hover, 0.06, 0.9);
    boss.set_hands(HandFrame::PointingUp, HandFrame::PointingUp);
}

fn reset_cycle(fight: &mut Fight, _tick: Tick<BossState>) {
    let boss = &mut fight.boss;
    boss.velocity *= 0.9;
    boss.rotation = lerp(boss.rotation, 0.0, 0.2);
    boss.dash_afterimage *= 0.8;
    boss.opacity = lerp(boss.opacity, 1.0, 0.2);
    // Vulnerable between attacks, even if a teleport cut the awaken short.
    boss.dont_take_damage = false;
    boss.set_hands(HandFrame::OpenHandDownwardArm, HandFrame::OpenHandDownwardArm);
}

fn die(fight: &mut Fight, tick: Tick<BossState>) {
    if tick.timer == 1 {
        let center = fight.boss.center;
        fight.effects.sound(SoundCue::Death, Some(center));
        fight.effects.screen_shake(Some(center), 12.0);
    }
    fade_out(fight, 1.0 / 60.0);
    fight.boss.velocity *= 0.9;
}

fn vanish(fight: &mut Fight, _tick: Tick<BossState>) {
    fight.boss.velocity.y = (fight.boss.velocity.y - 0.5).max(-24.0);
    fade_out(fight, 0.02);
}

fn fade_out(fight: &mut Fight, rate: f32) {
    let sparkle = fight.boss.center + Vec2::new(fight.random_range(-60.0, 60.0), fight.random_range(-60.0, 60.0));
    fight.effects.particle(ParticleKind::FadeSparkle, sparkle, -Vec2::Y * 2.0);

    let boss = &mut fight.boss;
    boss.dont_take_damage = true;
    boss.opacity = (boss.opacity - rate).max(0.0);
    if boss.opacity <= 0.0 && !boss.despawned {
        boss.despawned = true;
        boss.resync.mark();
    }
}
