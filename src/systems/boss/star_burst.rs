use std::f32::consts::{FRAC_PI_2, FRAC_PI_4, TAU};

use glam::Vec2;

use crate::components::boss::{BossState, HandFrame};
use crate::components::{Projectile, ProjectileKind};
use crate::config::StarBurstTuning;
use crate::effects::{ParticleKind, SoundCue};
use crate::error::FsmError;
use crate::fsm::{StateMachineBuilder, Tick};
use crate::systems::motion::{angle_between, bump, direction_or, lerp};

use super::Fight;

/// A first redirect farther than this from the teleport point blinks there
/// instead, unless the attack is already resuming from that blink.
const TELEPORT_RANGE: f32 = 300.0;

pub(super) fn register(builder: &mut StateMachineBuilder<BossState, Fight>) -> Result<(), FsmError> {
    builder.register_transition(BossState::SwirlingStarBurst, None, false, |f: &Fight, t| {
        let star = &f.tuning.star_burst;
        let offset = f.boss.scratch.peek_star_burst().cycle_offset;
        t.timer + offset >= star.cycle_time() * star.burst_count
    });
    builder.register_behavior(BossState::SwirlingStarBurst, swirling_star_burst)?;
    Ok(())
}

/// Swirl from one side of the target to the other, then let off a ring of
/// stars. The swirl ends early once the boss overshoots its hover point; the
/// skipped frames go into `cycle_offset` so the burst stays on schedule.
fn swirling_star_burst(fight: &mut Fight, tick: Tick<BossState>) {
    let tuning = fight.tuning.star_burst.clone();
    let redirect = tuning.redirect_time;
    let timer = tick.timer + fight.boss.scratch.peek_star_burst().cycle_offset;
    let wrapped = timer % tuning.cycle_time().max(1);
    let target = fight.target_center();

    {
        let boss = &mut fight.boss;
        boss.set_hands(HandFrame::OpenHandDownwardArm, HandFrame::OpenHandDownwardArm);
        boss.rotation = lerp(boss.rotation, boss.velocity.x * 0.0015, 0.2);
    }

    if wrapped <= redirect {
        if swirl(fight, &tuning, timer, wrapped, target) {
            return;
        }
    } else {
        let boss = &mut fight.boss;
        let ideal_speed = bump(0.0, 0.6, 0.8, 1.0, (wrapped - redirect) as f32 / tuning.burst_delay.max(1) as f32).powi(2) * -20.0;
        boss.velocity.x *= 0.5;
        boss.velocity.y = lerp(boss.velocity.y, ideal_speed, 0.33);
        boss.dash_afterimage *= 0.95;
    }

    if wrapped == redirect + tuning.burst_delay {
        burst(fight, &tuning, target);
    }
    if wrapped >= redirect + tuning.burst_delay {
        fight.boss.set_hands(HandFrame::HandPressedToChest, HandFrame::HandPressedToChest);
    }
}

/// Redirect part of a cycle. Returns true when the rest of the tick is skipped.
fn swirl(fight: &mut Fight, tuning: &StarBurstTuning, timer: u32, wrapped: u32, target: Vec2) -> bool {
    let redirect = tuning.redirect_time;
    let mut swapped = false;
    if timer == 1 {
        let side = if fight.on_right_of_target() { 1.0 } else { -1.0 };
        fight.boss.scratch.star_burst().hover_direction = side;
        if fight.is_authority() {
            fight.boss.resync.mark();
        }
    } else if wrapped == 1 {
        fight.boss.scratch.star_burst().hover_direction *= -1.0;
        swapped = true;
    }

    if timer <= redirect {
        let destination = target - Vec2::Y * 150.0;
        let far = fight.boss.center.distance(destination) > TELEPORT_RANGE;
        if timer == redirect / 2 && far && !fight.boss.teleport.resumed {
            fight.request_teleport(destination, None);
        }
        fight.boss.velocity *= 0.95;
        return true;
    }

    let hover_direction = fight.boss.scratch.peek_star_burst().hover_direction;
    let hover = target + Vec2::new(hover_direction * 400.0, 100.0);
    let speed = 1.0 - wrapped as f32 / redirect.max(1) as f32;
    {
        let boss = &mut fight.boss;
        boss.center = boss.center.lerp(hover, 0.2);
        boss.velocity += direction_or(hover - boss.center, Vec2::ZERO) * speed * 40.0;
        boss.dash_afterimage = 1.0;
    }

    let side = if fight.on_right_of_target() { 1.0 } else { -1.0 };
    if swapped && side == hover_direction {
        fight.boss.scratch.star_burst().hover_direction *= -1.0;
    }

    let to_hover = direction_or(hover - fight.boss.center, Vec2::ZERO);
    if angle_between(fight.boss.velocity, to_hover) >= FRAC_PI_2 {
        fight.boss.scratch.star_burst().cycle_offset += redirect - wrapped + 1;
        let boss = &mut fight.boss;
        boss.velocity *= 0.25;
        boss.dash_afterimage *= 0.4;
        boss.resync.mark();
    }
    false
}

fn burst(fight: &mut Fight, tuning: &StarBurstTuning, target: Vec2) {
    let center = fight.boss.center;
    fight.effects.sound(SoundCue::StarBurst, Some(center));
    fight.effects.sound(SoundCue::StarBurstEcho, Some(center));
    fight.effects.screen_shake(Some(center), 7.2);
    fight.effects.particle(ParticleKind::Distortion, center, Vec2::ZERO);

    if !fight.is_authority() {
        return;
    }

    let aim = direction_or(target - center, Vec2::Y);
    let offset = aim.y.atan2(aim.x);
    let damage = tuning.bolt_damage;
    for i in 0..18 {
        let angle = TAU * i as f32 / 18.0 + offset;
        let star = Projectile::new(ProjectileKind::StarBolt, damage).with_accel(1.02);
        fight
            .spawner
            .spawn_projectile(&mut fight.world, star, center, Vec2::from_angle(angle) * 0.45, ProjectileKind::StarBolt.lifetime());
    }
    for i in 0..9 {
        let angle = TAU * i as f32 / 9.0;
        spawn_prismatic(fight, center, Vec2::from_angle(angle) * 8.0, damage);
    }
    for _ in 0..7 {
        let spread = fight.random_range(-FRAC_PI_4, FRAC_PI_4);
        let speed = fight.random_range(1.0, 1.7);
        spawn_prismatic(fight, center, Vec2::from_angle(spread).rotate(-aim) * speed, damage);
    }
}

fn spawn_prismatic(fight: &mut Fight, position: Vec2, velocity: Vec2, damage: i32) {
    let bolt = Projectile::new(ProjectileKind::PrismaticBolt, damage).with_homing(0.03);
    fight
        .spawner
        .spawn_projectile(&mut fight.world, bolt, position, velocity, ProjectileKind::PrismaticBolt.lifetime());
}
