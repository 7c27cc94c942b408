use std::f32::consts::TAU;

use glam::Vec2;

use crate::components::boss::{BossState, HandFrame};
use crate::components::{Companion, CompanionKind, OrbitCenter, Projectile, ProjectileKind};
use crate::effects::SoundCue;
use crate::error::FsmError;
use crate::fsm::{StateMachineBuilder, Tick};
use crate::systems::motion::{bump, inverse_lerp, lerp, smooth_fly_near_with_slowdown, steer_toward};

use super::Fight;

/// The attack holds at least this long before checking whether the blades are gone.
const MIN_DURATION: u32 = 20;

pub(super) fn register(builder: &mut StateMachineBuilder<BossState, Fight>) -> Result<(), FsmError> {
    builder
        .register_transition(BossState::OrbitReleasedTerraprismas, None, false, |f: &Fight, t| {
            t.timer >= MIN_DURATION && f.boss.companions_alive == 0
        })
        .on_trigger(|f: &mut Fight, _| {
            let destination = f.target_center() - Vec2::Y * 350.0;
            f.request_teleport(destination, None);
        });
    builder.register_behavior(BossState::OrbitReleasedTerraprismas, orbit_released_terraprismas)?;
    Ok(())
}

/// Blades spin around the target like buzzsaws while the boss circles
/// outside them, then she punches and they fly off one by one.
fn orbit_released_terraprismas(fight: &mut Fight, tick: Tick<BossState>) {
    let spin_time = fight.tuning.terraprismas.spin_time;
    {
        let boss = &mut fight.boss;
        boss.set_hands(HandFrame::OpenHandDownwardArm, HandFrame::OpenHandDownwardArm);
        boss.rotation = lerp(boss.rotation, (boss.velocity.x * 0.0021).clamp(-0.4, 0.4), 0.16);
    }

    if tick.timer >= spin_time {
        fly_off(fight, tick.timer - spin_time);
        if tick.timer == spin_time {
            release(fight);
        }
    } else {
        fly_near_target(fight, tick.timer);
    }

    if tick.timer == 1 {
        summon_blades(fight);
    }
}

fn summon_blades(fight: &mut Fight) {
    let target = fight.target_center();
    fight.effects.sound(SoundCue::TerraprismaSummon, Some(fight.boss.center));

    let count = fight.tuning.terraprismas.count;
    let damage = fight.tuning.terraprismas.damage;
    let owner = fight.boss.handle;
    for i in 0..count {
        let blade = Companion {
            kind: CompanionKind::OrbitingTerraprisma,
            owner,
            damage,
            age: 0,
            angle: TAU * i as f32 / count as f32,
            length: 0.0,
            delay: i,
        };
        let Some(entity) = fight.spawn_companion(blade, target) else {
            continue;
        };
        if let Err(err) = fight.world.insert_one(entity, OrbitCenter(target)) {
            tracing::warn!(%err, "blade vanished before it got an orbit");
        }
    }
}

fn fly_near_target(fight: &mut Fight, timer: u32) {
    let target = fight.target_center();
    let side = if fight.on_right_of_target() { 1.0 } else { -1.0 };
    let t = timer as f32;
    let slowdown_radius = inverse_lerp(0.0, 42.0, t) * 400.0;
    let initial_speed = bump(0.0, 30.0, 30.0, 40.0, t);
    let hover = target + Vec2::X * side * 700.0;

    let boss = &mut fight.boss;
    boss.dash_afterimage *= 0.9;
    boss.center = boss.center.lerp(target, 0.0053);
    steer_toward(boss.center, &mut boss.velocity, target, 9.0, 0.17);
    smooth_fly_near_with_slowdown(
        boss.center,
        &mut boss.velocity,
        hover,
        initial_speed * 0.3,
        1.0 - initial_speed * 0.4,
        slowdown_radius,
    );
}

/// Punch sounds, the punch side, and the burst at the fist.
fn release(fight: &mut Fight) {
    let center = fight.boss.center;
    fight.effects.sound(SoundCue::TerraprismaRelease, Some(center));
    fight.effects.sound(SoundCue::TerraprismaSlash, Some(center));
    fight.effects.sound(SoundCue::PunchWind, Some(center));

    if !fight.is_authority() {
        return;
    }
    let punch = if fight.on_right_of_target() { 1.0 } else { -1.0 };
    fight.boss.scratch.terraprismas().punch_direction = punch;
    fight.boss.resync.mark();

    let fist = center + Vec2::from_angle(fight.boss.rotation).rotate(Vec2::new(punch * -64.0, 8.0));
    let burst = Projectile::new(ProjectileKind::PrismaticBurst, 0);
    fight
        .spawner
        .spawn_projectile(&mut fight.world, burst, fist, Vec2::ZERO, ProjectileKind::PrismaticBurst.lifetime());
}

/// Fly up and forward while the blades do the work.
fn fly_off(fight: &mut Fight, since_release: u32) {
    let punch = fight.boss.scratch.peek_terraprismas().punch_direction;
    let boss = &mut fight.boss;
    if punch == 1.0 {
        boss.set_hands(HandFrame::FistedOutstretchedArm, HandFrame::OpenHandDownwardArm);
    } else {
        boss.set_hands(HandFrame::OpenHandDownwardArm, HandFrame::FistedOutstretchedArm);
    }

    boss.velocity.x *= 1.033;
    if since_release >= 35 && boss.velocity.y >= -56.0 {
        boss.velocity.y -= 2.6;
    }
    boss.dash_afterimage = inverse_lerp(30.0, 90.0, since_release as f32);
}
