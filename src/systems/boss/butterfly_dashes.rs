use std::f32::consts::TAU;

use glam::Vec2;

use crate::components::boss::{BossState, HandFrame};
use crate::components::{Projectile, ProjectileKind};
use crate::effects::{ParticleKind, SoundCue};
use crate::error::FsmError;
use crate::fsm::{StateMachineBuilder, Tick};
use crate::systems::motion::{direction_or, lerp, smooth_fly_near};

use super::Fight;

const DASH_SPEED: f32 = 36.0;
const BOLT_SPEED: f32 = 6.0;

pub(super) fn register(builder: &mut StateMachineBuilder<BossState, Fight>) -> Result<(), FsmError> {
    builder.register_transition(BossState::ButterflyBurstDashes, None, false, |f: &Fight, t| {
        let butterfly = &f.tuning.butterfly_dashes;
        t.timer >= butterfly.cycle_time() * butterfly.cycle_count
    });
    builder.register_behavior(BossState::ButterflyBurstDashes, butterfly_burst_dashes)?;
    Ok(())
}

/// Hover with the butterfly projection out, dash at the target, and scatter
/// a ring of homing bolts where the dash ends.
fn butterfly_burst_dashes(fight: &mut Fight, tick: Tick<BossState>) {
    let tuning = fight.tuning.butterfly_dashes.clone();
    let wrapped = tick.wrapped(tuning.cycle_time());
    let target = fight.target_center();
    let side = if fight.on_right_of_target() { 1.0 } else { -1.0 };
    let burst_frame = tuning.hover_time + tuning.dash_time;

    if wrapped == tuning.hover_time {
        if fight.is_authority() {
            fight.boss.scratch.butterfly().direction = direction_or(target - fight.boss.center, Vec2::Y);
            fight.boss.resync.mark();
        }
        let center = fight.boss.center;
        fight.effects.sound(SoundCue::DashCharge, Some(center));
    }

    if wrapped == burst_frame {
        release_bolts(fight, &tuning);
    }

    let direction = fight.boss.scratch.peek_butterfly().direction;
    let boss = &mut fight.boss;
    if wrapped < tuning.hover_time {
        let hover = target + Vec2::new(side * 350.0, -250.0);
        smooth_fly_near(boss.center, &mut boss.velocity, hover, 0.2, 0.8);
        boss.butterfly_opacity = lerp(boss.butterfly_opacity, 1.0, 0.1);
        boss.butterfly_scale = lerp(boss.butterfly_scale, 1.0, 0.1);
        boss.dash_afterimage *= 0.9;
        boss.set_hands(HandFrame::PointingUp, HandFrame::PointingUp);
    } else if wrapped < burst_frame {
        boss.velocity = boss.velocity.lerp(direction * DASH_SPEED, 0.3);
        boss.dash_afterimage = 1.0;
        boss.set_hands(HandFrame::FistedOutstretchedArm, HandFrame::FistedOutstretchedArm);
    } else {
        boss.velocity *= 0.85;
        boss.butterfly_opacity = lerp(boss.butterfly_opacity, 0.0, 0.15);
        boss.set_hands(HandFrame::HandPressedToChest, HandFrame::HandPressedToChest);
    }
    boss.rotation = lerp(boss.rotation, (boss.velocity.x * 0.0015).clamp(-0.4, 0.4), 0.2);
}

fn release_bolts(fight: &mut Fight, tuning: &crate::config::ButterflyTuning) {
    let center = fight.boss.center;
    fight.effects.sound(SoundCue::ButterflyBurst, Some(center));
    fight.effects.particle(ParticleKind::Distortion, center, Vec2::ZERO);
    fight.effects.screen_shake(Some(center), 4.0);
    fight.boss.velocity *= 0.3;

    let aim = direction_or(fight.target_center() - center, Vec2::Y);
    let base = aim.y.atan2(aim.x);
    let count = tuning.bolt_count.max(1);
    for i in 0..count {
        let angle = base + TAU * i as f32 / count as f32;
        let bolt = Projectile::new(ProjectileKind::ButterflyBolt, tuning.bolt_damage).with_homing(0.02);
        fight.spawner.spawn_projectile(
            &mut fight.world,
            bolt,
            center,
            Vec2::from_angle(angle) * BOLT_SPEED,
            ProjectileKind::ButterflyBolt.lifetime(),
        );
    }
}
