use std::f32::consts::TAU;

use glam::Vec2;

use crate::components::boss::{BossState, HandFrame};
use crate::components::{Companion, CompanionKind};
use crate::effects::SoundCue;
use crate::error::FsmError;
use crate::fsm::{StateMachineBuilder, Tick};
use crate::systems::motion::{lerp, smooth_fly_near};

use super::Fight;

/// The attack holds at least this long, even if every petal is already gone.
const MIN_DURATION: u32 = 30;

pub(super) fn register(builder: &mut StateMachineBuilder<BossState, Fight>) -> Result<(), FsmError> {
    builder.register_transition(BossState::TwirlingPetalSun, None, false, |f: &Fight, t| {
        t.timer >= MIN_DURATION && f.boss.companions_alive == 0
    });
    builder.register_behavior(BossState::TwirlingPetalSun, twirling_petal_sun)?;
    Ok(())
}

/// Summon a ring of petals around the boss and hover above the target until
/// all of them have burst.
fn twirling_petal_sun(fight: &mut Fight, tick: Tick<BossState>) {
    if tick.timer == 1 {
        summon_petals(fight);
    }

    let hover = fight.target_center() - Vec2::Y * 300.0;
    let boss = &mut fight.boss;
    smooth_fly_near(boss.center, &mut boss.velocity, hover, 0.12, 0.85);
    boss.rotation = lerp(boss.rotation, boss.velocity.x * 0.0015, 0.2);
    boss.dash_afterimage *= 0.9;
    if boss.companions_alive > 0 {
        boss.set_hands(HandFrame::PointingUp, HandFrame::PointingUp);
    } else {
        boss.set_hands(HandFrame::HandPressedToChest, HandFrame::HandPressedToChest);
    }
}

fn summon_petals(fight: &mut Fight) {
    let center = fight.boss.center;
    fight.effects.sound(SoundCue::PetalSummon, Some(center));

    let count = fight.tuning.petal_sun.petal_count;
    let damage = fight.tuning.petal_sun.rainbow_damage;
    let owner = fight.boss.handle;
    for i in 0..count {
        let petal = Companion {
            kind: CompanionKind::DazzlingPetal,
            owner,
            damage,
            age: 0,
            angle: TAU * i as f32 / count as f32,
            length: 0.0,
            delay: 0,
        };
        if fight.spawn_companion(petal, center).is_some() {
            fight.boss.scratch.petal_sun().petals_spawned += 1;
        }
    }
    tracing::debug!(petals = fight.boss.scratch.peek_petal_sun().petals_spawned, "petal sun summoned");
}
