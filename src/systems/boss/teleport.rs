use glam::Vec2;

use crate::components::boss::{BossState, HandFrame};
use crate::effects::ParticleKind;
use crate::error::FsmError;
use crate::fsm::{StateMachineBuilder, Tick};
use crate::systems::motion::{inverse_lerp, lerp};

use super::Fight;

/// Half-width of the square light dust scatters over.
const DUST_SPREAD: f32 = 80.0;

pub(super) fn register(builder: &mut StateMachineBuilder<BossState, Fight>) -> Result<(), FsmError> {
    builder
        .register_transition(BossState::Teleport, None, false, |f: &Fight, t| t.timer >= exit_frame(f))
        .on_trigger(|f: &mut Fight, _| finish(f));
    builder.register_behavior(BossState::Teleport, teleport)?;
    Ok(())
}

fn duration(fight: &Fight) -> u32 {
    fight
        .boss
        .teleport
        .request
        .map_or(fight.tuning.teleport.default_duration, |r| r.duration)
}

/// Observers hold on a few extra frames so the authority's landing arrives first.
fn exit_frame(fight: &Fight) -> u32 {
    let latency = if fight.is_authority() {
        0
    } else {
        fight.tuning.teleport.observer_latency
    };
    duration(fight) + latency
}

fn finish(fight: &mut Fight) {
    let boss = &mut fight.boss;
    if let Some(request) = boss.teleport.request.take() {
        boss.center = request.destination;
    }
    boss.velocity = Vec2::ZERO;
    boss.net_offset = Vec2::ZERO;
    boss.clear_history();
    boss.teleport.completion = 0.0;
    boss.teleport.active = false;
    if fight.spawner.is_authority() {
        boss.resync.mark();
    }
    let center = boss.center;
    fight.effects.screen_shake(Some(center), 5.0);
    tracing::debug!(?center, "teleport finished");
}

fn teleport(fight: &mut Fight, tick: Tick<BossState>) {
    let completion = inverse_lerp(0.0, duration(fight) as f32, tick.timer as f32);
    let destination = fight.boss.teleport.request.map(|r| r.destination);

    {
        let boss = &mut fight.boss;
        boss.velocity *= 0.85;
        boss.rotation = lerp(boss.rotation, boss.velocity.x * 0.001, 0.3);
        boss.dash_afterimage *= 0.7;
        boss.teleport.completion = completion;
        boss.set_hands(HandFrame::OutstretchedDownwardHand, HandFrame::PointingUp);
    }

    let origin = fight.boss.center + fight.boss.net_offset;
    for _ in 0..8 {
        let anchor = match destination {
            Some(destination) if fight.random_bool(completion) => destination,
            _ => origin,
        };
        let offset = Vec2::new(
            fight.random_range(-DUST_SPREAD, DUST_SPREAD),
            fight.random_range(-DUST_SPREAD, DUST_SPREAD),
        );
        let velocity = -Vec2::Y * fight.random_range(0.0, 4.0);
        fight.effects.particle(ParticleKind::TeleportLight, anchor + offset, velocity);
    }

    if completion >= 0.75 {
        fight.boss.net_offset = Vec2::ZERO;
    }
}
