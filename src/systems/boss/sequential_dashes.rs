use glam::Vec2;

use crate::components::boss::{BossState, HandFrame};
use crate::effects::SoundCue;
use crate::error::FsmError;
use crate::fsm::{StateMachineBuilder, Tick};
use crate::systems::motion::{direction_or, lerp, smooth_fly_near};

use super::Fight;

pub(super) fn register(builder: &mut StateMachineBuilder<BossState, Fight>) -> Result<(), FsmError> {
    builder.register_transition(BossState::SequentialDashes, None, false, |f: &Fight, t| {
        let dashes = &f.tuning.sequential_dashes;
        t.timer >= dashes.cycle_time() * dashes.dash_count
    });
    builder.register_behavior(BossState::SequentialDashes, sequential_dashes)?;
    Ok(())
}

/// Hover beside the target, lock a direction, dash through, recover. Repeat.
fn sequential_dashes(fight: &mut Fight, tick: Tick<BossState>) {
    let tuning = fight.tuning.sequential_dashes.clone();
    let wrapped = tick.wrapped(tuning.cycle_time());
    let target = fight.target_center();
    let side = if fight.on_right_of_target() { 1.0 } else { -1.0 };

    if wrapped == tuning.redirect_time {
        if fight.is_authority() {
            let direction = direction_or(target - fight.boss.center, Vec2::X);
            fight.boss.scratch.dashes().direction = direction;
            fight.boss.resync.mark();
        }
        fight.boss.scratch.dashes().dashes_done += 1;
        let center = fight.boss.center;
        fight.effects.sound(SoundCue::DashCharge, Some(center));
    }

    let direction = fight.boss.scratch.peek_dashes().direction;
    let boss = &mut fight.boss;
    if wrapped < tuning.redirect_time {
        let hover = target + Vec2::new(side * 400.0, -150.0);
        smooth_fly_near(boss.center, &mut boss.velocity, hover, 0.15, 0.85);
        boss.dash_afterimage *= 0.9;
        boss.set_hands(HandFrame::OutstretchedDownwardHand, HandFrame::OpenHandDownwardArm);
    } else if wrapped < tuning.redirect_time + tuning.dash_time {
        boss.velocity = direction * tuning.dash_speed;
        boss.dash_afterimage = 1.0;
        boss.set_hands(HandFrame::FistedOutstretchedArm, HandFrame::FistedOutstretchedArm);
    } else {
        boss.velocity *= 0.8;
        boss.dash_afterimage *= 0.85;
    }
    boss.rotation = lerp(boss.rotation, (boss.velocity.x * 0.0015).clamp(-0.4, 0.4), 0.2);
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use crate::components::boss::BossState;
    use crate::effects::SoundCue;

    #[test]
    fn dashes_the_configured_number_of_times_then_resets() {
        let mut peer = fight_in(BossState::SequentialDashes);
        let tuning = peer.fight.tuning.sequential_dashes.clone();
        let total = tuning.cycle_time() * tuning.dash_count;
        for _ in 0..total - 1 {
            peer.step();
            assert_eq!(peer.state(), BossState::SequentialDashes);
            if peer.machine.view().wrapped(tuning.cycle_time()) == tuning.redirect_time + 5 {
                let speed = peer.fight.boss.velocity.length();
                assert!((speed - tuning.dash_speed).abs() < 1e-3, "dash speed {speed}");
            }
        }
        assert_eq!(peer.fight.boss.scratch.peek_dashes().dashes_done, tuning.dash_count);

        peer.step();
        assert_eq!(peer.state(), BossState::ResetCycle);
        let log = peer.fight.effects.as_log().unwrap();
        assert_eq!(log.count_sound(SoundCue::DashCharge), tuning.dash_count as usize);
    }
}
