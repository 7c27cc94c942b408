use empress::components::boss::BossState;
use empress::fsm::StateId;
use empress::scene::arena::{spawn_fight, ArenaSetup};
use glam::Vec2;
use proptest::prelude::*;

#[derive(Clone, Debug)]
enum Event {
    Quiet,
    Damage(i32),
    Teleport(f32, f32, u32),
}

fn event() -> impl Strategy<Value = Event> {
    prop_oneof![
        6 => Just(Event::Quiet),
        3 => (1..4_000i32).prop_map(Event::Damage),
        1 => (-800.0f32..800.0, -800.0f32..800.0, 1..60u32).prop_map(|(x, y, d)| Event::Teleport(x, y, d)),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn timer_state_and_phase_invariants_hold(seed in any::<u64>(), events in prop::collection::vec(event(), 50..600)) {
        let mut peer = spawn_fight(ArenaSetup { seed, ..ArenaSetup::default() }).unwrap();
        let mut last_timer = peer.machine.timer();
        let mut last_phase = peer.fight.boss.phase();

        for event in events {
            match event {
                Event::Quiet => {}
                Event::Damage(amount) => {
                    peer.fight.boss.apply_damage(amount);
                }
                Event::Teleport(x, y, duration) => peer.fight.request_teleport(Vec2::new(x, y), Some(duration)),
            }

            let outcome = peer.step();
            match outcome.transitioned {
                Some(t) => {
                    prop_assert_eq!(t.to, peer.state());
                    prop_assert_ne!(t.from, t.to);
                    prop_assert_eq!(peer.machine.timer(), 0);
                }
                None => prop_assert_eq!(peer.machine.timer(), last_timer + 1),
            }
            prop_assert!(BossState::all().contains(&peer.state()));

            let phase = peer.fight.boss.phase();
            prop_assert!(phase >= last_phase);
            prop_assert!(phase <= 1);
            prop_assert!(peer.fight.boss.life >= 0);

            last_timer = peer.machine.timer();
            last_phase = phase;
            if peer.is_finished() {
                break;
            }
        }
    }
}
