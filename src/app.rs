use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;

use crate::components::boss::BossState;
use crate::config::Tuning;
use crate::effects::{EffectLog, EffectSink, NullEffects};
use crate::engine::net::NetRole;
use crate::engine::time::{FrameTimer, TickAccumulator};
use crate::error::Result;
use crate::recording::Recorder;
use crate::scene::arena::{spawn_fight, ArenaSetup};
use crate::systems::boss::{FightPeer, FightTotals};
use crate::systems::target::TargetScript;

/// How the host should run the fight.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub tuning: Tuning,
    pub seed: u64,
    /// Stop after this many ticks even if the boss is still around.
    pub max_ticks: u64,
    /// Run an observer next to the authority and feed it every snapshot.
    pub with_observer: bool,
    pub record: Option<PathBuf>,
    pub damage_per_tick: i32,
    /// Pace ticks against the wall clock instead of running flat out.
    pub realtime: bool,
    /// Keep an effect log on the authority for the summary.
    pub log_effects: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            tuning: Tuning::default(),
            seed: 0,
            max_ticks: 60 * 60,
            with_observer: false,
            record: None,
            damage_per_tick: 0,
            realtime: false,
            log_effects: false,
        }
    }
}

/// End-of-run report.
#[derive(Debug, Clone, Serialize)]
pub struct FightSummary {
    pub ticks: u64,
    pub final_state: BossState,
    pub phase: u32,
    pub life: i32,
    pub despawned: bool,
    pub transitions: u32,
    pub snapshots: u32,
    pub projectile_hits: u32,
    /// Projectiles that ran out their lifetime without hitting anything.
    pub projectiles_expired: u32,
    pub damage_to_target: i64,
    pub sounds: Option<usize>,
    /// Distance between the authority's boss and the observer's at the end.
    pub observer_drift: Option<f32>,
}

/// Headless host: an authority peer, optionally an observer mirroring it.
pub struct FightApp {
    config: AppConfig,
    authority: FightPeer,
    observer: Option<FightPeer>,
    recorder: Option<Recorder>,
}

impl FightApp {
    pub fn new(config: AppConfig) -> Result<Self> {
        let script = Some(TargetScript::default());
        let effects: Box<dyn EffectSink> = if config.log_effects {
            Box::new(EffectLog::default())
        } else {
            Box::new(NullEffects)
        };
        let authority = spawn_fight(ArenaSetup {
            role: NetRole::Authority,
            effects,
            tuning: config.tuning.clone(),
            seed: config.seed,
            script,
            damage_per_tick: config.damage_per_tick,
            ..ArenaSetup::default()
        })?;
        let observer = if config.with_observer {
            Some(spawn_fight(ArenaSetup {
                role: NetRole::Observer,
                tuning: config.tuning.clone(),
                // Observers roll their own cosmetics.
                seed: config.seed.wrapping_add(1),
                script,
                damage_per_tick: config.damage_per_tick,
                ..ArenaSetup::default()
            })?)
        } else {
            None
        };
        let recorder = config.record.as_deref().map(Recorder::create).transpose()?;

        Ok(Self {
            config,
            authority,
            observer,
            recorder,
        })
    }

    pub fn authority(&self) -> &FightPeer {
        &self.authority
    }

    pub fn observer(&self) -> Option<&FightPeer> {
        self.observer.as_ref()
    }

    /// Advance both peers by one tick. Returns false once the fight is over.
    pub fn step(&mut self) -> Result<bool> {
        let outcome = self.authority.step();
        if let Some(t) = outcome.transitioned {
            tracing::debug!(tick = self.authority.tick, from = ?t.from, to = ?t.to, "transition");
        }

        if let Some(observer) = &mut self.observer {
            observer.step();
            if let Some(snapshot) = &outcome.snapshot {
                observer.apply_snapshot(snapshot);
            }
        }
        if let (Some(recorder), Some(snapshot)) = (&mut self.recorder, &outcome.snapshot) {
            recorder.record(self.authority.tick, snapshot)?;
        }

        Ok(!self.authority.is_finished() && self.authority.tick < self.config.max_ticks)
    }

    /// Run to completion and report.
    pub fn run(mut self) -> Result<FightSummary> {
        if self.config.realtime {
            let mut timer = FrameTimer::new();
            let mut accumulator = TickAccumulator::default();
            'outer: loop {
                for _ in 0..accumulator.advance(timer.tick()) {
                    if !self.step()? {
                        break 'outer;
                    }
                }
                std::thread::sleep(Duration::from_millis(1));
            }
        } else {
            while self.step()? {}
        }

        if let Some(recorder) = self.recorder.take() {
            recorder.finish()?;
        }
        Ok(self.summary())
    }

    pub fn summary(&self) -> FightSummary {
        let boss = &self.authority.fight.boss;
        let FightTotals {
            transitions,
            snapshots,
            projectile_hits,
            projectiles_expired,
            damage_to_target,
        } = self.authority.totals;
        FightSummary {
            ticks: self.authority.tick,
            final_state: self.authority.state(),
            phase: boss.phase(),
            life: boss.life,
            despawned: boss.despawned,
            transitions,
            snapshots,
            projectile_hits,
            projectiles_expired,
            damage_to_target,
            sounds: self.authority.fight.effects.as_log().map(|log| log.sounds().count()),
            observer_drift: self
                .observer
                .as_ref()
                .map(|o| o.fight.boss.center.distance(boss.center)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runs_until_the_tick_limit() {
        let app = FightApp::new(AppConfig {
            max_ticks: 300,
            log_effects: true,
            ..AppConfig::default()
        })
        .unwrap();
        let summary = app.run().unwrap();
        assert_eq!(summary.ticks, 300);
        assert!(summary.transitions >= 2);
        assert!(summary.sounds.unwrap() >= 1);
        assert!(summary.observer_drift.is_none());
    }

    #[test]
    fn observer_tracks_the_authority() {
        let mut app = FightApp::new(AppConfig {
            max_ticks: 900,
            with_observer: true,
            ..AppConfig::default()
        })
        .unwrap();
        while app.step().unwrap() {}
        let authority = app.authority();
        let observer = app.observer().unwrap();
        assert_eq!(observer.state(), authority.state());
        assert_eq!(observer.fight.boss.phase(), authority.fight.boss.phase());
    }

    #[test]
    fn heavy_damage_kills_the_boss() {
        let summary = FightApp::new(AppConfig {
            max_ticks: 20_000,
            damage_per_tick: 400,
            ..AppConfig::default()
        })
        .unwrap()
        .run()
        .unwrap();
        assert!(summary.despawned, "boss still alive: {summary:?}");
        assert_eq!(summary.final_state, BossState::Die);
        assert_eq!(summary.phase, 1);
        assert_eq!(summary.life, 0);
    }
}
