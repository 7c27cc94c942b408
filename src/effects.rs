//! Fire-and-forget visual and audio requests.
//!
//! The fight core never reads anything back from these calls, so a headless
//! peer can drop them with [`NullEffects`]. [`EffectLog`] keeps them around
//! for tests and for comparing two peers.

use glam::Vec2;
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum ParticleKind {
    /// Light dust trailing a teleport.
    TeleportLight,
    /// Screen-space distortion ring when a burst goes off.
    Distortion,
    /// Bloom flash at the phase 2 reveal.
    RevealFlash,
    /// Soft sparkle drifting off the boss while it fades.
    FadeSparkle,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum SoundCue {
    Awaken,
    DashCharge,
    ButterflyBurst,
    StarBurst,
    StarBurstEcho,
    PetalSummon,
    TerraprismaSummon,
    TerraprismaRelease,
    TerraprismaSlash,
    PunchWind,
    PhaseTransitionStart,
    PhaseTransitionReveal,
    Deathray,
    Death,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub enum Effect {
    Particle {
        kind: ParticleKind,
        position: Vec2,
        velocity: Vec2,
    },
    Sound {
        cue: SoundCue,
        position: Option<Vec2>,
    },
    ScreenShake {
        origin: Option<Vec2>,
        strength: f32,
    },
}

pub trait EffectSink {
    fn particle(&mut self, kind: ParticleKind, position: Vec2, velocity: Vec2);

    /// `None` plays the cue unpositioned.
    fn sound(&mut self, cue: SoundCue, position: Option<Vec2>);

    fn screen_shake(&mut self, origin: Option<Vec2>, strength: f32);

    /// Called once per simulation tick before the machine runs.
    fn begin_tick(&mut self, _tick: u64) {}

    /// Recorded history, for sinks that keep one.
    fn as_log(&self) -> Option<&EffectLog> {
        None
    }
}

/// Discards every request.
#[derive(Debug, Default)]
pub struct NullEffects;

impl EffectSink for NullEffects {
    fn particle(&mut self, _: ParticleKind, _: Vec2, _: Vec2) {}
    fn sound(&mut self, _: SoundCue, _: Option<Vec2>) {}
    fn screen_shake(&mut self, _: Option<Vec2>, _: f32) {}
}

/// Records every request with the tick it was made on.
#[derive(Debug, Default, Clone)]
pub struct EffectLog {
    tick: u64,
    pub entries: Vec<(u64, Effect)>,
}

impl EffectLog {
    pub fn sounds(&self) -> impl Iterator<Item = (u64, SoundCue)> + '_ {
        self.entries.iter().filter_map(|(tick, e)| match e {
            Effect::Sound { cue, .. } => Some((*tick, *cue)),
            _ => None,
        })
    }

    pub fn count_sound(&self, cue: SoundCue) -> usize {
        self.sounds().filter(|(_, c)| *c == cue).count()
    }

    pub fn count_particles(&self, kind: ParticleKind) -> usize {
        self.entries
            .iter()
            .filter(|(_, e)| matches!(e, Effect::Particle { kind: k, .. } if *k == kind))
            .count()
    }
}

impl EffectSink for EffectLog {
    fn particle(&mut self, kind: ParticleKind, position: Vec2, velocity: Vec2) {
        self.entries.push((self.tick, Effect::Particle { kind, position, velocity }));
    }

    fn sound(&mut self, cue: SoundCue, position: Option<Vec2>) {
        self.entries.push((self.tick, Effect::Sound { cue, position }));
    }

    fn screen_shake(&mut self, origin: Option<Vec2>, strength: f32) {
        self.entries.push((self.tick, Effect::ScreenShake { origin, strength }));
    }

    fn begin_tick(&mut self, tick: u64) {
        self.tick = tick;
    }

    fn as_log(&self) -> Option<&EffectLog> {
        Some(self)
    }
}
