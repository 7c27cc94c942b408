use std::time::Instant;

use crate::config::TICKS_PER_SECOND;

/// Fixed simulation step in seconds.
pub const TICK_DT: f32 = 1.0 / TICKS_PER_SECOND as f32;

/// Longest wall-clock gap fed to the accumulator. A stall beyond this (a
/// debugger pause, a suspended laptop) is dropped rather than replayed.
pub const MAX_FRAME_DT: f32 = 0.25;

/// Measures wall-clock time between host frames. Only the host loop reads
/// it; the simulation itself never sees real time.
#[derive(Debug)]
pub struct FrameTimer {
    last: Instant,
}

impl FrameTimer {
    pub fn new() -> Self {
        Self { last: Instant::now() }
    }

    /// Seconds since the previous call, capped at [`MAX_FRAME_DT`].
    pub fn tick(&mut self) -> f32 {
        self.tick_at(Instant::now())
    }

    fn tick_at(&mut self, now: Instant) -> f32 {
        let dt = now.saturating_duration_since(self.last).as_secs_f32();
        self.last = now;
        dt.min(MAX_FRAME_DT)
    }
}

impl Default for FrameTimer {
    fn default() -> Self {
        Self::new()
    }
}

/// Converts variable frame deltas into a whole number of fixed ticks.
#[derive(Debug, Default)]
pub struct TickAccumulator {
    accum: f32,
}

impl TickAccumulator {
    /// Add `dt` seconds and return how many fixed ticks are now due.
    pub fn advance(&mut self, dt: f32) -> u32 {
        self.accum += dt;
        let mut due = 0;
        while self.accum >= TICK_DT {
            self.accum -= TICK_DT;
            due += 1;
        }
        due
    }
}
