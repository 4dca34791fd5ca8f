use std::time::{Duration, Instant};

use crate::config::clamp_bpm;

/// Steps in one pattern (one bar of sixteenths).
pub const STEPS: usize = 16;
/// Sixteenth-note resolution.
pub const STEPS_PER_BEAT: u32 = 4;
/// Ticks a stalled host may catch up on before the timer resynchronises.
pub const MAX_CATCH_UP_TICKS: usize = 4;

/// Milliseconds between steps: `(60000 / bpm) / 4`.
pub fn tick_interval_ms(bpm: u32) -> f64 {
    60_000.0 / bpm.max(1) as f64 / STEPS_PER_BEAT as f64
}

pub fn tick_interval(bpm: u32) -> Duration {
    Duration::from_secs_f64(tick_interval_ms(bpm) / 1_000.0)
}

/// Tempo, playhead and transport state of the sequencer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequencerClock {
    bpm: u32,
    current_step: usize,
    running: bool,
}

impl SequencerClock {
    pub fn new(bpm: u32) -> Self {
        Self {
            bpm: clamp_bpm(bpm),
            current_step: 0,
            running: false,
        }
    }

    pub fn bpm(&self) -> u32 {
        self.bpm
    }

    /// Store a clamped tempo and return it.
    pub fn set_bpm(&mut self, bpm: u32) -> u32 {
        self.bpm = clamp_bpm(bpm);
        self.bpm
    }

    pub fn current_step(&self) -> usize {
        self.current_step
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn set_running(&mut self, running: bool) {
        self.running = running;
    }

    pub fn interval(&self) -> Duration {
        tick_interval(self.bpm)
    }

    /// Move the playhead one step, wrapping at the end of the bar.
    pub fn advance(&mut self) -> usize {
        self.current_step = (self.current_step + 1) % STEPS;
        self.current_step
    }
}

/// Periodic deadline tracker polled from the host loop.
///
/// Deadlines advance by whole intervals from the armed start, so ticks do not
/// drift with the host's frame timing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepTimer {
    interval: Duration,
    next_due: Instant,
}

impl StepTimer {
    /// Arm a timer whose first tick is one interval after `now`.
    pub fn start(interval: Duration, now: Instant) -> Self {
        let interval = interval.max(Duration::from_millis(1));
        Self {
            interval,
            next_due: now + interval,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn next_due(&self) -> Instant {
        self.next_due
    }

    /// Cancel the running period and restart at `interval` from `now`.
    pub fn reconfigure(&mut self, interval: Duration, now: Instant) {
        *self = Self::start(interval, now);
    }

    /// Number of ticks due at `now`, consuming them. After a stall longer
    /// than [`MAX_CATCH_UP_TICKS`] intervals only that many are reported and
    /// the schedule restarts from `now`.
    pub fn due_ticks(&mut self, now: Instant) -> usize {
        let mut ticks = 0;
        while self.next_due <= now {
            ticks += 1;
            self.next_due += self.interval;
            if ticks == MAX_CATCH_UP_TICKS && self.next_due <= now {
                self.next_due = now + self.interval;
                break;
            }
        }
        ticks
    }
}
