//! Smoothed parameter changes.
//!
//! Every continuous parameter in the graph (oscillator frequency, gain level,
//! delay time) is driven through an automation timeline instead of being
//! written directly. Writing a new frequency straight into a running
//! oscillator produces a step in the waveform's slope, and a step in a gain
//! produces a step in the output itself; both are heard as clicks.

/*
Automation Curves
=================

All curves start at their own start time from whatever value the parameter
holds at that moment (v0).

  Step            instant jump.

                  v ──┐
                      └────── target

  Linear          straight line to `target`, reached after `duration`.

                  v ──╲
                       ╲_____ target

  Exponential     constant-ratio glide to `target` over `duration`. Sounds
                  even to the ear for pitch and loudness, but cannot touch
                  zero, so both ends are floored at MIN_EXPONENTIAL_VALUE.

  Approach        v(t) = target + (v0 - target) · e^(-(t - start)/τ)
                  Never arrives in theory. The timeline keeps evaluating
                  it until the remaining distance is below SETTLE_TOLERANCE
                  (relative to the target, floored at 1.0), and only then
                  snaps, so the final step is inaudible.

                  v ──╮
                      ╰──___ target

A later-starting curve pre-empts whatever is in flight the moment it begins:
the new curve picks up from the current value. Nothing queues behind a slow
glide, so a burst of pointer moves always chases the most recent position.
*/

pub mod timeline;

pub use timeline::ParamTimeline;

use tracing::{debug, warn};

use crate::{error::AudioError, graph::node::ParamRef, MIN_TIME};

/// Smallest magnitude an exponential curve will pass through.
pub const MIN_EXPONENTIAL_VALUE: f32 = 1e-4;
/// Number of time constants after which an approach is within 1% of its target.
pub const SETTLE_TIME_CONSTANTS: f64 = 5.0;
/// Remaining distance, relative to `max(|target|, 1)`, at which an approach
/// snaps onto its target.
pub const SETTLE_TOLERANCE: f32 = 1e-4;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Curve {
    Step(f32),
    Linear { target: f32, duration: f64 },
    Exponential { target: f32, duration: f64 },
    Approach { target: f32, time_constant: f64 },
}

impl Curve {
    /// The value this curve ends at.
    pub fn target(&self) -> f32 {
        match *self {
            Curve::Step(value) => value,
            Curve::Linear { target, .. }
            | Curve::Exponential { target, .. }
            | Curve::Approach { target, .. } => target,
        }
    }

    /// Seconds after the start at which the curve has audibly arrived. An
    /// approach keeps running past this until it is within
    /// [`SETTLE_TOLERANCE`].
    pub fn settle_time(&self) -> f64 {
        match *self {
            Curve::Step(_) => 0.0,
            Curve::Linear { duration, .. } | Curve::Exponential { duration, .. } => duration,
            Curve::Approach { time_constant, .. } => time_constant * SETTLE_TIME_CONSTANTS,
        }
    }
}

/// A curve anchored at a device time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Automation {
    pub start: f64,
    pub curve: Curve,
}

impl Automation {
    pub fn new(start: f64, curve: Curve) -> Self {
        Self { start, curve }
    }

    pub fn end(&self) -> f64 {
        self.start + self.curve.settle_time()
    }
}

/// Check a requested start time against the device clock.
pub fn schedule_time(requested: f64, now: f64) -> Result<f64, AudioError> {
    if requested >= now {
        Ok(requested)
    } else {
        Err(AudioError::StaleScheduleTime { requested, now })
    }
}

/// Control-side access to parameter automation.
///
/// Implementors supply the device clock and a way to deliver an automation;
/// the provided methods take care of clamping so that callers on a laggy UI
/// thread can pass the time they *meant* and still get a sensible result.
pub trait ParameterRamp {
    /// Device time in seconds.
    fn current_time(&self) -> f64;

    /// Deliver an already-validated automation.
    fn schedule(&mut self, param: ParamRef, automation: Automation);

    /// Jump to `value` at `at_time`.
    fn set_immediate(&mut self, param: ParamRef, value: f32, at_time: f64) {
        submit(self, param, at_time, Curve::Step(value));
    }

    /// Straight line from the current value to `target` over `duration` seconds.
    fn linear_ramp(&mut self, param: ParamRef, target: f32, at_time: f64, duration: f64) {
        let duration = min_duration(duration);
        submit(self, param, at_time, Curve::Linear { target, duration });
    }

    /// Constant-ratio glide to `target` over `duration` seconds.
    fn exponential_ramp(&mut self, param: ParamRef, target: f32, at_time: f64, duration: f64) {
        let duration = min_duration(duration);
        submit(self, param, at_time, Curve::Exponential { target, duration });
    }

    /// Exponential approach toward `target` with the given time constant.
    fn approach(&mut self, param: ParamRef, target: f32, at_time: f64, time_constant: f64) {
        let time_constant = min_duration(time_constant);
        submit(self, param, at_time, Curve::Approach { target, time_constant });
    }
}

fn min_duration(seconds: f64) -> f64 {
    if seconds.is_finite() {
        seconds.max(MIN_TIME as f64)
    } else {
        MIN_TIME as f64
    }
}

fn submit<R: ParameterRamp + ?Sized>(ramp: &mut R, param: ParamRef, at_time: f64, curve: Curve) {
    if !curve.target().is_finite() {
        warn!(?param, ?curve, "dropping automation with a non-finite value");
        return;
    }

    let now = ramp.current_time();
    let start = schedule_time(at_time, now).unwrap_or_else(|err| {
        debug!(%err, ?param, "clamping automation start to now");
        now
    });
    ramp.schedule(param, Automation::new(start, curve));
}
