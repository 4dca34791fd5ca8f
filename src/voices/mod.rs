//! Percussion voices for the step sequencer.
//!
//! Each voice is a recipe: a waveform plus a frequency and a gain sweep. A
//! trigger builds a fresh oscillator and gain, wires them straight to the
//! output, and lets the renderer dispose of both once the burst is over.
//!
//! # Example
//!
//! ```ignore
//! use toybox::voices::{trigger, Voice};
//!
//! let now = ctx.current_time();
//! trigger(&mut ctx, Voice::Kick, now);
//! ```

mod hihat;
mod kick;
mod snare;

use std::{fmt, str::FromStr};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::trace;

pub use hihat::HIHAT;
pub use kick::KICK;
pub use snare::SNARE;

use crate::{
    dsp::oscillator::Waveform,
    graph::{AudioContext, Endpoint, GainHandle, OscillatorHandle},
    ramp::ParameterRamp,
};

/// Every burst plays for this long, in seconds, then its oscillator stops.
pub const BURST_LENGTH: f64 = 0.5;
/// Where decaying sweeps end. Exponential curves cannot reach zero.
pub const NEAR_ZERO: f32 = 0.01;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Voice {
    Kick,
    Snare,
    Hihat,
}

impl Voice {
    pub const ALL: [Voice; 3] = [Voice::Kick, Voice::Snare, Voice::Hihat];
    pub const COUNT: usize = 3;

    /// Row of this voice in a pattern.
    pub fn index(self) -> usize {
        match self {
            Voice::Kick => 0,
            Voice::Snare => 1,
            Voice::Hihat => 2,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Voice::Kick => "kick",
            Voice::Snare => "snare",
            Voice::Hihat => "hihat",
        }
    }

    pub fn recipe(self) -> &'static Recipe {
        match self {
            Voice::Kick => &KICK,
            Voice::Snare => &SNARE,
            Voice::Hihat => &HIHAT,
        }
    }
}

impl fmt::Display for Voice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Voice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Voice::ALL
            .into_iter()
            .find(|voice| voice.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown voice '{s}'"))
    }
}

/// A parameter's course over one burst.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Sweep {
    Constant(f32),
    /// Exponential fall from `from` to [`NEAR_ZERO`] over `duration` seconds.
    Exponential { from: f32, duration: f64 },
}

impl Sweep {
    pub const fn constant(value: f32) -> Self {
        Sweep::Constant(value)
    }

    pub const fn exponential(from: f32, duration: f64) -> Self {
        Sweep::Exponential { from, duration }
    }

    pub fn initial(&self) -> f32 {
        match *self {
            Sweep::Constant(value) => value,
            Sweep::Exponential { from, .. } => from,
        }
    }

    /// Value `elapsed` seconds into the burst.
    pub fn value_at(&self, elapsed: f64) -> f32 {
        match *self {
            Sweep::Constant(value) => value,
            Sweep::Exponential { from, duration } => {
                let progress = (elapsed / duration).clamp(0.0, 1.0) as f32;
                from * (NEAR_ZERO / from).powf(progress)
            }
        }
    }

    fn schedule(&self, ctx: &mut AudioContext, param: crate::graph::ParamRef, at: f64) {
        match *self {
            Sweep::Constant(value) => ctx.set_immediate(param, value, at),
            Sweep::Exponential { from, duration } => {
                ctx.set_immediate(param, from, at);
                ctx.exponential_ramp(param, NEAR_ZERO, at, duration);
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Recipe {
    pub waveform: Waveform,
    pub frequency: Sweep,
    pub gain: Sweep,
}

/// The nodes of one triggered burst. Already released; the handles are only
/// useful for inspection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Burst {
    pub oscillator: OscillatorHandle,
    pub gain: GainHandle,
    pub stop_at: f64,
}

/// Play `voice` starting at device time `at`.
pub fn trigger(ctx: &mut AudioContext, voice: Voice, at: f64) -> Burst {
    let recipe = voice.recipe();
    let at = at.max(ctx.current_time());

    let oscillator = ctx.create_oscillator(recipe.waveform, recipe.frequency.initial());
    let gain = ctx.create_gain(recipe.gain.initial());
    ctx.connect(oscillator, gain);
    ctx.connect(gain, Endpoint::Destination);

    recipe.frequency.schedule(ctx, oscillator.frequency(), at);
    recipe.gain.schedule(ctx, gain.gain(), at);

    let stop_at = at + BURST_LENGTH;
    ctx.start(oscillator, at);
    ctx.stop(oscillator, stop_at);
    ctx.release(oscillator);
    ctx.release(gain);

    trace!(%voice, at, "voice triggered");
    Burst {
        oscillator,
        gain,
        stop_at,
    }
}
