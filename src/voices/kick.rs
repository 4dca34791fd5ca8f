//! Kick drum.
//!
//! A sine with a pitch envelope: it starts at 150 Hz and falls exponentially
//! almost to nothing over half a second, while the level falls with it. The
//! fast early drop is the "punch", the slow tail the "boom".

use super::{Recipe, Sweep};
use crate::dsp::oscillator::Waveform;

pub const KICK: Recipe = Recipe {
    waveform: Waveform::Sine,
    frequency: Sweep::exponential(150.0, 0.5),
    gain: Sweep::exponential(1.0, 0.5),
};
