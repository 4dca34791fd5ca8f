//! Snare drum.
//!
//! A short triangle burst at a fixed 100 Hz. The triangle's weak odd
//! harmonics give it some edge over a plain sine without turning harsh.

use super::{Recipe, Sweep};
use crate::dsp::oscillator::Waveform;

pub const SNARE: Recipe = Recipe {
    waveform: Waveform::Triangle,
    frequency: Sweep::constant(100.0),
    gain: Sweep::exponential(0.5, 0.2),
};
