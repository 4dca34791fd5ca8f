//! Closed hi-hat.
//!
//! A 10 kHz sawtooth that dies in a tenth of a second. At that pitch only a
//! few harmonics fit under Nyquist, so it reads as a bright tick.

use super::{Recipe, Sweep};
use crate::dsp::oscillator::Waveform;

pub const HIHAT: Recipe = Recipe {
    waveform: Waveform::Sawtooth,
    frequency: Sweep::constant(10_000.0),
    gain: Sweep::exponential(0.3, 0.1),
};
