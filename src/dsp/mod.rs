//! Low-level DSP primitives used by the graph nodes.
//!
//! These components know nothing about scheduling or the node arena; they
//! are plain sample-in, sample-out math so the graph layer can layer timing
//! and routing on top.

/// Convolution with long impulse responses.
pub mod convolver;
/// Time-domain delay line with fractional reads.
pub mod delay;
/// Synthetic impulse responses and the noise that builds them.
pub mod impulse;
/// Waveform shapes and the phase accumulator that plays them.
pub mod oscillator;

pub use impulse::ImpulseResponse;
pub use oscillator::Waveform;
