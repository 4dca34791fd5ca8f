//! toybox - a real-time signal graph and the two toy instruments built on it.
//!
//! The crate is split the same way the sound is: `dsp` holds the per-sample
//! math, `ramp` the parameter automation, `graph` the node arena and the
//! control-side context that drives it, `device` the output backends, and
//! `instruments` the chord touch synth and the drum sequencer that a host UI
//! mounts and forwards events to.

pub mod config;
pub mod device;
pub mod dsp;
pub mod error;
pub mod graph; // Node arena, control context and shared effect chain
pub mod instruments;
pub mod ramp; // Smoothed parameter changes
pub mod sequencing; // Step pattern and tempo clock
pub mod voices; // Percussion synthesis recipes

pub use config::{DeviceConfig, GraphSettings, SequencerSettings, SynthSettings};
pub use error::AudioError;
pub use instruments::{ChordTouchSynth, DrumSequencer};

/// Frames rendered per graph quantum. The device clock advances in these steps.
pub const RENDER_QUANTUM: usize = 128;
pub(crate) const MIN_TIME: f32 = 1.0 / 48_000.0;
