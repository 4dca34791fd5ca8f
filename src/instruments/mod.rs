//! The two toy instruments a host mounts and forwards UI events to.

pub mod chord_synth;
pub mod chords;
pub mod drum_sequencer;
pub mod pointer;

pub use chord_synth::ChordTouchSynth;
pub use chords::{base_frequency, chord_frequencies, chord_index, Chord, CHORDS};
pub use drum_sequencer::DrumSequencer;
pub use pointer::{Hsl, PointerEvent, PointerIndicator, PointerPosition, Surface, TouchPoint};
