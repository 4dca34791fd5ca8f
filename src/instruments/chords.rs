/*
Chord Pad Mapping
=================

The touch surface is a two-axis control:

    y ▲
    1 ┤ sus2        ─┐
      │ diminished   │  five horizontal bands,
      │ augmented    │  one chord each
      │ minor        │
    0 ┤ major       ─┘
      └──────────────────────► x
      0 (100 Hz)          1 (1100 Hz)

x sets the root linearly between 100 Hz and 1100 Hz. y picks the chord. A
chord is three frequency ratios against the root; they are approximations
of just intervals rather than equal temperament, which is part of the
pad's soft sound.
*/

/// Frequency ratios of a three-note chord, root first.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Chord(pub [f32; 3]);

impl Chord {
    pub fn ratios(&self) -> [f32; 3] {
        self.0
    }

    pub fn frequencies(&self, root: f32) -> [f32; 3] {
        self.0.map(|ratio| root * ratio)
    }
}

pub const CHORDS: [Chord; 5] = [
    Chord([1.0, 1.25, 1.5]),   // major
    Chord([1.0, 1.2, 1.4]),    // minor
    Chord([1.0, 1.26, 1.41]),  // augmented
    Chord([1.0, 1.189, 1.498]), // diminished
    Chord([1.0, 1.15, 1.34]),  // sus2
];

pub const CHORD_NAMES: [&str; 5] = ["major", "minor", "augmented", "diminished", "sus2"];

pub const MIN_BASE_FREQUENCY: f32 = 100.0;
pub const BASE_FREQUENCY_SPAN: f32 = 1000.0;

/// Root frequency for a horizontal position in [0, 1].
pub fn base_frequency(x: f32) -> f32 {
    MIN_BASE_FREQUENCY + x * BASE_FREQUENCY_SPAN
}

/// Chord band for a vertical position in [0, 1]. y = 1 lands in the top band.
pub fn chord_index(y: f32) -> usize {
    let band = (y * CHORDS.len() as f32).floor();
    if band.is_nan() {
        return 0;
    }
    (band.max(0.0) as usize).min(CHORDS.len() - 1)
}

/// The three oscillator targets for a pad position.
pub fn chord_frequencies(x: f32, y: f32) -> [f32; 3] {
    CHORDS[chord_index(y)].frequencies(base_frequency(x))
}
