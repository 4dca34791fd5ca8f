use std::{f32::consts::TAU, fmt, str::FromStr};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/*
Oscillator Waveforms
====================

Sine: a single frequency with no harmonics. Smooth and hollow.

Square: odd harmonics only, falling off as 1/n. Woody, hollow, punchy.

Sawtooth: every harmonic, falling off as 1/n. Bright and buzzy.

Triangle: odd harmonics falling off as 1/n², so it sits between sine and
square. Soft.

Square and sawtooth jump instantly once per cycle. Sampled naively that jump
aliases badly at high pitches (the 10 kHz hi-hat is the worst case), so both
get a two-sample PolyBLEP correction around each discontinuity:

      naive saw            corrected saw
        /|  /|               /|  /|
       / | / |              / ( / (      <- jump rounded over ~2 samples
      /  |/  |             /  (/  (

Triangle has no jump, only a corner, so the naive shape is left alone.
*/

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Waveform {
    #[default]
    Sine,
    Square,
    Sawtooth,
    Triangle,
}

impl Waveform {
    pub const ALL: [Waveform; 4] = [
        Waveform::Sine,
        Waveform::Square,
        Waveform::Sawtooth,
        Waveform::Triangle,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Waveform::Sine => "sine",
            Waveform::Square => "square",
            Waveform::Sawtooth => "sawtooth",
            Waveform::Triangle => "triangle",
        }
    }

    /// The next waveform in selector order, wrapping around.
    pub fn next(self) -> Self {
        let index = Self::ALL.iter().position(|&w| w == self).unwrap_or(0);
        Self::ALL[(index + 1) % Self::ALL.len()]
    }
}

impl fmt::Display for Waveform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Waveform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|w| w.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown waveform '{s}' (expected sine, square, sawtooth or triangle)"))
    }
}

/// Phase-accumulating oscillator. Frequency is supplied per sample so it can
/// follow an automation curve without the oscillator knowing about it.
#[derive(Debug, Clone)]
pub struct PhaseOscillator {
    waveform: Waveform,
    phase: f32,
}

impl PhaseOscillator {
    pub fn new(waveform: Waveform) -> Self {
        Self { waveform, phase: 0.0 }
    }

    pub fn waveform(&self) -> Waveform {
        self.waveform
    }

    /// Switch shape without resetting phase, so the cycle continues.
    pub fn set_waveform(&mut self, waveform: Waveform) {
        self.waveform = waveform;
    }

    pub fn phase(&self) -> f32 {
        self.phase
    }

    pub fn reset(&mut self) {
        self.phase = 0.0;
    }

    /// Produce one sample at `frequency` Hz and advance the phase.
    #[inline]
    pub fn next_sample(&mut self, frequency: f32, sample_rate: f32) -> f32 {
        // Negative or super-Nyquist requests are pinned to the usable band
        let dt = (frequency / sample_rate).clamp(0.0, 0.5);
        let phase = self.phase;

        let sample = match self.waveform {
            Waveform::Sine => (TAU * phase).sin(),
            Waveform::Sawtooth => (2.0 * phase - 1.0) - poly_blep(phase, dt),
            Waveform::Square => {
                let naive = if phase < 0.5 { 1.0 } else { -1.0 };
                naive + poly_blep(phase, dt) - poly_blep((phase + 0.5).fract(), dt)
            }
            Waveform::Triangle => 1.0 - 4.0 * (phase - 0.5).abs(),
        };

        self.phase += dt;
        if self.phase >= 1.0 {
            self.phase -= 1.0;
        }

        sample
    }

    /// Fill `out` at a constant frequency.
    pub fn render(&mut self, out: &mut [f32], frequency: f32, sample_rate: f32) {
        for sample in out.iter_mut() {
            *sample = self.next_sample(frequency, sample_rate);
        }
    }
}

/// Two-sample polynomial band-limited step residual.
#[inline]
fn poly_blep(t: f32, dt: f32) -> f32 {
    if dt <= 0.0 {
        return 0.0;
    }
    if t < dt {
        let n = t / dt;
        2.0 * n - n * n - 1.0
    } else if t > 1.0 - dt {
        let n = (t - 1.0) / dt;
        n * n + 2.0 * n + 1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: f32 = 48_000.0;

    #[test]
    fn sine_follows_the_closed_form() {
        let mut osc = PhaseOscillator::new(Waveform::Sine);
        let mut buffer = vec![0.0f32; 64];
        osc.render(&mut buffer, 440.0, SAMPLE_RATE);

        let n = 12;
        let expected = (TAU * 440.0 * n as f32 / SAMPLE_RATE).sin();
        assert!((buffer[n] - expected).abs() < 1e-4, "expected {expected}, got {}", buffer[n]);
    }

    #[test]
    fn every_waveform_stays_bounded() {
        for waveform in Waveform::ALL {
            let mut osc = PhaseOscillator::new(waveform);
            let mut buffer = vec![0.0f32; 4096];
            osc.render(&mut buffer, 10_000.0, SAMPLE_RATE);
            for &sample in &buffer {
                assert!(sample.is_finite());
                assert!(sample.abs() <= 1.05, "{waveform} produced {sample}");
            }
        }
    }

    #[test]
    fn changing_waveform_keeps_phase() {
        let mut osc = PhaseOscillator::new(Waveform::Sine);
        let mut buffer = vec![0.0f32; 100];
        osc.render(&mut buffer, 100.0, SAMPLE_RATE);
        let phase = osc.phase();

        osc.set_waveform(Waveform::Triangle);
        assert_eq!(osc.phase(), phase);
        assert_eq!(osc.waveform(), Waveform::Triangle);
    }

    #[test]
    fn parses_names_case_insensitively() {
        assert_eq!("Sawtooth".parse::<Waveform>(), Ok(Waveform::Sawtooth));
        assert!("organ".parse::<Waveform>().is_err());
        assert_eq!(Waveform::Triangle.next(), Waveform::Sine);
    }
}
