//! Settings for the device, the shared effect chain and both instruments.
//!
//! Every setter clamps instead of rejecting: an out-of-range slider value is
//! logged and pulled back into range, never surfaced as a failure.

use std::ops::RangeInclusive;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{dsp::oscillator::Waveform, error::AudioError};

/// Accepted tempo range in beats per minute.
pub const BPM_RANGE: RangeInclusive<u32> = 60..=180;
/// Longest delay the shared delay line can be set to, in seconds.
pub const MAX_DELAY_TIME: f32 = 5.0;

/// Check that `value` lies in `min..=max` (and is a number at all).
pub fn validate_range(name: &'static str, value: f64, min: f64, max: f64) -> Result<f64, AudioError> {
    if value.is_finite() && (min..=max).contains(&value) {
        Ok(value)
    } else {
        Err(AudioError::InvalidParameterRange {
            name,
            value,
            min,
            max,
        })
    }
}

/// Clamp a live-performance input into range, logging when it had to.
pub fn clamp_to_range(name: &'static str, value: f32, min: f32, max: f32) -> f32 {
    match validate_range(name, value as f64, min as f64, max as f64) {
        Ok(value) => value as f32,
        Err(err) => {
            warn!(%err, "clamping out-of-range input");
            if value.is_nan() {
                min
            } else {
                value.clamp(min, max)
            }
        }
    }
}

/// Clamp a tempo into [`BPM_RANGE`].
pub fn clamp_bpm(bpm: u32) -> u32 {
    let (min, max) = (*BPM_RANGE.start(), *BPM_RANGE.end());
    match validate_range("bpm", bpm as f64, min as f64, max as f64) {
        Ok(_) => bpm,
        Err(err) => {
            warn!(%err, "clamping out-of-range input");
            bpm.clamp(min, max)
        }
    }
}

/// Device-level settings shared by both instruments.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceConfig {
    /// Capacity of the control → audio command ring.
    pub command_capacity: usize,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            command_capacity: 1024,
        }
    }
}

impl DeviceConfig {
    pub fn command_capacity(mut self, capacity: usize) -> Self {
        self.command_capacity = capacity.max(16);
        self
    }
}

/// Shape of the gain → delay → convolution chain.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct GraphSettings {
    pub max_delay_time: f32,
    pub delay_time: f32,
    pub wet_mix: f32,
    /// Length of the generated noise impulse, in seconds.
    pub impulse_duration: f32,
    /// Exponent of the impulse decay envelope; 1.0 is a straight line.
    pub impulse_decay_power: f32,
}

impl Default for GraphSettings {
    fn default() -> Self {
        Self {
            max_delay_time: MAX_DELAY_TIME,
            delay_time: 0.3,
            wet_mix: 0.3,
            impulse_duration: 0.5,
            impulse_decay_power: 1.0,
        }
    }
}

impl GraphSettings {
    pub fn delay_time(mut self, seconds: f32) -> Self {
        self.delay_time = clamp_to_range("delay_time", seconds, 0.0, self.max_delay_time);
        self
    }

    pub fn wet_mix(mut self, amount: f32) -> Self {
        self.wet_mix = clamp_to_range("wet_mix", amount, 0.0, 1.0);
        self
    }

    pub fn impulse_decay_power(mut self, power: f32) -> Self {
        self.impulse_decay_power = clamp_to_range("impulse_decay_power", power, 0.1, 8.0);
        self
    }
}

/// Host-facing controls of the chord touch synth.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct SynthSettings {
    pub waveform: Waveform,
    pub reverb_amount: f32,
    /// Delay slider, 0..1 seconds.
    pub delay_time: f32,
}

impl Default for SynthSettings {
    fn default() -> Self {
        Self {
            waveform: Waveform::Sine,
            reverb_amount: 0.3,
            delay_time: 0.3,
        }
    }
}

impl SynthSettings {
    pub fn waveform(mut self, waveform: Waveform) -> Self {
        self.waveform = waveform;
        self
    }

    pub fn reverb_amount(mut self, amount: f32) -> Self {
        self.reverb_amount = clamp_to_range("reverb_amount", amount, 0.0, 1.0);
        self
    }

    pub fn delay_time(mut self, seconds: f32) -> Self {
        self.delay_time = clamp_to_range("delay_time", seconds, 0.0, 1.0);
        self
    }

    /// Effect chain settings derived from the synth controls.
    pub fn graph_settings(&self) -> GraphSettings {
        GraphSettings::default()
            .delay_time(self.delay_time)
            .wet_mix(self.reverb_amount)
    }
}

/// Host-facing controls of the drum sequencer.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct SequencerSettings {
    pub bpm: u32,
}

impl Default for SequencerSettings {
    fn default() -> Self {
        Self { bpm: 120 }
    }
}

impl SequencerSettings {
    pub fn bpm(mut self, bpm: u32) -> Self {
        self.bpm = clamp_bpm(bpm);
        self
    }
}
