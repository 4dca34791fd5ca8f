use std::time::{SystemTime, UNIX_EPOCH};

/// Level a normalized impulse is calibrated to (-58 dB).
const GAIN_CALIBRATION: f32 = 0.00125;
const GAIN_CALIBRATION_SAMPLE_RATE: f32 = 44_100.0;
const MIN_POWER: f32 = 0.000125;

/// A two-channel impulse response. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct ImpulseResponse {
    channels: [Vec<f32>; 2],
    sample_rate: f32,
}

impl ImpulseResponse {
    /// Synthesize a decaying noise burst: independent white noise per channel
    /// shaped by `(1 - i/n)^decay_power`.
    pub fn noise(sample_rate: f32, duration: f32, decay_power: f32, seed: u32) -> Self {
        let length = (sample_rate * duration.max(0.0)) as usize;
        let mut noise = NoiseSource::new(seed);

        let mut channel = || -> Vec<f32> {
            (0..length)
                .map(|i| {
                    let envelope = (1.0 - i as f32 / length as f32).powf(decay_power);
                    noise.next_sample() * envelope
                })
                .collect()
        };

        let left = channel();
        let right = channel();
        Self {
            channels: [left, right],
            sample_rate,
        }
    }

    pub fn from_channels(left: Vec<f32>, right: Vec<f32>, sample_rate: f32) -> Self {
        Self {
            channels: [left, right],
            sample_rate,
        }
    }

    pub fn channel(&self, index: usize) -> &[f32] {
        &self.channels[index.min(1)]
    }

    /// Frames per channel.
    pub fn len(&self) -> usize {
        self.channels[0].len().max(self.channels[1].len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn duration(&self) -> f32 {
        self.len() as f32 / self.sample_rate
    }

    /// Equal-power scale applied by the convolver so that a loud noise
    /// impulse and a quiet one come out at a similar level.
    pub fn normalization_scale(&self) -> f32 {
        let frames = self.len();
        if frames == 0 {
            return 1.0;
        }

        let energy: f32 = self
            .channels
            .iter()
            .flat_map(|c| c.iter())
            .map(|s| s * s)
            .sum();
        let mut power = (energy / (2 * frames) as f32).sqrt();
        if !power.is_finite() || power < MIN_POWER {
            power = MIN_POWER;
        }

        GAIN_CALIBRATION / power * (GAIN_CALIBRATION_SAMPLE_RATE / self.sample_rate)
    }
}

/// Xorshift32 white noise in [-1, 1).
pub struct NoiseSource {
    state: u32,
}

impl NoiseSource {
    pub fn new(seed: u32) -> Self {
        // Xorshift never leaves zero
        Self {
            state: if seed == 0 { 0x9E37_79B9 } else { seed },
        }
    }

    #[inline]
    pub fn next_sample(&mut self) -> f32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        (x as i32 as f32) / (i32::MAX as f32)
    }
}

/// A seed that differs between graph constructions.
pub fn fresh_seed() -> u32 {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos() ^ (d.as_secs() as u32))
        .unwrap_or(0);
    nanos | 1
}
