/// Circular delay line with a fixed maximum length and fractional reads.
///
/// Delay is measured from the most recently written sample: a delay of 0
/// returns the sample just written, a delay of `n` the one written `n`
/// samples earlier.
pub struct DelayLine {
    buffer: Vec<f32>,
    write_pos: usize,
}

impl DelayLine {
    pub fn new(max_delay_samples: usize) -> Self {
        Self {
            // One slot for the current sample, one for the interpolation partner
            buffer: vec![0.0; max_delay_samples + 2],
            write_pos: 0,
        }
    }

    /// Longest delay this line can produce, in samples.
    pub fn max_delay(&self) -> usize {
        self.buffer.len() - 2
    }

    pub fn write(&mut self, sample: f32) {
        self.buffer[self.write_pos] = sample;
        self.write_pos = (self.write_pos + 1) % self.buffer.len();
    }

    /// Read `delay` samples back, linearly interpolating between neighbours.
    pub fn read_interpolated(&self, delay: f32) -> f32 {
        let len = self.buffer.len();
        let delay = delay.clamp(0.0, self.max_delay() as f32);
        let whole = delay.floor();
        let frac = delay - whole;

        let newest = (self.write_pos + len - 1) % len;
        let i0 = (newest + len - whole as usize) % len;
        let i1 = (i0 + len - 1) % len;

        self.buffer[i0] * (1.0 - frac) + self.buffer[i1] * frac
    }

    pub fn next_sample(&mut self, sample: f32, delay: f32) -> f32 {
        self.write(sample);
        self.read_interpolated(delay)
    }

    pub fn reset(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
    }
}
