use crate::{
    dsp::delay::DelayLine,
    graph::node::{RenderCtx, StereoBlock},
    ramp::ParamTimeline,
};

/// Stereo delay with an automatable delay time in seconds.
pub struct DelayNode {
    lines: [DelayLine; 2],
    max_time: f32,
    delay_time: ParamTimeline,
}

impl DelayNode {
    pub fn new(max_time: f32, delay_time: f32, sample_rate: f32) -> Self {
        let max_time = max_time.max(0.0);
        let capacity = (max_time * sample_rate).ceil() as usize;
        Self {
            lines: [DelayLine::new(capacity), DelayLine::new(capacity)],
            max_time,
            delay_time: ParamTimeline::new(delay_time.clamp(0.0, max_time)),
        }
    }

    pub fn max_time(&self) -> f32 {
        self.max_time
    }

    pub fn delay_time(&self) -> &ParamTimeline {
        &self.delay_time
    }

    pub fn delay_time_mut(&mut self) -> &mut ParamTimeline {
        &mut self.delay_time
    }

    pub fn process(&mut self, input: &StereoBlock, output: &mut StereoBlock, ctx: &RenderCtx) {
        let [left, right] = &mut self.lines;
        for i in 0..output.left.len() {
            let seconds = self.delay_time.advance(ctx.time_at(i)).clamp(0.0, self.max_time);
            let samples = seconds * ctx.sample_rate;
            output.left[i] = left.next_sample(input.left[i], samples);
            output.right[i] = right.next_sample(input.right[i], samples);
        }
    }
}
