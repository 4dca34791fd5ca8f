use crate::{
    graph::node::{RenderCtx, StereoBlock},
    ramp::ParamTimeline,
};

/// Multiplies its input by an automatable level.
pub struct GainNode {
    gain: ParamTimeline,
}

impl GainNode {
    pub fn new(level: f32) -> Self {
        Self {
            gain: ParamTimeline::new(level),
        }
    }

    pub fn gain(&self) -> &ParamTimeline {
        &self.gain
    }

    pub fn gain_mut(&mut self) -> &mut ParamTimeline {
        &mut self.gain
    }

    pub fn process(&mut self, input: &StereoBlock, output: &mut StereoBlock, ctx: &RenderCtx) {
        for i in 0..output.left.len() {
            let level = self.gain.advance(ctx.time_at(i));
            output.left[i] = input.left[i] * level;
            output.right[i] = input.right[i] * level;
        }
    }
}
