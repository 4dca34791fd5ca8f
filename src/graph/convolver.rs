use crate::{
    dsp::{convolver::PartitionedConvolver, impulse::ImpulseResponse},
    graph::node::StereoBlock,
    RENDER_QUANTUM,
};

/// Stereo convolution reverb: each input channel runs through the matching
/// impulse channel, scaled by the impulse's normalization.
pub struct ConvolverNode {
    channels: [PartitionedConvolver; 2],
    impulse_len: usize,
}

impl ConvolverNode {
    pub fn new(impulse: &ImpulseResponse) -> Self {
        let scale = impulse.normalization_scale();
        Self {
            channels: [
                PartitionedConvolver::new(impulse.channel(0), RENDER_QUANTUM, scale),
                PartitionedConvolver::new(impulse.channel(1), RENDER_QUANTUM, scale),
            ],
            impulse_len: impulse.len(),
        }
    }

    /// Frames in the loaded impulse.
    pub fn impulse_len(&self) -> usize {
        self.impulse_len
    }

    pub fn process(&mut self, input: &StereoBlock, output: &mut StereoBlock) {
        let [left, right] = &mut self.channels;
        left.process(&input.left, &mut output.left);
        right.process(&input.right, &mut output.right);
    }
}
