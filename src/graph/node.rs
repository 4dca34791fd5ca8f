use crate::{
    graph::{convolver::ConvolverNode, delay::DelayNode, gain::GainNode, oscillator::OscillatorNode},
    ramp::ParamTimeline,
    RENDER_QUANTUM,
};

/// Arena key of a node. Ids are handed out by the control side and never reused
/// within one context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

/// Where a node's output can go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Node(NodeId),
    /// The device output.
    Destination,
}

impl From<NodeId> for Endpoint {
    fn from(id: NodeId) -> Self {
        Endpoint::Node(id)
    }
}

/// Automatable parameters. Each node kind exposes the ones it owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamKind {
    Frequency,
    Gain,
    DelayTime,
}

/// A parameter of a specific node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParamRef {
    pub node: NodeId,
    pub kind: ParamKind,
}

impl ParamRef {
    pub fn new(node: NodeId, kind: ParamKind) -> Self {
        Self { node, kind }
    }
}

/// Timing of the quantum being rendered.
///
/// - sample_rate: device rate in Hz
/// - time: device time of the first frame, in seconds
#[derive(Debug, Clone, Copy)]
pub struct RenderCtx {
    pub sample_rate: f32,
    pub time: f64,
}

impl RenderCtx {
    /// Device time of frame `index` within the quantum.
    #[inline]
    pub fn time_at(&self, index: usize) -> f64 {
        self.time + index as f64 / self.sample_rate as f64
    }
}

/// One quantum of planar stereo audio.
#[derive(Debug, Clone, PartialEq)]
pub struct StereoBlock {
    pub left: [f32; RENDER_QUANTUM],
    pub right: [f32; RENDER_QUANTUM],
}

impl Default for StereoBlock {
    fn default() -> Self {
        Self {
            left: [0.0; RENDER_QUANTUM],
            right: [0.0; RENDER_QUANTUM],
        }
    }
}

impl StereoBlock {
    pub fn clear(&mut self) {
        self.left.fill(0.0);
        self.right.fill(0.0);
    }

    /// Mix `other` into this block.
    pub fn add(&mut self, other: &StereoBlock) {
        for (out, s) in self.left.iter_mut().zip(&other.left) {
            *out += s;
        }
        for (out, s) in self.right.iter_mut().zip(&other.right) {
            *out += s;
        }
    }

    pub fn frame(&self, index: usize) -> [f32; 2] {
        [self.left[index], self.right[index]]
    }

    /// Largest absolute sample across both channels.
    pub fn peak(&self) -> f32 {
        self.left
            .iter()
            .chain(&self.right)
            .fold(0.0f32, |peak, s| peak.max(s.abs()))
    }
}

/// Everything the renderer knows how to process.
pub enum NodeKind {
    Oscillator(OscillatorNode),
    Gain(GainNode),
    Delay(DelayNode),
    Convolver(ConvolverNode),
}

impl NodeKind {
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Oscillator(_) => "oscillator",
            NodeKind::Gain(_) => "gain",
            NodeKind::Delay(_) => "delay",
            NodeKind::Convolver(_) => "convolver",
        }
    }

    /// Render one quantum. `input` is the sum of everything connected to
    /// this node; sources ignore it.
    pub fn process(&mut self, input: &StereoBlock, output: &mut StereoBlock, ctx: &RenderCtx) {
        match self {
            NodeKind::Oscillator(node) => node.process(output, ctx),
            NodeKind::Gain(node) => node.process(input, output, ctx),
            NodeKind::Delay(node) => node.process(input, output, ctx),
            NodeKind::Convolver(node) => node.process(input, output),
        }
    }

    pub fn param(&self, kind: ParamKind) -> Option<&ParamTimeline> {
        match (self, kind) {
            (NodeKind::Oscillator(node), ParamKind::Frequency) => Some(node.frequency()),
            (NodeKind::Gain(node), ParamKind::Gain) => Some(node.gain()),
            (NodeKind::Delay(node), ParamKind::DelayTime) => Some(node.delay_time()),
            _ => None,
        }
    }

    pub fn param_mut(&mut self, kind: ParamKind) -> Option<&mut ParamTimeline> {
        match (self, kind) {
            (NodeKind::Oscillator(node), ParamKind::Frequency) => Some(node.frequency_mut()),
            (NodeKind::Gain(node), ParamKind::Gain) => Some(node.gain_mut()),
            (NodeKind::Delay(node), ParamKind::DelayTime) => Some(node.delay_time_mut()),
            _ => None,
        }
    }

    /// Whether a source has nothing more to play at `time`. Nodes that only
    /// process input are never finished on their own; they go away once their
    /// inputs do.
    pub fn is_finished(&self, time: f64) -> Option<bool> {
        match self {
            NodeKind::Oscillator(node) => Some(node.is_finished(time)),
            _ => None,
        }
    }
}
