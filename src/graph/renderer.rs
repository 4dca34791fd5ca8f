//! Audio-thread side of the graph.
//!
//! The renderer owns every node. It never blocks: the control side talks to
//! it only through the command ring, and reads back only the device clock.
//!
//! Each quantum runs in four steps:
//!
//! ```text
//! 1. drain commands     insert / connect / automate / start / stop / release
//! 2. render             nodes in dependency order, destination inputs summed
//! 3. advance clock      +RENDER_QUANTUM frames
//! 4. collect garbage    hand released, silent nodes back to the control side
//! ```
//!
//! Nothing here allocates or frees in steady state. Nodes arrive boxed and
//! fully built, leave through the disposal ring to be freed by the control
//! side, and the sort reuses its scratch storage.

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use rtrb::{Consumer, Producer, PushError};
use tracing::{trace, warn};

use crate::{
    device::DeviceClock,
    dsp::oscillator::Waveform,
    graph::node::{Endpoint, NodeId, NodeKind, ParamRef, RenderCtx, StereoBlock},
    ramp::Automation,
    RENDER_QUANTUM,
};

const INITIAL_NODE_CAPACITY: usize = 128;
/// Inputs a node can take before its edge list has to grow.
const INPUT_CAPACITY: usize = 8;

/// Messages from the control side. Applied at the start of the next quantum,
/// in the order they were sent.
pub enum GraphCommand {
    Insert { id: NodeId, slot: Box<NodeSlot> },
    Connect { from: NodeId, to: Endpoint },
    /// Remove edges leaving `from`: the one to `to`, or all of them.
    Disconnect { from: NodeId, to: Option<Endpoint> },
    Automate { param: ParamRef, automation: Automation },
    SetWaveform { node: NodeId, waveform: Waveform },
    Start { node: NodeId, at: f64 },
    Stop { node: NodeId, at: f64 },
    /// The control side lets go of a node; it is freed once finished.
    Release(NodeId),
}

/// A node with its edges and output buffer, as the renderer stores it.
///
/// Built and freed on the control side; the renderer only moves the box.
pub struct NodeSlot {
    kind: NodeKind,
    inputs: Vec<NodeId>,
    output: StereoBlock,
    released: bool,
}

impl NodeSlot {
    pub fn new(kind: NodeKind) -> Box<Self> {
        Box::new(Self {
            kind,
            inputs: Vec::with_capacity(INPUT_CAPACITY),
            output: StereoBlock::default(),
            released: false,
        })
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }
}

pub struct GraphRenderer {
    commands: Consumer<GraphCommand>,
    disposed: Producer<Box<NodeSlot>>,
    clock: Arc<DeviceClock>,
    nodes: HashMap<NodeId, Box<NodeSlot>>,
    destination: Vec<NodeId>,
    order: Vec<NodeId>,
    order_dirty: bool,
    // Sort scratch, kept between sorts
    roots: Vec<NodeId>,
    visited: HashSet<NodeId>,
    stack: Vec<(NodeId, usize)>,
    scratch: Box<StereoBlock>,
    mix: Box<StereoBlock>,
    /// Next unread frame of `mix`. `RENDER_QUANTUM` means used up.
    cursor: usize,
}

impl GraphRenderer {
    /// `disposed` carries removed nodes back to the control side, which
    /// drops them there.
    pub fn new(
        commands: Consumer<GraphCommand>,
        disposed: Producer<Box<NodeSlot>>,
        clock: Arc<DeviceClock>,
    ) -> Self {
        Self {
            commands,
            disposed,
            clock,
            nodes: HashMap::with_capacity(INITIAL_NODE_CAPACITY),
            destination: Vec::with_capacity(INITIAL_NODE_CAPACITY),
            order: Vec::with_capacity(INITIAL_NODE_CAPACITY),
            order_dirty: false,
            roots: Vec::with_capacity(INITIAL_NODE_CAPACITY),
            visited: HashSet::with_capacity(INITIAL_NODE_CAPACITY),
            stack: Vec::with_capacity(INITIAL_NODE_CAPACITY),
            scratch: Box::default(),
            mix: Box::default(),
            cursor: RENDER_QUANTUM,
        }
    }

    pub fn sample_rate(&self) -> f32 {
        self.clock.sample_rate()
    }

    pub fn current_time(&self) -> f64 {
        self.clock.current_time()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Current value of a parameter, if its node is still alive.
    pub fn param_value(&self, param: ParamRef) -> Option<f32> {
        self.nodes
            .get(&param.node)?
            .kind
            .param(param.kind)
            .map(|timeline| timeline.value())
    }

    pub fn is_connected(&self, from: NodeId, to: Endpoint) -> bool {
        match to {
            Endpoint::Destination => self.destination.contains(&from),
            Endpoint::Node(id) => self
                .nodes
                .get(&id)
                .is_some_and(|slot| slot.inputs.contains(&from)),
        }
    }

    pub fn waveform(&self, id: NodeId) -> Option<Waveform> {
        match &self.nodes.get(&id)?.kind {
            NodeKind::Oscillator(osc) => Some(osc.waveform()),
            _ => None,
        }
    }

    /// The most recent quantum sent to the destination.
    pub fn last_quantum(&self) -> &StereoBlock {
        &self.mix
    }

    /// What a node produced in the most recent quantum.
    pub fn node_output(&self, id: NodeId) -> Option<&StereoBlock> {
        self.nodes.get(&id).map(|slot| &slot.output)
    }

    /// Fill an interleaved device buffer of any size, rendering new quanta
    /// as needed. Mono devices get the mid signal; channels past the second
    /// repeat it.
    pub fn fill_interleaved(&mut self, data: &mut [f32], channels: usize) {
        if channels == 0 {
            return;
        }

        for frame in data.chunks_mut(channels) {
            if self.cursor >= RENDER_QUANTUM {
                self.render_quantum();
                self.cursor = 0;
            }

            let [left, right] = self.mix.frame(self.cursor);
            let mid = 0.5 * (left + right);
            match frame {
                [mono] => *mono = mid,
                [l, r, rest @ ..] => {
                    *l = left;
                    *r = right;
                    rest.fill(mid);
                }
                [] => {}
            }
            self.cursor += 1;
        }
    }

    /// Render one quantum into the destination mix and return it.
    pub fn render_quantum(&mut self) -> &StereoBlock {
        self.apply_commands();

        if self.order_dirty {
            self.sort();
        }

        let ctx = RenderCtx {
            sample_rate: self.clock.sample_rate(),
            time: self.clock.current_time(),
        };

        let Self {
            nodes,
            order,
            scratch,
            ..
        } = self;
        for id in order.iter() {
            scratch.clear();
            if let Some(slot) = nodes.get(id) {
                for input in &slot.inputs {
                    if let Some(source) = nodes.get(input) {
                        scratch.add(&source.output);
                    }
                }
            }
            if let Some(slot) = nodes.get_mut(id) {
                let NodeSlot { kind, output, .. } = &mut **slot;
                kind.process(scratch, output, &ctx);
            }
        }

        self.mix.clear();
        for id in &self.destination {
            if let Some(slot) = self.nodes.get(id) {
                self.mix.add(&slot.output);
            }
        }

        self.clock.advance(RENDER_QUANTUM as u64);
        self.collect_garbage();

        &self.mix
    }

    fn apply_commands(&mut self) {
        while let Ok(command) = self.commands.pop() {
            self.apply(command);
        }
    }

    fn apply(&mut self, command: GraphCommand) {
        match command {
            GraphCommand::Insert { id, slot } => {
                trace!(?id, kind = slot.name(), "insert node");
                if let Some(replaced) = self.nodes.insert(id, slot) {
                    self.dispose(replaced);
                }
                self.order_dirty = true;
            }
            GraphCommand::Connect { from, to } => {
                if !self.nodes.contains_key(&from) {
                    warn!(?from, "connect from unknown node ignored");
                    return;
                }
                let inputs = match to {
                    Endpoint::Destination => &mut self.destination,
                    Endpoint::Node(id) => match self.nodes.get_mut(&id) {
                        Some(slot) => &mut slot.inputs,
                        None => {
                            warn!(?from, ?id, "connect to unknown node ignored");
                            return;
                        }
                    },
                };
                if !inputs.contains(&from) {
                    inputs.push(from);
                    self.order_dirty = true;
                }
            }
            GraphCommand::Disconnect { from, to } => {
                match to {
                    Some(Endpoint::Destination) => self.destination.retain(|&id| id != from),
                    Some(Endpoint::Node(id)) => {
                        if let Some(slot) = self.nodes.get_mut(&id) {
                            slot.inputs.retain(|&input| input != from);
                        }
                    }
                    None => self.unlink(from),
                }
                self.order_dirty = true;
            }
            GraphCommand::Automate { param, automation } => {
                match self
                    .nodes
                    .get_mut(&param.node)
                    .and_then(|slot| slot.kind.param_mut(param.kind))
                {
                    Some(timeline) => timeline.insert(automation),
                    None => trace!(?param, "automation for missing parameter ignored"),
                }
            }
            GraphCommand::SetWaveform { node, waveform } => {
                if let Some(NodeKind::Oscillator(osc)) = self.nodes.get_mut(&node).map(|e| &mut e.kind) {
                    osc.set_waveform(waveform);
                }
            }
            GraphCommand::Start { node, at } => {
                if let Some(NodeKind::Oscillator(osc)) = self.nodes.get_mut(&node).map(|e| &mut e.kind) {
                    if !osc.start_at(at) {
                        warn!(?node, "oscillator already started");
                    }
                }
            }
            GraphCommand::Stop { node, at } => {
                if let Some(NodeKind::Oscillator(osc)) = self.nodes.get_mut(&node).map(|e| &mut e.kind) {
                    osc.stop_at(at);
                }
            }
            GraphCommand::Release(id) => {
                if let Some(slot) = self.nodes.get_mut(&id) {
                    slot.released = true;
                }
            }
        }
    }

    /// Drop every edge leaving `id`.
    fn unlink(&mut self, id: NodeId) {
        self.destination.retain(|&node| node != id);
        for slot in self.nodes.values_mut() {
            slot.inputs.retain(|&input| input != id);
        }
    }

    /// Remove released nodes that can no longer make sound. Removing one can
    /// orphan the next (oscillator → its gain), so repeat until stable.
    fn collect_garbage(&mut self) {
        let now = self.clock.current_time();
        loop {
            let dead = self.nodes.iter().find_map(|(&id, slot)| {
                let finished = slot
                    .kind
                    .is_finished(now)
                    .unwrap_or(slot.inputs.is_empty());
                (slot.released && finished).then_some(id)
            });

            let Some(id) = dead else {
                break;
            };
            trace!(?id, "dispose node");
            if let Some(slot) = self.nodes.remove(&id) {
                self.dispose(slot);
            }
            self.unlink(id);
            self.order_dirty = true;
        }
    }

    /// Send a removed node back to be freed off the audio thread.
    fn dispose(&mut self, slot: Box<NodeSlot>) {
        if let Err(PushError::Full(slot)) = self.disposed.push(slot) {
            warn!(kind = slot.name(), "disposal ring full, freeing on the audio thread");
        }
    }

    /// Depth-first post-order over inputs, so every node renders after the
    /// nodes feeding it. A cycle is cut where it is first revisited.
    fn sort(&mut self) {
        let Self {
            nodes,
            order,
            roots,
            visited,
            stack,
            ..
        } = self;

        roots.clear();
        roots.extend(nodes.keys().copied());
        roots.sort_unstable();
        order.clear();
        visited.clear();

        for &root in roots.iter() {
            if !visited.insert(root) {
                continue;
            }
            stack.push((root, 0));
            while let Some(top) = stack.len().checked_sub(1) {
                let (id, next) = stack[top];
                match nodes.get(&id).and_then(|slot| slot.inputs.get(next)).copied() {
                    Some(input) => {
                        stack[top].1 += 1;
                        if nodes.contains_key(&input) && visited.insert(input) {
                            stack.push((input, 0));
                        }
                    }
                    None => {
                        order.push(id);
                        stack.pop();
                    }
                }
            }
        }
        self.order_dirty = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        graph::{gain::GainNode, oscillator::OscillatorNode},
        ramp::Curve,
    };
    use rtrb::{Producer, RingBuffer};

    const SR: f32 = 12_800.0;

    fn channels() -> (Producer<GraphCommand>, Consumer<Box<NodeSlot>>, GraphRenderer) {
        let (producer, consumer) = RingBuffer::new(64);
        let (disposed_tx, disposed_rx) = RingBuffer::new(64);
        let clock = Arc::new(DeviceClock::new(SR));
        (producer, disposed_rx, GraphRenderer::new(consumer, disposed_tx, clock))
    }

    fn renderer() -> (Producer<GraphCommand>, GraphRenderer) {
        let (tx, _disposed, graph) = channels();
        (tx, graph)
    }

    fn insert(tx: &mut Producer<GraphCommand>, id: u32, node: NodeKind) -> NodeId {
        let id = NodeId(id);
        tx.push(GraphCommand::Insert {
            id,
            slot: NodeSlot::new(node),
        })
        .ok();
        id
    }

    #[test]
    fn empty_graph_renders_silence_and_advances_clock() {
        let (_tx, mut graph) = renderer();
        assert_eq!(graph.render_quantum().peak(), 0.0);
        assert_eq!(graph.current_time(), RENDER_QUANTUM as f64 / SR as f64);
    }

    #[test]
    fn oscillator_through_gain_reaches_destination() {
        let (mut tx, mut graph) = renderer();
        let osc = insert(&mut tx, 1, NodeKind::Oscillator(OscillatorNode::new(Waveform::Square, 200.0)));
        let gain = insert(&mut tx, 2, NodeKind::Gain(GainNode::new(0.5)));
        tx.push(GraphCommand::Connect { from: osc, to: gain.into() }).ok();
        tx.push(GraphCommand::Connect { from: gain, to: Endpoint::Destination }).ok();
        tx.push(GraphCommand::Start { node: osc, at: 0.0 }).ok();

        let peak = graph.render_quantum().peak();
        assert!(peak > 0.3 && peak <= 0.5 + 1e-3, "peak {peak}");
        assert!(graph.is_connected(osc, Endpoint::Node(gain)));
        assert!(graph.is_connected(gain, Endpoint::Destination));
    }

    #[test]
    fn released_voice_is_disposed_after_stop() {
        let (mut tx, mut graph) = renderer();
        let osc = insert(&mut tx, 1, NodeKind::Oscillator(OscillatorNode::new(Waveform::Sine, 100.0)));
        let gain = insert(&mut tx, 2, NodeKind::Gain(GainNode::new(1.0)));
        tx.push(GraphCommand::Connect { from: osc, to: gain.into() }).ok();
        tx.push(GraphCommand::Connect { from: gain, to: Endpoint::Destination }).ok();
        tx.push(GraphCommand::Start { node: osc, at: 0.0 }).ok();
        tx.push(GraphCommand::Stop { node: osc, at: 0.02 }).ok();
        tx.push(GraphCommand::Release(osc)).ok();
        tx.push(GraphCommand::Release(gain)).ok();

        graph.render_quantum(); // 0.00 .. 0.01
        assert_eq!(graph.node_count(), 2);
        graph.render_quantum(); // 0.01 .. 0.02, stop reached at the end
        assert_eq!(graph.node_count(), 0);
        assert!(!graph.is_connected(gain, Endpoint::Destination));
    }

    #[test]
    fn disposed_nodes_are_handed_back() {
        let (mut tx, mut disposed, mut graph) = channels();
        let osc = insert(&mut tx, 1, NodeKind::Oscillator(OscillatorNode::new(Waveform::Sine, 100.0)));
        let gain = insert(&mut tx, 2, NodeKind::Gain(GainNode::new(1.0)));
        tx.push(GraphCommand::Connect { from: osc, to: gain.into() }).ok();
        tx.push(GraphCommand::Start { node: osc, at: 0.0 }).ok();
        tx.push(GraphCommand::Stop { node: osc, at: 0.0 }).ok();
        tx.push(GraphCommand::Release(osc)).ok();
        tx.push(GraphCommand::Release(gain)).ok();

        graph.render_quantum();
        assert_eq!(graph.node_count(), 0);

        let mut names = Vec::new();
        while let Ok(slot) = disposed.pop() {
            names.push(slot.name());
        }
        names.sort_unstable();
        assert_eq!(names, ["gain", "oscillator"]);
    }

    #[test]
    fn inputs_render_first_whatever_their_ids() {
        let (mut tx, mut graph) = renderer();
        // The gain has the lower id but depends on the oscillator
        let gain = insert(&mut tx, 1, NodeKind::Gain(GainNode::new(1.0)));
        let osc = insert(&mut tx, 5, NodeKind::Oscillator(OscillatorNode::new(Waveform::Square, 200.0)));
        tx.push(GraphCommand::Connect { from: osc, to: gain.into() }).ok();
        tx.push(GraphCommand::Connect { from: gain, to: Endpoint::Destination }).ok();
        tx.push(GraphCommand::Start { node: osc, at: 0.0 }).ok();

        assert!(graph.render_quantum().peak() > 0.3);
        assert_eq!(graph.node_output(gain), graph.node_output(osc));
    }

    #[test]
    fn cycles_and_long_chains_sort() {
        let (mut tx, mut graph) = renderer();
        let a = insert(&mut tx, 1, NodeKind::Gain(GainNode::new(1.0)));
        let b = insert(&mut tx, 2, NodeKind::Gain(GainNode::new(1.0)));
        tx.push(GraphCommand::Connect { from: a, to: b.into() }).ok();
        tx.push(GraphCommand::Connect { from: b, to: a.into() }).ok();
        graph.render_quantum();
        assert_eq!(graph.order.len(), 2);

        let (mut tx, mut graph) = renderer();
        for id in 0..40 {
            insert(&mut tx, id, NodeKind::Gain(GainNode::new(1.0)));
            graph.render_quantum();
            if id > 0 {
                tx.push(GraphCommand::Connect { from: NodeId(id), to: NodeId(id - 1).into() }).ok();
            }
        }
        graph.render_quantum();
        let expected: Vec<NodeId> = (0..40).rev().map(NodeId).collect();
        assert_eq!(graph.order, expected);
    }

    #[test]
    fn unreleased_nodes_stay() {
        let (mut tx, mut graph) = renderer();
        insert(&mut tx, 1, NodeKind::Gain(GainNode::new(1.0)));
        for _ in 0..4 {
            graph.render_quantum();
        }
        assert!(graph.contains(NodeId(1)));
    }

    #[test]
    fn automation_reaches_the_parameter() {
        let (mut tx, mut graph) = renderer();
        let gain = insert(&mut tx, 7, NodeKind::Gain(GainNode::new(0.0)));
        let param = ParamRef::new(gain, crate::graph::node::ParamKind::Gain);
        tx.push(GraphCommand::Automate {
            param,
            automation: Automation::new(0.0, Curve::Step(0.8)),
        })
        .ok();

        graph.render_quantum();
        assert_eq!(graph.param_value(param), Some(0.8));
    }

    #[test]
    fn disconnect_all_removes_every_outgoing_edge() {
        let (mut tx, mut graph) = renderer();
        let a = insert(&mut tx, 1, NodeKind::Gain(GainNode::new(1.0)));
        let b = insert(&mut tx, 2, NodeKind::Gain(GainNode::new(1.0)));
        tx.push(GraphCommand::Connect { from: a, to: b.into() }).ok();
        tx.push(GraphCommand::Connect { from: a, to: Endpoint::Destination }).ok();
        tx.push(GraphCommand::Disconnect { from: a, to: None }).ok();

        graph.render_quantum();
        assert!(!graph.is_connected(a, b.into()));
        assert!(!graph.is_connected(a, Endpoint::Destination));
    }

    #[test]
    fn odd_callback_sizes_are_served_from_quanta() {
        let (mut tx, mut graph) = renderer();
        let osc = insert(&mut tx, 1, NodeKind::Oscillator(OscillatorNode::new(Waveform::Sine, 100.0)));
        tx.push(GraphCommand::Connect { from: osc, to: Endpoint::Destination }).ok();
        tx.push(GraphCommand::Start { node: osc, at: 0.0 }).ok();

        let mut data = vec![0.0; 100 * 2];
        graph.fill_interleaved(&mut data, 2);
        assert_eq!(graph.current_time(), RENDER_QUANTUM as f64 / SR as f64);
        graph.fill_interleaved(&mut data, 2);
        assert_eq!(graph.current_time(), 2.0 * RENDER_QUANTUM as f64 / SR as f64);

        let mut mono = vec![0.0; 10];
        graph.fill_interleaved(&mut mono, 1);
        assert!(mono.iter().any(|&s| s != 0.0));
    }
}
