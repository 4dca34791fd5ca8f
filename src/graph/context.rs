use std::sync::Arc;

use rtrb::{Consumer, Producer, PushError, RingBuffer};
use tracing::{debug, trace, warn};

use crate::{
    config::DeviceConfig,
    device::{AudioBackend, ContextState, DeviceClock, OutputStream},
    dsp::{impulse::ImpulseResponse, oscillator::Waveform},
    error::AudioError,
    graph::{
        convolver::ConvolverNode,
        delay::DelayNode,
        gain::GainNode,
        node::{Endpoint, NodeId, NodeKind, ParamKind, ParamRef},
        oscillator::OscillatorNode,
        renderer::{GraphCommand, GraphRenderer, NodeSlot},
    },
    ramp::{Automation, ParameterRamp},
};

macro_rules! node_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(NodeId);

        impl $name {
            pub fn id(self) -> NodeId {
                self.0
            }
        }

        impl From<$name> for NodeId {
            fn from(handle: $name) -> Self {
                handle.0
            }
        }

        impl From<$name> for Endpoint {
            fn from(handle: $name) -> Self {
                Endpoint::Node(handle.0)
            }
        }
    };
}

node_handle!(
    /// A scheduled tone source.
    OscillatorHandle
);
node_handle!(GainHandle);
node_handle!(DelayHandle);
node_handle!(ConvolverHandle);

impl OscillatorHandle {
    pub fn frequency(self) -> ParamRef {
        ParamRef::new(self.0, ParamKind::Frequency)
    }
}

impl GainHandle {
    pub fn gain(self) -> ParamRef {
        ParamRef::new(self.0, ParamKind::Gain)
    }
}

impl DelayHandle {
    pub fn delay_time(self) -> ParamRef {
        ParamRef::new(self.0, ParamKind::DelayTime)
    }
}

/// Control-thread handle to one open audio device and the graph playing on it.
///
/// All mutations are queued for the renderer and take effect at the start of
/// the next quantum. Nodes are built here, off the audio thread, and moved
/// across whole.
pub struct AudioContext {
    commands: Producer<GraphCommand>,
    /// Nodes the renderer has let go of, freed here.
    disposed: Consumer<Box<NodeSlot>>,
    clock: Arc<DeviceClock>,
    stream: Option<Box<dyn OutputStream>>,
    state: ContextState,
    next_id: u32,
}

impl AudioContext {
    /// Open the backend's device and start rendering an empty graph.
    pub fn open(backend: &dyn AudioBackend, config: &DeviceConfig) -> Result<Self, AudioError> {
        let sample_rate = backend.sample_rate()?;
        let (commands, consumer) = RingBuffer::new(config.command_capacity);
        let (disposed_tx, disposed) = RingBuffer::new(config.command_capacity);
        let clock = Arc::new(DeviceClock::new(sample_rate));

        let renderer = GraphRenderer::new(consumer, disposed_tx, Arc::clone(&clock));
        let stream = backend.start(renderer)?;
        debug!(sample_rate, "audio context opened");

        Ok(Self {
            commands,
            disposed,
            clock,
            stream: Some(stream),
            state: ContextState::Running,
            next_id: 0,
        })
    }

    pub fn sample_rate(&self) -> f32 {
        self.clock.sample_rate()
    }

    pub fn state(&self) -> ContextState {
        self.state
    }

    pub fn is_closed(&self) -> bool {
        self.state == ContextState::Closed
    }

    /// Free the nodes the renderer has disposed of since the last call.
    /// Runs on every command, so callers rarely need it.
    pub fn reclaim(&mut self) -> usize {
        let mut freed = 0;
        while self.disposed.pop().is_ok() {
            freed += 1;
        }
        if freed > 0 {
            trace!(freed, "reclaimed disposed nodes");
        }
        freed
    }

    fn send(&mut self, command: GraphCommand) {
        self.reclaim();
        if self.is_closed() {
            trace!("command to a closed context dropped");
            return;
        }
        if let Err(PushError::Full(_)) = self.commands.push(command) {
            warn!("graph command ring full, dropping command");
        }
    }

    fn insert(&mut self, node: NodeKind) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.send(GraphCommand::Insert {
            id,
            slot: NodeSlot::new(node),
        });
        id
    }

    pub fn create_oscillator(&mut self, waveform: Waveform, frequency: f32) -> OscillatorHandle {
        OscillatorHandle(self.insert(NodeKind::Oscillator(OscillatorNode::new(waveform, frequency))))
    }

    pub fn create_gain(&mut self, level: f32) -> GainHandle {
        GainHandle(self.insert(NodeKind::Gain(GainNode::new(level))))
    }

    pub fn create_delay(&mut self, max_time: f32, delay_time: f32) -> DelayHandle {
        let node = DelayNode::new(max_time, delay_time, self.sample_rate());
        DelayHandle(self.insert(NodeKind::Delay(node)))
    }

    pub fn create_convolver(&mut self, impulse: &ImpulseResponse) -> ConvolverHandle {
        ConvolverHandle(self.insert(NodeKind::Convolver(ConvolverNode::new(impulse))))
    }

    pub fn connect(&mut self, from: impl Into<NodeId>, to: impl Into<Endpoint>) {
        self.send(GraphCommand::Connect {
            from: from.into(),
            to: to.into(),
        });
    }

    /// Remove every edge leaving `from`.
    pub fn disconnect(&mut self, from: impl Into<NodeId>) {
        self.send(GraphCommand::Disconnect {
            from: from.into(),
            to: None,
        });
    }

    pub fn disconnect_from(&mut self, from: impl Into<NodeId>, to: impl Into<Endpoint>) {
        self.send(GraphCommand::Disconnect {
            from: from.into(),
            to: Some(to.into()),
        });
    }

    pub fn start(&mut self, osc: OscillatorHandle, at: f64) {
        let at = at.max(self.current_time());
        self.send(GraphCommand::Start { node: osc.0, at });
    }

    pub fn stop(&mut self, osc: OscillatorHandle, at: f64) {
        let at = at.max(self.current_time());
        self.send(GraphCommand::Stop { node: osc.0, at });
    }

    /// Waveform switches are discrete and apply from the next quantum.
    pub fn set_waveform(&mut self, osc: OscillatorHandle, waveform: Waveform) {
        self.send(GraphCommand::SetWaveform {
            node: osc.0,
            waveform,
        });
    }

    /// Hand the node over to the renderer for disposal once it falls silent.
    pub fn release(&mut self, node: impl Into<NodeId>) {
        self.send(GraphCommand::Release(node.into()));
    }

    pub fn resume(&mut self) -> Result<(), AudioError> {
        match (&mut self.stream, self.state) {
            (Some(stream), ContextState::Suspended) => {
                stream.resume()?;
                self.state = ContextState::Running;
                debug!("audio context resumed");
                Ok(())
            }
            (_, ContextState::Closed) => Err(AudioError::device("audio context is closed")),
            _ => Ok(()),
        }
    }

    pub fn suspend(&mut self) -> Result<(), AudioError> {
        match (&mut self.stream, self.state) {
            (Some(stream), ContextState::Running) => {
                stream.suspend()?;
                self.state = ContextState::Suspended;
                debug!("audio context suspended");
                Ok(())
            }
            (_, ContextState::Closed) => Err(AudioError::device("audio context is closed")),
            _ => Ok(()),
        }
    }

    /// Drop the output stream. Safe to call more than once.
    pub fn close(&mut self) {
        if self.is_closed() {
            return;
        }
        self.stream = None;
        self.state = ContextState::Closed;
        self.reclaim();
        debug!("audio context closed");
    }
}

impl ParameterRamp for AudioContext {
    fn current_time(&self) -> f64 {
        self.clock.current_time()
    }

    fn schedule(&mut self, param: ParamRef, automation: Automation) {
        self.send(GraphCommand::Automate { param, automation });
    }
}

impl Drop for AudioContext {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::OfflineBackend;

    fn open(backend: &OfflineBackend) -> AudioContext {
        AudioContext::open(backend, &DeviceConfig::default()).unwrap()
    }

    #[test]
    fn unavailable_device_fails_to_open() {
        let backend = OfflineBackend::unavailable();
        let result = AudioContext::open(&backend, &DeviceConfig::default());
        assert!(matches!(result, Err(AudioError::DeviceUnavailable(_))));
        assert_eq!(backend.streams_opened(), 0);
    }

    #[test]
    fn clock_follows_rendering() {
        let backend = OfflineBackend::new(48_000.0);
        let ctx = open(&backend);
        assert_eq!(ctx.current_time(), 0.0);
        backend.render(48_000);
        assert!((ctx.current_time() - 1.0).abs() < 0.01);
    }

    #[test]
    fn nodes_appear_after_the_next_quantum() {
        let backend = OfflineBackend::new(48_000.0);
        let mut ctx = open(&backend);
        let osc = ctx.create_oscillator(Waveform::Sine, 440.0);
        let gain = ctx.create_gain(0.0);
        ctx.connect(osc, gain);
        ctx.connect(gain, Endpoint::Destination);

        assert_eq!(backend.inspect(|g| g.node_count()), Some(0));
        backend.render(1);
        assert_eq!(backend.inspect(|g| g.node_count()), Some(2));
        assert_eq!(
            backend.inspect(|g| g.is_connected(osc.id(), gain.into())),
            Some(true)
        );
    }

    #[test]
    fn suspended_device_is_silent_and_frozen() {
        let backend = OfflineBackend::new(48_000.0);
        let mut ctx = open(&backend);
        let osc = ctx.create_oscillator(Waveform::Square, 220.0);
        ctx.connect(osc, Endpoint::Destination);
        ctx.start(osc, 0.0);

        ctx.suspend().unwrap();
        assert_eq!(ctx.state(), ContextState::Suspended);
        let frames = backend.render(1_000);
        assert!(frames.iter().all(|f| *f == [0.0, 0.0]));
        assert_eq!(ctx.current_time(), 0.0);

        ctx.resume().unwrap();
        let frames = backend.render(1_000);
        assert!(frames.iter().any(|f| f[0].abs() > 0.5));
    }

    #[test]
    fn close_is_idempotent_and_frees_the_device() {
        let backend = OfflineBackend::new(48_000.0);
        let mut ctx = open(&backend);
        assert!(backend.is_open());

        ctx.close();
        ctx.close();
        assert!(!backend.is_open());
        assert!(ctx.resume().is_err());

        // Commands to a closed context go nowhere
        ctx.create_gain(1.0);
    }

    #[test]
    fn finished_nodes_are_freed_on_the_control_side() {
        let backend = OfflineBackend::new(48_000.0);
        let mut ctx = open(&backend);
        let osc = ctx.create_oscillator(Waveform::Sine, 440.0);
        let gain = ctx.create_gain(1.0);
        ctx.connect(osc, gain);
        ctx.connect(gain, Endpoint::Destination);
        ctx.start(osc, 0.0);
        ctx.stop(osc, 0.01);
        ctx.release(osc);
        ctx.release(gain);

        backend.render(1_024);
        assert_eq!(backend.inspect(|g| g.node_count()), Some(0));
        assert_eq!(ctx.reclaim(), 2);
        assert_eq!(ctx.reclaim(), 0);
    }

    #[test]
    fn automation_is_applied_through_the_ramp_trait() {
        let backend = OfflineBackend::new(48_000.0);
        let mut ctx = open(&backend);
        let gain = ctx.create_gain(0.0);
        let now = ctx.current_time();
        ctx.set_immediate(gain.gain(), 0.7, now);

        backend.render(128);
        assert_eq!(backend.inspect(|g| g.param_value(gain.gain())), Some(Some(0.7)));
    }
}
