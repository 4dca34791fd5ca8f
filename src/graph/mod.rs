//! The signal graph.
//!
//! A graph lives on two threads. [`AudioContext`] is the control-side handle:
//! it creates nodes, wires them and schedules parameter automation. Every
//! call becomes a [`GraphCommand`] on a lock-free ring. [`GraphRenderer`] is
//! the audio-side arena that owns the nodes, drains that ring once per
//! quantum and renders. [`AudioGraph`] builds the effect chain both
//! instruments share on top of a context.

/// Master gain, delay and reverb shared by the instruments.
pub mod audio_graph;
/// Control-side context and typed node handles.
pub mod context;
/// Stereo convolution reverb node.
pub mod convolver;
/// Stereo delay node with automatable time.
pub mod delay;
/// Automatable level node.
pub mod gain;
/// Ids, endpoints, parameters and the node enum the renderer dispatches on.
pub mod node;
/// Scheduled tone source node.
pub mod oscillator;
/// Audio-thread arena and command application.
pub mod renderer;

pub use audio_graph::AudioGraph;
pub use context::{AudioContext, ConvolverHandle, DelayHandle, GainHandle, OscillatorHandle};
pub use node::{Endpoint, NodeId, ParamKind, ParamRef, StereoBlock};
pub use renderer::{GraphCommand, GraphRenderer, NodeSlot};
