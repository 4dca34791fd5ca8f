//! Output device boundary.
//!
//! The graph never talks to an audio API directly. A backend hands out a
//! sample rate and takes ownership of the render side of a graph; what it
//! returns is a stream handle the control side can pause and resume.
//!
//! - [`CpalBackend`] drives the default output device of the host.
//! - [`OfflineBackend`] renders on demand, for tests and benchmarks.

mod cpal_backend;
mod offline;

pub use cpal_backend::CpalBackend;
pub use offline::OfflineBackend;

use std::sync::atomic::{AtomicU64, Ordering};

use crate::{error::AudioError, graph::GraphRenderer};

/// Frames rendered so far, shared between the audio thread (writer) and the
/// control thread (reader).
#[derive(Debug)]
pub struct DeviceClock {
    frames: AtomicU64,
    sample_rate: f32,
}

impl DeviceClock {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            frames: AtomicU64::new(0),
            sample_rate,
        }
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn frames(&self) -> u64 {
        self.frames.load(Ordering::Acquire)
    }

    /// Device time in seconds.
    pub fn current_time(&self) -> f64 {
        self.frames() as f64 / self.sample_rate as f64
    }

    pub(crate) fn advance(&self, frames: u64) {
        self.frames.fetch_add(frames, Ordering::AcqRel);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextState {
    Running,
    Suspended,
    Closed,
}

/// Something that can play a graph.
pub trait AudioBackend {
    /// Rate the device will run at. Fails when there is no usable output.
    fn sample_rate(&self) -> Result<f32, AudioError>;

    /// Hand the render side to the device and start pulling audio from it.
    fn start(&self, renderer: GraphRenderer) -> Result<Box<dyn OutputStream>, AudioError>;
}

/// A running device stream. Dropping it stops playback and frees the device.
pub trait OutputStream {
    fn resume(&mut self) -> Result<(), AudioError>;
    fn suspend(&mut self) -> Result<(), AudioError>;
}
