use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

use super::{AudioBackend, OutputStream};
use crate::{error::AudioError, graph::GraphRenderer};

/// A device that renders only when asked to.
///
/// Clones share the same device, so a test can keep one handle while the
/// instrument under test owns another. Only the most recently started stream
/// is rendered; a stale stream dropped later leaves the current one alone.
#[derive(Clone)]
pub struct OfflineBackend {
    sample_rate: f32,
    available: bool,
    state: Arc<Mutex<OfflineState>>,
}

#[derive(Default)]
struct OfflineState {
    renderer: Option<GraphRenderer>,
    suspended: bool,
    generation: u64,
    opened: usize,
}

impl OfflineBackend {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            sample_rate,
            available: true,
            state: Arc::new(Mutex::new(OfflineState::default())),
        }
    }

    /// A backend that behaves like a host without audio output.
    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::new(48_000.0)
        }
    }

    fn lock(&self) -> MutexGuard<'_, OfflineState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Pull `frames` stereo frames from the open stream. A closed or
    /// suspended device yields silence and its clock stands still.
    pub fn render(&self, frames: usize) -> Vec<[f32; 2]> {
        let mut state = self.lock();
        let mut interleaved = vec![0.0; frames * 2];

        if !state.suspended {
            if let Some(renderer) = state.renderer.as_mut() {
                renderer.fill_interleaved(&mut interleaved, 2);
            }
        }

        interleaved
            .chunks_exact(2)
            .map(|frame| [frame[0], frame[1]])
            .collect()
    }

    pub fn render_seconds(&self, seconds: f64) -> Vec<[f32; 2]> {
        self.render((seconds * self.sample_rate as f64).round() as usize)
    }

    /// Look at the render side of the open stream, if any.
    pub fn inspect<T>(&self, f: impl FnOnce(&GraphRenderer) -> T) -> Option<T> {
        self.lock().renderer.as_ref().map(f)
    }

    /// Number of streams ever started on this device.
    pub fn streams_opened(&self) -> usize {
        self.lock().opened
    }

    pub fn is_open(&self) -> bool {
        self.lock().renderer.is_some()
    }

    pub fn is_suspended(&self) -> bool {
        self.lock().suspended
    }
}

impl AudioBackend for OfflineBackend {
    fn sample_rate(&self) -> Result<f32, AudioError> {
        if self.available {
            Ok(self.sample_rate)
        } else {
            Err(AudioError::device("offline device has no output"))
        }
    }

    fn start(&self, renderer: GraphRenderer) -> Result<Box<dyn OutputStream>, AudioError> {
        self.sample_rate()?;

        let mut state = self.lock();
        state.generation += 1;
        state.opened += 1;
        state.suspended = false;
        state.renderer = Some(renderer);
        debug!(generation = state.generation, "offline stream opened");

        Ok(Box::new(OfflineStream {
            state: Arc::clone(&self.state),
            generation: state.generation,
        }))
    }
}

struct OfflineStream {
    state: Arc<Mutex<OfflineState>>,
    generation: u64,
}

impl OfflineStream {
    fn with_current(&self, f: impl FnOnce(&mut OfflineState)) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.generation == self.generation {
            f(&mut state);
        }
    }
}

impl OutputStream for OfflineStream {
    fn resume(&mut self) -> Result<(), AudioError> {
        self.with_current(|state| state.suspended = false);
        Ok(())
    }

    fn suspend(&mut self) -> Result<(), AudioError> {
        self.with_current(|state| state.suspended = true);
        Ok(())
    }
}

impl Drop for OfflineStream {
    fn drop(&mut self) {
        self.with_current(|state| {
            state.renderer = None;
            state.suspended = false;
        });
    }
}
