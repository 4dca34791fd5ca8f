//! Sixteen-step drum machine.
//!
//! The host loop calls [`DrumSequencer::poll`] often (every few ms). Each due
//! tick fires the voices set on the current step at the device's current
//! time, then moves the playhead one step.

use std::time::Instant;

use tracing::{debug, trace, warn};

use crate::{
    config::{DeviceConfig, SequencerSettings},
    device::AudioBackend,
    error::AudioError,
    graph::AudioContext,
    ramp::ParameterRamp,
    sequencing::{DrumPattern, SequencerClock, StepTimer},
    voices::{self, Voice},
};

pub struct DrumSequencer {
    backend: Box<dyn AudioBackend>,
    config: DeviceConfig,
    context: Option<AudioContext>,
    pattern: DrumPattern,
    clock: SequencerClock,
    timer: Option<StepTimer>,
}

impl DrumSequencer {
    /// Opens the device right away. If that fails the sequencer still works
    /// as an editor and retries on [`start`](Self::start).
    pub fn new(backend: impl AudioBackend + 'static, config: DeviceConfig, settings: SequencerSettings) -> Self {
        let backend: Box<dyn AudioBackend> = Box::new(backend);
        let context = match AudioContext::open(backend.as_ref(), &config) {
            Ok(context) => Some(context),
            Err(err) => {
                warn!(%err, "drum sequencer has no audio device");
                None
            }
        };

        Self {
            backend,
            config,
            context,
            pattern: DrumPattern::new(),
            clock: SequencerClock::new(settings.bpm),
            timer: None,
        }
    }

    /// Flip one cell of the grid. Steps past the end are ignored.
    pub fn toggle_step(&mut self, voice: Voice, step: usize) -> Option<bool> {
        let state = self.pattern.toggle(voice, step);
        if state.is_none() {
            trace!(%voice, step, "toggle outside the pattern ignored");
        }
        state
    }

    pub fn start(&mut self, now: Instant) -> Result<(), AudioError> {
        if self.clock.is_running() {
            return Ok(());
        }

        if self.context.is_none() {
            let opened = AudioContext::open(self.backend.as_ref(), &self.config).map_err(|err| {
                warn!(%err, "cannot start without an audio device");
                err
            })?;
            self.context = Some(opened);
        }
        if let Some(context) = self.context.as_mut() {
            context.resume()?;
        }

        self.clock.set_running(true);
        self.timer = Some(StepTimer::start(self.clock.interval(), now));
        debug!(bpm = self.clock.bpm(), step = self.clock.current_step(), "sequencer started");
        Ok(())
    }

    /// Halt the timer. The playhead stays where it is.
    pub fn stop(&mut self) {
        if !self.clock.is_running() {
            return;
        }
        self.timer = None;
        self.clock.set_running(false);
        debug!(step = self.clock.current_step(), "sequencer stopped");
    }

    /// Play button. Returns whether the sequencer is running afterwards.
    pub fn toggle_playback(&mut self, now: Instant) -> Result<bool, AudioError> {
        if self.clock.is_running() {
            self.stop();
        } else {
            self.start(now)?;
        }
        Ok(self.clock.is_running())
    }

    /// Change tempo. A running timer restarts at the new interval from `now`;
    /// the playhead and pattern are untouched.
    pub fn set_bpm(&mut self, bpm: u32, now: Instant) -> u32 {
        let bpm = self.clock.set_bpm(bpm);
        if let Some(timer) = self.timer.as_mut() {
            timer.reconfigure(self.clock.interval(), now);
        }
        debug!(bpm, "sequencer tempo changed");
        bpm
    }

    /// Fire every tick that is due at `now`. Returns how many fired.
    pub fn poll(&mut self, now: Instant) -> usize {
        let Some(timer) = self.timer.as_mut() else {
            return 0;
        };
        let ticks = timer.due_ticks(now);
        for _ in 0..ticks {
            self.tick();
        }
        ticks
    }

    fn tick(&mut self) {
        let step = self.clock.current_step();
        if let Some(ctx) = self.context.as_mut() {
            let at = ctx.current_time();
            for voice in self.pattern.voices_at(step) {
                voices::trigger(ctx, voice, at);
            }
        }
        trace!(step, "sequencer tick");
        self.clock.advance();
    }

    /// Stop and close the device. Safe to call repeatedly.
    pub fn teardown(&mut self) {
        self.stop();
        if let Some(mut context) = self.context.take() {
            context.close();
            debug!("drum sequencer torn down");
        }
    }

    pub fn pattern(&self) -> &DrumPattern {
        &self.pattern
    }

    pub fn current_step(&self) -> usize {
        self.clock.current_step()
    }

    pub fn is_running(&self) -> bool {
        self.clock.is_running()
    }

    pub fn bpm(&self) -> u32 {
        self.clock.bpm()
    }

    pub fn has_device(&self) -> bool {
        self.context.is_some()
    }

    pub fn context(&self) -> Option<&AudioContext> {
        self.context.as_ref()
    }
}

impl Drop for DrumSequencer {
    fn drop(&mut self) {
        self.teardown();
    }
}
