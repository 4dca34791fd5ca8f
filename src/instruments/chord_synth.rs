//! Chord touch synth.
//!
//! Three oscillators tuned to a chord run continuously through the shared
//! effect chain. The pointer retunes them and opens the master gain; lifting
//! it fades the gain out. Oscillators only stop on teardown, so there is no
//! attack click when a new gesture starts.
//!
//! The device is opened lazily on the first gesture, or explicitly with
//! [`ChordTouchSynth::initialize`].

use tracing::{debug, trace, warn};

use crate::{
    config::{DeviceConfig, SynthSettings},
    device::AudioBackend,
    dsp::oscillator::Waveform,
    error::AudioError,
    graph::{AudioGraph, OscillatorHandle},
    instruments::{
        chords::{chord_frequencies, CHORDS},
        pointer::{PointerEvent, PointerIndicator, PointerPosition, Surface},
    },
    ramp::ParameterRamp,
};

/// Master level while the pad is touched.
pub const PLAY_LEVEL: f32 = 0.5;
/// Time constant of every retune and fade, in seconds.
pub const GLIDE_TIME_CONSTANT: f64 = 0.1;
/// Root the oscillators sit at before the first gesture.
pub const INITIAL_FREQUENCY: f32 = 440.0;

pub const VOICES: usize = 3;

struct Session {
    graph: AudioGraph,
    oscillators: [OscillatorHandle; VOICES],
}

enum SynthState {
    Uninitialized,
    Ready(Session),
    /// Opening the device failed. Stays here until the next explicit initialize.
    Disabled(AudioError),
}

pub struct ChordTouchSynth {
    backend: Box<dyn AudioBackend>,
    config: DeviceConfig,
    settings: SynthSettings,
    state: SynthState,
    indicator: Option<PointerIndicator>,
    sounding: bool,
}

impl ChordTouchSynth {
    pub fn new(backend: impl AudioBackend + 'static, config: DeviceConfig, settings: SynthSettings) -> Self {
        Self {
            backend: Box::new(backend),
            config,
            settings,
            state: SynthState::Uninitialized,
            indicator: None,
            sounding: false,
        }
    }

    /// Open the device and start the oscillators. Any running session is torn
    /// down first.
    pub fn initialize(&mut self) -> Result<(), AudioError> {
        self.teardown();

        let mut graph = match AudioGraph::initialize(
            self.backend.as_ref(),
            &self.config,
            &self.settings.graph_settings(),
        ) {
            Ok(graph) => graph,
            Err(err) => {
                warn!(%err, "chord synth disabled");
                self.state = SynthState::Disabled(err.clone());
                return Err(err);
            }
        };

        let now = graph.context().current_time();
        let waveform = self.settings.waveform;
        let oscillators = CHORDS[0].frequencies(INITIAL_FREQUENCY).map(|frequency| {
            let ctx = graph.context_mut();
            let osc = ctx.create_oscillator(waveform, frequency);
            ctx.start(osc, now);
            graph.add_source(osc);
            osc
        });

        debug!(%waveform, "chord synth initialized");
        self.state = SynthState::Ready(Session { graph, oscillators });
        Ok(())
    }

    fn ensure_initialized(&mut self) {
        if matches!(self.state, SynthState::Uninitialized) {
            // A failure is recorded in the state and logged
            let _ = self.initialize();
        }
    }

    pub fn pointer_down(&mut self, event: PointerEvent, surface: &Surface) -> Option<PointerIndicator> {
        let position = surface.normalize(event)?;
        self.ensure_initialized();
        self.play(position, surface)
    }

    /// Moves sound whether or not a button is held. A drag past the edge
    /// keeps sounding at the clamped edge position.
    pub fn pointer_move(&mut self, event: PointerEvent, surface: &Surface) -> Option<PointerIndicator> {
        let position = surface.normalize(event)?;
        self.ensure_initialized();
        self.play(position, surface)
    }

    /// The host saw the pointer leave the pad. Releases like
    /// [`pointer_up`](Self::pointer_up).
    pub fn pointer_leave(&mut self) {
        if self.sounding {
            self.pointer_up();
        }
    }

    pub fn pointer_up(&mut self) {
        self.sounding = false;
        if let SynthState::Ready(session) = &mut self.state {
            let master = session.graph.master_gain();
            let ctx = session.graph.context_mut();
            let now = ctx.current_time();
            ctx.approach(master.gain(), 0.0, now, GLIDE_TIME_CONSTANT);
            trace!("chord synth released");
        }
    }

    fn play(&mut self, position: PointerPosition, surface: &Surface) -> Option<PointerIndicator> {
        let SynthState::Ready(session) = &mut self.state else {
            return None;
        };

        let targets = chord_frequencies(position.x, position.y);
        let master = session.graph.master_gain();
        let ctx = session.graph.context_mut();
        let now = ctx.current_time();
        for (osc, target) in session.oscillators.iter().zip(targets) {
            ctx.approach(osc.frequency(), target, now, GLIDE_TIME_CONSTANT);
        }
        ctx.approach(master.gain(), PLAY_LEVEL, now, GLIDE_TIME_CONSTANT);
        trace!(x = position.x, y = position.y, ?targets, "chord synth retuned");

        self.sounding = true;
        let indicator = PointerIndicator::new(position, surface);
        self.indicator = Some(indicator);
        Some(indicator)
    }

    /// Switch all oscillators at once. Remembered for the next initialize.
    pub fn set_waveform(&mut self, waveform: Waveform) {
        self.settings.waveform = waveform;
        if let SynthState::Ready(session) = &mut self.state {
            let ctx = session.graph.context_mut();
            for osc in session.oscillators {
                ctx.set_waveform(osc, waveform);
            }
        }
    }

    pub fn set_reverb_amount(&mut self, amount: f32) {
        self.settings = self.settings.clone().reverb_amount(amount);
        if let SynthState::Ready(session) = &mut self.state {
            session.graph.set_wet_mix(self.settings.reverb_amount);
        }
    }

    pub fn set_delay_time(&mut self, seconds: f32) {
        self.settings = self.settings.clone().delay_time(seconds);
        if let SynthState::Ready(session) = &mut self.state {
            session.graph.set_delay_time(self.settings.delay_time);
        }
    }

    /// Stop the oscillators and close the device. Safe to call repeatedly.
    pub fn teardown(&mut self) {
        self.sounding = false;
        if !self.is_ready() {
            return;
        }
        if let SynthState::Ready(mut session) =
            std::mem::replace(&mut self.state, SynthState::Uninitialized)
        {
            session.graph.teardown();
            debug!("chord synth torn down");
        }
    }

    pub fn indicator(&self) -> Option<PointerIndicator> {
        self.indicator
    }

    pub fn settings(&self) -> &SynthSettings {
        &self.settings
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state, SynthState::Ready(_))
    }

    pub fn is_disabled(&self) -> bool {
        matches!(self.state, SynthState::Disabled(_))
    }

    pub fn error(&self) -> Option<&AudioError> {
        match &self.state {
            SynthState::Disabled(err) => Some(err),
            _ => None,
        }
    }

    /// True between a gesture and its release.
    pub fn is_sounding(&self) -> bool {
        self.sounding
    }

    pub fn oscillators(&self) -> Option<[OscillatorHandle; VOICES]> {
        match &self.state {
            SynthState::Ready(session) => Some(session.oscillators),
            _ => None,
        }
    }

    pub fn graph(&self) -> Option<&AudioGraph> {
        match &self.state {
            SynthState::Ready(session) => Some(&session.graph),
            _ => None,
        }
    }
}

impl Drop for ChordTouchSynth {
    fn drop(&mut self) {
        self.teardown();
    }
}
