//! The shared effect chain both instruments play through.
//!
//! ```text
//!  sources ──► master gain ──► delay ──┬──► convolver ──► wet gain ──┐
//!                                      │                             ├──► destination
//!                                      └──────────────► dry gain ────┘
//! ```
//!
//! The wet and dry gains are built once and only ever ramped, so moving the
//! reverb slider never stacks up extra paths to the output.

use tracing::debug;

use crate::{
    config::{clamp_to_range, DeviceConfig, GraphSettings},
    device::AudioBackend,
    dsp::impulse::{fresh_seed, ImpulseResponse},
    error::AudioError,
    graph::{
        context::{AudioContext, ConvolverHandle, DelayHandle, GainHandle, OscillatorHandle},
        node::Endpoint,
    },
    ramp::ParameterRamp,
};

/// Time constant of wet/dry crossfades, in seconds.
pub const MIX_TIME_CONSTANT: f64 = 0.01;

pub struct AudioGraph {
    context: AudioContext,
    master: GainHandle,
    delay: DelayHandle,
    convolver: ConvolverHandle,
    wet: GainHandle,
    dry: GainHandle,
    sources: Vec<OscillatorHandle>,
    max_delay_time: f32,
    torn_down: bool,
}

impl AudioGraph {
    /// Open a device and build the chain. The master gain starts closed.
    pub fn initialize(
        backend: &dyn AudioBackend,
        config: &DeviceConfig,
        settings: &GraphSettings,
    ) -> Result<Self, AudioError> {
        let mut context = AudioContext::open(backend, config)?;

        let impulse = ImpulseResponse::noise(
            context.sample_rate(),
            settings.impulse_duration,
            settings.impulse_decay_power,
            fresh_seed(),
        );
        let wet_mix = clamp_to_range("wet_mix", settings.wet_mix, 0.0, 1.0);

        let master = context.create_gain(0.0);
        let delay = context.create_delay(settings.max_delay_time, settings.delay_time);
        let convolver = context.create_convolver(&impulse);
        let wet = context.create_gain(wet_mix);
        let dry = context.create_gain(1.0 - wet_mix);

        context.connect(master, delay);
        context.connect(delay, convolver);
        context.connect(convolver, wet);
        context.connect(wet, Endpoint::Destination);
        context.connect(delay, dry);
        context.connect(dry, Endpoint::Destination);

        debug!(
            sample_rate = context.sample_rate(),
            impulse_frames = impulse.len(),
            wet_mix,
            "audio graph initialized"
        );

        Ok(Self {
            context,
            master,
            delay,
            convolver,
            wet,
            dry,
            sources: Vec::new(),
            max_delay_time: settings.max_delay_time,
            torn_down: false,
        })
    }

    /// Crossfade between the reverb and the plain delayed signal.
    pub fn set_wet_mix(&mut self, amount: f32) {
        let amount = clamp_to_range("wet_mix", amount, 0.0, 1.0);
        let now = self.context.current_time();
        self.context
            .approach(self.wet.gain(), amount, now, MIX_TIME_CONSTANT);
        self.context
            .approach(self.dry.gain(), 1.0 - amount, now, MIX_TIME_CONSTANT);
    }

    pub fn set_delay_time(&mut self, seconds: f32) {
        let seconds = clamp_to_range("delay_time", seconds, 0.0, self.max_delay_time);
        let now = self.context.current_time();
        self.context
            .set_immediate(self.delay.delay_time(), seconds, now);
    }

    /// Feed an oscillator into the chain. It is stopped on teardown.
    pub fn add_source(&mut self, osc: OscillatorHandle) {
        self.context.connect(osc, self.master);
        self.sources.push(osc);
    }

    pub fn sources(&self) -> &[OscillatorHandle] {
        &self.sources
    }

    pub fn master_gain(&self) -> GainHandle {
        self.master
    }

    pub fn delay(&self) -> DelayHandle {
        self.delay
    }

    pub fn convolver(&self) -> ConvolverHandle {
        self.convolver
    }

    pub fn wet_gain(&self) -> GainHandle {
        self.wet
    }

    pub fn dry_gain(&self) -> GainHandle {
        self.dry
    }

    pub fn context(&self) -> &AudioContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut AudioContext {
        &mut self.context
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Stop every source, let go of every node and close the device.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;

        let now = self.context.current_time();
        for osc in self.sources.drain(..) {
            self.context.stop(osc, now);
            self.context.release(osc);
        }
        for node in [self.master, self.wet, self.dry] {
            self.context.release(node);
        }
        self.context.release(self.delay);
        self.context.release(self.convolver);

        self.context.close();
        debug!("audio graph torn down");
    }
}

impl Drop for AudioGraph {
    fn drop(&mut self) {
        self.teardown();
    }
}
