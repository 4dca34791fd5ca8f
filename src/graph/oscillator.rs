use crate::{
    dsp::oscillator::{PhaseOscillator, Waveform},
    graph::node::{RenderCtx, StereoBlock},
    ramp::ParamTimeline,
};

/// Scheduled tone source.
///
/// Silent until its start time, plays until its stop time, and is silent
/// again afterwards. An oscillator can be started once; a second start is ignored.
pub struct OscillatorNode {
    osc: PhaseOscillator,
    frequency: ParamTimeline,
    start: Option<f64>,
    stop: Option<f64>,
}

impl OscillatorNode {
    pub fn new(waveform: Waveform, frequency: f32) -> Self {
        Self {
            osc: PhaseOscillator::new(waveform),
            frequency: ParamTimeline::new(frequency),
            start: None,
            stop: None,
        }
    }

    pub fn waveform(&self) -> Waveform {
        self.osc.waveform()
    }

    pub fn set_waveform(&mut self, waveform: Waveform) {
        self.osc.set_waveform(waveform);
    }

    pub fn frequency(&self) -> &ParamTimeline {
        &self.frequency
    }

    pub fn frequency_mut(&mut self) -> &mut ParamTimeline {
        &mut self.frequency
    }

    pub fn start_at(&mut self, time: f64) -> bool {
        if self.start.is_some() {
            return false;
        }
        self.start = Some(time);
        true
    }

    /// Schedule the stop. A later stop replaces an earlier one.
    pub fn stop_at(&mut self, time: f64) {
        self.stop = Some(time);
    }

    pub fn is_started(&self) -> bool {
        self.start.is_some()
    }

    /// Nothing left to play: never started, or past its stop time.
    pub fn is_finished(&self, time: f64) -> bool {
        match (self.start, self.stop) {
            (None, _) => true,
            (Some(_), Some(stop)) => time >= stop,
            (Some(_), None) => false,
        }
    }

    fn is_playing(&self, time: f64) -> bool {
        self.start.is_some_and(|start| time >= start) && self.stop.map_or(true, |stop| time < stop)
    }

    pub fn process(&mut self, output: &mut StereoBlock, ctx: &RenderCtx) {
        for i in 0..output.left.len() {
            let time = ctx.time_at(i);
            let frequency = self.frequency.advance(time);
            let sample = if self.is_playing(time) {
                self.osc.next_sample(frequency, ctx.sample_rate)
            } else {
                0.0
            };
            output.left[i] = sample;
            output.right[i] = sample;
        }
    }
}
