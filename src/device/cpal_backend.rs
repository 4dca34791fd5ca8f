use cpal::{
    traits::{DeviceTrait, HostTrait, StreamTrait},
    SampleFormat, SampleRate, SupportedStreamConfig, SupportedStreamConfigRange,
};
use tracing::{debug, error};

use super::{AudioBackend, OutputStream};
use crate::{error::AudioError, graph::GraphRenderer};

/// The host's default output device.
#[derive(Debug, Default, Clone, Copy)]
pub struct CpalBackend;

impl CpalBackend {
    pub fn new() -> Self {
        Self
    }

    fn device_and_config(&self) -> Result<(cpal::Device, cpal::SupportedStreamConfig), AudioError> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| AudioError::device("no default output device available"))?;
        let default = device
            .default_output_config()
            .map_err(|err| AudioError::device(format!("failed to fetch default output config: {err}")))?;
        if default.sample_format() == SampleFormat::F32 {
            return Ok((device, default));
        }

        let ranges = device
            .supported_output_configs()
            .map_err(|err| AudioError::device(format!("failed to list output configs: {err}")))?;
        match pick_f32_config(&default, ranges) {
            Some(config) => {
                debug!(default_format = ?default.sample_format(), "using an f32 output config instead of the default");
                Ok((device, config))
            }
            None => Err(AudioError::device(format!(
                "no f32 output config, default is {:?}",
                default.sample_format()
            ))),
        }
    }
}

/// Choose an f32 config close to the device default: same channel count
/// first, then one that covers the default rate. The rate is clamped into
/// the chosen range.
fn pick_f32_config(
    default: &SupportedStreamConfig,
    ranges: impl IntoIterator<Item = SupportedStreamConfigRange>,
) -> Option<SupportedStreamConfig> {
    let preferred = default.sample_rate().0;
    ranges
        .into_iter()
        .filter(|range| range.sample_format() == SampleFormat::F32)
        .max_by_key(|range| {
            (
                range.channels() == default.channels(),
                (range.min_sample_rate().0..=range.max_sample_rate().0).contains(&preferred),
            )
        })
        .map(|range| {
            let rate = preferred.clamp(range.min_sample_rate().0, range.max_sample_rate().0);
            range.with_sample_rate(SampleRate(rate))
        })
}

impl AudioBackend for CpalBackend {
    fn sample_rate(&self) -> Result<f32, AudioError> {
        let (_, config) = self.device_and_config()?;
        Ok(config.sample_rate().0 as f32)
    }

    fn start(&self, mut renderer: GraphRenderer) -> Result<Box<dyn OutputStream>, AudioError> {
        let (device, config) = self.device_and_config()?;
        let channels = config.channels() as usize;
        debug!(
            sample_rate = config.sample_rate().0,
            channels,
            "opening output stream"
        );

        let stream = device
            .build_output_stream(
                &config.into(),
                move |data: &mut [f32], _| renderer.fill_interleaved(data, channels),
                |err| error!(%err, "output stream error"),
                None,
            )
            .map_err(|err| AudioError::device(format!("failed to build output stream: {err}")))?;

        stream
            .play()
            .map_err(|err| AudioError::device(format!("failed to start output stream: {err}")))?;

        Ok(Box::new(CpalStream { stream }))
    }
}

struct CpalStream {
    stream: cpal::Stream,
}

impl OutputStream for CpalStream {
    fn resume(&mut self) -> Result<(), AudioError> {
        self.stream
            .play()
            .map_err(|err| AudioError::device(format!("failed to resume output stream: {err}")))
    }

    fn suspend(&mut self) -> Result<(), AudioError> {
        self.stream
            .pause()
            .map_err(|err| AudioError::device(format!("failed to pause output stream: {err}")))
    }
}
