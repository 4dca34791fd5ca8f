use thiserror::Error;

/// Everything that can go wrong between the host and the audio device.
///
/// Only [`AudioError::DeviceUnavailable`] ever reaches a caller. The other two
/// are produced by validation and resolved on the spot by clamping, because a
/// live instrument should go quiet rather than fail.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AudioError {
    /// The host has no usable audio output.
    #[error("audio device unavailable: {0}")]
    DeviceUnavailable(String),

    /// A caller-supplied value fell outside its accepted range.
    #[error("{name} = {value} is outside {min}..={max}")]
    InvalidParameterRange {
        name: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    /// An automation was scheduled for a time the device clock has already passed.
    #[error("schedule time {requested:.4}s is behind device time {now:.4}s")]
    StaleScheduleTime { requested: f64, now: f64 },
}

impl AudioError {
    pub fn device(reason: impl Into<String>) -> Self {
        Self::DeviceUnavailable(reason.into())
    }

    /// True for the one condition that disables a whole instrument.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::DeviceUnavailable(_))
    }
}
