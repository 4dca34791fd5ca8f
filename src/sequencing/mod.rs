pub mod clock;
pub mod pattern;

pub use clock::{tick_interval, tick_interval_ms, SequencerClock, StepTimer, STEPS};
pub use pattern::DrumPattern;
