use std::collections::VecDeque;

use super::{Automation, Curve, MIN_EXPONENTIAL_VALUE, SETTLE_TOLERANCE};

const PENDING_CAPACITY: usize = 16;

/// Render-side state of one automatable parameter.
///
/// Holds the current value plus the curves scheduled for the future, and is
/// advanced once per sample by the node that owns it.
#[derive(Debug, Clone)]
pub struct ParamTimeline {
    value: f32,
    active: Option<Segment>,
    pending: VecDeque<Automation>,
}

#[derive(Debug, Clone, Copy)]
struct Segment {
    start: f64,
    origin: f32,
    curve: Curve,
}

impl Segment {
    fn value_at(&self, time: f64) -> f32 {
        let elapsed = (time - self.start).max(0.0);
        match self.curve {
            Curve::Step(value) => value,
            Curve::Linear { target, duration } => {
                if elapsed >= duration {
                    target
                } else {
                    let progress = (elapsed / duration) as f32;
                    self.origin + (target - self.origin) * progress
                }
            }
            Curve::Exponential { target, duration } => {
                let to = target.max(MIN_EXPONENTIAL_VALUE);
                if elapsed >= duration {
                    to
                } else {
                    let from = self.origin.max(MIN_EXPONENTIAL_VALUE);
                    let progress = (elapsed / duration) as f32;
                    from * (to / from).powf(progress)
                }
            }
            Curve::Approach {
                target,
                time_constant,
            } => {
                let decay = (-elapsed / time_constant).exp() as f32;
                target + (self.origin - target) * decay
            }
        }
    }

    fn is_settled(&self, time: f64, value: f32) -> bool {
        match self.curve {
            Curve::Approach { target, .. } => {
                (value - target).abs() <= SETTLE_TOLERANCE * target.abs().max(1.0)
            }
            _ => time - self.start >= self.curve.settle_time(),
        }
    }
}

impl ParamTimeline {
    pub fn new(value: f32) -> Self {
        Self {
            value,
            active: None,
            pending: VecDeque::with_capacity(PENDING_CAPACITY),
        }
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    /// True while a curve is running or waiting to start.
    pub fn is_automating(&self) -> bool {
        self.active.is_some() || !self.pending.is_empty()
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Queue a curve. Curves with equal start times keep their insertion
    /// order, so "set 150 Hz, then glide down" scheduled together works.
    pub fn insert(&mut self, automation: Automation) {
        let index = self.pending.partition_point(|e| e.start <= automation.start);
        self.pending.insert(index, automation);
    }

    /// Advance to `time` and return the value there.
    pub fn advance(&mut self, time: f64) -> f32 {
        while self.pending.front().is_some_and(|e| e.start <= time) {
            let Some(next) = self.pending.pop_front() else {
                break;
            };
            let segment = Segment {
                start: next.start,
                origin: self.value,
                curve: next.curve,
            };
            self.value = segment.value_at(segment.start);
            self.active = Some(segment);
        }

        if let Some(segment) = self.active {
            let value = segment.value_at(time);
            if segment.is_settled(time, value) {
                self.value = segment.curve.target();
                if matches!(segment.curve, Curve::Exponential { .. }) {
                    self.value = self.value.max(MIN_EXPONENTIAL_VALUE);
                }
                self.active = None;
            } else {
                self.value = value;
            }
        }

        self.value
    }

    /// Drop every scheduled curve and hold the current value.
    pub fn cancel(&mut self) {
        self.pending.clear();
        self.active = None;
    }
}
