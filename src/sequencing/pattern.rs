/*
Drum Pattern
============

One bar of sixteenth notes per voice, as a grid of on/off cells:

            step  0 1 2 3   4 5 6 7   8 9 . .   . . . 15
    kick          x . . .   x . . .   x . . .   x . . .
    snare         . . . .   x . . .   . . . .   x . . .
    hihat         x . x .   x . x .   x . x .   x . x .

Steps 0, 4, 8 and 12 fall on the beat. The playhead walks the columns and
every voice with its cell set fires on that column.
*/

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::clock::STEPS;
use crate::voices::Voice;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrumPattern {
    rows: [[bool; STEPS]; Voice::COUNT],
}

impl DrumPattern {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip one cell. Returns the new state, or `None` when `step` is past
    /// the end of the bar.
    pub fn toggle(&mut self, voice: Voice, step: usize) -> Option<bool> {
        let cell = self.rows[voice.index()].get_mut(step)?;
        *cell = !*cell;
        Some(*cell)
    }

    pub fn is_active(&self, voice: Voice, step: usize) -> bool {
        self.rows[voice.index()].get(step).copied().unwrap_or(false)
    }

    pub fn row(&self, voice: Voice) -> &[bool; STEPS] {
        &self.rows[voice.index()]
    }

    /// Voices that fire on `step`, in kick, snare, hihat order.
    pub fn voices_at(&self, step: usize) -> impl Iterator<Item = Voice> + '_ {
        Voice::ALL
            .into_iter()
            .filter(move |&voice| self.is_active(voice, step))
    }

    pub fn active_count(&self) -> usize {
        self.rows.iter().flatten().filter(|&&cell| cell).count()
    }

    pub fn clear(&mut self) {
        self.rows = [[false; STEPS]; Voice::COUNT];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_empty() {
        let pattern = DrumPattern::new();
        assert_eq!(pattern.active_count(), 0);
        assert!((0..STEPS).all(|step| pattern.voices_at(step).next().is_none()));
    }

    #[test]
    fn toggle_flips_exactly_one_cell() {
        let mut pattern = DrumPattern::new();
        assert_eq!(pattern.toggle(Voice::Snare, 4), Some(true));
        assert!(pattern.is_active(Voice::Snare, 4));
        assert!(!pattern.is_active(Voice::Kick, 4));
        assert_eq!(pattern.active_count(), 1);

        assert_eq!(pattern.toggle(Voice::Snare, 4), Some(false));
        assert_eq!(pattern, DrumPattern::new());
    }

    #[test]
    fn out_of_range_steps_are_ignored() {
        let mut pattern = DrumPattern::new();
        assert_eq!(pattern.toggle(Voice::Kick, STEPS), None);
        assert!(!pattern.is_active(Voice::Kick, 99));
        assert_eq!(pattern.active_count(), 0);
    }

    #[test]
    fn voices_at_lists_the_column() {
        let mut pattern = DrumPattern::new();
        pattern.toggle(Voice::Hihat, 0);
        pattern.toggle(Voice::Kick, 0);

        let column: Vec<Voice> = pattern.voices_at(0).collect();
        assert_eq!(column, vec![Voice::Kick, Voice::Hihat]);

        pattern.clear();
        assert_eq!(pattern.active_count(), 0);
    }
}
