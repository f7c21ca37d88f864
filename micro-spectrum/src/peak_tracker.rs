extern crate alloc;

use alloc::{vec, vec::Vec};

use crate::config::{GRAVITY_DIVISOR, PEAK_FALL_FRAMES, PEAK_HOLD_FRAMES};

/// Peak state for the continuous model.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GravityState {
    pub held_level: f32,
    pub fall_velocity: f32,
}

/// Peak state for the discrete model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepHoldState {
    pub held_level: u32,
    pub hold_countdown: u32,
}

/// Per-column peaks that fall under constant acceleration.
///
/// A new level at or above the held one snaps the peak up and zeroes its
/// velocity. Otherwise the velocity grows by `gravity` each frame and the peak
/// falls by it, so a cap released from the top accelerates like a dropped
/// object. Levels are in pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct GravityPeaks {
    states: Vec<GravityState>,
    gravity: f32,
}

impl GravityPeaks {
    pub fn new(columns: usize, gravity: f32) -> Self {
        Self {
            states: vec![GravityState::default(); columns],
            gravity,
        }
    }

    /// Gravity scaled so a full-height fall takes about 90 frames.
    pub fn for_height(columns: usize, height: u32) -> Self {
        Self::new(columns, height as f32 / GRAVITY_DIVISOR)
    }

    /// Feeds this frame's level for `column` and returns the level to draw.
    ///
    /// # Panics
    /// If `column` is outside the tracker; callers size the tracker together
    /// with their column table.
    pub fn update(&mut self, column: usize, level: f32) -> f32 {
        let state = &mut self.states[column];
        if level >= state.held_level {
            state.held_level = level;
            state.fall_velocity = 0.0;
        } else {
            state.fall_velocity -= self.gravity;
            state.held_level = (state.held_level + state.fall_velocity).max(0.0);
        }
        state.held_level
    }

    pub fn state(&self, column: usize) -> Option<GravityState> {
        self.states.get(column).copied()
    }

    pub fn gravity(&self) -> f32 {
        self.gravity
    }

    pub fn columns(&self) -> usize {
        self.states.len()
    }

    /// Drops all state and reallocates for `columns`, every column zeroed.
    pub fn reset(&mut self, columns: usize) {
        self.states.clear();
        self.states.resize(columns, GravityState::default());
    }
}

/// Per-column peaks that hold, then step down one segment at a time.
///
/// Snap-up arms a `hold_frames` countdown. Each frame below the held level
/// counts down; at zero the peak drops exactly one segment and the countdown
/// re-arms with the shorter `fall_frames`. Levels are whole segments.
#[derive(Debug, Clone, PartialEq)]
pub struct StepHoldPeaks {
    states: Vec<StepHoldState>,
    hold_frames: u32,
    fall_frames: u32,
}

impl StepHoldPeaks {
    pub fn new(columns: usize, hold_frames: u32, fall_frames: u32) -> Self {
        Self {
            states: vec![StepHoldState::default(); columns],
            hold_frames: hold_frames.max(1),
            fall_frames: fall_frames.max(1),
        }
    }

    pub fn with_defaults(columns: usize) -> Self {
        Self::new(columns, PEAK_HOLD_FRAMES, PEAK_FALL_FRAMES)
    }

    /// # Panics
    /// If `column` is outside the tracker.
    pub fn update(&mut self, column: usize, level: u32) -> u32 {
        let state = &mut self.states[column];
        if level >= state.held_level {
            state.held_level = level;
            state.hold_countdown = self.hold_frames;
        } else {
            state.hold_countdown = state.hold_countdown.saturating_sub(1);
            if state.hold_countdown == 0 {
                state.held_level -= 1;
                state.hold_countdown = self.fall_frames;
            }
        }
        state.held_level
    }

    pub fn state(&self, column: usize) -> Option<StepHoldState> {
        self.states.get(column).copied()
    }

    pub fn columns(&self) -> usize {
        self.states.len()
    }

    pub fn reset(&mut self, columns: usize) {
        self.states.clear();
        self.states.resize(columns, StepHoldState::default());
    }
}

/// The peak model a render mode runs with.
#[derive(Debug, Clone, PartialEq)]
pub enum PeakTracker {
    Gravity(GravityPeaks),
    StepHold(StepHoldPeaks),
}

impl PeakTracker {
    /// Step-hold levels are truncated to whole segments on the way in.
    pub fn update(&mut self, column: usize, level: f32) -> f32 {
        match self {
            PeakTracker::Gravity(peaks) => peaks.update(column, level),
            PeakTracker::StepHold(peaks) => peaks.update(column, level.max(0.0) as u32) as f32,
        }
    }

    pub fn columns(&self) -> usize {
        match self {
            PeakTracker::Gravity(peaks) => peaks.columns(),
            PeakTracker::StepHold(peaks) => peaks.columns(),
        }
    }

    pub fn reset(&mut self, columns: usize) {
        match self {
            PeakTracker::Gravity(peaks) => peaks.reset(columns),
            PeakTracker::StepHold(peaks) => peaks.reset(columns),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_gravity_snaps_up_instantly() {
        let mut peaks = GravityPeaks::new(2, 1.0);
        assert_eq!(peaks.update(0, 40.0), 40.0);
        assert_eq!(peaks.state(0).unwrap().fall_velocity, 0.0);
        assert_eq!(peaks.update(0, 50.0), 50.0);
        assert_eq!(peaks.state(1), Some(GravityState::default()));
    }

    #[test]
    fn test_gravity_falls_with_increasing_speed() {
        let mut peaks = GravityPeaks::new(1, 0.5);
        peaks.update(0, 100.0);
        assert_abs_diff_eq!(peaks.update(0, 0.0), 99.5);
        assert_abs_diff_eq!(peaks.update(0, 0.0), 98.5);
        assert_abs_diff_eq!(peaks.update(0, 0.0), 97.0);
        assert_abs_diff_eq!(peaks.state(0).unwrap().fall_velocity, -1.5);
    }

    #[test]
    fn test_gravity_never_goes_negative() {
        let mut peaks = GravityPeaks::new(1, 10.0);
        peaks.update(0, 15.0);
        for _ in 0..20 {
            assert!(peaks.update(0, 0.0) >= 0.0);
        }
        assert_eq!(peaks.state(0).unwrap().held_level, 0.0);
    }

    #[test]
    fn test_gravity_converges_under_constant_input() {
        for &target in &[0.0f32, 3.0, 17.5, 63.0] {
            let mut peaks = GravityPeaks::for_height(1, 64);
            peaks.update(0, 64.0);
            let mut settled = Vec::new();
            for _ in 0..400 {
                settled.push(peaks.update(0, target));
            }
            let tail = &settled[300..];
            assert!(tail.iter().all(|&level| level == target), "target {}", target);
            assert!(settled.iter().all(|&level| level >= 0.0 && level <= 64.0));
        }
    }

    #[test]
    fn test_full_height_fall_takes_about_a_second_and_a_half() {
        let mut peaks = GravityPeaks::for_height(1, 64);
        peaks.update(0, 64.0);
        let frames = (1..).find(|_| peaks.update(0, 0.0) == 0.0).unwrap();
        assert!((80..=100).contains(&frames), "fell in {} frames", frames);
    }

    #[test]
    fn test_step_hold_drops_one_segment_after_hold() {
        let mut peaks = StepHoldPeaks::with_defaults(1);
        peaks.update(0, 10);
        for _ in 0..29 {
            assert_eq!(peaks.update(0, 3), 10);
        }
        assert_eq!(peaks.update(0, 3), 9);
        assert_eq!(
            peaks.state(0),
            Some(StepHoldState {
                held_level: 9,
                hold_countdown: 2
            })
        );
    }

    #[test]
    fn test_step_hold_falls_one_segment_per_fall_interval() {
        let mut peaks = StepHoldPeaks::new(1, 4, 2);
        peaks.update(0, 8);
        let trace: Vec<u32> = (0..12).map(|_| peaks.update(0, 0)).collect();
        assert_eq!(trace, vec![8, 8, 8, 7, 7, 6, 6, 5, 5, 4, 4, 3]);
    }

    #[test]
    fn test_step_hold_never_falls_while_level_holds() {
        let mut peaks = StepHoldPeaks::new(1, 3, 1);
        peaks.update(0, 5);
        for _ in 0..50 {
            assert_eq!(peaks.update(0, 5), 5);
        }
        peaks.update(0, 2);
        peaks.update(0, 2);
        assert_eq!(peaks.update(0, 2), 4);
        // re-reaching the held level re-arms the hold
        assert_eq!(peaks.update(0, 4), 4);
        assert_eq!(peaks.state(0).unwrap().hold_countdown, 3);
    }

    #[test]
    fn test_step_hold_meets_rising_level() {
        let mut peaks = StepHoldPeaks::new(1, 1, 1);
        peaks.update(0, 6);
        let trace: Vec<u32> = (0..6).map(|_| peaks.update(0, 4)).collect();
        assert_eq!(trace, vec![5, 4, 4, 4, 4, 4]);
    }

    #[test]
    fn test_reset_zeroes_and_resizes() {
        let mut tracker = PeakTracker::StepHold(StepHoldPeaks::with_defaults(3));
        tracker.update(1, 12.7);
        tracker.reset(5);
        assert_eq!(tracker.columns(), 5);
        if let PeakTracker::StepHold(peaks) = &tracker {
            assert!((0..5).all(|i| peaks.state(i) == Some(StepHoldState::default())));
        }

        let mut tracker = PeakTracker::Gravity(GravityPeaks::new(2, 1.0));
        assert_eq!(tracker.update(0, 12.5), 12.5);
        tracker.reset(1);
        assert_eq!(tracker.columns(), 1);
        assert_eq!(tracker.update(0, 0.0), 0.0);
    }

    #[test]
    fn test_columns_are_independent() {
        let mut peaks = StepHoldPeaks::new(2, 1, 1);
        peaks.update(0, 10);
        peaks.update(1, 10);
        peaks.update(0, 0);
        assert_eq!(peaks.state(0).unwrap().held_level, 9);
        assert_eq!(peaks.state(1).unwrap().held_level, 10);
    }
}
