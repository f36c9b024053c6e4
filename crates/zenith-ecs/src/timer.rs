//! Reusable countdown timer with schedulable time marks.
//!
//! A [`Timer`] advances from `0` to a fixed `duration` and can carry a set of
//! [`TimeMark`]s: callbacks that fire when the elapsed time crosses their
//! trigger time. The full mark set is immutable after construction; a
//! time-ordered queue is consumed during a cycle and refilled from the set on
//! [`reset`](Timer::reset), so one timer instance is reusable across many
//! activation cycles.
//!
//! # Quick Start
//!
//! ```
//! use zenith_ecs::timer::Timer;
//!
//! let mut timer = Timer::new(1.5).unwrap();
//! timer.update(1.0);
//! assert!(!timer.is_finished());
//! timer.update(1.0);
//! assert!(timer.is_finished());
//! assert!(timer.just_finished());
//! timer.update(1.0);
//! assert!(!timer.just_finished());
//! ```

use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Construction-time validation failures for [`Timer`].
///
/// These are authoring bugs, never clamped away.
#[derive(Debug, thiserror::Error)]
pub enum TimerError {
    /// The duration is negative or not finite.
    #[error("timer duration must be non-negative and finite, got {duration}")]
    InvalidDuration {
        /// The rejected duration.
        duration: f32,
    },

    /// A mark's trigger time falls outside `[0, duration]`.
    #[error("time mark at {time} is outside the timer range [0, {duration}]")]
    MarkOutOfRange {
        /// The rejected trigger time.
        time: f32,
        /// The timer duration the mark was checked against.
        duration: f32,
    },
}

// ---------------------------------------------------------------------------
// TimeMark
// ---------------------------------------------------------------------------

/// A scheduled callback tied to a trigger time within a timer's duration.
#[derive(Clone)]
pub struct TimeMark {
    time: f32,
    callback: Rc<dyn Fn()>,
}

impl TimeMark {
    /// A mark firing once per cycle when elapsed time reaches `time`.
    pub fn new(time: f32, callback: impl Fn() + 'static) -> Self {
        Self {
            time,
            callback: Rc::new(callback),
        }
    }

    /// The trigger time.
    #[inline]
    pub fn time(&self) -> f32 {
        self.time
    }
}

impl fmt::Debug for TimeMark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimeMark").field("time", &self.time).finish()
    }
}

// ---------------------------------------------------------------------------
// Timer
// ---------------------------------------------------------------------------

/// A count-up timer over a fixed duration with optional scheduled marks.
///
/// `finished` holds exactly when `elapsed >= duration`; `just_finished` is
/// true only for the single [`update`](Self::update) call on which that
/// transition happens.
pub struct Timer {
    elapsed: f32,
    duration: f32,
    just_finished: bool,
    /// Full mark set, sorted by trigger time, ties in insertion order.
    marks: Vec<TimeMark>,
    /// Marks still pending in the current cycle.
    queue: VecDeque<TimeMark>,
}

impl Timer {
    /// A timer with no marks, starting at zero.
    pub fn new(duration: f32) -> Result<Self, TimerError> {
        Self::with_marks(duration, Vec::new())
    }

    /// A timer carrying the given marks, starting at zero.
    ///
    /// Every mark's trigger time must lie in `[0, duration]`; a violating
    /// mark rejects construction.
    pub fn with_marks(duration: f32, mut marks: Vec<TimeMark>) -> Result<Self, TimerError> {
        if duration < 0.0 || !duration.is_finite() {
            return Err(TimerError::InvalidDuration { duration });
        }
        for mark in &marks {
            if mark.time < 0.0 || mark.time > duration || !mark.time.is_finite() {
                return Err(TimerError::MarkOutOfRange {
                    time: mark.time,
                    duration,
                });
            }
        }
        // Stable sort keeps insertion order among equal trigger times.
        marks.sort_by(|a, b| a.time.total_cmp(&b.time));
        let queue = marks.iter().cloned().collect();
        Ok(Self {
            elapsed: 0.0,
            duration,
            just_finished: false,
            marks,
            queue,
        })
    }

    /// A timer that starts already finished, with no marks.
    ///
    /// Models a window that is not currently active, e.g. an invincibility
    /// period waiting to be triggered by [`reset`](Self::reset).
    pub fn finished(duration: f32) -> Result<Self, TimerError> {
        let mut timer = Self::new(duration)?;
        timer.set_to_end();
        Ok(timer)
    }

    /// Advance the timer, clamping elapsed time to the duration and firing
    /// any marks whose trigger time has been reached.
    ///
    /// Due marks are drained from the queue before any callback runs, so a
    /// callback never observes the queue mid-iteration. Marks fire in
    /// ascending trigger-time order, ties in insertion order.
    pub fn update(&mut self, dt: f32) {
        let was_finished = self.is_finished();
        self.elapsed = (self.elapsed + dt).min(self.duration);

        let mut due = Vec::new();
        while self
            .queue
            .front()
            .is_some_and(|mark| mark.time <= self.elapsed)
        {
            if let Some(mark) = self.queue.pop_front() {
                due.push(mark);
            }
        }
        for mark in &due {
            (mark.callback)();
        }

        self.just_finished = !was_finished && self.is_finished();
    }

    /// Zero the elapsed time and reload the mark queue from the full set.
    ///
    /// Idempotent: resetting an already-reset timer is a no-op beyond
    /// clearing `just_finished`.
    pub fn reset(&mut self) {
        self.elapsed = 0.0;
        self.just_finished = false;
        self.queue = self.marks.iter().cloned().collect();
    }

    /// Jump straight to the finished state without firing any marks.
    pub fn set_to_end(&mut self) {
        self.elapsed = self.duration;
        self.just_finished = false;
        self.queue.clear();
    }

    /// Elapsed time in seconds, clamped to `[0, duration]`.
    #[inline]
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// The fixed duration in seconds.
    #[inline]
    pub fn duration(&self) -> f32 {
        self.duration
    }

    /// Completion ratio in `[0, 1]`. Zero-duration timers report `0`.
    pub fn ratio(&self) -> f32 {
        if self.duration > 0.0 {
            (self.elapsed / self.duration).min(1.0)
        } else {
            0.0
        }
    }

    /// Whether no time has elapsed this cycle.
    pub fn is_at_beginning(&self) -> bool {
        self.elapsed == 0.0
    }

    /// Whether the timer has reached its duration.
    pub fn is_finished(&self) -> bool {
        self.elapsed >= self.duration
    }

    /// True only on the update call where `finished` transitioned to true.
    pub fn just_finished(&self) -> bool {
        self.just_finished
    }

    /// Number of marks still pending in the current cycle.
    pub fn pending_marks(&self) -> usize {
        self.queue.len()
    }
}

impl fmt::Debug for Timer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Timer")
            .field("elapsed", &self.elapsed)
            .field("duration", &self.duration)
            .field("just_finished", &self.just_finished)
            .field("marks", &self.marks.len())
            .field("pending", &self.queue.len())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn recording_mark(time: f32, log: &Rc<RefCell<Vec<&'static str>>>, label: &'static str) -> TimeMark {
        let log = Rc::clone(log);
        TimeMark::new(time, move || log.borrow_mut().push(label))
    }

    // -- 1. Construction validation -----------------------------------------

    #[test]
    fn negative_duration_rejected() {
        assert!(matches!(
            Timer::new(-0.5),
            Err(TimerError::InvalidDuration { .. })
        ));
    }

    #[test]
    fn non_finite_duration_rejected() {
        assert!(Timer::new(f32::NAN).is_err());
        assert!(Timer::new(f32::INFINITY).is_err());
    }

    #[test]
    fn mark_outside_range_rejects_construction() {
        let marks = vec![TimeMark::new(2.5, || {})];
        assert!(matches!(
            Timer::with_marks(2.0, marks),
            Err(TimerError::MarkOutOfRange { .. })
        ));

        let negative = vec![TimeMark::new(-0.1, || {})];
        assert!(Timer::with_marks(2.0, negative).is_err());
    }

    #[test]
    fn zero_duration_is_immediately_finished() {
        let timer = Timer::new(0.0).unwrap();
        assert!(timer.is_finished());
        assert_eq!(timer.ratio(), 0.0);
    }

    // -- 2. Elapsed time and finish transition -------------------------------

    #[test]
    fn elapsed_clamps_to_duration() {
        let mut timer = Timer::new(1.0).unwrap();
        timer.update(5.0);
        assert_eq!(timer.elapsed(), 1.0);
        assert_eq!(timer.ratio(), 1.0);
    }

    #[test]
    fn just_finished_exactly_once() {
        let mut timer = Timer::new(0.3).unwrap();
        timer.update(0.1);
        assert!(!timer.just_finished());
        timer.update(0.1);
        assert!(!timer.just_finished());
        timer.update(0.1);
        assert!(timer.is_finished());
        assert!(timer.just_finished());
        timer.update(0.1);
        assert!(timer.is_finished());
        assert!(!timer.just_finished());
    }

    #[test]
    fn ratio_tracks_progress() {
        let mut timer = Timer::new(2.0).unwrap();
        assert!(timer.is_at_beginning());
        timer.update(0.5);
        assert_eq!(timer.ratio(), 0.25);
        assert!(!timer.is_at_beginning());
    }

    // -- 3. Marks -------------------------------------------------------------

    #[test]
    fn marks_fire_in_trigger_time_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let marks = vec![
            recording_mark(0.8, &log, "late"),
            recording_mark(0.2, &log, "early"),
            recording_mark(0.5, &log, "mid"),
        ];
        let mut timer = Timer::with_marks(1.0, marks).unwrap();

        timer.update(1.0);
        assert_eq!(*log.borrow(), vec!["early", "mid", "late"]);
    }

    #[test]
    fn mark_ties_fire_in_insertion_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let marks = vec![
            recording_mark(0.5, &log, "first"),
            recording_mark(0.5, &log, "second"),
        ];
        let mut timer = Timer::with_marks(1.0, marks).unwrap();

        timer.update(0.5);
        assert_eq!(*log.borrow(), vec!["first", "second"]);
    }

    #[test]
    fn marks_fire_once_per_cycle() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let marks = vec![recording_mark(0.2, &log, "hit")];
        let mut timer = Timer::with_marks(1.0, marks).unwrap();

        timer.update(0.3);
        timer.update(0.3);
        timer.update(0.6);
        assert_eq!(log.borrow().len(), 1);
    }

    #[test]
    fn marks_split_across_updates() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let marks = vec![
            recording_mark(0.2, &log, "a"),
            recording_mark(0.6, &log, "b"),
        ];
        let mut timer = Timer::with_marks(1.0, marks).unwrap();

        timer.update(0.3);
        assert_eq!(*log.borrow(), vec!["a"]);
        timer.update(0.3);
        assert_eq!(*log.borrow(), vec!["a", "b"]);
    }

    // -- 4. Reset and reuse ---------------------------------------------------

    #[test]
    fn reset_replays_identical_firing_sequence() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let marks = vec![
            recording_mark(0.25, &log, "a"),
            recording_mark(0.75, &log, "b"),
        ];
        let mut timer = Timer::with_marks(1.0, marks).unwrap();

        let dts = [0.3, 0.3, 0.5];
        for dt in dts {
            timer.update(dt);
        }
        let first_cycle = log.borrow().clone();

        timer.reset();
        assert!(timer.is_at_beginning());
        assert_eq!(timer.pending_marks(), 2);
        for dt in dts {
            timer.update(dt);
        }

        let both_cycles = log.borrow().clone();
        assert_eq!(both_cycles.len(), first_cycle.len() * 2);
        assert_eq!(&both_cycles[first_cycle.len()..], first_cycle.as_slice());
    }

    #[test]
    fn reset_is_idempotent() {
        let mut timer = Timer::with_marks(1.0, vec![TimeMark::new(0.5, || {})]).unwrap();
        timer.reset();
        timer.reset();
        assert!(timer.is_at_beginning());
        assert_eq!(timer.pending_marks(), 1);
    }

    #[test]
    fn set_to_end_skips_marks() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let marks = vec![recording_mark(0.5, &log, "skipped")];
        let mut timer = Timer::with_marks(1.0, marks).unwrap();

        timer.set_to_end();
        assert!(timer.is_finished());
        assert!(!timer.just_finished());
        timer.update(0.1);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn finished_constructor_starts_inactive() {
        let mut timer = Timer::finished(0.5).unwrap();
        assert!(timer.is_finished());
        timer.reset();
        assert!(!timer.is_finished());
        timer.update(0.5);
        assert!(timer.is_finished());
    }
}
