//! Property tests for [`Timer`] under arbitrary update sequences.
//!
//! These tests feed `proptest`-generated `dt` sequences into timers and
//! verify that clamping, mark firing, and reset semantics hold regardless
//! of how the time steps are sliced.

use std::cell::RefCell;
use std::rc::Rc;

use proptest::prelude::*;
use zenith_ecs::prelude::*;

/// Strategy for a single frame delta: small positive finite values.
fn frame_dt() -> impl Strategy<Value = f32> {
    (1u32..5_000).prop_map(|millis| millis as f32 * 0.001)
}

/// Strategy for a timer duration: positive finite values up to ten seconds.
fn timer_duration() -> impl Strategy<Value = f32> {
    (100u32..10_000).prop_map(|millis| millis as f32 * 0.001)
}

/// Builds marks at evenly spaced fractions of `duration`, each appending its
/// trigger time into `log` when fired.
fn spaced_marks(duration: f32, count: usize, log: &Rc<RefCell<Vec<f32>>>) -> Vec<TimeMark> {
    (1..=count)
        .map(|i| {
            let time = duration * i as f32 / (count + 1) as f32;
            let log = Rc::clone(log);
            TimeMark::new(time, move || log.borrow_mut().push(time))
        })
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(2_000))]

    /// Elapsed time never exceeds the duration and the ratio stays in [0, 1],
    /// no matter how updates are sliced.
    #[test]
    fn elapsed_and_ratio_stay_in_range(
        duration in timer_duration(),
        dts in prop::collection::vec(frame_dt(), 1..40),
    ) {
        let mut timer = Timer::new(duration).unwrap();
        for dt in dts {
            timer.update(dt);
            prop_assert!(timer.elapsed() >= 0.0);
            prop_assert!(timer.elapsed() <= timer.duration());
            prop_assert!((0.0..=1.0).contains(&timer.ratio()));
            prop_assert_eq!(timer.is_finished(), timer.elapsed() >= timer.duration());
        }
    }

    /// `just_finished` is observed on exactly one update across any sequence
    /// whose total time reaches the duration.
    #[test]
    fn just_finished_fires_exactly_once(
        duration in timer_duration(),
        dts in prop::collection::vec(frame_dt(), 1..40),
    ) {
        let total: f32 = dts.iter().sum();
        prop_assume!(total >= duration);

        let mut timer = Timer::new(duration).unwrap();
        let mut transitions = 0;
        for dt in dts {
            timer.update(dt);
            if timer.just_finished() {
                transitions += 1;
            }
        }
        prop_assert_eq!(transitions, 1);
        prop_assert!(timer.is_finished());
    }

    /// A mark has fired exactly when the elapsed time has reached its trigger
    /// time, and fired marks plus pending marks always account for the full
    /// set. Firing order is ascending trigger time.
    #[test]
    fn marks_fire_when_crossed_and_in_order(
        duration in timer_duration(),
        mark_count in 1usize..6,
        dts in prop::collection::vec(frame_dt(), 1..40),
    ) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let marks = spaced_marks(duration, mark_count, &log);
        let times: Vec<f32> = marks.iter().map(TimeMark::time).collect();
        let mut timer = Timer::with_marks(duration, marks).unwrap();

        for dt in dts {
            timer.update(dt);

            let fired = log.borrow();
            prop_assert_eq!(fired.len() + timer.pending_marks(), mark_count);
            for &time in times.iter() {
                let expected = time <= timer.elapsed();
                prop_assert_eq!(fired.contains(&time), expected);
            }
            let mut sorted = fired.clone();
            sorted.sort_by(f32::total_cmp);
            prop_assert_eq!(&*fired, &sorted);
        }
    }

    /// Replaying the same update sequence after a reset fires the same marks
    /// again and lands on the same elapsed time.
    #[test]
    fn reset_replays_the_cycle(
        duration in timer_duration(),
        mark_count in 1usize..4,
        dts in prop::collection::vec(frame_dt(), 1..20),
    ) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let marks = spaced_marks(duration, mark_count, &log);
        let mut timer = Timer::with_marks(duration, marks).unwrap();

        for &dt in &dts {
            timer.update(dt);
        }
        let first_elapsed = timer.elapsed();
        let first_fired = log.borrow().len();

        timer.reset();
        prop_assert!(timer.is_at_beginning());
        prop_assert_eq!(timer.pending_marks(), mark_count);

        for &dt in &dts {
            timer.update(dt);
        }
        prop_assert_eq!(timer.elapsed(), first_elapsed);
        prop_assert_eq!(log.borrow().len(), first_fired * 2);
    }

    /// One large step and the same time split into many small steps both
    /// end finished with every mark fired, once each.
    #[test]
    fn slicing_does_not_change_outcomes(
        duration in timer_duration(),
        mark_count in 1usize..6,
        slices in 2usize..20,
    ) {
        let coarse_log = Rc::new(RefCell::new(Vec::new()));
        let mut coarse =
            Timer::with_marks(duration, spaced_marks(duration, mark_count, &coarse_log)).unwrap();
        coarse.update(duration);

        let fine_log = Rc::new(RefCell::new(Vec::new()));
        let mut fine =
            Timer::with_marks(duration, spaced_marks(duration, mark_count, &fine_log)).unwrap();
        for _ in 0..slices {
            fine.update(duration / slices as f32);
        }
        // Guard against accumulated rounding leaving the fine timer short.
        fine.update(duration);

        prop_assert!(coarse.is_finished());
        prop_assert!(fine.is_finished());
        prop_assert_eq!(&*coarse_log.borrow(), &*fine_log.borrow());
    }
}
