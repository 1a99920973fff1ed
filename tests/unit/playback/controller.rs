use super::*;
use crate::playback::scheduler::ManualScheduler;

const DAY: i64 = 86_400_000;

fn controller(days: i64) -> PlaybackController<ManualScheduler> {
    let state = PlaybackState::new(
        TimeMs(0),
        TimeMs(days * DAY),
        PeriodSpec::new(DAY, DAY).unwrap(),
        24.0,
    )
    .unwrap();
    PlaybackController::new(state, ManualScheduler::new())
}

/// Deliver ticks until none is pending, returning the `current` seen by each redraw.
fn run(c: &mut PlaybackController<ManualScheduler>) -> Vec<i64> {
    let mut seen = Vec::new();
    while let Some((h, _)) = c.scheduler_mut().next_due() {
        assert!(c.on_tick(h, &mut |s| seen.push(s.current.0)));
    }
    seen
}

#[test]
fn playing_forward_stops_at_range_end() {
    let mut c = controller(3);
    c.play(Direction::Forward);
    let seen = run(&mut c);

    assert_eq!(seen, [0, DAY, 2 * DAY, 3 * DAY, 3 * DAY]);
    assert!(!c.is_playing());
    assert_eq!(c.state().current, TimeMs(3 * DAY));
    assert!(c.pending_tick().is_none());
}

#[test]
fn playing_backward_clamps_to_range_start() {
    let mut c = controller(2);
    c.step(Direction::Forward, &mut |_| {});
    c.step(Direction::Forward, &mut |_| {});
    c.play(Direction::Backward);
    let seen = run(&mut c);
    assert_eq!(seen, [2 * DAY, DAY, 0, 0]);
    assert_eq!(c.state().current, TimeMs(0));
    assert!(c.state().paused);
}

#[test]
fn play_while_playing_keeps_a_single_tick() {
    let mut c = controller(10);
    c.play(Direction::Forward);
    c.play(Direction::Forward);
    assert_eq!(c.scheduler().pending_len(), 1);

    c.play(Direction::Backward);
    assert_eq!(c.scheduler().pending_len(), 1);
    assert_eq!(c.state().direction, Direction::Backward);
}

#[test]
fn ticks_are_spaced_by_periods_per_second() {
    let mut c = controller(10);
    c.play(Direction::Forward);
    let (h, delay) = c.scheduler_mut().next_due().unwrap();
    assert_eq!(delay, Duration::ZERO);
    c.on_tick(h, &mut |_| {});
    let (_, delay) = c.scheduler().pending().next().copied().unwrap();
    assert_eq!(delay, tick_interval(24.0));
}

#[test]
fn pause_cancels_the_pending_tick_and_redraws() {
    let mut c = controller(10);
    c.play(Direction::Forward);
    let (h, _) = c.scheduler().pending().next().copied().unwrap();

    let mut redraws = 0;
    c.pause(&mut |s| {
        assert!(s.paused);
        redraws += 1;
    });
    assert_eq!(redraws, 1);
    assert_eq!(c.scheduler().pending_len(), 0);
    assert_eq!(c.scheduler().cancelled_count(), 1);

    // a late delivery of the cancelled handle is ignored
    assert!(!c.on_tick(h, &mut |_| panic!("stale tick must not redraw")));
}

#[test]
fn stepping_visits_consecutive_periods_and_clamps() {
    let mut c = controller(2);
    let mut seen = Vec::new();
    for _ in 0..4 {
        c.step(Direction::Forward, &mut |s| seen.push(s.current.0));
    }
    assert_eq!(seen, [DAY, 2 * DAY, 2 * DAY, 2 * DAY]);

    c.step(Direction::Backward, &mut |_| {});
    assert_eq!(c.state().current, TimeMs(DAY));
    assert!(!c.is_playing());
}

#[test]
fn faster_and_slower_scale_by_root_two_and_start_playing() {
    let mut c = controller(10);
    c.faster().unwrap();
    assert!(c.is_playing());
    assert!((c.state().periods_per_second - 24.0 * SQRT_2).abs() < 1e-9);
    c.slower().unwrap();
    assert!((c.state().periods_per_second - 24.0).abs() < 1e-9);
    assert_eq!(c.scheduler().pending_len(), 1);
}

#[test]
fn invalid_speed_multipliers_are_rejected() {
    let mut c = controller(1);
    for bad in [0.0, -1.0, f64::NAN, f64::INFINITY] {
        assert!(c.set_speed(bad).unwrap_err().is_configuration());
    }
    assert_eq!(c.state().periods_per_second, 24.0);
}

#[test]
fn narrowing_the_range_clamps_current() {
    let mut c = controller(10);
    for _ in 0..8 {
        c.step(Direction::Forward, &mut |_| {});
    }
    c.set_range(TimeMs(DAY), TimeMs(5 * DAY), &mut |_| {}).unwrap();
    assert_eq!(c.state().current, TimeMs(5 * DAY));
    assert!(
        c.set_range(TimeMs(DAY), TimeMs(0), &mut |_| {})
            .unwrap_err()
            .is_configuration()
    );
}

#[test]
fn teardown_leaves_nothing_scheduled() {
    let mut c = controller(10);
    c.play(Direction::Forward);
    let (h, _) = c.scheduler_mut().next_due().unwrap();
    c.on_tick(h, &mut |_| {});
    c.teardown();
    assert_eq!(c.scheduler().pending_len(), 0);
    assert!(c.pending_tick().is_none());
    assert!(!c.is_playing());
}
