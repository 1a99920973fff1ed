use super::*;
use crate::foundation::core::Rgba8;
use crate::playback::scheduler::ManualScheduler;
use crate::render::surface::RecordingSurface;
use crate::scene::model::EventTime;

const DAY: i64 = 86_400_000;
const HOUR: i64 = 3_600_000;

type Scope = EventScope<ManualScheduler, RecordingSurface>;

fn ev(cat: &str, t: i64, place: &str) -> EventDef {
    EventDef::new(cat, TimeMs(t)).at_place("place", place)
}

fn three_days() -> Vec<EventDef> {
    vec![
        ev("fire", 10 * HOUR, "a"),
        ev("flood", DAY + 2 * HOUR, "b"),
        ev("fire", 2 * DAY + 5 * HOUR, "a"),
    ]
}

fn scope(defs: Vec<EventDef>) -> Scope {
    EventScope::new(
        defs,
        ScopeOptions::default(),
        ManualScheduler::new(),
        RecordingSurface::new(),
    )
    .unwrap()
}

fn run(scope: &mut Scope) {
    while let Some((h, _)) = scope.scheduler_mut().next_due() {
        scope.on_tick(h).unwrap();
    }
}

#[test]
fn initialization_draws_the_first_period_paused() {
    let s = scope(three_days());
    assert_eq!(s.origin(), TimeMs(0));
    assert_eq!(s.state().range_start, TimeMs(0));
    assert_eq!(s.state().range_end, TimeMs(2 * DAY));
    assert!(!s.is_playing());
    assert_eq!(s.surface().frame_count(), 1);
    assert_eq!(s.last_counts().current, 1);
    assert_eq!(s.layout().len(), 2);
}

#[test]
fn stepping_visits_each_day_in_order() {
    let mut s = scope(three_days());
    let mut starts = vec![s.state().current.0];
    for _ in 0..2 {
        s.step(Direction::Forward).unwrap();
        starts.push(s.state().current.0);
    }
    assert_eq!(starts, [0, DAY, 2 * DAY]);

    let labels: Vec<&str> = s
        .surface()
        .frames
        .iter()
        .map(|f| f.header.label.as_str())
        .collect();
    assert_eq!(labels, ["1970-01-01", "1970-01-02", "1970-01-03"]);
}

#[test]
fn playing_through_ends_paused_at_the_last_period() {
    let mut s = scope(three_days());
    s.play(Direction::Forward).unwrap();
    assert!(s.is_playing());
    run(&mut s);
    assert!(!s.is_playing());
    assert_eq!(s.state().current, TimeMs(2 * DAY));
    assert!(s.state().current <= s.state().range_end);
    assert_eq!(s.scheduler().pending_len(), 0);
}

#[test]
fn previous_period_appears_once_paused() {
    let mut s = scope(three_days());
    s.step(Direction::Forward).unwrap();
    let f = s.surface().last_frame().unwrap();
    assert_eq!(f.counts(), FrameCounts { current: 1, previous: 1 });

    s.play(Direction::Forward).unwrap();
    let (h, _) = s.scheduler_mut().next_due().unwrap();
    s.on_tick(h).unwrap();
    assert_eq!(s.last_counts(), FrameCounts { current: 1, previous: 0 });
}

#[test]
fn category_filter_hides_and_rebuckets() {
    let mut s = scope(vec![ev("fire", 0, "a"), ev("flood", 1, "a"), ev("fire", 2, "a")]);
    let spread_before: Vec<_> = s.events().iter().map(|e| e.display).collect();
    assert_ne!(spread_before[0], spread_before[1]);

    let frames = s.surface().frame_count();
    assert!(!s.toggle_category(&CategoryId::from("flood")).unwrap());
    assert_eq!(s.surface().frame_count(), frames + 1);
    assert_eq!(s.last_counts().current, 2);
    assert!(!s.is_playing());

    // the two remaining events now share the circle
    let r = 20.0 / std::f64::consts::TAU;
    let base = s.layout().places()[0].position;
    assert!(((s.events()[0].display - base).hypot() - r).abs() < 1e-9);

    s.select_all().unwrap();
    assert_eq!(s.last_counts().current, 3);
    s.deselect_all().unwrap();
    assert_eq!(s.last_counts().current, 0);
    s.set_active_categories([CategoryId::from("fire")]).unwrap();
    assert_eq!(s.last_counts().current, 2);
}

#[test]
fn legend_from_options_drives_deselect_all() {
    let mut opts = ScopeOptions::default();
    opts.legend = Some(vec![LegendEntryDef {
        category: CategoryId::from("fire"),
        label: "Fire".to_owned(),
        color: Some(Rgba8::rgb(255, 0, 0)),
        shape: None,
    }]);
    let mut s = EventScope::new(
        three_days(),
        opts,
        ManualScheduler::new(),
        RecordingSurface::new(),
    )
    .unwrap();
    assert_eq!(s.legend().unwrap().len(), 1);
    s.deselect_all().unwrap();
    assert!(!s.state().active.is_active(&CategoryId::from("fire")));
    assert!(s.state().active.is_active(&CategoryId::from("flood")));

    let legend = s.add_legend(Vec::new(), 3).unwrap();
    assert!(legend.is_empty());
}

#[test]
fn shorter_periods_regrid_the_default_range() {
    let mut s = scope(three_days());
    s.set_period(6.0, TimeUnit::Hours).unwrap();
    assert_eq!(s.state().periods.period_ms, 6 * HOUR);
    assert_eq!(s.state().range_end, TimeMs(2 * DAY));
    let b = s.buckets().unwrap();
    let starts: Vec<i64> = b.buckets.iter().map(|x| x.start.0).collect();
    assert_eq!(starts, [6 * HOUR, DAY, 2 * DAY]);

    assert!(s.set_period(0.0, TimeUnit::Days).unwrap_err().is_configuration());
    assert!(s.set_period(-1.0, TimeUnit::Days).is_err());
}

#[test]
fn period_edits_while_playing_apply_on_the_next_tick() {
    let mut s = scope(three_days());
    s.play(Direction::Forward).unwrap();
    let (h, _) = s.scheduler_mut().next_due().unwrap();
    s.on_tick(h).unwrap();
    assert_eq!(s.state().current, TimeMs(DAY));

    let frames = s.surface().frame_count();
    s.set_period(12.0, TimeUnit::Hours).unwrap();
    s.set_previous_period(6.0, TimeUnit::Hours).unwrap();
    assert!(s.is_playing());
    assert_eq!(s.scheduler().pending_len(), 1);
    assert_eq!(s.surface().frame_count(), frames);
    assert_eq!(s.state().periods.period_ms, 12 * HOUR);
    assert_eq!(s.state().periods.previous_ms, 6 * HOUR);

    let (h, _) = s.scheduler_mut().next_due().unwrap();
    s.on_tick(h).unwrap();
    let f = s.surface().last_frame().unwrap();
    assert_eq!(f.header.period_start, TimeMs(DAY));
    assert_eq!(f.header.label, "1970-01-02 00:00:00");
    assert_eq!(f.counts(), FrameCounts { current: 1, previous: 0 });
    assert_eq!(s.buckets().unwrap().period_ms, 12 * HOUR);
    assert_eq!(s.state().current, TimeMs(DAY + 12 * HOUR));

    // half a day with nothing in it
    let (h, _) = s.scheduler_mut().next_due().unwrap();
    s.on_tick(h).unwrap();
    assert_eq!(s.last_counts(), FrameCounts::default());

    // a day-long lookback would still show the flood from day two
    s.pause().unwrap();
    assert_eq!(s.state().current, TimeMs(2 * DAY));
    assert_eq!(s.last_counts(), FrameCounts { current: 1, previous: 0 });
}

#[test]
fn set_previous_period_redraws_when_paused() {
    let mut s = scope(three_days());
    s.step(Direction::Forward).unwrap();
    s.step(Direction::Forward).unwrap();
    assert_eq!(s.last_counts(), FrameCounts { current: 1, previous: 1 });

    let frames = s.surface().frame_count();
    s.set_previous_period(12.0, TimeUnit::Hours).unwrap();
    assert_eq!(s.surface().frame_count(), frames + 1);
    assert_eq!(s.last_counts(), FrameCounts { current: 1, previous: 0 });
    assert!(s.set_previous_period(f64::NAN, TimeUnit::Hours).unwrap_err().is_configuration());
}

#[test]
fn range_dates_snap_to_the_period_grid() {
    let mut s = scope(three_days());
    let d = |day| NaiveDate::from_ymd_opt(1970, 1, day).unwrap();
    s.set_range_dates(d(2), d(3)).unwrap();
    assert_eq!(s.state().range_start, TimeMs(DAY));
    assert_eq!(s.state().range_end, TimeMs(2 * DAY));
    assert_eq!(s.state().current, TimeMs(DAY));

    assert!(s.set_range_dates(d(3), d(2)).unwrap_err().is_configuration());
}

#[test]
fn seek_snaps_and_clamps() {
    let mut s = scope(three_days());
    s.seek(TimeMs(DAY + 7 * HOUR)).unwrap();
    assert_eq!(s.state().current, TimeMs(DAY));
    s.seek(TimeMs(40 * DAY)).unwrap();
    assert_eq!(s.state().current, TimeMs(2 * DAY));
}

#[test]
fn seek_to_extreme_instants_clamps_to_the_range() {
    let mut s = scope(three_days());
    s.seek(TimeMs(i64::MAX)).unwrap();
    assert_eq!(s.state().current, TimeMs(2 * DAY));
    s.seek(TimeMs(i64::MIN)).unwrap();
    assert_eq!(s.state().current, TimeMs(0));
}

#[test]
fn times_without_a_calendar_date_fail_construction() {
    let build = |defs| {
        EventScope::new(
            defs,
            ScopeOptions::default(),
            ManualScheduler::new(),
            RecordingSurface::new(),
        )
    };
    let err = build(vec![
        ev("a", -8_000_000_000_000_000, "p"),
        ev("a", 9_223_372_036_854_775_000, "p"),
    ])
    .unwrap_err();
    assert!(matches!(err, ScopeError::Data(_)));

    let s = build(vec![
        ev("a", -8_000_000_000_000_000, "p"),
        ev("a", 8_000_000_000_000_000, "p"),
    ])
    .unwrap();
    assert!(s.state().range_end > s.state().range_start);
}

#[test]
fn date_only_times_start_at_local_midnight() {
    let mut opts = ScopeOptions::default();
    opts.utc_offset_minutes = 120;
    let day = |d| EventTime::Date(NaiveDate::from_ymd_opt(2024, 3, d).unwrap());
    let defs = vec![
        EventDef::new("a", day(5)).at_place("place", "p"),
        EventDef::new("a", day(6)).at_place("place", "p"),
    ];
    let mut s =
        EventScope::new(defs, opts, ManualScheduler::new(), RecordingSurface::new()).unwrap();
    let first = s.zone().midnight_of(NaiveDate::from_ymd_opt(2024, 3, 5).unwrap()).unwrap();
    assert_eq!(s.events()[0].time, first);
    assert_eq!(s.origin(), first);
    assert_eq!(s.last_counts().current, 1);

    s.set_range_dates(
        NaiveDate::from_ymd_opt(2024, 3, 6).unwrap(),
        NaiveDate::from_ymd_opt(2024, 3, 6).unwrap(),
    )
    .unwrap();
    assert_eq!(s.state().current, s.events()[1].time);
    assert_eq!(s.last_counts().current, 1);
}

#[test]
fn resize_returns_the_uniform_scale() {
    let mut s = scope(three_days());
    let scale = s.resize(512.0, 786.0).unwrap();
    assert!((scale - 0.5).abs() < 1e-12);
    assert_eq!(s.scale(), scale);
    assert!(s.resize(0.0, 10.0).is_err());
}

#[test]
fn rescale_moves_markers_with_their_places() {
    let mut s = scope(three_days());
    let before = s.layout().places()[0].position;
    s.rescale(Viewport {
        view_width: 1400.0,
        view_height: 1000.0,
        horizontal_margin: 100.0,
        vertical_margin: 100.0,
    })
    .unwrap();
    let after = s.layout().places()[0].position;
    assert_ne!(before, after);
    let e = s.events().iter().find(|e| e.place == Some(crate::layout::places::PlaceIdx(0)));
    assert_eq!(e.unwrap().display, after);
}

#[test]
fn render_into_overrides_the_paused_flag() {
    let mut s = scope(three_days());
    s.step(Direction::Forward).unwrap();
    let mut other = RecordingSurface::new();
    let counts = s.render_into(&mut other, false).unwrap();
    assert_eq!(counts.previous, 0);
    assert!(!other.last_frame().unwrap().header.paused);
    assert!(s.state().paused);
}

#[test]
fn teardown_cancels_pending_ticks() {
    let mut s = scope(three_days());
    s.play(Direction::Forward).unwrap();
    assert_eq!(s.scheduler().pending_len(), 1);
    s.teardown();
    assert_eq!(s.scheduler().pending_len(), 0);
}

#[test]
fn unresolvable_events_are_counted_not_fatal() {
    let mut opts = ScopeOptions::default();
    opts.places = Some(vec![Some(crate::scene::model::PlaceDef {
        id: Some("a".into()),
        x: Some(1.0),
        y: Some(1.0),
        ..Default::default()
    })]);
    let s = EventScope::new(
        vec![ev("fire", 0, "a"), ev("fire", 1, "zzz")],
        opts,
        ManualScheduler::new(),
        RecordingSurface::new(),
    )
    .unwrap();
    assert_eq!(s.report().unresolved, [1]);
    assert_eq!(s.last_counts().current, 1);
}

#[test]
fn empty_input_fails_construction() {
    let err = EventScope::new(
        Vec::new(),
        ScopeOptions::default(),
        ManualScheduler::new(),
        RecordingSurface::new(),
    )
    .unwrap_err();
    assert!(err.is_configuration());
}
