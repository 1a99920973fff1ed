use super::*;
use crate::bind::binder::{EventStyle, bind, rebucket};
use crate::foundation::core::{Rgba8, Viewport};
use crate::layout::places::PlaceStyle;
use crate::playback::state::{ActiveCategories, PeriodSpec};
use crate::scene::model::{EventDef, PlaceDef};

const DAY: i64 = 86_400_000;

fn fixture() -> (PlaceLayout, Vec<Event>) {
    let places = vec![
        Some(PlaceDef {
            id: Some(PlaceId::from("a")),
            x: Some(1.0),
            y: Some(1.0),
            ..PlaceDef::default()
        }),
        None,
    ];
    let defs = vec![
        EventDef::new("x", TimeMs(0)).at_place("place", "a"),
        EventDef::new("x", TimeMs(DAY + 1)).at_place("place", "a"),
        EventDef::new("y", TimeMs(DAY + 2)).at_place("place", "a"),
    ];
    let layout = PlaceLayout::compute(
        Some(&places),
        &defs,
        "place",
        &Viewport::default(),
        PlaceStyle {
            color: Rgba8::rgb(255, 192, 203),
            radius: Some(10.0),
        },
    )
    .unwrap();
    let (mut events, _) = bind(
        &defs,
        &layout,
        "place",
        &LocalZone::utc(),
        EventStyle {
            color: Rgba8::rgb(255, 0, 0),
            radius: 5.0,
        },
    )
    .unwrap();
    rebucket(&mut events, TimeMs(0), DAY, &ActiveCategories::all()).unwrap();
    (layout, events)
}

fn state(current: i64, paused: bool) -> PlaybackState {
    let mut s = PlaybackState::new(
        TimeMs(0),
        TimeMs(DAY),
        PeriodSpec::new(DAY, DAY).unwrap(),
        24.0,
    )
    .unwrap();
    s.current = TimeMs(current);
    s.paused = paused;
    s
}

#[test]
fn frame_draws_real_places_and_visible_markers() {
    let (layout, events) = fixture();
    let mut rec = RecordingSurface::new();
    let counts = draw_frame(&mut rec, &layout, &events, &state(DAY, true), &LocalZone::utc());

    assert_eq!(counts, FrameCounts { current: 2, previous: 1 });
    let f = rec.last_frame().unwrap();
    assert_eq!(f.places, [PlaceId::from("a")]);
    assert_eq!(f.counts(), counts);
    assert_eq!(f.header.label, "1970-01-02");
    assert!(f.header.paused);

    // previous markers come first so current ones paint over them
    assert_eq!(f.markers[0].visibility, Visibility::Previous);
    assert!(f.markers[1..].iter().all(|m| m.visibility == Visibility::Current));
}

#[test]
fn playing_frames_omit_the_previous_period() {
    let (layout, events) = fixture();
    let mut rec = RecordingSurface::new();
    draw_frame(&mut rec, &layout, &events, &state(DAY, false), &LocalZone::utc());
    let f = rec.last_frame().unwrap();
    assert_eq!(f.counts(), FrameCounts { current: 2, previous: 0 });
    assert!(f.marker(0).is_none());
}

#[test]
fn spread_positions_reach_the_surface() {
    let (layout, events) = fixture();
    let mut rec = RecordingSurface::new();
    draw_frame(&mut rec, &layout, &events, &state(DAY, false), &LocalZone::utc());
    let f = rec.last_frame().unwrap();
    let a = f.marker(1).unwrap().center;
    let b = f.marker(2).unwrap().center;
    assert_ne!(a, b);
    let base = layout.places()[0].position;
    let r = 20.0 / std::f64::consts::TAU;
    assert!(((a - base).hypot() - r).abs() < 1e-9);
}

#[test]
fn recording_ignores_draws_outside_a_frame() {
    let (layout, _) = fixture();
    let mut rec = RecordingSurface::new();
    rec.draw_place(&layout.places()[0]);
    rec.end_frame();
    assert_eq!(rec.frame_count(), 0);
}
