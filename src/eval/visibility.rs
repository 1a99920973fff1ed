use crate::bind::binder::Event;
use crate::foundation::core::{Point, Rgba8};
use crate::playback::state::PlaybackState;

/// Where hidden markers are parked; well outside any canvas.
pub const OFFSCREEN: Point = Point::new(-1000.0, -1000.0);

/// Opacity of image markers from the previous period.
pub const PREVIOUS_IMAGE_OPACITY: f32 = 0.25;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize)]
pub enum Visibility {
    Current,
    Previous,
    Hidden,
}

/// How a visible marker is painted.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct Emphasis {
    pub fill: Rgba8,
    pub stroke: Rgba8,
    pub opacity: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct Resolved {
    pub visibility: Visibility,
    pub position: Point,
    pub emphasis: Emphasis,
}

impl Resolved {
    pub fn is_visible(&self) -> bool {
        self.visibility != Visibility::Hidden
    }

    fn hidden(color: Rgba8) -> Self {
        Self {
            visibility: Visibility::Hidden,
            position: OFFSCREEN,
            emphasis: Emphasis {
                fill: color,
                stroke: Rgba8::WHITE,
                opacity: 0.0,
            },
        }
    }
}

/// Shapes other than the plain circle are drawn as images.
pub fn is_image_shape(shape: Option<&str>) -> bool {
    shape.is_some_and(|s| !s.is_empty() && !s.eq_ignore_ascii_case("circle"))
}

/// Visual state of `event` for the given playback state.
pub fn resolve(event: &Event, state: &PlaybackState) -> Resolved {
    if event.base.is_none() || !state.active.is_active(&event.category) {
        return Resolved::hidden(event.color);
    }

    if state.in_current_period(event.time) {
        return Resolved {
            visibility: Visibility::Current,
            position: event.display,
            emphasis: Emphasis {
                fill: event.color,
                stroke: Rgba8::WHITE,
                opacity: 1.0,
            },
        };
    }

    if state.in_previous_period(event.time) {
        let opacity = if is_image_shape(event.shape.as_deref()) {
            PREVIOUS_IMAGE_OPACITY
        } else {
            1.0
        };
        return Resolved {
            visibility: Visibility::Previous,
            position: event.display,
            emphasis: Emphasis {
                fill: Rgba8::WHITE,
                stroke: event.color,
                opacity,
            },
        };
    }

    Resolved::hidden(event.color)
}

/// Counts of visible markers in one frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct FrameCounts {
    pub current: usize,
    pub previous: usize,
}

/// Resolve every event, in slice order.
pub fn resolve_all(events: &[Event], state: &PlaybackState) -> (Vec<Resolved>, FrameCounts) {
    let mut counts = FrameCounts::default();
    let resolved = events
        .iter()
        .map(|e| {
            let r = resolve(e, state);
            match r.visibility {
                Visibility::Current => counts.current += 1,
                Visibility::Previous => counts.previous += 1,
                Visibility::Hidden => {}
            }
            r
        })
        .collect();
    (resolved, counts)
}

#[cfg(test)]
#[path = "../../tests/unit/eval/visibility.rs"]
mod tests;
