use crate::bind::binder::Event;
use crate::eval::visibility::{Emphasis, FrameCounts, Visibility, resolve};
use crate::foundation::core::{Point, TimeMs};
use crate::foundation::time::LocalZone;
use crate::layout::places::{Place, PlaceLayout};
use crate::playback::state::PlaybackState;
use crate::scene::model::{CategoryId, PlaceId};

/// Per-frame header shown above the canvas.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct FrameHeader {
    pub period_start: TimeMs,
    /// Date (or date and time) of the current period.
    pub label: String,
    pub paused: bool,
    pub width: f64,
    pub height: f64,
}

/// One event marker to draw.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct Marker {
    pub seq: usize,
    pub category: CategoryId,
    pub center: Point,
    pub radius: f64,
    pub visibility: Visibility,
    pub emphasis: Emphasis,
    pub shape: Option<String>,
    pub label: Option<String>,
}

/// Shape-drawing service the widget renders through.
///
/// Calls arrive as `begin_frame`, any number of `draw_place` / `draw_marker`, then `end_frame`.
pub trait DrawSurface {
    fn begin_frame(&mut self, header: &FrameHeader);
    fn draw_place(&mut self, place: &Place);
    fn draw_marker(&mut self, marker: &Marker);
    fn end_frame(&mut self);
}

impl<T: DrawSurface + ?Sized> DrawSurface for &mut T {
    fn begin_frame(&mut self, header: &FrameHeader) {
        (**self).begin_frame(header);
    }

    fn draw_place(&mut self, place: &Place) {
        (**self).draw_place(place);
    }

    fn draw_marker(&mut self, marker: &Marker) {
        (**self).draw_marker(marker);
    }

    fn end_frame(&mut self) {
        (**self).end_frame();
    }
}

/// A completed frame as seen by [`RecordingSurface`].
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct RecordedFrame {
    pub header: FrameHeader,
    pub places: Vec<PlaceId>,
    pub markers: Vec<Marker>,
}

impl RecordedFrame {
    pub fn counts(&self) -> FrameCounts {
        let mut counts = FrameCounts::default();
        for m in &self.markers {
            match m.visibility {
                Visibility::Current => counts.current += 1,
                Visibility::Previous => counts.previous += 1,
                Visibility::Hidden => {}
            }
        }
        counts
    }

    pub fn marker(&self, seq: usize) -> Option<&Marker> {
        self.markers.iter().find(|m| m.seq == seq)
    }
}

/// Surface that keeps every frame in memory.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    pub frames: Vec<RecordedFrame>,
    open: Option<RecordedFrame>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_frame(&self) -> Option<&RecordedFrame> {
        self.frames.last()
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn clear(&mut self) {
        self.frames.clear();
        self.open = None;
    }
}

impl DrawSurface for RecordingSurface {
    fn begin_frame(&mut self, header: &FrameHeader) {
        self.open = Some(RecordedFrame {
            header: header.clone(),
            places: Vec::new(),
            markers: Vec::new(),
        });
    }

    fn draw_place(&mut self, place: &Place) {
        if let Some(f) = self.open.as_mut() {
            f.places.push(place.id.clone());
        }
    }

    fn draw_marker(&mut self, marker: &Marker) {
        if let Some(f) = self.open.as_mut() {
            f.markers.push(marker.clone());
        }
    }

    fn end_frame(&mut self) {
        if let Some(f) = self.open.take() {
            self.frames.push(f);
        }
    }
}

/// Draw one frame: places, then previous-period markers, then current-period markers on top.
pub fn draw_frame(
    surface: &mut dyn DrawSurface,
    layout: &PlaceLayout,
    events: &[Event],
    state: &PlaybackState,
    zone: &LocalZone,
) -> FrameCounts {
    let viewport = layout.viewport();
    surface.begin_frame(&FrameHeader {
        period_start: state.current,
        label: zone.period_label(state.current, state.periods.period_ms),
        paused: state.paused,
        width: viewport.view_width,
        height: viewport.view_height,
    });

    for place in layout.places().iter().filter(|p| !p.placeholder) {
        surface.draw_place(place);
    }

    let mut counts = FrameCounts::default();
    let mut current = Vec::new();
    for event in events {
        let r = resolve(event, state);
        let marker = || Marker {
            seq: event.seq,
            category: event.category.clone(),
            center: r.position,
            radius: event.radius,
            visibility: r.visibility,
            emphasis: r.emphasis,
            shape: event.shape.clone(),
            label: event.label.clone(),
        };
        match r.visibility {
            Visibility::Previous => {
                counts.previous += 1;
                surface.draw_marker(&marker());
            }
            Visibility::Current => {
                counts.current += 1;
                current.push(marker());
            }
            Visibility::Hidden => {}
        }
    }
    for m in &current {
        surface.draw_marker(m);
    }

    surface.end_frame();
    counts
}

#[cfg(test)]
#[path = "../../tests/unit/render/surface.rs"]
mod tests;
