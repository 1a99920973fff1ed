//! eventscope animates discrete events at fixed places, one time period at a time.
//!
//! - Load an [`InputDocument`] (events plus [`ScopeOptions`])
//! - Create an [`EventScope`] with a [`Scheduler`] and a [`DrawSurface`]
//! - Drive it with transport commands (`play`, `pause`, `step`, ...) and deliver scheduled ticks
//!   through [`EventScope::on_tick`]
#![forbid(unsafe_code)]

mod foundation;

/// Spread-out and period bucketing of bound events.
pub mod bind;
/// Per-event visibility for a playback state.
pub mod eval;
/// Place positioning.
pub mod layout;
/// Transport state machine and tick scheduling.
pub mod playback;
/// Drawing surfaces.
pub mod render;
pub mod scene;
/// The widget and its legend.
pub mod session;

pub use crate::foundation::core::{
    Direction, Point, Rect, Rgba8, TimeMs, TimeUnit, Vec2, Viewport, secs_to_ms,
};
pub use crate::foundation::error::{ScopeError, ScopeResult};
pub use crate::foundation::time::{LocalZone, parse_timestamp};

pub use crate::bind::binder::{BindReport, Event, PeriodBucket, PeriodBuckets};
pub use crate::eval::visibility::{Emphasis, FrameCounts, Resolved, Visibility};
pub use crate::layout::places::{Place, PlaceIdx, PlaceLayout};
pub use crate::playback::controller::PlaybackController;
pub use crate::playback::scheduler::{ManualScheduler, Scheduler, SleepScheduler, TickHandle};
pub use crate::playback::state::{ActiveCategories, PeriodSpec, PlaybackState};
#[cfg(feature = "cpu")]
pub use crate::render::cpu::{CpuSurface, FrameRGBA};
pub use crate::render::surface::{
    DrawSurface, FrameHeader, Marker, RecordedFrame, RecordingSurface, draw_frame,
};
pub use crate::scene::document::InputDocument;
pub use crate::scene::model::{
    CategoryId, EventDef, EventTime, LegendEntryDef, PlaceDef, PlaceId, ScopeOptions,
};
pub use crate::session::legend::{Legend, LegendKey};
pub use crate::session::widget::EventScope;
