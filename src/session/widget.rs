use std::collections::BTreeSet;

use chrono::NaiveDate;

use crate::bind::binder::{
    BindReport, Event, EventStyle, PeriodBuckets, bind, period_origin, rebind, rebucket,
};
use crate::eval::visibility::FrameCounts;
use crate::foundation::core::{Direction, TimeMs, TimeUnit, Viewport, secs_to_ms};
use crate::foundation::error::{ScopeError, ScopeResult};
use crate::foundation::time::LocalZone;
use crate::layout::places::PlaceLayout;
use crate::playback::controller::{PlaybackController, Redraw};
use crate::playback::scheduler::{Scheduler, TickHandle};
use crate::playback::state::{ActiveCategories, PeriodSpec, PlaybackState};
use crate::render::surface::{DrawSurface, draw_frame};
use crate::scene::document::InputDocument;
use crate::scene::model::{CategoryId, EventDef, LegendEntryDef, ScopeOptions};
use crate::session::legend::Legend;

/// One embedded visualization: places, bound events, playback and the surface they are drawn on.
///
/// Construction lays places out on the configured viewport; when the host knows its real size it
/// calls [`EventScope::rescale`]. Every command redraws through the surface as needed.
pub struct EventScope<S: Scheduler, D: DrawSurface> {
    options: ScopeOptions,
    zone: LocalZone,
    layout: PlaceLayout,
    events: Vec<Event>,
    report: BindReport,
    categories: BTreeSet<CategoryId>,
    origin: TimeMs,
    latest: TimeMs,
    buckets: Option<PeriodBuckets>,
    range_is_default: bool,
    controller: PlaybackController<S>,
    surface: D,
    legend: Option<Legend>,
    scale: f64,
    counts: FrameCounts,
}

impl<S: Scheduler, D: DrawSurface> std::fmt::Debug for EventScope<S, D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventScope")
            .field("events", &self.events.len())
            .field("places", &self.layout.len())
            .field("state", self.controller.state())
            .finish_non_exhaustive()
    }
}

impl<S: Scheduler, D: DrawSurface> EventScope<S, D> {
    pub fn initialize(doc: InputDocument, scheduler: S, surface: D) -> ScopeResult<Self> {
        Self::new(doc.events, doc.options, scheduler, surface)
    }

    /// Lay out places, bind and bucket events, and draw the first period (paused).
    #[tracing::instrument(skip_all, fields(events = defs.len()))]
    pub fn new(
        defs: Vec<EventDef>,
        options: ScopeOptions,
        scheduler: S,
        surface: D,
    ) -> ScopeResult<Self> {
        options.validate()?;
        if defs.is_empty() {
            return Err(ScopeError::configuration("event set is empty"));
        }

        let zone = LocalZone::from_offset_minutes(options.utc_offset_minutes)?;
        let layout = PlaceLayout::from_options(&options, &defs)?;
        let style = EventStyle {
            color: options.event_color,
            radius: options.event_radius,
        };
        let (events, report) = bind(&defs, &layout, &options.place_key, &zone, style)?;
        if !report.unresolved.is_empty() {
            tracing::warn!(
                skipped = report.unresolved.len(),
                "some events have no resolvable position"
            );
        }

        let origin = period_origin(&events, &zone)?;
        let latest = events.iter().map(|e| e.time).max().unwrap_or(origin);
        let periods = PeriodSpec::new(options.period_ms(), options.previous_period_ms())?;
        let range_end = grid_start(origin, periods.period_ms, latest);
        let state = PlaybackState::new(origin, range_end, periods, options.periods_per_second)?;
        let categories = events.iter().map(|e| e.category.clone()).collect();

        let legend = match options.legend.clone() {
            Some(entries) => Some(Legend::new(entries, options.legend_columns)?),
            None => None,
        };

        let mut scope = Self {
            zone,
            layout,
            events,
            report,
            categories,
            origin,
            latest,
            buckets: None,
            range_is_default: true,
            controller: PlaybackController::new(state, scheduler),
            surface,
            legend,
            scale: 1.0,
            counts: FrameCounts::default(),
            options,
        };
        scope.refresh()?;
        Ok(scope)
    }

    /// Recompute buckets and spread-out, then redraw.
    pub fn refresh(&mut self) -> ScopeResult<()> {
        self.buckets = None;
        self.ensure_buckets()?;
        self.paint();
        Ok(())
    }

    /// Lay the same places out on a new viewport and redraw.
    pub fn rescale(&mut self, viewport: Viewport) -> ScopeResult<()> {
        self.layout = self.layout.rescale(&viewport)?;
        self.options.viewport = viewport;
        rebind(&mut self.events, &self.layout);
        self.refresh()
    }

    /// Record the host's available size; returns the uniform scale for the whole interface.
    pub fn resize(&mut self, width: f64, height: f64) -> ScopeResult<f64> {
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            return Err(ScopeError::configuration(format!(
                "resize target must be positive (got {width}x{height})"
            )));
        }
        let scale = (width / self.options.interface_width)
            .min(height / self.options.interface_height);
        self.scale = scale;
        tracing::debug!(width, height, scale, "resized");
        Ok(scale)
    }

    pub fn add_legend(
        &mut self,
        entries: Vec<LegendEntryDef>,
        columns: usize,
    ) -> ScopeResult<&Legend> {
        let legend = Legend::new(entries, columns)?;
        Ok(self.legend.insert(legend))
    }

    pub fn play(&mut self, direction: Direction) -> ScopeResult<()> {
        self.ensure_buckets()?;
        self.controller.play(direction);
        Ok(())
    }

    pub fn pause(&mut self) -> ScopeResult<()> {
        self.ensure_buckets()?;
        self.drive(|c, redraw| c.pause(redraw));
        Ok(())
    }

    pub fn step(&mut self, direction: Direction) -> ScopeResult<()> {
        self.ensure_buckets()?;
        self.drive(|c, redraw| c.step(direction, redraw));
        Ok(())
    }

    pub fn set_speed(&mut self, multiplier: f64) -> ScopeResult<()> {
        self.controller.set_speed(multiplier)
    }

    pub fn faster(&mut self) -> ScopeResult<()> {
        self.ensure_buckets()?;
        self.controller.faster()
    }

    pub fn slower(&mut self) -> ScopeResult<()> {
        self.ensure_buckets()?;
        self.controller.slower()
    }

    pub fn set_range(&mut self, start: TimeMs, end: TimeMs) -> ScopeResult<()> {
        self.ensure_buckets()?;
        self.drive(|c, redraw| c.set_range(start, end, redraw))?;
        self.range_is_default = false;
        Ok(())
    }

    /// Range from calendar dates, both snapped onto the period grid; `end` names the last period.
    pub fn set_range_dates(&mut self, start: NaiveDate, end: NaiveDate) -> ScopeResult<()> {
        let period_ms = self.controller.state().periods.period_ms;
        let start = grid_start(self.origin, period_ms, self.zone.midnight_of(start)?);
        let end = grid_start(self.origin, period_ms, self.zone.midnight_of(end)?);
        self.set_range(start, end)
    }

    /// Show the period containing `t`, clamped to the range. Play state is unchanged.
    pub fn seek(&mut self, t: TimeMs) -> ScopeResult<()> {
        self.ensure_buckets()?;
        let st = self.controller.state();
        let target =
            grid_start(self.origin, st.periods.period_ms, t).clamp(st.range_start, st.range_end);
        self.drive(|c, redraw| c.seek(target, redraw));
        Ok(())
    }

    pub fn set_period(&mut self, length: f64, unit: TimeUnit) -> ScopeResult<()> {
        let period_ms = to_ms(length, unit)?;
        let periods = PeriodSpec::new(period_ms, self.controller.state().periods.previous_ms)?;
        self.options.period = length;
        self.options.period_units = unit;
        self.controller.set_periods(periods);
        if self.range_is_default {
            let end = grid_start(self.origin, period_ms, self.latest);
            let start = self.controller.state().range_start;
            self.controller.set_range(start, end, &mut |_| {})?;
        }
        self.invalidate()
    }

    pub fn set_previous_period(&mut self, length: f64, unit: TimeUnit) -> ScopeResult<()> {
        let previous_ms = to_ms(length, unit)?;
        let periods = PeriodSpec::new(self.controller.state().periods.period_ms, previous_ms)?;
        self.options.previous_period = Some(length);
        self.options.previous_period_units = unit;
        self.controller.set_periods(periods);
        self.invalidate()
    }

    /// Drop cached buckets. While playing the next tick rebuilds them; while paused redraw now.
    fn invalidate(&mut self) -> ScopeResult<()> {
        self.buckets = None;
        if self.controller.is_playing() {
            return Ok(());
        }
        self.refresh()
    }

    /// Show only `active` among the known categories; rebuckets and redraws once.
    pub fn set_active_categories(
        &mut self,
        active: impl IntoIterator<Item = CategoryId>,
    ) -> ScopeResult<()> {
        let active: BTreeSet<CategoryId> = active.into_iter().collect();
        let filter = ActiveCategories::only(self.known_categories().iter(), &active);
        self.apply_filter(filter)
    }

    /// Flip one category; returns whether it is active afterwards.
    pub fn toggle_category(&mut self, category: &CategoryId) -> ScopeResult<bool> {
        let mut filter = self.controller.state().active.clone();
        let now_active = filter.toggle(category);
        self.apply_filter(filter)?;
        Ok(now_active)
    }

    pub fn select_all(&mut self) -> ScopeResult<()> {
        self.apply_filter(ActiveCategories::all())
    }

    /// Switch off every legend category, or every event category when there is no legend.
    pub fn deselect_all(&mut self) -> ScopeResult<()> {
        let filter = match &self.legend {
            Some(legend) => legend.none_active(),
            None => ActiveCategories::only(self.categories.iter(), &BTreeSet::new()),
        };
        self.apply_filter(filter)
    }

    /// Deliver a tick from the scheduler. Stale handles are ignored and return `false`.
    pub fn on_tick(&mut self, handle: TickHandle) -> ScopeResult<bool> {
        self.ensure_buckets()?;
        Ok(self.drive(|c, redraw| c.on_tick(handle, redraw)))
    }

    /// Cancel pending ticks. Also runs on drop.
    pub fn teardown(&mut self) {
        self.controller.teardown();
    }

    /// Draw the current period onto another surface, overriding the paused flag.
    pub fn render_into(
        &mut self,
        surface: &mut dyn DrawSurface,
        paused: bool,
    ) -> ScopeResult<FrameCounts> {
        self.ensure_buckets()?;
        let mut state = self.controller.state().clone();
        state.paused = paused;
        Ok(draw_frame(surface, &self.layout, &self.events, &state, &self.zone))
    }

    /// Period buckets for the current period length and filter.
    pub fn buckets(&mut self) -> ScopeResult<&PeriodBuckets> {
        self.ensure_buckets()?;
        self.buckets
            .as_ref()
            .ok_or_else(|| ScopeError::configuration("buckets unavailable"))
    }

    pub fn state(&self) -> &PlaybackState {
        self.controller.state()
    }

    pub fn is_playing(&self) -> bool {
        self.controller.is_playing()
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn layout(&self) -> &PlaceLayout {
        &self.layout
    }

    pub fn report(&self) -> &BindReport {
        &self.report
    }

    pub fn legend(&self) -> Option<&Legend> {
        self.legend.as_ref()
    }

    pub fn options(&self) -> &ScopeOptions {
        &self.options
    }

    pub fn zone(&self) -> &LocalZone {
        &self.zone
    }

    /// Local midnight the period grid is anchored to.
    pub fn origin(&self) -> TimeMs {
        self.origin
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Marker counts of the last drawn frame.
    pub fn last_counts(&self) -> FrameCounts {
        self.counts
    }

    pub fn surface(&self) -> &D {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut D {
        &mut self.surface
    }

    pub fn scheduler(&self) -> &S {
        self.controller.scheduler()
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        self.controller.scheduler_mut()
    }

    fn known_categories(&self) -> BTreeSet<CategoryId> {
        let mut known = self.categories.clone();
        if let Some(legend) = &self.legend {
            known.extend(legend.categories().cloned());
        }
        known
    }

    fn apply_filter(&mut self, filter: ActiveCategories) -> ScopeResult<()> {
        let period_ms = self.controller.state().periods.period_ms;
        self.buckets = Some(rebucket(&mut self.events, self.origin, period_ms, &filter)?);
        self.drive(|c, redraw| c.set_active(filter, redraw));
        Ok(())
    }

    fn ensure_buckets(&mut self) -> ScopeResult<()> {
        if self.buckets.is_some() {
            return Ok(());
        }
        let st = self.controller.state();
        let buckets = rebucket(&mut self.events, self.origin, st.periods.period_ms, &st.active)?;
        self.buckets = Some(buckets);
        Ok(())
    }

    fn paint(&mut self) {
        self.drive(|c, redraw| c.redraw(redraw));
    }

    fn drive<R>(&mut self, f: impl FnOnce(&mut PlaybackController<S>, Redraw<'_>) -> R) -> R {
        let Self {
            controller,
            surface,
            layout,
            events,
            zone,
            counts,
            ..
        } = self;
        let mut paint = painter(surface, layout, events, zone, counts);
        f(controller, &mut paint)
    }
}

impl<S: Scheduler, D: DrawSurface> Drop for EventScope<S, D> {
    fn drop(&mut self) {
        self.teardown();
    }
}

fn painter<'a, D: DrawSurface>(
    surface: &'a mut D,
    layout: &'a PlaceLayout,
    events: &'a [Event],
    zone: &'a LocalZone,
    counts: &'a mut FrameCounts,
) -> impl FnMut(&PlaybackState) + 'a {
    move |state: &PlaybackState| *counts = draw_frame(&mut *surface, layout, events, state, zone)
}

/// Start of the period grid cell (anchored at `origin`) containing `t`.
fn grid_start(origin: TimeMs, period_ms: i64, t: TimeMs) -> TimeMs {
    let period_ms = period_ms.max(1);
    let k = t.0.saturating_sub(origin.0).div_euclid(period_ms);
    origin.shift(k.saturating_mul(period_ms))
}

fn to_ms(length: f64, unit: TimeUnit) -> ScopeResult<i64> {
    if !length.is_finite() || length < 0.0 {
        return Err(ScopeError::configuration(format!(
            "period length must be a finite, non-negative number (got {length})"
        )));
    }
    Ok(secs_to_ms(length * unit.seconds()))
}

#[cfg(test)]
#[path = "../../tests/unit/session/widget.rs"]
mod tests;
