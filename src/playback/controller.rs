use std::f64::consts::SQRT_2;
use std::time::Duration;

use crate::foundation::core::{Direction, TimeMs};
use crate::foundation::error::{ScopeError, ScopeResult};
use crate::playback::scheduler::{Scheduler, TickHandle};
use crate::playback::state::{ActiveCategories, PeriodSpec, PlaybackState};

/// Redraw callback; receives the state to draw.
pub type Redraw<'a> = &'a mut dyn FnMut(&PlaybackState);

/// Transport state machine: `Paused` or `Playing(direction)`.
///
/// At most one tick is outstanding at any time. Every command takes `&mut self`, so commands and
/// ticks are serialized by construction.
#[derive(Debug)]
pub struct PlaybackController<S> {
    state: PlaybackState,
    scheduler: S,
    pending: Option<TickHandle>,
}

impl<S: Scheduler> PlaybackController<S> {
    pub fn new(state: PlaybackState, scheduler: S) -> Self {
        Self {
            state,
            scheduler,
            pending: None,
        }
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    pub fn is_playing(&self) -> bool {
        !self.state.paused
    }

    pub fn pending_tick(&self) -> Option<TickHandle> {
        self.pending
    }

    /// Start playing in `direction`. While already playing only the direction changes.
    pub fn play(&mut self, direction: Direction) {
        self.state.direction = direction;
        if !self.state.paused {
            return;
        }
        self.state.paused = false;
        tracing::debug!(?direction, current = self.state.current.0, "play");
        // first tick draws the current period before advancing
        self.schedule_tick(Duration::ZERO);
    }

    pub fn pause(&mut self, redraw: Redraw<'_>) {
        self.state.paused = true;
        self.cancel_pending();
        tracing::debug!(current = self.state.current.0, "pause");
        redraw(&self.state);
    }

    /// Move exactly one period, clamped to the range. Play state is unchanged.
    pub fn step(&mut self, direction: Direction, redraw: Redraw<'_>) {
        let delta = direction.sign() * self.state.periods.period_ms;
        self.state.current = self
            .state
            .current
            .shift(delta)
            .clamp(self.state.range_start, self.state.range_end);
        redraw(&self.state);
    }

    /// Jump to `target`, clamped to the range. Play state is unchanged.
    pub fn seek(&mut self, target: TimeMs, redraw: Redraw<'_>) {
        self.state.current = target.clamp(self.state.range_start, self.state.range_end);
        redraw(&self.state);
    }

    /// Scale the playback speed. Any finite positive multiplier is accepted.
    pub fn set_speed(&mut self, multiplier: f64) -> ScopeResult<()> {
        if !(multiplier.is_finite() && multiplier > 0.0) {
            return Err(ScopeError::configuration(format!(
                "speed multiplier must be finite and > 0 (got {multiplier})"
            )));
        }
        let pps = self.state.periods_per_second * multiplier;
        if !(pps.is_finite() && pps > 0.0) {
            return Err(ScopeError::configuration(format!(
                "periods per second out of range ({pps})"
            )));
        }
        self.state.periods_per_second = pps;
        Ok(())
    }

    /// Speed up by √2 and start playing if paused.
    pub fn faster(&mut self) -> ScopeResult<()> {
        self.set_speed(SQRT_2)?;
        self.play(self.state.direction);
        Ok(())
    }

    /// Slow down by √2 and start playing if paused.
    pub fn slower(&mut self) -> ScopeResult<()> {
        self.set_speed(1.0 / SQRT_2)?;
        self.play(self.state.direction);
        Ok(())
    }

    pub fn set_range(&mut self, start: TimeMs, end: TimeMs, redraw: Redraw<'_>) -> ScopeResult<()> {
        if start > end {
            return Err(ScopeError::configuration(format!(
                "range start {} is after range end {}",
                start.0, end.0
            )));
        }
        self.state.range_start = start;
        self.state.range_end = end;
        self.state.current = self.state.current.clamp(start, end);
        redraw(&self.state);
        Ok(())
    }

    /// Replace period lengths. Playback keeps running; the caller owns bucket invalidation.
    pub fn set_periods(&mut self, periods: PeriodSpec) {
        self.state.periods = periods;
    }

    pub fn set_active(&mut self, active: ActiveCategories, redraw: Redraw<'_>) {
        self.state.active = active;
        redraw(&self.state);
    }

    pub fn redraw(&self, redraw: Redraw<'_>) {
        redraw(&self.state);
    }

    /// Deliver a scheduled tick. Returns `false` for stale or cancelled handles.
    pub fn on_tick(&mut self, handle: TickHandle, redraw: Redraw<'_>) -> bool {
        if self.pending != Some(handle) {
            tracing::trace!(?handle, "ignoring stale tick");
            return false;
        }
        self.pending = None;

        redraw(&self.state);
        if self.state.paused {
            return true;
        }

        let st = &mut self.state;
        let next = st.current.shift(st.direction.sign() * st.periods.period_ms);
        let past_start = st.direction == Direction::Backward && next < st.range_start;
        let past_end = st.direction == Direction::Forward && next > st.range_end;
        if past_start || past_end {
            st.current = if past_start {
                st.range_start
            } else {
                st.range_end
            };
            st.paused = true;
            tracing::debug!(current = st.current.0, "reached range boundary, pausing");
            redraw(&self.state);
            return true;
        }

        st.current = next;
        tracing::trace!(current = st.current.0, "tick");
        let delay = tick_interval(st.periods_per_second);
        self.schedule_tick(delay);
        true
    }

    /// Cancel any pending tick; no tick fires after this.
    pub fn teardown(&mut self) {
        self.state.paused = true;
        self.cancel_pending();
    }

    fn schedule_tick(&mut self, delay: Duration) {
        self.cancel_pending();
        self.pending = Some(self.scheduler.schedule(delay));
    }

    fn cancel_pending(&mut self) {
        if let Some(h) = self.pending.take() {
            self.scheduler.cancel(h);
        }
    }
}

/// `1000 / periods_per_second` milliseconds.
pub fn tick_interval(periods_per_second: f64) -> Duration {
    Duration::try_from_secs_f64(1.0 / periods_per_second).unwrap_or(Duration::MAX)
}

#[cfg(test)]
#[path = "../../tests/unit/playback/controller.rs"]
mod tests;
