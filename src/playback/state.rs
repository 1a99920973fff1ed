use std::collections::BTreeSet;

use crate::foundation::core::{Direction, TimeMs};
use crate::foundation::error::{ScopeError, ScopeResult};
use crate::scene::model::CategoryId;

/// Category filter, stored as the complement: ids never seen are active.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct ActiveCategories {
    inactive: BTreeSet<CategoryId>,
}

impl ActiveCategories {
    pub fn all() -> Self {
        Self::default()
    }

    /// Everything in `known` that is not in `active` becomes inactive.
    pub fn only<'a>(
        known: impl IntoIterator<Item = &'a CategoryId>,
        active: &BTreeSet<CategoryId>,
    ) -> Self {
        Self {
            inactive: known
                .into_iter()
                .filter(|c| !active.contains(*c))
                .cloned()
                .collect(),
        }
    }

    pub fn is_active(&self, category: &CategoryId) -> bool {
        !self.inactive.contains(category)
    }

    pub fn set_active(&mut self, category: &CategoryId, active: bool) {
        if active {
            self.inactive.remove(category);
        } else {
            self.inactive.insert(category.clone());
        }
    }

    /// Flip one category; returns whether it is active afterwards.
    pub fn toggle(&mut self, category: &CategoryId) -> bool {
        let now_active = !self.is_active(category);
        self.set_active(category, now_active);
        now_active
    }

    pub fn inactive(&self) -> impl Iterator<Item = &CategoryId> {
        self.inactive.iter()
    }
}

/// Current and previous period lengths, in milliseconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub struct PeriodSpec {
    pub period_ms: i64,
    pub previous_ms: i64,
}

impl PeriodSpec {
    pub fn new(period_ms: i64, previous_ms: i64) -> ScopeResult<Self> {
        if period_ms <= 0 {
            return Err(ScopeError::configuration(format!(
                "period length must be > 0 (got {period_ms} ms)"
            )));
        }
        if previous_ms < 0 {
            return Err(ScopeError::configuration(format!(
                "previous period length must be >= 0 (got {previous_ms} ms)"
            )));
        }
        Ok(Self {
            period_ms,
            previous_ms,
        })
    }
}

/// The only mutable state of a widget's playback.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct PlaybackState {
    /// Start of the period currently shown.
    pub current: TimeMs,
    pub direction: Direction,
    pub paused: bool,
    pub periods_per_second: f64,
    pub range_start: TimeMs,
    pub range_end: TimeMs,
    pub periods: PeriodSpec,
    pub active: ActiveCategories,
}

impl PlaybackState {
    pub fn new(
        range_start: TimeMs,
        range_end: TimeMs,
        periods: PeriodSpec,
        periods_per_second: f64,
    ) -> ScopeResult<Self> {
        if range_start > range_end {
            return Err(ScopeError::configuration(format!(
                "range start {} is after range end {}",
                range_start.0, range_end.0
            )));
        }
        if !(periods_per_second.is_finite() && periods_per_second > 0.0) {
            return Err(ScopeError::configuration(
                "periods_per_second must be finite and > 0",
            ));
        }
        Ok(Self {
            current: range_start,
            direction: Direction::Forward,
            paused: true,
            periods_per_second,
            range_start,
            range_end,
            periods,
            active: ActiveCategories::all(),
        })
    }

    /// `[current, current + period)`.
    pub fn in_current_period(&self, t: TimeMs) -> bool {
        self.current <= t && t < self.current.shift(self.periods.period_ms)
    }

    /// `[current - previous, current)`, only while paused.
    pub fn in_previous_period(&self, t: TimeMs) -> bool {
        self.paused && self.current.shift(-self.periods.previous_ms) <= t && t < self.current
    }
}

#[cfg(test)]
#[path = "../../tests/unit/playback/state.rs"]
mod tests;
