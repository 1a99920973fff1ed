use crate::bind::spread::spread_out;
use crate::foundation::core::{Point, Rgba8, TimeMs};
use crate::foundation::error::{ScopeError, ScopeResult};
use crate::foundation::time::LocalZone;
use crate::layout::places::{PlaceIdx, PlaceLayout};
use crate::playback::state::ActiveCategories;
use crate::scene::model::{CategoryId, EventDef};

/// An event bound to the layout.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct Event {
    /// Index of the event in the host's input order.
    pub seq: usize,
    pub category: CategoryId,
    pub time: TimeMs,
    pub place: Option<PlaceIdx>,
    /// Base comes from the event's own coordinates rather than its place.
    pub explicit: bool,
    /// `None` when neither a place nor explicit coordinates resolve; such events are never shown.
    pub base: Option<Point>,
    /// Where the marker is drawn (base offset by spread-out).
    pub display: Point,
    pub radius: f64,
    pub color: Rgba8,
    pub shape: Option<String>,
    pub label: Option<String>,
}

/// Defaults for events that do not carry their own styling.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EventStyle {
    pub color: Rgba8,
    pub radius: f64,
}

/// What binding had to skip.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct BindReport {
    pub bound: usize,
    /// Input indices of events without a resolvable base.
    pub unresolved: Vec<usize>,
}

/// Resolve times in `zone` and base positions, and return the events sorted by time (stable).
///
/// A time outside the calendar range fails the whole bind.
#[tracing::instrument(skip_all, fields(events = defs.len()))]
pub fn bind(
    defs: &[EventDef],
    layout: &PlaceLayout,
    place_key: &str,
    zone: &LocalZone,
    style: EventStyle,
) -> ScopeResult<(Vec<Event>, BindReport)> {
    if defs.is_empty() {
        return Err(ScopeError::configuration("event set is empty"));
    }

    let mut report = BindReport::default();
    let mut events = Vec::with_capacity(defs.len());
    for (seq, def) in defs.iter().enumerate() {
        let time = def.time.resolve(zone)?;
        let place = def
            .place_ref(place_key)
            .and_then(|id| layout.lookup(&id))
            .filter(|idx| layout.get(*idx).is_some_and(|p| !p.placeholder));
        let explicit = def.explicit_position().map(|(x, y)| Point::new(x, y));
        let base = explicit.or_else(|| place.and_then(|idx| layout.get(idx)).map(|p| p.position));

        match base {
            Some(_) => report.bound += 1,
            None => {
                let err = ScopeError::data(format!(
                    "event {seq} references place {:?} which does not resolve",
                    def.place_ref(place_key).map(|p| p.0)
                ));
                tracing::warn!(%err, "skipping event");
                report.unresolved.push(seq);
            }
        }

        events.push(Event {
            seq,
            category: def.category.clone(),
            time,
            place,
            explicit: explicit.is_some(),
            base,
            display: base.unwrap_or(Point::ZERO),
            radius: def.radius.unwrap_or(style.radius),
            color: def.color.unwrap_or(style.color),
            shape: def.shape.clone(),
            label: def.label.clone(),
        });
    }

    events.sort_by_key(|e| e.time);
    Ok((events, report))
}

/// Refresh place-derived bases after the layout was rescaled.
pub fn rebind(events: &mut [Event], layout: &PlaceLayout) {
    for e in events.iter_mut().filter(|e| !e.explicit) {
        if let Some(p) = e.place.and_then(|idx| layout.get(idx)) {
            e.base = Some(p.position);
            e.display = p.position;
        }
    }
}

/// Local midnight at or before the earliest event; periods are aligned to it.
pub fn period_origin(events: &[Event], zone: &LocalZone) -> ScopeResult<TimeMs> {
    let first = events
        .iter()
        .map(|e| e.time)
        .min()
        .ok_or_else(|| ScopeError::configuration("event set is empty"))?;
    zone.midnight_at_or_before(first)
}

/// Events (by index into the bound event slice) falling into one period.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct PeriodBucket {
    pub start: TimeMs,
    pub members: Vec<usize>,
}

/// Non-empty period buckets in ascending order of `start`.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct PeriodBuckets {
    pub origin: TimeMs,
    pub period_ms: i64,
    pub buckets: Vec<PeriodBucket>,
}

impl PeriodBuckets {
    /// Start of the period grid cell containing `t`.
    pub fn period_start_of(&self, t: TimeMs) -> TimeMs {
        let k = (t.0 - self.origin.0).div_euclid(self.period_ms);
        TimeMs(self.origin.0 + k * self.period_ms)
    }

    pub fn bucket_at(&self, period_start: TimeMs) -> Option<&PeriodBucket> {
        let idx = self.buckets.partition_point(|b| b.start < period_start);
        self.buckets.get(idx).filter(|b| b.start == period_start)
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

/// Partition time-sorted events into periods of `period_ms` starting at `origin`, spreading out
/// active events that share a place within each period.
#[tracing::instrument(skip(events, active), fields(events = events.len()))]
pub fn rebucket(
    events: &mut [Event],
    origin: TimeMs,
    period_ms: i64,
    active: &ActiveCategories,
) -> ScopeResult<PeriodBuckets> {
    if events.is_empty() {
        return Err(ScopeError::configuration("event set is empty"));
    }
    if period_ms <= 0 {
        return Err(ScopeError::configuration(format!(
            "period length must be > 0 (got {period_ms} ms)"
        )));
    }
    if !events.windows(2).all(|w| w[0].time <= w[1].time) {
        return Err(ScopeError::configuration(
            "events must be sorted by time before bucketing",
        ));
    }
    if events[0].time < origin {
        return Err(ScopeError::configuration(
            "period origin must not be after the first event",
        ));
    }

    let mut buckets = Vec::new();
    let mut boundary = origin.shift(period_ms);
    let mut current = PeriodBucket {
        start: origin,
        members: Vec::new(),
    };

    for i in 0..events.len() {
        if events[i].base.is_none() {
            continue;
        }
        let t = events[i].time;
        if t >= boundary {
            flush(events, &mut current, active, &mut buckets);
            let ahead = (t.0 - boundary.0) / period_ms + 1;
            boundary = boundary.shift(ahead * period_ms);
            current.start = boundary.shift(-period_ms);
        }
        current.members.push(i);
    }
    flush(events, &mut current, active, &mut buckets);

    tracing::debug!(buckets = buckets.len(), "rebucketed events");
    Ok(PeriodBuckets {
        origin,
        period_ms,
        buckets,
    })
}

fn flush(
    events: &mut [Event],
    current: &mut PeriodBucket,
    active: &ActiveCategories,
    out: &mut Vec<PeriodBucket>,
) {
    if current.members.is_empty() {
        return;
    }

    // place -> members, in first-seen order
    let mut groups: Vec<(PlaceIdx, Vec<usize>)> = Vec::new();
    for &i in &current.members {
        let e = &mut events[i];
        if let Some(base) = e.base {
            e.display = base;
        }
        let Some(place) = e.place.filter(|_| !e.explicit && active.is_active(&e.category)) else {
            continue;
        };
        match groups.iter_mut().find(|(p, _)| *p == place) {
            Some((_, members)) => members.push(i),
            None => groups.push((place, vec![i])),
        }
    }

    for (_, members) in groups.iter().filter(|(_, m)| m.len() > 1) {
        let Some(base) = events[members[0]].base else {
            continue;
        };
        let radii: Vec<f64> = members.iter().map(|&i| events[i].radius).collect();
        for (&i, pos) in members.iter().zip(spread_out(base, &radii)) {
            events[i].display = pos;
        }
    }

    out.push(PeriodBucket {
        start: current.start,
        members: std::mem::take(&mut current.members),
    });
}

#[cfg(test)]
#[path = "../../tests/unit/bind/binder.rs"]
mod tests;
