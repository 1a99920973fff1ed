use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate};

use crate::foundation::core::{Rgba8, TimeMs, TimeUnit, Viewport, secs_to_ms};
use crate::foundation::error::{ScopeError, ScopeResult};
use crate::foundation::time::{LocalZone, parse_date};

/// Identifiers accept JSON strings or numbers; numbers are kept in their decimal form.
#[derive(serde::Deserialize)]
#[serde(untagged)]
enum KeyRepr {
    Int(i64),
    Float(f64),
    Text(String),
}

impl From<KeyRepr> for String {
    fn from(k: KeyRepr) -> Self {
        match k {
            KeyRepr::Int(i) => i.to_string(),
            KeyRepr::Float(f) => f.to_string(),
            KeyRepr::Text(s) => s,
        }
    }
}

macro_rules! key_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
        )]
        #[serde(from = "KeyRepr")]
        pub struct $name(pub String);

        impl From<KeyRepr> for $name {
            fn from(k: KeyRepr) -> Self {
                Self(k.into())
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

key_type!(
    /// Event category (a.k.a. event type); the legend filter key.
    CategoryId
);
key_type!(
    /// Place identifier, matched against the `place_key` field of events.
    PlaceId
);

impl PlaceId {
    /// Read a place reference out of an arbitrary event field.
    pub fn from_json(v: &serde_json::Value) -> Option<Self> {
        match v {
            serde_json::Value::String(s) if !s.is_empty() => Some(Self(s.clone())),
            serde_json::Value::Number(n) => Some(match n.as_i64() {
                Some(i) => Self(i.to_string()),
                None => Self(n.to_string()),
            }),
            _ => None,
        }
    }
}

/// When an event happened: an instant, or a bare calendar date taken as local midnight.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventTime {
    At(TimeMs),
    Date(NaiveDate),
}

impl EventTime {
    /// The instant in `zone`; rejects times with no calendar date.
    pub fn resolve(self, zone: &LocalZone) -> ScopeResult<TimeMs> {
        match self {
            Self::At(t) => zone.check(t),
            Self::Date(date) => zone.midnight_of(date),
        }
    }
}

impl From<TimeMs> for EventTime {
    fn from(t: TimeMs) -> Self {
        Self::At(t)
    }
}

impl serde::Serialize for EventTime {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::At(t) => s.serialize_i64(t.0),
            Self::Date(date) => s.collect_str(&date.format("%Y-%m-%d")),
        }
    }
}

impl<'de> serde::Deserialize<'de> for EventTime {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        #[derive(serde::Deserialize)]
        #[serde(untagged)]
        enum TimeRepr {
            Millis(i64),
            Float(f64),
            Text(String),
        }

        match <TimeRepr as serde::Deserialize>::deserialize(d)? {
            TimeRepr::Millis(ms) => Ok(Self::At(TimeMs(ms))),
            TimeRepr::Float(ms) => Ok(Self::At(TimeMs(ms.round() as i64))),
            TimeRepr::Text(s) => match DateTime::parse_from_rfc3339(&s) {
                Ok(dt) => Ok(Self::At(TimeMs(dt.timestamp_millis()))),
                Err(_) => parse_date(&s)
                    .map(Self::Date)
                    .map_err(serde::de::Error::custom),
            },
        }
    }
}

/// One input event as supplied by the host.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct EventDef {
    #[serde(alias = "event_type_id", alias = "categoryId")]
    pub category: CategoryId,
    /// Epoch milliseconds, or an RFC 3339 / `YYYY-MM-DD` string.
    pub time: EventTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Rgba8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape: Option<String>,
    #[serde(default, alias = "title", skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Remaining fields; the place reference lives here under `place_key`.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl EventDef {
    pub fn new(category: impl Into<CategoryId>, time: impl Into<EventTime>) -> Self {
        Self {
            category: category.into(),
            time: time.into(),
            x: None,
            y: None,
            radius: None,
            color: None,
            shape: None,
            label: None,
            extra: BTreeMap::new(),
        }
    }

    pub fn at_place(mut self, place_key: &str, place: impl Into<String>) -> Self {
        self.extra
            .insert(place_key.to_owned(), serde_json::Value::String(place.into()));
        self
    }

    pub fn with_position(mut self, x: f64, y: f64) -> Self {
        self.x = Some(x);
        self.y = Some(y);
        self
    }

    pub fn with_radius(mut self, radius: f64) -> Self {
        self.radius = Some(radius);
        self
    }

    pub fn place_ref(&self, place_key: &str) -> Option<PlaceId> {
        self.extra.get(place_key).and_then(PlaceId::from_json)
    }

    /// Explicit position, only when both coordinates are present.
    pub fn explicit_position(&self) -> Option<(f64, f64)> {
        Some((self.x?, self.y?))
    }
}

/// An explicitly positioned place. `x` grows right, `y` grows up.
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct PlaceDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<PlaceId>,
    #[serde(default)]
    pub x: Option<f64>,
    #[serde(default)]
    pub y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Rgba8>,
    #[serde(default, alias = "size", skip_serializing_if = "Option::is_none")]
    pub radius: Option<f64>,
    #[serde(default, alias = "title", skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// Legend row input: a category plus how its key is drawn.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LegendEntryDef {
    #[serde(alias = "event_type_id", alias = "categoryId")]
    pub category: CategoryId,
    #[serde(default, alias = "description")]
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Rgba8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape: Option<String>,
}

/// Construction-time options. Every field has a default.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ScopeOptions {
    /// Explicit places; `null` entries keep their index but are never drawn.
    pub places: Option<Vec<Option<PlaceDef>>>,
    /// Event field naming the place an event happened at.
    pub place_key: String,
    #[serde(flatten)]
    pub viewport: Viewport,
    /// Current period length, in `period_units`.
    pub period: f64,
    pub period_units: TimeUnit,
    /// Previous period length, in `previous_period_units`; defaults to the current period.
    #[serde(alias = "previous_period_duration")]
    pub previous_period: Option<f64>,
    pub previous_period_units: TimeUnit,
    pub periods_per_second: f64,
    pub place_color: Rgba8,
    pub place_radius: Option<f64>,
    pub event_color: Rgba8,
    pub event_radius: f64,
    pub legend: Option<Vec<LegendEntryDef>>,
    pub legend_columns: usize,
    pub background_image: Option<String>,
    #[serde(alias = "width")]
    pub interface_width: f64,
    #[serde(alias = "height")]
    pub interface_height: f64,
    /// Offset applied when aligning periods to local midnight.
    pub utc_offset_minutes: i32,
}

impl Default for ScopeOptions {
    fn default() -> Self {
        Self {
            places: None,
            place_key: "place".to_owned(),
            viewport: Viewport::default(),
            period: 24.0 * 60.0 * 60.0,
            period_units: TimeUnit::Seconds,
            previous_period: None,
            previous_period_units: TimeUnit::Seconds,
            periods_per_second: 24.0,
            place_color: Rgba8::rgb(255, 192, 203),
            place_radius: None,
            event_color: Rgba8::rgb(255, 0, 0),
            event_radius: 5.0,
            legend: None,
            legend_columns: 2,
            background_image: None,
            interface_width: 1024.0,
            interface_height: 786.0,
            utc_offset_minutes: 0,
        }
    }
}

impl ScopeOptions {
    pub fn period_ms(&self) -> i64 {
        secs_to_ms(self.period * self.period_units.seconds())
    }

    pub fn previous_period_ms(&self) -> i64 {
        match self.previous_period {
            Some(p) => secs_to_ms(p * self.previous_period_units.seconds()),
            None => self.period_ms(),
        }
    }

    pub fn validate(&self) -> ScopeResult<()> {
        self.viewport.validate()?;
        if self.period_ms() <= 0 {
            return Err(ScopeError::configuration(format!(
                "period must be > 0 (got {} {:?})",
                self.period, self.period_units
            )));
        }
        if self.previous_period_ms() < 0 {
            return Err(ScopeError::configuration("previous_period must be >= 0"));
        }
        if !(self.periods_per_second.is_finite() && self.periods_per_second > 0.0) {
            return Err(ScopeError::configuration(
                "periods_per_second must be finite and > 0",
            ));
        }
        if self.place_key.trim().is_empty() {
            return Err(ScopeError::configuration("place_key must be non-empty"));
        }
        if self.legend_columns == 0 {
            return Err(ScopeError::configuration("legend_columns must be > 0"));
        }
        if !(self.event_radius >= 0.0) {
            return Err(ScopeError::configuration("event_radius must be >= 0"));
        }
        if !(self.interface_width > 0.0 && self.interface_height > 0.0) {
            return Err(ScopeError::configuration(
                "interface_width/interface_height must be > 0",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/model.rs"]
mod tests;
