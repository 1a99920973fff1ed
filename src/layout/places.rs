use std::collections::HashMap;
use std::f64::consts::{FRAC_PI_2, PI};

use crate::foundation::core::{Point, Rgba8, Viewport};
use crate::foundation::error::{ScopeError, ScopeResult};
use crate::scene::model::{EventDef, PlaceDef, PlaceId, ScopeOptions};

/// Index of a place inside a [`PlaceLayout`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize)]
pub struct PlaceIdx(pub usize);

/// A laid-out place in canvas coordinates.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct Place {
    pub id: PlaceId,
    pub position: Point,
    pub radius: f64,
    pub color: Rgba8,
    pub label: Option<String>,
    /// Stand-in for a missing input entry; keeps indices stable, never drawn.
    pub placeholder: bool,
}

/// Fallback styling for places that do not carry their own.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlaceStyle {
    pub color: Rgba8,
    pub radius: Option<f64>,
}

#[derive(Clone, Debug)]
enum PlaceSource {
    Explicit(Vec<Option<PlaceDef>>),
    Derived(Vec<String>),
}

/// Place positions for one viewport. Recomputed (never mutated) on rescale.
#[derive(Clone, Debug)]
pub struct PlaceLayout {
    places: Vec<Place>,
    index: HashMap<PlaceId, PlaceIdx>,
    source: PlaceSource,
    style: PlaceStyle,
    viewport: Viewport,
}

impl PlaceLayout {
    pub fn from_options(opts: &ScopeOptions, events: &[EventDef]) -> ScopeResult<Self> {
        let style = PlaceStyle {
            color: opts.place_color,
            radius: opts.place_radius,
        };
        Self::compute(
            opts.places.as_deref(),
            events,
            &opts.place_key,
            &opts.viewport,
            style,
        )
    }

    /// Lay out explicit places, or derive one place per distinct `place_key` value.
    #[tracing::instrument(skip(explicit, events, style), fields(events = events.len()))]
    pub fn compute(
        explicit: Option<&[Option<PlaceDef>]>,
        events: &[EventDef],
        place_key: &str,
        viewport: &Viewport,
        style: PlaceStyle,
    ) -> ScopeResult<Self> {
        viewport.validate()?;
        let names = derive_place_names(events, place_key);
        if names.is_empty() {
            return Err(ScopeError::configuration(format!(
                "the place_key '{place_key}' does not occur in the events data"
            )));
        }
        let source = match explicit {
            Some(defs) => PlaceSource::Explicit(defs.to_vec()),
            None => PlaceSource::Derived(names),
        };
        Ok(Self::build(source, style, *viewport))
    }

    /// Same places, fitted to a new viewport.
    pub fn rescale(&self, viewport: &Viewport) -> ScopeResult<Self> {
        viewport.validate()?;
        Ok(Self::build(self.source.clone(), self.style, *viewport))
    }

    fn build(source: PlaceSource, style: PlaceStyle, viewport: Viewport) -> Self {
        let places = match &source {
            PlaceSource::Explicit(defs) => scale_explicit(defs, style, &viewport),
            PlaceSource::Derived(names) => on_ellipse(names, style, &viewport),
        };
        let mut index = HashMap::with_capacity(places.len());
        for (i, p) in places.iter().enumerate() {
            index.entry(p.id.clone()).or_insert(PlaceIdx(i));
        }
        tracing::debug!(places = places.len(), "computed place layout");
        Self {
            places,
            index,
            source,
            style,
            viewport,
        }
    }

    pub fn places(&self) -> &[Place] {
        &self.places
    }

    pub fn get(&self, idx: PlaceIdx) -> Option<&Place> {
        self.places.get(idx.0)
    }

    pub fn lookup(&self, id: &PlaceId) -> Option<PlaceIdx> {
        self.index.get(id).copied()
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn len(&self) -> usize {
        self.places.len()
    }

    pub fn is_empty(&self) -> bool {
        self.places.is_empty()
    }
}

fn derive_place_names(events: &[EventDef], place_key: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for e in events {
        let Some(id) = e.place_ref(place_key) else {
            continue;
        };
        if !names.contains(&id.0) {
            names.push(id.0);
        }
    }
    names
}

fn scale_explicit(defs: &[Option<PlaceDef>], style: PlaceStyle, vp: &Viewport) -> Vec<Place> {
    let coords = |d: &PlaceDef| Some((d.x?, d.y?));
    let (max_x, max_y) = defs
        .iter()
        .flatten()
        .filter_map(coords)
        .fold((0.0f64, 0.0f64), |(mx, my), (x, y)| (mx.max(x), my.max(y)));
    let factor = |extent: f64, max: f64| if max > 0.0 { extent / max } else { 1.0 };
    let x_factor = factor(vp.view_width - 2.0 * vp.horizontal_margin, max_x);
    let y_factor = factor(vp.view_height - 2.0 * vp.vertical_margin, max_y);

    defs.iter()
        .enumerate()
        .map(|(i, def)| {
            let id = def
                .as_ref()
                .and_then(|d| d.id.clone())
                .unwrap_or_else(|| PlaceId(i.to_string()));
            match def.as_ref().and_then(|d| coords(d).map(|xy| (d, xy))) {
                Some((d, (x, y))) => Place {
                    id,
                    position: Point::new(
                        vp.horizontal_margin + x * x_factor,
                        // input y grows upward, canvas y grows downward
                        vp.view_height - vp.vertical_margin - y * y_factor,
                    ),
                    radius: d.radius.or(style.radius).unwrap_or(0.0),
                    color: d.color.unwrap_or(style.color),
                    label: d.label.clone(),
                    placeholder: false,
                },
                None => Place {
                    id,
                    position: Point::ZERO,
                    radius: 0.0,
                    color: Rgba8::WHITE,
                    label: None,
                    placeholder: true,
                },
            }
        })
        .collect()
}

fn on_ellipse(names: &[String], style: PlaceStyle, vp: &Viewport) -> Vec<Place> {
    let n = names.len() as f64;
    let theta = 2.0 * PI / n;
    let a = (vp.view_width / 2.0 - vp.horizontal_margin).max(0.0);
    let b = (vp.view_height / 2.0 - vp.vertical_margin).max(0.0);
    let circumference = 2.0 * PI * ((a * a + b * b) / 2.0).sqrt();
    let radius = style.radius.unwrap_or(circumference / (2.0 * n));
    let center = vp.center();

    names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            // first place at 12 o'clock
            let angle = i as f64 * theta - FRAC_PI_2;
            Place {
                id: PlaceId(name.clone()),
                position: Point::new(center.x + a * angle.cos(), center.y + b * angle.sin()),
                radius,
                color: style.color,
                label: Some(name.clone()),
                placeholder: false,
            }
        })
        .collect()
}

#[cfg(test)]
#[path = "../../tests/unit/layout/places.rs"]
mod tests;
