use std::f64::consts::TAU;

use crate::foundation::core::{Point, Vec2};

/// Arrange markers sharing `base` on a circle so that neighbouring markers touch but never
/// overlap.
///
/// Each marker contributes its diameter to the circle's circumference; marker `i` is centered at
/// arc length `sum(diameters before i) + radii[i]`. A single marker stays on `base`.
pub fn spread_out(base: Point, radii: &[f64]) -> Vec<Point> {
    if radii.len() < 2 {
        return vec![base; radii.len()];
    }

    let circumference: f64 = radii.iter().map(|r| 2.0 * r).sum();
    if !(circumference > 0.0) {
        return vec![base; radii.len()];
    }
    let circle_radius = circumference / TAU;

    let mut arc_length = 0.0;
    radii
        .iter()
        .map(|&r| {
            let angle = (arc_length + r) * TAU / circumference;
            arc_length += 2.0 * r;
            base + Vec2::from_angle(angle) * circle_radius
        })
        .collect()
}

/// Radius of the circle [`spread_out`] uses for `radii`.
pub fn spread_radius(radii: &[f64]) -> f64 {
    if radii.len() < 2 {
        return 0.0;
    }
    radii.iter().map(|r| 2.0 * r).sum::<f64>() / TAU
}

#[cfg(test)]
#[path = "../../tests/unit/bind/spread.rs"]
mod tests;
