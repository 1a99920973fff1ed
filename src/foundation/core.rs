use crate::foundation::error::{ScopeError, ScopeResult};

pub use kurbo::{Point, Rect, Vec2};

/// Milliseconds since the Unix epoch.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct TimeMs(pub i64);

impl TimeMs {
    pub fn shift(self, delta_ms: i64) -> Self {
        Self(self.0.saturating_add(delta_ms))
    }

    pub fn clamp(self, lo: TimeMs, hi: TimeMs) -> Self {
        Self(self.0.clamp(lo.0, hi.0))
    }
}

/// Convert a (possibly fractional) number of seconds to whole milliseconds.
pub fn secs_to_ms(secs: f64) -> i64 {
    (secs * 1000.0).round() as i64
}

/// Playback direction: one period forward or backward per tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Forward,
    Backward,
}

impl Direction {
    pub fn sign(self) -> i64 {
        match self {
            Self::Forward => 1,
            Self::Backward => -1,
        }
    }

    pub fn from_sign(sign: i64) -> Self {
        if sign < 0 {
            Self::Backward
        } else {
            Self::Forward
        }
    }
}

/// Units accepted for period lengths.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    #[default]
    Seconds,
    Minutes,
    Hours,
    Days,
    Weeks,
}

impl TimeUnit {
    pub fn seconds(self) -> f64 {
        match self {
            Self::Seconds => 1.0,
            Self::Minutes => 60.0,
            Self::Hours => 60.0 * 60.0,
            Self::Days => 60.0 * 60.0 * 24.0,
            Self::Weeks => 60.0 * 60.0 * 24.0 * 7.0,
        }
    }
}

/// Drawing area for places and events, in canvas pixels.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Viewport {
    pub view_width: f64,
    pub view_height: f64,
    pub horizontal_margin: f64,
    pub vertical_margin: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            view_width: 700.0,
            view_height: 500.0,
            horizontal_margin: 100.0,
            vertical_margin: 100.0,
        }
    }
}

impl Viewport {
    pub fn validate(&self) -> ScopeResult<()> {
        if !(self.view_width > 0.0 && self.view_height > 0.0) {
            return Err(ScopeError::configuration(
                "view_width/view_height must be > 0",
            ));
        }
        if self.horizontal_margin < 0.0 || self.vertical_margin < 0.0 {
            return Err(ScopeError::configuration("margins must be >= 0"));
        }
        Ok(())
    }

    pub fn center(&self) -> Point {
        Point::new(self.view_width / 2.0, self.view_height / 2.0)
    }
}

/// Straight (non-premultiplied) RGBA8 color.
///
/// Deserializes from CSS-style strings: `#rgb`, `#rrggbb`, `#rrggbbaa` or a basic color name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8 {
    pub const WHITE: Self = Self::rgb(255, 255, 255);
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    pub const TRANSPARENT: Self = Self {
        r: 0,
        g: 0,
        b: 0,
        a: 0,
    };

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }

    pub fn parse(s: &str) -> ScopeResult<Self> {
        let s = s.trim();
        if let Some(hex) = s.strip_prefix('#') {
            return parse_hex(hex).ok_or_else(|| ScopeError::data(format!("invalid color '{s}'")));
        }
        let named = match s.to_ascii_lowercase().as_str() {
            "black" => Self::BLACK,
            "white" => Self::WHITE,
            "red" => Self::rgb(255, 0, 0),
            "green" => Self::rgb(0, 128, 0),
            "blue" => Self::rgb(0, 0, 255),
            "yellow" => Self::rgb(255, 255, 0),
            "orange" => Self::rgb(255, 165, 0),
            "purple" => Self::rgb(128, 0, 128),
            "pink" => Self::rgb(255, 192, 203),
            "gray" | "grey" => Self::rgb(128, 128, 128),
            "transparent" => Self::TRANSPARENT,
            _ => return Err(ScopeError::data(format!("unknown color name '{s}'"))),
        };
        Ok(named)
    }
}

fn parse_hex(hex: &str) -> Option<Rgba8> {
    let nibble = |c: u8| -> Option<u8> { (c as char).to_digit(16).map(|d| d as u8) };
    let bytes = hex.as_bytes();
    match bytes.len() {
        3 => {
            let r = nibble(bytes[0])?;
            let g = nibble(bytes[1])?;
            let b = nibble(bytes[2])?;
            Some(Rgba8::rgb(r * 17, g * 17, b * 17))
        }
        6 | 8 => {
            let mut out = [255u8; 4];
            for (i, pair) in bytes.chunks(2).enumerate() {
                out[i] = (nibble(pair[0])? << 4) | nibble(pair[1])?;
            }
            Some(Rgba8 {
                r: out[0],
                g: out[1],
                b: out[2],
                a: out[3],
            })
        }
        _ => None,
    }
}

impl TryFrom<String> for Rgba8 {
    type Error = ScopeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Rgba8> for String {
    fn from(c: Rgba8) -> Self {
        if c.a == 255 {
            format!("#{:02x}{:02x}{:02x}", c.r, c.g, c.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", c.r, c.g, c.b, c.a)
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
