//! Coordinate mapping between normalized document space and viewer space.
//!
//! Pins are stored as fractions of the page width/height so they survive
//! zoom, rotation and device resolution changes. The document viewer reports
//! pointer positions in page points.

use kurbo::{Point, Size};
use serde::{Deserialize, Serialize};

/// Tolerance used when comparing coordinates after a round trip.
pub const COORD_EPSILON: f64 = 1e-6;

/// A position on a page expressed as a fraction of its width and height.
///
/// Both components are always within `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawPoint", into = "RawPoint")]
pub struct NormalizedPoint {
    x: f64,
    y: f64,
}

#[derive(Serialize, Deserialize)]
struct RawPoint {
    x: f64,
    y: f64,
}

impl NormalizedPoint {
    /// The page origin.
    pub const ORIGIN: Self = Self { x: 0.0, y: 0.0 };

    /// Create a point, returning `None` unless both components are in `[0, 1]`.
    pub fn new(x: f64, y: f64) -> Option<Self> {
        let in_range = |v: f64| (0.0..=1.0).contains(&v);
        (in_range(x) && in_range(y)).then_some(Self { x, y })
    }

    /// Create a point, clamping each component into `[0, 1]`.
    ///
    /// NaN components collapse to `0`.
    pub fn clamped(x: f64, y: f64) -> Self {
        Self {
            x: clamp_unit(x),
            y: clamp_unit(y),
        }
    }

    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn y(&self) -> f64 {
        self.y
    }

    /// Check whether two points are equal within [`COORD_EPSILON`].
    pub fn approx_eq(&self, other: &Self) -> bool {
        (self.x - other.x).abs() < COORD_EPSILON && (self.y - other.y).abs() < COORD_EPSILON
    }
}

impl TryFrom<RawPoint> for NormalizedPoint {
    type Error = String;

    fn try_from(raw: RawPoint) -> Result<Self, Self::Error> {
        Self::new(raw.x, raw.y)
            .ok_or_else(|| format!("pin ({}, {}) is outside the unit square", raw.x, raw.y))
    }
}

impl From<NormalizedPoint> for RawPoint {
    fn from(point: NormalizedPoint) -> Self {
        Self {
            x: point.x,
            y: point.y,
        }
    }
}

fn clamp_unit(v: f64) -> f64 {
    if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) }
}

/// Convert a pointer position in page points to normalized coordinates.
///
/// Positions that land fractionally outside the page are clamped rather than
/// rejected. A page with a degenerate axis maps that axis to `0`.
pub fn to_normalized(pointer: Point, page: Size) -> NormalizedPoint {
    let axis = |v: f64, extent: f64| if extent > 0.0 { v / extent } else { 0.0 };
    NormalizedPoint::clamped(axis(pointer.x, page.width), axis(pointer.y, page.height))
}

/// Convert normalized coordinates back to a pointer position in page points.
pub fn to_pointer(normalized: NormalizedPoint, page: Size) -> Point {
    Point::new(normalized.x * page.width, normalized.y * page.height)
}
