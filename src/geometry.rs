//! Segment length and coordinate snapping.
//!
//! ## Snapping Rule
//!
//! Each axis maps to `round(value / tolerance) * tolerance`, rounding to the
//! nearest grid point (not truncating). The integer quotient is kept as the
//! node identity in [`GridKey`], so near-coincident points exported with
//! floating-point noise collapse to a single graph node.

use crate::types::{GridKey, Point3, SegmentRecord};

/// Default snapping tolerance (m).
pub const DEFAULT_TOLERANCE: f64 = 0.001;

/// 3D Euclidean distance between two points.
pub fn distance(a: &Point3, b: &Point3) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let dz = b.z - a.z;
    (dx * dx + dy * dy + dz * dz).sqrt()
}

/// Length of a segment. Zero-length segments are valid.
pub fn segment_length(segment: &SegmentRecord) -> f64 {
    distance(&segment.start, &segment.end)
}

/// Quantizes coordinates onto a tolerance grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Snapper {
    tolerance: f64,
    scale: f64,
}

impl Snapper {
    /// Create a snapper. The tolerance must be finite and positive; callers
    /// validate it through `EngineConfig::validate`.
    pub fn new(tolerance: f64) -> Self {
        Self { tolerance, scale: 1.0 / tolerance }
    }

    /// Grid size in use.
    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    fn cell(&self, value: f64) -> i64 {
        (value / self.tolerance).round() as i64
    }

    /// Grid cell of a point.
    pub fn key(&self, p: &Point3) -> GridKey {
        GridKey::new(self.cell(p.x), self.cell(p.y), self.cell(p.z))
    }

    /// Coordinates of a grid cell.
    ///
    /// Divides by the grid scale rather than multiplying by the tolerance, so
    /// a decimal tolerance such as 0.001 yields the float nearest the decimal
    /// coordinate (`0.3`, not `0.30000000000000004`).
    pub fn point_of(&self, key: &GridKey) -> Point3 {
        Point3::new(
            key.i as f64 / self.scale,
            key.j as f64 / self.scale,
            key.k as f64 / self.scale,
        )
    }

    /// Snap a point onto the grid. Idempotent.
    pub fn snap(&self, p: &Point3) -> Point3 {
        self.point_of(&self.key(p))
    }
}

impl Default for Snapper {
    fn default() -> Self {
        Self::new(DEFAULT_TOLERANCE)
    }
}
