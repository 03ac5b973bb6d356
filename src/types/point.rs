//! Point types for segment geometry.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A 3D coordinate in meters.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point3 {
    /// X coordinate (m).
    pub x: f64,
    /// Y coordinate (m).
    pub y: f64,
    /// Z coordinate (m). Used as elevation.
    pub z: f64,
}

impl Point3 {
    /// Create a new point.
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Check that all three axes are finite.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl fmt::Display for Point3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Integer cell of a point on the snapping grid.
///
/// Two coordinates that snap to the same grid point have equal keys, so the
/// key is what the topology graph hashes and orders on. Float equality is
/// never used for node identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GridKey {
    /// Cell index along X.
    pub i: i64,
    /// Cell index along Y.
    pub j: i64,
    /// Cell index along Z.
    pub k: i64,
}

impl GridKey {
    /// Create a new grid key.
    pub fn new(i: i64, j: i64, k: i64) -> Self {
        Self { i, j, k }
    }
}

impl fmt::Display for GridKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}, {}]", self.i, self.j, self.k)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_key_ordering() {
        let a = GridKey::new(0, 0, 0);
        let b = GridKey::new(0, 0, 1);
        let c = GridKey::new(1, -5, -5);

        assert!(a < b);
        assert!(b < c);
    }

    #[test]
    fn test_point_finite() {
        assert!(Point3::new(1.0, 2.0, 3.0).is_finite());
        assert!(!Point3::new(f64::NAN, 0.0, 0.0).is_finite());
        assert!(!Point3::new(0.0, 0.0, f64::INFINITY).is_finite());
    }
}
