//! Segment record types.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::point::Point3;

/// Identifier of a logical pipe run.
///
/// Implements `Ord` so runs are processed in a stable, ascending order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RunId(String);

impl RunId {
    /// Create a run id. Surrounding whitespace is trimmed.
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(id.as_ref().trim().to_string())
    }

    /// Get the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check whether the id is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RunId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// One fitting connected to a segment, parsed from a `Name[InstanceId]` token.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FittingRef {
    /// Display name of the fitting family/type.
    pub name: String,
    /// Host instance identifier. Unique per physical fitting.
    pub instance_id: String,
}

impl FittingRef {
    /// Create a new fitting reference.
    pub fn new(name: impl Into<String>, instance_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            instance_id: instance_id.into(),
        }
    }
}

impl fmt::Display for FittingRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.name, self.instance_id)
    }
}

/// A single straight pipe segment, validated at ingestion.
///
/// Immutable once built: every derived run attribute is recomputed from the
/// full set of segments rather than patched in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentRecord {
    /// Host element identifier (may be empty).
    pub source_id: String,
    /// Run this segment belongs to.
    pub run_id: RunId,
    /// Host system name, carried through for diagnostics.
    pub system_name: Option<String>,
    /// Start point (m).
    pub start: Point3,
    /// End point (m).
    pub end: Point3,
    /// Nominal diameter (mm).
    pub diameter_mm: f64,
    /// Material spec name. `None` when the cell was empty.
    pub spec: Option<String>,
    /// Connected fittings, in token order.
    pub fittings: Vec<FittingRef>,
}

impl SegmentRecord {
    /// Create a segment without system name or fittings.
    pub fn new(
        source_id: impl Into<String>,
        run_id: RunId,
        start: Point3,
        end: Point3,
        diameter_mm: f64,
        spec: Option<String>,
    ) -> Self {
        Self {
            source_id: source_id.into(),
            run_id,
            system_name: None,
            start,
            end,
            diameter_mm,
            spec,
            fittings: Vec::new(),
        }
    }

    /// Attach fittings (builder style).
    pub fn with_fittings(mut self, fittings: Vec<FittingRef>) -> Self {
        self.fittings = fittings;
        self
    }

    /// Attach a system name (builder style).
    pub fn with_system_name(mut self, name: impl Into<String>) -> Self {
        self.system_name = Some(name.into());
        self
    }
}
