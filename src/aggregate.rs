//! Per-run aggregation.
//!
//! Reduces all segments of one run to its derived attributes. Nothing is
//! cached between calls: a run is always recomputed from its full segment
//! set.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::fitting::NAME_SEPARATOR;
use crate::geometry::{segment_length, Snapper};
use crate::resolver::{resolve_endpoints, EndpointElevations};
use crate::types::{format_number, RunId, SegmentRecord};

/// Rule for picking a mode when several values share the top count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// Lowest value in ascending order (strings lexicographic, sizes numeric).
    #[default]
    Lowest,
    /// Value that appears first in input order.
    FirstSeen,
}

/// Mode of a value sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct Mode<T> {
    /// Selected value.
    pub value: T,
    /// Occurrences of the selected value.
    pub count: usize,
    /// All values sharing the top count, ascending. Length 1 when unambiguous.
    pub candidates: Vec<T>,
}

impl<T> Mode<T> {
    /// Check whether the tie-break rule had to decide.
    pub fn is_tied(&self) -> bool {
        self.candidates.len() > 1
    }
}

/// Most frequent value under `cmp`, ties settled by `tie_break`.
pub fn mode_by<T, F>(values: &[T], cmp: F, tie_break: TieBreak) -> Option<Mode<T>>
where
    T: Clone,
    F: Fn(&T, &T) -> Ordering,
{
    // (value, count, first index)
    let mut tallies: Vec<(T, usize, usize)> = Vec::new();
    for (idx, value) in values.iter().enumerate() {
        match tallies.iter_mut().find(|(v, _, _)| cmp(v, value) == Ordering::Equal) {
            Some(entry) => entry.1 += 1,
            None => tallies.push((value.clone(), 1, idx)),
        }
    }

    let top = tallies.iter().map(|(_, c, _)| *c).max()?;
    let mut tied: Vec<&(T, usize, usize)> = tallies.iter().filter(|(_, c, _)| *c == top).collect();
    tied.sort_by(|a, b| cmp(&a.0, &b.0));

    let chosen = match tie_break {
        TieBreak::Lowest => tied.first(),
        TieBreak::FirstSeen => tied.iter().min_by_key(|(_, _, first)| *first),
    }?;

    Some(Mode {
        value: chosen.0.clone(),
        count: top,
        candidates: tied.iter().map(|(v, _, _)| v.clone()).collect(),
    })
}

/// A spec or size tie that the tie-break rule settled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeAmbiguity {
    /// `"spec"` or `"size"`.
    pub attribute: String,
    /// Tied values, ascending, as written to output.
    pub candidates: Vec<String>,
    /// Value that was chosen.
    pub chosen: String,
}

impl ModeAmbiguity {
    fn from_mode<T>(attribute: &str, mode: &Mode<T>, render: impl Fn(&T) -> String) -> Self {
        Self {
            attribute: attribute.to_string(),
            candidates: mode.candidates.iter().map(&render).collect(),
            chosen: render(&mode.value),
        }
    }
}

/// Derived attributes of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunAggregate {
    /// Run identifier.
    pub run_id: RunId,
    /// Number of valid segments in the run.
    pub segment_count: usize,
    /// Sum of segment lengths (m).
    pub total_length: f64,
    /// Dominant spec. `None` when no segment carries one.
    pub spec: Option<String>,
    /// Dominant nominal size (mm).
    pub size: Option<f64>,
    /// Fitting names, one per unique instance, sorted.
    pub fittings: Vec<String>,
    /// Resolved start/end elevations.
    pub endpoints: EndpointElevations,
    /// Mode ties settled by the tie-break rule.
    pub ambiguities: Vec<ModeAmbiguity>,
}

impl RunAggregate {
    /// Fitting names joined for output.
    pub fn fittings_joined(&self) -> String {
        self.fittings.join(NAME_SEPARATOR)
    }
}

/// Sum of individually computed segment lengths.
pub fn total_length(segments: &[&SegmentRecord]) -> f64 {
    segments.iter().map(|s| segment_length(s)).sum()
}

/// Fitting names across a run, deduplicated by instance id, sorted.
///
/// A fitting referenced by two adjoining segments counts once. When the same
/// instance id carries different names, the first one seen is kept.
pub fn fitting_names(segments: &[&SegmentRecord]) -> Vec<String> {
    let mut by_instance: BTreeMap<&str, &str> = BTreeMap::new();
    for segment in segments {
        for fitting in &segment.fittings {
            by_instance
                .entry(fitting.instance_id.as_str())
                .or_insert(fitting.name.as_str());
        }
    }

    let mut names: Vec<String> = by_instance.values().map(|n| n.to_string()).collect();
    names.sort();
    names
}

fn normalize_size(size: f64) -> f64 {
    // Folds -0.0 into 0.0 so total_cmp treats them as one value.
    size + 0.0
}

/// Aggregate one run.
pub fn aggregate_run(
    run_id: &RunId,
    segments: &[&SegmentRecord],
    snapper: &Snapper,
    tie_break: TieBreak,
) -> RunAggregate {
    let mut ambiguities = Vec::new();

    let specs: Vec<String> = segments.iter().filter_map(|s| s.spec.clone()).collect();
    let spec_mode = mode_by(&specs, |a, b| a.cmp(b), tie_break);
    if let Some(mode) = spec_mode.as_ref().filter(|m| m.is_tied()) {
        ambiguities.push(ModeAmbiguity::from_mode("spec", mode, |s| s.clone()));
    }

    let sizes: Vec<f64> = segments.iter().map(|s| normalize_size(s.diameter_mm)).collect();
    let size_mode = mode_by(&sizes, |a, b| a.total_cmp(b), tie_break);
    if let Some(mode) = size_mode.as_ref().filter(|m| m.is_tied()) {
        ambiguities.push(ModeAmbiguity::from_mode("size", mode, |v| format_number(*v)));
    }

    for ambiguity in &ambiguities {
        tracing::warn!(
            run_id = %run_id,
            attribute = %ambiguity.attribute,
            candidates = ?ambiguity.candidates,
            chosen = %ambiguity.chosen,
            "no single dominant value; tie-break applied"
        );
    }

    RunAggregate {
        run_id: run_id.clone(),
        segment_count: segments.len(),
        total_length: total_length(segments),
        spec: spec_mode.map(|m| m.value),
        size: size_mode.map(|m| m.value),
        fittings: fitting_names(segments),
        endpoints: resolve_endpoints(segments, snapper),
        ambiguities,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FittingRef, Point3};

    fn seg(len: f64, diameter: f64, spec: &str, fittings: &[(&str, &str)]) -> SegmentRecord {
        SegmentRecord::new(
            "e",
            RunId::from("R1"),
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(len, 0.0, 0.0),
            diameter,
            if spec.is_empty() { None } else { Some(spec.to_string()) },
        )
        .with_fittings(fittings.iter().map(|(n, i)| FittingRef::new(*n, *i)).collect())
    }

    #[test]
    fn test_mode_unambiguous() {
        let values = vec!["b", "a", "b"];
        let mode = mode_by(&values, |x, y| x.cmp(y), TieBreak::Lowest).unwrap();
        assert_eq!(mode.value, "b");
        assert_eq!(mode.count, 2);
        assert!(!mode.is_tied());
    }

    #[test]
    fn test_mode_tie_lowest() {
        let values = vec!["SS10", "CS40"];
        let mode = mode_by(&values, |x, y| x.cmp(y), TieBreak::Lowest).unwrap();
        assert_eq!(mode.value, "CS40");
        assert_eq!(mode.candidates, vec!["CS40", "SS10"]);
    }

    #[test]
    fn test_mode_tie_first_seen() {
        let values = vec![100.0, 50.0, 50.0, 100.0];
        let mode = mode_by(&values, |x: &f64, y: &f64| x.total_cmp(y), TieBreak::FirstSeen).unwrap();
        assert_eq!(mode.value, 100.0);
        assert!(mode.is_tied());
    }

    #[test]
    fn test_mode_empty() {
        let values: Vec<f64> = Vec::new();
        assert!(mode_by(&values, |x: &f64, y: &f64| x.total_cmp(y), TieBreak::Lowest).is_none());
    }

    #[test]
    fn test_fitting_dedup_by_instance() {
        let a = seg(1.0, 50.0, "CS40", &[("Tee", "2"), ("Elbow", "1")]);
        let b = seg(1.0, 50.0, "CS40", &[("Elbow", "1"), ("Elbow", "7")]);
        let names = fitting_names(&[&a, &b]);
        assert_eq!(names, vec!["Elbow", "Elbow", "Tee"]);
    }

    #[test]
    fn test_aggregate_run() {
        let a = seg(2.5, 50.0, "CS40", &[("Valve", "9")]);
        let b = seg(1.5, 80.0, "CS40", &[]);
        let c = seg(1.0, 50.0, "", &[]);
        let agg = aggregate_run(&RunId::from("R1"), &[&a, &b, &c], &Snapper::default(), TieBreak::Lowest);

        assert_eq!(agg.segment_count, 3);
        assert!((agg.total_length - 5.0).abs() < 1e-12);
        assert_eq!(agg.spec.as_deref(), Some("CS40"));
        assert_eq!(agg.size, Some(50.0));
        assert_eq!(agg.fittings_joined(), "Valve");
        assert!(agg.ambiguities.is_empty());
    }

    #[test]
    fn test_aggregate_records_ambiguity() {
        let a = seg(1.0, 50.0, "SS10", &[]);
        let b = seg(1.0, 80.0, "CS40", &[]);
        let agg = aggregate_run(&RunId::from("R1"), &[&a, &b], &Snapper::default(), TieBreak::Lowest);

        assert_eq!(agg.spec.as_deref(), Some("CS40"));
        assert_eq!(agg.size, Some(50.0));
        assert_eq!(agg.ambiguities.len(), 2);
        assert_eq!(agg.ambiguities[1].candidates, vec!["50.0", "80.0"]);
    }

    #[test]
    fn test_all_specs_empty() {
        let a = seg(1.0, 50.0, "", &[]);
        let agg = aggregate_run(&RunId::from("R1"), &[&a], &Snapper::default(), TieBreak::Lowest);
        assert!(agg.spec.is_none());
        assert_eq!(agg.fittings_joined(), "");
    }
}
