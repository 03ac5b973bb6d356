//! Output record types.
//!
//! The column list is a compatibility contract with the downstream model
//! importer. Names and order must not change.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Fixed output header, in column order.
pub const OUTPUT_COLUMNS: [&str; 19] = [
    "device_type",
    "name",
    "elevation",
    "length",
    "spec",
    "size",
    "fittings",
    "inlet elevation",
    "outlet elevation",
    "Flow Control Device",
    "Temp Tolerance",
    "Thermal Calculation Mode",
    "Heat Transfer Rate",
    "Thermal Flow Rate",
    "Source",
    "Control Valve model",
    "Control Valve setpoint",
    "Control Valve min dP",
    "Control Valve max dP",
];

/// Suffix of the start node entity name.
pub const START_NODE_SUFFIX: &str = "_StartNode";
/// Suffix of the end node entity name.
pub const END_NODE_SUFFIX: &str = "_EndNode";

/// Entity kinds this crate emits.
///
/// Heat source/sink, control valve and lineup rows share the same schema
/// but are authored elsewhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DeviceType {
    /// Aggregated pipe run.
    Pipe,
    /// Start or end node of a run.
    Node,
}

impl DeviceType {
    /// Value written in the `device_type` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pipe => "pipe",
            Self::Node => "node",
        }
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One output entity row. Absent values are written as empty cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputRow {
    /// Entity kind.
    pub device_type: DeviceType,
    /// Entity name.
    pub name: String,
    /// Node elevation (m).
    pub elevation: Option<f64>,
    /// Pipe length (m).
    pub length: Option<f64>,
    /// Pipe material spec.
    pub spec: Option<String>,
    /// Nominal size (mm).
    pub size: Option<f64>,
    /// `"; "`-joined fitting names.
    pub fittings: Option<String>,
}

impl OutputRow {
    /// Create a pipe row.
    pub fn pipe(
        name: impl Into<String>,
        length: f64,
        spec: Option<String>,
        size: Option<f64>,
        fittings: String,
    ) -> Self {
        Self {
            device_type: DeviceType::Pipe,
            name: name.into(),
            elevation: None,
            length: Some(length),
            spec,
            size,
            fittings: Some(fittings),
        }
    }

    /// Create a node row.
    pub fn node(name: impl Into<String>, elevation: f64) -> Self {
        Self {
            device_type: DeviceType::Node,
            name: name.into(),
            elevation: Some(elevation),
            length: None,
            spec: None,
            size: None,
            fittings: None,
        }
    }

    /// Render the row as 19 cells in `OUTPUT_COLUMNS` order.
    pub fn to_record(&self) -> Vec<String> {
        let mut cells = vec![String::new(); OUTPUT_COLUMNS.len()];
        cells[0] = self.device_type.as_str().to_string();
        cells[1] = self.name.clone();
        cells[2] = self.elevation.map(format_number).unwrap_or_default();
        cells[3] = self.length.map(format_number).unwrap_or_default();
        cells[4] = self.spec.clone().unwrap_or_default();
        cells[5] = self.size.map(format_number).unwrap_or_default();
        cells[6] = self.fittings.clone().unwrap_or_default();
        cells
    }
}

/// Format a float as its shortest round-trip decimal, keeping a trailing
/// `.0` on integral values (`8.0`, `50.0`).
pub fn format_number(value: f64) -> String {
    format!("{:?}", value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_contract() {
        assert_eq!(OUTPUT_COLUMNS.len(), 19);
        assert_eq!(OUTPUT_COLUMNS[0], "device_type");
        assert_eq!(OUTPUT_COLUMNS[7], "inlet elevation");
        assert_eq!(OUTPUT_COLUMNS[18], "Control Valve max dP");
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(8.0), "8.0");
        assert_eq!(format_number(50.0), "50.0");
        assert_eq!(format_number(0.125), "0.125");
        assert_eq!(format_number(-2.5), "-2.5");
    }

    #[test]
    fn test_pipe_record_blanks() {
        let row = OutputRow::pipe("R1", 8.0, Some("CS40".into()), Some(50.0), "Elbow; Tee".into());
        let cells = row.to_record();

        assert_eq!(cells.len(), 19);
        assert_eq!(cells[0], "pipe");
        assert_eq!(cells[1], "R1");
        assert_eq!(cells[2], "");
        assert_eq!(cells[3], "8.0");
        assert_eq!(cells[4], "CS40");
        assert_eq!(cells[5], "50.0");
        assert_eq!(cells[6], "Elbow; Tee");
        assert!(cells[7..].iter().all(|c| c.is_empty()));
    }

    #[test]
    fn test_node_record_blanks() {
        let cells = OutputRow::node("R1_StartNode", 0.0).to_record();
        assert_eq!(cells[0], "node");
        assert_eq!(cells[2], "0.0");
        assert!(cells[3..].iter().all(|c| c.is_empty()));
    }
}
