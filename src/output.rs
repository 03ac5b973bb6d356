//! Output record assembly and encoding.
//!
//! Every run produces one `pipe` entity and two `node` entities
//! (`{run}_StartNode`, `{run}_EndNode`). Columns that belong to other entity
//! kinds are left blank.

use std::io::Write;

use serde::{Deserialize, Serialize};

use crate::aggregate::RunAggregate;
use crate::error::Result;
use crate::types::{OutputRow, END_NODE_SUFFIX, OUTPUT_COLUMNS, START_NODE_SUFFIX};

/// UTF-8 byte order mark written ahead of the header.
pub const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Row order of the emitted record set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputLayout {
    /// All pipe rows (in run order), then all node rows.
    #[default]
    Grouped,
    /// Pipe, start node, end node for each run in turn.
    Interleaved,
}

/// The three entities of one run.
pub fn run_rows(aggregate: &RunAggregate) -> [OutputRow; 3] {
    let run = aggregate.run_id.as_str();
    [
        OutputRow::pipe(
            run,
            aggregate.total_length,
            aggregate.spec.clone(),
            aggregate.size,
            aggregate.fittings_joined(),
        ),
        OutputRow::node(format!("{}{}", run, START_NODE_SUFFIX), aggregate.endpoints.start),
        OutputRow::node(format!("{}{}", run, END_NODE_SUFFIX), aggregate.endpoints.end),
    ]
}

/// Assemble the output record set, runs in the given order.
pub fn assemble(aggregates: &[RunAggregate], layout: OutputLayout) -> Vec<OutputRow> {
    let mut rows = Vec::with_capacity(aggregates.len() * 3);

    match layout {
        OutputLayout::Interleaved => {
            for aggregate in aggregates {
                rows.extend(run_rows(aggregate));
            }
        }
        OutputLayout::Grouped => {
            let mut nodes = Vec::with_capacity(aggregates.len() * 2);
            for aggregate in aggregates {
                let [pipe, start, end] = run_rows(aggregate);
                rows.push(pipe);
                nodes.push(start);
                nodes.push(end);
            }
            rows.extend(nodes);
        }
    }

    rows
}

/// Write BOM, header and rows as CSV.
pub fn write_rows<W: Write>(rows: &[OutputRow], mut writer: W) -> Result<()> {
    writer.write_all(UTF8_BOM).map_err(csv::Error::from)?;

    let mut csv_writer = csv::WriterBuilder::new().from_writer(writer);
    csv_writer.write_record(OUTPUT_COLUMNS)?;
    for row in rows {
        csv_writer.write_record(row.to_record())?;
    }
    csv_writer.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// Encode rows to an in-memory CSV buffer.
pub fn encode_rows(rows: &[OutputRow]) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    write_rows(rows, &mut buffer)?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::{EndpointElevations, Resolution};
    use crate::types::{DeviceType, RunId};

    fn agg(run: &str, start: f64, end: f64) -> RunAggregate {
        RunAggregate {
            run_id: RunId::from(run),
            segment_count: 1,
            total_length: 2.0,
            spec: Some("CS40".to_string()),
            size: Some(50.0),
            fittings: vec!["Elbow".to_string(), "Tee".to_string()],
            endpoints: EndpointElevations::ordered(start, end, Resolution::SingleSegment),
            ambiguities: Vec::new(),
        }
    }

    #[test]
    fn test_run_rows_names() {
        let [pipe, start, end] = run_rows(&agg("R1", 3.0, 1.0));

        assert_eq!(pipe.device_type, DeviceType::Pipe);
        assert_eq!(pipe.name, "R1");
        assert_eq!(pipe.fittings.as_deref(), Some("Elbow; Tee"));
        assert_eq!(start.name, "R1_StartNode");
        assert_eq!(start.elevation, Some(1.0));
        assert_eq!(end.name, "R1_EndNode");
        assert_eq!(end.elevation, Some(3.0));
    }

    #[test]
    fn test_grouped_layout() {
        let rows = assemble(&[agg("A", 0.0, 1.0), agg("B", 0.0, 1.0)], OutputLayout::Grouped);
        let names: Vec<&str> = rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B", "A_StartNode", "A_EndNode", "B_StartNode", "B_EndNode"]);
    }

    #[test]
    fn test_interleaved_layout() {
        let rows = assemble(&[agg("A", 0.0, 1.0), agg("B", 0.0, 1.0)], OutputLayout::Interleaved);
        let names: Vec<&str> = rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["A", "A_StartNode", "A_EndNode", "B", "B_StartNode", "B_EndNode"]);
    }

    #[test]
    fn test_encode_header_and_bom() {
        let bytes = encode_rows(&[]).unwrap();
        assert!(bytes.starts_with(UTF8_BOM));

        let text = String::from_utf8(bytes[UTF8_BOM.len()..].to_vec()).unwrap();
        assert_eq!(text.lines().count(), 1);
        assert!(text.starts_with("device_type,name,elevation,length,spec,size,fittings,inlet elevation,"));
        assert!(text.trim_end().ends_with("Control Valve min dP,Control Valve max dP"));
    }

    #[test]
    fn test_encode_pipe_row() {
        let rows = assemble(&[agg("R1", 0.0, 3.0)], OutputLayout::Grouped);
        let bytes = encode_rows(&rows).unwrap();
        let text = String::from_utf8(bytes[UTF8_BOM.len()..].to_vec()).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[1], "pipe,R1,,2.0,CS40,50.0,Elbow; Tee,,,,,,,,,,,,");
        assert_eq!(lines[2], "node,R1_StartNode,0.0,,,,,,,,,,,,,,,,");
        assert_eq!(lines[3], "node,R1_EndNode,3.0,,,,,,,,,,,,,,,,");
    }
}
