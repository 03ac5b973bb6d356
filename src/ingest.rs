//! Segment record ingestion.
//!
//! Parses the host export (one row per pipe segment) into validated
//! [`SegmentRecord`]s. Rows that fail validation are quarantined: logged,
//! counted, and left out of every run. Only an unreadable record set is
//! fatal.

use std::io;

use serde::{Deserialize, Serialize};

use crate::error::{FittingTokenError, KernelError, Result, RowError};
use crate::fitting::parse_fitting_list;
use crate::types::{Point3, RunId, SegmentRecord};

/// Columns that must be present in the header.
pub const REQUIRED_COLUMNS: [&str; 8] = [
    "StartX_m",
    "StartY_m",
    "StartZ_m",
    "EndX_m",
    "EndY_m",
    "EndZ_m",
    "PipeRunID",
    "Diameter_mm",
];

/// One raw input row, before validation. Every cell is optional here;
/// validation decides what is required.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawSegmentRow {
    #[serde(rename = "ElementId")]
    element_id: Option<String>,
    #[serde(rename = "StartX_m")]
    start_x: Option<String>,
    #[serde(rename = "StartY_m")]
    start_y: Option<String>,
    #[serde(rename = "StartZ_m")]
    start_z: Option<String>,
    #[serde(rename = "EndX_m")]
    end_x: Option<String>,
    #[serde(rename = "EndY_m")]
    end_y: Option<String>,
    #[serde(rename = "EndZ_m")]
    end_z: Option<String>,
    #[serde(rename = "SystemName")]
    system_name: Option<String>,
    #[serde(rename = "PipeRunID")]
    pipe_run_id: Option<String>,
    #[serde(rename = "SegmentName")]
    segment_name: Option<String>,
    #[serde(rename = "Diameter_mm")]
    diameter_mm: Option<String>,
    #[serde(rename = "ConnectedFittingNames")]
    connected_fitting_names: Option<String>,
}

fn non_blank(cell: &Option<String>) -> Option<&str> {
    cell.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn parse_number(cell: &Option<String>, field: &'static str) -> std::result::Result<f64, RowError> {
    let raw = non_blank(cell).ok_or(RowError::MissingField { field })?;
    let value: f64 = raw.parse().map_err(|_| RowError::InvalidNumber {
        field,
        value: raw.to_string(),
    })?;
    if !value.is_finite() {
        return Err(RowError::NonFinite { field });
    }
    Ok(value)
}

impl RawSegmentRow {
    /// Host element id, or empty.
    pub fn element_id(&self) -> &str {
        non_blank(&self.element_id).unwrap_or_default()
    }

    /// Validate into a typed segment. Unparseable fitting tokens do not
    /// reject the row; they are returned alongside it.
    pub fn validate(&self) -> std::result::Result<(SegmentRecord, Vec<FittingTokenError>), RowError> {
        let run_id = non_blank(&self.pipe_run_id).map(RunId::new).ok_or(RowError::EmptyRunId)?;

        let start = Point3::new(
            parse_number(&self.start_x, "StartX_m")?,
            parse_number(&self.start_y, "StartY_m")?,
            parse_number(&self.start_z, "StartZ_m")?,
        );
        let end = Point3::new(
            parse_number(&self.end_x, "EndX_m")?,
            parse_number(&self.end_y, "EndY_m")?,
            parse_number(&self.end_z, "EndZ_m")?,
        );
        let diameter_mm = parse_number(&self.diameter_mm, "Diameter_mm")?;

        let fittings = parse_fitting_list(self.connected_fitting_names.as_deref().unwrap_or_default());

        let mut segment = SegmentRecord::new(
            self.element_id(),
            run_id,
            start,
            end,
            diameter_mm,
            non_blank(&self.segment_name).map(str::to_string),
        )
        .with_fittings(fittings.fittings);
        if let Some(system) = non_blank(&self.system_name) {
            segment = segment.with_system_name(system);
        }

        Ok((segment, fittings.skipped))
    }
}

/// A quarantined input row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RejectedRow {
    /// 1-based line number in the input (header is line 1).
    pub line: u64,
    /// Host element id, if the row had one.
    pub source_id: String,
    /// Why the row was rejected.
    pub reason: String,
}

/// Counters for one ingestion pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IngestReport {
    /// Data rows seen.
    pub rows_read: usize,
    /// Rows excluded from aggregation.
    pub rows_rejected: usize,
    /// Fitting tokens skipped across accepted rows.
    pub fitting_tokens_skipped: usize,
    /// Details of each rejected row, in input order.
    pub rejected: Vec<RejectedRow>,
}

/// Validated segments plus the ingestion tally.
#[derive(Debug, Clone, Default)]
pub struct IngestedSegments {
    /// Accepted segments, in input order.
    pub segments: Vec<SegmentRecord>,
    /// Tally of rejected rows and skipped tokens.
    pub report: IngestReport,
}

/// Read segment records from CSV.
///
/// A leading UTF-8 BOM is tolerated. Fails only if the input cannot be read
/// or a required column is absent from the header.
pub fn read_segments<R: io::Read>(reader: R) -> Result<IngestedSegments> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    // Some csv versions keep the BOM on the first header cell.
    let headers: csv::StringRecord = csv_reader
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}'))
        .collect();
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == column) {
            return Err(KernelError::MissingColumn(column.to_string()));
        }
    }

    let mut ingested = IngestedSegments::default();

    for (idx, record) in csv_reader.records().enumerate() {
        let record = match record {
            Ok(record) => record,
            Err(e) if e.is_io_error() => return Err(e.into()),
            Err(e) => {
                let line = e.position().map(|p| p.line()).unwrap_or(idx as u64 + 2);
                ingested.report.rows_read += 1;
                reject(&mut ingested.report, line, "", RowError::Malformed(e.to_string()));
                continue;
            }
        };

        ingested.report.rows_read += 1;
        let line = record.position().map(|p| p.line()).unwrap_or(idx as u64 + 2);

        let raw: RawSegmentRow = match record.deserialize(Some(&headers)) {
            Ok(raw) => raw,
            Err(e) => {
                reject(&mut ingested.report, line, "", RowError::Malformed(e.to_string()));
                continue;
            }
        };

        match raw.validate() {
            Ok((segment, skipped)) => {
                for token in &skipped {
                    tracing::warn!(line, source_id = %segment.source_id, error = %token, "skipping fitting token");
                }
                ingested.report.fitting_tokens_skipped += skipped.len();
                ingested.segments.push(segment);
            }
            Err(e) => reject(&mut ingested.report, line, raw.element_id(), e),
        }
    }

    tracing::debug!(
        rows_read = ingested.report.rows_read,
        rows_rejected = ingested.report.rows_rejected,
        fitting_tokens_skipped = ingested.report.fitting_tokens_skipped,
        "ingestion complete"
    );

    Ok(ingested)
}

fn reject(report: &mut IngestReport, line: u64, source_id: &str, error: RowError) {
    tracing::warn!(line, source_id = %source_id, error = %error, "quarantining input row");
    report.rows_rejected += 1;
    report.rejected.push(RejectedRow {
        line,
        source_id: source_id.to_string(),
        reason: error.to_string(),
    });
}
