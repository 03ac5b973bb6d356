//! Batch aggregation engine.
//!
//! Groups validated segments into runs, aggregates each run independently,
//! and assembles the output record set.
//!
//! ## Algorithm
//!
//! 1. Group segments by run id (ascending run order)
//! 2. For each run: sum lengths, take spec/size modes, collect fittings,
//!    build the topology graph and resolve endpoints
//! 3. Assemble pipe/node rows in the configured layout
//! 4. Encode to CSV in memory and fingerprint the bytes
//!
//! Nothing is written to disk until the whole batch has succeeded.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Serialize;

use crate::aggregate::{aggregate_run, RunAggregate};
use crate::canonical::bytes_hash_hex;
use crate::config::EngineConfig;
use crate::error::{KernelError, Result};
use crate::geometry::Snapper;
use crate::ingest::{IngestReport, IngestedSegments};
use crate::output::{assemble, encode_rows};
use crate::store::SegmentSource;
use crate::types::{OutputRow, RunId, SegmentRecord};

/// Tally for one batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchReport {
    /// Data rows seen.
    pub rows_read: usize,
    /// Rows quarantined at ingestion.
    pub rows_rejected: usize,
    /// Fitting tokens skipped.
    pub fitting_tokens_skipped: usize,
    /// Runs emitted.
    pub runs: usize,
    /// Spec/size ties settled by the tie-break rule.
    pub ambiguous_modes: usize,
    /// Hash of the engine parameters.
    pub params_hash: String,
    /// Hash of the encoded output bytes.
    pub output_hash: String,
}

impl BatchReport {
    /// Total row-level errors (rejected rows plus skipped tokens).
    pub fn error_count(&self) -> usize {
        self.rows_rejected + self.fitting_tokens_skipped
    }
}

/// Result of one batch.
#[derive(Debug, Clone)]
pub struct BatchOutput {
    /// Per-run aggregates, ascending by run id.
    pub aggregates: Vec<RunAggregate>,
    /// Emitted entity rows.
    pub rows: Vec<OutputRow>,
    /// Encoded CSV (BOM, header, rows).
    pub encoded: Vec<u8>,
    /// Ingestion details, including rejected rows.
    pub ingest: IngestReport,
    /// Batch tally.
    pub report: BatchReport,
}

impl BatchOutput {
    /// Write the encoded record set to a file.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        fs::write(path, &self.encoded).map_err(|e| KernelError::io(path, e))
    }
}

/// Aggregation engine. Holds only its configuration; every call is
/// independent.
#[derive(Debug, Clone)]
pub struct AggregationEngine {
    config: EngineConfig,
    snapper: Snapper,
}

impl AggregationEngine {
    /// Create an engine, validating the configuration.
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let snapper = config.snapper();
        Ok(Self { config, snapper })
    }

    /// Get the configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Group segments by run id. Input order is kept within a run.
    pub fn group_runs(segments: &[SegmentRecord]) -> BTreeMap<&RunId, Vec<&SegmentRecord>> {
        let mut runs: BTreeMap<&RunId, Vec<&SegmentRecord>> = BTreeMap::new();
        for segment in segments {
            runs.entry(&segment.run_id).or_default().push(segment);
        }
        runs
    }

    /// Aggregate every run, ascending by run id. Runs without segments do
    /// not appear.
    pub fn aggregate(&self, segments: &[SegmentRecord]) -> Vec<RunAggregate> {
        Self::group_runs(segments)
            .into_iter()
            .filter(|(_, segs)| !segs.is_empty())
            .map(|(run_id, segs)| {
                let span = tracing::debug_span!("run", run_id = %run_id, segments = segs.len());
                let _enter = span.enter();
                aggregate_run(run_id, &segs, &self.snapper, self.config.tie_break)
            })
            .collect()
    }

    /// Aggregate ingested segments and encode the output record set.
    pub fn process(&self, ingested: IngestedSegments) -> Result<BatchOutput> {
        let aggregates = self.aggregate(&ingested.segments);
        let rows = assemble(&aggregates, self.config.layout);
        let encoded = encode_rows(&rows)?;

        let report = BatchReport {
            rows_read: ingested.report.rows_read,
            rows_rejected: ingested.report.rows_rejected,
            fitting_tokens_skipped: ingested.report.fitting_tokens_skipped,
            runs: aggregates.len(),
            ambiguous_modes: aggregates.iter().map(|a| a.ambiguities.len()).sum(),
            params_hash: self.config.params_hash(),
            output_hash: bytes_hash_hex(&encoded),
        };

        tracing::info!(
            rows_read = report.rows_read,
            rows_rejected = report.rows_rejected,
            fitting_tokens_skipped = report.fitting_tokens_skipped,
            runs = report.runs,
            ambiguous_modes = report.ambiguous_modes,
            output_hash = %report.output_hash,
            "batch aggregated"
        );

        Ok(BatchOutput {
            aggregates,
            rows,
            encoded,
            ingest: ingested.report,
            report,
        })
    }

    /// Load a source in full, then process it.
    pub fn run<S: SegmentSource + ?Sized>(&self, source: &S) -> Result<BatchOutput> {
        tracing::info!(source = %source.describe(), "loading segments");
        let ingested = source.load()?;
        self.process(ingested)
    }
}
