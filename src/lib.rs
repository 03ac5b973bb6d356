//! # pipe-run-kernel
//!
//! Topology-aware aggregation of CAD pipe segment exports.
//!
//! The kernel answers one question:
//!
//! > Given every straight segment of a logical pipe run, what are the run's
//! > length, dominant spec and size, fittings, and true start/end elevations?
//!
//! ## Core Contract
//!
//! 1. Parse segment rows into validated records; quarantine bad rows
//! 2. Per run: sum lengths, take spec/size modes, dedupe fittings by instance
//! 3. Per run: rebuild connectivity on a snapped grid and resolve endpoints
//! 4. Emit one `pipe` and two `node` entities per run in a fixed schema
//!
//! ## Architecture
//!
//! ```text
//! SegmentSource → Ingest → group by run → Aggregator ─┐
//!                                   ↓                   ├→ Output → CSV
//!                       TopologyGraph → EndpointResolver ┘
//! ```
//!
//! ## Determinism Guarantees
//!
//! - Same input + same `EngineConfig` → byte-identical output
//! - Runs are emitted in ascending run id order
//! - Graph traversal visits neighbors in node key order, never row order

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod types;
pub mod error;
pub mod geometry;
pub mod fitting;
pub mod topology;
pub mod resolver;
pub mod aggregate;
pub mod ingest;
pub mod output;
pub mod store;
pub mod config;
pub mod canonical;
pub mod engine;

// Re-exports
pub use types::{Point3, GridKey, RunId, FittingRef, SegmentRecord, OutputRow, DeviceType, OUTPUT_COLUMNS};
pub use error::{KernelError, RowError, FittingTokenError};
pub use geometry::{distance, segment_length, Snapper, DEFAULT_TOLERANCE};
pub use fitting::{parse_token, parse_fitting_list, FittingList};
pub use topology::{NodeKey, TopologyGraph};
pub use resolver::{resolve_endpoints, resolve_graph, EndpointElevations, Resolution};
pub use aggregate::{aggregate_run, fitting_names, total_length, mode_by, Mode, ModeAmbiguity, RunAggregate, TieBreak};
pub use ingest::{read_segments, IngestReport, IngestedSegments, RejectedRow};
pub use output::{assemble, encode_rows, write_rows, OutputLayout};
pub use store::{SegmentSource, InMemorySegmentSource, CsvFileSource};
pub use config::{EngineConfig, PipelineConfig};
pub use canonical::{to_canonical_bytes, canonical_hash, canonical_hash_hex, bytes_hash_hex};
pub use engine::{AggregationEngine, BatchOutput, BatchReport};

/// Schema version of the output record set and engine parameters.
/// Increment on breaking changes to either.
pub const PIPE_RUN_SCHEMA_VERSION: &str = "1.0.0";
