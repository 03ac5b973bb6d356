//! Segment record sources.

pub mod memory;
pub mod csv_file;

use crate::error::Result;
use crate::ingest::IngestedSegments;

/// Trait for segment record sources.
///
/// A source is read once, in full, before any run is processed.
/// Implementations must return segments in a stable order for a given input.
pub trait SegmentSource {
    /// Load and validate all segments.
    ///
    /// Errors are fatal (missing or unreadable record set); row-level
    /// problems are reported in the returned `IngestReport`.
    fn load(&self) -> Result<IngestedSegments>;

    /// Human-readable description for logs.
    fn describe(&self) -> String;
}

pub use memory::InMemorySegmentSource;
pub use csv_file::CsvFileSource;
