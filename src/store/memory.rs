//! In-memory segment source for testing and embedding.

use crate::error::Result;
use crate::ingest::{IngestReport, IngestedSegments};
use crate::types::SegmentRecord;
use super::SegmentSource;

/// Segment source over already-validated records.
#[derive(Debug, Clone, Default)]
pub struct InMemorySegmentSource {
    segments: Vec<SegmentRecord>,
}

impl InMemorySegmentSource {
    /// Create a new empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a segment.
    pub fn add_segment(&mut self, segment: SegmentRecord) {
        self.segments.push(segment);
    }

    /// Get number of segments.
    pub fn num_segments(&self) -> usize {
        self.segments.len()
    }
}

impl From<Vec<SegmentRecord>> for InMemorySegmentSource {
    fn from(segments: Vec<SegmentRecord>) -> Self {
        Self { segments }
    }
}

impl SegmentSource for InMemorySegmentSource {
    fn load(&self) -> Result<IngestedSegments> {
        Ok(IngestedSegments {
            segments: self.segments.clone(),
            report: IngestReport {
                rows_read: self.segments.len(),
                ..IngestReport::default()
            },
        })
    }

    fn describe(&self) -> String {
        format!("in-memory ({} segments)", self.segments.len())
    }
}
