//! CSV file segment source.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::error::{KernelError, Result};
use crate::ingest::{read_segments, IngestedSegments};
use super::SegmentSource;

/// Reads the host segment export from a CSV file.
#[derive(Debug, Clone)]
pub struct CsvFileSource {
    path: PathBuf,
}

impl CsvFileSource {
    /// Create a source for a file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path being read.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SegmentSource for CsvFileSource {
    fn load(&self) -> Result<IngestedSegments> {
        let file = File::open(&self.path).map_err(|e| KernelError::io(&self.path, e))?;
        read_segments(BufReader::new(file))
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
