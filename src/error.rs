//! Error types for the pipe run kernel.
//!
//! Two tiers:
//!
//! - [`KernelError`]: fatal. Processing aborts and no output is written.
//! - [`RowError`] / [`FittingTokenError`]: local to one row or token. The row
//!   (or token) is dropped, counted, and processing continues.

use std::path::PathBuf;

/// Result alias for fatal kernel operations.
pub type Result<T> = std::result::Result<T, KernelError>;

/// Fatal errors.
#[derive(Debug, thiserror::Error)]
pub enum KernelError {
    /// A file could not be read or written.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// File involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
    /// The record set is not readable as CSV.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    /// A required input column is absent from the header.
    #[error("Input is missing required column: {0}")]
    MissingColumn(String),
    /// A config file could not be parsed.
    #[error("Failed to parse config {path}: {message}")]
    Config {
        /// Config file.
        path: PathBuf,
        /// Parser message.
        message: String,
    },
    /// Config values are out of range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl KernelError {
    /// Wrap an I/O error with the path it occurred on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }
}

/// Reasons a single input row is quarantined.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RowError {
    /// A required cell is empty or absent.
    #[error("missing value for {field}")]
    MissingField {
        /// Column name.
        field: &'static str,
    },
    /// A numeric cell does not parse.
    #[error("invalid number {value:?} for {field}")]
    InvalidNumber {
        /// Column name.
        field: &'static str,
        /// Raw cell content.
        value: String,
    },
    /// A numeric cell parsed to NaN or infinity.
    #[error("non-finite value for {field}")]
    NonFinite {
        /// Column name.
        field: &'static str,
    },
    /// The row has no run identifier.
    #[error("empty PipeRunID")]
    EmptyRunId,
    /// The row could not be decoded at all (e.g. wrong field count).
    #[error("undecodable row: {0}")]
    Malformed(String),
}

/// Reasons a fitting token is skipped.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FittingTokenError {
    /// Token is not of the form `Name[InstanceId]`.
    #[error("fitting token {0:?} is not of the form Name[InstanceId]")]
    MissingBracket(String),
    /// Name part is empty.
    #[error("fitting token {0:?} has an empty name")]
    EmptyName(String),
    /// Instance id part is empty.
    #[error("fitting token {0:?} has an empty instance id")]
    EmptyInstanceId(String),
}
