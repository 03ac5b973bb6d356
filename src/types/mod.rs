//! Core types for the pipe run kernel.

pub mod point;
pub mod segment;
pub mod row;

pub use point::{Point3, GridKey};
pub use segment::{RunId, FittingRef, SegmentRecord};
pub use row::{OutputRow, DeviceType, OUTPUT_COLUMNS, START_NODE_SUFFIX, END_NODE_SUFFIX, format_number};
