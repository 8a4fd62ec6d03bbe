//! File-backed state for the worker.
//!
//! - [`FileCheckpoint`]: the durable, monotonic stream position
//! - [`CsvReportSink`]: append-only audit CSVs, one file per record kind
//!
//! Both are synchronous; the ingestion loop calls them inline between
//! records.

mod checkpoint;
mod report;

pub use checkpoint::{Advance, CheckpointError, FileCheckpoint, OffsetCheckpoint, OffsetState};
pub use report::{report_file_name, CsvReportSink, ReportSink};
