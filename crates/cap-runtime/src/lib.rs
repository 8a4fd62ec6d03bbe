//! cap-runtime
//!
//! The batch ingestion loop and the record sources that feed it.
//!
//! Control flow is strictly sequential. A batch is read under one deadline,
//! reconciled against a single inventory snapshot, and the offset is
//! persisted after every record. Side effects (patches, notifications,
//! report rows) are not transactional with the offset: a crash replays the
//! tail of a batch, which is safe because the patch decision is idempotent.
//!
//! Fatal conditions come back as [`FatalError`]; everything else is logged
//! and counted in [`BatchStats`].

mod ingest;
#[cfg(feature = "kafka")]
mod kafka;
mod source;

pub use ingest::{BatchStats, Collaborators, FatalError, IngestionLoop, LoopSettings, LoopState};
#[cfg(feature = "kafka")]
pub use kafka::{KafkaSource, KafkaSourceConfig};
pub use source::{JsonlSource, RecordSource, SourceError, StreamRecord};
