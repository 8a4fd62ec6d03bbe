use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use cap_notify::{Notifier, NotifyError};
use cap_reconcile::{Notification, ReportRow};
use cap_schemas::RecordKind;
use cap_store::{Advance, CheckpointError, OffsetCheckpoint, OffsetState, ReportSink};

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

// ---------------------------------------------------------------------------
// Notifier
// ---------------------------------------------------------------------------

#[derive(Clone, Default)]
pub struct RecordingNotifier {
    sent: Arc<Mutex<Vec<Notification>>>,
    reject: bool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records every notification but reports each as rejected.
    pub fn rejecting() -> Self {
        Self {
            reject: true,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<Notification> {
        lock(&self.sent).clone()
    }
}

#[async_trait::async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
        lock(&self.sent).push(notification.clone());
        if self.reject {
            return Err(NotifyError::Rejected("channel_not_found".to_string()));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Report sink
// ---------------------------------------------------------------------------

#[derive(Clone, Default)]
pub struct MemoryReportSink {
    rows: Arc<Mutex<Vec<(RecordKind, ReportRow)>>>,
}

impl MemoryReportSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(&self) -> Vec<(RecordKind, ReportRow)> {
        lock(&self.rows).clone()
    }

    pub fn rows_of(&self, kind: RecordKind) -> Vec<ReportRow> {
        lock(&self.rows)
            .iter()
            .filter(|(k, _)| *k == kind)
            .map(|(_, r)| r.clone())
            .collect()
    }
}

impl ReportSink for MemoryReportSink {
    fn append(&mut self, kind: RecordKind, rows: &[ReportRow]) -> anyhow::Result<usize> {
        let mut all = lock(&self.rows);
        all.extend(rows.iter().cloned().map(|r| (kind, r)));
        Ok(rows.len())
    }
}

// ---------------------------------------------------------------------------
// Checkpoint
// ---------------------------------------------------------------------------

struct CheckpointState {
    current: OffsetState,
    writes: Vec<i64>,
    fail_writes: bool,
    fail_reads: bool,
}

/// Offset store with the same monotonic rule as the file checkpoint.
#[derive(Clone)]
pub struct MemoryCheckpoint {
    state: Arc<Mutex<CheckpointState>>,
}

impl MemoryCheckpoint {
    /// Store as if loaded from `{"offset": offset}`: 0 is fresh, anything
    /// above is the last processed record.
    pub fn new(offset: i64) -> Self {
        Self::with_state(OffsetState {
            offset,
            processed: None,
        })
    }

    pub fn with_state(current: OffsetState) -> Self {
        Self {
            state: Arc::new(Mutex::new(CheckpointState {
                current,
                writes: Vec::new(),
                fail_writes: false,
                fail_reads: false,
            })),
        }
    }

    pub fn offset(&self) -> i64 {
        lock(&self.state).current.offset
    }

    pub fn state(&self) -> OffsetState {
        lock(&self.state).current
    }

    /// Every offset actually persisted, in order.
    pub fn writes(&self) -> Vec<i64> {
        lock(&self.state).writes.clone()
    }

    pub fn fail_writes(&self) {
        lock(&self.state).fail_writes = true;
    }

    pub fn fail_reads(&self) {
        lock(&self.state).fail_reads = true;
    }
}

fn injected(what: &str) -> CheckpointError {
    CheckpointError::Io {
        path: PathBuf::from("memory://offset"),
        source: io::Error::new(io::ErrorKind::Other, format!("injected {what} failure")),
    }
}

impl OffsetCheckpoint for MemoryCheckpoint {
    fn read_offset(&mut self) -> Result<OffsetState, CheckpointError> {
        let st = lock(&self.state);
        if st.fail_reads {
            return Err(injected("read"));
        }
        Ok(st.current)
    }

    fn advance(&mut self, offset: i64) -> Result<Advance, CheckpointError> {
        let mut st = lock(&self.state);
        if st.fail_writes {
            return Err(injected("write"));
        }
        if offset < st.current.offset {
            return Ok(Advance::Stale {
                current: st.current.offset,
            });
        }
        st.current = OffsetState::processed(offset);
        st.writes.push(offset);
        Ok(Advance::Written)
    }
}
