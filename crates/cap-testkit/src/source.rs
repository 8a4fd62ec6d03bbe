use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use cap_runtime::{RecordSource, SourceError, StreamRecord};

/// What the source does once every record has been read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WhenDrained {
    /// `next_record` returns `Ok(None)`.
    Close,
    /// `next_record` never completes; only the batch deadline ends the read.
    Block,
}

struct SourceState {
    records: Vec<StreamRecord>,
    cursor: usize,
    seeks: Vec<i64>,
    reads: usize,
    fail_read_at: Option<i64>,
}

/// Scripted stream. Clones share the cursor and the seek log.
#[derive(Clone)]
pub struct MemorySource {
    state: Arc<Mutex<SourceState>>,
    when_drained: WhenDrained,
}

impl MemorySource {
    pub fn new(records: Vec<StreamRecord>, when_drained: WhenDrained) -> Self {
        Self {
            state: Arc::new(Mutex::new(SourceState {
                records,
                cursor: 0,
                seeks: Vec::new(),
                reads: 0,
                fail_read_at: None,
            })),
            when_drained,
        }
    }

    /// Records with consecutive offsets starting at `first_offset`.
    pub fn from_payloads(first_offset: i64, payloads: Vec<Vec<u8>>, when_drained: WhenDrained) -> Self {
        let records = payloads
            .into_iter()
            .enumerate()
            .map(|(i, payload)| StreamRecord {
                offset: first_offset + i as i64,
                payload,
            })
            .collect();
        Self::new(records, when_drained)
    }

    fn lock(&self) -> MutexGuard<'_, SourceState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Reading the record at `offset` fails instead of yielding it.
    pub fn fail_read_at(&self, offset: i64) {
        self.lock().fail_read_at = Some(offset);
    }

    /// Every position passed to `seek`, in order.
    pub fn seeks(&self) -> Vec<i64> {
        self.lock().seeks.clone()
    }

    /// Records handed out so far.
    pub fn reads(&self) -> usize {
        self.lock().reads
    }
}

#[async_trait::async_trait]
impl RecordSource for MemorySource {
    async fn seek(&mut self, position: i64) -> Result<(), SourceError> {
        let mut st = self.lock();
        st.seeks.push(position);
        let cursor = st
            .records
            .iter()
            .position(|r| r.offset >= position)
            .unwrap_or(st.records.len());
        st.cursor = cursor;
        Ok(())
    }

    async fn next_record(&mut self) -> Result<Option<StreamRecord>, SourceError> {
        {
            let mut st = self.lock();
            if let Some(record) = st.records.get(st.cursor).cloned() {
                if st.fail_read_at == Some(record.offset) {
                    st.fail_read_at = None;
                    return Err(SourceError::Read(format!(
                        "injected read failure at {}",
                        record.offset
                    )));
                }
                st.cursor += 1;
                st.reads += 1;
                return Ok(Some(record));
            }
        }
        match self.when_drained {
            WhenDrained::Close => Ok(None),
            WhenDrained::Block => std::future::pending().await,
        }
    }
}
