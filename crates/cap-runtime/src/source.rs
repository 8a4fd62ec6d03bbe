use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};

/// One record as delivered by the stream, before decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamRecord {
    /// Stream position. Strictly increasing within one source.
    pub offset: i64,
    pub payload: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    /// The source could not be positioned at `position`.
    Seek { position: i64, message: String },
    /// A read failed after positioning.
    Read(String),
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceError::Seek { position, message } => {
                write!(f, "cannot seek stream to position {position}: {message}")
            }
            SourceError::Read(msg) => write!(f, "stream read failed: {msg}"),
        }
    }
}

impl std::error::Error for SourceError {}

/// Ordered record source with an explicit position.
///
/// `next_record` waits until a record is available and must be cancel-safe:
/// the ingestion loop wraps it in a deadline. `Ok(None)` means the source is
/// closed and will never yield again.
#[async_trait::async_trait]
pub trait RecordSource: Send {
    /// Position the source so the next record read has offset `position`.
    async fn seek(&mut self, position: i64) -> Result<(), SourceError>;

    async fn next_record(&mut self) -> Result<Option<StreamRecord>, SourceError>;
}

// ---------------------------------------------------------------------------
// JSONL file source
// ---------------------------------------------------------------------------

/// Tails a newline-delimited file; a record's offset is its line index.
///
/// A trailing line without `\n` is still being written and is held back
/// until completed. Bytes read before a cancelled `next_record` stay in the
/// partial-line buffer, so the deadline in the loop never drops data.
///
/// Lines carry no index: seeking to a position other than the current one
/// reopens the file and skips lines from the start. The loop only seeks to
/// where the previous batch stopped, which is a no-op.
pub struct JsonlSource {
    path: PathBuf,
    reader: Option<BufReader<File>>,
    next_position: i64,
    partial: Vec<u8>,
    poll_interval: Duration,
}

impl JsonlSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            reader: None,
            next_position: 0,
            partial: Vec::new(),
            poll_interval: Duration::from_millis(200),
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn open_at(&mut self, position: i64) -> Result<(), SourceError> {
        let seek_err = |message: String| SourceError::Seek { position, message };

        let file = File::open(&self.path)
            .await
            .map_err(|e| seek_err(format!("{}: {e}", self.path.display())))?;
        let mut reader = BufReader::new(file);

        let mut line = Vec::new();
        let mut skipped = 0i64;
        while skipped < position {
            line.clear();
            let n = reader
                .read_until(b'\n', &mut line)
                .await
                .map_err(|e| seek_err(e.to_string()))?;
            if n == 0 || line.last() != Some(&b'\n') {
                return Err(seek_err(format!(
                    "stream holds only {skipped} complete record(s)"
                )));
            }
            skipped += 1;
        }

        self.reader = Some(reader);
        self.next_position = position;
        self.partial.clear();
        Ok(())
    }
}

#[async_trait::async_trait]
impl RecordSource for JsonlSource {
    async fn seek(&mut self, position: i64) -> Result<(), SourceError> {
        if self.reader.is_some() && self.next_position == position {
            return Ok(());
        }
        self.reader = None;
        self.open_at(position).await
    }

    async fn next_record(&mut self) -> Result<Option<StreamRecord>, SourceError> {
        if self.reader.is_none() {
            self.open_at(self.next_position).await?;
        }
        let Some(reader) = self.reader.as_mut() else {
            return Err(SourceError::Read("source is not positioned".to_string()));
        };

        loop {
            let n = reader
                .read_until(b'\n', &mut self.partial)
                .await
                .map_err(|e| SourceError::Read(e.to_string()))?;

            if n > 0 && self.partial.last() == Some(&b'\n') {
                let mut line = std::mem::take(&mut self.partial);
                while matches!(line.last(), Some(b'\n' | b'\r')) {
                    line.pop();
                }
                let offset = self.next_position;
                self.next_position += 1;
                return Ok(Some(StreamRecord {
                    offset,
                    payload: line,
                }));
            }

            // EOF or incomplete trailing line: wait for the writer.
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_lines(path: &Path, lines: &[&str]) {
        let mut f = std::fs::File::create(path).unwrap();
        for l in lines {
            writeln!(f, "{l}").unwrap();
        }
    }

    #[tokio::test]
    async fn offsets_are_line_indices_after_seek() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stream.jsonl");
        write_lines(&path, &["a", "b", "c"]);

        let mut src = JsonlSource::new(&path);
        src.seek(1).await.unwrap();
        let r = src.next_record().await.unwrap().unwrap();
        assert_eq!(r.offset, 1);
        assert_eq!(r.payload, b"b");
        let r = src.next_record().await.unwrap().unwrap();
        assert_eq!(r.offset, 2);
        assert_eq!(r.payload, b"c");
    }

    #[tokio::test]
    async fn seek_beyond_end_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stream.jsonl");
        write_lines(&path, &["a"]);

        let mut src = JsonlSource::new(&path);
        let err = src.seek(5).await.unwrap_err();
        assert!(matches!(err, SourceError::Seek { position: 5, .. }));
    }

    #[tokio::test]
    async fn incomplete_trailing_line_is_held_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stream.jsonl");
        std::fs::write(&path, b"first\nsec").unwrap();

        let mut src = JsonlSource::new(&path).with_poll_interval(Duration::from_millis(5));
        src.seek(0).await.unwrap();
        assert_eq!(src.next_record().await.unwrap().unwrap().payload, b"first");

        let pending =
            tokio::time::timeout(Duration::from_millis(50), src.next_record()).await;
        assert!(pending.is_err(), "half-written line must not be yielded");

        let mut f = std::fs::OpenOptions::new().append(true).open(&path).unwrap();
        f.write_all(b"ond\n").unwrap();
        let r = src.next_record().await.unwrap().unwrap();
        assert_eq!(r.offset, 1);
        assert_eq!(r.payload, b"second");
    }

    #[tokio::test]
    async fn records_appended_after_eof_are_picked_up() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stream.jsonl");
        write_lines(&path, &["a"]);

        let mut src = JsonlSource::new(&path).with_poll_interval(Duration::from_millis(5));
        src.seek(1).await.unwrap();
        let idle = tokio::time::timeout(Duration::from_millis(30), src.next_record()).await;
        assert!(idle.is_err());

        let mut f = std::fs::OpenOptions::new().append(true).open(&path).unwrap();
        f.write_all(b"b\n").unwrap();
        let r = src.next_record().await.unwrap().unwrap();
        assert_eq!((r.offset, r.payload.as_slice()), (1, b"b".as_slice()));
        // Already positioned: no reopen.
        src.seek(2).await.unwrap();
    }

    #[tokio::test]
    async fn missing_file_fails_to_seek() {
        let dir = tempfile::tempdir().unwrap();
        let mut src = JsonlSource::new(dir.path().join("absent.jsonl"));
        assert!(src.seek(0).await.is_err());
    }
}
