use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// On-disk shape: `{"offset": <int64>, "processed": <bool>}`.
///
/// `offset` alone cannot tell a fresh store from one whose record 0 has been
/// processed, so `processed` records which it is. Files without the field
/// read as processed when the offset is above 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OffsetState {
    pub offset: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processed: Option<bool>,
}

impl OffsetState {
    /// Nothing read yet: the first batch starts at position 0.
    pub const FRESH: OffsetState = OffsetState {
        offset: 0,
        processed: Some(false),
    };

    /// `offset` is the last record that went through the loop.
    pub fn processed(offset: i64) -> Self {
        Self {
            offset,
            processed: Some(true),
        }
    }

    pub fn has_processed(&self) -> bool {
        self.processed.unwrap_or(self.offset > 0)
    }

    /// Stream position the next batch reads from: one past the last
    /// processed record, or 0 when nothing has been processed.
    pub fn resume_position(&self) -> i64 {
        if self.has_processed() {
            self.offset + 1
        } else {
            self.offset
        }
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum CheckpointError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// File exists but does not hold an offset.
    Corrupt { path: PathBuf, reason: String },
}

impl std::fmt::Display for CheckpointError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "offset file {}: {source}", path.display()),
            Self::Corrupt { path, reason } => {
                write!(f, "offset file {} is corrupt: {reason}", path.display())
            }
        }
    }
}

impl std::error::Error for CheckpointError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Corrupt { .. } => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Contract
// ---------------------------------------------------------------------------

/// Result of an [`OffsetCheckpoint::advance`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    Written,
    /// Requested offset is below the persisted one. Nothing was written.
    Stale { current: i64 },
}

/// Durable resume position. Never decremented.
pub trait OffsetCheckpoint: Send {
    /// Persisted state. An absent store reads as [`OffsetState::FRESH`] and
    /// is created.
    fn read_offset(&mut self) -> Result<OffsetState, CheckpointError>;

    /// Record `offset` as processed unless it would move the position
    /// backwards.
    fn advance(&mut self, offset: i64) -> Result<Advance, CheckpointError>;
}

// ---------------------------------------------------------------------------
// File-backed implementation
// ---------------------------------------------------------------------------

pub struct FileCheckpoint {
    path: PathBuf,
    current: Option<OffsetState>,
}

impl FileCheckpoint {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            current: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Overwrite the persisted state, bypassing the monotonic guard.
    /// Operator use only (`offset set`, `offset reset`).
    pub fn force(&mut self, state: OffsetState) -> Result<(), CheckpointError> {
        self.persist(state)
    }

    fn io(&self, source: std::io::Error) -> CheckpointError {
        CheckpointError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn load(&self) -> Result<Option<OffsetState>, CheckpointError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.io(e)),
        };
        let state: OffsetState =
            serde_json::from_str(&raw).map_err(|e| CheckpointError::Corrupt {
                path: self.path.clone(),
                reason: e.to_string(),
            })?;
        Ok(Some(state))
    }

    /// Write-to-temp, fsync, rename. A crash leaves either the old or the new
    /// offset on disk, never a torn file.
    fn persist(&mut self, state: OffsetState) -> Result<(), CheckpointError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| self.io(e))?;
            }
        }

        let body = serde_json::to_string(&state).map_err(|e| {
            CheckpointError::Corrupt {
                path: self.path.clone(),
                reason: e.to_string(),
            }
        })?;

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        let mut f = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&tmp)
            .map_err(|e| self.io(e))?;
        f.write_all(body.as_bytes()).map_err(|e| self.io(e))?;
        f.sync_all().map_err(|e| self.io(e))?;
        drop(f);

        fs::rename(&tmp, &self.path).map_err(|e| self.io(e))?;
        self.current = Some(state);
        Ok(())
    }
}

impl OffsetCheckpoint for FileCheckpoint {
    fn read_offset(&mut self) -> Result<OffsetState, CheckpointError> {
        match self.load()? {
            Some(state) => {
                self.current = Some(state);
                Ok(state)
            }
            None => {
                self.persist(OffsetState::FRESH)?;
                Ok(OffsetState::FRESH)
            }
        }
    }

    fn advance(&mut self, offset: i64) -> Result<Advance, CheckpointError> {
        let current = match self.current {
            Some(c) => c,
            None => self.read_offset()?,
        };
        if offset < current.offset {
            return Ok(Advance::Stale {
                current: current.offset,
            });
        }
        self.persist(OffsetState::processed(offset))?;
        Ok(Advance::Written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resume_is_one_past_the_last_processed_record() {
        assert_eq!(OffsetState::FRESH.resume_position(), 0);
        assert_eq!(OffsetState::processed(0).resume_position(), 1);
        assert_eq!(OffsetState::processed(41).resume_position(), 42);
    }

    #[test]
    fn files_without_the_processed_flag_infer_it_from_the_offset() {
        let zero: OffsetState = serde_json::from_str(r#"{"offset":0}"#).unwrap();
        let later: OffsetState = serde_json::from_str(r#"{"offset":41}"#).unwrap();
        assert_eq!(zero.resume_position(), 0);
        assert_eq!(later.resume_position(), 42);
    }

    #[test]
    fn corrupt_file_is_an_error_not_zero() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("capacityOffset.json");
        fs::write(&path, "{not json").unwrap();

        let mut cp = FileCheckpoint::new(&path);
        assert!(matches!(
            cp.read_offset(),
            Err(CheckpointError::Corrupt { .. })
        ));
    }

    #[test]
    fn force_can_rewind() {
        let dir = tempfile::tempdir().unwrap();
        let mut cp = FileCheckpoint::new(dir.path().join("o.json"));
        cp.advance(10).unwrap();
        cp.force(OffsetState::processed(3)).unwrap();
        assert_eq!(
            FileCheckpoint::new(cp.path()).read_offset().unwrap(),
            OffsetState::processed(3)
        );

        cp.force(OffsetState::FRESH).unwrap();
        assert_eq!(
            FileCheckpoint::new(cp.path()).read_offset().unwrap().resume_position(),
            0
        );
    }
}
