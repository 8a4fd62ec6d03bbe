use std::fmt;

use crate::api::Dimension;

/// Failure of a single inventory or fleet-registry call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InventoryError {
    /// Connection, TLS or timeout failure; no response was received.
    Transport { endpoint: String, message: String },
    /// A response arrived with a non-2xx status.
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },
    /// A 2xx response whose body is not the expected JSON.
    Decode { endpoint: String, message: String },
}

impl fmt::Display for InventoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InventoryError::Transport { endpoint, message } => {
                write!(f, "transport error on {endpoint}: {message}")
            }
            InventoryError::Status {
                endpoint,
                status,
                body,
            } => write!(f, "{endpoint} returned status {status}: {body}"),
            InventoryError::Decode { endpoint, message } => {
                write!(f, "decode error on {endpoint}: {message}")
            }
        }
    }
}

impl std::error::Error for InventoryError {}

/// One snapshot dimension could not be fetched. Fatal to the batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotFetchError {
    pub dimension: Dimension,
    pub source: InventoryError,
}

impl fmt::Display for SnapshotFetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "inventory snapshot fetch failed for {}: {}",
            self.dimension.as_str(),
            self.source
        )
    }
}

impl std::error::Error for SnapshotFetchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

/// Body excerpt kept in error values and logs.
pub(crate) fn excerpt(body: &str) -> String {
    const MAX: usize = 256;
    if body.len() <= MAX {
        return body.to_string();
    }
    let mut end = MAX;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_bodies_are_truncated_on_a_char_boundary() {
        let body = "é".repeat(200);
        let out = excerpt(&body);
        assert!(out.ends_with("..."));
        assert!(out.len() <= 259);
    }

    #[test]
    fn snapshot_error_names_the_dimension() {
        let err = SnapshotFetchError {
            dimension: Dimension::Storages,
            source: InventoryError::Status {
                endpoint: "storage".to_string(),
                status: 503,
                body: String::new(),
            },
        };
        assert!(err.to_string().contains("storages"));
        assert!(err.to_string().contains("503"));
    }
}
