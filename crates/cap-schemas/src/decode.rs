//! Decoder/router: opaque stream payload -> [`TelemetryRecord`].
//!
//! The envelope is read first to get `streamName`; the routing table in
//! [`StreamKind`] picks the record shape; the payload is then decoded a
//! second time as that shape. Both failure modes are per-record and
//! non-fatal: the caller logs and moves on.

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::telemetry::{StreamKind, TelemetryRecord};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// `streamName` is not in the routing table.
    UnknownStreamKind { stream_name: String },
    /// The payload is not JSON, has no `streamName`, or a known record shape
    /// is missing required fields / carries mistyped ones.
    MalformedPayload {
        stream: Option<StreamKind>,
        reason: String,
    },
}

impl std::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownStreamKind { stream_name } => {
                write!(f, "unknown stream kind '{stream_name}'")
            }
            Self::MalformedPayload {
                stream: Some(stream),
                reason,
            } => write!(f, "malformed '{}' payload: {reason}", stream.as_str()),
            Self::MalformedPayload {
                stream: None,
                reason,
            } => write!(f, "malformed stream record: {reason}"),
        }
    }
}

impl std::error::Error for DecodeError {}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct Envelope {
    #[serde(rename = "streamName")]
    stream_name: String,
}

#[derive(Deserialize)]
struct Payload<T> {
    data: Vec<T>,
}

/// Decode one stream record, routing on its own `streamName`.
pub fn decode(raw: &[u8]) -> Result<TelemetryRecord, DecodeError> {
    let envelope: Envelope =
        serde_json::from_slice(raw).map_err(|e| DecodeError::MalformedPayload {
            stream: None,
            reason: e.to_string(),
        })?;

    let stream = StreamKind::from_stream_name(&envelope.stream_name).ok_or(
        DecodeError::UnknownStreamKind {
            stream_name: envelope.stream_name,
        },
    )?;

    decode_as(stream, raw)
}

/// Decode a payload whose stream is already known.
pub fn decode_as(stream: StreamKind, raw: &[u8]) -> Result<TelemetryRecord, DecodeError> {
    let record = match stream {
        StreamKind::EsxCluster | StreamKind::ResourcePool => TelemetryRecord::Cluster {
            stream,
            data: data_of(stream, raw)?,
        },
        StreamKind::EsxHost => TelemetryRecord::ClusterHost {
            data: data_of(stream, raw)?,
        },
        StreamKind::Datastore => TelemetryRecord::Datastore {
            data: data_of(stream, raw)?,
        },
        StreamKind::VmInfo => TelemetryRecord::Vm {
            data: data_of(stream, raw)?,
        },
    };
    Ok(record)
}

fn data_of<T: DeserializeOwned>(stream: StreamKind, raw: &[u8]) -> Result<Vec<T>, DecodeError> {
    serde_json::from_slice::<Payload<T>>(raw)
        .map(|p| p.data)
        .map_err(|e| DecodeError::MalformedPayload {
            stream: Some(stream),
            reason: e.to_string(),
        })
}
