//! Error types for /proc decoding.
//!
//! `DecodeError` describes why a single record could not be turned into a
//! typed value. `ProcError` wraps it together with I/O failures and the
//! clock initialization failures.

use std::path::PathBuf;

/// Failure while turning tokens or lines into a typed record.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("cannot parse field {field} (position {position}) from {raw:?}: {reason}")]
    InvalidField {
        field: &'static str,
        position: usize,
        raw: String,
        reason: String,
    },

    #[error("field {field} holds jiffies but no clock context was supplied")]
    MissingClock { field: &'static str },

    #[error("field {field}: {jiffies} jiffies is outside the representable time range")]
    TimestampOutOfRange { field: &'static str, jiffies: i64 },

    #[error("malformed {label} line: {line:?}")]
    MalformedLine { label: &'static str, line: String },

    #[error("cannot parse value for {key} from {raw:?}")]
    InvalidValue { key: String, raw: String },
}

/// Errors surfaced by the record readers and the process enumeration.
#[derive(Debug, thiserror::Error)]
pub enum ProcError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode {}: {source}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: DecodeError,
    },

    #[error("no btime line found in {}", .path.display())]
    MissingBootTime { path: PathBuf },

    #[error("invalid btime value {raw:?} in {}", .path.display())]
    InvalidBootTime { path: PathBuf, raw: String },

    #[error("invalid clock tick rate {0}")]
    InvalidTickRate(i64),

    #[error("invalid pid {raw:?} in {}", .path.display())]
    InvalidPid { path: PathBuf, raw: String },

    #[error("scan cancelled")]
    Cancelled,
}

impl ProcError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ProcError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn decode(path: impl Into<PathBuf>, source: DecodeError) -> Self {
        ProcError::Decode {
            path: path.into(),
            source,
        }
    }

    /// True when the underlying cause is a missing file, which for /proc
    /// usually means the process exited mid-read.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ProcError::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound)
    }
}
