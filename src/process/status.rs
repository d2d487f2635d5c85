//! User and group identity from `/proc/<pid>/status`.
//!
//! Most of status duplicates stat, so only the `Uid:` and `Gid:` lines are
//! read. Each carries real, effective, saved and filesystem ids.

use serde::Serialize;
use std::path::Path;

use crate::decoder::{decode_record, read_lossy, FieldSpec};
use crate::error::{DecodeError, ProcError};
use crate::field;

/// Uid/gid information from /proc/<pid>/status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Status {
    /// Real user ID
    pub uid: u32,
    /// Effective user ID
    pub euid: u32,
    /// Saved user ID
    pub suid: u32,
    /// Filesystem user ID
    pub fsuid: u32,
    /// Real group ID
    pub gid: u32,
    /// Effective group ID
    pub egid: u32,
    /// Saved group ID
    pub sgid: u32,
    /// Filesystem group ID
    pub fsgid: u32,
}

#[derive(Default)]
struct IdSet {
    real: u32,
    effective: u32,
    saved: u32,
    filesystem: u32,
}

static UID_FIELDS: &[FieldSpec<IdSet>] = &[
    field!(IdSet, Uint32, "Uid", real),
    field!(IdSet, Uint32, "Euid", effective),
    field!(IdSet, Uint32, "Suid", saved),
    field!(IdSet, Uint32, "Fsuid", filesystem),
];

static GID_FIELDS: &[FieldSpec<IdSet>] = &[
    field!(IdSet, Uint32, "Gid", real),
    field!(IdSet, Uint32, "Egid", effective),
    field!(IdSet, Uint32, "Sgid", saved),
    field!(IdSet, Uint32, "Fsgid", filesystem),
];

fn parse_ids(
    label: &'static str,
    line: &str,
    values: &str,
    schema: &[FieldSpec<IdSet>],
) -> Result<IdSet, DecodeError> {
    let tokens: Vec<&str> = values.split_whitespace().collect();
    if tokens.len() < schema.len() {
        return Err(DecodeError::MalformedLine {
            label,
            line: line.to_string(),
        });
    }
    decode_record(schema, tokens, None)
}

/// Decodes the uid/gid lines of a status file. Missing lines leave zeros.
pub fn parse_status(content: &str) -> Result<Status, DecodeError> {
    let mut status = Status::default();

    for line in content.lines() {
        let line = line.trim();
        if let Some(values) = line.strip_prefix("Uid:") {
            let ids = parse_ids("Uid", line, values, UID_FIELDS)?;
            status.uid = ids.real;
            status.euid = ids.effective;
            status.suid = ids.saved;
            status.fsuid = ids.filesystem;
        } else if let Some(values) = line.strip_prefix("Gid:") {
            let ids = parse_ids("Gid", line, values, GID_FIELDS)?;
            status.gid = ids.real;
            status.egid = ids.effective;
            status.sgid = ids.saved;
            status.fsgid = ids.filesystem;
        }
    }

    Ok(status)
}

/// Reads and decodes `<proc_path>/status`.
pub fn read_status(proc_path: &Path) -> Result<Status, ProcError> {
    let path = proc_path.join("status");
    let content = read_lossy(&path)?;
    parse_status(&content).map_err(|e| ProcError::decode(&path, e))
}
