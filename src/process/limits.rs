//! Resource limits from `/proc/<pid>/limits`.
//!
//! The file is a table with a header row and columns separated by runs of
//! at least two spaces:
//!
//! ```text
//! Limit                     Soft Limit           Hard Limit           Units
//! Max cpu time              unlimited            unlimited            seconds
//! Max nice priority         0                    0
//! ```
//!
//! Limit names are normalized by dropping the `Max ` prefix and CamelCasing
//! the rest, so `Max open files` becomes `OpenFiles`.

use ahash::AHashMap as HashMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::warn;

use crate::error::{DecodeError, ProcError};

/// Sentinel for an `unlimited` soft or hard value.
pub const UNLIMITED: i64 = -1;

static COLUMN_SEPARATOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s\s+").expect("valid regex"));
static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[0-9A-Za-z]+").expect("valid regex"));

/// Unit column of a limits row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LimitUnit {
    Bytes,
    Seconds,
    Processes,
    Files,
    Signals,
    Locks,
    Us,
    Unknown,
}

impl LimitUnit {
    pub fn from_column(column: &str) -> Self {
        match column {
            "bytes" => LimitUnit::Bytes,
            "seconds" => LimitUnit::Seconds,
            "processes" => LimitUnit::Processes,
            "files" => LimitUnit::Files,
            "signals" => LimitUnit::Signals,
            "locks" => LimitUnit::Locks,
            "us" => LimitUnit::Us,
            _ => LimitUnit::Unknown,
        }
    }
}

/// One row of the limits table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Limit {
    pub soft_value: i64,
    pub hard_value: i64,
    pub unit: LimitUnit,
}

impl Limit {
    pub fn is_soft_unlimited(&self) -> bool {
        self.soft_value == UNLIMITED
    }

    pub fn is_hard_unlimited(&self) -> bool {
        self.hard_value == UNLIMITED
    }
}

/// Per-process rlimit settings. A `None` entry means the kernel printed no
/// such row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Limits {
    pub cpu_time: Option<Limit>,
    pub file_size: Option<Limit>,
    pub data_size: Option<Limit>,
    pub stack_size: Option<Limit>,
    pub core_file_size: Option<Limit>,
    pub resident_set: Option<Limit>,
    pub processes: Option<Limit>,
    pub open_files: Option<Limit>,
    pub locked_memory: Option<Limit>,
    pub address_space: Option<Limit>,
    pub file_locks: Option<Limit>,
    pub pending_signals: Option<Limit>,
    pub msgqueue_size: Option<Limit>,
    pub nice_priority: Option<Limit>,
    pub realtime_priority: Option<Limit>,
    pub realtime_timeout: Option<Limit>,
}

impl Limits {
    /// All limits in kernel order, keyed by their normalized name.
    pub fn entries(&self) -> [(&'static str, Option<&Limit>); 16] {
        [
            ("CpuTime", self.cpu_time.as_ref()),
            ("FileSize", self.file_size.as_ref()),
            ("DataSize", self.data_size.as_ref()),
            ("StackSize", self.stack_size.as_ref()),
            ("CoreFileSize", self.core_file_size.as_ref()),
            ("ResidentSet", self.resident_set.as_ref()),
            ("Processes", self.processes.as_ref()),
            ("OpenFiles", self.open_files.as_ref()),
            ("LockedMemory", self.locked_memory.as_ref()),
            ("AddressSpace", self.address_space.as_ref()),
            ("FileLocks", self.file_locks.as_ref()),
            ("PendingSignals", self.pending_signals.as_ref()),
            ("MsgqueueSize", self.msgqueue_size.as_ref()),
            ("NicePriority", self.nice_priority.as_ref()),
            ("RealtimePriority", self.realtime_priority.as_ref()),
            ("RealtimeTimeout", self.realtime_timeout.as_ref()),
        ]
    }

    /// Looks a limit up by normalized name, e.g. `"OpenFiles"`.
    pub fn get(&self, name: &str) -> Option<&Limit> {
        self.entries()
            .into_iter()
            .find(|(n, _)| *n == name)
            .and_then(|(_, limit)| limit)
    }

    fn slot_mut(&mut self, name: &str) -> Option<&mut Option<Limit>> {
        let slot = match name {
            "CpuTime" => &mut self.cpu_time,
            "FileSize" => &mut self.file_size,
            "DataSize" => &mut self.data_size,
            "StackSize" => &mut self.stack_size,
            "CoreFileSize" => &mut self.core_file_size,
            "ResidentSet" => &mut self.resident_set,
            "Processes" => &mut self.processes,
            "OpenFiles" => &mut self.open_files,
            "LockedMemory" => &mut self.locked_memory,
            "AddressSpace" => &mut self.address_space,
            "FileLocks" => &mut self.file_locks,
            "PendingSignals" => &mut self.pending_signals,
            "MsgqueueSize" => &mut self.msgqueue_size,
            "NicePriority" => &mut self.nice_priority,
            "RealtimePriority" => &mut self.realtime_priority,
            "RealtimeTimeout" => &mut self.realtime_timeout,
            _ => return None,
        };
        Some(slot)
    }
}

/// Converts a spaced name to CamelCase: "my string is" becomes "MyStringIs".
///
/// Only ASCII alphanumeric runs survive; everything else separates words.
pub fn to_camel_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for word in WORD.find_iter(s) {
        let mut chars = word.as_str().chars();
        if let Some(first) = chars.next() {
            out.push(first.to_ascii_uppercase());
            out.push_str(chars.as_str());
        }
    }
    out
}

/// Parses a soft/hard column; `unlimited` maps to [`UNLIMITED`].
fn parse_limit_value(name: &str, raw: &str) -> Result<i64, DecodeError> {
    if raw == "unlimited" {
        return Ok(UNLIMITED);
    }
    raw.parse::<i64>().map_err(|_| DecodeError::InvalidValue {
        key: name.to_string(),
        raw: raw.to_string(),
    })
}

/// Decodes every data row into a map keyed by normalized limit name.
///
/// The first line is the header and is skipped. Rows with fewer than three
/// columns are logged and skipped; unparsable values fail the decode.
pub fn limit_rows(content: &str) -> Result<HashMap<String, Limit>, DecodeError> {
    let mut result = HashMap::new();

    for line in content.lines().skip(1) {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let parts: Vec<&str> = COLUMN_SEPARATOR.split(line).collect();
        if parts.len() < 3 {
            warn!(
                "Malformed limits line, expected at least 3 columns but got {}: {:?}",
                parts.len(),
                line
            );
            continue;
        }

        let title = parts[0].strip_prefix("Max ").unwrap_or(parts[0]);
        let name = to_camel_case(title);

        let limit = Limit {
            soft_value: parse_limit_value(&name, parts[1])?,
            hard_value: parse_limit_value(&name, parts[2])?,
            unit: parts
                .get(3)
                .map_or(LimitUnit::Unknown, |u| LimitUnit::from_column(u)),
        };
        result.insert(name, limit);
    }

    Ok(result)
}

/// Decodes /proc/<pid>/limits content. Rows with unknown names are dropped.
pub fn parse_limits(content: &str) -> Result<Limits, DecodeError> {
    let mut limits = Limits::default();
    for (name, limit) in limit_rows(content)? {
        if let Some(slot) = limits.slot_mut(&name) {
            *slot = Some(limit);
        }
    }
    Ok(limits)
}

/// Reads and decodes `<proc_path>/limits`.
pub fn read_limits(proc_path: &Path) -> Result<Limits, ProcError> {
    let path = proc_path.join("limits");
    let content = fs::read_to_string(&path).map_err(|e| ProcError::io(&path, e))?;
    parse_limits(&content).map_err(|e| ProcError::decode(&path, e))
}
