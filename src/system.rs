//! System-wide records from the /proc filesystem.
//!
//! This module reads the boot time (`btime`) from /proc/stat and the
//! memory summary from /proc/meminfo.

use ahash::AHashMap as HashMap;
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::warn;

use crate::error::{DecodeError, ProcError};

/// Reads the boot epoch (seconds) from the `btime` line of `<proc_root>/stat`.
///
/// Format: "btime 1388417200"
pub fn read_boot_time(proc_root: &Path) -> Result<i64, ProcError> {
    let path = proc_root.join("stat");
    let content = fs::read_to_string(&path).map_err(|e| ProcError::io(&path, e))?;

    for line in content.lines() {
        if let Some(rest) = line.strip_prefix("btime") {
            let raw = rest.trim();
            return raw.parse::<i64>().map_err(|_| ProcError::InvalidBootTime {
                path: path.clone(),
                raw: raw.to_string(),
            });
        }
    }

    Err(ProcError::MissingBootTime { path })
}

/// System memory summary from /proc/meminfo. Values are as printed by the
/// kernel (kB for all sized counters).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Meminfo {
    pub mem_total: i64,
    pub mem_free: i64,
    pub buffers: i64,
    pub cached: i64,
    pub swap_cached: i64,
    pub active: i64,
    pub inactive: i64,
    pub high_total: i64,
    pub high_free: i64,
    pub low_total: i64,
    pub low_free: i64,
    pub swap_total: i64,
    pub swap_free: i64,
    pub dirty: i64,
    pub writeback: i64,
    pub anon_pages: i64,
    pub mapped: i64,
    pub slab: i64,
    pub s_reclaimable: i64,
    pub s_unreclaim: i64,
    pub page_tables: i64,
    pub nfs_unstable: i64,
    pub bounce: i64,
    pub writeback_tmp: i64,
    pub commit_limit: i64,
    pub committed_as: i64,
    pub vmalloc_total: i64,
    pub vmalloc_used: i64,
    pub vmalloc_chunk: i64,
    pub anon_huge_pages: i64,
}

/// Kernel key and destination of every counter kept in [`Meminfo`].
const MEMINFO_KEYS: &[(&str, fn(&mut Meminfo) -> &mut i64)] = &[
    ("MemTotal", |m| &mut m.mem_total),
    ("MemFree", |m| &mut m.mem_free),
    ("Buffers", |m| &mut m.buffers),
    ("Cached", |m| &mut m.cached),
    ("SwapCached", |m| &mut m.swap_cached),
    ("Active", |m| &mut m.active),
    ("Inactive", |m| &mut m.inactive),
    ("HighTotal", |m| &mut m.high_total),
    ("HighFree", |m| &mut m.high_free),
    ("LowTotal", |m| &mut m.low_total),
    ("LowFree", |m| &mut m.low_free),
    ("SwapTotal", |m| &mut m.swap_total),
    ("SwapFree", |m| &mut m.swap_free),
    ("Dirty", |m| &mut m.dirty),
    ("Writeback", |m| &mut m.writeback),
    ("AnonPages", |m| &mut m.anon_pages),
    ("Mapped", |m| &mut m.mapped),
    ("Slab", |m| &mut m.slab),
    ("SReclaimable", |m| &mut m.s_reclaimable),
    ("SUnreclaim", |m| &mut m.s_unreclaim),
    ("PageTables", |m| &mut m.page_tables),
    ("NFS_Unstable", |m| &mut m.nfs_unstable),
    ("Bounce", |m| &mut m.bounce),
    ("WritebackTmp", |m| &mut m.writeback_tmp),
    ("CommitLimit", |m| &mut m.commit_limit),
    ("Committed_AS", |m| &mut m.committed_as),
    ("VmallocTotal", |m| &mut m.vmalloc_total),
    ("VmallocUsed", |m| &mut m.vmalloc_used),
    ("VmallocChunk", |m| &mut m.vmalloc_chunk),
    ("AnonHugePages", |m| &mut m.anon_huge_pages),
];

/// Collects every `Key: value [unit]` pair of a meminfo-style file.
///
/// Lines with fewer than two columns are logged and skipped. A value that
/// is not an integer fails the whole decode.
pub fn meminfo_pairs(content: &str) -> Result<HashMap<String, i64>, DecodeError> {
    let mut result = HashMap::new();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 2 {
            warn!(
                "Malformed meminfo line, expected 2 parts but got {}: {:?}",
                parts.len(),
                line
            );
            continue;
        }

        let key = parts[0].replace(':', "");
        let value = parts[1]
            .parse::<i64>()
            .map_err(|_| DecodeError::InvalidValue {
                key: key.clone(),
                raw: parts[1].to_string(),
            })?;
        result.insert(key, value);
    }

    Ok(result)
}

/// Decodes /proc/meminfo content. Keys not part of [`Meminfo`] are dropped.
pub fn parse_meminfo(content: &str) -> Result<Meminfo, DecodeError> {
    let pairs = meminfo_pairs(content)?;
    let mut meminfo = Meminfo::default();
    for (key, slot) in MEMINFO_KEYS {
        if let Some(value) = pairs.get(*key) {
            *slot(&mut meminfo) = *value;
        }
    }
    Ok(meminfo)
}

/// Reads and decodes `<proc_root>/meminfo`.
pub fn read_meminfo(proc_root: &Path) -> Result<Meminfo, ProcError> {
    let path = proc_root.join("meminfo");
    let content = fs::read_to_string(&path).map_err(|e| ProcError::io(&path, e))?;
    parse_meminfo(&content).map_err(|e| ProcError::decode(&path, e))
}
