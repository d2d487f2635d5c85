//! Process discovery under a /proc root.
//!
//! Lists the numeric subdirectories of the proc root and decides which of
//! them a scan should visit.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ProcError;

/// Process entry representing a directory in /proc filesystem.
#[derive(Debug, Clone)]
pub struct ProcEntry {
    pub pid: u32,
    pub proc_path: PathBuf,
}

/// Lists `<root>/<pid>` directories. Only a failure to open `root` itself is
/// an error; entries that disappear or cannot be inspected are skipped.
pub fn collect_proc_entries(root: &Path, max: Option<usize>) -> Result<Vec<ProcEntry>, ProcError> {
    let entries = fs::read_dir(root).map_err(|e| ProcError::io(root, e))?;

    let mut out = Vec::new();
    for entry in entries.flatten() {
        let p = entry.path();
        let name = match p.file_name().and_then(|s| s.to_str()) {
            Some(v) => v,
            None => continue,
        };
        if name.is_empty() || !name.chars().all(|c| c.is_ascii_digit()) {
            continue;
        }
        if !entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
            continue;
        }
        let pid: u32 = match name.parse() {
            Ok(v) => v,
            Err(_) => continue,
        };
        out.push(ProcEntry { pid, proc_path: p });
        if let Some(maxp) = max {
            if out.len() >= maxp {
                break;
            }
        }
    }
    Ok(out)
}

/// Reads process name from comm file or extracts from cmdline.
pub fn read_process_name(proc_path: &Path) -> Option<String> {
    if let Ok(bytes) = fs::read(proc_path.join("comm")) {
        let s = String::from_utf8_lossy(&bytes);
        let t = s.trim();
        if !t.is_empty() {
            return Some(t.into());
        }
    }

    let content = fs::read(proc_path.join("cmdline")).ok()?;
    let arg0 = content
        .split(|&b| b == 0u8)
        .find(|s| !s.is_empty())
        .and_then(|s| std::str::from_utf8(s).ok())?;
    Path::new(arg0)
        .file_name()
        .and_then(|n| n.to_str())
        .map(|s| s.to_string())
}

/// Substring filters on the process name.
#[derive(Debug, Clone, Default)]
pub struct NameFilter {
    pub include_names: Option<Vec<String>>,
    pub exclude_names: Option<Vec<String>>,
}

impl NameFilter {
    /// True when neither list is set, so names need not be read at all.
    pub fn is_empty(&self) -> bool {
        self.include_names.as_ref().map_or(true, |v| v.is_empty())
            && self.exclude_names.as_ref().map_or(true, |v| v.is_empty())
    }

    /// Exclusion wins over inclusion; an empty include list matches everything.
    pub fn should_include(&self, name: &str) -> bool {
        if let Some(ex) = &self.exclude_names {
            if ex.iter().any(|s| name.contains(s.as_str())) {
                return false;
            }
        }
        if let Some(inc) = &self.include_names {
            if !inc.is_empty() {
                return inc.iter().any(|s| name.contains(s.as_str()));
            }
        }
        true
    }

    /// Applies the filter to a process directory. A process whose name cannot
    /// be read is kept so that the record load reports the actual problem.
    pub fn should_include_entry(&self, entry: &ProcEntry) -> bool {
        if self.is_empty() {
            return true;
        }
        match read_process_name(&entry.proc_path) {
            Some(name) => self.should_include(&name),
            None => true,
        }
    }
}
