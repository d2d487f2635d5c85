//! A single `/proc/<pid>` entry.
//!
//! Construction reads the cheap, always-needed parts (argv, environment and
//! the exe/cwd/root links). Everything else is read on first access and
//! cached for the lifetime of the record.

use once_cell::sync::OnceCell;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::clock::ClockContext;
use crate::decoder::nul_tokens;
use crate::error::ProcError;
use crate::process::limits::{read_limits, Limits};
use crate::process::stat::{read_stat, ProcessStat};
use crate::process::statm::{read_statm, Statm};
use crate::process::status::{read_status, Status};

/// Returned by [`ProcessRecord::login_uid`] and [`ProcessRecord::session_id`]
/// when the kernel exposes no value.
pub const NO_VALUE: u32 = u32::MAX;

/// Typed view of one process directory.
#[derive(Debug)]
pub struct ProcessRecord {
    pub pid: u32,
    /// argv, with empty entries removed. Bytes that are not valid UTF-8
    /// are replaced with U+FFFD.
    pub cmdline: Vec<String>,
    /// `KEY=VALUE` pairs from environ, decoded lossily like `cmdline`.
    pub environ: BTreeMap<String, String>,
    /// Target of the `cwd` link.
    pub cwd: String,
    /// Target of the `exe` link, empty when it could not be resolved.
    pub exe: String,
    /// Target of the `root` link (differs from `/` when chrooted).
    pub root: String,
    proc_path: PathBuf,
    clock: ClockContext,
    stat: OnceCell<ProcessStat>,
    status: OnceCell<Status>,
    statm: OnceCell<Statm>,
    limits: OnceCell<Limits>,
    login_uid: OnceCell<u32>,
    session_id: OnceCell<u32>,
}

impl ProcessRecord {
    /// Reads `<proc_root>/<pid>`.
    pub fn new(
        pid: u32,
        proc_root: &Path,
        clock: ClockContext,
        eager: bool,
    ) -> Result<Self, ProcError> {
        Self::from_path(pid, proc_root.join(pid.to_string()), clock, eager)
    }

    /// Reads a process directory from an arbitrary path laid out like
    /// `/proc/<pid>`.
    ///
    /// With `eager` set, stat, limits, login uid and session id are fetched
    /// right away; failures there are logged and left for the accessors to
    /// report.
    pub fn from_path(
        pid: u32,
        proc_path: impl Into<PathBuf>,
        clock: ClockContext,
        eager: bool,
    ) -> Result<Self, ProcError> {
        let proc_path = proc_path.into();
        fs::metadata(&proc_path).map_err(|e| ProcError::io(&proc_path, e))?;

        let cmdline = read_cmdline(&proc_path)?;

        let exe = match read_link(&proc_path, "exe") {
            Ok(target) => target,
            Err(e) => {
                debug!("Could not resolve exe for pid {}: {}", pid, e);
                String::new()
            }
        };
        let cwd = read_link(&proc_path, "cwd")?;
        let root = read_link(&proc_path, "root")?;
        let environ = read_environ(&proc_path);

        let record = Self {
            pid,
            cmdline,
            environ,
            cwd,
            exe,
            root,
            proc_path,
            clock,
            stat: OnceCell::new(),
            status: OnceCell::new(),
            statm: OnceCell::new(),
            limits: OnceCell::new(),
            login_uid: OnceCell::new(),
            session_id: OnceCell::new(),
        };

        if eager {
            record.preload();
        }

        Ok(record)
    }

    /// Reads the pid stored in a daemon pid file and loads that process.
    pub fn from_pid_file(
        pid_file: &Path,
        proc_root: &Path,
        clock: ClockContext,
        eager: bool,
    ) -> Result<Self, ProcError> {
        let content = fs::read_to_string(pid_file).map_err(|e| ProcError::io(pid_file, e))?;
        let raw = content.trim();
        let pid = raw.parse::<u32>().map_err(|_| ProcError::InvalidPid {
            path: pid_file.to_path_buf(),
            raw: raw.to_string(),
        })?;
        Self::new(pid, proc_root, clock, eager)
    }

    fn preload(&self) {
        if let Err(e) = self.stat() {
            warn!("Failed to preload stat for pid {}: {}", self.pid, e);
        }
        if let Err(e) = self.limits() {
            warn!("Failed to preload limits for pid {}: {}", self.pid, e);
        }
        self.login_uid();
        self.session_id();
    }

    pub fn proc_path(&self) -> &Path {
        &self.proc_path
    }

    /// Parsed /proc/<pid>/stat.
    pub fn stat(&self) -> Result<&ProcessStat, ProcError> {
        self.stat
            .get_or_try_init(|| read_stat(&self.proc_path, &self.clock))
    }

    /// Uid/gid set from /proc/<pid>/status.
    pub fn status(&self) -> Result<&Status, ProcError> {
        self.status.get_or_try_init(|| read_status(&self.proc_path))
    }

    /// Page counts from /proc/<pid>/statm.
    pub fn statm(&self) -> Result<&Statm, ProcError> {
        self.statm.get_or_try_init(|| read_statm(&self.proc_path))
    }

    /// Resource limits from /proc/<pid>/limits.
    pub fn limits(&self) -> Result<&Limits, ProcError> {
        self.limits.get_or_try_init(|| read_limits(&self.proc_path))
    }

    /// Audit login uid, or [`NO_VALUE`].
    pub fn login_uid(&self) -> u32 {
        *self
            .login_uid
            .get_or_init(|| read_optional_integer(&self.proc_path, "loginuid"))
    }

    /// Audit session id, or [`NO_VALUE`].
    pub fn session_id(&self) -> u32 {
        *self
            .session_id
            .get_or_init(|| read_optional_integer(&self.proc_path, "sessionid"))
    }

    /// Short name: basename of argv[0], falling back to the stat comm.
    pub fn name(&self) -> Option<String> {
        if let Some(arg0) = self.cmdline.first() {
            if let Some(name) = Path::new(arg0).file_name().and_then(|s| s.to_str()) {
                return Some(name.to_string());
            }
        }
        self.stat().ok().map(|s| s.comm.clone())
    }

    /// Fetches every sub-record and returns a serializable snapshot.
    /// Sub-records that fail to load are reported as `None`.
    pub fn details(&self) -> ProcessDetails {
        ProcessDetails {
            pid: self.pid,
            cmdline: self.cmdline.clone(),
            environ: self.environ.clone(),
            cwd: self.cwd.clone(),
            exe: self.exe.clone(),
            root: self.root.clone(),
            stat: self.stat().ok().cloned(),
            status: self.status().ok().copied(),
            statm: self.statm().ok().copied(),
            limits: self.limits().ok().cloned(),
            login_uid: self.login_uid(),
            session_id: self.session_id(),
        }
    }
}

/// Fully loaded, owned copy of a [`ProcessRecord`].
#[derive(Debug, Clone, Serialize)]
pub struct ProcessDetails {
    pub pid: u32,
    pub cmdline: Vec<String>,
    pub environ: BTreeMap<String, String>,
    pub cwd: String,
    pub exe: String,
    pub root: String,
    pub stat: Option<ProcessStat>,
    pub status: Option<Status>,
    pub statm: Option<Statm>,
    pub limits: Option<Limits>,
    pub login_uid: u32,
    pub session_id: u32,
}

/// Reads /proc/<pid>/cmdline into argv, replacing invalid UTF-8 with U+FFFD.
pub fn read_cmdline(proc_path: &Path) -> Result<Vec<String>, ProcError> {
    let path = proc_path.join("cmdline");
    let content = fs::read(&path).map_err(|e| ProcError::io(&path, e))?;
    Ok(nul_tokens(&content))
}

/// Reads /proc/<pid>/environ. Entries without `=` are ignored; an unreadable
/// file (typically another user's process) yields an empty map.
pub fn read_environ(proc_path: &Path) -> BTreeMap<String, String> {
    let path = proc_path.join("environ");
    match fs::read(&path) {
        Ok(content) => parse_environ(&content),
        Err(e) => {
            debug!("Could not read {}: {}", path.display(), e);
            BTreeMap::new()
        }
    }
}

/// Splits a NUL separated `KEY=VALUE` block at the first `=` of each entry.
pub fn parse_environ(content: &[u8]) -> BTreeMap<String, String> {
    nul_tokens(content)
        .into_iter()
        .filter_map(|item| {
            item.split_once('=')
                .map(|(k, v)| (k.to_string(), v.to_string()))
        })
        .collect()
}

fn read_link(proc_path: &Path, name: &str) -> Result<String, ProcError> {
    let path = proc_path.join(name);
    let target = fs::read_link(&path).map_err(|e| ProcError::io(&path, e))?;
    Ok(target.to_string_lossy().into_owned())
}

fn read_optional_integer(proc_path: &Path, name: &str) -> u32 {
    let path = proc_path.join(name);
    match fs::read_to_string(&path) {
        Ok(content) => match content.trim().parse::<u32>() {
            Ok(v) => v,
            Err(e) => {
                warn!("Unparsable {}: {:?} ({})", path.display(), content, e);
                NO_VALUE
            }
        },
        Err(e) => {
            debug!("Unable to read {}, using no value: {}", path.display(), e);
            NO_VALUE
        }
    }
}
