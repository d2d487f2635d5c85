//! Process status line parsing from `/proc/<pid>/stat`.
//!
//! The line is a single record of space separated values in the order
//! documented in proc(5). The second value is the command name wrapped in
//! parentheses; the name itself may contain spaces or parentheses, so it is
//! cut out between the first `(` and the last `)` before the rest of the
//! line is split.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;

use crate::clock::ClockContext;
use crate::decoder::{decode_record, read_lossy, FieldSpec};
use crate::error::{DecodeError, ProcError};
use crate::field;

/// Data from /proc/<pid>/stat.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProcessStat {
    /// process id
    pub pid: i32,
    /// filename of the executable
    pub comm: String,
    /// R running, S sleeping, D uninterruptible wait, Z zombie, T traced or stopped
    pub state: String,
    pub ppid: i32,
    pub pgrp: i32,
    pub session: i32,
    /// controlling terminal
    pub tty_nr: i32,
    /// foreground process group of the terminal
    pub tpgid: i32,
    pub flags: i64,
    pub minflt: i64,
    pub cminflt: i64,
    pub majflt: i64,
    pub cmajflt: i64,
    pub utime: DateTime<Utc>,
    pub stime: DateTime<Utc>,
    pub cutime: DateTime<Utc>,
    pub cstime: DateTime<Utc>,
    pub priority: i64,
    pub nice: i64,
    pub num_threads: i64,
    /// obsolete, always 0
    pub itrealvalue: i64,
    /// time the process started
    pub starttime: DateTime<Utc>,
    /// virtual memory size in bytes
    pub vsize: i64,
    /// resident set size in pages
    pub rss: i64,
    /// soft limit on the rss in bytes
    pub rlim: u64,
    pub startcode: i64,
    pub endcode: i64,
    pub startstack: i64,
    pub kstkesp: i64,
    pub kstkeip: i64,
    /// bitmap of pending signals
    pub signal: i64,
    pub blocked: i64,
    pub sigignore: i64,
    pub sigcatch: i64,
    pub wchan: u64,
    pub nswap: i64,
    pub cnswap: i64,
    pub exit_signal: i32,
    /// CPU last executed on
    pub processor: i32,
    pub rt_priority: i64,
    pub policy: i64,
    pub delayacct_blkio_ticks: i64,
}

static STAT_FIELDS: &[FieldSpec<ProcessStat>] = &[
    field!(ProcessStat, Int32, "pid", pid),
    field!(ProcessStat, Str, "comm", comm),
    field!(ProcessStat, Str, "state", state),
    field!(ProcessStat, Int32, "ppid", ppid),
    field!(ProcessStat, Int32, "pgrp", pgrp),
    field!(ProcessStat, Int32, "session", session),
    field!(ProcessStat, Int32, "tty_nr", tty_nr),
    field!(ProcessStat, Int32, "tpgid", tpgid),
    field!(ProcessStat, Int64, "flags", flags),
    field!(ProcessStat, Int64, "minflt", minflt),
    field!(ProcessStat, Int64, "cminflt", cminflt),
    field!(ProcessStat, Int64, "majflt", majflt),
    field!(ProcessStat, Int64, "cmajflt", cmajflt),
    field!(ProcessStat, Jiffies, "utime", utime),
    field!(ProcessStat, Jiffies, "stime", stime),
    field!(ProcessStat, Jiffies, "cutime", cutime),
    field!(ProcessStat, Jiffies, "cstime", cstime),
    field!(ProcessStat, Int64, "priority", priority),
    field!(ProcessStat, Int64, "nice", nice),
    field!(ProcessStat, Int64, "num_threads", num_threads),
    field!(ProcessStat, Int64, "itrealvalue", itrealvalue),
    field!(ProcessStat, Jiffies, "starttime", starttime),
    field!(ProcessStat, Int64, "vsize", vsize),
    field!(ProcessStat, Int64, "rss", rss),
    field!(ProcessStat, Uint64, "rsslim", rlim),
    field!(ProcessStat, Int64, "startcode", startcode),
    field!(ProcessStat, Int64, "endcode", endcode),
    field!(ProcessStat, Int64, "startstack", startstack),
    field!(ProcessStat, Int64, "kstkesp", kstkesp),
    field!(ProcessStat, Int64, "kstkeip", kstkeip),
    field!(ProcessStat, Int64, "signal", signal),
    field!(ProcessStat, Int64, "blocked", blocked),
    field!(ProcessStat, Int64, "sigignore", sigignore),
    field!(ProcessStat, Int64, "sigcatch", sigcatch),
    field!(ProcessStat, Uint64, "wchan", wchan),
    field!(ProcessStat, Int64, "nswap", nswap),
    field!(ProcessStat, Int64, "cnswap", cnswap),
    field!(ProcessStat, Int32, "exit_signal", exit_signal),
    field!(ProcessStat, Int32, "processor", processor),
    field!(ProcessStat, Int64, "rt_priority", rt_priority),
    field!(ProcessStat, Int64, "policy", policy),
    field!(ProcessStat, Int64, "delayacct_blkio_ticks", delayacct_blkio_ticks),
];

/// Splits a stat line into positional tokens with the command name as a
/// single token (without its parentheses).
fn stat_tokens(line: &str) -> Vec<&str> {
    let line = line.trim_end();
    match (line.find('('), line.rfind(')')) {
        (Some(open), Some(close)) if open < close => {
            let mut tokens = Vec::with_capacity(STAT_FIELDS.len());
            tokens.extend(line[..open].split_whitespace());
            tokens.push(&line[open + 1..close]);
            tokens.extend(line[close + 1..].split_whitespace());
            tokens
        }
        _ => line.split_whitespace().collect(),
    }
}

/// Decodes one /proc/<pid>/stat line.
pub fn parse_stat(line: &str, clock: &ClockContext) -> Result<ProcessStat, DecodeError> {
    decode_record(STAT_FIELDS, stat_tokens(line), Some(clock))
}

/// Reads and decodes `<proc_path>/stat`.
pub fn read_stat(proc_path: &Path, clock: &ClockContext) -> Result<ProcessStat, ProcError> {
    let path = proc_path.join("stat");
    let content = read_lossy(&path)?;
    parse_stat(&content, clock).map_err(|e| ProcError::decode(&path, e))
}
