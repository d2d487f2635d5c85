//! procsnap - typed snapshots of Linux processes decoded from /proc
//!
//! This library turns the text files the kernel exposes under the proc
//! filesystem into structured records. It is designed for auditing and
//! inspection tools that need a consistent, typed view of every process on
//! a host rather than ad-hoc string parsing.
//!
//! # Features
//!
//! - **Per-process records**: argv, environment, exe/cwd/root links, with
//!   stat, status, statm, limits, loginuid and sessionid loaded on demand
//! - **Process table**: parallel scan of every pid directory into a pid-keyed map
//! - **System memory**: `/proc/meminfo` decoded into a fixed record
//! - **Real timestamps**: jiffies counters converted to UTC using boot time
//!   and the kernel clock tick rate
//!
//! # Usage
//!
//! ```no_run
//! use procsnap::{ClockContext, ProcessTable, ScanOptions};
//! use std::path::Path;
//!
//! let clock = ClockContext::system()?;
//! let table = ProcessTable::scan(Path::new("/proc"), clock, &ScanOptions::default())?;
//!
//! for record in table.sorted() {
//!     let stat = record.stat()?;
//!     println!("{} {} started {}", record.pid, stat.comm, stat.starttime);
//! }
//! # Ok::<(), procsnap::ProcError>(())
//! ```

pub mod decoder;

pub mod clock;
pub mod error;
pub mod process;
pub mod system;

/// Where the proc filesystem is normally mounted.
pub const DEFAULT_PROC_ROOT: &str = "/proc";

// Re-export main types for convenience
pub use clock::ClockContext;
pub use error::{DecodeError, ProcError};
pub use process::{
    CancelToken, Limit, LimitUnit, Limits, ProcessDetails, ProcessRecord, ProcessStat,
    ProcessTable, ScanFailure, ScanOptions, Statm, Status, NO_VALUE,
};
pub use system::{read_meminfo, Meminfo};
