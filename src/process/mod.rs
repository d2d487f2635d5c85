//! Per-process files under /proc/<pid>.
//!
//! This module provides:
//! - `stat`, `status`, `statm`, `limits`: decoders for the individual files
//! - `record`: a process with lazily loaded sub-records
//! - `scanner`: process discovery and name filtering
//! - `table`: parallel scan of every process into a pid-keyed table

pub mod limits;
pub mod record;
pub mod scanner;
pub mod stat;
pub mod statm;
pub mod status;
pub mod table;

// Re-export commonly used types
pub use limits::{parse_limits, read_limits, Limit, LimitUnit, Limits, UNLIMITED};
pub use record::{ProcessDetails, ProcessRecord, NO_VALUE};
pub use scanner::{collect_proc_entries, read_process_name, NameFilter, ProcEntry};
pub use stat::{parse_stat, read_stat, ProcessStat};
pub use statm::{parse_statm, read_statm, Statm};
pub use status::{parse_status, read_status, Status};
pub use table::{CancelToken, ProcessTable, ScanFailure, ScanOptions};
