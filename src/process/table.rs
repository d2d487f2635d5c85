//! Pid-keyed snapshot of every process under a proc root.
//!
//! Each pid directory is loaded on the rayon pool. A process that vanishes
//! or becomes unreadable while the scan runs is not an error for the scan as
//! a whole; it is left out of the table and recorded as a [`ScanFailure`].

use ahash::AHashMap as HashMap;
use rayon::prelude::*;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, instrument, warn};

use crate::clock::ClockContext;
use crate::error::ProcError;
use crate::process::record::ProcessRecord;
use crate::process::scanner::{collect_proc_entries, NameFilter, ProcEntry};

/// Shared flag that stops a running scan. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Knobs for [`ProcessTable::scan`].
#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    /// Preload stat, limits, login uid and session id for every record.
    pub eager: bool,
    /// Run on a dedicated pool of this many threads instead of the global one.
    pub parallelism: Option<usize>,
    /// Stop listing after this many pid directories.
    pub max_processes: Option<usize>,
    pub filter: NameFilter,
    pub cancel: Option<CancelToken>,
}

impl ScanOptions {
    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(|c| c.is_cancelled())
    }
}

/// A pid that was listed but could not be loaded.
#[derive(Debug)]
pub struct ScanFailure {
    pub pid: u32,
    pub error: ProcError,
}

/// Every successfully loaded process, keyed by pid.
#[derive(Debug, Default)]
pub struct ProcessTable {
    processes: HashMap<u32, ProcessRecord>,
    failures: Vec<ScanFailure>,
}

impl ProcessTable {
    /// Scans `proc_root` and loads every pid directory in parallel.
    ///
    /// Fails only when `proc_root` itself cannot be listed or the scan is
    /// cancelled. Per-process failures end up in [`ProcessTable::failures`].
    #[instrument(skip(clock, options), fields(eager = options.eager))]
    pub fn scan(
        proc_root: &Path,
        clock: &ClockContext,
        options: &ScanOptions,
    ) -> Result<Self, ProcError> {
        let start = Instant::now();
        let entries = collect_proc_entries(proc_root, options.max_processes)?;
        debug!(
            "Collected {} process entries from {}",
            entries.len(),
            proc_root.display()
        );

        let clock = *clock;
        let run = || load_entries(&entries, clock, options);
        let results = match options.parallelism {
            Some(threads) if threads > 0 => {
                match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
                    Ok(pool) => {
                        debug!("Scanning on a dedicated pool of {} threads", threads);
                        pool.install(run)
                    }
                    Err(e) => {
                        warn!("Failed to build rayon thread pool, using global pool: {}", e);
                        run()
                    }
                }
            }
            _ => run(),
        };

        if options.is_cancelled() {
            debug!("Scan of {} cancelled", proc_root.display());
            return Err(ProcError::Cancelled);
        }

        let mut table = ProcessTable::default();
        for (pid, result) in results {
            match result {
                Ok(record) => {
                    table.processes.insert(pid, record);
                }
                Err(error) => {
                    debug!("Skipping process {}: {}", pid, error);
                    table.failures.push(ScanFailure { pid, error });
                }
            }
        }

        debug!(
            "Scanned {} processes ({} failed) in {:.2} ms",
            table.processes.len(),
            table.failures.len(),
            start.elapsed().as_secs_f64() * 1000.0
        );
        Ok(table)
    }

    pub fn get(&self, pid: u32) -> Option<&ProcessRecord> {
        self.processes.get(&pid)
    }

    pub fn contains(&self, pid: u32) -> bool {
        self.processes.contains_key(&pid)
    }

    pub fn len(&self) -> usize {
        self.processes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processes.is_empty()
    }

    /// Loaded pids in ascending order.
    pub fn pids(&self) -> Vec<u32> {
        let mut pids: Vec<u32> = self.processes.keys().copied().collect();
        pids.sort_unstable();
        pids
    }

    /// Records in ascending pid order.
    pub fn sorted(&self) -> Vec<&ProcessRecord> {
        let mut records: Vec<&ProcessRecord> = self.processes.values().collect();
        records.sort_unstable_by_key(|r| r.pid);
        records
    }

    pub fn iter(&self) -> impl Iterator<Item = (&u32, &ProcessRecord)> {
        self.processes.iter()
    }

    pub fn failures(&self) -> &[ScanFailure] {
        &self.failures
    }

    pub fn into_records(self) -> HashMap<u32, ProcessRecord> {
        self.processes
    }
}

fn load_entries(
    entries: &[ProcEntry],
    clock: ClockContext,
    options: &ScanOptions,
) -> Vec<(u32, Result<ProcessRecord, ProcError>)> {
    entries
        .par_iter()
        .filter_map(|entry| {
            if options.is_cancelled() {
                return None;
            }
            if !options.filter.should_include_entry(entry) {
                debug!("Skipping process {}: filtered by name config", entry.pid);
                return None;
            }
            let result =
                ProcessRecord::from_path(entry.pid, &entry.proc_path, clock, options.eager);
            Some((entry.pid, result))
        })
        .collect()
}
