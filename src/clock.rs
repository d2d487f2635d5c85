//! Boot epoch and scheduler tick rate, used to turn jiffies into timestamps.
//!
//! Several /proc/<pid>/stat fields are expressed in clock ticks since boot.
//! Converting them to wall-clock time needs the boot epoch (the `btime` line
//! of /proc/stat) and `sysconf(_SC_CLK_TCK)`. A `ClockContext` holds both and
//! is passed explicitly to every decoder that needs it.

use chrono::{DateTime, Utc};
use once_cell::sync::OnceCell;
use serde::Serialize;
use std::path::Path;
use tracing::debug;

use crate::error::ProcError;
use crate::system::read_boot_time;
use crate::DEFAULT_PROC_ROOT;

/// Fallback used when sysconf cannot report the tick rate.
pub const DEFAULT_CLK_TCK: i64 = 100;

static SYSTEM_CLOCK: OnceCell<ClockContext> = OnceCell::new();

/// Get system clock ticks per second (usually 100, but can vary).
pub fn clock_ticks_per_second() -> i64 {
    // SAFETY: sysconf is safe to call with _SC_CLK_TCK
    // Returns -1 on error, 0 if undefined - both are handled by the > 0 check
    let tck = unsafe { libc::sysconf(libc::_SC_CLK_TCK) };
    if tck > 0 {
        tck as i64
    } else {
        DEFAULT_CLK_TCK
    }
}

/// Boot epoch (seconds) plus ticks per second.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ClockContext {
    boot_epoch: i64,
    ticks_per_second: i64,
}

impl ClockContext {
    /// Builds a context from known values. `ticks_per_second` must be positive.
    pub fn new(boot_epoch: i64, ticks_per_second: i64) -> Result<Self, ProcError> {
        if ticks_per_second <= 0 {
            return Err(ProcError::InvalidTickRate(ticks_per_second));
        }
        Ok(Self {
            boot_epoch,
            ticks_per_second,
        })
    }

    /// Reads `btime` from `<proc_root>/stat` and queries the tick rate from
    /// the host.
    pub fn from_proc_root(proc_root: &Path) -> Result<Self, ProcError> {
        let boot_epoch = read_boot_time(proc_root)?;
        let ticks = clock_ticks_per_second();
        debug!(
            "Resolved clock context from {}: btime={} ticks_per_second={}",
            proc_root.display(),
            boot_epoch,
            ticks
        );
        Self::new(boot_epoch, ticks)
    }

    /// Process-wide context for the host's /proc.
    ///
    /// Resolved on first successful call and shared by every later caller,
    /// including concurrent ones. A failed resolution is returned to the
    /// caller and retried on the next call.
    pub fn system() -> Result<&'static ClockContext, ProcError> {
        SYSTEM_CLOCK.get_or_try_init(|| Self::from_proc_root(Path::new(DEFAULT_PROC_ROOT)))
    }

    pub fn boot_epoch(&self) -> i64 {
        self.boot_epoch
    }

    pub fn ticks_per_second(&self) -> i64 {
        self.ticks_per_second
    }

    /// `boot_epoch + jiffies / ticks_per_second`, truncating to whole seconds.
    pub fn jiffies_to_epoch(&self, jiffies: i64) -> i64 {
        self.boot_epoch.saturating_add(jiffies / self.ticks_per_second)
    }

    /// Same as [`jiffies_to_epoch`](Self::jiffies_to_epoch) as a UTC timestamp.
    /// Returns `None` when the result does not fit chrono's range.
    pub fn jiffies_to_time(&self, jiffies: i64) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.jiffies_to_epoch(jiffies), 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const BOOT: i64 = 1388417200;

    #[test]
    fn test_jiffies_conversion_is_bounded_below_by_boot() {
        let clock = ClockContext::new(BOOT, 100).unwrap();
        let epoch = clock.jiffies_to_epoch(17350497);
        assert!(epoch >= BOOT);
        assert_eq!(epoch, BOOT + 173504);

        let ts = clock.jiffies_to_time(17350497).unwrap();
        assert_eq!(ts.timestamp(), BOOT + 173504);
    }

    #[test]
    fn test_jiffies_truncate_to_whole_seconds() {
        let clock = ClockContext::new(BOOT, 100).unwrap();
        assert_eq!(clock.jiffies_to_epoch(0), BOOT);
        assert_eq!(clock.jiffies_to_epoch(99), BOOT);
        assert_eq!(clock.jiffies_to_epoch(100), BOOT + 1);
        assert_eq!(clock.jiffies_to_epoch(250), BOOT + 2);
    }

    #[test]
    fn test_rejects_non_positive_tick_rate() {
        assert!(matches!(
            ClockContext::new(BOOT, 0),
            Err(ProcError::InvalidTickRate(0))
        ));
        assert!(matches!(
            ClockContext::new(BOOT, -5),
            Err(ProcError::InvalidTickRate(-5))
        ));
    }

    #[test]
    fn test_from_proc_root_reads_btime() {
        let dir = tempdir().expect("Failed to create temp dir");
        fs::write(
            dir.path().join("stat"),
            "cpu  1 2 3 4 5 6 7 0 0 0\nintr 12345\nctxt 999\nbtime 1388417200\nprocesses 42\n",
        )
        .expect("Failed to write stat file");

        let clock = ClockContext::from_proc_root(dir.path()).unwrap();
        assert_eq!(clock.boot_epoch(), BOOT);
        assert!(clock.ticks_per_second() > 0);
    }

    #[test]
    fn test_from_proc_root_without_btime_fails() {
        let dir = tempdir().expect("Failed to create temp dir");
        fs::write(dir.path().join("stat"), "cpu  1 2 3 4\nctxt 999\n")
            .expect("Failed to write stat file");

        let result = ClockContext::from_proc_root(dir.path());
        assert!(matches!(result, Err(ProcError::MissingBootTime { .. })));
    }

    #[test]
    fn test_clock_ticks_per_second_positive() {
        assert!(clock_ticks_per_second() > 0);
    }
}
