//! Show command implementation.
//!
//! Loads a single process with every sub-record and prints it.

use anyhow::bail;
use procsnap::ProcessRecord;
use std::path::PathBuf;

use crate::cli::OutputFormat;
use crate::commands::{clock_for, print_structured};
use crate::config::Config;

/// Prints the full record of one process, addressed by pid or pid file.
pub fn command_show(
    pid: Option<u32>,
    pid_file: Option<PathBuf>,
    format: OutputFormat,
    config: &Config,
) -> anyhow::Result<()> {
    let clock = clock_for(config)?;
    let root = config.proc_root();

    let record = match (pid, pid_file) {
        (Some(pid), _) => ProcessRecord::new(pid, &root, clock, true)?,
        (None, Some(path)) => ProcessRecord::from_pid_file(&path, &root, clock, true)?,
        (None, None) => bail!("either a pid or --pid-file is required"),
    };

    // Text has no sensible flat rendering for nested records.
    let format = match format {
        OutputFormat::Text => OutputFormat::Yaml,
        other => other,
    };
    print_structured(&record.details(), format)
}
