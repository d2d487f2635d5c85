//! CLI command implementations for procsnap.
//!
//! This module provides implementations for all CLI subcommands:
//! - `ps`: Process listing
//! - `show`: Full record of one process
//! - `limits`: Resource limits of one process
//! - `meminfo`: System memory information
//! - `check`: Proc filesystem validation
//! - `config`: Configuration file generation

pub mod check;
pub mod config;
pub mod limits;
pub mod meminfo;
pub mod ps;
pub mod show;

// Re-export command functions
pub use check::command_check;
pub use config::command_config;
pub use limits::command_limits;
pub use meminfo::command_meminfo;
pub use ps::command_ps;
pub use show::command_show;

use anyhow::Context;
use procsnap::ClockContext;
use serde::Serialize;

use crate::cli::OutputFormat;
use crate::config::Config;

/// Clock for the configured proc root. The default root shares the
/// process-wide clock.
pub(crate) fn clock_for(config: &Config) -> anyhow::Result<ClockContext> {
    let root = config.proc_root();
    let clock = if root.as_os_str() == procsnap::DEFAULT_PROC_ROOT {
        *ClockContext::system()?
    } else {
        ClockContext::from_proc_root(&root)?
    };
    Ok(clock)
}

/// Prints `value` as JSON or YAML. Text output is handled by each command.
pub(crate) fn print_structured<T: Serialize>(value: &T, format: OutputFormat) -> anyhow::Result<()> {
    let out = match format {
        OutputFormat::Json => {
            serde_json::to_string_pretty(value).context("Failed to serialize JSON")?
        }
        OutputFormat::Yaml | OutputFormat::Text => {
            serde_yaml::to_string(value).context("Failed to serialize YAML")?
        }
    };
    println!("{}", out.trim_end());
    Ok(())
}
