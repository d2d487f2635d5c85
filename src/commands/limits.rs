//! Limits command implementation.

use procsnap::process::read_limits;
use procsnap::Limit;

use crate::cli::OutputFormat;
use crate::commands::print_structured;
use crate::config::Config;

fn value(v: i64) -> String {
    if v == procsnap::process::UNLIMITED {
        "unlimited".into()
    } else {
        v.to_string()
    }
}

/// Prints the resource limits of one process.
pub fn command_limits(pid: u32, format: OutputFormat, config: &Config) -> anyhow::Result<()> {
    let limits = read_limits(&config.proc_root().join(pid.to_string()))?;

    if format != OutputFormat::Text {
        return print_structured(&limits, format);
    }

    println!("{:<20} {:>20} {:>20} UNIT", "LIMIT", "SOFT", "HARD");
    for (name, limit) in limits.entries() {
        if let Some(Limit {
            soft_value,
            hard_value,
            unit,
        }) = limit
        {
            println!(
                "{:<20} {:>20} {:>20} {:?}",
                name,
                value(*soft_value),
                value(*hard_value),
                unit
            );
        }
    }
    Ok(())
}
