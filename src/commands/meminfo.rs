//! Meminfo command implementation.

use procsnap::read_meminfo;

use crate::cli::OutputFormat;
use crate::commands::print_structured;
use crate::config::Config;

/// Prints system memory information.
pub fn command_meminfo(format: OutputFormat, config: &Config) -> anyhow::Result<()> {
    let info = read_meminfo(&config.proc_root())?;

    if format != OutputFormat::Text {
        return print_structured(&info, format);
    }

    let used = info.mem_total - info.mem_free - info.buffers - info.cached;
    println!("💾 Memory (kB)");
    println!("   total:      {:>12}", info.mem_total);
    println!("   used:       {:>12}", used);
    println!("   free:       {:>12}", info.mem_free);
    println!("   buffers:    {:>12}", info.buffers);
    println!("   cached:     {:>12}", info.cached);
    println!("   dirty:      {:>12}", info.dirty);
    println!("🔁 Swap (kB)");
    println!("   total:      {:>12}", info.swap_total);
    println!("   free:       {:>12}", info.swap_free);
    println!("   cached:     {:>12}", info.swap_cached);
    Ok(())
}
