//! Check command implementation.
//!
//! Validates that the configured proc root can be read and decoded.

use procsnap::clock::clock_ticks_per_second;
use procsnap::process::{collect_proc_entries, ProcessRecord};
use procsnap::system::read_boot_time;
use procsnap::{read_meminfo, ClockContext, ProcessTable};

use crate::config::{validate_effective_config, Config};

/// Validates the proc filesystem and configuration.
pub fn command_check(processes: bool, config: &Config) -> anyhow::Result<()> {
    println!("🔍 procsnap - System Check");
    println!("==========================");

    let root = config.proc_root();
    let mut all_ok = true;

    // Check configuration
    println!("\n⚙️  Checking configuration...");
    match validate_effective_config(config) {
        Ok(_) => println!("   ✅ Configuration is valid"),
        Err(e) => {
            println!("   ❌ Configuration invalid: {}", e);
            all_ok = false;
        }
    }

    println!("\n📁 Checking {}...", root.display());
    match collect_proc_entries(&root, None) {
        Ok(entries) if entries.is_empty() => {
            println!("   ❌ No process entries found");
            all_ok = false;
        }
        Ok(entries) => println!("   ✅ Can list {} process entries", entries.len()),
        Err(e) => {
            println!("   ❌ Cannot list process entries: {}", e);
            all_ok = false;
        }
    }

    println!("\n⏱️  Checking clock...");
    let ticks = clock_ticks_per_second();
    println!("   ✅ Clock ticks per second: {}", ticks);
    let clock = match read_boot_time(&root) {
        Ok(btime) => {
            let boot = chrono::DateTime::from_timestamp(btime, 0)
                .map(|t| t.to_rfc3339())
                .unwrap_or_else(|| btime.to_string());
            println!("   ✅ Boot time: {}", boot);
            ClockContext::new(btime, ticks).ok()
        }
        Err(e) => {
            println!("   ❌ Boot time unavailable: {}", e);
            all_ok = false;
            None
        }
    };

    println!("\n💾 Checking meminfo...");
    match read_meminfo(&root) {
        Ok(info) => println!("   ✅ MemTotal: {} kB", info.mem_total),
        Err(e) => {
            println!("   ❌ meminfo failed: {}", e);
            all_ok = false;
        }
    }

    if let Some(clock) = clock {
        println!("\n🧪 Checking own process record...");
        let pid = std::process::id();
        match ProcessRecord::new(pid, &root, clock, false) {
            Ok(record) => match (record.stat(), record.limits()) {
                (Ok(stat), Ok(_)) => {
                    println!("   ✅ pid {} ({}) decoded", pid, stat.comm);
                }
                (Err(e), _) | (_, Err(e)) => {
                    println!("   ❌ pid {} could not be decoded: {}", pid, e);
                    all_ok = false;
                }
            },
            Err(e) => {
                // Expected when pointing at a proc root of another host.
                println!("   ⚠️  pid {} not readable under {}: {}", pid, root.display(), e);
            }
        }

        if processes {
            println!("\n📊 Loading all processes...");
            match ProcessTable::scan(&root, &clock, &config.scan_options()) {
                Ok(table) => {
                    println!("   ✅ {} processes loaded", table.len());
                    if !table.failures().is_empty() {
                        println!("   ⚠️  {} processes failed:", table.failures().len());
                        for failure in table.failures().iter().take(10) {
                            println!("      pid {}: {}", failure.pid, failure.error);
                        }
                    }
                }
                Err(e) => {
                    println!("   ❌ Scan failed: {}", e);
                    all_ok = false;
                }
            }
        }
    }

    println!("\n📋 Summary:");
    if all_ok {
        println!("   ✅ All checks passed");
        Ok(())
    } else {
        println!("   ❌ Some checks failed - please review the output above");
        std::process::exit(1);
    }
}
