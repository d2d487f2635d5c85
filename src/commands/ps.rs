//! Ps command implementation.
//!
//! Scans every process and prints one row per pid.

use ahash::AHashMap as HashMap;
use nix::unistd::{Uid, User};
use procsnap::{ProcessRecord, ProcessTable};
use serde::Serialize;
use tracing::{debug, warn};

use crate::cli::OutputFormat;
use crate::commands::{clock_for, print_structured};
use crate::config::Config;

#[derive(Debug, Serialize)]
struct PsRow {
    pid: u32,
    ppid: Option<i32>,
    state: Option<String>,
    uid: Option<u32>,
    user: Option<String>,
    start: Option<String>,
    name: String,
    cmdline: Vec<String>,
}

/// Resolves uids to user names, remembering each lookup.
#[derive(Default)]
struct UserCache(HashMap<u32, Option<String>>);

impl UserCache {
    fn name(&mut self, uid: u32) -> Option<String> {
        self.0
            .entry(uid)
            .or_insert_with(|| match User::from_uid(Uid::from_raw(uid)) {
                Ok(user) => user.map(|u| u.name),
                Err(e) => {
                    debug!("User lookup for uid {} failed: {}", uid, e);
                    None
                }
            })
            .clone()
    }
}

fn row(record: &ProcessRecord, users: &mut UserCache) -> PsRow {
    let stat = record.stat().ok();
    let uid = record.status().ok().map(|s| s.uid);

    PsRow {
        pid: record.pid,
        ppid: stat.map(|s| s.ppid),
        state: stat.map(|s| s.state.clone()),
        uid,
        user: uid.and_then(|u| users.name(u)),
        start: stat.map(|s| s.starttime.format("%Y-%m-%d %H:%M:%S").to_string()),
        name: record.name().unwrap_or_default(),
        cmdline: record.cmdline.clone(),
    }
}

/// Lists processes.
pub fn command_ps(format: OutputFormat, long: bool, config: &Config) -> anyhow::Result<()> {
    let clock = clock_for(config)?;
    let table = ProcessTable::scan(&config.proc_root(), &clock, &config.scan_options())?;

    if !table.failures().is_empty() {
        warn!(
            "{} processes could not be read (they may have exited)",
            table.failures().len()
        );
    }

    let mut users = UserCache::default();
    let rows: Vec<PsRow> = table
        .sorted()
        .into_iter()
        .map(|record| row(record, &mut users))
        .collect();

    if format != OutputFormat::Text {
        return print_structured(&rows, format);
    }

    println!(
        "{:>8} {:>8} {:<5} {:<12} {:<19} COMMAND",
        "PID", "PPID", "STATE", "USER", "STARTED"
    );
    for r in &rows {
        let user = r
            .user
            .clone()
            .or_else(|| r.uid.map(|u| u.to_string()))
            .unwrap_or_else(|| "?".into());
        let command = if long && !r.cmdline.is_empty() {
            r.cmdline.join(" ")
        } else {
            r.name.clone()
        };
        println!(
            "{:>8} {:>8} {:<5} {:<12} {:<19} {}",
            r.pid,
            r.ppid.map_or_else(|| "?".to_string(), |p| p.to_string()),
            r.state.as_deref().unwrap_or("?"),
            user,
            r.start.as_deref().unwrap_or("?"),
            command
        );
    }
    println!("\n{} processes", rows.len());

    Ok(())
}
