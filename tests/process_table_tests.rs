//! Integration tests for process enumeration.
//!
//! These tests build a fake proc tree in a temp directory and verify that
//! the table holds exactly the processes that could be loaded.

use procsnap::process::NameFilter;
use procsnap::{CancelToken, ClockContext, ProcError, ProcessRecord, ProcessTable, ScanOptions};
use std::fs;
use std::os::unix::fs::symlink;
use std::path::Path;
use tempfile::{tempdir, TempDir};

const BOOT: i64 = 1388417200;

fn clock() -> ClockContext {
    ClockContext::new(BOOT, 100).expect("valid clock")
}

fn add_process(root: &Path, pid: u32, comm: &str, starttime: u64) {
    let dir = root.join(pid.to_string());
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("cmdline"), format!("/usr/bin/{comm}\0--flag\0")).unwrap();
    fs::write(dir.join("comm"), format!("{comm}\n")).unwrap();
    fs::write(dir.join("environ"), b"HOME=/root\0").unwrap();
    symlink(format!("/usr/bin/{comm}"), dir.join("exe")).unwrap();
    symlink("/", dir.join("cwd")).unwrap();
    symlink("/", dir.join("root")).unwrap();
    fs::write(
        dir.join("stat"),
        format!(
            "{pid} ({comm}) S 1 {pid} {pid} 0 -1 4202752 100 0 0 0 7 3 0 0 20 0 1 0 {starttime} 1000 50 18446744073709551615\n"
        ),
    )
    .unwrap();
    fs::write(dir.join("status"), "Uid:\t1000\t1000\t1000\t1000\nGid:\t100\t100\t100\t100\n")
        .unwrap();
    fs::write(dir.join("statm"), "250 50 20 10 0 30 0\n").unwrap();
    fs::write(dir.join("loginuid"), "1000\n").unwrap();
    fs::write(dir.join("sessionid"), "3\n").unwrap();
}

fn fake_proc() -> TempDir {
    let tmp = tempdir().expect("Failed to create temp dir");
    let root = tmp.path();
    fs::write(
        root.join("stat"),
        format!("cpu  1 2 3 4\nbtime {BOOT}\nprocesses 100\n"),
    )
    .unwrap();
    fs::write(root.join("meminfo"), "MemTotal:       2048 kB\nMemFree:        1024 kB\n").unwrap();
    fs::create_dir(root.join("sys")).unwrap();
    fs::create_dir(root.join("self")).unwrap();

    add_process(root, 1, "init", 1);
    add_process(root, 412, "sshd", 1500);
    add_process(root, 1093, "dhclient3", 1871);
    add_process(root, 2001, "bash", 90000);
    tmp
}

// -------------------------------------------------------------------------
// Enumeration
// -------------------------------------------------------------------------

#[test]
fn test_scan_loads_every_pid_directory() {
    let tmp = fake_proc();
    let table = ProcessTable::scan(tmp.path(), &clock(), &ScanOptions::default()).unwrap();

    assert_eq!(table.pids(), vec![1, 412, 1093, 2001]);
    assert!(table.failures().is_empty());
    for (pid, record) in table.iter() {
        assert_eq!(*pid, record.pid);
    }
}

#[test]
fn test_scan_records_decode() {
    let tmp = fake_proc();
    let table = ProcessTable::scan(tmp.path(), &clock(), &ScanOptions::default()).unwrap();

    let rec = table.get(1093).expect("dhclient3 present");
    assert_eq!(rec.exe, "/usr/bin/dhclient3");
    assert_eq!(rec.cmdline, vec!["/usr/bin/dhclient3", "--flag"]);
    assert_eq!(rec.environ.get("HOME").map(String::as_str), Some("/root"));

    let stat = rec.stat().unwrap();
    assert_eq!(stat.comm, "dhclient3");
    assert_eq!(stat.ppid, 1);
    assert_eq!(stat.starttime.timestamp(), BOOT + 18);
    assert_eq!(rec.status().unwrap().uid, 1000);
    assert_eq!(rec.statm().unwrap().resident, 50);
    assert_eq!(rec.login_uid(), 1000);
    assert_eq!(rec.session_id(), 3);
}

#[test]
fn test_clock_from_fake_root() {
    let tmp = fake_proc();
    let clock = ClockContext::from_proc_root(tmp.path()).unwrap();
    assert_eq!(clock.boot_epoch(), BOOT);
}

#[test]
fn test_unreadable_process_is_omitted_not_fatal() {
    let tmp = fake_proc();
    // A pid directory whose cwd link is gone, as after the process exits.
    fs::remove_file(tmp.path().join("412").join("cwd")).unwrap();
    // A pid directory that is empty.
    fs::create_dir(tmp.path().join("3000")).unwrap();

    let table = ProcessTable::scan(tmp.path(), &clock(), &ScanOptions::default()).unwrap();

    assert_eq!(table.pids(), vec![1, 1093, 2001]);
    assert!(!table.contains(412));
    let mut failed: Vec<u32> = table.failures().iter().map(|f| f.pid).collect();
    failed.sort_unstable();
    assert_eq!(failed, vec![412, 3000]);
}

#[test]
fn test_non_utf8_comm_still_decodes() {
    let tmp = fake_proc();
    let dir = tmp.path().join("1093");
    fs::write(
        dir.join("stat"),
        b"1093 (w\xffk) S 1 1093 1093 0 -1 4202752 100 0 0 0 7 3 0 0 20 0 1 0 1871 1000 50\n",
    )
    .unwrap();
    fs::write(
        dir.join("status"),
        b"Name:\tw\xffk\nUid:\t1000\t1000\t1000\t1000\nGid:\t100\t100\t100\t100\n",
    )
    .unwrap();

    let table = ProcessTable::scan(tmp.path(), &clock(), &ScanOptions::default()).unwrap();
    let rec = table.get(1093).expect("renamed process present");
    let stat = rec.stat().unwrap();
    assert_eq!(stat.comm, "w\u{FFFD}k");
    assert_eq!(stat.ppid, 1);
    assert_eq!(stat.starttime.timestamp(), BOOT + 18);
    assert_eq!(rec.status().unwrap().uid, 1000);
}

#[test]
fn test_lazy_stat_error_does_not_affect_scan() {
    let tmp = fake_proc();
    fs::write(tmp.path().join("2001").join("stat"), "2001 (bash) S x\n").unwrap();

    let table = ProcessTable::scan(tmp.path(), &clock(), &ScanOptions::default()).unwrap();
    let rec = table.get(2001).expect("bash present");
    assert!(matches!(rec.stat(), Err(ProcError::Decode { .. })));
}

#[test]
fn test_missing_root_is_an_error() {
    let tmp = tempdir().expect("Failed to create temp dir");
    let err = ProcessTable::scan(&tmp.path().join("missing"), &clock(), &ScanOptions::default())
        .unwrap_err();
    assert!(err.is_not_found());
}

// -------------------------------------------------------------------------
// Options
// -------------------------------------------------------------------------

#[test]
fn test_max_processes_bounds_table() {
    let tmp = fake_proc();
    let options = ScanOptions {
        max_processes: Some(2),
        ..Default::default()
    };
    let table = ProcessTable::scan(tmp.path(), &clock(), &options).unwrap();
    assert!(table.len() <= 2);
}

#[test]
fn test_name_filter() {
    let tmp = fake_proc();
    let options = ScanOptions {
        filter: NameFilter {
            include_names: Some(vec!["sh".into()]),
            exclude_names: Some(vec!["ssh".into()]),
        },
        ..Default::default()
    };
    let table = ProcessTable::scan(tmp.path(), &clock(), &options).unwrap();
    assert_eq!(table.pids(), vec![2001]);
}

#[test]
fn test_dedicated_pool_and_eager() {
    let tmp = fake_proc();
    let options = ScanOptions {
        eager: true,
        parallelism: Some(2),
        ..Default::default()
    };
    let table = ProcessTable::scan(tmp.path(), &clock(), &options).unwrap();
    assert_eq!(table.len(), 4);

    // Eagerly loaded data survives the files disappearing.
    fs::remove_file(tmp.path().join("1").join("stat")).unwrap();
    assert_eq!(table.get(1).unwrap().stat().unwrap().comm, "init");
}

#[test]
fn test_cancelled_scan() {
    let tmp = fake_proc();
    let token = CancelToken::new();
    token.cancel();
    let options = ScanOptions {
        cancel: Some(token),
        ..Default::default()
    };
    assert!(matches!(
        ProcessTable::scan(tmp.path(), &clock(), &options),
        Err(ProcError::Cancelled)
    ));
}

#[test]
fn test_single_record_matches_table_entry() {
    let tmp = fake_proc();
    let table = ProcessTable::scan(tmp.path(), &clock(), &ScanOptions::default()).unwrap();
    let single = ProcessRecord::new(412, tmp.path(), clock(), false).unwrap();
    let from_table = table.get(412).unwrap();

    assert_eq!(single.cmdline, from_table.cmdline);
    assert_eq!(single.stat().unwrap(), from_table.stat().unwrap());
    assert_eq!(single.details().limits, None);
}
