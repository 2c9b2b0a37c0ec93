#![allow(missing_docs)]
#![allow(clippy::missing_docs_in_private_items)]

mod common;

use std::collections::BTreeSet;
use std::process::{Command, abort};

use common::{computed, init_test_logger, mixed_records, sorted};
use gedprune_store::{ResultStore, StoreConfig, part_path, read_table};
use rstest::rstest;
use tempfile::tempdir;

#[rstest]
#[case(0, 1)]
#[case(1000, 1)]
#[case(1001, 2)]
#[case(2500, 3)]
fn rotates_into_parts(#[case] records: u64, #[case] parts: usize) {
    init_test_logger();
    let dir = tempdir().unwrap();
    let out = dir.path().join("results.csv");
    let mut store = ResultStore::open(
        StoreConfig::new(&out)
            .with_row_ceiling(1000)
            .with_flush_every(usize::MAX),
    )
    .unwrap();
    let all = mixed_records(records);
    for r in all.clone() {
        assert!(store.record(r).unwrap());
    }
    store.flush().unwrap();

    assert_eq!(store.parts(), parts);
    assert!(out.is_file());
    for k in 2..=parts {
        assert!(dir.path().join(format!("results_part{k}.csv")).is_file());
    }
    assert!(!dir.path().join(format!("results_part{}.csv", parts + 1)).exists());
    assert_eq!(sorted(read_table(&out).unwrap()), sorted(all));
}

#[test]
fn twice_the_ceiling_makes_two_full_parts() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("split.csv");
    let mut store = ResultStore::open(
        StoreConfig::new(&out)
            .with_row_ceiling(1000)
            .with_flush_every(usize::MAX),
    )
    .unwrap();
    for id in 1..=2000 {
        assert!(store.record(computed(id)).unwrap());
    }
    store.flush().unwrap();

    assert_eq!(store.parts(), 2);
    assert!(!part_path(&out, 3).exists());
    for part in 1..=2 {
        let text = std::fs::read_to_string(part_path(&out, part)).unwrap();
        // header plus rows
        assert_eq!(text.lines().count(), 1001, "part {part}");
    }

    let back = read_table(&out).unwrap();
    assert_eq!(back.len(), 2000);
    let keys: BTreeSet<_> = back.iter().map(|r| r.key).collect();
    let expected: BTreeSet<_> = (1..=2000).map(|id| computed(id).key).collect();
    assert_eq!(keys, expected);
}

#[test]
#[ignore = "writes two million rows"]
fn two_million_records_make_two_parts() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("big.csv");
    let mut store = ResultStore::open(StoreConfig::new(&out).with_flush_every(usize::MAX)).unwrap();
    for id in 1..=2_000_000 {
        store.record(computed(id)).unwrap();
    }
    store.flush().unwrap();

    assert_eq!(store.parts(), 2);
    assert!(dir.path().join("big_part2.csv").is_file());
    assert!(!dir.path().join("big_part3.csv").exists());
    let back = read_table(&out).unwrap();
    assert_eq!(back.len(), 2_000_000);
    let mut keys: Vec<_> = back.iter().map(|r| r.key).collect();
    keys.sort();
    keys.dedup();
    assert_eq!(keys.len(), 2_000_000);
}

#[test]
fn smaller_table_removes_stale_parts() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("results.csv");
    let config = StoreConfig::new(&out)
        .with_row_ceiling(10)
        .with_flush_every(usize::MAX);

    let mut big = ResultStore::open(config.clone()).unwrap();
    for r in mixed_records(35) {
        big.record(r).unwrap();
    }
    big.flush().unwrap();
    assert!(dir.path().join("results_part4.csv").is_file());
    drop(big);

    let mut small = ResultStore::open(config).unwrap();
    for r in mixed_records(5) {
        small.record(r).unwrap();
    }
    small.flush().unwrap();
    for k in 2..=4 {
        assert!(!dir.path().join(format!("results_part{k}.csv")).exists());
    }
    assert_eq!(read_table(&out).unwrap().len(), 5);
}

#[test]
fn flushes_on_cadence() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("results.csv");
    let mut store = ResultStore::open(StoreConfig::new(&out).with_flush_every(3)).unwrap();
    let records = mixed_records(4);

    store.record(records[0].clone()).unwrap();
    store.record(records[1].clone()).unwrap();
    assert!(read_table(&out).unwrap().is_empty());
    assert_eq!(store.pending(), 2);

    store.record(records[2].clone()).unwrap();
    assert_eq!(read_table(&out).unwrap().len(), 3);
    assert_eq!(store.pending(), 0);

    store.record(records[3].clone()).unwrap();
    store.flush().unwrap();
    assert_eq!(sorted(read_table(&out).unwrap()), sorted(records));
}

#[test]
fn resume_reloads_every_part() {
    init_test_logger();
    let dir = tempdir().unwrap();
    let out = dir.path().join("results.csv");
    let config = StoreConfig::new(&out).with_row_ceiling(4);

    let mut first = ResultStore::open(config.clone()).unwrap();
    for r in mixed_records(9) {
        first.record(r).unwrap();
    }
    drop(first);

    let mut resumed = ResultStore::open(config.clone().with_resume(true)).unwrap();
    assert_eq!(resumed.len(), 9);
    let again = mixed_records(1).remove(0);
    assert!(resumed.contains(&again.key));
    assert!(!resumed.record(again).unwrap());

    let fresh = ResultStore::open(config).unwrap();
    assert!(fresh.is_empty());
}

#[rstest]
#[case(false)]
#[case(true)]
fn corrupted_table_is_deleted(#[case] resume: bool) {
    init_test_logger();
    let dir = tempdir().unwrap();
    let out = dir.path().join("results.csv");
    std::fs::write(&out, b"graph_id_1,graph_id_2,status\n1,2,comp").unwrap();

    let mut store = ResultStore::open(StoreConfig::new(&out).with_resume(resume)).unwrap();
    assert!(!out.exists());
    assert!(store.is_empty());

    store.record(computed(3)).unwrap();
    assert_eq!(read_table(&out).unwrap(), vec![computed(3)]);
}

#[test]
fn garbage_rows_count_as_corruption() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("results.csv");
    let mut store = ResultStore::open(StoreConfig::new(&out)).unwrap();
    store.record(computed(1)).unwrap();
    drop(store);

    let mut text = std::fs::read_to_string(&out).unwrap();
    text.push_str("1,9,computed,not-a-number,,,,,,,,,\n");
    std::fs::write(&out, text).unwrap();
    assert!(read_table(&out).is_err());

    let store = ResultStore::open(StoreConfig::new(&out).with_resume(true)).unwrap();
    assert!(store.is_empty());
    assert!(!out.exists());
}

#[test]
fn falls_back_to_json_lines() {
    init_test_logger();
    let dir = tempdir().unwrap();
    let out = dir.path().join("results.csv");
    std::fs::create_dir(&out).unwrap();

    let mut store = ResultStore::open(StoreConfig::new(&out)).unwrap();
    for r in mixed_records(6) {
        store.record(r).unwrap();
    }
    let jsonl = dir.path().join("results.jsonl");
    assert!(jsonl.is_file());
    assert_eq!(sorted(read_table(&out).unwrap()), sorted(mixed_records(6)));

    drop(store);
    let resumed = ResultStore::open(StoreConfig::new(&out).with_resume(true)).unwrap();
    assert_eq!(resumed.len(), 6);
}

#[test]
fn abort_after_flush_keeps_flushed_records() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("crash.csv");

    let status = Command::new(std::env::current_exe().unwrap())
        .env("GEDPRUNE_CRASH_TABLE", &out)
        .arg("--nocapture")
        .arg("--ignored")
        .arg("--exact")
        .arg("crash_child_abort_after_flush")
        .status()
        .expect("spawn child");
    assert!(!status.success(), "child should abort");

    let records = read_table(&out).unwrap();
    assert_eq!(sorted(records), (1..=5).map(computed).collect::<Vec<_>>());

    let resumed = ResultStore::open(StoreConfig::new(&out).with_resume(true)).unwrap();
    assert_eq!(resumed.len(), 5);
}

#[test]
#[ignore = "child half of abort_after_flush_keeps_flushed_records"]
fn crash_child_abort_after_flush() {
    let path = std::env::var("GEDPRUNE_CRASH_TABLE").expect("missing GEDPRUNE_CRASH_TABLE");
    let mut store = ResultStore::open(StoreConfig::new(path).with_flush_every(5)).unwrap();
    for id in 1..=8 {
        store.record(computed(id)).unwrap();
    }
    assert_eq!(store.pending(), 3);
    abort();
}
