//! End-to-end engine behaviour on a real data directory.

use quiverdb_core::{Config, CoreError, Engine};
use std::sync::Arc;
use tempfile::{tempdir, TempDir};

fn open_engine(dir: &TempDir) -> Engine {
    let config = Config::new()
        .data_dir(dir.path())
        .vacuum_interval(None)
        .sync_on_commit(false);
    Engine::open(&config).unwrap()
}

fn values(items: &[&[u8]]) -> Vec<Vec<u8>> {
    items.iter().map(|v| v.to_vec()).collect()
}

#[test]
fn empty_database_reads() {
    let dir = tempdir().unwrap();
    let engine = open_engine(&dir);

    let err = engine.tx(|tx| tx.get("k")).unwrap_err();
    assert!(matches!(err, CoreError::NoSuchKey { .. }));

    let version = engine.tx(|tx| Ok(tx.version())).unwrap();
    assert_eq!(version, 0);

    let list = engine.tx(|tx| tx.list("", 0, 100, 0)).unwrap();
    assert!(list.nodes.is_empty());
    assert_eq!(list.version, 0);
    assert_eq!(list.total_count, 0);
}

#[test]
fn set_get_version_progression() {
    let dir = tempdir().unwrap();
    let engine = open_engine(&dir);

    let node = engine.tx(|tx| tx.set("k", &values(&[b"v"]))).unwrap();
    assert_eq!(node.version, 1);
    assert_eq!(node.values, values(&[b"v"]));

    assert_eq!(engine.tx(|tx| Ok(tx.version())).unwrap(), 1);

    let fetched = engine.tx(|tx| tx.get("k")).unwrap();
    assert_eq!(fetched, node);
}

#[test]
fn removing_last_value_collapses_to_key_removal() {
    let dir = tempdir().unwrap();
    let engine = open_engine(&dir);

    // Fresh key: three adds (ids 1..3), commit marker takes id 4.
    let node = engine
        .tx(|tx| tx.set("k", &values(&[b"v1", b"v1", b"v2"])))
        .unwrap();
    assert_eq!(node.version, 3);
    assert_eq!(engine.tx(|tx| Ok(tx.version())).unwrap(), 3);

    // One occurrence of v1 goes (record 5, commit 6).
    let node = engine.tx(|tx| tx.remove_value("k", b"v1")).unwrap();
    assert_eq!(node.version, 5);
    assert_eq!(node.values, values(&[b"v1", b"v2"]));

    // The second occurrence (record 7, commit 8).
    let node = engine.tx(|tx| tx.remove_value("k", b"v1")).unwrap();
    assert_eq!(node.version, 7);
    assert_eq!(node.values, values(&[b"v2"]));

    // v1 is gone: the failed transaction leaves no trace.
    let err = engine.tx(|tx| tx.remove_value("k", b"v1")).unwrap_err();
    assert!(matches!(err, CoreError::NoSuchValue { .. }));
    assert_eq!(engine.tx(|tx| Ok(tx.version())).unwrap(), 7);

    // Removing the only remaining value removes the key itself.
    let node = engine.tx(|tx| tx.remove_value("k", b"v2")).unwrap();
    assert_eq!(node.version, 9);
    assert!(node.values.is_empty());

    let err = engine.tx(|tx| tx.get("k")).unwrap_err();
    assert!(matches!(err, CoreError::NoSuchKey { .. }));
}

#[test]
fn unique_add_detects_duplicates() {
    let dir = tempdir().unwrap();
    let engine = open_engine(&dir);

    let node = engine
        .tx(|tx| tx.add_unique_value("k", b"v1".to_vec()))
        .unwrap();
    assert_eq!(node.version, 1);

    let err = engine
        .tx(|tx| tx.add_unique_value("k", b"v1".to_vec()))
        .unwrap_err();
    assert!(matches!(err, CoreError::DuplicateValue { .. }));
    assert_eq!(engine.tx(|tx| Ok(tx.version())).unwrap(), 1);

    let node = engine
        .tx(|tx| tx.add_unique_value("k", b"v2".to_vec()))
        .unwrap();
    assert_eq!(node.version, 3);
    assert_eq!(node.values, values(&[b"v1", b"v2"]));
}

#[test]
fn state_survives_reopen() {
    let dir = tempdir().unwrap();

    let version = {
        let engine = open_engine(&dir);
        engine.tx(|tx| tx.set("k", &values(&[b"v"]))).unwrap();
        let version = engine.tx(|tx| Ok(tx.version())).unwrap();
        engine.close().unwrap();
        version
    };

    let engine = open_engine(&dir);
    assert_eq!(engine.tx(|tx| Ok(tx.version())).unwrap(), version);
    let node = engine.tx(|tx| tx.get("k")).unwrap();
    assert_eq!(node.values, values(&[b"v"]));
}

#[test]
fn set_with_empty_values() {
    let dir = tempdir().unwrap();
    let engine = open_engine(&dir);

    // Absent key: a no-op returning an empty node at the current version.
    let node = engine.tx(|tx| tx.set("ghost", &[])).unwrap();
    assert!(node.values.is_empty());
    assert_eq!(node.version, 0);
    assert!(matches!(
        engine.tx(|tx| tx.get("ghost")),
        Err(CoreError::NoSuchKey { .. })
    ));

    // Existing key: dropped entirely.
    engine.tx(|tx| tx.set("k", &values(&[b"a", b"b"]))).unwrap();
    engine.tx(|tx| tx.set("k", &[])).unwrap();
    assert!(matches!(
        engine.tx(|tx| tx.get("k")),
        Err(CoreError::NoSuchKey { .. })
    ));
}

#[test]
fn set_replaces_existing_values() {
    let dir = tempdir().unwrap();
    let engine = open_engine(&dir);

    engine
        .tx(|tx| tx.set("k", &values(&[b"old-1", b"old-2"])))
        .unwrap();
    let node = engine.tx(|tx| tx.set("k", &values(&[b"new"]))).unwrap();

    assert_eq!(node.values, values(&[b"new"]));
    let fetched = engine.tx(|tx| tx.get("k")).unwrap();
    assert_eq!(fetched.values, values(&[b"new"]));
}

#[test]
fn remove_all_values_and_key_collapse() {
    let dir = tempdir().unwrap();
    let engine = open_engine(&dir);

    engine
        .tx(|tx| tx.set("k", &values(&[b"x", b"y", b"x", b"x"])))
        .unwrap();

    let node = engine.tx(|tx| tx.remove_all_values("k", b"x")).unwrap();
    assert_eq!(node.values, values(&[b"y"]));

    // Removing every remaining occurrence drops the key.
    engine.tx(|tx| tx.remove_all_values("k", b"y")).unwrap();
    assert!(matches!(
        engine.tx(|tx| tx.get("k")),
        Err(CoreError::NoSuchKey { .. })
    ));

    assert!(matches!(
        engine.tx(|tx| tx.remove_all_values("missing", b"x")),
        Err(CoreError::NoSuchKey { .. })
    ));
}

#[test]
fn remove_key_requires_existence() {
    let dir = tempdir().unwrap();
    let engine = open_engine(&dir);

    assert!(matches!(
        engine.tx(|tx| tx.remove_key("k")),
        Err(CoreError::NoSuchKey { .. })
    ));

    engine.tx(|tx| tx.set("k", &values(&[b"v"]))).unwrap();
    engine.tx(|tx| tx.remove_key("k")).unwrap();
    assert!(matches!(
        engine.tx(|tx| tx.get("k")),
        Err(CoreError::NoSuchKey { .. })
    ));
}

#[test]
fn list_filters_sorts_and_paginates() {
    let dir = tempdir().unwrap();
    let engine = open_engine(&dir);

    engine
        .tx(|tx| {
            tx.set("fruit/banana", &values(&[b"1"]))?;
            tx.set("fruit/apple", &values(&[b"2"]))?;
            tx.set("veg/carrot", &values(&[b"3"]))?;
            tx.set("fruit/cherry", &values(&[b"4"]))
        })
        .unwrap();

    let list = engine.tx(|tx| tx.list("fruit/", 0, 10, 0)).unwrap();
    assert_eq!(list.total_count, 3);
    let keys: Vec<&str> = list.nodes.iter().map(|n| n.key.as_str()).collect();
    assert_eq!(keys, vec!["fruit/apple", "fruit/banana", "fruit/cherry"]);

    // Pagination: skip 1, take 1.
    let page = engine.tx(|tx| tx.list("fruit/", 1, 1, 0)).unwrap();
    assert_eq!(page.total_count, 3);
    assert_eq!(page.nodes.len(), 1);
    assert_eq!(page.nodes[0].key, "fruit/banana");

    // Skip past the end yields an empty page with the full count.
    let past = engine.tx(|tx| tx.list("fruit/", 10, 5, 0)).unwrap();
    assert!(past.nodes.is_empty());
    assert_eq!(past.total_count, 3);

    // Empty prefix matches everything.
    let all = engine.tx(|tx| tx.list("", 0, 100, 0)).unwrap();
    assert_eq!(all.total_count, 4);
}

#[test]
fn list_version_check() {
    let dir = tempdir().unwrap();
    let engine = open_engine(&dir);

    engine.tx(|tx| tx.set("k", &values(&[b"v"]))).unwrap();
    let current = engine.tx(|tx| Ok(tx.version())).unwrap();

    // The matching version and the zero wildcard both pass.
    engine.tx(|tx| tx.list("", 0, 10, current)).unwrap();
    engine.tx(|tx| tx.list("", 0, 10, 0)).unwrap();

    let err = engine.tx(|tx| tx.list("", 0, 10, current + 7)).unwrap_err();
    assert!(matches!(err, CoreError::DataOutOfDate { .. }));
}

#[test]
fn failed_transaction_rolls_back_all_records() {
    let dir = tempdir().unwrap();
    let engine = open_engine(&dir);

    engine.tx(|tx| tx.set("stable", &values(&[b"v"]))).unwrap();
    let version_before = engine.tx(|tx| Ok(tx.version())).unwrap();

    // The closure mutates, then fails: every record must be undone.
    let err = engine
        .tx(|tx| {
            tx.add_value("stable", b"w".to_vec())?;
            tx.set("fresh", &values(&[b"x"]))?;
            tx.get("missing-key")
        })
        .unwrap_err();
    assert!(matches!(err, CoreError::NoSuchKey { .. }));

    assert_eq!(engine.tx(|tx| Ok(tx.version())).unwrap(), version_before);
    let node = engine.tx(|tx| tx.get("stable")).unwrap();
    assert_eq!(node.values, values(&[b"v"]));
    assert!(matches!(
        engine.tx(|tx| tx.get("fresh")),
        Err(CoreError::NoSuchKey { .. })
    ));
}

#[test]
fn manual_transaction_commit_and_drop_rollback() {
    let dir = tempdir().unwrap();
    let engine = open_engine(&dir);

    // Committed manual transaction.
    {
        let mut tx = engine.begin().unwrap();
        tx.set("k", &values(&[b"v"])).unwrap();
        tx.commit().unwrap();
    }
    assert_eq!(
        engine.tx(|tx| tx.get("k")).unwrap().values,
        values(&[b"v"])
    );

    // Dropping without commit rolls back.
    {
        let mut tx = engine.begin().unwrap();
        tx.add_value("k", b"uncommitted".to_vec()).unwrap();
    }
    assert_eq!(
        engine.tx(|tx| tx.get("k")).unwrap().values,
        values(&[b"v"])
    );
}

#[test]
fn operations_after_close_are_refused() {
    let dir = tempdir().unwrap();
    let engine = open_engine(&dir);
    engine.close().unwrap();

    assert!(matches!(
        engine.tx(|tx| Ok(tx.version())),
        Err(CoreError::Shutdown)
    ));
    assert!(matches!(engine.vacuum(), Err(CoreError::Shutdown)));
    // Close is idempotent.
    engine.close().unwrap();
}

#[test]
fn vacuum_preserves_data_across_reopen() {
    let dir = tempdir().unwrap();
    let engine = open_engine(&dir);

    engine
        .tx(|tx| {
            tx.set("a", &values(&[b"1", b"2"]))?;
            tx.set("b", &values(&[b"3"]))
        })
        .unwrap();
    // Churn that the rewrite should compact away.
    engine.tx(|tx| tx.set("a", &values(&[b"1", b"2"]))).unwrap();

    engine.vacuum().unwrap();

    let a = engine.tx(|tx| tx.get("a")).unwrap();
    assert_eq!(a.values, values(&[b"1", b"2"]));
    let b = engine.tx(|tx| tx.get("b")).unwrap();
    assert_eq!(b.values, values(&[b"3"]));

    // Mutations keep working after the journal swap...
    engine.tx(|tx| tx.add_value("b", b"4".to_vec())).unwrap();
    engine.close().unwrap();

    // ...and everything survives a reopen of the compacted directory.
    let reopened = open_engine(&dir);
    let a = reopened.tx(|tx| tx.get("a")).unwrap();
    assert_eq!(a.values, values(&[b"1", b"2"]));
    let b = reopened.tx(|tx| tx.get("b")).unwrap();
    assert_eq!(b.values, values(&[b"3", b"4"]));
}

#[test]
fn vacuum_on_timer_thread_shuts_down_cleanly() {
    let dir = tempdir().unwrap();
    let config = Config::new()
        .data_dir(dir.path())
        .vacuum_interval(Some(std::time::Duration::from_millis(20)))
        .sync_on_commit(false);
    let engine = Arc::new(Engine::open(&config).unwrap());
    Engine::spawn_vacuum_timer(&engine).unwrap();

    engine.tx(|tx| tx.set("k", &values(&[b"v"]))).unwrap();
    std::thread::sleep(std::time::Duration::from_millis(80));

    let node = engine.tx(|tx| tx.get("k")).unwrap();
    assert_eq!(node.values, values(&[b"v"]));

    // Close joins the timer thread; this must not hang or error.
    engine.close().unwrap();
}

#[test]
fn values_are_opaque_bytes() {
    let dir = tempdir().unwrap();
    let engine = open_engine(&dir);

    let blob: Vec<u8> = (0..=255u8).collect();
    engine
        .tx(|tx| tx.set("bin", &[blob.clone(), vec![], vec![0, 0, 0]]))
        .unwrap();

    let node = engine.tx(|tx| tx.get("bin")).unwrap();
    assert_eq!(node.values, vec![blob, vec![], vec![0, 0, 0]]);
}
