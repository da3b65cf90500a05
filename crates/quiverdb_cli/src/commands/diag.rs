//! `diag` commands: decode the on-disk files for inspection.
//!
//! These inspectors read `snapshot.dat` and `journal.dat` directly,
//! without opening the engine, so they can look at files the engine
//! would repair or refuse.

use super::display_value;
use quiverdb_core::model::snapshot::decode_model;
use quiverdb_core::wal::WalReader;
use quiverdb_storage::{FileBackend, StorageBackend, StorageDriver};
use serde::Serialize;
use std::path::Path;

/// One node as reported by `diag snapshot`.
#[derive(Debug, Serialize)]
struct SnapshotNode {
    key: String,
    version: u64,
    values: Vec<String>,
}

/// Full report of `diag snapshot`.
#[derive(Debug, Serialize)]
struct SnapshotReport {
    path: String,
    file_size: u64,
    version: u64,
    key_count: usize,
    nodes: Vec<SnapshotNode>,
}

/// Decodes and prints `snapshot.dat`.
pub fn snapshot(data_dir: &Path, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let driver = StorageDriver::new(data_dir)?;
    let backend = driver.open_snapshot_read()?;
    let file_size = backend.len()?;
    let image = backend.read_at(0, file_size as usize)?;
    let model = decode_model(&image)?;

    let report = SnapshotReport {
        path: driver.snapshot_path().display().to_string(),
        file_size,
        version: model.last_change_id().as_u64(),
        key_count: model.len(),
        nodes: model
            .keys()
            .iter()
            .filter_map(|key| model.get(key))
            .map(|node| SnapshotNode {
                key: node.key().to_string(),
                version: node.last_change_id().as_u64(),
                values: node.values().iter().map(|v| display_value(v)).collect(),
            })
            .collect(),
    };

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&report)?),
        _ => {
            println!("Snapshot: {}", report.path);
            println!("  size:    {} bytes", report.file_size);
            println!("  version: {}", report.version);
            println!("  keys:    {}", report.key_count);
            for node in &report.nodes {
                println!("  {} @{}: {:?}", node.key, node.version, node.values);
            }
        }
    }
    Ok(())
}

/// One record as reported by `diag wal`.
#[derive(Debug, Serialize)]
struct WalRecordReport {
    id: u64,
    tx_id: u64,
    kind: String,
    key: String,
    value: String,
}

/// Full report of `diag wal`.
#[derive(Debug, Serialize)]
struct WalReport {
    path: String,
    file_size: u64,
    record_count: usize,
    records: Vec<WalRecordReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Walks and prints the records of `journal.dat`.
pub fn wal(
    data_dir: &Path,
    format: &str,
    limit: Option<usize>,
) -> Result<(), Box<dyn std::error::Error>> {
    let driver = StorageDriver::new(data_dir)?;
    let backend = FileBackend::open(&driver.wal_path())?;
    let file_size = backend.len()?;

    let mut records = Vec::new();
    let mut error = None;
    let mut count = 0usize;

    let mut reader = WalReader::open(Box::new(backend))?;
    loop {
        match reader.next_record() {
            Ok(Some(record)) => {
                count += 1;
                if limit.map_or(true, |l| records.len() < l) {
                    records.push(WalRecordReport {
                        id: record.id.as_u64(),
                        tx_id: record.tx_id.as_u64(),
                        kind: format!("{:?}", record.record_type),
                        key: record.key,
                        value: display_value(&record.value),
                    });
                }
            }
            Ok(None) => break,
            Err(e) => {
                // Keep what decoded so far; the damage is part of the report.
                error = Some(e.to_string());
                break;
            }
        }
    }

    let report = WalReport {
        path: driver.wal_path().display().to_string(),
        file_size,
        record_count: count,
        records,
        error,
    };

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&report)?),
        _ => {
            println!("Journal: {}", report.path);
            println!("  size:    {} bytes", report.file_size);
            println!("  records: {}", report.record_count);
            for record in &report.records {
                println!(
                    "  #{:08} tx:{} {:<12} \"{}\" {:?}",
                    record.id, record.tx_id, record.kind, record.key, record.value
                );
            }
            if let Some(error) = &report.error {
                println!("  error: {error}");
            }
        }
    }
    Ok(())
}
