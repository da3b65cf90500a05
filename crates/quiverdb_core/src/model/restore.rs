//! Restore: snapshot load plus journal replay.

use crate::error::CoreResult;
use crate::model::{snapshot, Model};
use crate::wal::WalReader;
use quiverdb_storage::StorageDriver;
use tracing::{debug, info, warn};

/// Rebuilds the model from the snapshot and the journal.
///
/// 1. Decode `snapshot.dat` into a fresh model (an empty file is an empty
///    model).
/// 2. Replay every journal record with an id newer than the model.
/// 3. If replay advanced the model, rewrite the snapshot with the updated
///    state. This step is best-effort: on failure the next startup simply
///    replays the same journal tail again.
///
/// The journal must already have been validated (and its uncommitted tail
/// truncated) by opening the [`crate::wal::WalWriter`]; restore reads the
/// corrected file.
pub fn restore(driver: &StorageDriver) -> CoreResult<Model> {
    let snapshot_backend = driver.open_snapshot_read()?;
    let len = snapshot_backend.len()?;
    let image = snapshot_backend.read_at(0, len as usize)?;
    let mut model = snapshot::decode_model(&image)?;
    debug!(
        keys = model.len(),
        version = %model.last_change_id(),
        "snapshot loaded"
    );

    let loaded_version = model.last_change_id();
    let mut reader = WalReader::open(driver.open_wal_read()?)?;
    let replayed = model.replay(&mut reader)?;

    if model.last_change_id() != loaded_version {
        info!(
            replayed,
            version = %model.last_change_id(),
            "journal advanced the model; refreshing snapshot"
        );
        if let Err(e) = write_snapshot(driver, &model) {
            warn!(error = %e, "snapshot refresh failed; journal tail will replay next startup");
        }
    }

    Ok(model)
}

/// Writes the model image to `snapshot.dat`, fsyncing it.
pub fn write_snapshot(driver: &StorageDriver, model: &Model) -> CoreResult<()> {
    let image = snapshot::encode_model(model)?;
    let mut backend = driver.open_snapshot_write()?;
    backend.append(&image)?;
    backend.sync()?;
    debug!(bytes = image.len(), keys = model.len(), "snapshot written");
    Ok(())
}
