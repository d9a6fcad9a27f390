//! Epoch-keyed trajectory shards.
//!
//! [`ShardWriter::dump`] moves completed, non-degenerate trajectories out of
//! an environment's [`TrajectoryStore`] into an in-memory buffer and, once
//! the buffer holds enough trajectories (or the caller forces it), writes
//! them to `<dump_dir>/<epoch>.json`.
//!
//! At most one shard exists per epoch. If a shard for the epoch is already on
//! disk its contents are placed in front of the buffered trajectories and the
//! merged list replaces the file. Writes go through a `.tmp` sibling that is
//! renamed into place, so an interrupted write leaves the previous shard
//! intact.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::store::TrajectoryStore;
use super::types::{Trajectory, TrajectoryBuffer};
use crate::error::TrainerError;

/// Default minimum number of trajectories per shard.
pub const DEFAULT_MIN_COUNT_PER_SHARD: usize = 16;

const SHARD_EXTENSION: &str = "json";

/// What a call to [`ShardWriter::dump`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DumpOutcome {
    /// No dump directory is configured.
    Disabled,
    /// Trajectories were buffered but no shard was written.
    Buffered { pending: usize },
    /// A shard was written; `count` includes any merged on-disk trajectories.
    Written { path: PathBuf, count: usize },
}

/// Path of the shard for `epoch` under `dump_dir`.
pub fn shard_path(dump_dir: &Path, epoch: usize) -> PathBuf {
    dump_dir.join(format!("{epoch}.{SHARD_EXTENSION}"))
}

/// Read and deserialize a shard file.
pub fn read_shard(path: &Path) -> Result<Vec<Trajectory>, TrainerError> {
    let data = fs::read_to_string(path).map_err(|e| TrainerError::io(path, e))?;
    serde_json::from_str(&data).map_err(|e| TrainerError::ShardParse {
        path: path.to_path_buf(),
        source: e,
    })
}

/// List the shards in `dump_dir` as `(epoch, path)`, sorted by epoch.
///
/// Temporary files and names that are not an epoch number are ignored.
pub fn list_shards(dump_dir: &Path) -> Result<Vec<(usize, PathBuf)>, TrainerError> {
    let entries = fs::read_dir(dump_dir).map_err(|e| TrainerError::io(dump_dir, e))?;
    let mut shards = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| TrainerError::io(dump_dir, e))?.path();
        if path.extension().and_then(|e| e.to_str()) != Some(SHARD_EXTENSION) {
            continue;
        }
        let epoch = path
            .file_stem()
            .and_then(|s| s.to_str())
            .and_then(|s| s.parse::<usize>().ok());
        if let Some(epoch) = epoch {
            shards.push((epoch, path));
        }
    }
    shards.sort_by_key(|(epoch, _)| *epoch);
    Ok(shards)
}

/// Buffers trajectories and flushes them into per-epoch shards.
#[derive(Debug)]
pub struct ShardWriter {
    dump_dir: Option<PathBuf>,
    min_count_per_shard: usize,
    buffer: TrajectoryBuffer,
}

impl ShardWriter {
    pub fn new(dump_dir: Option<PathBuf>, min_count_per_shard: usize) -> Self {
        Self {
            dump_dir,
            min_count_per_shard,
            buffer: TrajectoryBuffer::new(),
        }
    }

    pub fn dump_dir(&self) -> Option<&Path> {
        self.dump_dir.as_deref()
    }

    /// Change (or disable) the dump directory. Buffered trajectories are kept
    /// and go to the new directory on the next flush.
    pub fn set_dump_dir(&mut self, dump_dir: Option<PathBuf>) {
        self.dump_dir = dump_dir;
    }

    pub fn min_count_per_shard(&self) -> usize {
        self.min_count_per_shard
    }

    /// Trajectories buffered but not yet written.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Harvest `store` and write a shard for `epoch` if enough trajectories
    /// are buffered or `force` is set.
    ///
    /// With `force`, open episodes are completed first and a shard is written
    /// even when the buffer is below the minimum (or empty). Calling this more
    /// than once for the same epoch merges into the existing shard.
    pub fn dump(
        &mut self,
        store: &mut dyn TrajectoryStore,
        epoch: usize,
        force: bool,
    ) -> Result<DumpOutcome, TrainerError> {
        let Some(dump_dir) = self.dump_dir.clone() else {
            return Ok(DumpOutcome::Disabled);
        };
        fs::create_dir_all(&dump_dir).map_err(|e| TrainerError::io(&dump_dir, e))?;

        if force {
            store.complete_all_trajectories();
        }

        let completed = store.completed_trajectories();
        let harvested = completed.len();
        self.buffer.extend(
            completed
                .iter()
                .filter(|t| !t.is_degenerate())
                .cloned(),
        );
        store.clear_completed_trajectories();

        let ready = self.buffer.len() >= self.min_count_per_shard;
        debug!(
            epoch,
            force,
            harvested,
            pending = self.buffer.len(),
            min_count = self.min_count_per_shard,
            "Harvested trajectories"
        );
        if !ready && !force {
            return Ok(DumpOutcome::Buffered {
                pending: self.buffer.len(),
            });
        }

        let path = shard_path(&dump_dir, epoch);
        let count = self.flush(&path)?;
        info!(epoch, count, path = %path.display(), "Wrote trajectory shard");
        Ok(DumpOutcome::Written { path, count })
    }

    /// Merge the buffer into the shard at `path` and clear it. The buffer is
    /// left untouched if reading the existing shard or writing fails.
    fn flush(&mut self, path: &Path) -> Result<usize, TrainerError> {
        let mut merged = if path.exists() {
            let existing = read_shard(path)?;
            debug!(
                existing = existing.len(),
                path = %path.display(),
                "Merging into existing shard"
            );
            existing
        } else {
            Vec::new()
        };
        merged.extend_from_slice(self.buffer.as_slice());

        let json = serde_json::to_string(&merged)?;
        let tmp_path = path.with_extension(format!("{SHARD_EXTENSION}.tmp"));
        fs::write(&tmp_path, json).map_err(|e| TrainerError::io(&tmp_path, e))?;
        fs::rename(&tmp_path, path).map_err(|e| TrainerError::io(path, e))?;

        self.buffer.drain();
        Ok(merged.len())
    }
}
