//! Trajectory recording and persistence.
//!
//! This module provides:
//! - [`types::TimeStep`], [`types::Trajectory`], [`types::TrajectoryBuffer`] --
//!   the data recorded for each episode.
//! - [`store::TrajectoryStore`] -- the capability an environment exposes for
//!   harvesting its completed episodes, with [`store::EpisodeTrajectories`] as
//!   the in-memory implementation.
//! - [`shard::ShardWriter`] -- buffers harvested trajectories and writes them
//!   to mergeable per-epoch shard files.

pub mod shard;
pub mod store;
pub mod types;

// Re-export the most commonly used items at the module level.
pub use shard::{list_shards, read_shard, shard_path, DumpOutcome, ShardWriter};
pub use store::{EpisodeTrajectories, TrajectoryStore};
pub use types::{TimeStep, Trajectory, TrajectoryBuffer};
