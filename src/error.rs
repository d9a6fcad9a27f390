//! Structured error types for the trainer core and its configuration.

use std::path::PathBuf;

use crate::env::Space;

/// Errors raised by the environment binding, the shard writer and the
/// training loop.
#[derive(Debug, thiserror::Error)]
pub enum TrainerError {
    #[error("incompatible environment: {space} is {found}, expected {expected}")]
    IncompatibleEnvironment {
        space: &'static str,
        expected: Space,
        found: Space,
    },

    #[error("no output directory configured; pass one to reset() or set it in the config")]
    MisconfiguredOutput,

    #[error("hook `{0}` must be implemented by the concrete trainer")]
    AbstractHookInvoked(&'static str),

    #[error("cannot {op} while the training loop is {state}")]
    InvalidTransition { op: &'static str, state: String },

    #[error("train_epoch did not advance the epoch counter (still at {epoch})")]
    EpochStalled { epoch: usize },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse shard {path}: {source}")]
    ShardParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    External(#[from] anyhow::Error),
}

impl TrainerError {
    /// Wrap an I/O error with the path it happened at.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        TrainerError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("config validation error: {0}")]
    Validation(String),
}
