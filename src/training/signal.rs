//! Completion marker for async workers.
//!
//! In async mode, trajectories are produced by out-of-process workers that
//! share the output directory. When the run finishes, an empty `__done__`
//! file is written there; its existence is the whole signal.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::TrainerError;

/// File name of the completion marker inside the output directory.
pub const DONE_MARKER: &str = "__done__";

/// Path of the completion marker for `output_dir`.
pub fn marker_path(output_dir: &Path) -> PathBuf {
    output_dir.join(DONE_MARKER)
}

/// Whether the run writing to `output_dir` has signalled completion.
pub fn is_done(output_dir: &Path) -> bool {
    marker_path(output_dir).exists()
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CompletionSignal {
    async_mode: bool,
}

impl CompletionSignal {
    pub fn new(async_mode: bool) -> Self {
        Self { async_mode }
    }

    pub fn async_mode(&self) -> bool {
        self.async_mode
    }

    pub fn set_async_mode(&mut self, async_mode: bool) {
        debug!(from = self.async_mode, to = async_mode, "Changing async mode");
        self.async_mode = async_mode;
    }

    /// Write the marker if in async mode. Returns whether it was written.
    pub fn indicate_done(&self, output_dir: &Path) -> Result<bool, TrainerError> {
        if !self.async_mode {
            return Ok(false);
        }
        let path = marker_path(output_dir);
        fs::write(&path, b"").map_err(|e| TrainerError::io(&path, e))?;
        info!(path = %path.display(), "Signalled completion to async workers");
        Ok(true)
    }
}
