//! The epoch-driven training loop.
//!
//! ```text
//! Uninitialized --reset--> Ready --run--> Running --> Finished
//!                 (run resets implicitly from Uninitialized)
//! ```
//!
//! Each iteration of [`TrainingLoop::run`] calls `train_epoch`, `maybe_save`
//! and a periodic trajectory dump. After the last epoch it saves, forces a
//! final dump, optionally evaluates, flushes summaries and signals
//! completion to async workers.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::hooks::TrainerHooks;
use super::signal::CompletionSignal;
use crate::config::TrainerConfig;
use crate::env::{Environment, EnvironmentBinding};
use crate::error::TrainerError;
use crate::trajectory::{DumpOutcome, ShardWriter};

/// Lifecycle of a [`TrainingLoop`]. Only forward transitions exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopState {
    Uninitialized,
    Ready { output_dir: PathBuf },
    Running { output_dir: PathBuf },
    Finished { output_dir: PathBuf },
}

impl LoopState {
    /// The output directory chosen by the last reset, if any.
    pub fn output_dir(&self) -> Option<&Path> {
        match self {
            Self::Uninitialized => None,
            Self::Ready { output_dir }
            | Self::Running { output_dir }
            | Self::Finished { output_dir } => Some(output_dir),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Ready { .. } => "ready",
            Self::Running { .. } => "running",
            Self::Finished { .. } => "finished",
        }
    }
}

impl fmt::Display for LoopState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Summary of a completed [`TrainingLoop::run`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub start_epoch: usize,
    pub final_epoch: usize,
    /// Number of dumps that wrote (or merged into) a shard.
    pub shards_written: usize,
    /// Whether the async completion marker was written.
    pub done_marker: bool,
}

/// Drives a [`TrainerHooks`] implementation through the training lifecycle.
pub struct TrainingLoop<H> {
    hooks: H,
    envs: EnvironmentBinding,
    writer: ShardWriter,
    signal: CompletionSignal,
    configured_output_dir: Option<PathBuf>,
    state: LoopState,
}

impl<H: TrainerHooks> TrainingLoop<H> {
    pub fn new(hooks: H, envs: EnvironmentBinding, config: &TrainerConfig) -> Self {
        Self {
            hooks,
            envs,
            writer: ShardWriter::new(
                config.trajectory_dump_dir.clone(),
                config.trajectory_dump_min_count_per_shard,
            ),
            signal: CompletionSignal::new(config.async_mode),
            configured_output_dir: config.output_dir.clone(),
            state: LoopState::Uninitialized,
        }
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Prepare the output directory and move to [`LoopState::Ready`].
    ///
    /// `output_dir` overrides the configured directory for this and later
    /// resets. Fails with [`TrainerError::MisconfiguredOutput`] when neither
    /// is set.
    pub fn reset(&mut self, output_dir: Option<&Path>) -> Result<(), TrainerError> {
        if !matches!(
            self.state,
            LoopState::Uninitialized | LoopState::Ready { .. }
        ) {
            return Err(self.invalid_transition("reset"));
        }

        if let Some(dir) = output_dir.filter(|d| !d.as_os_str().is_empty()) {
            self.configured_output_dir = Some(dir.to_path_buf());
        }
        let output_dir = self
            .configured_output_dir
            .clone()
            .filter(|d| !d.as_os_str().is_empty())
            .ok_or(TrainerError::MisconfiguredOutput)?;

        fs::create_dir_all(&output_dir).map_err(|e| TrainerError::io(&output_dir, e))?;
        info!(output_dir = %output_dir.display(), "Trainer reset");
        self.state = LoopState::Ready { output_dir };
        Ok(())
    }

    /// Train until the hooks report `total_epochs`, then finalize the run.
    ///
    /// Resets implicitly when [`TrainingLoop::reset`] was never called. Any
    /// hook or I/O error ends the run and leaves the loop in
    /// [`LoopState::Running`].
    pub fn run(&mut self, total_epochs: usize, evaluate: bool) -> Result<RunReport, TrainerError> {
        if self.state == LoopState::Uninitialized {
            info!("Calling trainer reset");
            self.reset(None)?;
        }
        let output_dir = match &self.state {
            LoopState::Ready { output_dir } => output_dir.clone(),
            _ => return Err(self.invalid_transition("run")),
        };
        self.state = LoopState::Running {
            output_dir: output_dir.clone(),
        };

        let start_epoch = self.hooks.epoch()?;
        info!(start_epoch, total_epochs, "Starting the RL training loop");

        let mut shards_written = 0;
        let mut epoch = start_epoch;
        while epoch < total_epochs {
            self.hooks.train_epoch(&mut self.envs, evaluate)?;
            let next = self.hooks.epoch()?;
            if next <= epoch {
                return Err(TrainerError::EpochStalled { epoch });
            }
            epoch = next;
            debug!(epoch, "Epoch finished");

            self.hooks.maybe_save(&output_dir)?;
            if let DumpOutcome::Written { .. } = self.dump_at(epoch, false)? {
                shards_written += 1;
            }
        }

        self.hooks.save(&output_dir)?;
        let final_epoch = self.hooks.epoch()?;
        if let DumpOutcome::Written { .. } = self.dump_at(final_epoch, true)? {
            shards_written += 1;
        }
        if evaluate {
            self.hooks.evaluate(&mut self.envs)?;
        }
        self.hooks.flush_summaries(&output_dir)?;
        let done_marker = self.signal.indicate_done(&output_dir)?;

        info!(
            start_epoch,
            final_epoch,
            shards_written,
            done_marker,
            "RL training loop finished"
        );
        self.state = LoopState::Finished { output_dir };
        Ok(RunReport {
            start_epoch,
            final_epoch,
            shards_written,
            done_marker,
        })
    }

    /// Dump the training environment's trajectories into the shard for the
    /// current epoch.
    pub fn dump_trajectories(&mut self, force: bool) -> Result<DumpOutcome, TrainerError> {
        let epoch = self.hooks.epoch()?;
        self.dump_at(epoch, force)
    }

    fn dump_at(&mut self, epoch: usize, force: bool) -> Result<DumpOutcome, TrainerError> {
        self.writer
            .dump(self.envs.train_env_mut().trajectories(), epoch, force)
    }

    fn invalid_transition(&self, op: &'static str) -> TrainerError {
        TrainerError::InvalidTransition {
            op,
            state: self.state.to_string(),
        }
    }

    // ------------------------------------------------------------------
    // Environments
    // ------------------------------------------------------------------

    /// Swap the training environment, returning the previous one.
    ///
    /// Completed trajectories still held by the previous environment are not
    /// harvested; dump before swapping to keep them.
    pub fn bind_train_env(
        &mut self,
        env: Box<dyn Environment>,
    ) -> Result<Box<dyn Environment>, TrainerError> {
        self.envs.bind(env)
    }

    pub fn train_env(&self) -> &dyn Environment {
        self.envs.train_env()
    }

    pub fn eval_env(&self) -> &dyn Environment {
        self.envs.eval_env()
    }

    pub fn envs(&self) -> &EnvironmentBinding {
        &self.envs
    }

    pub fn envs_mut(&mut self) -> &mut EnvironmentBinding {
        &mut self.envs
    }

    // ------------------------------------------------------------------
    // Settings and accessors
    // ------------------------------------------------------------------

    pub fn async_mode(&self) -> bool {
        self.signal.async_mode()
    }

    pub fn set_async_mode(&mut self, async_mode: bool) {
        self.signal.set_async_mode(async_mode);
    }

    pub fn trajectory_dump_dir(&self) -> Option<&Path> {
        self.writer.dump_dir()
    }

    pub fn set_trajectory_dump_dir(&mut self, dump_dir: Option<PathBuf>) {
        self.writer.set_dump_dir(dump_dir);
    }

    /// Trajectories buffered by the shard writer but not yet written.
    pub fn pending_trajectories(&self) -> usize {
        self.writer.pending()
    }

    pub fn state(&self) -> &LoopState {
        &self.state
    }

    pub fn hooks(&self) -> &H {
        &self.hooks
    }

    pub fn hooks_mut(&mut self) -> &mut H {
        &mut self.hooks
    }

    pub fn into_hooks(self) -> H {
        self.hooks
    }
}
