use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::trajectory::shard::DEFAULT_MIN_COUNT_PER_SHARD;

/// Complete configuration for a training run, loadable from JSON.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub trainer: TrainerConfig,
    pub demo: DemoConfig,
}

/// Settings consumed by the training loop itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainerConfig {
    /// Directory for checkpoints, summaries and the completion marker.
    pub output_dir: Option<PathBuf>,
    /// Directory for trajectory shards; dumping is disabled when unset.
    pub trajectory_dump_dir: Option<PathBuf>,
    /// Minimum number of trajectories before a periodic dump writes a shard
    /// (default: 16).
    pub trajectory_dump_min_count_per_shard: usize,
    /// Whether trajectories come from external workers that wait for the
    /// completion marker (default: false).
    pub async_mode: bool,
    /// Number of epochs to train for (default: 10).
    pub epochs: usize,
    /// Whether to run the evaluation hook (default: true).
    pub evaluate: bool,
}

/// Settings for the bundled point-mass environment and random-policy trainer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    /// Dimension of the point-mass task (default: 2).
    pub dim: usize,
    /// Largest displacement per step (default: 0.1).
    pub max_step: f32,
    /// Distance to the origin that ends an episode (default: 0.05).
    pub goal_radius: f32,
    /// Episodes played per training epoch (default: 8).
    pub episodes_per_epoch: usize,
    /// Step cap per episode; longer episodes are left open (default: 50).
    pub max_episode_steps: usize,
    /// Episodes played by the evaluation hook (default: 4).
    pub eval_episodes: usize,
    /// Checkpoint every this many epochs (default: 5).
    pub save_every_epochs: usize,
    /// Seed for environments and the policy (default: 0).
    pub seed: u64,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            output_dir: None,
            trajectory_dump_dir: None,
            trajectory_dump_min_count_per_shard: DEFAULT_MIN_COUNT_PER_SHARD,
            async_mode: false,
            epochs: 10,
            evaluate: true,
        }
    }
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            dim: 2,
            max_step: 0.1,
            goal_radius: 0.05,
            episodes_per_epoch: 8,
            max_episode_steps: 50,
            eval_episodes: 4,
            save_every_epochs: 5,
            seed: 0,
        }
    }
}

impl AppConfig {
    /// Load configuration from a JSON file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: AppConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.trainer.trajectory_dump_min_count_per_shard == 0 {
            return Err(ConfigError::Validation(
                "trainer.trajectory_dump_min_count_per_shard must be >= 1".into(),
            ));
        }
        self.demo.validate()
    }

    /// Pretty JSON with all default values (useful for creating example
    /// config files).
    pub fn default_json() -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(&AppConfig::default())?)
    }
}

impl DemoConfig {
    /// Validate the demo settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.dim == 0 {
            return Err(ConfigError::Validation("demo.dim must be >= 1".into()));
        }
        if !self.max_step.is_finite() || self.max_step <= 0.0 {
            return Err(ConfigError::Validation("demo.max_step must be finite and > 0".into()));
        }
        if !self.goal_radius.is_finite() || self.goal_radius <= 0.0 {
            return Err(ConfigError::Validation(
                "demo.goal_radius must be finite and > 0".into(),
            ));
        }
        if self.episodes_per_epoch == 0 {
            return Err(ConfigError::Validation(
                "demo.episodes_per_epoch must be >= 1".into(),
            ));
        }
        if self.max_episode_steps == 0 {
            return Err(ConfigError::Validation(
                "demo.max_episode_steps must be >= 1".into(),
            ));
        }
        if self.save_every_epochs == 0 {
            return Err(ConfigError::Validation(
                "demo.save_every_epochs must be >= 1".into(),
            ));
        }
        Ok(())
    }
}
