//! A concrete trainer that acts uniformly at random.
//!
//! [`RandomPolicyTrainer`] implements every [`TrainerHooks`] method without
//! learning anything. It exists so the binary can exercise the full loop
//! (interaction, checkpoints, summaries, shards) and as a baseline whose
//! returns any real learner should beat.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::hooks::TrainerHooks;
use crate::config::DemoConfig;
use crate::env::{Environment, EnvironmentBinding};
use crate::error::{ConfigError, TrainerError};
use crate::trajectory::TrajectoryStore;

/// File name of the checkpoint written by [`RandomPolicyTrainer::save`].
pub const CHECKPOINT_FILE: &str = "checkpoint.json";
/// File name of the summary log appended by `flush_summaries`.
pub const SUMMARIES_FILE: &str = "summaries.jsonl";

/// Metrics for one training epoch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpochSummary {
    pub epoch: usize,
    pub episodes: usize,
    pub steps: usize,
    pub mean_return: f64,
    /// Set when the epoch was followed by an evaluation.
    pub eval_mean_return: Option<f64>,
    pub recorded_at: DateTime<Utc>,
}

/// Contents of [`CHECKPOINT_FILE`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    pub epoch: usize,
    pub saved_at: DateTime<Utc>,
    pub last_mean_return: Option<f64>,
}

/// Uniform random policy driving a [`crate::training::TrainingLoop`].
pub struct RandomPolicyTrainer {
    config: DemoConfig,
    epoch: usize,
    rng: StdRng,
    pending: Vec<EpochSummary>,
    last_mean_return: Option<f64>,
}

impl RandomPolicyTrainer {
    /// Fails if `config` does not pass [`DemoConfig::validate`].
    pub fn new(config: DemoConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let rng = StdRng::seed_from_u64(config.seed);
        Ok(Self {
            config,
            epoch: 0,
            rng,
            pending: Vec::new(),
            last_mean_return: None,
        })
    }

    /// Continue from a previously saved epoch.
    pub fn resume_from(mut self, checkpoint: &Checkpoint) -> Self {
        self.epoch = checkpoint.epoch;
        self.last_mean_return = checkpoint.last_mean_return;
        self
    }

    /// Load the checkpoint written under `output_dir`, if any.
    pub fn load_checkpoint(output_dir: &Path) -> Result<Option<Checkpoint>, TrainerError> {
        let path = output_dir.join(CHECKPOINT_FILE);
        if !path.exists() {
            return Ok(None);
        }
        let data = fs::read_to_string(&path).map_err(|e| TrainerError::io(&path, e))?;
        Ok(Some(serde_json::from_str(&data)?))
    }

    /// Summaries recorded since the last flush.
    pub fn pending_summaries(&self) -> &[EpochSummary] {
        &self.pending
    }

    /// Play one episode of at most `max_steps` random actions.
    /// Returns `(return, steps)`. An episode cut off by the step cap is left
    /// open in the environment's trajectory store.
    fn play_episode(
        &mut self,
        env: &mut dyn Environment,
        max_steps: usize,
    ) -> Result<(f64, usize), TrainerError> {
        let bound = f64::from(self.config.max_step);
        let action_len = env.action_space().flat_len();
        env.reset()?;

        let mut total = 0.0;
        let mut steps = 0;
        while steps < max_steps {
            let action: Vec<f32> = (0..action_len)
                .map(|_| self.rng.gen_range(-bound..=bound) as f32)
                .collect();
            let outcome = env.step(&action)?;
            total += outcome.reward;
            steps += 1;
            if outcome.done {
                break;
            }
        }
        Ok((total, steps))
    }
}

impl TrainerHooks for RandomPolicyTrainer {
    fn epoch(&self) -> Result<usize, TrainerError> {
        Ok(self.epoch)
    }

    fn train_epoch(
        &mut self,
        envs: &mut EnvironmentBinding,
        _evaluate: bool,
    ) -> Result<(), TrainerError> {
        if envs.take_reset_pending() {
            debug!(env = envs.train_env().name(), "Starting from a fresh episode");
        }

        let episodes = self.config.episodes_per_epoch;
        let max_steps = self.config.max_episode_steps;
        let mut returns = 0.0;
        let mut steps = 0;
        for _ in 0..episodes {
            let (ret, n) = self.play_episode(envs.train_env_mut(), max_steps)?;
            returns += ret;
            steps += n;
        }

        self.epoch += 1;
        let mean_return = returns / episodes.max(1) as f64;
        self.last_mean_return = Some(mean_return);
        info!(epoch = self.epoch, episodes, steps, mean_return, "Epoch complete");

        self.pending.push(EpochSummary {
            epoch: self.epoch,
            episodes,
            steps,
            mean_return,
            eval_mean_return: None,
            recorded_at: Utc::now(),
        });
        Ok(())
    }

    fn evaluate(&mut self, envs: &mut EnvironmentBinding) -> Result<(), TrainerError> {
        let episodes = self.config.eval_episodes;
        let max_steps = self.config.max_episode_steps;
        let mut returns = 0.0;
        for _ in 0..episodes {
            let (ret, _) = self.play_episode(envs.eval_env_mut(), max_steps)?;
            returns += ret;
        }
        // Evaluation episodes are not training data.
        let store: &mut dyn TrajectoryStore = envs.eval_env_mut().trajectories();
        store.complete_all_trajectories();
        store.clear_completed_trajectories();

        let mean_return = returns / episodes.max(1) as f64;
        info!(epoch = self.epoch, episodes, mean_return, "Evaluation complete");
        if let Some(last) = self.pending.last_mut() {
            last.eval_mean_return = Some(mean_return);
        }
        Ok(())
    }

    fn save(&mut self, output_dir: &Path) -> Result<(), TrainerError> {
        let checkpoint = Checkpoint {
            epoch: self.epoch,
            saved_at: Utc::now(),
            last_mean_return: self.last_mean_return,
        };
        let path = output_dir.join(CHECKPOINT_FILE);
        let json = serde_json::to_string_pretty(&checkpoint)?;
        fs::write(&path, json).map_err(|e| TrainerError::io(&path, e))?;
        info!(epoch = self.epoch, path = %path.display(), "Saved checkpoint");
        Ok(())
    }

    fn maybe_save(&mut self, output_dir: &Path) -> Result<(), TrainerError> {
        if self.epoch % self.config.save_every_epochs == 0 {
            self.save(output_dir)?;
        }
        Ok(())
    }

    fn flush_summaries(&mut self, output_dir: &Path) -> Result<(), TrainerError> {
        if self.pending.is_empty() {
            return Ok(());
        }
        let path = output_dir.join(SUMMARIES_FILE);
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| TrainerError::io(&path, e))?;
        for summary in &self.pending {
            let line = serde_json::to_string(summary)?;
            writeln!(file, "{line}").map_err(|e| TrainerError::io(&path, e))?;
        }
        debug!(count = self.pending.len(), path = %path.display(), "Flushed summaries");
        self.pending.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TrainerConfig;
    use crate::env::PointEnv;
    use crate::training::TrainingLoop;
    use crate::trajectory::{list_shards, read_shard};

    fn demo_config() -> DemoConfig {
        DemoConfig {
            episodes_per_epoch: 4,
            max_episode_steps: 5,
            eval_episodes: 2,
            save_every_epochs: 2,
            ..DemoConfig::default()
        }
    }

    fn envs(dim: usize) -> EnvironmentBinding {
        EnvironmentBinding::new(
            Box::new(PointEnv::new("train", dim, 1)),
            Box::new(PointEnv::new("eval", dim, 2)),
        )
    }

    #[test]
    fn test_train_epoch_advances_and_records_trajectories() {
        let mut trainer = RandomPolicyTrainer::new(demo_config()).unwrap();
        let mut envs = envs(2);

        trainer.train_epoch(&mut envs, false).unwrap();
        assert_eq!(trainer.epoch().unwrap(), 1);
        assert_eq!(trainer.pending_summaries().len(), 1);
        assert!(trainer.pending_summaries()[0].mean_return <= 0.0);

        let store = envs.train_env_mut().trajectories();
        store.complete_all_trajectories();
        assert_eq!(store.completed_trajectories().len(), 4);
    }

    #[test]
    fn test_evaluate_leaves_no_eval_trajectories() {
        let mut trainer = RandomPolicyTrainer::new(demo_config()).unwrap();
        let mut envs = envs(2);
        trainer.train_epoch(&mut envs, true).unwrap();
        trainer.evaluate(&mut envs).unwrap();

        assert!(trainer.pending_summaries()[0].eval_mean_return.is_some());
        assert!(envs
            .eval_env_mut()
            .trajectories()
            .completed_trajectories()
            .is_empty());
    }

    #[test]
    fn test_full_run_writes_checkpoint_summaries_and_shards() {
        let dir = tempfile::tempdir().unwrap();
        let output_dir = dir.path().join("out");
        let dump_dir = dir.path().join("dumps");
        let config = TrainerConfig {
            output_dir: Some(output_dir.clone()),
            trajectory_dump_dir: Some(dump_dir.clone()),
            trajectory_dump_min_count_per_shard: 6,
            async_mode: true,
            ..TrainerConfig::default()
        };
        let mut training = TrainingLoop::new(
            RandomPolicyTrainer::new(demo_config()).unwrap(),
            envs(2),
            &config,
        );

        let report = training.run(3, true).unwrap();
        assert_eq!(report.final_epoch, 3);
        assert!(report.done_marker);

        let checkpoint = RandomPolicyTrainer::load_checkpoint(&output_dir)
            .unwrap()
            .unwrap();
        assert_eq!(checkpoint.epoch, 3);

        let summaries = fs::read_to_string(output_dir.join(SUMMARIES_FILE)).unwrap();
        assert_eq!(summaries.lines().count(), 3);
        assert!(training.hooks().pending_summaries().is_empty());

        let total: usize = list_shards(&dump_dir)
            .unwrap()
            .iter()
            .map(|(_, path)| read_shard(path).unwrap().len())
            .sum();
        assert_eq!(total, 12);
    }

    #[test]
    fn test_resume_continues_epoch_count() {
        let checkpoint = Checkpoint {
            epoch: 7,
            saved_at: Utc::now(),
            last_mean_return: Some(-1.0),
        };
        let trainer = RandomPolicyTrainer::new(demo_config())
            .unwrap()
            .resume_from(&checkpoint);
        assert_eq!(trainer.epoch().unwrap(), 7);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let zero_interval = DemoConfig {
            save_every_epochs: 0,
            ..demo_config()
        };
        assert!(matches!(
            RandomPolicyTrainer::new(zero_interval),
            Err(ConfigError::Validation(_))
        ));

        let negative_step = DemoConfig {
            max_step: -0.1,
            ..demo_config()
        };
        assert!(RandomPolicyTrainer::new(negative_step).is_err());
    }

    #[test]
    fn test_missing_checkpoint_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(RandomPolicyTrainer::load_checkpoint(dir.path())
            .unwrap()
            .is_none());
    }
}
