//! Trainloop: epoch-driven RL trainer with mergeable trajectory shards.
//!
//! Provides subcommands:
//!
//! - `train`          -- Run the training loop with the random-policy trainer
//!                       on the point-mass environment
//! - `inspect`        -- Summarise a trajectory shard file
//! - `status`         -- List shards and report whether a run has finished
//! - `default-config` -- Print the default configuration as JSON

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use trainloop::config::AppConfig;
use trainloop::env::{EnvironmentBinding, PointEnv};
use trainloop::training::{is_done, RandomPolicyTrainer, TrainingLoop};
use trainloop::trajectory::{list_shards, read_shard};

// ---------------------------------------------------------------------------
// CLI definition
// ---------------------------------------------------------------------------

/// Trainloop: epoch-driven RL trainer with mergeable trajectory shards
#[derive(Parser)]
#[command(name = "trainloop", version, about)]
struct Cli {
    /// Path to a JSON configuration file (uses defaults if not provided).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the training loop.
    Train {
        /// Total number of epochs (overrides the config).
        #[arg(long)]
        epochs: Option<usize>,

        /// Directory for checkpoints, summaries and the completion marker.
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Directory for trajectory shards.
        #[arg(long)]
        dump_dir: Option<PathBuf>,

        /// Minimum trajectories per periodic shard.
        #[arg(long)]
        min_count_per_shard: Option<usize>,

        /// Write the completion marker for async workers at the end.
        #[arg(long)]
        async_mode: bool,

        /// Skip the final evaluation.
        #[arg(long)]
        no_eval: bool,

        /// Continue from the checkpoint in the output directory.
        #[arg(long)]
        resume: bool,
    },

    /// Summarise a trajectory shard.
    Inspect {
        /// Path to a shard file (`<epoch>.json`).
        path: PathBuf,
    },

    /// Report shards and completion state of a run.
    Status {
        /// Output directory of the run.
        output_dir: PathBuf,

        /// Trajectory dump directory of the run.
        #[arg(long)]
        dump_dir: Option<PathBuf>,
    },

    /// Print the default configuration as JSON.
    DefaultConfig,
}

// ---------------------------------------------------------------------------
// Entrypoint
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    // Initialise tracing (reads RUST_LOG env var, defaults to info).
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AppConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => AppConfig::default(),
    };

    match cli.command {
        Commands::Train {
            epochs,
            output_dir,
            dump_dir,
            min_count_per_shard,
            async_mode,
            no_eval,
            resume,
        } => {
            let mut config = config;
            if let Some(epochs) = epochs {
                config.trainer.epochs = epochs;
            }
            if output_dir.is_some() {
                config.trainer.output_dir = output_dir;
            }
            if dump_dir.is_some() {
                config.trainer.trajectory_dump_dir = dump_dir;
            }
            if let Some(min_count) = min_count_per_shard {
                config.trainer.trajectory_dump_min_count_per_shard = min_count;
            }
            config.trainer.async_mode |= async_mode;
            if no_eval {
                config.trainer.evaluate = false;
            }
            config.validate().context("Invalid configuration")?;
            cmd_train(&config, resume)
        }
        Commands::Inspect { path } => cmd_inspect(&path),
        Commands::Status {
            output_dir,
            dump_dir,
        } => cmd_status(&output_dir, dump_dir.as_deref()),
        Commands::DefaultConfig => {
            println!("{}", AppConfig::default_json()?);
            Ok(())
        }
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

fn cmd_train(config: &AppConfig, resume: bool) -> Result<()> {
    let demo = &config.demo;
    let envs = EnvironmentBinding::new(
        Box::new(
            PointEnv::new("point-train", demo.dim, demo.seed)
                .with_limits(demo.max_step, demo.goal_radius),
        ),
        Box::new(
            PointEnv::new("point-eval", demo.dim, demo.seed.wrapping_add(1))
                .with_limits(demo.max_step, demo.goal_radius),
        ),
    );

    let mut hooks =
        RandomPolicyTrainer::new(demo.clone()).context("Invalid demo configuration")?;
    if resume {
        let output_dir = config
            .trainer
            .output_dir
            .as_deref()
            .context("--resume needs an output directory")?;
        match RandomPolicyTrainer::load_checkpoint(output_dir)? {
            Some(checkpoint) => {
                tracing::info!(epoch = checkpoint.epoch, "Resuming from checkpoint");
                hooks = hooks.resume_from(&checkpoint);
            }
            None => tracing::info!("No checkpoint found, starting fresh"),
        }
    }

    let mut training = TrainingLoop::new(hooks, envs, &config.trainer);
    let report = training
        .run(config.trainer.epochs, config.trainer.evaluate)
        .context("Training loop failed")?;

    tracing::info!(
        start_epoch = report.start_epoch,
        final_epoch = report.final_epoch,
        shards_written = report.shards_written,
        done_marker = report.done_marker,
        "Training finished"
    );
    Ok(())
}

fn cmd_inspect(path: &Path) -> Result<()> {
    let shard = read_shard(path)?;

    let steps: usize = shard.iter().map(|t| t.len()).sum();
    let actions: usize = shard.iter().map(|t| t.num_actions()).sum();
    let mean_return = if shard.is_empty() {
        0.0
    } else {
        shard.iter().map(|t| t.total_reward()).sum::<f64>() / shard.len() as f64
    };

    println!("Shard: {}", path.display());
    println!("  Trajectories: {}", shard.len());
    println!("  Time steps:   {steps}");
    println!("  Actions:      {actions}");
    println!("  Mean return:  {mean_return:.4}");
    println!();

    for trajectory in shard.iter().take(10) {
        println!(
            "  [{id}] steps={steps} return={ret:.4}",
            id = trajectory.id.get(..8).unwrap_or(&trajectory.id),
            steps = trajectory.len(),
            ret = trajectory.total_reward()
        );
    }
    if shard.len() > 10 {
        println!("  ... and {} more", shard.len() - 10);
    }
    Ok(())
}

fn cmd_status(output_dir: &Path, dump_dir: Option<&Path>) -> Result<()> {
    println!("Run: {}", output_dir.display());
    println!(
        "  Finished (async marker): {}",
        if is_done(output_dir) { "yes" } else { "no" }
    );

    if let Some(dump_dir) = dump_dir {
        let shards = list_shards(dump_dir)
            .with_context(|| format!("Failed to list shards in {}", dump_dir.display()))?;
        println!("  Shards in {}: {}", dump_dir.display(), shards.len());
        for (epoch, path) in &shards {
            let count = read_shard(path)?.len();
            println!("    epoch {epoch}: {count} trajectories");
        }
    }
    Ok(())
}
