//! Trainloop: the orchestration skeleton of a reinforcement-learning trainer.
//!
//! A [`training::TrainingLoop`] drives a concrete [`training::TrainerHooks`]
//! implementation for a number of epochs, persists the trajectories collected
//! by the training environment into mergeable per-epoch shards, and writes a
//! completion marker for out-of-process workers in async mode. The training
//! environment can be swapped mid-run as long as its action and observation
//! spaces match the first one bound.

pub mod config;
pub mod env;
pub mod error;
pub mod trajectory;
pub mod training;
