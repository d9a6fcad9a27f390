//! Training orchestration.
//!
//! This module implements the epoch-driven loop ([`controller`]), the hook
//! trait concrete trainers implement ([`hooks`]), the async completion
//! marker ([`signal`]), and a random-policy trainer used for smoke runs
//! ([`random_policy`]).

pub mod controller;
pub mod hooks;
pub mod random_policy;
pub mod signal;

pub use controller::{LoopState, RunReport, TrainingLoop};
pub use hooks::TrainerHooks;
pub use random_policy::{Checkpoint, EpochSummary, RandomPolicyTrainer};
pub use signal::{is_done, marker_path, CompletionSignal, DONE_MARKER};
