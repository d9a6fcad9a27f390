//! Environment abstractions.
//!
//! Every environment implements the [`Environment`] trait so that the trainer
//! can drive it and harvest its trajectories uniformly. The
//! [`EnvironmentBinding`] owns the active training and evaluation
//! environments and rejects a training environment whose spaces differ from
//! the first one bound.
//!
//! Included environments:
//! - **PointEnv** ([`point`]) -- n-dimensional point-mass reaching task used
//!   for smoke runs and tests.

pub mod binding;
pub mod point;
pub mod traits;

// Re-export the core trait and descriptor types at the module level.
pub use binding::EnvironmentBinding;
pub use point::PointEnv;
pub use traits::{DType, Environment, Observation, Space, StepOutcome};
