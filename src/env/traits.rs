//! Core environment trait and shared types.
//!
//! Every training or evaluation environment implements the [`Environment`]
//! trait so that the trainer can drive it, swap it, and harvest the
//! trajectories it records, without knowing its dynamics.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::trajectory::TrajectoryStore;

/// Flattened observation vector returned by an environment.
pub type Observation = Vec<f32>;

/// Element type of a [`Space`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DType {
    Float32,
    Float64,
    Int32,
    Int64,
    UInt8,
    Bool,
}

impl DType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Float32 => "float32",
            Self::Float64 => "float64",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::UInt8 => "uint8",
            Self::Bool => "bool",
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structural descriptor of an action or observation space.
///
/// Two spaces are compatible when both the shape tuple and the element type
/// are equal. Bounds and other metadata are deliberately not part of the
/// descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Space {
    pub shape: Vec<usize>,
    pub dtype: DType,
}

impl Space {
    pub fn new(shape: Vec<usize>, dtype: DType) -> Self {
        Self { shape, dtype }
    }

    /// Number of scalar elements in one value of this space.
    pub fn flat_len(&self) -> usize {
        self.shape.iter().product()
    }

    /// Whether `other` has the same shape and element type.
    pub fn is_compatible(&self, other: &Space) -> bool {
        self.shape == other.shape && self.dtype == other.dtype
    }
}

impl fmt::Display for Space {
    /// Renders as a shape tuple followed by the dtype, e.g. `(4,) float32`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, dim) in self.shape.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{dim}")?;
        }
        if self.shape.len() == 1 {
            f.write_str(",")?;
        }
        write!(f, ") {}", self.dtype)
    }
}

/// Result of a single environment step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepOutcome {
    pub observation: Observation,
    pub reward: f64,
    /// Whether the episode has terminated.
    pub done: bool,
}

/// The core environment trait.
///
/// Environments record their own interaction: `reset` opens a new episode in
/// the trajectory store and `step` extends it. The trainer only ever drains
/// completed trajectories out of [`Environment::trajectories`].
pub trait Environment: Send {
    /// A short label used in logs.
    fn name(&self) -> &str;

    fn action_space(&self) -> &Space;

    fn observation_space(&self) -> &Space;

    /// The store holding this environment's recorded trajectories.
    fn trajectories(&mut self) -> &mut dyn TrajectoryStore;

    /// Start a fresh episode and return its initial observation.
    fn reset(&mut self) -> anyhow::Result<Observation>;

    /// Apply a flattened action to the current episode.
    fn step(&mut self, action: &[f32]) -> anyhow::Result<StepOutcome>;
}
