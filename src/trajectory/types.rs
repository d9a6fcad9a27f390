//! Core trajectory data types shared by environments and the shard writer.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Single time step
// ---------------------------------------------------------------------------

/// One step of interaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeStep {
    /// The observation the agent saw at this step.
    pub observation: Vec<f32>,
    /// The action taken from this observation. `None` until an action has
    /// been taken, so it is absent on the step right after a reset and on the
    /// final step of a finished episode.
    pub action: Option<Vec<f32>>,
    /// The reward received on arriving at this step (0 for the reset step).
    pub reward: f64,
    /// Whether the episode terminated at this step.
    pub done: bool,
}

impl TimeStep {
    /// The time step recorded right after a reset.
    pub fn initial(observation: Vec<f32>) -> Self {
        Self {
            observation,
            action: None,
            reward: 0.0,
            done: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Full trajectory
// ---------------------------------------------------------------------------

/// A completed (or force-completed) episode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    /// Unique identifier (UUID v4).
    pub id: String,
    /// Ordered, non-empty sequence of time steps.
    pub time_steps: Vec<TimeStep>,
}

impl Trajectory {
    /// Build a trajectory from recorded steps. Returns `None` for an empty
    /// sequence since a trajectory always holds at least one step.
    pub fn from_steps(time_steps: Vec<TimeStep>) -> Option<Self> {
        if time_steps.is_empty() {
            return None;
        }
        Some(Self {
            id: Uuid::new_v4().to_string(),
            time_steps,
        })
    }

    pub fn len(&self) -> usize {
        self.time_steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time_steps.is_empty()
    }

    /// A trajectory is degenerate when its first step carries no action: the
    /// episode was reset and harvested before anything happened.
    ///
    /// Only the first step is inspected.
    pub fn is_degenerate(&self) -> bool {
        self.time_steps
            .first()
            .map_or(true, |step| step.action.is_none())
    }

    /// Sum of rewards over the episode.
    pub fn total_reward(&self) -> f64 {
        self.time_steps.iter().map(|s| s.reward).sum()
    }

    /// Number of actions actually taken.
    pub fn num_actions(&self) -> usize {
        self.time_steps.iter().filter(|s| s.action.is_some()).count()
    }
}

// ---------------------------------------------------------------------------
// Trajectory buffer
// ---------------------------------------------------------------------------

/// Process-local, ordered list of trajectories awaiting persistence.
#[derive(Debug, Clone, Default)]
pub struct TrajectoryBuffer {
    trajectories: Vec<Trajectory>,
}

impl TrajectoryBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self {
            trajectories: Vec::new(),
        }
    }

    /// Number of trajectories currently in the buffer.
    pub fn len(&self) -> usize {
        self.trajectories.len()
    }

    /// Whether the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.trajectories.is_empty()
    }

    /// Extend the buffer with an iterator of trajectories, keeping their order.
    pub fn extend(&mut self, iter: impl IntoIterator<Item = Trajectory>) {
        self.trajectories.extend(iter);
    }

    /// Drain **all** trajectories from the buffer, leaving it empty.
    pub fn drain(&mut self) -> Vec<Trajectory> {
        std::mem::take(&mut self.trajectories)
    }

    /// Return a slice view of all trajectories.
    pub fn as_slice(&self) -> &[Trajectory] {
        &self.trajectories
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn acted(obs: f32) -> TimeStep {
        TimeStep {
            observation: vec![obs],
            action: Some(vec![0.5]),
            reward: 1.0,
            done: false,
        }
    }

    #[test]
    fn test_empty_steps_do_not_make_a_trajectory() {
        assert!(Trajectory::from_steps(Vec::new()).is_none());
    }

    #[test]
    fn test_reset_only_trajectory_is_degenerate() {
        let t = Trajectory::from_steps(vec![TimeStep::initial(vec![0.0])]).unwrap();
        assert!(t.is_degenerate());
        assert_eq!(t.num_actions(), 0);
    }

    #[test]
    fn test_first_step_with_action_is_not_degenerate() {
        let t = Trajectory::from_steps(vec![acted(0.0), TimeStep::initial(vec![1.0])]).unwrap();
        assert!(!t.is_degenerate());
        assert_eq!(t.len(), 2);
        assert!((t.total_reward() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_only_first_step_decides_degeneracy() {
        let t = Trajectory::from_steps(vec![TimeStep::initial(vec![0.0]), acted(1.0)]).unwrap();
        assert!(t.is_degenerate());
    }

    #[test]
    fn test_ids_are_unique() {
        let a = Trajectory::from_steps(vec![acted(0.0)]).unwrap();
        let b = Trajectory::from_steps(vec![acted(0.0)]).unwrap();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_buffer_extend_keeps_arrival_order() {
        let first = Trajectory::from_steps(vec![acted(1.0)]).unwrap();
        let second = Trajectory::from_steps(vec![acted(2.0)]).unwrap();
        let third = Trajectory::from_steps(vec![acted(3.0)]).unwrap();

        let mut buffer = TrajectoryBuffer::new();
        buffer.extend(vec![first.clone()]);
        buffer.extend(vec![second.clone(), third.clone()]);

        let ids: Vec<_> = buffer.as_slice().iter().map(|t| t.id.clone()).collect();
        assert_eq!(ids, vec![first.id, second.id, third.id]);
    }

    #[test]
    fn test_buffer_drain_empties() {
        let mut buffer = TrajectoryBuffer::new();
        buffer.extend(vec![
            Trajectory::from_steps(vec![acted(0.0)]).unwrap(),
            Trajectory::from_steps(vec![acted(1.0)]).unwrap(),
        ]);
        assert_eq!(buffer.drain().len(), 2);
        assert!(buffer.is_empty());
    }
}
