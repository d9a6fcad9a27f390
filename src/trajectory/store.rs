//! Per-environment trajectory recording.
//!
//! The [`TrajectoryStore`] trait is the capability the shard writer relies on:
//! read the completed set, force-complete whatever is still open, and clear
//! the completed set once it has been copied out. [`EpisodeTrajectories`] is
//! the implementation environments in this crate use.

use tracing::debug;

use super::types::{TimeStep, Trajectory};

/// What the shard writer needs from an environment's trajectory storage.
pub trait TrajectoryStore {
    /// Trajectories whose episodes have finished, oldest first.
    fn completed_trajectories(&self) -> &[Trajectory];

    /// Close every open episode and move it to the completed set.
    fn complete_all_trajectories(&mut self);

    /// Forget the completed set.
    fn clear_completed_trajectories(&mut self);
}

/// Records `batch_size` independent episode slots.
#[derive(Debug, Clone)]
pub struct EpisodeTrajectories {
    open: Vec<Vec<TimeStep>>,
    completed: Vec<Trajectory>,
}

impl EpisodeTrajectories {
    pub fn new(batch_size: usize) -> Self {
        Self {
            open: vec![Vec::new(); batch_size],
            completed: Vec::new(),
        }
    }

    pub fn batch_size(&self) -> usize {
        self.open.len()
    }

    /// Number of time steps in the open episode of slot `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= batch_size()`.
    pub fn open_len(&self, index: usize) -> usize {
        self.open[index].len()
    }

    /// Start a new episode in slot `index`. A non-empty open episode in that
    /// slot is completed first.
    ///
    /// # Panics
    ///
    /// Panics if `index >= batch_size()`.
    pub fn reset(&mut self, index: usize, observation: Vec<f32>) {
        self.complete(index);
        self.open[index].push(TimeStep::initial(observation));
    }

    /// Record `action` on the last open step of slot `index` and append the
    /// resulting step. The episode is completed when `done` is set.
    ///
    /// Stepping a slot with no open episode starts one implicitly from the
    /// action's resulting observation.
    ///
    /// # Panics
    ///
    /// Panics if `index >= batch_size()`.
    pub fn step(
        &mut self,
        index: usize,
        action: Vec<f32>,
        observation: Vec<f32>,
        reward: f64,
        done: bool,
    ) {
        let slot = &mut self.open[index];
        if let Some(last) = slot.last_mut() {
            last.action = Some(action);
        }
        slot.push(TimeStep {
            observation,
            action: None,
            reward,
            done,
        });
        if done {
            self.complete(index);
        }
    }

    fn complete(&mut self, index: usize) {
        let steps = std::mem::take(&mut self.open[index]);
        if let Some(trajectory) = Trajectory::from_steps(steps) {
            debug!(
                slot = index,
                steps = trajectory.len(),
                "Completed trajectory"
            );
            self.completed.push(trajectory);
        }
    }
}

impl TrajectoryStore for EpisodeTrajectories {
    fn completed_trajectories(&self) -> &[Trajectory] {
        &self.completed
    }

    fn complete_all_trajectories(&mut self) {
        for index in 0..self.open.len() {
            self.complete(index);
        }
    }

    fn clear_completed_trajectories(&mut self) {
        self.completed.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_done_step_completes_episode() {
        let mut store = EpisodeTrajectories::new(1);
        store.reset(0, vec![0.0]);
        store.step(0, vec![1.0], vec![1.0], 0.5, false);
        store.step(0, vec![1.0], vec![2.0], 1.0, true);

        let completed = store.completed_trajectories();
        assert_eq!(completed.len(), 1);
        let t = &completed[0];
        assert_eq!(t.len(), 3);
        assert!(!t.is_degenerate());
        assert_eq!(t.time_steps[0].action, Some(vec![1.0]));
        assert!(t.time_steps[2].action.is_none());
        assert!(t.time_steps[2].done);
        assert_eq!(store.open_len(0), 0);
    }

    #[test]
    fn test_reset_completes_open_episode() {
        let mut store = EpisodeTrajectories::new(1);
        store.reset(0, vec![0.0]);
        store.step(0, vec![1.0], vec![1.0], 0.0, false);
        store.reset(0, vec![5.0]);

        assert_eq!(store.completed_trajectories().len(), 1);
        assert_eq!(store.open_len(0), 1);
    }

    #[test]
    fn test_complete_all_includes_freshly_reset_slots() {
        let mut store = EpisodeTrajectories::new(2);
        store.reset(0, vec![0.0]);
        store.step(0, vec![1.0], vec![1.0], 0.0, false);
        store.reset(1, vec![0.0]);

        store.complete_all_trajectories();
        let completed = store.completed_trajectories();
        assert_eq!(completed.len(), 2);
        assert!(!completed[0].is_degenerate());
        assert!(completed[1].is_degenerate());
        assert_eq!(store.open_len(0), 0);
        assert_eq!(store.open_len(1), 0);
    }

    #[test]
    fn test_complete_all_skips_empty_slots() {
        let mut store = EpisodeTrajectories::new(3);
        store.complete_all_trajectories();
        assert!(store.completed_trajectories().is_empty());
    }

    #[test]
    fn test_clear_forgets_completed_but_not_open() {
        let mut store = EpisodeTrajectories::new(1);
        store.reset(0, vec![0.0]);
        store.step(0, vec![1.0], vec![1.0], 0.0, true);
        store.reset(0, vec![0.0]);

        store.clear_completed_trajectories();
        assert!(store.completed_trajectories().is_empty());
        assert_eq!(store.open_len(0), 1);
    }

    #[test]
    #[should_panic]
    fn test_out_of_range_slot_panics() {
        let mut store = EpisodeTrajectories::new(1);
        store.reset(1, vec![0.0]);
    }
}
