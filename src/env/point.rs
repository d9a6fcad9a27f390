//! Point-mass reaching task.
//!
//! The agent controls a point in `dim` dimensions and is rewarded for
//! staying close to the origin. It is small enough to run thousands of
//! episodes per second, which makes it the default environment for smoke
//! runs of the trainer and for tests.

use anyhow::{bail, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::traits::{DType, Environment, Observation, Space, StepOutcome};
use crate::trajectory::{EpisodeTrajectories, TrajectoryStore};

/// Range the starting coordinates are drawn from.
const START_RANGE: f32 = 1.0;

/// An n-dimensional point-mass environment.
///
/// Observation: current position, `(dim,)` float32.
/// Action: displacement, `(dim,)` float32, clamped to `[-max_step, max_step]`.
/// Reward: negative Euclidean distance to the origin after the move.
/// The episode ends once the point is within `goal_radius` of the origin.
#[derive(Debug)]
pub struct PointEnv {
    name: String,
    action_space: Space,
    observation_space: Space,
    max_step: f32,
    goal_radius: f32,
    position: Vec<f32>,
    done: bool,
    rng: StdRng,
    trajectories: EpisodeTrajectories,
}

impl PointEnv {
    pub fn new(name: impl Into<String>, dim: usize, seed: u64) -> Self {
        let space = Space::new(vec![dim], DType::Float32);
        Self {
            name: name.into(),
            action_space: space.clone(),
            observation_space: space,
            max_step: 0.1,
            goal_radius: 0.05,
            position: vec![0.0; dim],
            done: true,
            rng: StdRng::seed_from_u64(seed),
            trajectories: EpisodeTrajectories::new(1),
        }
    }

    /// Override the per-step clamp and the goal radius.
    pub fn with_limits(mut self, max_step: f32, goal_radius: f32) -> Self {
        self.max_step = max_step;
        self.goal_radius = goal_radius;
        self
    }

    pub fn dim(&self) -> usize {
        self.position.len()
    }

    /// Whether the current episode has ended (or none was started yet).
    pub fn is_done(&self) -> bool {
        self.done
    }

    fn distance_to_goal(&self) -> f32 {
        self.position.iter().map(|x| x * x).sum::<f32>().sqrt()
    }
}

impl Environment for PointEnv {
    fn name(&self) -> &str {
        &self.name
    }

    fn action_space(&self) -> &Space {
        &self.action_space
    }

    fn observation_space(&self) -> &Space {
        &self.observation_space
    }

    fn trajectories(&mut self) -> &mut dyn TrajectoryStore {
        &mut self.trajectories
    }

    fn reset(&mut self) -> Result<Observation> {
        for x in self.position.iter_mut() {
            *x = self.rng.gen_range(-START_RANGE..=START_RANGE);
        }
        self.done = false;
        self.trajectories.reset(0, self.position.clone());
        Ok(self.position.clone())
    }

    fn step(&mut self, action: &[f32]) -> Result<StepOutcome> {
        if self.done {
            bail!("cannot step in a terminated episode; call reset first");
        }
        if action.len() != self.dim() {
            bail!(
                "action has {} elements, expected {}",
                action.len(),
                self.dim()
            );
        }

        for (x, a) in self.position.iter_mut().zip(action) {
            *x += a.clamp(-self.max_step, self.max_step);
        }
        let distance = self.distance_to_goal();
        let reward = -f64::from(distance);
        self.done = distance <= self.goal_radius;

        self.trajectories
            .step(0, action.to_vec(), self.position.clone(), reward, self.done);

        Ok(StepOutcome {
            observation: self.position.clone(),
            reward,
            done: self.done,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spaces_follow_dimension() {
        let env = PointEnv::new("point", 3, 0);
        assert_eq!(env.action_space(), &Space::new(vec![3], DType::Float32));
        assert_eq!(env.observation_space(), &Space::new(vec![3], DType::Float32));
    }

    #[test]
    fn test_step_before_reset_fails() {
        let mut env = PointEnv::new("point", 2, 0);
        assert!(env.step(&[0.0, 0.0]).is_err());
    }

    #[test]
    fn test_wrong_action_length_fails() {
        let mut env = PointEnv::new("point", 2, 0);
        env.reset().unwrap();
        assert!(env.step(&[0.0]).is_err());
    }

    #[test]
    fn test_moving_towards_origin_reaches_goal() {
        let mut env = PointEnv::new("point", 2, 7).with_limits(0.5, 0.05);
        let mut obs = env.reset().unwrap();
        let mut steps = 0;
        loop {
            let action: Vec<f32> = obs.iter().map(|x| -x).collect();
            let outcome = env.step(&action).unwrap();
            steps += 1;
            assert!(outcome.reward <= 0.0);
            if outcome.done {
                break;
            }
            obs = outcome.observation;
            assert!(steps < 100, "episode should terminate");
        }

        let completed = env.trajectories().completed_trajectories();
        assert_eq!(completed.len(), 1);
        assert_eq!(completed[0].len(), steps + 1);
        assert!(!completed[0].is_degenerate());
    }

    #[test]
    fn test_same_seed_same_start() {
        let mut a = PointEnv::new("a", 4, 42);
        let mut b = PointEnv::new("b", 4, 42);
        assert_eq!(a.reset().unwrap(), b.reset().unwrap());
    }
}
