//! Active training/evaluation environments and the compatibility check that
//! guards hot-swapping the training environment.

use tracing::info;

use super::traits::{Environment, Space};
use crate::error::TrainerError;

/// Holds the current training and evaluation environments.
///
/// The action and observation spaces of the first training environment become
/// the reference spaces. Every environment bound afterwards must match them
/// exactly. The evaluation environment is fixed at construction and is not
/// checked.
pub struct EnvironmentBinding {
    train_env: Box<dyn Environment>,
    eval_env: Box<dyn Environment>,
    action_space: Space,
    observation_space: Space,
    reset_pending: bool,
}

impl EnvironmentBinding {
    /// Bind the first training environment (adopting its spaces) and the
    /// evaluation environment.
    pub fn new(train_env: Box<dyn Environment>, eval_env: Box<dyn Environment>) -> Self {
        let action_space = train_env.action_space().clone();
        let observation_space = train_env.observation_space().clone();
        info!(
            env = train_env.name(),
            action_space = %action_space,
            observation_space = %observation_space,
            "Bound initial training environment"
        );
        Self {
            train_env,
            eval_env,
            action_space,
            observation_space,
            reset_pending: true,
        }
    }

    /// Replace the training environment and return the previous one.
    ///
    /// Fails with [`TrainerError::IncompatibleEnvironment`] if either space
    /// differs from the reference in shape or element type; the current
    /// environment is kept in that case.
    pub fn bind(
        &mut self,
        new_env: Box<dyn Environment>,
    ) -> Result<Box<dyn Environment>, TrainerError> {
        check_space("observation_space", &self.observation_space, new_env.observation_space())?;
        check_space("action_space", &self.action_space, new_env.action_space())?;

        info!(
            previous = self.train_env.name(),
            env = new_env.name(),
            "Swapped training environment"
        );
        self.reset_pending = true;
        Ok(std::mem::replace(&mut self.train_env, new_env))
    }

    pub fn train_env(&self) -> &dyn Environment {
        self.train_env.as_ref()
    }

    pub fn train_env_mut(&mut self) -> &mut dyn Environment {
        self.train_env.as_mut()
    }

    pub fn eval_env(&self) -> &dyn Environment {
        self.eval_env.as_ref()
    }

    pub fn eval_env_mut(&mut self) -> &mut dyn Environment {
        self.eval_env.as_mut()
    }

    /// Reference action space, taken from the first training environment.
    pub fn action_space(&self) -> &Space {
        &self.action_space
    }

    /// Reference observation space, taken from the first training environment.
    pub fn observation_space(&self) -> &Space {
        &self.observation_space
    }

    /// Whether the training environment must start from a fresh episode
    /// before the next interaction.
    pub fn reset_pending(&self) -> bool {
        self.reset_pending
    }

    /// Read and clear the reset-pending flag.
    pub fn take_reset_pending(&mut self) -> bool {
        std::mem::take(&mut self.reset_pending)
    }
}

fn check_space(name: &'static str, expected: &Space, found: &Space) -> Result<(), TrainerError> {
    if expected.is_compatible(found) {
        Ok(())
    } else {
        Err(TrainerError::IncompatibleEnvironment {
            space: name,
            expected: expected.clone(),
            found: found.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::traits::{DType, Observation, StepOutcome};
    use crate::trajectory::{EpisodeTrajectories, TrajectoryStore};

    /// An environment that only exposes its spaces.
    struct ShapeOnlyEnv {
        name: String,
        action_space: Space,
        observation_space: Space,
        trajectories: EpisodeTrajectories,
    }

    impl ShapeOnlyEnv {
        fn boxed(name: &str, action: Space, observation: Space) -> Box<dyn Environment> {
            Box::new(Self {
                name: name.to_string(),
                action_space: action,
                observation_space: observation,
                trajectories: EpisodeTrajectories::new(1),
            })
        }
    }

    impl Environment for ShapeOnlyEnv {
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

        fn reset(&mut self) -> anyhow::Result<Observation> {
            Ok(vec![0.0; self.observation_space.flat_len()])
        }

        fn step(&mut self, _action: &[f32]) -> anyhow::Result<StepOutcome> {
            anyhow::bail!("shape-only environment cannot step")
        }
    }

    fn f32_space(dim: usize) -> Space {
        Space::new(vec![dim], DType::Float32)
    }

    fn binding() -> EnvironmentBinding {
        EnvironmentBinding::new(
            ShapeOnlyEnv::boxed("first", f32_space(4), f32_space(3)),
            ShapeOnlyEnv::boxed("eval", f32_space(4), f32_space(3)),
        )
    }

    #[test]
    fn test_first_env_sets_reference_spaces() {
        let b = binding();
        assert_eq!(b.action_space(), &f32_space(4));
        assert_eq!(b.observation_space(), &f32_space(3));
        assert!(b.reset_pending());
    }

    #[test]
    fn test_mismatched_action_shape_is_rejected() {
        let mut b = binding();
        let err = b
            .bind(ShapeOnlyEnv::boxed("wide", f32_space(6), f32_space(3)))
            .err()
            .unwrap();
        match err {
            TrainerError::IncompatibleEnvironment { space, expected, found } => {
                assert_eq!(space, "action_space");
                assert_eq!(expected, f32_space(4));
                assert_eq!(found, f32_space(6));
            }
            other => panic!("expected IncompatibleEnvironment, got: {other}"),
        }
        assert_eq!(b.train_env().name(), "first");
    }

    #[test]
    fn test_mismatched_dtype_is_rejected() {
        let mut b = binding();
        let ints = Space::new(vec![4], DType::Int32);
        let result = b.bind(ShapeOnlyEnv::boxed("ints", ints, f32_space(3)));
        assert!(matches!(
            result,
            Err(TrainerError::IncompatibleEnvironment { space: "action_space", .. })
        ));
    }

    #[test]
    fn test_mismatched_observation_space_is_rejected() {
        let mut b = binding();
        let result = b.bind(ShapeOnlyEnv::boxed("obs", f32_space(4), f32_space(5)));
        assert!(matches!(
            result,
            Err(TrainerError::IncompatibleEnvironment { space: "observation_space", .. })
        ));
    }

    #[test]
    fn test_compatible_env_replaces_current_and_requests_reset() {
        let mut b = binding();
        assert!(b.take_reset_pending());
        assert!(!b.reset_pending());

        let previous = b
            .bind(ShapeOnlyEnv::boxed("second", f32_space(4), f32_space(3)))
            .unwrap();
        assert_eq!(previous.name(), "first");
        assert_eq!(b.train_env().name(), "second");
        assert!(b.reset_pending());
        // The eval env is untouched.
        assert_eq!(b.eval_env().name(), "eval");
    }
}
