//! The learning-algorithm seam of the trainer.
//!
//! [`TrainerHooks`] is everything the [`TrainingLoop`](super::TrainingLoop)
//! calls but does not define. Each method has a default body that fails with
//! [`TrainerError::AbstractHookInvoked`], so a trainer that forgets to
//! provide a hook fails loudly the first time the loop reaches it instead of
//! silently skipping the step.

use std::path::Path;

use crate::env::EnvironmentBinding;
use crate::error::TrainerError;

pub trait TrainerHooks {
    /// Current epoch index. Advanced by [`TrainerHooks::train_epoch`].
    fn epoch(&self) -> Result<usize, TrainerError> {
        Err(TrainerError::AbstractHookInvoked("epoch"))
    }

    /// Train for one epoch against `envs.train_env_mut()` and advance the
    /// epoch counter.
    ///
    /// Implementations should check [`EnvironmentBinding::take_reset_pending`]
    /// before interacting, since the training environment may have been
    /// swapped.
    fn train_epoch(
        &mut self,
        _envs: &mut EnvironmentBinding,
        _evaluate: bool,
    ) -> Result<(), TrainerError> {
        Err(TrainerError::AbstractHookInvoked("train_epoch"))
    }

    /// Score the current policy against `envs.eval_env_mut()`.
    fn evaluate(&mut self, _envs: &mut EnvironmentBinding) -> Result<(), TrainerError> {
        Err(TrainerError::AbstractHookInvoked("evaluate"))
    }

    /// Persist a checkpoint under `output_dir`.
    fn save(&mut self, _output_dir: &Path) -> Result<(), TrainerError> {
        Err(TrainerError::AbstractHookInvoked("save"))
    }

    /// Persist a checkpoint if the trainer's schedule says so.
    fn maybe_save(&mut self, _output_dir: &Path) -> Result<(), TrainerError> {
        Err(TrainerError::AbstractHookInvoked("maybe_save"))
    }

    /// Write out any pending metrics under `output_dir`.
    fn flush_summaries(&mut self, _output_dir: &Path) -> Result<(), TrainerError> {
        Err(TrainerError::AbstractHookInvoked("flush_summaries"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::PointEnv;

    struct Bare;

    impl TrainerHooks for Bare {}

    #[test]
    fn test_every_default_hook_fails_with_its_name() {
        let mut hooks = Bare;
        let mut envs = EnvironmentBinding::new(
            Box::new(PointEnv::new("train", 2, 0)),
            Box::new(PointEnv::new("eval", 2, 1)),
        );
        let dir = Path::new("unused");

        let names: Vec<&'static str> = [
            hooks.epoch().map(|_| ()),
            hooks.train_epoch(&mut envs, true),
            hooks.evaluate(&mut envs),
            hooks.save(dir),
            hooks.maybe_save(dir),
            hooks.flush_summaries(dir),
        ]
        .into_iter()
        .map(|result| match result {
            Err(TrainerError::AbstractHookInvoked(name)) => name,
            other => panic!("expected AbstractHookInvoked, got {other:?}"),
        })
        .collect();

        assert_eq!(
            names,
            vec![
                "epoch",
                "train_epoch",
                "evaluate",
                "save",
                "maybe_save",
                "flush_summaries"
            ]
        );
    }
}
