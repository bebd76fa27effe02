//! `backup-conductor check`: run `restic check` on every repository.
//!
//! Same shape as `init`: one attempt per repository, failures collected into
//! the [`BatchResult`] so the caller can tell exactly which checks failed.

use crate::{
    commands::{BatchKind, BatchResult, for_each_repository},
    config::Config,
    engine::Engine,
    error::EngineUnavailable,
    runner::EngineCommand,
};

pub fn run(cfg: &Config, engine: &dyn Engine) -> Result<BatchResult, EngineUnavailable> {
    for_each_repository(cfg, engine, BatchKind::Check, EngineCommand::Check)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        commands::fixtures::{local, scenario},
        engine::fake::FakeEngine,
    };

    #[test]
    fn checks_every_repository() {
        let engine = FakeEngine::new();
        let result = run(&scenario(), &engine).unwrap();

        assert_eq!(result.succeeded(), ["A", "B"]);
        assert_eq!(engine.count("A", EngineCommand::Check), 1);
        assert_eq!(engine.count("B", EngineCommand::Check), 1);
    }

    #[test]
    fn failed_checks_are_reported_not_healed() {
        let engine = FakeEngine::new().always_fail("A", EngineCommand::Check);
        let result = run(&scenario(), &engine).unwrap();

        assert_eq!(result.succeeded(), ["B"]);
        assert_eq!(result.failed()[0].0, "A");
        // check never tries to initialize; that is backup's job.
        assert_eq!(engine.count("A", EngineCommand::Init), 0);
    }

    #[test]
    fn missing_password_env_is_a_per_repository_failure() {
        let mut a = local("A", "/a");
        a.password = None;
        a.password_env = Some("BACKUP_CONDUCTOR_TEST_CHECK_NEVER_SET".into());
        let cfg = Config {
            repositories: vec![a, local("B", "/b")],
            jobs: vec![],
        };
        let engine = FakeEngine::new();

        let result = run(&cfg, &engine).unwrap();

        assert_eq!(result.succeeded(), ["B"]);
        assert!(result.failed()[0].1.contains("BACKUP_CONDUCTOR_TEST_CHECK_NEVER_SET"));
    }
}
