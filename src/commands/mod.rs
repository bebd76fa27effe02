//! Subcommand handlers.
//!
//! Each file in this module corresponds to one user-facing command:
//!
//! | File          | Invocation                  | Description                          |
//! |---------------|-----------------------------|--------------------------------------|
//! | `init.rs`     | `backup-conductor init`     | `restic init` every repository       |
//! | `check.rs`    | `backup-conductor check`    | `restic check` every repository      |
//! | `backup.rs`   | `backup-conductor backup`   | Run the backup plan                  |
//!
//! Every handler is a batch: it visits all units in declaration order, keeps
//! going when one fails, and returns a [`BatchResult`].  The only thing that
//! stops a batch early is [`EngineUnavailable`].

pub mod backup;
pub mod check;
pub mod init;

use std::fmt;

use crate::{
    config::Config,
    engine::Engine,
    error::{EngineUnavailable, InvokeError, UnitError},
    repository::Repository,
    runner::{EngineCommand, Invocation},
    ui,
};

// ─── Batch result ─────────────────────────────────────────────────────────────

/// Outcome of one batch.
///
/// `succeeded` behaves like an ordered set; `failed` keeps one entry per
/// failure with its reason.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchResult {
    succeeded: Vec<String>,
    failed: Vec<(String, String)>,
}

impl BatchResult {
    pub fn succeed(&mut self, label: impl Into<String>) {
        let label = label.into();
        if !self.succeeded.contains(&label) {
            self.succeeded.push(label);
        }
    }

    pub fn fail(&mut self, label: impl Into<String>, reason: impl fmt::Display) {
        self.failed.push((label.into(), reason.to_string()));
    }

    pub fn succeeded(&self) -> &[String] {
        &self.succeeded
    }

    pub fn failed(&self) -> &[(String, String)] {
        &self.failed
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Which batch is running; drives the wording of console output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchKind {
    Init,
    Check,
    Backup,
}

impl BatchKind {
    /// Past tense, e.g. "Initialized".
    pub const fn done(self) -> &'static str {
        match self {
            Self::Init => "Initialized",
            Self::Check => "Checked",
            Self::Backup => "Backed up",
        }
    }

    /// Infinitive, e.g. "initialize".
    pub const fn verb(self) -> &'static str {
        match self {
            Self::Init => "initialize",
            Self::Check => "check",
            Self::Backup => "back up",
        }
    }

    /// Singular and plural name of a unit.
    pub const fn nouns(self) -> (&'static str, &'static str) {
        match self {
            Self::Init | Self::Check => ("repository", "repositories"),
            Self::Backup => ("target", "targets"),
        }
    }
}

// ─── Shared plumbing ──────────────────────────────────────────────────────────

/// Why a single engine call did not succeed.
#[derive(Debug)]
pub(crate) enum StepError {
    /// Scoped to this unit; the batch carries on.
    Unit(UnitError),
    /// The engine cannot run at all; the batch stops.
    Fatal(EngineUnavailable),
}

impl From<InvokeError> for StepError {
    fn from(e: InvokeError) -> Self {
        match e {
            InvokeError::Failed(e) => Self::Unit(e.into()),
            InvokeError::Unavailable(e) => Self::Fatal(e),
        }
    }
}

/// Resolve `repo` and run `command` on it with `args`.
pub(crate) fn attempt(
    engine: &dyn Engine,
    repo: &Repository,
    command: EngineCommand,
    args: Vec<String>,
) -> Result<(), StepError> {
    let invocation = Invocation::for_repository(repo, command)
        .map_err(StepError::Unit)?
        .with_args(args);
    engine.invoke(&invocation)?;
    Ok(())
}

/// Run `command` once on every repository, in declaration order.
pub(crate) fn for_each_repository(
    cfg: &Config,
    engine: &dyn Engine,
    kind: BatchKind,
    command: EngineCommand,
) -> Result<BatchResult, EngineUnavailable> {
    let mut result = BatchResult::default();
    for repo in &cfg.repositories {
        match attempt(engine, repo, command, Vec::new()) {
            Ok(()) => {
                ui::print_unit_ok(kind, &repo.name);
                result.succeed(repo.name.as_str());
            },
            Err(StepError::Unit(e)) => {
                tracing::warn!(repo = %repo.name, %command, "{e}");
                ui::print_unit_failed(kind, &repo.name, &e);
                result.fail(repo.name.as_str(), &e);
            },
            Err(StepError::Fatal(e)) => return Err(e),
        }
    }
    Ok(result)
}

// ─── Test fixtures ────────────────────────────────────────────────────────────
