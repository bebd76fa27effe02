//! Error taxonomy.
//!
//! | Type                     | Scope                                         |
//! |--------------------------|-----------------------------------------------|
//! | [`ConfigError`]          | Bad or incomplete configuration               |
//! | [`RepositoryConfigError`]| Repository location cannot be built           |
//! | [`EngineError`]          | restic ran and exited non-zero                |
//! | [`EngineUnavailable`]    | restic could not be started at all (fatal)    |
//!
//! Everything except [`EngineUnavailable`] is scoped to a single repository
//! and is turned into a [`crate::commands::BatchResult`] failure by the
//! orchestrators.  Load-time [`ConfigError`]s are fatal because they happen
//! before any batch starts.

use thiserror::Error;

use crate::runner::EngineCommand;

// ─── Configuration ───────────────────────────────────────────────────────────

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("repository '{repo}': environment variable '{var}' is not set")]
    MissingSecretEnv { repo: String, var: String },

    #[error("repository '{repo}': environment variable '{var}' is not valid unicode")]
    SecretEnvNotUnicode { repo: String, var: String },

    #[error("repository '{repo}': no password configured (set `password` or `password_env`)")]
    NoSecret { repo: String },

    #[error("job '{job}' references undeclared repository '{repo}'")]
    UnknownRepository { job: String, repo: String },

    #[error("job '{job}' has an empty `path`")]
    EmptyJobPath { job: String },

    /// `@` separates repository and host in backup labels.
    #[error("repository name '{repo}' must not contain '@'")]
    InvalidRepositoryName { repo: String },
}

// ─── Repository location ─────────────────────────────────────────────────────

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryConfigError {
    #[error("no path set for {method} repository '{repo}'")]
    MissingPath { repo: String, method: String },

    #[error("no host set for sftp repository '{repo}'")]
    MissingHost { repo: String },

    #[error("repository '{repo}': unsupported access method '{method}'")]
    UnsupportedMethod { repo: String, method: String },
}

// ─── Engine ──────────────────────────────────────────────────────────────────

/// restic ran but exited non-zero.
///
/// `stdout`/`stderr` are only populated in captured (`--quiet`) mode; in live
/// mode the output already went straight to the terminal.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("restic {command} failed for repository '{repo}' ({})", describe_exit(.code))]
pub struct EngineError {
    pub command: EngineCommand,
    pub repo: String,
    pub stdout: String,
    pub stderr: String,
    /// `None` when the child was terminated by a signal.
    pub code: Option<i32>,
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "terminated by signal".into(),
    }
}

/// The engine executable could not be started.  No later invocation can
/// succeed either, so this aborts the whole run.
#[derive(Debug, Error)]
#[error("cannot run backup engine '{program}': {source}")]
pub struct EngineUnavailable {
    pub program: String,
    #[source]
    pub source: std::io::Error,
}

#[derive(Debug, Error)]
pub enum InvokeError {
    #[error(transparent)]
    Failed(#[from] EngineError),

    #[error(transparent)]
    Unavailable(#[from] EngineUnavailable),
}

// ─── Per-unit failure reason ─────────────────────────────────────────────────

/// Why a single unit of a batch failed.  Its `Display` text is what ends up
/// in the failure list.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UnitError {
    #[error(transparent)]
    Secret(#[from] ConfigError),

    #[error(transparent)]
    Location(#[from] RepositoryConfigError),

    #[error(transparent)]
    Engine(#[from] EngineError),
}
