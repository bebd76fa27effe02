//! Command argument construction helpers.
//!
//! This module is responsible for *building* restic invocations.  It does
//! **not** execute anything; process execution lives in [`crate::engine`].
//! Everything here is pure and unit-testable without spawning a child.
//!
//! # Secrets
//!
//! The repository password is carried on [`Invocation`] but never appears in
//! [`Invocation::argv`].  The engine hands it to restic through
//! [`PASSWORD_ENV`] so it does not show up in the process list.

use std::{fmt, path::PathBuf};

use crate::{error::UnitError, repository::Repository};

/// Environment variable restic reads the repository password from.
pub const PASSWORD_ENV: &str = "RESTIC_PASSWORD";

// ─── Subcommands ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineCommand {
    Init,
    Check,
    Backup,
}

impl EngineCommand {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Check => "check",
            Self::Backup => "backup",
        }
    }
}

impl fmt::Display for EngineCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Invocation ──────────────────────────────────────────────────────────────

/// One fully-resolved restic call.
#[derive(Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Repository name, for reporting.
    pub repo: String,
    /// Value passed to `-r`.
    pub location: String,
    pub secret: String,
    pub command: EngineCommand,
    /// Extra arguments after the subcommand.
    pub args: Vec<String>,
    pub identity_file: Option<PathBuf>,
}

impl Invocation {
    /// Resolve `repo` into an invocation of `command` with no extra args.
    ///
    /// Fails before anything is spawned if the location or the secret cannot
    /// be resolved.
    pub fn for_repository(repo: &Repository, command: EngineCommand) -> Result<Self, UnitError> {
        let location = repo.resolve_location()?;
        let secret = repo.resolve_secret()?;
        Ok(Self {
            repo: repo.name.clone(),
            location,
            secret,
            command,
            args: Vec::new(),
            identity_file: repo.identity_file(),
        })
    }

    #[must_use]
    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    /// Arguments passed to the restic executable:
    ///
    /// ```text
    /// -r <location> <subcommand> [args…] [-o sftp.args=-i <identity_file>]
    /// ```
    pub fn argv(&self) -> Vec<String> {
        let mut argv = vec![
            "-r".into(),
            self.location.clone(),
            self.command.as_str().into(),
        ];
        argv.extend(self.args.iter().cloned());
        if let Some(identity) = &self.identity_file {
            argv.extend(["-o".into(), sftp_identity_option(identity)]);
        }
        argv
    }
}

// Hand-written so the secret never ends up in logs or panic messages.
impl fmt::Debug for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Invocation")
            .field("repo", &self.repo)
            .field("location", &self.location)
            .field("secret", &"<redacted>")
            .field("command", &self.command)
            .field("args", &self.args)
            .field("identity_file", &self.identity_file)
            .finish()
    }
}

/// `sftp.args=-i <file>`, restic's way of passing an ssh key.
pub fn sftp_identity_option(identity: &std::path::Path) -> String {
    format!("sftp.args=-i {}", identity.display())
}

/// Extra arguments for `restic backup`: the source paths, then `--host <tag>`
/// when the plan step belongs to a tagged host group.
pub fn backup_args(paths: &[&str], host: Option<&str>) -> Vec<String> {
    let mut args: Vec<String> = paths.iter().map(|p| (*p).to_string()).collect();
    if let Some(host) = host {
        args.extend(["--host".into(), host.into()]);
    }
    args
}

// ─── Tests ────────────────────────────────────────────────────────────────────
