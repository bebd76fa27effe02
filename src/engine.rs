//! Engine execution: the only place a restic child process is spawned.
//!
//! [`Engine`] is the seam between the orchestrators and the outside world.
//! [`ProcessEngine`] runs the real executable; tests use a recording fake.
//!
//! # Output modes
//!
//! - [`OutputMode::Live`] (default): restic inherits stdout/stderr so the operator sees progress as
//!   it happens.
//! - [`OutputMode::Captured`] (`--quiet`): output is buffered behind a spinner and only replayed
//!   when the command fails.

use std::process::{Command, Stdio};

use crate::{
    error::{EngineError, EngineUnavailable, InvokeError},
    runner::{Invocation, PASSWORD_ENV},
    ui,
};

pub trait Engine {
    /// Run one invocation to completion.
    ///
    /// A non-zero exit is [`InvokeError::Failed`]; failing to start the
    /// executable at all is [`InvokeError::Unavailable`].
    fn invoke(&self, invocation: &Invocation) -> Result<(), InvokeError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    #[default]
    Live,
    Captured,
}

/// Runs restic (or whatever `program` names) as a child process.
#[derive(Debug, Clone)]
pub struct ProcessEngine {
    program: String,
    mode: OutputMode,
}

impl ProcessEngine {
    pub fn new(program: impl Into<String>, mode: OutputMode) -> Self {
        Self {
            program: program.into(),
            mode,
        }
    }

    fn command(&self, invocation: &Invocation) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(invocation.argv())
            .env(PASSWORD_ENV, &invocation.secret);
        cmd
    }

    fn unavailable(&self, source: std::io::Error) -> EngineUnavailable {
        EngineUnavailable {
            program: self.program.clone(),
            source,
        }
    }
}

impl Engine for ProcessEngine {
    fn invoke(&self, invocation: &Invocation) -> Result<(), InvokeError> {
        tracing::debug!(
            program = %self.program,
            argv = ?invocation.argv(),
            "running engine"
        );

        let mut cmd = self.command(invocation);
        let (success, code, stdout, stderr) = match self.mode {
            OutputMode::Live => {
                ui::print_running(invocation);
                let status = cmd.status().map_err(|e| self.unavailable(e))?;
                (status.success(), status.code(), String::new(), String::new())
            },
            OutputMode::Captured => {
                let label = format!("restic {} · {}", invocation.command, invocation.repo);
                let output = ui::with_spinner(&label, || {
                    cmd.stdout(Stdio::piped()).stderr(Stdio::piped()).output()
                })
                .map_err(|e| self.unavailable(e))?;
                (
                    output.status.success(),
                    output.status.code(),
                    String::from_utf8_lossy(&output.stdout).into_owned(),
                    String::from_utf8_lossy(&output.stderr).into_owned(),
                )
            },
        };

        if success {
            return Ok(());
        }

        tracing::debug!(repo = %invocation.repo, command = %invocation.command, ?code, "engine failed");
        Err(EngineError {
            command: invocation.command,
            repo: invocation.repo.clone(),
            stdout,
            stderr,
            code,
        }
        .into())
    }
}

// ─── Test double ──────────────────────────────────────────────────────────────

/// Records every invocation and fails on demand.
#[cfg(test)]
pub mod fake {
    use std::{cell::RefCell, collections::HashMap};

    use super::Engine;
    use crate::{
        error::{EngineError, EngineUnavailable, InvokeError},
        runner::{EngineCommand, Invocation},
    };

    /// One recorded call: repository, subcommand, extra args.
    pub type Call = (String, EngineCommand, Vec<String>);

    #[derive(Default)]
    pub struct FakeEngine {
        calls: RefCell<Vec<Call>>,
        /// Remaining failures per (repo, command).
        failures: RefCell<HashMap<(String, EngineCommand), usize>>,
        missing: bool,
    }

    impl FakeEngine {
        pub fn new() -> Self {
            Self::default()
        }

        /// An engine whose executable "does not exist".
        pub fn missing() -> Self {
            Self {
                missing: true,
                ..Self::default()
            }
        }

        /// Fail `command` on `repo` every time.
        pub fn always_fail(self, repo: &str, command: EngineCommand) -> Self {
            self.fail_times(repo, command, usize::MAX)
        }

        /// Fail `command` on `repo` for the first `times` calls.
        pub fn fail_times(self, repo: &str, command: EngineCommand, times: usize) -> Self {
            self.failures
                .borrow_mut()
                .insert((repo.to_string(), command), times);
            self
        }

        pub fn calls(&self) -> Vec<Call> {
            self.calls.borrow().clone()
        }

        pub fn count(&self, repo: &str, command: EngineCommand) -> usize {
            self.calls
                .borrow()
                .iter()
                .filter(|(r, c, _)| r == repo && *c == command)
                .count()
        }
    }

    impl Engine for FakeEngine {
        fn invoke(&self, invocation: &Invocation) -> Result<(), InvokeError> {
            if self.missing {
                return Err(EngineUnavailable {
                    program: "restic".into(),
                    source: std::io::Error::from(std::io::ErrorKind::NotFound),
                }
                .into());
            }

            self.calls.borrow_mut().push((
                invocation.repo.clone(),
                invocation.command,
                invocation.args.clone(),
            ));

            let key = (invocation.repo.clone(), invocation.command);
            let mut failures = self.failures.borrow_mut();
            match failures.get_mut(&key) {
                Some(remaining) if *remaining > 0 => {
                    *remaining = remaining.saturating_sub(1);
                    Err(EngineError {
                        command: invocation.command,
                        repo: invocation.repo.clone(),
                        stdout: String::new(),
                        stderr: "Fatal: simulated failure".into(),
                        code: Some(1),
                    }
                    .into())
                },
                _ => Ok(()),
            }
        }
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
