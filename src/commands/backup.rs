//! `backup-conductor backup`: run the backup plan.
//!
//! # Per-repository state machine
//!
//! The first time a run needs a repository it is brought to `Ready`:
//!
//! ```text
//! Unchecked ──check ok──────────────────────────────────────▶ Ready
//!     │
//!     └─check fails─▶ Initializing ──init──▶ Rechecking ──check ok──▶ Ready
//!                                                  └──check fails──▶ Failed
//! ```
//!
//! The outcome is remembered for the rest of the run, so a repository that
//! appears under several host groups is checked (and healed) only once.
//! Plan steps whose repository ended up `Failed` are skipped.
//!
//! A `Ready` repository gets one `restic backup` per plan step, carrying all
//! paths of that step plus `--host <tag>` for tagged groups.

use std::{
    collections::HashMap,
    io::{self, Write},
};

use console::style;

use crate::{
    commands::{BatchKind, BatchResult, StepError, attempt},
    config::Config,
    engine::Engine,
    error::{EngineUnavailable, UnitError},
    plan::{PlanStep, build_plan},
    repository::Repository,
    runner::{EngineCommand, Invocation, backup_args},
    ui,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Readiness {
    Ready,
    Failed,
}

pub fn run(cfg: &Config, engine: &dyn Engine) -> Result<BatchResult, EngineUnavailable> {
    let plan = build_plan(&cfg.repositories, &cfg.jobs);
    let mut result = BatchResult::default();
    let mut readiness: HashMap<&str, Readiness> = HashMap::new();

    if plan.is_empty() {
        tracing::warn!("no backup job targets any repository; nothing to do");
    }

    for step in &plan {
        let repo = step.repository;
        let state = match readiness.get(repo.name.as_str()) {
            Some(state) => *state,
            None => {
                let state = ensure_ready(engine, repo, &mut result)?;
                readiness.insert(repo.name.as_str(), state);
                state
            },
        };
        if state == Readiness::Failed {
            tracing::debug!(step = %step.label(), "skipping: repository not ready");
            continue;
        }

        let label = step.label();
        let args = backup_args(&step.paths(), step.host);
        match attempt(engine, repo, EngineCommand::Backup, args) {
            Ok(()) => {
                ui::print_unit_ok(BatchKind::Backup, &label);
                result.succeed(label);
            },
            Err(StepError::Unit(e)) => {
                tracing::warn!(step = %label, "{e}");
                ui::print_unit_failed(BatchKind::Backup, &label, &e);
                result.fail(label, &e);
            },
            Err(StepError::Fatal(e)) => return Err(e),
        }
    }

    Ok(result)
}

/// Check `repo`, initializing and re-checking it once if the first check
/// fails.  Records the repository as failed when it cannot be made ready.
fn ensure_ready(
    engine: &dyn Engine,
    repo: &Repository,
    result: &mut BatchResult,
) -> Result<Readiness, EngineUnavailable> {
    match attempt(engine, repo, EngineCommand::Check, Vec::new()) {
        Ok(()) => return Ok(Readiness::Ready),
        Err(StepError::Fatal(e)) => return Err(e),
        Err(StepError::Unit(UnitError::Engine(e))) => {
            tracing::info!(repo = %repo.name, "{e}");
            ui::print_healing(&repo.name);
        },
        // Initializing cannot fix a repository that does not resolve.
        Err(StepError::Unit(e)) => return Ok(not_ready(repo, &e, result)),
    }

    match attempt(engine, repo, EngineCommand::Init, Vec::new()) {
        Ok(()) => {},
        Err(StepError::Fatal(e)) => return Err(e),
        Err(StepError::Unit(e)) => tracing::warn!(repo = %repo.name, "{e}"),
    }

    match attempt(engine, repo, EngineCommand::Check, Vec::new()) {
        Ok(()) => Ok(Readiness::Ready),
        Err(StepError::Fatal(e)) => Err(e),
        Err(StepError::Unit(e)) => Ok(not_ready(repo, &e, result)),
    }
}

fn not_ready(repo: &Repository, err: &UnitError, result: &mut BatchResult) -> Readiness {
    tracing::warn!(repo = %repo.name, "repository not ready, skipping its backups: {err}");
    ui::print_unit_failed(BatchKind::Backup, &repo.name, err);
    result.fail(repo.name.as_str(), err);
    Readiness::Failed
}

// ─── Dry run ──────────────────────────────────────────────────────────────────

/// Print the plan and the restic command line of every step, without running
/// anything or resolving secrets.
pub fn dry_run(cfg: &Config, out: &mut dyn Write) -> io::Result<()> {
    let plan = build_plan(&cfg.repositories, &cfg.jobs);
    if plan.is_empty() {
        return writeln!(out, "  nothing to back up");
    }

    let mut current_host: Option<Option<&str>> = None;
    for step in &plan {
        if current_host != Some(step.host) {
            writeln!(out)?;
            writeln!(
                out,
                "  {} {}",
                style("host").dim(),
                style(step.host.unwrap_or("<none>")).bold()
            )?;
            current_host = Some(step.host);
        }
        writeln!(out, "    {}", describe_step(step))?;
        for job in &step.jobs {
            if job.description.is_empty() {
                writeln!(out, "      {} {}", style("·").dim(), job.name)?;
            } else {
                writeln!(
                    out,
                    "      {} {} {}",
                    style("·").dim(),
                    job.name,
                    style(&job.description).dim()
                )?;
            }
        }
    }
    writeln!(out)
}

fn describe_step(step: &PlanStep<'_>) -> String {
    let repo = step.repository;
    let name = if repo.description.is_empty() {
        repo.name.clone()
    } else {
        format!("{} ({})", repo.name, repo.description)
    };
    match repo.resolve_location() {
        Ok(location) => {
            let invocation = Invocation {
                repo: step.repository.name.clone(),
                location,
                secret: String::new(),
                command: EngineCommand::Backup,
                args: backup_args(&step.paths(), step.host),
                identity_file: step.repository.identity_file(),
            };
            format!("{name} → restic {}", invocation.argv().join(" "))
        },
        Err(e) => format!("{name} → {e}"),
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
