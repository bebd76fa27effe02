//! `backup-conductor`: drive restic repositories and backup jobs from one TOML file.
//!
//! # Overview
//!
//! This binary is a thin orchestration layer around [`restic`](https://restic.net).
//! A config file declares repositories (`[repo.<name>]`) and backup jobs
//! (`[backup.<name>]`); each subcommand turns that into a batch of restic
//! calls and reports which ones failed.
//!
//! # Usage
//!
//! ```text
//! backup-conductor init   -c backup.toml            # restic init every repository
//! backup-conductor check  -c backup.toml            # restic check every repository
//! backup-conductor backup -c backup.toml            # run every job
//! backup-conductor backup -c backup.toml --dry-run  # show the plan only
//! ```
//!
//! # Exit codes
//!
//! | Code | Meaning                                                    |
//! |------|------------------------------------------------------------|
//! | 0    | Every unit of the batch succeeded                          |
//! | 1    | Fatal: bad config, unreadable env file, restic unavailable |
//! | 2    | The batch ran, but at least one unit failed                |
//!
//! # Module layout
//!
//! | Module                   | Responsibility                              |
//! |--------------------------|---------------------------------------------|
//! | [`cli`]                  | Argument types parsed by clap               |
//! | [`config`]               | TOML loading and validation                 |
//! | [`repository`]           | Repository descriptors, location + secret   |
//! | [`job`]                  | Backup job descriptors                      |
//! | [`plan`]                 | Host grouping and per-repository planning   |
//! | [`runner`]               | restic argument construction                |
//! | [`engine`]               | Spawning restic                             |
//! | [`commands`]             | `init` / `check` / `backup` batches         |
//! | [`ui`]                   | Spinner, result lines, summaries            |
//! | [`error`]                | Error taxonomy                              |

mod cli;
mod commands;
mod config;
mod engine;
mod error;
mod job;
mod plan;
mod repository;
mod runner;
mod ui;

use std::{path::Path, process::ExitCode};

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Subcommand};
use commands::BatchKind;
use engine::{OutputMode, ProcessEngine};
use tracing_subscriber::EnvFilter;

/// Exit code for a batch that finished with at least one failed unit.
const EXIT_PARTIAL_FAILURE: u8 = 2;

/// Loaded from the working directory when `--env-file` is not given.
const DEFAULT_ENV_FILE: &str = ".env";

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    load_env_file(cli.env_file.as_deref())?;
    let cfg = config::load_config(cli.command.config_path())?;

    let mode = if cli.quiet {
        OutputMode::Captured
    } else {
        OutputMode::Live
    };
    let engine = ProcessEngine::new(&cli.engine, mode);

    println!();
    let (kind, result) = match &cli.command {
        // ── init ──────────────────────────────────────────────────────────────
        Subcommand::Init(_) => (BatchKind::Init, commands::init::run(&cfg, &engine)?),

        // ── check ─────────────────────────────────────────────────────────────
        Subcommand::Check(_) => (BatchKind::Check, commands::check::run(&cfg, &engine)?),

        // ── backup ────────────────────────────────────────────────────────────
        Subcommand::Backup(args) if args.dry_run => {
            commands::backup::dry_run(&cfg, &mut std::io::stdout().lock())
                .context("writing plan")?;
            return Ok(ExitCode::SUCCESS);
        },
        Subcommand::Backup(_) => (BatchKind::Backup, commands::backup::run(&cfg, &engine)?),
    };

    ui::print_summary(kind, &result);

    Ok(if result.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(EXIT_PARTIAL_FAILURE)
    })
}

/// Diagnostics go to stderr; `RUST_LOG` overrides the default level.
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Merge a dotenv file into the process environment.
///
/// An explicit `--env-file` must exist.  Without one, `.env` in the current
/// directory is loaded if present and silently skipped otherwise.  Parent
/// directories are never searched.
fn load_env_file(path: Option<&Path>) -> Result<()> {
    match path {
        Some(path) => {
            dotenvy::from_path(path)
                .with_context(|| format!("loading env file {}", path.display()))?;
            tracing::debug!("loaded env file {}", path.display());
        },
        None => match dotenvy::from_path(DEFAULT_ENV_FILE) {
            Ok(()) => tracing::debug!("loaded env file {DEFAULT_ENV_FILE}"),
            Err(e) if e.not_found() => {},
            Err(e) => return Err(e).context("loading .env"),
        },
    }
    Ok(())
}
