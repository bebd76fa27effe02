//! Command-line interface definition.
//!
//! All argument parsing lives here so the rest of the codebase can stay
//! agnostic to `clap`.  The `Cli` struct is parsed once in `main` and then
//! passed (by reference) into the command handlers.

use std::path::{Path, PathBuf};

use clap::{Args, Parser};

/// Top-level CLI arguments, shared across every subcommand.
#[derive(Parser, Debug)]
#[command(
    name    = "backup-conductor",
    about   = "Initialize, check and back up restic repositories from one config file",
    version,
    // Show a compact two-column help layout.
    help_template = "\
{before-help}{name} {version}
{about}

{usage-heading} {usage}

{all-args}{after-help}"
)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Subcommand,

    /// restic executable to invoke.
    ///
    /// Either a name looked up on `PATH` or an absolute path.  If it cannot
    /// be started the whole run aborts, since no later call could succeed.
    #[arg(long, global = true, env = "BACKUP_ENGINE", default_value = "restic")]
    pub engine: String,

    /// dotenv-style file to load before resolving repository passwords.
    ///
    /// Defaults to `.env` in the current directory when present.  Variables
    /// already set in the environment are not overridden.
    #[arg(long, global = true, value_name = "PATH")]
    pub env_file: Option<PathBuf>,

    /// Hide restic output behind a spinner; replay it only on failure.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Log debug diagnostics (including every restic command line) to stderr.
    ///
    /// `RUST_LOG` takes precedence when set.
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Options every subcommand needs.
#[derive(Args, Debug, PartialEq, Eq)]
pub struct ConfigArgs {
    /// Path to the configuration file.
    #[arg(short, long, value_name = "PATH")]
    pub config: PathBuf,
}

#[derive(Args, Debug, PartialEq, Eq)]
pub struct BackupArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Print the backup plan and restic command lines without running them.
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(clap::Subcommand, Debug, PartialEq, Eq)]
pub enum Subcommand {
    /// Run `restic init` on every declared repository.
    Init(ConfigArgs),

    /// Run `restic check` on every declared repository.
    Check(ConfigArgs),

    /// Back up every job into its repositories.
    ///
    /// Each repository is checked first; if the check fails it is
    /// initialized and checked once more before any backup runs.
    Backup(BackupArgs),
}

impl Subcommand {
    pub fn config_path(&self) -> &Path {
        match self {
            Self::Init(args) | Self::Check(args) => &args.config,
            Self::Backup(args) => &args.config.config,
        }
    }
}
