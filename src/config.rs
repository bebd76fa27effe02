//! Configuration types and loading logic.
//!
//! The file is parsed in two steps:
//!
//! 1. serde deserialises the TOML into [`RawConfig`], a 1-to-1 mirror of the file.  Unknown keys
//!    are rejected at this point.
//! 2. [`RawConfig::validate`] turns it into the immutable [`Config`] the rest of the program works
//!    with, checking cross-references between jobs and repositories.
//!
//! # File format
//!
//! ```toml
//! [repo.local-disk]
//! description  = "USB disk"
//! method       = "local"            # default
//! path         = "/mnt/usb/restic"
//! password_env = "USB_RESTIC_PASSWORD"
//!
//! [repo.offsite]
//! method        = "sftp"
//! host          = "backup.example.org"
//! user          = "restic"          # optional
//! path          = "/srv/restic"
//! password      = "hunter2"
//! identity_file = "~/.ssh/backup"   # optional
//!
//! [backup.documents]
//! path  = "/home/alice/Documents"
//! repos = ["local-disk", "offsite"]
//!
//! [backup.web-root]
//! path  = "/var/www"
//! host  = "web01"                   # optional; forwarded as --host
//! repos = ["offsite"]
//! ```
//!
//! Repositories and jobs keep the order in which they appear in the file;
//! that order drives every batch.

use std::{fmt, marker::PhantomData, path::Path};

use anyhow::{Context, Result};
use serde::{
    Deserialize, Deserializer,
    de::{MapAccess, Visitor},
};

use crate::{error::ConfigError, job::Job, repository::Repository};

// ─── Validated config ─────────────────────────────────────────────────────────

/// Everything a batch needs, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Config {
    pub repositories: Vec<Repository>,
    pub jobs: Vec<Job>,
}

// ─── Raw file mirror ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct RawConfig {
    /// `[repo.<name>]` tables.
    #[serde(default, deserialize_with = "ordered_tables")]
    pub repo: Vec<(String, RepoConfig)>,

    /// `[backup.<name>]` tables.
    #[serde(default, deserialize_with = "ordered_tables")]
    pub backup: Vec<(String, JobConfig)>,
}

/// One `[repo.<name>]` table.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RepoConfig {
    #[serde(default)]
    pub description: String,

    /// `local` or `sftp`.  Anything else is accepted here and rejected when
    /// the repository is used.
    #[serde(default = "default_method")]
    pub method: String,

    pub path: Option<String>,
    pub password: Option<String>,
    pub password_env: Option<String>,
    pub host: Option<String>,
    pub user: Option<String>,
    pub identity_file: Option<String>,
}

/// One `[backup.<name>]` table.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JobConfig {
    pub path: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub host: Option<String>,

    #[serde(default)]
    pub repos: Vec<String>,
}

fn default_method() -> String {
    "local".into()
}

// ─── Ordered tables ───────────────────────────────────────────────────────────

/// Deserialise a table of named sub-tables into `(name, value)` pairs,
/// keeping the order of the source document.
fn ordered_tables<'de, D, T>(deserializer: D) -> Result<Vec<(String, T)>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    struct Entries<T>(PhantomData<T>);

    impl<'de, T: Deserialize<'de>> Visitor<'de> for Entries<T> {
        type Value = Vec<(String, T)>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a table of named tables")
        }

        fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
            let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some(entry) = map.next_entry::<String, T>()? {
                entries.push(entry);
            }
            Ok(entries)
        }
    }

    deserializer.deserialize_map(Entries(PhantomData))
}

// ─── Validation ───────────────────────────────────────────────────────────────

impl RawConfig {
    /// Build the immutable [`Config`].
    ///
    /// Fails when a repository name contains `@`, or when a job has an empty
    /// `path` or names a repository that is not declared.  Per-repository
    /// problems (missing path, missing secret, ...) are left for the
    /// resolvers so they only affect that one repository.
    pub fn validate(self) -> Result<Config, ConfigError> {
        if let Some((name, _)) = self.repo.iter().find(|(name, _)| name.contains('@')) {
            return Err(ConfigError::InvalidRepositoryName { repo: name.clone() });
        }

        let repositories: Vec<Repository> = self
            .repo
            .into_iter()
            .map(|(name, r)| Repository {
                name,
                description: r.description,
                method: r.method.into(),
                path: r.path,
                password: r.password,
                password_env: r.password_env,
                host: r.host,
                user: r.user,
                identity_file: r.identity_file,
            })
            .collect();

        let mut jobs = Vec::with_capacity(self.backup.len());
        for (name, j) in self.backup {
            if j.path.is_empty() {
                return Err(ConfigError::EmptyJobPath { job: name });
            }
            if let Some(unknown) = j
                .repos
                .iter()
                .find(|r| !repositories.iter().any(|repo| &repo.name == *r))
            {
                return Err(ConfigError::UnknownRepository {
                    job: name,
                    repo: unknown.clone(),
                });
            }
            if j.repos.is_empty() {
                tracing::warn!(job = %name, "backup job targets no repositories");
            }
            jobs.push(Job {
                name,
                description: j.description,
                path: j.path,
                host: j.host.filter(|h| !h.is_empty()),
                repos: j.repos,
            });
        }

        Ok(Config { repositories, jobs })
    }
}

// ─── Loader ───────────────────────────────────────────────────────────────────

/// Parse and validate config text.
pub fn parse_config(text: &str) -> Result<Config> {
    let raw: RawConfig = toml::from_str(text).context("invalid configuration")?;
    Ok(raw.validate()?)
}

/// Read, parse and validate the config file at `path`.
///
/// Unlike a missing env file, a missing config file is always an error:
/// there is nothing sensible to back up without one.
pub fn load_config(path: &Path) -> Result<Config> {
    let text =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;

    let cfg = parse_config(&text).with_context(|| format!("parsing {}", path.display()))?;
    tracing::debug!(
        repositories = cfg.repositories.len(),
        jobs = cfg.jobs.len(),
        "loaded {}",
        path.display()
    );
    Ok(cfg)
}

// ─── Tests ────────────────────────────────────────────────────────────────────
