//! Repository descriptors: where restic stores snapshots, and how to unlock it.
//!
//! A [`Repository`] is built once from a `[repo.<name>]` table and never
//! changes afterwards.  The two resolvers below are the only place where
//! configuration turns into engine input, and both run before any child
//! process is spawned:
//!
//! - [`Repository::resolve_location`] → the `-r` argument
//! - [`Repository::resolve_secret`]   → the `RESTIC_PASSWORD` value

use std::{env::VarError, fmt, path::PathBuf};

use crate::error::{ConfigError, RepositoryConfigError};

// ─── Access method ───────────────────────────────────────────────────────────

/// How restic reaches the repository.
///
/// Unknown strings are kept rather than rejected at load time so that a
/// single misconfigured repository fails on its own instead of taking the
/// whole config down with it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Method {
    #[default]
    Local,
    Sftp,
    Other(String),
}

impl From<String> for Method {
    fn from(s: String) -> Self {
        match s.as_str() {
            "local" => Self::Local,
            "sftp" => Self::Sftp,
            _ => Self::Other(s),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => f.write_str("local"),
            Self::Sftp => f.write_str("sftp"),
            Self::Other(s) => f.write_str(s),
        }
    }
}

// ─── Descriptor ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Repository {
    pub name: String,
    pub description: String,
    pub method: Method,
    pub path: Option<String>,
    /// Inline secret.  Wins over `password_env` when both are set.
    pub password: Option<String>,
    /// Name of an environment variable holding the secret.
    pub password_env: Option<String>,
    pub host: Option<String>,
    pub user: Option<String>,
    pub identity_file: Option<String>,
}

impl Repository {
    /// The repository secret.
    ///
    /// 1. `password` if set.
    /// 2. The value of the variable named by `password_env`.
    /// 3. Otherwise [`ConfigError::NoSecret`]; there is no built-in
    ///    fallback password.
    pub fn resolve_secret(&self) -> Result<String, ConfigError> {
        if let Some(password) = &self.password {
            return Ok(password.clone());
        }

        if let Some(var) = &self.password_env {
            return std::env::var(var).map_err(|e| match e {
                VarError::NotPresent => ConfigError::MissingSecretEnv {
                    repo: self.name.clone(),
                    var: var.clone(),
                },
                VarError::NotUnicode(_) => ConfigError::SecretEnvNotUnicode {
                    repo: self.name.clone(),
                    var: var.clone(),
                },
            });
        }

        Err(ConfigError::NoSecret {
            repo: self.name.clone(),
        })
    }

    /// The repository location as restic expects it after `-r`.
    ///
    /// ```text
    /// local  →  <path>
    /// sftp   →  sftp:<user>@<host>:<path>   (or sftp:<host>:<path>)
    /// ```
    ///
    /// Empty strings are treated the same as missing fields.
    pub fn resolve_location(&self) -> Result<String, RepositoryConfigError> {
        let path = || {
            non_empty(self.path.as_deref()).ok_or_else(|| RepositoryConfigError::MissingPath {
                repo: self.name.clone(),
                method: self.method.to_string(),
            })
        };

        match &self.method {
            Method::Local => Ok(path()?.to_string()),
            Method::Sftp => {
                let path = path()?;
                let host = non_empty(self.host.as_deref()).ok_or_else(|| {
                    RepositoryConfigError::MissingHost {
                        repo: self.name.clone(),
                    }
                })?;
                Ok(match non_empty(self.user.as_deref()) {
                    Some(user) => format!("sftp:{user}@{host}:{path}"),
                    None => format!("sftp:{host}:{path}"),
                })
            },
            Method::Other(method) => Err(RepositoryConfigError::UnsupportedMethod {
                repo: self.name.clone(),
                method: method.clone(),
            }),
        }
    }

    /// SSH identity file to hand to restic's sftp backend.
    ///
    /// Only sftp repositories use one; a leading `~/` is expanded against the
    /// current user's home directory.
    pub fn identity_file(&self) -> Option<PathBuf> {
        if self.method != Method::Sftp {
            return None;
        }
        non_empty(self.identity_file.as_deref()).map(expand_home)
    }
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !s.is_empty())
}

fn expand_home(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs_next::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
