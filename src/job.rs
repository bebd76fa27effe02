//! Backup job descriptors.

/// One source path bound to the repositories it must be backed up into.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Job {
    pub name: String,
    pub description: String,
    /// Source path handed to `restic backup`.
    pub path: String,
    /// Logical host tag.  Used for grouping and forwarded as `--host`; it has
    /// nothing to do with [`crate::repository::Repository::host`].
    pub host: Option<String>,
    /// Destination repository names, in declaration order.
    pub repos: Vec<String>,
}

impl Job {
    pub fn targets(&self, repo: &str) -> bool {
        self.repos.iter().any(|r| r == repo)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn targets_matches_by_exact_name() {
        let job = Job {
            path: "/data/x".into(),
            repos: vec!["A".into(), "B".into()],
            ..Job::default()
        };
        assert!(job.targets("A"));
        assert!(job.targets("B"));
        assert!(!job.targets("a"));
        assert!(!job.targets("C"));
    }
}
