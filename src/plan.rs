//! Execution planning: which paths go into which repository, under which host.
//!
//! Planning is pure: no I/O, no errors, and the same config always produces
//! the same plan.
//!
//! ```text
//! jobs ──group_by_host──▶ [ (host, [job…]) … ]
//!                               │
//!             for each declared repository, jobs_for_repository
//!                               ▼
//!                  [ PlanStep { host, repository, jobs } … ]
//! ```
//!
//! Each [`PlanStep`] becomes exactly one `restic backup` call.

use crate::{job::Job, repository::Repository};

/// Jobs sharing one host tag, in their original relative order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostGroup<'a> {
    /// `None` is the bucket for jobs without a host tag.
    pub host: Option<&'a str>,
    pub jobs: Vec<&'a Job>,
}

/// Group `jobs` by host tag.
///
/// Groups appear in order of the first job carrying each tag; within a group
/// jobs keep their input order.  Every job lands in exactly one group.
pub fn group_by_host(jobs: &[Job]) -> Vec<HostGroup<'_>> {
    let mut groups: Vec<HostGroup<'_>> = Vec::new();
    for job in jobs {
        let host = job.host.as_deref();
        match groups.iter_mut().find(|g| g.host == host) {
            Some(group) => group.jobs.push(job),
            None => groups.push(HostGroup {
                host,
                jobs: vec![job],
            }),
        }
    }
    groups
}

/// The jobs in `jobs` that target `repo`, order preserved.
pub fn jobs_for_repository<'a>(repo: &str, jobs: &[&'a Job]) -> Vec<&'a Job> {
    jobs.iter().copied().filter(|job| job.targets(repo)).collect()
}

/// One `restic backup` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanStep<'a> {
    pub host: Option<&'a str>,
    pub repository: &'a Repository,
    /// Jobs backed up by this step, in declaration order.
    pub jobs: Vec<&'a Job>,
}

impl<'a> PlanStep<'a> {
    /// Source paths for `restic backup`.
    pub fn paths(&self) -> Vec<&'a str> {
        self.jobs.iter().map(|j| j.path.as_str()).collect()
    }

    /// Label used in batch reports: `repo`, or `repo@host` for tagged groups.
    pub fn label(&self) -> String {
        match self.host {
            Some(host) => format!("{}@{host}", self.repository.name),
            None => self.repository.name.clone(),
        }
    }
}

/// Host groups × declared repositories, skipping empty combinations.
pub fn build_plan<'a>(repositories: &'a [Repository], jobs: &'a [Job]) -> Vec<PlanStep<'a>> {
    let mut steps = Vec::new();
    for group in group_by_host(jobs) {
        for repository in repositories {
            let jobs = jobs_for_repository(&repository.name, &group.jobs);
            if jobs.is_empty() {
                continue;
            }
            steps.push(PlanStep {
                host: group.host,
                repository,
                jobs,
            });
        }
    }
    steps
}

// ─── Tests ────────────────────────────────────────────────────────────────────
