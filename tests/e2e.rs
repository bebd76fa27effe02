//! End-to-end tests against a real `restic`.
//!
//! These tests spawn the real `backup-conductor` binary **and** call `restic`
//! directly to inspect the repositories it produced.
//!
//! # Running
//!
//! ```sh
//! # restic must be on PATH:
//! cargo test --test e2e -- --ignored
//!
//! # With a specific restic binary:
//! PATH="/path/to/restic:$PATH" cargo test --test e2e -- --ignored
//! ```
//!
//! Every test is `#[ignore]` so a plain `cargo test` stays green on machines
//! without restic, while the skip stays visible in the ignored count.
//!
//! # What is tested
//!
//! - `init` creates a local repository that restic can open.
//! - `check` passes on a freshly initialized repository and fails on a missing one.
//! - `backup` heals a repository that was never initialized and creates a snapshot.
//! - Host-tagged jobs produce snapshots carrying that hostname.
//! - Restored snapshots contain the source files.

use std::{
    fs,
    path::{Path, PathBuf},
    process::Command,
};

const BIN: &str = env!("CARGO_BIN_EXE_backup-conductor");
const PASSWORD: &str = "e2e-secret";

// ─── Fixture ──────────────────────────────────────────────────────────────────

/// Isolated source, repository and working directories.
struct Fixture {
    /// Everything lives under here; deleted on drop.
    _root: tempfile::TempDir,
    source_dir: PathBuf,
    repo_dir: PathBuf,
    work_dir: PathBuf,
}

impl Fixture {
    /// Build a small source tree and a config with one local repository and
    /// two jobs: one untagged, one tagged `e2e-host`.
    fn new(test_name: &str) -> Self {
        let root = tempfile::tempdir().unwrap();
        let source_dir = root.path().join("source");
        let repo_dir = root.path().join("repo");
        let work_dir = root.path().join("work");

        fs::create_dir_all(source_dir.join("subdir")).unwrap();
        fs::create_dir_all(source_dir.join("tagged")).unwrap();
        fs::create_dir_all(&work_dir).unwrap();

        fs::write(source_dir.join("hello.txt"), format!("hello from {test_name}")).unwrap();
        fs::write(source_dir.join("subdir").join("nested.txt"), "nested").unwrap();
        fs::write(source_dir.join("tagged").join("db.dump"), "tagged data").unwrap();

        let config = format!(
            r#"
[repo.local]
description = "e2e repository"
path        = "{repo}"
password    = "{PASSWORD}"

[backup.files]
path  = "{source}/subdir"
repos = ["local"]

[backup.database]
path  = "{source}/tagged"
repos = ["local"]
host  = "e2e-host"
"#,
            repo = repo_dir.display(),
            source = source_dir.display(),
        );
        fs::write(work_dir.join("backup.toml"), config).unwrap();

        Self {
            _root: root,
            source_dir,
            repo_dir,
            work_dir,
        }
    }

    /// Run `backup-conductor <sub> -c backup.toml <extra…>` in the working dir.
    fn run(&self, sub: &str, extra: &[&str]) -> (Option<i32>, String, String) {
        let out = Command::new(BIN)
            .arg(sub)
            .args(["-c", "backup.toml"])
            .args(extra)
            .current_dir(&self.work_dir)
            .env_remove("BACKUP_ENGINE")
            .env_remove("RESTIC_PASSWORD")
            .output()
            .unwrap_or_else(|e| panic!("failed to spawn {BIN}: {e}"));

        (
            out.status.code(),
            String::from_utf8_lossy(&out.stdout).into_owned(),
            String::from_utf8_lossy(&out.stderr).into_owned(),
        )
    }

    /// Run `restic` directly against this fixture's repository.
    fn restic(&self, args: &[&str]) -> (bool, String, String) {
        let out = Command::new("restic")
            .args(["-r", self.repo_dir.to_str().unwrap()])
            .args(args)
            .env("RESTIC_PASSWORD", PASSWORD)
            .output()
            .unwrap_or_else(|e| panic!("failed to spawn restic: {e}"));

        (
            out.status.success(),
            String::from_utf8_lossy(&out.stdout).into_owned(),
            String::from_utf8_lossy(&out.stderr).into_owned(),
        )
    }

    /// All snapshots as parsed JSON objects.
    fn snapshots(&self) -> Vec<serde_json::Value> {
        let (ok, stdout, _) = self.restic(&["snapshots", "--json"]);
        if !ok {
            return Vec::new();
        }
        match serde_json::from_str(&stdout) {
            Ok(serde_json::Value::Array(items)) => items,
            _ => Vec::new(),
        }
    }

    fn restore_latest(&self) -> tempfile::TempDir {
        let target = tempfile::tempdir().unwrap();
        let (ok, _, stderr) =
            self.restic(&["restore", "latest", "--target", target.path().to_str().unwrap()]);
        assert!(ok, "restic restore should succeed; stderr:\n{stderr}");
        target
    }
}

// ─── init / check ─────────────────────────────────────────────────────────────

#[ignore]
#[test]
fn init_creates_an_openable_repository() {
    let fx = Fixture::new("init");

    let (code, _, stderr) = fx.run("init", &[]);
    assert_eq!(code, Some(0), "init should succeed; stderr:\n{stderr}");
    assert!(fx.repo_dir.join("config").exists(), "restic config file missing");

    let (ok, _, stderr) = fx.restic(&["cat", "config"]);
    assert!(ok, "restic should open the repository; stderr:\n{stderr}");
}

#[ignore]
#[test]
fn second_init_is_a_partial_failure() {
    let fx = Fixture::new("reinit");

    fx.run("init", &[]);
    let (code, stdout, _) = fx.run("init", &[]);
    assert_eq!(code, Some(2), "restic refuses to init twice; stdout:\n{stdout}");
}

#[ignore]
#[test]
fn check_passes_after_init() {
    let fx = Fixture::new("check");

    fx.run("init", &[]);
    let (code, _, stderr) = fx.run("check", &[]);
    assert_eq!(code, Some(0), "check should succeed; stderr:\n{stderr}");
}

#[ignore]
#[test]
fn check_fails_on_a_missing_repository() {
    let fx = Fixture::new("check_missing");

    let (code, _, _) = fx.run("check", &[]);
    assert_eq!(code, Some(2));
}

// ─── backup ───────────────────────────────────────────────────────────────────

#[ignore]
#[test]
fn backup_heals_an_uninitialized_repository() {
    let fx = Fixture::new("heal");

    let (code, _, stderr) = fx.run("backup", &[]);
    assert_eq!(code, Some(0), "backup should succeed; stderr:\n{stderr}");
    assert_eq!(fx.snapshots().len(), 2, "one snapshot per host group");
}

#[ignore]
#[test]
fn tagged_jobs_are_recorded_under_their_host() {
    let fx = Fixture::new("hosts");

    fx.run("backup", &[]);
    let hosts: Vec<String> = fx
        .snapshots()
        .iter()
        .filter_map(|s| s["hostname"].as_str().map(str::to_string))
        .collect();
    assert!(
        hosts.iter().any(|h| h == "e2e-host"),
        "expected a snapshot for e2e-host; got {hosts:?}"
    );
}

#[ignore]
#[test]
fn second_backup_adds_snapshots() {
    let fx = Fixture::new("twice");

    fx.run("backup", &[]);
    fs::write(fx.source_dir.join("subdir").join("more.txt"), "more").unwrap();
    let (code, _, stderr) = fx.run("backup", &[]);

    assert_eq!(code, Some(0), "second backup should succeed; stderr:\n{stderr}");
    assert_eq!(fx.snapshots().len(), 4);
}

#[ignore]
#[test]
fn dry_run_leaves_no_repository_behind() {
    let fx = Fixture::new("dry_run");

    let (code, stdout, _) = fx.run("backup", &["--dry-run"]);
    assert_eq!(code, Some(0));
    assert!(stdout.contains("--host e2e-host"), "stdout:\n{stdout}");
    assert!(!fx.repo_dir.exists());
}

#[ignore]
#[test]
fn snapshot_contains_source_files() {
    let fx = Fixture::new("content");

    let (code, _, stderr) = fx.run("backup", &[]);
    assert_eq!(code, Some(0), "backup should succeed; stderr:\n{stderr}");

    let restore_dir = fx.restore_latest();
    let names: Vec<String> = walkdir(restore_dir.path())
        .iter()
        .filter_map(|p| p.file_name().and_then(|n| n.to_str()).map(str::to_string))
        .collect();

    assert!(
        names.iter().any(|n| n == "nested.txt" || n == "db.dump"),
        "restored snapshot should contain source files; found: {names:?}"
    );
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

/// Recursively collect all file paths under `root`.
fn walkdir(root: &Path) -> Vec<PathBuf> {
    let mut out = Vec::new();
    if let Ok(entries) = fs::read_dir(root) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                out.extend(walkdir(&path));
            } else {
                out.push(path);
            }
        }
    }
    out
}
