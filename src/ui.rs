//! Terminal UI: spinners, per-unit result lines, and batch summaries.
//!
//! # Design goals
//!
//! - **Live by default.** restic output streams straight to the terminal; this module only prints a
//!   one-line banner before each call and a ✓/✗ line after it.
//! - **Quiet on request.** In captured mode a spinner owns the terminal while restic runs, and its
//!   output is replayed only if the command fails.
//! - **Testable without a terminal.** Summaries and plans render into any [`Write`], so tests can
//!   capture them in a `Vec<u8>`.

use std::{
    io::{self, Write},
    time::Duration,
};

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::{
    commands::{BatchKind, BatchResult},
    error::UnitError,
    runner::Invocation,
};

// ─── Icons ───────────────────────────────────────────────────────────────────

/// Braille spinner frames, the same style as indicatif's default.
static SPINNER_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";

fn icon_ok() -> console::StyledObject<&'static str> {
    style("✓").green().bold()
}
fn icon_err() -> console::StyledObject<&'static str> {
    style("✗").red().bold()
}
fn icon_done() -> console::StyledObject<&'static str> {
    style("✓").cyan().bold()
}
fn icon_run() -> console::StyledObject<&'static str> {
    style("▸").cyan()
}

// ─── Spinner ──────────────────────────────────────────────────────────────────

fn make_spinner(label: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("  {spinner:.cyan}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars(SPINNER_CHARS),
    );
    pb.set_message(format!("{}", style(label).dim()));
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

/// Run `f` behind a spinner labelled `label`, clearing it afterwards.
pub fn with_spinner<T>(label: &str, f: impl FnOnce() -> T) -> T {
    let spinner = make_spinner(label);
    let out = f();
    spinner.finish_and_clear();
    out
}

// ─── Per-unit lines ───────────────────────────────────────────────────────────

/// Banner printed before a live restic call.
pub fn print_running(invocation: &Invocation) {
    println!(
        "  {}  restic {} {}",
        icon_run(),
        style(invocation.command).bold(),
        style(&invocation.repo).dim()
    );
}

pub fn print_unit_ok(kind: BatchKind, label: &str) {
    println!("  {}  {} {}", icon_ok(), kind.done(), style(label).bold());
}

/// Print a failed unit, replaying whatever restic wrote if it was captured.
pub fn print_unit_failed(kind: BatchKind, label: &str, err: &UnitError) {
    println!(
        "  {}  Failed to {} {}",
        icon_err(),
        kind.verb(),
        style(label).bold()
    );
    eprintln!("  {} {}", style("Error:").red().bold(), err);

    if let UnitError::Engine(e) = err {
        if !e.stdout.is_empty() {
            eprintln!();
            eprintln!("  {} stdout:", style("►").dim());
            for line in e.stdout.lines() {
                eprintln!("    {line}");
            }
        }
        if !e.stderr.is_empty() {
            eprintln!();
            eprintln!("  {} stderr:", style("►").dim());
            for line in e.stderr.lines() {
                eprintln!("    {line}");
            }
        }
    }
}

/// Warning line for the self-healing path of `backup`.
pub fn print_healing(repo: &str) {
    println!(
        "  {}  Health check of {} failed, trying to initialize it",
        style("!").yellow().bold(),
        style(repo).bold()
    );
}

// ─── Summary banner ───────────────────────────────────────────────────────────

fn plural(n: usize, one: &'static str, many: &'static str) -> &'static str {
    if n == 1 { one } else { many }
}

/// Render the end-of-batch summary: every succeeded and failed unit by name.
pub fn render_summary(out: &mut dyn Write, kind: BatchKind, result: &BatchResult) -> io::Result<()> {
    let ok = result.succeeded();
    let failed = result.failed();
    let (one, many) = kind.nouns();

    writeln!(out)?;
    writeln!(
        out,
        "  {} {} {} {}: {}",
        icon_done(),
        kind.done(),
        ok.len(),
        plural(ok.len(), one, many),
        ok.join(", ")
    )?;
    if !failed.is_empty() {
        let names: Vec<&str> = failed.iter().map(|(name, _)| name.as_str()).collect();
        writeln!(
            out,
            "  {} Failed to {} {} {}: {}",
            icon_err(),
            kind.verb(),
            failed.len(),
            plural(failed.len(), one, many),
            names.join(", ")
        )?;
        for (name, reason) in failed {
            writeln!(out, "    {} {}: {}", icon_err(), style(name).red(), reason)?;
        }
    }
    writeln!(out)
}

pub fn print_summary(kind: BatchKind, result: &BatchResult) {
    let mut stdout = io::stdout().lock();
    if let Err(e) = render_summary(&mut stdout, kind, result) {
        tracing::warn!("could not write summary: {e}");
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
