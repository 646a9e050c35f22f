//! Development automation for the KRA Connect workspace.
//!
//! Run with: `cargo xtask <task>`
//!
//! Output goes straight to the terminal, so `println!` and `eprintln!` are
//! used instead of tracing.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::env;
use std::process::{Command, ExitCode};

use anyhow::{bail, Context, Result};

mod features;

/// Crate whose feature tiers and benches are exercised
const COMMON_PACKAGE: &str = "kra-connect-common";

/// Tasks run by `ci`, in order
const CI_PIPELINE: &[&str] = &["fmt", "clippy", "test", "test-features", "bench", "deny", "audit"];

struct Task {
    name: &'static str,
    about: &'static str,
    run: fn() -> Result<()>,
}

const TASKS: &[Task] = &[
    Task { name: "ci", about: "Run the full pipeline (fmt through audit)", run: run_ci },
    Task { name: "fmt", about: "Check formatting", run: run_fmt },
    Task { name: "clippy", about: "Lint every target with all features", run: run_clippy },
    Task { name: "test", about: "Run unit, integration and doc tests", run: run_test },
    Task {
        name: "test-features",
        about: "Check each kra-connect-common feature tier in isolation",
        run: features::check_feature_tiers,
    },
    Task { name: "bench", about: "Compile the limiter and cache benches", run: run_bench },
    Task { name: "deny", about: "License and advisory policy via cargo-deny", run: run_deny },
    Task { name: "audit", about: "RustSec advisories via cargo-audit", run: run_audit },
];

fn main() -> ExitCode {
    let requested = env::args().nth(1);

    let result = match requested.as_deref() {
        None | Some("help" | "-h" | "--help") => {
            print_help();
            Ok(())
        }
        Some(name) => match find_task(name) {
            Some(task) => (task.run)(),
            None => {
                eprintln!("Unknown task: {name}\n");
                print_help();
                Err(anyhow::anyhow!("unknown task '{name}'"))
            }
        },
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Task failed: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn find_task(name: &str) -> Option<&'static Task> {
    TASKS.iter().find(|task| task.name == name)
}

fn print_help() {
    println!("KRA Connect development tasks\n");
    println!("USAGE:\n    cargo xtask <TASK>\n");
    println!("TASKS:");
    let width = TASKS.iter().map(|task| task.name.len()).max().unwrap_or(0);
    for task in TASKS {
        println!("    {:<width$}  {}", task.name, task.about);
    }
    println!("    {:<width$}  Show this message", "help");
}

fn run_ci() -> Result<()> {
    let total = CI_PIPELINE.len();
    for (index, name) in CI_PIPELINE.iter().enumerate() {
        let task = find_task(name).with_context(|| format!("ci step '{name}' is not a task"))?;
        println!("\n==> [{}/{total}] {}", index + 1, task.name);
        (task.run)().with_context(|| format!("ci step '{name}'"))?;
    }
    println!("\n✓ CI pipeline passed");
    Ok(())
}

/// Run `cargo <args>` and fail with `failure` on a non-zero exit
fn cargo(args: &[&str], failure: &str) -> Result<()> {
    let status = Command::new("cargo")
        .args(args)
        .status()
        .with_context(|| format!("failed to spawn cargo {}", args.join(" ")))?;
    if !status.success() {
        bail!("{failure}");
    }
    Ok(())
}

/// Fail early when an optional cargo subcommand is missing
fn require_subcommand(subcommand: &str, crate_name: &str) -> Result<()> {
    let installed = Command::new("cargo")
        .args([subcommand, "--version"])
        .output()
        .is_ok_and(|output| output.status.success());
    if !installed {
        bail!("cargo {subcommand} is not installed; run `cargo install {crate_name}`");
    }
    Ok(())
}

fn clippy_args(deny_warnings: bool) -> Vec<&'static str> {
    let mut args = vec!["clippy", "--workspace", "--all-targets", "--all-features"];
    if deny_warnings {
        args.extend(["--", "-D", "warnings"]);
    }
    args
}

fn run_fmt() -> Result<()> {
    cargo(&["fmt", "--all", "--", "--check"], "formatting differs; run `cargo fmt --all`")
}

fn run_clippy() -> Result<()> {
    let deny = env::var_os("XTASK_CLIPPY_DENY_WARNINGS").is_some();
    cargo(&clippy_args(deny), "clippy reported problems")
}

fn run_test() -> Result<()> {
    cargo(&["test", "--workspace", "--all-features"], "tests failed")
}

fn run_bench() -> Result<()> {
    cargo(&["bench", "-p", COMMON_PACKAGE, "--all-features", "--no-run"], "benches failed to compile")
}

fn run_deny() -> Result<()> {
    require_subcommand("deny", "cargo-deny")?;
    cargo(&["deny", "check"], "cargo-deny found policy violations")
}

fn run_audit() -> Result<()> {
    require_subcommand("audit", "cargo-audit")?;
    cargo(&["audit"], "cargo-audit found vulnerable dependencies")
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Validates `CI_PIPELINE` behavior for the task lookup scenario.
    ///
    /// Assertions:
    /// - Confirms every pipeline step resolves to a registered task.
    /// - Ensures `ci` does not recurse into itself.
    #[test]
    fn test_ci_steps_are_registered_tasks() {
        assert!(CI_PIPELINE.iter().all(|name| find_task(name).is_some()));
        assert!(!CI_PIPELINE.contains(&"ci"));
    }

    #[test]
    fn test_task_names_are_unique() {
        let mut names: Vec<_> = TASKS.iter().map(|task| task.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), TASKS.len());
        assert!(find_task("publish").is_none());
    }

    #[test]
    fn test_clippy_args() {
        assert_eq!(clippy_args(false).last(), Some(&"--all-features"));
        assert_eq!(&clippy_args(true)[4..], ["--", "-D", "warnings"]);
    }
}
