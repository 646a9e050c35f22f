//! Feature-tier compile checks for `kra-connect-common`

use anyhow::{bail, Context, Result};
use std::process::Command;

use crate::COMMON_PACKAGE;

/// Each tier must compile alone; `observability` without `runtime` catches
/// cfg gaps in the limiter and cache.
const TIERS: &[&[&str]] = &[
    &[],
    &["foundation"],
    &["observability"],
    &["runtime"],
    &["test-utils"],
    &["foundation", "observability"],
];

fn label(features: &[&str]) -> String {
    if features.is_empty() {
        "no features".to_string()
    } else {
        features.join("+")
    }
}

fn check_args(features: &[&str]) -> Vec<String> {
    let mut args = vec!["check".to_string(), "-p".to_string(), COMMON_PACKAGE.to_string()];
    if !features.is_empty() {
        args.push("--features".to_string());
        args.push(features.join(","));
    }
    args
}

pub fn check_feature_tiers() -> Result<()> {
    for (index, features) in TIERS.iter().enumerate() {
        let args = check_args(features);
        println!("\n[{}/{}] cargo {}", index + 1, TIERS.len(), args.join(" "));

        let status = Command::new("cargo")
            .args(&args)
            .status()
            .with_context(|| format!("failed to spawn cargo check for {}", label(features)))?;
        if !status.success() {
            bail!("{COMMON_PACKAGE} does not compile with {}", label(features));
        }
    }
    println!("\n✓ {} feature tiers compile", TIERS.len());
    Ok(())
}
