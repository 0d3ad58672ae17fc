//! Build automation for the azsql workspace.
//!
//! Run with `cargo xtask <command>`:
//!
//! - `ci`: lint, feature matrix and tests, in that order
//! - `lint`: rustfmt and clippy (`--fix` applies both)
//! - `features`: build each published crate under every feature set
//! - `test`: workspace tests (`--live` adds the tenant-backed ones)
//! - `fuzz`: run one cargo-fuzz target on nightly

use std::path::Path;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use xshell::{Shell, cmd};

/// Crates published with optional features, and the sets they must build with.
const FEATURE_MATRIX: &[(&str, &[&str])] = &[
    ("azsql-auth", &["azure-identity", "zeroize", "azure-identity,zeroize"]),
    ("azsql-client", &["azure-identity", "zeroize"]),
];

/// Targets under `fuzz/fuzz_targets`.
const FUZZ_TARGETS: [&str; 3] = ["credentials_ini", "connection_string", "encode_token"];

#[derive(Parser)]
#[command(name = "xtask", about = "Build automation for azsql")]
struct Cli {
    #[command(subcommand)]
    command: Task,
}

#[derive(Subcommand)]
enum Task {
    /// Lint, check the feature matrix, then test
    Ci,
    /// Check formatting and run clippy
    Lint {
        /// Rewrite sources instead of failing
        #[arg(long)]
        fix: bool,
    },
    /// Build each published crate under every feature set
    Features,
    /// Run the workspace tests
    Test {
        /// Only this package
        #[arg(short, long)]
        package: Option<String>,
        /// Include tests that need a real Azure AD tenant
        #[arg(long)]
        live: bool,
    },
    /// Run a fuzz target (cargo-fuzz, nightly)
    Fuzz {
        /// One of credentials_ini, connection_string, encode_token
        target: String,
        /// Stop after this many seconds
        #[arg(long, default_value_t = 60)]
        seconds: u64,
    },
}

fn main() -> Result<()> {
    let task = Cli::parse().command;
    let sh = Shell::new()?;
    let root = Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .context("xtask lives inside the workspace")?;
    sh.change_dir(root);

    match task {
        Task::Ci => {
            lint(&sh, false)?;
            features(&sh)?;
            test(&sh, None, false)?;
            eprintln!("ci: ok");
        }
        Task::Lint { fix } => lint(&sh, fix)?,
        Task::Features => features(&sh)?,
        Task::Test { package, live } => test(&sh, package.as_deref(), live)?,
        Task::Fuzz { target, seconds } => fuzz(&sh, &target, seconds)?,
    }
    Ok(())
}

fn lint(sh: &Shell, fix: bool) -> Result<()> {
    if fix {
        cmd!(sh, "cargo fmt --all").run()?;
        cmd!(sh, "cargo clippy --workspace --all-features --all-targets --fix --allow-dirty")
            .run()?;
    } else {
        cmd!(sh, "cargo fmt --all -- --check").run()?;
        cmd!(sh, "cargo clippy --workspace --all-features --all-targets -- -D warnings").run()?;
    }
    Ok(())
}

fn features(sh: &Shell) -> Result<()> {
    for (krate, sets) in FEATURE_MATRIX {
        eprintln!("features: {krate} [default]");
        cmd!(sh, "cargo check -p {krate} --all-targets").run()?;
        for set in *sets {
            eprintln!("features: {krate} [{set}]");
            cmd!(sh, "cargo check -p {krate} --all-targets --features {set}").run()?;
        }
    }
    Ok(())
}

fn test(sh: &Shell, package: Option<&str>, live: bool) -> Result<()> {
    let scope = match package {
        Some(pkg) => vec!["-p", pkg],
        None => vec!["--workspace"],
    };
    let live = live.then_some("--include-ignored");
    cmd!(sh, "cargo test --all-features {scope...} -- {live...}").run()?;
    Ok(())
}

fn fuzz(sh: &Shell, target: &str, seconds: u64) -> Result<()> {
    if !FUZZ_TARGETS.contains(&target) {
        bail!(
            "unknown fuzz target '{target}', expected one of: {}",
            FUZZ_TARGETS.join(", ")
        );
    }
    let limit = format!("-max_total_time={seconds}");
    cmd!(sh, "cargo +nightly fuzz run {target} -- {limit}").run()?;
    Ok(())
}
