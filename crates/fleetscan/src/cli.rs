//! Clap derive structures for the `fleetscan` CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

use fleetscan_core::DeviceKind;

// ── Top-Level CLI ────────────────────────────────────────────────────

/// fleetscan -- scan-driven remediation for Aruba Central fleets
#[derive(Debug, Parser)]
#[command(
    name = "fleetscan",
    version,
    about = "Scan-driven firmware compliance and decommissioning for Aruba Central",
    long_about = "Reads device serial numbers line by line (typically from a barcode \
        scanner) and remediates each device against Aruba Central.\n\n\
        The first scan of a serial reports its state. Scanning the same serial \
        again immediately confirms the pending action.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Settings file (defaults to the platform config directory)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Target group devices are moved into
    #[arg(long, short = 'g', global = true)]
    pub group: Option<String>,

    /// Pin the compliance version of a device kind (repeatable)
    #[arg(
        long = "firmware",
        id = "firmware_target",
        global = true,
        value_name = "KIND=VERSION",
        value_parser = parse_target
    )]
    pub firmware: Vec<(DeviceKind, String)>,

    /// Endpoint document
    #[arg(long, global = true, value_name = "PATH")]
    pub endpoint_file: Option<PathBuf>,

    /// API client document
    #[arg(long, global = true, value_name = "PATH")]
    pub client_id_file: Option<PathBuf>,

    /// OAuth token document (rewritten on refresh)
    #[arg(long, global = true, value_name = "PATH")]
    pub credential_file: Option<PathBuf>,

    /// Request timeout in seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Do not write an audit sheet
    #[arg(long, global = true)]
    pub no_audit: bool,

    /// Directory for audit sheets
    #[arg(long, global = true, value_name = "DIR")]
    pub audit_dir: Option<PathBuf>,

    /// Keep the audit sheet after the session ends
    #[arg(long, global = true)]
    pub audit_persist: bool,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

fn parse_target(raw: &str) -> Result<(DeviceKind, String), String> {
    let (kind, version) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KIND=VERSION, got '{raw}'"))?;
    let kind = fleetscan_config::parse_kind(kind).map_err(|e| e.to_string())?;
    let version = version.trim();
    if version.is_empty() {
        return Err(format!("missing version for {kind}"));
    }
    Ok((kind, version.to_owned()))
}

// ── Commands ─────────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Check group placement and firmware compliance of scanned devices
    #[command(alias = "fw")]
    Firmware,

    /// Delete scanned gateways or release their subscriptions
    #[command(alias = "decom")]
    Decommission(DecommissionArgs),

    /// Create the endpoint, client and credential documents interactively
    Init(InitArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Debug, Args)]
pub struct DecommissionArgs {
    /// Release license subscriptions instead of deleting
    #[arg(long)]
    pub unlicense: bool,
}

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Re-enter documents that are already valid
    #[arg(long)]
    pub force: bool,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: Shell,
}
