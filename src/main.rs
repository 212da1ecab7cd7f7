//! rebind - binding-form fixer for generated multi-value assignments
//!
//! ## Pipeline
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  STAGE 0: CONFIGURATION                                             │
//! │    → rebind.toml (optional) → command-line overrides → validation   │
//! ├─────────────────────────────────────────────────────────────────────┤
//! │  STAGE 1: REWRITE PASS                                              │
//! │    → Scope tracking (marker prefix, cutoff protection)              │
//! │    → Per-scope binding set                                          │
//! │    → Bounded lookahead for the discardable first target             │
//! │    → Integrity check (line count, protected lines)                  │
//! ├─────────────────────────────────────────────────────────────────────┤
//! │  STAGE 2: OUTPUT                                                    │
//! │    → Report (text or JSON)                                          │
//! │    → Optional backup, then write                                    │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! If the pass reports any issue the file is not written unless `--force`
//! is given.
//!
//! Exit status: 0 on success, 1 when issues blocked the write or `--check`
//! found work, 2 on a fatal error (bad configuration, I/O failure, failed
//! integrity check).

use std::fs;
use std::path::{Path, PathBuf};
use std::process::exit;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use colored::*;
use tracing_subscriber::EnvFilter;

use rebind::error_msg::{format_fatal, format_issue, format_report};
use rebind::{rewrite_source, RewriteConfig, RewriteError};

const EXIT_OK: i32 = 0;
const EXIT_ISSUES: i32 = 1;
const EXIT_FATAL: i32 = 2;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// File to rewrite
    input: PathBuf,

    /// Path to a rebind.toml configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Lines at or below this number are never modified
    #[arg(long)]
    cutoff: Option<usize>,

    /// Prefix of the header lines that open a scope
    #[arg(long)]
    marker: Option<String>,

    /// Prefix of any unit header; non-marker headers close the scope
    #[arg(long)]
    unit_prefix: Option<String>,

    /// Maximum lines scanned forward when deciding whether to discard
    #[arg(long)]
    horizon: Option<usize>,

    /// Regex the right-hand side of a rewritable statement must start with
    #[arg(long)]
    producer: Option<String>,

    /// Write the result here instead of rewriting the input in place
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Copy the input to <input>.bak before rewriting it in place
    #[arg(long, default_value_t = false)]
    backup: bool,

    /// Write nothing; exit with 1 if the file would change or has issues
    #[arg(long, default_value_t = false)]
    check: bool,

    /// Write even when issues were reported
    #[arg(long, default_value_t = false)]
    force: bool,

    /// Report format
    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Suppress stage messages
    #[arg(short, long, default_value_t = false)]
    quiet: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("rebind={}", level)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn build_config(cli: &Cli) -> Result<RewriteConfig, RewriteError> {
    let mut config = match &cli.config {
        Some(path) => RewriteConfig::load(path)?,
        None => RewriteConfig::default(),
    };

    if let Some(cutoff) = cli.cutoff {
        config.cutoff_line = cutoff;
    }
    if let Some(marker) = &cli.marker {
        config.scope_marker_prefix = marker.clone();
    }
    if let Some(prefix) = &cli.unit_prefix {
        config.unit_prefix = prefix.clone();
    }
    if cli.horizon.is_some() {
        config.lookahead_horizon = cli.horizon;
    }
    if let Some(producer) = &cli.producer {
        config.producer_pattern = producer.clone();
    }

    config.validate()?;
    Ok(config)
}

fn backup_path(input: &Path) -> PathBuf {
    let mut name = input.as_os_str().to_owned();
    name.push(".bak");
    PathBuf::from(name)
}

fn stage(cli: &Cli, n: u8, message: &str) {
    if !cli.quiet {
        eprintln!("{} {}", format!("[Stage {}]", n).blue().bold(), message);
    }
}

fn run(cli: &Cli) -> Result<i32> {
    stage(cli, 0, "Loading configuration...");
    let config = match build_config(cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", format_fatal(&e));
            return Ok(EXIT_FATAL);
        }
    };

    let source = fs::read_to_string(&cli.input)
        .with_context(|| format!("Failed to read input file: {}", cli.input.display()))?;
    let file_name = cli.input.display().to_string();

    stage(cli, 1, "Rewriting binding forms...");
    let output = match rewrite_source(&source, &config) {
        Ok(output) => output,
        Err(e) => {
            eprintln!("{}", format_fatal(&e));
            return Ok(EXIT_FATAL);
        }
    };
    let report = &output.report;

    match cli.format {
        Format::Json => println!("{}", report.to_json()?),
        Format::Text if cli.quiet => {
            for issue in &report.issues {
                eprint!("{}", format_issue(issue, &file_name));
            }
        }
        Format::Text => eprint!("{}", format_report(report, &file_name)),
    }

    if cli.check {
        let dirty = output.changed() || report.has_issues();
        if dirty && !cli.quiet {
            eprintln!(
                "{}: {} needs rewriting",
                "check".yellow().bold(),
                file_name
            );
        }
        return Ok(if dirty { EXIT_ISSUES } else { EXIT_OK });
    }

    if report.has_issues() && !cli.force {
        eprintln!(
            "{}: {} issue{} reported, not writing {} (use --force to write anyway)",
            "error".red().bold(),
            report.issues.len(),
            if report.issues.len() == 1 { "" } else { "s" },
            cli.output.as_ref().unwrap_or(&cli.input).display()
        );
        return Ok(EXIT_ISSUES);
    }

    stage(cli, 2, "Writing output...");
    let target = cli.output.clone().unwrap_or_else(|| cli.input.clone());

    if target == cli.input && !output.changed() {
        if !cli.quiet {
            eprintln!("{}: {} is already correct", "note".cyan().bold(), file_name);
        }
        return Ok(EXIT_OK);
    }

    if cli.backup && target == cli.input {
        let backup = backup_path(&cli.input);
        fs::copy(&cli.input, &backup)
            .with_context(|| format!("Failed to write backup: {}", backup.display()))?;
        if !cli.quiet {
            eprintln!("{}: backup written to {}", "note".cyan().bold(), backup.display());
        }
    }

    fs::write(&target, output.text())
        .with_context(|| format!("Failed to write output file: {}", target.display()))?;

    if !cli.quiet {
        eprintln!(
            "{} {} ({} lines)",
            "Wrote".green().bold(),
            target.display(),
            output.lines.len()
        );
    }

    Ok(EXIT_OK)
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let code = match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {:#}", "error".red().bold(), e);
            EXIT_FATAL
        }
    };
    exit(code);
}
