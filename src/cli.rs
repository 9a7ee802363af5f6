//! Command-line interface module for webtidy.
//!
//! This module handles all CLI-related functionality including:
//! - Argument parsing (clap)
//! - Loading configuration and applying flag overrides
//! - The confirmation prompt before anything is moved
//! - Dry-run listing and the final summary

use crate::config::WebtidyConfig;
use crate::enumerator::EnumeratorKind;
use crate::organizer::{OrganizeReport, RunOptions, organize_project, plan_project};
use crate::output::{ConsoleNotifier, NullNotifier, OutputFormatter};
use clap::Parser;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Sort a flat web project into typed folders and fix every reference.
#[derive(Debug, Clone, Parser)]
#[command(name = "webtidy", version, about)]
pub struct Cli {
    /// Project root to reorganize.
    pub root: PathBuf,

    /// Skip the confirmation prompt.
    #[arg(short, long)]
    pub yes: bool,

    /// Show where files would go without moving anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Disable the loose quoted-mention rewrite pass.
    #[arg(long)]
    pub no_loose: bool,

    /// Text-file enumerator for the rewrite phase.
    #[arg(long, value_enum)]
    pub enumerator: Option<EnumeratorKind>,

    /// Configuration file (defaults to <root>/.webtidyrc.toml, then ~/.config/webtidy/config.toml).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Print the run report as JSON instead of styled text.
    #[arg(long)]
    pub json: bool,

    /// More log output (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Why the CLI stopped.
#[derive(Debug, Error)]
pub enum CliError {
    /// Not yet shown to the user.
    #[error("{0}")]
    Message(String),
    /// The run aborted and the console notifier already printed the cause.
    #[error("{0}")]
    Reported(String),
}

impl CliError {
    pub fn already_reported(&self) -> bool {
        matches!(self, CliError::Reported(_))
    }
}

/// Runs the CLI with parsed arguments.
///
/// Returns `Err` on fatal failures.
///
/// # Examples
///
/// ```no_run
/// use clap::Parser;
/// use webtidy::cli::{Cli, run_cli};
///
/// let cli = Cli::parse_from(["webtidy", "/path/to/site", "--yes"]);
/// if let Err(e) = run_cli(&cli) {
///     eprintln!("Error: {}", e);
/// }
/// ```
pub fn run_cli(cli: &Cli) -> Result<(), CliError> {
    run_cli_with_confirm(cli, confirm_with_prompt)
}

/// Same as [`run_cli`] with a custom confirmation callback.
pub fn run_cli_with_confirm<F>(cli: &Cli, confirm: F) -> Result<(), CliError>
where
    F: FnOnce(&Path) -> bool,
{
    let mut config = WebtidyConfig::load(cli.config.as_deref(), &cli.root)
        .map_err(|e| CliError::Message(format!("Error loading configuration: {}", e)))?;
    apply_overrides(&mut config, cli);

    let options = RunOptions::from_config(&config)
        .map_err(|e| CliError::Message(format!("Error in configuration: {}", e)))?;

    if cli.dry_run {
        return print_plan(&cli.root, &options);
    }

    if !cli.yes && !confirm(&cli.root) {
        OutputFormatter::plain("Cancelled. Nothing was changed.");
        return Ok(());
    }

    let options = if cli.json {
        options.with_notifier(Box::new(NullNotifier))
    } else {
        OutputFormatter::info(&format!("Organizing {}", cli.root.display()));
        options.with_notifier(Box::new(ConsoleNotifier::new()))
    };

    let report = organize_project(&cli.root, &options).map_err(|e| {
        if cli.json {
            CliError::Message(e.to_string())
        } else {
            CliError::Reported(e.to_string())
        }
    })?;

    if cli.json {
        let json = serde_json::to_string_pretty(&report)
            .map_err(|e| CliError::Message(format!("Error serializing report: {}", e)))?;
        println!("{}", json);
    } else if !report.moved.is_empty() {
        print_report(&report);
    }

    Ok(())
}

/// Flags win over configuration values.
fn apply_overrides(config: &mut WebtidyConfig, cli: &Cli) {
    if cli.no_loose {
        config.organize.loose_mentions = false;
    }
    if let Some(kind) = cli.enumerator {
        config.organize.enumerator = kind;
    }
}

fn confirm_with_prompt(root: &Path) -> bool {
    let prompt = format!(
        "Move files from {} into css, js, img, video, audio, fonts, data, files and includes, and update paths in code?",
        root.display()
    );
    dialoguer::Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()
        .unwrap_or(false)
}

fn print_plan(root: &Path, options: &RunOptions) -> Result<(), CliError> {
    let plans = plan_project(root, options).map_err(|e| CliError::Message(e.to_string()))?;

    if plans.is_empty() {
        OutputFormatter::plain("No files found to organize.");
        return Ok(());
    }

    OutputFormatter::dry_run_notice(&format!("Analyzing {}", root.display()));
    let mut counts: HashMap<String, usize> = HashMap::new();
    for plan in &plans {
        OutputFormatter::plain(&format!(
            " - {} → {}/ ({})",
            plan.file_name,
            plan.dir_name(),
            plan.category.description()
        ));
        *counts.entry(plan.dir_name().to_string()).or_insert(0) += 1;
    }
    OutputFormatter::summary_table(&counts, plans.len());
    OutputFormatter::dry_run_notice("No files were modified.");

    Ok(())
}

fn print_report(report: &OrganizeReport) {
    OutputFormatter::header("MOVED");
    for record in &report.moved {
        OutputFormatter::plain(&format!(" - {} → {}", record.old_name, record.new_relative_path));
    }
    OutputFormatter::summary_table(&report.category_counts(), report.moved.len());

    if !report.rewritten.is_empty() {
        OutputFormatter::header("UPDATED REFERENCES");
        for path in &report.rewritten {
            let shown = path.strip_prefix(&report.root).unwrap_or(path);
            OutputFormatter::plain(&format!(" - {}", shown.display()));
        }
    }
}
