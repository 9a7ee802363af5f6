//! The reorganization run: move phase, then rewrite phase.
//!
//! All moves finish (successfully or not) before any reference is rewritten,
//! because the rewriter needs final destination paths. Nothing is rolled back:
//! a failed move is reported and the run carries on with the remaining files.

use crate::config::{CompiledFilters, ConfigError, WebtidyConfig};
use crate::enumerator::{FileEnumerator, WalkEnumerator};
use crate::file_category::Classifier;
use crate::file_organizer::{
    FileOrganizer, MoveRecord, OrganizeError, OrganizeResult, PlannedMove, SkipRecord,
};
use crate::output::{NullNotifier, Notifier};
use crate::rewriter::{RewriteOptions, is_text_file, rewrite_references_with_progress};
use serde::Serialize;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use tracing::info;

/// Everything a run depends on besides the project root.
pub struct RunOptions {
    /// Lists the files the rewrite phase scans.
    pub enumerator: Box<dyn FileEnumerator>,
    /// Receives user-facing messages.
    pub notifier: Box<dyn Notifier>,
    pub classifier: Classifier,
    /// Root files to leave alone regardless of category.
    pub filters: CompiledFilters,
    pub rewrite: RewriteOptions,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            enumerator: Box::new(WalkEnumerator::default()),
            notifier: Box::new(NullNotifier),
            classifier: Classifier::default(),
            filters: CompiledFilters::default(),
            rewrite: RewriteOptions::default(),
        }
    }
}

impl RunOptions {
    /// Builds options from a loaded configuration, with a silent notifier.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown category mappings or invalid exclusion patterns.
    pub fn from_config(config: &WebtidyConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            enumerator: config.organize.enumerator.build(&config.organize.skip_dirs),
            notifier: Box::new(NullNotifier),
            classifier: config.classifier()?,
            filters: config.compile_filters()?,
            rewrite: config.rewrite_options(),
        })
    }

    /// Replaces the notifier.
    pub fn with_notifier(mut self, notifier: Box<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Replaces the text-file enumerator.
    pub fn with_enumerator(mut self, enumerator: Box<dyn FileEnumerator>) -> Self {
        self.enumerator = enumerator;
        self
    }
}

/// What a run did.
#[derive(Debug, Serialize)]
pub struct OrganizeReport {
    pub root: PathBuf,
    /// RFC 3339 local time at which the run started.
    pub started_at: String,
    pub moved: Vec<MoveRecord>,
    pub skipped: Vec<SkipRecord>,
    /// Text files read during the rewrite phase.
    pub scanned: usize,
    /// Text files whose references changed.
    pub rewritten: Vec<PathBuf>,
    /// Text files that could not be read or written, and directories that could
    /// not be listed.
    pub rewrite_failures: Vec<SkipRecord>,
}

impl OrganizeReport {
    fn new(root: PathBuf) -> Self {
        Self {
            root,
            started_at: chrono::Local::now().to_rfc3339(),
            moved: Vec::new(),
            skipped: Vec::new(),
            scanned: 0,
            rewritten: Vec::new(),
            rewrite_failures: Vec::new(),
        }
    }

    /// Number of moved files per destination folder.
    pub fn category_counts(&self) -> HashMap<String, usize> {
        let mut counts = HashMap::new();
        for record in &self.moved {
            let folder = record
                .new_relative_path
                .split('/')
                .next()
                .unwrap_or_default()
                .to_string();
            *counts.entry(folder).or_insert(0) += 1;
        }
        counts
    }
}

/// Reorganizes the project at `root` and rewrites references to moved files.
///
/// Messages follow a fixed shape: one success message when at least one file
/// moved, one warning listing skipped files, one error message if the run
/// aborts. When nothing qualifies the run is silent.
///
/// # Errors
///
/// Fatal conditions only: unreadable root, folder creation failure, enumerator
/// failure, or a rewrite I/O error under the abort policy.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use webtidy::organizer::{organize_project, RunOptions};
///
/// let report = organize_project(Path::new("/path/to/site"), &RunOptions::default())?;
/// println!("moved {} files", report.moved.len());
/// # Ok::<(), webtidy::OrganizeError>(())
/// ```
pub fn organize_project(root: &Path, options: &RunOptions) -> OrganizeResult<OrganizeReport> {
    let result = run(root, options);
    if let Err(e) = &result {
        options
            .notifier
            .error(&format!("Failed to organize project: {}", e));
    }
    result
}

/// Lists the moves a run would make, without touching anything.
pub fn plan_project(root: &Path, options: &RunOptions) -> OrganizeResult<Vec<PlannedMove>> {
    let root = canonical_root(root)?;
    FileOrganizer::plan_moves(&root, &options.classifier, &options.filters)
}

fn run(root: &Path, options: &RunOptions) -> OrganizeResult<OrganizeReport> {
    let root = canonical_root(root)?;
    let mut report = OrganizeReport::new(root.clone());
    let notifier = options.notifier.as_ref();

    let plans = FileOrganizer::plan_moves(&root, &options.classifier, &options.filters)?;
    let phase = FileOrganizer::execute_moves(&root, &plans)?;
    report.moved = phase.moved;
    report.skipped = phase.skipped;

    if !report.skipped.is_empty() {
        notifier.warning(&format!(
            "Some files were skipped (missing or locked): {}",
            describe_skips(&report.skipped)
        ));
    }

    if report.moved.is_empty() {
        return Ok(report);
    }

    // Files are already moved, so only an unreadable root stops the rewrite.
    let listing = options.enumerator.list_files(&root)?;
    let text_files = listing.files.iter().filter(|p| is_text_file(p)).count();
    notifier.info(&format!("Updating references in {} text file(s)...", text_files));
    notifier.rewrite_started(text_files);
    let summary =
        rewrite_references_with_progress(&report.moved, &listing.files, options.rewrite, |p| {
            notifier.file_scanned(p)
        });
    notifier.rewrite_finished();
    let summary = summary?;

    report.scanned = summary.scanned;
    report.rewritten = summary.rewritten;
    report.rewrite_failures = listing.unreadable;
    report.rewrite_failures.extend(summary.failed);

    if !report.rewrite_failures.is_empty() {
        notifier.warning(&format!(
            "References could not be updated in: {}",
            describe_skips(&report.rewrite_failures)
        ));
    }

    info!(
        moved = report.moved.len(),
        skipped = report.skipped.len(),
        rewritten = report.rewritten.len(),
        "run complete"
    );
    notifier.success(&format!(
        "Moved {} file(s) into folders and updated references in {} file(s).",
        report.moved.len(),
        report.rewritten.len()
    ));

    Ok(report)
}

fn canonical_root(root: &Path) -> OrganizeResult<PathBuf> {
    let canonical = dunce::canonicalize(root).map_err(|e| OrganizeError::InvalidRoot {
        path: root.to_path_buf(),
        source: e,
    })?;
    if !canonical.is_dir() {
        return Err(OrganizeError::InvalidRoot {
            path: root.to_path_buf(),
            source: io::Error::new(io::ErrorKind::NotADirectory, "not a directory"),
        });
    }
    Ok(canonical)
}

/// `name [reason], name [reason]`
fn describe_skips(skips: &[SkipRecord]) -> String {
    skips
        .iter()
        .map(|skip| {
            let name = skip
                .file_path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| skip.file_path.display().to_string());
            format!("{} [{}]", name, skip.reason)
        })
        .collect::<Vec<_>>()
        .join(", ")
}
