//! Output formatting and user notifications.
//!
//! The run function only talks to a [`Notifier`]. The CLI plugs in a
//! [`ConsoleNotifier`] (colored messages plus a progress bar over the rewrite
//! phase); library callers without a UI get the silent [`NullNotifier`].

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::Path;

/// Where run feedback goes.
///
/// Progress hooks default to doing nothing.
pub trait Notifier {
    /// At least one file moved.
    fn success(&self, message: &str);
    /// Some files were skipped.
    fn warning(&self, message: &str);
    /// The run aborted.
    fn error(&self, message: &str);
    /// Anything else worth showing.
    fn info(&self, _message: &str) {}

    /// The rewrite phase is about to scan `_total` files.
    fn rewrite_started(&self, _total: usize) {}
    /// One file has been scanned.
    fn file_scanned(&self, _path: &Path) {}
    /// The rewrite phase is over.
    fn rewrite_finished(&self) {}
}

/// Discards every notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn success(&self, _message: &str) {}
    fn warning(&self, _message: &str) {}
    fn error(&self, _message: &str) {}
}

/// Prints notifications to the terminal through [`OutputFormatter`].
#[derive(Default)]
pub struct ConsoleNotifier {
    progress: RefCell<Option<ProgressBar>>,
}

impl ConsoleNotifier {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Notifier for ConsoleNotifier {
    fn success(&self, message: &str) {
        OutputFormatter::success(message);
    }

    fn warning(&self, message: &str) {
        OutputFormatter::warning(message);
    }

    fn error(&self, message: &str) {
        OutputFormatter::error(message);
    }

    fn info(&self, message: &str) {
        OutputFormatter::info(message);
    }

    fn rewrite_started(&self, total: usize) {
        let pb = OutputFormatter::create_progress_bar(total as u64);
        pb.set_message("updating references");
        *self.progress.borrow_mut() = Some(pb);
    }

    fn file_scanned(&self, _path: &Path) {
        if let Some(pb) = self.progress.borrow().as_ref() {
            pb.inc(1);
        }
    }

    fn rewrite_finished(&self) {
        if let Some(pb) = self.progress.borrow_mut().take() {
            pb.finish_and_clear();
        }
    }
}

/// Consistent styling for all CLI output.
///
/// - Success messages (green with ✓)
/// - Error messages (red with ✗)
/// - Warning messages (yellow with ⚠)
/// - Info messages (cyan)
/// - Progress bars and summary tables
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red with an X mark.
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints a warning message in yellow with a warning symbol.
    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    /// Prints an info message in cyan.
    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    /// Prints a regular message without styling.
    pub fn plain(message: &str) {
        println!("{}", message);
    }

    /// Prints a section header.
    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Creates a progress bar for a known number of files.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use webtidy::output::OutputFormatter;
    /// let pb = OutputFormatter::create_progress_bar(100);
    /// pb.inc(1);
    /// pb.finish_with_message("Completed!");
    /// ```
    pub fn create_progress_bar(total: u64) -> ProgressBar {
        let pb = ProgressBar::new(total);
        if let Ok(style) =
            ProgressStyle::default_bar().template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        {
            pb.set_style(style.progress_chars("█▓░"));
        }
        pb
    }

    /// Prints a summary table with file counts per folder.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use webtidy::output::OutputFormatter;
    /// use std::collections::HashMap;
    ///
    /// let mut counts = HashMap::new();
    /// counts.insert("css".to_string(), 2);
    /// counts.insert("img".to_string(), 8);
    /// OutputFormatter::summary_table(&counts, 10);
    /// ```
    pub fn summary_table(category_counts: &HashMap<String, usize>, total_files: usize) {
        Self::header("SUMMARY");

        let mut categories: Vec<_> = category_counts.iter().collect();
        categories.sort_by_key(|&(name, _)| name);

        let max_category_len = categories
            .iter()
            .map(|(name, _)| name.len())
            .max()
            .unwrap_or(0)
            .max(8); // "Category"

        println!(
            "{:<width$} | {}",
            "Category".bold(),
            "Files".bold(),
            width = max_category_len
        );
        println!("{}", "-".repeat(max_category_len + 10));

        for (category, count) in &categories {
            println!(
                "{:<width$} | {} {}",
                category,
                count.to_string().green(),
                plural_files(**count),
                width = max_category_len
            );
        }

        println!("{}", "-".repeat(max_category_len + 10));
        println!(
            "{:<width$} | {} {}",
            "Total".bold(),
            total_files.to_string().green().bold(),
            plural_files(total_files),
            width = max_category_len
        );
    }

    /// Prints a dry-run notice message.
    pub fn dry_run_notice(message: &str) {
        println!("{}", format!("[DRY RUN] {}", message).yellow());
    }
}

fn plural_files(count: usize) -> &'static str {
    if count == 1 { "file" } else { "files" }
}
