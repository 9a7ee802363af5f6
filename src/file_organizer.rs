//! Move phase: planning and performing the physical file moves.
//!
//! This module reads the project root, decides which files go where, and moves
//! them into their category folders. A move never overwrites anything and never
//! aborts the run: failures are collected as [`SkipRecord`]s.
use crate::collision::resolve_destination;
use crate::config::{CompiledFilters, ConfigError};
use crate::file_category::{Category, Classifier};
use crate::path_utils::{find_case_insensitive, root_relative};
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// A file that was moved successfully.
///
/// The list of `MoveRecord`s is the only input the reference rewriter needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MoveRecord {
    /// The original file name at the project root.
    pub old_name: String,
    /// New location relative to the root, forward slashes.
    pub new_relative_path: String,
    /// New absolute location.
    pub new_absolute_path: PathBuf,
}

/// A file that could not be moved (or, in the rewrite phase, rewritten).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkipRecord {
    pub file_path: PathBuf,
    pub reason: String,
}

/// A root file scheduled to move.
///
/// Only [`PlannedMove::new`] builds one, and it refuses [`Category::None`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedMove {
    pub source: PathBuf,
    pub file_name: String,
    pub category: Category,
    folder: &'static str,
}

impl PlannedMove {
    /// Returns `None` for files that stay at the root.
    pub fn new(source: PathBuf, file_name: String, category: Category) -> Option<Self> {
        let folder = category.dir_name()?;
        Some(Self {
            source,
            file_name,
            category,
            folder,
        })
    }

    /// Destination folder under the root.
    pub fn dir_name(&self) -> &'static str {
        self.folder
    }
}

/// Outcome of the whole move phase.
#[derive(Debug, Default)]
pub struct MovePhase {
    pub moved: Vec<MoveRecord>,
    pub skipped: Vec<SkipRecord>,
}

/// Why a single move failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Nothing at the source path, not even under a different case.
    SourceMissing,
    /// The rename and the copy fallback both failed.
    Io,
}

/// A failed move with a human-readable reason.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason}")]
pub struct MoveFailure {
    pub kind: FailureKind,
    pub reason: String,
}

impl MoveFailure {
    fn source_missing() -> Self {
        Self {
            kind: FailureKind::SourceMissing,
            reason: "source missing".to_string(),
        }
    }

    fn from_io(e: &io::Error) -> Self {
        Self {
            kind: FailureKind::Io,
            reason: format!("{:?}: {}", e.kind(), e),
        }
    }
}

/// Result of [`FileOrganizer::safe_move`].
pub type MoveOutcome = Result<(), MoveFailure>;

/// Errors that abort a whole run.
#[derive(Debug, Error)]
pub enum OrganizeError {
    /// The project root is missing or not a directory.
    #[error("Invalid project root {}: {source}", .path.display())]
    InvalidRoot { path: PathBuf, source: io::Error },
    /// The root listing could not be read.
    #[error("Failed to read directory {}: {source}", .path.display())]
    ReadRoot { path: PathBuf, source: io::Error },
    /// A category folder could not be created.
    #[error("Failed to create directory {}: {source}", .path.display())]
    CreateDir { path: PathBuf, source: io::Error },
    /// The text-file enumerator failed.
    #[error("Failed to list project files under {}: {reason}", .path.display())]
    Enumerate { path: PathBuf, reason: String },
    /// Reading or writing a text file failed and the policy is to abort.
    #[error("Failed to rewrite references in {}: {source}", .path.display())]
    Rewrite { path: PathBuf, source: io::Error },
    /// A reference pattern could not be compiled.
    #[error("Failed to build reference pattern: {0}")]
    Pattern(#[from] regex::Error),
    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Result type for the move phase and the run as a whole.
pub type OrganizeResult<T> = Result<T, OrganizeError>;

/// Moves root-level files into their category folders.
pub struct FileOrganizer;

impl FileOrganizer {
    /// Lists the root and decides which files move where.
    ///
    /// Only regular files directly under `root` are considered. Files rejected by
    /// `filters` or classified as [`Category::None`] are left out. The plan is
    /// sorted by file name.
    ///
    /// # Errors
    ///
    /// Returns [`OrganizeError::ReadRoot`] if the root listing can't be read.
    pub fn plan_moves(
        root: &Path,
        classifier: &Classifier,
        filters: &CompiledFilters,
    ) -> OrganizeResult<Vec<PlannedMove>> {
        let entries = fs::read_dir(root).map_err(|e| OrganizeError::ReadRoot {
            path: root.to_path_buf(),
            source: e,
        })?;

        let mut plans = Vec::new();
        for entry in entries.flatten() {
            let Ok(file_type) = entry.file_type() else {
                continue;
            };
            if !file_type.is_file() {
                continue;
            }

            let file_name = entry.file_name().to_string_lossy().to_string();
            let path = entry.path();
            if !filters.should_include(&path) {
                debug!(file = %file_name, "excluded by filter rules");
                continue;
            }

            let category = classifier.classify(&file_name);
            if let Some(plan) = PlannedMove::new(path, file_name, category) {
                plans.push(plan);
            }
        }

        plans.sort_by(|a, b| a.file_name.cmp(&b.file_name));
        Ok(plans)
    }

    /// Performs the planned moves one after another.
    ///
    /// Individual failures become [`SkipRecord`]s and the phase carries on.
    ///
    /// # Errors
    ///
    /// Returns [`OrganizeError::CreateDir`] if a category folder can't be created.
    pub fn execute_moves(root: &Path, plans: &[PlannedMove]) -> OrganizeResult<MovePhase> {
        let mut phase = MovePhase::default();

        for plan in plans {
            let target_dir = root.join(plan.dir_name());
            let destination = resolve_destination(&target_dir, &plan.file_name).map_err(|e| {
                OrganizeError::CreateDir {
                    path: target_dir.clone(),
                    source: e,
                }
            })?;

            if destination == plan.source {
                continue;
            }

            match Self::safe_move(&plan.source, &destination) {
                Ok(()) => {
                    let record = MoveRecord {
                        old_name: plan.file_name.clone(),
                        new_relative_path: root_relative(root, &destination),
                        new_absolute_path: destination,
                    };
                    info!(file = %record.old_name, to = %record.new_relative_path, "moved");
                    phase.moved.push(record);
                }
                Err(failure) => {
                    warn!(file = %plan.file_name, reason = %failure, "skipped");
                    phase.skipped.push(SkipRecord {
                        file_path: plan.source.clone(),
                        reason: failure.reason,
                    });
                }
            }
        }

        Ok(phase)
    }

    /// Moves one file, falling back to copy + delete when a rename won't do.
    ///
    /// Steps:
    /// 1. If `from` is gone, look for a same-named file ignoring case
    /// 2. Make sure the destination folder exists
    /// 3. Try an atomic rename
    /// 4. On cross-device, permission, busy or not-found errors, copy then delete
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use std::path::Path;
    /// use webtidy::file_organizer::FileOrganizer;
    ///
    /// match FileOrganizer::safe_move(Path::new("/site/logo.png"), Path::new("/site/img/logo.png")) {
    ///     Ok(()) => println!("moved"),
    ///     Err(failure) => eprintln!("skipped: {}", failure),
    /// }
    /// ```
    pub fn safe_move(from: &Path, to: &Path) -> MoveOutcome {
        let mut source = locate_source(from).ok_or_else(MoveFailure::source_missing)?;

        ensure_parent(to).map_err(|e| MoveFailure::from_io(&e))?;

        match fs::rename(&source, to) {
            Ok(()) => Ok(()),
            Err(e) if is_recoverable(&e) => {
                warn!(
                    src = %source.display(),
                    dest = %to.display(),
                    error = %e,
                    "rename failed, falling back to copy"
                );
                ensure_parent(to).map_err(|e| MoveFailure::from_io(&e))?;
                if let Some(found) = locate_source(&source) {
                    source = found;
                }
                copy_then_remove(&source, to)
            }
            Err(e) => Err(MoveFailure::from_io(&e)),
        }
    }
}

/// Error classes worth a copy + delete retry.
pub fn is_recoverable(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::CrossesDevices
            | io::ErrorKind::PermissionDenied
            | io::ErrorKind::ResourceBusy
            | io::ErrorKind::NotFound
    )
}

fn locate_source(path: &Path) -> Option<PathBuf> {
    if fs::symlink_metadata(path).is_ok() {
        return Some(path.to_path_buf());
    }
    find_case_insensitive(path)
}

fn ensure_parent(path: &Path) -> io::Result<()> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => fs::create_dir_all(dir),
        _ => Ok(()),
    }
}

/// Copies `from` to `to`, then deletes `from`.
///
/// If the delete fails the copy is removed again so the file exists exactly once.
pub fn copy_then_remove(from: &Path, to: &Path) -> MoveOutcome {
    fs::copy(from, to).map_err(|e| MoveFailure::from_io(&e))?;

    if let Err(e) = fs::remove_file(from) {
        if let Err(cleanup) = fs::remove_file(to) {
            warn!(dest = %to.display(), error = %cleanup, "could not remove partial copy");
        }
        return Err(MoveFailure::from_io(&e));
    }

    Ok(())
}
