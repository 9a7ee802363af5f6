//! Listing the project files that the rewrite phase scans.
//!
//! Two interchangeable providers: [`WalkEnumerator`] walks the tree directly,
//! [`GlobEnumerator`] matches `**/*` with exclusion globs the way an editor's
//! workspace search does. Both list regular files only (symlinks are not
//! followed); extension filtering happens in the rewriter.
//!
//! Only an unreadable root is fatal. Anything deeper that can't be read is
//! reported in [`FileListing::unreadable`] and the listing carries on.

use crate::config::default_skip_dirs;
use crate::file_organizer::{OrganizeError, OrganizeResult, SkipRecord};
use glob::{MatchOptions, Pattern};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

/// Files found under a root, plus the entries that couldn't be read.
#[derive(Debug, Default)]
pub struct FileListing {
    pub files: Vec<PathBuf>,
    pub unreadable: Vec<SkipRecord>,
}

impl FileListing {
    fn skip(&mut self, path: PathBuf, reason: String) {
        warn!(path = %path.display(), reason = %reason, "could not list entry");
        self.unreadable.push(SkipRecord {
            file_path: path,
            reason,
        });
    }
}

/// Anything that can list the files of a project.
pub trait FileEnumerator {
    /// Returns every file under `root`, skipping non-project directories.
    ///
    /// # Errors
    ///
    /// Returns [`OrganizeError::Enumerate`] only if `root` itself can't be listed.
    fn list_files(&self, root: &Path) -> OrganizeResult<FileListing>;
}

/// Which enumerator a run uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum EnumeratorKind {
    /// Direct directory traversal.
    #[default]
    Walk,
    /// `**/*` glob with exclusion patterns.
    Glob,
}

impl EnumeratorKind {
    /// Builds the enumerator, pruning the given directory names.
    pub fn build(self, skip_dirs: &[String]) -> Box<dyn FileEnumerator> {
        match self {
            EnumeratorKind::Walk => Box::new(WalkEnumerator::new(skip_dirs.to_vec())),
            EnumeratorKind::Glob => Box::new(GlobEnumerator::new(skip_dirs)),
        }
    }
}

/// Walks the directory tree with `walkdir`, pruning skipped directory names.
#[derive(Debug, Clone)]
pub struct WalkEnumerator {
    skip_dirs: Vec<String>,
}

impl WalkEnumerator {
    pub fn new(skip_dirs: Vec<String>) -> Self {
        Self { skip_dirs }
    }
}

impl Default for WalkEnumerator {
    fn default() -> Self {
        Self::new(default_skip_dirs())
    }
}

impl FileEnumerator for WalkEnumerator {
    fn list_files(&self, root: &Path) -> OrganizeResult<FileListing> {
        let mut listing = FileListing::default();
        let walker = WalkDir::new(root).into_iter().filter_entry(|entry| {
            entry.depth() == 0
                || !entry.file_type().is_dir()
                || !self
                    .skip_dirs
                    .iter()
                    .any(|skip| entry.file_name().to_string_lossy() == skip.as_str())
        });

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) if e.depth() == 0 => {
                    return Err(OrganizeError::Enumerate {
                        path: root.to_path_buf(),
                        reason: e.to_string(),
                    });
                }
                Err(e) => {
                    let path = e.path().unwrap_or(root).to_path_buf();
                    listing.skip(path, e.to_string());
                    continue;
                }
            };
            if entry.file_type().is_file() {
                listing.files.push(entry.into_path());
            }
        }

        Ok(listing)
    }
}

/// Matches `**/*` under the root and drops anything inside an excluded directory.
#[derive(Debug, Clone)]
pub struct GlobEnumerator {
    excludes: Vec<Pattern>,
}

impl GlobEnumerator {
    /// One `**/<dir>/**` exclusion per skipped directory name.
    pub fn new(skip_dirs: &[String]) -> Self {
        let excludes = skip_dirs
            .iter()
            .filter_map(|dir| Pattern::new(&format!("**/{}/**", Pattern::escape(dir))).ok())
            .collect();
        Self { excludes }
    }

    fn is_excluded(&self, relative: &Path) -> bool {
        let options = MatchOptions {
            case_sensitive: true,
            require_literal_separator: true,
            require_literal_leading_dot: false,
        };
        self.excludes
            .iter()
            .any(|pattern| pattern.matches_path_with(relative, options))
    }
}

/// A real file under `root`, reached without going through a symlink.
///
/// `glob` follows symlinked directories, so every ancestor is checked as well.
fn is_regular_file(root: &Path, relative: &Path) -> bool {
    let is_file = fs::symlink_metadata(root.join(relative))
        .map(|meta| meta.file_type().is_file())
        .unwrap_or(false);
    is_file
        && relative
            .ancestors()
            .skip(1)
            .filter(|dir| !dir.as_os_str().is_empty())
            .all(|dir| {
                fs::symlink_metadata(root.join(dir))
                    .map(|meta| !meta.file_type().is_symlink())
                    .unwrap_or(false)
            })
}

impl Default for GlobEnumerator {
    fn default() -> Self {
        Self::new(&default_skip_dirs())
    }
}

impl FileEnumerator for GlobEnumerator {
    fn list_files(&self, root: &Path) -> OrganizeResult<FileListing> {
        let enumerate_error = |reason: String| OrganizeError::Enumerate {
            path: root.to_path_buf(),
            reason,
        };
        fs::read_dir(root).map_err(|e| enumerate_error(e.to_string()))?;

        let pattern = format!("{}/**/*", Pattern::escape(&root.to_string_lossy()));
        let options = MatchOptions {
            case_sensitive: true,
            require_literal_separator: false,
            require_literal_leading_dot: false,
        };
        let paths =
            glob::glob_with(&pattern, options).map_err(|e| enumerate_error(e.to_string()))?;

        let mut listing = FileListing::default();
        for path in paths {
            let path = match path {
                Ok(path) => path,
                Err(e) => {
                    let path = e.path().to_path_buf();
                    if !self.is_excluded(path.strip_prefix(root).unwrap_or(&path)) {
                        listing.skip(path, e.error().to_string());
                    }
                    continue;
                }
            };
            let relative = path.strip_prefix(root).unwrap_or(&path);
            if self.is_excluded(relative) || !is_regular_file(root, relative) {
                continue;
            }
            listing.files.push(path);
        }

        Ok(listing)
    }
}
