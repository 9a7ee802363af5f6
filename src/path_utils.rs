//! Small path helpers shared by the mover and the reference rewriter.
//!
//! References inside HTML/CSS/JS/PHP always use forward slashes, so every path
//! that ends up in file content goes through [`normalize_slashes`] first.

use std::fs;
use std::path::{Path, PathBuf};

/// Replaces every backslash with a forward slash.
///
/// # Examples
///
/// ```
/// use webtidy::path_utils::normalize_slashes;
///
/// assert_eq!(normalize_slashes(r"img\logo.png"), "img/logo.png");
/// ```
pub fn normalize_slashes(path: &str) -> String {
    path.replace('\\', "/")
}

/// Escapes a literal file name so it can be embedded in a regex.
pub fn escape_literal(name: &str) -> String {
    regex::escape(name)
}

/// Looks for a regular file in the same directory whose name matches ignoring case.
///
/// Returns `None` if the directory can't be read or nothing matches.
pub fn find_case_insensitive(path: &Path) -> Option<PathBuf> {
    let dir = path.parent()?;
    let target = path.file_name()?.to_string_lossy().to_lowercase();

    let entries = fs::read_dir(dir).ok()?;
    entries
        .flatten()
        .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
        .find(|entry| entry.file_name().to_string_lossy().to_lowercase() == target)
        .map(|entry| entry.path())
}

/// Path of `target` as seen from `from_dir`, with forward slashes.
///
/// Falls back to the normalized `target` itself when no relative form exists
/// (for instance on different Windows drives).
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use webtidy::path_utils::relative_reference;
///
/// let r = relative_reference(Path::new("/site/pages"), Path::new("/site/img/logo.png"));
/// assert_eq!(r, "../img/logo.png");
/// ```
pub fn relative_reference(from_dir: &Path, target: &Path) -> String {
    let relative = pathdiff::diff_paths(target, from_dir).unwrap_or_else(|| target.to_path_buf());
    normalize_slashes(&relative.to_string_lossy())
}

/// Path of `path` relative to the project root, with forward slashes.
pub fn root_relative(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    normalize_slashes(&relative.to_string_lossy())
}

/// Lower-cased extension without the dot, if any.
pub fn lowercase_extension(path: &Path) -> Option<String> {
    path.extension().map(|ext| ext.to_string_lossy().to_lowercase())
}
