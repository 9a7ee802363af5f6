//! Collision-free destination names.
//!
//! An existing entry in a category folder is never overwritten: if `photo.png`
//! is taken the mover gets `photo-1.png`, then `photo-2.png`, and so on.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::trace;

/// Returns a path inside `target_dir` that does not exist yet.
///
/// Creates `target_dir` (recursively) first. The check is made against the
/// current filesystem state only; nothing is reserved.
///
/// # Errors
///
/// Returns the underlying I/O error if `target_dir` can't be created.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use webtidy::collision::resolve_destination;
///
/// let dest = resolve_destination(Path::new("/site/img"), "photo.png")?;
/// println!("moving to {}", dest.display());
/// # Ok::<(), std::io::Error>(())
/// ```
pub fn resolve_destination(target_dir: &Path, file_name: &str) -> io::Result<PathBuf> {
    fs::create_dir_all(target_dir)?;

    let candidate = target_dir.join(file_name);
    if !is_taken(&candidate) {
        return Ok(candidate);
    }

    let (stem, ext) = split_name(file_name);
    let mut counter: u64 = 1;
    loop {
        let name = match ext {
            Some(ext) => format!("{}-{}.{}", stem, counter, ext),
            None => format!("{}-{}", stem, counter),
        };
        let candidate = target_dir.join(name);
        if !is_taken(&candidate) {
            trace!(file = file_name, attempts = counter, "resolved name collision");
            return Ok(candidate);
        }
        counter += 1;
    }
}

/// Splits `name` into stem and extension. A leading dot does not start an extension.
fn split_name(name: &str) -> (&str, Option<&str>) {
    match name.rfind('.') {
        Some(0) | None => (name, None),
        Some(idx) => (&name[..idx], Some(&name[idx + 1..])),
    }
}

/// Anything at the path counts as taken, including dangling symlinks.
fn is_taken(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}
