//! webtidy - reorganize a flat web project into typed asset folders
//!
//! This library moves root-level files of a web project into `css/`, `js/`,
//! `img/`, `video/`, `audio/`, `fonts/`, `data/`, `files/` and `includes/`
//! without overwriting anything, then rewrites every reference to the moved
//! files in HTML, CSS, JS and PHP sources so the project keeps working.

pub mod cli;
pub mod collision;
pub mod config;
pub mod enumerator;
pub mod file_category;
pub mod file_organizer;
pub mod logging;
pub mod organizer;
pub mod output;
pub mod path_utils;
pub mod rewriter;

pub use config::{CompiledFilters, ConfigError, WebtidyConfig};
pub use enumerator::{EnumeratorKind, FileEnumerator, FileListing, GlobEnumerator, WalkEnumerator};
pub use file_category::{Category, Classifier};
pub use file_organizer::{FileOrganizer, MoveRecord, OrganizeError, SkipRecord};
pub use organizer::{OrganizeReport, RunOptions, organize_project};
pub use output::{ConsoleNotifier, Notifier, NullNotifier};
pub use rewriter::{ErrorPolicy, ReferenceRewriter, RewriteOptions};

pub use cli::{Cli, CliError, run_cli};
