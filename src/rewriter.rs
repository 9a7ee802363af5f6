//! Reference rewriting after the move phase.
//!
//! There is no HTML/CSS/JS/PHP parser here. Each moved file gets an ordered list
//! of regex passes, from the most specific context (`href="..."`) down to a loose
//! quoted mention. Every pass tolerates any run of `./` and `../` in front of the
//! file name and keeps the surrounding quotes and brackets intact.
//!
//! New references are computed relative to the directory of the file being
//! rewritten, so `pages/about.html` gets `../img/logo.png` while `index.html`
//! gets `img/logo.png`.

use crate::file_organizer::{MoveRecord, OrganizeError, OrganizeResult, SkipRecord};
use crate::path_utils::{escape_literal, lowercase_extension, relative_reference};
use regex::{Captures, Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Extensions of files whose references get rewritten.
pub const TEXT_EXTENSIONS: [&str; 5] = ["html", "htm", "php", "css", "js"];

/// Any run of `./` or `../` segments before the file name.
const LEADING_SEGMENTS: &str = r"(?:\./?|\.\./)*";

/// What to do when a text file can't be read or written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorPolicy {
    /// Record the file and keep going.
    #[default]
    Skip,
    /// Stop the run with an error.
    Abort,
}

/// Options for the rewrite phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RewriteOptions {
    /// Run the last-resort loose-mention pass.
    pub loose_mentions: bool,
    pub on_error: ErrorPolicy,
}

impl Default for RewriteOptions {
    fn default() -> Self {
        Self {
            loose_mentions: true,
            on_error: ErrorPolicy::Skip,
        }
    }
}

/// How a match is turned back into text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Replacement {
    /// `$1 + new path + $2`
    KeepDelimiters,
    /// `include("new path")`
    PhpCall,
    /// `include "new path"`
    PhpStatement,
}

impl Replacement {
    fn render(self, caps: &Captures<'_>, new_ref: &str) -> String {
        match self {
            Replacement::KeepDelimiters => {
                let closing = caps.get(2).map_or("", |m| m.as_str());
                format!("{}{}{}", &caps[1], new_ref, closing)
            }
            Replacement::PhpCall => format!("{}(\"{}\")", &caps[1], new_ref),
            Replacement::PhpStatement => format!("{} \"{}\"", &caps[1], new_ref),
        }
    }
}

/// One entry of the ordered pass table.
///
/// `template` contains `{lead}` and `{name}` placeholders, filled with
/// [`LEADING_SEGMENTS`] and the escaped file name.
///
/// When `followed_by` is set the template does not match the closing delimiter.
/// The character right after a match is checked instead and left in place, so it
/// can still open the next mention.
#[derive(Debug, Clone, Copy)]
pub struct RewritePattern {
    pub name: &'static str,
    pub template: &'static str,
    pub case_insensitive: bool,
    pub replacement: Replacement,
    pub followed_by: Option<fn(char) -> bool>,
}

impl RewritePattern {
    /// Compiles this pass for one file name.
    pub fn compile(&self, file_name: &str) -> Result<Regex, regex::Error> {
        let pattern = self
            .template
            .replace("{lead}", LEADING_SEGMENTS)
            .replace("{name}", &escape_literal(file_name));
        RegexBuilder::new(&pattern)
            .case_insensitive(self.case_insensitive)
            .build()
    }

    fn is_loose(&self) -> bool {
        self.name == "loose"
    }
}

/// The passes, most specific first. Order matters.
pub const PATTERNS: [RewritePattern; 9] = [
    RewritePattern {
        name: "href",
        template: r#"(href\s*=\s*["']){lead}{name}(["'])"#,
        case_insensitive: true,
        replacement: Replacement::KeepDelimiters,
        followed_by: None,
    },
    RewritePattern {
        name: "src",
        template: r#"(src\s*=\s*["']){lead}{name}(["'])"#,
        case_insensitive: true,
        replacement: Replacement::KeepDelimiters,
        followed_by: None,
    },
    RewritePattern {
        name: "css-url",
        template: r#"(url\(\s*["']?){lead}{name}(["']?\s*\))"#,
        case_insensitive: true,
        replacement: Replacement::KeepDelimiters,
        followed_by: None,
    },
    RewritePattern {
        name: "import-from",
        template: r#"(from\s+["']){lead}{name}(["'])"#,
        case_insensitive: true,
        replacement: Replacement::KeepDelimiters,
        followed_by: None,
    },
    RewritePattern {
        name: "import-bare",
        template: r#"(import\s+["']){lead}{name}(["'])"#,
        case_insensitive: true,
        replacement: Replacement::KeepDelimiters,
        followed_by: None,
    },
    RewritePattern {
        name: "css-import",
        template: r#"(@import\s+(?:url\(\s*)?["']){lead}{name}(["']\s*\)?;)"#,
        case_insensitive: true,
        replacement: Replacement::KeepDelimiters,
        followed_by: None,
    },
    RewritePattern {
        name: "php-include-call",
        template: r#"(include_once|include|require_once|require)\s*\(\s*["']{lead}{name}["']\s*\)"#,
        case_insensitive: true,
        replacement: Replacement::PhpCall,
        followed_by: None,
    },
    RewritePattern {
        name: "php-include-statement",
        template: r#"(include_once|include|require_once|require)\s+["']{lead}{name}["']"#,
        case_insensitive: true,
        replacement: Replacement::PhpStatement,
        followed_by: None,
    },
    RewritePattern {
        name: "loose",
        template: r#"(["'(\s]){lead}{name}"#,
        case_insensitive: false,
        replacement: Replacement::KeepDelimiters,
        followed_by: Some(closes_loose_mention),
    },
];

/// Quote, closing parenthesis or whitespace.
fn closes_loose_mention(c: char) -> bool {
    matches!(c, '"' | '\'' | ')') || c.is_whitespace()
}

struct CompiledPass {
    regex: Regex,
    replacement: Replacement,
    followed_by: Option<fn(char) -> bool>,
}

impl CompiledPass {
    /// Replaces every match in `haystack`. Returns `None` when nothing matched.
    fn apply(&self, haystack: &str, new_ref: &str) -> Option<String> {
        let render = |caps: &Captures<'_>| self.replacement.render(caps, new_ref);
        match self.followed_by {
            None => match self.regex.replace_all(haystack, render) {
                Cow::Owned(updated) => Some(updated),
                Cow::Borrowed(_) => None,
            },
            Some(boundary) => replace_followed_by(&self.regex, haystack, boundary, render),
        }
    }
}

/// `replace_all`, restricted to matches whose next character satisfies `boundary`.
///
/// The next character is not consumed, so adjacent mentions sharing one
/// delimiter are all replaced.
fn replace_followed_by<F>(
    regex: &Regex,
    haystack: &str,
    boundary: fn(char) -> bool,
    render: F,
) -> Option<String>
where
    F: Fn(&Captures<'_>) -> String,
{
    let mut out = String::with_capacity(haystack.len());
    let mut copied = 0;
    let mut pos = 0;
    let mut changed = false;

    while pos <= haystack.len() {
        let Some(caps) = regex.captures_at(haystack, pos) else {
            break;
        };
        let Some(whole) = caps.get(0) else {
            break;
        };

        if haystack[whole.end()..].chars().next().is_some_and(boundary) {
            out.push_str(&haystack[copied..whole.start()]);
            out.push_str(&render(&caps));
            copied = whole.end();
            pos = whole.end();
            changed = true;
        } else {
            let step = haystack[whole.start()..]
                .chars()
                .next()
                .map_or(1, char::len_utf8);
            pos = whole.start() + step;
        }
    }

    if !changed {
        return None;
    }
    out.push_str(&haystack[copied..]);
    Some(out)
}

struct CompiledRecord {
    old_name: String,
    target: PathBuf,
    passes: Vec<CompiledPass>,
}

/// Rewrites references to a fixed set of moved files.
///
/// Records are applied longest original name first so a short name can never
/// eat part of a longer one.
pub struct ReferenceRewriter {
    records: Vec<CompiledRecord>,
    options: RewriteOptions,
}

impl ReferenceRewriter {
    /// Compiles every pass for every moved file.
    ///
    /// # Errors
    ///
    /// Returns a regex error if a compiled pattern exceeds the regex size limits.
    pub fn new(moved: &[MoveRecord], options: RewriteOptions) -> Result<Self, regex::Error> {
        let mut sorted: Vec<&MoveRecord> = moved.iter().collect();
        sorted.sort_by(|a, b| b.old_name.len().cmp(&a.old_name.len()));

        let records = sorted
            .into_iter()
            .map(|record| {
                let passes = PATTERNS
                    .iter()
                    .filter(|pattern| options.loose_mentions || !pattern.is_loose())
                    .map(|pattern| {
                        Ok(CompiledPass {
                            regex: pattern.compile(&record.old_name)?,
                            replacement: pattern.replacement,
                            followed_by: pattern.followed_by,
                        })
                    })
                    .collect::<Result<Vec<_>, regex::Error>>()?;
                Ok(CompiledRecord {
                    old_name: record.old_name.clone(),
                    target: record.new_absolute_path.clone(),
                    passes,
                })
            })
            .collect::<Result<Vec<_>, regex::Error>>()?;

        Ok(Self { records, options })
    }

    /// Original names in the order they are applied.
    pub fn application_order(&self) -> Vec<&str> {
        self.records.iter().map(|r| r.old_name.as_str()).collect()
    }

    /// Rewrites `content` as seen from a file living in `referencing_dir`.
    ///
    /// Returns `Cow::Borrowed` when nothing matched.
    pub fn rewrite_content<'a>(&self, content: &'a str, referencing_dir: &Path) -> Cow<'a, str> {
        let mut current: Cow<'a, str> = Cow::Borrowed(content);

        for record in &self.records {
            let new_ref = relative_reference(referencing_dir, &record.target);
            for pass in &record.passes {
                if let Some(updated) = pass.apply(&current, &new_ref) {
                    current = Cow::Owned(updated);
                }
            }
        }

        current
    }

    /// Rewrites one file in place. Returns whether its content changed.
    pub fn rewrite_file(&self, path: &Path) -> io::Result<bool> {
        let content = fs::read_to_string(path)?;
        let referencing_dir = path.parent().unwrap_or_else(|| Path::new(""));

        match self.rewrite_content(&content, referencing_dir) {
            Cow::Owned(updated) if updated != content => {
                fs::write(path, updated)?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

/// True for files the rewrite phase reads (html, htm, php, css, js).
pub fn is_text_file(path: &Path) -> bool {
    lowercase_extension(path).is_some_and(|ext| TEXT_EXTENSIONS.contains(&ext.as_str()))
}

/// Outcome of the rewrite phase.
#[derive(Debug, Default, Serialize)]
pub struct RewriteSummary {
    /// Text files read.
    pub scanned: usize,
    /// Files whose content changed.
    pub rewritten: Vec<PathBuf>,
    /// Files that couldn't be read or written (skip policy only).
    pub failed: Vec<SkipRecord>,
}

/// Rewrites references to `moved` in every eligible file of `files`.
///
/// # Errors
///
/// Returns [`OrganizeError::Rewrite`] on the first I/O failure when the policy
/// is [`ErrorPolicy::Abort`].
pub fn rewrite_references(
    moved: &[MoveRecord],
    files: &[PathBuf],
    options: RewriteOptions,
) -> OrganizeResult<RewriteSummary> {
    rewrite_references_with_progress(moved, files, options, |_| {})
}

/// Same as [`rewrite_references`], calling `on_file` after each scanned file.
pub fn rewrite_references_with_progress<F>(
    moved: &[MoveRecord],
    files: &[PathBuf],
    options: RewriteOptions,
    mut on_file: F,
) -> OrganizeResult<RewriteSummary>
where
    F: FnMut(&Path),
{
    let rewriter = ReferenceRewriter::new(moved, options)?;
    let mut summary = RewriteSummary::default();

    for path in files.iter().filter(|p| is_text_file(p)) {
        summary.scanned += 1;
        match rewriter.rewrite_file(path) {
            Ok(true) => {
                debug!(file = %path.display(), "references updated");
                summary.rewritten.push(path.clone());
            }
            Ok(false) => {}
            Err(e) => match options.on_error {
                ErrorPolicy::Skip => {
                    warn!(file = %path.display(), error = %e, "could not rewrite references");
                    summary.failed.push(SkipRecord {
                        file_path: path.clone(),
                        reason: format!("{:?}: {}", e.kind(), e),
                    });
                }
                ErrorPolicy::Abort => {
                    return Err(OrganizeError::Rewrite {
                        path: path.clone(),
                        source: e,
                    });
                }
            },
        }
        on_file(path);
    }

    Ok(summary)
}
