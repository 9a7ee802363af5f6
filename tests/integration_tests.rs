/// Integration tests for webtidy
///
/// These tests build small web projects in a temporary directory and run the
/// complete move-then-rewrite pipeline against them.
///
/// Test categories:
/// 1. Basic organization and reference rewriting
/// 2. Collisions and skipped files
/// 3. Nested referencing files and PHP includes
/// 4. Enumerators and configuration
/// 5. Binary smoke tests
use assert_cmd::Command;
use predicates::prelude::*;
use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tempfile::TempDir;
use webtidy::enumerator::{FileListing, GlobEnumerator};
use webtidy::file_organizer::{FileOrganizer, OrganizeResult};
use webtidy::{
    Classifier, CompiledFilters, FileEnumerator, Notifier, OrganizeError, ReferenceRewriter,
    RewriteOptions, RunOptions, SkipRecord, WalkEnumerator, WebtidyConfig, organize_project,
};

// ============================================================================
// Test Utilities
// ============================================================================

/// A temporary project root with helpers for building and inspecting it.
struct TestFixture {
    temp_dir: TempDir,
}

impl TestFixture {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        TestFixture { temp_dir }
    }

    fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Create a file (and its parent directories) with text content.
    fn create_text_file(&self, rel_path: &str, content: &str) {
        let path = self.path().join(rel_path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        fs::write(&path, content).expect("Failed to write file content");
    }

    fn read(&self, rel_path: &str) -> String {
        fs::read_to_string(self.path().join(rel_path)).expect("Failed to read file")
    }

    fn assert_file_exists(&self, rel_path: &str) {
        let path = self.path().join(rel_path);
        assert!(
            path.is_file(),
            "File should exist: {}",
            path.display()
        );
    }

    fn assert_not_exists(&self, rel_path: &str) {
        let path = self.path().join(rel_path);
        assert!(!path.exists(), "Path should not exist: {}", path.display());
    }

    fn organize(&self) -> webtidy::OrganizeReport {
        organize_project(self.path(), &RunOptions::default()).expect("organize failed")
    }
}

/// Records every notification for later inspection.
#[derive(Clone, Default)]
struct RecordingNotifier {
    messages: Rc<RefCell<Vec<String>>>,
}

impl Notifier for RecordingNotifier {
    fn success(&self, message: &str) {
        self.messages.borrow_mut().push(format!("success: {}", message));
    }

    fn warning(&self, message: &str) {
        self.messages.borrow_mut().push(format!("warning: {}", message));
    }

    fn error(&self, message: &str) {
        self.messages.borrow_mut().push(format!("error: {}", message));
    }

    fn info(&self, message: &str) {
        self.messages.borrow_mut().push(format!("info: {}", message));
    }
}

impl RecordingNotifier {
    /// Success, warning and error messages, without progress info.
    fn outcomes(&self) -> Vec<String> {
        self.messages
            .borrow()
            .iter()
            .filter(|m| !m.starts_with("info: "))
            .cloned()
            .collect()
    }
}

// ============================================================================
// Basic Organization
// ============================================================================

#[test]
fn test_end_to_end_moves_and_rewrites() {
    let fixture = TestFixture::new();
    fixture.create_text_file(
        "index.html",
        r#"<link rel="stylesheet" href="style.css"><img src="./logo.png">"#,
    );
    fixture.create_text_file("style.css", "body { color: red; }");
    fixture.create_text_file("logo.png", "png");

    let report = fixture.organize();

    fixture.assert_file_exists("css/style.css");
    fixture.assert_file_exists("img/logo.png");
    fixture.assert_file_exists("index.html");
    fixture.assert_not_exists("style.css");
    fixture.assert_not_exists("logo.png");

    assert_eq!(
        fixture.read("index.html"),
        r#"<link rel="stylesheet" href="css/style.css"><img src="img/logo.png">"#
    );
    assert_eq!(report.moved.len(), 2);
    assert!(report.skipped.is_empty());
    assert_eq!(report.rewritten.len(), 1);
}

#[test]
fn test_every_category_folder() {
    let fixture = TestFixture::new();
    for name in [
        "a.css",
        "b.js",
        "c.svg",
        "d.mp4",
        "e.mp3",
        "f.woff2",
        "g.json",
        "h.pdf",
        "header.php",
    ] {
        fixture.create_text_file(name, "");
    }
    fixture.create_text_file("contact.php", "");
    fixture.create_text_file("about.htm", "");
    fixture.create_text_file(".htaccess", "");
    fixture.create_text_file("package.json", "{}");

    fixture.organize();

    for rel in [
        "css/a.css",
        "js/b.js",
        "img/c.svg",
        "video/d.mp4",
        "audio/e.mp3",
        "fonts/f.woff2",
        "data/g.json",
        "files/h.pdf",
        "includes/header.php",
        "contact.php",
        "about.htm",
        ".htaccess",
        "package.json",
    ] {
        fixture.assert_file_exists(rel);
    }
}

#[test]
fn test_subdirectories_are_never_moved() {
    let fixture = TestFixture::new();
    fixture.create_text_file("assets/old.css", "");
    fixture.create_text_file("main.js", "");

    fixture.organize();

    fixture.assert_file_exists("assets/old.css");
    fixture.assert_file_exists("js/main.js");
    fixture.assert_not_exists("css");
}

#[test]
fn test_second_run_changes_nothing() {
    let fixture = TestFixture::new();
    fixture.create_text_file("index.html", r#"<script src="app.js"></script>"#);
    fixture.create_text_file("app.js", "console.log('hi');");

    fixture.organize();
    let after_first = fixture.read("index.html");

    let report = fixture.organize();

    assert!(report.moved.is_empty());
    assert_eq!(fixture.read("index.html"), after_first);
    assert_eq!(after_first, r#"<script src="js/app.js"></script>"#);
}

#[test]
fn test_nothing_to_move_is_silent() {
    let fixture = TestFixture::new();
    fixture.create_text_file("index.html", "<p>hello</p>");

    let notifier = RecordingNotifier::default();
    let messages = notifier.messages.clone();
    let options = RunOptions::default().with_notifier(Box::new(notifier));

    let report = organize_project(fixture.path(), &options).expect("organize failed");

    assert!(report.moved.is_empty());
    assert!(messages.borrow().is_empty());
    assert_eq!(fixture.read("index.html"), "<p>hello</p>");
}

#[test]
fn test_success_is_reported_once() {
    let fixture = TestFixture::new();
    fixture.create_text_file("a.png", "");
    fixture.create_text_file("b.png", "");

    let notifier = RecordingNotifier::default();
    let options = RunOptions::default().with_notifier(Box::new(notifier.clone()));
    organize_project(fixture.path(), &options).expect("organize failed");

    let outcomes = notifier.outcomes();
    assert_eq!(outcomes.len(), 1);
    assert!(outcomes[0].starts_with("success: Moved 2 file(s)"));
    assert!(
        notifier
            .messages
            .borrow()
            .iter()
            .any(|m| m.starts_with("info: Updating references"))
    );
}

#[test]
fn test_missing_root_reports_error() {
    let fixture = TestFixture::new();
    let missing = fixture.path().join("nope");

    let notifier = RecordingNotifier::default();
    let messages = notifier.messages.clone();
    let options = RunOptions::default().with_notifier(Box::new(notifier));

    let result = organize_project(&missing, &options);

    assert!(matches!(result, Err(OrganizeError::InvalidRoot { .. })));
    let messages = messages.borrow();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].starts_with("error: "));
}

// ============================================================================
// Collisions and Skips
// ============================================================================

#[test]
fn test_collision_gets_numeric_suffix() {
    let fixture = TestFixture::new();
    fixture.create_text_file("img/photo.png", "existing");
    fixture.create_text_file("photo.png", "incoming");
    fixture.create_text_file("index.html", r#"<img src="photo.png">"#);

    let report = fixture.organize();

    assert_eq!(fixture.read("img/photo.png"), "existing");
    assert_eq!(fixture.read("img/photo-1.png"), "incoming");
    assert_eq!(report.moved[0].new_relative_path, "img/photo-1.png");
    assert_eq!(fixture.read("index.html"), r#"<img src="img/photo-1.png">"#);
}

#[test]
fn test_collision_skips_taken_suffixes() {
    let fixture = TestFixture::new();
    fixture.create_text_file("files/notes", "0");
    fixture.create_text_file("files/notes-1", "1");
    fixture.create_text_file("notes", "new");

    fixture.organize();

    assert_eq!(fixture.read("files/notes-2"), "new");
    assert_eq!(fixture.read("files/notes"), "0");
    assert_eq!(fixture.read("files/notes-1"), "1");
}

#[test]
fn test_vanished_source_is_skipped() {
    let fixture = TestFixture::new();
    fixture.create_text_file("gone.png", "");
    fixture.create_text_file("kept.png", "");

    let classifier = Classifier::default();
    let plans = FileOrganizer::plan_moves(fixture.path(), &classifier, &CompiledFilters::default())
        .expect("plan failed");
    assert_eq!(plans.len(), 2);

    fs::remove_file(fixture.path().join("gone.png")).unwrap();
    let phase = FileOrganizer::execute_moves(fixture.path(), &plans).expect("execute failed");

    assert_eq!(phase.moved.len(), 1);
    assert_eq!(phase.moved[0].old_name, "kept.png");
    assert_eq!(phase.skipped.len(), 1);
    assert!(phase.skipped[0].file_path.ends_with("gone.png"));
    assert_eq!(phase.skipped[0].reason, "source missing");
    fixture.assert_file_exists("img/kept.png");
}

#[cfg(unix)]
#[test]
fn test_locked_category_folder_skips_file() {
    use std::os::unix::fs::PermissionsExt;

    let fixture = TestFixture::new();
    fixture.create_text_file("logo.png", "png");
    fixture.create_text_file("style.css", "");
    fixture.create_text_file(
        "index.html",
        r#"<link href="style.css"><img src="logo.png">"#,
    );
    let img = fixture.path().join("img");
    fs::create_dir(&img).unwrap();
    fs::set_permissions(&img, fs::Permissions::from_mode(0o555)).unwrap();

    // Privileged users write through the mode bits.
    let canary = img.join(".write-check");
    if fs::write(&canary, "").is_ok() {
        fs::remove_file(&canary).unwrap();
        fs::set_permissions(&img, fs::Permissions::from_mode(0o755)).unwrap();
        return;
    }

    let notifier = RecordingNotifier::default();
    let options = RunOptions::default().with_notifier(Box::new(notifier.clone()));
    let report = organize_project(fixture.path(), &options);
    fs::set_permissions(&img, fs::Permissions::from_mode(0o755)).unwrap();
    let report = report.expect("organize failed");

    assert_eq!(report.moved.len(), 1);
    assert_eq!(report.moved[0].old_name, "style.css");
    assert_eq!(report.skipped.len(), 1);
    assert!(report.skipped[0].file_path.ends_with("logo.png"));
    assert!(report.skipped[0].reason.starts_with("PermissionDenied"));

    fixture.assert_file_exists("logo.png");
    fixture.assert_file_exists("css/style.css");
    fixture.assert_not_exists("img/logo.png");
    assert_eq!(
        fixture.read("index.html"),
        r#"<link href="css/style.css"><img src="logo.png">"#
    );

    let warnings: Vec<_> = notifier
        .outcomes()
        .into_iter()
        .filter(|m| m.starts_with("warning: "))
        .collect();
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].contains("logo.png [PermissionDenied"));
}

/// Walks the project, then adds one directory that could not be read.
struct PartlyUnreadable {
    locked: PathBuf,
}

impl FileEnumerator for PartlyUnreadable {
    fn list_files(&self, root: &Path) -> OrganizeResult<FileListing> {
        let mut listing = WalkEnumerator::default().list_files(root)?;
        listing.unreadable.push(SkipRecord {
            file_path: self.locked.clone(),
            reason: "PermissionDenied: Permission denied (os error 13)".to_string(),
        });
        Ok(listing)
    }
}

#[test]
fn test_unreadable_directory_does_not_stop_rewrite() {
    let fixture = TestFixture::new();
    fixture.create_text_file("app.js", "");
    fixture.create_text_file("index.html", r#"<script src="app.js"></script>"#);
    let locked = fixture.path().join("cache");

    let notifier = RecordingNotifier::default();
    let options = RunOptions::default()
        .with_notifier(Box::new(notifier.clone()))
        .with_enumerator(Box::new(PartlyUnreadable {
            locked: locked.clone(),
        }));
    let report = organize_project(fixture.path(), &options).expect("organize failed");

    assert_eq!(
        fixture.read("index.html"),
        r#"<script src="js/app.js"></script>"#
    );
    assert_eq!(report.rewrite_failures.len(), 1);
    assert_eq!(report.rewrite_failures[0].file_path, locked);

    let outcomes = notifier.outcomes();
    assert_eq!(outcomes.len(), 2);
    assert!(outcomes[0].starts_with("warning: References could not be updated in: cache ["));
    assert!(outcomes[1].starts_with("success: "));
}

// ============================================================================
// Nested Referencing Files and PHP
// ============================================================================

#[test]
fn test_nested_page_gets_parent_relative_paths() {
    let fixture = TestFixture::new();
    fixture.create_text_file("logo.png", "");
    fixture.create_text_file("site.js", "");
    fixture.create_text_file(
        "pages/about.html",
        r#"<img src="../logo.png"><script src="../site.js"></script>"#,
    );

    fixture.organize();

    assert_eq!(
        fixture.read("pages/about.html"),
        r#"<img src="../img/logo.png"><script src="../js/site.js"></script>"#
    );
}

#[test]
fn test_moved_stylesheet_is_rewritten_from_its_new_home() {
    let fixture = TestFixture::new();
    fixture.create_text_file("style.css", "h1 { background: url('hero.jpg'); }");
    fixture.create_text_file("hero.jpg", "");

    fixture.organize();

    assert_eq!(
        fixture.read("css/style.css"),
        "h1 { background: url('../img/hero.jpg'); }"
    );
}

#[test]
fn test_php_includes_are_rewritten() {
    let fixture = TestFixture::new();
    fixture.create_text_file("header.php", "<header></header>");
    fixture.create_text_file("inc_nav.php", "<nav></nav>");
    fixture.create_text_file(
        "index.php",
        "<?php include 'header.php'; require_once('inc_nav.php'); ?>",
    );

    fixture.organize();

    fixture.assert_file_exists("includes/header.php");
    fixture.assert_file_exists("includes/inc_nav.php");
    assert_eq!(
        fixture.read("index.php"),
        r#"<?php include "includes/header.php"; require_once("includes/inc_nav.php"); ?>"#
    );
}

#[test]
fn test_js_imports_and_loose_mentions() {
    let fixture = TestFixture::new();
    fixture.create_text_file("util.js", "export const x = 1;");
    fixture.create_text_file("data.json", "{}");
    fixture.create_text_file(
        "main.js",
        "import { x } from './util.js';\nfetch('data.json');",
    );

    fixture.organize();

    // util.js now sits next to main.js, so the leading ./ is dropped.
    assert_eq!(
        fixture.read("js/main.js"),
        "import { x } from 'util.js';\nfetch('../data/data.json');"
    );
}

#[test]
fn test_loose_mentions_can_be_disabled() {
    let fixture = TestFixture::new();
    fixture.create_text_file("data.json", "{}");
    fixture.create_text_file("index.html", "<script>fetch('data.json')</script>");

    let mut config = WebtidyConfig::default();
    config.organize.loose_mentions = false;
    let options = RunOptions::from_config(&config).expect("config");
    organize_project(fixture.path(), &options).expect("organize failed");

    fixture.assert_file_exists("data/data.json");
    assert_eq!(
        fixture.read("index.html"),
        "<script>fetch('data.json')</script>"
    );
}

#[test]
fn test_longer_names_are_applied_first() {
    let moved = [
        webtidy::MoveRecord {
            old_name: "a.js".to_string(),
            new_relative_path: "js/a.js".to_string(),
            new_absolute_path: PathBuf::from("/site/js/a.js"),
        },
        webtidy::MoveRecord {
            old_name: "vendor-a.js".to_string(),
            new_relative_path: "js/vendor-a.js".to_string(),
            new_absolute_path: PathBuf::from("/site/js/vendor-a.js"),
        },
    ];
    let rewriter = ReferenceRewriter::new(&moved, RewriteOptions::default()).expect("compile");

    assert_eq!(rewriter.application_order(), vec!["vendor-a.js", "a.js"]);
    assert_eq!(
        rewriter.rewrite_content(
            r#"<script src="vendor-a.js"></script><script src="a.js"></script>"#,
            Path::new("/site")
        ),
        r#"<script src="js/vendor-a.js"></script><script src="js/a.js"></script>"#
    );
}

// ============================================================================
// Enumerators and Configuration
// ============================================================================

#[test]
fn test_skip_dirs_are_not_rewritten() {
    let fixture = TestFixture::new();
    fixture.create_text_file("style.css", "");
    fixture.create_text_file("node_modules/pkg/index.js", "load('style.css');");
    fixture.create_text_file("index.html", r#"<link href="style.css">"#);

    fixture.organize();

    assert_eq!(
        fixture.read("node_modules/pkg/index.js"),
        "load('style.css');"
    );
    assert_eq!(fixture.read("index.html"), r#"<link href="css/style.css">"#);
}

#[test]
fn test_glob_enumerator_run() {
    let fixture = TestFixture::new();
    fixture.create_text_file("logo.png", "");
    fixture.create_text_file("blog/post.html", r#"<img src="../logo.png">"#);
    fixture.create_text_file(".git/notes.html", r#"<img src="logo.png">"#);

    let options = RunOptions::default().with_enumerator(Box::new(GlobEnumerator::new(&[
        ".git".to_string(),
    ])));
    let report = organize_project(fixture.path(), &options).expect("organize failed");

    assert_eq!(report.rewritten.len(), 1);
    assert_eq!(
        fixture.read("blog/post.html"),
        r#"<img src="../img/logo.png">"#
    );
    assert_eq!(fixture.read(".git/notes.html"), r#"<img src="logo.png">"#);
}

#[test]
fn test_local_config_excludes_and_maps() {
    let fixture = TestFixture::new();
    fixture.create_text_file(
        ".webtidyrc.toml",
        r#"
[organize]
reserved = ["robots.txt"]

[organize.extensions]
pdf = "data"

[exclude]
filenames = ["keep.png"]
patterns = ["*.tmp"]
"#,
    );
    fixture.create_text_file("keep.png", "");
    fixture.create_text_file("scratch.tmp", "");
    fixture.create_text_file("robots.txt", "");
    fixture.create_text_file("report.pdf", "");
    fixture.create_text_file("move.png", "");

    let config = WebtidyConfig::load(None, fixture.path()).expect("config");
    let options = RunOptions::from_config(&config).expect("options");
    organize_project(fixture.path(), &options).expect("organize failed");

    fixture.assert_file_exists("keep.png");
    fixture.assert_file_exists("scratch.tmp");
    fixture.assert_file_exists("robots.txt");
    fixture.assert_file_exists(".webtidyrc.toml");
    fixture.assert_file_exists("data/report.pdf");
    fixture.assert_file_exists("img/move.png");
}

// ============================================================================
// Binary Smoke Tests
// ============================================================================

fn webtidy_bin() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_webtidy"));
    cmd.env("NO_COLOR", "1");
    cmd
}

#[test]
fn test_binary_yes_moves_files() {
    let fixture = TestFixture::new();
    fixture.create_text_file("index.html", r#"<img src="logo.png">"#);
    fixture.create_text_file("logo.png", "");

    webtidy_bin()
        .arg(fixture.path())
        .arg("--yes")
        .assert()
        .success()
        .stdout(predicate::str::contains("logo.png → img/logo.png"));

    fixture.assert_file_exists("img/logo.png");
    assert_eq!(fixture.read("index.html"), r#"<img src="img/logo.png">"#);
}

#[test]
fn test_binary_dry_run_touches_nothing() {
    let fixture = TestFixture::new();
    fixture.create_text_file("style.css", "");

    webtidy_bin()
        .arg(fixture.path())
        .arg("--dry-run")
        .assert()
        .success()
        .stdout(predicate::str::contains("[DRY RUN]"))
        .stdout(predicate::str::contains("style.css → css/"));

    fixture.assert_file_exists("style.css");
    fixture.assert_not_exists("css");
}

#[test]
fn test_binary_json_report() {
    let fixture = TestFixture::new();
    fixture.create_text_file("font.ttf", "");

    let output = webtidy_bin()
        .arg(fixture.path())
        .args(["--yes", "--json"])
        .output()
        .expect("spawn binary");
    assert!(output.status.success());

    let report: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout should be JSON");
    assert_eq!(report["moved"][0]["old_name"], "font.ttf");
    assert_eq!(report["moved"][0]["new_relative_path"], "fonts/font.ttf");
}

#[test]
fn test_binary_missing_root_fails() {
    let fixture = TestFixture::new();

    webtidy_bin()
        .arg(fixture.path().join("missing"))
        .arg("--yes")
        .assert()
        .failure();
}
