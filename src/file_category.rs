//! Classification of root-level project files into asset folders.
//!
//! This module maps a file name to the folder it belongs in (`css`, `js`, `img`, ...).
//! Classification looks at the extension only, plus a few naming conventions that
//! tell shared PHP fragments apart from PHP entry pages.
//!
//! # Examples
//!
//! ```
//! use webtidy::file_category::{Category, Classifier};
//!
//! let classifier = Classifier::default();
//! assert_eq!(classifier.classify("Style.CSS"), Category::Css);
//! assert_eq!(classifier.classify("inc_db.php"), Category::Includes);
//! assert_eq!(classifier.classify("index.html"), Category::None);
//! ```

use std::collections::{HashMap, HashSet};

/// Destination folder for a root-level file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// Stylesheets
    Css,
    /// Scripts (JS, MJS, CJS)
    Js,
    /// Images and icons
    Img,
    /// Video files
    Video,
    /// Audio files
    Audio,
    /// Web fonts
    Fonts,
    /// JSON, XML and CSV data
    Data,
    /// Anything without a more specific bucket
    Files,
    /// Shared PHP fragments (headers, footers, helpers)
    Includes,
    /// Left in place at the project root
    None,
}

impl Category {
    /// Every category that owns a folder, in folder-creation order.
    pub const FOLDERS: [Category; 9] = [
        Category::Css,
        Category::Js,
        Category::Img,
        Category::Video,
        Category::Audio,
        Category::Fonts,
        Category::Data,
        Category::Files,
        Category::Includes,
    ];

    /// Returns the folder name for this category, or `None` for files that stay put.
    ///
    /// # Examples
    ///
    /// ```
    /// use webtidy::file_category::Category;
    ///
    /// assert_eq!(Category::Img.dir_name(), Some("img"));
    /// assert_eq!(Category::None.dir_name(), None);
    /// ```
    pub fn dir_name(&self) -> Option<&'static str> {
        match self {
            Category::Css => Some("css"),
            Category::Js => Some("js"),
            Category::Img => Some("img"),
            Category::Video => Some("video"),
            Category::Audio => Some("audio"),
            Category::Fonts => Some("fonts"),
            Category::Data => Some("data"),
            Category::Files => Some("files"),
            Category::Includes => Some("includes"),
            Category::None => None,
        }
    }

    /// Parses a folder name back into a category (used by configuration).
    pub fn from_dir_name(name: &str) -> Option<Category> {
        Category::FOLDERS
            .iter()
            .copied()
            .find(|c| c.dir_name() == Some(&*name.to_lowercase()))
    }

    /// Returns a human-readable description of this category.
    pub fn description(&self) -> &'static str {
        match self {
            Category::Css => "Stylesheets",
            Category::Js => "Scripts",
            Category::Img => "Images",
            Category::Video => "Video files",
            Category::Audio => "Audio files",
            Category::Fonts => "Fonts",
            Category::Data => "Data files",
            Category::Files => "Other files",
            Category::Includes => "PHP includes",
            Category::None => "Left in place",
        }
    }
}

const PHP_INCLUDE_NAMES: [&str; 9] = [
    "header.php",
    "footer.php",
    "config.php",
    "functions.php",
    "helper.php",
    "helpers.php",
    "form.php",
    "forms.php",
    "includes.php",
];
const PHP_INCLUDE_PREFIXES: [&str; 3] = ["inc_", "include_", "partials_"];
const PHP_INCLUDE_SUFFIXES: [&str; 3] = ["_inc.php", "_include.php", "_part.php"];
const RESERVED_NAMES: [&str; 4] = [
    "extension.js",
    "package.json",
    "package-lock.json",
    ".webtidyrc.toml",
];

/// Maps file names to categories.
///
/// Holds the extension table and the PHP include heuristics. Configuration can
/// extend both the extension table and the reserved-name set.
#[derive(Debug, Clone)]
pub struct Classifier {
    extension_map: HashMap<String, Category>,
    include_names: HashSet<String>,
    include_prefixes: Vec<String>,
    include_suffixes: Vec<String>,
    reserved: HashSet<String>,
}

impl Classifier {
    /// Creates a `Classifier` with the standard web-asset tables.
    pub fn new() -> Self {
        let mut classifier = Self {
            extension_map: HashMap::new(),
            include_names: PHP_INCLUDE_NAMES.iter().map(|s| s.to_string()).collect(),
            include_prefixes: PHP_INCLUDE_PREFIXES.iter().map(|s| s.to_string()).collect(),
            include_suffixes: PHP_INCLUDE_SUFFIXES.iter().map(|s| s.to_string()).collect(),
            reserved: HashSet::new(),
        };
        classifier.populate_standard_mappings();
        for name in RESERVED_NAMES {
            classifier.add_reserved_name(name);
        }
        classifier
    }

    fn populate_standard_mappings(&mut self) {
        self.add_extension_mapping("css", Category::Css);

        for ext in ["js", "mjs", "cjs"] {
            self.add_extension_mapping(ext, Category::Js);
        }
        for ext in ["png", "jpg", "jpeg", "webp", "gif", "svg", "ico", "bmp", "avif"] {
            self.add_extension_mapping(ext, Category::Img);
        }
        for ext in ["mp4", "webm", "ogv", "mov", "avi", "mkv"] {
            self.add_extension_mapping(ext, Category::Video);
        }
        for ext in ["mp3", "wav", "ogg", "aac"] {
            self.add_extension_mapping(ext, Category::Audio);
        }
        for ext in ["woff", "woff2", "ttf", "otf", "eot"] {
            self.add_extension_mapping(ext, Category::Fonts);
        }
        for ext in ["json", "xml", "csv"] {
            self.add_extension_mapping(ext, Category::Data);
        }
    }

    /// Adds (or overrides) an extension mapping. A leading dot is ignored.
    pub fn add_extension_mapping(&mut self, ext: &str, category: Category) {
        let key = ext.trim_start_matches('.').to_lowercase();
        self.extension_map.insert(key, category);
    }

    /// Marks a file name as reserved: it is never moved.
    pub fn add_reserved_name(&mut self, name: &str) {
        self.reserved.insert(name.to_string());
    }

    /// Maps a file extension to a category, if it is in the table.
    pub fn extension_to_category(&self, ext: &str) -> Option<Category> {
        self.extension_map.get(&ext.to_lowercase()).copied()
    }

    /// True for dot files and reserved build artifacts, which are never touched.
    pub fn is_excluded(&self, file_name: &str) -> bool {
        file_name.starts_with('.') || self.reserved.contains(file_name)
    }

    /// True if a `.php` base name looks like a shared fragment rather than an entry page.
    pub fn is_include_php(&self, base_name: &str) -> bool {
        let lower = base_name.to_lowercase();

        self.include_names.contains(&lower)
            || self.include_prefixes.iter().any(|p| lower.starts_with(p.as_str()))
            || self.include_suffixes.iter().any(|s| lower.ends_with(s.as_str()))
    }

    /// Determines the category for a root-level file name.
    ///
    /// Rules, first match wins:
    /// 1. Dot files and reserved names stay in place
    /// 2. Known extensions map through the table
    /// 3. `.php` goes to `includes` if it looks like a fragment, otherwise stays
    /// 4. `.html` / `.htm` stay
    /// 5. Everything else goes to `files`
    ///
    /// # Examples
    ///
    /// ```
    /// use webtidy::file_category::{Category, Classifier};
    ///
    /// let classifier = Classifier::default();
    /// assert_eq!(classifier.classify("report.json"), Category::Data);
    /// assert_eq!(classifier.classify("contact.php"), Category::None);
    /// assert_eq!(classifier.classify("brochure.pdf"), Category::Files);
    /// ```
    pub fn classify(&self, file_name: &str) -> Category {
        if self.is_excluded(file_name) {
            return Category::None;
        }

        let ext = file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_lowercase())
            .unwrap_or_default();

        if let Some(category) = self.extension_to_category(&ext) {
            return category;
        }

        match ext.as_str() {
            "php" if self.is_include_php(file_name) => Category::Includes,
            "php" | "html" | "htm" => Category::None,
            _ => Category::Files,
        }
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new()
    }
}
