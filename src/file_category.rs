/// File categorization by extension.
///
/// This module maps file extensions to the six fixed categories used as
/// top-level folders (`IMAGES`, `VIDEO`, `DOCUMENTS`, `AUDIO`, `ARCHIVES`, `UNKNOWN`).
///
/// # Examples
///
/// ```
/// use sortdir::file_category::{Category, FileMapper};
///
/// let mapper = FileMapper::default();
/// assert_eq!(mapper.classify("png"), Category::Images);
/// assert_eq!(mapper.classify("Mp3"), Category::Audio);
/// assert_eq!(mapper.classify("exe"), Category::Unknown);
/// ```
use crate::config::{ConfigError, ExtensionRules};
use std::collections::HashMap;

/// Represents one of the fixed file categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// Image files (JPEG, PNG, JPG, SVG)
    Images,
    /// Video files (AVI, MP4, MOV, MKV)
    Video,
    /// Document files (DOC, DOCX, TXT, PDF, XLSX, PPTX)
    Documents,
    /// Audio files (MP3, OGG, WAV, AMR)
    Audio,
    /// Archive files (ZIP, GZ, TAR)
    Archives,
    /// Anything with an unrecognized extension
    Unknown,
}

impl Category {
    /// All categories, in the order their folders are reported.
    pub const ALL: [Category; 6] = [
        Category::Audio,
        Category::Video,
        Category::Documents,
        Category::Images,
        Category::Archives,
        Category::Unknown,
    ];

    /// Returns the folder name for this category.
    ///
    /// # Examples
    ///
    /// ```
    /// use sortdir::file_category::Category;
    ///
    /// assert_eq!(Category::Images.dir_name(), "IMAGES");
    /// assert_eq!(Category::Unknown.dir_name(), "UNKNOWN");
    /// ```
    pub fn dir_name(&self) -> &'static str {
        match self {
            Category::Images => "IMAGES",
            Category::Video => "VIDEO",
            Category::Documents => "DOCUMENTS",
            Category::Audio => "AUDIO",
            Category::Archives => "ARCHIVES",
            Category::Unknown => "UNKNOWN",
        }
    }

    /// Returns the label used when reporting this category.
    pub fn label(&self) -> &'static str {
        match self {
            Category::Images => "Images",
            Category::Video => "Video",
            Category::Documents => "Documents",
            Category::Audio => "Audio",
            Category::Archives => "Archives",
            Category::Unknown => "Unknown",
        }
    }

    /// Built-in extensions owned by this category (upper-case).
    pub fn default_extensions(&self) -> &'static [&'static str] {
        match self {
            Category::Images => &["JPEG", "PNG", "JPG", "SVG"],
            Category::Video => &["AVI", "MP4", "MOV", "MKV"],
            Category::Documents => &["DOC", "DOCX", "TXT", "PDF", "XLSX", "PPTX"],
            Category::Audio => &["MP3", "OGG", "WAV", "AMR"],
            Category::Archives => &["ZIP", "GZ", "TAR"],
            Category::Unknown => &[],
        }
    }

    /// Returns the category whose folder is named `name`, if any.
    ///
    /// The match is exact: `images` is an ordinary directory, `IMAGES` is reserved.
    pub fn from_dir_name(name: &str) -> Option<Category> {
        Self::ALL.into_iter().find(|c| c.dir_name() == name)
    }

    /// Returns true if `name` is one of the six reserved category folder names.
    pub fn is_reserved_dir_name(name: &str) -> bool {
        Self::from_dir_name(name).is_some()
    }
}

/// Splits a file name into its stem and extension.
///
/// The extension is whatever follows the last dot, provided that dot is not the
/// first character of the name. Names without one yield `None`.
///
/// # Examples
///
/// ```
/// use sortdir::file_category::split_extension;
///
/// assert_eq!(split_extension("photo.backup.png"), Some(("photo.backup", "png")));
/// assert_eq!(split_extension("README"), None);
/// assert_eq!(split_extension(".bashrc"), None);
/// ```
pub fn split_extension(file_name: &str) -> Option<(&str, &str)> {
    match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => Some((stem, ext)),
        _ => None,
    }
}

/// Maps file extensions to categories.
///
/// Each extension belongs to at most one category; lookups are case-insensitive.
#[derive(Debug, Clone)]
pub struct FileMapper {
    extension_map: HashMap<String, Category>,
}

impl FileMapper {
    /// Creates a new `FileMapper` with the built-in extension sets.
    pub fn new() -> Self {
        let mut mapper = Self {
            extension_map: HashMap::new(),
        };
        for category in Category::ALL {
            for ext in category.default_extensions() {
                mapper.extension_map.insert((*ext).to_string(), category);
            }
        }
        mapper
    }

    /// Creates a mapper with the built-in sets plus the extra extensions from configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::OverlappingExtension` if an extension would belong to two categories.
    pub fn from_rules(rules: &ExtensionRules) -> Result<Self, ConfigError> {
        let mut mapper = Self::new();
        for (category, extensions) in rules.by_category() {
            for ext in extensions {
                mapper.add_extension_mapping(ext, category)?;
            }
        }
        Ok(mapper)
    }

    /// Adds an extension to category mapping.
    ///
    /// Re-adding an extension to the category that already owns it is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::OverlappingExtension` if another category already owns `ext`,
    /// or `ConfigError::ConfigInvalid` when mapping to `Category::Unknown`.
    pub fn add_extension_mapping(&mut self, ext: &str, category: Category) -> Result<(), ConfigError> {
        if category == Category::Unknown {
            return Err(ConfigError::ConfigInvalid(format!(
                "extension '{}' cannot be mapped to UNKNOWN",
                ext
            )));
        }

        let key = ext.trim_start_matches('.').to_uppercase();
        match self.extension_map.get(&key) {
            Some(existing) if *existing != category => Err(ConfigError::OverlappingExtension {
                extension: key,
                existing: existing.dir_name(),
                requested: category.dir_name(),
            }),
            Some(_) => Ok(()),
            None => {
                self.extension_map.insert(key, category);
                Ok(())
            }
        }
    }

    /// Maps a file extension to a category, returning `Category::Unknown` if it matches none.
    pub fn classify(&self, ext: &str) -> Category {
        self.extension_map
            .get(&ext.to_uppercase())
            .copied()
            .unwrap_or(Category::Unknown)
    }

    /// Classifies a file by its name.
    ///
    /// Returns the category together with the upper-cased extension when it is known.
    pub fn classify_file_name<'a>(&self, file_name: &'a str) -> (Category, Option<(&'a str, String)>) {
        match split_extension(file_name) {
            Some((stem, ext)) => {
                let category = self.classify(ext);
                if category == Category::Unknown {
                    (category, None)
                } else {
                    (category, Some((stem, ext.to_uppercase())))
                }
            }
            None => (Category::Unknown, None),
        }
    }

    /// Returns true if `ext` is a recognized archive extension.
    pub fn is_archive_extension(&self, ext: &str) -> bool {
        self.classify(ext) == Category::Archives
    }
}

impl Default for FileMapper {
    fn default() -> Self {
        Self::new()
    }
}
