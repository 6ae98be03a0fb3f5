//! The result of a sorting run.
//!
//! A [`SortReport`] carries the six named file lists handed to the reporter,
//! the known/unknown names recorded during the walk, and every archive that
//! could not be extracted.

use crate::archive::{ArchiveExpansion, ArchiveFailure};
use crate::file_category::Category;
use crate::file_organizer::FolderScan;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;

/// An archive that failed to extract, in reportable form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedArchive {
    pub archive: String,
    pub error: String,
}

impl From<&ArchiveFailure> for FailedArchive {
    fn from(failure: &ArchiveFailure) -> Self {
        Self {
            archive: failure.archive.clone(),
            error: failure.error.to_string(),
        }
    }
}

/// Everything a sorting run produced.
#[derive(Debug, Clone, Serialize)]
pub struct SortReport {
    pub root: PathBuf,
    pub generated_at: DateTime<Utc>,
    pub audio: Vec<String>,
    pub video: Vec<String>,
    pub documents: Vec<String>,
    pub images: Vec<String>,
    pub archives: Vec<String>,
    pub unknown: Vec<String>,
    pub known_files: Vec<String>,
    pub unknown_files: Vec<String>,
    pub archive_failures: Vec<FailedArchive>,
}

impl SortReport {
    /// Creates an empty report for `root`, stamped with the current time.
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            generated_at: Utc::now(),
            audio: Vec::new(),
            video: Vec::new(),
            documents: Vec::new(),
            images: Vec::new(),
            archives: Vec::new(),
            unknown: Vec::new(),
            known_files: Vec::new(),
            unknown_files: Vec::new(),
            archive_failures: Vec::new(),
        }
    }

    /// Records the known and unknown names observed by the walk.
    pub fn with_scan(mut self, scan: FolderScan) -> Self {
        self.known_files = scan.known_files;
        self.unknown_files = scan.unknown_files;
        self
    }

    /// Records the archive expansion: extracted names and failures.
    pub fn with_expansion(mut self, expansion: ArchiveExpansion) -> Self {
        self.archive_failures = expansion.failures.iter().map(FailedArchive::from).collect();
        self.archives = expansion.files;
        self
    }

    /// Sets the listing for one category folder.
    pub fn set_files(&mut self, category: Category, files: Vec<String>) {
        *self.files_mut(category) = files;
    }

    /// The listing for one category folder.
    pub fn files(&self, category: Category) -> &[String] {
        match category {
            Category::Audio => &self.audio,
            Category::Video => &self.video,
            Category::Documents => &self.documents,
            Category::Images => &self.images,
            Category::Archives => &self.archives,
            Category::Unknown => &self.unknown,
        }
    }

    fn files_mut(&mut self, category: Category) -> &mut Vec<String> {
        match category {
            Category::Audio => &mut self.audio,
            Category::Video => &mut self.video,
            Category::Documents => &mut self.documents,
            Category::Images => &mut self.images,
            Category::Archives => &mut self.archives,
            Category::Unknown => &mut self.unknown,
        }
    }

    /// Total number of files across the six listings.
    pub fn total_files(&self) -> usize {
        Category::ALL.iter().map(|c| self.files(*c).len()).sum()
    }

    /// Returns true if every archive was extracted.
    pub fn is_clean(&self) -> bool {
        self.archive_failures.is_empty()
    }
}
