/// Tree reorganization: moving files into category folders.
///
/// This module walks a directory tree depth-first, renaming every ordinary
/// directory to its normalized name and moving every file with a known
/// extension into the matching category folder at the scan root. Files with
/// unknown extensions are recorded and left in place; [`FileOrganizer::sweep_unknown`]
/// later moves the ones sitting directly in the root into `UNKNOWN`.
///
/// Any failure to rename or move an entry aborts the walk. Work already done
/// on disk is not rolled back.
use crate::config::CompiledFilters;
use crate::file_category::{Category, FileMapper};
use crate::normalize::normalize;
use std::fs::{self, DirEntry, FileType};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Errors that can occur while reorganizing a tree.
#[derive(Debug, Error)]
pub enum OrganizeError {
    /// Failed to list a directory or inspect one of its entries.
    #[error("Failed to read directory {}: {source}", .path.display())]
    ReadDir { path: PathBuf, source: io::Error },
    /// Failed to create a category directory.
    #[error("Failed to create directory {}: {source}", .path.display())]
    DirectoryCreationFailed { path: PathBuf, source: io::Error },
    /// Failed to move a file to its category directory.
    #[error("Failed to move {} to {}: {source}", .from.display(), .to.display())]
    FileMoveFailure {
        from: PathBuf,
        to: PathBuf,
        source: io::Error,
    },
    /// Failed to rename a directory to its normalized name.
    #[error("Failed to rename directory {} to {}: {source}", .from.display(), .to.display())]
    DirectoryRenameFailed {
        from: PathBuf,
        to: PathBuf,
        source: io::Error,
    },
    /// Failed to remove a directory emptied by the walk.
    #[error("Failed to remove empty directory {}: {source}", .path.display())]
    DirectoryRemovalFailed { path: PathBuf, source: io::Error },
    /// The target name is already taken; nothing is overwritten.
    #[error("Cannot move {} to {}: destination already exists", .from.display(), .to.display())]
    DestinationExists { from: PathBuf, to: PathBuf },
    /// A directory normalizes to one of the reserved category names.
    #[error("Directory {} normalizes to reserved name {name}", .path.display())]
    ReservedName { path: PathBuf, name: String },
    /// The base directory path is invalid or doesn't exist.
    #[error("Invalid base path {}: {reason}", .path.display())]
    InvalidBasePath { path: PathBuf, reason: String },
}

/// Result type for file organization operations.
pub type OrganizeResult<T> = Result<T, OrganizeError>;

/// Normalized names observed by a walk.
///
/// `files` holds every name in visit order; `known_files` and `unknown_files`
/// split it by classification. Known files are recorded under their new name
/// (`stem.EXT`), unknown files under their normalized full name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FolderScan {
    pub files: Vec<String>,
    pub known_files: Vec<String>,
    pub unknown_files: Vec<String>,
}

impl FolderScan {
    /// Appends a child folder's results to this one.
    pub fn merge(&mut self, other: FolderScan) {
        self.files.extend(other.files);
        self.known_files.extend(other.known_files);
        self.unknown_files.extend(other.unknown_files);
    }

    fn record_known(&mut self, name: String) {
        self.files.push(name.clone());
        self.known_files.push(name);
    }

    fn record_unknown(&mut self, name: String) {
        self.files.push(name.clone());
        self.unknown_files.push(name);
    }
}

/// Reorganizes a tree rooted at a fixed scan root.
pub struct FileOrganizer<'a> {
    root: PathBuf,
    mapper: &'a FileMapper,
    filters: &'a CompiledFilters,
}

impl<'a> FileOrganizer<'a> {
    /// Creates an organizer for `root`.
    ///
    /// # Errors
    ///
    /// Returns `OrganizeError::InvalidBasePath` if `root` does not exist or is not a directory.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use sortdir::config::CompiledFilters;
    /// use sortdir::file_category::FileMapper;
    /// use sortdir::file_organizer::FileOrganizer;
    /// use std::path::Path;
    ///
    /// let mapper = FileMapper::default();
    /// let filters = CompiledFilters::default();
    /// let organizer = FileOrganizer::new(Path::new("/path/to/Downloads"), &mapper, &filters).unwrap();
    /// let scan = organizer.reorganize().unwrap();
    /// println!("{} known, {} unknown", scan.known_files.len(), scan.unknown_files.len());
    /// ```
    pub fn new(root: &Path, mapper: &'a FileMapper, filters: &'a CompiledFilters) -> OrganizeResult<Self> {
        if !root.exists() {
            return Err(OrganizeError::InvalidBasePath {
                path: root.to_path_buf(),
                reason: "base path does not exist".to_string(),
            });
        }
        if !root.is_dir() {
            return Err(OrganizeError::InvalidBasePath {
                path: root.to_path_buf(),
                reason: "base path is not a directory".to_string(),
            });
        }

        Ok(Self {
            root: root.to_path_buf(),
            mapper,
            filters,
        })
    }

    /// The scan root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the folder for `category` under the scan root.
    pub fn category_path(&self, category: Category) -> PathBuf {
        self.root.join(category.dir_name())
    }

    /// Walks the whole tree, sorting known files into category folders.
    pub fn reorganize(&self) -> OrganizeResult<FolderScan> {
        let scan = self.process_folder(&self.root)?;
        info!(
            root = %self.root.display(),
            known = scan.known_files.len(),
            unknown = scan.unknown_files.len(),
            "reorganized tree"
        );
        Ok(scan)
    }

    /// Creates all six category folders under the root.
    pub fn ensure_category_folders(&self) -> OrganizeResult<()> {
        for category in Category::ALL {
            self.ensure_category_folder(category)?;
        }
        Ok(())
    }

    /// Moves the files still sitting directly in the root into `UNKNOWN`.
    ///
    /// After [`reorganize`](Self::reorganize) only unknown files (and files excluded
    /// by the filters, which stay put) remain in the root. Each is renamed to its
    /// normalized full name. Returns the new names.
    pub fn sweep_unknown(&self) -> OrganizeResult<Vec<String>> {
        let mut moved = Vec::new();
        for entry in read_dir_snapshot(&self.root)? {
            let path = entry.path();
            let file_type = entry_type(&entry)?;
            if !is_file(file_type, &path) || !self.is_included(&path) {
                continue;
            }

            let new_name = normalize(&entry.file_name().to_string_lossy());
            self.move_to_category(&path, Category::Unknown, &new_name)?;
            moved.push(new_name);
        }

        if !moved.is_empty() {
            info!(count = moved.len(), "moved root-level files to UNKNOWN");
        }
        Ok(moved)
    }

    /// Moves a file into the folder for `category` under a new name.
    ///
    /// The category directory is created if needed. An existing entry at the
    /// destination is never overwritten.
    ///
    /// # Returns
    ///
    /// Returns the new path of the file.
    pub fn move_to_category(
        &self,
        file_path: &Path,
        category: Category,
        new_name: &str,
    ) -> OrganizeResult<PathBuf> {
        let category_path = self.ensure_category_folder(category)?;
        let destination = category_path.join(new_name);

        if destination.symlink_metadata().is_ok() {
            return Err(OrganizeError::DestinationExists {
                from: file_path.to_path_buf(),
                to: destination,
            });
        }

        fs::rename(file_path, &destination).map_err(|source| OrganizeError::FileMoveFailure {
            from: file_path.to_path_buf(),
            to: destination.clone(),
            source,
        })?;

        debug!(from = %file_path.display(), to = %destination.display(), "moved file");
        Ok(destination)
    }

    fn ensure_category_folder(&self, category: Category) -> OrganizeResult<PathBuf> {
        let category_path = self.category_path(category);
        if !category_path.is_dir() {
            fs::create_dir_all(&category_path).map_err(|source| {
                OrganizeError::DirectoryCreationFailed {
                    path: category_path.clone(),
                    source,
                }
            })?;
        }
        Ok(category_path)
    }

    /// Sorts one folder and recurses into its subfolders.
    ///
    /// The entry list is read once up front; entries created while this folder
    /// is being processed are not visited.
    fn process_folder(&self, folder: &Path) -> OrganizeResult<FolderScan> {
        let mut scan = FolderScan::default();

        for entry in read_dir_snapshot(folder)? {
            let path = entry.path();
            let name = entry.file_name().to_string_lossy().into_owned();
            let file_type = entry_type(&entry)?;

            if file_type.is_dir() {
                if Category::is_reserved_dir_name(&name) {
                    debug!(path = %path.display(), "skipping category folder");
                    continue;
                }
                scan.merge(self.process_subfolder(&path, &name)?);
            } else if is_file(file_type, &path) {
                if !self.is_included(&path) {
                    debug!(path = %path.display(), "excluded by filters");
                    continue;
                }
                self.sort_file(&path, &name, &mut scan)?;
            }
        }

        Ok(scan)
    }

    fn sort_file(&self, path: &Path, name: &str, scan: &mut FolderScan) -> OrganizeResult<()> {
        match self.mapper.classify_file_name(name) {
            (category, Some((stem, ext))) => {
                let new_name = format!("{}.{}", normalize(stem), ext);
                self.move_to_category(path, category, &new_name)?;
                scan.record_known(new_name);
            }
            _ => {
                debug!(path = %path.display(), "unknown extension, left in place");
                scan.record_unknown(normalize(name));
            }
        }
        Ok(())
    }

    /// Renames a subfolder to its normalized name, processes it, and removes it if it ends up empty.
    fn process_subfolder(&self, path: &Path, name: &str) -> OrganizeResult<FolderScan> {
        let normalized = normalize(name);
        if Category::is_reserved_dir_name(&normalized) {
            return Err(OrganizeError::ReservedName {
                path: path.to_path_buf(),
                name: normalized,
            });
        }

        let target = if normalized == name {
            path.to_path_buf()
        } else {
            let target = path.with_file_name(&normalized);
            if target.symlink_metadata().is_ok() {
                return Err(OrganizeError::DestinationExists {
                    from: path.to_path_buf(),
                    to: target,
                });
            }
            fs::rename(path, &target).map_err(|source| OrganizeError::DirectoryRenameFailed {
                from: path.to_path_buf(),
                to: target.clone(),
                source,
            })?;
            debug!(from = %path.display(), to = %target.display(), "renamed directory");
            target
        };

        let scan = self.process_folder(&target)?;

        if is_empty_dir(&target)? {
            fs::remove_dir(&target).map_err(|source| OrganizeError::DirectoryRemovalFailed {
                path: target.clone(),
                source,
            })?;
            debug!(path = %target.display(), "removed empty directory");
        }

        Ok(scan)
    }

    fn is_included(&self, path: &Path) -> bool {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        self.filters.should_include(relative)
    }
}

/// Reads every entry of `folder` before any of them is touched, sorted by name.
fn read_dir_snapshot(folder: &Path) -> OrganizeResult<Vec<DirEntry>> {
    let read_error = |source: io::Error| OrganizeError::ReadDir {
        path: folder.to_path_buf(),
        source,
    };

    let mut entries = fs::read_dir(folder)
        .map_err(read_error)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(read_error)?;
    entries.sort_by_key(|entry| entry.file_name());
    Ok(entries)
}

fn entry_type(entry: &DirEntry) -> OrganizeResult<FileType> {
    entry.file_type().map_err(|source| OrganizeError::ReadDir {
        path: entry.path(),
        source,
    })
}

/// Plain files and symlinks to files; directory symlinks are neither files nor followed.
fn is_file(file_type: FileType, path: &Path) -> bool {
    file_type.is_file() || (file_type.is_symlink() && path.is_file())
}

fn is_empty_dir(path: &Path) -> OrganizeResult<bool> {
    let mut entries = fs::read_dir(path).map_err(|source| OrganizeError::ReadDir {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(entries.next().is_none())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file_lister::list_files;
    use tempfile::TempDir;

    fn write(base: &Path, rel: &str) {
        let path = base.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        fs::write(&path, rel).expect("Failed to write test file");
    }

    fn organize(base: &Path) -> OrganizeResult<FolderScan> {
        let mapper = FileMapper::default();
        let filters = CompiledFilters::default();
        FileOrganizer::new(base, &mapper, &filters)?.reorganize()
    }

    #[test]
    fn test_known_files_move_to_category_with_upper_extension() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base = temp_dir.path();
        write(base, "photo.jpg");
        write(base, "Отчёт.pdf");

        let scan = organize(base).expect("reorganize failed");

        assert!(base.join("IMAGES/photo.JPG").is_file());
        assert!(base.join("DOCUMENTS/Otchet.PDF").is_file());
        assert!(!base.join("photo.jpg").exists());
        assert_eq!(scan.known_files, vec!["photo.JPG", "Otchet.PDF"]);
        assert!(scan.unknown_files.is_empty());
    }

    #[test]
    fn test_unknown_files_stay_in_place() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base = temp_dir.path();
        write(base, "setup file.exe");
        write(base, "README");

        let scan = organize(base).expect("reorganize failed");

        assert!(base.join("setup file.exe").is_file());
        assert!(base.join("README").is_file());
        assert_eq!(scan.unknown_files, vec!["README", "setup_file.exe"]);
        assert_eq!(scan.files.len(), 2);
        assert!(!base.join("UNKNOWN").exists());
    }

    #[test]
    fn test_subfolder_is_renamed_emptied_and_removed() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base = temp_dir.path();
        write(base, "Папка 1/a.txt");
        write(base, "Папка 1/b.mp3");
        write(base, "Папка 1/Вложенная/c.png");

        let scan = organize(base).expect("reorganize failed");

        assert!(!base.join("Папка 1").exists());
        assert!(!base.join("Papka_1").exists());
        assert!(base.join("DOCUMENTS/a.TXT").is_file());
        assert!(base.join("AUDIO/b.MP3").is_file());
        assert!(base.join("IMAGES/c.PNG").is_file());
        assert_eq!(scan.known_files.len(), 3);
    }

    #[test]
    fn test_subfolder_with_unknown_file_is_kept_under_normalized_name() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base = temp_dir.path();
        write(base, "Папка 1/notes.txt");
        write(base, "Папка 1/data.bin");

        let scan = organize(base).expect("reorganize failed");

        assert!(base.join("Papka_1/data.bin").is_file());
        assert!(base.join("DOCUMENTS/notes.TXT").is_file());
        assert_eq!(list_files(&base.join("Papka_1")).unwrap().len(), 1);
        assert_eq!(scan.unknown_files, vec!["data.bin"]);
    }

    #[test]
    fn test_completeness_no_file_lost_or_duplicated() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base = temp_dir.path();
        let known = ["a.jpg", "b.mp4", "x/c.docx", "x/y/d.ogg", "x/y/e.zip", "Музыка/f.wav"];
        let unknown = ["g.xyz", "x/h", "x/y/i.rar", "Музыка/j.flac"];
        for rel in known.iter().chain(unknown.iter()) {
            write(base, rel);
        }

        let scan = organize(base).expect("reorganize failed");

        let in_categories: usize = Category::ALL
            .iter()
            .map(|c| base.join(c.dir_name()))
            .filter(|p| p.is_dir())
            .map(|p| list_files(&p).unwrap().len())
            .sum();
        assert_eq!(in_categories, known.len());
        assert_eq!(in_categories + scan.unknown_files.len(), known.len() + unknown.len());
        assert_eq!(scan.files.len(), known.len() + unknown.len());
    }

    #[test]
    fn test_category_folders_are_not_descended() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base = temp_dir.path();
        write(base, "IMAGES/Старое фото.png");
        write(base, "UNKNOWN/thing.txt");

        let scan = organize(base).expect("reorganize failed");

        assert!(base.join("IMAGES/Старое фото.png").is_file());
        assert!(base.join("UNKNOWN/thing.txt").is_file());
        assert!(scan.files.is_empty());
    }

    #[test]
    fn test_name_collision_fails_fast() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base = temp_dir.path();
        write(base, "DOCUMENTS/report.PDF");
        write(base, "report.pdf");

        let result = organize(base);

        assert!(matches!(result, Err(OrganizeError::DestinationExists { .. })));
        assert!(base.join("report.pdf").is_file());
        assert_eq!(fs::read_to_string(base.join("DOCUMENTS/report.PDF")).unwrap(), "DOCUMENTS/report.PDF");
    }

    #[test]
    fn test_directory_rename_collision_fails_fast() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base = temp_dir.path();
        write(base, "Papka/keep.bin");
        write(base, "Папка/other.bin");

        let result = organize(base);

        assert!(matches!(result, Err(OrganizeError::DestinationExists { .. })));
        assert!(base.join("Папка/other.bin").is_file());
    }

    #[test]
    fn test_folder_normalizing_to_category_name_is_rejected() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base = temp_dir.path();
        write(base, "АУДИО/track.bin");

        let result = organize(base);

        assert!(matches!(
            result,
            Err(OrganizeError::ReservedName { ref name, .. }) if name == "AUDIO"
        ));
        assert!(base.join("АУДИО/track.bin").is_file());
    }

    #[test]
    fn test_sweep_unknown_moves_root_files_only() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base = temp_dir.path();
        write(base, "мой файл.xyz");
        write(base, "deep/keep.bin");

        let mapper = FileMapper::default();
        let filters = CompiledFilters::default();
        let organizer = FileOrganizer::new(base, &mapper, &filters).unwrap();
        organizer.reorganize().unwrap();
        organizer.ensure_category_folders().unwrap();
        let moved = organizer.sweep_unknown().unwrap();

        assert_eq!(moved, vec!["moj_fajl.xyz"]);
        assert!(base.join("UNKNOWN/moj_fajl.xyz").is_file());
        assert!(base.join("deep/keep.bin").is_file());
        for category in Category::ALL {
            assert!(base.join(category.dir_name()).is_dir());
        }
    }

    #[test]
    fn test_filtered_files_are_untouched() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base = temp_dir.path();
        write(base, "keep.tmp.txt");
        write(base, "photo.png");

        let config = crate::config::SortConfig::from_toml(
            "[filters.exclude]\nregex = [\"^keep\"]\n",
        )
        .unwrap();
        let filters = config.compile_filters().unwrap();
        let mapper = FileMapper::default();
        let organizer = FileOrganizer::new(base, &mapper, &filters).unwrap();
        let scan = organizer.reorganize().unwrap();
        organizer.sweep_unknown().unwrap();

        assert!(base.join("keep.tmp.txt").is_file());
        assert!(base.join("IMAGES/photo.PNG").is_file());
        assert_eq!(scan.files, vec!["photo.PNG"]);
    }

    #[test]
    fn test_invalid_base_path() {
        let mapper = FileMapper::default();
        let filters = CompiledFilters::default();
        let result = FileOrganizer::new(Path::new("/non/existent/path"), &mapper, &filters);
        assert!(matches!(result, Err(OrganizeError::InvalidBasePath { .. })));
    }
}
