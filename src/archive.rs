//! Archive expansion
//!
//! Every archive in the `ARCHIVES` folder is unpacked into its own subfolder,
//! named after the archive without its extension and upper-cased
//! (`archive.ZIP` → `ARCHIVE/`). ZIP files go through the `zip` crate; every
//! other archive extension is read as a TAR stream whose compression (none,
//! gzip, bzip2 or xz) is detected from its leading bytes.
//!
//! A corrupt archive never aborts the run: the failure is logged, recorded in
//! [`ArchiveExpansion::failures`], and expansion continues with the next entry.

use crate::file_category::{FileMapper, split_extension};
use crate::file_lister::list_files;
use crate::file_organizer::{OrganizeError, OrganizeResult};
use bzip2::read::BzDecoder;
use flate2::read::MultiGzDecoder;
use indicatif::ProgressBar;
use std::fs::{self, File};
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};
use xz2::read::XzDecoder;

/// Errors raised while extracting a single archive.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// The ZIP container could not be read.
    #[error("failed to read ZIP archive: {0}")]
    Zip(#[from] zip::result::ZipError),
    /// The TAR stream could not be unpacked.
    #[error("failed to unpack TAR archive: {0}")]
    Tar(#[source] io::Error),
    /// Reading the archive or writing its contents failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Compression wrapped around a TAR stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TarCompression {
    None,
    Gzip,
    Bzip2,
    Xz,
}

impl TarCompression {
    const GZIP_MAGIC: &'static [u8] = &[0x1F, 0x8B];
    const BZIP2_MAGIC: &'static [u8] = b"BZh";
    const XZ_MAGIC: &'static [u8] = &[0xFD, b'7', b'z', b'X', b'Z', 0x00];

    /// Number of leading bytes needed by [`detect`](Self::detect).
    pub const PROBE_LEN: u64 = 6;

    /// Detects the compression from the first bytes of a file.
    pub fn detect(header: &[u8]) -> Self {
        if header.starts_with(Self::GZIP_MAGIC) {
            TarCompression::Gzip
        } else if header.starts_with(Self::XZ_MAGIC) {
            TarCompression::Xz
        } else if header.starts_with(Self::BZIP2_MAGIC) {
            TarCompression::Bzip2
        } else {
            TarCompression::None
        }
    }
}

/// An archive that could not be extracted.
#[derive(Debug)]
pub struct ArchiveFailure {
    /// File name of the archive inside the archives folder.
    pub archive: String,
    pub error: ArchiveError,
}

/// Result of expanding an archives folder.
#[derive(Debug, Default)]
pub struct ArchiveExpansion {
    /// Base names of the extracted files, plus the raw names of non-archive entries.
    pub files: Vec<String>,
    pub failures: Vec<ArchiveFailure>,
}

/// Unpacks the archives in a folder into per-archive subfolders.
pub struct ArchiveExpander<'a> {
    mapper: &'a FileMapper,
    progress: Option<ProgressBar>,
}

impl<'a> ArchiveExpander<'a> {
    /// Creates an expander that recognizes the archive extensions of `mapper`.
    pub fn new(mapper: &'a FileMapper) -> Self {
        Self {
            mapper,
            progress: None,
        }
    }

    /// Reports progress on `progress`, one tick per archives-folder entry.
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Expands every archive directly inside `archives_folder`.
    ///
    /// Only I/O failures outside of extraction itself (listing the folder,
    /// creating a subfolder, listing extracted files) are returned as errors.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use sortdir::archive::ArchiveExpander;
    /// use sortdir::file_category::FileMapper;
    /// use std::path::Path;
    ///
    /// let mapper = FileMapper::default();
    /// let expansion = ArchiveExpander::new(&mapper)
    ///     .expand_archives(Path::new("/path/to/root/ARCHIVES"))
    ///     .unwrap();
    /// for failure in &expansion.failures {
    ///     eprintln!("{}: {}", failure.archive, failure.error);
    /// }
    /// ```
    pub fn expand_archives(&self, archives_folder: &Path) -> OrganizeResult<ArchiveExpansion> {
        let entries = archive_entries(archives_folder)?;
        if let Some(progress) = &self.progress {
            progress.set_length(entries.len() as u64);
        }

        let mut expansion = ArchiveExpansion::default();
        for (path, name) in entries {
            if let Some(progress) = &self.progress {
                progress.set_message(name.clone());
            }
            self.expand_entry(archives_folder, &path, name, &mut expansion)?;
            if let Some(progress) = &self.progress {
                progress.inc(1);
            }
        }

        info!(
            folder = %archives_folder.display(),
            files = expansion.files.len(),
            failed = expansion.failures.len(),
            "archive expansion finished"
        );
        Ok(expansion)
    }

    fn expand_entry(
        &self,
        archives_folder: &Path,
        path: &Path,
        name: String,
        expansion: &mut ArchiveExpansion,
    ) -> OrganizeResult<()> {
        let archive = split_extension(&name)
            .filter(|(_, ext)| self.mapper.is_archive_extension(ext))
            .map(|(stem, ext)| (stem.to_uppercase(), ext.to_uppercase()));
        let Some((folder_name, ext)) = archive else {
            debug!(file = %name, "not an archive, listed as is");
            expansion.files.push(name);
            return Ok(());
        };

        let subfolder = archives_folder.join(folder_name);
        fs::create_dir_all(&subfolder).map_err(|source| OrganizeError::DirectoryCreationFailed {
            path: subfolder.clone(),
            source,
        })?;

        let result = if ext == "ZIP" {
            extract_zip(path, &subfolder)
        } else {
            extract_tar(path, &subfolder)
        };

        match result {
            Ok(()) => {
                let extracted = list_files(&subfolder).map_err(|source| OrganizeError::ReadDir {
                    path: subfolder.clone(),
                    source,
                })?;
                info!(archive = %name, count = extracted.len(), "extracted archive");
                expansion.files.extend(extracted);
            }
            Err(error) => {
                self.log_failure(&name, &error);
                expansion.failures.push(ArchiveFailure {
                    archive: name,
                    error,
                });
            }
        }
        Ok(())
    }

    /// Logs a failed archive without tearing through a progress bar that is being drawn.
    fn log_failure(&self, name: &str, error: &ArchiveError) {
        let log = || warn!(archive = %name, %error, "failed to extract archive, skipping");
        match &self.progress {
            Some(progress) => progress.suspend(log),
            None => log(),
        }
    }
}

/// Plain files directly inside `folder`, sorted by name.
fn archive_entries(folder: &Path) -> OrganizeResult<Vec<(PathBuf, String)>> {
    let read_error = |source: io::Error| OrganizeError::ReadDir {
        path: folder.to_path_buf(),
        source,
    };

    let mut entries = Vec::new();
    for entry in fs::read_dir(folder).map_err(read_error)? {
        let entry = entry.map_err(read_error)?;
        let path = entry.path();
        if path.is_file() {
            entries.push((path, entry.file_name().to_string_lossy().into_owned()));
        }
    }
    entries.sort_by(|a, b| a.1.cmp(&b.1));
    Ok(entries)
}

/// Extracts every entry of a ZIP archive below `dest_path`.
///
/// Entries whose names would escape `dest_path` are skipped.
pub fn extract_zip(archive_path: &Path, dest_path: &Path) -> Result<(), ArchiveError> {
    let file = File::open(archive_path)?;
    let mut archive = zip::ZipArchive::new(file)?;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let out_path = match entry.enclosed_name() {
            Some(path) => dest_path.join(path),
            None => {
                warn!(archive = %archive_path.display(), entry = entry.name(), "skipping entry with unsafe path");
                continue;
            }
        };

        if entry.is_dir() {
            fs::create_dir_all(&out_path)?;
            continue;
        }

        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut outfile = File::create(&out_path)?;
        io::copy(&mut entry, &mut outfile)?;
    }

    Ok(())
}

/// Extracts a TAR archive, plain or compressed, below `dest_path`.
pub fn extract_tar(archive_path: &Path, dest_path: &Path) -> Result<(), ArchiveError> {
    let mut file = File::open(archive_path)?;

    let mut header = Vec::with_capacity(TarCompression::PROBE_LEN as usize);
    (&mut file)
        .take(TarCompression::PROBE_LEN)
        .read_to_end(&mut header)?;
    file.seek(SeekFrom::Start(0))?;

    let compression = TarCompression::detect(&header);
    debug!(archive = %archive_path.display(), ?compression, "unpacking TAR archive");

    let reader = BufReader::new(file);
    let stream: Box<dyn Read> = match compression {
        TarCompression::None => Box::new(reader),
        TarCompression::Gzip => Box::new(MultiGzDecoder::new(reader)),
        TarCompression::Bzip2 => Box::new(BzDecoder::new(reader)),
        TarCompression::Xz => Box::new(XzDecoder::new(reader)),
    };

    let mut archive = tar::Archive::new(stream);
    let mut unpacked = 0usize;
    for entry in archive.entries().map_err(ArchiveError::Tar)? {
        let mut entry = entry.map_err(ArchiveError::Tar)?;
        if !entry.unpack_in(dest_path).map_err(ArchiveError::Tar)? {
            warn!(archive = %archive_path.display(), "skipping entry with unsafe path");
        }
        unpacked += 1;
    }

    // A stream that ends (or hits the end-of-archive marker) before the first header
    // is not a TAR archive
    if unpacked == 0 {
        return Err(ArchiveError::Tar(io::Error::new(
            io::ErrorKind::InvalidData,
            "empty archive",
        )));
    }
    Ok(())
}
