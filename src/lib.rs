//! sortdir - sort a folder tree into category folders
//!
//! This library walks a directory tree, transliterates Cyrillic file and folder
//! names into Latin, moves files into `IMAGES`, `VIDEO`, `DOCUMENTS`, `AUDIO`,
//! `ARCHIVES` and `UNKNOWN` folders by extension, unpacks every archive into its
//! own subfolder, and reports the final contents of each category.

pub mod archive;
pub mod cli;
pub mod config;
pub mod file_category;
pub mod file_lister;
pub mod file_organizer;
pub mod normalize;
pub mod output;
pub mod report;

pub use archive::{ArchiveError, ArchiveExpander, ArchiveExpansion};
pub use config::{CompiledFilters, ConfigError, SortConfig};
pub use file_category::{Category, FileMapper};
pub use file_organizer::{FileOrganizer, FolderScan, OrganizeError};
pub use normalize::normalize;
pub use report::SortReport;

pub use cli::{Cli, CliError, organize_directory, organize_directory_with_config, run_cli};
