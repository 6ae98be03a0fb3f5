//! Command-line interface module for sortdir.
//!
//! This module handles all CLI-related functionality including:
//! - Argument parsing (clap)
//! - Loading configuration
//! - Running the sorting pipeline
//! - Printing the report

use crate::archive::ArchiveExpander;
use crate::config::{ConfigError, SortConfig};
use crate::file_category::{Category, FileMapper};
use crate::file_lister::list_files;
use crate::file_organizer::{FileOrganizer, OrganizeError};
use crate::output::{OutputFormat, OutputFormatter};
use crate::report::SortReport;
use clap::{ArgAction, Parser};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{Level, info};

/// Category folders listed for the report, in report order. `ARCHIVES` is
/// reported from the archive expansion instead.
const LISTED_CATEGORIES: [Category; 5] = [
    Category::Audio,
    Category::Video,
    Category::Documents,
    Category::Images,
    Category::Unknown,
];

/// Sort a folder tree into category folders, transliterate names and unpack archives.
#[derive(Debug, Parser)]
#[command(name = "sortdir", version, about)]
pub struct Cli {
    /// Folder to sort
    pub root: PathBuf,

    /// Configuration file (defaults to ./.sortdir.toml, then ~/.config/sortdir/config.toml)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Report format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Maximum tracing level for the chosen verbosity.
    pub fn log_level(&self) -> Level {
        match self.verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            _ => Level::DEBUG,
        }
    }
}

/// Errors that end a run.
#[derive(Debug, Error)]
pub enum CliError {
    /// The root argument is not an existing directory.
    #[error("Invalid root {}: {reason}", .path.display())]
    InvalidRoot { path: PathBuf, reason: String },
    /// The configuration could not be loaded or is inconsistent.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    /// Reorganizing the tree failed part way.
    #[error(transparent)]
    Organize(#[from] OrganizeError),
    /// The report could not be rendered.
    #[error("Failed to render report: {0}")]
    Render(#[from] serde_json::Error),
}

/// Runs the CLI application for parsed arguments.
///
/// # Examples
///
/// ```no_run
/// use clap::Parser;
/// use sortdir::cli::{Cli, run_cli};
///
/// let cli = Cli::parse_from(["sortdir", "/path/to/Downloads"]);
/// if let Err(e) = run_cli(&cli) {
///     eprintln!("Error: {}", e);
/// }
/// ```
pub fn run_cli(cli: &Cli) -> Result<(), CliError> {
    validate_root(&cli.root)?;
    let config = SortConfig::load(cli.config.as_deref())?;

    let show_progress = cli.format == OutputFormat::Text;
    if show_progress {
        OutputFormatter::info(&format!("Sorting contents of: {}", cli.root.display()));
    }

    let report = run_pipeline(&cli.root, &config, show_progress)?;

    OutputFormatter::print_report(&report, cli.format)?;
    Ok(())
}

/// Sorts `base_path` using the configuration found at `config_path`, or the
/// default lookup locations when `None`.
pub fn organize_directory_with_config(
    base_path: &Path,
    config_path: Option<&Path>,
) -> Result<SortReport, CliError> {
    validate_root(base_path)?;
    let config = SortConfig::load(config_path)?;
    organize_directory(base_path, &config)
}

/// Sorts `base_path` with an already loaded configuration.
///
/// The pipeline:
/// 1. Validates the root
/// 2. Walks the tree, moving known files into category folders
/// 3. Creates all six category folders
/// 4. Moves files left in the root into `UNKNOWN`
/// 5. Unpacks every archive in `ARCHIVES`
/// 6. Lists the final contents of the other category folders
///
/// # Errors
///
/// Any move, rename or directory failure aborts the run. Archives that fail
/// to extract are recorded in the report instead.
pub fn organize_directory(base_path: &Path, config: &SortConfig) -> Result<SortReport, CliError> {
    validate_root(base_path)?;
    run_pipeline(base_path, config, false)
}

fn run_pipeline(
    base_path: &Path,
    config: &SortConfig,
    show_progress: bool,
) -> Result<SortReport, CliError> {
    let mapper = FileMapper::from_rules(&config.extensions)?;
    let filters = config.compile_filters()?;
    let organizer = FileOrganizer::new(base_path, &mapper, &filters)?;

    let scan = organizer.reorganize()?;
    organizer.ensure_category_folders()?;
    organizer.sweep_unknown()?;

    // The bar only exists while archives are expanded; the length is set by the expander
    let progress = show_progress.then(|| OutputFormatter::create_progress_bar(0));
    let mut expander = ArchiveExpander::new(&mapper);
    if let Some(progress) = &progress {
        expander = expander.with_progress(progress.clone());
    }
    let expansion = expander.expand_archives(&organizer.category_path(Category::Archives));
    if let Some(progress) = progress {
        progress.finish_and_clear();
    }
    let expansion = expansion?;

    let mut report = SortReport::new(organizer.root().to_path_buf())
        .with_scan(scan)
        .with_expansion(expansion);

    for category in LISTED_CATEGORIES {
        let folder = organizer.category_path(category);
        let files = list_files(&folder).map_err(|source| OrganizeError::ReadDir {
            path: folder.clone(),
            source,
        })?;
        report.set_files(category, files);
    }

    info!(
        root = %base_path.display(),
        total = report.total_files(),
        failed_archives = report.archive_failures.len(),
        "sorting finished"
    );
    Ok(report)
}

fn validate_root(path: &Path) -> Result<(), CliError> {
    let reason = if !path.exists() {
        "does not exist"
    } else if !path.is_dir() {
        "is not a directory"
    } else {
        return Ok(());
    };

    Err(CliError::InvalidRoot {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    })
}
