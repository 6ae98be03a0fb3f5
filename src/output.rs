//! Output formatting and styling module.
//!
//! Provides a centralized interface for all CLI output: colored status lines,
//! the archive progress bar, and rendering a [`SortReport`] as text or JSON.

use crate::file_category::Category;
use crate::report::SortReport;
use clap::ValueEnum;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};

/// How a report is printed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Colored sections per category and a summary table
    #[default]
    Text,
    /// Pretty-printed JSON document
    Json,
}

/// Manages all CLI output with consistent styling and formatting.
///
/// This struct provides methods for:
/// - Success messages (green with ✓)
/// - Error messages (red with ✗)
/// - Warning messages (yellow with ⚠)
/// - Info messages (cyan)
/// - Progress bars for archive expansion
/// - Report rendering
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use sortdir::output::OutputFormatter;
    /// OutputFormatter::success("Sorting complete");
    /// ```
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red with an X mark.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use sortdir::output::OutputFormatter;
    /// OutputFormatter::error("Failed to move file");
    /// ```
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints a warning message in yellow with a warning symbol.
    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    /// Prints an info message in cyan.
    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    /// Prints a section header.
    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Creates a progress bar for archive expansion.
    ///
    /// The length is set by the expander once the archives folder has been read.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use sortdir::output::OutputFormatter;
    /// let pb = OutputFormatter::create_progress_bar(3);
    /// pb.inc(1);
    /// pb.finish_and_clear();
    /// ```
    pub fn create_progress_bar(total: u64) -> ProgressBar {
        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .expect("Invalid progress bar template")
                .progress_chars("█▓░"),
        );
        pb
    }

    /// Prints a report in the requested format.
    pub fn print_report(report: &SortReport, format: OutputFormat) -> Result<(), serde_json::Error> {
        match format {
            OutputFormat::Text => {
                Self::report_text(report);
                Ok(())
            }
            OutputFormat::Json => {
                println!("{}", Self::report_json(report)?);
                Ok(())
            }
        }
    }

    /// Renders a report as pretty-printed JSON.
    pub fn report_json(report: &SortReport) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(report)
    }

    /// Prints one section per category, archive failures, and the summary table.
    pub fn report_text(report: &SortReport) {
        Self::info(&format!("Sorted: {}", report.root.display()));

        for category in Category::ALL {
            let files = report.files(category);
            Self::header(&format!("{} ({})", category.label(), files.len()));
            for name in files {
                println!("  {}", name);
            }
        }

        Self::summary_table(report);

        match Self::failure_summary(report) {
            None => Self::success("Sorting complete"),
            Some(summary) => Self::warning(&summary),
        }
    }

    /// One line naming the archives that could not be extracted, or `None` if all were.
    ///
    /// The causes are already on stderr through the log, so only the names are repeated.
    pub fn failure_summary(report: &SortReport) -> Option<String> {
        if report.is_clean() {
            return None;
        }
        let names: Vec<&str> = report
            .archive_failures
            .iter()
            .map(|f| f.archive.as_str())
            .collect();
        Some(format!(
            "Sorting complete, {} archive(s) could not be extracted: {}",
            names.len(),
            names.join(", ")
        ))
    }

    /// Prints a summary table with file counts per category.
    pub fn summary_table(report: &SortReport) {
        Self::header("SUMMARY");

        let rows: Vec<(&str, usize)> = Category::ALL
            .iter()
            .map(|c| (c.label(), report.files(*c).len()))
            .collect();

        let width = rows
            .iter()
            .map(|(name, _)| name.len())
            .max()
            .unwrap_or(0)
            .max(8); // At least "Category" width

        println!("{:<width$} | {}", "Category".bold(), "Files".bold(), width = width);
        println!("{}", "-".repeat(width + 10));

        for (category, count) in &rows {
            println!(
                "{:<width$} | {} {}",
                category,
                count.to_string().green(),
                file_word(*count),
                width = width
            );
        }

        let total = report.total_files();
        println!("{}", "-".repeat(width + 10));
        println!(
            "{:<width$} | {} {}",
            "Total".bold(),
            total.to_string().green().bold(),
            file_word(total),
            width = width
        );
    }
}

fn file_word(count: usize) -> &'static str {
    if count == 1 { "file" } else { "files" }
}
