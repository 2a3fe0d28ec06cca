//! Output formatting and styling module.
//!
//! Provides a centralized interface for all CLI output: colored status lines,
//! the preview table, progress bars and the aggregate operation report. The
//! library modules never print; only the CLI goes through here.

use crate::executor::OperationResult;
use crate::pipeline::Preview;
use crate::selection::FileEntry;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;

/// Manages all CLI output with consistent styling and formatting.
///
/// This struct provides methods for:
/// - Success messages (green with ✓)
/// - Error messages (red with ✗)
/// - Warning messages (yellow with ⚠)
/// - Info messages (cyan)
/// - Progress bars for batch operations
/// - Preview tables and operation reports
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use batchren::output::OutputFormatter;
    /// OutputFormatter::success("Renamed 12 files");
    /// ```
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red with an X mark.
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

    /// Creates a progress bar for `total` items.
    ///
    /// ```no_run
    /// use batchren::output::OutputFormatter;
    /// let pb = OutputFormatter::create_progress_bar(100);
    /// pb.inc(1);
    /// pb.finish_and_clear();
    /// ```
    pub fn create_progress_bar(total: u64) -> ProgressBar {
        let pb = ProgressBar::new(total);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .map(|style| style.progress_chars("█▓░"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        pb.set_style(style);
        pb
    }

    /// Prints the selected files, one per line.
    pub fn file_list(files: &[&FileEntry]) {
        for file in files {
            println!(" - {} {}", file.name(), format!("({})", file.path().display()).dimmed());
        }
    }

    /// Prints a two-column preview table followed by any rule warnings.
    pub fn preview_table(preview: &Preview) {
        Self::header("PREVIEW");

        let width = preview
            .entries
            .iter()
            .map(|e| e.original_name.chars().count())
            .max()
            .unwrap_or(0)
            .max(8); // At least "Original" width

        println!("{:<width$} | {}", "Original".bold(), "New name".bold(), width = width);
        println!("{}", "-".repeat(width + 12));

        for entry in &preview.entries {
            let new_name = if entry.new_name.is_empty() {
                "<empty>".red().to_string()
            } else if entry.is_changed() {
                entry.new_name.green().to_string()
            } else {
                entry.new_name.dimmed().to_string()
            };
            println!("{:<width$} | {}", entry.original_name, new_name, width = width);
        }

        println!("{}", "-".repeat(width + 12));
        println!(
            "{} of {} {} will change",
            preview.changed_count().to_string().green().bold(),
            preview.len(),
            if preview.len() == 1 { "file" } else { "files" }
        );

        for warning in &preview.warnings {
            Self::warning(&warning.to_string());
        }
    }

    /// Prints the single aggregate report for a finished batch.
    pub fn operation_report(result: &OperationResult) {
        let headline = format!(
            "{} {} {}",
            result.kind.past_tense(),
            result.success_count,
            if result.success_count == 1 { "file" } else { "files" }
        );

        if result.is_complete_success() {
            Self::success(&headline);
            return;
        }

        Self::warning(&headline);
        Self::error(&format!("{} failed:", result.errors.len()));
        for failure in &result.errors {
            eprintln!("    - {}: {}", failure.path.display(), failure.reason);
        }
    }

    /// Prints any serializable value as pretty JSON.
    pub fn json<T: Serialize>(value: &T) -> Result<(), String> {
        let text = serde_json::to_string_pretty(value)
            .map_err(|e| format!("JSON serialization failed: {}", e))?;
        println!("{}", text);
        Ok(())
    }
}
