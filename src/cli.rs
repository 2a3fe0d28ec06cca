//! Command-line interface module for batchren.
//!
//! This module handles all CLI-related functionality including:
//! - Argument parsing (clap derive)
//! - Building the selection from files and folders
//! - Merging rule flags over the configured defaults
//! - Preview, rename, move, copy and delete orchestration
//! - Delete confirmation

use crate::config::AppConfig;
use crate::executor::OperationResult;
use crate::output::OutputFormatter;
use crate::rules::{CaseConversion, RuleSet};
use crate::selection::RenameSession;
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde_json::json;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

/// Batch-rename files through an ordered chain of rules.
#[derive(Debug, Parser)]
#[command(name = "batchren", version, about)]
pub struct Cli {
    /// Configuration file (defaults to ./.batchrenrc.toml, then ~/.config/batchren/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Represents a CLI command to execute.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Show the selected files, optionally narrowed by a search keyword.
    List {
        #[command(flatten)]
        selection: SelectionArgs,
        /// Only show files whose name contains this text (case-insensitive).
        #[arg(long)]
        search: Option<String>,
    },
    /// Show the proposed new names without touching any file.
    Preview {
        #[command(flatten)]
        selection: SelectionArgs,
        #[command(flatten)]
        rules: RuleArgs,
        /// Print the preview as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Preview and then rename the files in place.
    Rename {
        #[command(flatten)]
        selection: SelectionArgs,
        #[command(flatten)]
        rules: RuleArgs,
        /// Print the preview and the result as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Move the files into a directory, keeping their names.
    Move {
        #[command(flatten)]
        selection: SelectionArgs,
        /// Destination directory.
        #[arg(long, value_name = "DIR")]
        to: PathBuf,
    },
    /// Copy the files into a directory, keeping their names.
    Copy {
        #[command(flatten)]
        selection: SelectionArgs,
        /// Destination directory.
        #[arg(long, value_name = "DIR")]
        to: PathBuf,
    },
    /// Delete the files.
    Delete {
        #[command(flatten)]
        selection: SelectionArgs,
        /// Do not ask for confirmation.
        #[arg(long, short = 'y')]
        yes: bool,
    },
}

/// Which files to operate on.
#[derive(Debug, Clone, Default, Args)]
pub struct SelectionArgs {
    /// Files to select, in order.
    #[arg(value_name = "FILES")]
    pub files: Vec<PathBuf>,

    /// Add every file directly inside this folder (repeatable, not recursive).
    #[arg(long, value_name = "DIR")]
    pub folder: Vec<PathBuf>,
}

/// Rule flags. Each one given overrides the configured value.
#[derive(Debug, Clone, Default, Args)]
pub struct RuleArgs {
    /// Remove every match of this regular expression.
    #[arg(long, value_name = "REGEX")]
    pub regex_remove: Option<String>,
    /// Literal text to replace.
    #[arg(long, value_name = "TEXT")]
    pub find: Option<String>,
    /// Replacement for --find (empty deletes).
    #[arg(long, value_name = "TEXT")]
    pub replace: Option<String>,
    /// Characters to delete from the start of the name.
    #[arg(long, value_name = "N")]
    pub delete_start: Option<usize>,
    /// Characters to delete from the end of the name.
    #[arg(long, value_name = "N")]
    pub delete_end: Option<usize>,
    /// Append "_<date>" formatted with this strftime pattern.
    #[arg(long, value_name = "FORMAT")]
    pub date_format: Option<String>,
    /// New base name; "{n}" is replaced by the sequence number.
    #[arg(long, value_name = "TEMPLATE")]
    pub template: Option<String>,
    /// First sequence number.
    #[arg(long, value_name = "N", allow_negative_numbers = true)]
    pub start: Option<i64>,
    /// Sequence increment.
    #[arg(long, value_name = "N", allow_negative_numbers = true)]
    pub step: Option<i64>,
    /// Replace the extension (without the dot).
    #[arg(long, value_name = "EXT")]
    pub extension: Option<String>,
    /// Case conversion applied last.
    #[arg(long = "case", value_enum, value_name = "MODE")]
    pub case_conversion: Option<CaseArg>,
}

/// Case conversion as accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CaseArg {
    None,
    Upper,
    Lower,
}

impl From<CaseArg> for CaseConversion {
    fn from(arg: CaseArg) -> Self {
        match arg {
            CaseArg::None => CaseConversion::None,
            CaseArg::Upper => CaseConversion::Upper,
            CaseArg::Lower => CaseConversion::Lower,
        }
    }
}

impl RuleArgs {
    /// Overlays the flags that were given onto `base`.
    pub fn apply_to(&self, base: RuleSet) -> RuleSet {
        let mut rules = base;
        if let Some(v) = &self.regex_remove {
            rules.regex_remove = v.clone();
        }
        if let Some(v) = &self.find {
            rules.find = v.clone();
        }
        if let Some(v) = &self.replace {
            rules.replace = v.clone();
        }
        if let Some(v) = self.delete_start {
            rules.delete_start = v;
        }
        if let Some(v) = self.delete_end {
            rules.delete_end = v;
        }
        if let Some(v) = &self.date_format {
            rules.date_format = v.clone();
        }
        if let Some(v) = &self.template {
            rules.template = v.clone();
        }
        if let Some(v) = self.start {
            rules.start_number = v;
        }
        if let Some(v) = self.step {
            rules.step_number = v;
        }
        if let Some(v) = &self.extension {
            rules.new_extension = v.clone();
        }
        if let Some(v) = self.case_conversion {
            rules.case_conversion = v.into();
        }
        rules
    }
}

/// Runs the CLI application.
///
/// # Examples
///
/// ```no_run
/// use batchren::cli::{run_cli, Cli};
/// use clap::Parser;
///
/// let cli = Cli::parse_from(["batchren", "preview", "a.JPG", "--case", "lower"]);
/// if let Err(e) = run_cli(cli) {
///     eprintln!("Error: {}", e);
/// }
/// ```
pub fn run_cli(cli: Cli) -> Result<(), String> {
    let config = AppConfig::load(cli.config.as_deref())
        .map_err(|e| format!("Error loading configuration: {}", e))?;

    match cli.command {
        Command::List { selection, search } => {
            let session = build_session(&selection, &config)?;
            list_files(&session, search.as_deref());
            Ok(())
        }
        Command::Preview {
            selection,
            rules,
            json,
        } => {
            let mut session = build_session(&selection, &config)?;
            let rules = rules.apply_to(config.rules.clone());
            let preview = session.generate_preview(&rules);
            if json {
                OutputFormatter::json(preview)
            } else {
                OutputFormatter::preview_table(preview);
                Ok(())
            }
        }
        Command::Rename {
            selection,
            rules,
            json,
        } => {
            let mut session = build_session(&selection, &config)?;
            let rules = rules.apply_to(config.rules.clone());
            rename_files(&mut session, &rules, json)
        }
        Command::Move { selection, to } => {
            let mut session = build_session(&selection, &config)?;
            check_destination(&to)?;
            OutputFormatter::info(&format!("Moving {} file(s) to {}", session.len(), to.display()));
            let result = with_progress(session.len(), |tick| session.move_to(&to, tick));
            report(&result)
        }
        Command::Copy { selection, to } => {
            let session = build_session(&selection, &config)?;
            check_destination(&to)?;
            OutputFormatter::info(&format!("Copying {} file(s) to {}", session.len(), to.display()));
            let result = with_progress(session.len(), |tick| session.copy_to(&to, tick));
            report(&result)
        }
        Command::Delete { selection, yes } => {
            let mut session = build_session(&selection, &config)?;
            if !yes {
                let stdin = io::stdin();
                if !confirm_delete(session.len(), &mut stdin.lock()) {
                    OutputFormatter::info("Deletion cancelled. No files were touched.");
                    return Ok(());
                }
            }
            let result = with_progress(session.len(), |tick| session.delete(tick));
            report(&result)
        }
    }
}

/// Builds the selection from explicit files first, then each folder.
fn build_session(args: &SelectionArgs, config: &AppConfig) -> Result<RenameSession, String> {
    let mut session = RenameSession::new();
    session.add_files(args.files.iter());

    if !args.folder.is_empty() {
        let filter = config
            .selection
            .compile()
            .map_err(|e| format!("Error compiling filters: {}", e))?;
        for folder in &args.folder {
            session
                .add_folder(folder, &filter)
                .map_err(|e| e.to_string())?;
        }
    }

    if session.is_empty() {
        return Err("No files selected. Pass file paths or --folder <DIR>.".to_string());
    }
    Ok(session)
}

fn list_files(session: &RenameSession, search: Option<&str>) {
    let files = session.search(search.unwrap_or(""));
    OutputFormatter::header(&format!("{} of {} selected file(s)", files.len(), session.len()));
    OutputFormatter::file_list(&files);
}

fn rename_files(session: &mut RenameSession, rules: &RuleSet, json: bool) -> Result<(), String> {
    let preview = session.generate_preview(rules).clone();

    if json {
        let result = session.apply_rename().map_err(|e| e.to_string())?;
        OutputFormatter::json(&json!({ "preview": preview, "result": result }))?;
        return failures_to_error(&result);
    }

    OutputFormatter::preview_table(&preview);
    if preview.changed_count() == 0 {
        OutputFormatter::info("Nothing to rename.");
        session.clear();
        return Ok(());
    }

    let pb = OutputFormatter::create_progress_bar(preview.len() as u64);
    let result = session
        .apply_rename_with_progress(|_, _| pb.inc(1))
        .map_err(|e| e.to_string())?;
    pb.finish_and_clear();
    report(&result)
}

fn check_destination(destination: &Path) -> Result<(), String> {
    if destination.is_dir() {
        Ok(())
    } else {
        Err(format!(
            "Destination is not a directory: {}",
            destination.display()
        ))
    }
}

/// Runs `work` with a progress bar of `total` steps; `work` receives the tick callback.
fn with_progress<F>(total: usize, work: F) -> OperationResult
where
    F: FnOnce(&mut dyn FnMut(&Path, bool)) -> OperationResult,
{
    let pb = OutputFormatter::create_progress_bar(total as u64);
    let mut tick = |_: &Path, _: bool| pb.inc(1);
    let result = work(&mut tick);
    pb.finish_and_clear();
    result
}

fn report(result: &OperationResult) -> Result<(), String> {
    OutputFormatter::operation_report(result);
    failures_to_error(result)
}

fn failures_to_error(result: &OperationResult) -> Result<(), String> {
    if result.is_complete_success() {
        Ok(())
    } else {
        Err(format!(
            "{} of {} file(s) could not be processed. Please review errors above.",
            result.errors.len(),
            result.total_processed()
        ))
    }
}

/// Asks for delete confirmation on `input`. Only "y" or "yes" confirm.
pub fn confirm_delete<R: BufRead>(count: usize, input: &mut R) -> bool {
    print!(
        "Delete {} {}? This cannot be undone. [y/N] ",
        count,
        if count == 1 { "file" } else { "files" }
    );
    let _ = io::stdout().flush();

    let mut answer = String::new();
    if input.read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}
