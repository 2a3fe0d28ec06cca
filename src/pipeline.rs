//! Rule pipeline: turns an original file name into a proposed new name.
//!
//! Steps run in a fixed order, each one consuming the output of the previous:
//!
//! 1. regex removal
//! 2. literal find/replace
//! 3. trim characters from the start
//! 4. trim characters from the end
//! 5. append `_<timestamp>`
//! 6. replace the body with the numbered template (extension kept)
//! 7. replace the extension
//! 8. case conversion (extension included)
//!
//! The pipeline never touches the filesystem. Invalid rules (a regex that
//! does not compile, a date pattern chrono rejects) are reported once as
//! [`RuleWarning`]s and their step is skipped for every file.

use crate::rules::{RuleSet, SEQUENCE_PLACEHOLDER, SequenceCounter};
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Local};
use log::{debug, warn};
use regex::Regex;
use serde::Serialize;
use std::fmt::Write;
use std::path::{Path, PathBuf};

/// A rule that could not be used and was skipped for the whole batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RuleWarning {
    /// The removal pattern is not a valid regular expression.
    InvalidRegex { pattern: String, reason: String },
    /// The date pattern contains a specifier chrono does not understand.
    InvalidDateFormat { pattern: String },
}

impl std::fmt::Display for RuleWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RuleWarning::InvalidRegex { pattern, reason } => {
                write!(
                    f,
                    "Regex '{}' is invalid, removal step skipped: {}",
                    pattern, reason
                )
            }
            RuleWarning::InvalidDateFormat { pattern } => {
                write!(f, "Date format '{}' is invalid, date step skipped", pattern)
            }
        }
    }
}

/// One row of a preview: where the file is, what it is called, what it will be called.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreviewEntry {
    pub source: PathBuf,
    pub original_name: String,
    pub new_name: String,
}

impl PreviewEntry {
    pub fn is_changed(&self) -> bool {
        self.original_name != self.new_name
    }
}

/// Result of running the pipeline over a whole selection.
#[derive(Debug, Clone, Serialize)]
pub struct Preview {
    /// Timestamp used by the date step for every entry.
    pub generated_at: DateTime<Local>,
    /// One entry per selected file, in selection order.
    pub entries: Vec<PreviewEntry>,
    pub warnings: Vec<RuleWarning>,
}

impl Preview {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Number of entries whose proposed name differs from the original.
    pub fn changed_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_changed()).count()
    }
}

/// Rules compiled for one batch, with a single sampled timestamp.
#[derive(Debug)]
pub struct RulePipeline<'a> {
    rules: &'a RuleSet,
    regex: Option<Regex>,
    date_format: Option<&'a str>,
    timestamp: DateTime<Local>,
    warnings: Vec<RuleWarning>,
}

impl<'a> RulePipeline<'a> {
    /// Compiles `rules` and samples the current local time for the date step.
    pub fn new(rules: &'a RuleSet) -> Self {
        Self::with_timestamp(rules, Local::now())
    }

    /// Compiles `rules` using a fixed timestamp for the date step.
    pub fn with_timestamp(rules: &'a RuleSet, timestamp: DateTime<Local>) -> Self {
        let mut warnings = Vec::new();

        let regex = if rules.regex_remove.is_empty() {
            None
        } else {
            match Regex::new(&rules.regex_remove) {
                Ok(regex) => Some(regex),
                Err(e) => {
                    warn!("Skipping regex removal: {}", e);
                    warnings.push(RuleWarning::InvalidRegex {
                        pattern: rules.regex_remove.clone(),
                        reason: e.to_string(),
                    });
                    None
                }
            }
        };

        let date_format = if rules.date_format.is_empty() {
            None
        } else if is_valid_date_format(&rules.date_format) {
            Some(rules.date_format.as_str())
        } else {
            warn!("Skipping date step: invalid format {:?}", rules.date_format);
            warnings.push(RuleWarning::InvalidDateFormat {
                pattern: rules.date_format.clone(),
            });
            None
        };

        Self {
            rules,
            regex,
            date_format,
            timestamp,
            warnings,
        }
    }

    pub fn warnings(&self) -> &[RuleWarning] {
        &self.warnings
    }

    pub fn timestamp(&self) -> DateTime<Local> {
        self.timestamp
    }

    /// Computes the new name for `original`, advancing `counter` when the
    /// template step runs.
    pub fn compute_new_name(&self, original: &str, counter: &mut SequenceCounter) -> String {
        let rules = self.rules;
        let mut name = original.to_string();

        if let Some(regex) = &self.regex {
            name = regex.replace_all(&name, "").into_owned();
        }

        if !rules.find.is_empty() {
            name = name.replace(&rules.find, &rules.replace);
        }

        name = drop_leading_chars(&name, rules.delete_start);
        if rules.delete_end > 0 {
            name = drop_trailing_chars(&name, rules.delete_end);
        }

        if let Some(pattern) = self.date_format {
            let mut stamp = String::new();
            if write!(stamp, "{}", self.timestamp.format(pattern)).is_ok() {
                name = format!("{}_{}", name, stamp);
            }
        }

        if !rules.template.is_empty() {
            let extension = split_extension(&name).1.to_string();
            let number = counter.take();
            let body = rules
                .template
                .replace(SEQUENCE_PLACEHOLDER, &number.to_string());
            name = format!("{}{}", body, extension);
        }

        if !rules.new_extension.is_empty() {
            let stem = split_extension(&name).0;
            name = format!("{}.{}", stem, rules.new_extension);
        }

        rules.case_conversion.apply(&name)
    }

    /// Runs the pipeline over `sources` in order with one shared counter.
    pub fn preview<'p, I>(&self, sources: I) -> Preview
    where
        I: IntoIterator<Item = &'p Path>,
    {
        let mut counter = self.rules.sequence();
        let entries: Vec<PreviewEntry> = sources
            .into_iter()
            .map(|source| {
                let original_name = basename(source);
                let new_name = self.compute_new_name(&original_name, &mut counter);
                PreviewEntry {
                    source: source.to_path_buf(),
                    original_name,
                    new_name,
                }
            })
            .collect();

        debug!(
            "Preview generated: {} entries, {} warnings",
            entries.len(),
            self.warnings.len()
        );

        Preview {
            generated_at: self.timestamp,
            entries,
            warnings: self.warnings.clone(),
        }
    }
}

/// Computes a single new name with a freshly compiled pipeline.
///
/// The date step, if any, uses the current time. Use [`RulePipeline`]
/// directly when several names must share one timestamp.
pub fn compute_new_name(original: &str, rules: &RuleSet, counter: &mut SequenceCounter) -> String {
    RulePipeline::new(rules).compute_new_name(original, counter)
}

/// Builds a preview for `sources` using the current time.
pub fn generate_preview<'p, I>(sources: I, rules: &RuleSet) -> Preview
where
    I: IntoIterator<Item = &'p Path>,
{
    RulePipeline::new(rules).preview(sources)
}

/// Splits a file name into stem and extension (extension keeps its dot).
///
/// Leading dots never start an extension, so `".bashrc"` has none.
///
/// ```
/// use batchren::pipeline::split_extension;
///
/// assert_eq!(split_extension("photo.tar.gz"), ("photo.tar", ".gz"));
/// assert_eq!(split_extension(".bashrc"), (".bashrc", ""));
/// assert_eq!(split_extension("README"), ("README", ""));
/// ```
pub fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(dot) if name[..dot].chars().any(|c| c != '.') => name.split_at(dot),
        _ => (name, ""),
    }
}

/// File name component of `path` as text, empty if there is none.
pub fn basename(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn is_valid_date_format(pattern: &str) -> bool {
    !StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error))
}

fn drop_leading_chars(name: &str, count: usize) -> String {
    name.chars().skip(count).collect()
}

fn drop_trailing_chars(name: &str, count: usize) -> String {
    let keep = name.chars().count().saturating_sub(count);
    name.chars().take(keep).collect()
}
