//! Rule values for the rename pipeline.
//!
//! A [`RuleSet`] is a plain value object: every field is optional and an
//! empty rule set leaves names untouched. It deserializes from the `[rules]`
//! table of a configuration file and is built field by field from
//! command-line flags.

use serde::{Deserialize, Serialize};

/// Placeholder in [`RuleSet::template`] that receives the sequence number.
pub const SEQUENCE_PLACEHOLDER: &str = "{n}";

/// Final case folding applied to the whole name, extension included.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaseConversion {
    /// Leave the case as it is.
    #[default]
    None,
    /// Fold the whole name to upper case.
    Upper,
    /// Fold the whole name to lower case.
    Lower,
}

impl CaseConversion {
    /// Applies this conversion to `name`.
    pub fn apply(self, name: &str) -> String {
        match self {
            CaseConversion::None => name.to_string(),
            CaseConversion::Upper => name.to_uppercase(),
            CaseConversion::Lower => name.to_lowercase(),
        }
    }
}

/// Ordered set of name transformation rules.
///
/// Empty strings and zero counts disable the corresponding step, so
/// `RuleSet::default()` is the identity transformation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleSet {
    /// Regex whose matches are removed from the name.
    pub regex_remove: String,
    /// Literal text to search for.
    pub find: String,
    /// Replacement for every occurrence of `find`. Empty deletes matches.
    pub replace: String,
    /// Characters trimmed from the start of the name.
    pub delete_start: usize,
    /// Characters trimmed from the end of the name.
    pub delete_end: usize,
    /// strftime-style pattern; the formatted timestamp is appended as `_<date>`.
    pub date_format: String,
    /// Replacement body for the name; `{n}` receives the sequence number.
    pub template: String,
    /// First sequence number handed out.
    pub start_number: i64,
    /// Increment applied after every name that used the template.
    pub step_number: i64,
    /// Replacement extension, without the leading dot.
    pub new_extension: String,
    pub case_conversion: CaseConversion,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self {
            regex_remove: String::new(),
            find: String::new(),
            replace: String::new(),
            delete_start: 0,
            delete_end: 0,
            date_format: String::new(),
            template: String::new(),
            start_number: 1,
            step_number: 1,
            new_extension: String::new(),
            case_conversion: CaseConversion::None,
        }
    }
}

impl RuleSet {
    /// Returns a fresh sequence counter seeded from this rule set.
    pub fn sequence(&self) -> SequenceCounter {
        SequenceCounter::new(self.start_number, self.step_number)
    }

    /// Returns true when no step would change a name.
    pub fn is_identity(&self) -> bool {
        self.regex_remove.is_empty()
            && self.find.is_empty()
            && self.delete_start == 0
            && self.delete_end == 0
            && self.date_format.is_empty()
            && self.template.is_empty()
            && self.new_extension.is_empty()
            && self.case_conversion == CaseConversion::None
    }
}

/// Sequence state shared by every file of one preview run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequenceCounter {
    current: i64,
    step: i64,
}

impl SequenceCounter {
    pub fn new(start: i64, step: i64) -> Self {
        Self {
            current: start,
            step,
        }
    }

    /// The value the next templated name will receive.
    pub fn current(&self) -> i64 {
        self.current
    }

    /// Returns the current value and advances by the step.
    pub fn take(&mut self) -> i64 {
        let value = self.current;
        self.current = self.current.saturating_add(self.step);
        value
    }
}
