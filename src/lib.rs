//! batchren - batch file renaming with preview
//!
//! This library turns original file names into new ones through an ordered
//! chain of rules, shows the result as a preview, and commits rename, move,
//! copy or delete batches to the filesystem with per-file error reporting.

pub mod cli;
pub mod config;
pub mod executor;
pub mod output;
pub mod pipeline;
pub mod rules;
pub mod selection;

pub use config::{AppConfig, ConfigError, SelectionConfig, SelectionFilter};
pub use executor::{
    BatchOperation, ItemFailure, OperationError, OperationExecutor, OperationKind,
    OperationResult, RenameItem,
};
pub use pipeline::{
    Preview, PreviewEntry, RulePipeline, RuleWarning, compute_new_name, generate_preview,
};
pub use rules::{CaseConversion, RuleSet, SequenceCounter};
pub use selection::{FileEntry, RenameSession, SessionError};

pub use cli::{Cli, run_cli};
