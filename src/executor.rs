/// Filesystem operation executor for committed batches.
///
/// This module performs the real rename, move, copy and delete operations for
/// a batch of files. Every item is isolated: a failure is recorded in the
/// [`OperationResult`] and processing continues with the next item. No item
/// is ever left half-applied.
use crate::pipeline::split_extension;
use log::{debug, info, warn};
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// The four batch operations the executor knows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Rename,
    Move,
    Copy,
    Delete,
}

impl OperationKind {
    /// Past-tense verb used in reports ("Renamed 3 files").
    pub fn past_tense(&self) -> &'static str {
        match self {
            OperationKind::Rename => "Renamed",
            OperationKind::Move => "Moved",
            OperationKind::Copy => "Copied",
            OperationKind::Delete => "Deleted",
        }
    }
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            OperationKind::Rename => "rename",
            OperationKind::Move => "move",
            OperationKind::Copy => "copy",
            OperationKind::Delete => "delete",
        };
        f.write_str(name)
    }
}

/// A source file and the name it should be renamed to in its own directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameItem {
    pub source: PathBuf,
    pub new_name: String,
}

impl RenameItem {
    pub fn new(source: impl Into<PathBuf>, new_name: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            new_name: new_name.into(),
        }
    }
}

/// A batch ready to be committed.
#[derive(Debug, Clone, Copy)]
pub enum BatchOperation<'a> {
    /// Rename each file inside its own directory.
    Rename(&'a [RenameItem]),
    /// Move each file into `destination`, keeping its name.
    Move {
        sources: &'a [PathBuf],
        destination: &'a Path,
    },
    /// Copy each file into `destination`, keeping its name.
    Copy {
        sources: &'a [PathBuf],
        destination: &'a Path,
    },
    /// Remove each file. Confirmation is the caller's job.
    Delete(&'a [PathBuf]),
}

impl BatchOperation<'_> {
    pub fn kind(&self) -> OperationKind {
        match self {
            BatchOperation::Rename(_) => OperationKind::Rename,
            BatchOperation::Move { .. } => OperationKind::Move,
            BatchOperation::Copy { .. } => OperationKind::Copy,
            BatchOperation::Delete(_) => OperationKind::Delete,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            BatchOperation::Rename(items) => items.len(),
            BatchOperation::Move { sources, .. }
            | BatchOperation::Copy { sources, .. }
            | BatchOperation::Delete(sources) => sources.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Why a single item failed.
#[derive(Debug)]
pub enum OperationError {
    /// The source file does not exist.
    SourceMissing { path: PathBuf },
    /// A file already exists where a move or copy would put this one.
    DestinationExists { path: PathBuf },
    /// The move/copy destination is not an existing directory.
    DestinationNotDirectory { path: PathBuf },
    /// The proposed name cannot be used as a file name.
    InvalidName { name: String, reason: &'static str },
    /// The underlying filesystem call failed.
    Io {
        action: OperationKind,
        path: PathBuf,
        source: io::Error,
    },
}

impl std::fmt::Display for OperationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SourceMissing { path } => {
                write!(f, "Source file not found: {}", path.display())
            }
            Self::DestinationExists { path } => {
                write!(f, "Destination already exists: {}", path.display())
            }
            Self::DestinationNotDirectory { path } => {
                write!(f, "Destination is not a directory: {}", path.display())
            }
            Self::InvalidName { name, reason } => {
                write!(f, "Invalid file name '{}': {}", name, reason)
            }
            Self::Io {
                action,
                path,
                source,
            } => {
                write!(f, "Failed to {} {}: {}", action, path.display(), source)
            }
        }
    }
}

impl std::error::Error for OperationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Result type for a single executor item.
pub type OperationItemResult<T> = Result<T, OperationError>;

/// A failed item: which file, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemFailure {
    pub path: PathBuf,
    pub reason: String,
}

/// A successfully committed item. `destination` is `None` for deletions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommittedItem {
    pub source: PathBuf,
    pub destination: Option<PathBuf>,
}

/// Aggregate outcome of one batch.
#[derive(Debug, Clone, Serialize)]
pub struct OperationResult {
    pub kind: OperationKind,
    pub success_count: usize,
    /// Committed items in processing order.
    pub committed: Vec<CommittedItem>,
    /// Failed items in processing order.
    pub errors: Vec<ItemFailure>,
}

impl OperationResult {
    fn new(kind: OperationKind) -> Self {
        Self {
            kind,
            success_count: 0,
            committed: Vec::new(),
            errors: Vec::new(),
        }
    }

    fn record_success(&mut self, source: &Path, destination: Option<PathBuf>) {
        self.success_count += 1;
        self.committed.push(CommittedItem {
            source: source.to_path_buf(),
            destination,
        });
    }

    fn record_failure(&mut self, path: &Path, error: &OperationError) {
        self.errors.push(ItemFailure {
            path: path.to_path_buf(),
            reason: error.to_string(),
        });
    }

    /// Total number of items processed.
    pub fn total_processed(&self) -> usize {
        self.success_count + self.errors.len()
    }

    /// Returns true if every item succeeded.
    pub fn is_complete_success(&self) -> bool {
        self.errors.is_empty()
    }

    /// Single combined report: count of successes plus every failure.
    pub fn summary(&self) -> String {
        let mut message = format!(
            "{} {} {}",
            self.kind.past_tense(),
            self.success_count,
            if self.success_count == 1 { "file" } else { "files" }
        );
        if !self.errors.is_empty() {
            message.push_str("\n\nErrors:");
            for failure in &self.errors {
                message.push_str(&format!("\n  {}: {}", failure.path.display(), failure.reason));
            }
        }
        message
    }
}

/// Performs batch filesystem operations.
pub struct OperationExecutor;

impl OperationExecutor {
    /// Runs every item of `operation` and returns the aggregate result.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use batchren::executor::{BatchOperation, OperationExecutor, RenameItem};
    ///
    /// let items = vec![RenameItem::new("/photos/IMG_0001.JPG", "beach.jpg")];
    /// let result = OperationExecutor::execute(BatchOperation::Rename(&items));
    /// println!("{}", result.summary());
    /// ```
    pub fn execute(operation: BatchOperation<'_>) -> OperationResult {
        Self::execute_with_progress(operation, |_, _| {})
    }

    /// Like [`execute`](Self::execute), calling `on_item(source, succeeded)`
    /// after each item.
    pub fn execute_with_progress<F>(operation: BatchOperation<'_>, mut on_item: F) -> OperationResult
    where
        F: FnMut(&Path, bool),
    {
        let kind = operation.kind();
        let mut result = OperationResult::new(kind);
        info!("Starting {} of {} item(s)", kind, operation.len());

        let mut record = |source: &Path, outcome: OperationItemResult<Option<PathBuf>>| {
            match outcome {
                Ok(destination) => {
                    debug!("{} ok: {}", kind, source.display());
                    result.record_success(source, destination);
                    on_item(source, true);
                }
                Err(e) => {
                    warn!("{} failed: {}", kind, e);
                    result.record_failure(source, &e);
                    on_item(source, false);
                }
            }
        };

        match operation {
            BatchOperation::Rename(items) => {
                for item in items {
                    record(item.source.as_path(), Self::rename_one(item).map(Some));
                }
            }
            BatchOperation::Move {
                sources,
                destination,
            } => {
                for source in sources {
                    record(source.as_path(), Self::move_one(source, destination).map(Some));
                }
            }
            BatchOperation::Copy {
                sources,
                destination,
            } => {
                for source in sources {
                    record(source.as_path(), Self::copy_one(source, destination).map(Some));
                }
            }
            BatchOperation::Delete(sources) => {
                for source in sources {
                    record(source.as_path(), Self::delete_one(source).map(|()| None));
                }
            }
        }

        info!(
            "Finished {}: {} succeeded, {} failed",
            kind,
            result.success_count,
            result.errors.len()
        );
        result
    }

    /// Renames one file inside its directory, picking `name (k).ext` when
    /// the proposed name is taken. Returns the final path.
    pub fn rename_one(item: &RenameItem) -> OperationItemResult<PathBuf> {
        validate_file_name(&item.new_name)?;
        if !item.source.is_file() {
            return Err(OperationError::SourceMissing {
                path: item.source.clone(),
            });
        }
        // Proposed names are computed from text, so a name that is not UTF-8
        // would come back with replacement characters.
        if let Some(current) = item.source.file_name()
            && current.to_str().is_none()
        {
            return Err(OperationError::InvalidName {
                name: current.to_string_lossy().into_owned(),
                reason: "name is not valid UTF-8",
            });
        }

        let directory = item.source.parent().unwrap_or_else(|| Path::new(""));
        let wanted = directory.join(&item.new_name);

        let destination = if wanted == item.source || is_same_file(&item.source, &wanted) {
            wanted
        } else {
            unique_destination(directory, &item.new_name)
        };

        if destination != item.source {
            fs::rename(&item.source, &destination).map_err(|e| OperationError::Io {
                action: OperationKind::Rename,
                path: item.source.clone(),
                source: e,
            })?;
        }

        Ok(destination)
    }

    /// Moves one file into `destination_dir`. Fails if the target exists.
    pub fn move_one(source: &Path, destination_dir: &Path) -> OperationItemResult<PathBuf> {
        let target = Self::transfer_target(source, destination_dir)?;

        if let Err(rename_error) = fs::rename(source, &target) {
            // Typically a cross-filesystem move; fall back to copy + remove.
            debug!(
                "rename {} -> {} failed ({}), copying instead",
                source.display(),
                target.display(),
                rename_error
            );
            copy_or_discard(source, &target).map_err(|e| OperationError::Io {
                action: OperationKind::Move,
                path: source.to_path_buf(),
                source: e,
            })?;
            if let Err(e) = fs::remove_file(source) {
                let _ = fs::remove_file(&target);
                return Err(OperationError::Io {
                    action: OperationKind::Move,
                    path: source.to_path_buf(),
                    source: e,
                });
            }
        }

        Ok(target)
    }

    /// Copies one file into `destination_dir`. Fails if the target exists.
    pub fn copy_one(source: &Path, destination_dir: &Path) -> OperationItemResult<PathBuf> {
        let target = Self::transfer_target(source, destination_dir)?;
        copy_or_discard(source, &target).map_err(|e| OperationError::Io {
            action: OperationKind::Copy,
            path: source.to_path_buf(),
            source: e,
        })?;
        Ok(target)
    }

    /// Deletes one file.
    pub fn delete_one(source: &Path) -> OperationItemResult<()> {
        if !source.exists() {
            return Err(OperationError::SourceMissing {
                path: source.to_path_buf(),
            });
        }
        fs::remove_file(source).map_err(|e| OperationError::Io {
            action: OperationKind::Delete,
            path: source.to_path_buf(),
            source: e,
        })
    }

    /// Validates a move/copy and returns `destination_dir/basename(source)`.
    fn transfer_target(source: &Path, destination_dir: &Path) -> OperationItemResult<PathBuf> {
        if !source.is_file() {
            return Err(OperationError::SourceMissing {
                path: source.to_path_buf(),
            });
        }
        if !destination_dir.is_dir() {
            return Err(OperationError::DestinationNotDirectory {
                path: destination_dir.to_path_buf(),
            });
        }

        let Some(name) = source.file_name() else {
            return Err(OperationError::SourceMissing {
                path: source.to_path_buf(),
            });
        };
        let target = destination_dir.join(name);
        if target.exists() {
            return Err(OperationError::DestinationExists { path: target });
        }
        Ok(target)
    }
}

/// First free path in `directory` for `name`: `name`, then `stem (1).ext`,
/// `stem (2).ext`, ...
///
/// The check is not atomic; a concurrent writer can still take the name.
pub fn unique_destination(directory: &Path, name: &str) -> PathBuf {
    let candidate = directory.join(name);
    if !candidate.exists() {
        return candidate;
    }

    let (stem, extension) = split_extension(name);
    let mut counter: u64 = 1;
    loop {
        let candidate = directory.join(format!("{} ({}){}", stem, counter, extension));
        if !candidate.exists() {
            return candidate;
        }
        counter += 1;
    }
}

/// Copies `source` to `target`, removing the partial target if the copy fails.
fn copy_or_discard(source: &Path, target: &Path) -> io::Result<u64> {
    fs::copy(source, target).inspect_err(|_| {
        let _ = fs::remove_file(target);
    })
}

fn validate_file_name(name: &str) -> OperationItemResult<()> {
    let reason = if name.is_empty() {
        Some("name is empty")
    } else if name == "." || name == ".." {
        Some("name is a directory reference")
    } else if name.contains('/') || (cfg!(windows) && name.contains('\\')) {
        Some("name contains a path separator")
    } else if name.contains('\0') {
        Some("name contains a NUL byte")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(OperationError::InvalidName {
            name: name.to_string(),
            reason,
        }),
        None => Ok(()),
    }
}

/// True when both paths exist and refer to the same file, e.g. a case-only
/// rename on a case-insensitive filesystem.
#[cfg(unix)]
fn is_same_file(a: &Path, b: &Path) -> bool {
    use std::os::unix::fs::MetadataExt;
    match (fs::metadata(a), fs::metadata(b)) {
        (Ok(ma), Ok(mb)) => ma.dev() == mb.dev() && ma.ino() == mb.ino(),
        _ => false,
    }
}

#[cfg(not(unix))]
fn is_same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(ca), Ok(cb)) => ca == cb,
        _ => false,
    }
}
