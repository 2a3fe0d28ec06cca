//! Selection session: the files a user picked and the preview computed for them.
//!
//! A [`RenameSession`] owns the selection list and the current preview. The
//! pipeline and the executor only ever see values handed out by the session.
//! Any change to the selection drops the preview, as does a move or delete
//! that took files away. A committed rename clears both.

use crate::config::SelectionFilter;
use crate::executor::{BatchOperation, OperationExecutor, OperationResult, RenameItem};
use crate::pipeline::{Preview, RulePipeline, basename};
use crate::rules::RuleSet;
use log::{debug, info};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// A selected file. Never mutated once added.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    path: PathBuf,
    name: String,
}

impl FileEntry {
    /// Creates an entry, making `path` absolute against the working directory.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let path = std::path::absolute(&path).unwrap_or(path);
        let name = basename(&path);
        Self { path, name }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name component of the path.
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Errors raised by session-level actions, before any file is touched.
#[derive(Debug)]
pub enum SessionError {
    /// Rename was requested before a preview was generated.
    NoPreview,
    /// The folder to scan could not be read.
    FolderUnreadable { path: PathBuf, source: io::Error },
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoPreview => write!(f, "Generate a preview before applying the rename"),
            Self::FolderUnreadable { path, source } => {
                write!(f, "Error reading directory {}: {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::FolderUnreadable { source, .. } => Some(source),
            Self::NoPreview => None,
        }
    }
}

/// The files a user is working on and the last preview computed for them.
#[derive(Debug, Default)]
pub struct RenameSession {
    files: Vec<FileEntry>,
    preview: Option<Preview>,
}

impl RenameSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn files(&self) -> &[FileEntry] {
        &self.files
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn preview(&self) -> Option<&Preview> {
        self.preview.as_ref()
    }

    /// Appends files to the selection, skipping paths already selected.
    /// Returns how many were added.
    pub fn add_files<I, P>(&mut self, paths: I) -> usize
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let mut added = 0;
        for path in paths {
            let entry = FileEntry::new(path);
            if self.files.iter().any(|f| f.path == entry.path) {
                debug!("Already selected: {}", entry.path.display());
                continue;
            }
            self.files.push(entry);
            added += 1;
        }
        if added > 0 {
            self.preview = None;
        }
        added
    }

    /// Appends the regular files directly inside `folder` that pass
    /// `filter`, sorted by name. Subdirectories are not descended into.
    pub fn add_folder(
        &mut self,
        folder: &Path,
        filter: &SelectionFilter,
    ) -> Result<usize, SessionError> {
        let entries = fs::read_dir(folder).map_err(|e| SessionError::FolderUnreadable {
            path: folder.to_path_buf(),
            source: e,
        })?;

        let mut paths: Vec<PathBuf> = entries
            .flatten()
            .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
            .map(|entry| entry.path())
            .filter(|path| filter.should_include(path))
            .collect();
        paths.sort();

        let added = self.add_files(paths);
        info!("Added {} file(s) from {}", added, folder.display());
        Ok(added)
    }

    /// Selected files whose name contains `keyword`, ignoring case.
    /// The selection itself is unchanged.
    pub fn search(&self, keyword: &str) -> Vec<&FileEntry> {
        let keyword = keyword.to_lowercase();
        self.files
            .iter()
            .filter(|f| f.name.to_lowercase().contains(&keyword))
            .collect()
    }

    /// Empties the selection and drops the preview.
    pub fn clear(&mut self) {
        self.files.clear();
        self.preview = None;
    }

    /// Computes and stores a fresh preview for the current selection.
    pub fn generate_preview(&mut self, rules: &RuleSet) -> &Preview {
        let pipeline = RulePipeline::new(rules);
        self.store_preview(&pipeline)
    }

    /// Computes and stores a preview with an already-built pipeline.
    pub fn store_preview(&mut self, pipeline: &RulePipeline<'_>) -> &Preview {
        let preview = pipeline.preview(self.files.iter().map(FileEntry::path));
        self.preview.insert(preview)
    }

    /// Commits the stored preview as renames, then clears the session.
    pub fn apply_rename(&mut self) -> Result<OperationResult, SessionError> {
        self.apply_rename_with_progress(|_, _| {})
    }

    pub fn apply_rename_with_progress<F>(
        &mut self,
        on_item: F,
    ) -> Result<OperationResult, SessionError>
    where
        F: FnMut(&Path, bool),
    {
        let preview = match &self.preview {
            Some(preview) if !preview.is_empty() => preview,
            _ => return Err(SessionError::NoPreview),
        };

        let items: Vec<RenameItem> = preview
            .entries
            .iter()
            .map(|entry| RenameItem::new(&entry.source, &entry.new_name))
            .collect();

        let result = OperationExecutor::execute_with_progress(BatchOperation::Rename(&items), on_item);
        self.clear();
        Ok(result)
    }

    /// Moves every selected file into `destination`. The selection is kept;
    /// the preview is dropped once any file has left its old path.
    pub fn move_to<F>(&mut self, destination: &Path, on_item: F) -> OperationResult
    where
        F: FnMut(&Path, bool),
    {
        let sources = self.source_paths();
        let result = OperationExecutor::execute_with_progress(
            BatchOperation::Move {
                sources: &sources,
                destination,
            },
            on_item,
        );
        self.drop_stale_preview(&result);
        result
    }

    /// Copies every selected file into `destination`. The selection is kept.
    pub fn copy_to<F>(&self, destination: &Path, on_item: F) -> OperationResult
    where
        F: FnMut(&Path, bool),
    {
        let sources = self.source_paths();
        OperationExecutor::execute_with_progress(
            BatchOperation::Copy {
                sources: &sources,
                destination,
            },
            on_item,
        )
    }

    /// Deletes every selected file. The caller must have confirmed this.
    pub fn delete<F>(&mut self, on_item: F) -> OperationResult
    where
        F: FnMut(&Path, bool),
    {
        let sources = self.source_paths();
        let result =
            OperationExecutor::execute_with_progress(BatchOperation::Delete(&sources), on_item);
        self.drop_stale_preview(&result);
        result
    }

    fn drop_stale_preview(&mut self, result: &OperationResult) {
        if result.success_count > 0 && self.preview.take().is_some() {
            debug!("Preview dropped after {}", result.kind);
        }
    }

    fn source_paths(&self) -> Vec<PathBuf> {
        self.files.iter().map(|f| f.path.clone()).collect()
    }
}
