//! Tree-operation option models and top-level error types.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::SystemTime;

use serde::Serialize;
use thiserror::Error;

////////////////////////////////////////////////////////////////////////////////
// #region EnumsInit

/// Combination rule for active selection criteria.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum EnumSelectCriterionMode {
    /// Select a file only when every active criterion matches.
    #[default]
    And,
    /// Select a file when any active criterion matches.
    Or,
}

/// Coarse file class used by the file-type mask and directory profiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EnumFileClass {
    /// Plain data file.
    Regular,
    /// Symbolic link (never followed).
    Symlink,
    /// Device file, named pipe, socket, etc.
    OtherNonRegular,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region StructsOptions

/// File-type gate evaluated before selection criteria.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SpecFileTypeMask {
    /// Admit regular files.
    pub if_regular: bool,
    /// Admit symbolic links.
    pub if_symlink: bool,
    /// Admit device files, pipes and sockets.
    pub if_other_non_regular: bool,
}

impl SpecFileTypeMask {
    /// Admit every file class.
    pub fn all() -> Self {
        Self {
            if_regular: true,
            if_symlink: true,
            if_other_non_regular: true,
        }
    }

    /// Admit nothing. Rejected by every tree operation.
    pub fn none() -> Self {
        Self {
            if_regular: false,
            if_symlink: false,
            if_other_non_regular: false,
        }
    }

    pub fn is_empty(&self) -> bool {
        !(self.if_regular || self.if_symlink || self.if_other_non_regular)
    }

    pub fn allows(&self, class_file: EnumFileClass) -> bool {
        match class_file {
            EnumFileClass::Regular => self.if_regular,
            EnumFileClass::Symlink => self.if_symlink,
            EnumFileClass::OtherNonRegular => self.if_other_non_regular,
        }
    }
}

impl Default for SpecFileTypeMask {
    fn default() -> Self {
        Self::all()
    }
}

/// Raw file selection criteria. A field is active only when populated.
#[derive(Debug, Clone, Default)]
pub struct SpecSelectionCriteria {
    /// Glob patterns applied to file basename; any match satisfies the field.
    /// Blank strings are ignored.
    pub patterns_file_name: Option<Vec<String>>,
    /// Select files modified strictly before this instant.
    pub time_older_than: Option<SystemTime>,
    /// Select files modified strictly after this instant.
    pub time_newer_than: Option<SystemTime>,
    /// Regular expression searched in file basename. Empty string is inactive.
    pub pattern_regex: Option<String>,
    /// Exact permission bits (`mode & 0o7777`).
    pub mode_match: Option<u32>,
    /// AND/OR combination of the active fields.
    pub rule_combine: EnumSelectCriterionMode,
}

impl SpecSelectionCriteria {
    /// Whether at least one field participates in selection.
    pub fn is_active(&self) -> bool {
        let if_patterns = self
            .patterns_file_name
            .as_ref()
            .is_some_and(|l| l.iter().any(|p| !p.trim().is_empty()));
        let if_regex = self.pattern_regex.as_ref().is_some_and(|p| !p.is_empty());
        if_patterns
            || if_regex
            || self.time_older_than.is_some()
            || self.time_newer_than.is_some()
            || self.mode_match.is_some()
    }
}

/// Cooperative cancellation flag, checked once per drained directory.
#[derive(Debug, Clone, Default)]
pub struct TokenCancel {
    flag: Arc<AtomicBool>,
}

impl TokenCancel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Input options for `copy_tree`.
#[derive(Debug, Clone)]
pub struct SpecTreeCopyOptions {
    /// Process the files of the source root itself, not only its subdirectories.
    pub if_include_root: bool,
    /// Materialize target directories even when no file qualifies.
    pub if_create_empty_dirs: bool,
    /// File classes admitted before criteria evaluation.
    pub mask_file_types: SpecFileTypeMask,
    /// File selection criteria.
    pub criteria: SpecSelectionCriteria,
    /// Collect handles of every copied target file.
    pub if_return_copied_list: bool,
    /// Optional cancellation token.
    pub token_cancel: Option<TokenCancel>,
}

impl Default for SpecTreeCopyOptions {
    fn default() -> Self {
        Self {
            if_include_root: true,
            if_create_empty_dirs: false,
            mask_file_types: SpecFileTypeMask::default(),
            criteria: SpecSelectionCriteria::default(),
            if_return_copied_list: false,
            token_cancel: None,
        }
    }
}

/// Input options for `delete_tree_files`.
#[derive(Debug, Clone)]
pub struct SpecTreeDeleteOptions {
    /// Process the files of the target root itself.
    pub if_include_root: bool,
    /// File classes admitted before criteria evaluation.
    pub mask_file_types: SpecFileTypeMask,
    /// File selection criteria.
    pub criteria: SpecSelectionCriteria,
    /// Collect handles of every deleted file.
    pub if_return_deleted_list: bool,
    /// Optional cancellation token.
    pub token_cancel: Option<TokenCancel>,
}

impl Default for SpecTreeDeleteOptions {
    fn default() -> Self {
        Self {
            if_include_root: true,
            mask_file_types: SpecFileTypeMask::default(),
            criteria: SpecSelectionCriteria::default(),
            if_return_deleted_list: false,
            token_cancel: None,
        }
    }
}

/// Input options for `find_tree_files`.
#[derive(Debug, Clone)]
pub struct SpecTreeFindOptions {
    /// Search the files of the root itself.
    pub if_include_root: bool,
    /// Descend into subdirectories; `false` searches the root only.
    pub if_scan_subdirs: bool,
    /// File classes admitted before criteria evaluation.
    pub mask_file_types: SpecFileTypeMask,
    /// File selection criteria.
    pub criteria: SpecSelectionCriteria,
    /// Optional cancellation token.
    pub token_cancel: Option<TokenCancel>,
}

impl Default for SpecTreeFindOptions {
    fn default() -> Self {
        Self {
            if_include_root: true,
            if_scan_subdirs: true,
            mask_file_types: SpecFileTypeMask::default(),
            criteria: SpecSelectionCriteria::default(),
            token_cancel: None,
        }
    }
}

/// Input options for `move_tree`.
///
/// Every file is moved; a move has no selection criteria.
#[derive(Debug, Clone)]
pub struct SpecTreeMoveOptions {
    /// Move the root's own files and remove the root afterwards. When unset,
    /// only the subdirectory trees move and the root keeps its files.
    pub if_include_root: bool,
    /// Optional cancellation token.
    pub token_cancel: Option<TokenCancel>,
}

impl Default for SpecTreeMoveOptions {
    fn default() -> Self {
        Self {
            if_include_root: true,
            token_cancel: None,
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region StructsAndErrors

/// One non-fatal failure item with path + error text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpecItemError {
    /// Failed source or destination path.
    pub path: PathBuf,
    /// User-facing error text.
    pub exception: String,
}

impl SpecItemError {
    pub fn new(path: impl Into<PathBuf>, exception: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            exception: exception.into(),
        }
    }
}

impl fmt::Display for SpecItemError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.exception)
    }
}

/// "Walk aborted" errors (validation, setup and fatal traversal stages).
#[derive(Debug, Error)]
pub enum TreeOpError {
    /// Every file class is disabled.
    #[error("File-type mask disables every file class")]
    InvalidFileTypeMask,
    /// Invalid glob or regular expression.
    #[error("{0}")]
    InvalidPattern(String),
    /// Input path cannot be turned into a directory handle.
    #[error("Invalid path {path:?}: {message}")]
    InvalidPath { path: String, message: String },
    /// Root directory does not exist.
    #[error("Root directory does not exist: {}", .0.display())]
    RootNotFound(PathBuf),
    /// Root path exists but is not a directory.
    #[error("Root is not a directory: {}", .0.display())]
    RootNotDirectory(PathBuf),
    /// Source and destination overlap (`src` contains `dst` or vice versa).
    #[error(
        "Source and destination directories overlap: {} <-> {}",
        .dir_source.display(),
        .dir_destination.display()
    )]
    SourceDestinationOverlap {
        /// Normalized source directory.
        dir_source: PathBuf,
        /// Normalized destination directory.
        dir_destination: PathBuf,
    },
    /// Destination root cannot be used.
    #[error("Failed to initialize destination {}: {message}", .path.display())]
    DestinationInitFailed { path: PathBuf, message: String },
    /// Mirrored target path cannot be derived for a source directory.
    #[error("Failed to derive target directory for {}: {message}", .source_dir.display())]
    TargetPathConstruction { source_dir: PathBuf, message: String },
    /// Directory listing failed.
    #[error("Failed to read directory {}: {message}", .path.display())]
    ReadDirFailed { path: PathBuf, message: String },
    /// Target directory creation failed.
    #[error("Failed to create directory {}: {message}", .path.display())]
    CreateDirFailed { path: PathBuf, message: String },
    /// A selected file could not be deleted.
    #[error("Failed to delete file {}: {message}", .path.display())]
    DeleteFileFailed { path: PathBuf, message: String },
    /// A subdirectory tree could not be removed.
    #[error("Failed to remove directory {}: {message}", .path.display())]
    RemoveDirFailed { path: PathBuf, message: String },
    /// Option combination that selects nothing to do.
    #[error("Conflicting options: {0}")]
    ConflictingOptions(String),
    /// Copy stage of a move left files behind; the source was kept.
    #[error(
        "Move incomplete ({cnt_files_not_copied} not copied, {cnt_errors} errors); kept {}",
        .dir_source.display()
    )]
    MoveIncomplete {
        dir_source: PathBuf,
        cnt_files_not_copied: u64,
        cnt_errors: u64,
    },
    /// Cancellation token fired mid-walk.
    #[error("Operation cancelled")]
    Cancelled,
}

/// Fatal error plus the results accumulated before the abort.
#[derive(Debug)]
pub struct TreeOpFailure<T> {
    pub error: TreeOpError,
    pub partial: T,
}

impl<T> TreeOpFailure<T> {
    pub fn new(error: TreeOpError, partial: T) -> Self {
        Self { error, partial }
    }

    pub fn into_parts(self) -> (TreeOpError, T) {
        (self.error, self.partial)
    }

    pub fn map_partial<U>(self, f: impl FnOnce(T) -> U) -> TreeOpFailure<U> {
        TreeOpFailure {
            error: self.error,
            partial: f(self.partial),
        }
    }
}

impl<T> fmt::Display for TreeOpFailure<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)
    }
}

impl<T: fmt::Debug> std::error::Error for TreeOpFailure<T> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
