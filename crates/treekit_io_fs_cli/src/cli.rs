//! Command-line argument models and their mapping onto library options.

use std::path::PathBuf;
use std::time::SystemTime;

use clap::{Args, Parser, Subcommand};
use treekit_io_fs::{
    EnumSelectCriterionMode, SpecFileTypeMask, SpecSelectionCriteria, SpecTreeCopyOptions,
    SpecTreeDeleteOptions, SpecTreeFindOptions, SpecTreeMoveOptions, TreeOpError,
};

pub const EXIT_SUCCESS: i32 = 0;
/// Walk finished but recorded per-file errors.
pub const EXIT_ITEM_ERRORS: i32 = 1;
/// Options or paths were rejected before any work.
pub const EXIT_INVALID_INPUT: i32 = 2;
/// Walk aborted midway.
pub const EXIT_FATAL: i32 = 3;

#[derive(Debug, Parser)]
#[command(
    name = "treekit",
    version,
    about = "Copy, move, delete, find and profile directory trees"
)]
pub struct Cli {
    /// Log at debug level (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print reports as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Copy selected files of a tree, mirroring its layout
    Copy(CopyArgs),
    /// Move a whole tree, removing the source once every file is copied
    Move(MoveArgs),
    /// Delete selected files of a tree in place (directories are kept)
    Delete(DeleteArgs),
    /// List selected files of a tree without changing anything
    Find(FindArgs),
    /// Remove every immediate subdirectory of a directory
    Prune(PruneArgs),
    /// Summarize file counts and sizes of a directory or tree
    Profile(ProfileArgs),
}

#[derive(Debug, Args)]
pub struct SelectArgs {
    /// File name glob; repeat for alternatives
    #[arg(long = "pattern", value_name = "GLOB")]
    pub patterns: Vec<String>,

    /// Regular expression searched in the file name
    #[arg(long, value_name = "REGEX")]
    pub regex: Option<String>,

    /// Select files modified before this RFC 3339 timestamp
    #[arg(long, value_name = "RFC3339", value_parser = parse_timestamp)]
    pub older_than: Option<SystemTime>,

    /// Select files modified after this RFC 3339 timestamp
    #[arg(long, value_name = "RFC3339", value_parser = parse_timestamp)]
    pub newer_than: Option<SystemTime>,

    /// Select files whose permission bits equal this octal value
    #[arg(long, value_name = "OCTAL", value_parser = parse_mode)]
    pub mode: Option<u32>,

    /// Select when any criterion matches (default: all must match)
    #[arg(long)]
    pub or: bool,
}

impl SelectArgs {
    pub fn to_criteria(&self) -> SpecSelectionCriteria {
        SpecSelectionCriteria {
            patterns_file_name: (!self.patterns.is_empty()).then(|| self.patterns.clone()),
            time_older_than: self.older_than,
            time_newer_than: self.newer_than,
            pattern_regex: self.regex.clone(),
            mode_match: self.mode,
            rule_combine: if self.or {
                EnumSelectCriterionMode::Or
            } else {
                EnumSelectCriterionMode::And
            },
        }
    }
}

#[derive(Debug, Args)]
pub struct MaskArgs {
    /// Skip regular files
    #[arg(long)]
    pub no_regular: bool,

    /// Skip symbolic links
    #[arg(long)]
    pub no_symlinks: bool,

    /// Skip devices, pipes and sockets
    #[arg(long)]
    pub no_other: bool,
}

impl MaskArgs {
    pub fn to_mask(&self) -> SpecFileTypeMask {
        SpecFileTypeMask {
            if_regular: !self.no_regular,
            if_symlink: !self.no_symlinks,
            if_other_non_regular: !self.no_other,
        }
    }
}

#[derive(Debug, Args)]
pub struct RootArgs {
    /// Process the root directory's own files (default)
    #[arg(long, overrides_with = "skip_root")]
    pub include_root: bool,

    /// Process only the root's subdirectories
    #[arg(long, overrides_with = "include_root")]
    pub skip_root: bool,
}

impl RootArgs {
    pub fn if_include_root(&self) -> bool {
        self.include_root || !self.skip_root
    }
}

#[derive(Debug, Args)]
pub struct CopyArgs {
    /// Source tree root
    pub source: PathBuf,

    /// Destination tree root (created on demand)
    pub destination: PathBuf,

    #[command(flatten)]
    pub select: SelectArgs,

    #[command(flatten)]
    pub mask: MaskArgs,

    #[command(flatten)]
    pub root: RootArgs,

    /// Create destination directories even when nothing is copied into them
    #[arg(long)]
    pub empty_dirs: bool,

    /// Print every copied file
    #[arg(long)]
    pub list: bool,
}

impl CopyArgs {
    pub fn to_options(&self) -> SpecTreeCopyOptions {
        SpecTreeCopyOptions {
            if_include_root: self.root.if_include_root(),
            if_create_empty_dirs: self.empty_dirs,
            mask_file_types: self.mask.to_mask(),
            criteria: self.select.to_criteria(),
            if_return_copied_list: self.list,
            token_cancel: None,
        }
    }
}

#[derive(Debug, Args)]
pub struct DeleteArgs {
    /// Tree root to delete files from
    pub target: PathBuf,

    #[command(flatten)]
    pub select: SelectArgs,

    #[command(flatten)]
    pub mask: MaskArgs,

    #[command(flatten)]
    pub root: RootArgs,

    /// Print every deleted file
    #[arg(long)]
    pub list: bool,
}

impl DeleteArgs {
    pub fn to_options(&self) -> SpecTreeDeleteOptions {
        SpecTreeDeleteOptions {
            if_include_root: self.root.if_include_root(),
            mask_file_types: self.mask.to_mask(),
            criteria: self.select.to_criteria(),
            if_return_deleted_list: self.list,
            token_cancel: None,
        }
    }
}

#[derive(Debug, Args)]
pub struct MoveArgs {
    /// Source tree root
    pub source: PathBuf,

    /// Destination tree root (created on demand)
    pub destination: PathBuf,

    #[command(flatten)]
    pub root: RootArgs,
}

impl MoveArgs {
    pub fn to_options(&self) -> SpecTreeMoveOptions {
        SpecTreeMoveOptions {
            if_include_root: self.root.if_include_root(),
            token_cancel: None,
        }
    }
}

#[derive(Debug, Args)]
pub struct FindArgs {
    /// Tree root to search
    pub dir: PathBuf,

    #[command(flatten)]
    pub select: SelectArgs,

    #[command(flatten)]
    pub mask: MaskArgs,

    #[command(flatten)]
    pub root: RootArgs,

    /// Search only the directory itself, not its subtree
    #[arg(long)]
    pub flat: bool,
}

impl FindArgs {
    pub fn to_options(&self) -> SpecTreeFindOptions {
        SpecTreeFindOptions {
            if_include_root: self.root.if_include_root(),
            if_scan_subdirs: !self.flat,
            mask_file_types: self.mask.to_mask(),
            criteria: self.select.to_criteria(),
            token_cancel: None,
        }
    }
}

#[derive(Debug, Args)]
pub struct PruneArgs {
    /// Directory whose subdirectories are removed
    pub parent: PathBuf,

    /// Print every removed directory
    #[arg(long)]
    pub list: bool,
}

#[derive(Debug, Args)]
pub struct ProfileArgs {
    /// Directory or tree root
    pub dir: PathBuf,

    /// Profile only the directory itself, not its subtree
    #[arg(long)]
    pub flat: bool,

    #[command(flatten)]
    pub root: RootArgs,
}

fn parse_timestamp(value: &str) -> Result<SystemTime, String> {
    chrono::DateTime::parse_from_rfc3339(value)
        .map(SystemTime::from)
        .map_err(|e| {
            format!(
                "Invalid timestamp: `{value}` ({e}). Expected RFC 3339, e.g. 2024-01-31T12:00:00Z"
            )
        })
}

fn parse_mode(value: &str) -> Result<u32, String> {
    let digits = value.trim_start_matches("0o");
    match u32::from_str_radix(digits, 8) {
        Ok(mode) if mode <= 0o7777 => Ok(mode),
        _ => Err(format!(
            "Invalid mode: `{value}`. Expected octal permission bits, e.g. 644 or 0o755"
        )),
    }
}

/// Exit code for a fatal library error.
pub fn exit_code_for(error: &TreeOpError) -> i32 {
    match error {
        TreeOpError::InvalidFileTypeMask
        | TreeOpError::ConflictingOptions(_)
        | TreeOpError::InvalidPattern(_)
        | TreeOpError::InvalidPath { .. }
        | TreeOpError::RootNotFound(_)
        | TreeOpError::RootNotDirectory(_)
        | TreeOpError::SourceDestinationOverlap { .. }
        | TreeOpError::DestinationInitFailed { .. } => EXIT_INVALID_INPUT,
        TreeOpError::TargetPathConstruction { .. }
        | TreeOpError::ReadDirFailed { .. }
        | TreeOpError::CreateDirFailed { .. }
        | TreeOpError::DeleteFileFailed { .. }
        | TreeOpError::RemoveDirFailed { .. }
        | TreeOpError::MoveIncomplete { .. }
        | TreeOpError::Cancelled => EXIT_FATAL,
    }
}
