//! `treekit_io_fs`:
//! Directory-tree copy/move/delete/find engine.
//!
//! Module map:
//! - `copy`       : tree copy orchestration
//! - `delete`     : tree file deletion orchestration
//! - `relocate`   : tree move (copy, then source removal)
//! - `find`       : read-only tree search
//! - `prune`      : one-level subtree removal
//! - `scan`       : directory listing and tree discovery
//! - `dir_ops`    : single-directory copy/delete primitives
//! - `profile`    : directory and tree profiles
//! - `select`     : file selection predicate
//! - `collection` : ordered work queues and result lists
//! - `handle`     : directory/file handles
//! - `report`     : statistics models and aggregation
//! - `spec`       : enums/options/errors
//! - `util`       : shared helper functions

pub mod collection;
pub mod copy;
pub mod delete;
pub mod dir_ops;
pub mod find;
pub mod handle;
pub mod profile;
pub mod prune;
pub mod relocate;
pub mod report;
pub mod scan;
pub mod select;
pub mod spec;
mod util;

pub use collection::{CollectionDirs, CollectionError, CollectionFiles, CollectionWork};
pub use copy::{OutcomeTreeCopy, copy_tree};
pub use delete::{OutcomeTreeDelete, delete_tree_files};
pub use dir_ops::{
    OutcomeDirCopy, OutcomeDirDelete, copy_files_in_directory, delete_files_in_directory,
};
pub use find::{OutcomeTreeFind, find_tree_files};
pub use handle::{EnumEntryKind, HandleDir, HandleFile, MetaEntry};
pub use profile::{profile_directory, profile_tree};
pub use prune::{prune_subdirectories, remove_dir_all};
pub use relocate::{OutcomeTreeMove, move_tree};
pub use report::{
    ReportDirCopy, ReportDirDelete, ReportDirProfile, ReportTreeCopy, ReportTreeDelete,
    ReportTreeFind, ReportTreeMove,
};
pub use scan::{ListingDir, ListingTree, SpecListRequest, discover_tree, list_entries};
pub use select::SelectorFile;
pub use spec::{
    EnumFileClass, EnumSelectCriterionMode, SpecFileTypeMask, SpecItemError,
    SpecSelectionCriteria, SpecTreeCopyOptions, SpecTreeDeleteOptions, SpecTreeFindOptions,
    SpecTreeMoveOptions, TokenCancel, TreeOpError, TreeOpFailure,
};
