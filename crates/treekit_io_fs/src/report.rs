//! Tree/directory statistics models and commutative aggregation.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use crate::spec::{EnumFileClass, SpecItemError};

////////////////////////////////////////////////////////////////////////////////
// #region ReportCopy

/// Counters and diagnostics for one directory processed by the copier.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ReportDirCopy {
    /// Target directory was created by this pass (0/1).
    pub cnt_dirs_created: u64,
    /// Target directory received files or was materialized empty (0/1).
    pub cnt_dirs_copied: u64,
    pub cnt_files_processed: u64,
    pub cnt_files_copied: u64,
    pub n_bytes_copied: u64,
    /// Files rejected by mask/criteria or that failed to copy.
    pub cnt_files_not_copied: u64,
    pub n_bytes_not_copied: u64,
    /// Per-file failures.
    pub errors: Vec<SpecItemError>,
}

impl ReportDirCopy {
    pub(crate) fn add_copied(&mut self, n_bytes: u64) {
        self.cnt_files_copied += 1;
        self.n_bytes_copied += n_bytes;
    }

    pub(crate) fn add_not_copied(&mut self, n_bytes: u64) {
        self.cnt_files_not_copied += 1;
        self.n_bytes_not_copied += n_bytes;
    }
}

/// Aggregate counters and diagnostics for one `copy_tree` run.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ReportTreeCopy {
    /// Directories drained from the work queue.
    pub cnt_dirs_scanned: u64,
    pub cnt_dirs_copied: u64,
    pub cnt_dirs_created: u64,
    pub cnt_files_processed: u64,
    pub cnt_files_copied: u64,
    pub n_bytes_copied: u64,
    pub cnt_files_not_copied: u64,
    pub n_bytes_not_copied: u64,
    /// Subdirectories found by discovery (root excluded).
    pub cnt_subdirs_discovered: u64,
    /// Length of the returned copied-file list.
    pub cnt_files_copied_listed: u64,
    /// Non-fatal failures in walk order.
    pub errors: Vec<SpecItemError>,
}

impl ReportTreeCopy {
    /// Field-wise sum of two partial results; errors keep `self` first.
    pub fn merge(mut self, partial: ReportTreeCopy) -> Self {
        self.cnt_dirs_scanned += partial.cnt_dirs_scanned;
        self.cnt_dirs_copied += partial.cnt_dirs_copied;
        self.cnt_dirs_created += partial.cnt_dirs_created;
        self.cnt_files_processed += partial.cnt_files_processed;
        self.cnt_files_copied += partial.cnt_files_copied;
        self.n_bytes_copied += partial.n_bytes_copied;
        self.cnt_files_not_copied += partial.cnt_files_not_copied;
        self.n_bytes_not_copied += partial.n_bytes_not_copied;
        self.cnt_subdirs_discovered += partial.cnt_subdirs_discovered;
        self.cnt_files_copied_listed += partial.cnt_files_copied_listed;
        self.errors.extend(partial.errors);
        self
    }

    /// Fold one directory pass into the running totals.
    pub fn add_dir(&mut self, report_dir: ReportDirCopy) {
        let report_total = std::mem::take(self);
        *self = report_total.merge(ReportTreeCopy::from(report_dir));
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Processed files must split exactly into copied + not copied.
    pub fn check_file_counts(&self) -> Result<(), String> {
        let cnt_accounted = self.cnt_files_copied + self.cnt_files_not_copied;
        if cnt_accounted != self.cnt_files_processed {
            return Err(format!(
                "File counts are inconsistent: processed={} copied={} not_copied={}",
                self.cnt_files_processed, self.cnt_files_copied, self.cnt_files_not_copied
            ));
        }
        Ok(())
    }

    /// Machine-readable counters.
    pub fn to_dict(&self) -> BTreeMap<String, u64> {
        let mut dict_counts = BTreeMap::new();
        dict_counts.insert("cnt_dirs_scanned".to_string(), self.cnt_dirs_scanned);
        dict_counts.insert("cnt_dirs_copied".to_string(), self.cnt_dirs_copied);
        dict_counts.insert("cnt_dirs_created".to_string(), self.cnt_dirs_created);
        dict_counts.insert("cnt_files_processed".to_string(), self.cnt_files_processed);
        dict_counts.insert("cnt_files_copied".to_string(), self.cnt_files_copied);
        dict_counts.insert("n_bytes_copied".to_string(), self.n_bytes_copied);
        dict_counts.insert("cnt_files_not_copied".to_string(), self.cnt_files_not_copied);
        dict_counts.insert("n_bytes_not_copied".to_string(), self.n_bytes_not_copied);
        dict_counts.insert(
            "cnt_subdirs_discovered".to_string(),
            self.cnt_subdirs_discovered,
        );
        dict_counts.insert(
            "cnt_files_copied_listed".to_string(),
            self.cnt_files_copied_listed,
        );
        dict_counts.insert("cnt_errors".to_string(), self.error_count() as u64);
        dict_counts
    }

    /// Human-readable one-line summary.
    pub fn format(&self, prefix: &str) -> String {
        format!(
            concat!(
                "{prefix} dirs={} created={} processed={} copied={} bytes={} ",
                "not_copied={} bytes_not_copied={} errors={}"
            ),
            self.cnt_dirs_scanned,
            self.cnt_dirs_created,
            self.cnt_files_processed,
            self.cnt_files_copied,
            self.n_bytes_copied,
            self.cnt_files_not_copied,
            self.n_bytes_not_copied,
            self.error_count(),
            prefix = prefix
        )
    }
}

impl From<ReportDirCopy> for ReportTreeCopy {
    fn from(report_dir: ReportDirCopy) -> Self {
        Self {
            cnt_dirs_scanned: 1,
            cnt_dirs_copied: report_dir.cnt_dirs_copied,
            cnt_dirs_created: report_dir.cnt_dirs_created,
            cnt_files_processed: report_dir.cnt_files_processed,
            cnt_files_copied: report_dir.cnt_files_copied,
            n_bytes_copied: report_dir.n_bytes_copied,
            cnt_files_not_copied: report_dir.cnt_files_not_copied,
            n_bytes_not_copied: report_dir.n_bytes_not_copied,
            cnt_subdirs_discovered: 0,
            cnt_files_copied_listed: 0,
            errors: report_dir.errors,
        }
    }
}

impl fmt::Display for ReportTreeCopy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format("[COPY]"))
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ReportDelete

/// Counters for one directory processed by the deleter.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ReportDirDelete {
    pub cnt_dirs_processed: u64,
    /// Directory lost at least one file (0/1).
    pub cnt_dirs_with_deletions: u64,
    pub cnt_files_processed: u64,
    pub cnt_files_deleted: u64,
    pub n_bytes_deleted: u64,
    /// Files seen but not selected.
    pub cnt_files_remaining: u64,
    pub n_bytes_remaining: u64,
    pub errors: Vec<SpecItemError>,
}

/// Aggregate counters for one `delete_tree_files` run.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ReportTreeDelete {
    pub cnt_dirs_processed: u64,
    pub cnt_dirs_with_deletions: u64,
    pub cnt_files_processed: u64,
    pub cnt_files_deleted: u64,
    pub n_bytes_deleted: u64,
    pub cnt_files_remaining: u64,
    pub n_bytes_remaining: u64,
    pub cnt_subdirs_discovered: u64,
    pub cnt_files_deleted_listed: u64,
    pub errors: Vec<SpecItemError>,
}

impl ReportTreeDelete {
    /// Field-wise sum of two partial results; errors keep `self` first.
    pub fn merge(mut self, partial: ReportTreeDelete) -> Self {
        self.cnt_dirs_processed += partial.cnt_dirs_processed;
        self.cnt_dirs_with_deletions += partial.cnt_dirs_with_deletions;
        self.cnt_files_processed += partial.cnt_files_processed;
        self.cnt_files_deleted += partial.cnt_files_deleted;
        self.n_bytes_deleted += partial.n_bytes_deleted;
        self.cnt_files_remaining += partial.cnt_files_remaining;
        self.n_bytes_remaining += partial.n_bytes_remaining;
        self.cnt_subdirs_discovered += partial.cnt_subdirs_discovered;
        self.cnt_files_deleted_listed += partial.cnt_files_deleted_listed;
        self.errors.extend(partial.errors);
        self
    }

    pub fn add_dir(&mut self, report_dir: ReportDirDelete) {
        let report_total = std::mem::take(self);
        *self = report_total.merge(ReportTreeDelete::from(report_dir));
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Machine-readable counters.
    pub fn to_dict(&self) -> BTreeMap<String, u64> {
        let mut dict_counts = BTreeMap::new();
        dict_counts.insert("cnt_dirs_processed".to_string(), self.cnt_dirs_processed);
        dict_counts.insert(
            "cnt_dirs_with_deletions".to_string(),
            self.cnt_dirs_with_deletions,
        );
        dict_counts.insert("cnt_files_processed".to_string(), self.cnt_files_processed);
        dict_counts.insert("cnt_files_deleted".to_string(), self.cnt_files_deleted);
        dict_counts.insert("n_bytes_deleted".to_string(), self.n_bytes_deleted);
        dict_counts.insert("cnt_files_remaining".to_string(), self.cnt_files_remaining);
        dict_counts.insert("n_bytes_remaining".to_string(), self.n_bytes_remaining);
        dict_counts.insert(
            "cnt_subdirs_discovered".to_string(),
            self.cnt_subdirs_discovered,
        );
        dict_counts.insert(
            "cnt_files_deleted_listed".to_string(),
            self.cnt_files_deleted_listed,
        );
        dict_counts.insert("cnt_errors".to_string(), self.error_count() as u64);
        dict_counts
    }

    /// Human-readable one-line summary.
    pub fn format(&self, prefix: &str) -> String {
        format!(
            concat!(
                "{prefix} dirs={} processed={} deleted={} bytes={} ",
                "remaining={} bytes_remaining={} errors={}"
            ),
            self.cnt_dirs_processed,
            self.cnt_files_processed,
            self.cnt_files_deleted,
            self.n_bytes_deleted,
            self.cnt_files_remaining,
            self.n_bytes_remaining,
            self.error_count(),
            prefix = prefix
        )
    }
}

impl From<ReportDirDelete> for ReportTreeDelete {
    fn from(report_dir: ReportDirDelete) -> Self {
        Self {
            cnt_dirs_processed: report_dir.cnt_dirs_processed,
            cnt_dirs_with_deletions: report_dir.cnt_dirs_with_deletions,
            cnt_files_processed: report_dir.cnt_files_processed,
            cnt_files_deleted: report_dir.cnt_files_deleted,
            n_bytes_deleted: report_dir.n_bytes_deleted,
            cnt_files_remaining: report_dir.cnt_files_remaining,
            n_bytes_remaining: report_dir.n_bytes_remaining,
            cnt_subdirs_discovered: 0,
            cnt_files_deleted_listed: 0,
            errors: report_dir.errors,
        }
    }
}

impl fmt::Display for ReportTreeDelete {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format("[DELETE]"))
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ReportFind

/// Counters for one read-only `find_tree_files` run.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ReportTreeFind {
    /// Directories whose files were examined.
    pub cnt_dirs_searched: u64,
    /// Files admitted by the mask and tested against the criteria.
    pub cnt_files_examined: u64,
    pub cnt_files_found: u64,
    pub n_bytes_found: u64,
    pub cnt_subdirs_discovered: u64,
    /// Unreadable directories and entries; the search skips them.
    pub errors: Vec<SpecItemError>,
}

impl ReportTreeFind {
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Machine-readable counters.
    pub fn to_dict(&self) -> BTreeMap<String, u64> {
        let mut dict_counts = BTreeMap::new();
        dict_counts.insert("cnt_dirs_searched".to_string(), self.cnt_dirs_searched);
        dict_counts.insert("cnt_files_examined".to_string(), self.cnt_files_examined);
        dict_counts.insert("cnt_files_found".to_string(), self.cnt_files_found);
        dict_counts.insert("n_bytes_found".to_string(), self.n_bytes_found);
        dict_counts.insert(
            "cnt_subdirs_discovered".to_string(),
            self.cnt_subdirs_discovered,
        );
        dict_counts.insert("cnt_errors".to_string(), self.error_count() as u64);
        dict_counts
    }

    /// Human-readable one-line summary.
    pub fn format(&self, prefix: &str) -> String {
        format!(
            "{prefix} dirs={} examined={} found={} bytes={} errors={}",
            self.cnt_dirs_searched,
            self.cnt_files_examined,
            self.cnt_files_found,
            self.n_bytes_found,
            self.error_count()
        )
    }
}

impl fmt::Display for ReportTreeFind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format("[FIND]"))
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ReportMove

/// Counters for one `move_tree` run (copy stage plus source removal).
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ReportTreeMove {
    pub cnt_dirs_processed: u64,
    pub cnt_dirs_created: u64,
    pub cnt_subdirs: u64,
    pub cnt_files_processed: u64,
    /// Set only once the source side has been removed.
    pub cnt_files_moved: u64,
    pub n_bytes_moved: u64,
    /// Source files the copy stage did not reproduce.
    pub cnt_files_remaining: u64,
    pub n_bytes_remaining: u64,
    pub if_source_removed: bool,
    /// Non-fatal failures of the copy stage.
    pub errors: Vec<SpecItemError>,
}

impl ReportTreeMove {
    /// Copy-stage counters; nothing counts as moved yet.
    pub(crate) fn from_copy(report_copy: &ReportTreeCopy) -> Self {
        Self {
            cnt_dirs_processed: report_copy.cnt_dirs_scanned,
            cnt_dirs_created: report_copy.cnt_dirs_created,
            cnt_subdirs: report_copy.cnt_subdirs_discovered,
            cnt_files_processed: report_copy.cnt_files_processed,
            cnt_files_moved: 0,
            n_bytes_moved: 0,
            cnt_files_remaining: report_copy.cnt_files_not_copied,
            n_bytes_remaining: report_copy.n_bytes_not_copied,
            if_source_removed: false,
            errors: report_copy.errors.clone(),
        }
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Machine-readable counters; `if_source_removed` maps to 0/1.
    pub fn to_dict(&self) -> BTreeMap<String, u64> {
        let mut dict_counts = BTreeMap::new();
        for (key, value) in [
            ("cnt_dirs_processed", self.cnt_dirs_processed),
            ("cnt_dirs_created", self.cnt_dirs_created),
            ("cnt_subdirs", self.cnt_subdirs),
            ("cnt_files_processed", self.cnt_files_processed),
            ("cnt_files_moved", self.cnt_files_moved),
            ("n_bytes_moved", self.n_bytes_moved),
            ("cnt_files_remaining", self.cnt_files_remaining),
            ("n_bytes_remaining", self.n_bytes_remaining),
            ("if_source_removed", u64::from(self.if_source_removed)),
            ("cnt_errors", self.error_count() as u64),
        ] {
            dict_counts.insert(key.to_string(), value);
        }
        dict_counts
    }

    /// Human-readable one-line summary.
    pub fn format(&self, prefix: &str) -> String {
        format!(
            concat!(
                "{prefix} dirs={} created={} moved={} bytes={} ",
                "remaining={} source_removed={} errors={}"
            ),
            self.cnt_dirs_processed,
            self.cnt_dirs_created,
            self.cnt_files_moved,
            self.n_bytes_moved,
            self.cnt_files_remaining,
            self.if_source_removed,
            self.error_count(),
            prefix = prefix
        )
    }
}

impl fmt::Display for ReportTreeMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format("[MOVE]"))
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ReportProfile

/// Point-in-time file/byte summary of one directory or a whole tree.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ReportDirProfile {
    /// Directory (or tree root) the profile describes.
    pub path_dir: PathBuf,
    pub if_dir_exists: bool,
    /// Root/parent directory's own entries are part of the counts.
    pub if_root_included: bool,
    pub cnt_dirs_profiled: u64,
    pub cnt_subdirs: u64,
    /// Sum of directory entry sizes as reported by `lstat`.
    pub n_bytes_subdirs: u64,
    pub cnt_files_total: u64,
    pub n_bytes_files_total: u64,
    pub cnt_files_regular: u64,
    pub n_bytes_files_regular: u64,
    pub cnt_files_symlink: u64,
    pub n_bytes_files_symlink: u64,
    pub cnt_files_other: u64,
    pub n_bytes_files_other: u64,
}

impl ReportDirProfile {
    pub(crate) fn add_file(&mut self, class_file: EnumFileClass, n_bytes: u64) {
        self.cnt_files_total += 1;
        self.n_bytes_files_total += n_bytes;
        match class_file {
            EnumFileClass::Regular => {
                self.cnt_files_regular += 1;
                self.n_bytes_files_regular += n_bytes;
            }
            EnumFileClass::Symlink => {
                self.cnt_files_symlink += 1;
                self.n_bytes_files_symlink += n_bytes;
            }
            EnumFileClass::OtherNonRegular => {
                self.cnt_files_other += 1;
                self.n_bytes_files_other += n_bytes;
            }
        }
    }

    pub(crate) fn add_subdir(&mut self, n_bytes: u64) {
        self.cnt_subdirs += 1;
        self.n_bytes_subdirs += n_bytes;
    }

    /// Add counters of `partial`; identity fields of `self` are kept.
    pub fn merge(mut self, partial: &ReportDirProfile) -> Self {
        self.cnt_dirs_profiled += partial.cnt_dirs_profiled;
        self.cnt_subdirs += partial.cnt_subdirs;
        self.n_bytes_subdirs += partial.n_bytes_subdirs;
        self.cnt_files_total += partial.cnt_files_total;
        self.n_bytes_files_total += partial.n_bytes_files_total;
        self.cnt_files_regular += partial.cnt_files_regular;
        self.n_bytes_files_regular += partial.n_bytes_files_regular;
        self.cnt_files_symlink += partial.cnt_files_symlink;
        self.n_bytes_files_symlink += partial.n_bytes_files_symlink;
        self.cnt_files_other += partial.cnt_files_other;
        self.n_bytes_files_other += partial.n_bytes_files_other;
        self
    }

    /// Machine-readable counters.
    pub fn to_dict(&self) -> BTreeMap<String, u64> {
        let mut dict_counts = BTreeMap::new();
        for (key, value) in [
            ("cnt_dirs_profiled", self.cnt_dirs_profiled),
            ("cnt_subdirs", self.cnt_subdirs),
            ("n_bytes_subdirs", self.n_bytes_subdirs),
            ("cnt_files_total", self.cnt_files_total),
            ("n_bytes_files_total", self.n_bytes_files_total),
            ("cnt_files_regular", self.cnt_files_regular),
            ("n_bytes_files_regular", self.n_bytes_files_regular),
            ("cnt_files_symlink", self.cnt_files_symlink),
            ("n_bytes_files_symlink", self.n_bytes_files_symlink),
            ("cnt_files_other", self.cnt_files_other),
            ("n_bytes_files_other", self.n_bytes_files_other),
        ] {
            dict_counts.insert(key.to_string(), value);
        }
        dict_counts
    }

    /// Human-readable one-line summary.
    pub fn format(&self, prefix: &str) -> String {
        format!(
            "{prefix} dirs={} subdirs={} files={} bytes={} regular={} symlink={} other={}",
            self.cnt_dirs_profiled,
            self.cnt_subdirs,
            self.cnt_files_total,
            self.n_bytes_files_total,
            self.cnt_files_regular,
            self.cnt_files_symlink,
            self.cnt_files_other
        )
    }
}

impl fmt::Display for ReportDirProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format("[PROFILE]"))
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
