//! In-place deletion of selected files across a directory tree.

use std::path::Path;

use log::{debug, error, info};

use crate::collection::{CollectionError, CollectionFiles};
use crate::dir_ops::delete_files_in_directory;
use crate::handle::HandleDir;
use crate::profile::profile_collection;
use crate::report::{ReportDirProfile, ReportTreeDelete};
use crate::scan::discover_tree;
use crate::select::SelectorFile;
use crate::spec::{SpecTreeDeleteOptions, TreeOpError, TreeOpFailure};

/// Result of one `delete_tree_files` run.
#[derive(Debug, Default, Clone)]
pub struct OutcomeTreeDelete {
    pub report: ReportTreeDelete,
    /// Deleted files; filled only with `if_return_deleted_list`.
    pub files_deleted: CollectionFiles,
    /// Profile of the walked directories after deletion.
    pub profile: ReportDirProfile,
}

/// Delete the selected files of every directory under `dir_target`.
///
/// Directories are never removed. The discovered queue is walked with an
/// index cursor and kept intact, so the same directories are profiled once
/// the walk is done. A selected file that cannot be deleted aborts the walk;
/// the failure carries the counts gathered so far and a default profile.
pub fn delete_tree_files<P: AsRef<Path>>(
    dir_target: P,
    spec_del_options: SpecTreeDeleteOptions,
) -> Result<OutcomeTreeDelete, TreeOpFailure<OutcomeTreeDelete>> {
    let mut outcome = OutcomeTreeDelete::default();
    macro_rules! bail {
        ($err:expr) => {{
            let err = $err;
            error!("delete aborted: {err}");
            return Err(TreeOpFailure::new(err, outcome));
        }};
    }

    if spec_del_options.mask_file_types.is_empty() {
        bail!(TreeOpError::InvalidFileTypeMask);
    }
    let selector = match SelectorFile::from_criteria(&spec_del_options.criteria) {
        Ok(v) => v,
        Err(e) => bail!(e),
    };
    let dir_root = match HandleDir::resolve(dir_target).and_then(|(d, _)| d.require_dir()) {
        Ok(v) => v,
        Err(e) => bail!(e),
    };

    let listing = match discover_tree(&dir_root, spec_del_options.if_include_root) {
        Ok(v) => v,
        Err(e) => bail!(e),
    };
    outcome.report.cnt_subdirs_discovered = listing.n_subdirs_total;
    outcome.report.errors.extend(listing.errors);
    let queue_dirs = listing.dirs;

    let mut idx_cursor = 0;
    loop {
        if spec_del_options
            .token_cancel
            .as_ref()
            .is_some_and(|t| t.is_cancelled())
        {
            bail!(TreeOpError::Cancelled);
        }
        let dir_next = match queue_dirs.peek_at(idx_cursor) {
            Ok(v) => v,
            Err(CollectionError::IndexOutOfBounds { .. } | CollectionError::Empty) => break,
        };
        debug!("delete in dir: {}", dir_next.path().display());

        match delete_files_in_directory(dir_next, spec_del_options.mask_file_types, &selector) {
            Ok(outcome_dir) => {
                outcome.report.add_dir(outcome_dir.report);
                if spec_del_options.if_return_deleted_list {
                    outcome.files_deleted.add_collection(outcome_dir.files_deleted);
                }
            }
            Err(failure) => {
                let (err, partial) = failure.into_parts();
                outcome.report.add_dir(partial.report);
                if spec_del_options.if_return_deleted_list {
                    outcome.files_deleted.add_collection(partial.files_deleted);
                }
                outcome.report.cnt_files_deleted_listed = outcome.files_deleted.len() as u64;
                bail!(err);
            }
        }
        idx_cursor += 1;
    }
    outcome.report.cnt_files_deleted_listed = outcome.files_deleted.len() as u64;

    outcome.profile = match profile_collection(
        &queue_dirs,
        dir_root.path(),
        spec_del_options.if_include_root,
    ) {
        Ok(v) => v,
        Err(e) => bail!(e),
    };

    info!("{}", outcome.report);
    Ok(outcome)
}
