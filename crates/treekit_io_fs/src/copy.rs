//! Directory-tree copy orchestration (discover, then drain FIFO).

use std::fs;
use std::path::Path;

use log::{debug, error, info};

use crate::collection::CollectionFiles;
use crate::dir_ops::copy_files_in_directory;
use crate::handle::HandleDir;
use crate::report::ReportTreeCopy;
use crate::scan::discover_tree;
use crate::select::SelectorFile;
use crate::spec::{SpecItemError, SpecTreeCopyOptions, TreeOpError, TreeOpFailure};
use crate::util::{derive_mirror_path, is_overlap};

/// Result of one `copy_tree` run.
#[derive(Debug, Default, Clone)]
pub struct OutcomeTreeCopy {
    pub report: ReportTreeCopy,
    /// Copied target files; filled only with `if_return_copied_list`.
    pub files_copied: CollectionFiles,
}

/// Copy the files of a directory tree from `dir_source` to `dir_destination`.
///
/// This function performs:
/// 1. Option validation (mask, criteria) before any filesystem access.
/// 2. Root validation: source must be a directory, roots must not overlap,
///    destination root must not be a symbolic link.
/// 3. Full tree discovery of the source.
/// 4. FIFO drain: each source directory is mirrored onto the destination by
///    path-prefix substitution and its files copied by
///    [`copy_files_in_directory`].
///
/// Per-file failures are recorded in [`ReportTreeCopy::errors`] and the walk
/// continues. Any other failure aborts with [`TreeOpFailure`], whose
/// `partial` holds everything copied so far. Nothing is rolled back.
pub fn copy_tree<P, Q>(
    dir_source: P,
    dir_destination: Q,
    spec_cp_options: SpecTreeCopyOptions,
) -> Result<OutcomeTreeCopy, TreeOpFailure<OutcomeTreeCopy>>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let mut outcome = OutcomeTreeCopy::default();
    macro_rules! bail {
        ($err:expr) => {{
            let err = $err;
            error!("copy aborted: {err}");
            return Err(TreeOpFailure::new(err, outcome));
        }};
    }

    if spec_cp_options.mask_file_types.is_empty() {
        bail!(TreeOpError::InvalidFileTypeMask);
    }
    let selector = match SelectorFile::from_criteria(&spec_cp_options.criteria) {
        Ok(v) => v,
        Err(e) => bail!(e),
    };

    let dir_src = match HandleDir::resolve(dir_source).and_then(|(d, _)| d.require_dir()) {
        Ok(v) => v,
        Err(e) => bail!(e),
    };
    let dir_dst = match HandleDir::resolve(dir_destination) {
        Ok((v, _)) => v,
        Err(e) => bail!(e),
    };
    if is_overlap(dir_src.path(), dir_dst.path()) {
        bail!(TreeOpError::SourceDestinationOverlap {
            dir_source: dir_src.path().to_path_buf(),
            dir_destination: dir_dst.path().to_path_buf(),
        });
    }
    if let Ok(meta_dir_dst) = fs::symlink_metadata(dir_dst.path()) {
        if meta_dir_dst.file_type().is_symlink() {
            bail!(TreeOpError::DestinationInitFailed {
                path: dir_dst.path().to_path_buf(),
                message: "Destination root path must not be a symbolic link.".to_string(),
            });
        }
        if !meta_dir_dst.is_dir() {
            bail!(TreeOpError::DestinationInitFailed {
                path: dir_dst.path().to_path_buf(),
                message: "Destination root exists and is not a directory.".to_string(),
            });
        }
    }

    let listing = match discover_tree(&dir_src, spec_cp_options.if_include_root) {
        Ok(v) => v,
        Err(e) => bail!(e),
    };
    outcome.report.cnt_subdirs_discovered = listing.n_subdirs_total;
    outcome.report.errors.extend(listing.errors);
    let mut queue_dirs = listing.dirs;

    loop {
        if spec_cp_options
            .token_cancel
            .as_ref()
            .is_some_and(|t| t.is_cancelled())
        {
            bail!(TreeOpError::Cancelled);
        }
        // `Empty` is the only pop-front failure and ends the drain.
        let Ok(dir_src_next) = queue_dirs.pop_first() else {
            break;
        };

        let path_dir_dst_next =
            match derive_mirror_path(dir_src_next.path(), dir_src.path(), dir_dst.path()) {
                Ok(v) => v,
                Err(message) => bail!(TreeOpError::TargetPathConstruction {
                    source_dir: dir_src_next.path().to_path_buf(),
                    message,
                }),
            };
        let dir_dst_next = match HandleDir::resolve(&path_dir_dst_next) {
            Ok((v, _)) => v,
            Err(e) => bail!(TreeOpError::TargetPathConstruction {
                source_dir: dir_src_next.path().to_path_buf(),
                message: e.to_string(),
            }),
        };
        debug!(
            "copy dir: {} -> {}",
            dir_src_next.path().display(),
            dir_dst_next.path().display()
        );

        let outcome_dir = match copy_files_in_directory(
            &dir_src_next,
            &dir_dst_next,
            spec_cp_options.mask_file_types,
            &selector,
            spec_cp_options.if_create_empty_dirs,
        ) {
            Ok(v) => v,
            Err(failure) => {
                let (err, partial) = failure.into_parts();
                outcome.report.add_dir(partial.report);
                if spec_cp_options.if_return_copied_list {
                    outcome.files_copied.add_collection(partial.files_copied);
                }
                bail!(err);
            }
        };
        outcome.report.add_dir(outcome_dir.report);
        if spec_cp_options.if_return_copied_list {
            outcome.files_copied.add_collection(outcome_dir.files_copied);
        }
    }
    outcome.report.cnt_files_copied_listed = outcome.files_copied.len() as u64;

    if let Err(message) = outcome.report.check_file_counts() {
        outcome
            .report
            .errors
            .push(SpecItemError::new(dir_src.path(), message));
    }
    if outcome.report.cnt_files_copied > 0 && !dir_dst.path().is_dir() {
        outcome.report.errors.push(SpecItemError::new(
            dir_dst.path(),
            "Files were copied but the destination root does not exist",
        ));
    }

    info!("{}", outcome.report);
    Ok(outcome)
}
