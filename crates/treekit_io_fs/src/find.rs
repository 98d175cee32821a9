//! Read-only search for selected files across a directory tree.

use std::path::Path;

use log::{debug, error, info, warn};

use crate::collection::{CollectionDirs, CollectionFiles};
use crate::handle::HandleDir;
use crate::report::ReportTreeFind;
use crate::scan::{SpecListRequest, discover_tree, list_entries};
use crate::select::SelectorFile;
use crate::spec::{SpecItemError, SpecTreeFindOptions, TreeOpError, TreeOpFailure};

/// Result of one `find_tree_files` run.
#[derive(Debug, Default, Clone)]
pub struct OutcomeTreeFind {
    pub report: ReportTreeFind,
    /// Directories searched, in discovery order.
    pub dirs_searched: CollectionDirs,
    /// Selected files, grouped by directory in discovery order.
    pub files_found: CollectionFiles,
}

/// Collect the selected files under `dir_root` without modifying anything.
///
/// The tree is discovered first, then each directory is listed once. A
/// directory that cannot be listed is recorded in [`ReportTreeFind::errors`]
/// and skipped. Skipping the root while not scanning subdirectories leaves
/// nothing to search and is rejected.
pub fn find_tree_files<P: AsRef<Path>>(
    dir_root: P,
    spec_find_options: SpecTreeFindOptions,
) -> Result<OutcomeTreeFind, TreeOpFailure<OutcomeTreeFind>> {
    let mut outcome = OutcomeTreeFind::default();
    macro_rules! bail {
        ($err:expr) => {{
            let err = $err;
            error!("find aborted: {err}");
            return Err(TreeOpFailure::new(err, outcome));
        }};
    }

    if !spec_find_options.if_include_root && !spec_find_options.if_scan_subdirs {
        bail!(TreeOpError::ConflictingOptions(
            "skipping the root without scanning subdirectories searches nothing".to_string()
        ));
    }
    if spec_find_options.mask_file_types.is_empty() {
        bail!(TreeOpError::InvalidFileTypeMask);
    }
    let selector = match SelectorFile::from_criteria(&spec_find_options.criteria) {
        Ok(v) => v,
        Err(e) => bail!(e),
    };
    let dir_root = match HandleDir::resolve(dir_root).and_then(|(d, _)| d.require_dir()) {
        Ok(v) => v,
        Err(e) => bail!(e),
    };

    let dirs_searched = if spec_find_options.if_scan_subdirs {
        let listing = match discover_tree(&dir_root, spec_find_options.if_include_root) {
            Ok(v) => v,
            Err(e) => bail!(e),
        };
        outcome.report.cnt_subdirs_discovered = listing.n_subdirs_total;
        outcome.report.errors.extend(listing.errors);
        listing.dirs
    } else {
        CollectionDirs::from_iter([dir_root])
    };

    let spec_request = SpecListRequest {
        if_want_subdirs: false,
        mask_file_types: spec_find_options.mask_file_types,
        ..SpecListRequest::default()
    };
    for dir_next in dirs_searched.iter() {
        if spec_find_options
            .token_cancel
            .as_ref()
            .is_some_and(|t| t.is_cancelled())
        {
            bail!(TreeOpError::Cancelled);
        }
        debug!("find in dir: {}", dir_next.path().display());

        let listing = match list_entries(dir_next, &spec_request) {
            Ok(v) => v,
            Err(e) => {
                warn!("find skipped dir: {e}");
                outcome
                    .report
                    .errors
                    .push(SpecItemError::new(dir_next.path(), e.to_string()));
                continue;
            }
        };
        outcome.report.cnt_dirs_searched += 1;
        outcome.report.errors.extend(listing.errors);
        for file in listing.files {
            outcome.report.cnt_files_examined += 1;
            if selector.matches_file(&file) {
                outcome.files_found.add(file);
            }
        }
    }
    outcome.dirs_searched = dirs_searched;
    outcome.report.cnt_files_found = outcome.files_found.len() as u64;
    outcome.report.n_bytes_found = outcome.files_found.total_bytes();

    info!("{}", outcome.report);
    Ok(outcome)
}
