//! Single-directory copy/delete primitives used by the tree engines.

use std::fs;
use std::path::Path;

use log::warn;

use crate::collection::CollectionFiles;
use crate::handle::{HandleDir, HandleFile, MetaEntry};
use crate::report::{ReportDirCopy, ReportDirDelete};
use crate::scan::{SpecListRequest, list_entries};
use crate::select::SelectorFile;
use crate::spec::{EnumFileClass, SpecFileTypeMask, SpecItemError, TreeOpError, TreeOpFailure};
use crate::util::{
    copy_file_with_metadata, copy_symbolic_link, ensure_dir, validate_destination_file,
};

/// Result of copying the files of one directory.
#[derive(Debug, Default, Clone)]
pub struct OutcomeDirCopy {
    pub report: ReportDirCopy,
    /// Handles of the target files written by this pass.
    pub files_copied: CollectionFiles,
}

/// Result of deleting files in one directory.
#[derive(Debug, Default, Clone)]
pub struct OutcomeDirDelete {
    pub report: ReportDirDelete,
    /// Handles of removed files, marked as no longer existing.
    pub files_deleted: CollectionFiles,
}

/// Copy the qualifying files of `dir_src` (no recursion) into `dir_dst`.
///
/// The target directory is created on the first qualifying file, or up
/// front when `if_create_empty_target` is set. Mask and criteria rejects
/// count as not copied. A file that fails to copy is recorded and counted
/// as not copied; unreadable source or uncreatable target is fatal.
pub fn copy_files_in_directory(
    dir_src: &HandleDir,
    dir_dst: &HandleDir,
    mask_file_types: SpecFileTypeMask,
    selector: &SelectorFile,
    if_create_empty_target: bool,
) -> Result<OutcomeDirCopy, TreeOpFailure<OutcomeDirCopy>> {
    let mut outcome = OutcomeDirCopy::default();
    let mut if_dst_ready = dir_dst.path().is_dir();

    if if_create_empty_target && !if_dst_ready {
        match _make_target_dir(dir_dst.path()) {
            Ok(b_created) => outcome.report.cnt_dirs_created += u64::from(b_created),
            Err(e) => return Err(TreeOpFailure::new(e, outcome)),
        }
        if_dst_ready = true;
    }

    let listing = match list_entries(dir_src, &_request_all_files()) {
        Ok(v) => v,
        Err(e) => return Err(TreeOpFailure::new(e, outcome)),
    };
    outcome.report.errors.extend(listing.errors);

    for file_src in listing.files {
        outcome.report.cnt_files_processed += 1;
        let n_bytes = file_src.size();
        if !mask_file_types.allows(file_src.class_file()) || !selector.matches_file(&file_src) {
            outcome.report.add_not_copied(n_bytes);
            continue;
        }

        if !if_dst_ready {
            match _make_target_dir(dir_dst.path()) {
                Ok(b_created) => outcome.report.cnt_dirs_created += u64::from(b_created),
                Err(e) => return Err(TreeOpFailure::new(e, outcome)),
            }
            if_dst_ready = true;
        }

        let path_file_dst = dir_dst.path().join(file_src.name());
        match _copy_entry(&file_src, &path_file_dst) {
            Ok(()) => {
                outcome.report.add_copied(n_bytes);
                let meta_dst = MetaEntry::from_path(&path_file_dst).unwrap_or(*file_src.meta());
                outcome
                    .files_copied
                    .add(HandleFile::from_entry(dir_dst, file_src.name(), meta_dst));
            }
            Err(message) => {
                warn!("copy failed: {}: {message}", file_src.path().display());
                outcome.report.add_not_copied(n_bytes);
                outcome
                    .report
                    .errors
                    .push(SpecItemError::new(file_src.path(), message));
            }
        }
    }

    if outcome.report.cnt_files_copied > 0 || if_create_empty_target {
        outcome.report.cnt_dirs_copied = 1;
    }
    Ok(outcome)
}

/// Delete the qualifying files of `dir` in place (no recursion).
///
/// Files outside `mask_file_types` are not processed. Files rejected by
/// `selector` count as remaining. The first file that fails to delete
/// aborts with the counts gathered so far.
pub fn delete_files_in_directory(
    dir: &HandleDir,
    mask_file_types: SpecFileTypeMask,
    selector: &SelectorFile,
) -> Result<OutcomeDirDelete, TreeOpFailure<OutcomeDirDelete>> {
    let mut outcome = OutcomeDirDelete::default();
    let spec_request = SpecListRequest {
        if_want_subdirs: false,
        mask_file_types,
        ..SpecListRequest::default()
    };
    let listing = match list_entries(dir, &spec_request) {
        Ok(v) => v,
        Err(e) => return Err(TreeOpFailure::new(e, outcome)),
    };
    outcome.report.cnt_dirs_processed = 1;
    outcome.report.errors.extend(listing.errors);

    for file in listing.files {
        outcome.report.cnt_files_processed += 1;
        let n_bytes = file.size();
        if !selector.matches_file(&file) {
            outcome.report.cnt_files_remaining += 1;
            outcome.report.n_bytes_remaining += n_bytes;
            continue;
        }

        if let Err(e) = fs::remove_file(file.path()) {
            let error = TreeOpError::DeleteFileFailed {
                path: file.path().to_path_buf(),
                message: e.to_string(),
            };
            return Err(TreeOpFailure::new(error, outcome));
        }
        outcome.report.cnt_files_deleted += 1;
        outcome.report.n_bytes_deleted += n_bytes;
        outcome.report.cnt_dirs_with_deletions = 1;
        outcome.files_deleted.add(file.with_exists(false));
    }
    Ok(outcome)
}

fn _request_all_files() -> SpecListRequest<'static> {
    SpecListRequest {
        if_want_subdirs: false,
        mask_file_types: SpecFileTypeMask::all(),
        ..SpecListRequest::default()
    }
}

fn _make_target_dir(path_dir: &Path) -> Result<bool, TreeOpError> {
    ensure_dir(path_dir).map_err(|e| TreeOpError::CreateDirFailed {
        path: path_dir.to_path_buf(),
        message: e.to_string(),
    })
}

fn _copy_entry(file_src: &HandleFile, path_file_dst: &Path) -> Result<(), String> {
    match file_src.class_file() {
        EnumFileClass::Regular => {
            validate_destination_file(path_file_dst)?;
            copy_file_with_metadata(file_src.path(), path_file_dst).map_err(|e| e.to_string())
        }
        EnumFileClass::Symlink => {
            copy_symbolic_link(file_src.path(), path_file_dst).map_err(|e| e.to_string())
        }
        EnumFileClass::OtherNonRegular => {
            Err("Unsupported special file (device, pipe or socket)".to_string())
        }
    }
}
