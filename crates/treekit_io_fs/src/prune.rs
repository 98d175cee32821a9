//! One-level removal of child subdirectory trees.

use std::fs;
use std::path::Path;

use log::{debug, error, info};

use crate::collection::CollectionDirs;
use crate::handle::HandleDir;
use crate::scan::{SpecListRequest, list_entries};
use crate::spec::{SpecFileTypeMask, TreeOpError, TreeOpFailure};

/// Remove every immediate child directory of `dir_parent`, recursively.
///
/// Files directly inside `dir_parent` are left alone. The first directory
/// that cannot be removed stops the loop; the failure carries the
/// directories removed before it. Returns the removed directories only
/// when `if_return_deleted_list` is set.
pub fn prune_subdirectories<P: AsRef<Path>>(
    dir_parent: P,
    if_return_deleted_list: bool,
) -> Result<Option<CollectionDirs>, TreeOpFailure<CollectionDirs>> {
    let mut dirs_deleted = CollectionDirs::new();
    let dir_parent = match HandleDir::resolve(dir_parent).and_then(|(d, _)| d.require_dir()) {
        Ok(v) => v,
        Err(e) => return Err(TreeOpFailure::new(e, dirs_deleted)),
    };

    let spec_request = SpecListRequest {
        if_want_subdirs: true,
        mask_file_types: SpecFileTypeMask::none(),
        ..SpecListRequest::default()
    };
    let listing = match list_entries(&dir_parent, &spec_request) {
        Ok(v) => v,
        Err(e) => return Err(TreeOpFailure::new(e, dirs_deleted)),
    };
    if let Some(item_error) = listing.errors.into_iter().next() {
        let err = TreeOpError::ReadDirFailed {
            path: item_error.path,
            message: item_error.exception,
        };
        error!("prune aborted: {err}");
        return Err(TreeOpFailure::new(err, dirs_deleted));
    }

    for dir_child in listing.dirs {
        debug!("remove tree: {}", dir_child.path().display());
        if let Err(e) = remove_dir_all(&dir_child) {
            let err = TreeOpError::RemoveDirFailed {
                path: dir_child.path().to_path_buf(),
                message: e.to_string(),
            };
            error!("prune aborted: {err}");
            return Err(TreeOpFailure::new(err, dirs_deleted));
        }
        dirs_deleted.add(dir_child.with_exists(false));
    }

    info!(
        "[PRUNE] parent={} removed={}",
        dir_parent.path().display(),
        dirs_deleted.len()
    );
    Ok(if_return_deleted_list.then_some(dirs_deleted))
}

/// Remove `dir` and everything below it.
pub fn remove_dir_all(dir: &HandleDir) -> std::io::Result<()> {
    fs::remove_dir_all(dir.path())
}
