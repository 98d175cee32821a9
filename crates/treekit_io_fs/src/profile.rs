//! Directory and tree profiles (file/byte counts by class).

use std::fs;
use std::path::Path;

use crate::collection::CollectionDirs;
use crate::handle::{EnumEntryKind, HandleDir, MetaEntry};
use crate::report::ReportDirProfile;
use crate::scan::discover_tree;
use crate::spec::TreeOpError;

/// Profile the immediate entries of one directory.
///
/// A missing directory yields a zero profile with `if_dir_exists == false`.
pub fn profile_directory<P: AsRef<Path>>(dir: P) -> Result<ReportDirProfile, TreeOpError> {
    let (dir, _) = HandleDir::resolve(dir)?;
    profile_dir_handle(&dir)
}

/// Profile every directory of the tree under `dir_root`.
pub fn profile_tree<P: AsRef<Path>>(
    dir_root: P,
    if_include_root: bool,
) -> Result<ReportDirProfile, TreeOpError> {
    let (dir_root, _) = HandleDir::resolve(dir_root)?;
    let dir_root = dir_root.require_dir()?;
    let listing = discover_tree(&dir_root, if_include_root)?;
    profile_collection(&listing.dirs, dir_root.path(), if_include_root)
}

pub(crate) fn profile_dir_handle(dir: &HandleDir) -> Result<ReportDirProfile, TreeOpError> {
    let mut profile = ReportDirProfile {
        path_dir: dir.path().to_path_buf(),
        if_root_included: true,
        ..ReportDirProfile::default()
    };
    if !dir.path().is_dir() {
        return Ok(profile);
    }
    profile.if_dir_exists = true;
    profile.cnt_dirs_profiled = 1;

    let map_read_err = |e: std::io::Error| TreeOpError::ReadDirFailed {
        path: dir.path().to_path_buf(),
        message: e.to_string(),
    };
    for entry in fs::read_dir(dir.path()).map_err(map_read_err)? {
        let entry = entry.map_err(map_read_err)?;
        let meta = MetaEntry::from_metadata(&entry.metadata().map_err(map_read_err)?);
        match meta.kind {
            EnumEntryKind::Directory => profile.add_subdir(meta.size),
            EnumEntryKind::File(class_file) => profile.add_file(class_file, meta.size),
        }
    }
    Ok(profile)
}

/// Sum directory profiles over an already discovered tree.
pub(crate) fn profile_collection(
    dirs: &CollectionDirs,
    path_root: &Path,
    if_include_root: bool,
) -> Result<ReportDirProfile, TreeOpError> {
    let mut profile = ReportDirProfile {
        path_dir: path_root.to_path_buf(),
        if_dir_exists: path_root.is_dir(),
        if_root_included: if_include_root,
        ..ReportDirProfile::default()
    };
    for dir in dirs {
        profile = profile.merge(&profile_dir_handle(dir)?);
    }
    Ok(profile)
}
