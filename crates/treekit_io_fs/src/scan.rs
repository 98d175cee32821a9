//! Single-directory listing and breadth-first tree discovery.

use std::fs;

use log::debug;

use crate::collection::{CollectionDirs, CollectionFiles};
use crate::handle::{EnumEntryKind, HandleDir, HandleFile, MetaEntry};
use crate::select::SelectorFile;
use crate::spec::{SpecFileTypeMask, SpecItemError, TreeOpError};

/// What `list_entries` should return for one directory.
#[derive(Debug, Clone, Copy)]
pub struct SpecListRequest<'a> {
    /// Return immediate subdirectories.
    pub if_want_subdirs: bool,
    /// File classes to return; a file outside the mask is not returned.
    pub mask_file_types: SpecFileTypeMask,
    /// Optional name filter applied to subdirectories.
    pub selector_dirs: Option<&'a SelectorFile>,
    /// Optional filter applied to files after the mask.
    pub selector_files: Option<&'a SelectorFile>,
}

impl Default for SpecListRequest<'_> {
    fn default() -> Self {
        Self {
            if_want_subdirs: true,
            mask_file_types: SpecFileTypeMask::all(),
            selector_dirs: None,
            selector_files: None,
        }
    }
}

/// Entries of one directory, each list sorted by name.
#[derive(Debug, Default, Clone)]
pub struct ListingDir {
    pub dirs: CollectionDirs,
    pub files: CollectionFiles,
    /// Entries whose name or metadata could not be read.
    pub errors: Vec<SpecItemError>,
}

/// Every transitive subdirectory of a root, in discovery order.
#[derive(Debug, Default, Clone)]
pub struct ListingTree {
    /// Root first when requested, then breadth-first subdirectories.
    pub dirs: CollectionDirs,
    /// Subdirectory count, root never included.
    pub n_subdirs_total: u64,
    pub errors: Vec<SpecItemError>,
}

/// List the immediate entries of `dir` without following symlinks.
///
/// Failing to open or iterate the directory is fatal. A single unreadable
/// entry is recorded in [`ListingDir::errors`] and skipped.
pub fn list_entries(
    dir: &HandleDir,
    spec_request: &SpecListRequest<'_>,
) -> Result<ListingDir, TreeOpError> {
    let map_read_err = |e: std::io::Error| TreeOpError::ReadDirFailed {
        path: dir.path().to_path_buf(),
        message: e.to_string(),
    };

    let mut l_dirs = Vec::new();
    let mut l_files = Vec::new();
    let mut listing = ListingDir::default();
    for entry in fs::read_dir(dir.path()).map_err(map_read_err)? {
        let entry = entry.map_err(map_read_err)?;
        let path_entry = entry.path();
        let Some(name_entry) = entry.file_name().to_str().map(str::to_string) else {
            listing.errors.push(SpecItemError::new(
                path_entry,
                "Entry name is not valid UTF-8",
            ));
            continue;
        };
        // `DirEntry::metadata` does not traverse symlinks.
        let meta = match entry.metadata() {
            Ok(v) => MetaEntry::from_metadata(&v),
            Err(e) => {
                listing.errors.push(SpecItemError::new(path_entry, e.to_string()));
                continue;
            }
        };

        match meta.kind {
            EnumEntryKind::Directory => {
                if !spec_request.if_want_subdirs {
                    continue;
                }
                if spec_request
                    .selector_dirs
                    .is_some_and(|s| !s.matches(&name_entry, &meta))
                {
                    continue;
                }
                l_dirs.push((name_entry, meta));
            }
            EnumEntryKind::File(class_file) => {
                if !spec_request.mask_file_types.allows(class_file) {
                    continue;
                }
                if spec_request
                    .selector_files
                    .is_some_and(|s| !s.matches(&name_entry, &meta))
                {
                    continue;
                }
                l_files.push((name_entry, meta));
            }
        }
    }

    l_dirs.sort_by(|a, b| a.0.cmp(&b.0));
    l_files.sort_by(|a, b| a.0.cmp(&b.0));
    listing.dirs = l_dirs
        .iter()
        .map(|(name, meta)| HandleDir::from_listing(dir, name, *meta))
        .collect();
    listing.files = l_files
        .iter()
        .map(|(name, meta)| HandleFile::from_entry(dir, name, *meta))
        .collect();
    Ok(listing)
}

/// Discover the whole subdirectory tree of `dir_root` breadth-first.
///
/// Runs to completion before any caller processes files. The queue is
/// scanned with an index cursor while it grows; the scan ends when the
/// cursor runs past the last discovered directory.
pub fn discover_tree(
    dir_root: &HandleDir,
    if_include_root: bool,
) -> Result<ListingTree, TreeOpError> {
    let dir_root = dir_root.clone().require_dir()?;
    let spec_request = SpecListRequest {
        if_want_subdirs: true,
        mask_file_types: SpecFileTypeMask::none(),
        ..SpecListRequest::default()
    };

    let mut listing_tree = ListingTree::default();
    if if_include_root {
        listing_tree.dirs.add(dir_root.clone());
    }
    let listing_root = list_entries(&dir_root, &spec_request)?;
    listing_tree.errors.extend(listing_root.errors);
    listing_tree.dirs.add_collection(listing_root.dirs);

    let mut idx_cursor = usize::from(if_include_root);
    while let Ok(dir_next) = listing_tree.dirs.peek_at(idx_cursor) {
        let listing = list_entries(dir_next, &spec_request)?;
        listing_tree.errors.extend(listing.errors);
        listing_tree.dirs.add_collection(listing.dirs);
        idx_cursor += 1;
    }

    listing_tree.n_subdirs_total =
        (listing_tree.dirs.len() - usize::from(if_include_root)) as u64;
    debug!(
        "discovered {} subdirectories under {}",
        listing_tree.n_subdirs_total,
        dir_root.path().display()
    );
    Ok(listing_tree)
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use tempfile::TempDir;

    use super::{SpecListRequest, discover_tree, list_entries};
    use crate::handle::HandleDir;
    use crate::select::SelectorFile;
    use crate::spec::{SpecFileTypeMask, SpecSelectionCriteria, TreeOpError};

    fn write_text(path: &Path, txt: &str) {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent");
        }
        std::fs::write(path, txt).expect("write text");
    }

    fn resolve(path: &Path) -> HandleDir {
        HandleDir::resolve(path).expect("resolve").0
    }

    #[test]
    fn list_entries_sorts_and_filters() {
        let tmp = TempDir::new().expect("tempdir");
        write_text(&tmp.path().join("b.txt"), "b");
        write_text(&tmp.path().join("a.txt"), "a");
        write_text(&tmp.path().join("c.log"), "c");
        std::fs::create_dir_all(tmp.path().join("zz")).expect("mkdir");
        std::fs::create_dir_all(tmp.path().join("aa")).expect("mkdir");

        let dir = resolve(tmp.path());
        let listing = list_entries(&dir, &SpecListRequest::default()).expect("list");
        let l_names: Vec<_> = listing.files.iter().map(|f| f.name().to_string()).collect();
        assert_eq!(l_names, vec!["a.txt", "b.txt", "c.log"]);
        let l_dirs: Vec<_> = listing.dirs.iter().map(|d| d.name().to_string()).collect();
        assert_eq!(l_dirs, vec!["aa", "zz"]);

        let selector = SelectorFile::from_criteria(&SpecSelectionCriteria {
            patterns_file_name: Some(vec!["*.txt".to_string()]),
            ..SpecSelectionCriteria::default()
        })
        .expect("compile");
        let spec_request = SpecListRequest {
            if_want_subdirs: false,
            selector_files: Some(&selector),
            ..SpecListRequest::default()
        };
        let listing = list_entries(&dir, &spec_request).expect("list");
        assert_eq!(listing.files.len(), 2);
        assert!(listing.dirs.is_empty());

        let spec_request = SpecListRequest {
            mask_file_types: SpecFileTypeMask::none(),
            ..SpecListRequest::default()
        };
        let listing = list_entries(&dir, &spec_request).expect("list");
        assert!(listing.files.is_empty());
        assert_eq!(listing.dirs.len(), 2);
    }

    #[test]
    fn list_entries_filters_subdirs_by_name() {
        let tmp = TempDir::new().expect("tempdir");
        for rel in ["keep_a", "keep_b", "drop_c"] {
            std::fs::create_dir_all(tmp.path().join(rel)).expect("mkdir");
        }
        write_text(&tmp.path().join("keep_file.txt"), "f");

        let selector = SelectorFile::from_criteria(&SpecSelectionCriteria {
            patterns_file_name: Some(vec!["keep_*".to_string()]),
            ..SpecSelectionCriteria::default()
        })
        .expect("compile");
        let spec_request = SpecListRequest {
            selector_dirs: Some(&selector),
            ..SpecListRequest::default()
        };
        let listing = list_entries(&resolve(tmp.path()), &spec_request).expect("list");
        let l_dirs: Vec<_> = listing.dirs.iter().map(|d| d.name().to_string()).collect();
        assert_eq!(l_dirs, vec!["keep_a", "keep_b"]);
        assert_eq!(listing.files.len(), 1);
    }

    #[test]
    fn discover_tree_is_breadth_first() {
        let tmp = TempDir::new().expect("tempdir");
        for rel in ["a/a1/a2", "b/b1", "c"] {
            std::fs::create_dir_all(tmp.path().join(rel)).expect("mkdir");
        }
        let dir_root = resolve(tmp.path());

        let listing = discover_tree(&dir_root, false).expect("discover");
        let l_rel: Vec<_> = listing
            .dirs
            .iter()
            .map(|d| {
                d.path()
                    .strip_prefix(dir_root.path())
                    .expect("under root")
                    .to_string_lossy()
                    .replace('\\', "/")
            })
            .collect();
        assert_eq!(l_rel, vec!["a", "b", "c", "a/a1", "b/b1", "a/a1/a2"]);
        assert_eq!(listing.n_subdirs_total, 6);

        let listing = discover_tree(&dir_root, true).expect("discover");
        assert_eq!(listing.dirs.len(), 7);
        assert_eq!(listing.n_subdirs_total, 6);
        assert_eq!(listing.dirs.peek_first().expect("root").path(), dir_root.path());
    }

    #[cfg(unix)]
    #[test]
    fn discover_tree_does_not_follow_dir_symlinks() {
        let tmp = TempDir::new().expect("tempdir");
        std::fs::create_dir_all(tmp.path().join("real/inner")).expect("mkdir");
        std::os::unix::fs::symlink(tmp.path().join("real"), tmp.path().join("link"))
            .expect("symlink");

        let listing = discover_tree(&resolve(tmp.path()), false).expect("discover");
        assert_eq!(listing.n_subdirs_total, 2);

        let listing_root = list_entries(&resolve(tmp.path()), &SpecListRequest::default())
            .expect("list");
        assert_eq!(listing_root.files.len(), 1);
    }

    #[test]
    fn discover_tree_rejects_missing_root() {
        let tmp = TempDir::new().expect("tempdir");
        let dir_missing = resolve(&tmp.path().join("missing"));
        let err = discover_tree(&dir_missing, true).expect_err("must fail");
        assert!(matches!(err, TreeOpError::RootNotFound(_)));
    }
}
