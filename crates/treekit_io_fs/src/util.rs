use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::handle::normalize_lexically;

////////////////////////////////////////////////////////////////////////////////
// #region PathUtilities

fn _is_relative_to_base(path: &Path, base: &Path) -> bool {
    path.starts_with(base)
}

/// Canonicalize when possible; otherwise canonicalize the deepest existing
/// ancestor and re-append the missing tail.
fn _normalize_path(path: &Path) -> PathBuf {
    if let Ok(resolved) = fs::canonicalize(path) {
        return resolved;
    }
    let mut path_tail = Vec::new();
    let mut path_cursor = path;
    while let Some(path_parent) = path_cursor.parent() {
        if let Some(name) = path_cursor.file_name() {
            path_tail.push(name.to_os_string());
        }
        if let Ok(mut resolved) = fs::canonicalize(path_parent) {
            for name in path_tail.iter().rev() {
                resolved.push(name);
            }
            return resolved;
        }
        path_cursor = path_parent;
    }
    path.to_path_buf()
}

/// `src` contains `dst` or vice versa, after resolving links.
pub(crate) fn is_overlap(src: &Path, dst: &Path) -> bool {
    let src_resolved = _normalize_path(src);
    let dst_resolved = _normalize_path(dst);
    _is_relative_to_base(&dst_resolved, &src_resolved)
        || _is_relative_to_base(&src_resolved, &dst_resolved)
}

/// Replace the `path_dir_src_root` prefix of `path_dir_src_sub` with
/// `path_dir_dst_root`.
///
/// # Examples
/// ```ignore
/// let path_dst = derive_mirror_path(
///     Path::new("/src/a/b"),
///     Path::new("/src"),
///     Path::new("/dst"),
/// )?;
/// assert_eq!(path_dst, Path::new("/dst/a/b"));
/// ```
pub(crate) fn derive_mirror_path(
    path_dir_src_sub: &Path,
    path_dir_src_root: &Path,
    path_dir_dst_root: &Path,
) -> Result<PathBuf, String> {
    let path_rel = path_dir_src_sub
        .strip_prefix(path_dir_src_root)
        .map_err(|_| {
            format!(
                "Directory {} is not under source root {}",
                path_dir_src_sub.display(),
                path_dir_src_root.display()
            )
        })?;
    if path_rel.as_os_str().is_empty() {
        return Ok(path_dir_dst_root.to_path_buf());
    }
    let path_dst = normalize_lexically(&path_dir_dst_root.join(path_rel));
    if !path_dst.starts_with(path_dir_dst_root) {
        return Err(format!(
            "Mirrored path escapes destination root: {} (root={})",
            path_dst.display(),
            path_dir_dst_root.display()
        ));
    }
    Ok(path_dst)
}

/// Reject writing through an existing destination symlink.
pub(crate) fn validate_destination_file(path_dst_item: &Path) -> Result<(), String> {
    match fs::symlink_metadata(path_dst_item) {
        Ok(meta_dst_item) => {
            if meta_dst_item.file_type().is_symlink() {
                return Err(format!(
                    "Unsafe destination path is an existing symlink: {}",
                    path_dst_item.display()
                ));
            }
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(format!(
            "Failed to inspect destination path {} ({e})",
            path_dst_item.display()
        )),
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region FileOperations

/// Create `path_dir` and missing parents. Returns whether it had to be created.
pub(crate) fn ensure_dir(path_dir: &Path) -> io::Result<bool> {
    if path_dir.is_dir() {
        return Ok(false);
    }
    fs::create_dir_all(path_dir)?;
    Ok(true)
}

/// Copy contents, permissions, times and (on Linux) extended attributes.
///
/// A regular file already at `path_file_dst` is unlinked first: it may carry
/// read-only bits copied by an earlier pass and refuse to open for writing.
pub(crate) fn copy_file_with_metadata(
    path_file_src: &Path,
    path_file_dst: &Path,
) -> Result<(), io::Error> {
    if fs::symlink_metadata(path_file_dst).is_ok_and(|m| m.is_file()) {
        fs::remove_file(path_file_dst)?;
    }
    fs::copy(path_file_src, path_file_dst)?;
    apply_metadata(path_file_src, path_file_dst)?;
    Ok(())
}

fn apply_metadata(path_file_src: &Path, path_file_dst: &Path) -> Result<(), io::Error> {
    use filetime::{FileTime, set_file_times};

    let stat_src = fs::metadata(path_file_src)?;
    fs::set_permissions(path_file_dst, stat_src.permissions())?;

    let file_time_access = FileTime::from_last_access_time(&stat_src);
    let file_time_modify = FileTime::from_last_modification_time(&stat_src);
    set_file_times(path_file_dst, file_time_access, file_time_modify)?;

    #[cfg(target_os = "linux")]
    {
        copy_xattrs_linux(path_file_src, path_file_dst);
    }
    Ok(())
}

// Best effort: unsupported filesystems and restricted namespaces are skipped.
#[cfg(target_os = "linux")]
fn copy_xattrs_linux(path_file_src: &Path, path_file_dst: &Path) {
    let Ok(iter_xattr_names) = xattr::list(path_file_src) else {
        return;
    };

    for name in iter_xattr_names {
        let Some(raw_value) = xattr::get(path_file_src, &name).ok().flatten() else {
            continue;
        };
        if let Err(e) = xattr::set(path_file_dst, &name, &raw_value) {
            log::debug!(
                "xattr {:?} not copied to {}: {e}",
                name,
                path_file_dst.display()
            );
        }
    }
}

/// Recreate the link at `path_dst`, replacing an existing non-directory entry.
pub(crate) fn copy_symbolic_link(path_src: &Path, path_dst: &Path) -> Result<(), io::Error> {
    let target = fs::read_link(path_src)?;
    match fs::symlink_metadata(path_dst) {
        Ok(meta_dst) if !meta_dst.is_dir() => fs::remove_file(path_dst)?,
        Ok(_) => {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("Destination is a directory: {}", path_dst.display()),
            ));
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }

    #[cfg(unix)]
    {
        std::os::unix::fs::symlink(&target, path_dst)
    }
    #[cfg(windows)]
    {
        use std::os::windows::fs::{symlink_dir, symlink_file};
        if path_src.is_dir() {
            symlink_dir(&target, path_dst)
        } else {
            symlink_file(&target, path_dst)
        }
    }
    #[cfg(not(any(unix, windows)))]
    {
        let _ = target;
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "Symbolic links are unsupported on this platform",
        ))
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
