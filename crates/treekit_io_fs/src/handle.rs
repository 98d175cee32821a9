//! Canonical directory/file handles resolved from user paths.

use std::fs;
use std::path::{Component, Path, PathBuf};
use std::time::SystemTime;

use crate::spec::{EnumFileClass, TreeOpError};

////////////////////////////////////////////////////////////////////////////////
// #region Metadata

/// Entry kind as reported by `lstat` (links are never followed).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumEntryKind {
    Directory,
    File(EnumFileClass),
}

/// Cached metadata of one directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetaEntry {
    pub kind: EnumEntryKind,
    pub size: u64,
    /// Permission bits (`mode & 0o7777`).
    pub mode: u32,
    pub time_modified: Option<SystemTime>,
}

impl MetaEntry {
    pub fn from_metadata(meta: &fs::Metadata) -> Self {
        let file_type = meta.file_type();
        let kind = if file_type.is_dir() {
            EnumEntryKind::Directory
        } else if file_type.is_symlink() {
            EnumEntryKind::File(EnumFileClass::Symlink)
        } else if file_type.is_file() {
            EnumEntryKind::File(EnumFileClass::Regular)
        } else {
            EnumEntryKind::File(EnumFileClass::OtherNonRegular)
        };
        Self {
            kind,
            size: meta.len(),
            mode: _mode_bits(meta),
            time_modified: meta.modified().ok(),
        }
    }

    /// Stat `path` without following a trailing symlink.
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        fs::symlink_metadata(path).map(|meta| Self::from_metadata(&meta))
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EnumEntryKind::Directory
    }

    pub fn class_file(&self) -> Option<EnumFileClass> {
        match self.kind {
            EnumEntryKind::Directory => None,
            EnumEntryKind::File(class_file) => Some(class_file),
        }
    }
}

#[cfg(unix)]
fn _mode_bits(meta: &fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    meta.permissions().mode() & 0o7777
}

#[cfg(not(unix))]
fn _mode_bits(meta: &fs::Metadata) -> u32 {
    if meta.permissions().readonly() {
        0o444
    } else {
        0o666
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region HandleDir

/// Validated, absolute directory path with cached attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandleDir {
    path_abs: PathBuf,
    path_original: String,
    path_parent: Option<PathBuf>,
    name_dir: String,
    volume: String,
    if_exists: bool,
    meta: Option<MetaEntry>,
}

impl HandleDir {
    /// Resolve a user path into a directory handle.
    ///
    /// The path is made absolute against the current directory and normalized
    /// lexically (`.`/`..` folded, links untouched). The returned flag is `true`
    /// when the directory exists and has no entries. A missing directory is not
    /// an error here; callers decide via [`HandleDir::require_dir`].
    pub fn resolve<P: AsRef<Path>>(path: P) -> Result<(Self, bool), TreeOpError> {
        let path_in = path.as_ref();
        let path_original = path_in.to_string_lossy().into_owned();
        if path_original.trim().is_empty() {
            return Err(TreeOpError::InvalidPath {
                path: path_original,
                message: "Path is empty or blank".to_string(),
            });
        }
        if path_original.contains('\0') {
            return Err(TreeOpError::InvalidPath {
                path: path_original,
                message: "Path contains a NUL byte".to_string(),
            });
        }

        let path_abs = if path_in.is_absolute() {
            path_in.to_path_buf()
        } else {
            let path_cwd = std::env::current_dir().map_err(|e| TreeOpError::InvalidPath {
                path: path_original.clone(),
                message: format!("Failed to read current directory ({e})"),
            })?;
            path_cwd.join(path_in)
        };
        let path_abs = normalize_lexically(&path_abs);

        let meta = fs::metadata(&path_abs).ok().map(|m| MetaEntry::from_metadata(&m));
        let handle = Self {
            path_parent: path_abs.parent().map(Path::to_path_buf),
            name_dir: _leaf_name(&path_abs),
            volume: _volume_of(&path_abs),
            if_exists: meta.is_some(),
            meta,
            path_original,
            path_abs,
        };
        let if_empty = handle.is_dir()
            && fs::read_dir(&handle.path_abs).is_ok_and(|mut iter| iter.next().is_none());
        Ok((handle, if_empty))
    }

    /// Build the handle of a subdirectory found by a listing; no revalidation.
    pub(crate) fn from_listing(dir_parent: &HandleDir, name_dir: &str, meta: MetaEntry) -> Self {
        let path_abs = dir_parent.path_abs.join(name_dir);
        Self {
            path_original: path_abs.to_string_lossy().into_owned(),
            path_parent: Some(dir_parent.path_abs.clone()),
            name_dir: name_dir.to_string(),
            volume: dir_parent.volume.clone(),
            if_exists: true,
            meta: Some(meta),
            path_abs,
        }
    }

    /// Fail unless the handle names an existing directory.
    pub fn require_dir(self) -> Result<Self, TreeOpError> {
        if !self.if_exists {
            return Err(TreeOpError::RootNotFound(self.path_abs));
        }
        if !self.is_dir() {
            return Err(TreeOpError::RootNotDirectory(self.path_abs));
        }
        Ok(self)
    }

    pub fn path(&self) -> &Path {
        &self.path_abs
    }

    pub fn path_original(&self) -> &str {
        &self.path_original
    }

    pub fn path_parent(&self) -> Option<&Path> {
        self.path_parent.as_deref()
    }

    pub fn name(&self) -> &str {
        &self.name_dir
    }

    /// Windows path prefix (`C:`, `\\server\share`); empty elsewhere.
    pub fn volume(&self) -> &str {
        &self.volume
    }

    /// Existence as observed when the handle was built.
    pub fn exists(&self) -> bool {
        self.if_exists
    }

    pub fn meta(&self) -> Option<&MetaEntry> {
        self.meta.as_ref()
    }

    pub fn is_dir(&self) -> bool {
        self.meta.as_ref().is_some_and(MetaEntry::is_dir)
    }

    /// Re-stat the directory and refresh cached state.
    pub fn refresh(&mut self) -> bool {
        self.meta = fs::metadata(&self.path_abs)
            .ok()
            .map(|m| MetaEntry::from_metadata(&m));
        self.if_exists = self.meta.is_some();
        self.if_exists
    }

    pub(crate) fn with_exists(mut self, if_exists: bool) -> Self {
        self.if_exists = if_exists;
        self
    }
}

/// Fold `.` and `..` components without touching the filesystem.
pub(crate) fn normalize_lexically(path: &Path) -> PathBuf {
    let mut path_out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // `..` at the root stays at the root
                if !path_out.pop() && !path_out.has_root() {
                    path_out.push(component.as_os_str());
                }
            }
            _ => path_out.push(component.as_os_str()),
        }
    }
    path_out
}

fn _leaf_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn _volume_of(path: &Path) -> String {
    match path.components().next() {
        Some(Component::Prefix(prefix)) => prefix.as_os_str().to_string_lossy().into_owned(),
        _ => String::new(),
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region HandleFile

/// One file inside a directory, with metadata cached at listing time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandleFile {
    path_abs: PathBuf,
    name_file: String,
    dir_owner: HandleDir,
    meta: MetaEntry,
    if_exists: bool,
}

impl HandleFile {
    /// Build a handle from a directory listing entry.
    pub fn from_entry(dir_owner: &HandleDir, name_file: &str, meta: MetaEntry) -> Self {
        Self {
            path_abs: dir_owner.path().join(name_file),
            name_file: name_file.to_string(),
            dir_owner: dir_owner.clone(),
            meta,
            if_exists: true,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path_abs
    }

    pub fn name(&self) -> &str {
        &self.name_file
    }

    pub fn dir(&self) -> &HandleDir {
        &self.dir_owner
    }

    pub fn meta(&self) -> &MetaEntry {
        &self.meta
    }

    pub fn size(&self) -> u64 {
        self.meta.size
    }

    pub fn mode(&self) -> u32 {
        self.meta.mode
    }

    pub fn time_modified(&self) -> Option<SystemTime> {
        self.meta.time_modified
    }

    pub fn class_file(&self) -> EnumFileClass {
        self.meta
            .class_file()
            .unwrap_or(EnumFileClass::OtherNonRegular)
    }

    pub fn exists(&self) -> bool {
        self.if_exists
    }

    pub(crate) fn with_exists(mut self, if_exists: bool) -> Self {
        self.if_exists = if_exists;
        self
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
