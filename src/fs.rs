//! Directory listing

use crate::error::{Error, Result};
use std::{
    ffi::OsString,
    fs::{self, Metadata},
    io,
    path::Path,
};

/// One entry of a directory listing with its (non-following) stat result
#[derive(Debug)]
pub struct DirEntryInfo {
    pub name: OsString,
    pub metadata: Metadata,
}

impl DirEntryInfo {
    pub fn is_dir(&self) -> bool {
        self.metadata.is_dir()
    }

    pub fn size(&self) -> u64 {
        self.metadata.len()
    }
}

/// List the immediate children of `path`.
///
/// Symbolic links are reported as links and never followed. Entries removed
/// between the listing and their stat are skipped; any other failure fails the
/// whole read. The directory handle is released on every return path.
pub fn read_directory(path: &Path) -> Result<Vec<DirEntryInfo>> {
    let read_err = |source: io::Error| Error::ReadDir {
        path: path.to_path_buf(),
        source,
    };

    let mut entries = Vec::new();
    for entry in fs::read_dir(path).map_err(read_err)? {
        let entry = entry.map_err(read_err)?;
        match entry.metadata() {
            Ok(metadata) => entries.push(DirEntryInfo {
                name: entry.file_name(),
                metadata,
            }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
            Err(e) => return Err(read_err(e)),
        }
    }
    Ok(entries)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::tempdir;

    #[test]
    fn lists_files_and_directories() {
        let tmp = tempdir().unwrap();
        File::create(tmp.path().join("a.txt")).unwrap().set_len(12).unwrap();
        fs::create_dir(tmp.path().join("sub")).unwrap();

        let mut entries = read_directory(tmp.path()).unwrap();
        entries.sort_by(|a, b| a.name.cmp(&b.name));

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "a.txt");
        assert_eq!(entries[0].size(), 12);
        assert!(!entries[0].is_dir());
        assert_eq!(entries[1].name, "sub");
        assert!(entries[1].is_dir());
    }

    #[test]
    fn missing_directory_is_an_error() {
        let tmp = tempdir().unwrap();
        let err = read_directory(&tmp.path().join("nope")).unwrap_err();
        assert!(matches!(err, Error::ReadDir { .. }));
    }

    #[test]
    fn file_is_not_a_directory() {
        let tmp = tempdir().unwrap();
        let file = tmp.path().join("plain");
        File::create(&file).unwrap();
        assert!(read_directory(&file).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn symlinks_are_not_followed() {
        let tmp = tempdir().unwrap();
        fs::create_dir(tmp.path().join("real")).unwrap();
        std::os::unix::fs::symlink(tmp.path().join("real"), tmp.path().join("link")).unwrap();

        let entries = read_directory(tmp.path()).unwrap();
        let link = entries.iter().find(|e| e.name == "link").unwrap();
        assert!(!link.is_dir());
    }
}
