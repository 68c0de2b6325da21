use std::{
    collections::{BTreeMap, BTreeSet},
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::RwLock,
};

use bpi_core::{FileError, FileStore};

/// A file store that lives entirely in memory.
///
/// It mimics the behavior of a real filesystem closely enough for the
/// materializer and the key loader: writes fail if the parent directory was
/// never created, reads and listings fail on missing entries, and specific
/// paths can be configured to fail on write.
#[derive(Default)]
pub struct MemoryStore {
    files: RwLock<BTreeMap<PathBuf, Vec<u8>>>,
    dirs: RwLock<BTreeSet<PathBuf>>,
    broken: RwLock<BTreeSet<PathBuf>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a file, creating its parent directory on the fly.
    pub fn with_file(self, path: impl Into<PathBuf>, contents: impl Into<Vec<u8>>) -> Self {
        let path = path.into();

        if let Some(parent) = path.parent() {
            self.create_dir_all(parent).unwrap();
        }

        self.files.write().unwrap().insert(path, contents.into());
        self
    }

    pub fn with_dir(self, path: impl Into<PathBuf>) -> Self {
        self.create_dir_all(&path.into()).unwrap();
        self
    }

    /// Makes any future write to `path` fail with a permission error.
    pub fn break_path(&self, path: impl Into<PathBuf>) {
        self.broken.write().unwrap().insert(path.into());
    }

    pub fn contents(&self, path: &Path) -> Option<Vec<u8>> {
        self.files.read().unwrap().get(path).cloned()
    }

    pub fn has_dir(&self, path: &Path) -> bool {
        self.dirs.read().unwrap().contains(path)
    }

    pub fn file_count(&self) -> usize {
        self.files.read().unwrap().len()
    }
}

impl FileStore for MemoryStore {
    fn create_dir_all(&self, path: &Path) -> Result<(), FileError> {
        let mut dirs = self.dirs.write().unwrap();

        for ancestor in path.ancestors() {
            if !ancestor.as_os_str().is_empty() {
                dirs.insert(ancestor.to_path_buf());
            }
        }

        Ok(())
    }

    fn write_file(&self, path: &Path, contents: &[u8]) -> Result<(), FileError> {
        if self.broken.read().unwrap().contains(path) {
            return Err(FileError::Write {
                path: path.to_path_buf(),
                source: ErrorKind::PermissionDenied.into(),
            });
        }

        let parent_exists = path.parent().map(|x| self.has_dir(x)).unwrap_or(true);

        if !parent_exists {
            return Err(FileError::Write {
                path: path.to_path_buf(),
                source: ErrorKind::NotFound.into(),
            });
        }

        self.files
            .write()
            .unwrap()
            .insert(path.to_path_buf(), contents.to_vec());

        Ok(())
    }

    fn read_file(&self, path: &Path) -> Result<Vec<u8>, FileError> {
        self.contents(path).ok_or_else(|| FileError::Read {
            path: path.to_path_buf(),
            source: ErrorKind::NotFound.into(),
        })
    }

    fn list_dir(&self, path: &Path) -> Result<Vec<PathBuf>, FileError> {
        if !self.has_dir(path) {
            return Err(FileError::List {
                path: path.to_path_buf(),
                source: ErrorKind::NotFound.into(),
            });
        }

        let entries = self
            .files
            .read()
            .unwrap()
            .keys()
            .filter(|x| x.parent() == Some(path))
            .cloned()
            .collect();

        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_requires_parent_dir() {
        let store = MemoryStore::new();
        let path = Path::new("/scripts/datum-00.json");

        let err = store.write_file(path, b"{}").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        store.create_dir_all(Path::new("/scripts")).unwrap();
        store.write_file(path, b"{}").unwrap();

        assert_eq!(store.read_file(path).unwrap(), b"{}");
    }

    #[test]
    fn list_is_not_recursive() {
        let store = MemoryStore::new()
            .with_file("/keys/a.skey", "a")
            .with_file("/keys/nested/b.skey", "b");

        let entries = store.list_dir(Path::new("/keys")).unwrap();

        assert_eq!(entries, vec![PathBuf::from("/keys/a.skey")]);
    }

    #[test]
    fn broken_paths_fail_on_write() {
        let store = MemoryStore::new().with_dir("/scripts");
        store.break_path("/scripts/x.json");

        let err = store
            .write_file(Path::new("/scripts/x.json"), b"{}")
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::PermissionDenied);
        assert_eq!(err.path(), Path::new("/scripts/x.json"));
    }
}
