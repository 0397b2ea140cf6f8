//! The flat-file store.
//!
//! Everything slate persists (route tables, templates, posts, static assets,
//! the access log) lives in one directory tree. Callers address it with
//! `/`-rooted virtual paths such as `/posts/hello.md`; [`DiskStorage`] maps
//! them under its root and refuses anything that would climb out of it.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};

/// A storage operation failed.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("invalid path `{0}`")]
    InvalidPath(String),

    #[error("{path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
}

impl StorageError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Io { source, .. } if source.kind() == io::ErrorKind::NotFound)
    }
}

/// One entry of a directory listing.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Entry {
    pub name: String,
    pub is_dir: bool,
    pub size: u64,
}

/// Byte-stream file access.
///
/// All operations are blocking and complete before returning.
pub trait Storage: Send + Sync {
    fn read(&self, path: &str) -> Result<Vec<u8>, StorageError>;

    /// Replaces the file's content, creating it if needed.
    fn write(&self, path: &str, data: &[u8]) -> Result<(), StorageError>;

    /// Appends to the file, creating it if needed.
    fn append(&self, path: &str, data: &[u8]) -> Result<(), StorageError>;

    fn exists(&self, path: &str) -> bool;

    fn remove(&self, path: &str) -> Result<(), StorageError>;

    fn size(&self, path: &str) -> Result<u64, StorageError>;

    /// Copies `from` over `to`, replacing whatever `to` held.
    fn copy(&self, from: &str, to: &str) -> Result<(), StorageError>;

    /// Lists a directory in name order.
    fn list(&self, dir: &str) -> Result<Vec<Entry>, StorageError>;

    /// Reads a file as text, replacing invalid UTF-8.
    fn read_string(&self, path: &str) -> Result<String, StorageError> {
        self.read(path)
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
    }
}

/// [`Storage`] backed by a directory on the local filesystem.
#[derive(Clone, Debug)]
pub struct DiskStorage {
    root: PathBuf,
}

impl DiskStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Maps a virtual path under the root. Only plain components survive.
    fn resolve(&self, path: &str) -> Result<PathBuf, StorageError> {
        let mut resolved = self.root.clone();
        for component in Path::new(path.trim_start_matches('/')).components() {
            match component {
                Component::Normal(part) => resolved.push(part),
                Component::CurDir => {}
                _ => return Err(StorageError::InvalidPath(path.to_owned())),
            }
        }
        Ok(resolved)
    }
}

fn io_err(path: &str) -> impl FnOnce(io::Error) -> StorageError + '_ {
    move |source| StorageError::Io { path: path.to_owned(), source }
}

fn ensure_parent(target: &Path) -> io::Result<()> {
    match target.parent() {
        Some(parent) => fs::create_dir_all(parent),
        None => Ok(()),
    }
}

impl Storage for DiskStorage {
    fn read(&self, path: &str) -> Result<Vec<u8>, StorageError> {
        fs::read(self.resolve(path)?).map_err(io_err(path))
    }

    fn write(&self, path: &str, data: &[u8]) -> Result<(), StorageError> {
        let target = self.resolve(path)?;
        ensure_parent(&target).map_err(io_err(path))?;
        fs::write(target, data).map_err(io_err(path))
    }

    fn append(&self, path: &str, data: &[u8]) -> Result<(), StorageError> {
        let target = self.resolve(path)?;
        ensure_parent(&target).map_err(io_err(path))?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(target)
            .map_err(io_err(path))?;
        file.write_all(data).map_err(io_err(path))
    }

    fn exists(&self, path: &str) -> bool {
        self.resolve(path).is_ok_and(|p| p.exists())
    }

    fn remove(&self, path: &str) -> Result<(), StorageError> {
        fs::remove_file(self.resolve(path)?).map_err(io_err(path))
    }

    fn size(&self, path: &str) -> Result<u64, StorageError> {
        fs::metadata(self.resolve(path)?)
            .map(|m| m.len())
            .map_err(io_err(path))
    }

    fn copy(&self, from: &str, to: &str) -> Result<(), StorageError> {
        let source = self.resolve(from)?;
        let target = self.resolve(to)?;
        ensure_parent(&target).map_err(io_err(to))?;
        fs::copy(source, target).map(drop).map_err(io_err(from))
    }

    fn list(&self, dir: &str) -> Result<Vec<Entry>, StorageError> {
        let mut entries = Vec::new();
        for item in fs::read_dir(self.resolve(dir)?).map_err(io_err(dir))? {
            let item = item.map_err(io_err(dir))?;
            let meta = item.metadata().map_err(io_err(dir))?;
            entries.push(Entry {
                name: item.file_name().to_string_lossy().into_owned(),
                is_dir: meta.is_dir(),
                size: meta.len(),
            });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn write_read_append_remove() {
        let dir = TempDir::new().unwrap();
        let store = DiskStorage::new(dir.path());

        store.write("/logs/a.log", b"one\n").unwrap();
        store.append("/logs/a.log", b"two\n").unwrap();
        assert_eq!(store.read_string("/logs/a.log").unwrap(), "one\ntwo\n");
        assert_eq!(store.size("/logs/a.log").unwrap(), 8);

        store.remove("/logs/a.log").unwrap();
        assert!(!store.exists("/logs/a.log"));
    }

    #[test]
    fn missing_file_reports_not_found() {
        let dir = TempDir::new().unwrap();
        let store = DiskStorage::new(dir.path());

        let err = store.read("/posts/nope.md").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn parent_components_are_rejected() {
        let dir = TempDir::new().unwrap();
        let store = DiskStorage::new(dir.path());

        let err = store.read("/posts/../../etc/passwd").unwrap_err();
        assert!(matches!(err, StorageError::InvalidPath(_)));
        assert!(!store.exists("/../secret"));
    }

    #[test]
    fn copy_overwrites_target() {
        let dir = TempDir::new().unwrap();
        let store = DiskStorage::new(dir.path());

        store.write("/a.txt", b"new").unwrap();
        store.write("/b.txt", b"old and longer").unwrap();
        store.copy("/a.txt", "/b.txt").unwrap();
        assert_eq!(store.read("/b.txt").unwrap(), b"new");
    }

    #[test]
    fn list_is_sorted_and_flags_directories() {
        let dir = TempDir::new().unwrap();
        let store = DiskStorage::new(dir.path());

        store.write("/posts/b.md", b"bb").unwrap();
        store.write("/posts/a.md", b"a").unwrap();
        store.write("/posts/drafts/c.md", b"c").unwrap();

        let entries = store.list("/posts").unwrap();
        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["a.md", "b.md", "drafts"]);
        assert!(entries[2].is_dir);
        assert_eq!(entries[1].size, 2);
    }
}
