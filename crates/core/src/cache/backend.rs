//! Storage backends for the icon cache.
//!
//! The cache store computes keys and TTLs; everything that touches the disk
//! goes through [`StorageBackend`].

use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Bytes of a stored entry plus its last modification time.
#[derive(Debug, Clone)]
pub struct StoredBlob {
    pub bytes: Vec<u8>,
    pub modified: SystemTime,
}

/// Filesystem side effects needed by the cache store.
///
/// All paths are relative to the backend's root.
pub trait StorageBackend: Send + Sync {
    /// Read an entry, or `None` if it does not exist.
    fn read(&self, path: &Path) -> io::Result<Option<StoredBlob>>;

    /// Replace an entry's contents while holding an exclusive lock on it.
    fn write_locked(&self, path: &Path, bytes: &[u8]) -> io::Result<()>;

    /// Delete an entry. Deleting a missing entry is not an error.
    fn remove(&self, path: &Path) -> io::Result<()>;

    /// Absolute location of an entry, for diagnostics.
    fn locate(&self, path: &Path) -> PathBuf {
        path.to_path_buf()
    }
}

/// Cache entries stored as files under a root directory.
#[derive(Debug, Clone)]
pub struct FsBackend {
    root: PathBuf,
}

impl FsBackend {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl StorageBackend for FsBackend {
    fn read(&self, path: &Path) -> io::Result<Option<StoredBlob>> {
        let full = self.root.join(path);
        let mut file = match File::open(&full) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        };

        let modified = file.metadata()?.modified()?;
        let mut bytes = Vec::new();
        io::Read::read_to_end(&mut file, &mut bytes)?;

        Ok(Some(StoredBlob { bytes, modified }))
    }

    fn write_locked(&self, path: &Path, bytes: &[u8]) -> io::Result<()> {
        let full = self.root.join(path);
        let dir = full.parent().unwrap_or(self.root.as_path());
        fs::create_dir_all(dir)?;

        // Writers serialize on a sidecar lock file; the entry itself is only
        // ever replaced by rename, so readers see the old or the new bytes.
        let lock = OpenOptions::new().write(true).create(true).truncate(false).open(lock_path(&full))?;
        lock.lock()?;
        let written = replace_atomically(dir, &full, bytes);
        let unlocked = lock.unlock();
        written?;
        unlocked
    }

    fn remove(&self, path: &Path) -> io::Result<()> {
        match fs::remove_file(self.root.join(path)) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }

    fn locate(&self, path: &Path) -> PathBuf {
        self.root.join(path)
    }
}

/// Write `bytes` to a temp file next to `target`, then rename it into place.
fn replace_atomically(dir: &Path, target: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut tmp = tempfile::Builder::new().prefix(".tmp-").tempfile_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_data()?;
    restrict_permissions(tmp.path())?;
    tmp.persist(target).map_err(|e| e.error)?;
    Ok(())
}

/// `{entry}.lock` in the same shard directory.
fn lock_path(entry: &Path) -> PathBuf {
    let mut name = entry.file_name().map(OsString::from).unwrap_or_default();
    name.push(".lock");
    entry.with_file_name(name)
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> io::Result<()> {
    Ok(())
}

/// In-memory backend with controllable modification times.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct MemoryBackend {
    entries: std::sync::Mutex<std::collections::HashMap<PathBuf, StoredBlob>>,
}

#[cfg(test)]
impl MemoryBackend {
    pub(crate) fn insert_at(&self, path: &Path, bytes: &[u8], modified: SystemTime) {
        let blob = StoredBlob { bytes: bytes.to_vec(), modified };
        self.entries.lock().unwrap().insert(path.to_path_buf(), blob);
    }

    pub(crate) fn contains(&self, path: &Path) -> bool {
        self.entries.lock().unwrap().contains_key(path)
    }
}

#[cfg(test)]
impl StorageBackend for MemoryBackend {
    fn read(&self, path: &Path) -> io::Result<Option<StoredBlob>> {
        Ok(self.entries.lock().unwrap().get(path).cloned())
    }

    fn write_locked(&self, path: &Path, bytes: &[u8]) -> io::Result<()> {
        self.insert_at(path, bytes, SystemTime::now());
        Ok(())
    }

    fn remove(&self, path: &Path) -> io::Result<()> {
        self.entries.lock().unwrap().remove(path);
        Ok(())
    }
}
