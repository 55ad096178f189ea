//! Backing stores for the status ledger
//!
//! The ledger is a single JSON document. [`JsonFileStore`] serializes writers
//! across processes with an exclusive lock on a sidecar `<ledger>.lock` file,
//! and replaces the document through a uniquely named temp file that is
//! fsynced and renamed into place, so a crash never leaves a torn file and a
//! successful write survives power loss. [`MemoryStore`] keeps the document in
//! process memory.

use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use fd_lock::RwLock;
use tempfile::Builder;

use super::ledger::LedgerDocument;
use super::{LedgerError, LedgerResult};

/// Durable storage for the whole ledger document
pub trait LedgerStore: Send + Sync {
    /// Read the current document; a store that was never written yields an empty one
    fn load(&self) -> LedgerResult<LedgerDocument>;

    /// Replace the stored document. Must not return `Ok` before the data is durable.
    fn persist(&self, document: &LedgerDocument) -> LedgerResult<()>;

    /// Read-modify-write with no other writer in between
    ///
    /// `apply` returns whether it changed the document; only then is it
    /// persisted. Returns the resulting document.
    fn update(
        &self,
        apply: &mut dyn FnMut(&mut LedgerDocument) -> bool,
    ) -> LedgerResult<LedgerDocument> {
        let mut document = self.load()?;
        if apply(&mut document) {
            self.persist(&document)?;
        }
        Ok(document)
    }

    /// Human-readable location, for logs
    fn describe(&self) -> String;
}

/// Ledger document stored as pretty-printed JSON on disk
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    lock_path: PathBuf,
}

impl JsonFileStore {
    /// Create a store at `path`, creating the parent directory if needed
    pub fn new(path: impl Into<PathBuf>) -> LedgerResult<Self> {
        let path = path.into();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| LedgerError::Io {
                operation: "create_dir",
                path: parent.display().to_string(),
                source,
            })?;
        }

        let mut lock_name = path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "ledger.json".into());
        lock_name.push(".lock");
        let lock_path = path.with_file_name(lock_name);

        Ok(Self { path, lock_path })
    }

    /// Path of the ledger file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of the sidecar lock file
    pub fn lock_path(&self) -> &Path {
        &self.lock_path
    }

    fn dir(&self) -> PathBuf {
        self.path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    fn lock_file(&self) -> LedgerResult<RwLock<File>> {
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&self.lock_path)
            .map_err(io_error("open_lock", &self.lock_path))?;
        Ok(RwLock::new(file))
    }

    /// Write the document; the caller holds the lock
    fn write_document(&self, document: &LedgerDocument) -> LedgerResult<()> {
        let dir = self.dir();
        let mut temp = Builder::new()
            .prefix(".ledger-")
            .suffix(".tmp")
            .tempfile_in(&dir)
            .map_err(io_error("create", &dir))?;
        let temp_path = temp.path().to_path_buf();

        let mut writer = BufWriter::new(temp.as_file_mut());
        serde_json::to_writer_pretty(&mut writer, document)?;
        writer.flush().map_err(io_error("write", &temp_path))?;
        drop(writer);
        temp.as_file()
            .sync_all()
            .map_err(io_error("fsync", &temp_path))?;

        temp.persist(&self.path)
            .map_err(|e| e.error)
            .map_err(io_error("rename", &self.path))?;
        sync_parent_dir(&self.path).map_err(io_error("fsync_dir", &self.path))?;

        tracing::debug!(
            path = %self.path.display(),
            days = document.published.len(),
            "Ledger persisted"
        );
        Ok(())
    }
}

impl LedgerStore for JsonFileStore {
    fn load(&self) -> LedgerResult<LedgerDocument> {
        if !self.path.exists() {
            return Ok(LedgerDocument::default());
        }

        let file = File::open(&self.path).map_err(io_error("open", &self.path))?;
        let reader = BufReader::new(file);

        // Corrupt is never treated as empty
        let document = serde_json::from_reader(reader).map_err(|source| {
            LedgerError::Corrupt {
                path: self.path.display().to_string(),
                source,
            }
        })?;

        tracing::trace!(path = %self.path.display(), "Ledger loaded");
        Ok(document)
    }

    fn persist(&self, document: &LedgerDocument) -> LedgerResult<()> {
        let mut lock = self.lock_file()?;
        let _guard = lock.write().map_err(io_error("lock", &self.lock_path))?;
        self.write_document(document)
    }

    fn update(
        &self,
        apply: &mut dyn FnMut(&mut LedgerDocument) -> bool,
    ) -> LedgerResult<LedgerDocument> {
        let mut lock = self.lock_file()?;
        let _guard = lock.write().map_err(io_error("lock", &self.lock_path))?;

        let mut document = self.load()?;
        if apply(&mut document) {
            self.write_document(&document)?;
        }
        Ok(document)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

fn io_error(operation: &'static str, path: &Path) -> impl FnOnce(std::io::Error) -> LedgerError {
    let path = path.display().to_string();
    move |source| LedgerError::Io {
        operation,
        path,
        source,
    }
}

#[cfg(unix)]
fn sync_parent_dir(path: &Path) -> std::io::Result<()> {
    match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(parent) => File::open(parent)?.sync_all(),
        None => File::open(".")?.sync_all(),
    }
}

#[cfg(not(unix))]
fn sync_parent_dir(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

/// In-process ledger store
#[derive(Debug, Default)]
pub struct MemoryStore {
    document: Mutex<LedgerDocument>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

impl LedgerStore for MemoryStore {
    fn load(&self) -> LedgerResult<LedgerDocument> {
        let guard = self.document.lock().map_err(|_| LedgerError::LockPoisoned)?;
        Ok(guard.clone())
    }

    fn persist(&self, document: &LedgerDocument) -> LedgerResult<()> {
        let mut guard = self.document.lock().map_err(|_| LedgerError::LockPoisoned)?;
        *guard = document.clone();
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::PublicationRecord;
    use tempfile::TempDir;

    fn sample_document() -> LedgerDocument {
        let mut document = LedgerDocument::default();
        let mut record = PublicationRecord::default();
        record.targets_done.insert("devto".to_string());
        record
            .locations
            .insert("devto".to_string(), "https://dev.to/x".to_string());
        document.published.insert(3, record);
        document
    }

    #[test]
    fn test_missing_file_is_empty_document() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path().join("status.json")).unwrap();
        assert!(store.load().unwrap().published.is_empty());
    }

    #[test]
    fn test_persist_and_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("logs").join("status.json");
        let store = JsonFileStore::new(&path).unwrap();

        store.persist(&sample_document()).unwrap();
        assert!(path.exists());

        let leftovers: Vec<_> = std::fs::read_dir(path.parent().unwrap())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|name| name.ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty(), "temp files left: {leftovers:?}");

        let reopened = JsonFileStore::new(&path).unwrap();
        let document = reopened.load().unwrap();
        assert_eq!(document, sample_document());
    }

    #[test]
    fn test_day_keys_are_strings_on_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("status.json");
        let store = JsonFileStore::new(&path).unwrap();
        store.persist(&sample_document()).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert!(value["published"]["3"]["targets_done"].is_array());
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("status.json");
        std::fs::write(&path, "{ not json").unwrap();

        let store = JsonFileStore::new(&path).unwrap();
        assert!(matches!(store.load(), Err(LedgerError::Corrupt { .. })));
    }

    #[test]
    fn test_update_persists_only_on_change() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("status.json");
        let store = JsonFileStore::new(&path).unwrap();

        let unchanged = store.update(&mut |_| false).unwrap();
        assert!(unchanged.published.is_empty());
        assert!(!path.exists());
        assert!(store.lock_path().exists());

        let updated = store
            .update(&mut |document| {
                *document = sample_document();
                true
            })
            .unwrap();
        assert_eq!(updated, sample_document());
        assert_eq!(store.load().unwrap(), sample_document());
    }

    #[test]
    fn test_memory_store_roundtrip() {
        let store = MemoryStore::new();
        store.persist(&sample_document()).unwrap();
        assert_eq!(store.load().unwrap(), sample_document());
        assert_eq!(store.describe(), "memory");
    }
}
