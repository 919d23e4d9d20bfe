//! # Record Store
//!
//! [`RecordStore`] is the persistence contract both engines are written
//! against. [`JsonStore`] implements it over a single pretty-printed JSON
//! file (`{"<collection>": [ ... ]}`), or purely in memory for tests.
//!
//! All operations are synchronous. The lock is a `parking_lot::RwLock` and is
//! never held across an `.await`; callers in async handlers invoke the store
//! directly between awaits.
//!
//! ## Write Ordering
//!
//! A mutation is staged under the write guard, persisted by writing a
//! sibling temp file and renaming it over the store file, and only then
//! committed to the in-memory view. If persistence fails the staged record is
//! dropped, so readers never observe a record that is not on disk.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::StoreError;
use crate::record::Record;

/// Result of [`RecordStore::insert_if_absent`].
#[derive(Debug, Clone, PartialEq)]
pub enum Insertion<R> {
    /// No record with this id existed; the given record was stored.
    Inserted(R),
    /// A record with this id already existed and is returned unchanged.
    Existing(R),
}

impl<R> Insertion<R> {
    /// True if this call stored a new record.
    pub fn is_inserted(&self) -> bool {
        matches!(self, Self::Inserted(_))
    }

    /// The stored record, whichever branch was taken.
    pub fn into_inner(self) -> R {
        match self {
            Self::Inserted(r) | Self::Existing(r) => r,
        }
    }
}

/// Persistence contract for one record collection.
///
/// Object-safe, so engines hold an `Arc<dyn RecordStore<R>>`.
pub trait RecordStore<R: Record>: Send + Sync {
    /// The most recently stored record with this id, if any.
    fn get(&self, id: &str) -> Result<Option<R>, StoreError>;

    /// Append a record. Ids need not be unique.
    fn put(&self, record: R) -> Result<(), StoreError>;

    /// Atomically store `record` unless a record with the same id exists.
    ///
    /// The existence check and the write happen under one exclusive guard,
    /// so concurrent callers with the same id see exactly one `Inserted`.
    fn insert_if_absent(&self, record: R) -> Result<Insertion<R>, StoreError>;

    /// All records in insertion order.
    fn list(&self) -> Result<Vec<R>, StoreError>;
}

struct Inner<R> {
    records: Vec<R>,
    /// id -> index of the latest record with that id.
    latest: HashMap<String, usize>,
}

impl<R: Record> Inner<R> {
    fn from_records(records: Vec<R>) -> Self {
        let latest = records
            .iter()
            .enumerate()
            .map(|(i, r)| (r.record_id().to_string(), i))
            .collect();
        Self { records, latest }
    }

    fn lookup(&self, id: &str) -> Option<&R> {
        self.latest.get(id).and_then(|&i| self.records.get(i))
    }
}

/// JSON-file backed [`RecordStore`].
pub struct JsonStore<R> {
    collection: &'static str,
    path: Option<PathBuf>,
    inner: RwLock<Inner<R>>,
}

impl<R> std::fmt::Debug for JsonStore<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonStore")
            .field("collection", &self.collection)
            .field("path", &self.path)
            .field("len", &self.inner.read().records.len())
            .finish()
    }
}

impl<R> JsonStore<R>
where
    R: Record + Serialize + DeserializeOwned,
{
    /// A store that never touches disk.
    pub fn in_memory(collection: &'static str) -> Self {
        Self {
            collection,
            path: None,
            inner: RwLock::new(Inner::from_records(Vec::new())),
        }
    }

    /// Open (or create) the store file at `path`.
    ///
    /// The parent directory is created if missing. An existing file that does
    /// not parse is reported as [`StoreError::Corrupt`] and left untouched.
    pub fn open(path: impl Into<PathBuf>, collection: &'static str) -> Result<Self, StoreError> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: parent.display().to_string(),
                source,
            })?;
        }

        let records = if path.exists() {
            Self::load(&path, collection)?
        } else {
            Vec::new()
        };

        tracing::info!(
            path = %path.display(),
            collection,
            records = records.len(),
            "opened record store"
        );

        Ok(Self {
            collection,
            path: Some(path),
            inner: RwLock::new(Inner::from_records(records)),
        })
    }

    /// Backing file, if persistent.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.inner.read().records.len()
    }

    /// True if no records are stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn load(path: &Path, collection: &'static str) -> Result<Vec<R>, StoreError> {
        let raw = fs::read_to_string(path).map_err(|source| StoreError::Io {
            path: path.display().to_string(),
            source,
        })?;
        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }

        let mut doc: HashMap<String, Vec<R>> =
            serde_json::from_str(&raw).map_err(|e| StoreError::Corrupt {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
        Ok(doc.remove(collection).unwrap_or_default())
    }

    /// Write `records` to the backing file via temp file and rename.
    fn persist(&self, records: &[R]) -> Result<(), StoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let mut doc = BTreeMap::new();
        doc.insert(self.collection, records);
        let bytes = serde_json::to_vec_pretty(&doc).map_err(|source| StoreError::Serialization {
            collection: self.collection,
            source,
        })?;

        let tmp = path.with_extension("json.tmp");
        let io_err = |p: &Path, source: std::io::Error| StoreError::Io {
            path: p.display().to_string(),
            source,
        };
        if let Err(source) = fs::write(&tmp, &bytes) {
            let _ = fs::remove_file(&tmp);
            return Err(io_err(tmp.as_path(), source));
        }
        if let Err(source) = fs::rename(&tmp, path) {
            let _ = fs::remove_file(&tmp);
            return Err(io_err(path.as_path(), source));
        }
        Ok(())
    }

    /// Stage `record`, persist, and commit. Caller holds the write guard.
    fn append_locked(&self, inner: &mut Inner<R>, record: R) -> Result<(), StoreError> {
        inner.records.push(record);
        if let Err(e) = self.persist(&inner.records) {
            inner.records.pop();
            tracing::error!(collection = self.collection, error = %e, "store write failed");
            return Err(e);
        }
        let idx = inner.records.len() - 1;
        let id = inner.records[idx].record_id().to_string();
        inner.latest.insert(id, idx);
        Ok(())
    }
}

impl<R> RecordStore<R> for JsonStore<R>
where
    R: Record + Serialize + DeserializeOwned,
{
    fn get(&self, id: &str) -> Result<Option<R>, StoreError> {
        Ok(self.inner.read().lookup(id).cloned())
    }

    fn put(&self, record: R) -> Result<(), StoreError> {
        let mut inner = self.inner.write();
        self.append_locked(&mut inner, record)
    }

    fn insert_if_absent(&self, record: R) -> Result<Insertion<R>, StoreError> {
        let mut inner = self.inner.write();
        if let Some(existing) = inner.lookup(record.record_id()) {
            return Ok(Insertion::Existing(existing.clone()));
        }
        self.append_locked(&mut inner, record.clone())?;
        Ok(Insertion::Inserted(record))
    }

    fn list(&self) -> Result<Vec<R>, StoreError> {
        Ok(self.inner.read().records.clone())
    }
}
