//! Storage layer for the time-block tracker.
//!
//! Events are persisted as one JSON file per calendar date, named
//! `YYYY-MM-DD.json`. Each file holds the complete collection of records for
//! that date; every mutation rewrites the whole file.
//!
//! # Layout
//!
//! An [`EventStore`] has a primary directory and an optional legacy
//! directory. Reads check the primary directory first and fall back to the
//! legacy one; writes always go to the primary directory. Data written by an
//! older layout therefore migrates lazily, one date at a time, the first time
//! that date is saved. There is no background sweep.
//!
//! # File Format
//!
//! The canonical shape is a top-level array of records:
//!
//! ```json
//! [
//!   {
//!     "id": "67e55044-10b1-426f-9247-bb680e5fe0c8",
//!     "title": "Lecture",
//!     "start": "09:00",
//!     "end": "10:30",
//!     "tag": "Study",
//!     "description": ""
//!   }
//! ]
//! ```
//!
//! An object wrapping that array under `"events"` is accepted on read and
//! never written. Records missing a valid `id` are given one on load, and the
//! migrated collection is saved back immediately so identities stay stable.
//!
//! # Thread Safety
//!
//! The store holds no locks and no cache. Callers must serialize mutations
//! against the same date; concurrent writers from different processes are
//! last-writer-wins. Writes are atomic (temp file + rename), so a reader
//! never observes a partially written file.

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde_json::{Map, Value};
use tempfile::NamedTempFile;
use thiserror::Error;

use tb_core::{ClockTime, EventDraft, EventId, EventRecord, PartitionSource};

/// File extension for date partitions.
pub const PARTITION_EXTENSION: &str = "json";

/// Field holding the record array in the legacy object shape.
const LEGACY_EVENTS_FIELD: &str = "events";

/// Storage errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No record with this identity exists on the given date.
    #[error("event {id} not found on {date}")]
    NotFound { date: NaiveDate, id: EventId },
    /// The partition file is not valid JSON or has an unexpected shape.
    #[error("corrupt partition {}: {reason}", path.display())]
    CorruptData { path: PathBuf, reason: String },
    /// The partition file exists but could not be read.
    #[error("failed to read {}", path.display())]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// Writing or committing the partition failed. The previous file is intact.
    #[error("failed to write {}", path.display())]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Per-date event storage rooted at a primary and an optional legacy directory.
#[derive(Debug, Clone)]
pub struct EventStore {
    primary: PathBuf,
    legacy: Option<PathBuf>,
}

impl EventStore {
    /// Creates a store. Nothing is touched on disk until the first write.
    pub fn new(primary: impl Into<PathBuf>, legacy: Option<PathBuf>) -> Self {
        Self {
            primary: primary.into(),
            legacy,
        }
    }

    /// The directory all writes go to.
    #[must_use]
    pub fn primary_dir(&self) -> &Path {
        &self.primary
    }

    /// The read-only fallback directory, if any.
    #[must_use]
    pub fn legacy_dir(&self) -> Option<&Path> {
        self.legacy.as_deref()
    }

    /// Path a date is written to.
    #[must_use]
    pub fn partition_path(&self, date: NaiveDate) -> PathBuf {
        self.primary.join(file_name(date))
    }

    /// Path a date is read from: primary if present, else legacy, else `None`.
    ///
    /// A path whose existence cannot be checked (permissions, a file where a
    /// directory should be) is a `ReadFailed`, not a reason to fall back.
    pub fn resolve(&self, date: NaiveDate) -> Result<Option<PathBuf>, StoreError> {
        let primary = self.partition_path(date);
        if path_exists(&primary)? {
            return Ok(Some(primary));
        }
        match &self.legacy {
            Some(dir) => {
                let path = dir.join(file_name(date));
                Ok(path_exists(&path)?.then_some(path))
            }
            None => Ok(None),
        }
    }

    /// Loads every record stored for `date`.
    ///
    /// A date without a file (or with an empty file) yields an empty `Vec`.
    /// Records without a valid identity are assigned one and the collection
    /// is written back to the primary directory before returning. If that
    /// write fails the records are still returned and a warning is logged;
    /// `create`, `update` and `delete` report it as `WriteFailed` instead.
    pub fn load_partition(&self, date: NaiveDate) -> Result<Vec<EventRecord>, StoreError> {
        self.load(date, MigrationSave::Tolerate)
    }

    fn load(&self, date: NaiveDate, migration: MigrationSave) -> Result<Vec<EventRecord>, StoreError> {
        let Some(path) = self.resolve(date)? else {
            return Ok(Vec::new());
        };

        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => return Err(StoreError::ReadFailed { path, source }),
        };

        let decoded = decode_partition(&bytes, &path)?;
        tracing::debug!(
            path = %path.display(),
            records = decoded.records.len(),
            "loaded partition"
        );

        if decoded.migrated > 0 {
            tracing::info!(
                %date,
                path = %path.display(),
                migrated = decoded.migrated,
                "assigned identities to legacy records"
            );
            if let Err(e) = self.save_partition(date, &decoded.records) {
                if migration == MigrationSave::Require {
                    return Err(e);
                }
                tracing::warn!(
                    %date,
                    error = %e,
                    "failed to persist migrated identities"
                );
            }
        }

        Ok(decoded.records)
    }

    /// Replaces the whole collection stored for `date`.
    pub fn save_partition(&self, date: NaiveDate, records: &[EventRecord]) -> Result<(), StoreError> {
        let path = self.partition_path(date);
        let write_failed = |source| StoreError::WriteFailed {
            path: path.clone(),
            source,
        };

        fs::create_dir_all(&self.primary).map_err(write_failed)?;
        let json = serde_json::to_vec_pretty(records).map_err(|e| write_failed(io::Error::other(e)))?;
        write_atomic(&path, &json).map_err(write_failed)?;

        tracing::debug!(path = %path.display(), records = records.len(), "saved partition");
        Ok(())
    }

    /// Looks up one record by identity.
    pub fn find(&self, date: NaiveDate, id: &EventId) -> Result<EventRecord, StoreError> {
        self.load(date, MigrationSave::Require)?
            .into_iter()
            .find(|r| r.id == *id)
            .ok_or(StoreError::NotFound { date, id: *id })
    }

    /// Appends a new record with a fresh identity.
    pub fn create(&self, date: NaiveDate, draft: EventDraft) -> Result<EventRecord, StoreError> {
        let mut records = self.load(date, MigrationSave::Require)?;
        let record = draft.into_record(EventId::new());
        records.push(record.clone());
        self.save_partition(date, &records)?;
        tracing::debug!(%date, id = %record.id, "created event");
        Ok(record)
    }

    /// Overwrites the record with the same identity, in place.
    pub fn update(&self, date: NaiveDate, record: &EventRecord) -> Result<(), StoreError> {
        let mut records = self.load(date, MigrationSave::Require)?;
        let slot = records
            .iter_mut()
            .find(|r| r.id == record.id)
            .ok_or(StoreError::NotFound {
                date,
                id: record.id,
            })?;
        *slot = record.clone();
        self.save_partition(date, &records)?;
        tracing::debug!(%date, id = %record.id, "updated event");
        Ok(())
    }

    /// Removes the record with this identity and returns it.
    pub fn delete(&self, date: NaiveDate, id: &EventId) -> Result<EventRecord, StoreError> {
        let mut records = self.load(date, MigrationSave::Require)?;
        let index = records
            .iter()
            .position(|r| r.id == *id)
            .ok_or(StoreError::NotFound { date, id: *id })?;
        let removed = records.remove(index);
        self.save_partition(date, &records)?;
        tracing::debug!(%date, %id, "deleted event");
        Ok(removed)
    }
}

impl PartitionSource for EventStore {
    type Error = StoreError;

    fn load_partition(&self, date: NaiveDate) -> Result<Vec<EventRecord>, Self::Error> {
        Self::load_partition(self, date)
    }
}

/// Whether a failed save of migrated identities fails the load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MigrationSave {
    /// Log and return the migrated records. Fine for reads.
    Tolerate,
    /// Return the `WriteFailed`. Mutations must not act on identities that
    /// were never stored.
    Require,
}

fn path_exists(path: &Path) -> Result<bool, StoreError> {
    path.try_exists().map_err(|source| StoreError::ReadFailed {
        path: path.to_path_buf(),
        source,
    })
}

fn file_name(date: NaiveDate) -> String {
    format!("{}.{PARTITION_EXTENSION}", date.format("%Y-%m-%d"))
}

/// Records decoded from one partition file.
struct DecodedPartition {
    records: Vec<EventRecord>,
    /// Records that were given a new identity.
    migrated: usize,
}

fn decode_partition(bytes: &[u8], path: &Path) -> Result<DecodedPartition, StoreError> {
    let corrupt = |reason: String| StoreError::CorruptData {
        path: path.to_path_buf(),
        reason,
    };

    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(DecodedPartition {
            records: Vec::new(),
            migrated: 0,
        });
    }

    let items = match serde_json::from_slice::<Value>(bytes).map_err(|e| corrupt(e.to_string()))? {
        Value::Array(items) => items,
        Value::Object(mut obj) => match obj.remove(LEGACY_EVENTS_FIELD) {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(corrupt(format!(
                    "object has no \"{LEGACY_EVENTS_FIELD}\" array"
                )));
            }
        },
        _ => return Err(corrupt("expected an array of events".to_string())),
    };

    let mut records = Vec::with_capacity(items.len());
    let mut seen = HashSet::with_capacity(items.len());
    let mut migrated = 0;

    for (index, item) in items.into_iter().enumerate() {
        let Value::Object(obj) = item else {
            tracing::warn!(path = %path.display(), index, "dropping non-object entry");
            continue;
        };
        let (mut record, mut fresh) = decode_record(&obj, path);
        if !fresh && seen.contains(&record.id) {
            tracing::warn!(
                path = %path.display(),
                id = %record.id,
                "duplicate event ID, assigning a new one"
            );
            record.id = EventId::new();
            fresh = true;
        }
        if fresh {
            migrated += 1;
        }
        seen.insert(record.id);
        records.push(record);
    }

    Ok(DecodedPartition { records, migrated })
}

/// Builds a record from a JSON object, returning whether its identity is new.
fn decode_record(obj: &Map<String, Value>, path: &Path) -> (EventRecord, bool) {
    let (id, fresh) = match obj.get("id").and_then(Value::as_str) {
        Some(raw) => match raw.parse::<EventId>() {
            Ok(id) => (id, false),
            Err(_) => {
                // The unparseable value is gone for good after the next save.
                tracing::warn!(
                    path = %path.display(),
                    discarded_id = raw,
                    "replacing invalid event ID"
                );
                (EventId::new(), true)
            }
        },
        None => (EventId::new(), true),
    };

    let record = EventRecord {
        id,
        title: text_field(obj, "title"),
        start: ClockTime::raw(text_field(obj, "start")),
        end: ClockTime::raw(text_field(obj, "end")),
        tag: text_field(obj, "tag"),
        description: text_field(obj, "description"),
    };
    (record, fresh)
}

/// String value of `key`, or empty if missing or not a string.
fn text_field(obj: &Map<String, Value>, key: &str) -> String {
    obj.get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Replaces `path` with `bytes` so that readers see either the old or the
/// new content, never a mix.
fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    write_atomic_with(path, |file| file.write_all(bytes))
}

/// Writes through `fill` into a temp file next to `path`, syncs it, then
/// renames it over `path`. On any error the temp file is removed and `path`
/// is left as it was.
fn write_atomic_with<F>(path: &Path, fill: F) -> io::Result<()>
where
    F: FnOnce(&mut File) -> io::Result<()>,
{
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = tempfile::Builder::new()
        .prefix(".tb-")
        .suffix(".tmp")
        .tempfile_in(dir)?;

    fill(tmp.as_file_mut())?;
    tmp.as_file().sync_all()?;
    persist(tmp, path)?;

    #[cfg(unix)]
    {
        // Make the rename itself durable.
        if let Err(e) = File::open(dir).and_then(|d| d.sync_all()) {
            tracing::debug!(dir = %dir.display(), error = %e, "directory sync failed");
        }
    }
    Ok(())
}

fn persist(tmp: NamedTempFile, path: &Path) -> io::Result<()> {
    tmp.persist(path).map(drop).map_err(|e| e.error)
}
