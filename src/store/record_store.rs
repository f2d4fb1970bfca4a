use chrono::{DateTime, Duration as ChronoDuration, Utc};
use fs2::FileExt;
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::NamedTempFile;

use super::{QuestionRecord, Store, Transition};
use crate::errors::StoreError;

/// File name of the store document inside the data directory.
pub const STORE_FILE_NAME: &str = "questions.json";

/// Appended to the store path to name the writers' lock file.
const LOCK_SUFFIX: &str = ".lock";

/// Load-mutate-save attempts before a contended update gives up.
const MAX_UPDATE_ATTEMPTS: u32 = 50;

/// Base pause between attempts; grows linearly with the attempt number.
const RETRY_BACKOFF: Duration = Duration::from_millis(5);

/// Handle on the persisted question store.
///
/// Every operation is a full load or a full load-mutate-save cycle against
/// the file; nothing is cached between calls, so several processes can hold
/// a `RecordStore` for the same path. Saves replace the file atomically via
/// a temp file in the same directory and a rename, so readers never take a
/// lock and never see a partial document.
///
/// Saves are compare-and-swap on `metadata.lastUpdated`: a save is refused
/// with [`StoreError::Conflict`] when the file on disk no longer carries the
/// stamp the caller loaded. The check and the rename run under an exclusive
/// lock on `<store>.lock`, held only for that step. [`RecordStore::insert`]
/// and [`RecordStore::upsert_by_id`] retry the whole cycle on conflict.
#[derive(Debug, Clone)]
pub struct RecordStore {
    path: PathBuf,
}

/// Exclusive writer lock, released on drop.
struct WriteLock(File);

impl Drop for WriteLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.0);
    }
}

impl RecordStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store located in `data_dir` under the default file name.
    pub fn in_dir(data_dir: &Path) -> Self {
        Self::new(data_dir.join(STORE_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the store, creating an empty one if the file does not exist yet.
    pub fn load(&self) -> Result<Store, StoreError> {
        match self.read_existing()? {
            Some(store) => Ok(store),
            None => self.create_empty(),
        }
    }

    /// Replace the persisted document with `store`.
    ///
    /// Fails with [`StoreError::Conflict`] if another writer saved since
    /// `store` was loaded. On success `lastUpdated` is advanced and written
    /// back into `store`, so the same value can be saved again.
    pub fn save(&self, store: &mut Store) -> Result<(), StoreError> {
        let _lock = self.lock()?;

        let expected = store.metadata.last_updated;
        if let Some(current) = self.read_existing()? {
            if current.metadata.last_updated != expected {
                return Err(StoreError::Conflict {
                    path: self.path.clone(),
                });
            }
        }

        store.metadata.last_updated = next_stamp(expected);
        let tmp = self.write_temp(store)?;
        tmp.persist(&self.path)
            .map_err(|e| StoreError::io(&self.path, e.error))?;
        Ok(())
    }

    /// Append a new record and save.
    pub fn insert(&self, record: QuestionRecord) -> Result<(), StoreError> {
        self.update(|store| store.insert(record.clone()))
    }

    /// Load, run `mutator` on the record with `id`, and save.
    ///
    /// Nothing is written when the record is missing or the mutator returns
    /// an error. If another writer got in first the cycle starts over from a
    /// fresh load, so `mutator` may run more than once. Returns the record as
    /// saved.
    pub fn upsert_by_id<F>(&self, id: &str, mut mutator: F) -> Result<QuestionRecord, StoreError>
    where
        F: FnMut(&mut QuestionRecord) -> Result<(), StoreError>,
    {
        self.update(|store| {
            let record = store
                .get_mut(id)
                .ok_or_else(|| StoreError::RecordNotFound { id: id.to_string() })?;
            mutator(record)?;
            Ok(record.clone())
        })
    }

    /// Move the record with `id` through `transition`.
    pub fn transition(
        &self,
        id: &str,
        transition: Transition,
    ) -> Result<QuestionRecord, StoreError> {
        self.upsert_by_id(id, |record| record.apply(transition.clone(), Utc::now()))
    }

    /// Load-mutate-save, restarting when the save loses a race.
    fn update<T, F>(&self, mut mutate: F) -> Result<T, StoreError>
    where
        F: FnMut(&mut Store) -> Result<T, StoreError>,
    {
        let mut attempt = 1;
        loop {
            let mut store = self.load()?;
            let value = mutate(&mut store)?;
            match self.save(&mut store) {
                Err(StoreError::Conflict { .. }) if attempt < MAX_UPDATE_ATTEMPTS => {
                    tracing::debug!(
                        attempt,
                        path = %self.path.display(),
                        "Question store changed during update, retrying"
                    );
                    std::thread::sleep(RETRY_BACKOFF * attempt);
                    attempt += 1;
                }
                result => return result.map(|()| value),
            }
        }
    }

    /// Current document, or `None` when there is no file yet.
    fn read_existing(&self) -> Result<Option<Store>, StoreError> {
        match fs::read_to_string(&self.path) {
            Ok(content) => self.parse(&content).map(Some),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::io(&self.path, e)),
        }
    }

    fn parse(&self, content: &str) -> Result<Store, StoreError> {
        serde_json::from_str(content).map_err(|source| StoreError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    /// Persist a fresh store without clobbering one another process may have
    /// created in the meantime; in that case the winner's file is read back.
    fn create_empty(&self) -> Result<Store, StoreError> {
        let store = Store::default();
        let tmp = self.write_temp(&store)?;
        match tmp.persist_noclobber(&self.path) {
            Ok(_) => {
                tracing::debug!(path = %self.path.display(), "Created empty question store");
                Ok(store)
            }
            Err(e) if e.error.kind() == ErrorKind::AlreadyExists => {
                let content = fs::read_to_string(&self.path)
                    .map_err(|e| StoreError::io(&self.path, e))?;
                self.parse(&content)
            }
            Err(e) => Err(StoreError::io(&self.path, e.error)),
        }
    }

    fn lock_path(&self) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push(LOCK_SUFFIX);
        PathBuf::from(name)
    }

    fn lock(&self) -> Result<WriteLock, StoreError> {
        let path = self.lock_path();
        if let Some(dir) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|e| StoreError::io(dir, e))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .map_err(|e| StoreError::io(&path, e))?;
        file.lock_exclusive()
            .map_err(|e| StoreError::io(&path, e))?;
        Ok(WriteLock(file))
    }

    fn write_temp(&self, store: &Store) -> Result<NamedTempFile, StoreError> {
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(dir).map_err(|e| StoreError::io(dir, e))?;

        let json = serde_json::to_string_pretty(store).map_err(StoreError::Serialize)?;
        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| StoreError::io(dir, e))?;
        tmp.write_all(json.as_bytes())
            .and_then(|_| tmp.as_file().sync_all())
            .map_err(|e| StoreError::io(tmp.path(), e))?;
        Ok(tmp)
    }
}

/// A stamp strictly after `previous`, so every save changes the CAS token.
fn next_stamp(previous: DateTime<Utc>) -> DateTime<Utc> {
    let now = Utc::now();
    if now > previous {
        now
    } else {
        previous + ChronoDuration::nanoseconds(1)
    }
}
