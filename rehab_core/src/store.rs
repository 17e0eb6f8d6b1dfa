//! Record store with all-or-nothing transactions.
//!
//! All records live in a single [`Tables`] snapshot. A transaction works on a
//! copy of the snapshot and only replaces the committed one when the closure
//! returns `Ok`, so a failure at any point leaves nothing behind.
//!
//! [`FileStore`] keeps the snapshot as JSON next to a lock file: readers take
//! a shared lock, writers an exclusive one for the whole load-modify-save
//! cycle, and commits go through a temp file that is fsynced and renamed over
//! the snapshot. Only writers create the directory and lock file; a reader
//! of a store nobody has written to sees empty tables. [`MemoryStore`] keeps
//! the snapshot behind a mutex.

use crate::{
    Error, Exercise, HistoryEntry, Questionnaire, Result, Schedule, Training, User,
};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::NamedTempFile;
use uuid::Uuid;

/// Every table the application persists
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Tables {
    #[serde(default)]
    pub users: BTreeMap<Uuid, User>,
    #[serde(default)]
    pub questionnaires: BTreeMap<Uuid, Questionnaire>,
    #[serde(default)]
    pub exercises: BTreeMap<String, Exercise>,
    #[serde(default)]
    pub schedules: BTreeMap<Uuid, Schedule>,
    #[serde(default)]
    pub trainings: BTreeMap<Uuid, Training>,
    #[serde(default)]
    pub history: BTreeMap<Uuid, HistoryEntry>,
}

impl Tables {
    pub fn user_by_name(&self, username: &str) -> Option<&User> {
        self.users.values().find(|u| u.username == username)
    }

    pub fn questionnaire_for_user(&self, user_id: Uuid) -> Option<&Questionnaire> {
        self.questionnaires.values().find(|q| q.user_id == user_id)
    }

    /// Schedule `id` if it exists and belongs to `user_id`
    pub fn owned_schedule(&self, id: Uuid, user_id: Uuid) -> Option<&Schedule> {
        self.schedules.get(&id).filter(|s| s.user_id == user_id)
    }

    /// Trainings of a schedule, ordered by date then time
    pub fn trainings_for_schedule(&self, schedule_id: Uuid) -> Vec<Training> {
        let mut trainings: Vec<_> = self
            .trainings
            .values()
            .filter(|t| t.schedule_id == schedule_id)
            .cloned()
            .collect();
        sort_trainings(&mut trainings);
        trainings
    }

    /// Insert a training, refusing dangling schedule references
    pub fn insert_training(&mut self, training: Training) -> Result<()> {
        if !self.schedules.contains_key(&training.schedule_id) {
            return Err(Error::Store(format!(
                "training {} references missing schedule {}",
                training.id, training.schedule_id
            )));
        }
        self.trainings.insert(training.id, training);
        Ok(())
    }

    /// Remove a schedule and every training it owns
    pub fn remove_schedule(&mut self, id: Uuid) -> Option<(Schedule, usize)> {
        let schedule = self.schedules.remove(&id)?;
        let before = self.trainings.len();
        self.trainings.retain(|_, t| t.schedule_id != id);
        Some((schedule, before - self.trainings.len()))
    }
}

/// Sort trainings by date, then time slot, then exercise
pub fn sort_trainings(trainings: &mut [Training]) {
    trainings.sort_by(|a, b| {
        (a.date, a.time.len(), &a.time, &a.exercise_id)
            .cmp(&(b.date, b.time.len(), &b.time, &b.exercise_id))
    });
}

/// Persistence boundary used by every operation
pub trait RecordStore {
    /// Run `f` against a consistent view of the tables
    fn read<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Tables) -> Result<T>;

    /// Run `f` against a working copy and commit it only if `f` succeeds
    fn transaction<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Tables) -> Result<T>;
}

// ============================================================================
// In-memory store
// ============================================================================

/// Store backed by a mutex-guarded snapshot
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tables(tables: Tables) -> Self {
        Self {
            tables: Mutex::new(tables),
        }
    }
}

impl RecordStore for MemoryStore {
    fn read<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Tables) -> Result<T>,
    {
        let tables = self
            .tables
            .lock()
            .map_err(|_| Error::Store("memory store lock poisoned".into()))?;
        f(&tables)
    }

    fn transaction<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Tables) -> Result<T>,
    {
        let mut tables = self
            .tables
            .lock()
            .map_err(|_| Error::Store("memory store lock poisoned".into()))?;
        let mut working = tables.clone();
        let value = f(&mut working)?;
        *tables = working;
        Ok(value)
    }
}

// ============================================================================
// File store
// ============================================================================

/// Store backed by a JSON snapshot file
#[derive(Clone, Debug)]
pub struct FileStore {
    path: PathBuf,
    lock_path: PathBuf,
}

impl FileStore {
    /// Open (lazily) the store at `path`; the file is created on first commit
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let lock_path = path.with_extension("lock");
        Self { path, lock_path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Open the lock file, creating it and its directory for writers only
    ///
    /// Returns `None` for a reader when no lock file exists yet.
    fn open_lock(&self, create: bool) -> Result<Option<File>> {
        if create {
            if let Some(parent) = self.lock_path.parent() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let opened = OpenOptions::new()
            .create(create)
            .read(true)
            .write(true)
            .open(&self.lock_path);

        match opened {
            Ok(file) => Ok(Some(file)),
            Err(e) if !create && e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Load the snapshot; a missing file is an empty store
    fn load(&self) -> Result<Tables> {
        if !self.path.exists() {
            tracing::debug!("No store file at {:?}, starting empty", self.path);
            return Ok(Tables::default());
        }

        let mut contents = String::new();
        File::open(&self.path)?.read_to_string(&mut contents)?;

        serde_json::from_str::<Tables>(&contents).map_err(|e| {
            tracing::warn!("Store file {:?} is corrupted: {}", self.path, e);
            Error::Json(e)
        })
    }

    /// Atomically replace the snapshot:
    /// 1. Write to a temp file in the same directory
    /// 2. Sync to disk
    /// 3. Rename over the original
    fn save(&self, tables: &Tables) -> Result<()> {
        let parent = self.path.parent().ok_or_else(|| {
            Error::Store(format!("store path {:?} has no parent", self.path))
        })?;
        std::fs::create_dir_all(parent)?;

        let temp = NamedTempFile::new_in(parent)?;
        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            serde_json::to_writer(&mut writer, tables)?;
            writer.flush()?;
        }
        temp.as_file().sync_all()?;
        temp.persist(&self.path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Committed store snapshot to {:?}", self.path);
        Ok(())
    }
}

impl RecordStore for FileStore {
    fn read<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Tables) -> Result<T>,
    {
        // No writer has run here yet; a missing snapshot reads as empty
        let Some(lock) = self.open_lock(false)? else {
            tracing::debug!("No lock file at {:?}, reading unlocked", self.lock_path);
            return self.load().and_then(|tables| f(&tables));
        };

        lock.lock_shared()?;
        let result = self.load().and_then(|tables| f(&tables));
        lock.unlock()?;
        result
    }

    fn transaction<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Tables) -> Result<T>,
    {
        let lock = self.open_lock(true)?.ok_or_else(|| {
            Error::Store(format!("could not open lock file {:?}", self.lock_path))
        })?;
        lock.lock_exclusive()?;

        let result = self.load().and_then(|mut tables| {
            let value = f(&mut tables)?;
            self.save(&tables)?;
            Ok(value)
        });

        if result.is_err() {
            tracing::debug!("Transaction on {:?} rolled back", self.path);
        }

        lock.unlock()?;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};

    fn schedule(user_id: Uuid) -> Schedule {
        Schedule {
            id: Uuid::new_v4(),
            user_id,
            questionnaire_id: Uuid::new_v4(),
            injury_type: "Neurology".into(),
            specific_injury: "Stroke".into(),
            generated_at: Utc::now(),
            is_active: true,
        }
    }

    fn training(schedule_id: Uuid, day: u32, time: &str) -> Training {
        Training {
            id: Uuid::new_v4(),
            schedule_id,
            exercise_id: "breathing_exercises".into(),
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            time: time.into(),
            is_completed: false,
            completed_at: None,
        }
    }

    #[test]
    fn test_file_store_commit_and_reload() {
        crate::logging::init_test();
        let temp_dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(temp_dir.path().join("rehab.json"));
        let s = schedule(Uuid::new_v4());
        let schedule_id = s.id;

        store
            .transaction(|tables| {
                tables.schedules.insert(s.id, s.clone());
                tables.insert_training(training(schedule_id, 7, "09:30"))
            })
            .unwrap();

        let reopened = FileStore::new(temp_dir.path().join("rehab.json"));
        let count = reopened
            .read(|tables| Ok(tables.trainings_for_schedule(schedule_id).len()))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_file_store_failed_transaction_writes_nothing() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("rehab.json");
        let store = FileStore::new(&path);

        store
            .transaction(|tables| {
                let s = schedule(Uuid::new_v4());
                tables.schedules.insert(s.id, s);
                Ok(())
            })
            .unwrap();
        let before = std::fs::read(&path).unwrap();

        let result: Result<()> = store.transaction(|tables| {
            let s = schedule(Uuid::new_v4());
            tables.schedules.insert(s.id, s);
            // Dangling reference aborts the whole batch
            tables.insert_training(training(Uuid::new_v4(), 7, "09:30"))
        });

        assert!(matches!(result, Err(Error::Store(_))));
        assert_eq!(std::fs::read(&path).unwrap(), before);
    }

    #[test]
    fn test_missing_file_reads_empty() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(temp_dir.path().join("nothing.json"));

        let users = store.read(|tables| Ok(tables.users.len())).unwrap();
        assert_eq!(users, 0);
    }

    #[test]
    fn test_read_has_no_filesystem_side_effects() {
        let temp_dir = tempfile::tempdir().unwrap();
        let data_dir = temp_dir.path().join("data");
        let store = FileStore::new(data_dir.join("rehab.json"));

        let users = store.read(|tables| Ok(tables.users.len())).unwrap();
        assert_eq!(users, 0);
        assert!(!data_dir.exists());

        store.transaction(|_| Ok(())).unwrap();
        assert!(data_dir.join("rehab.lock").exists());
        assert!(data_dir.join("rehab.json").exists());
    }

    #[test]
    fn test_corrupted_file_is_an_error() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("rehab.json");
        std::fs::write(&path, "{ invalid json }").unwrap();

        let store = FileStore::new(&path);
        let result = store.read(|tables| Ok(tables.users.len()));
        assert!(matches!(result, Err(Error::Json(_))));
    }

    #[test]
    fn test_atomic_save_leaves_no_temp_files() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(temp_dir.path().join("rehab.json"));

        store.transaction(|_| Ok(())).unwrap();

        let extras: Vec<_> = std::fs::read_dir(temp_dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name() != "rehab.json" && e.file_name() != "rehab.lock")
            .collect();
        assert!(extras.is_empty(), "unexpected files: {:?}", extras);
    }

    #[test]
    fn test_memory_store_rollback() {
        let store = MemoryStore::new();
        let result: Result<()> = store.transaction(|tables| {
            let s = schedule(Uuid::new_v4());
            tables.schedules.insert(s.id, s);
            Err(Error::Store("boom".into()))
        });

        assert!(result.is_err());
        let count = store.read(|tables| Ok(tables.schedules.len())).unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_remove_schedule_cascades() {
        let store = MemoryStore::new();
        let keep = schedule(Uuid::new_v4());
        let drop = schedule(keep.user_id);

        store
            .transaction(|tables| {
                tables.schedules.insert(keep.id, keep.clone());
                tables.schedules.insert(drop.id, drop.clone());
                tables.insert_training(training(keep.id, 7, "09:30"))?;
                tables.insert_training(training(drop.id, 7, "09:30"))?;
                tables.insert_training(training(drop.id, 14, "10:00"))
            })
            .unwrap();

        let removed = store
            .transaction(|tables| Ok(tables.remove_schedule(drop.id)))
            .unwrap();
        assert_eq!(removed.map(|(_, n)| n), Some(2));

        let remaining = store.read(|tables| Ok(tables.trainings.len())).unwrap();
        assert_eq!(remaining, 1);
    }

    #[test]
    fn test_trainings_sorted_by_date_and_time() {
        let mut tables = Tables::default();
        let s = schedule(Uuid::new_v4());
        tables.schedules.insert(s.id, s.clone());
        tables.insert_training(training(s.id, 14, "09:30")).unwrap();
        tables.insert_training(training(s.id, 7, "10:00")).unwrap();
        tables.insert_training(training(s.id, 7, "09:30")).unwrap();
        tables.insert_training(training(s.id, 7, "100:00")).unwrap();

        let times: Vec<_> = tables
            .trainings_for_schedule(s.id)
            .into_iter()
            .map(|t| (t.date.format("%d").to_string(), t.time))
            .collect();
        assert_eq!(
            times,
            vec![
                ("07".to_string(), "09:30".to_string()),
                ("07".to_string(), "10:00".to_string()),
                ("07".to_string(), "100:00".to_string()),
                ("14".to_string(), "09:30".to_string()),
            ]
        );
    }
}
