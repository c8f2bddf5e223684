//! Core Store implementation

use eyre::{Context, Result, bail};
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::{Filter, Record};

/// File-backed document store
pub struct Store {
    /// Base path for storage
    base_path: PathBuf,
}

impl Store {
    /// Open or create a store at the given path
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let base_path = path.as_ref().to_path_buf();
        fs::create_dir_all(&base_path).context("Failed to create store directory")?;
        debug!(?base_path, "Opened plan store");
        Ok(Self { base_path })
    }

    /// Base directory of this store
    pub fn path(&self) -> &Path {
        &self.base_path
    }

    /// Insert a new record, failing if the id is already taken
    pub fn create<T: Record>(&mut self, record: T) -> Result<String> {
        let id = record.id().to_string();
        debug!(%id, collection = T::collection_name(), "create: called");
        self.mutate::<T, _>(|records| {
            if records.iter().any(|r| r.id() == id) {
                bail!("Record already exists: {}", id);
            }
            records.push(record);
            Ok(())
        })?;
        info!(%id, collection = T::collection_name(), "Record created");
        Ok(id)
    }

    /// Fetch a record by id
    pub fn get<T: Record>(&self, id: &str) -> Result<Option<T>> {
        debug!(%id, collection = T::collection_name(), "get: called");
        let _lock = self.lock::<T>(false)?;
        Ok(self.load::<T>()?.into_iter().find(|r| r.id() == id))
    }

    /// Replace an existing record, failing if it does not exist
    pub fn update<T: Record>(&mut self, record: T) -> Result<()> {
        let id = record.id().to_string();
        debug!(%id, collection = T::collection_name(), "update: called");
        self.mutate::<T, _>(|records| match records.iter_mut().find(|r| r.id() == id) {
            Some(slot) => {
                *slot = record;
                Ok(())
            }
            None => bail!("Record not found: {}", id),
        })
    }

    /// Remove a record; returns whether anything was removed
    pub fn delete<T: Record>(&mut self, id: &str) -> Result<bool> {
        debug!(%id, collection = T::collection_name(), "delete: called");
        let mut removed = false;
        self.mutate::<T, _>(|records| {
            let before = records.len();
            records.retain(|r| r.id() != id);
            removed = records.len() != before;
            Ok(())
        })?;
        Ok(removed)
    }

    /// List records matching all filters, in insertion order
    pub fn list<T: Record>(&self, filters: &[Filter]) -> Result<Vec<T>> {
        debug!(filter_count = filters.len(), collection = T::collection_name(), "list: called");
        let _lock = self.lock::<T>(false)?;
        let records = self.load::<T>()?;
        Ok(records
            .into_iter()
            .filter(|r| {
                let fields = r.indexed_fields();
                filters.iter().all(|f| f.matches(&fields))
            })
            .collect())
    }

    fn collection_path<T: Record>(&self) -> PathBuf {
        self.base_path.join(format!("{}.jsonl", T::collection_name()))
    }

    fn lock<T: Record>(&self, exclusive: bool) -> Result<File> {
        let path = self.base_path.join(format!("{}.lock", T::collection_name()));
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .context(format!("Failed to open lock file {}", path.display()))?;
        if exclusive {
            file.lock_exclusive().context("Failed to take exclusive lock")?;
        } else {
            file.lock_shared().context("Failed to take shared lock")?;
        }
        Ok(file)
    }

    fn load<T: Record>(&self) -> Result<Vec<T>> {
        let path = self.collection_path::<T>();
        if !path.exists() {
            return Ok(Vec::new());
        }
        let reader = BufReader::new(File::open(&path).context("Failed to open collection")?);
        let mut records = Vec::new();
        for (lineno, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let record: T = serde_json::from_str(&line)
                .context(format!("Corrupt record at {}:{}", path.display(), lineno + 1))?;
            records.push(record);
        }
        Ok(records)
    }

    fn mutate<T: Record, F>(&mut self, f: F) -> Result<()>
    where
        F: FnOnce(&mut Vec<T>) -> Result<()>,
    {
        let lock = self.lock::<T>(true)?;
        let mut records = self.load::<T>()?;
        f(&mut records)?;

        let path = self.collection_path::<T>();
        let tmp = path.with_extension("jsonl.tmp");
        {
            let mut out = File::create(&tmp).context("Failed to create temp collection file")?;
            for record in &records {
                serde_json::to_writer(&mut out, record)?;
                out.write_all(b"\n")?;
            }
            out.sync_all()?;
        }
        fs::rename(&tmp, &path).context("Failed to replace collection file")?;
        lock.unlock()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Filter, IndexValue};
    use serde::{Deserialize, Serialize};
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Note {
        id: String,
        owner: String,
        body: String,
        updated: i64,
    }

    impl Record for Note {
        fn id(&self) -> &str {
            &self.id
        }

        fn updated_at(&self) -> i64 {
            self.updated
        }

        fn collection_name() -> &'static str {
            "notes"
        }

        fn indexed_fields(&self) -> HashMap<String, IndexValue> {
            let mut fields = HashMap::new();
            fields.insert("owner".to_string(), IndexValue::String(self.owner.clone()));
            fields
        }
    }

    fn note(id: &str, owner: &str) -> Note {
        Note {
            id: id.to_string(),
            owner: owner.to_string(),
            body: format!("body of {}", id),
            updated: 0,
        }
    }

    #[test]
    fn test_create_and_get() {
        let temp = TempDir::new().unwrap();
        let mut store = Store::open(temp.path()).unwrap();

        store.create(note("n1", "a")).unwrap();
        let fetched: Option<Note> = store.get("n1").unwrap();
        assert_eq!(fetched, Some(note("n1", "a")));

        let missing: Option<Note> = store.get("nope").unwrap();
        assert!(missing.is_none());
    }

    #[test]
    fn test_create_duplicate_fails() {
        let temp = TempDir::new().unwrap();
        let mut store = Store::open(temp.path()).unwrap();

        store.create(note("n1", "a")).unwrap();
        assert!(store.create(note("n1", "b")).is_err());
    }

    #[test]
    fn test_update_and_delete() {
        let temp = TempDir::new().unwrap();
        let mut store = Store::open(temp.path()).unwrap();
        store.create(note("n1", "a")).unwrap();

        let mut changed = note("n1", "a");
        changed.body = "edited".to_string();
        store.update(changed.clone()).unwrap();
        assert_eq!(store.get::<Note>("n1").unwrap(), Some(changed));

        assert!(store.update(note("ghost", "a")).is_err());

        assert!(store.delete::<Note>("n1").unwrap());
        assert!(!store.delete::<Note>("n1").unwrap());
        assert!(store.get::<Note>("n1").unwrap().is_none());
    }

    #[test]
    fn test_list_with_filter() {
        let temp = TempDir::new().unwrap();
        let mut store = Store::open(temp.path()).unwrap();
        store.create(note("n1", "a")).unwrap();
        store.create(note("n2", "b")).unwrap();
        store.create(note("n3", "a")).unwrap();

        let all: Vec<Note> = store.list(&[]).unwrap();
        assert_eq!(all.len(), 3);

        let mine: Vec<Note> = store
            .list(&[Filter::eq("owner", IndexValue::String("a".to_string()))])
            .unwrap();
        let ids: Vec<_> = mine.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["n1", "n3"]);
    }

    #[test]
    fn test_reopen_persists() {
        let temp = TempDir::new().unwrap();
        {
            let mut store = Store::open(temp.path()).unwrap();
            store.create(note("n1", "a")).unwrap();
        }
        let store = Store::open(temp.path()).unwrap();
        assert!(store.get::<Note>("n1").unwrap().is_some());
    }
}
