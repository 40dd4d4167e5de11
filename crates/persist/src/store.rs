//! File-backed level store.
//!
//! Layout inside the store directory:
//! ```text
//! store.meta.json        - schema version
//! levels/
//!   <sha256(key)>.json   - one entry per saved level
//! ```
//!
//! Keys are `minegame:levels:<name>`. Each entry file repeats its key so a lookup
//! can confirm it read the record it asked for.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use minegame_common::{SessionSettings, WorldSeed};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Namespace prefix for level keys.
pub const SAVE_PREFIX: &str = "minegame:levels:";

const STORE_SCHEMA_VERSION: u32 = 1;
const LEVELS_DIR: &str = "levels";
const META_FILE: &str = "store.meta.json";

/// Errors from file-backed persistence operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("schema version mismatch: file has v{file_version}, expected v{expected_version}")]
    SchemaMismatch {
        file_version: u32,
        expected_version: u32,
    },
    #[error("entry {file} holds key {actual:?}, expected {expected:?}")]
    KeyMismatch {
        file: String,
        expected: String,
        actual: String,
    },
}

/// A saved level. Only enough to regenerate the world from scratch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelRecord {
    pub name: String,
    pub seed: i64,
    /// Milliseconds since the Unix epoch.
    #[serde(rename = "savedAt")]
    pub saved_at: u64,
}

impl LevelRecord {
    pub fn new(name: impl Into<String>, seed: WorldSeed, saved_at: u64) -> Self {
        Self {
            name: name.into(),
            seed: seed.value(),
            saved_at,
        }
    }

    /// A record stamped with the current wall-clock time.
    pub fn now(name: impl Into<String>, seed: WorldSeed) -> Self {
        Self::new(name, seed, now_millis())
    }

    pub fn world_seed(&self) -> WorldSeed {
        WorldSeed(self.seed)
    }

    /// Settings to start a session that regenerates this level.
    pub fn settings(&self) -> SessionSettings {
        SessionSettings {
            name: self.name.clone(),
            seed: self.world_seed(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoreMeta {
    schema_version: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredEntry {
    key: String,
    record: LevelRecord,
}

/// Key-value store of level records, one JSON file per key.
pub struct LevelStore {
    root: PathBuf,
}

impl LevelStore {
    /// Open or create a level store at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let root = path.as_ref().to_path_buf();
        std::fs::create_dir_all(root.join(LEVELS_DIR))?;

        let meta_path = root.join(META_FILE);
        if meta_path.exists() {
            let meta: StoreMeta = serde_json::from_reader(std::fs::File::open(&meta_path)?)?;
            if meta.schema_version != STORE_SCHEMA_VERSION {
                return Err(StoreError::SchemaMismatch {
                    file_version: meta.schema_version,
                    expected_version: STORE_SCHEMA_VERSION,
                });
            }
        } else {
            let meta = StoreMeta {
                schema_version: STORE_SCHEMA_VERSION,
            };
            serde_json::to_writer_pretty(std::fs::File::create(&meta_path)?, &meta)?;
        }

        tracing::debug!(root = %root.display(), "level store opened");
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Storage key for a level name.
    pub fn key_for(name: &str) -> String {
        format!("{SAVE_PREFIX}{name}")
    }

    /// Write (or overwrite) the record under its name's key.
    pub fn save(&self, record: &LevelRecord) -> Result<(), StoreError> {
        let key = Self::key_for(&record.name);
        let path = self.entry_path(&key);
        let entry = StoredEntry {
            key,
            record: record.clone(),
        };

        // write-then-rename so a crash never leaves a torn entry
        let tmp = path.with_extension("json.tmp");
        if let Err(e) = write_then_rename(&tmp, &path, &entry) {
            let _ = std::fs::remove_file(&tmp);
            return Err(e);
        }

        tracing::info!(name = %record.name, seed = record.seed, "level saved");
        Ok(())
    }

    /// Read the record saved under `name`, if any.
    pub fn load(&self, name: &str) -> Result<Option<LevelRecord>, StoreError> {
        let key = Self::key_for(name);
        let path = self.entry_path(&key);
        if !path.exists() {
            return Ok(None);
        }
        let entry: StoredEntry = serde_json::from_reader(std::fs::File::open(&path)?)?;
        if entry.key != key {
            return Err(StoreError::KeyMismatch {
                file: path.display().to_string(),
                expected: key,
                actual: entry.key,
            });
        }
        Ok(Some(entry.record))
    }

    /// All saved levels, most recent first. Unreadable entries are skipped.
    pub fn list(&self) -> Result<Vec<LevelRecord>, StoreError> {
        let mut records = Vec::new();
        for dir_entry in std::fs::read_dir(self.root.join(LEVELS_DIR))? {
            let path = dir_entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let parsed = std::fs::File::open(&path)
                .map_err(StoreError::from)
                .and_then(|f| serde_json::from_reader::<_, StoredEntry>(f).map_err(StoreError::from));
            match parsed {
                Ok(entry) if entry.key.starts_with(SAVE_PREFIX) => records.push(entry.record),
                Ok(_) => {}
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "skipping unreadable level entry"),
            }
        }
        records.sort_by(|a, b| b.saved_at.cmp(&a.saved_at).then_with(|| a.name.cmp(&b.name)));
        Ok(records)
    }

    /// Remove a saved level. Returns whether it existed.
    pub fn delete(&self, name: &str) -> Result<bool, StoreError> {
        let path = self.entry_path(&Self::key_for(name));
        if !path.exists() {
            return Ok(false);
        }
        std::fs::remove_file(path)?;
        tracing::info!(name, "level deleted");
        Ok(true)
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.root
            .join(LEVELS_DIR)
            .join(format!("{}.json", sha256_hex(key.as_bytes())))
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

fn write_then_rename(tmp: &Path, path: &Path, entry: &StoredEntry) -> Result<(), StoreError> {
    serde_json::to_writer_pretty(std::fs::File::create(tmp)?, entry)?;
    std::fs::rename(tmp, path)?;
    Ok(())
}

fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(tmp: &tempfile::TempDir) -> LevelStore {
        LevelStore::open(tmp.path().join("saves")).unwrap()
    }

    #[test]
    fn open_creates_layout() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store(&tmp);
        assert!(store.root().join("levels").is_dir());
        assert!(store.root().join("store.meta.json").is_file());
    }

    #[test]
    fn save_and_load() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store(&tmp);
        let record = LevelRecord::new("Hills", WorldSeed(1337), 1_700_000_000_000);
        store.save(&record).unwrap();

        let reopened = LevelStore::open(tmp.path().join("saves")).unwrap();
        assert_eq!(reopened.load("Hills").unwrap(), Some(record));
    }

    #[test]
    fn failed_save_removes_temp_file() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store(&tmp);
        // a non-empty directory where the entry belongs makes the rename fail
        let path = store.entry_path(&LevelStore::key_for("Blocked"));
        std::fs::create_dir_all(path.join("inner")).unwrap();

        let result = store.save(&LevelRecord::new("Blocked", WorldSeed(7), 1));
        assert!(result.is_err());
        assert!(!path.with_extension("json.tmp").exists());
        assert!(path.is_dir());
    }

    #[test]
    fn unknown_level_is_none() {
        let tmp = tempfile::tempdir().unwrap();
        assert_eq!(store(&tmp).load("nope").unwrap(), None);
    }

    #[test]
    fn save_overwrites_same_name() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store(&tmp);
        store.save(&LevelRecord::new("A", WorldSeed(1), 10)).unwrap();
        store.save(&LevelRecord::new("A", WorldSeed(2), 20)).unwrap();

        assert_eq!(store.load("A").unwrap().map(|r| r.seed), Some(2));
        assert_eq!(store.list().unwrap().len(), 1);
    }

    #[test]
    fn record_json_uses_saved_at_field() {
        let record = LevelRecord::new("World", WorldSeed(-5), 42);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["savedAt"], 42);
        assert_eq!(json["seed"], -5);
        assert_eq!(json["name"], "World");
    }

    #[test]
    fn key_is_namespaced() {
        assert_eq!(LevelStore::key_for("My World"), "minegame:levels:My World");
    }

    #[test]
    fn list_is_most_recent_first() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store(&tmp);
        store.save(&LevelRecord::new("old", WorldSeed(1), 100)).unwrap();
        store.save(&LevelRecord::new("new", WorldSeed(2), 300)).unwrap();
        store.save(&LevelRecord::new("mid", WorldSeed(3), 200)).unwrap();

        let names: Vec<String> = store.list().unwrap().into_iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["new", "mid", "old"]);
    }

    #[test]
    fn list_skips_corrupt_entries() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store(&tmp);
        store.save(&LevelRecord::new("ok", WorldSeed(1), 1)).unwrap();
        std::fs::write(store.root().join("levels").join("garbage.json"), b"{ not json").unwrap();

        let records = store.list().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "ok");
    }

    #[test]
    fn load_detects_swapped_entry() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store(&tmp);
        store.save(&LevelRecord::new("a", WorldSeed(1), 1)).unwrap();
        store.save(&LevelRecord::new("b", WorldSeed(2), 2)).unwrap();

        let a = store.entry_path(&LevelStore::key_for("a"));
        let b = store.entry_path(&LevelStore::key_for("b"));
        std::fs::copy(&b, &a).unwrap();

        assert!(matches!(store.load("a"), Err(StoreError::KeyMismatch { .. })));
    }

    #[test]
    fn schema_mismatch_fails_closed() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("saves");
        LevelStore::open(&path).unwrap();
        std::fs::write(path.join("store.meta.json"), br#"{ "schema_version": 99 }"#).unwrap();

        assert!(matches!(
            LevelStore::open(&path),
            Err(StoreError::SchemaMismatch { file_version: 99, .. })
        ));
    }

    #[test]
    fn delete_removes_entry() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store(&tmp);
        store.save(&LevelRecord::new("gone", WorldSeed(1), 1)).unwrap();
        assert!(store.delete("gone").unwrap());
        assert!(!store.delete("gone").unwrap());
        assert_eq!(store.load("gone").unwrap(), None);
    }

    #[test]
    fn record_restores_settings() {
        let record = LevelRecord::now("Valley", WorldSeed(77));
        let settings = record.settings();
        assert_eq!(settings.name, "Valley");
        assert_eq!(settings.seed, WorldSeed(77));
        assert!(record.saved_at > 0);
    }
}
