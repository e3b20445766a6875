//! Durable string key-value storage backing session identity and conversations

use std::collections::HashMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tempfile::NamedTempFile;

use supportdesk_types::{DeskError, DeskResult};

/// String key-value storage that survives restarts (or, for tests, doesn't).
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> DeskResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> DeskResult<()>;
    /// Removing a missing key is not an error
    fn remove(&self, key: &str) -> DeskResult<()>;
}

/// In-process store
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> DeskResult<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|_| DeskError::Storage("memory store lock poisoned".to_string()))
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> DeskResult<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> DeskResult<()> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> DeskResult<()> {
        self.lock()?.remove(key);
        Ok(())
    }
}

/// One file per key under a directory.
///
/// Each write goes to its own uniquely named temporary file in the same
/// directory, is fsynced, then renamed over the target, so a reader never
/// sees a half-written or interleaved value. Concurrent writers race only on
/// the rename: the last one wins with a complete value.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn open(dir: impl AsRef<Path>) -> DeskResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(|e| {
            DeskError::Storage(format!("cannot create {}: {}", dir.display(), e))
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", file_stem(key)))
    }
}

/// Keys map to file names; anything outside `[A-Za-z0-9._-]` becomes `_`
fn file_stem(key: &str) -> String {
    let stem: String = key
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect();
    // keep "." and ".." from escaping the directory
    if stem.chars().all(|c| c == '.') {
        format!("_{}", stem)
    } else {
        stem
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> DeskResult<Option<String>> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(DeskError::Storage(format!(
                "cannot read {}: {}",
                path.display(),
                e
            ))),
        }
    }

    fn set(&self, key: &str, value: &str) -> DeskResult<()> {
        let path = self.path_for(key);
        let storage_error =
            |e: std::io::Error| DeskError::Storage(format!("cannot write {}: {}", path.display(), e));

        // dropping an unpersisted temp file deletes it
        let mut tmp = NamedTempFile::new_in(&self.dir).map_err(storage_error)?;
        tmp.write_all(value.as_bytes()).map_err(storage_error)?;
        tmp.as_file().sync_all().map_err(storage_error)?;
        tmp.persist(&path).map_err(|e| storage_error(e.error))?;
        Ok(())
    }

    fn remove(&self, key: &str) -> DeskResult<()> {
        let path = self.path_for(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(DeskError::Storage(format!(
                "cannot remove {}: {}",
                path.display(),
                e
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_memory_store_roundtrip() {
        let store = MemoryStore::new();
        assert_eq!(store.get("k").unwrap(), None);
        store.set("k", "v1").unwrap();
        store.set("k", "v2").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v2"));
        store.remove("k").unwrap();
        store.remove("k").unwrap();
        assert_eq!(store.get("k").unwrap(), None);
    }

    #[test]
    fn test_file_store_persists_across_handles() {
        let temp = TempDir::new().unwrap();
        let store = FileStore::open(temp.path().join("storage")).unwrap();
        store.set("supportdesk-session-id", "abc").unwrap();

        let reopened = FileStore::open(temp.path().join("storage")).unwrap();
        assert_eq!(
            reopened.get("supportdesk-session-id").unwrap().as_deref(),
            Some("abc")
        );

        reopened.remove("supportdesk-session-id").unwrap();
        assert_eq!(store.get("supportdesk-session-id").unwrap(), None);
    }

    #[test]
    fn test_file_store_leaves_no_temp_files() {
        let temp = TempDir::new().unwrap();
        let store = FileStore::open(temp.path()).unwrap();
        store.set("a", "1").unwrap();
        store.set("a", "2").unwrap();

        let names: Vec<String> = fs::read_dir(temp.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.json".to_string()]);
    }

    #[test]
    fn test_concurrent_writers_never_publish_a_torn_value() {
        let temp = TempDir::new().unwrap();
        let long = "x".repeat(16 * 1024);
        let short = "short".to_string();

        let writers: Vec<_> = [long.clone(), short.clone()]
            .into_iter()
            .map(|value| {
                let store = FileStore::open(temp.path()).unwrap();
                std::thread::spawn(move || {
                    for _ in 0..300 {
                        store.set("k", &value).unwrap();
                    }
                })
            })
            .collect();

        let reader = FileStore::open(temp.path()).unwrap();
        while writers.iter().any(|w| !w.is_finished()) {
            if let Some(value) = reader.get("k").unwrap() {
                assert!(value == long || value == short, "torn value of {} bytes", value.len());
            }
        }
        for writer in writers {
            writer.join().unwrap();
        }

        let last = reader.get("k").unwrap().unwrap();
        assert!(last == long || last == short);
        assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_file_stem_sanitizes() {
        assert_eq!(file_stem("supportdesk-conversation-1f2e"), "supportdesk-conversation-1f2e");
        assert_eq!(file_stem("../etc/passwd"), ".._etc_passwd");
        assert_eq!(file_stem(".."), "_..");
        assert_eq!(file_stem("a b/c"), "a_b_c");
    }
}
