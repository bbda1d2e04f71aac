//! File-per-key store

use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};
use tracing::debug;

use super::KeyValueStore;
use crate::error::StoreError;

/// Stores each key as its own file inside a directory.
///
/// Writes go to a temp file that is synced before being renamed over the
/// target, so a reader sees either the old value or the new one.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| StoreError::CreateDir {
            path: dir.clone(),
            source,
        })?;
        debug!("Opened timer state store at {}", dir.display());
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }

    fn io_error(&self, key: &str, source: io::Error) -> StoreError {
        StoreError::Io {
            key: key.to_string(),
            path: self.path_for(key),
            source,
        }
    }

    fn write_atomic(&self, key: &str, value: &str) -> io::Result<()> {
        let path = self.path_for(key);
        let temp_path = self.dir.join(format!(".{key}.tmp"));
        let mut file = fs::File::create(&temp_path)?;
        file.write_all(value.as_bytes())?;
        file.sync_all()?;
        drop(file);

        match fs::rename(&temp_path, &path) {
            Ok(()) => Ok(()),
            Err(_) if path.exists() => {
                fs::remove_file(&path)?;
                fs::rename(&temp_path, &path)
            }
            Err(err) => Err(err),
        }
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(self.io_error(key, err)),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.write_atomic(key, value)
            .map_err(|err| self.io_error(key, err))
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(self.io_error(key, err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn set_get_remove() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::open(dir.path().join("state")).unwrap();

        assert_eq!(store.get("isRunning").unwrap(), None);
        store.set("isRunning", "true").unwrap();
        assert_eq!(store.get("isRunning").unwrap().as_deref(), Some("true"));

        store.set("isRunning", "false").unwrap();
        assert_eq!(store.get("isRunning").unwrap().as_deref(), Some("false"));
        assert!(!store.dir().join(".isRunning.tmp").exists());

        store.remove("isRunning").unwrap();
        store.remove("isRunning").unwrap();
        assert_eq!(store.get("isRunning").unwrap(), None);
    }

    #[test]
    fn values_survive_reopen() {
        let dir = TempDir::new().unwrap();
        FileStore::open(dir.path()).unwrap().set("restDurationSeconds", "90").unwrap();
        let reopened = FileStore::open(dir.path()).unwrap();
        assert_eq!(reopened.get("restDurationSeconds").unwrap().as_deref(), Some("90"));
    }
}
