//! Durable key-value storage for the bookmark list.
//!
//! - [`FileStore`]: one JSON file per key under a directory, written through a
//!   temporary file and renamed into place
//! - `MemoryStore`: a `HashMap`, test builds only

use std::fs;
use std::io;
use std::path::PathBuf;
use tracing::{debug, instrument};

/// Flat string storage keyed by name.
pub trait KeyValueStore {
    /// `Ok(None)` when nothing was ever written under `key`.
    fn get(&self, key: &str) -> io::Result<Option<String>>;

    /// Replace whatever is stored under `key`.
    fn set(&mut self, key: &str, value: &str) -> io::Result<()>;
}

/// Files named `<key>.json` inside `dir`.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> io::Result<Option<String>> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    #[instrument(level = "debug", skip(self, value), fields(dir = %self.dir.display()))]
    fn set(&mut self, key: &str, value: &str) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(key);
        let tmp = self.dir.join(format!(".{}.json.tmp", key));
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        debug!(path = %path.display(), bytes = value.len(), "Wrote key");
        Ok(())
    }
}

#[cfg(test)]
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: std::collections::HashMap<String, String>,
}

#[cfg(test)]
impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> io::Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> io::Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
