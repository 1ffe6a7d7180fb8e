use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use buildwatch_core::{KeyValueStore, PersistError};
use engine_logging::{engine_debug, engine_warn};
use tempfile::NamedTempFile;

pub const STATE_FILENAME: &str = "state.json";

/// Ensure the data directory exists; create if missing.
pub fn ensure_data_dir(dir: &Path) -> Result<(), PersistError> {
    if dir.exists() {
        let meta = fs::metadata(dir).map_err(|e| PersistError::DataDir(e.to_string()))?;
        if !meta.is_dir() {
            return Err(PersistError::DataDir("path is not a directory".into()));
        }
    } else {
        fs::create_dir_all(dir).map_err(|e| PersistError::DataDir(e.to_string()))?;
    }
    Ok(())
}

/// Atomically write content to `{dir}/{filename}` by writing a temp file then renaming.
pub struct AtomicFileWriter {
    dir: PathBuf,
}

impl AtomicFileWriter {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn write(&self, filename: &str, content: &str) -> Result<PathBuf, PersistError> {
        ensure_data_dir(&self.dir)?;

        let target = self.dir.join(filename);
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.flush()?;
        tmp.as_file_mut().sync_all()?;

        // `persist` renames over an existing target on every platform we ship.
        tmp.persist(&target).map_err(|e| PersistError::Io(e.error))?;
        Ok(target)
    }
}

/// Key/value store kept as one JSON object in `{dir}/state.json`.
///
/// Each `set` rewrites the whole file atomically, so a crash leaves either the
/// old or the new contents on disk.
pub struct FileStore {
    writer: AtomicFileWriter,
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        Self {
            path: dir.join(STATE_FILENAME),
            writer: AtomicFileWriter::new(dir),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> Result<BTreeMap<String, String>, PersistError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(err) => return Err(err.into()),
        };
        Ok(serde_json::from_str(&content)?)
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, PersistError> {
        Ok(self.read_map()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PersistError> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| PersistError::Unavailable("state file lock poisoned".into()))?;

        let mut map = match self.read_map() {
            Ok(map) => map,
            Err(PersistError::Serialization(err)) => {
                engine_warn!(
                    "Replacing unreadable state file {:?}: {}",
                    self.path,
                    err
                );
                BTreeMap::new()
            }
            Err(err) => return Err(err),
        };
        map.insert(key.to_string(), value.to_string());

        let content = serde_json::to_string_pretty(&map)?;
        let target = self.writer.write(STATE_FILENAME, &content)?;
        engine_debug!("Saved {} to {:?}", key, target);
        Ok(())
    }
}
