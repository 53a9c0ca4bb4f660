// One JSON file per key, replaced atomically on every write

use super::{KeyValueStore, validate_key};
use eyre::{Context, Result};
use fs2::FileExt;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::debug;
use uuid::Uuid;

/// Directory-backed store
///
/// Each key lives in `{dir}/{key}.json`. Writers take an exclusive lock on
/// `{dir}/{key}.lock`, write a temp file, fsync it and rename it over the old
/// value, so readers never see a half-written payload.
#[derive(Debug, Clone)]
pub struct FileKv {
    dir: PathBuf,
}

impl FileKv {
    /// Open or create a store rooted at `dir`
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).context("Failed to create store directory")?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn value_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    fn lock_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.lock", key))
    }
}

impl KeyValueStore for FileKv {
    fn get(&self, key: &str) -> Result<Option<String>> {
        validate_key(key)?;

        match fs::read_to_string(self.value_path(key)) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("Failed to read value for key {}", key)),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        validate_key(key)?;

        let lock = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(self.lock_path(key))
            .context("Failed to open lock file")?;
        lock.lock_exclusive().context("Failed to acquire file lock")?;

        let tmp_path = self.dir.join(format!(".{}.{}.tmp", key, Uuid::now_v7()));
        if let Err(e) = write_and_rename(&tmp_path, &self.value_path(key), value) {
            let _ = fs::remove_file(&tmp_path);
            return Err(e);
        }

        // Lock is released when `lock` is dropped
        debug!(key, bytes = value.len(), "set: wrote value");
        Ok(())
    }
}

fn write_and_rename(tmp_path: &Path, final_path: &Path, value: &str) -> Result<()> {
    let mut file = OpenOptions::new()
        .create_new(true)
        .write(true)
        .open(tmp_path)
        .context("Failed to create temp file")?;
    file.write_all(value.as_bytes()).context("Failed to write temp file")?;
    file.sync_all().context("Failed to sync temp file")?;
    drop(file);

    fs::rename(tmp_path, final_path).context("Failed to move temp file into place")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_open_creates_directory() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("nested").join("store");

        let kv = FileKv::open(&dir).unwrap();
        assert!(dir.is_dir());
        assert_eq!(kv.dir(), dir.as_path());
    }

    #[test]
    fn test_get_missing_key() {
        let temp = TempDir::new().unwrap();
        let kv = FileKv::open(temp.path()).unwrap();
        assert_eq!(kv.get("tasks").unwrap(), None);
    }

    #[test]
    fn test_set_then_get() {
        let temp = TempDir::new().unwrap();
        let mut kv = FileKv::open(temp.path()).unwrap();

        kv.set("tasks", "[]").unwrap();
        kv.set("tasks", r#"{"version":2,"data":[]}"#).unwrap();

        assert_eq!(kv.get("tasks").unwrap().as_deref(), Some(r#"{"version":2,"data":[]}"#));
        assert!(temp.path().join("tasks.json").exists());
    }

    #[test]
    fn test_set_leaves_no_temp_files() {
        let temp = TempDir::new().unwrap();
        let mut kv = FileKv::open(temp.path()).unwrap();
        kv.set("tasks", "[]").unwrap();

        let leftovers: Vec<_> = fs::read_dir(temp.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_reopen_sees_previous_value() {
        let temp = TempDir::new().unwrap();
        {
            let mut kv = FileKv::open(temp.path()).unwrap();
            kv.set("tasks", "[1]").unwrap();
        }

        let kv = FileKv::open(temp.path()).unwrap();
        assert_eq!(kv.get("tasks").unwrap().as_deref(), Some("[1]"));
    }

    #[test]
    fn test_rejects_path_like_keys() {
        let temp = TempDir::new().unwrap();
        let mut kv = FileKv::open(temp.path()).unwrap();
        assert!(kv.set("../escape", "[]").is_err());
        assert!(kv.get("a/b").is_err());
    }

    #[test]
    fn test_write_and_rename_errors_carry_context() {
        let temp = TempDir::new().unwrap();

        let missing = temp.path().join("missing").join(".tasks.tmp");
        let err = write_and_rename(&missing, &temp.path().join("tasks.json"), "[]").unwrap_err();
        assert_eq!(err.to_string(), "Failed to create temp file");

        // Renaming a file over a non-empty directory fails after the write
        let target = temp.path().join("occupied");
        fs::create_dir(&target).unwrap();
        fs::write(target.join("keep"), "").unwrap();
        let tmp = temp.path().join(".occupied.tmp");
        let err = write_and_rename(&tmp, &target, "[]").unwrap_err();
        assert_eq!(err.to_string(), "Failed to move temp file into place");
        assert_eq!(fs::read_to_string(&tmp).unwrap(), "[]");
    }
}
