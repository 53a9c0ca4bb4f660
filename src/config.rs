// Configuration: which backend to use and where it keeps its data

use crate::kv::{FileKv, KeyValueStore, SqliteKv, validate_key};
use crate::store::{DEFAULT_KEY, TaskStore};
use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const CONFIG_FILE: &str = "config.yml";
const DB_FILE: &str = "todostore.db";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// One JSON file per key
    #[default]
    File,
    /// Single SQLite database
    Sqlite,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub backend: Backend,
    pub data_dir: PathBuf,
    pub key: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            data_dir: default_data_dir(),
            key: DEFAULT_KEY.to_string(),
        }
    }
}

/// `$XDG_DATA_HOME/todostore` or the platform equivalent, else `./.todostore`
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("todostore"))
        .unwrap_or_else(|| PathBuf::from(".todostore"))
}

impl Config {
    /// Load configuration
    ///
    /// An explicit path must exist. Without one, `{default_data_dir}/config.yml`
    /// is read if present and defaults are used otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let path = default_data_dir().join(CONFIG_FILE);
                if path.exists() {
                    Self::from_file(&path)
                } else {
                    debug!(?path, "No config file, using defaults");
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config =
            serde_yaml::from_str(&content).with_context(|| format!("Failed to parse config file {}", path.display()))?;
        config.validate()?;
        debug!(?path, ?config, "Loaded config");
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        validate_key(&self.key).context("Invalid key in config")
    }

    /// Open the configured backend
    pub fn open_kv(&self) -> Result<Box<dyn KeyValueStore>> {
        let kv: Box<dyn KeyValueStore> = match self.backend {
            Backend::File => Box::new(FileKv::open(&self.data_dir)?),
            Backend::Sqlite => Box::new(SqliteKv::open(self.data_dir.join(DB_FILE))?),
        };
        Ok(kv)
    }

    /// Open a task store over the configured backend
    pub fn open_store(&self) -> Result<TaskStore<Box<dyn KeyValueStore>>> {
        TaskStore::with_key(self.open_kv()?, &self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{Task, TaskDraft};
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.backend, Backend::File);
        assert_eq!(config.key, "tasks");
        assert!(config.data_dir.to_string_lossy().ends_with("todostore"));
    }

    #[test]
    fn test_from_file_partial_yaml_uses_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(CONFIG_FILE);
        fs::write(&path, "backend: sqlite\n").unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.backend, Backend::Sqlite);
        assert_eq!(config.key, "tasks");
    }

    #[test]
    fn test_from_file_full_yaml() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(CONFIG_FILE);
        fs::write(&path, "backend: file\ndata_dir: /var/lib/todo\nkey: todo_items\n").unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/var/lib/todo"));
        assert_eq!(config.key, "todo_items");
    }

    #[test]
    fn test_from_file_rejects_bad_key() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(CONFIG_FILE);
        fs::write(&path, "key: ../tasks\n").unwrap();
        assert!(Config::from_file(&path).is_err());
    }

    #[test]
    fn test_load_missing_explicit_path_fails() {
        let temp = TempDir::new().unwrap();
        assert!(Config::load(Some(temp.path().join("missing.yml").as_path())).is_err());
    }

    #[test]
    fn test_open_store_per_backend() {
        for backend in [Backend::File, Backend::Sqlite] {
            let temp = TempDir::new().unwrap();
            let config = Config {
                backend,
                data_dir: temp.path().join("data"),
                key: DEFAULT_KEY.to_string(),
            };

            let task = Task::new(1, TaskDraft::new("Buy milk", "Errands"));
            config.open_store().unwrap().save(std::slice::from_ref(&task)).unwrap();
            assert_eq!(config.open_store().unwrap().load(), vec![task]);
        }
    }
}
