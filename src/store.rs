// Versioned task persistence on top of a key-value backend

use crate::categories::{CATEGORIES_KEY, CategoryList};
use crate::kv::{KeyValueStore, validate_key};
use crate::payload::{self, StoredPayload, StoredShape};
use crate::task::Task;
use eyre::{Context, Result, eyre};
use tracing::{debug, info, warn};

/// Key the task collection is stored under
pub const DEFAULT_KEY: &str = "tasks";

/// What `migrate_if_needed` found and did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationOutcome {
    /// Nothing stored yet
    NothingStored,
    /// Legacy array rewritten into the current envelope
    Migrated { count: usize },
    /// Already in the current envelope
    AlreadyCurrent,
    /// Some other shape; left untouched
    Unrecognized,
}

impl std::fmt::Display for MigrationOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MigrationOutcome::NothingStored => write!(f, "nothing stored"),
            MigrationOutcome::Migrated { count } => write!(f, "migrated {} tasks to v{}", count, payload::CURRENT_VERSION),
            MigrationOutcome::AlreadyCurrent => write!(f, "already v{}", payload::CURRENT_VERSION),
            MigrationOutcome::Unrecognized => write!(f, "unrecognized payload left untouched"),
        }
    }
}

/// Durable storage of the whole task collection under one key
///
/// Every save rewrites the full collection in the current envelope, which is
/// also how a legacy store gets upgraded if `migrate_if_needed` never ran.
pub struct TaskStore<S: KeyValueStore> {
    kv: S,
    key: String,
}

impl<S: KeyValueStore> TaskStore<S> {
    /// Store tasks under the default key
    pub fn new(kv: S) -> Self {
        Self {
            kv,
            key: DEFAULT_KEY.to_string(),
        }
    }

    /// Store tasks under a custom key
    pub fn with_key(kv: S, key: &str) -> Result<Self> {
        validate_key(key)?;
        if key == CATEGORIES_KEY {
            return Err(eyre!("Key '{}' is reserved for the category list", key));
        }
        Ok(Self {
            kv,
            key: key.to_string(),
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn kv(&self) -> &S {
        &self.kv
    }

    pub fn into_inner(self) -> S {
        self.kv
    }

    // ========================================================================
    // Core API
    // ========================================================================

    /// Load the task collection
    ///
    /// Never fails: a missing value, unreadable storage, malformed JSON or an
    /// unknown shape all come back as an empty collection.
    pub fn load(&self) -> Vec<Task> {
        let raw = match self.kv.get(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!(key = %self.key, "load: nothing stored");
                return Vec::new();
            }
            Err(e) => {
                warn!(key = %self.key, error = ?e, "Failed to read stored tasks, starting empty");
                return Vec::new();
            }
        };

        match StoredPayload::decode(&raw) {
            Ok(Some(payload)) => {
                let shape = payload.shape();
                let tasks = payload.into_tasks();
                debug!(key = %self.key, %shape, count = tasks.len(), "load: decoded tasks");
                tasks
            }
            Ok(None) => {
                warn!(key = %self.key, "Stored tasks have an unknown shape, starting empty");
                Vec::new()
            }
            Err(e) => {
                warn!(key = %self.key, error = ?e, "Failed to parse stored tasks, starting empty");
                Vec::new()
            }
        }
    }

    /// Replace the stored collection with `tasks`
    pub fn save(&mut self, tasks: &[Task]) -> Result<()> {
        let raw = payload::encode(tasks)?;
        self.kv
            .set(&self.key, &raw)
            .with_context(|| format!("Failed to save {} tasks", tasks.len()))?;

        debug!(key = %self.key, count = tasks.len(), "save: wrote tasks");
        Ok(())
    }

    /// Rewrite a legacy bare array into the current envelope
    ///
    /// Safe to call on every startup. Callers that must not block on it can
    /// drop the result; failures are already logged here.
    pub fn migrate_if_needed(&mut self) -> Result<MigrationOutcome> {
        let result = self.try_migrate();
        match &result {
            Ok(MigrationOutcome::Migrated { count }) => {
                info!(key = %self.key, count, "Migrated legacy task payload");
            }
            Ok(outcome) => debug!(key = %self.key, %outcome, "migrate_if_needed: no change"),
            Err(e) => warn!(key = %self.key, error = ?e, "Task payload migration failed"),
        }
        result
    }

    fn try_migrate(&mut self) -> Result<MigrationOutcome> {
        let Some(raw) = self.kv.get(&self.key)? else {
            return Ok(MigrationOutcome::NothingStored);
        };

        match payload::upgrade_legacy(&raw)? {
            Some((upgraded, count)) => {
                self.kv
                    .set(&self.key, &upgraded)
                    .context("Failed to write migrated task payload")?;
                Ok(MigrationOutcome::Migrated { count })
            }
            None if StoredShape::detect(Some(&raw)) == StoredShape::Current => Ok(MigrationOutcome::AlreadyCurrent),
            None => Ok(MigrationOutcome::Unrecognized),
        }
    }

    /// Best-effort migration followed by a load, for application startup
    pub fn load_on_startup(&mut self) -> Vec<Task> {
        let _ = self.migrate_if_needed();
        self.load()
    }

    // ========================================================================
    // Categories
    // ========================================================================

    /// Load the explicit category list
    ///
    /// Never fails, like `load`. Duplicate and blank names are dropped.
    pub fn load_categories(&self) -> CategoryList {
        let raw = match self.kv.get(CATEGORIES_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return CategoryList::new(),
            Err(e) => {
                warn!(key = CATEGORIES_KEY, error = ?e, "Failed to read stored categories, starting empty");
                return CategoryList::new();
            }
        };

        match serde_json::from_str::<Vec<String>>(&raw) {
            Ok(names) => CategoryList::from(names),
            Err(e) => {
                warn!(key = CATEGORIES_KEY, error = ?e, "Failed to parse stored categories, starting empty");
                CategoryList::new()
            }
        }
    }

    /// Replace the stored category list
    pub fn save_categories(&mut self, categories: &CategoryList) -> Result<()> {
        let raw = serde_json::to_string(categories).context("Failed to serialize categories")?;
        self.kv
            .set(CATEGORIES_KEY, &raw)
            .with_context(|| format!("Failed to save {} categories", categories.len()))?;

        debug!(key = CATEGORIES_KEY, count = categories.len(), "save_categories: wrote categories");
        Ok(())
    }

    // ========================================================================
    // Diagnostics
    // ========================================================================

    /// Raw stored text, if any
    pub fn raw(&self) -> Result<Option<String>> {
        self.kv.get(&self.key)
    }

    /// Shape of the stored value; read failures count as absent
    pub fn shape(&self) -> StoredShape {
        match self.kv.get(&self.key) {
            Ok(raw) => StoredShape::detect(raw.as_deref()),
            Err(e) => {
                warn!(key = %self.key, error = ?e, "Failed to read stored tasks");
                StoredShape::Absent
            }
        }
    }
}
