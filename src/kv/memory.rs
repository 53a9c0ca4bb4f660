use super::{KeyValueStore, validate_key};
use eyre::{Result, eyre};
use std::collections::HashMap;

/// Process-local backend, mostly for tests and embedding
#[derive(Debug, Clone, Default)]
pub struct MemoryKv {
    values: HashMap<String, String>,
    fail_writes: bool,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a value, as if a previous run had written it
    pub fn with_value(mut self, key: &str, value: impl Into<String>) -> Self {
        self.values.insert(key.to_string(), value.into());
        self
    }

    /// Make every subsequent `set` fail
    pub fn fail_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }
}

impl KeyValueStore for MemoryKv {
    fn get(&self, key: &str) -> Result<Option<String>> {
        validate_key(key)?;
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        validate_key(key)?;
        if self.fail_writes {
            return Err(eyre!("Write to {} rejected by storage", key));
        }
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
