// Explicit category list, kept next to the tasks under its own key
//
// Stored as a bare JSON array of names: ["Errands", "Family"]

use crate::list::TaskList;
use eyre::{Result, eyre};
use serde::Serialize;

/// Key the category list is stored under
pub const CATEGORIES_KEY: &str = "categories";

/// Ordered, duplicate-free category names
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CategoryList {
    names: Vec<String>,
}

impl From<Vec<String>> for CategoryList {
    fn from(names: Vec<String>) -> Self {
        let mut list = Self::default();
        for name in names {
            list.ensure(&name);
        }
        list
    }
}

impl CategoryList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// Add a new category
    ///
    /// The name is trimmed. A blank name is ignored and yields `Ok(None)`; a
    /// name already in the list is an error.
    pub fn add(&mut self, name: &str) -> Result<Option<&str>> {
        let name = name.trim();
        if name.is_empty() {
            return Ok(None);
        }
        if self.contains(name) {
            return Err(eyre!("Category already exists: {}", name));
        }

        self.names.push(name.to_string());
        Ok(self.names.last().map(String::as_str))
    }

    /// Add `name` unless it is blank or already listed. Returns true if added.
    pub fn ensure(&mut self, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() || self.contains(name) {
            return false;
        }
        self.names.push(name.to_string());
        true
    }

    /// Drop `name` if no task in `tasks` still uses it. Returns true if dropped.
    pub fn prune(&mut self, name: &str, tasks: &TaskList) -> bool {
        if tasks.tasks().iter().any(|t| t.category == name) {
            return false;
        }

        let before = self.names.len();
        self.names.retain(|n| n != name);
        self.names.len() != before
    }

    /// Listed categories followed by any task category missing from the list
    pub fn merged<'a>(&'a self, tasks: &'a TaskList) -> Vec<&'a str> {
        let mut all: Vec<&str> = self.names.iter().map(String::as_str).collect();
        for name in tasks.categories() {
            if !all.contains(&name) {
                all.push(name);
            }
        }
        all
    }
}
