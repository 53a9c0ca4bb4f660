// Task record shared between storage and the front end

use chrono::Utc;
use eyre::{Result, eyre};
use serde::{Deserialize, Serialize};

/// One to-do item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub category: String,
    /// Entries written without the flag count as not done
    #[serde(default)]
    pub done: bool,
    /// Image URI, local or remote. Missing in data written before images existed.
    #[serde(default)]
    pub image: Option<String>,
}

impl Task {
    pub fn new(id: i64, draft: TaskDraft) -> Self {
        Self {
            id,
            title: draft.title,
            category: draft.category,
            done: false,
            image: draft.image,
        }
    }
}

/// Create/edit form payload
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskDraft {
    pub title: String,
    pub category: String,
    pub image: Option<String>,
}

impl TaskDraft {
    pub fn new(title: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            category: category.into(),
            image: None,
        }
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    /// Trim every field and reject blank titles or categories
    ///
    /// A blank image is dropped rather than rejected.
    pub fn normalized(self) -> Result<Self> {
        let title = self.title.trim().to_string();
        if title.is_empty() {
            return Err(eyre!("Task title cannot be empty"));
        }

        let category = self.category.trim().to_string();
        if category.is_empty() {
            return Err(eyre!("Task category cannot be empty"));
        }

        let image = self
            .image
            .map(|uri| uri.trim().to_string())
            .filter(|uri| !uri.is_empty());

        Ok(Self { title, category, image })
    }
}

/// Current wall-clock time in milliseconds since the Unix epoch
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Allocate an id for a new task
///
/// Ids come from the wall clock but never repeat within `existing`: when two
/// tasks land on the same millisecond (or the clock moved backwards) the id is
/// bumped past the largest one already taken. Fails only when the largest id
/// is already `i64::MAX`.
pub fn next_id(existing: &[Task], now: i64) -> Result<i64> {
    match existing.iter().map(|t| t.id).max() {
        Some(max) if max >= now => max
            .checked_add(1)
            .ok_or_else(|| eyre!("No task id left after {}", max)),
        _ => Ok(now),
    }
}
