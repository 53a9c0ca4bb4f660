// On-disk envelope for the task collection
//
// Two shapes exist in the wild:
//   legacy:  [ <Task>, ... ]
//   current: { "version": 2, "data": [ <Task>, ... ] }

use crate::task::Task;
use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

pub const CURRENT_VERSION: u32 = 2;

/// Borrowed form of the current envelope, used for writing
#[derive(Debug, Serialize)]
struct EnvelopeRef<'a, T: Serialize> {
    version: u32,
    data: &'a T,
}

/// Serialize a task collection into the current envelope
pub fn encode(tasks: &[Task]) -> Result<String> {
    encode_value(&tasks)
}

fn encode_value<T: Serialize>(data: &T) -> Result<String> {
    let envelope = EnvelopeRef {
        version: CURRENT_VERSION,
        data,
    };
    serde_json::to_string(&envelope).context("Failed to serialize task payload")
}

/// Marker that only deserializes from the current version number
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(try_from = "u32")]
struct Current;

impl TryFrom<u32> for Current {
    type Error = String;

    fn try_from(version: u32) -> std::result::Result<Self, Self::Error> {
        if version == CURRENT_VERSION {
            Ok(Current)
        } else {
            Err(format!("unsupported payload version {}", version))
        }
    }
}

/// Envelope shapes. Variants are attempted in declaration order; elements
/// stay raw so one bad entry cannot hide the rest.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Repr {
    Current {
        #[allow(dead_code)]
        version: Current,
        data: Vec<Value>,
    },
    Legacy(Vec<Value>),
    Recovered {
        tasks: Vec<Value>,
    },
}

/// A stored payload after shape detection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoredPayload {
    /// `{ "version": 2, "data": [...] }`
    Current(Vec<Task>),
    /// Bare array written before versioning
    Legacy(Vec<Task>),
    /// Unknown object that still carries a `tasks` array
    Recovered(Vec<Task>),
}

impl StoredPayload {
    /// Decode raw stored text
    ///
    /// Returns `Ok(None)` for well-formed JSON that matches none of the known
    /// shapes, and an error only when the text is not JSON at all. Elements
    /// that do not decode as tasks are skipped with a warning.
    pub fn decode(raw: &str) -> Result<Option<Self>> {
        let value: Value = serde_json::from_str(raw).context("Stored payload is not valid JSON")?;

        let payload = match serde_json::from_value::<Repr>(value) {
            Ok(Repr::Current { data, .. }) => Some(StoredPayload::Current(decode_tasks(data))),
            Ok(Repr::Legacy(items)) => Some(StoredPayload::Legacy(decode_tasks(items))),
            Ok(Repr::Recovered { tasks }) => Some(StoredPayload::Recovered(decode_tasks(tasks))),
            Err(_) => None,
        };

        Ok(payload)
    }

    pub fn shape(&self) -> StoredShape {
        match self {
            StoredPayload::Current(_) => StoredShape::Current,
            StoredPayload::Legacy(_) => StoredShape::Legacy,
            StoredPayload::Recovered(_) => StoredShape::Unrecognized,
        }
    }

    pub fn into_tasks(self) -> Vec<Task> {
        match self {
            StoredPayload::Current(tasks) | StoredPayload::Legacy(tasks) | StoredPayload::Recovered(tasks) => tasks,
        }
    }
}

fn decode_tasks(items: Vec<Value>) -> Vec<Task> {
    let mut tasks = Vec::with_capacity(items.len());

    for (index, item) in items.into_iter().enumerate() {
        match serde_json::from_value::<Task>(item) {
            Ok(task) => tasks.push(task),
            Err(e) => {
                warn!(index, error = ?e, "Skipping stored element that is not a task");
            }
        }
    }

    tasks
}

/// Top-level shape of whatever sits under the task key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoredShape {
    Absent,
    Legacy,
    Current,
    Unrecognized,
    Malformed,
}

impl StoredShape {
    /// Classify raw stored text without requiring its elements to be valid tasks
    pub fn detect(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return StoredShape::Absent;
        };

        match serde_json::from_str::<Value>(raw) {
            Err(_) => StoredShape::Malformed,
            Ok(Value::Array(_)) => StoredShape::Legacy,
            Ok(Value::Object(obj)) => {
                let version_ok = obj.get("version").and_then(Value::as_u64) == Some(CURRENT_VERSION as u64);
                let data_ok = obj.get("data").is_some_and(Value::is_array);
                if version_ok && data_ok {
                    StoredShape::Current
                } else {
                    StoredShape::Unrecognized
                }
            }
            Ok(_) => StoredShape::Unrecognized,
        }
    }
}

impl std::fmt::Display for StoredShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoredShape::Absent => write!(f, "absent"),
            StoredShape::Legacy => write!(f, "legacy"),
            StoredShape::Current => write!(f, "v{}", CURRENT_VERSION),
            StoredShape::Unrecognized => write!(f, "unrecognized"),
            StoredShape::Malformed => write!(f, "malformed"),
        }
    }
}

/// Wrap a legacy bare array in the current envelope
///
/// Elements are carried over verbatim; the ones that no longer decode as tasks
/// are skipped at load time. Returns `None` when `raw` is not a bare array.
pub fn upgrade_legacy(raw: &str) -> Result<Option<(String, usize)>> {
    let value: Value = serde_json::from_str(raw).context("Stored payload is not valid JSON")?;

    match value {
        Value::Array(items) => {
            let count = items.len();
            Ok(Some((encode_value(&items)?, count)))
        }
        _ => Ok(None),
    }
}
