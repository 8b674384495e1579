//! Task model for priority scoring.
//!
//! Tasks arrive from callers as loosely-shaped JSON records. Every field is
//! optional and deserialization never rejects a record over a field's shape:
//! a value that cannot be read is treated as absent and later defaulted.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Importance used when a task doesn't carry one.
pub const DEFAULT_IMPORTANCE: i64 = 5;

/// Effort (hours) used when a task doesn't carry one, or carries a value <= 0.
pub const DEFAULT_ESTIMATED_HOURS: i64 = 1;

/// Display title for tasks submitted without one.
pub const UNTITLED: &str = "Untitled";

/// A due date as supplied by the caller.
///
/// Strings that already look like `YYYY-MM-DD` land in `Date`; anything else
/// is kept verbatim and resolved later by [`crate::time::parse_due_date`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DueDate {
    Date(NaiveDate),
    Text(String),
    /// Any other JSON shape (numbers, objects, ...). Never parses.
    Other(Value),
}

/// Core task type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Task {
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DueDate>,

    /// Conventionally 1-10.
    #[serde(default, deserialize_with = "lenient_int", skip_serializing_if = "Option::is_none")]
    pub importance: Option<i64>,

    /// Whole hours of effort.
    #[serde(default, deserialize_with = "lenient_int", skip_serializing_if = "Option::is_none")]
    pub estimated_hours: Option<i64>,

    /// Ids of tasks that must complete before this one. Ids need not exist.
    #[serde(default, deserialize_with = "lenient_ids")]
    pub dependencies: Vec<String>,
}

/// Snapshot of a batch keyed by task id.
pub type TaskMap = HashMap<String, Task>;

impl Task {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            title: Some(title.into()),
            ..Self::default()
        }
    }

    pub fn with_due_date(mut self, due: NaiveDate) -> Self {
        self.due_date = Some(DueDate::Date(due));
        self
    }

    pub fn with_due_text(mut self, due: impl Into<String>) -> Self {
        self.due_date = Some(DueDate::Text(due.into()));
        self
    }

    pub fn with_importance(mut self, importance: i64) -> Self {
        self.importance = Some(importance);
        self
    }

    pub fn with_hours(mut self, hours: i64) -> Self {
        self.estimated_hours = Some(hours);
        self
    }

    pub fn with_dependencies<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies = deps.into_iter().map(Into::into).collect();
        self
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// True when the task carries a usable (non-blank) id.
    pub fn has_id(&self) -> bool {
        self.id.as_deref().is_some_and(|id| !id.trim().is_empty())
    }

    pub fn title_or_default(&self) -> &str {
        self.title.as_deref().unwrap_or(UNTITLED)
    }

    pub fn resolved_importance(&self) -> i64 {
        self.importance.unwrap_or(DEFAULT_IMPORTANCE)
    }

    pub fn resolved_hours(&self) -> i64 {
        match self.estimated_hours {
            Some(h) if h > 0 => h,
            _ => DEFAULT_ESTIMATED_HOURS,
        }
    }

    pub fn depends_on(&self, id: &str) -> bool {
        self.dependencies.iter().any(|d| d == id)
    }
}

/// Build an id -> task map. Tasks without an id are left out; on duplicate
/// ids the later task wins.
pub fn task_map(tasks: &[Task]) -> TaskMap {
    tasks
        .iter()
        .filter_map(|t| t.id.clone().map(|id| (id, t.clone())))
        .collect()
}

fn lenient_text<'de, D>(d: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Option::<Value>::deserialize(d)?;
    Ok(v.as_ref().and_then(text_from_value))
}

fn lenient_int<'de, D>(d: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Option::<Value>::deserialize(d)?;
    Ok(v.as_ref().and_then(int_from_value))
}

fn lenient_ids<'de, D>(d: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Option::<Value>::deserialize(d)?;
    Ok(match v {
        Some(Value::Array(items)) => items.iter().filter_map(text_from_value).collect(),
        _ => Vec::new(),
    })
}

// Numeric ids are common in hand-written payloads; keep them as their decimal text.
fn text_from_value(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn int_from_value(v: &Value) -> Option<i64> {
    match v {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(truncate)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(truncate))
        }
        _ => None,
    }
}

fn truncate(f: f64) -> Option<i64> {
    f.is_finite().then(|| f.trunc() as i64)
}
