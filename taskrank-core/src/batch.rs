//! Batch analysis: the whole-request pipeline around the scorer.
//!
//! 1) parse and validate the JSON payload
//! 2) give every task without an id a placeholder id
//! 3) detect dependency cycles once over the batch
//! 4) score every task against the full batch
//! 5) stable sort by score, highest first

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use thiserror::Error;
use tracing::debug;

use crate::cycles::detect_cycles;
use crate::scoring::calculate_score;
use crate::task::{DueDate, Task, task_map};
use crate::weights::WeightOverrides;

/// Prefix for synthesized ids (`tmp_0`, `tmp_1`, ...).
pub const PLACEHOLDER_PREFIX: &str = "tmp_";

/// Number of tasks returned by [`suggest`] unless told otherwise.
pub const DEFAULT_SUGGEST_LIMIT: usize = 3;

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("invalid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),

    #[error("expected a JSON array of tasks, found {found}")]
    NotAnArray { found: &'static str },

    #[error("task at index {index} is not a JSON object")]
    NotAnObject { index: usize },

    #[error("task at index {index} could not be read: {source}")]
    InvalidTask {
        index: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Coarse label for a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriorityBand {
    High,
    Medium,
    Low,
}

impl PriorityBand {
    pub fn from_score(score: f64) -> Self {
        match score {
            s if s >= 100.0 => PriorityBand::High,
            s if s >= 50.0 => PriorityBand::Medium,
            _ => PriorityBand::Low,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PriorityBand::High => "high",
            PriorityBand::Medium => "medium",
            PriorityBand::Low => "low",
        }
    }
}

/// Per-request settings.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzeOptions {
    /// The caller's current date.
    pub today: NaiveDate,
    pub weights: WeightOverrides,
}

impl AnalyzeOptions {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            today,
            weights: WeightOverrides::default(),
        }
    }

    pub fn with_weights(mut self, weights: WeightOverrides) -> Self {
        self.weights = weights;
        self
    }
}

/// A scored task, echoing the caller's input fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzedTask {
    pub id: String,
    pub title: String,
    /// As submitted, not normalized.
    pub due_date: Option<DueDate>,
    pub importance: Option<i64>,
    pub estimated_hours: Option<i64>,
    pub dependencies: Vec<String>,
    pub score: f64,
    pub explanation: String,
    pub circular_dependency: bool,
    pub priority: PriorityBand,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    /// 1-based.
    pub rank: usize,
    pub why: String,
    pub task: AnalyzedTask,
}

/// Parse a request body into tasks.
///
/// The body must be a JSON array whose elements are all objects. Field-level
/// problems inside an object never fail the batch.
pub fn parse_task_batch(json: &str) -> Result<Vec<Task>, BatchError> {
    let value: Value = serde_json::from_str(json).map_err(BatchError::InvalidJson)?;
    let Value::Array(items) = value else {
        return Err(BatchError::NotAnArray {
            found: json_kind(&value),
        });
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            if !item.is_object() {
                return Err(BatchError::NotAnObject { index });
            }
            serde_json::from_value(item).map_err(|source| BatchError::InvalidTask { index, source })
        })
        .collect()
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Give every task without a usable id a placeholder id.
///
/// Placeholders look like `tmp_<index>`. When that collides with an id already
/// in the batch, `_1`, `_2`, ... is appended until it doesn't. Returns how many
/// ids were assigned.
pub fn assign_placeholder_ids(tasks: &mut [Task]) -> usize {
    let mut taken: HashSet<String> = tasks
        .iter()
        .filter(|t| t.has_id())
        .filter_map(|t| t.id.clone())
        .collect();

    let mut assigned = 0;
    for (i, task) in tasks.iter_mut().enumerate() {
        if task.has_id() {
            continue;
        }

        let base = format!("{PLACEHOLDER_PREFIX}{i}");
        let mut candidate = base.clone();
        let mut suffix = 0;
        while taken.contains(&candidate) {
            suffix += 1;
            candidate = format!("{base}_{suffix}");
        }

        taken.insert(candidate.clone());
        task.id = Some(candidate);
        assigned += 1;
    }

    if assigned > 0 {
        debug!(assigned, "assigned placeholder ids");
    }
    assigned
}

/// Score a batch and return it sorted by score, highest first.
///
/// Equal scores keep their submission order.
pub fn analyze(mut tasks: Vec<Task>, opts: &AnalyzeOptions) -> Vec<AnalyzedTask> {
    assign_placeholder_ids(&mut tasks);

    let cycle_ids = detect_cycles(&tasks);
    let all = task_map(&tasks);

    let mut results: Vec<AnalyzedTask> = tasks
        .into_iter()
        .map(|t| {
            let scored = calculate_score(&t, Some(&all), Some(&opts.weights), opts.today);
            let id = t.id.clone().unwrap_or_default();
            AnalyzedTask {
                circular_dependency: cycle_ids.contains(&id),
                title: t.title_or_default().to_string(),
                id,
                due_date: t.due_date,
                importance: t.importance,
                estimated_hours: t.estimated_hours,
                dependencies: t.dependencies,
                priority: PriorityBand::from_score(scored.score),
                score: scored.score,
                explanation: scored.explanation,
            }
        })
        .collect();

    results.sort_by(|a, b| b.score.total_cmp(&a.score));

    debug!(
        tasks = results.len(),
        cyclic = cycle_ids.len(),
        "analyzed batch"
    );
    results
}

/// The top `limit` tasks of [`analyze`], each with a one-line rationale.
pub fn suggest(tasks: Vec<Task>, opts: &AnalyzeOptions, limit: usize) -> Vec<Suggestion> {
    analyze(tasks, opts)
        .into_iter()
        .take(limit)
        .enumerate()
        .map(|(i, task)| {
            let rank = i + 1;
            Suggestion {
                rank,
                why: format!("Rank {rank}: Score {} - {}", task.score, task.title),
                task,
            }
        })
        .collect()
}
