//! taskrank-core: priority scoring and dependency-cycle detection for task batches.

pub mod batch;
pub mod cycles;
pub mod scoring;
pub mod task;
pub mod time;
pub mod weights;

pub use batch::{
    analyze, assign_placeholder_ids, parse_task_batch, suggest, AnalyzeOptions, AnalyzedTask,
    BatchError, PriorityBand, Suggestion, DEFAULT_SUGGEST_LIMIT, PLACEHOLDER_PREFIX,
};
pub use cycles::detect_cycles;
pub use scoring::{calculate_score, ScoreMeta, ScoreResult};
pub use task::{task_map, DueDate, Task, TaskMap};
pub use time::{local_today, parse_date_str, parse_due_date};
pub use weights::{Strategy, UnknownStrategy, WeightOverrides, Weights, DEFAULT_WEIGHTS};
