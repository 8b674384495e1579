//! Output formatting for ranked tasks.

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::Serialize;
use std::fmt::Write as _;

use taskrank_core::{AnalyzedTask, DueDate, Suggestion, Weights};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Json,
    Text,
}

#[derive(Debug, Serialize)]
struct SuggestEnvelope<'a> {
    top: &'a [Suggestion],
}

pub fn to_json<T: Serialize + ?Sized>(value: &T, pretty: bool) -> Result<String> {
    let s = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    s.context("serialize output")
}

pub fn analyzed(tasks: &[AnalyzedTask], format: OutputFormat, pretty: bool) -> Result<String> {
    match format {
        OutputFormat::Json => to_json(tasks, pretty),
        OutputFormat::Text => Ok(analyzed_text(tasks)),
    }
}

pub fn suggestions(top: &[Suggestion], format: OutputFormat, pretty: bool) -> Result<String> {
    match format {
        OutputFormat::Json => to_json(&SuggestEnvelope { top }, pretty),
        OutputFormat::Text => Ok(suggestions_text(top)),
    }
}

pub fn weights_text(w: &Weights) -> String {
    let mut out = String::new();
    for (key, value) in w.entries() {
        let _ = writeln!(out, "{key:<18} {value}");
    }
    out
}

fn analyzed_text(tasks: &[AnalyzedTask]) -> String {
    if tasks.is_empty() {
        return "No tasks to show.\n".to_string();
    }

    let mut out = String::new();
    for (i, t) in tasks.iter().enumerate() {
        task_block(&mut out, &format!("{:>2}.", i + 1), t);
    }
    out
}

fn suggestions_text(top: &[Suggestion]) -> String {
    if top.is_empty() {
        return "No tasks to show.\n".to_string();
    }

    let mut out = String::new();
    for s in top {
        let _ = writeln!(out, "{}", s.why);
        task_block(&mut out, "   ", &s.task);
    }
    out
}

fn task_block(out: &mut String, lead: &str, t: &AnalyzedTask) {
    let cycle = if t.circular_dependency { " | circular dependency" } else { "" };
    let _ = writeln!(
        out,
        "{lead} [{}] score={:.2} | {} ({}){cycle}",
        t.priority.label(),
        t.score,
        t.title,
        t.id
    );
    let _ = writeln!(
        out,
        "    due: {} | importance: {} | est hrs: {}",
        due_text(t.due_date.as_ref()),
        opt_text(t.importance),
        opt_text(t.estimated_hours)
    );
    if !t.dependencies.is_empty() {
        let _ = writeln!(out, "    after: {}", t.dependencies.join(", "));
    }
    let _ = writeln!(out, "    why: {}", t.explanation);
}

fn due_text(due: Option<&DueDate>) -> String {
    match due {
        None => "-".to_string(),
        Some(DueDate::Date(d)) => d.to_string(),
        Some(DueDate::Text(s)) => s.clone(),
        Some(DueDate::Other(v)) => v.to_string(),
    }
}

fn opt_text(v: Option<i64>) -> String {
    v.map(|n| n.to_string()).unwrap_or_else(|| "-".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use taskrank_core::{analyze, suggest, AnalyzeOptions, Task};

    fn opts() -> AnalyzeOptions {
        AnalyzeOptions::new(NaiveDate::from_ymd_opt(2026, 2, 20).unwrap())
    }

    fn sample() -> Vec<Task> {
        vec![
            Task::new("a", "Ship release")
                .with_due_text("2026-02-19")
                .with_importance(8)
                .with_hours(4),
            Task::new("b", "Loop").with_dependencies(["b"]),
        ]
    }

    #[test]
    fn text_lists_tasks_in_rank_order() {
        let out = analyzed(&analyze(sample(), &opts()), OutputFormat::Text, false).unwrap();
        let lines: Vec<&str> = out.lines().collect();

        assert!(lines[0].starts_with(" 1. [high] score=636.25 | Ship release (a)"));
        assert!(lines[1].contains("due: 2026-02-19 | importance: 8 | est hrs: 4"));
        assert!(out.contains("Loop (b) | circular dependency"));
        assert!(out.contains("after: b"));
    }

    #[test]
    fn json_suggestions_are_wrapped_in_top() {
        let top = suggest(sample(), &opts(), 1);
        let out = suggestions(&top, OutputFormat::Json, false).unwrap();
        let v: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(v["top"].as_array().unwrap().len(), 1);
        assert_eq!(v["top"][0]["rank"], 1);
        assert_eq!(v["top"][0]["task"]["id"], "a");
    }

    #[test]
    fn empty_text_output() {
        assert_eq!(analyzed(&[], OutputFormat::Text, false).unwrap(), "No tasks to show.\n");
    }

    #[test]
    fn weights_table_lists_every_key() {
        let table = weights_text(&Weights::default());
        assert_eq!(table.lines().count(), 5);
        assert!(table.contains("effort"));
        assert!(table.contains("-1.5"));
    }
}
