//! Score calculator: a fixed, hand-tuned weighted heuristic.
//!
//! Four additive factors, always evaluated in this order:
//! 1) urgency from the due date
//! 2) importance
//! 3) effort (quick-win bonus or size penalty)
//! 4) dependency fan-out (only when the whole batch is supplied)
//!
//! Each factor that applies leaves one reason string; the reasons are joined
//! with "; " into the explanation.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::task::{Task, TaskMap};
use crate::time::{days_until, parse_due_date};
use crate::weights::{WeightOverrides, Weights};

/// Normalized inputs the score was computed from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreMeta {
    /// Parsed due date (ISO `YYYY-MM-DD`), or null when absent/unparseable.
    pub due_date: Option<NaiveDate>,
    pub importance: i64,
    pub estimated_hours: i64,
    pub dependencies: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    /// Rounded to 2 decimal places.
    pub score: f64,
    pub explanation: String,
    pub meta: ScoreMeta,
}

/// One factor's contribution and why.
#[derive(Debug, Clone, PartialEq)]
struct Factor {
    points: f64,
    reason: String,
}

impl Factor {
    fn new(points: f64, reason: String) -> Self {
        Self { points, reason }
    }
}

/// Score one task.
///
/// `all_tasks` is the batch keyed by id; without it the fan-out factor is
/// skipped. `weights` overrides are applied to a copy of the defaults.
/// `today` is the caller's current date.
pub fn calculate_score(
    task: &Task,
    all_tasks: Option<&TaskMap>,
    weights: Option<&WeightOverrides>,
    today: NaiveDate,
) -> ScoreResult {
    let w = Weights::resolve(weights);

    let due = task.due_date.as_ref().and_then(parse_due_date);
    let importance = task.resolved_importance();
    let hours = task.resolved_hours();

    let mut factors = vec![
        urgency(due, today, w.urgency),
        importance_factor(importance, w.importance),
        effort(hours, &w),
    ];
    if let Some(f) = all_tasks.and_then(|map| fan_out(task, map, w.dependency_boost)) {
        factors.push(f);
    }

    let total: f64 = factors.iter().map(|f| f.points).sum();
    let score = round2(total);
    let explanation = factors
        .into_iter()
        .map(|f| f.reason)
        .collect::<Vec<_>>()
        .join("; ");

    trace!(task = task.id().unwrap_or("-"), score, "scored task");

    ScoreResult {
        score,
        explanation,
        meta: ScoreMeta {
            due_date: due,
            importance,
            estimated_hours: hours,
            dependencies: task.dependencies.clone(),
        },
    }
}

fn urgency(due: Option<NaiveDate>, today: NaiveDate, weight: f64) -> Factor {
    let Some(due) = due else {
        return Factor::new(0.0, "No due date -> low urgency".to_string());
    };

    let days = days_until(due, today);
    match days {
        d if d < 0 => Factor::new(
            100.0 * weight,
            format!("Overdue by {} days -> huge urgency boost", -d),
        ),
        0..=3 => Factor::new(50.0 * weight, format!("Due in {days} days -> high urgency")),
        4..=7 => Factor::new(20.0 * weight, format!("Due in {days} days -> medium urgency")),
        _ => {
            let decay = (10.0 / (days as f64 + 1.0)).max(0.0);
            Factor::new(decay * weight, format!("Due in {days} days -> low urgency"))
        }
    }
}

fn importance_factor(importance: i64, weight: f64) -> Factor {
    let points = importance as f64 * weight;
    Factor::new(
        points,
        format!("Importance {importance} contributes {}", fmt_points(points)),
    )
}

fn effort(hours: i64, w: &Weights) -> Factor {
    if hours < 2 {
        return Factor::new(
            w.quick_win_bonus,
            format!("Quick win ({hours}h) -> +{}", fmt_points(w.quick_win_bonus)),
        );
    }

    // Penalty shrinks toward zero as hours grow (effort weight is negative).
    let points = (1.0 / hours as f64) * w.effort * 10.0;
    Factor::new(
        points,
        format!("Estimated hours {hours} adjusts score by {}", fmt_points(points)),
    )
}

/// Count the other tasks in the batch that list this task as a dependency.
fn fan_out(task: &Task, all_tasks: &TaskMap, boost: f64) -> Option<Factor> {
    let id = task.id()?;
    let blocked = all_tasks
        .iter()
        .filter(|(other_id, other)| other_id.as_str() != id && other.depends_on(id))
        .count();

    if blocked == 0 {
        return None;
    }

    let points = blocked as f64 * boost;
    Some(Factor::new(
        points,
        format!("Blocks {blocked} other task(s) -> +{}", fmt_points(points)),
    ))
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Rounded to 2 decimals, printed without trailing zeros.
fn fmt_points(x: f64) -> String {
    let r = round2(x);
    // avoid "-0"
    if r == 0.0 { "0".to_string() } else { format!("{r}") }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::task_map;
    use crate::weights::DEFAULT_WEIGHTS;
    use chrono::Duration;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, 20).unwrap()
    }

    fn base(id: &str) -> Task {
        Task::new(id, id).with_importance(5).with_hours(1)
    }

    fn score_of(task: &Task) -> f64 {
        calculate_score(task, None, None, today()).score
    }

    #[test]
    fn overdue_quick_win_scores_and_explains() {
        let t = Task::new("x", "x")
            .with_due_date(today() - Duration::days(2))
            .with_importance(7)
            .with_hours(1);
        let out = calculate_score(&t, None, None, today());

        // 100*6 + 7*5 + 8
        assert_eq!(out.score, 643.0);
        assert_eq!(
            out.explanation,
            "Overdue by 2 days -> huge urgency boost; Importance 7 contributes 35; Quick win (1h) -> +8"
        );
    }

    #[test]
    fn defaults_on_missing_fields() {
        let t = Task { id: Some("y".into()), ..Task::default() };
        let out = calculate_score(&t, None, None, today());

        assert!(out.explanation.contains("No due date"));
        assert_eq!(out.meta.importance, 5);
        assert_eq!(out.meta.estimated_hours, 1);
        assert_eq!(out.meta.due_date, None);
        // 5*5 + 8
        assert_eq!(out.score, 33.0);
    }

    #[test]
    fn urgency_bands_are_ordered() {
        let overdue = base("a").with_due_date(today() - Duration::days(1));
        let soon = base("a").with_due_date(today() + Duration::days(3));
        let week = base("a").with_due_date(today() + Duration::days(7));
        let later = base("a").with_due_date(today() + Duration::days(8));
        let none = base("a");

        let scores: Vec<f64> = [&overdue, &soon, &week, &later, &none]
            .into_iter()
            .map(score_of)
            .collect();
        assert!(scores.windows(2).all(|w| w[0] > w[1]), "{scores:?}");
    }

    #[test]
    fn urgency_band_edges() {
        let due_today = calculate_score(&base("a").with_due_date(today()), None, None, today());
        assert!(due_today.explanation.starts_with("Due in 0 days -> high urgency"));

        let day4 = calculate_score(
            &base("a").with_due_date(today() + Duration::days(4)),
            None,
            None,
            today(),
        );
        assert!(day4.explanation.starts_with("Due in 4 days -> medium urgency"));

        // 10 / (9 + 1) * 6 = 6
        let day9 = calculate_score(
            &base("a").with_due_date(today() + Duration::days(9)),
            None,
            None,
            today(),
        );
        assert!(day9.explanation.starts_with("Due in 9 days -> low urgency"));
        assert_eq!(day9.score, 6.0 + 25.0 + 8.0);
    }

    #[test]
    fn far_future_decays_toward_zero() {
        let far = base("a").with_due_date(today() + Duration::days(3650));
        let none = base("a");
        let diff = score_of(&far) - score_of(&none);
        assert!(diff >= 0.0 && diff < 0.05, "{diff}");
    }

    #[test]
    fn unparseable_due_date_is_no_due_date() {
        let t = base("a").with_due_text("someday soon");
        let out = calculate_score(&t, None, None, today());
        assert!(out.explanation.starts_with("No due date"));
        assert_eq!(out.meta.due_date, None);
        assert_eq!(out.score, score_of(&base("a")));
    }

    #[test]
    fn text_due_date_is_normalized_in_meta() {
        let t = base("a").with_due_text("2026/02/25 ");
        let out = calculate_score(&t, None, None, today());
        assert_eq!(out.meta.due_date, NaiveDate::from_ymd_opt(2026, 2, 25));
        let json = serde_json::to_value(&out.meta).unwrap();
        assert_eq!(json["due_date"], "2026-02-25");
    }

    #[test]
    fn importance_is_monotonic() {
        let hi = score_of(&base("a").with_importance(10));
        let lo = score_of(&base("a").with_importance(1));
        assert!(hi > lo);
        assert_eq!(hi - lo, 9.0 * DEFAULT_WEIGHTS.importance);
    }

    #[test]
    fn quick_win_only_under_two_hours() {
        let quick = calculate_score(&base("a").with_hours(1), None, None, today());
        let big = calculate_score(&base("a").with_hours(10), None, None, today());

        assert!(quick.explanation.contains("Quick win (1h) -> +8"));
        assert!(!big.explanation.contains("Quick win"));
        assert!(big.explanation.contains("Estimated hours 10 adjusts score by -1.5"));
        // 25 + 8 vs 25 - 1.5
        assert_eq!(quick.score, 33.0);
        assert_eq!(big.score, 23.5);
    }

    #[test]
    fn two_hours_is_not_a_quick_win() {
        // 1/2 * -1.5 * 10
        let out = calculate_score(&base("a").with_hours(2), None, None, today());
        assert!(out.explanation.contains("Estimated hours 2 adjusts score by -7.5"));
        assert!(!out.explanation.contains("Quick win"));
        assert_eq!(out.score, 25.0 - 7.5);
    }

    #[test]
    fn effort_penalty_shrinks_with_hours() {
        let two = score_of(&base("a").with_hours(2));
        let forty = score_of(&base("a").with_hours(40));
        assert!(two < forty);
    }

    #[test]
    fn fan_out_counts_other_dependents() {
        let x = base("x");
        let one = vec![x.clone(), base("a").with_dependencies(["x"])];
        let two = vec![
            x.clone(),
            base("a").with_dependencies(["x"]),
            base("b").with_dependencies(["x", "x"]),
        ];

        let s1 = calculate_score(&x, Some(&task_map(&one)), None, today());
        let s2 = calculate_score(&x, Some(&task_map(&two)), None, today());

        assert!(s1.explanation.ends_with("Blocks 1 other task(s) -> +7"));
        assert!(s2.explanation.ends_with("Blocks 2 other task(s) -> +14"));
        assert_eq!(s2.score - s1.score, DEFAULT_WEIGHTS.dependency_boost);
    }

    #[test]
    fn fan_out_needs_the_task_map() {
        let x = base("x");
        let batch = vec![x.clone(), base("a").with_dependencies(["x"])];

        let without = calculate_score(&x, None, None, today());
        let with = calculate_score(&x, Some(&task_map(&batch)), None, today());
        assert!(!without.explanation.contains("Blocks"));
        assert_eq!(with.score - without.score, 7.0);
    }

    #[test]
    fn zero_fan_out_adds_no_reason() {
        let x = base("x");
        let batch = vec![x.clone(), base("a")];
        let out = calculate_score(&x, Some(&task_map(&batch)), None, today());
        assert_eq!(out.explanation.split("; ").count(), 3);
    }

    #[test]
    fn self_dependency_does_not_count_as_blocking() {
        let x = base("x").with_dependencies(["x"]);
        let batch = vec![x.clone()];
        let out = calculate_score(&x, Some(&task_map(&batch)), None, today());
        assert!(!out.explanation.contains("Blocks"));
        assert_eq!(out.meta.dependencies, vec!["x".to_string()]);
    }

    #[test]
    fn overrides_change_the_score() {
        let t = base("a").with_importance(4);
        let o = WeightOverrides::new().with("importance", 10.0).with("quick_win_bonus", 0.0);
        let out = calculate_score(&t, None, Some(&o), today());
        assert_eq!(out.score, 40.0);
        assert!(out.explanation.contains("Importance 4 contributes 40"));
        assert!(out.explanation.contains("Quick win (1h) -> +0"));
    }

    #[test]
    fn scoring_is_deterministic() {
        let t = base("a")
            .with_due_text("2026-02-27")
            .with_hours(3)
            .with_importance(8);
        let batch = vec![t.clone(), base("b").with_dependencies(["a"])];
        let map = task_map(&batch);
        let o = WeightOverrides::new().with("urgency", 2.5);

        let first = calculate_score(&t, Some(&map), Some(&o), today());
        let second = calculate_score(&t, Some(&map), Some(&o), today());
        assert_eq!(first, second);
    }

    #[test]
    fn scores_round_to_two_decimals() {
        // 10 / (10 + 1) * 6 = 5.4545...
        let t = base("a").with_due_date(today() + Duration::days(10)).with_hours(3);
        let out = calculate_score(&t, None, None, today());
        assert_eq!(out.score, 25.45);
    }
}
