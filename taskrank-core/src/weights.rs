//! Weight configuration for the scoring heuristic.
//!
//! [`DEFAULT_WEIGHTS`] is a constant. Per-call tuning goes through
//! [`WeightOverrides`], which is overlaid onto a copy of the defaults.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Fully resolved coefficients used by the score calculator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Weights {
    pub urgency: f64,
    pub importance: f64,
    /// Negative: larger tasks lose score.
    pub effort: f64,
    pub quick_win_bonus: f64,
    pub dependency_boost: f64,

    /// Keys the scorer doesn't know about. Carried through, never used.
    #[serde(flatten, default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, f64>,
}

pub const DEFAULT_WEIGHTS: Weights = Weights {
    urgency: 6.0,
    importance: 5.0,
    effort: -1.5,
    quick_win_bonus: 8.0,
    dependency_boost: 7.0,
    extra: BTreeMap::new(),
};

impl Default for Weights {
    fn default() -> Self {
        DEFAULT_WEIGHTS
    }
}

impl Weights {
    /// Defaults with `overrides` applied key-by-key.
    pub fn resolve(overrides: Option<&WeightOverrides>) -> Self {
        match overrides {
            Some(o) => DEFAULT_WEIGHTS.with_overrides(o),
            None => DEFAULT_WEIGHTS,
        }
    }

    pub fn with_overrides(&self, o: &WeightOverrides) -> Self {
        let mut extra = self.extra.clone();
        extra.extend(o.extra.iter().map(|(k, v)| (k.clone(), *v)));

        Self {
            urgency: o.urgency.unwrap_or(self.urgency),
            importance: o.importance.unwrap_or(self.importance),
            effort: o.effort.unwrap_or(self.effort),
            quick_win_bonus: o.quick_win_bonus.unwrap_or(self.quick_win_bonus),
            dependency_boost: o.dependency_boost.unwrap_or(self.dependency_boost),
            extra,
        }
    }

    /// All coefficients by name, named keys first.
    pub fn entries(&self) -> Vec<(&str, f64)> {
        let mut out = vec![
            ("urgency", self.urgency),
            ("importance", self.importance),
            ("effort", self.effort),
            ("quick_win_bonus", self.quick_win_bonus),
            ("dependency_boost", self.dependency_boost),
        ];
        out.extend(self.extra.iter().map(|(k, v)| (k.as_str(), *v)));
        out
    }
}

/// A partial weight table. Unset keys fall through to whatever it is applied on.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeightOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub urgency: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub importance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effort: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quick_win_bonus: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependency_boost: Option<f64>,

    #[serde(flatten, default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, f64>,
}

impl WeightOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set one key. Unknown keys are kept in `extra`.
    pub fn set(&mut self, key: &str, value: f64) {
        match key {
            "urgency" => self.urgency = Some(value),
            "importance" => self.importance = Some(value),
            "effort" => self.effort = Some(value),
            "quick_win_bonus" => self.quick_win_bonus = Some(value),
            "dependency_boost" => self.dependency_boost = Some(value),
            other => {
                self.extra.insert(other.to_string(), value);
            }
        }
    }

    pub fn with(mut self, key: &str, value: f64) -> Self {
        self.set(key, value);
        self
    }

    /// Layer `top` over `self`; keys set in `top` win.
    pub fn merged(&self, top: &WeightOverrides) -> Self {
        let mut extra = self.extra.clone();
        extra.extend(top.extra.iter().map(|(k, v)| (k.clone(), *v)));

        Self {
            urgency: top.urgency.or(self.urgency),
            importance: top.importance.or(self.importance),
            effort: top.effort.or(self.effort),
            quick_win_bonus: top.quick_win_bonus.or(self.quick_win_bonus),
            dependency_boost: top.dependency_boost.or(self.dependency_boost),
            extra,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.urgency.is_none()
            && self.importance.is_none()
            && self.effort.is_none()
            && self.quick_win_bonus.is_none()
            && self.dependency_boost.is_none()
            && self.extra.is_empty()
    }
}

/// Named weight presets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// The default weights.
    #[default]
    SmartBalance,
    /// Due dates dominate.
    DeadlineDriven,
    /// Small tasks first.
    FastestWins,
    /// Importance dominates.
    HighImpact,
}

impl Strategy {
    pub const ALL: [Strategy; 4] = [
        Strategy::SmartBalance,
        Strategy::DeadlineDriven,
        Strategy::FastestWins,
        Strategy::HighImpact,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Strategy::SmartBalance => "smart-balance",
            Strategy::DeadlineDriven => "deadline-driven",
            Strategy::FastestWins => "fastest-wins",
            Strategy::HighImpact => "high-impact",
        }
    }

    pub fn overrides(&self) -> WeightOverrides {
        match self {
            Strategy::SmartBalance => WeightOverrides::new(),
            Strategy::DeadlineDriven => WeightOverrides::new()
                .with("urgency", 10.0)
                .with("importance", 3.0),
            Strategy::FastestWins => WeightOverrides::new()
                .with("quick_win_bonus", 40.0)
                .with("effort", -5.0),
            Strategy::HighImpact => WeightOverrides::new()
                .with("importance", 10.0)
                .with("urgency", 3.0),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown strategy '{0}' (expected one of: smart-balance, deadline-driven, fastest-wins, high-impact)")]
pub struct UnknownStrategy(pub String);

impl FromStr for Strategy {
    type Err = UnknownStrategy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace('_', "-");
        Strategy::ALL
            .into_iter()
            .find(|st| st.name() == wanted)
            .ok_or_else(|| UnknownStrategy(s.to_string()))
    }
}
