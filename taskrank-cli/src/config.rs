use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use taskrank_core::{Strategy, WeightOverrides, DEFAULT_SUGGEST_LIMIT};

/// `~/.taskrank/config.toml`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// IANA zone used to decide what "today" is.
    pub timezone: String,
    pub strategy: Strategy,
    /// Applied on top of the strategy preset.
    pub weights: WeightOverrides,
    pub suggest: SuggestSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuggestSection {
    pub limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timezone: "UTC".to_string(),
            strategy: Strategy::SmartBalance,
            weights: WeightOverrides::default(),
            suggest: SuggestSection::default(),
        }
    }
}

impl Default for SuggestSection {
    fn default() -> Self {
        Self {
            limit: DEFAULT_SUGGEST_LIMIT,
        }
    }
}

pub fn taskrank_home() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".taskrank"))
}

pub fn default_config_path() -> Result<PathBuf> {
    Ok(taskrank_home()?.join("config.toml"))
}

/// Load from `path`, or from the default location. A missing file means defaults.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let p = match path {
        Some(p) => p.to_path_buf(),
        None => default_config_path()?,
    };
    if !p.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
    parse_config(&s).with_context(|| format!("parse {}", p.display()))
}

pub fn parse_config(s: &str) -> Result<Config> {
    let cfg: Config = toml::from_str(s)?;
    check_weights(&cfg.weights)?;
    Ok(cfg)
}

/// Same rule as `--weight`: every weight must be a finite number.
fn check_weights(w: &WeightOverrides) -> Result<()> {
    let named = [
        ("urgency", w.urgency),
        ("importance", w.importance),
        ("effort", w.effort),
        ("quick_win_bonus", w.quick_win_bonus),
        ("dependency_boost", w.dependency_boost),
    ];
    let set = named
        .into_iter()
        .filter_map(|(k, v)| v.map(|v| (k, v)))
        .chain(w.extra.iter().map(|(k, v)| (k.as_str(), *v)));
    for (key, value) in set {
        if !value.is_finite() {
            bail!("weight '{key}' must be finite, got {value}");
        }
    }
    Ok(())
}

pub fn save_config(cfg: &Config, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    }
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(path, s).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

/// Write a default config unless one already exists. Returns the path and
/// whether a file was written.
pub fn init_config(path: Option<&Path>) -> Result<(PathBuf, bool)> {
    let p = match path {
        Some(p) => p.to_path_buf(),
        None => default_config_path()?,
    };
    if p.exists() {
        return Ok((p, false));
    }
    save_config(&Config::default(), &p)?;
    Ok((p, true))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    #[test]
    fn empty_file_is_all_defaults() {
        assert_eq!(parse_config("").unwrap(), Config::default());
    }

    #[test]
    fn parses_all_sections() {
        let cfg = parse_config(
            r#"
timezone = "America/Chicago"
strategy = "deadline-driven"

[weights]
urgency = 7
novelty = 1.5

[suggest]
limit = 5
"#,
        )
        .unwrap();

        assert_eq!(cfg.timezone, "America/Chicago");
        assert_eq!(cfg.strategy, Strategy::DeadlineDriven);
        assert_eq!(cfg.weights.urgency, Some(7.0));
        assert_eq!(cfg.weights.extra.get("novelty"), Some(&1.5));
        assert_eq!(cfg.suggest.limit, 5);
    }

    #[test]
    fn unknown_strategy_is_rejected() {
        assert!(parse_config(r#"strategy = "yolo""#).is_err());
    }

    #[test]
    fn non_finite_weights_are_rejected() {
        let err = parse_config("[weights]\nurgency = nan\n").unwrap_err();
        assert!(err.to_string().contains("'urgency' must be finite"), "{err}");
        assert!(parse_config("[weights]\nnovelty = -inf\n").is_err());
        assert!(parse_config("[weights]\neffort = -2.5\n").is_ok());
    }

    #[test]
    fn init_writes_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let (p, written) = init_config(Some(&path)).unwrap();
        assert!(written);
        assert_eq!(p, path);
        assert_eq!(load_config(Some(&path)).unwrap(), Config::default());

        let (_, again) = init_config(Some(&path)).unwrap();
        assert!(!again);
    }

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        assert_eq!(load_config(Some(&path)).unwrap(), Config::default());
    }

    #[test]
    fn bad_file_names_its_path() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(br#"strategy = "yolo""#).unwrap();

        let err = load_config(Some(f.path())).unwrap_err();
        assert!(format!("{err:#}").contains(&f.path().display().to_string()), "{err:#}");
    }
}
