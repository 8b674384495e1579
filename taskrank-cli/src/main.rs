use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use taskrank_core::{
    analyze, local_today, parse_task_batch, suggest, AnalyzeOptions, Strategy, WeightOverrides,
    Weights,
};

mod config;
mod logging;
mod render;

use config::Config;
use logging::LogLevel;
use render::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "taskrank", version, about = "Rank tasks by urgency, importance, effort and dependencies")]
struct Cli {
    /// Config file (default: ~/.taskrank/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level for stderr diagnostics (overrides TASKRANK_LOG)
    #[arg(long, value_enum, global = true)]
    log_level: Option<LogLevel>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Score every task in a JSON array and print them highest first
    Analyze {
        #[command(flatten)]
        input: InputArgs,
    },

    /// Print only the top tasks with a short rationale
    Suggest {
        #[command(flatten)]
        input: InputArgs,

        /// Number of tasks to return (default: config, then 3)
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Print the resolved weight table
    Weights {
        #[command(flatten)]
        tuning: TuningArgs,
    },

    /// Write a default config file if none exists
    InitConfig,
}

#[derive(Args, Debug)]
struct InputArgs {
    /// JSON file with an array of tasks ("-" or absent: stdin)
    #[arg(long, short)]
    input: Option<PathBuf>,

    #[command(flatten)]
    tuning: TuningArgs,

    /// Treat this date (YYYY-MM-DD) as today
    #[arg(long, value_parser = parse_today)]
    today: Option<NaiveDate>,

    /// IANA time zone used to compute today (default: config, then UTC)
    #[arg(long)]
    timezone: Option<String>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long)]
    pretty: bool,
}

#[derive(Args, Debug, Default)]
struct TuningArgs {
    /// Weight preset: smart-balance, deadline-driven, fastest-wins, high-impact
    #[arg(long)]
    strategy: Option<Strategy>,

    /// Override one weight, e.g. --weight urgency=8 (repeatable)
    #[arg(long = "weight", value_name = "KEY=VALUE", value_parser = parse_weight)]
    weights: Vec<(String, f64)>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.log_level)?;

    let cfg = config::load_config(cli.config.as_deref())?;
    debug!(?cfg, "loaded config");

    match cli.command {
        Command::Analyze { input } => {
            let (tasks, opts) = prepare(&input, &cfg)?;
            let ranked = analyze(tasks, &opts);
            info!(tasks = ranked.len(), "analysis complete");
            println!("{}", render::analyzed(&ranked, input.format, input.pretty)?.trim_end());
        }

        Command::Suggest { input, limit } => {
            let limit = limit.unwrap_or(cfg.suggest.limit);
            let (tasks, opts) = prepare(&input, &cfg)?;
            let top = suggest(tasks, &opts, limit);
            println!("{}", render::suggestions(&top, input.format, input.pretty)?.trim_end());
        }

        Command::Weights { tuning } => {
            let w = Weights::resolve(Some(&resolve_weights(&tuning, &cfg)));
            print!("{}", render::weights_text(&w));
        }

        Command::InitConfig => {
            let (path, written) = config::init_config(cli.config.as_deref())?;
            if written {
                println!("Wrote {}", path.display());
            } else {
                println!("Config already exists: {}", path.display());
            }
        }
    }

    Ok(())
}

fn prepare(input: &InputArgs, cfg: &Config) -> Result<(Vec<taskrank_core::Task>, AnalyzeOptions)> {
    let body = read_input(input.input.as_deref())?;
    let tasks = parse_task_batch(&body).context("reading task batch")?;

    let today = match input.today {
        Some(d) => d,
        None => {
            let tz = input.timezone.as_deref().unwrap_or(&cfg.timezone);
            local_today(tz)?
        }
    };
    debug!(%today, tasks = tasks.len(), "prepared batch");

    let opts = AnalyzeOptions::new(today).with_weights(resolve_weights(&input.tuning, cfg));
    Ok((tasks, opts))
}

/// Strategy preset, then config weights, then `--weight` flags.
fn resolve_weights(tuning: &TuningArgs, cfg: &Config) -> WeightOverrides {
    let strategy = tuning.strategy.unwrap_or(cfg.strategy);
    let mut flags = WeightOverrides::new();
    for (key, value) in &tuning.weights {
        flags.set(key, *value);
    }
    strategy.overrides().merged(&cfg.weights).merged(&flags)
}

fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(p) if p != Path::new("-") => {
            if !p.exists() {
                bail!("input not found: {} (pass --input <file> or pipe JSON on stdin)", p.display());
            }
            std::fs::read_to_string(p).with_context(|| format!("read {}", p.display()))
        }
        _ => {
            let mut s = String::new();
            std::io::stdin()
                .read_to_string(&mut s)
                .context("read stdin")?;
            Ok(s)
        }
    }
}

fn parse_weight(s: &str) -> Result<(String, f64), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{s}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing weight name in '{s}'"));
    }
    let value: f64 = value
        .trim()
        .parse()
        .map_err(|_| format!("weight '{key}' needs a number, got '{}'", value.trim()))?;
    if !value.is_finite() {
        return Err(format!("weight '{key}' must be finite"));
    }
    Ok((key.to_string(), value))
}

fn parse_today(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|e| format!("invalid date '{s}': {e}"))
}
