use std::ffi::OsString;
use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::anyhow;
use clap::{ArgAction, Args, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::filter::{TIME_WINDOW_PRESETS, TaskFilter};
use crate::interaction::Edge;
use crate::task::Status;

#[derive(Debug, Clone)]
pub struct PreprocessedArgs {
    pub cleaned_args: Vec<OsString>,
    pub rc_overrides: Vec<(String, String)>,
}

#[derive(Debug, Clone)]
pub struct KeyVal {
    pub key: String,
    pub value: String,
}

impl std::str::FromStr for KeyVal {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (k, v) = s
            .split_once('=')
            .ok_or_else(|| anyhow!("expected KEY=VALUE, got: {s}"))?;
        Ok(Self {
            key: k.trim().to_string(),
            value: v.trim().to_string(),
        })
    }
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "planner",
    version,
    about = "Month planner for multi-day tasks",
    disable_help_subcommand = true
)]
pub struct GlobalCli {
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[arg(short = 'q', long = "quiet", action = ArgAction::Count, global = true)]
    pub quiet: u8,

    #[arg(
        long = "rc",
        value_parser = clap::builder::ValueParser::new(|s: &str| s.parse::<KeyVal>()),
        action = ArgAction::Append
    )]
    pub rc_overrides: Vec<KeyVal>,

    #[arg(long = "config")]
    pub config: Option<PathBuf>,

    #[arg(long = "data")]
    pub data: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Show the six-week grid for a month.
    Month {
        /// Month to show, as YYYY-MM. Defaults to the current month.
        #[arg(long = "month")]
        month: Option<String>,

        #[command(flatten)]
        filter: FilterArgs,
    },
    /// List tasks that pass the filters.
    List {
        #[command(flatten)]
        filter: FilterArgs,
    },
    Add {
        title: String,
        #[arg(long = "start")]
        start: String,
        #[arg(long = "end")]
        end: Option<String>,
        #[arg(long = "status", value_parser = parse_status)]
        status: Option<Status>,
    },
    /// Sweep a date range as if selecting cells, then save the draft.
    Select {
        from: String,
        to: String,
        title: String,
        #[arg(long = "status", value_parser = parse_status)]
        status: Option<Status>,
    },
    Edit {
        id: String,
        #[arg(long = "title")]
        title: Option<String>,
        #[arg(long = "status", value_parser = parse_status)]
        status: Option<Status>,
        #[arg(long = "start")]
        start: Option<String>,
        #[arg(long = "end", conflicts_with = "single_day")]
        end: Option<String>,
        /// Drop the end date.
        #[arg(long = "single-day")]
        single_day: bool,
    },
    /// Drag a task so it starts on DATE, keeping its length.
    Move { id: String, date: String },
    /// Drag one edge of a task to DATE.
    Resize {
        id: String,
        #[arg(value_parser = parse_edge)]
        edge: Edge,
        date: String,
    },
    Delete { id: String },
}

#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Only show these statuses (repeatable).
    #[arg(long = "status", value_parser = parse_status, action = ArgAction::Append)]
    pub statuses: Vec<Status>,

    #[arg(long = "search")]
    pub search: Option<String>,

    /// Only tasks starting within N weeks from today (1, 2 or 3).
    #[arg(long = "within", value_parser = parse_within)]
    pub within: Option<u32>,
}

impl FilterArgs {
    /// Layers the flags given on top of the configured default filter.
    pub fn merge_into(&self, mut filter: TaskFilter) -> TaskFilter {
        if !self.statuses.is_empty() {
            filter.statuses = self.statuses.iter().copied().collect();
        }
        if let Some(search) = &self.search {
            filter.search = search.clone();
        }
        if self.within.is_some() {
            filter.within_weeks = self.within;
        }
        filter
    }
}

fn parse_status(raw: &str) -> anyhow::Result<Status> {
    raw.parse()
}

fn parse_within(raw: &str) -> anyhow::Result<u32> {
    let weeks: u32 = raw
        .trim()
        .parse()
        .map_err(|_| anyhow!("invalid week count: {raw}"))?;
    if !TIME_WINDOW_PRESETS.contains(&weeks) {
        return Err(anyhow!(
            "unsupported time window: {weeks} (expected one of {TIME_WINDOW_PRESETS:?})"
        ));
    }
    Ok(weeks)
}

fn parse_edge(raw: &str) -> anyhow::Result<Edge> {
    raw.parse()
}

pub fn init_tracing(verbose: u8, quiet: u8) -> anyhow::Result<()> {
    let default_level = if quiet >= 2 {
        "error"
    } else if quiet == 1 {
        "warn"
    } else if verbose >= 3 {
        "trace"
    } else if verbose == 2 {
        "debug"
    } else if verbose == 1 {
        "info"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| anyhow!("invalid RUST_LOG / log filter: {e}"))?;

    let init_result = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .try_init();

    if let Err(err) = init_result {
        debug!(error = %err, "tracing subscriber already set, continuing");
    }

    Ok(())
}

/// Pulls positional `rc.key=value` / `rc.key:value` overrides out of the
/// argument list before clap sees it.
#[tracing::instrument(skip_all)]
pub fn preprocess_args(raw: &[OsString]) -> anyhow::Result<PreprocessedArgs> {
    let mut cleaned = Vec::with_capacity(raw.len());
    let mut overrides: Vec<(String, String)> = Vec::new();

    let mut iter = raw.iter().cloned();
    if let Some(bin) = iter.next() {
        cleaned.push(bin);
    }

    for arg in iter {
        let s = arg.to_string_lossy();
        if let Some(rest) = s.strip_prefix("rc.") {
            let parsed = if let Some((k, v)) = rest.split_once('=') {
                Some((format!("rc.{k}"), v.to_string()))
            } else if let Some((k, v)) = rest.split_once(':') {
                Some((format!("rc.{k}"), v.to_string()))
            } else {
                None
            };

            if let Some((k, v)) = parsed {
                debug!(key = %k, value = %v, "captured positional rc override");
                overrides.push((k, v));
                continue;
            }
        }

        cleaned.push(arg);
    }

    Ok(PreprocessedArgs {
        cleaned_args: cleaned,
        rc_overrides: overrides,
    })
}
