use std::env;
use std::ops::Range;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Result, anyhow};

const DATA_DIR: &str = "hoops_ingest";
const DB_FILE: &str = "hoops.sqlite";

pub const DEFAULT_BATCH_SIZE: usize = 100;
const MAX_BATCH_SIZE: usize = 1000;
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Where the upserter writes. Built once in `main` and handed down.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub db_path: PathBuf,
}

impl StoreConfig {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
        }
    }

    /// `--db` wins over `NBA_DB_PATH`, which wins over the per-user data dir.
    pub fn resolve(cli_db_path: Option<PathBuf>) -> Result<Self> {
        cli_db_path
            .or_else(|| opt_env("NBA_DB_PATH").map(PathBuf::from))
            .or_else(default_db_path)
            .map(Self::new)
            .ok_or_else(|| anyhow!("unable to resolve sqlite path (set NBA_DB_PATH or pass --db)"))
    }
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub batch_size: usize,
    pub delay: Duration,
    pub seasons: Vec<String>,
    pub player_slice: Range<usize>,
    pub request_timeout: Duration,
}

impl PipelineConfig {
    /// Reads the `INGEST_*` knobs, falling back to the given per-pipeline defaults.
    pub fn from_env(default_delay_ms: u64, default_slice: Range<usize>) -> Self {
        let batch_size = env_parse::<usize>("INGEST_BATCH_SIZE")
            .unwrap_or(DEFAULT_BATCH_SIZE)
            .clamp(1, MAX_BATCH_SIZE);
        let delay_ms = env_parse::<u64>("INGEST_DELAY_MS").unwrap_or(default_delay_ms);
        let season_start = env_parse::<i32>("INGEST_SEASON_START").unwrap_or(2020);
        let season_end = env_parse::<i32>("INGEST_SEASON_END").unwrap_or(2025);
        let player_slice = opt_env("INGEST_PLAYER_SLICE")
            .and_then(|raw| parse_slice(&raw))
            .unwrap_or(default_slice);
        let timeout_secs =
            env_parse::<u64>("NBA_STATS_TIMEOUT_SECS").unwrap_or(DEFAULT_TIMEOUT_SECS);

        Self {
            batch_size,
            delay: Duration::from_millis(delay_ms),
            seasons: season_range(season_start, season_end),
            player_slice,
            request_timeout: Duration::from_secs(timeout_secs.max(1)),
        }
    }
}

/// Season labels for start years in `[start, end)`: `2020..2022` -> `2020-21, 2021-22`.
pub fn season_range(start: i32, end: i32) -> Vec<String> {
    (start..end).map(season_label).collect()
}

pub fn season_label(start_year: i32) -> String {
    format!("{start_year}-{:02}", (start_year + 1).rem_euclid(100))
}

/// `"5000:5500"` -> `5000..5500`. Either side may be omitted.
pub fn parse_slice(raw: &str) -> Option<Range<usize>> {
    let (a, b) = raw.trim().split_once(':')?;
    let start = if a.trim().is_empty() {
        0
    } else {
        a.trim().parse::<usize>().ok()?
    };
    let end = if b.trim().is_empty() {
        usize::MAX
    } else {
        b.trim().parse::<usize>().ok()?
    };
    (start <= end).then_some(start..end)
}

/// Out of range bounds clamp instead of panicking.
pub fn slice_clamped<'a, T>(items: &'a [T], range: &Range<usize>) -> &'a [T] {
    let end = range.end.min(items.len());
    let start = range.start.min(end);
    &items[start..end]
}

pub fn default_db_path() -> Option<PathBuf> {
    if let Some(base) = opt_env("XDG_DATA_HOME") {
        return Some(PathBuf::from(base).join(DATA_DIR).join(DB_FILE));
    }
    let home = opt_env("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".local")
            .join("share")
            .join(DATA_DIR)
            .join(DB_FILE),
    )
}

/// Scans process args for `--db <path>` or `--db=<path>`.
pub fn parse_db_path_arg() -> Option<PathBuf> {
    let args = env::args().skip(1).collect::<Vec<_>>();
    db_path_from_args(&args)
}

pub fn has_flag(flag: &str) -> bool {
    env::args().skip(1).any(|arg| arg == flag)
}

fn db_path_from_args(args: &[String]) -> Option<PathBuf> {
    for (idx, arg) in args.iter().enumerate() {
        if let Some(path) = arg.strip_prefix("--db=") {
            let trimmed = path.trim();
            if !trimmed.is_empty() {
                return Some(PathBuf::from(trimmed));
            }
        }
        if arg == "--db" {
            let Some(next) = args.get(idx + 1) else {
                continue;
            };
            if !next.trim().is_empty() {
                return Some(PathBuf::from(next));
            }
        }
    }
    None
}

fn opt_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .and_then(|val| if val.trim().is_empty() { None } else { Some(val) })
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    opt_env(key).and_then(|val| val.trim().parse::<T>().ok())
}
