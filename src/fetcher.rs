use std::thread;
use std::time::Duration;

use log::{debug, warn};

use crate::stats_api::{RawRecord, StatsQuery, StatsSource};

/// What a single keyed fetch produced. `Empty` and `Failed` are kept apart so a
/// caller can tell "the source has nothing" from "the source could not be read".
#[derive(Debug)]
pub enum FetchOutcome {
    Records(Vec<RawRecord>),
    Empty,
    Failed(String),
}

impl FetchOutcome {
    pub fn into_records(self) -> Vec<RawRecord> {
        match self {
            FetchOutcome::Records(rows) => rows,
            FetchOutcome::Empty | FetchOutcome::Failed(_) => Vec::new(),
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, FetchOutcome::Failed(_))
    }
}

/// Rate-limited wrapper around a [`StatsSource`]. Sleeps `delay` after every
/// call that came back, including empty ones; a failed call returns at once.
pub struct Fetcher<S> {
    source: S,
    delay: Duration,
}

impl<S: StatsSource> Fetcher<S> {
    pub fn new(source: S, delay: Duration) -> Self {
        Self { source, delay }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn fetch(&self, query: &StatsQuery) -> FetchOutcome {
        let rows = match self.source.fetch(query) {
            Ok(rows) => rows,
            Err(err) => {
                warn!("error fetching {query}: {err}");
                return FetchOutcome::Failed(err.to_string());
            }
        };
        if !self.delay.is_zero() {
            thread::sleep(self.delay);
        }
        if rows.is_empty() {
            warn!("no data for {query}");
            return FetchOutcome::Empty;
        }
        debug!("fetched {} records for {query}", rows.len());
        FetchOutcome::Records(rows)
    }
}
