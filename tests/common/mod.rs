#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use hoops_ingest::config::StoreConfig;
use hoops_ingest::fetcher::Fetcher;
use hoops_ingest::stats_api::{FetchError, RawRecord, StatsQuery, StatsSource};
use hoops_ingest::store::Store;
use serde_json::Value;
use tempfile::TempDir;

pub fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

pub fn record(pairs: &[(&str, Value)]) -> RawRecord {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

/// Keep the `TempDir` alive for as long as the store is used.
pub fn temp_store() -> (TempDir, Store) {
    let dir = TempDir::new().expect("temp dir");
    let store = Store::new(StoreConfig::new(dir.path().join("hoops.sqlite")));
    store.init_schema().expect("schema should apply");
    (dir, store)
}

pub enum Canned {
    Rows(Vec<RawRecord>),
    Error,
}

/// In-memory source: unknown queries answer with no rows.
#[derive(Default)]
pub struct CannedSource {
    answers: HashMap<StatsQuery, Canned>,
    pub calls: RefCell<Vec<StatsQuery>>,
}

impl CannedSource {
    pub fn with(mut self, query: StatsQuery, answer: Canned) -> Self {
        self.answers.insert(query, answer);
        self
    }
}

impl StatsSource for CannedSource {
    fn fetch(&self, query: &StatsQuery) -> Result<Vec<RawRecord>, FetchError> {
        self.calls.borrow_mut().push(query.clone());
        match self.answers.get(query) {
            Some(Canned::Rows(rows)) => Ok(rows.clone()),
            Some(Canned::Error) => Err(FetchError::Payload("connection reset".to_string())),
            None => Ok(Vec::new()),
        }
    }
}

pub fn fetcher(source: CannedSource) -> Fetcher<CannedSource> {
    Fetcher::new(source, Duration::ZERO)
}

pub fn count_rows(store: &Store, table: &str) -> i64 {
    let conn = store.open().expect("open");
    conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |r| r.get(0))
        .expect("count")
}
