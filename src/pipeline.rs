//! The shared fetch -> normalize -> batch -> upsert loop.

use std::fmt::Display;

use log::{info, warn};
use serde::Serialize;

use crate::batch::Batcher;
use crate::fetcher::{FetchOutcome, Fetcher};
use crate::schema::Entity;
use crate::stats_api::{RawRecord, StatsQuery, StatsSource};
use crate::store::{Store, UpsertOutcome};

#[derive(Debug, Clone, Default, Serialize)]
pub struct PipelineSummary {
    pub pipeline: String,
    pub keys_total: usize,
    pub keys_succeeded: usize,
    pub keys_empty: usize,
    pub keys_failed: usize,
    pub rows_normalized: usize,
    /// Rows dropped because a natural-key column came back absent.
    pub rows_unkeyed: usize,
    pub rows_upserted: usize,
    pub batches_applied: usize,
    pub batches_failed: usize,
    pub errors: Vec<String>,
}

impl PipelineSummary {
    fn new(pipeline: &str, keys_total: usize) -> Self {
        Self {
            pipeline: pipeline.to_string(),
            keys_total,
            ..Self::default()
        }
    }
}

/// Row accumulator bound to a store; counts what each flush did.
struct Sink<'a, T> {
    batcher: Batcher<T>,
    store: &'a Store,
}

impl<'a, T: Entity> Sink<'a, T> {
    fn new(store: &'a Store, batch_size: usize) -> Self {
        Self {
            batcher: Batcher::new(batch_size),
            store,
        }
    }

    fn push(&mut self, row: T, summary: &mut PipelineSummary) {
        summary.rows_normalized += 1;
        if !row.has_key() {
            summary.rows_unkeyed += 1;
            warn!("{}: dropping row without a natural key", summary.pipeline);
            return;
        }
        if let Some(batch) = self.batcher.push(row) {
            self.flush(&batch, summary);
        }
    }

    fn finish(mut self, summary: &mut PipelineSummary) {
        if let Some(batch) = self.batcher.finish() {
            self.flush(&batch, summary);
        }
    }

    fn flush(&self, batch: &[T], summary: &mut PipelineSummary) {
        match self.store.upsert(batch) {
            UpsertOutcome::Applied(n) => {
                summary.rows_upserted += n;
                summary.batches_applied += 1;
            }
            UpsertOutcome::Failed(err) => {
                summary.batches_failed += 1;
                summary.errors.push(format!("batch of {}: {err}", batch.len()));
            }
            UpsertOutcome::Skipped => {}
        }
    }
}

/// Runs one pipeline over `keys`. No key's fetch failure and no batch's
/// persistence failure stops the loop; both end up in the summary.
pub fn run_pipeline<K, T, S, Q, N>(
    name: &str,
    keys: &[K],
    fetcher: &Fetcher<S>,
    store: &Store,
    batch_size: usize,
    query_for: Q,
    normalize: N,
) -> PipelineSummary
where
    K: Display,
    T: Entity,
    S: StatsSource,
    Q: Fn(&K) -> StatsQuery,
    N: Fn(&K, &RawRecord) -> T,
{
    let mut summary = PipelineSummary::new(name, keys.len());
    let run_id = begin_run(store, name, keys.len());
    let mut sink = Sink::new(store, batch_size);
    let progress_every = batch_size.max(1);

    info!("{name}: {} keys to process", keys.len());
    for (idx, key) in keys.iter().enumerate() {
        let query = query_for(key);
        match fetcher.fetch(&query) {
            FetchOutcome::Records(records) => {
                summary.keys_succeeded += 1;
                for record in &records {
                    sink.push(normalize(key, record), &mut summary);
                }
                info!("{name}: {} records for {key}", records.len());
            }
            FetchOutcome::Empty => summary.keys_empty += 1,
            FetchOutcome::Failed(err) => {
                summary.keys_failed += 1;
                summary.errors.push(format!("{key}: {err}"));
            }
        }
        let done = idx + 1;
        if done % progress_every == 0 {
            info!("{name}: processed {done}/{} keys", keys.len());
        }
    }
    sink.finish(&mut summary);

    finish_run(store, run_id, &summary);
    info!(
        "{name}: done, {} rows upserted ({} failed batches, {} failed keys)",
        summary.rows_upserted, summary.batches_failed, summary.keys_failed
    );
    summary
}

/// Batches and upserts rows that are already in hand, e.g. a roster seed.
pub fn upsert_rows<T: Entity>(
    name: &str,
    rows: Vec<T>,
    store: &Store,
    batch_size: usize,
) -> PipelineSummary {
    let mut summary = PipelineSummary::new(name, rows.len());
    let run_id = begin_run(store, name, rows.len());
    let mut sink = Sink::new(store, batch_size);
    for row in rows {
        sink.push(row, &mut summary);
    }
    summary.keys_succeeded = summary.rows_normalized;
    sink.finish(&mut summary);
    finish_run(store, run_id, &summary);
    info!("{name}: {} rows upserted", summary.rows_upserted);
    summary
}

fn begin_run(store: &Store, name: &str, keys_total: usize) -> Option<i64> {
    match store.begin_run(name, keys_total) {
        Ok(id) => Some(id),
        Err(err) => {
            warn!("{name}: could not record ingest run: {err:#}");
            None
        }
    }
}

fn finish_run(store: &Store, run_id: Option<i64>, summary: &PipelineSummary) {
    let Some(run_id) = run_id else {
        return;
    };
    if let Err(err) = store.finish_run(run_id, summary) {
        warn!("{}: could not close ingest run {run_id}: {err:#}", summary.pipeline);
    }
}

/// Console report for the ingest binaries.
pub fn print_summaries(summaries: &[PipelineSummary], as_json: bool) -> anyhow::Result<()> {
    if as_json {
        println!("{}", serde_json::to_string_pretty(summaries)?);
        return Ok(());
    }
    for s in summaries {
        println!("{} complete", s.pipeline);
        println!(
            "  keys: {}/{} ok, {} empty, {} failed",
            s.keys_succeeded, s.keys_total, s.keys_empty, s.keys_failed
        );
        println!(
            "  rows: {} normalized, {} upserted, {} without key",
            s.rows_normalized, s.rows_upserted, s.rows_unkeyed
        );
        if s.batches_failed > 0 {
            println!("  failed batches: {}", s.batches_failed);
        }
        if !s.errors.is_empty() {
            println!("  errors: {}", s.errors.len());
            for err in s.errors.iter().take(8) {
                println!("   - {err}");
            }
        }
    }
    Ok(())
}
