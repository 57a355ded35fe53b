use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use log::{error, info};
use rusqlite::{Connection, params, params_from_iter};

use crate::config::StoreConfig;
use crate::pipeline::PipelineSummary;
use crate::schema::{Entity, PLAYER_STATS_TABLE, SCHEMA_SQL};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq)]
pub enum UpsertOutcome {
    /// Empty batch, nothing was opened.
    Skipped,
    Applied(usize),
    /// The whole batch was rolled back.
    Failed(String),
}

/// Upsert sink. Holds only configuration: every call opens its own
/// connection and drops it before returning.
#[derive(Debug, Clone)]
pub struct Store {
    config: StoreConfig,
}

impl Store {
    pub fn new(config: StoreConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn open(&self) -> Result<Connection> {
        let path = &self.config.db_path;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create db dir {}", parent.display()))?;
        }
        let conn = Connection::open(path)
            .with_context(|| format!("open sqlite db {}", path.display()))?;
        conn.busy_timeout(BUSY_TIMEOUT)
            .context("set sqlite busy timeout")?;
        Ok(conn)
    }

    pub fn init_schema(&self) -> Result<()> {
        let conn = self.open()?;
        conn.execute_batch("PRAGMA journal_mode = WAL;")
            .context("enable wal")?;
        conn.execute_batch(SCHEMA_SQL)
            .context("create sqlite schema")?;
        Ok(())
    }

    /// Writes one batch in a single transaction. Errors are logged and
    /// reported through the outcome, never raised.
    pub fn upsert<T: Entity>(&self, batch: &[T]) -> UpsertOutcome {
        if batch.is_empty() {
            return UpsertOutcome::Skipped;
        }
        match self.try_upsert(batch) {
            Ok(n) => {
                info!("upserted {n} rows into {}", T::TABLE.name);
                UpsertOutcome::Applied(n)
            }
            Err(err) => {
                error!("db error ({}): {err:#}", T::TABLE.name);
                UpsertOutcome::Failed(format!("{err:#}"))
            }
        }
    }

    fn try_upsert<T: Entity>(&self, batch: &[T]) -> Result<usize> {
        let mut conn = self.open()?;
        // Dropping an uncommitted transaction rolls it back.
        let tx = conn.transaction().context("begin upsert transaction")?;
        {
            let sql = T::TABLE.upsert_sql();
            let mut stmt = tx
                .prepare(&sql)
                .with_context(|| format!("prepare upsert into {}", T::TABLE.name))?;
            for item in batch {
                stmt.execute(params_from_iter(item.row()))
                    .with_context(|| format!("upsert into {}", T::TABLE.name))?;
            }
        }
        tx.commit().context("commit upsert transaction")?;
        Ok(batch.len())
    }

    /// Player ids that already have season stats, in id order.
    pub fn player_ids(&self) -> Result<Vec<i64>> {
        let conn = self.open()?;
        let sql = format!("SELECT DISTINCT player_id FROM {PLAYER_STATS_TABLE} ORDER BY player_id");
        let mut stmt = conn.prepare(&sql).context("prepare player id query")?;
        let rows = stmt
            .query_map([], |row| row.get::<_, i64>(0))
            .context("query player ids")?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row.context("decode player id")?);
        }
        Ok(out)
    }

    pub fn begin_run(&self, pipeline: &str, keys_total: usize) -> Result<i64> {
        let conn = self.open()?;
        conn.execute(
            "INSERT INTO ingest_runs(pipeline, started_at, keys_total) VALUES (?1, ?2, ?3)",
            params![pipeline, Utc::now().to_rfc3339(), keys_total as i64],
        )
        .context("insert ingest run")?;
        Ok(conn.last_insert_rowid())
    }

    pub fn finish_run(&self, run_id: i64, summary: &PipelineSummary) -> Result<()> {
        let conn = self.open()?;
        let errors_json =
            serde_json::to_string(&summary.errors).unwrap_or_else(|_| "[]".to_string());
        conn.execute(
            "UPDATE ingest_runs
             SET finished_at = ?1, keys_succeeded = ?2, keys_empty = ?3, keys_failed = ?4,
                 rows_upserted = ?5, batches_failed = ?6, errors_json = ?7
             WHERE run_id = ?8",
            params![
                Utc::now().to_rfc3339(),
                summary.keys_succeeded as i64,
                summary.keys_empty as i64,
                summary.keys_failed as i64,
                summary.rows_upserted as i64,
                summary.batches_failed as i64,
                errors_json,
                run_id
            ],
        )
        .context("update ingest run")?;
        Ok(())
    }
}
