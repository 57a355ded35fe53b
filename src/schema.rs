//! Destination tables and the upsert SQL generated from them.

use rusqlite::types::Value;

/// A write target: which table, which columns in which order, and the natural
/// key those columns start with.
#[derive(Debug)]
pub struct TableSpec {
    pub name: &'static str,
    /// Key columns first, in the same order as `key`.
    pub columns: &'static [&'static str],
    pub key: &'static [&'static str],
}

impl TableSpec {
    pub fn non_key_columns(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.columns
            .iter()
            .copied()
            .filter(|col| !self.key.contains(col))
    }

    /// `INSERT ... ON CONFLICT(<key>) DO UPDATE SET col = excluded.col` over
    /// every non-key column, so the latest write for a key wins.
    pub fn upsert_sql(&self) -> String {
        let placeholders = (1..=self.columns.len())
            .map(|i| format!("?{i}"))
            .collect::<Vec<_>>()
            .join(", ");
        let updates = self
            .non_key_columns()
            .map(|col| format!("{col} = excluded.{col}"))
            .collect::<Vec<_>>();
        let action = if updates.is_empty() {
            "DO NOTHING".to_string()
        } else {
            format!("DO UPDATE SET {}", updates.join(", "))
        };
        format!(
            "INSERT INTO {} ({}) VALUES ({}) ON CONFLICT({}) {}",
            self.name,
            self.columns.join(", "),
            placeholders,
            self.key.join(", "),
            action
        )
    }
}

/// A normalized, fixed-width row bound for one [`TableSpec`].
pub trait Entity {
    const TABLE: &'static TableSpec;

    /// Values in `TABLE.columns` order; absent fields are `Value::Null`.
    fn row(&self) -> Vec<Value>;

    fn has_key(&self) -> bool {
        self.row()
            .iter()
            .take(Self::TABLE.key.len())
            .all(|v| !matches!(v, Value::Null))
    }
}

pub const TEAM_STATS_TABLE: &str = "TeamStatsRegularSeason";
pub const PLAYERS_TABLE: &str = "Players";
pub const PLAYER_STATS_TABLE: &str = "PlayerStatsRegularSeason";

pub const TEAM_SEASON_STATS: TableSpec = TableSpec {
    name: TEAM_STATS_TABLE,
    columns: &[
        "team_id", "season_id", "gp", "w", "l", "win_pct", "fgm", "fga", "fg3m", "fg3a", "ftm",
        "fta", "pts", "reb", "ast", "stl", "blk", "tov", "off_rating", "def_rating",
        "plus_minus",
    ],
    key: &["team_id", "season_id"],
};

pub const TEAM_ADVANCED_RATINGS: TableSpec = TableSpec {
    name: TEAM_STATS_TABLE,
    columns: &["team_id", "season_id", "off_rating", "def_rating"],
    key: &["team_id", "season_id"],
};

pub const PLAYER_BIOS: TableSpec = TableSpec {
    name: PLAYERS_TABLE,
    columns: &[
        "player_id", "first_name", "last_name", "birthdate", "country", "height", "weight",
        "position", "is_active",
    ],
    key: &["player_id"],
};

pub const PLAYER_NAMES: TableSpec = TableSpec {
    name: PLAYERS_TABLE,
    columns: &["player_id", "first_name", "last_name"],
    key: &["player_id"],
};

pub const PLAYER_SEASON_STATS: TableSpec = TableSpec {
    name: PLAYER_STATS_TABLE,
    columns: &[
        "player_id", "season_id", "team_id", "league_id", "team_abbreviation", "player_age",
        "gp", "gs", "min", "fgm", "fga", "fg_pct", "fg3m", "fg3a", "fg3_pct", "ftm", "fta",
        "ft_pct", "oreb", "dreb", "reb", "ast", "stl", "blk", "tov", "pf", "pts",
    ],
    key: &["player_id", "season_id", "team_id"],
};

pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS TeamStatsRegularSeason (
    team_id INTEGER NOT NULL,
    season_id TEXT NOT NULL,
    gp INTEGER NULL,
    w INTEGER NULL,
    l INTEGER NULL,
    win_pct REAL NULL,
    fgm INTEGER NULL,
    fga INTEGER NULL,
    fg3m INTEGER NULL,
    fg3a INTEGER NULL,
    ftm INTEGER NULL,
    fta INTEGER NULL,
    pts INTEGER NULL,
    reb INTEGER NULL,
    ast INTEGER NULL,
    stl INTEGER NULL,
    blk INTEGER NULL,
    tov INTEGER NULL,
    off_rating REAL NULL,
    def_rating REAL NULL,
    plus_minus REAL NULL,
    PRIMARY KEY (team_id, season_id)
);

CREATE TABLE IF NOT EXISTS Players (
    player_id INTEGER PRIMARY KEY,
    first_name TEXT NULL,
    last_name TEXT NULL,
    birthdate TEXT NULL,
    country TEXT NULL,
    height INTEGER NULL,
    weight INTEGER NULL,
    position TEXT NULL,
    is_active INTEGER NULL
);

CREATE TABLE IF NOT EXISTS PlayerStatsRegularSeason (
    player_id INTEGER NOT NULL,
    season_id TEXT NOT NULL,
    team_id INTEGER NOT NULL,
    league_id TEXT NULL,
    team_abbreviation TEXT NULL,
    player_age INTEGER NULL,
    gp INTEGER NULL,
    gs INTEGER NULL,
    min REAL NULL,
    fgm INTEGER NULL,
    fga INTEGER NULL,
    fg_pct REAL NULL,
    fg3m INTEGER NULL,
    fg3a INTEGER NULL,
    fg3_pct REAL NULL,
    ftm INTEGER NULL,
    fta INTEGER NULL,
    ft_pct REAL NULL,
    oreb INTEGER NULL,
    dreb INTEGER NULL,
    reb INTEGER NULL,
    ast INTEGER NULL,
    stl INTEGER NULL,
    blk INTEGER NULL,
    tov INTEGER NULL,
    pf INTEGER NULL,
    pts INTEGER NULL,
    PRIMARY KEY (player_id, season_id, team_id)
);
CREATE INDEX IF NOT EXISTS idx_player_stats_season ON PlayerStatsRegularSeason(season_id);

CREATE TABLE IF NOT EXISTS ingest_runs (
    run_id INTEGER PRIMARY KEY AUTOINCREMENT,
    pipeline TEXT NOT NULL,
    started_at TEXT NOT NULL,
    finished_at TEXT NULL,
    keys_total INTEGER NOT NULL,
    keys_succeeded INTEGER NOT NULL DEFAULT 0,
    keys_empty INTEGER NOT NULL DEFAULT 0,
    keys_failed INTEGER NOT NULL DEFAULT 0,
    rows_upserted INTEGER NOT NULL DEFAULT 0,
    batches_failed INTEGER NOT NULL DEFAULT 0,
    errors_json TEXT NOT NULL DEFAULT '[]'
);
"#;
