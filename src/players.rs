use std::fmt;

use rusqlite::types::Value;

use crate::coerce::{coerce_date, coerce_height, coerce_int, coerce_text};
use crate::fetcher::Fetcher;
use crate::pipeline::{PipelineSummary, run_pipeline};
use crate::schema::{Entity, PLAYER_BIOS, PLAYER_NAMES, TableSpec};
use crate::stats_api::{RawRecord, StatsQuery, StatsSource};
use crate::store::Store;

pub const INFO_PIPELINE: &str = "player_info";

/// Biographical row from `commonplayerinfo`.
#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub player_id: i64,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub birthdate: Option<String>,
    pub country: Option<String>,
    /// Total inches.
    pub height: Option<i64>,
    pub weight: Option<i64>,
    pub position: Option<String>,
    pub is_active: bool,
}

impl Player {
    pub fn from_record(player_id: i64, r: &RawRecord) -> Self {
        Self {
            player_id,
            first_name: coerce_text(r.get("FIRST_NAME")),
            last_name: coerce_text(r.get("LAST_NAME")),
            birthdate: coerce_date(r.get("BIRTHDATE")),
            country: coerce_text(r.get("COUNTRY")),
            height: coerce_height(r.get("HEIGHT")),
            weight: coerce_int(r.get("WEIGHT")),
            position: coerce_text(r.get("POSITION")),
            is_active: r
                .get("ROSTERSTATUS")
                .and_then(|v| v.as_str())
                .is_some_and(|s| s == "Active"),
        }
    }
}

impl Entity for Player {
    const TABLE: &'static TableSpec = &PLAYER_BIOS;

    fn row(&self) -> Vec<Value> {
        vec![
            Value::Integer(self.player_id),
            self.first_name.clone().into(),
            self.last_name.clone().into(),
            self.birthdate.clone().into(),
            self.country.clone().into(),
            self.height.into(),
            self.weight.into(),
            self.position.clone().into(),
            self.is_active.into(),
        ]
    }
}

/// Id and name only; seeds `Players` before career stats are pulled.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerName {
    pub player_id: Option<i64>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl PlayerName {
    /// Reads a `commonallplayers` row, whose name comes as `"Last, First"`.
    pub fn from_record(r: &RawRecord) -> Self {
        let (first_name, last_name) = coerce_text(r.get("DISPLAY_LAST_COMMA_FIRST"))
            .map(|raw| split_last_comma_first(&raw))
            .unwrap_or((None, None));
        Self {
            player_id: coerce_int(r.get("PERSON_ID")),
            first_name,
            last_name,
        }
    }
}

impl fmt::Display for PlayerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let first = self.first_name.as_deref().unwrap_or_default();
        let last = self.last_name.as_deref().unwrap_or_default();
        match self.player_id {
            Some(id) => write!(f, "{} (ID: {id})", format!("{first} {last}").trim()),
            None => write!(f, "{}", format!("{first} {last}").trim()),
        }
    }
}

impl Entity for PlayerName {
    const TABLE: &'static TableSpec = &PLAYER_NAMES;

    fn row(&self) -> Vec<Value> {
        vec![
            self.player_id.into(),
            self.first_name.clone().into(),
            self.last_name.clone().into(),
        ]
    }
}

// Single-word names ("Nene") land in last_name.
fn split_last_comma_first(raw: &str) -> (Option<String>, Option<String>) {
    let non_empty = |s: &str| {
        let s = s.trim();
        (!s.is_empty()).then(|| s.to_string())
    };
    match raw.split_once(',') {
        Some((last, first)) => (non_empty(first), non_empty(last)),
        None => (None, non_empty(raw)),
    }
}

/// Enriches the given player ids with `commonplayerinfo` bios.
pub fn run_info<S: StatsSource>(
    player_ids: &[i64],
    fetcher: &Fetcher<S>,
    store: &Store,
    batch_size: usize,
) -> PipelineSummary {
    run_pipeline(
        INFO_PIPELINE,
        player_ids,
        fetcher,
        store,
        batch_size,
        |id| StatsQuery::PlayerInfo { player_id: *id },
        |id, record| Player::from_record(*id, record),
    )
}
