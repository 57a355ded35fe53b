//! Thin client for the stats.nba.com JSON endpoints.
//!
//! Every endpoint answers with one or more tabular result sets
//! (`headers` + `rowSet`). We only ever read the first one and zip it into
//! name -> value records, leaving typing to the normalizers.

use std::fmt;
use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::Client;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::http_client::http_client;

const NBA_STATS_URL: &str = "https://stats.nba.com/stats";
const LEAGUE_ID: &str = "00";
const SEASON_TYPE: &str = "Regular Season";
const ERROR_BODY_PREVIEW: usize = 200;

pub type RawRecord = Map<String, Value>;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("http {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("invalid payload: {0}")]
    Payload(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeasureType {
    /// Season totals.
    Base,
    /// Per-game offensive/defensive ratings.
    Advanced,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StatsQuery {
    TeamSeason { season: String, measure: MeasureType },
    PlayerInfo { player_id: i64 },
    PlayerCareer { player_id: i64 },
    AllPlayers { season: String },
}

impl StatsQuery {
    pub fn endpoint(&self) -> &'static str {
        match self {
            StatsQuery::TeamSeason { .. } => "leaguedashteamstats",
            StatsQuery::PlayerInfo { .. } => "commonplayerinfo",
            StatsQuery::PlayerCareer { .. } => "playercareerstats",
            StatsQuery::AllPlayers { .. } => "commonallplayers",
        }
    }

    pub fn params(&self) -> Vec<(&'static str, String)> {
        match self {
            StatsQuery::TeamSeason { season, measure } => {
                let (measure_type, per_mode) = match measure {
                    MeasureType::Base => ("Base", "Totals"),
                    MeasureType::Advanced => ("Advanced", "PerGame"),
                };
                let mut params = vec![
                    ("LeagueID", LEAGUE_ID.to_string()),
                    ("Season", season.clone()),
                    ("SeasonType", SEASON_TYPE.to_string()),
                    ("MeasureType", measure_type.to_string()),
                    ("PerMode", per_mode.to_string()),
                ];
                // The endpoint rejects requests that omit any of these, even when blank.
                for (key, value) in [
                    ("Conference", ""),
                    ("DateFrom", ""),
                    ("DateTo", ""),
                    ("Division", ""),
                    ("GameScope", ""),
                    ("GameSegment", ""),
                    ("LastNGames", "0"),
                    ("Location", ""),
                    ("Month", "0"),
                    ("OpponentTeamID", "0"),
                    ("Outcome", ""),
                    ("PORound", "0"),
                    ("PaceAdjust", "N"),
                    ("Period", "0"),
                    ("PlayerExperience", ""),
                    ("PlayerPosition", ""),
                    ("PlusMinus", "N"),
                    ("Rank", "N"),
                    ("SeasonSegment", ""),
                    ("ShotClockRange", ""),
                    ("StarterBench", ""),
                    ("TeamID", "0"),
                    ("TwoWay", "0"),
                    ("VsConference", ""),
                    ("VsDivision", ""),
                ] {
                    params.push((key, value.to_string()));
                }
                params
            }
            StatsQuery::PlayerInfo { player_id } => vec![
                ("PlayerID", player_id.to_string()),
                ("LeagueID", String::new()),
            ],
            StatsQuery::PlayerCareer { player_id } => vec![
                ("PlayerID", player_id.to_string()),
                ("PerMode", "Totals".to_string()),
                ("LeagueID", String::new()),
            ],
            StatsQuery::AllPlayers { season } => vec![
                ("LeagueID", LEAGUE_ID.to_string()),
                ("Season", season.clone()),
                ("IsOnlyCurrentSeason", "0".to_string()),
            ],
        }
    }
}

impl fmt::Display for StatsQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatsQuery::TeamSeason { season, measure } => {
                write!(f, "team stats ({measure:?}) season {season}")
            }
            StatsQuery::PlayerInfo { player_id } => write!(f, "player info {player_id}"),
            StatsQuery::PlayerCareer { player_id } => write!(f, "career stats {player_id}"),
            StatsQuery::AllPlayers { season } => write!(f, "all players as of {season}"),
        }
    }
}

/// Anything that can answer a [`StatsQuery`] with raw records.
pub trait StatsSource {
    fn fetch(&self, query: &StatsQuery) -> Result<Vec<RawRecord>, FetchError>;
}

pub struct NbaStatsClient {
    client: &'static Client,
    base_url: String,
}

impl NbaStatsClient {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        Ok(Self {
            client: http_client(timeout)?,
            base_url: NBA_STATS_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

impl StatsSource for NbaStatsClient {
    fn fetch(&self, query: &StatsQuery) -> Result<Vec<RawRecord>, FetchError> {
        let url = format!("{}/{}", self.base_url, query.endpoint());
        let resp = self.client.get(&url).query(&query.params()).send()?;
        let status = resp.status();
        let body = resp.text()?;
        if !status.is_success() {
            return Err(FetchError::Status {
                status,
                body: body.chars().take(ERROR_BODY_PREVIEW).collect(),
            });
        }
        parse_first_result_set(&body)
    }
}

/// Zips the first result set of a stats payload into records.
/// A blank or `null` body is "no data", not an error.
pub fn parse_first_result_set(body: &str) -> Result<Vec<RawRecord>, FetchError> {
    let trimmed = body.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(Vec::new());
    }
    let value: Value = serde_json::from_str(trimmed)
        .map_err(|err| FetchError::Payload(format!("invalid json: {err}")))?;

    let set = match value.get("resultSets").or_else(|| value.get("resultSet")) {
        Some(Value::Array(sets)) => match sets.first() {
            Some(first) => first,
            None => return Ok(Vec::new()),
        },
        Some(obj @ Value::Object(_)) => obj,
        _ => return Err(FetchError::Payload("missing resultSets".to_string())),
    };

    let headers = set
        .get("headers")
        .and_then(|h| h.as_array())
        .ok_or_else(|| FetchError::Payload("result set without headers".to_string()))?
        .iter()
        .map(|h| h.as_str().unwrap_or_default().to_string())
        .collect::<Vec<_>>();

    let Some(rows) = set.get("rowSet").and_then(|r| r.as_array()) else {
        return Ok(Vec::new());
    };

    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        let Some(cells) = row.as_array() else {
            continue;
        };
        let record = headers
            .iter()
            .cloned()
            .zip(cells.iter().cloned())
            .collect::<RawRecord>();
        out.push(record);
    }
    Ok(out)
}
