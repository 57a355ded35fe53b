use std::ops::Range;

use log::info;
use rusqlite::types::Value;

use crate::coerce::{coerce_float, coerce_int, coerce_text};
use crate::config::slice_clamped;
use crate::fetcher::Fetcher;
use crate::pipeline::{PipelineSummary, run_pipeline, upsert_rows};
use crate::players::PlayerName;
use crate::schema::{Entity, PLAYER_SEASON_STATS, TableSpec};
use crate::stats_api::{RawRecord, StatsQuery, StatsSource};
use crate::store::Store;

pub const ROSTER_PIPELINE: &str = "player_names";
pub const CAREER_PIPELINE: &str = "player_season_stats";

/// One regular-season line from `playercareerstats`. A player traded
/// mid-season has one row per team plus a `TOT` row with team id 0.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerSeasonStat {
    pub player_id: Option<i64>,
    pub season_id: Option<String>,
    pub team_id: Option<i64>,
    pub league_id: Option<String>,
    pub team_abbreviation: Option<String>,
    pub player_age: Option<i64>,
    pub gp: Option<i64>,
    pub gs: Option<i64>,
    pub min: Option<f64>,
    pub fgm: Option<i64>,
    pub fga: Option<i64>,
    pub fg_pct: Option<f64>,
    pub fg3m: Option<i64>,
    pub fg3a: Option<i64>,
    pub fg3_pct: Option<f64>,
    pub ftm: Option<i64>,
    pub fta: Option<i64>,
    pub ft_pct: Option<f64>,
    pub oreb: Option<i64>,
    pub dreb: Option<i64>,
    pub reb: Option<i64>,
    pub ast: Option<i64>,
    pub stl: Option<i64>,
    pub blk: Option<i64>,
    pub tov: Option<i64>,
    pub pf: Option<i64>,
    pub pts: Option<i64>,
}

impl PlayerSeasonStat {
    pub fn from_record(r: &RawRecord) -> Self {
        Self {
            player_id: coerce_int(r.get("PLAYER_ID")),
            season_id: coerce_text(r.get("SEASON_ID")),
            team_id: coerce_int(r.get("TEAM_ID")),
            league_id: coerce_text(r.get("LEAGUE_ID")),
            team_abbreviation: coerce_text(r.get("TEAM_ABBREVIATION")),
            player_age: coerce_int(r.get("PLAYER_AGE")),
            gp: coerce_int(r.get("GP")),
            gs: coerce_int(r.get("GS")),
            min: coerce_float(r.get("MIN")),
            fgm: coerce_int(r.get("FGM")),
            fga: coerce_int(r.get("FGA")),
            fg_pct: coerce_float(r.get("FG_PCT")),
            fg3m: coerce_int(r.get("FG3M")),
            fg3a: coerce_int(r.get("FG3A")),
            fg3_pct: coerce_float(r.get("FG3_PCT")),
            ftm: coerce_int(r.get("FTM")),
            fta: coerce_int(r.get("FTA")),
            ft_pct: coerce_float(r.get("FT_PCT")),
            oreb: coerce_int(r.get("OREB")),
            dreb: coerce_int(r.get("DREB")),
            reb: coerce_int(r.get("REB")),
            ast: coerce_int(r.get("AST")),
            stl: coerce_int(r.get("STL")),
            blk: coerce_int(r.get("BLK")),
            tov: coerce_int(r.get("TOV")),
            pf: coerce_int(r.get("PF")),
            pts: coerce_int(r.get("PTS")),
        }
    }
}

impl Entity for PlayerSeasonStat {
    const TABLE: &'static TableSpec = &PLAYER_SEASON_STATS;

    fn row(&self) -> Vec<Value> {
        vec![
            self.player_id.into(),
            self.season_id.clone().into(),
            self.team_id.into(),
            self.league_id.clone().into(),
            self.team_abbreviation.clone().into(),
            self.player_age.into(),
            self.gp.into(),
            self.gs.into(),
            self.min.into(),
            self.fgm.into(),
            self.fga.into(),
            self.fg_pct.into(),
            self.fg3m.into(),
            self.fg3a.into(),
            self.fg3_pct.into(),
            self.ftm.into(),
            self.fta.into(),
            self.ft_pct.into(),
            self.oreb.into(),
            self.dreb.into(),
            self.reb.into(),
            self.ast.into(),
            self.stl.into(),
            self.blk.into(),
            self.tov.into(),
            self.pf.into(),
            self.pts.into(),
        ]
    }
}

/// Every player the league has on record, in source order. A failed or
/// empty listing yields an empty roster.
pub fn fetch_roster<S: StatsSource>(fetcher: &Fetcher<S>, season: &str) -> Vec<PlayerName> {
    fetcher
        .fetch(&StatsQuery::AllPlayers {
            season: season.to_string(),
        })
        .into_records()
        .iter()
        .map(PlayerName::from_record)
        .collect()
}

/// Seeds names for the sliced roster, then pulls career season lines per player.
pub fn run<S: StatsSource>(
    roster_season: &str,
    slice: &Range<usize>,
    fetcher: &Fetcher<S>,
    store: &Store,
    batch_size: usize,
) -> Vec<PipelineSummary> {
    let roster = fetch_roster(fetcher, roster_season);
    let players = slice_clamped(&roster, slice)
        .iter()
        .filter(|p| p.player_id.is_some())
        .cloned()
        .collect::<Vec<_>>();
    info!(
        "found {} players in roster, {} in range {}:{}",
        roster.len(),
        players.len(),
        slice.start,
        slice.end
    );

    let names = upsert_rows(ROSTER_PIPELINE, players.clone(), store, batch_size);
    let career = run_career(&players, fetcher, store, batch_size);
    vec![names, career]
}

pub fn run_career<S: StatsSource>(
    players: &[PlayerName],
    fetcher: &Fetcher<S>,
    store: &Store,
    batch_size: usize,
) -> PipelineSummary {
    run_pipeline(
        CAREER_PIPELINE,
        players,
        fetcher,
        store,
        batch_size,
        |p| StatsQuery::PlayerCareer {
            player_id: p.player_id.unwrap_or_default(),
        },
        |_, record| PlayerSeasonStat::from_record(record),
    )
}
