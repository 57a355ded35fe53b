use rusqlite::types::Value;

use crate::coerce::{coerce_float, coerce_int, coerce_text};
use crate::fetcher::Fetcher;
use crate::pipeline::{PipelineSummary, run_pipeline};
use crate::schema::{Entity, TEAM_ADVANCED_RATINGS, TEAM_SEASON_STATS, TableSpec};
use crate::stats_api::{MeasureType, RawRecord, StatsQuery, StatsSource};
use crate::store::Store;

pub const BASE_PIPELINE: &str = "team_season_stats";
pub const ADVANCED_PIPELINE: &str = "team_advanced_ratings";

#[derive(Debug, Clone, PartialEq)]
pub struct TeamSeasonStat {
    pub team_id: Option<i64>,
    pub season_id: String,
    pub gp: Option<i64>,
    pub w: Option<i64>,
    pub l: Option<i64>,
    pub win_pct: Option<f64>,
    pub fgm: Option<i64>,
    pub fga: Option<i64>,
    pub fg3m: Option<i64>,
    pub fg3a: Option<i64>,
    pub ftm: Option<i64>,
    pub fta: Option<i64>,
    pub pts: Option<i64>,
    pub reb: Option<i64>,
    pub ast: Option<i64>,
    pub stl: Option<i64>,
    pub blk: Option<i64>,
    pub tov: Option<i64>,
    pub off_rating: Option<f64>,
    pub def_rating: Option<f64>,
    pub plus_minus: Option<f64>,
}

impl TeamSeasonStat {
    /// The dashboard rarely carries `SEASON_ID`; the requested season fills in.
    pub fn from_record(season: &str, r: &RawRecord) -> Self {
        Self {
            team_id: coerce_int(r.get("TEAM_ID")),
            season_id: coerce_text(r.get("SEASON_ID")).unwrap_or_else(|| season.to_string()),
            gp: coerce_int(r.get("GP")),
            w: coerce_int(r.get("W")),
            l: coerce_int(r.get("L")),
            win_pct: coerce_float(r.get("W_PCT")),
            fgm: coerce_int(r.get("FGM")),
            fga: coerce_int(r.get("FGA")),
            fg3m: coerce_int(r.get("FG3M")),
            fg3a: coerce_int(r.get("FG3A")),
            ftm: coerce_int(r.get("FTM")),
            fta: coerce_int(r.get("FTA")),
            pts: coerce_int(r.get("PTS")),
            reb: coerce_int(r.get("REB")),
            ast: coerce_int(r.get("AST")),
            stl: coerce_int(r.get("STL")),
            blk: coerce_int(r.get("BLK")),
            tov: coerce_int(r.get("TOV")),
            off_rating: coerce_float(r.get("OFF_RATING")),
            def_rating: coerce_float(r.get("DEF_RATING")),
            plus_minus: coerce_float(r.get("PLUS_MINUS")),
        }
    }
}

impl Entity for TeamSeasonStat {
    const TABLE: &'static TableSpec = &TEAM_SEASON_STATS;

    fn row(&self) -> Vec<Value> {
        vec![
            self.team_id.into(),
            Value::Text(self.season_id.clone()),
            self.gp.into(),
            self.w.into(),
            self.l.into(),
            self.win_pct.into(),
            self.fgm.into(),
            self.fga.into(),
            self.fg3m.into(),
            self.fg3a.into(),
            self.ftm.into(),
            self.fta.into(),
            self.pts.into(),
            self.reb.into(),
            self.ast.into(),
            self.stl.into(),
            self.blk.into(),
            self.tov.into(),
            self.off_rating.into(),
            self.def_rating.into(),
            self.plus_minus.into(),
        ]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TeamAdvancedRating {
    pub team_id: Option<i64>,
    pub season_id: String,
    pub off_rating: Option<f64>,
    pub def_rating: Option<f64>,
}

impl TeamAdvancedRating {
    pub fn from_record(season: &str, r: &RawRecord) -> Self {
        Self {
            team_id: coerce_int(r.get("TEAM_ID")),
            season_id: season.to_string(),
            off_rating: coerce_float(r.get("OFF_RATING")),
            def_rating: coerce_float(r.get("DEF_RATING")),
        }
    }
}

impl Entity for TeamAdvancedRating {
    const TABLE: &'static TableSpec = &TEAM_ADVANCED_RATINGS;

    fn row(&self) -> Vec<Value> {
        vec![
            self.team_id.into(),
            Value::Text(self.season_id.clone()),
            self.off_rating.into(),
            self.def_rating.into(),
        ]
    }
}

pub fn run_base<S: StatsSource>(
    seasons: &[String],
    fetcher: &Fetcher<S>,
    store: &Store,
    batch_size: usize,
) -> PipelineSummary {
    run_pipeline(
        BASE_PIPELINE,
        seasons,
        fetcher,
        store,
        batch_size,
        |season| StatsQuery::TeamSeason {
            season: season.clone(),
            measure: MeasureType::Base,
        },
        |season, record| TeamSeasonStat::from_record(season, record),
    )
}

pub fn run_advanced<S: StatsSource>(
    seasons: &[String],
    fetcher: &Fetcher<S>,
    store: &Store,
    batch_size: usize,
) -> PipelineSummary {
    run_pipeline(
        ADVANCED_PIPELINE,
        seasons,
        fetcher,
        store,
        batch_size,
        |season| StatsQuery::TeamSeason {
            season: season.clone(),
            measure: MeasureType::Advanced,
        },
        |season, record| TeamAdvancedRating::from_record(season, record),
    )
}

/// Base stats for every season, then advanced ratings layered on top.
pub fn run<S: StatsSource>(
    seasons: &[String],
    fetcher: &Fetcher<S>,
    store: &Store,
    batch_size: usize,
) -> Vec<PipelineSummary> {
    vec![
        run_base(seasons, fetcher, store, batch_size),
        run_advanced(seasons, fetcher, store, batch_size),
    ]
}
