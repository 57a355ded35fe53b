mod common;

use hoops_ingest::players;
use hoops_ingest::season_stats;
use hoops_ingest::stats_api::{MeasureType, RawRecord, StatsQuery};
use hoops_ingest::store::Store;
use hoops_ingest::team_stats;
use rusqlite::types::Value;
use serde_json::json;

use common::{Canned, CannedSource, count_rows, fetcher, record, temp_store};

fn base(season: &str) -> StatsQuery {
    StatsQuery::TeamSeason {
        season: season.to_string(),
        measure: MeasureType::Base,
    }
}

fn advanced(season: &str) -> StatsQuery {
    StatsQuery::TeamSeason {
        season: season.to_string(),
        measure: MeasureType::Advanced,
    }
}

fn team_record(team_id: i64, pts: Option<i64>) -> RawRecord {
    let mut r = record(&[
        ("TEAM_ID", json!(team_id)),
        ("GP", json!(82)),
        ("W", json!(50)),
        ("L", json!(32)),
        ("W_PCT", json!(0.61)),
    ]);
    if let Some(pts) = pts {
        r.insert("PTS".to_string(), json!(pts));
    }
    r
}

fn roster_entry(person_id: i64, display: &str) -> RawRecord {
    record(&[
        ("PERSON_ID", json!(person_id)),
        ("DISPLAY_LAST_COMMA_FIRST", json!(display)),
    ])
}

fn dump_team_rows(store: &Store) -> Vec<Vec<Value>> {
    let conn = store.open().expect("open");
    let mut stmt = conn
        .prepare("SELECT * FROM TeamStatsRegularSeason ORDER BY team_id, season_id")
        .expect("prepare");
    let cols = stmt.column_count();
    let rows = stmt
        .query_map([], |row| {
            (0..cols)
                .map(|i| row.get::<_, Value>(i))
                .collect::<Result<Vec<_>, _>>()
        })
        .expect("query")
        .collect::<Result<Vec<_>, _>>()
        .expect("rows");
    rows
}

#[test]
fn team_season_end_to_end_with_missing_points() {
    let (_dir, store) = temp_store();
    let source = CannedSource::default().with(
        base("2023-24"),
        Canned::Rows(vec![team_record(1, Some(9705)), team_record(2, None)]),
    );
    let fetcher = fetcher(source);
    let seasons = vec!["2023-24".to_string()];

    let summary = team_stats::run_base(&seasons, &fetcher, &store, 100);
    assert_eq!(summary.keys_succeeded, 1);
    assert_eq!(summary.batches_applied, 1);
    assert_eq!(summary.rows_upserted, 2);
    assert_eq!(count_rows(&store, "TeamStatsRegularSeason"), 2);

    let rows = dump_team_rows(&store);
    // pts is the 13th column.
    assert_eq!(rows[0][12], Value::Integer(9705));
    assert_eq!(rows[1][12], Value::Null);
    assert_eq!(rows[1][1], Value::Text("2023-24".to_string()));
}

#[test]
fn rerunning_the_same_batch_is_idempotent() {
    let (_dir, store) = temp_store();
    let source = CannedSource::default().with(
        base("2023-24"),
        Canned::Rows(vec![team_record(1, Some(100)), team_record(2, Some(200))]),
    );
    let fetcher = fetcher(source);
    let seasons = vec!["2023-24".to_string()];

    team_stats::run_base(&seasons, &fetcher, &store, 100);
    let first = dump_team_rows(&store);
    team_stats::run_base(&seasons, &fetcher, &store, 100);
    let second = dump_team_rows(&store);

    assert_eq!(first, second);
    assert_eq!(second.len(), 2);
}

#[test]
fn one_failing_season_does_not_stop_the_others() {
    let (_dir, store) = temp_store();
    let source = CannedSource::default()
        .with(base("2020-21"), Canned::Rows(vec![team_record(1, Some(1))]))
        .with(base("2021-22"), Canned::Error)
        .with(base("2022-23"), Canned::Rows(vec![team_record(1, Some(3))]));
    let fetcher = fetcher(source);
    let seasons = ["2020-21", "2021-22", "2022-23"].map(String::from).to_vec();

    let summary = team_stats::run_base(&seasons, &fetcher, &store, 100);
    assert_eq!(summary.keys_succeeded, 2);
    assert_eq!(summary.keys_failed, 1);
    assert!(summary.errors.iter().any(|e| e.starts_with("2021-22")));

    let seasons_stored = dump_team_rows(&store)
        .into_iter()
        .map(|row| row[1].clone())
        .collect::<Vec<_>>();
    assert_eq!(
        seasons_stored,
        vec![
            Value::Text("2020-21".to_string()),
            Value::Text("2022-23".to_string())
        ]
    );
    assert_eq!(fetcher.source().calls.borrow().len(), 3);
}

#[test]
fn empty_and_failed_keys_are_counted_apart() {
    let (_dir, store) = temp_store();
    let source = CannedSource::default().with(base("2021-22"), Canned::Error);
    let fetcher = fetcher(source);
    let seasons = ["2020-21", "2021-22"].map(String::from).to_vec();

    let summary = team_stats::run_base(&seasons, &fetcher, &store, 100);
    assert_eq!(summary.keys_empty, 1);
    assert_eq!(summary.keys_failed, 1);
    assert_eq!(summary.rows_upserted, 0);
    assert_eq!(summary.batches_applied, 0);
}

#[test]
fn rows_flush_in_batches_of_the_configured_size() {
    let (_dir, store) = temp_store();
    let records = (1..=250).map(|id| team_record(id, Some(id))).collect();
    let source = CannedSource::default().with(base("2023-24"), Canned::Rows(records));
    let fetcher = fetcher(source);
    let seasons = vec!["2023-24".to_string()];

    let summary = team_stats::run_base(&seasons, &fetcher, &store, 100);
    assert_eq!(summary.batches_applied, 3);
    assert_eq!(summary.rows_upserted, 250);
    assert_eq!(count_rows(&store, "TeamStatsRegularSeason"), 250);
}

#[test]
fn rows_without_team_id_are_dropped_not_fatal() {
    let (_dir, store) = temp_store();
    let mut orphan = team_record(0, Some(5));
    orphan.remove("TEAM_ID");
    let source = CannedSource::default().with(
        base("2023-24"),
        Canned::Rows(vec![orphan, team_record(7, Some(7))]),
    );
    let fetcher = fetcher(source);

    let summary = team_stats::run_base(&["2023-24".to_string()], &fetcher, &store, 100);
    assert_eq!(summary.rows_normalized, 2);
    assert_eq!(summary.rows_unkeyed, 1);
    assert_eq!(summary.rows_upserted, 1);
}

#[test]
fn advanced_ratings_layer_onto_base_rows() {
    let (_dir, store) = temp_store();
    let source = CannedSource::default()
        .with(base("2023-24"), Canned::Rows(vec![team_record(1, Some(9000))]))
        .with(
            advanced("2023-24"),
            Canned::Rows(vec![record(&[
                ("TEAM_ID", json!(1)),
                ("OFF_RATING", json!(118.5)),
                ("DEF_RATING", json!(110.25)),
            ])]),
        );
    let fetcher = fetcher(source);

    let summaries = team_stats::run(&["2023-24".to_string()], &fetcher, &store, 100);
    assert_eq!(summaries.len(), 2);

    let rows = dump_team_rows(&store);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0][12], Value::Integer(9000));
    assert_eq!(rows[0][18], Value::Real(118.5));
    assert_eq!(rows[0][19], Value::Real(110.25));
}

#[test]
fn season_stats_then_player_info() {
    let (_dir, store) = temp_store();
    let roster = vec![
        roster_entry(76001, "Abdelnaby, Alaa"),
        roster_entry(2544, "James, LeBron"),
        roster_entry(2403, "Nene"),
    ];
    let career = vec![
        record(&[
            ("PLAYER_ID", json!(2544)),
            ("SEASON_ID", json!("2003-04")),
            ("LEAGUE_ID", json!("00")),
            ("TEAM_ID", json!(1610612739)),
            ("PTS", json!(1654)),
        ]),
        record(&[
            ("PLAYER_ID", json!(2544)),
            ("SEASON_ID", json!("2004-05")),
            ("LEAGUE_ID", json!("00")),
            ("TEAM_ID", json!(1610612739)),
            ("PTS", json!("NaN")),
        ]),
    ];
    let source = CannedSource::default()
        .with(
            StatsQuery::AllPlayers {
                season: "2024-25".to_string(),
            },
            Canned::Rows(roster),
        )
        .with(StatsQuery::PlayerCareer { player_id: 2544 }, Canned::Rows(career))
        .with(StatsQuery::PlayerCareer { player_id: 2403 }, Canned::Error)
        .with(
            StatsQuery::PlayerInfo { player_id: 2544 },
            Canned::Rows(vec![record(&[
                ("FIRST_NAME", json!("LeBron")),
                ("LAST_NAME", json!("James")),
                ("HEIGHT", json!("6-9")),
                ("WEIGHT", json!("")),
                ("ROSTERSTATUS", json!("Active")),
            ])]),
        );
    let fetcher = fetcher(source);

    let summaries = season_stats::run("2024-25", &(1..3), &fetcher, &store, 100);
    assert_eq!(summaries[0].rows_upserted, 2);
    assert_eq!(summaries[1].keys_succeeded, 1);
    assert_eq!(summaries[1].keys_failed, 1);
    assert_eq!(count_rows(&store, "Players"), 2);
    assert_eq!(count_rows(&store, "PlayerStatsRegularSeason"), 2);

    let ids = store.player_ids().expect("player ids");
    assert_eq!(ids, vec![2544]);

    let info = players::run_info(&ids, &fetcher, &store, 100);
    assert_eq!(info.rows_upserted, 1);

    let conn = store.open().expect("open");
    let (height, weight, active): (Option<i64>, Option<i64>, i64) = conn
        .query_row(
            "SELECT height, weight, is_active FROM Players WHERE player_id = 2544",
            [],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
        )
        .expect("player row");
    assert_eq!(height, Some(81));
    assert_eq!(weight, None);
    assert_eq!(active, 1);
}

#[test]
fn every_run_is_recorded() {
    let (_dir, store) = temp_store();
    let source = CannedSource::default()
        .with(base("2023-24"), Canned::Rows(vec![team_record(1, Some(1))]))
        .with(base("2024-25"), Canned::Error);
    let fetcher = fetcher(source);
    let seasons = ["2023-24", "2024-25"].map(String::from).to_vec();

    team_stats::run_base(&seasons, &fetcher, &store, 100);

    let conn = store.open().expect("open");
    let (pipeline, total, ok, failed, upserted, finished, errors): (
        String,
        i64,
        i64,
        i64,
        i64,
        Option<String>,
        String,
    ) = conn
        .query_row(
            "SELECT pipeline, keys_total, keys_succeeded, keys_failed, rows_upserted,
                    finished_at, errors_json
             FROM ingest_runs",
            [],
            |r| {
                Ok((
                    r.get(0)?,
                    r.get(1)?,
                    r.get(2)?,
                    r.get(3)?,
                    r.get(4)?,
                    r.get(5)?,
                    r.get(6)?,
                ))
            },
        )
        .expect("run row");
    assert_eq!(pipeline, team_stats::BASE_PIPELINE);
    assert_eq!((total, ok, failed, upserted), (2, 1, 1, 1));
    assert!(finished.is_some());
    let errors: Vec<String> = serde_json::from_str(&errors).expect("errors json");
    assert_eq!(errors.len(), 1);
}
