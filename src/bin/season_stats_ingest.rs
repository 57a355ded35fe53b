use anyhow::{Result, anyhow};

use hoops_ingest::config::{PipelineConfig, StoreConfig, has_flag, parse_db_path_arg};
use hoops_ingest::fetcher::Fetcher;
use hoops_ingest::pipeline::print_summaries;
use hoops_ingest::stats_api::NbaStatsClient;
use hoops_ingest::store::Store;
use hoops_ingest::{logging, season_stats};

const DEFAULT_DELAY_MS: u64 = 1000;
const DEFAULT_SLICE: std::ops::Range<usize> = 5200..5500;

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    logging::init();

    let store = Store::new(StoreConfig::resolve(parse_db_path_arg())?);
    store.init_schema()?;

    let config = PipelineConfig::from_env(DEFAULT_DELAY_MS, DEFAULT_SLICE);
    // The all-players listing is keyed by season; the latest one covers every era.
    let roster_season = config
        .seasons
        .last()
        .cloned()
        .ok_or_else(|| anyhow!("no season resolved for the player listing"))?;
    let fetcher = Fetcher::new(NbaStatsClient::new(config.request_timeout)?, config.delay);

    let summaries = season_stats::run(
        &roster_season,
        &config.player_slice,
        &fetcher,
        &store,
        config.batch_size,
    );

    println!("DB: {}", store.config().db_path.display());
    print_summaries(&summaries, has_flag("--json"))
}
