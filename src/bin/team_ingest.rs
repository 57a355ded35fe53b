use anyhow::{Result, anyhow};

use hoops_ingest::config::{PipelineConfig, StoreConfig, has_flag, parse_db_path_arg};
use hoops_ingest::fetcher::Fetcher;
use hoops_ingest::pipeline::print_summaries;
use hoops_ingest::stats_api::NbaStatsClient;
use hoops_ingest::store::Store;
use hoops_ingest::{logging, team_stats};

const DEFAULT_DELAY_MS: u64 = 1000;

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    logging::init();

    let store = Store::new(StoreConfig::resolve(parse_db_path_arg())?);
    store.init_schema()?;

    let config = PipelineConfig::from_env(DEFAULT_DELAY_MS, 0..usize::MAX);
    if config.seasons.is_empty() {
        return Err(anyhow!("no seasons resolved for ingest"));
    }
    let fetcher = Fetcher::new(NbaStatsClient::new(config.request_timeout)?, config.delay);

    let summaries = team_stats::run(&config.seasons, &fetcher, &store, config.batch_size);

    println!("DB: {}", store.config().db_path.display());
    println!("Seasons: {}", config.seasons.join(", "));
    print_summaries(&summaries, has_flag("--json"))
}
