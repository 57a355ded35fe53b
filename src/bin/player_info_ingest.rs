use anyhow::Result;

use hoops_ingest::config::{
    PipelineConfig, StoreConfig, has_flag, parse_db_path_arg, slice_clamped,
};
use hoops_ingest::fetcher::Fetcher;
use hoops_ingest::pipeline::print_summaries;
use hoops_ingest::stats_api::NbaStatsClient;
use hoops_ingest::store::Store;
use hoops_ingest::{logging, players};

const DEFAULT_DELAY_MS: u64 = 800;
const DEFAULT_SLICE: std::ops::Range<usize> = 5000..5500;

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    logging::init();

    let store = Store::new(StoreConfig::resolve(parse_db_path_arg())?);
    store.init_schema()?;

    let config = PipelineConfig::from_env(DEFAULT_DELAY_MS, DEFAULT_SLICE);
    let all_ids = store.player_ids()?;
    let ids = slice_clamped(&all_ids, &config.player_slice);
    log::info!(
        "found {} players to enrich in range {}:{}",
        ids.len(),
        config.player_slice.start,
        config.player_slice.end
    );

    let fetcher = Fetcher::new(NbaStatsClient::new(config.request_timeout)?, config.delay);
    let summary = players::run_info(ids, &fetcher, &store, config.batch_size);

    println!("DB: {}", store.config().db_path.display());
    print_summaries(&[summary], has_flag("--json"))
}
