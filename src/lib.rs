pub mod batch;
pub mod coerce;
pub mod config;
pub mod fetcher;
pub mod http_client;
pub mod logging;
pub mod pipeline;
pub mod players;
pub mod schema;
pub mod season_stats;
pub mod stats_api;
pub mod store;
pub mod team_stats;
