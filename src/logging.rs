use std::sync::Once;

static INIT: Once = Once::new();

/// Installs the `env_logger` backend. `RUST_LOG` overrides the `info` default.
/// Safe to call more than once.
pub fn init() {
    INIT.call_once(|| {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
            .filter_module("reqwest", log::LevelFilter::Warn)
            .filter_module("rustls", log::LevelFilter::Warn)
            .format_timestamp_secs()
            .format_target(false)
            .init();
    });
}
