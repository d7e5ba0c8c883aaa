use confique::Config as _;
use std::{sync::OnceLock, time::Duration};

#[derive(confique::Config)]
pub struct Config {
    /// Connection used by the binary for catalog introspection and live lookups.
    #[config(env = "PGCOMPLETE_DATABASE_URL")]
    pub database_url: Option<String>,
    #[config(env = "PGCOMPLETE_STATEMENT_TIMEOUT_MS", default = 200)]
    pub statement_timeout_ms: u64,
    #[config(env = "PGCOMPLETE_LIVE_CACHE_TTL_SECS", default = 30)]
    pub live_cache_ttl_secs: u64,
    #[config(env = "PGCOMPLETE_MAX_SUGGESTIONS", default = 500)]
    pub max_suggestions: usize,
    #[cfg(test)]
    #[config(env = "PGCOMPLETE_CONTAINER_RAMDISKED", default = true)]
    pub container_ramdisked: bool,
    #[cfg(test)]
    #[config(env = "PGCOMPLETE_CONTAINER_LOGS", default = false)]
    pub container_logs: bool,
}

impl Config {
    pub fn statement_timeout(&self) -> Duration {
        Duration::from_millis(self.statement_timeout_ms)
    }

    pub fn live_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.live_cache_ttl_secs)
    }
}

pub fn config() -> &'static Config {
    static CONFIG: OnceLock<Config> = OnceLock::new();
    CONFIG.get_or_init(|| {
        Config::builder()
            .env()
            .load()
            .expect("Failed to load one or more value configuration from the current environment")
    })
}
