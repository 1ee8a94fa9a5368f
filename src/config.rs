//! Server configuration read from `FORECASTPIT_*` environment variables.

use std::net::SocketAddr;
use std::path::PathBuf;

use crate::chart::DEFAULT_MAX_CHART_POINTS;
use crate::observability::{env_value, parse_bool};
use crate::rank_changes::RANK_CHANGE_LOOKBACK_HOURS;

pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 60;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub db_path: PathBuf,
    pub seed_demo: bool,
    pub rank_lookback_hours: i64,
    pub chart_max_points: usize,
    pub poll_interval_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            db_path: PathBuf::from("data/forecastpit.sqlite"),
            seed_demo: false,
            rank_lookback_hours: RANK_CHANGE_LOOKBACK_HOURS,
            chart_max_points: DEFAULT_MAX_CHART_POINTS,
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
        }
    }
}

/// Reads the server config; unset or unparsable values keep their defaults.
pub fn server_config_from_env() -> ServerConfig {
    let mut config = ServerConfig::default();

    if let Some(addr) = env_value("FORECASTPIT_ADDR").and_then(|raw| raw.parse().ok()) {
        config.addr = addr;
    }
    if let Some(path) = env_value("FORECASTPIT_DB_PATH") {
        config.db_path = PathBuf::from(path);
    }
    if let Some(seed) = env_value("FORECASTPIT_SEED_DEMO").and_then(|raw| parse_bool(&raw)) {
        config.seed_demo = seed;
    }
    if let Some(hours) = env_value("FORECASTPIT_RANK_LOOKBACK_HOURS")
        .and_then(|raw| raw.parse::<i64>().ok())
        .filter(|hours| *hours > 0)
    {
        config.rank_lookback_hours = hours;
    }
    if let Some(points) = env_value("FORECASTPIT_CHART_MAX_POINTS")
        .and_then(|raw| raw.parse::<usize>().ok())
        .filter(|points| *points > 0)
    {
        config.chart_max_points = points;
    }
    if let Some(secs) = env_value("FORECASTPIT_POLL_INTERVAL_SECS")
        .and_then(|raw| raw.parse::<u64>().ok())
        .filter(|secs| *secs > 0)
    {
        config.poll_interval_secs = secs;
    }

    config
}
