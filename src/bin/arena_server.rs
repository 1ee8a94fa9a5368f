use std::sync::Arc;

use chrono::Utc;
use forecastpit::{
    arena_router, init_logging, log_app_bind, log_app_start, log_poll_interval,
    log_store_selected, logging_config_from_env, seed_demo, server_config_from_env, ArenaStore,
    DashboardSettings, SqliteArenaStore,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let logging_cfg = logging_config_from_env();
    init_logging(&logging_cfg)?;
    log_app_start(&logging_cfg);

    let config = server_config_from_env();
    let store = SqliteArenaStore::open(&config.db_path)?;

    let seeded = config.seed_demo && store.is_empty()?;
    if seeded {
        seed_demo(&store, Utc::now())?;
    }
    log_store_selected(&config.db_path, seeded);
    log_poll_interval(config.poll_interval_secs, config.rank_lookback_hours);

    let store: Arc<dyn ArenaStore> = Arc::new(store);
    let app = arena_router(store, DashboardSettings::from(&config));
    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    let bound_addr = listener.local_addr()?;

    log_app_bind(bound_addr);
    axum::serve(listener, app).await?;

    Ok(())
}
