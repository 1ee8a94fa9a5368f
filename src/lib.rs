//! ForecastPit arena core crate.
//!
//! Derived views over an arena of AI forecasting agents:
//! - leaderboard with per-agent betting statistics
//! - hourly rank-change detection for the activity feed
//! - countdown to the next Mon/Wed/Fri decision cycle
//! - portfolio value chart series and the season archive
//! - trade activity feed, model and market detail views
//!
//! All views read from an [`ArenaStore`]; [`SqliteArenaStore`] is the
//! persistent implementation served by the `arena_server` binary.

mod activity;
mod arena;
mod chart;
mod config;
mod countdown;
mod dashboard;
mod demo;
mod error;
mod leaderboard;
mod markets;
mod model_detail;
mod observability;
mod rank_changes;
mod seasons;
mod store;

pub use activity::{
    build_activity, load_activity, ActivityFeed, ActivityFilter, ActivityItem, ACTIVITY_LIMIT,
};
pub use arena::{
    Agent, AgentWithModel, Decision, HeldPosition, Market, Model, ModelIdentity, ModelSnapshot,
    ParseArenaError, PortfolioSnapshot, Position, PositionStatus, ResolvedPosition, Season,
    SeasonStatus, Side, Trade, TradeScope, TradeType, TradeWithContext, DEFAULT_MODEL_COLOR,
    UNKNOWN_PROVIDER,
};
pub use chart::{
    build_chart_series, is_decision_time, load_chart_series, ChartModel, ChartPoint, ChartSeries,
    DEFAULT_MAX_CHART_POINTS,
};
pub use config::{server_config_from_env, ServerConfig, DEFAULT_POLL_INTERVAL_SECS};
pub use countdown::{
    countdown, decision_day_name, is_decision_day, next_decision_cycle, time_left, CountdownTime,
    DECISION_DAYS,
};
pub use dashboard::{
    arena_router, describe_rank_change, format_money, format_percent, render_arena_html,
    DashboardSettings, LEADERBOARD_HEADERS,
};
pub use demo::{seed_demo, DEMO_INITIAL_BALANCE};
pub use error::ArenaError;
pub use leaderboard::{
    build_leaderboard, leaderboard_for_season, load_leaderboard, DegradedFetch, LeaderboardEntry,
    LeaderboardInputs, LeaderboardReport, SubFetch,
};
pub use markets::{
    group_by_market, load_market_detail, load_markets, MarketDetail, MarketPosition,
    MarketSummary, MARKET_TRADE_LIMIT,
};
pub use model_detail::{load_model_detail, ModelDetail, MODEL_RECENT_TRADES};
pub use observability::{
    init_logging, log_app_bind, log_app_start, log_poll_interval, log_store_selected,
    logging_config_from_env, LogFormat, LoggingConfig, LoggingInitError,
};
pub use rank_changes::{
    detect_rank_changes, hour_bucket, load_rank_changes, RankChange, MAX_RANK_CHANGES,
    RANK_CHANGE_LOOKBACK_HOURS,
};
pub use seasons::{
    load_season_detail, load_season_summaries, season_podium, PodiumModel, SeasonDetail,
    SeasonSummary, PODIUM_SIZE,
};
pub use store::{ArenaStore, SqliteArenaStore, StoreError};
