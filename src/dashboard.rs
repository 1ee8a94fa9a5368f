//! Arena dashboard: JSON endpoints for every derived view plus one HTML page
//! that polls them.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Deserialize;
use serde_json::json;
use tokio::task::JoinError;
use tracing::{error, info, warn};

use crate::activity::{load_activity, ActivityFeed, ActivityFilter};
use crate::arena::Side;
use crate::chart::load_chart_series;
use crate::config::ServerConfig;
use crate::countdown::{countdown, CountdownTime};
use crate::error::ArenaError;
use crate::leaderboard::{load_leaderboard, LeaderboardReport};
use crate::markets::{load_market_detail, load_markets, MarketDetail};
use crate::model_detail::{load_model_detail, ModelDetail};
use crate::rank_changes::{load_rank_changes, RankChange};
use crate::seasons::{load_season_detail, load_season_summaries, SeasonDetail};
use crate::store::ArenaStore;

pub const LEADERBOARD_HEADERS: [&str; 9] = [
    "Rank",
    "Model",
    "Provider",
    "Total Value",
    "P&L",
    "P&L %",
    "Bets",
    "Win Rate",
    "Avg Return",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DashboardSettings {
    pub rank_lookback_hours: i64,
    pub chart_max_points: usize,
    pub poll_interval_secs: u64,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self::from(&ServerConfig::default())
    }
}

impl From<&ServerConfig> for DashboardSettings {
    fn from(config: &ServerConfig) -> Self {
        Self {
            rank_lookback_hours: config.rank_lookback_hours,
            chart_max_points: config.chart_max_points,
            poll_interval_secs: config.poll_interval_secs,
        }
    }
}

#[derive(Clone)]
struct ArenaAppState {
    store: Arc<dyn ArenaStore>,
    settings: DashboardSettings,
}

pub fn arena_router(store: Arc<dyn ArenaStore>, settings: DashboardSettings) -> Router {
    Router::new()
        .route("/arena", get(get_arena_html))
        .route("/api/leaderboard", get(get_leaderboard))
        .route("/api/rank-changes", get(get_rank_changes))
        .route("/api/countdown", get(get_countdown))
        .route("/api/chart", get(get_chart))
        .route("/api/seasons", get(get_seasons))
        .route("/api/seasons/{season_number}", get(get_season_detail))
        .route("/api/activity", get(get_activity))
        .route("/api/models/{model_id}", get(get_model_detail))
        .route("/api/markets", get(get_markets))
        .route("/api/markets/{market_id}", get(get_market_detail))
        .with_state(ArenaAppState { store, settings })
}

#[derive(Debug)]
enum ApiFailure {
    Arena(ArenaError),
    Join(JoinError),
    NotFound(String),
    BadRequest(String),
}

struct ApiError {
    route: &'static str,
    failure: ApiFailure,
}

impl ApiError {
    fn not_found(route: &'static str, what: String) -> Self {
        Self {
            route,
            failure: ApiFailure::NotFound(what),
        }
    }

    fn bad_request(route: &'static str, reason: String) -> Self {
        Self {
            route,
            failure: ApiFailure::BadRequest(reason),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self.failure {
            ApiFailure::Arena(source) => (StatusCode::INTERNAL_SERVER_ERROR, source.to_string()),
            ApiFailure::Join(source) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("store task failed: {source}"),
            ),
            ApiFailure::NotFound(what) => (StatusCode::NOT_FOUND, format!("{what} not found")),
            ApiFailure::BadRequest(reason) => (StatusCode::BAD_REQUEST, reason),
        };
        if status.is_server_error() {
            error!(
                component = "dashboard",
                event = "http.error",
                route = self.route,
                error = %message
            );
        } else {
            warn!(
                component = "dashboard",
                event = "http.rejected",
                route = self.route,
                status = status.as_u16(),
                reason = %message
            );
        }
        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Runs a store-backed derivation on the blocking pool; SQLite calls must
/// not stall the async workers.
async fn run_blocking<T, F>(
    state: &ArenaAppState,
    route: &'static str,
    load: F,
) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&dyn ArenaStore) -> Result<T, ArenaError> + Send + 'static,
{
    let store = Arc::clone(&state.store);
    tokio::task::spawn_blocking(move || load(store.as_ref()))
        .await
        .map_err(|err| ApiError {
            route,
            failure: ApiFailure::Join(err),
        })?
        .map_err(|err| ApiError {
            route,
            failure: ApiFailure::Arena(err),
        })
}

async fn get_arena_html(State(state): State<ArenaAppState>) -> Result<Html<String>, ApiError> {
    info!(
        component = "dashboard",
        event = "http.arena.request"
    );
    let now = Utc::now();
    let lookback_hours = state.settings.rank_lookback_hours;
    let (report, changes) = run_blocking(&state, "/arena", move |store| {
        let report = load_leaderboard(store)?;
        let changes = load_rank_changes(store, now, lookback_hours)?;
        Ok((report, changes))
    })
    .await?;

    Ok(Html(render_arena_html(
        &report,
        &changes,
        &countdown(now),
        state.settings.poll_interval_secs,
    )))
}

async fn get_leaderboard(
    State(state): State<ArenaAppState>,
) -> Result<Json<LeaderboardReport>, ApiError> {
    let report = run_blocking(&state, "/api/leaderboard", load_leaderboard).await?;
    info!(
        component = "dashboard",
        event = "http.leaderboard.request",
        entry_count = report.entries.len(),
        partial = report.is_partial()
    );
    Ok(Json(report))
}

async fn get_rank_changes(
    State(state): State<ArenaAppState>,
) -> Result<Json<Vec<RankChange>>, ApiError> {
    let lookback_hours = state.settings.rank_lookback_hours;
    let changes = run_blocking(&state, "/api/rank-changes", move |store| {
        load_rank_changes(store, Utc::now(), lookback_hours)
    })
    .await?;
    info!(
        component = "dashboard",
        event = "http.rank_changes.request",
        change_count = changes.len()
    );
    Ok(Json(changes))
}

async fn get_countdown() -> impl IntoResponse {
    Json(countdown(Utc::now()))
}

async fn get_chart(State(state): State<ArenaAppState>) -> Result<impl IntoResponse, ApiError> {
    let max_points = state.settings.chart_max_points;
    let series = run_blocking(&state, "/api/chart", move |store| {
        load_chart_series(store, max_points)
    })
    .await?;
    Ok(Json(series))
}

async fn get_seasons(State(state): State<ArenaAppState>) -> Result<impl IntoResponse, ApiError> {
    let seasons = run_blocking(&state, "/api/seasons", load_season_summaries).await?;
    Ok(Json(seasons))
}

async fn get_season_detail(
    State(state): State<ArenaAppState>,
    Path(season_number): Path<i64>,
) -> Result<Json<SeasonDetail>, ApiError> {
    const ROUTE: &str = "/api/seasons/{season_number}";
    run_blocking(&state, ROUTE, move |store| {
        load_season_detail(store, season_number)
    })
    .await?
    .map(Json)
    .ok_or_else(|| ApiError::not_found(ROUTE, format!("season {season_number}")))
}

#[derive(Debug, Default, Deserialize)]
struct ActivityQuery {
    model: Option<String>,
    side: Option<String>,
}

async fn get_activity(
    State(state): State<ArenaAppState>,
    Query(query): Query<ActivityQuery>,
) -> Result<Json<ActivityFeed>, ApiError> {
    const ROUTE: &str = "/api/activity";
    let side = query
        .side
        .as_deref()
        .filter(|raw| !raw.trim().is_empty())
        .map(Side::parse)
        .transpose()
        .map_err(|err| ApiError::bad_request(ROUTE, err.to_string()))?;
    let filter = ActivityFilter {
        model_id: query.model.filter(|model| !model.trim().is_empty()),
        side,
    };

    let feed = run_blocking(&state, ROUTE, move |store| load_activity(store, &filter)).await?;
    info!(
        component = "dashboard",
        event = "http.activity.request",
        item_count = feed.items.len()
    );
    Ok(Json(feed))
}

async fn get_model_detail(
    State(state): State<ArenaAppState>,
    Path(model_id): Path<String>,
) -> Result<Json<ModelDetail>, ApiError> {
    const ROUTE: &str = "/api/models/{model_id}";
    let lookup = model_id.clone();
    run_blocking(&state, ROUTE, move |store| load_model_detail(store, &lookup))
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(ROUTE, format!("model {model_id}")))
}

async fn get_markets(State(state): State<ArenaAppState>) -> Result<impl IntoResponse, ApiError> {
    let markets = run_blocking(&state, "/api/markets", load_markets).await?;
    Ok(Json(markets))
}

async fn get_market_detail(
    State(state): State<ArenaAppState>,
    Path(market_id): Path<String>,
) -> Result<Json<MarketDetail>, ApiError> {
    const ROUTE: &str = "/api/markets/{market_id}";
    let lookup = market_id.clone();
    run_blocking(&state, ROUTE, move |store| load_market_detail(store, &lookup))
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(ROUTE, format!("market {market_id}")))
}

pub fn render_arena_html(
    report: &LeaderboardReport,
    changes: &[RankChange],
    countdown: &CountdownTime,
    poll_interval_secs: u64,
) -> String {
    let now_utc = Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string();

    let mut out = String::new();
    out.push_str("<!DOCTYPE html><html><head><meta charset=\"utf-8\">\n");
    out.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    out.push_str("<title>ForecastPit Arena</title>\n");
    out.push_str("<style>:root{--bg:#f4f1ea;--card:#ffffff;--ink:#15191d;--muted:#5f6a73;--line:#d7dce1;--head:#15191d;--up:#0f8a55;--down:#c23b2a}*{box-sizing:border-box}body{margin:0;color:var(--ink);font-family:\"Space Grotesk\",\"Segoe UI\",sans-serif;background:var(--bg)}.shell{max-width:1200px;margin:0 auto;padding:24px 18px}.hero{background:var(--head);color:#f7fbfc;padding:18px 20px;border:2px solid var(--ink)}.hero h1{margin:0 0 8px;font-size:1.6rem}.hero-meta{display:flex;gap:16px;flex-wrap:wrap;font-size:.92rem;color:#d9dee2}.card{margin-top:16px;background:var(--card);border:2px solid var(--ink);overflow:auto}table{width:100%;border-collapse:collapse}thead th{background:var(--head);color:#f2f7f9;font-size:.78rem;text-transform:uppercase;letter-spacing:.04em;padding:10px;text-align:left}tbody td{font-size:.88rem;padding:9px 10px;border-bottom:1px solid var(--line);white-space:nowrap}.swatch{display:inline-block;width:10px;height:10px;margin-right:8px;border:1px solid var(--ink)}.up{color:var(--up)}.down{color:var(--down)}.feed{list-style:none;margin:0;padding:0}.feed li{padding:10px 14px;border-bottom:1px solid var(--line)}.notice{padding:10px 14px;color:var(--muted)}</style>\n");
    out.push_str("</head><body><main class=\"shell\">\n");
    out.push_str("<section class=\"hero\"><h1>ForecastPit Arena</h1>");
    out.push_str("<div class=\"hero-meta\">\n");
    out.push_str(&format!(
        "<span id=\"countdown\">Next decision: {} in {}d {}h {}m</span>",
        escape_html(&countdown.next_day_name),
        countdown.days,
        countdown.hours,
        countdown.minutes
    ));
    out.push_str(&format!("<span>Models: {}</span>", report.entries.len()));
    out.push_str(&format!(
        "<span>Generated: {}</span>",
        escape_html(&now_utc)
    ));
    out.push_str("</div></section>\n");

    out.push_str("<section class=\"card\"><table id=\"leaderboard-table\">\n<thead><tr>");
    for header in LEADERBOARD_HEADERS {
        out.push_str("<th>");
        out.push_str(&escape_html(header));
        out.push_str("</th>");
    }
    out.push_str("</tr></thead><tbody id=\"leaderboard-body\">\n");
    for entry in &report.entries {
        let pnl_class = trend_class(entry.pnl);
        out.push_str(&format!("<tr data-rank=\"{}\">", entry.rank));
        out.push_str(&format!("<td>#{}</td>", entry.rank));
        out.push_str(&format!(
            "<td><span class=\"swatch\" style=\"background:{}\"></span>{}</td>",
            escape_html(&entry.color),
            escape_html(&entry.display_name)
        ));
        out.push_str(&format!("<td>{}</td>", escape_html(&entry.provider)));
        out.push_str(&format!("<td>{}</td>", format_money(entry.total_value)));
        out.push_str(&format!(
            "<td class=\"{pnl_class}\">{}</td>",
            format_money(entry.pnl)
        ));
        out.push_str(&format!(
            "<td class=\"{pnl_class}\">{}</td>",
            format_percent(Some(entry.pnl_percent))
        ));
        out.push_str(&format!("<td>{}</td>", entry.num_bets));
        out.push_str(&format!("<td>{}</td>", format_percent(entry.win_rate)));
        out.push_str(&format!("<td>{}</td>", format_percent(entry.avg_return)));
        out.push_str("</tr>\n");
    }
    out.push_str("</tbody></table>");
    if report.season_id.is_none() {
        out.push_str("<div class=\"notice\">No active season.</div>");
    }
    if report.is_partial() {
        out.push_str("<div class=\"notice\">Some data is temporarily unavailable; figures may be incomplete.</div>");
    }
    out.push_str("</section>\n");

    out.push_str("<section class=\"card\"><ul class=\"feed\" id=\"rank-feed\">\n");
    for change in changes {
        out.push_str("<li>");
        out.push_str(&escape_html(&describe_rank_change(change)));
        out.push_str("</li>\n");
    }
    if changes.is_empty() {
        out.push_str("<li class=\"notice\">No rank changes in the last window.</li>\n");
    }
    out.push_str("</ul></section>\n");

    out.push_str(&polling_script(poll_interval_secs));
    out.push_str("</main></body></html>\n");
    out
}

/// One-line feed text, e.g. `Grok 4 climbed from #3 to #1, overtaking GPT-5.2`.
pub fn describe_rank_change(change: &RankChange) -> String {
    let mut text = format!(
        "{} climbed from #{} to #{}",
        change.model_name, change.previous_rank, change.current_rank
    );
    if let Some(overtaken) = &change.overtook_model {
        text.push_str(", overtaking ");
        text.push_str(overtaken);
    }
    text.push_str(&format!(
        " ({} \u{2192} {}) at {}",
        format_money(change.previous_value),
        format_money(change.current_value),
        format_time(change.timestamp)
    ));
    text
}

/// `$12,345.68`, with a leading minus for losses.
pub fn format_money(value: Decimal) -> String {
    let rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let text = format!("{:.2}", rounded.abs());
    let (whole, frac) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (idx, ch) in whole.chars().enumerate() {
        if idx > 0 && (whole.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    format!("{sign}${grouped}.{frac}")
}

/// One decimal place with a percent sign; `-` when there is no value.
pub fn format_percent(value: Option<Decimal>) -> String {
    match value {
        Some(value) => format!(
            "{:.1}%",
            value.round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
        ),
        None => "-".to_string(),
    }
}

fn format_time(ts: DateTime<Utc>) -> String {
    ts.format("%b %-d %H:%M UTC").to_string()
}

fn trend_class(value: Decimal) -> &'static str {
    if value.is_sign_negative() && !value.is_zero() {
        "down"
    } else {
        "up"
    }
}

fn polling_script(poll_interval_secs: u64) -> String {
    let interval_ms = poll_interval_secs.saturating_mul(1_000);
    format!(
        "<script>
const esc=(s)=>String(s??'-').replace(/[&<>\"']/g,(c)=>({{'&':'&amp;','<':'&lt;','>':'&gt;','\"':'&quot;',\"'\":'&#39;'}}[c]));
const pct=(v)=>v===null||v===undefined?'-':Number(v).toFixed(1)+'%';
const usd=(v)=>Number(v).toLocaleString('en-US',{{style:'currency',currency:'USD'}});
async function refresh(){{
  try{{
    const board=await (await fetch('/api/leaderboard')).json();
    document.getElementById('leaderboard-body').innerHTML=board.entries.map((e)=>`<tr data-rank=\"${{e.rank}}\"><td>#${{e.rank}}</td><td><span class=\"swatch\" style=\"background:${{esc(e.color)}}\"></span>${{esc(e.display_name)}}</td><td>${{esc(e.provider)}}</td><td>${{usd(e.total_value)}}</td><td class=\"${{Number(e.pnl)<0?'down':'up'}}\">${{usd(e.pnl)}}</td><td class=\"${{Number(e.pnl)<0?'down':'up'}}\">${{pct(e.pnl_percent)}}</td><td>${{e.num_bets}}</td><td>${{pct(e.win_rate)}}</td><td>${{pct(e.avg_return)}}</td></tr>`).join('');
    const feed=await (await fetch('/api/rank-changes')).json();
    document.getElementById('rank-feed').innerHTML=feed.length===0?'<li class=\"notice\">No rank changes in the last window.</li>':feed.map((c)=>`<li>${{esc(c.model_name)}} climbed from #${{c.previous_rank}} to #${{c.current_rank}}${{c.overtook_model?', overtaking '+esc(c.overtook_model):''}}</li>`).join('');
    const cd=await (await fetch('/api/countdown')).json();
    document.getElementById('countdown').textContent=`Next decision: ${{cd.next_day_name}} in ${{cd.days}}d ${{cd.hours}}h ${{cd.minutes}}m`;
  }}catch(err){{console.error('arena refresh failed',err);}}
}}
setInterval(refresh, {interval_ms});
</script>\n"
    )
}

fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::countdown::time_left;
    use crate::leaderboard::LeaderboardEntry;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn entry(rank: usize, name: &str, pnl: Decimal) -> LeaderboardEntry {
        LeaderboardEntry {
            rank,
            agent_id: format!("agent-{rank}"),
            model_id: format!("model-{rank}"),
            display_name: name.to_string(),
            provider: "Lab".to_string(),
            color: "#10B981".to_string(),
            cash_balance: dec!(10000) + pnl,
            total_invested: dec!(0),
            total_value: dec!(10000) + pnl,
            pnl,
            pnl_percent: pnl / dec!(100),
            num_bets: 3,
            win_rate: None,
            wins: 0,
            losses: 0,
            avg_return: None,
            status: "active".to_string(),
        }
    }

    fn change() -> RankChange {
        RankChange {
            agent_id: "agent-c".to_string(),
            model_id: "model-c".to_string(),
            model_name: "Grok 4".to_string(),
            model_color: "#8B5CF6".to_string(),
            previous_rank: 3,
            current_rank: 1,
            previous_value: dec!(9900),
            current_value: dec!(10100),
            overtook_model: Some("GPT-5.2".to_string()),
            overtook_model_color: Some("#10B981".to_string()),
            timestamp: Utc.with_ymd_and_hms(2026, 3, 4, 9, 0, 0).unwrap(),
        }
    }

    #[test]
    fn money_is_grouped_and_signed() {
        assert_eq!(format_money(dec!(10210)), "$10,210.00");
        assert_eq!(format_money(dec!(-89.995)), "-$90.00");
        assert_eq!(format_money(dec!(1234567.891)), "$1,234,567.89");
        assert_eq!(format_money(dec!(0)), "$0.00");
        assert_eq!(format_money(dec!(-0.001)), "$0.00");
    }

    #[test]
    fn percent_formats_or_dashes() {
        assert_eq!(format_percent(Some(dec!(66.666))), "66.7%");
        assert_eq!(format_percent(Some(dec!(0))), "0.0%");
        assert_eq!(format_percent(None), "-");
    }

    #[test]
    fn rank_change_description_names_overtaken_model() {
        let text = describe_rank_change(&change());
        assert!(text.starts_with("Grok 4 climbed from #3 to #1, overtaking GPT-5.2"));
        assert!(text.contains("$9,900.00"));
        assert!(text.contains("Mar 4 09:00 UTC"));
    }

    #[test]
    fn rendered_html_has_rows_feed_and_polling() {
        let report = LeaderboardReport {
            season_id: Some("s2".to_string()),
            entries: vec![
                entry(1, "Claude <Opus>", dec!(210)),
                entry(2, "Grok 4", dec!(-80)),
            ],
            degraded: Vec::new(),
        };
        let now = Utc.with_ymd_and_hms(2026, 3, 3, 12, 0, 0).unwrap();
        let target = Utc.with_ymd_and_hms(2026, 3, 4, 0, 0, 0).unwrap();

        let html = render_arena_html(&report, &[change()], &time_left(target, now), 60);

        assert!(html.contains("leaderboard-table"));
        assert!(html.contains("Claude &lt;Opus&gt;"));
        assert!(html.contains("data-rank=\"2\""));
        assert!(html.contains("class=\"down\""));
        assert!(html.contains("overtaking GPT-5.2"));
        assert!(html.contains("Next decision: Wednesday in 0d 12h 0m"));
        assert!(html.contains("setInterval(refresh, 60000)"));
        assert!(!html.contains("No active season."));
    }

    #[test]
    fn empty_board_shows_notice() {
        let now = Utc.with_ymd_and_hms(2026, 3, 3, 12, 0, 0).unwrap();
        let html = render_arena_html(&LeaderboardReport::empty(), &[], &countdown(now), 60);

        assert!(html.contains("No active season."));
        assert!(html.contains("No rank changes in the last window."));
    }

    #[test]
    fn active_season_without_agents_has_no_missing_season_notice() {
        let report = LeaderboardReport {
            season_id: Some("s3".to_string()),
            entries: Vec::new(),
            degraded: Vec::new(),
        };
        let now = Utc.with_ymd_and_hms(2026, 3, 3, 12, 0, 0).unwrap();

        let html = render_arena_html(&report, &[], &countdown(now), 60);

        assert!(html.contains("Models: 0"));
        assert!(!html.contains("No active season."));
    }
}
