//! Demo arena seeded into an empty store for local runs.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use rust_decimal::Decimal;
use tracing::info;

use crate::arena::{
    Agent, Decision, Market, Model, PortfolioSnapshot, Position, PositionStatus, Season,
    SeasonStatus, Side, Trade, TradeType,
};
use crate::store::{SqliteArenaStore, StoreError};

const DEMO_MODELS: [(&str, &str, &str, &str); 4] = [
    ("gpt-5-2", "GPT-5.2", "OpenAI", "#10B981"),
    ("claude-opus-4-5", "Claude Opus 4.5", "Anthropic", "#F59E0B"),
    ("gemini-3-pro", "Gemini 3 Pro", "Google", "#3B82F6"),
    ("grok-4", "Grok 4", "xAI", "#8B5CF6"),
];

/// Hourly portfolio values per demo model, oldest first. Rows cross twice so
/// the rank-change feed has something to show.
const DEMO_CURVES: [[i64; 6]; 4] = [
    [10_000, 10_040, 10_120, 10_090, 10_060, 10_020],
    [10_000, 10_010, 9_980, 10_110, 10_150, 10_210],
    [10_000, 9_950, 9_900, 9_940, 10_080, 10_130],
    [10_000, 10_020, 10_050, 10_030, 9_970, 9_920],
];

pub const DEMO_INITIAL_BALANCE: i64 = 10_000;

/// Seeds two seasons (one completed, one active) with agents, markets,
/// positions, trades, decisions and hourly snapshots ending at `now`.
pub fn seed_demo(store: &SqliteArenaStore, now: DateTime<Utc>) -> Result<(), StoreError> {
    let initial_balance = Decimal::from(DEMO_INITIAL_BALANCE);

    let past = Season {
        id: "season-1".to_string(),
        season_number: 1,
        status: SeasonStatus::Completed,
        initial_balance,
        started_at: now - ChronoDuration::days(35),
        completed_at: Some(now - ChronoDuration::days(8)),
    };
    let active = Season {
        id: "season-2".to_string(),
        season_number: 2,
        status: SeasonStatus::Active,
        initial_balance,
        started_at: now - ChronoDuration::days(7),
        completed_at: None,
    };
    store.insert_season(&past)?;
    store.insert_season(&active)?;

    for (id, name, provider, color) in DEMO_MODELS {
        store.insert_model(&Model {
            id: id.to_string(),
            display_name: name.to_string(),
            provider: provider.to_string(),
            color: Some(color.to_string()),
            is_active: true,
        })?;
    }

    for (market_id, question, outcome) in [
        ("market-fed", "Will the Fed cut rates in March?", Some("NO")),
        ("market-launch", "Will the rocket launch on schedule?", Some("YES")),
        ("market-election", "Will the incumbent win?", None),
    ] {
        store.insert_market(&Market {
            id: market_id.to_string(),
            question: question.to_string(),
            status: (if outcome.is_some() { "resolved" } else { "open" }).to_string(),
            resolution_outcome: outcome.map(str::to_string),
        })?;
    }

    for (model_idx, (model_id, ..)) in DEMO_MODELS.iter().enumerate() {
        let offset = Decimal::from(model_idx as i64 * 150);
        store.insert_agent(&Agent {
            id: format!("{}-{model_id}", past.id),
            model_id: model_id.to_string(),
            season_id: past.id.clone(),
            cash_balance: initial_balance + Decimal::from(300) - offset,
            total_invested: Decimal::ZERO,
            status: "completed".to_string(),
        })?;

        seed_active_agent(store, &active, model_idx, model_id, now)?;
    }

    info!(
        component = "demo",
        event = "demo.seeded",
        season_count = 2,
        model_count = DEMO_MODELS.len()
    );

    Ok(())
}

fn seed_active_agent(
    store: &SqliteArenaStore,
    season: &Season,
    model_idx: usize,
    model_id: &str,
    now: DateTime<Utc>,
) -> Result<(), StoreError> {
    let agent_id = format!("{}-{model_id}", season.id);
    let curve = DEMO_CURVES[model_idx];
    let latest = Decimal::from(curve[curve.len() - 1]);
    let stake = Decimal::new(400 + model_idx as i64 * 50, 0);

    store.insert_agent(&Agent {
        id: agent_id.clone(),
        model_id: model_id.to_string(),
        season_id: season.id.clone(),
        cash_balance: latest - stake,
        total_invested: stake,
        status: "active".to_string(),
    })?;

    store.insert_position(&Position {
        id: format!("{agent_id}-open"),
        agent_id: agent_id.clone(),
        market_id: "market-election".to_string(),
        side: if model_idx % 2 == 0 { Side::Yes } else { Side::No },
        shares: Decimal::from(1_000),
        avg_entry_price: stake / Decimal::from(1_000),
        current_value: Some(stake),
        unrealized_pnl: Some(Decimal::ZERO),
        realized_pnl: None,
        status: PositionStatus::Open,
        close_price: None,
    })?;

    // Everyone bet on both resolved markets; sides alternate so win rates differ.
    for (market_id, side, entry, close) in [
        (
            "market-fed",
            if model_idx < 2 { Side::No } else { Side::Yes },
            Decimal::new(62, 2),
            Decimal::new(if model_idx < 2 { 100 } else { 5 }, 2),
        ),
        (
            "market-launch",
            if model_idx % 2 == 0 { Side::Yes } else { Side::No },
            Decimal::new(45, 2),
            Decimal::new(if model_idx % 2 == 0 { 100 } else { 3 }, 2),
        ),
    ] {
        store.insert_position(&Position {
            id: format!("{agent_id}-{market_id}"),
            agent_id: agent_id.clone(),
            market_id: market_id.to_string(),
            side,
            shares: Decimal::from(200),
            avg_entry_price: entry,
            current_value: None,
            unrealized_pnl: None,
            realized_pnl: Some((close - entry) * Decimal::from(200)),
            status: PositionStatus::Closed,
            close_price: Some(close),
        })?;

        for (leg, trade_type, price) in [
            ("buy", TradeType::Buy, entry),
            ("sell", TradeType::Sell, close),
        ] {
            store.insert_trade(&Trade {
                id: format!("{agent_id}-{market_id}-{leg}"),
                agent_id: agent_id.clone(),
                market_id: market_id.to_string(),
                side,
                trade_type,
                shares: Decimal::from(200),
                price,
                total_amount: price * Decimal::from(200),
                realized_pnl: (trade_type == TradeType::Sell)
                    .then(|| (close - entry) * Decimal::from(200)),
                executed_at: Some(now - ChronoDuration::days(3)),
            })?;
        }
    }

    let hours = curve.len() as i64;
    for (idx, value) in curve.iter().enumerate() {
        store.insert_snapshot(&PortfolioSnapshot {
            agent_id: agent_id.clone(),
            total_value: Decimal::from(*value),
            snapshot_timestamp: now - ChronoDuration::hours(hours - 1 - idx as i64),
        })?;
    }

    for (idx, action) in ["BUY", "HOLD", "ERROR"].iter().enumerate() {
        store.insert_decision(&Decision {
            id: format!("{agent_id}-decision-{idx}"),
            agent_id: agent_id.clone(),
            season_id: season.id.clone(),
            action: action.to_string(),
            decision_timestamp: now - ChronoDuration::days(2 * idx as i64 + 1),
        })?;
    }

    Ok(())
}
