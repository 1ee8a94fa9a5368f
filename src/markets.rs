//! Markets the active season's agents currently hold positions in.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::arena::{HeldPosition, Market, ModelIdentity, Side, TradeScope, TradeWithContext};
use crate::error::ArenaError;
use crate::store::ArenaStore;

/// Trades listed on a market detail, newest first.
pub const MARKET_TRADE_LIMIT: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketPosition {
    pub position_id: String,
    pub model: ModelIdentity,
    pub side: Side,
    pub shares: Decimal,
    pub avg_entry_price: Decimal,
    pub cost_basis: Decimal,
    pub current_value: Decimal,
    /// Unrealized return on cost basis; zero when nothing was paid.
    pub pnl_percent: Decimal,
}

impl From<&HeldPosition> for MarketPosition {
    fn from(held: &HeldPosition) -> Self {
        let position = &held.position;
        let cost_basis = position.shares * position.avg_entry_price;
        let current_value = position.current_value.unwrap_or_default();
        let pnl_percent = if cost_basis > Decimal::ZERO {
            (current_value - cost_basis)
                .checked_div(cost_basis)
                .map(|ratio| ratio * Decimal::ONE_HUNDRED)
                .unwrap_or_default()
        } else {
            Decimal::ZERO
        };

        Self {
            position_id: position.id.clone(),
            model: held.model.clone(),
            side: position.side,
            shares: position.shares,
            avg_entry_price: position.avg_entry_price,
            cost_basis,
            current_value,
            pnl_percent,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketSummary {
    pub market: Market,
    pub positions: Vec<MarketPosition>,
    pub total_invested: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketDetail {
    pub market: Market,
    pub positions: Vec<MarketPosition>,
    pub trades: Vec<TradeWithContext>,
}

/// Groups held positions by market, most invested first. Positions whose
/// market row is missing are left out.
pub fn group_by_market(held: &[HeldPosition]) -> Vec<MarketSummary> {
    let mut order: Vec<&str> = Vec::new();
    let mut grouped: HashMap<&str, MarketSummary> = HashMap::new();
    for row in held {
        let Some(market) = &row.market else {
            continue;
        };
        let summary = grouped.entry(market.id.as_str()).or_insert_with(|| {
            order.push(market.id.as_str());
            MarketSummary {
                market: market.clone(),
                positions: Vec::new(),
                total_invested: Decimal::ZERO,
            }
        });
        let position = MarketPosition::from(row);
        summary.total_invested += position.cost_basis;
        summary.positions.push(position);
    }

    let mut summaries: Vec<MarketSummary> = order
        .into_iter()
        .filter_map(|id| grouped.remove(id))
        .collect();
    summaries.sort_by(|a, b| {
        b.total_invested
            .cmp(&a.total_invested)
            .then_with(|| a.market.id.cmp(&b.market.id))
    });
    summaries
}

/// Markets held in the active season; empty when no season is active.
pub fn load_markets(store: &dyn ArenaStore) -> Result<Vec<MarketSummary>, ArenaError> {
    let held = active_season_positions(store)?;
    let markets = group_by_market(&held);

    info!(
        component = "markets",
        event = "markets.computed",
        market_count = markets.len(),
        position_count = held.len()
    );

    Ok(markets)
}

/// One market with the active season's positions in it and its latest
/// trades. `None` when the market does not exist.
pub fn load_market_detail(
    store: &dyn ArenaStore,
    market_id: &str,
) -> Result<Option<MarketDetail>, ArenaError> {
    let Some(market) = store
        .market(market_id)
        .map_err(ArenaError::fetch("market"))?
    else {
        return Ok(None);
    };

    let positions = active_season_positions(store)?
        .iter()
        .filter(|held| held.position.market_id == market.id)
        .map(MarketPosition::from)
        .collect::<Vec<_>>();
    let trades = store
        .trade_activity(TradeScope::Market(&market.id), MARKET_TRADE_LIMIT)
        .map_err(ArenaError::fetch("market trades"))?;

    info!(
        component = "markets",
        event = "markets.detail_computed",
        market_id = %market.id,
        position_count = positions.len(),
        trade_count = trades.len()
    );

    Ok(Some(MarketDetail {
        market,
        positions,
        trades,
    }))
}

fn active_season_positions(store: &dyn ArenaStore) -> Result<Vec<HeldPosition>, ArenaError> {
    let Some(season) = store
        .active_season()
        .map_err(ArenaError::fetch("active season"))?
    else {
        return Ok(Vec::new());
    };
    store
        .held_positions(&season.id)
        .map_err(ArenaError::fetch("held positions"))
}
