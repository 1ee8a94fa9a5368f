//! Trade activity feed: the newest trades across all models, optionally
//! narrowed to one model or one side.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::arena::{ModelIdentity, Side, TradeScope, TradeType, TradeWithContext};
use crate::error::ArenaError;
use crate::store::ArenaStore;

/// Trades fetched per feed, newest first.
pub const ACTIVITY_LIMIT: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityItem {
    pub trade_id: String,
    pub model: ModelIdentity,
    pub market_id: String,
    pub market_question: Option<String>,
    pub trade_type: TradeType,
    pub side: Side,
    pub shares: Decimal,
    pub price: Decimal,
    pub total_amount: Decimal,
    /// Only set on sells.
    pub realized_pnl: Option<Decimal>,
    pub executed_at: Option<DateTime<Utc>>,
}

impl From<&TradeWithContext> for ActivityItem {
    fn from(row: &TradeWithContext) -> Self {
        let trade = &row.trade;
        Self {
            trade_id: trade.id.clone(),
            model: row.model.clone(),
            market_id: trade.market_id.clone(),
            market_question: row.market_question.clone(),
            trade_type: trade.trade_type,
            side: trade.side,
            shares: trade.shares,
            price: trade.price,
            total_amount: trade.total_amount,
            realized_pnl: match trade.trade_type {
                TradeType::Sell => trade.realized_pnl,
                TradeType::Buy => None,
            },
            executed_at: trade.executed_at,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivityFilter {
    pub model_id: Option<String>,
    pub side: Option<Side>,
}

impl ActivityFilter {
    fn matches(&self, item: &ActivityItem) -> bool {
        self.model_id
            .as_deref()
            .map_or(true, |model_id| item.model.id == model_id)
            && self.side.map_or(true, |side| item.side == side)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityFeed {
    pub items: Vec<ActivityItem>,
    /// Every model seen in the fetched trades, by display name, so a client
    /// can offer them as filters regardless of the current filter.
    pub models: Vec<ModelIdentity>,
}

pub fn build_activity(trades: &[TradeWithContext], filter: &ActivityFilter) -> ActivityFeed {
    let mut models: BTreeMap<(&str, &str), &ModelIdentity> = BTreeMap::new();
    for row in trades {
        models
            .entry((row.model.display_name.as_str(), row.model.id.as_str()))
            .or_insert(&row.model);
    }

    ActivityFeed {
        items: trades
            .iter()
            .map(ActivityItem::from)
            .filter(|item| filter.matches(item))
            .collect(),
        models: models.into_values().cloned().collect(),
    }
}

pub fn load_activity(
    store: &dyn ArenaStore,
    filter: &ActivityFilter,
) -> Result<ActivityFeed, ArenaError> {
    let trades = store
        .trade_activity(TradeScope::All, ACTIVITY_LIMIT)
        .map_err(ArenaError::fetch("trade activity"))?;
    let feed = build_activity(&trades, filter);

    info!(
        component = "activity",
        event = "activity.computed",
        fetched = trades.len(),
        shown = feed.items.len(),
        model_filter = filter.model_id.as_deref().unwrap_or("all"),
        side_filter = filter.side.map(Side::as_str).unwrap_or("all")
    );

    Ok(feed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::Trade;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn identity(id: &str, name: &str) -> ModelIdentity {
        ModelIdentity {
            id: id.to_string(),
            display_name: name.to_string(),
            provider: "Lab".to_string(),
            color: "#000000".to_string(),
        }
    }

    fn row(id: &str, model: &ModelIdentity, side: Side, trade_type: TradeType) -> TradeWithContext {
        TradeWithContext {
            trade: Trade {
                id: id.to_string(),
                agent_id: format!("agent-{}", model.id),
                market_id: "m1".to_string(),
                side,
                trade_type,
                shares: dec!(10),
                price: dec!(0.4),
                total_amount: dec!(4),
                realized_pnl: Some(dec!(1.5)),
                executed_at: Some(Utc.with_ymd_and_hms(2026, 3, 2, 0, 0, 0).unwrap()),
            },
            model: model.clone(),
            market_question: Some("Will it rain?".to_string()),
        }
    }

    #[test]
    fn realized_pnl_is_only_reported_on_sells() {
        let zed = identity("zed", "Zed");
        let feed = build_activity(
            &[
                row("t2", &zed, Side::Yes, TradeType::Sell),
                row("t1", &zed, Side::Yes, TradeType::Buy),
            ],
            &ActivityFilter::default(),
        );

        assert_eq!(feed.items[0].realized_pnl, Some(dec!(1.5)));
        assert_eq!(feed.items[1].realized_pnl, None);
        assert_eq!(feed.items[0].market_question.as_deref(), Some("Will it rain?"));
    }

    #[test]
    fn filters_narrow_items_but_not_the_model_list() {
        let zed = identity("zed", "Zed");
        let amy = identity("amy", "Amy");
        let trades = vec![
            row("t4", &zed, Side::No, TradeType::Buy),
            row("t3", &amy, Side::Yes, TradeType::Buy),
            row("t2", &zed, Side::Yes, TradeType::Sell),
            row("t1", &zed, Side::Yes, TradeType::Buy),
        ];

        let feed = build_activity(
            &trades,
            &ActivityFilter {
                model_id: Some("zed".to_string()),
                side: Some(Side::Yes),
            },
        );

        let ids: Vec<&str> = feed.items.iter().map(|i| i.trade_id.as_str()).collect();
        assert_eq!(ids, vec!["t2", "t1"]);
        let names: Vec<&str> = feed.models.iter().map(|m| m.display_name.as_str()).collect();
        assert_eq!(names, vec!["Amy", "Zed"]);
    }
}
