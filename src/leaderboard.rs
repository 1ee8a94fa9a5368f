//! Season leaderboard: per-agent valuation, P&L and resolved-bet statistics,
//! ranked by total portfolio value.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::arena::{AgentWithModel, Position, PositionStatus, ResolvedPosition, Season, Trade};
use crate::error::ArenaError;
use crate::store::{ArenaStore, StoreError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub agent_id: String,
    pub model_id: String,
    pub display_name: String,
    pub provider: String,
    pub color: String,
    pub cash_balance: Decimal,
    pub total_invested: Decimal,
    pub total_value: Decimal,
    pub pnl: Decimal,
    pub pnl_percent: Decimal,
    pub num_bets: u64,
    pub win_rate: Option<Decimal>,
    pub wins: u64,
    pub losses: u64,
    pub avg_return: Option<Decimal>,
    pub status: String,
}

/// Everything the builder reads, already fetched.
#[derive(Debug, Clone, Copy)]
pub struct LeaderboardInputs<'a> {
    pub initial_balance: Decimal,
    pub agents: &'a [AgentWithModel],
    pub open_positions: &'a [Position],
    pub trades: &'a [Trade],
    pub resolved_positions: &'a [ResolvedPosition],
}

/// Sub-fetches whose failure degrades the leaderboard instead of failing it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubFetch {
    OpenPositions,
    Trades,
    ResolvedPositions,
}

impl SubFetch {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OpenPositions => "open_positions",
            Self::Trades => "trades",
            Self::ResolvedPositions => "resolved_positions",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DegradedFetch {
    pub fetch: SubFetch,
    pub error: String,
}

/// Leaderboard plus a record of which inputs were missing when it was built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardReport {
    pub season_id: Option<String>,
    pub entries: Vec<LeaderboardEntry>,
    pub degraded: Vec<DegradedFetch>,
}

impl LeaderboardReport {
    pub fn empty() -> Self {
        Self {
            season_id: None,
            entries: Vec::new(),
            degraded: Vec::new(),
        }
    }

    pub fn is_partial(&self) -> bool {
        !self.degraded.is_empty()
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct ResolvedStats {
    wins: u64,
    losses: u64,
    return_sum: Decimal,
    return_count: u64,
}

pub fn build_leaderboard(inputs: &LeaderboardInputs<'_>) -> Vec<LeaderboardEntry> {
    let mut positions_value: HashMap<&str, Decimal> = HashMap::new();
    for position in inputs
        .open_positions
        .iter()
        .filter(|position| position.status == PositionStatus::Open)
    {
        *positions_value
            .entry(position.agent_id.as_str())
            .or_default() += position.current_value.unwrap_or_default();
    }

    let mut trade_counts: HashMap<&str, u64> = HashMap::new();
    for trade in inputs.trades {
        *trade_counts.entry(trade.agent_id.as_str()).or_default() += 1;
    }

    let mut resolved: HashMap<&str, ResolvedStats> = HashMap::new();
    for position in inputs.resolved_positions {
        let stats = resolved.entry(position.agent_id.as_str()).or_default();
        if position.is_win() {
            stats.wins += 1;
        } else {
            stats.losses += 1;
        }
        if let Some(return_pct) = position.return_pct() {
            stats.return_sum += return_pct;
            stats.return_count += 1;
        }
    }

    let mut entries: Vec<LeaderboardEntry> = inputs
        .agents
        .iter()
        .map(|row| {
            let agent = &row.agent;
            let identity = row.identity();
            let held = positions_value
                .get(agent.id.as_str())
                .copied()
                .unwrap_or_default();
            let total_value = agent.cash_balance + held;
            let pnl = total_value - inputs.initial_balance;
            let stats = resolved
                .get(agent.id.as_str())
                .copied()
                .unwrap_or_default();

            LeaderboardEntry {
                rank: 0,
                agent_id: agent.id.clone(),
                model_id: identity.id,
                display_name: identity.display_name,
                provider: identity.provider,
                color: identity.color,
                cash_balance: agent.cash_balance,
                total_invested: agent.total_invested,
                total_value,
                pnl,
                pnl_percent: percent_of(pnl, inputs.initial_balance).unwrap_or_default(),
                num_bets: trade_counts.get(agent.id.as_str()).copied().unwrap_or(0),
                win_rate: percent_of(
                    Decimal::from(stats.wins),
                    Decimal::from(stats.wins + stats.losses),
                ),
                wins: stats.wins,
                losses: stats.losses,
                avg_return: (stats.return_count > 0)
                    .then(|| stats.return_sum / Decimal::from(stats.return_count)),
                status: agent.status.clone(),
            }
        })
        .collect();

    // Equal values fall back to agent id so ranks are reproducible.
    entries.sort_by(|a, b| {
        b.total_value
            .cmp(&a.total_value)
            .then_with(|| a.agent_id.cmp(&b.agent_id))
    });
    for (idx, entry) in entries.iter_mut().enumerate() {
        entry.rank = idx + 1;
    }

    entries
}

/// Builds the active season's leaderboard from the store.
///
/// No active season yields an empty report. Season and agent lookups are
/// required; failures of the other fetches are logged, recorded in
/// `degraded`, and treated as empty input.
pub fn load_leaderboard(store: &dyn ArenaStore) -> Result<LeaderboardReport, ArenaError> {
    let Some(season) = store
        .active_season()
        .map_err(ArenaError::fetch("active season"))?
    else {
        info!(
            component = "leaderboard",
            event = "leaderboard.no_active_season"
        );
        return Ok(LeaderboardReport::empty());
    };
    leaderboard_for_season(store, &season)
}

/// Builds one season's leaderboard with the same degrade policy as
/// [`load_leaderboard`].
pub fn leaderboard_for_season(
    store: &dyn ArenaStore,
    season: &Season,
) -> Result<LeaderboardReport, ArenaError> {
    let agents = store
        .agents_for_season(&season.id)
        .map_err(ArenaError::fetch("season agents"))?;

    let mut degraded = Vec::new();
    let open_positions = degrade(SubFetch::OpenPositions, store.open_positions(), &mut degraded);
    let trades = degrade(SubFetch::Trades, store.trades(), &mut degraded);
    let resolved_positions = degrade(
        SubFetch::ResolvedPositions,
        store.resolved_positions(),
        &mut degraded,
    );

    let entries = build_leaderboard(&LeaderboardInputs {
        initial_balance: season.initial_balance,
        agents: &agents,
        open_positions: &open_positions,
        trades: &trades,
        resolved_positions: &resolved_positions,
    });

    info!(
        component = "leaderboard",
        event = "leaderboard.computed",
        season_id = %season.id,
        agent_count = entries.len(),
        degraded_count = degraded.len()
    );

    Ok(LeaderboardReport {
        season_id: Some(season.id.clone()),
        entries,
        degraded,
    })
}

fn degrade<T>(
    fetch: SubFetch,
    result: Result<Vec<T>, StoreError>,
    degraded: &mut Vec<DegradedFetch>,
) -> Vec<T> {
    match result {
        Ok(rows) => rows,
        Err(err) => {
            warn!(
                component = "leaderboard",
                event = "leaderboard.degraded",
                fetch = fetch.as_str(),
                error = %err
            );
            degraded.push(DegradedFetch {
                fetch,
                error: err.to_string(),
            });
            Vec::new()
        }
    }
}

/// `part / whole * 100`, or `None` when `whole` is zero.
fn percent_of(part: Decimal, whole: Decimal) -> Option<Decimal> {
    part.checked_div(whole)
        .map(|ratio| ratio * Decimal::ONE_HUNDRED)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::{Agent, ModelIdentity, Side, TradeType};
    use rust_decimal_macros::dec;

    fn agent(id: &str, cash: Decimal) -> AgentWithModel {
        AgentWithModel {
            agent: Agent {
                id: id.to_string(),
                model_id: format!("model-{id}"),
                season_id: "s1".to_string(),
                cash_balance: cash,
                total_invested: dec!(0),
                status: "active".to_string(),
            },
            model: Some(ModelIdentity {
                id: format!("model-{id}"),
                display_name: format!("Model {id}"),
                provider: "Lab".to_string(),
                color: "#123456".to_string(),
            }),
        }
    }

    fn open_position(agent_id: &str, value: Option<Decimal>) -> Position {
        Position {
            id: format!("pos-{agent_id}"),
            agent_id: agent_id.to_string(),
            market_id: "m1".to_string(),
            side: Side::Yes,
            shares: dec!(10),
            avg_entry_price: dec!(0.5),
            current_value: value,
            unrealized_pnl: None,
            realized_pnl: None,
            status: PositionStatus::Open,
            close_price: None,
        }
    }

    fn trade(agent_id: &str, trade_type: TradeType) -> Trade {
        Trade {
            id: format!("t-{agent_id}"),
            agent_id: agent_id.to_string(),
            market_id: "m1".to_string(),
            side: Side::Yes,
            trade_type,
            shares: dec!(1),
            price: dec!(0.5),
            total_amount: dec!(0.5),
            realized_pnl: None,
            executed_at: None,
        }
    }

    fn resolved(
        agent_id: &str,
        side: Side,
        outcome: &str,
        entry: Option<Decimal>,
        close: Option<Decimal>,
    ) -> ResolvedPosition {
        ResolvedPosition {
            agent_id: agent_id.to_string(),
            side,
            avg_entry_price: entry,
            close_price: close,
            resolution_outcome: outcome.to_string(),
        }
    }

    fn inputs<'a>(
        agents: &'a [AgentWithModel],
        open_positions: &'a [Position],
        trades: &'a [Trade],
        resolved_positions: &'a [ResolvedPosition],
    ) -> LeaderboardInputs<'a> {
        LeaderboardInputs {
            initial_balance: dec!(10000),
            agents,
            open_positions,
            trades,
            resolved_positions,
        }
    }

    #[test]
    fn ranks_by_total_value_including_open_positions() {
        let agents = vec![
            agent("a", dec!(9000)),
            agent("b", dec!(9500)),
            agent("c", dec!(10200)),
        ];
        let positions = vec![
            open_position("a", Some(dec!(1500))),
            open_position("a", Some(dec!(100))),
            open_position("b", None),
        ];

        let entries = build_leaderboard(&inputs(&agents, &positions, &[], &[]));

        let order: Vec<&str> = entries.iter().map(|e| e.agent_id.as_str()).collect();
        assert_eq!(order, vec!["a", "c", "b"]);
        assert_eq!(
            entries.iter().map(|e| e.rank).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        assert_eq!(entries[0].total_value, dec!(10600));
        assert_eq!(entries[0].pnl, dec!(600));
        assert_eq!(entries[0].pnl_percent, dec!(6));
        assert_eq!(entries[2].total_value, dec!(9500));
        assert_eq!(entries[2].pnl_percent, dec!(-5));
    }

    #[test]
    fn closed_positions_in_open_input_are_ignored_for_valuation() {
        let agents = vec![agent("a", dec!(100))];
        let mut closed = open_position("a", Some(dec!(50)));
        closed.status = PositionStatus::Closed;

        let entries = build_leaderboard(&inputs(&agents, &[closed], &[], &[]));
        assert_eq!(entries[0].total_value, dec!(100));
    }

    #[test]
    fn equal_values_are_ordered_by_agent_id() {
        let agents = vec![agent("z", dec!(10000)), agent("m", dec!(10000))];
        let entries = build_leaderboard(&inputs(&agents, &[], &[], &[]));

        assert_eq!(entries[0].agent_id, "m");
        assert_eq!(entries[0].rank, 1);
        assert_eq!(entries[1].agent_id, "z");
        assert_eq!(entries[1].rank, 2);
    }

    #[test]
    fn every_trade_counts_as_a_bet() {
        let agents = vec![agent("a", dec!(1)), agent("b", dec!(1))];
        let trades = vec![
            trade("a", TradeType::Buy),
            trade("a", TradeType::Sell),
            trade("a", TradeType::Buy),
            trade("ghost", TradeType::Buy),
        ];

        let entries = build_leaderboard(&inputs(&agents, &[], &trades, &[]));
        let a = entries.iter().find(|e| e.agent_id == "a").unwrap();
        let b = entries.iter().find(|e| e.agent_id == "b").unwrap();
        assert_eq!(a.num_bets, 3);
        assert_eq!(b.num_bets, 0);
    }

    #[test]
    fn win_rate_is_none_without_resolved_positions() {
        let agents = vec![agent("a", dec!(1))];
        let entries = build_leaderboard(&inputs(&agents, &[], &[], &[]));

        assert_eq!(entries[0].win_rate, None);
        assert_eq!(entries[0].avg_return, None);
        assert_eq!(entries[0].wins, 0);
        assert_eq!(entries[0].losses, 0);
    }

    #[test]
    fn win_rate_zero_is_distinct_from_none() {
        let agents = vec![agent("a", dec!(1))];
        let resolved = vec![resolved("a", Side::Yes, "NO", None, None)];
        let entries = build_leaderboard(&inputs(&agents, &[], &[], &resolved));

        assert_eq!(entries[0].win_rate, Some(dec!(0)));
        assert_eq!(entries[0].losses, 1);
    }

    #[test]
    fn win_rate_and_avg_return_from_resolved_positions() {
        let agents = vec![agent("a", dec!(1))];
        let resolved = vec![
            resolved("a", Side::Yes, "YES", Some(dec!(0.50)), Some(dec!(1.00))),
            resolved("a", Side::No, "NO", Some(dec!(0.25)), Some(dec!(0.50))),
            resolved("a", Side::Yes, "NO", Some(dec!(0.40)), Some(dec!(0.20))),
            resolved("a", Side::No, "YES", Some(dec!(0.60)), None),
        ];

        let entries = build_leaderboard(&inputs(&agents, &[], &[], &resolved));
        let entry = &entries[0];

        assert_eq!(entry.wins, 2);
        assert_eq!(entry.losses, 2);
        assert_eq!(entry.win_rate, Some(dec!(50)));
        // (100 + 100 - 50) / 3 qualifying positions
        assert_eq!(entry.avg_return, Some(dec!(150) / dec!(3)));
    }

    #[test]
    fn positions_closed_at_zero_count_toward_avg_return() {
        let agents = vec![agent("a", dec!(1))];
        let resolved = vec![
            resolved("a", Side::Yes, "YES", Some(dec!(0.5)), Some(dec!(1))),
            resolved("a", Side::Yes, "NO", Some(dec!(0.5)), Some(dec!(0))),
        ];

        let entries = build_leaderboard(&inputs(&agents, &[], &[], &resolved));
        let entry = &entries[0];

        assert_eq!(entry.wins, 1);
        assert_eq!(entry.losses, 1);
        assert_eq!(entry.avg_return, Some(dec!(0)));
    }

    #[test]
    fn win_rate_uses_exact_ratio() {
        let agents = vec![agent("a", dec!(1))];
        let resolved = vec![
            resolved("a", Side::Yes, "YES", None, None),
            resolved("a", Side::Yes, "YES", None, None),
            resolved("a", Side::Yes, "NO", None, None),
        ];

        let entries = build_leaderboard(&inputs(&agents, &[], &[], &resolved));
        assert_eq!(
            entries[0].win_rate,
            Some(dec!(2) / dec!(3) * Decimal::ONE_HUNDRED)
        );
    }

    #[test]
    fn missing_model_falls_back_to_model_id() {
        let mut row = agent("a", dec!(1));
        row.model = None;

        let entries = build_leaderboard(&inputs(&[row], &[], &[], &[]));
        assert_eq!(entries[0].display_name, "model-a");
        assert_eq!(entries[0].provider, "Unknown");
        assert_eq!(entries[0].color, "#888888");
    }

    #[test]
    fn zero_initial_balance_does_not_panic() {
        let agents = vec![agent("a", dec!(5))];
        let mut input = inputs(&agents, &[], &[], &[]);
        input.initial_balance = dec!(0);

        let entries = build_leaderboard(&input);
        assert_eq!(entries[0].pnl, dec!(5));
        assert_eq!(entries[0].pnl_percent, dec!(0));
    }

    #[test]
    fn empty_agents_yield_empty_board() {
        let entries = build_leaderboard(&inputs(&[], &[], &[], &[]));
        assert!(entries.is_empty());
    }
}
