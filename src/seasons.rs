//! Season archive: every season with its podium and activity counts.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::arena::{AgentWithModel, Position, PositionStatus, Season};
use crate::error::ArenaError;
use crate::leaderboard::{leaderboard_for_season, LeaderboardReport};
use crate::store::ArenaStore;

pub const PODIUM_SIZE: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PodiumModel {
    pub name: String,
    pub color: String,
    pub pnl: Decimal,
    pub total_value: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonSummary {
    pub season: Season,
    pub top_models: Vec<PodiumModel>,
    pub total_trades: u64,
    pub total_decisions: u64,
}

/// One season in full: its standings plus activity counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonDetail {
    pub season: Season,
    pub leaderboard: LeaderboardReport,
    pub total_trades: u64,
    pub total_decisions: u64,
}

/// Top models of one season by cash plus open position value.
pub fn season_podium(
    season: &Season,
    agents: &[AgentWithModel],
    open_positions: &[Position],
) -> Vec<PodiumModel> {
    let mut held: HashMap<&str, Decimal> = HashMap::new();
    for position in open_positions
        .iter()
        .filter(|position| position.status == PositionStatus::Open)
    {
        *held.entry(position.agent_id.as_str()).or_default() +=
            position.current_value.unwrap_or_default();
    }

    let mut ranked: Vec<(&str, PodiumModel)> = agents
        .iter()
        .map(|row| {
            let identity = row.identity();
            let total_value = row.agent.cash_balance
                + held.get(row.agent.id.as_str()).copied().unwrap_or_default();
            (
                row.agent.id.as_str(),
                PodiumModel {
                    name: identity.display_name,
                    color: identity.color,
                    pnl: total_value - season.initial_balance,
                    total_value,
                },
            )
        })
        .collect();

    ranked.sort_by(|(id_a, a), (id_b, b)| {
        b.total_value
            .cmp(&a.total_value)
            .then_with(|| id_a.cmp(id_b))
    });

    ranked
        .into_iter()
        .take(PODIUM_SIZE)
        .map(|(_, model)| model)
        .collect()
}

/// Summaries for every season, newest first.
///
/// Open positions are fetched once and shared across seasons; if that fetch
/// fails the podiums fall back to cash balances.
pub fn load_season_summaries(store: &dyn ArenaStore) -> Result<Vec<SeasonSummary>, ArenaError> {
    let seasons = store.seasons().map_err(ArenaError::fetch("seasons"))?;
    let open_positions = store.open_positions().unwrap_or_else(|err| {
        warn!(
            component = "seasons",
            event = "seasons.degraded",
            fetch = "open_positions",
            error = %err
        );
        Vec::new()
    });

    let mut summaries = Vec::with_capacity(seasons.len());
    for season in seasons {
        let agents = store
            .agents_for_season(&season.id)
            .map_err(ArenaError::fetch("season agents"))?;
        let total_trades = store
            .count_season_trades(&season.id)
            .map_err(ArenaError::fetch("season trade count"))?;
        let total_decisions = store
            .count_season_decisions(&season.id)
            .map_err(ArenaError::fetch("season decision count"))?;

        summaries.push(SeasonSummary {
            top_models: season_podium(&season, &agents, &open_positions),
            season,
            total_trades,
            total_decisions,
        });
    }

    info!(
        component = "seasons",
        event = "seasons.computed",
        season_count = summaries.len()
    );

    Ok(summaries)
}

/// Detail of the season with `season_number`, or `None` if there is no such
/// season. Standings follow the leaderboard's degrade policy.
pub fn load_season_detail(
    store: &dyn ArenaStore,
    season_number: i64,
) -> Result<Option<SeasonDetail>, ArenaError> {
    let Some(season) = store
        .season_by_number(season_number)
        .map_err(ArenaError::fetch("season"))?
    else {
        return Ok(None);
    };

    let leaderboard = leaderboard_for_season(store, &season)?;
    let total_trades = store
        .count_season_trades(&season.id)
        .map_err(ArenaError::fetch("season trade count"))?;
    let total_decisions = store
        .count_season_decisions(&season.id)
        .map_err(ArenaError::fetch("season decision count"))?;

    info!(
        component = "seasons",
        event = "seasons.detail_computed",
        season_number,
        agent_count = leaderboard.entries.len()
    );

    Ok(Some(SeasonDetail {
        season,
        leaderboard,
        total_trades,
        total_decisions,
    }))
}
