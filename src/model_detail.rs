//! Per-model page: the model's standing, holdings, recent trades and value
//! history in the active season.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::arena::{HeldPosition, ModelIdentity, ModelSnapshot, TradeScope, TradeWithContext};
use crate::error::ArenaError;
use crate::leaderboard::{leaderboard_for_season, LeaderboardEntry};
use crate::store::ArenaStore;

pub const MODEL_RECENT_TRADES: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelDetail {
    pub model: ModelIdentity,
    pub season_id: Option<String>,
    pub agent_id: Option<String>,
    /// The model's leaderboard row, ranked against the whole season.
    pub standing: Option<LeaderboardEntry>,
    pub positions: Vec<HeldPosition>,
    pub recent_trades: Vec<TradeWithContext>,
    /// Oldest first.
    pub snapshots: Vec<ModelSnapshot>,
}

impl ModelDetail {
    fn idle(model: ModelIdentity, season_id: Option<String>) -> Self {
        Self {
            model,
            season_id,
            agent_id: None,
            standing: None,
            positions: Vec::new(),
            recent_trades: Vec::new(),
            snapshots: Vec::new(),
        }
    }
}

/// Detail for `model_id`, or `None` when no such model exists. A model
/// without an agent in the active season gets an empty detail.
pub fn load_model_detail(
    store: &dyn ArenaStore,
    model_id: &str,
) -> Result<Option<ModelDetail>, ArenaError> {
    let Some(model) = store.model(model_id).map_err(ArenaError::fetch("model"))? else {
        return Ok(None);
    };
    let identity = ModelIdentity::from(&model);

    let Some(season) = store
        .active_season()
        .map_err(ArenaError::fetch("active season"))?
    else {
        return Ok(Some(ModelDetail::idle(identity, None)));
    };

    let agent_id = store
        .agents_for_season(&season.id)
        .map_err(ArenaError::fetch("season agents"))?
        .into_iter()
        .find(|row| row.agent.model_id == model.id)
        .map(|row| row.agent.id);
    let Some(agent_id) = agent_id else {
        return Ok(Some(ModelDetail::idle(identity, Some(season.id))));
    };

    let standing = leaderboard_for_season(store, &season)?
        .entries
        .into_iter()
        .find(|entry| entry.agent_id == agent_id);
    let positions: Vec<HeldPosition> = store
        .held_positions(&season.id)
        .map_err(ArenaError::fetch("held positions"))?
        .into_iter()
        .filter(|held| held.position.agent_id == agent_id)
        .collect();
    let recent_trades = store
        .trade_activity(TradeScope::Agent(&agent_id), MODEL_RECENT_TRADES)
        .map_err(ArenaError::fetch("model trades"))?;
    let snapshots: Vec<ModelSnapshot> = store
        .season_snapshots(&season.id)
        .map_err(ArenaError::fetch("season snapshots"))?
        .into_iter()
        .filter(|snapshot| snapshot.agent_id == agent_id)
        .collect();

    info!(
        component = "model_detail",
        event = "model_detail.computed",
        model_id = %model.id,
        agent_id = %agent_id,
        position_count = positions.len(),
        trade_count = recent_trades.len(),
        snapshot_count = snapshots.len()
    );

    Ok(Some(ModelDetail {
        model: identity,
        season_id: Some(season.id),
        agent_id: Some(agent_id),
        standing,
        positions,
        recent_trades,
        snapshots,
    }))
}
