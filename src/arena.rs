//! Arena data model: seasons, models, agents, positions, trades, markets and
//! portfolio snapshots as persisted by the trading engine.
//!
//! Rows here are read-only views; nothing in this crate mutates them except
//! the demo seeder in [`crate::demo`].

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_MODEL_COLOR: &str = "#888888";
pub const UNKNOWN_PROVIDER: &str = "Unknown";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseArenaError {
    #[error("unknown side: {0}")]
    UnknownSide(String),
    #[error("unknown trade type: {0}")]
    UnknownTradeType(String),
    #[error("unknown position status: {0}")]
    UnknownPositionStatus(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Yes,
    No,
}

impl Side {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Yes => "YES",
            Self::No => "NO",
        }
    }

    pub fn parse(raw: &str) -> Result<Self, ParseArenaError> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "YES" => Ok(Self::Yes),
            "NO" => Ok(Self::No),
            _ => Err(ParseArenaError::UnknownSide(raw.to_string())),
        }
    }

    /// Whether a market resolved on this side. Outcomes are stored as free
    /// text, so the comparison is against the wire string.
    pub fn matches_outcome(self, outcome: &str) -> bool {
        outcome == self.as_str()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeType {
    Buy,
    Sell,
}

impl TradeType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Buy => "BUY",
            Self::Sell => "SELL",
        }
    }

    pub fn parse(raw: &str) -> Result<Self, ParseArenaError> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "BUY" => Ok(Self::Buy),
            "SELL" => Ok(Self::Sell),
            _ => Err(ParseArenaError::UnknownTradeType(raw.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionStatus {
    Open,
    Closed,
}

impl PositionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
        }
    }

    pub fn parse(raw: &str) -> Result<Self, ParseArenaError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "open" => Ok(Self::Open),
            "closed" => Ok(Self::Closed),
            _ => Err(ParseArenaError::UnknownPositionStatus(raw.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeasonStatus {
    Active,
    Completed,
    #[serde(untagged)]
    Other(String),
}

impl SeasonStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Other(raw) => raw.as_str(),
        }
    }

    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "active" => Self::Active,
            "completed" => Self::Completed,
            _ => Self::Other(raw.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Season {
    pub id: String,
    pub season_number: i64,
    pub status: SeasonStatus,
    pub initial_balance: Decimal,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Model {
    pub id: String,
    pub display_name: String,
    pub provider: String,
    pub color: Option<String>,
    pub is_active: bool,
}

/// Display identity of a model as shown next to rankings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelIdentity {
    pub id: String,
    pub display_name: String,
    pub provider: String,
    pub color: String,
}

impl ModelIdentity {
    /// Identity used when an agent's model row is missing: the raw model id
    /// stands in for the display name.
    pub fn fallback(model_id: &str) -> Self {
        Self {
            id: model_id.to_string(),
            display_name: model_id.to_string(),
            provider: UNKNOWN_PROVIDER.to_string(),
            color: DEFAULT_MODEL_COLOR.to_string(),
        }
    }
}

impl From<&Model> for ModelIdentity {
    fn from(model: &Model) -> Self {
        Self {
            id: model.id.clone(),
            display_name: model.display_name.clone(),
            provider: model.provider.clone(),
            color: model
                .color
                .clone()
                .unwrap_or_else(|| DEFAULT_MODEL_COLOR.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    pub id: String,
    pub model_id: String,
    pub season_id: String,
    pub cash_balance: Decimal,
    pub total_invested: Decimal,
    pub status: String,
}

/// An agent joined with its model row, if the model exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentWithModel {
    pub agent: Agent,
    pub model: Option<ModelIdentity>,
}

impl AgentWithModel {
    pub fn identity(&self) -> ModelIdentity {
        self.model
            .clone()
            .unwrap_or_else(|| ModelIdentity::fallback(&self.agent.model_id))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Market {
    pub id: String,
    pub question: String,
    pub status: String,
    pub resolution_outcome: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub id: String,
    pub agent_id: String,
    pub market_id: String,
    pub side: Side,
    pub shares: Decimal,
    pub avg_entry_price: Decimal,
    pub current_value: Option<Decimal>,
    pub unrealized_pnl: Option<Decimal>,
    pub realized_pnl: Option<Decimal>,
    pub status: PositionStatus,
    pub close_price: Option<Decimal>,
}

/// A closed position joined with its market's non-null resolution outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedPosition {
    pub agent_id: String,
    pub side: Side,
    pub avg_entry_price: Option<Decimal>,
    pub close_price: Option<Decimal>,
    pub resolution_outcome: String,
}

impl ResolvedPosition {
    pub fn is_win(&self) -> bool {
        self.side.matches_outcome(&self.resolution_outcome)
    }

    /// Percent return from entry to close. `None` when either price is
    /// missing or the entry price is zero.
    pub fn return_pct(&self) -> Option<Decimal> {
        let entry = self.avg_entry_price.filter(|price| !price.is_zero())?;
        let close = self.close_price?;
        (close - entry)
            .checked_div(entry)
            .map(|ratio| ratio * Decimal::ONE_HUNDRED)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    pub id: String,
    pub agent_id: String,
    pub market_id: String,
    pub side: Side,
    pub trade_type: TradeType,
    pub shares: Decimal,
    pub price: Decimal,
    pub total_amount: Decimal,
    pub realized_pnl: Option<Decimal>,
    pub executed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortfolioSnapshot {
    pub agent_id: String,
    pub total_value: Decimal,
    pub snapshot_timestamp: DateTime<Utc>,
}

/// A snapshot joined with the agent's model identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSnapshot {
    pub agent_id: String,
    pub model: ModelIdentity,
    pub total_value: Decimal,
    pub snapshot_timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub id: String,
    pub agent_id: String,
    pub season_id: String,
    pub action: String,
    pub decision_timestamp: DateTime<Utc>,
}

/// A trade joined with its agent's model and its market question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeWithContext {
    pub trade: Trade,
    pub model: ModelIdentity,
    pub market_question: Option<String>,
}

/// An open position joined with its agent's model and its market, if the
/// market row exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeldPosition {
    pub position: Position,
    pub model: ModelIdentity,
    pub market: Option<Market>,
}

/// Which trades a trade query covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeScope<'a> {
    All,
    Agent(&'a str),
    Market(&'a str),
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn resolved(
        side: Side,
        outcome: &str,
        entry: Option<Decimal>,
        close: Option<Decimal>,
    ) -> ResolvedPosition {
        ResolvedPosition {
            agent_id: "agent-1".to_string(),
            side,
            avg_entry_price: entry,
            close_price: close,
            resolution_outcome: outcome.to_string(),
        }
    }

    #[test]
    fn side_parsing_is_case_insensitive_and_rejects_garbage() {
        assert_eq!(Side::parse("yes"), Ok(Side::Yes));
        assert_eq!(Side::parse(" NO "), Ok(Side::No));
        assert!(matches!(
            Side::parse("maybe"),
            Err(ParseArenaError::UnknownSide(_))
        ));
    }

    #[test]
    fn win_requires_exact_outcome_match() {
        assert!(resolved(Side::Yes, "YES", None, None).is_win());
        assert!(!resolved(Side::No, "YES", None, None).is_win());
        assert!(!resolved(Side::Yes, "Yes", None, None).is_win());
    }

    #[test]
    fn return_pct_needs_both_prices() {
        let full = resolved(Side::Yes, "YES", Some(dec!(0.40)), Some(dec!(1.00)));
        assert_eq!(full.return_pct(), Some(dec!(150)));

        let missing_close = resolved(Side::Yes, "YES", Some(dec!(0.40)), None);
        assert_eq!(missing_close.return_pct(), None);

        let zero_entry = resolved(Side::Yes, "YES", Some(dec!(0)), Some(dec!(1)));
        assert_eq!(zero_entry.return_pct(), None);
    }

    #[test]
    fn loss_closed_at_zero_is_total_loss() {
        let wiped = resolved(Side::Yes, "NO", Some(dec!(0.50)), Some(dec!(0)));
        assert!(!wiped.is_win());
        assert_eq!(wiped.return_pct(), Some(dec!(-100)));
    }

    #[test]
    fn fallback_identity_uses_model_id() {
        let row = AgentWithModel {
            agent: Agent {
                id: "a".to_string(),
                model_id: "gpt-x".to_string(),
                season_id: "s1".to_string(),
                cash_balance: dec!(1),
                total_invested: dec!(0),
                status: "active".to_string(),
            },
            model: None,
        };

        let identity = row.identity();
        assert_eq!(identity.display_name, "gpt-x");
        assert_eq!(identity.provider, "Unknown");
        assert_eq!(identity.color, "#888888");
    }

    #[test]
    fn season_status_keeps_unknown_values() {
        assert_eq!(SeasonStatus::parse("ACTIVE"), SeasonStatus::Active);
        assert_eq!(
            SeasonStatus::parse("paused"),
            SeasonStatus::Other("paused".to_string())
        );
        assert_eq!(SeasonStatus::parse("paused").as_str(), "paused");
    }
}
