//! Read access to the arena tables.
//!
//! `ArenaStore` is the only seam through which the derivations see data. The
//! SQLite implementation mirrors the hosted schema closely enough for local
//! runs, demos and tests; money columns are stored as decimal text.

use std::path::Path;
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::info;

use crate::arena::{
    Agent, AgentWithModel, Decision, HeldPosition, Market, Model, ModelIdentity, ModelSnapshot,
    PortfolioSnapshot, Position, PositionStatus, ResolvedPosition, Season, SeasonStatus, Side,
    Trade, TradeScope, TradeType, TradeWithContext,
};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("store connection lock poisoned")]
    LockPoisoned,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

pub trait ArenaStore: Send + Sync + 'static {
    /// Newest active season, if any.
    fn active_season(&self) -> Result<Option<Season>, StoreError>;
    /// All seasons, newest season number first.
    fn seasons(&self) -> Result<Vec<Season>, StoreError>;
    fn agents_for_season(&self, season_id: &str) -> Result<Vec<AgentWithModel>, StoreError>;
    fn open_positions(&self) -> Result<Vec<Position>, StoreError>;
    fn trades(&self) -> Result<Vec<Trade>, StoreError>;
    /// Closed positions whose market has a non-null resolution outcome.
    fn resolved_positions(&self) -> Result<Vec<ResolvedPosition>, StoreError>;
    /// Snapshots at or after `cutoff` whose agent and model both exist,
    /// oldest first.
    fn snapshots_since(&self, cutoff: DateTime<Utc>) -> Result<Vec<ModelSnapshot>, StoreError>;
    /// Every snapshot of a season's agents, oldest first.
    fn season_snapshots(&self, season_id: &str) -> Result<Vec<ModelSnapshot>, StoreError>;
    fn count_season_trades(&self, season_id: &str) -> Result<u64, StoreError>;
    /// Decisions made by a season's agents, excluding `ERROR` actions.
    fn count_season_decisions(&self, season_id: &str) -> Result<u64, StoreError>;
    fn season_by_number(&self, season_number: i64) -> Result<Option<Season>, StoreError>;
    fn model(&self, model_id: &str) -> Result<Option<Model>, StoreError>;
    fn market(&self, market_id: &str) -> Result<Option<Market>, StoreError>;
    /// Newest trades first, at most `limit`. Trades whose agent or model is
    /// missing are skipped.
    fn trade_activity(
        &self,
        scope: TradeScope<'_>,
        limit: usize,
    ) -> Result<Vec<TradeWithContext>, StoreError>;
    /// Open positions held by a season's agents, in insertion order.
    fn held_positions(&self, season_id: &str) -> Result<Vec<HeldPosition>, StoreError>;
}

const SCHEMA_SQL: &str = "
    CREATE TABLE IF NOT EXISTS seasons (
        id TEXT PRIMARY KEY,
        season_number INTEGER NOT NULL,
        status TEXT NOT NULL,
        initial_balance TEXT NOT NULL,
        started_at TEXT NOT NULL,
        completed_at TEXT
    );
    CREATE TABLE IF NOT EXISTS models (
        id TEXT PRIMARY KEY,
        display_name TEXT NOT NULL,
        provider TEXT NOT NULL,
        color TEXT,
        is_active INTEGER NOT NULL DEFAULT 1
    );
    CREATE TABLE IF NOT EXISTS agents (
        id TEXT PRIMARY KEY,
        model_id TEXT NOT NULL,
        season_id TEXT NOT NULL,
        cash_balance TEXT NOT NULL,
        total_invested TEXT NOT NULL,
        status TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS markets (
        id TEXT PRIMARY KEY,
        question TEXT NOT NULL,
        status TEXT NOT NULL,
        resolution_outcome TEXT
    );
    CREATE TABLE IF NOT EXISTS positions (
        id TEXT PRIMARY KEY,
        agent_id TEXT NOT NULL,
        market_id TEXT NOT NULL,
        side TEXT NOT NULL,
        shares TEXT NOT NULL,
        avg_entry_price TEXT NOT NULL,
        current_value TEXT,
        unrealized_pnl TEXT,
        realized_pnl TEXT,
        status TEXT NOT NULL,
        close_price TEXT
    );
    CREATE TABLE IF NOT EXISTS trades (
        id TEXT PRIMARY KEY,
        agent_id TEXT NOT NULL,
        market_id TEXT NOT NULL,
        side TEXT NOT NULL,
        trade_type TEXT NOT NULL,
        shares TEXT NOT NULL,
        price TEXT NOT NULL,
        total_amount TEXT NOT NULL,
        realized_pnl TEXT,
        executed_at TEXT
    );
    CREATE TABLE IF NOT EXISTS portfolio_snapshots (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        agent_id TEXT NOT NULL,
        total_value TEXT NOT NULL,
        snapshot_timestamp TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_portfolio_snapshots_ts
        ON portfolio_snapshots (snapshot_timestamp);
    CREATE TABLE IF NOT EXISTS decisions (
        id TEXT PRIMARY KEY,
        agent_id TEXT NOT NULL,
        season_id TEXT NOT NULL,
        action TEXT NOT NULL,
        decision_timestamp TEXT NOT NULL
    );
";

const SEASON_COLUMNS: &str =
    "id, season_number, status, initial_balance, started_at, completed_at";

const POSITION_COLUMNS: &str = "p.id, p.agent_id, p.market_id, p.side, p.shares,
    p.avg_entry_price, p.current_value, p.unrealized_pnl, p.realized_pnl, p.status,
    p.close_price";

const TRADE_COLUMNS: &str = "t.id, t.agent_id, t.market_id, t.side, t.trade_type, t.shares,
    t.price, t.total_amount, t.realized_pnl, t.executed_at";

const SNAPSHOT_SELECT: &str = "
    SELECT s.agent_id, s.total_value, s.snapshot_timestamp,
           m.id, m.display_name, m.provider, m.color
    FROM portfolio_snapshots s
    JOIN agents a ON a.id = s.agent_id
    JOIN models m ON m.id = a.model_id
";

pub struct SqliteArenaStore {
    conn: Mutex<Connection>,
}

impl SqliteArenaStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        conn.execute_batch(
            "
            PRAGMA journal_mode=WAL;
            PRAGMA synchronous=NORMAL;
            PRAGMA temp_store=MEMORY;
            ",
        )?;
        conn.execute_batch(SCHEMA_SQL)?;
        info!(
            component = "store",
            event = "store.opened",
            path = %path.display()
        );

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::LockPoisoned)
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        let count: i64 = self
            .conn()?
            .query_row("SELECT COUNT(*) FROM seasons", [], |row| row.get(0))?;
        Ok(count == 0)
    }

    pub fn insert_season(&self, season: &Season) -> Result<(), StoreError> {
        self.conn()?.execute(
            "INSERT INTO seasons (id, season_number, status, initial_balance, started_at, completed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                season.id,
                season.season_number,
                season.status.as_str(),
                season.initial_balance.to_string(),
                season.started_at,
                season.completed_at,
            ],
        )?;
        Ok(())
    }

    pub fn insert_model(&self, model: &Model) -> Result<(), StoreError> {
        self.conn()?.execute(
            "INSERT INTO models (id, display_name, provider, color, is_active)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                model.id,
                model.display_name,
                model.provider,
                model.color,
                model.is_active,
            ],
        )?;
        Ok(())
    }

    pub fn insert_agent(&self, agent: &Agent) -> Result<(), StoreError> {
        self.conn()?.execute(
            "INSERT INTO agents (id, model_id, season_id, cash_balance, total_invested, status)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                agent.id,
                agent.model_id,
                agent.season_id,
                agent.cash_balance.to_string(),
                agent.total_invested.to_string(),
                agent.status,
            ],
        )?;
        Ok(())
    }

    pub fn insert_market(&self, market: &Market) -> Result<(), StoreError> {
        self.conn()?.execute(
            "INSERT INTO markets (id, question, status, resolution_outcome)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                market.id,
                market.question,
                market.status,
                market.resolution_outcome
            ],
        )?;
        Ok(())
    }

    pub fn insert_position(&self, position: &Position) -> Result<(), StoreError> {
        self.conn()?.execute(
            "INSERT INTO positions (
                id, agent_id, market_id, side, shares, avg_entry_price,
                current_value, unrealized_pnl, realized_pnl, status, close_price
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                position.id,
                position.agent_id,
                position.market_id,
                position.side.as_str(),
                position.shares.to_string(),
                position.avg_entry_price.to_string(),
                position.current_value.map(|v| v.to_string()),
                position.unrealized_pnl.map(|v| v.to_string()),
                position.realized_pnl.map(|v| v.to_string()),
                position.status.as_str(),
                position.close_price.map(|v| v.to_string()),
            ],
        )?;
        Ok(())
    }

    pub fn insert_trade(&self, trade: &Trade) -> Result<(), StoreError> {
        self.conn()?.execute(
            "INSERT INTO trades (
                id, agent_id, market_id, side, trade_type, shares, price,
                total_amount, realized_pnl, executed_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                trade.id,
                trade.agent_id,
                trade.market_id,
                trade.side.as_str(),
                trade.trade_type.as_str(),
                trade.shares.to_string(),
                trade.price.to_string(),
                trade.total_amount.to_string(),
                trade.realized_pnl.map(|v| v.to_string()),
                trade.executed_at,
            ],
        )?;
        Ok(())
    }

    pub fn insert_snapshot(&self, snapshot: &PortfolioSnapshot) -> Result<(), StoreError> {
        self.conn()?.execute(
            "INSERT INTO portfolio_snapshots (agent_id, total_value, snapshot_timestamp)
             VALUES (?1, ?2, ?3)",
            params![
                snapshot.agent_id,
                snapshot.total_value.to_string(),
                snapshot.snapshot_timestamp,
            ],
        )?;
        Ok(())
    }

    pub fn insert_decision(&self, decision: &Decision) -> Result<(), StoreError> {
        self.conn()?.execute(
            "INSERT INTO decisions (id, agent_id, season_id, action, decision_timestamp)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                decision.id,
                decision.agent_id,
                decision.season_id,
                decision.action,
                decision.decision_timestamp,
            ],
        )?;
        Ok(())
    }

    fn query_snapshots(
        &self,
        filter_sql: &str,
        param: impl rusqlite::ToSql,
    ) -> Result<Vec<ModelSnapshot>, StoreError> {
        let conn = self.conn()?;
        let sql = format!(
            "{SNAPSHOT_SELECT} {filter_sql} ORDER BY s.snapshot_timestamp ASC, s.id ASC"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter([param]), snapshot_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

impl ArenaStore for SqliteArenaStore {
    fn active_season(&self) -> Result<Option<Season>, StoreError> {
        let season = self
            .conn()?
            .query_row(
                &format!(
                    "SELECT {SEASON_COLUMNS}
                     FROM seasons
                     WHERE status = 'active'
                     ORDER BY season_number DESC
                     LIMIT 1"
                ),
                [],
                season_from_row,
            )
            .optional()?;
        Ok(season)
    }

    fn seasons(&self) -> Result<Vec<Season>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {SEASON_COLUMNS} FROM seasons ORDER BY season_number DESC"
        ))?;
        let rows = stmt
            .query_map([], season_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn agents_for_season(&self, season_id: &str) -> Result<Vec<AgentWithModel>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT a.id, a.model_id, a.season_id, a.cash_balance, a.total_invested, a.status,
                    m.id, m.display_name, m.provider, m.color
             FROM agents a
             LEFT JOIN models m ON m.id = a.model_id
             WHERE a.season_id = ?1
             ORDER BY a.rowid ASC",
        )?;
        let rows = stmt
            .query_map(params![season_id], |row| {
                let agent = Agent {
                    id: row.get(0)?,
                    model_id: row.get(1)?,
                    season_id: row.get(2)?,
                    cash_balance: decimal_col(row, 3)?,
                    total_invested: decimal_col(row, 4)?,
                    status: row.get(5)?,
                };
                let model_id: Option<String> = row.get(6)?;
                let model = match model_id {
                    Some(id) => Some(ModelIdentity::from(&Model {
                        id,
                        display_name: row.get(7)?,
                        provider: row.get(8)?,
                        color: row.get(9)?,
                        is_active: true,
                    })),
                    None => None,
                };
                Ok(AgentWithModel { agent, model })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn open_positions(&self) -> Result<Vec<Position>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {POSITION_COLUMNS} FROM positions p WHERE p.status = 'open'"
        ))?;
        let rows = stmt
            .query_map([], position_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn trades(&self) -> Result<Vec<Trade>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!("SELECT {TRADE_COLUMNS} FROM trades t"))?;
        let rows = stmt
            .query_map([], trade_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn resolved_positions(&self) -> Result<Vec<ResolvedPosition>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT p.agent_id, p.side, p.avg_entry_price, p.close_price, m.resolution_outcome
             FROM positions p
             JOIN markets m ON m.id = p.market_id
             WHERE p.status = 'closed'
               AND m.resolution_outcome IS NOT NULL",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(ResolvedPosition {
                    agent_id: row.get(0)?,
                    side: side_col(row, 1)?,
                    avg_entry_price: opt_decimal_col(row, 2)?,
                    close_price: opt_decimal_col(row, 3)?,
                    resolution_outcome: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn snapshots_since(&self, cutoff: DateTime<Utc>) -> Result<Vec<ModelSnapshot>, StoreError> {
        self.query_snapshots("WHERE s.snapshot_timestamp >= ?1", cutoff)
    }

    fn season_snapshots(&self, season_id: &str) -> Result<Vec<ModelSnapshot>, StoreError> {
        self.query_snapshots("WHERE a.season_id = ?1", season_id.to_string())
    }

    fn count_season_trades(&self, season_id: &str) -> Result<u64, StoreError> {
        let count: i64 = self.conn()?.query_row(
            "SELECT COUNT(*)
             FROM trades t
             JOIN agents a ON a.id = t.agent_id
             WHERE a.season_id = ?1",
            params![season_id],
            |row| row.get(0),
        )?;
        Ok(count.max(0) as u64)
    }

    fn count_season_decisions(&self, season_id: &str) -> Result<u64, StoreError> {
        let count: i64 = self.conn()?.query_row(
            "SELECT COUNT(*)
             FROM decisions d
             JOIN agents a ON a.id = d.agent_id
             WHERE a.season_id = ?1
               AND d.action <> 'ERROR'",
            params![season_id],
            |row| row.get(0),
        )?;
        Ok(count.max(0) as u64)
    }

    fn season_by_number(&self, season_number: i64) -> Result<Option<Season>, StoreError> {
        let season = self
            .conn()?
            .query_row(
                &format!("SELECT {SEASON_COLUMNS} FROM seasons WHERE season_number = ?1"),
                params![season_number],
                season_from_row,
            )
            .optional()?;
        Ok(season)
    }

    fn model(&self, model_id: &str) -> Result<Option<Model>, StoreError> {
        let model = self
            .conn()?
            .query_row(
                "SELECT id, display_name, provider, color, is_active FROM models WHERE id = ?1",
                params![model_id],
                |row| {
                    Ok(Model {
                        id: row.get(0)?,
                        display_name: row.get(1)?,
                        provider: row.get(2)?,
                        color: row.get(3)?,
                        is_active: row.get(4)?,
                    })
                },
            )
            .optional()?;
        Ok(model)
    }

    fn market(&self, market_id: &str) -> Result<Option<Market>, StoreError> {
        let market = self
            .conn()?
            .query_row(
                "SELECT id, question, status, resolution_outcome FROM markets WHERE id = ?1",
                params![market_id],
                |row| {
                    Ok(Market {
                        id: row.get(0)?,
                        question: row.get(1)?,
                        status: row.get(2)?,
                        resolution_outcome: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(market)
    }

    fn trade_activity(
        &self,
        scope: TradeScope<'_>,
        limit: usize,
    ) -> Result<Vec<TradeWithContext>, StoreError> {
        let (agent_id, market_id) = match scope {
            TradeScope::All => (None, None),
            TradeScope::Agent(id) => (Some(id), None),
            TradeScope::Market(id) => (None, Some(id)),
        };
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {TRADE_COLUMNS},
                    m.id, m.display_name, m.provider, m.color, mk.question
             FROM trades t
             JOIN agents a ON a.id = t.agent_id
             JOIN models m ON m.id = a.model_id
             LEFT JOIN markets mk ON mk.id = t.market_id
             WHERE (?1 IS NULL OR t.agent_id = ?1)
               AND (?2 IS NULL OR t.market_id = ?2)
             ORDER BY t.executed_at DESC, t.rowid DESC
             LIMIT ?3"
        ))?;
        let rows = stmt
            .query_map(params![agent_id, market_id, limit], |row| {
                Ok(TradeWithContext {
                    trade: trade_from_row(row)?,
                    model: model_identity_at(row, 10)?,
                    market_question: row.get(14)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn held_positions(&self, season_id: &str) -> Result<Vec<HeldPosition>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {POSITION_COLUMNS},
                    m.id, m.display_name, m.provider, m.color,
                    mk.id, mk.question, mk.status, mk.resolution_outcome
             FROM positions p
             JOIN agents a ON a.id = p.agent_id
             JOIN models m ON m.id = a.model_id
             LEFT JOIN markets mk ON mk.id = p.market_id
             WHERE p.status = 'open' AND a.season_id = ?1
             ORDER BY p.rowid ASC"
        ))?;
        let rows = stmt
            .query_map(params![season_id], |row| {
                let market_id: Option<String> = row.get(15)?;
                let market = match market_id {
                    Some(id) => Some(Market {
                        id,
                        question: row.get(16)?,
                        status: row.get(17)?,
                        resolution_outcome: row.get(18)?,
                    }),
                    None => None,
                };
                Ok(HeldPosition {
                    position: position_from_row(row)?,
                    model: model_identity_at(row, 11)?,
                    market,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

fn season_from_row(row: &Row<'_>) -> rusqlite::Result<Season> {
    let status: String = row.get(2)?;
    Ok(Season {
        id: row.get(0)?,
        season_number: row.get(1)?,
        status: SeasonStatus::parse(&status),
        initial_balance: decimal_col(row, 3)?,
        started_at: row.get(4)?,
        completed_at: row.get(5)?,
    })
}

fn snapshot_from_row(row: &Row<'_>) -> rusqlite::Result<ModelSnapshot> {
    let model = Model {
        id: row.get(3)?,
        display_name: row.get(4)?,
        provider: row.get(5)?,
        color: row.get(6)?,
        is_active: true,
    };
    Ok(ModelSnapshot {
        agent_id: row.get(0)?,
        model: ModelIdentity::from(&model),
        total_value: decimal_col(row, 1)?,
        snapshot_timestamp: row.get(2)?,
    })
}

fn model_identity_at(row: &Row<'_>, start: usize) -> rusqlite::Result<ModelIdentity> {
    Ok(ModelIdentity::from(&Model {
        id: row.get(start)?,
        display_name: row.get(start + 1)?,
        provider: row.get(start + 2)?,
        color: row.get(start + 3)?,
        is_active: true,
    }))
}

/// Reads `POSITION_COLUMNS` from the start of the row.
fn position_from_row(row: &Row<'_>) -> rusqlite::Result<Position> {
    Ok(Position {
        id: row.get(0)?,
        agent_id: row.get(1)?,
        market_id: row.get(2)?,
        side: side_col(row, 3)?,
        shares: decimal_col(row, 4)?,
        avg_entry_price: decimal_col(row, 5)?,
        current_value: opt_decimal_col(row, 6)?,
        unrealized_pnl: opt_decimal_col(row, 7)?,
        realized_pnl: opt_decimal_col(row, 8)?,
        status: position_status_col(row, 9)?,
        close_price: opt_decimal_col(row, 10)?,
    })
}

/// Reads `TRADE_COLUMNS` from the start of the row.
fn trade_from_row(row: &Row<'_>) -> rusqlite::Result<Trade> {
    Ok(Trade {
        id: row.get(0)?,
        agent_id: row.get(1)?,
        market_id: row.get(2)?,
        side: side_col(row, 3)?,
        trade_type: trade_type_col(row, 4)?,
        shares: decimal_col(row, 5)?,
        price: decimal_col(row, 6)?,
        total_amount: decimal_col(row, 7)?,
        realized_pnl: opt_decimal_col(row, 8)?,
        executed_at: row.get(9)?,
    })
}

fn decimal_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<Decimal> {
    let raw: String = row.get(idx)?;
    parse_decimal(idx, &raw)
}

fn opt_decimal_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<Decimal>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|text| parse_decimal(idx, &text)).transpose()
}

fn parse_decimal(idx: usize, raw: &str) -> rusqlite::Result<Decimal> {
    Decimal::from_str(raw.trim())
        .or_else(|_| Decimal::from_scientific(raw.trim()))
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err)))
}

fn side_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<Side> {
    let raw: String = row.get(idx)?;
    Side::parse(&raw)
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err)))
}

fn trade_type_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<TradeType> {
    let raw: String = row.get(idx)?;
    TradeType::parse(&raw)
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err)))
}

fn position_status_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<PositionStatus> {
    let raw: String = row.get(idx)?;
    PositionStatus::parse(&raw)
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err)))
}
