//! SQLite ledger and reward adapter.

use crate::adapters::trade_row::TradeRow;
use crate::domain::error::JournalError;
use crate::domain::ledger::Ledger;
use crate::domain::rewards::{NotesFingerprint, RewardEvent};
use crate::domain::trade::TradeId;
use crate::ports::ledger_store::LedgerStore;
use crate::ports::reward_port::RewardPort;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{OptionalExtension, params};
use std::path::Path;

/// One granted reward as stored in `xp_events`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XpEvent {
    pub trade_id: String,
    pub delta: i64,
    pub reason: String,
}

pub struct SqliteAdapter {
    pool: Pool<SqliteConnectionManager>,
}

impl SqliteAdapter {
    pub fn open(path: &Path, pool_size: u32) -> Result<Self, JournalError> {
        let manager = SqliteConnectionManager::file(path);
        let pool =
            Pool::builder()
                .max_size(pool_size.max(1))
                .build(manager)
                .map_err(|e: r2d2::Error| JournalError::Database {
                    reason: e.to_string(),
                })?;

        Ok(Self { pool })
    }

    pub fn in_memory() -> Result<Self, JournalError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(|e: r2d2::Error| JournalError::Database {
                reason: e.to_string(),
            })?;

        Ok(Self { pool })
    }

    fn connection(&self) -> Result<PooledConnection<SqliteConnectionManager>, JournalError> {
        self.pool
            .get()
            .map_err(|e: r2d2::Error| JournalError::Database {
                reason: e.to_string(),
            })
    }

    pub fn initialize_schema(&self) -> Result<(), JournalError> {
        let conn = self.connection()?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS trades (
                user_id TEXT NOT NULL,
                trade_id TEXT NOT NULL,
                position INTEGER NOT NULL,
                date TEXT NOT NULL,
                symbol TEXT NOT NULL,
                direction TEXT NOT NULL,
                outcome TEXT NOT NULL,
                size_lots REAL NOT NULL,
                entry_price REAL,
                stop_loss REAL,
                final_exit REAL,
                pnl REAL NOT NULL,
                r_multiple REAL NOT NULL,
                tags TEXT NOT NULL DEFAULT '',
                entry_rationale TEXT NOT NULL DEFAULT '',
                strategy TEXT NOT NULL DEFAULT '',
                journal_notes TEXT NOT NULL DEFAULT '',
                entry_screenshot TEXT,
                exit_screenshot TEXT,
                PRIMARY KEY (user_id, trade_id)
            );
            CREATE INDEX IF NOT EXISTS idx_trades_user_position ON trades(user_id, position);
            CREATE TABLE IF NOT EXISTS retired_ids (
                user_id TEXT NOT NULL,
                trade_id TEXT NOT NULL,
                PRIMARY KEY (user_id, trade_id)
            );
            CREATE TABLE IF NOT EXISTS xp_events (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT NOT NULL,
                trade_id TEXT NOT NULL,
                delta INTEGER NOT NULL,
                reason TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS notes_rewards (
                user_id TEXT NOT NULL,
                trade_id TEXT NOT NULL,
                fingerprint TEXT NOT NULL,
                PRIMARY KEY (user_id, trade_id)
            );",
        )
        .map_err(|e: rusqlite::Error| JournalError::DatabaseQuery {
            reason: e.to_string(),
        })?;

        Ok(())
    }

    /// Rewards granted to `user_id`, oldest first.
    pub fn xp_events(&self, user_id: &str) -> Result<Vec<XpEvent>, JournalError> {
        let conn = self.connection()?;

        let mut stmt = conn
            .prepare(
                "SELECT trade_id, delta, reason FROM xp_events
                 WHERE user_id = ?1 ORDER BY id ASC",
            )
            .map_err(|e: rusqlite::Error| JournalError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        let rows = stmt
            .query_map(params![user_id], |row| {
                Ok(XpEvent {
                    trade_id: row.get(0)?,
                    delta: row.get(1)?,
                    reason: row.get(2)?,
                })
            })
            .map_err(|e: rusqlite::Error| JournalError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        let mut events = Vec::new();
        for row in rows {
            events.push(
                row.map_err(|e: rusqlite::Error| JournalError::DatabaseQuery {
                    reason: e.to_string(),
                })?,
            );
        }
        Ok(events)
    }
}

impl LedgerStore for SqliteAdapter {
    fn load_ledger(&self, user_id: &str) -> Result<Ledger, JournalError> {
        let conn = self.connection()?;

        let mut stmt = conn
            .prepare(
                "SELECT trade_id, date, symbol, direction, outcome, size_lots,
                        entry_price, stop_loss, final_exit, pnl, r_multiple, tags,
                        entry_rationale, strategy, journal_notes,
                        entry_screenshot, exit_screenshot
                 FROM trades
                 WHERE user_id = ?1
                 ORDER BY position ASC",
            )
            .map_err(|e: rusqlite::Error| JournalError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        let rows = stmt
            .query_map(params![user_id], |row| {
                Ok(TradeRow {
                    trade_id: row.get(0)?,
                    date: row.get(1)?,
                    symbol: row.get(2)?,
                    direction: row.get(3)?,
                    outcome: row.get(4)?,
                    size_lots: row.get(5)?,
                    entry_price: row.get(6)?,
                    stop_loss: row.get(7)?,
                    final_exit: row.get(8)?,
                    pnl: row.get(9)?,
                    r_multiple: row.get(10)?,
                    tags: row.get(11)?,
                    entry_rationale: row.get(12)?,
                    strategy: row.get(13)?,
                    journal_notes: row.get(14)?,
                    entry_screenshot: row.get(15)?,
                    exit_screenshot: row.get(16)?,
                })
            })
            .map_err(|e: rusqlite::Error| JournalError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        let mut records = Vec::new();
        for row in rows {
            let row = row.map_err(|e: rusqlite::Error| JournalError::DatabaseQuery {
                reason: e.to_string(),
            })?;
            records.push(row.into_record()?);
        }

        let mut stmt = conn
            .prepare("SELECT trade_id FROM retired_ids WHERE user_id = ?1")
            .map_err(|e: rusqlite::Error| JournalError::DatabaseQuery {
                reason: e.to_string(),
            })?;
        let rows = stmt
            .query_map(params![user_id], |row| row.get::<_, String>(0))
            .map_err(|e: rusqlite::Error| JournalError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        let mut retired = Vec::new();
        for row in rows {
            let raw = row.map_err(|e: rusqlite::Error| JournalError::DatabaseQuery {
                reason: e.to_string(),
            })?;
            retired.push(TradeId::parse(&raw)?);
        }

        Ledger::from_parts(records, retired)
    }

    fn save_ledger(&self, user_id: &str, ledger: &Ledger) -> Result<(), JournalError> {
        let mut conn = self.connection()?;

        let tx =
            conn.transaction()
                .map_err(|e: rusqlite::Error| JournalError::DatabaseQuery {
                    reason: e.to_string(),
                })?;

        tx.execute("DELETE FROM trades WHERE user_id = ?1", params![user_id])
            .map_err(|e: rusqlite::Error| JournalError::DatabaseQuery {
                reason: e.to_string(),
            })?;
        tx.execute("DELETE FROM retired_ids WHERE user_id = ?1", params![user_id])
            .map_err(|e: rusqlite::Error| JournalError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        for (position, record) in ledger.iter().enumerate() {
            let row = TradeRow::from_record(record);
            tx.execute(
                "INSERT INTO trades (user_id, trade_id, position, date, symbol, direction,
                     outcome, size_lots, entry_price, stop_loss, final_exit, pnl, r_multiple,
                     tags, entry_rationale, strategy, journal_notes,
                     entry_screenshot, exit_screenshot)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15,
                     ?16, ?17, ?18, ?19)",
                params![
                    user_id,
                    row.trade_id,
                    position as i64,
                    row.date,
                    row.symbol,
                    row.direction,
                    row.outcome,
                    row.size_lots,
                    row.entry_price,
                    row.stop_loss,
                    row.final_exit,
                    row.pnl,
                    row.r_multiple,
                    row.tags,
                    row.entry_rationale,
                    row.strategy,
                    row.journal_notes,
                    row.entry_screenshot,
                    row.exit_screenshot
                ],
            )
            .map_err(|e: rusqlite::Error| JournalError::DatabaseQuery {
                reason: e.to_string(),
            })?;
        }

        for id in ledger.retired_ids() {
            tx.execute(
                "INSERT INTO retired_ids (user_id, trade_id) VALUES (?1, ?2)",
                params![user_id, id.as_str()],
            )
            .map_err(|e: rusqlite::Error| JournalError::DatabaseQuery {
                reason: e.to_string(),
            })?;
        }

        tx.commit()
            .map_err(|e: rusqlite::Error| JournalError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        Ok(())
    }
}

impl RewardPort for SqliteAdapter {
    fn grant(&self, user_id: &str, event: &RewardEvent) -> Result<(), JournalError> {
        let mut conn = self.connection()?;
        let reward_err = |e: rusqlite::Error| JournalError::Reward {
            reason: e.to_string(),
        };

        let tx = conn.transaction().map_err(reward_err)?;
        let trade_id = event.trade_id().as_str();

        tx.execute(
            "INSERT INTO xp_events (user_id, trade_id, delta, reason) VALUES (?1, ?2, ?3, ?4)",
            params![user_id, trade_id, event.xp(), event.reason()],
        )
        .map_err(reward_err)?;

        match event {
            RewardEvent::NotesChanged { fingerprint, .. } => {
                tx.execute(
                    "INSERT OR REPLACE INTO notes_rewards (user_id, trade_id, fingerprint)
                     VALUES (?1, ?2, ?3)",
                    params![user_id, trade_id, fingerprint.as_str()],
                )
                .map_err(reward_err)?;
            }
            RewardEvent::TradeDeleted { .. } => {
                tx.execute(
                    "DELETE FROM notes_rewards WHERE user_id = ?1 AND trade_id = ?2",
                    params![user_id, trade_id],
                )
                .map_err(reward_err)?;
            }
            RewardEvent::TradeLogged { .. } => {}
        }

        tx.commit().map_err(reward_err)?;
        Ok(())
    }

    fn notes_fingerprint(
        &self,
        user_id: &str,
        id: &TradeId,
    ) -> Result<Option<NotesFingerprint>, JournalError> {
        let conn = self.connection()?;

        let found: Option<String> = conn
            .query_row(
                "SELECT fingerprint FROM notes_rewards WHERE user_id = ?1 AND trade_id = ?2",
                params![user_id, id.as_str()],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e: rusqlite::Error| JournalError::Reward {
                reason: e.to_string(),
            })?;

        Ok(found.map(NotesFingerprint::from_hex))
    }
}
