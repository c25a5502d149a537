//! Flat column layout of a trade, shared by the tabular stores.

use crate::domain::error::JournalError;
use crate::domain::tags::TagSet;
use crate::domain::trade::{ScreenshotRef, TradeId, TradeRecord};
use chrono::NaiveDate;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub const COLUMNS: [&str; 17] = [
    "trade_id",
    "date",
    "symbol",
    "direction",
    "outcome",
    "size_lots",
    "entry_price",
    "stop_loss",
    "final_exit",
    "pnl",
    "r_multiple",
    "tags",
    "entry_rationale",
    "strategy",
    "journal_notes",
    "entry_screenshot",
    "exit_screenshot",
];

/// One trade as plain column values. Unset prices and screenshots are
/// `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeRow {
    pub trade_id: String,
    pub date: String,
    pub symbol: String,
    pub direction: String,
    pub outcome: String,
    pub size_lots: f64,
    pub entry_price: Option<f64>,
    pub stop_loss: Option<f64>,
    pub final_exit: Option<f64>,
    pub pnl: f64,
    pub r_multiple: f64,
    pub tags: String,
    pub entry_rationale: String,
    pub strategy: String,
    pub journal_notes: String,
    pub entry_screenshot: Option<String>,
    pub exit_screenshot: Option<String>,
}

impl TradeRow {
    pub fn from_record(record: &TradeRecord) -> Self {
        TradeRow {
            trade_id: record.id.to_string(),
            date: record.date.format(DATE_FORMAT).to_string(),
            symbol: record.symbol.clone(),
            direction: record.direction.as_str().to_string(),
            outcome: record.outcome.as_str().to_string(),
            size_lots: record.size_lots,
            entry_price: record.entry_price,
            stop_loss: record.stop_loss,
            final_exit: record.final_exit,
            pnl: record.pnl,
            r_multiple: record.r_multiple,
            tags: record.tags.to_storage(),
            entry_rationale: record.entry_rationale.clone(),
            strategy: record.strategy.clone(),
            journal_notes: record.journal_notes.clone(),
            entry_screenshot: record.entry_screenshot.as_ref().map(|s| s.to_string()),
            exit_screenshot: record.exit_screenshot.as_ref().map(|s| s.to_string()),
        }
    }

    pub fn into_record(self) -> Result<TradeRecord, JournalError> {
        let id = TradeId::parse(&self.trade_id).map_err(|e| stored_error(&self.trade_id, e))?;
        let date = NaiveDate::parse_from_str(&self.date, DATE_FORMAT).map_err(
            |e: chrono::ParseError| JournalError::Database {
                reason: format!("stored trade {}: invalid date '{}': {e}", self.trade_id, self.date),
            },
        )?;
        let direction = self
            .direction
            .parse()
            .map_err(|e| stored_error(&self.trade_id, e))?;
        let outcome = self
            .outcome
            .parse()
            .map_err(|e| stored_error(&self.trade_id, e))?;

        Ok(TradeRecord {
            id,
            date,
            symbol: self.symbol,
            direction,
            outcome,
            size_lots: self.size_lots,
            entry_price: stored_price(self.entry_price),
            stop_loss: stored_price(self.stop_loss),
            final_exit: stored_price(self.final_exit),
            pnl: self.pnl,
            r_multiple: self.r_multiple,
            tags: TagSet::from_storage(&self.tags),
            entry_rationale: self.entry_rationale,
            strategy: self.strategy,
            journal_notes: self.journal_notes,
            entry_screenshot: stored_screenshot(self.entry_screenshot),
            exit_screenshot: stored_screenshot(self.exit_screenshot),
        })
    }
}

/// Older journals wrote `0.0` for a price that was never entered.
pub fn stored_price(value: Option<f64>) -> Option<f64> {
    value.filter(|p| *p != 0.0)
}

fn stored_screenshot(value: Option<String>) -> Option<ScreenshotRef> {
    value
        .filter(|s| !s.trim().is_empty())
        .map(ScreenshotRef::new)
}

fn stored_error(trade_id: &str, err: JournalError) -> JournalError {
    JournalError::Database {
        reason: format!("stored trade {trade_id}: {err}"),
    }
}
