//! Performance analytics over resolved trades.
//!
//! Only `Win` and `Loss` outcomes contribute; breakeven and study entries are
//! skipped everywhere in this module.

use chrono::NaiveDate;
use std::collections::HashMap;

use super::trade::{Outcome, TradeId, TradeRecord};

#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceSummary {
    pub trade_count: usize,
    pub wins: usize,
    pub losses: usize,
    pub total_pnl: f64,
    /// Percentage in `0..=100`.
    pub win_rate: f64,
    pub avg_win: f64,
    /// Mean PnL of losing trades, keeps its sign.
    pub avg_loss: f64,
    /// `+inf` when there are no losing dollars but winning dollars exist,
    /// `0.0` when both sides are zero.
    pub profit_factor: f64,
    pub largest_win: f64,
    /// Most negative losing PnL.
    pub largest_loss: f64,
    pub total_r: f64,
    pub avg_r_multiple: f64,
}

impl PerformanceSummary {
    pub fn compute<'a>(records: impl IntoIterator<Item = &'a TradeRecord>) -> Self {
        let mut trade_count = 0usize;
        let mut wins = 0usize;
        let mut losses = 0usize;
        let mut total_pnl = 0.0_f64;
        let mut gross_win = 0.0_f64;
        let mut gross_loss = 0.0_f64;
        let mut largest_win = 0.0_f64;
        let mut largest_loss = 0.0_f64;
        let mut total_r = 0.0_f64;

        for trade in resolved(records) {
            trade_count += 1;
            total_pnl += trade.pnl;
            total_r += trade.r_multiple;
            match trade.outcome {
                Outcome::Win => {
                    wins += 1;
                    gross_win += trade.pnl;
                    if trade.pnl > largest_win {
                        largest_win = trade.pnl;
                    }
                }
                Outcome::Loss => {
                    losses += 1;
                    gross_loss += trade.pnl;
                    if trade.pnl < largest_loss {
                        largest_loss = trade.pnl;
                    }
                }
                Outcome::Breakeven | Outcome::NoTradeOrStudy => {}
            }
        }

        let win_rate = if trade_count > 0 {
            wins as f64 / trade_count as f64 * 100.0
        } else {
            0.0
        };

        let avg_win = if wins > 0 {
            gross_win / wins as f64
        } else {
            0.0
        };

        let avg_loss = if losses > 0 {
            gross_loss / losses as f64
        } else {
            0.0
        };

        let profit_factor = profit_factor(gross_win, gross_loss);

        let avg_r_multiple = if trade_count > 0 {
            total_r / trade_count as f64
        } else {
            0.0
        };

        PerformanceSummary {
            trade_count,
            wins,
            losses,
            total_pnl,
            win_rate,
            avg_win,
            avg_loss,
            profit_factor,
            largest_win,
            largest_loss,
            total_r,
            avg_r_multiple,
        }
    }
}

/// `gross_loss` is the signed sum of losing PnL.
pub fn profit_factor(gross_win: f64, gross_loss: f64) -> f64 {
    if gross_loss != 0.0 {
        gross_win / gross_loss.abs()
    } else if gross_win > 0.0 {
        f64::INFINITY
    } else {
        0.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub trade_id: TradeId,
    pub pnl: f64,
    pub cumulative_pnl: f64,
}

/// Running PnL in date order. Trades on the same date keep ledger order.
pub fn equity_curve<'a>(records: impl IntoIterator<Item = &'a TradeRecord>) -> Vec<EquityPoint> {
    let mut trades: Vec<&TradeRecord> = resolved(records).collect();
    trades.sort_by_key(|t| t.date);

    let mut cumulative = 0.0;
    trades
        .into_iter()
        .map(|t| {
            cumulative += t.pnl;
            EquityPoint {
                date: t.date,
                trade_id: t.id.clone(),
                pnl: t.pnl,
                cumulative_pnl: cumulative,
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct SymbolPnl {
    pub symbol: String,
    pub trades: usize,
    pub total_pnl: f64,
}

/// Net PnL per symbol, best first. Equal totals are ordered by symbol.
pub fn pnl_by_symbol<'a>(records: impl IntoIterator<Item = &'a TradeRecord>) -> Vec<SymbolPnl> {
    let mut groups: HashMap<&str, SymbolPnl> = HashMap::new();
    for trade in resolved(records) {
        let entry = groups
            .entry(trade.symbol.as_str())
            .or_insert_with(|| SymbolPnl {
                symbol: trade.symbol.clone(),
                trades: 0,
                total_pnl: 0.0,
            });
        entry.trades += 1;
        entry.total_pnl += trade.pnl;
    }

    let mut result: Vec<SymbolPnl> = groups.into_values().collect();
    result.sort_by(|a, b| {
        b.total_pnl
            .total_cmp(&a.total_pnl)
            .then_with(|| a.symbol.cmp(&b.symbol))
    });
    result
}

fn resolved<'a>(
    records: impl IntoIterator<Item = &'a TradeRecord>,
) -> impl Iterator<Item = &'a TradeRecord> {
    records.into_iter().filter(|t| t.outcome.is_resolved())
}
