//! PnL and R-multiple calculation.
//!
//! Uses a fixed FX pip convention: 0.01 for JPY-quoted symbols, 0.0001 for
//! everything else, valued at 10 currency units per pip per standard lot.
//! Neither constant is instrument-aware.

use super::error::JournalError;
use super::trade::Direction;

pub const PIP_SIZE: f64 = 0.0001;
pub const JPY_PIP_SIZE: f64 = 0.01;
pub const USD_PER_PIP_PER_LOT: f64 = 10.0;

/// How PnL and R are obtained for a new trade.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PnlMode {
    Manual { pnl: f64, r_multiple: f64 },
    Computed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CalcInputs<'a> {
    pub symbol: &'a str,
    pub direction: Direction,
    pub size_lots: f64,
    pub entry_price: f64,
    pub stop_loss: f64,
    pub final_exit: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PnlRr {
    pub pnl: f64,
    pub r_multiple: f64,
}

pub fn compute_or_passthrough(mode: PnlMode, inputs: &CalcInputs) -> Result<PnlRr, JournalError> {
    match mode {
        PnlMode::Manual { pnl, r_multiple } => {
            if !pnl.is_finite() || !r_multiple.is_finite() {
                return Err(JournalError::invalid_input(
                    "manual pnl and r-multiple must be finite numbers",
                ));
            }
            Ok(PnlRr { pnl, r_multiple })
        }
        PnlMode::Computed => compute(inputs),
    }
}

pub fn compute(inputs: &CalcInputs) -> Result<PnlRr, JournalError> {
    if !(inputs.entry_price > 0.0) || !(inputs.stop_loss > 0.0) {
        return Err(JournalError::invalid_input("entry and stop must be > 0"));
    }

    let pips = pips_moved(inputs.symbol, inputs.entry_price, inputs.final_exit);
    let pnl = pips * inputs.size_lots * USD_PER_PIP_PER_LOT * inputs.direction.sign();

    Ok(PnlRr {
        pnl,
        r_multiple: r_multiple(
            inputs.direction,
            inputs.entry_price,
            inputs.stop_loss,
            inputs.final_exit,
        ),
    })
}

pub fn pip_size(symbol: &str) -> f64 {
    if symbol.to_uppercase().contains("JPY") {
        JPY_PIP_SIZE
    } else {
        PIP_SIZE
    }
}

pub fn pips_moved(symbol: &str, entry_price: f64, final_exit: f64) -> f64 {
    (final_exit - entry_price) / pip_size(symbol)
}

pub fn r_multiple(direction: Direction, entry_price: f64, stop_loss: f64, final_exit: f64) -> f64 {
    let risk_per_unit = (entry_price - stop_loss).abs();
    if risk_per_unit == 0.0 || final_exit == entry_price {
        return 0.0;
    }

    let reward_per_unit = (final_exit - entry_price).abs();
    let r = reward_per_unit / risk_per_unit;
    let against = match direction {
        Direction::Long => final_exit < entry_price,
        Direction::Short => final_exit > entry_price,
    };
    if against { -r } else { r }
}
