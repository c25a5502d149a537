//! Core domain types and logic.

pub mod trade;
pub mod tags;
pub mod calculator;
pub mod ledger;
pub mod analytics;
pub mod rewards;
pub mod symbols;
pub mod journal;
pub mod config_validation;
pub mod error;
