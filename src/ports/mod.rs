//! Port traits implemented by adapters.

pub mod config_port;
pub mod ledger_store;
pub mod reward_port;
pub mod screenshot_port;
