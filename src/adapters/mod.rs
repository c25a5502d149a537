//! Adapter implementations of the port traits.

pub mod csv_adapter;
pub mod file_config_adapter;
pub mod fs_screenshot_adapter;
#[cfg(feature = "sqlite")]
pub mod sqlite_adapter;
pub mod trade_row;
