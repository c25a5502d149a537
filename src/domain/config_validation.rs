//! Configuration validation.
//!
//! Checks the journal INI before any store is opened.

use crate::domain::error::JournalError;
use crate::ports::config_port::ConfigPort;

pub const BACKEND_SQLITE: &str = "sqlite";
pub const BACKEND_CSV: &str = "csv";

pub fn validate_journal_config(config: &dyn ConfigPort) -> Result<(), JournalError> {
    validate_user(config)?;
    validate_backend(config)?;
    validate_pool_size(config)?;
    Ok(())
}

fn validate_user(config: &dyn ConfigPort) -> Result<(), JournalError> {
    match config.get_string("journal", "user") {
        None => Ok(()),
        Some(user) if is_valid_user_id(&user) => Ok(()),
        Some(_) => Err(JournalError::ConfigInvalid {
            section: "journal".to_string(),
            key: "user".to_string(),
            reason: "user must be non-empty and use only letters, digits, '-', '_' or '.'"
                .to_string(),
        }),
    }
}

/// User ids end up in file names, so keep them to a safe character set.
pub fn is_valid_user_id(user: &str) -> bool {
    let user = user.trim();
    !user.is_empty()
        && user != "."
        && user != ".."
        && user
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

fn validate_backend(config: &dyn ConfigPort) -> Result<(), JournalError> {
    let backend = config
        .get_string("storage", "backend")
        .unwrap_or_else(|| BACKEND_SQLITE.to_string())
        .to_lowercase();

    match backend.as_str() {
        BACKEND_SQLITE => {
            require_key(config, "sqlite", "path")?;
            Ok(())
        }
        BACKEND_CSV => {
            require_key(config, "csv", "dir")?;
            Ok(())
        }
        other => Err(JournalError::ConfigInvalid {
            section: "storage".to_string(),
            key: "backend".to_string(),
            reason: format!("unknown backend '{other}', expected sqlite or csv"),
        }),
    }
}

fn validate_pool_size(config: &dyn ConfigPort) -> Result<(), JournalError> {
    let value = config.get_int("sqlite", "pool_size", 4);
    if value < 1 {
        return Err(JournalError::ConfigInvalid {
            section: "sqlite".to_string(),
            key: "pool_size".to_string(),
            reason: "pool_size must be at least 1".to_string(),
        });
    }
    Ok(())
}

fn require_key(config: &dyn ConfigPort, section: &str, key: &str) -> Result<String, JournalError> {
    match config.get_string(section, key) {
        Some(value) if !value.trim().is_empty() => Ok(value),
        Some(_) => Err(JournalError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: format!("{key} must not be empty"),
        }),
        None => Err(JournalError::ConfigMissing {
            section: section.to_string(),
            key: key.to_string(),
        }),
    }
}
