//! Configuration access port trait.

use std::path::PathBuf;

/// Sectioned key/value settings, as read from the journal's INI file.
/// `get_int` falls back to `default` when the key is missing or does not
/// parse.
pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    fn get_int(&self, section: &str, key: &str, default: i64) -> i64;

    /// A trimmed, non-empty value as a filesystem path.
    fn get_path(&self, section: &str, key: &str) -> Option<PathBuf> {
        self.get_string(section, key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
    }
}
