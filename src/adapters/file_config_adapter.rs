//! INI file configuration adapter.

use crate::domain::error::JournalError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, JournalError> {
        let path = path.as_ref();
        let mut config = Ini::new();
        config
            .load(path)
            .map_err(|reason| JournalError::ConfigParse {
                file: path.display().to_string(),
                reason,
            })?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, JournalError> {
        let mut config = Ini::new();
        config
            .read(content.to_string())
            .map_err(|reason| JournalError::ConfigParse {
                file: "<string>".to_string(),
                reason,
            })?;
        Ok(Self { config })
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        self.config
            .getint(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const JOURNAL_INI: &str = r#"
[journal]
user = alice

[storage]
backend = sqlite

[sqlite]
path = /var/lib/tradejournal/journal.db
pool_size = 2

[screenshots]
dir = /var/lib/tradejournal/images
"#;

    #[test]
    fn reads_journal_sections() {
        let adapter = FileConfigAdapter::from_string(JOURNAL_INI).unwrap();
        assert_eq!(adapter.get_string("journal", "user"), Some("alice".into()));
        assert_eq!(
            adapter.get_string("sqlite", "path"),
            Some("/var/lib/tradejournal/journal.db".into())
        );
        assert_eq!(adapter.get_int("sqlite", "pool_size", 4), 2);
    }

    #[test]
    fn missing_keys_fall_back() {
        let adapter = FileConfigAdapter::from_string(JOURNAL_INI).unwrap();
        assert_eq!(adapter.get_string("csv", "dir"), None);
        assert_eq!(adapter.get_int("csv", "pool_size", 7), 7);
    }

    #[test]
    fn non_numeric_int_uses_default() {
        let adapter = FileConfigAdapter::from_string("[sqlite]\npool_size = many\n").unwrap();
        assert_eq!(adapter.get_int("sqlite", "pool_size", 4), 4);
    }

    #[test]
    fn blank_path_is_not_a_path() {
        let adapter = FileConfigAdapter::from_string("[csv]\ndir =   \n[sqlite]\npath = j.db \n").unwrap();
        assert_eq!(adapter.get_path("csv", "dir"), None);
        assert_eq!(
            adapter.get_path("sqlite", "path"),
            Some(std::path::PathBuf::from("j.db"))
        );
    }

    #[test]
    fn from_file_reads_config() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "[csv]\ndir = /tmp/journals\n").unwrap();
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        assert_eq!(adapter.get_string("csv", "dir"), Some("/tmp/journals".into()));
    }

    #[test]
    fn from_file_missing_is_config_parse_error() {
        let err = FileConfigAdapter::from_file("/nonexistent/journal.ini")
            .err()
            .expect("expected error");
        assert!(matches!(err, JournalError::ConfigParse { file, .. } if file == "/nonexistent/journal.ini"));
    }
}
