//! Flat-file CSV ledger and reward adapter.
//!
//! Each user gets `<user>_journal.csv` (one row per trade, ledger order),
//! `<user>_retired.csv` (ids that must not be issued again) and
//! `<user>_rewards.csv` (append-only reward log).

use crate::adapters::trade_row::{COLUMNS, TradeRow};
use crate::domain::error::JournalError;
use crate::domain::ledger::Ledger;
use crate::domain::rewards::{NotesFingerprint, RewardEvent};
use crate::domain::trade::TradeId;
use crate::ports::ledger_store::LedgerStore;
use crate::ports::reward_port::RewardPort;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::warn;

const REWARD_COLUMNS: [&str; 5] = ["trade_id", "kind", "delta", "reason", "fingerprint"];

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn journal_path(&self, user_id: &str) -> PathBuf {
        self.base_path.join(format!("{user_id}_journal.csv"))
    }

    fn retired_path(&self, user_id: &str) -> PathBuf {
        self.base_path.join(format!("{user_id}_retired.csv"))
    }

    fn rewards_path(&self, user_id: &str) -> PathBuf {
        self.base_path.join(format!("{user_id}_rewards.csv"))
    }

    fn read_rows(path: &Path) -> Result<Vec<TradeRow>, JournalError> {
        let mut rdr = csv::Reader::from_path(path).map_err(|e| csv_error(path, e))?;
        let headers = rdr.headers().map_err(|e| csv_error(path, e))?.clone();
        let index = |name: &str| headers.iter().position(|h| h.trim() == name);
        let columns: Vec<Option<usize>> = COLUMNS.iter().map(|c| index(*c)).collect();

        if columns[0].is_none() {
            return Err(JournalError::Database {
                reason: format!("{}: missing trade_id column", path.display()),
            });
        }

        let mut rows = Vec::new();
        for result in rdr.records() {
            let record = result.map_err(|e| csv_error(path, e))?;
            let text = |col: usize| -> String {
                columns[col]
                    .and_then(|i| record.get(i))
                    .unwrap_or("")
                    .to_string()
            };
            let number = |col: usize| -> Result<Option<f64>, JournalError> {
                let raw = text(col);
                let raw = raw.trim();
                if raw.is_empty() {
                    return Ok(None);
                }
                raw.parse::<f64>()
                    .map(Some)
                    .map_err(|e| JournalError::Database {
                        reason: format!(
                            "{}: invalid {} value '{raw}': {e}",
                            path.display(),
                            COLUMNS[col]
                        ),
                    })
            };
            let optional_text = |col: usize| -> Option<String> {
                let value = text(col);
                if value.is_empty() { None } else { Some(value) }
            };

            rows.push(TradeRow {
                trade_id: text(0),
                date: text(1),
                symbol: text(2),
                direction: text(3),
                outcome: text(4),
                size_lots: number(5)?.unwrap_or(0.0),
                entry_price: number(6)?,
                stop_loss: number(7)?,
                final_exit: number(8)?,
                pnl: number(9)?.unwrap_or(0.0),
                r_multiple: number(10)?.unwrap_or(0.0),
                tags: text(11),
                entry_rationale: text(12),
                strategy: text(13),
                journal_notes: text(14),
                entry_screenshot: optional_text(15),
                exit_screenshot: optional_text(16),
            });
        }
        Ok(rows)
    }

    fn read_retired(path: &Path) -> Result<Vec<TradeId>, JournalError> {
        let mut rdr = csv::Reader::from_path(path).map_err(|e| csv_error(path, e))?;
        let mut ids = Vec::new();
        for result in rdr.records() {
            let record = result.map_err(|e| csv_error(path, e))?;
            if let Some(raw) = record.get(0) {
                ids.push(TradeId::parse(raw)?);
            }
        }
        Ok(ids)
    }

    fn write_journal(path: &Path, ledger: &Ledger) -> Result<(), JournalError> {
        let mut wtr = csv::Writer::from_path(path).map_err(|e| csv_error(path, e))?;
        wtr.write_record(COLUMNS).map_err(|e| csv_error(path, e))?;
        for record in ledger {
            let row = TradeRow::from_record(record);
            wtr.write_record([
                row.trade_id,
                row.date,
                row.symbol,
                row.direction,
                row.outcome,
                row.size_lots.to_string(),
                optional_number(row.entry_price),
                optional_number(row.stop_loss),
                optional_number(row.final_exit),
                row.pnl.to_string(),
                row.r_multiple.to_string(),
                row.tags,
                row.entry_rationale,
                row.strategy,
                row.journal_notes,
                row.entry_screenshot.unwrap_or_default(),
                row.exit_screenshot.unwrap_or_default(),
            ])
            .map_err(|e| csv_error(path, e))?;
        }
        wtr.flush()?;
        Ok(())
    }

    fn write_retired(path: &Path, ledger: &Ledger) -> Result<(), JournalError> {
        let mut wtr = csv::Writer::from_path(path).map_err(|e| csv_error(path, e))?;
        wtr.write_record(["trade_id"])
            .map_err(|e| csv_error(path, e))?;
        for id in ledger.retired_ids() {
            wtr.write_record([id.as_str()])
                .map_err(|e| csv_error(path, e))?;
        }
        wtr.flush()?;
        Ok(())
    }
}

impl LedgerStore for CsvAdapter {
    fn load_ledger(&self, user_id: &str) -> Result<Ledger, JournalError> {
        let journal = self.journal_path(user_id);
        if !journal.exists() {
            return Ok(Ledger::new());
        }

        let mut records = Vec::new();
        for row in Self::read_rows(&journal)? {
            records.push(row.into_record()?);
        }

        let retired_path = self.retired_path(user_id);
        let retired = if retired_path.exists() {
            Self::read_retired(&retired_path)?
        } else {
            Vec::new()
        };

        Ledger::from_parts(records, retired)
    }

    /// Writes to temporary siblings and renames them into place. The previous
    /// retired-ids file is kept as a backup until the journal rename succeeds,
    /// so a failed save leaves both files as they were.
    fn save_ledger(&self, user_id: &str, ledger: &Ledger) -> Result<(), JournalError> {
        fs::create_dir_all(&self.base_path)?;

        let journal = self.journal_path(user_id);
        let retired = self.retired_path(user_id);
        let journal_tmp = journal.with_extension("csv.tmp");
        let retired_tmp = retired.with_extension("csv.tmp");
        let retired_backup = retired.with_extension("csv.bak");
        let discard_temps = || {
            let _ = fs::remove_file(&journal_tmp);
            let _ = fs::remove_file(&retired_tmp);
        };

        let written = Self::write_journal(&journal_tmp, ledger)
            .and_then(|()| Self::write_retired(&retired_tmp, ledger));
        if let Err(err) = written {
            discard_temps();
            return Err(err);
        }

        let had_retired = retired.exists();
        let backed_up = if had_retired {
            fs::copy(&retired, &retired_backup).map(|_| ())
        } else {
            Ok(())
        };
        let swapped = backed_up.and_then(|()| fs::rename(&retired_tmp, &retired));
        if let Err(err) = swapped {
            discard_temps();
            let _ = fs::remove_file(&retired_backup);
            return Err(err.into());
        }

        if let Err(err) = fs::rename(&journal_tmp, &journal) {
            let restored = if had_retired {
                fs::rename(&retired_backup, &retired)
            } else {
                fs::remove_file(&retired)
            };
            if let Err(restore_err) = restored {
                warn!(
                    path = %retired.display(),
                    error = %restore_err,
                    "failed to restore retired ids after journal write failure"
                );
            }
            discard_temps();
            return Err(err.into());
        }

        if had_retired {
            let _ = fs::remove_file(&retired_backup);
        }
        Ok(())
    }
}

impl RewardPort for CsvAdapter {
    fn grant(&self, user_id: &str, event: &RewardEvent) -> Result<(), JournalError> {
        fs::create_dir_all(&self.base_path)?;
        let path = self.rewards_path(user_id);
        let is_new = !path.exists();

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| JournalError::Reward {
                reason: format!("{}: {e}", path.display()),
            })?;
        let mut wtr = csv::Writer::from_writer(file);
        let reward_err = |e: csv::Error| JournalError::Reward {
            reason: format!("{}: {e}", path.display()),
        };

        if is_new {
            wtr.write_record(REWARD_COLUMNS).map_err(reward_err)?;
        }
        let (kind, fingerprint) = match event {
            RewardEvent::TradeLogged { .. } => ("logged", String::new()),
            RewardEvent::TradeDeleted { .. } => ("deleted", String::new()),
            RewardEvent::NotesChanged { fingerprint, .. } => ("notes", fingerprint.to_string()),
        };
        wtr.write_record([
            event.trade_id().to_string(),
            kind.to_string(),
            event.xp().to_string(),
            event.reason(),
            fingerprint,
        ])
        .map_err(reward_err)?;
        wtr.flush().map_err(|e| JournalError::Reward {
            reason: format!("{}: {e}", path.display()),
        })?;
        Ok(())
    }

    fn notes_fingerprint(
        &self,
        user_id: &str,
        id: &TradeId,
    ) -> Result<Option<NotesFingerprint>, JournalError> {
        let path = self.rewards_path(user_id);
        if !path.exists() {
            return Ok(None);
        }

        let mut rdr = csv::Reader::from_path(&path).map_err(|e| JournalError::Reward {
            reason: format!("{}: {e}", path.display()),
        })?;
        let mut last = None;
        for result in rdr.records() {
            let record = result.map_err(|e| JournalError::Reward {
                reason: format!("{}: {e}", path.display()),
            })?;
            if record.get(0) != Some(id.as_str()) {
                continue;
            }
            match record.get(1) {
                Some("notes") => {
                    last = record
                        .get(4)
                        .filter(|f| !f.is_empty())
                        .map(NotesFingerprint::from_hex);
                }
                Some("deleted") => last = None,
                _ => {}
            }
        }
        Ok(last)
    }
}

fn optional_number(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn csv_error(path: &Path, err: csv::Error) -> JournalError {
    JournalError::Database {
        reason: format!("{}: {err}", path.display()),
    }
}
