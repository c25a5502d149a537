//! Ledger persistence port.

use crate::domain::error::JournalError;
use crate::domain::ledger::Ledger;

/// Durable, tabular storage of one ledger per user, keyed by trade.
///
/// `save_ledger` replaces the user's stored ledger as a whole and must either
/// succeed completely or leave the previous contents in place.
pub trait LedgerStore {
    /// Returns an empty ledger for a user with nothing stored.
    fn load_ledger(&self, user_id: &str) -> Result<Ledger, JournalError>;

    fn save_ledger(&self, user_id: &str, ledger: &Ledger) -> Result<(), JournalError>;
}
