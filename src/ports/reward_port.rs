//! Reward (XP/streak/milestone) collaborator port.

use crate::domain::error::JournalError;
use crate::domain::rewards::{NotesFingerprint, RewardEvent};
use crate::domain::trade::TradeId;

pub trait RewardPort {
    /// Applies the event's XP. `NotesChanged` also records its fingerprint
    /// for the trade; `TradeDeleted` forgets it.
    fn grant(&self, user_id: &str, event: &RewardEvent) -> Result<(), JournalError>;

    /// Fingerprint of the notes last rewarded for `id`, if any.
    fn notes_fingerprint(
        &self,
        user_id: &str,
        id: &TradeId,
    ) -> Result<Option<NotesFingerprint>, JournalError>;
}
