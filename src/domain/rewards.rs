//! Reward events handed to the gamification collaborator.

use sha2::{Digest, Sha256};
use std::fmt;

use super::trade::TradeId;

pub const TRADE_LOGGED_XP: i64 = 10;
pub const NOTES_XP: i64 = 5;

/// SHA-256 of trimmed notes, hex encoded.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NotesFingerprint(String);

impl NotesFingerprint {
    /// Returns `None` for notes that are empty after trimming.
    pub fn of(notes: &str) -> Option<Self> {
        let trimmed = notes.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(NotesFingerprint(hex::encode(Sha256::digest(trimmed.as_bytes()))))
    }

    pub fn from_hex(value: impl Into<String>) -> Self {
        NotesFingerprint(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NotesFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RewardEvent {
    TradeLogged {
        id: TradeId,
    },
    TradeDeleted {
        id: TradeId,
        notes_rewarded: bool,
    },
    NotesChanged {
        id: TradeId,
        fingerprint: NotesFingerprint,
    },
}

impl RewardEvent {
    pub fn trade_id(&self) -> &TradeId {
        match self {
            RewardEvent::TradeLogged { id }
            | RewardEvent::TradeDeleted { id, .. }
            | RewardEvent::NotesChanged { id, .. } => id,
        }
    }

    /// Signed XP change for this event.
    pub fn xp(&self) -> i64 {
        match self {
            RewardEvent::TradeLogged { .. } => TRADE_LOGGED_XP,
            RewardEvent::TradeDeleted { notes_rewarded, .. } => {
                if *notes_rewarded {
                    -(TRADE_LOGGED_XP + NOTES_XP)
                } else {
                    -TRADE_LOGGED_XP
                }
            }
            RewardEvent::NotesChanged { .. } => NOTES_XP,
        }
    }

    pub fn reason(&self) -> String {
        match self {
            RewardEvent::TradeLogged { .. } => "Logged a new trade".to_string(),
            RewardEvent::TradeDeleted { id, .. } => format!("Deleted trade {id}"),
            RewardEvent::NotesChanged { id, .. } => format!("Added notes to trade {id}"),
        }
    }
}

/// Decides whether saving `notes` earns a notes reward given the
/// fingerprint last rewarded for the trade.
pub fn notes_reward(
    id: &TradeId,
    notes: &str,
    last_rewarded: Option<&NotesFingerprint>,
) -> Option<RewardEvent> {
    let fingerprint = NotesFingerprint::of(notes)?;
    if last_rewarded == Some(&fingerprint) {
        return None;
    }
    Some(RewardEvent::NotesChanged {
        id: id.clone(),
        fingerprint,
    })
}
