//! A single user's journal session.
//!
//! Every mutating call follows the same sequence: apply the change to the
//! in-memory ledger, save the whole ledger, and only then run reward and
//! file-storage side effects. A failed save puts the ledger back the way it
//! was and returns [`JournalError::Persistence`].

use chrono::NaiveDate;
use tracing::{info, warn};

use super::analytics::{self, EquityPoint, PerformanceSummary, SymbolPnl};
use super::calculator::{self, CalcInputs, PnlMode};
use super::error::JournalError;
use super::ledger::{self, Ledger, TradeFilter};
use super::rewards::{self, RewardEvent};
use super::tags::TagSet;
use super::trade::{
    Direction, FieldUpdate, Outcome, ScreenshotRef, ScreenshotSlot, TradeEntry, TradeId,
    TradeRecord,
};
use crate::ports::ledger_store::LedgerStore;
use crate::ports::reward_port::RewardPort;
use crate::ports::screenshot_port::ScreenshotStore;

/// Raw input for a new trade, as collected by the entry form.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeForm {
    pub date: NaiveDate,
    pub symbol: String,
    pub direction: Direction,
    pub outcome: Outcome,
    pub size_lots: f64,
    pub entry_price: Option<f64>,
    pub stop_loss: Option<f64>,
    pub final_exit: Option<f64>,
    pub mode: PnlMode,
    pub tags: Vec<String>,
    pub entry_rationale: String,
    pub strategy: String,
}

impl TradeForm {
    /// Derives PnL and R and normalises tags. Fails before anything is
    /// recorded when computed mode lacks an entry or stop price.
    pub fn resolve(self) -> Result<TradeEntry, JournalError> {
        let symbol = self.symbol.trim().to_string();
        let inputs = CalcInputs {
            symbol: &symbol,
            direction: self.direction,
            size_lots: self.size_lots,
            entry_price: self.entry_price.unwrap_or(0.0),
            stop_loss: self.stop_loss.unwrap_or(0.0),
            final_exit: self.final_exit.unwrap_or(0.0),
        };
        let result = calculator::compute_or_passthrough(self.mode, &inputs)?;

        let entry = TradeEntry {
            date: self.date,
            symbol,
            direction: self.direction,
            outcome: self.outcome,
            size_lots: self.size_lots,
            entry_price: self.entry_price,
            stop_loss: self.stop_loss,
            final_exit: self.final_exit,
            pnl: result.pnl,
            r_multiple: result.r_multiple,
            tags: self.tags.iter().collect::<TagSet>(),
            entry_rationale: self.entry_rationale,
            strategy: self.strategy,
            journal_notes: String::new(),
            entry_screenshot: None,
            exit_screenshot: None,
        };
        entry.validate()?;
        Ok(entry)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotesSaved {
    /// XP granted for this save, zero when the content was already rewarded.
    pub xp_awarded: i64,
}

pub struct Journal<'a> {
    user_id: String,
    ledger: Ledger,
    store: &'a dyn LedgerStore,
    rewards: &'a dyn RewardPort,
    screenshots: &'a dyn ScreenshotStore,
}

impl<'a> Journal<'a> {
    pub fn open(
        user_id: impl Into<String>,
        store: &'a dyn LedgerStore,
        rewards: &'a dyn RewardPort,
        screenshots: &'a dyn ScreenshotStore,
    ) -> Result<Self, JournalError> {
        let user_id = user_id.into();
        let ledger = store.load_ledger(&user_id)?;
        info!(user = %user_id, trades = ledger.len(), "journal opened");
        Ok(Journal {
            user_id,
            ledger,
            store,
            rewards,
            screenshots,
        })
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn log_trade(&mut self, form: TradeForm) -> Result<TradeId, JournalError> {
        let entry = form.resolve()?;
        let id = self.ledger.append(None, entry)?.id.clone();

        if let Err(err) = self.persist() {
            self.ledger.undo_append(&id);
            return Err(err);
        }

        info!(user = %self.user_id, id = %id, "trade logged");
        self.grant(RewardEvent::TradeLogged { id: id.clone() });
        Ok(id)
    }

    pub fn update_field(&mut self, id: &TradeId, update: FieldUpdate) -> Result<(), JournalError> {
        self.update_fields(id, vec![update])
    }

    /// Applies several edits to one trade and saves them together. A rejected
    /// edit or a failed save leaves the trade unchanged. Screenshot files that
    /// are no longer referenced after the save are deleted.
    pub fn update_fields(
        &mut self,
        id: &TradeId,
        updates: Vec<FieldUpdate>,
    ) -> Result<(), JournalError> {
        let mut previous = Vec::with_capacity(updates.len());
        for update in updates {
            match self.ledger.update_field(id, update) {
                Ok(old) => previous.push(old),
                Err(err) => {
                    self.rollback_fields(id, previous);
                    return Err(err);
                }
            }
        }

        if let Err(err) = self.persist() {
            self.rollback_fields(id, previous);
            return Err(err);
        }

        for old in &previous {
            if let FieldUpdate::Screenshot(slot, Some(reference)) = old {
                let current = self.ledger.get(id).and_then(|r| r.screenshot(*slot));
                if current != Some(reference) {
                    self.discard_screenshot(reference);
                }
            }
        }
        info!(user = %self.user_id, id = %id, fields = previous.len(), "trade updated");
        Ok(())
    }

    /// Saves journal notes and grants the notes reward once per distinct
    /// content.
    pub fn save_notes(&mut self, id: &TradeId, notes: &str) -> Result<NotesSaved, JournalError> {
        let previous = self
            .ledger
            .update_field(id, FieldUpdate::JournalNotes(notes.to_string()))?;
        if let Err(err) = self.persist() {
            self.rollback_field(id, previous);
            return Err(err);
        }
        info!(user = %self.user_id, id = %id, "notes saved");

        let last = match self.rewards.notes_fingerprint(&self.user_id, id) {
            Ok(last) => last,
            Err(err) => {
                warn!(user = %self.user_id, id = %id, error = %err, "notes reward lookup failed");
                return Ok(NotesSaved { xp_awarded: 0 });
            }
        };

        match rewards::notes_reward(id, notes, last.as_ref()) {
            Some(event) => {
                let xp = event.xp();
                if self.grant(event) {
                    Ok(NotesSaved { xp_awarded: xp })
                } else {
                    Ok(NotesSaved { xp_awarded: 0 })
                }
            }
            None => Ok(NotesSaved { xp_awarded: 0 }),
        }
    }

    /// Stores a new screenshot for one slot, replacing and cleaning up any
    /// previous file for that slot.
    pub fn attach_screenshot(
        &mut self,
        id: &TradeId,
        slot: ScreenshotSlot,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<ScreenshotRef, JournalError> {
        if self.ledger.get(id).is_none() {
            return Err(JournalError::NotFound { id: id.to_string() });
        }

        let new_ref = self
            .screenshots
            .store(&self.user_id, id, slot, file_name, bytes)?;
        let previous = self
            .ledger
            .update_field(id, FieldUpdate::Screenshot(slot, Some(new_ref.clone())))?;

        if let Err(err) = self.persist() {
            self.rollback_field(id, previous);
            self.discard_screenshot(&new_ref);
            return Err(err);
        }

        if let FieldUpdate::Screenshot(_, Some(old)) = previous {
            self.discard_screenshot(&old);
        }
        info!(user = %self.user_id, id = %id, slot = slot.as_str(), "screenshot attached");
        Ok(new_ref)
    }

    /// Deletes a trade, its screenshots and the rewards granted for it.
    pub fn delete_trade(&mut self, id: &TradeId) -> Result<TradeRecord, JournalError> {
        let index = self
            .ledger
            .position(id)
            .ok_or_else(|| JournalError::NotFound { id: id.to_string() })?;
        let removed = self.ledger.remove(id)?;

        if let Err(err) = self.persist() {
            self.ledger.restore(index, removed);
            return Err(err);
        }

        for shot in removed.screenshots() {
            self.discard_screenshot(shot);
        }

        let notes_rewarded = match self.rewards.notes_fingerprint(&self.user_id, id) {
            Ok(found) => found.is_some(),
            Err(err) => {
                warn!(user = %self.user_id, id = %id, error = %err, "notes reward lookup failed");
                false
            }
        };
        info!(user = %self.user_id, id = %id, "trade deleted");
        self.grant(RewardEvent::TradeDeleted {
            id: id.clone(),
            notes_rewarded,
        });
        Ok(removed)
    }

    pub fn filter<'f>(&self, filter: &'f TradeFilter) -> impl Iterator<Item = &TradeRecord> + Clone {
        self.ledger.filter(filter)
    }

    /// Filtered trades, newest first.
    pub fn playbook(&self, filter: &TradeFilter) -> Vec<&TradeRecord> {
        ledger::newest_first(self.ledger.filter(filter))
    }

    pub fn summary(&self) -> PerformanceSummary {
        PerformanceSummary::compute(&self.ledger)
    }

    pub fn equity_curve(&self) -> Vec<EquityPoint> {
        analytics::equity_curve(&self.ledger)
    }

    pub fn pnl_by_symbol(&self) -> Vec<SymbolPnl> {
        analytics::pnl_by_symbol(&self.ledger)
    }

    fn persist(&self) -> Result<(), JournalError> {
        self.store
            .save_ledger(&self.user_id, &self.ledger)
            .map_err(|err| {
                warn!(user = %self.user_id, error = %err, "journal save failed, rolling back");
                JournalError::persistence(&err)
            })
    }

    fn rollback_field(&mut self, id: &TradeId, previous: FieldUpdate) {
        if let Err(err) = self.ledger.update_field(id, previous) {
            warn!(user = %self.user_id, id = %id, error = %err, "rollback failed");
        }
    }

    fn rollback_fields(&mut self, id: &TradeId, previous: Vec<FieldUpdate>) {
        for update in previous.into_iter().rev() {
            self.rollback_field(id, update);
        }
    }

    fn grant(&self, event: RewardEvent) -> bool {
        match self.rewards.grant(&self.user_id, &event) {
            Ok(()) => true,
            Err(err) => {
                warn!(
                    user = %self.user_id,
                    id = %event.trade_id(),
                    xp = event.xp(),
                    error = %err,
                    "reward not applied"
                );
                false
            }
        }
    }

    fn discard_screenshot(&self, reference: &ScreenshotRef) {
        if let Err(err) = self.screenshots.delete(reference) {
            warn!(reference = %reference, error = %err, "failed to delete screenshot");
        }
    }
}
