#![allow(dead_code)]

use chrono::NaiveDate;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use tradejournal::domain::calculator::PnlMode;
use tradejournal::domain::error::JournalError;
use tradejournal::domain::journal::TradeForm;
use tradejournal::domain::ledger::Ledger;
use tradejournal::domain::rewards::{NotesFingerprint, RewardEvent};
use tradejournal::domain::trade::{Direction, Outcome, ScreenshotRef, ScreenshotSlot, TradeId};
use tradejournal::ports::ledger_store::LedgerStore;
use tradejournal::ports::reward_port::RewardPort;
use tradejournal::ports::screenshot_port::ScreenshotStore;

/// In-memory ledger store. `fail_saves` makes every save fail until reset.
pub struct MockLedgerStore {
    pub saved: RefCell<HashMap<String, Ledger>>,
    pub fail_saves: Cell<bool>,
    pub save_count: Cell<usize>,
}

impl MockLedgerStore {
    pub fn new() -> Self {
        Self {
            saved: RefCell::new(HashMap::new()),
            fail_saves: Cell::new(false),
            save_count: Cell::new(0),
        }
    }

    pub fn stored(&self, user_id: &str) -> Option<Ledger> {
        self.saved.borrow().get(user_id).cloned()
    }
}

impl LedgerStore for MockLedgerStore {
    fn load_ledger(&self, user_id: &str) -> Result<Ledger, JournalError> {
        Ok(self.stored(user_id).unwrap_or_default())
    }

    fn save_ledger(&self, user_id: &str, ledger: &Ledger) -> Result<(), JournalError> {
        if self.fail_saves.get() {
            return Err(JournalError::Database {
                reason: "disk full".into(),
            });
        }
        self.save_count.set(self.save_count.get() + 1);
        self.saved
            .borrow_mut()
            .insert(user_id.to_string(), ledger.clone());
        Ok(())
    }
}

/// Records granted events and tracks the last rewarded notes fingerprint.
pub struct MockRewards {
    pub events: RefCell<Vec<(String, RewardEvent)>>,
    pub fingerprints: RefCell<HashMap<(String, TradeId), NotesFingerprint>>,
    pub fail_grants: Cell<bool>,
}

impl MockRewards {
    pub fn new() -> Self {
        Self {
            events: RefCell::new(Vec::new()),
            fingerprints: RefCell::new(HashMap::new()),
            fail_grants: Cell::new(false),
        }
    }

    pub fn total_xp(&self, user_id: &str) -> i64 {
        self.events
            .borrow()
            .iter()
            .filter(|(user, _)| user == user_id)
            .map(|(_, event)| event.xp())
            .sum()
    }

    pub fn event_count(&self) -> usize {
        self.events.borrow().len()
    }
}

impl RewardPort for MockRewards {
    fn grant(&self, user_id: &str, event: &RewardEvent) -> Result<(), JournalError> {
        if self.fail_grants.get() {
            return Err(JournalError::Reward {
                reason: "reward service unavailable".into(),
            });
        }
        let key = (user_id.to_string(), event.trade_id().clone());
        match event {
            RewardEvent::NotesChanged { fingerprint, .. } => {
                self.fingerprints
                    .borrow_mut()
                    .insert(key, fingerprint.clone());
            }
            RewardEvent::TradeDeleted { .. } => {
                self.fingerprints.borrow_mut().remove(&key);
            }
            RewardEvent::TradeLogged { .. } => {}
        }
        self.events
            .borrow_mut()
            .push((user_id.to_string(), event.clone()));
        Ok(())
    }

    fn notes_fingerprint(
        &self,
        user_id: &str,
        id: &TradeId,
    ) -> Result<Option<NotesFingerprint>, JournalError> {
        Ok(self
            .fingerprints
            .borrow()
            .get(&(user_id.to_string(), id.clone()))
            .cloned())
    }
}

/// Screenshot store that keeps bytes in memory.
pub struct MockScreenshots {
    pub files: RefCell<HashMap<ScreenshotRef, Vec<u8>>>,
    pub next: Cell<usize>,
}

impl MockScreenshots {
    pub fn new() -> Self {
        Self {
            files: RefCell::new(HashMap::new()),
            next: Cell::new(0),
        }
    }

    pub fn exists(&self, reference: &ScreenshotRef) -> bool {
        self.files.borrow().contains_key(reference)
    }

    pub fn count(&self) -> usize {
        self.files.borrow().len()
    }
}

impl ScreenshotStore for MockScreenshots {
    fn store(
        &self,
        user_id: &str,
        id: &TradeId,
        slot: ScreenshotSlot,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<ScreenshotRef, JournalError> {
        let n = self.next.get();
        self.next.set(n + 1);
        let reference = ScreenshotRef::new(format!(
            "{user_id}/journal_images/{id}_{}_{n}_{file_name}",
            slot.as_str()
        ));
        self.files
            .borrow_mut()
            .insert(reference.clone(), bytes.to_vec());
        Ok(reference)
    }

    fn delete(&self, reference: &ScreenshotRef) -> Result<(), JournalError> {
        self.files.borrow_mut().remove(reference);
        Ok(())
    }
}

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

pub fn manual_form(symbol: &str, outcome: Outcome, pnl: f64, r: f64) -> TradeForm {
    TradeForm {
        date: date(2024, 4, 2),
        symbol: symbol.into(),
        direction: Direction::Long,
        outcome,
        size_lots: 1.0,
        entry_price: None,
        stop_loss: None,
        final_exit: None,
        mode: PnlMode::Manual { pnl, r_multiple: r },
        tags: Vec::new(),
        entry_rationale: String::new(),
        strategy: String::new(),
    }
}

pub fn computed_form(
    symbol: &str,
    direction: Direction,
    entry: f64,
    stop: f64,
    exit: f64,
) -> TradeForm {
    TradeForm {
        date: date(2024, 4, 2),
        symbol: symbol.into(),
        direction,
        outcome: Outcome::Win,
        size_lots: 1.0,
        entry_price: Some(entry),
        stop_loss: Some(stop),
        final_exit: Some(exit),
        mode: PnlMode::Computed,
        tags: vec!["Breakout".into()],
        entry_rationale: "retest".into(),
        strategy: String::new(),
    }
}
