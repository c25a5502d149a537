//! Ordered trade ledger for one user.
//!
//! Records keep insertion order. Ids are issued by the ledger and retired on
//! removal, so an id is never handed out twice for the same ledger even
//! across save/load cycles (retired ids are persisted alongside the records).

use std::collections::{BTreeSet, HashSet};

use super::error::JournalError;
use super::tags::TagSet;
use super::trade::{Direction, FieldUpdate, Outcome, TradeEntry, TradeId, TradeRecord};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ledger {
    records: Vec<TradeRecord>,
    retired: BTreeSet<TradeId>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a ledger from stored records, rejecting any id that appears
    /// twice or that is also listed as retired.
    pub fn from_parts(
        records: Vec<TradeRecord>,
        retired: impl IntoIterator<Item = TradeId>,
    ) -> Result<Self, JournalError> {
        let mut ledger = Ledger {
            records: Vec::with_capacity(records.len()),
            retired: retired.into_iter().collect(),
        };
        for record in records {
            if ledger.is_issued(&record.id) {
                return Err(JournalError::DuplicateId {
                    id: record.id.to_string(),
                });
            }
            ledger.records.push(record);
        }
        Ok(ledger)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TradeRecord> {
        self.records.iter()
    }

    pub fn records(&self) -> &[TradeRecord] {
        &self.records
    }

    pub fn retired_ids(&self) -> impl Iterator<Item = &TradeId> {
        self.retired.iter()
    }

    pub fn get(&self, id: &TradeId) -> Option<&TradeRecord> {
        self.records.iter().find(|r| &r.id == id)
    }

    pub fn position(&self, id: &TradeId) -> Option<usize> {
        self.records.iter().position(|r| &r.id == id)
    }

    fn is_issued(&self, id: &TradeId) -> bool {
        self.retired.contains(id) || self.records.iter().any(|r| &r.id == id)
    }

    fn fresh_id(&self) -> TradeId {
        let mut rng = rand::thread_rng();
        loop {
            let id = TradeId::generate(&mut rng);
            if !self.is_issued(&id) {
                return id;
            }
        }
    }

    /// Adds a trade at the end. A fresh id is generated when `id` is `None`.
    pub fn append(
        &mut self,
        id: Option<TradeId>,
        entry: TradeEntry,
    ) -> Result<&TradeRecord, JournalError> {
        entry.validate()?;
        let id = match id {
            Some(id) if self.is_issued(&id) => {
                return Err(JournalError::DuplicateId { id: id.to_string() });
            }
            Some(id) => id,
            None => self.fresh_id(),
        };
        self.records.push(TradeRecord::from_entry(id, entry));
        let last = self.records.len() - 1;
        Ok(&self.records[last])
    }

    /// Edits one field in place and returns the previous value.
    pub fn update_field(
        &mut self,
        id: &TradeId,
        update: FieldUpdate,
    ) -> Result<FieldUpdate, JournalError> {
        let record = self
            .records
            .iter_mut()
            .find(|r| &r.id == id)
            .ok_or_else(|| JournalError::NotFound { id: id.to_string() })?;
        record.apply(update)
    }

    /// Removes a trade and retires its id. Later records shift down so
    /// positions stay contiguous.
    pub fn remove(&mut self, id: &TradeId) -> Result<TradeRecord, JournalError> {
        let index = self
            .position(id)
            .ok_or_else(|| JournalError::NotFound { id: id.to_string() })?;
        let record = self.records.remove(index);
        self.retired.insert(record.id.clone());
        Ok(record)
    }

    /// Puts a removed record back at its old position. Used to undo a
    /// removal whose save failed.
    pub(crate) fn restore(&mut self, index: usize, record: TradeRecord) {
        self.retired.remove(&record.id);
        let index = index.min(self.records.len());
        self.records.insert(index, record);
    }

    /// Drops a just-appended record without retiring its id. Used to undo an
    /// append whose save failed.
    pub(crate) fn undo_append(&mut self, id: &TradeId) -> Option<TradeRecord> {
        match self.records.last() {
            Some(last) if &last.id == id => self.records.pop(),
            _ => None,
        }
    }

    pub fn filter<'a, 'f>(
        &'a self,
        filter: &'f TradeFilter,
    ) -> impl Iterator<Item = &'a TradeRecord> + Clone {
        self.records.iter().filter(move |r| filter.matches(r))
    }

    /// Sorted union of every tag used in the ledger.
    pub fn known_tags(&self) -> Vec<String> {
        let all: BTreeSet<&str> = self.records.iter().flat_map(|r| r.tags.iter()).collect();
        all.into_iter().map(str::to_string).collect()
    }
}

impl<'a> IntoIterator for &'a Ledger {
    type Item = &'a TradeRecord;
    type IntoIter = std::slice::Iter<'a, TradeRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Selection criteria for [`Ledger::filter`].
///
/// `None` places no constraint on a field. `Some` of an empty set for
/// outcome, symbol or direction matches nothing. An empty tag set is
/// the same as no tag filter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TradeFilter {
    pub outcomes: Option<HashSet<Outcome>>,
    pub symbols: Option<HashSet<String>>,
    pub directions: Option<HashSet<Direction>>,
    pub tags: Option<TagSet>,
}

impl TradeFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_outcomes(mut self, outcomes: impl IntoIterator<Item = Outcome>) -> Self {
        self.outcomes = Some(outcomes.into_iter().collect());
        self
    }

    pub fn with_symbols<S: Into<String>>(mut self, symbols: impl IntoIterator<Item = S>) -> Self {
        self.symbols = Some(symbols.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_directions(mut self, directions: impl IntoIterator<Item = Direction>) -> Self {
        self.directions = Some(directions.into_iter().collect());
        self
    }

    pub fn with_tags<S: AsRef<str>>(mut self, tags: impl IntoIterator<Item = S>) -> Self {
        self.tags = Some(tags.into_iter().collect());
        self
    }

    pub fn matches(&self, record: &TradeRecord) -> bool {
        if let Some(outcomes) = &self.outcomes {
            if !outcomes.contains(&record.outcome) {
                return false;
            }
        }
        if let Some(symbols) = &self.symbols {
            if !symbols.contains(&record.symbol) {
                return false;
            }
        }
        if let Some(directions) = &self.directions {
            if !directions.contains(&record.direction) {
                return false;
            }
        }
        match &self.tags {
            Some(tags) if !tags.is_empty() => record.tags.intersects(tags),
            _ => true,
        }
    }
}

/// Presentation order: newest date first, ties keep ledger order.
pub fn newest_first<'a>(records: impl IntoIterator<Item = &'a TradeRecord>) -> Vec<&'a TradeRecord> {
    let mut sorted: Vec<&TradeRecord> = records.into_iter().collect();
    sorted.sort_by(|a, b| b.date.cmp(&a.date));
    sorted
}
