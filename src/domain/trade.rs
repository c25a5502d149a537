//! Trade record model.

use chrono::NaiveDate;
use rand::Rng;
use std::fmt;
use std::str::FromStr;

use super::error::JournalError;
use super::tags::TagSet;

const ID_PREFIX: &str = "TRD-";
const ID_HEX_LEN: usize = 6;

/// Opaque trade identifier of the form `TRD-XXXXXX` (uppercase hex).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TradeId(String);

impl TradeId {
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let bytes: [u8; 3] = rng.r#gen();
        TradeId(format!("{}{}", ID_PREFIX, hex::encode_upper(bytes)))
    }

    pub fn parse(value: &str) -> Result<Self, JournalError> {
        let value = value.trim();
        let hex_part = value.strip_prefix(ID_PREFIX).ok_or_else(|| {
            JournalError::invalid_input(format!("trade id must start with {ID_PREFIX}: {value}"))
        })?;
        let valid = hex_part.len() == ID_HEX_LEN
            && hex_part
                .chars()
                .all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c));
        if !valid {
            return Err(JournalError::invalid_input(format!(
                "trade id must be {ID_PREFIX} followed by {ID_HEX_LEN} uppercase hex digits: {value}"
            )));
        }
        Ok(TradeId(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TradeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for TradeId {
    type Err = JournalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TradeId::parse(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    pub fn sign(self) -> f64 {
        match self {
            Direction::Long => 1.0,
            Direction::Short => -1.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Long => "Long",
            Direction::Short => "Short",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = JournalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "long" | "buy" => Ok(Direction::Long),
            "short" | "sell" => Ok(Direction::Short),
            other => Err(JournalError::invalid_input(format!(
                "unknown direction: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    Win,
    Loss,
    Breakeven,
    NoTradeOrStudy,
}

impl Outcome {
    /// Win and Loss are the only outcomes that count towards analytics.
    pub fn is_resolved(self) -> bool {
        matches!(self, Outcome::Win | Outcome::Loss)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Win => "Win",
            Outcome::Loss => "Loss",
            Outcome::Breakeven => "Breakeven",
            Outcome::NoTradeOrStudy => "No Trade/Study",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Outcome {
    type Err = JournalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "win" => Ok(Outcome::Win),
            "loss" => Ok(Outcome::Loss),
            "breakeven" | "be" => Ok(Outcome::Breakeven),
            "no trade/study" | "no-trade" | "notrade" | "study" => Ok(Outcome::NoTradeOrStudy),
            other => Err(JournalError::invalid_input(format!("unknown outcome: {other}"))),
        }
    }
}

/// Handle to a screenshot owned by the file-storage collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScreenshotRef(String);

impl ScreenshotRef {
    pub fn new(reference: impl Into<String>) -> Self {
        ScreenshotRef(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ScreenshotRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScreenshotSlot {
    Entry,
    Exit,
}

impl ScreenshotSlot {
    pub fn as_str(self) -> &'static str {
        match self {
            ScreenshotSlot::Entry => "entry",
            ScreenshotSlot::Exit => "exit",
        }
    }
}

impl FromStr for ScreenshotSlot {
    type Err = JournalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "entry" => Ok(ScreenshotSlot::Entry),
            "exit" => Ok(ScreenshotSlot::Exit),
            other => Err(JournalError::invalid_input(format!(
                "unknown screenshot slot: {other}"
            ))),
        }
    }
}

/// Every field of a trade except its id.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeEntry {
    pub date: NaiveDate,
    pub symbol: String,
    pub direction: Direction,
    pub outcome: Outcome,
    pub size_lots: f64,
    pub entry_price: Option<f64>,
    pub stop_loss: Option<f64>,
    pub final_exit: Option<f64>,
    pub pnl: f64,
    pub r_multiple: f64,
    pub tags: TagSet,
    pub entry_rationale: String,
    pub strategy: String,
    pub journal_notes: String,
    pub entry_screenshot: Option<ScreenshotRef>,
    pub exit_screenshot: Option<ScreenshotRef>,
}

impl TradeEntry {
    pub fn validate(&self) -> Result<(), JournalError> {
        validate_size(self.size_lots)?;
        if self.symbol.trim().is_empty() {
            return Err(JournalError::invalid_input("symbol must not be empty"));
        }
        for (name, price) in [
            ("entry price", self.entry_price),
            ("stop loss", self.stop_loss),
            ("final exit", self.final_exit),
        ] {
            if let Some(p) = price {
                if !p.is_finite() || p < 0.0 {
                    return Err(JournalError::invalid_input(format!(
                        "{name} must be a non-negative number"
                    )));
                }
            }
        }
        if !self.pnl.is_finite() || !self.r_multiple.is_finite() {
            return Err(JournalError::invalid_input("pnl and r-multiple must be finite"));
        }
        Ok(())
    }
}

fn validate_size(size_lots: f64) -> Result<(), JournalError> {
    if !size_lots.is_finite() || size_lots <= 0.0 {
        return Err(JournalError::invalid_input("size in lots must be > 0"));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq)]
pub struct TradeRecord {
    pub id: TradeId,
    pub date: NaiveDate,
    pub symbol: String,
    pub direction: Direction,
    pub outcome: Outcome,
    pub size_lots: f64,
    pub entry_price: Option<f64>,
    pub stop_loss: Option<f64>,
    pub final_exit: Option<f64>,
    pub pnl: f64,
    pub r_multiple: f64,
    pub tags: TagSet,
    pub entry_rationale: String,
    pub strategy: String,
    pub journal_notes: String,
    pub entry_screenshot: Option<ScreenshotRef>,
    pub exit_screenshot: Option<ScreenshotRef>,
}

impl TradeRecord {
    pub fn from_entry(id: TradeId, entry: TradeEntry) -> Self {
        TradeRecord {
            id,
            date: entry.date,
            symbol: entry.symbol,
            direction: entry.direction,
            outcome: entry.outcome,
            size_lots: entry.size_lots,
            entry_price: entry.entry_price,
            stop_loss: entry.stop_loss,
            final_exit: entry.final_exit,
            pnl: entry.pnl,
            r_multiple: entry.r_multiple,
            tags: entry.tags,
            entry_rationale: entry.entry_rationale,
            strategy: entry.strategy,
            journal_notes: entry.journal_notes,
            entry_screenshot: entry.entry_screenshot,
            exit_screenshot: entry.exit_screenshot,
        }
    }

    pub fn screenshot(&self, slot: ScreenshotSlot) -> Option<&ScreenshotRef> {
        match slot {
            ScreenshotSlot::Entry => self.entry_screenshot.as_ref(),
            ScreenshotSlot::Exit => self.exit_screenshot.as_ref(),
        }
    }

    pub fn screenshots(&self) -> impl Iterator<Item = &ScreenshotRef> {
        self.entry_screenshot
            .iter()
            .chain(self.exit_screenshot.iter())
    }

    /// Applies one field edit and returns the value it replaced.
    pub fn apply(&mut self, update: FieldUpdate) -> Result<FieldUpdate, JournalError> {
        let previous = match update {
            FieldUpdate::Pnl(value) => {
                ensure_finite("pnl", value)?;
                FieldUpdate::Pnl(std::mem::replace(&mut self.pnl, value))
            }
            FieldUpdate::RMultiple(value) => {
                ensure_finite("r-multiple", value)?;
                FieldUpdate::RMultiple(std::mem::replace(&mut self.r_multiple, value))
            }
            FieldUpdate::SizeLots(value) => {
                validate_size(value)?;
                FieldUpdate::SizeLots(std::mem::replace(&mut self.size_lots, value))
            }
            FieldUpdate::JournalNotes(value) => {
                FieldUpdate::JournalNotes(std::mem::replace(&mut self.journal_notes, value))
            }
            FieldUpdate::Screenshot(slot, value) => {
                let field = match slot {
                    ScreenshotSlot::Entry => &mut self.entry_screenshot,
                    ScreenshotSlot::Exit => &mut self.exit_screenshot,
                };
                FieldUpdate::Screenshot(slot, std::mem::replace(field, value))
            }
        };
        Ok(previous)
    }
}

fn ensure_finite(name: &str, value: f64) -> Result<(), JournalError> {
    if !value.is_finite() {
        return Err(JournalError::invalid_input(format!("{name} must be finite")));
    }
    Ok(())
}

/// A post-hoc edit to one mutable field of a trade.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldUpdate {
    Pnl(f64),
    RMultiple(f64),
    SizeLots(f64),
    JournalNotes(String),
    Screenshot(ScreenshotSlot, Option<ScreenshotRef>),
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    pub(crate) fn sample_entry() -> TradeEntry {
        TradeEntry {
            date: NaiveDate::from_ymd_opt(2024, 3, 14).unwrap(),
            symbol: "EUR/USD".into(),
            direction: Direction::Long,
            outcome: Outcome::Win,
            size_lots: 1.0,
            entry_price: Some(1.1),
            stop_loss: Some(1.095),
            final_exit: Some(1.105),
            pnl: 500.0,
            r_multiple: 1.0,
            tags: ["Breakout"].into_iter().collect(),
            entry_rationale: "retest of range high".into(),
            strategy: String::new(),
            journal_notes: String::new(),
            entry_screenshot: None,
            exit_screenshot: None,
        }
    }

    #[test]
    fn generated_id_has_expected_shape() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let id = TradeId::generate(&mut rng);
            assert!(TradeId::parse(id.as_str()).is_ok(), "bad id {id}");
            assert_eq!(id.as_str().len(), 10);
        }
    }

    #[test]
    fn parse_rejects_malformed_ids() {
        assert!(TradeId::parse("TRD-ABC12").is_err());
        assert!(TradeId::parse("TRD-abc123").is_err());
        assert!(TradeId::parse("XYZ-ABC123").is_err());
        assert!(TradeId::parse("TRD-ABC12G").is_err());
        assert!(TradeId::parse("TRD-0A1B2C").is_ok());
    }

    #[test]
    fn direction_sign() {
        assert_eq!(Direction::Long.sign(), 1.0);
        assert_eq!(Direction::Short.sign(), -1.0);
    }

    #[test]
    fn outcome_round_trips_through_display() {
        for outcome in [
            Outcome::Win,
            Outcome::Loss,
            Outcome::Breakeven,
            Outcome::NoTradeOrStudy,
        ] {
            assert_eq!(outcome.to_string().parse::<Outcome>().unwrap(), outcome);
        }
    }

    #[test]
    fn only_win_and_loss_are_resolved() {
        assert!(Outcome::Win.is_resolved());
        assert!(Outcome::Loss.is_resolved());
        assert!(!Outcome::Breakeven.is_resolved());
        assert!(!Outcome::NoTradeOrStudy.is_resolved());
    }

    #[test]
    fn validate_rejects_non_positive_size() {
        let mut entry = sample_entry();
        entry.size_lots = 0.0;
        assert!(matches!(
            entry.validate(),
            Err(JournalError::InvalidInput { .. })
        ));
        entry.size_lots = -1.0;
        assert!(entry.validate().is_err());
    }

    #[test]
    fn validate_rejects_negative_price() {
        let mut entry = sample_entry();
        entry.stop_loss = Some(-0.5);
        assert!(entry.validate().is_err());
    }

    #[test]
    fn validate_accepts_unset_prices() {
        let mut entry = sample_entry();
        entry.entry_price = None;
        entry.stop_loss = None;
        entry.final_exit = None;
        assert!(entry.validate().is_ok());
    }

    #[test]
    fn apply_returns_previous_value() {
        let id = TradeId::parse("TRD-000001").unwrap();
        let mut record = TradeRecord::from_entry(id, sample_entry());

        let previous = record.apply(FieldUpdate::Pnl(-20.0)).unwrap();
        assert_eq!(previous, FieldUpdate::Pnl(500.0));
        assert_eq!(record.pnl, -20.0);

        let previous = record
            .apply(FieldUpdate::JournalNotes("late entry".into()))
            .unwrap();
        assert_eq!(previous, FieldUpdate::JournalNotes(String::new()));
    }

    #[test]
    fn apply_rejects_zero_size() {
        let id = TradeId::parse("TRD-000001").unwrap();
        let mut record = TradeRecord::from_entry(id, sample_entry());
        assert!(record.apply(FieldUpdate::SizeLots(0.0)).is_err());
        assert_eq!(record.size_lots, 1.0);
    }

    #[test]
    fn apply_screenshot_slot() {
        let id = TradeId::parse("TRD-000001").unwrap();
        let mut record = TradeRecord::from_entry(id, sample_entry());
        let shot = ScreenshotRef::new("img/entry.png");
        record
            .apply(FieldUpdate::Screenshot(ScreenshotSlot::Entry, Some(shot.clone())))
            .unwrap();
        assert_eq!(record.screenshot(ScreenshotSlot::Entry), Some(&shot));
        assert_eq!(record.screenshot(ScreenshotSlot::Exit), None);
        assert_eq!(record.screenshots().count(), 1);
    }
}
