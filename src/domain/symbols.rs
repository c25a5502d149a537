//! Curated instruments and suggested tags offered by the entry form.

use std::collections::BTreeSet;

use super::ledger::Ledger;

/// Display symbol and chart ticker for each curated pair.
pub const CURATED_SYMBOLS: &[(&str, &str)] = &[
    ("EUR/USD", "FX:EURUSD"),
    ("USD/JPY", "FX:USDJPY"),
    ("GBP/USD", "FX:GBPUSD"),
    ("USD/CHF", "OANDA:USDCHF"),
    ("AUD/USD", "FX:AUDUSD"),
    ("NZD/USD", "OANDA:NZDUSD"),
    ("USD/CAD", "FX:USDCAD"),
];

pub const SUGGESTED_TAGS: &[&str] = &[
    "Breakout",
    "Reversal",
    "Trend Follow",
    "Counter-Trend",
    "News Play",
    "FOMO",
    "Over-leveraged",
];

pub fn chart_ticker(symbol: &str) -> Option<&'static str> {
    CURATED_SYMBOLS
        .iter()
        .find(|(name, _)| *name == symbol)
        .map(|(_, ticker)| *ticker)
}

pub fn is_curated(symbol: &str) -> bool {
    chart_ticker(symbol).is_some()
}

/// Tags already used in the ledger merged with the suggested set, sorted.
pub fn tag_suggestions(ledger: &Ledger) -> Vec<String> {
    let mut all: BTreeSet<String> = ledger.known_tags().into_iter().collect();
    all.extend(SUGGESTED_TAGS.iter().map(|t| t.to_string()));
    all.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::trade::TradeEntry;
    use crate::domain::trade::tests::sample_entry;

    #[test]
    fn chart_ticker_lookup() {
        assert_eq!(chart_ticker("USD/CHF"), Some("OANDA:USDCHF"));
        assert_eq!(chart_ticker("XAU/USD"), None);
        assert!(is_curated("EUR/USD"));
    }

    #[test]
    fn suggestions_include_ledger_tags() {
        let mut ledger = Ledger::new();
        let entry = TradeEntry {
            tags: ["London Open", "FOMO"].into_iter().collect(),
            ..sample_entry()
        };
        ledger.append(None, entry).unwrap();

        let suggestions = tag_suggestions(&ledger);
        assert!(suggestions.contains(&"London Open".to_string()));
        assert_eq!(
            suggestions.iter().filter(|t| t.as_str() == "FOMO").count(),
            1
        );
        let mut sorted = suggestions.clone();
        sorted.sort();
        assert_eq!(suggestions, sorted);
    }
}
