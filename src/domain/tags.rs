//! Normalised trade tags.

use std::collections::BTreeSet;
use std::fmt;

/// A set of free-text labels. Entries are trimmed, non-empty, comma-free and
/// unique (case-sensitive); iteration is sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagSet {
    tags: BTreeSet<String>,
}

impl TagSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a tag after trimming. A comma separates tags, so `"a,b"` adds
    /// both parts. Returns true when at least one new tag was added.
    pub fn insert(&mut self, tag: &str) -> bool {
        let mut added = false;
        for part in tag.split(',') {
            let trimmed = part.trim();
            if !trimmed.is_empty() {
                added |= self.tags.insert(trimmed.to_string());
            }
        }
        added
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.tags.contains(tag.trim())
    }

    pub fn intersects(&self, other: &TagSet) -> bool {
        !self.tags.is_disjoint(&other.tags)
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(String::as_str)
    }

    /// Comma-joined form used by the persistence adapters.
    pub fn to_storage(&self) -> String {
        self.tags.iter().cloned().collect::<Vec<_>>().join(",")
    }

    pub fn from_storage(value: &str) -> Self {
        value.split(',').collect()
    }
}

impl<S: AsRef<str>> FromIterator<S> for TagSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = TagSet::new();
        for tag in iter {
            set.insert(tag.as_ref());
        }
        set
    }
}

impl<S: AsRef<str>> Extend<S> for TagSet {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        for tag in iter {
            self.insert(tag.as_ref());
        }
    }
}

impl fmt::Display for TagSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined: Vec<&str> = self.iter().collect();
        write!(f, "{}", joined.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_and_drops_empty() {
        let tags: TagSet = ["  Breakout ", "", "   ", "FOMO"].into_iter().collect();
        assert_eq!(tags.iter().collect::<Vec<_>>(), vec!["Breakout", "FOMO"]);
    }

    #[test]
    fn deduplicates_after_trim() {
        let tags: TagSet = ["Reversal", " Reversal", "Reversal  "].into_iter().collect();
        assert_eq!(tags.len(), 1);
    }

    #[test]
    fn case_sensitive() {
        let tags: TagSet = ["fomo", "FOMO"].into_iter().collect();
        assert_eq!(tags.len(), 2);
    }

    #[test]
    fn iterates_sorted() {
        let tags: TagSet = ["Trend Follow", "Breakout", "News Play"].into_iter().collect();
        assert_eq!(
            tags.iter().collect::<Vec<_>>(),
            vec!["Breakout", "News Play", "Trend Follow"]
        );
    }

    #[test]
    fn storage_form_is_comma_joined() {
        let tags: TagSet = ["b", "a"].into_iter().collect();
        assert_eq!(tags.to_storage(), "a,b");
        assert_eq!(TagSet::from_storage("a, b ,,a"), tags);
    }

    #[test]
    fn comma_splits_a_tag() {
        let mut tags = TagSet::new();
        assert!(tags.insert("Risk, Reward"));
        assert_eq!(tags.iter().collect::<Vec<_>>(), vec!["Reward", "Risk"]);
        assert!(!tags.insert("Reward,,"));
        assert!(tags.iter().all(|t| !t.contains(',')));
    }

    #[test]
    fn storage_round_trip_keeps_every_tag() {
        let tags: TagSet = ["Risk,Reward", "News Play", ",", "FOMO"].into_iter().collect();
        assert_eq!(TagSet::from_storage(&tags.to_storage()), tags);
    }

    #[test]
    fn empty_storage_string_is_empty_set() {
        assert!(TagSet::from_storage("").is_empty());
    }

    #[test]
    fn intersects_on_shared_tag() {
        let a: TagSet = ["x", "y"].into_iter().collect();
        let b: TagSet = ["y", "z"].into_iter().collect();
        let c: TagSet = ["z"].into_iter().collect();
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
    }

    #[test]
    fn insert_reports_new_entries() {
        let mut tags = TagSet::new();
        assert!(tags.insert("FOMO"));
        assert!(!tags.insert(" FOMO "));
        assert!(!tags.insert(" "));
        assert!(tags.contains("FOMO "));
    }
}
