// src/catalog/mod.rs
pub mod search;

use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

pub use search::{Matches, Phase};

/// One resolved (program code, program name, cipher code) triple.
/// All three fields are trimmed and non-blank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramRecord {
    pub ep_code: String,
    pub ep_name: String,
    pub cipher_code: String,
}

impl ProgramRecord {
    /// The `"code - name"` line shown to users and used as the dedup key.
    pub fn display_line(&self) -> String {
        format!("{} - {}", self.ep_code, self.ep_name)
    }
}

/// The in-memory lookup table, built once at startup and never mutated.
#[derive(Debug)]
pub struct RecordSet {
    records: Vec<ProgramRecord>,
    source: PathBuf,
    loaded_at: DateTime<Utc>,
}

impl RecordSet {
    pub fn new(records: Vec<ProgramRecord>, source: impl Into<PathBuf>) -> Self {
        Self {
            records,
            source: source.into(),
            loaded_at: Utc::now(),
        }
    }

    /// A set with no records, used when the source could not be loaded.
    pub fn empty(source: impl Into<PathBuf>) -> Self {
        Self::new(Vec::new(), source)
    }

    pub fn count(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    /// Unique `"code - name"` lines for `query`, exact cipher matches first,
    /// falling back to case-insensitive substring matches.
    pub fn search(&self, query: &str) -> Vec<String> {
        self.search_detailed(query).lines
    }

    /// Like [`RecordSet::search`], but also reports which phase produced the lines.
    pub fn search_detailed(&self, query: &str) -> Matches {
        search::search(&self.records, query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(code: &str, name: &str, cipher: &str) -> ProgramRecord {
        ProgramRecord {
            ep_code: code.into(),
            ep_name: name.into(),
            cipher_code: cipher.into(),
        }
    }

    #[test]
    fn test_display_line() {
        assert_eq!(rec("6B01", "Pedagogy", "101").display_line(), "6B01 - Pedagogy");
    }

    #[test]
    fn test_count_and_emptiness() {
        let empty = RecordSet::empty("missing.csv");
        assert!(empty.is_empty());
        assert_eq!(empty.count(), 0);
        assert_eq!(empty.source(), Path::new("missing.csv"));
        assert!(empty.search("101").is_empty());

        let set = RecordSet::new(vec![rec("A", "Alpha", "101")], "programs.csv");
        assert!(!set.is_empty());
        assert_eq!(set.count(), 1);
        assert_eq!(set.search("101"), vec!["A - Alpha"]);
    }

    #[test]
    fn test_search_is_idempotent() {
        let set = RecordSet::new(
            vec![
                rec("A", "Alpha", "4S03220203"),
                rec("B", "Beta", "5AB02140101"),
                rec("A", "Alpha", "4S03220204"),
            ],
            "programs.csv",
        );
        let first = set.search("s0322");
        let second = set.search("s0322");
        assert_eq!(first, second);
        assert_eq!(first, vec!["A - Alpha"]);
    }
}
