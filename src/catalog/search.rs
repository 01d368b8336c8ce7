// src/catalog/search.rs
use std::collections::HashSet;

use super::ProgramRecord;

/// Which matching pass produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Exact,
    Substring,
    NoMatch,
}

impl Phase {
    pub fn as_str(&self) -> &str {
        match self {
            Phase::Exact => "exact",
            Phase::Substring => "substring",
            Phase::NoMatch => "none",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Matches {
    pub phase: Phase,
    pub lines: Vec<String>,
}

impl Matches {
    fn none() -> Self {
        Self {
            phase: Phase::NoMatch,
            lines: Vec::new(),
        }
    }
}

/// Two-pass lookup over `records`:
/// 1) cipher codes equal to the trimmed query (case-sensitive);
/// 2) only if (1) is empty, cipher codes containing it, ignoring case.
///
/// An empty query matches everything in pass 2.
pub fn search(records: &[ProgramRecord], query: &str) -> Matches {
    let query = query.trim();
    if records.is_empty() {
        return Matches::none();
    }

    let exact: Vec<&ProgramRecord> = records
        .iter()
        .filter(|r| r.cipher_code == query)
        .collect();
    if !exact.is_empty() {
        return Matches {
            phase: Phase::Exact,
            lines: unique_lines(exact),
        };
    }

    let needle = query.to_lowercase();
    let lines = unique_lines(
        records
            .iter()
            .filter(|r| r.cipher_code.to_lowercase().contains(&needle)),
    );
    if lines.is_empty() {
        return Matches::none();
    }
    Matches {
        phase: Phase::Substring,
        lines,
    }
}

/// Format each record as `"code - name"`, keeping the first occurrence of each line.
fn unique_lines<'a>(matches: impl IntoIterator<Item = &'a ProgramRecord>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut lines = Vec::new();
    for record in matches {
        let line = record.display_line();
        if seen.insert(line.clone()) {
            lines.push(line);
        }
    }
    lines
}
