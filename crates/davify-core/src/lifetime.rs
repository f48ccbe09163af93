//! Lifetime menu and the single-character code table.
//!
//! Each retention choice (e.g. "1 week") maps to exactly one character that
//! is embedded in the uploaded filename. The assignment is append-only: a
//! code published here must keep its duration forever, since filenames
//! already deployed on remote servers are parsed by future sweepers.

use std::time::Duration;

use crate::error::NameError;

/// Characters permitted in random prefixes and lifetime codes.
pub const CODE_ALPHABET: &[u8; 64] =
    b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789_-";

/// Whether `c` belongs to the filename code alphabet.
pub fn in_alphabet(c: char) -> bool {
    c.is_ascii() && CODE_ALPHABET.contains(&(c as u8))
}

const MINUTE: u64 = 60;
const HOUR: u64 = 60 * MINUTE;
const DAY: u64 = 24 * HOUR;
const WEEK: u64 = 7 * DAY;

/// The published menu: (label, duration in seconds, code). Append-only.
const CANONICAL: &[(&str, u64, char)] = &[
    ("forever", 0, '0'),
    ("5 min", 5 * MINUTE, 'a'),
    ("10 min", 10 * MINUTE, 'b'),
    ("20 min", 20 * MINUTE, 'c'),
    ("40 min", 40 * MINUTE, 'd'),
    ("1 hour", HOUR, 'e'),
    ("2 hours", 2 * HOUR, 'f'),
    ("4 hours", 4 * HOUR, 'g'),
    ("8 hours", 8 * HOUR, 'h'),
    ("16 hours", 16 * HOUR, 'i'),
    ("1 day", DAY, 'j'),
    ("2 days", 2 * DAY, 'k'),
    ("4 days", 4 * DAY, 'l'),
    ("1 week", WEEK, 'm'),
    ("2 weeks", 2 * WEEK, 'n'),
    ("1 month", 31 * DAY, 'o'),
    ("2 months", 62 * DAY, 'p'),
    ("1 quarter", 92 * DAY, 'q'),
    ("2 quarters", 183 * DAY, 'r'),
    ("3 quarters", 275 * DAY, 's'),
    ("1 year", 366 * DAY, 't'),
    ("2 years", 731 * DAY, 'u'),
    ("4 years", 1461 * DAY, 'v'),
];

/// One row of the lifetime menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifetimeEntry {
    pub label: &'static str,
    pub duration: Duration,
    pub code: char,
}

/// Immutable lifetime menu with its duration↔code bijection.
///
/// Built once at startup and passed to the composer and the sweeper; not a
/// singleton, so tests can construct alternate tables.
#[derive(Debug, Clone)]
pub struct LifetimeTable {
    entries: Vec<LifetimeEntry>,
}

impl LifetimeTable {
    /// The published table. Insertion order is the CLI-facing menu order.
    pub fn canonical() -> Self {
        Self::from_entries(
            CANONICAL
                .iter()
                .map(|&(label, secs, code)| LifetimeEntry {
                    label,
                    duration: Duration::from_secs(secs),
                    code,
                })
                .collect(),
        )
    }

    /// Build a table from explicit entries.
    ///
    /// Labels, durations, and codes must each be unique, and every code must
    /// come from [`CODE_ALPHABET`]; the mapping is a bijection over the
    /// subset of the alphabet in use.
    pub fn from_entries(entries: Vec<LifetimeEntry>) -> Self {
        debug_assert!(entries.iter().all(|e| in_alphabet(e.code)));
        debug_assert!({
            let mut codes: Vec<char> = entries.iter().map(|e| e.code).collect();
            codes.sort_unstable();
            codes.dedup();
            codes.len() == entries.len()
        });
        Self { entries }
    }

    /// Menu rows in insertion order.
    pub fn entries(&self) -> &[LifetimeEntry] {
        &self.entries
    }

    /// Menu labels in insertion order.
    pub fn labels(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|e| e.label)
    }

    /// Code character for a canonical duration. Exact match only, no rounding.
    pub fn encode(&self, duration: Duration) -> Result<char, NameError> {
        self.entries
            .iter()
            .find(|e| e.duration == duration)
            .map(|e| e.code)
            .ok_or(NameError::UnknownDuration(duration))
    }

    /// Duration for a code character.
    pub fn decode(&self, code: char) -> Result<Duration, NameError> {
        self.entries
            .iter()
            .find(|e| e.code == code)
            .map(|e| e.duration)
            .ok_or(NameError::UnknownCode(code))
    }

    /// Duration for a menu label. Case-sensitive exact match.
    pub fn duration_for_label(&self, label: &str) -> Result<Duration, NameError> {
        self.entries
            .iter()
            .find(|e| e.label == label)
            .map(|e| e.duration)
            .ok_or_else(|| NameError::UnknownLabel(label.to_string()))
    }

    /// Code character for a menu label.
    pub fn code_for_label(&self, label: &str) -> Result<char, NameError> {
        self.entries
            .iter()
            .find(|e| e.label == label)
            .map(|e| e.code)
            .ok_or_else(|| NameError::UnknownLabel(label.to_string()))
    }

    /// Label for a code character, if assigned.
    pub fn label_for_code(&self, code: char) -> Option<&'static str> {
        self.entries.iter().find(|e| e.code == code).map(|e| e.label)
    }
}
