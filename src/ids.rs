//! Id generation for layouts and panels.
//!
//! DESIGN
//! ======
//! The store never mints ids itself; it asks an injected `IdGenerator`. The
//! default `TimestampIds` produces `<prefix>-<unix millis>-<random suffix>`,
//! which is unique enough for a single client session. `SequentialIds` yields
//! `<prefix>-1`, `<prefix>-2`, ... so tests can assert exact ids.

#[cfg(test)]
#[path = "ids_test.rs"]
mod ids_test;

use rand::Rng;
use rand::distr::Alphanumeric;
use time::OffsetDateTime;

/// Length of the random suffix appended by [`TimestampIds`].
const SUFFIX_LEN: usize = 9;

/// Source of fresh, unique identifiers.
pub trait IdGenerator {
    /// Return a new id starting with `prefix`.
    fn next_id(&mut self, prefix: &str) -> String;
}

/// Wall-clock millis plus a random lowercase alphanumeric suffix.
#[derive(Debug, Default, Clone, Copy)]
pub struct TimestampIds;

impl IdGenerator for TimestampIds {
    fn next_id(&mut self, prefix: &str) -> String {
        let millis = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
        let suffix: String = rand::rng()
            .sample_iter(&Alphanumeric)
            .take(SUFFIX_LEN)
            .map(|b| char::from(b).to_ascii_lowercase())
            .collect();
        format!("{prefix}-{millis}-{suffix}")
    }
}

/// Deterministic counter-based ids. The counter is shared across prefixes.
#[derive(Debug, Default, Clone)]
pub struct SequentialIds {
    next: u64,
}

impl SequentialIds {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next += 1;
        format!("{prefix}-{}", self.next)
    }
}
