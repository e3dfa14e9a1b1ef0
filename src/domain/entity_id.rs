//! Application-generated entity identifiers.
//!
//! [`EntityId`] is a newtype around the decimal rendering of a nanosecond
//! timestamp. Ids sort by creation order, which the `newest` item sort
//! relies on. The generator is monotonic inside the process so two calls
//! in the same nanosecond still yield distinct ids.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Last value handed out by [`EntityId::generate`].
static LAST_ISSUED: AtomicU64 = AtomicU64::new(0);

/// Identifier of any stored entity (user ids excepted, those come from the
/// identity provider).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    /// Generates a fresh, strictly increasing id.
    #[must_use]
    pub fn generate() -> Self {
        Self(next_nanos().to_string())
    }

    /// Wraps an existing id string.
    #[must_use]
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the id, returning the inner string.
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<EntityId> for String {
    fn from(id: EntityId) -> Self {
        id.0
    }
}

/// Returns `max(now_ns, last + 1)` and records it.
fn next_nanos() -> u64 {
    let now = Utc::now()
        .timestamp_nanos_opt()
        .and_then(|ns| u64::try_from(ns).ok())
        .unwrap_or(0);
    let mut last = LAST_ISSUED.load(Ordering::Relaxed);
    loop {
        let candidate = now.max(last.saturating_add(1));
        match LAST_ISSUED.compare_exchange_weak(last, candidate, Ordering::AcqRel, Ordering::Relaxed)
        {
            Ok(_) => return candidate,
            Err(observed) => last = observed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn generate_is_unique_under_burst() {
        let ids: HashSet<EntityId> = (0..10_000).map(|_| EntityId::generate()).collect();
        assert_eq!(ids.len(), 10_000);
    }

    #[test]
    fn generate_is_numerically_increasing() {
        let a: u64 = EntityId::generate().as_str().parse().unwrap_or_default();
        let b: u64 = EntityId::generate().as_str().parse().unwrap_or_default();
        assert!(b > a);
    }

    #[test]
    fn display_is_decimal() {
        let id = EntityId::generate();
        assert!(id.to_string().chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn unique_across_threads() {
        let handles: Vec<_> = (0..4)
            .map(|_| std::thread::spawn(|| (0..1_000).map(|_| EntityId::generate()).collect::<Vec<_>>()))
            .collect();
        let mut all = HashSet::new();
        for handle in handles {
            if let Ok(ids) = handle.join() {
                all.extend(ids);
            }
        }
        assert_eq!(all.len(), 4_000);
    }
}
