//! Cache Entry Module
//!
//! Defines the structure for individual store entries with TTL support.

use std::time::Duration;

use tokio::time::Instant;

// == Entry ==
/// Represents a single stored value with its expiration metadata.
#[derive(Debug, Clone)]
pub struct Entry<V> {
    /// The stored value
    pub value: V,
    /// Monotonic timestamp of the most recent `set`
    pub inserted_at: Instant,
    /// Effective TTL, None = no expiration
    pub ttl: Option<Duration>,
    /// Identifies which `set` produced this entry
    pub generation: u64,
}

impl<V> Entry<V> {
    // == Constructor ==
    /// Creates a new entry stamped with the current monotonic time.
    ///
    /// # Arguments
    /// * `value` - The value to store
    /// * `ttl` - Optional time-to-live
    /// * `generation` - Store-assigned generation number
    pub fn new(value: V, ttl: Option<Duration>, generation: u64) -> Self {
        Self {
            value,
            inserted_at: Instant::now(),
            ttl,
            generation,
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired as of `now`.
    ///
    /// Boundary condition: an entry is expired once the elapsed time is
    /// greater than or equal to its TTL, so a zero TTL is expired as soon as
    /// it is observed.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        match self.ttl {
            Some(ttl) => now.saturating_duration_since(self.inserted_at) >= ttl,
            None => false,
        }
    }

    /// Checks if the entry has expired right now.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    // == Time To Live ==
    /// Returns the remaining lifetime as of `now`.
    ///
    /// # Returns
    /// - `None` if the entry has no TTL (never expires)
    /// - `Some(Duration::ZERO)` if the TTL has elapsed
    /// - `Some(remaining)` otherwise
    pub fn remaining_at(&self, now: Instant) -> Option<Duration> {
        self.ttl.map(|ttl| {
            let elapsed = now.saturating_duration_since(self.inserted_at);
            ttl.saturating_sub(elapsed)
        })
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_creation_no_ttl() {
        let entry = Entry::new("test_value", None, 1);

        assert_eq!(entry.value, "test_value");
        assert!(entry.ttl.is_none());
        assert!(!entry.is_expired());
        assert!(entry.remaining_at(Instant::now()).is_none());
    }

    #[test]
    fn test_entry_creation_with_ttl() {
        let entry = Entry::new("test_value", Some(Duration::from_secs(60)), 1);

        assert_eq!(entry.generation, 1);
        assert!(!entry.is_expired());
    }

    #[test]
    fn test_expiration_boundary_condition() {
        let entry = Entry::new("test", Some(Duration::from_millis(5)), 1);
        let start = entry.inserted_at;

        assert!(!entry.is_expired_at(start + Duration::from_millis(4)));
        assert!(entry.is_expired_at(start + Duration::from_millis(5)));
        assert!(entry.is_expired_at(start + Duration::from_millis(6)));
    }

    #[test]
    fn test_zero_ttl_is_expired_immediately() {
        let entry = Entry::new("test", Some(Duration::ZERO), 1);
        assert!(entry.is_expired_at(entry.inserted_at));
    }

    #[test]
    fn test_max_ttl_never_expires_in_practice() {
        let entry = Entry::new("test", Some(Duration::MAX), 1);
        let later = entry.inserted_at + Duration::from_secs(10 * 365 * 24 * 3600);
        assert!(!entry.is_expired_at(later));
    }

    #[test]
    fn test_remaining_at() {
        let entry = Entry::new("test", Some(Duration::from_millis(10)), 1);
        let start = entry.inserted_at;

        assert_eq!(
            entry.remaining_at(start + Duration::from_millis(3)),
            Some(Duration::from_millis(7))
        );
        assert_eq!(
            entry.remaining_at(start + Duration::from_millis(30)),
            Some(Duration::ZERO)
        );
    }
}
