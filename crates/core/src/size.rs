//! Memory accounting for node entries
//!
//! A committed entry is charged `len(key) + len(value)` abstract units
//! against its node's capacity. Staged writes are not charged until they
//! commit, but admission checks look at the *net* change they would cause:
//! the size of the new entry minus the size of the committed entry it
//! replaces.
//!
//! Deltas are kept as two unsigned halves so that a projection never goes
//! negative and never needs signed arithmetic.

/// Size charged for one committed entry
#[inline]
pub fn entry_size(key: &str, value: &str) -> u64 {
    (key.len() + value.len()) as u64
}

/// Net memory change of one or more staged writes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemoryDelta {
    /// Units the staged entries would occupy once committed
    pub added: u64,
    /// Units of committed entries they would replace
    pub released: u64,
}

impl MemoryDelta {
    /// Delta of writing `new_value` at `key` over an optional committed value
    pub fn for_write(key: &str, new_value: &str, committed: Option<&str>) -> Self {
        Self {
            added: entry_size(key, new_value),
            released: committed.map_or(0, |old| entry_size(key, old)),
        }
    }

    /// Accumulate another delta into this one
    pub fn combine(&mut self, other: MemoryDelta) {
        self.added += other.added;
        self.released += other.released;
    }

    /// Usage after applying this delta to `memory_used`
    ///
    /// `released` never exceeds `memory_used + added` for deltas computed
    /// against the same committed store, but the subtraction saturates
    /// regardless.
    pub fn projected(&self, memory_used: u64) -> u64 {
        (memory_used + self.added).saturating_sub(self.released)
    }

    /// Whether applying this delta keeps usage within `capacity`
    pub fn fits(&self, memory_used: u64, capacity: u64) -> bool {
        self.projected(memory_used) <= capacity
    }
}
