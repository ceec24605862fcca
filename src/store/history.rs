//! Bounded history buffers for per-session logs.
//!
//! Both tool history (newest entry first) and message history (oldest entry
//! first) share the same trim-on-insert deque. Whichever end new entries go
//! in, overflow always evicts the oldest entry.

use std::collections::VecDeque;

use serde::{Serialize, Serializer};

/// A fixed-capacity sequence backed by a deque.
///
/// Serializes as a plain array of its entries, in storage order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundedLog<T> {
    entries: VecDeque<T>,
    capacity: usize,
}

impl<T> BoundedLog<T> {
    /// Create an empty log holding at most `capacity` entries.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity,
        }
    }

    /// Insert at the front (newest-first ordering).
    ///
    /// The oldest entry lives at the back and is evicted on overflow.
    pub fn prepend(&mut self, entry: T) {
        if self.capacity == 0 {
            return;
        }
        if self.entries.len() >= self.capacity {
            self.entries.pop_back();
        }
        self.entries.push_front(entry);
    }

    /// Insert at the back (oldest-first ordering).
    ///
    /// The oldest entry lives at the front and is evicted on overflow.
    pub fn append(&mut self, entry: T) {
        if self.capacity == 0 {
            return;
        }
        if self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    /// Number of stored entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the log is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Configured maximum number of entries.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// First entry in storage order, if any.
    #[must_use]
    pub fn front(&self) -> Option<&T> {
        self.entries.front()
    }

    /// Last entry in storage order, if any.
    #[must_use]
    pub fn back(&self) -> Option<&T> {
        self.entries.back()
    }

    /// Iterate entries in storage order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.iter()
    }
}

impl<T: Serialize> Serialize for BoundedLog<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(&self.entries)
    }
}

impl<'a, T> IntoIterator for &'a BoundedLog<T> {
    type Item = &'a T;
    type IntoIter = std::collections::vec_deque::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
