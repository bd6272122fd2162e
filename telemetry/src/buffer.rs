use crate::{is_admissible_timestamp, HistoryEntry};
use std::collections::VecDeque;

/// Per-channel history kept for the accelerometer and the gyroscope.
pub const SENSOR_HISTORY_CAPACITY: usize = 200;
/// History of samples echoed back by the collector.
pub const ECHO_HISTORY_CAPACITY: usize = 50;

/// Fixed-capacity, insertion-ordered history with drop-from-front eviction.
///
/// The buffer always holds the most recent `capacity` accepted entries,
/// oldest first. Entries stamped with the sentinel or a non-finite timestamp
/// are rejected and leave the buffer untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct RollingBuffer<T> {
    capacity: usize,
    entries: VecDeque<T>,
}

impl<T: HistoryEntry> RollingBuffer<T> {
    /// Creates an empty buffer. A zero capacity is clamped to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
        }
    }

    /// Appends `entry`, evicting the oldest entries beyond capacity.
    ///
    /// Returns `false` (and changes nothing) when the entry's timestamp is
    /// the sentinel or not finite.
    pub fn append(&mut self, entry: T) -> bool {
        if !is_admissible_timestamp(entry.timestamp_ms()) {
            log::debug!("rejecting history entry with timestamp {}", entry.timestamp_ms());
            return false;
        }
        self.entries.push_back(entry);
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
        true
    }

    /// Consuming form of [`RollingBuffer::append`].
    pub fn with(mut self, entry: T) -> Self {
        self.append(entry);
        self
    }
}

impl<T> RollingBuffer<T> {
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.iter()
    }

    pub fn first(&self) -> Option<&T> {
        self.entries.front()
    }

    pub fn last(&self) -> Option<&T> {
        self.entries.back()
    }

    /// Owned copy of the contents, oldest first.
    pub fn snapshot(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.entries.iter().cloned().collect()
    }
}

impl<'a, T> IntoIterator for &'a RollingBuffer<T> {
    type Item = &'a T;
    type IntoIter = std::collections::vec_deque::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
