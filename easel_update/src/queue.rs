// Copyright 2025 the Easel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Priority bucket queue: per-priority maps of accumulated update flags.

use alloc::vec::Vec;
use core::fmt;
use core::hash::Hash;

use hashbrown::HashMap;
use hashbrown::hash_map::Entry;

use crate::flags::UpdateFlags;

/// Maximum number of priority classes supported (32).
const MAX_PRIORITIES: usize = 32;

/// A view's scheduling priority class.
///
/// Lower priorities are flushed first. The class is fixed for the lifetime
/// of a view: edges are conventionally scheduled one class after the nodes
/// they connect so that endpoints resolve before the edges that depend on
/// them.
///
/// # Example
///
/// ```
/// use easel_update::Priority;
///
/// // Nodes before edges.
/// assert!(Priority::NODE.index() < Priority::EDGE.index());
/// ```
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Priority(u8);

impl Priority {
    /// Conventional priority class for node views.
    pub const NODE: Self = Self(0);

    /// Conventional priority class for edge views.
    pub const EDGE: Self = Self(1);

    /// Creates a new priority class with the given index.
    ///
    /// # Panics
    ///
    /// Panics if `index >= 32`.
    #[must_use]
    pub const fn new(index: u8) -> Self {
        assert!((index as usize) < MAX_PRIORITIES, "priority index must be less than 32");
        Self(index)
    }

    /// Returns the index of this priority class.
    #[must_use]
    pub const fn index(self) -> u8 {
        self.0
    }
}

impl fmt::Debug for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Priority").field(&self.0).finish()
    }
}

/// Ordered buckets of `key -> accumulated flags`, flushed lowest priority
/// first.
///
/// A key lives in at most one bucket at a time: re-scheduling merges flags
/// into the existing entry (at the key's original priority) instead of
/// duplicating it. The number of distinct keys with outstanding flags is
/// available in O(1) via [`pending`](Self::pending).
///
/// # Example
///
/// ```
/// use easel_update::{Priority, PriorityQueue, UpdateFlags};
///
/// let mut queue = PriorityQueue::new();
/// queue.schedule(7_u32, UpdateFlags::GEOMETRY, Priority::NODE);
/// queue.schedule(7_u32, UpdateFlags::LABELS, Priority::NODE);
///
/// assert_eq!(queue.pending(), 1);
/// let flags = queue.take(7, Priority::NODE);
/// assert_eq!(flags, UpdateFlags::GEOMETRY | UpdateFlags::LABELS);
/// assert!(queue.is_empty());
/// ```
#[derive(Clone)]
pub struct PriorityQueue<K>
where
    K: Copy + Eq + Hash,
{
    /// Bucket at index `p` holds entries scheduled at priority `p`.
    buckets: Vec<HashMap<K, UpdateFlags>>,
    /// Which bucket each scheduled key currently lives in.
    index: HashMap<K, Priority>,
}

impl<K> Default for PriorityQueue<K>
where
    K: Copy + Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K> PriorityQueue<K>
where
    K: Copy + Eq + Hash,
{
    /// Creates a new empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buckets: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Returns the number of distinct keys with outstanding flags.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.index.len()
    }

    /// Returns `true` if no key has outstanding flags.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Returns the number of buckets currently allocated.
    ///
    /// Buckets are allocated lazily; this is one past the highest priority
    /// ever scheduled.
    #[must_use]
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Returns the bucket a key is currently scheduled in, if any.
    #[must_use]
    pub fn priority_of(&self, key: K) -> Option<Priority> {
        self.index.get(&key).copied()
    }

    /// Returns the accumulated flags for a key, or empty if it is not
    /// scheduled.
    #[must_use]
    pub fn flags_of(&self, key: K) -> UpdateFlags {
        match self.index.get(&key) {
            Some(priority) => self.buckets[priority.index() as usize]
                .get(&key)
                .copied()
                .unwrap_or_default(),
            None => UpdateFlags::empty(),
        }
    }

    /// Merges `flags` into the bucket entry for `key`.
    ///
    /// If the key is already scheduled, the flags are merged into its
    /// existing entry and `priority` is ignored (the class is pinned for as
    /// long as the entry exists). Returns `true` if the key had no
    /// outstanding flags before this call.
    pub fn schedule(&mut self, key: K, flags: UpdateFlags, priority: Priority) -> bool {
        if flags.is_empty() {
            return false;
        }
        match self.index.entry(key) {
            Entry::Occupied(slot) => {
                let pinned = *slot.get();
                let entry = self.buckets[pinned.index() as usize]
                    .get_mut(&key)
                    .expect("indexed key has a bucket entry");
                *entry = entry.merge(flags);
                false
            }
            Entry::Vacant(slot) => {
                slot.insert(priority);
                let p = priority.index() as usize;
                if self.buckets.len() <= p {
                    self.buckets.resize_with(p + 1, HashMap::new);
                }
                self.buckets[p].insert(key, flags);
                true
            }
        }
    }

    /// Atomically reads and clears the bucket entry for `key` at `priority`.
    ///
    /// Returns empty flags if the key is not scheduled in that bucket.
    pub fn take(&mut self, key: K, priority: Priority) -> UpdateFlags {
        let p = priority.index() as usize;
        if p >= self.buckets.len() {
            return UpdateFlags::empty();
        }
        match self.buckets[p].remove(&key) {
            Some(flags) => {
                self.index.remove(&key);
                flags
            }
            None => UpdateFlags::empty(),
        }
    }

    /// Reads and clears the bucket entry for `key` wherever it is scheduled.
    pub fn take_any(&mut self, key: K) -> UpdateFlags {
        match self.index.get(&key).copied() {
            Some(priority) => self.take(key, priority),
            None => UpdateFlags::empty(),
        }
    }

    /// Returns a snapshot of the keys scheduled at `priority`.
    ///
    /// The flush engine iterates snapshots rather than live buckets so that
    /// re-entrant scheduling during a pass has deterministic behavior: keys
    /// added to a bucket after its snapshot was taken are picked up by the
    /// next pass.
    #[must_use]
    pub fn snapshot(&self, priority: Priority) -> Vec<K> {
        let p = priority.index() as usize;
        match self.buckets.get(p) {
            Some(bucket) => bucket.keys().copied().collect(),
            None => Vec::new(),
        }
    }

    /// Removes every bucket entry.
    pub fn clear(&mut self) {
        for bucket in &mut self.buckets {
            bucket.clear();
        }
        self.index.clear();
    }
}

impl<K> fmt::Debug for PriorityQueue<K>
where
    K: Copy + Eq + Hash + fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PriorityQueue")
            .field("buckets", &self.buckets)
            .field("index", &self.index)
            .finish()
    }
}
