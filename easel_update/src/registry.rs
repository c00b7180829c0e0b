// Copyright 2025 the Easel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Mount registry: which views currently live in the render target.
//!
//! Mounting is independent of graph membership. A view scrolled out of the
//! viewport is *unmounted* (a reversible state, its pending work preserved),
//! not destroyed. Both registries keep append-only order lists so that
//! re-evaluating views against the viewport predicate can be done in bounded
//! batches: the flush engine pops up to `limit` entries off the front of an
//! order list and re-appends the ones that stay put, so a full sweep
//! eventually visits every view without an unbounded scan in one frame.

use alloc::collections::VecDeque;
use core::fmt;
use core::hash::Hash;

use hashbrown::{HashMap, HashSet};

use crate::flags::UpdateFlags;

/// Tracks mounted and unmounted views, with sweep order lists.
///
/// The two registries are disjoint: marking a key mounted removes it from
/// the unmounted map and vice versa. Order lists may contain stale entries
/// (keys that have since transitioned or been purged); consumers drop those
/// on visit by checking membership in the backing set or map.
#[derive(Clone)]
pub struct MountRegistry<K>
where
    K: Copy + Eq + Hash,
{
    /// Keys with a live presence in the render target.
    mounted: HashSet<K>,
    /// Keys deliberately kept out of the render target, with the flags they
    /// still owe.
    unmounted: HashMap<K, UpdateFlags>,
    /// Sweep order for [`mounted`](Self::mounted).
    mounted_order: VecDeque<K>,
    /// Sweep order for [`unmounted`](Self::unmounted).
    unmounted_order: VecDeque<K>,
}

impl<K> Default for MountRegistry<K>
where
    K: Copy + Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K> MountRegistry<K>
where
    K: Copy + Eq + Hash,
{
    /// Creates a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            mounted: HashSet::new(),
            unmounted: HashMap::new(),
            mounted_order: VecDeque::new(),
            unmounted_order: VecDeque::new(),
        }
    }

    /// Returns `true` if the key currently has a live presence in the render
    /// target.
    #[must_use]
    pub fn is_mounted(&self, key: K) -> bool {
        self.mounted.contains(&key)
    }

    /// Returns `true` if the key is deliberately kept out of the render
    /// target.
    #[must_use]
    pub fn is_unmounted(&self, key: K) -> bool {
        self.unmounted.contains_key(&key)
    }

    /// Number of mounted keys.
    #[must_use]
    pub fn mounted_len(&self) -> usize {
        self.mounted.len()
    }

    /// Number of unmounted keys.
    #[must_use]
    pub fn unmounted_len(&self) -> usize {
        self.unmounted.len()
    }

    /// Marks a key as mounted, removing any unmounted record.
    ///
    /// Returns the flags preserved while the key was unmounted, if any.
    pub fn mark_mounted(&mut self, key: K) -> Option<UpdateFlags> {
        let preserved = self.unmounted.remove(&key);
        if self.mounted.insert(key) {
            self.mounted_order.push_back(key);
        }
        preserved
    }

    /// Marks a key as unmounted, preserving `flags` for an eventual remount.
    ///
    /// If the key already has an unmounted record, the flags are merged into
    /// it. Work is deferred here, never discarded.
    pub fn mark_unmounted(&mut self, key: K, flags: UpdateFlags) {
        self.mounted.remove(&key);
        match self.unmounted.get_mut(&key) {
            Some(existing) => *existing = existing.merge(flags),
            None => {
                self.unmounted.insert(key, flags);
                self.unmounted_order.push_back(key);
            }
        }
    }

    /// Removes and returns the unmounted record for a key.
    pub fn take_unmounted(&mut self, key: K) -> Option<UpdateFlags> {
        self.unmounted.remove(&key)
    }

    /// Purges a key from both registries.
    ///
    /// Order-list entries are left behind and dropped lazily on the next
    /// sweep that visits them.
    pub fn purge(&mut self, key: K) {
        self.mounted.remove(&key);
        self.unmounted.remove(&key);
    }

    /// Pops the next key off the mounted sweep list.
    pub fn pop_mounted_order(&mut self) -> Option<K> {
        self.mounted_order.pop_front()
    }

    /// Re-appends a key to the tail of the mounted sweep list.
    pub fn push_mounted_order(&mut self, key: K) {
        self.mounted_order.push_back(key);
    }

    /// Current length of the mounted sweep list (including stale entries).
    #[must_use]
    pub fn mounted_order_len(&self) -> usize {
        self.mounted_order.len()
    }

    /// Pops the next key off the unmounted sweep list.
    pub fn pop_unmounted_order(&mut self) -> Option<K> {
        self.unmounted_order.pop_front()
    }

    /// Re-appends a key to the tail of the unmounted sweep list.
    pub fn push_unmounted_order(&mut self, key: K) {
        self.unmounted_order.push_back(key);
    }

    /// Current length of the unmounted sweep list (including stale entries).
    #[must_use]
    pub fn unmounted_order_len(&self) -> usize {
        self.unmounted_order.len()
    }

    /// Drops every record and sweep entry.
    pub fn clear(&mut self) {
        self.mounted.clear();
        self.unmounted.clear();
        self.mounted_order.clear();
        self.unmounted_order.clear();
    }
}

impl<K> fmt::Debug for MountRegistry<K>
where
    K: Copy + Eq + Hash + fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MountRegistry")
            .field("mounted", &self.mounted)
            .field("unmounted", &self.unmounted)
            .field("mounted_order", &self.mounted_order)
            .field("unmounted_order", &self.unmounted_order)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registries_are_disjoint() {
        let mut registry = MountRegistry::new();

        registry.mark_mounted(1_u32);
        assert!(registry.is_mounted(1));
        assert!(!registry.is_unmounted(1));

        registry.mark_unmounted(1, UpdateFlags::GEOMETRY);
        assert!(!registry.is_mounted(1));
        assert!(registry.is_unmounted(1));

        registry.mark_mounted(1);
        assert!(registry.is_mounted(1));
        assert!(!registry.is_unmounted(1));
    }

    #[test]
    fn unmount_preserves_flags_and_remount_returns_them() {
        let mut registry = MountRegistry::new();

        registry.mark_mounted(1_u32);
        registry.mark_unmounted(1, UpdateFlags::GEOMETRY);
        registry.mark_unmounted(1, UpdateFlags::LABELS);

        let preserved = registry.mark_mounted(1);
        assert_eq!(preserved, Some(UpdateFlags::GEOMETRY | UpdateFlags::LABELS));
    }

    #[test]
    fn repeated_unmount_keeps_one_order_entry() {
        let mut registry = MountRegistry::new();

        registry.mark_unmounted(1_u32, UpdateFlags::GEOMETRY);
        registry.mark_unmounted(1, UpdateFlags::LABELS);
        assert_eq!(registry.unmounted_order_len(), 1);
    }

    #[test]
    fn purge_leaves_stale_order_entries() {
        let mut registry = MountRegistry::new();

        registry.mark_mounted(1_u32);
        registry.purge(1);

        assert!(!registry.is_mounted(1));
        // The order list still holds the key; sweeps drop it on visit.
        assert_eq!(registry.mounted_order_len(), 1);
        assert_eq!(registry.pop_mounted_order(), Some(1));
    }

    #[test]
    fn order_lists_cycle_front_to_back() {
        let mut registry = MountRegistry::new();

        registry.mark_mounted(1_u32);
        registry.mark_mounted(2);
        registry.mark_mounted(3);

        let first = registry.pop_mounted_order().unwrap();
        registry.push_mounted_order(first);

        assert_eq!(registry.pop_mounted_order(), Some(2));
        assert_eq!(registry.pop_mounted_order(), Some(3));
        assert_eq!(registry.pop_mounted_order(), Some(1));
    }

    #[test]
    fn take_unmounted_clears_the_record() {
        let mut registry = MountRegistry::new();

        registry.mark_unmounted(1_u32, UpdateFlags::RENDER);
        assert_eq!(registry.take_unmounted(1), Some(UpdateFlags::RENDER));
        assert_eq!(registry.take_unmounted(1), None);
        assert!(!registry.is_unmounted(1));
    }

    #[test]
    fn clear_drops_everything() {
        let mut registry = MountRegistry::new();

        registry.mark_mounted(1_u32);
        registry.mark_unmounted(2, UpdateFlags::RENDER);
        registry.clear();

        assert_eq!(registry.mounted_len(), 0);
        assert_eq!(registry.unmounted_len(), 0);
        assert_eq!(registry.mounted_order_len(), 0);
        assert_eq!(registry.unmounted_order_len(), 0);
    }
}
