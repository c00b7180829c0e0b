// Copyright 2025 the Easel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Adapter from graph/model notifications to scheduler operations.
//!
//! The graph layer emits add/remove/change/reset notifications plus named
//! batch brackets ("bulk-insert", "reorder", "translate", ...). This module
//! maps those onto scheduling requests, the freeze gate, and the deferred
//! reorder.

use alloc::string::String;
use alloc::vec::Vec;
use core::hash::Hash;

use crate::engine::{Unfrozen, UpdateScheduler};
use crate::flags::UpdateFlags;
use crate::host::UpdateHost;

/// Which batch names gate the scheduler and which one defers a sort.
#[derive(Debug, Clone)]
pub struct BridgeOptions {
    /// Batch names that freeze the scheduler for their duration, keyed by
    /// the batch name so unrelated nested batches cannot unfreeze early.
    pub freeze_batches: Vec<String>,
    /// Batch name whose stop requests a structural reorder.
    pub reorder_batch: String,
}

impl Default for BridgeOptions {
    fn default() -> Self {
        Self {
            freeze_batches: ["bulk-insert", "translate"].map(String::from).into(),
            reorder_batch: String::from("reorder"),
        }
    }
}

/// Maps graph notifications onto an [`UpdateScheduler`].
///
/// # Example
///
/// ```
/// use easel_update::{GraphBridge, UpdateMode, UpdateScheduler};
/// # use easel_update::{Priority, ScheduleList, UpdateFlags, UpdateHost};
/// # struct Host;
/// # impl UpdateHost<u32> for Host {
/// #     fn exists(&self, _key: u32) -> bool { true }
/// #     fn priority(&self, _key: u32) -> Priority { Priority::NODE }
/// #     fn should_render(&self, _key: u32) -> bool { true }
/// #     fn confirm_update(
/// #         &mut self,
/// #         _key: u32,
/// #         _flags: UpdateFlags,
/// #         _follow_ups: &mut ScheduleList<u32>,
/// #     ) -> UpdateFlags { UpdateFlags::empty() }
/// #     fn mount(&mut self, _key: u32) {}
/// #     fn unmount(&mut self, _key: u32) {}
/// #     fn remove(&mut self, _key: u32) {}
/// # }
/// # let mut host = Host;
/// let bridge = GraphBridge::default();
/// let mut scheduler = UpdateScheduler::new(UpdateMode::Sync);
///
/// bridge.batch_start(&mut scheduler, "bulk-insert");
/// bridge.entity_added(&mut scheduler, &mut host, 1_u32);
/// bridge.entity_added(&mut scheduler, &mut host, 2_u32);
/// bridge.batch_stop(&mut scheduler, &mut host, "bulk-insert");
///
/// assert_eq!(scheduler.pending(), 0);
/// assert!(scheduler.is_mounted(1));
/// ```
#[derive(Debug, Clone, Default)]
pub struct GraphBridge {
    options: BridgeOptions,
}

impl GraphBridge {
    /// Creates a bridge with the given batch mapping.
    #[must_use]
    pub fn new(options: BridgeOptions) -> Self {
        Self { options }
    }

    /// Returns the batch mapping.
    #[must_use]
    pub fn options(&self) -> &BridgeOptions {
        &self.options
    }

    /// An entity was registered for rendering: schedule its initial insert.
    pub fn entity_added<K, H>(&self, scheduler: &mut UpdateScheduler<K>, host: &mut H, key: K)
    where
        K: Copy + Eq + Hash,
        H: UpdateHost<K>,
    {
        scheduler.request_update(host, key, UpdateFlags::INSERT);
    }

    /// An entity was permanently removed from the graph.
    pub fn entity_removed<K, H>(&self, scheduler: &mut UpdateScheduler<K>, host: &mut H, key: K)
    where
        K: Copy + Eq + Hash,
        H: UpdateHost<K>,
    {
        scheduler.request_update(host, key, UpdateFlags::REMOVE);
    }

    /// An entity's attributes changed; `flags` is the host's translation of
    /// the changed keys into update reasons.
    pub fn entity_changed<K, H>(
        &self,
        scheduler: &mut UpdateScheduler<K>,
        host: &mut H,
        key: K,
        flags: UpdateFlags,
    ) where
        K: Copy + Eq + Hash,
        H: UpdateHost<K>,
    {
        scheduler.request_update(host, key, flags.content());
    }

    /// The graph was replaced wholesale.
    ///
    /// Drops all outstanding work and mount records, schedules a fresh
    /// insert for every surviving entity, and requests a reorder (deferred
    /// if frozen).
    pub fn reset<K, H>(&self, scheduler: &mut UpdateScheduler<K>, host: &mut H, keys: &[K])
    where
        K: Copy + Eq + Hash,
        H: UpdateHost<K>,
    {
        scheduler.clear();
        for &key in keys {
            scheduler.request_update(host, key, UpdateFlags::INSERT);
        }
        scheduler.request_reorder(host);
    }

    /// A named bulk operation began.
    pub fn batch_start<K>(&self, scheduler: &mut UpdateScheduler<K>, name: &str)
    where
        K: Copy + Eq + Hash,
    {
        if self.options.freeze_batches.iter().any(|batch| batch == name) {
            scheduler.freeze(Some(name));
        }
    }

    /// A named bulk operation ended.
    ///
    /// Returns how the scheduler resumed, or `None` if the batch name maps
    /// to neither the freeze gate nor the reorder request.
    pub fn batch_stop<K, H>(
        &self,
        scheduler: &mut UpdateScheduler<K>,
        host: &mut H,
        name: &str,
    ) -> Option<Unfrozen>
    where
        K: Copy + Eq + Hash,
        H: UpdateHost<K>,
    {
        if name == self.options.reorder_batch {
            scheduler.request_reorder(host);
            return None;
        }
        if self.options.freeze_batches.iter().any(|batch| batch == name) {
            return Some(scheduler.unfreeze(host, Some(name)));
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::UpdateMode;
    use crate::test_host::MockHost;

    fn setup() -> (GraphBridge, UpdateScheduler<u32>, MockHost) {
        (
            GraphBridge::default(),
            UpdateScheduler::new(UpdateMode::Sync),
            MockHost::new(),
        )
    }

    #[test]
    fn added_entities_render_after_the_batch_stops() {
        let (bridge, mut sched, mut host) = setup();
        host.add_node(1);
        host.add_node(2);

        bridge.batch_start(&mut sched, "bulk-insert");
        assert!(sched.is_frozen());
        bridge.entity_added(&mut sched, &mut host, 1);
        bridge.entity_added(&mut sched, &mut host, 2);
        assert!(host.render_log.is_empty());

        let outcome = bridge.batch_stop(&mut sched, &mut host, "bulk-insert");
        assert_eq!(outcome, Some(Unfrozen::Flushed));
        assert_eq!(host.render_log.len(), 2);
    }

    #[test]
    fn unknown_batches_are_ignored() {
        let (bridge, mut sched, mut host) = setup();

        bridge.batch_start(&mut sched, "measure");
        assert!(!sched.is_frozen());
        assert_eq!(bridge.batch_stop(&mut sched, &mut host, "measure"), None);
    }

    #[test]
    fn nested_unrelated_batch_cannot_unfreeze() {
        let (bridge, mut sched, mut host) = setup();

        bridge.batch_start(&mut sched, "bulk-insert");
        bridge.batch_start(&mut sched, "translate");

        // The inner batch's stop does not open the outer gate.
        let outcome = bridge.batch_stop(&mut sched, &mut host, "translate");
        assert_eq!(outcome, Some(Unfrozen::Ignored));
        assert!(sched.is_frozen());

        let outcome = bridge.batch_stop(&mut sched, &mut host, "bulk-insert");
        assert_eq!(outcome, Some(Unfrozen::Flushed));
        assert!(!sched.is_frozen());
    }

    #[test]
    fn reorder_batch_requests_a_sort() {
        let (bridge, mut sched, mut host) = setup();

        bridge.batch_stop(&mut sched, &mut host, "reorder");
        assert_eq!(host.reorders, 1);
    }

    #[test]
    fn reorder_during_freeze_is_deferred() {
        let (bridge, mut sched, mut host) = setup();

        bridge.batch_start(&mut sched, "bulk-insert");
        bridge.batch_stop(&mut sched, &mut host, "reorder");
        assert_eq!(host.reorders, 0);

        bridge.batch_stop(&mut sched, &mut host, "bulk-insert");
        assert_eq!(host.reorders, 1);
    }

    #[test]
    fn removal_notification_tears_the_view_down() {
        let (bridge, mut sched, mut host) = setup();
        host.add_node(1);

        bridge.entity_added(&mut sched, &mut host, 1);
        sched.flush_all(&mut host);
        assert!(sched.is_mounted(1));

        bridge.entity_removed(&mut sched, &mut host, 1);
        sched.flush_all(&mut host);
        assert!(!sched.is_mounted(1));
        assert_eq!(host.removed, [1]);
    }

    #[test]
    fn change_notification_strips_structural_bits() {
        let (bridge, mut sched, mut host) = setup();
        host.add_node(1);

        bridge.entity_changed(
            &mut sched,
            &mut host,
            1,
            UpdateFlags::GEOMETRY | UpdateFlags::REMOVE,
        );
        assert_eq!(sched.queue().flags_of(1), UpdateFlags::GEOMETRY);
    }

    #[test]
    fn reset_replaces_all_outstanding_work() {
        let (bridge, mut sched, mut host) = setup();
        for key in 1..=3 {
            host.add_node(key);
        }

        bridge.entity_added(&mut sched, &mut host, 1);
        sched.flush_all(&mut host);
        host.render_log.clear();

        bridge.reset(&mut sched, &mut host, &[2, 3]);
        assert!(!sched.is_mounted(1));
        assert_eq!(sched.pending(), 2);
        assert_eq!(host.reorders, 1);

        sched.flush_all(&mut host);
        assert_eq!(host.render_log.len(), 2);
    }
}
