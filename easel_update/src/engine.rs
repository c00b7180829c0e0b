// Copyright 2025 the Easel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The flush engine: bounded passes over the priority buckets, mount and
//! unmount transitions, and the freeze gate.

use alloc::string::String;
use core::fmt;
use core::hash::Hash;

use crate::flags::UpdateFlags;
use crate::host::{ScheduleList, UpdateHost};
use crate::queue::{Priority, PriorityQueue};
use crate::registry::MountRegistry;

/// How the scheduler resumes after [`UpdateScheduler::unfreeze`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum UpdateMode {
    /// `unfreeze` replays a synchronous [`UpdateScheduler::flush_all`].
    #[default]
    Sync,
    /// `unfreeze` reports [`Unfrozen::Resumed`] and the embedder re-arms its
    /// frame loop.
    Async,
}

/// Outcome of an [`UpdateScheduler::unfreeze`] call.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Unfrozen {
    /// A keyed freeze was active and the supplied key did not match; nothing
    /// happened.
    Ignored,
    /// The gate opened and a full synchronous flush ran.
    Flushed,
    /// The gate opened; the embedder should restart its scheduling loop.
    Resumed,
}

/// Counters reported by one [`UpdateScheduler::flush_batch`] pass.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct BatchStats {
    /// Entries fully resolved this pass (including processed removals).
    pub completed: usize,
    /// Entries whose render operation returned leftover flags.
    pub postponed: usize,
    /// Views attached to the render target this pass.
    pub mounted: usize,
    /// Views detached from the render target this pass.
    pub unmounted: usize,
    /// `true` if no outstanding work remained when the pass ended.
    pub empty: bool,
}

/// The incremental view-update scheduler.
///
/// Owns the priority buckets, the mount registries, and the freeze gate for
/// one rendering session. All per-view work is delegated to an
/// [`UpdateHost`]; the scheduler only decides which views get work, in what
/// order, and how much of it runs per call.
///
/// # Example
///
/// ```
/// use easel_update::{
///     Priority, ScheduleList, UpdateFlags, UpdateHost, UpdateMode, UpdateScheduler,
/// };
///
/// /// A surface with a single always-visible view.
/// struct OneView {
///     rendered: bool,
/// }
///
/// impl UpdateHost<u32> for OneView {
///     fn exists(&self, key: u32) -> bool {
///         key == 1
///     }
///     fn priority(&self, _key: u32) -> Priority {
///         Priority::NODE
///     }
///     fn should_render(&self, _key: u32) -> bool {
///         true
///     }
///     fn confirm_update(
///         &mut self,
///         _key: u32,
///         _flags: UpdateFlags,
///         _follow_ups: &mut ScheduleList<u32>,
///     ) -> UpdateFlags {
///         self.rendered = true;
///         UpdateFlags::empty()
///     }
///     fn mount(&mut self, _key: u32) {}
///     fn unmount(&mut self, _key: u32) {}
///     fn remove(&mut self, _key: u32) {}
/// }
///
/// let mut host = OneView { rendered: false };
/// let mut scheduler = UpdateScheduler::new(UpdateMode::Sync);
///
/// scheduler.request_update(&mut host, 1, UpdateFlags::INSERT);
/// scheduler.flush_all(&mut host);
///
/// assert!(host.rendered);
/// assert!(scheduler.is_mounted(1));
/// assert_eq!(scheduler.pending(), 0);
/// ```
pub struct UpdateScheduler<K>
where
    K: Copy + Eq + Hash,
{
    queue: PriorityQueue<K>,
    registry: MountRegistry<K>,
    mode: UpdateMode,
    frozen: bool,
    freeze_key: Option<String>,
    reorder_pending: bool,
}

impl<K> Default for UpdateScheduler<K>
where
    K: Copy + Eq + Hash,
{
    fn default() -> Self {
        Self::new(UpdateMode::default())
    }
}

impl<K> UpdateScheduler<K>
where
    K: Copy + Eq + Hash,
{
    /// Creates an empty scheduler.
    #[must_use]
    pub fn new(mode: UpdateMode) -> Self {
        Self {
            queue: PriorityQueue::new(),
            registry: MountRegistry::new(),
            mode,
            frozen: false,
            freeze_key: None,
            reorder_pending: false,
        }
    }

    /// Returns the resume mode.
    #[must_use]
    pub fn mode(&self) -> UpdateMode {
        self.mode
    }

    /// Returns a reference to the underlying bucket queue.
    #[must_use]
    pub fn queue(&self) -> &PriorityQueue<K> {
        &self.queue
    }

    /// Returns a reference to the underlying mount registry.
    #[must_use]
    pub fn registry(&self) -> &MountRegistry<K> {
        &self.registry
    }

    /// Number of distinct views with outstanding bucket work.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.pending()
    }

    /// Whether a view currently has a live presence in the render target.
    #[must_use]
    pub fn is_mounted(&self, key: K) -> bool {
        self.registry.is_mounted(key)
    }

    /// Drops all outstanding work and mount records.
    ///
    /// The freeze gate is left as-is; this is used when the graph resets.
    pub fn clear(&mut self) {
        self.queue.clear();
        self.registry.clear();
    }

    // -------------------------------------------------------------------------
    // Scheduling
    // -------------------------------------------------------------------------

    /// Merges `flags` into the view's bucket entry and runs the on-schedule
    /// hook.
    ///
    /// The hook ([`UpdateHost::on_scheduled`]) may request follow-up work
    /// for other views (an edge whose endpoint moved re-scheduling itself);
    /// follow-ups are applied transitively. The hook is suppressed for pure
    /// structural inserts, so bulk mounting a large graph does not cascade;
    /// an insert carrying content flags still runs it.
    pub fn request_update<H>(&mut self, host: &mut H, key: K, flags: UpdateFlags)
    where
        H: UpdateHost<K>,
    {
        let mut work = ScheduleList::new();
        work.push((key, flags));
        self.apply_requests(host, work);
    }

    fn apply_requests<H>(&mut self, host: &mut H, mut work: ScheduleList<K>)
    where
        H: UpdateHost<K>,
    {
        while let Some((key, flags)) = work.pop() {
            if flags.is_empty() {
                continue;
            }
            self.queue.schedule(key, flags, host.priority(key));
            if !flags.is_pure_insert() {
                host.on_scheduled(key, flags, &mut work);
            }
        }
    }

    // -------------------------------------------------------------------------
    // Flushing
    // -------------------------------------------------------------------------

    /// Performs one bounded pass over all buckets in ascending priority
    /// order.
    ///
    /// The pass stops early once `budget` entries have been completed. Each
    /// bucket is iterated via a snapshot of its keys, so entries scheduled
    /// re-entrantly during the pass are visited by a later pass rather than
    /// observed mid-iteration.
    ///
    /// Views that fail the viewport predicate are unmounted with their flags
    /// preserved instead of rendered; unmounting does not consume the
    /// completion budget.
    pub fn flush_batch<H>(&mut self, host: &mut H, budget: usize) -> BatchStats
    where
        H: UpdateHost<K>,
    {
        let mut stats = BatchStats::default();
        let mut p: u8 = 0;
        while (p as usize) < self.queue.bucket_count() {
            let priority = Priority::new(p);
            for key in self.queue.snapshot(priority) {
                if stats.completed >= budget {
                    return stats;
                }
                let flags = self.queue.take(key, priority);
                if flags.is_empty() {
                    // Resolved out of turn earlier in this pass.
                    continue;
                }
                self.process(host, key, flags, &mut stats);
            }
            p += 1;
        }
        // A pass that made no progress reports empty even if postponed
        // entries remain, so callers stop draining instead of spinning on
        // permanently stalled work.
        let progress = stats.completed > 0 || stats.mounted > 0 || stats.unmounted > 0;
        stats.empty = self.queue.is_empty() || !progress;
        stats
    }

    /// Flushes until no outstanding work remains or no further progress can
    /// be made.
    ///
    /// Runs full mount and unmount sweeps first, so that with a stable
    /// viewport predicate every view ends the call with
    /// `is_mounted == should_render`. Work stalled on an unresolvable
    /// dependency stays in its bucket; termination otherwise relies on
    /// render operations being well-behaved (not re-scheduling themselves
    /// with unchanged flags forever).
    pub fn flush_all<H>(&mut self, host: &mut H)
    where
        H: UpdateHost<K>,
    {
        self.check_unmounted_batch(host, usize::MAX);
        self.check_mounted_batch(host, usize::MAX);
        loop {
            let stats = self.flush_batch(host, usize::MAX);
            if stats.empty {
                break;
            }
        }
    }

    fn process<H>(&mut self, host: &mut H, key: K, flags: UpdateFlags, stats: &mut BatchStats)
    where
        H: UpdateHost<K>,
    {
        if !host.exists(key) {
            // Stale reference; expected housekeeping, not an error.
            self.registry.purge(key);
            return;
        }
        if flags.contains(UpdateFlags::REMOVE) {
            if self.registry.is_mounted(key) {
                host.unmount(key);
            }
            self.registry.purge(key);
            host.remove(key);
            stats.completed += 1;
            return;
        }
        if !host.should_render(key) {
            if self.registry.is_mounted(key) {
                host.unmount(key);
            }
            // Merging more work into an existing unmounted record is not a
            // transition; counting it would also keep the pass reporting
            // progress it did not make.
            if !self.registry.is_unmounted(key) {
                stats.unmounted += 1;
            }
            self.registry.mark_unmounted(key, flags);
            return;
        }
        let mut flags = flags;
        if !self.registry.is_mounted(key) {
            let preserved = self.registry.mark_mounted(key).unwrap_or_default();
            flags = flags.merge(preserved | UpdateFlags::INSERT);
            host.mount(key);
            stats.mounted += 1;
        }
        let mut follow_ups = ScheduleList::new();
        let leftover = host.confirm_update(key, flags, &mut follow_ups);
        self.apply_requests(host, follow_ups);
        if leftover.is_empty() {
            stats.completed += 1;
            return;
        }
        // Preserve the unfinished portion; the view stays scheduled.
        self.queue.schedule(key, leftover, host.priority(key));
        stats.postponed += 1;
        if self.try_unblock(host, key) {
            stats.completed += 1;
        }
    }

    /// Attempts to resolve a dependency-stalled edge out of turn.
    ///
    /// An edge blocked on an unrendered endpoint forces that endpoint's
    /// pending work to run immediately (even though its own bucket pass has
    /// completed or not yet started) and then retries itself. Each endpoint
    /// is forced at most once per attempt, and the attempt runs at most once
    /// per postponed entry per pass, so a dangling endpoint degrades to a
    /// stalled postponed counter rather than a spin.
    fn try_unblock<H>(&mut self, host: &mut H, key: K) -> bool
    where
        H: UpdateHost<K>,
    {
        let Some(endpoints) = host.endpoints(key) else {
            return false;
        };
        let mut blocked = UpdateFlags::empty();
        for end in [endpoints.source, endpoints.target] {
            let Some(end) = end else {
                continue;
            };
            if !host.exists(end) {
                // Dangling endpoint reference; the edge stays postponed.
                return false;
            }
            if !self.registry.is_mounted(end) || !self.queue.flags_of(end).is_empty() {
                blocked |= self.force_resolve(host, end);
            }
        }
        if !blocked.is_empty() {
            return false;
        }
        // Both endpoints settled; retry the edge itself.
        self.force_resolve(host, key).is_empty()
    }

    /// Runs one view's pending work immediately, outside bucket order.
    ///
    /// Mounts the view if needed, regardless of the viewport predicate: an
    /// edge inside the viewport may depend on an endpoint outside it.
    /// Returns the leftover flags (re-stored in the bucket when non-empty).
    fn force_resolve<H>(&mut self, host: &mut H, key: K) -> UpdateFlags
    where
        H: UpdateHost<K>,
    {
        if !host.exists(key) {
            self.queue.take_any(key);
            self.registry.purge(key);
            return UpdateFlags::empty();
        }
        let mut flags = self.queue.take_any(key);
        if flags.contains(UpdateFlags::REMOVE) {
            // A pending removal cannot be forced; put it back.
            self.queue.schedule(key, flags, host.priority(key));
            return flags;
        }
        if !self.registry.is_mounted(key) {
            let preserved = self.registry.mark_mounted(key).unwrap_or_default();
            flags = flags.merge(preserved | UpdateFlags::INSERT);
            host.mount(key);
        }
        if flags.is_empty() {
            return UpdateFlags::empty();
        }
        let mut follow_ups = ScheduleList::new();
        let leftover = host.confirm_update(key, flags, &mut follow_ups);
        self.apply_requests(host, follow_ups);
        if !leftover.is_empty() {
            self.queue.schedule(key, leftover, host.priority(key));
        }
        leftover
    }

    // -------------------------------------------------------------------------
    // Viewport sweeps
    // -------------------------------------------------------------------------

    /// Re-evaluates up to `limit` mounted views against the viewport
    /// predicate, unmounting the ones that fail it.
    ///
    /// Views that stay mounted are re-appended to the tail of the sweep
    /// list; repeated bounded calls eventually visit every mounted view.
    /// Returns the number of views unmounted.
    pub fn check_mounted_batch<H>(&mut self, host: &mut H, limit: usize) -> usize
    where
        H: UpdateHost<K>,
    {
        let mut unmounted = 0;
        let visits = self.registry.mounted_order_len().min(limit);
        for _ in 0..visits {
            let Some(key) = self.registry.pop_mounted_order() else {
                break;
            };
            if !self.registry.is_mounted(key) {
                // Stale sweep entry.
                continue;
            }
            if !host.exists(key) {
                self.queue.take_any(key);
                self.registry.purge(key);
                continue;
            }
            if self.queue.flags_of(key).contains(UpdateFlags::REMOVE) {
                // Removal is pending; leave it to the flush engine.
                self.registry.push_mounted_order(key);
                continue;
            }
            if host.should_render(key) {
                self.registry.push_mounted_order(key);
                continue;
            }
            let flags = self.queue.take_any(key);
            host.unmount(key);
            self.registry.mark_unmounted(key, flags);
            unmounted += 1;
        }
        unmounted
    }

    /// Re-evaluates up to `limit` unmounted views against the viewport
    /// predicate, remounting the ones that now pass it.
    ///
    /// Remounting merges the view's preserved flags plus a fresh `INSERT`
    /// back into its bucket; the actual render happens on the next flush.
    /// Returns the number of views remounted.
    pub fn check_unmounted_batch<H>(&mut self, host: &mut H, limit: usize) -> usize
    where
        H: UpdateHost<K>,
    {
        let mut mounted = 0;
        let visits = self.registry.unmounted_order_len().min(limit);
        for _ in 0..visits {
            let Some(key) = self.registry.pop_unmounted_order() else {
                break;
            };
            if !self.registry.is_unmounted(key) {
                continue;
            }
            if !host.exists(key) {
                self.queue.take_any(key);
                self.registry.purge(key);
                continue;
            }
            if !host.should_render(key) {
                self.registry.push_unmounted_order(key);
                continue;
            }
            let preserved = self.registry.mark_mounted(key).unwrap_or_default();
            host.mount(key);
            self.queue
                .schedule(key, preserved.merge(UpdateFlags::INSERT), host.priority(key));
            mounted += 1;
        }
        mounted
    }

    // -------------------------------------------------------------------------
    // Freeze gate
    // -------------------------------------------------------------------------

    /// Returns `true` while updates are paused.
    #[must_use]
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Pauses update processing.
    ///
    /// If `key` is supplied and no keyed freeze is currently active, it is
    /// stored; a second keyed freeze while another key is active keeps the
    /// gate closed but does not take over the key. The embedder should also
    /// cancel any pending frame tick.
    pub fn freeze(&mut self, key: Option<&str>) {
        if let Some(key) = key
            && !(self.frozen && self.freeze_key.is_some())
        {
            self.freeze_key = Some(String::from(key));
        }
        self.frozen = true;
    }

    /// Resumes update processing.
    ///
    /// If a keyed freeze is active and `key` does not match, this is a
    /// no-op returning [`Unfrozen::Ignored`] so independent subsystems can
    /// nest freeze requests safely. Otherwise the gate opens, a reorder
    /// requested while frozen is applied, and the scheduler either replays a
    /// full flush (sync mode) or asks the embedder to restart its loop
    /// (async mode).
    pub fn unfreeze<H>(&mut self, host: &mut H, key: Option<&str>) -> Unfrozen
    where
        H: UpdateHost<K>,
    {
        if let (Some(active), Some(supplied)) = (self.freeze_key.as_deref(), key)
            && active != supplied
        {
            return Unfrozen::Ignored;
        }
        self.freeze_key = None;
        self.frozen = false;
        if self.reorder_pending {
            self.reorder_pending = false;
            host.reorder();
        }
        match self.mode {
            UpdateMode::Sync => {
                self.flush_all(host);
                Unfrozen::Flushed
            }
            UpdateMode::Async => Unfrozen::Resumed,
        }
    }

    /// Applies the render target's stacking order, or defers it until
    /// unfreeze while the gate is closed.
    pub fn request_reorder<H>(&mut self, host: &mut H)
    where
        H: UpdateHost<K>,
    {
        if self.frozen {
            self.reorder_pending = true;
        } else {
            host.reorder();
        }
    }
}

impl<K> fmt::Debug for UpdateScheduler<K>
where
    K: Copy + Eq + Hash + fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpdateScheduler")
            .field("queue", &self.queue)
            .field("registry", &self.registry)
            .field("mode", &self.mode)
            .field("frozen", &self.frozen)
            .field("freeze_key", &self.freeze_key)
            .field("reorder_pending", &self.reorder_pending)
            .finish()
    }
}
