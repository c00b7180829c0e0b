// Copyright 2025 the Easel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The capability seam between the scheduler and the surface that owns the
//! views.

use core::hash::Hash;

use smallvec::SmallVec;

use crate::flags::UpdateFlags;
use crate::queue::Priority;

/// Follow-up scheduling requests produced while the scheduler holds the
/// borrow on itself.
///
/// Re-entrant scheduling (a view's render operation scheduling work for
/// other views) is expressed by pushing `(key, flags)` pairs into this list;
/// the scheduler feeds them back through its own queue after the host call
/// returns. Entries pushed during a bucket pass are visited in a later pass,
/// never lost.
pub type ScheduleList<K> = SmallVec<[(K, UpdateFlags); 8]>;

/// The endpoint keys an edge view depends on for positioning.
///
/// `None` ends are point-anchored (not connected to another entity) and
/// never block the edge.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Endpoints<K> {
    /// The entity the edge starts at, if connected.
    pub source: Option<K>,
    /// The entity the edge ends at, if connected.
    pub target: Option<K>,
}

/// Capabilities the scheduler needs from the surface owning the views.
///
/// The scheduler decides *when* and *how much*; the host performs the
/// actual per-view work. Keys passed to host methods (other than
/// [`exists`](Self::exists)) are guaranteed to be live: the scheduler drops
/// stale bucket entries silently before calling in.
pub trait UpdateHost<K>
where
    K: Copy + Eq + Hash,
{
    /// Returns `true` if the key still resolves to a live view.
    fn exists(&self, key: K) -> bool;

    /// Returns the view's priority class, fixed for its lifetime.
    fn priority(&self, key: K) -> Priority;

    /// The viewport predicate: whether the view should currently be present
    /// in the render target.
    fn should_render(&self, key: K) -> bool;

    /// Performs the view's render work for `flags`.
    ///
    /// Returns the leftover flags the view could not resolve this pass;
    /// empty means fully resolved. An edge view whose endpoint has not been
    /// rendered yet reports its flags back as leftover, which triggers the
    /// scheduler's out-of-turn dependency resolution.
    ///
    /// Follow-up requests for *other* views go into `follow_ups`.
    fn confirm_update(
        &mut self,
        key: K,
        flags: UpdateFlags,
        follow_ups: &mut ScheduleList<K>,
    ) -> UpdateFlags;

    /// Attaches the view's output to the render target.
    fn mount(&mut self, key: K);

    /// Detaches the view's output from the render target without destroying
    /// the view.
    fn unmount(&mut self, key: K);

    /// Destroys the view; its entity was permanently removed from the graph.
    fn remove(&mut self, key: K);

    /// Hook invoked whenever flags are scheduled for a view, except for pure
    /// structural inserts (bulk mount must not cascade).
    ///
    /// This is how a moved node gets its connected edges re-scheduled.
    fn on_scheduled(&mut self, key: K, flags: UpdateFlags, follow_ups: &mut ScheduleList<K>) {
        let _ = (key, flags, follow_ups);
    }

    /// Returns the endpoints an edge view depends on, or `None` for views
    /// without positional dependencies (nodes).
    fn endpoints(&self, key: K) -> Option<Endpoints<K>> {
        let _ = key;
        None
    }

    /// Re-applies the render target's stacking order.
    ///
    /// Called when a structural reorder is requested, or deferred until
    /// unfreeze if the scheduler is frozen at the time.
    fn reorder(&mut self) {}
}
