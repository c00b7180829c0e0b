// Copyright 2025 the Easel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Easel Update: incremental view-update scheduling for diagramming surfaces.
//!
//! A diagramming surface keeps one rendering proxy (a *view*) per graph
//! entity and must decide, every frame, which views get (re)rendered, in
//! what order, how much work runs per tick, and which views are kept out of
//! the render tree entirely because they fall outside the viewport. This
//! crate provides that scheduler:
//!
//! - **Update flags** ([`UpdateFlags`]): a bitmask of update reasons with
//!   self-canceling structural `INSERT`/`REMOVE` bits.
//! - **Priority buckets** ([`PriorityQueue`], [`Priority`]): per-priority
//!   maps of accumulated flags, flushed lowest class first so edges run
//!   after the nodes they depend on.
//! - **Mount registry** ([`MountRegistry`]): which views currently live in
//!   the render target, with bounded round-robin sweeps against a viewport
//!   predicate.
//! - **Flush engine** ([`UpdateScheduler`]): budgeted passes over the
//!   buckets, mount/unmount transitions, out-of-turn resolution of
//!   dependency-stalled edges, and a keyed freeze gate for bulk operations.
//! - **Graph bridge** ([`GraphBridge`]): maps model-layer notifications
//!   (add, remove, change, reset, batch brackets) onto scheduler calls.
//!
//! The scheduler owns no views and renders nothing itself. The surface
//! implements [`UpdateHost`] and keeps ownership of its views; the
//! scheduler calls in with a key and the accumulated flags, and the host
//! reports back any leftover work. Keys are anything `Copy + Eq + Hash`.
//!
//! ## Scheduling model
//!
//! Work accumulates in priority buckets: re-scheduling a view merges flags
//! into its existing entry, so a view is rendered at most once per flush
//! pass no matter how many requests preceded it. [`UpdateScheduler::flush_batch`]
//! drains the buckets in ascending priority order up to a completion
//! budget; [`UpdateScheduler::flush_all`] loops until nothing is
//! outstanding. Views that fail the viewport predicate are unmounted with
//! their pending flags preserved, and replay them (plus a fresh `INSERT`)
//! when they scroll back in.
//!
//! Re-entrant scheduling is supported throughout: a render operation can
//! request work for other views (via the follow-up list), and a moved node
//! re-schedules its connected edges through the on-schedule hook. An edge
//! flushed before its endpoint resolves is *postponed* and the scheduler
//! force-renders the endpoint out of turn so the edge can complete within
//! the same pass.
//!
//! For frame-paced draining, pair this crate with `easel_frame`; for a
//! rectangle-based viewport predicate, see `easel_viewport`.
//!
//! ## Quick start
//!
//! ```rust
//! use easel_update::{
//!     Priority, ScheduleList, UpdateFlags, UpdateHost, UpdateMode, UpdateScheduler,
//! };
//!
//! struct Surface {
//!     renders: usize,
//! }
//!
//! impl UpdateHost<u64> for Surface {
//!     fn exists(&self, _key: u64) -> bool {
//!         true
//!     }
//!     fn priority(&self, _key: u64) -> Priority {
//!         Priority::NODE
//!     }
//!     fn should_render(&self, _key: u64) -> bool {
//!         true
//!     }
//!     fn confirm_update(
//!         &mut self,
//!         _key: u64,
//!         _flags: UpdateFlags,
//!         _follow_ups: &mut ScheduleList<u64>,
//!     ) -> UpdateFlags {
//!         self.renders += 1;
//!         UpdateFlags::empty()
//!     }
//!     fn mount(&mut self, _key: u64) {}
//!     fn unmount(&mut self, _key: u64) {}
//!     fn remove(&mut self, _key: u64) {}
//! }
//!
//! let mut surface = Surface { renders: 0 };
//! let mut scheduler = UpdateScheduler::new(UpdateMode::Sync);
//!
//! // Requests for the same view coalesce into one render.
//! scheduler.request_update(&mut surface, 1, UpdateFlags::INSERT);
//! scheduler.request_update(&mut surface, 1, UpdateFlags::GEOMETRY);
//! scheduler.flush_all(&mut surface);
//!
//! assert_eq!(surface.renders, 1);
//! ```
//!
//! ## `no_std` Support
//!
//! This crate is `no_std` and uses `alloc`. It does not depend on `std`.

#![no_std]

extern crate alloc;

mod bridge;
mod engine;
mod flags;
mod host;
mod queue;
mod registry;
#[cfg(test)]
mod test_host;

pub use bridge::{BridgeOptions, GraphBridge};
pub use engine::{BatchStats, Unfrozen, UpdateMode, UpdateScheduler};
pub use flags::UpdateFlags;
pub use host::{Endpoints, ScheduleList, UpdateHost};
pub use queue::{Priority, PriorityQueue};
pub use registry::MountRegistry;
