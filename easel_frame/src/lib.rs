// Copyright 2025 the Easel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Easel Frame: a frame-paced driver for the `easel_update` scheduler.
//!
//! In async mode the scheduler leaves draining to its embedder. This crate
//! provides the driving state machine: a [`FrameLoop`] that the surface
//! hooks to whatever tick source its host environment offers (an animation
//! frame callback, a compositor vsync, a test harness calling [`FrameLoop::tick`]
//! in a loop). Each tick runs one budgeted flush pass plus viewport sweeps
//! and reports, via [`TickReport`], whether another tick is wanted and how
//! far along the current drain is.
//!
//! ```rust
//! use easel_frame::{FrameBudgets, FrameLoop};
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
//! let mut scheduler = UpdateScheduler::new(UpdateMode::Async);
//! let mut frame_loop = FrameLoop::new(FrameBudgets {
//!     updates_per_tick: 2,
//!     ..FrameBudgets::default()
//! });
//!
//! for key in 0..5_u64 {
//!     scheduler.request_update(&mut surface, key, UpdateFlags::INSERT);
//! }
//! assert!(frame_loop.schedule());
//!
//! // The host environment would fire these ticks one frame apart.
//! loop {
//!     let report = frame_loop.tick(&mut scheduler, &mut surface);
//!     if report.render_complete {
//!         break;
//!     }
//!     assert!(report.needs_frame);
//! }
//! assert_eq!(surface.renders, 5);
//! ```
//!
//! ## `no_std` Support
//!
//! This crate is `no_std` and uses `alloc`. It does not depend on `std`.

#![no_std]

extern crate alloc;

mod driver;

pub use driver::{FrameBudgets, FrameLoop, LoopState, Progress, TickReport};
