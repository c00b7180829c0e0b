// Copyright 2025 the Easel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Easel Viewport: rectangle-based culling for diagram views.
//!
//! The `easel_update` scheduler decides which views render through a
//! host-supplied viewport predicate. This crate provides the common concrete
//! implementation: a [`ViewportCuller`] that tracks world-space bounds per
//! view key and tests them against a pannable viewport rect with an
//! optional overscan margin. It owns no views and no camera; pair it with a
//! view/camera model of your choosing and feed its answer out of the host's
//! `should_render`.
//!
//! ```rust
//! use easel_viewport::ViewportCuller;
//! use kurbo::Rect;
//!
//! let mut culler = ViewportCuller::with_margin(50.0);
//! culler.set_viewport(Some(Rect::new(0.0, 0.0, 800.0, 600.0)));
//!
//! culler.set_bounds(1_u64, Rect::new(100.0, 100.0, 200.0, 160.0));
//! culler.set_bounds(2_u64, Rect::new(2000.0, 100.0, 2100.0, 160.0));
//!
//! assert!(culler.should_render(1));
//! assert!(!culler.should_render(2));
//! // Bounds nobody has recorded yet render unconditionally.
//! assert!(culler.should_render(3));
//! ```
//!
//! ## `no_std` Support
//!
//! This crate is `no_std`. Enable the `libm` feature (and disable `std`)
//! for no_std targets; this is forwarded to Kurbo.

#![no_std]

mod culler;

pub use culler::ViewportCuller;
