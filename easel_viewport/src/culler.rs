// Copyright 2025 the Easel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The bounds store and the culling predicate.

use core::fmt::Debug;
use core::hash::Hash;

use hashbrown::HashMap;
use kurbo::Rect;

/// Tracks world-space bounds per view key and answers "should this view be
/// in the render tree right now?".
///
/// The culler is deliberately passive: the surface pushes bounds into it as
/// views render and moves the viewport rect as the user pans and zooms, and
/// the scheduler's host calls [`should_render`](Self::should_render) from
/// its viewport predicate. Two conservative defaults keep views on screen
/// rather than flickering out:
///
/// - With no viewport set (`None`), everything renders. Surfaces clear the
///   viewport during interactions where culling would thrash, e.g. a
///   drag-scroll with inertia.
/// - A key with no recorded bounds renders unconditionally; its first
///   render is what produces the bounds.
///
/// The overscan `margin` widens the culling rect on all four sides so that
/// views mount slightly before they scroll into view.
#[derive(Clone)]
pub struct ViewportCuller<K> {
    bounds: HashMap<K, Rect>,
    viewport: Option<Rect>,
    margin: f64,
}

impl<K> Default for ViewportCuller<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> ViewportCuller<K> {
    /// Creates a culler with no viewport (everything renders) and no margin.
    #[must_use]
    pub fn new() -> Self {
        Self {
            bounds: HashMap::new(),
            viewport: None,
            margin: 0.0,
        }
    }

    /// Creates a culler with the given overscan margin.
    #[must_use]
    pub fn with_margin(margin: f64) -> Self {
        Self {
            margin,
            ..Self::new()
        }
    }

    /// The current viewport rect, if culling is active.
    #[must_use]
    pub fn viewport(&self) -> Option<Rect> {
        self.viewport
    }

    /// Sets or clears the viewport rect. `None` disables culling.
    pub fn set_viewport(&mut self, viewport: Option<Rect>) {
        self.viewport = viewport;
    }

    /// The overscan margin applied on all four sides.
    #[must_use]
    pub fn margin(&self) -> f64 {
        self.margin
    }

    /// Sets the overscan margin.
    pub fn set_margin(&mut self, margin: f64) {
        self.margin = margin;
    }

    /// The viewport inflated by the margin, or `None` if culling is off.
    #[must_use]
    pub fn culling_rect(&self) -> Option<Rect> {
        self.viewport.map(|rect| rect.inflate(self.margin, self.margin))
    }
}

impl<K: Copy + Eq + Hash> ViewportCuller<K> {
    /// Records the world-space bounds of a view's rendered output.
    pub fn set_bounds(&mut self, key: K, bounds: Rect) {
        self.bounds.insert(key, bounds);
    }

    /// Forgets a view's bounds, e.g. when its entity is removed.
    pub fn clear_bounds(&mut self, key: K) -> Option<Rect> {
        self.bounds.remove(&key)
    }

    /// The recorded bounds of a view, if any.
    #[must_use]
    pub fn bounds_of(&self, key: K) -> Option<Rect> {
        self.bounds.get(&key).copied()
    }

    /// Whether the view overlaps the (margin-inflated) viewport.
    ///
    /// Bounds that merely touch the culling rect's edge count as visible.
    #[must_use]
    pub fn should_render(&self, key: K) -> bool {
        let Some(culling) = self.culling_rect() else {
            return true;
        };
        let Some(bounds) = self.bounds.get(&key) else {
            return true;
        };
        bounds.x0 <= culling.x1
            && culling.x0 <= bounds.x1
            && bounds.y0 <= culling.y1
            && culling.y0 <= bounds.y1
    }
}

impl<K: Debug> Debug for ViewportCuller<K> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ViewportCuller")
            .field("viewport", &self.viewport)
            .field("margin", &self.margin)
            .field("bounds", &self.bounds)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_viewport_renders_everything() {
        let mut culler = ViewportCuller::new();
        culler.set_bounds(1_u32, Rect::new(1e6, 1e6, 1e6 + 10.0, 1e6 + 10.0));
        assert!(culler.should_render(1));
    }

    #[test]
    fn unknown_bounds_render_unconditionally() {
        let mut culler = ViewportCuller::<u32>::new();
        culler.set_viewport(Some(Rect::new(0.0, 0.0, 100.0, 100.0)));
        assert!(culler.should_render(42));
    }

    #[test]
    fn overlap_decides_visibility() {
        let mut culler = ViewportCuller::new();
        culler.set_viewport(Some(Rect::new(0.0, 0.0, 100.0, 100.0)));
        culler.set_bounds(1_u32, Rect::new(50.0, 50.0, 60.0, 60.0));
        culler.set_bounds(2_u32, Rect::new(150.0, 50.0, 160.0, 60.0));
        culler.set_bounds(3_u32, Rect::new(-10.0, -10.0, 5.0, 5.0));

        assert!(culler.should_render(1));
        assert!(!culler.should_render(2));
        assert!(culler.should_render(3));
    }

    #[test]
    fn touching_the_edge_counts_as_visible() {
        let mut culler = ViewportCuller::new();
        culler.set_viewport(Some(Rect::new(0.0, 0.0, 100.0, 100.0)));
        culler.set_bounds(1_u32, Rect::new(100.0, 0.0, 120.0, 10.0));
        assert!(culler.should_render(1));

        // A zero-area point node inside the viewport stays visible too.
        culler.set_bounds(2_u32, Rect::new(50.0, 50.0, 50.0, 50.0));
        assert!(culler.should_render(2));
    }

    #[test]
    fn margin_pulls_nearby_views_in() {
        let mut culler = ViewportCuller::with_margin(50.0);
        culler.set_viewport(Some(Rect::new(0.0, 0.0, 100.0, 100.0)));
        culler.set_bounds(1_u32, Rect::new(120.0, 0.0, 140.0, 10.0));
        assert!(culler.should_render(1));

        culler.set_margin(0.0);
        assert!(!culler.should_render(1));
    }

    #[test]
    fn cleared_bounds_fall_back_to_render() {
        let mut culler = ViewportCuller::new();
        culler.set_viewport(Some(Rect::new(0.0, 0.0, 100.0, 100.0)));
        culler.set_bounds(1_u32, Rect::new(200.0, 200.0, 210.0, 210.0));
        assert!(!culler.should_render(1));

        assert!(culler.clear_bounds(1).is_some());
        assert!(culler.should_render(1));
        assert!(culler.bounds_of(1).is_none());
    }

    #[test]
    fn viewport_moves_flip_the_answer() {
        let mut culler = ViewportCuller::new();
        culler.set_bounds(1_u32, Rect::new(500.0, 500.0, 520.0, 520.0));

        culler.set_viewport(Some(Rect::new(0.0, 0.0, 100.0, 100.0)));
        assert!(!culler.should_render(1));

        culler.set_viewport(Some(Rect::new(450.0, 450.0, 550.0, 550.0)));
        assert!(culler.should_render(1));

        culler.set_viewport(None);
        assert!(culler.culling_rect().is_none());
        assert!(culler.should_render(1));
    }
}
