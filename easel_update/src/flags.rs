// Copyright 2025 the Easel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Update flags: the reasons a view is scheduled for work.

use bitflags::bitflags;

bitflags! {
    /// A bitmask of update reasons accumulated for a single view.
    ///
    /// The two high bits are structural: [`INSERT`](Self::INSERT) asks for the
    /// view to be materialized in the render target and [`REMOVE`](Self::REMOVE)
    /// asks for it to be torn down. They are mutually exclusive; see
    /// [`merge`](Self::merge). The low bits describe content-level work
    /// (geometry, endpoints, labels, ...) and are combined with plain
    /// bitwise OR.
    ///
    /// Bits `8..=29` are reserved for callers; see [`custom`](Self::custom).
    ///
    /// # Example
    ///
    /// ```
    /// use easel_update::UpdateFlags;
    ///
    /// let pending = UpdateFlags::INSERT | UpdateFlags::GEOMETRY;
    ///
    /// // A later REMOVE cancels the pending INSERT.
    /// let merged = pending.merge(UpdateFlags::REMOVE);
    /// assert!(merged.contains(UpdateFlags::REMOVE));
    /// assert!(!merged.contains(UpdateFlags::INSERT));
    /// assert!(merged.contains(UpdateFlags::GEOMETRY));
    /// ```
    #[derive(Copy, Clone, PartialEq, Eq, Hash, Default)]
    pub struct UpdateFlags: u32 {
        /// Tear the view down and purge it from every registry.
        const REMOVE = 1 << 31;
        /// Materialize the view in the render target.
        const INSERT = 1 << 30;
        /// Full re-render of the view's visual output.
        const RENDER = 1 << 0;
        /// The underlying entity's geometry (size, rotation) changed.
        const GEOMETRY = 1 << 1;
        /// The underlying entity's position changed.
        const TRANSLATE = 1 << 2;
        /// An edge endpoint changed or moved.
        const ENDPOINTS = 1 << 3;
        /// Label content or placement changed.
        const LABELS = 1 << 4;
        /// Attached tools (handles, markers) need refreshing.
        const TOOLS = 1 << 5;
    }
}

impl UpdateFlags {
    /// Number of caller-definable custom bits.
    pub const CUSTOM_BITS: u8 = 22;

    /// Returns the `n`-th caller-defined flag.
    ///
    /// Concrete view types can use these to carry private update reasons
    /// through the scheduler without this crate knowing about them.
    ///
    /// # Panics
    ///
    /// Panics if `n >= 22`, as higher bits are reserved for structural flags.
    #[must_use]
    pub const fn custom(n: u8) -> Self {
        assert!(n < Self::CUSTOM_BITS, "custom flag index must be less than 22");
        Self::from_bits_retain(1 << (8 + n))
    }

    /// Merges `incoming` into `self`.
    ///
    /// This is bitwise OR with one exception: `INSERT` and `REMOVE` are
    /// self-canceling. Only one structural transition can be meaningful by
    /// the time the queue is flushed, so an incoming `REMOVE` clears a
    /// pending `INSERT` and vice versa.
    #[must_use]
    pub fn merge(self, incoming: Self) -> Self {
        let mut merged = self | incoming;
        if incoming.contains(Self::REMOVE) {
            merged.remove(Self::INSERT);
        } else if incoming.contains(Self::INSERT) {
            merged.remove(Self::REMOVE);
        }
        merged
    }

    /// Returns `true` if this is exactly a structural insert with no
    /// content-level work attached.
    ///
    /// Pure inserts occur while a graph is first materialized; the
    /// scheduler suppresses the on-schedule hook for them so that bulk
    /// mounting does not cascade. An insert carrying content flags is not
    /// pure and still runs the hook.
    #[must_use]
    pub fn is_pure_insert(self) -> bool {
        self == Self::INSERT
    }

    /// Returns the content-level portion of the flags, with the structural
    /// bits masked off.
    #[must_use]
    pub fn content(self) -> Self {
        self.difference(Self::INSERT | Self::REMOVE)
    }
}

impl core::fmt::Debug for UpdateFlags {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        bitflags::parser::to_writer(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_is_bitwise_or_for_content_flags() {
        let a = UpdateFlags::GEOMETRY;
        let b = UpdateFlags::LABELS | UpdateFlags::TOOLS;
        assert_eq!(a.merge(b), a | b);
    }

    #[test]
    fn remove_cancels_pending_insert() {
        let pending = UpdateFlags::INSERT | UpdateFlags::RENDER;
        let merged = pending.merge(UpdateFlags::REMOVE);
        assert!(merged.contains(UpdateFlags::REMOVE));
        assert!(!merged.contains(UpdateFlags::INSERT));
        assert!(merged.contains(UpdateFlags::RENDER));
    }

    #[test]
    fn insert_cancels_pending_remove() {
        let pending = UpdateFlags::REMOVE | UpdateFlags::GEOMETRY;
        let merged = pending.merge(UpdateFlags::INSERT);
        assert!(merged.contains(UpdateFlags::INSERT));
        assert!(!merged.contains(UpdateFlags::REMOVE));
    }

    #[test]
    fn merge_without_structural_bits_preserves_existing_structural_state() {
        let pending = UpdateFlags::INSERT;
        let merged = pending.merge(UpdateFlags::GEOMETRY);
        assert!(merged.contains(UpdateFlags::INSERT));
        assert!(merged.contains(UpdateFlags::GEOMETRY));
    }

    #[test]
    fn pure_insert_detection() {
        assert!(UpdateFlags::INSERT.is_pure_insert());
        assert!(!(UpdateFlags::INSERT | UpdateFlags::GEOMETRY).is_pure_insert());
        assert!(!UpdateFlags::GEOMETRY.is_pure_insert());
        assert!(!UpdateFlags::empty().is_pure_insert());
    }

    #[test]
    fn custom_flags_do_not_collide_with_builtins() {
        let structural = UpdateFlags::INSERT | UpdateFlags::REMOVE;
        let builtins = UpdateFlags::all().content();
        for n in 0..UpdateFlags::CUSTOM_BITS {
            let flag = UpdateFlags::custom(n);
            assert!((flag & structural).is_empty(), "custom bit overlaps structural bits");
            assert!((flag & builtins).is_empty(), "custom bit overlaps builtin bits");
        }
    }

    #[test]
    #[should_panic(expected = "custom flag index must be less than 22")]
    fn custom_flag_out_of_range() {
        let _ = UpdateFlags::custom(22);
    }

    #[test]
    fn content_masks_structural_bits() {
        let flags = UpdateFlags::INSERT | UpdateFlags::GEOMETRY | UpdateFlags::LABELS;
        assert_eq!(flags.content(), UpdateFlags::GEOMETRY | UpdateFlags::LABELS);
    }
}
