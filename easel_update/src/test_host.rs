// Copyright 2025 the Easel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A mock surface used by the scheduler tests.

use alloc::vec::Vec;

use hashbrown::{HashMap, HashSet};

use crate::flags::UpdateFlags;
use crate::host::{Endpoints, ScheduleList, UpdateHost};
use crate::queue::Priority;

/// One fake view: nodes have no endpoints, edges have two.
#[derive(Debug, Clone)]
pub(crate) struct MockEntity {
    pub(crate) priority: Priority,
    pub(crate) endpoints: Option<Endpoints<u32>>,
    /// Edges re-scheduled by the on-schedule hook when this node moves.
    pub(crate) connected: Vec<u32>,
}

/// Records every host call so tests can assert on ordering and counts.
///
/// An edge's render operation reports its flags back as leftover until both
/// endpoints have rendered output, which is what drives the scheduler's
/// out-of-turn dependency resolution.
#[derive(Debug, Default)]
pub(crate) struct MockHost {
    pub(crate) entities: HashMap<u32, MockEntity>,
    /// `None` renders everything; `Some` is the set of visible keys.
    pub(crate) visible: Option<HashSet<u32>>,
    /// Views whose output currently exists (rendered and not unmounted).
    pub(crate) rendered: HashSet<u32>,
    pub(crate) render_log: Vec<(u32, UpdateFlags)>,
    pub(crate) mounts: Vec<u32>,
    pub(crate) unmounts: Vec<u32>,
    pub(crate) removed: Vec<u32>,
    pub(crate) reorders: usize,
}

impl MockHost {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add_node(&mut self, key: u32) {
        self.entities.insert(
            key,
            MockEntity {
                priority: Priority::NODE,
                endpoints: None,
                connected: Vec::new(),
            },
        );
    }

    pub(crate) fn add_edge(&mut self, key: u32, source: Option<u32>, target: Option<u32>) {
        self.entities.insert(
            key,
            MockEntity {
                priority: Priority::EDGE,
                endpoints: Some(Endpoints { source, target }),
                connected: Vec::new(),
            },
        );
        for end in [source, target].into_iter().flatten() {
            if let Some(node) = self.entities.get_mut(&end) {
                node.connected.push(key);
            }
        }
    }

    pub(crate) fn renders_of(&self, key: u32) -> usize {
        self.render_log.iter().filter(|&&(k, _)| k == key).count()
    }
}

impl UpdateHost<u32> for MockHost {
    fn exists(&self, key: u32) -> bool {
        self.entities.contains_key(&key)
    }

    fn priority(&self, key: u32) -> Priority {
        self.entities.get(&key).map_or(Priority::NODE, |e| e.priority)
    }

    fn should_render(&self, key: u32) -> bool {
        self.visible.as_ref().is_none_or(|set| set.contains(&key))
    }

    fn confirm_update(
        &mut self,
        key: u32,
        flags: UpdateFlags,
        _follow_ups: &mut ScheduleList<u32>,
    ) -> UpdateFlags {
        if let Some(Endpoints { source, target }) = self.entities.get(&key).and_then(|e| e.endpoints)
        {
            for end in [source, target].into_iter().flatten() {
                if !self.rendered.contains(&end) {
                    // Missing endpoint output; keep waiting.
                    return flags;
                }
            }
        }
        self.render_log.push((key, flags));
        self.rendered.insert(key);
        UpdateFlags::empty()
    }

    fn mount(&mut self, key: u32) {
        self.mounts.push(key);
    }

    fn unmount(&mut self, key: u32) {
        self.unmounts.push(key);
        self.rendered.remove(&key);
    }

    fn remove(&mut self, key: u32) {
        self.entities.remove(&key);
        self.rendered.remove(&key);
        self.removed.push(key);
    }

    fn on_scheduled(&mut self, key: u32, flags: UpdateFlags, follow_ups: &mut ScheduleList<u32>) {
        if flags.intersects(UpdateFlags::GEOMETRY | UpdateFlags::TRANSLATE)
            && let Some(entity) = self.entities.get(&key)
        {
            for &edge in &entity.connected {
                follow_ups.push((edge, UpdateFlags::ENDPOINTS));
            }
        }
    }

    fn endpoints(&self, key: u32) -> Option<Endpoints<u32>> {
        self.entities.get(&key).and_then(|e| e.endpoints)
    }

    fn reorder(&mut self) {
        self.reorders += 1;
    }
}
