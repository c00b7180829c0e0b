// Copyright 2025 the Easel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The frame-paced driver state machine.

use core::hash::Hash;

use easel_update::{BatchStats, UpdateHost, UpdateScheduler};

/// Where the loop is in its Idle → Scheduled → Running cycle.
///
/// `Running` is only observable from inside a tick; by the time
/// [`FrameLoop::tick`] returns, the loop is either `Idle` (drained) or
/// `Scheduled` (another tick wanted).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum LoopState {
    /// Nothing outstanding; no tick is wanted.
    #[default]
    Idle,
    /// A tick has been requested from the host and not yet run.
    Scheduled,
    /// A tick is currently executing.
    Running,
}

/// Per-tick work budgets.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FrameBudgets {
    /// Maximum completed updates per [`FrameLoop::tick`].
    pub updates_per_tick: usize,
    /// Total mount/unmount transitions per tick; the viewport sweeps are
    /// topped up with whatever the flush pass did not use.
    pub mount_batch: usize,
}

impl Default for FrameBudgets {
    fn default() -> Self {
        Self {
            updates_per_tick: 1000,
            mount_batch: 1000,
        }
    }
}

/// Progress snapshot reported after each tick.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Progress {
    /// `true` on the tick that drained the last outstanding work.
    pub done: bool,
    /// Updates processed since the loop last went idle.
    pub processed: usize,
    /// `processed` plus the work still outstanding.
    pub total: usize,
    /// Counters from this tick's flush pass and sweeps.
    pub stats: BatchStats,
}

/// What one tick accomplished and what the host should do next.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TickReport {
    /// Progress snapshot for this tick.
    pub progress: Progress,
    /// One-shot signal: all content is stable (safe to measure bounding
    /// boxes, run layout-dependent logic, etc.).
    pub render_complete: bool,
    /// `true` if the host should request another tick.
    pub needs_frame: bool,
}

/// Frame-paced driver for an [`UpdateScheduler`].
///
/// The loop is host-agnostic: it never owns a timer or animation-frame
/// handle. The embedder requests a tick from its host environment whenever
/// [`schedule`](Self::schedule) or a [`TickReport`] asks for one, and calls
/// [`tick`](Self::tick) when the host fires. Freezing the scheduler makes
/// the next tick a no-op that parks the loop; [`cancel`](Self::cancel)
/// drops a pending request explicitly.
///
/// Each tick runs one bounded flush pass, tops the mount/unmount sweeps up
/// to the same work envelope, and accumulates a running processed counter
/// until the queue drains, at which point the report carries the one-shot
/// `render_complete` signal and the loop returns to [`LoopState::Idle`].
#[derive(Debug, Default)]
pub struct FrameLoop {
    state: LoopState,
    budgets: FrameBudgets,
    processed: usize,
}

impl FrameLoop {
    /// Creates an idle loop with the given budgets.
    #[must_use]
    pub fn new(budgets: FrameBudgets) -> Self {
        Self {
            state: LoopState::Idle,
            budgets,
            processed: 0,
        }
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Returns the per-tick budgets.
    #[must_use]
    pub fn budgets(&self) -> FrameBudgets {
        self.budgets
    }

    /// Notes that work is outstanding and a tick is wanted.
    ///
    /// Returns `true` if the host should request a tick now; `false` if one
    /// is already pending.
    pub fn schedule(&mut self) -> bool {
        match self.state {
            LoopState::Idle => {
                self.state = LoopState::Scheduled;
                true
            }
            LoopState::Scheduled | LoopState::Running => false,
        }
    }

    /// Drops any pending tick request and parks the loop.
    ///
    /// The embedder should also cancel the tick it requested from its host
    /// environment; a stale tick that fires anyway is harmless.
    pub fn cancel(&mut self) {
        self.state = LoopState::Idle;
        self.processed = 0;
    }

    /// Runs one tick: a budgeted flush pass plus topped-up viewport sweeps.
    ///
    /// While the scheduler is frozen this is a no-op that parks the loop;
    /// unfreezing in async mode re-arms it via [`schedule`](Self::schedule).
    pub fn tick<K, H>(&mut self, scheduler: &mut UpdateScheduler<K>, host: &mut H) -> TickReport
    where
        K: Copy + Eq + Hash,
        H: UpdateHost<K>,
    {
        if scheduler.is_frozen() {
            self.state = LoopState::Idle;
            return TickReport {
                progress: Progress {
                    done: false,
                    processed: self.processed,
                    total: self.processed + scheduler.pending(),
                    stats: BatchStats::default(),
                },
                render_complete: false,
                needs_frame: false,
            };
        }
        self.state = LoopState::Running;

        let mut stats = scheduler.flush_batch(host, self.budgets.updates_per_tick);
        let top_up = self
            .budgets
            .mount_batch
            .saturating_sub(stats.mounted + stats.unmounted);
        let remounted = scheduler.check_unmounted_batch(host, top_up);
        let swept = scheduler.check_mounted_batch(host, top_up.saturating_sub(remounted));
        stats.mounted += remounted;
        stats.unmounted += swept;
        self.processed += stats.completed + remounted;

        // Stalled postponed work reports empty without draining; the loop
        // parks rather than burning a frame per tick on it.
        let pending = scheduler.pending();
        if stats.empty && remounted == 0 && swept == 0 {
            let processed = core::mem::take(&mut self.processed);
            self.state = LoopState::Idle;
            TickReport {
                progress: Progress {
                    done: true,
                    processed,
                    total: processed,
                    stats,
                },
                render_complete: true,
                needs_frame: false,
            }
        } else {
            self.state = LoopState::Scheduled;
            TickReport {
                progress: Progress {
                    done: false,
                    processed: self.processed,
                    total: self.processed + pending,
                    stats,
                },
                render_complete: false,
                needs_frame: true,
            }
        }
    }
}
