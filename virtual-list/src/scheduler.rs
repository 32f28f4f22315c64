//! Cooperative, step-wise reconciliation between the rendered index set and the visible range.
//!
//! The scheduler is an explicit state machine:
//!
//! ```text
//!   Idle ──request──▶ Scheduled ──due + step──▶ Running ──plan drained──▶ Idle
//!                        ▲  │ request (coalesced)     │ request (re-plan on next step)
//!                        └──┘                         ▼
//! ```
//!
//! Each step touches at most `budget` indices so the host's UI thread never blocks on a large
//! jump. Nothing here reads a clock: the host passes `now_ms` in.

use alloc::collections::{BTreeSet, VecDeque};
use alloc::vec::Vec;

use crate::{
    AcquireError, Container, ItemError, ListMetrics, Phase, Placement, RecyclingPool, RenderFailure,
    RenderableItem, SelectionManager, VisibleRange,
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SchedulerState {
    /// No reconciliation pending.
    #[default]
    Idle,
    /// A reconciliation was requested and waits for its due time.
    Scheduled,
    /// A reconciliation is partway through its plan.
    Running,
}

/// Counters describing the scheduler's work so far. Durations are host milliseconds.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RenderStats {
    /// Completed reconciliations.
    pub reconciliations: u64,
    pub steps: u64,
    /// Requests folded into an already pending reconciliation.
    pub coalesced: u64,
    pub added: u64,
    pub removed: u64,
    pub updated: u64,
    pub failures: u64,
    pub last_duration_ms: u64,
    /// Exponential moving average of reconciliation duration (alpha 0.1).
    pub average_duration_ms: f64,
}

impl RenderStats {
    const EMA_ALPHA: f64 = 0.1;

    fn record_duration(&mut self, duration_ms: u64) {
        self.last_duration_ms = duration_ms;
        let sample = duration_ms as f64;
        self.average_duration_ms = if self.reconciliations <= 1 {
            sample
        } else {
            self.average_duration_ms * (1.0 - Self::EMA_ALPHA) + sample * Self::EMA_ALPHA
        };
    }
}

/// What one call to [`RenderScheduler::step`] did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    /// Nothing is pending.
    Idle,
    /// A reconciliation is pending but not due before `due_ms`.
    Waiting { due_ms: u64 },
    /// Work was done and more remains.
    Progress,
    /// The plan was drained; the rendered set now matches `range`.
    Completed(VisibleRange),
}

/// Everything a reconciliation step reads or mutates, borrowed from the owning list.
pub struct ReconcileContext<'a, C: Container, I> {
    pub container: &'a mut C,
    pub items: &'a [I],
    pub pool: &'a mut RecyclingPool<C::Handle>,
    pub selection: &'a SelectionManager,
    pub metrics: ListMetrics,
    pub scroll_position: f64,
    pub buffer_items: usize,
    /// Dataset generation; a plan made for another generation is thrown away.
    pub generation: u64,
}

impl<C: Container, I> ReconcileContext<'_, C, I> {
    fn target_range(&self) -> VisibleRange {
        self.metrics
            .visible_range(self.scroll_position, self.buffer_items)
    }
}

#[derive(Debug)]
struct Plan {
    generation: u64,
    target: VisibleRange,
    remove: VecDeque<usize>,
    add: VecDeque<usize>,
    update: VecDeque<usize>,
}

impl Plan {
    fn is_drained(&self) -> bool {
        self.remove.is_empty() && self.add.is_empty() && self.update.is_empty()
    }

    fn len(&self) -> usize {
        self.remove.len() + self.add.len() + self.update.len()
    }
}

/// Drives reconciliation in bounded steps and throttles requests.
#[derive(Debug)]
pub struct RenderScheduler {
    state: SchedulerState,
    min_interval_ms: u64,
    due_ms: Option<u64>,
    last_run_ms: Option<u64>,
    started_ms: u64,
    plan: Option<Plan>,
    replan: bool,
    failed: BTreeSet<usize>,
    last_failures: Vec<RenderFailure>,
    stats: RenderStats,
}

impl RenderScheduler {
    pub fn new(min_interval_ms: u64) -> Self {
        Self {
            state: SchedulerState::Idle,
            min_interval_ms,
            due_ms: None,
            last_run_ms: None,
            started_ms: 0,
            plan: None,
            replan: false,
            failed: BTreeSet::new(),
            last_failures: Vec::new(),
            stats: RenderStats::default(),
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn stats(&self) -> RenderStats {
        self.stats
    }

    /// Failures recorded by the most recent (or current) reconciliation.
    pub fn last_failures(&self) -> &[RenderFailure] {
        &self.last_failures
    }

    pub fn min_interval_ms(&self) -> u64 {
        self.min_interval_ms
    }

    pub fn set_min_interval_ms(&mut self, min_interval_ms: u64) {
        self.min_interval_ms = min_interval_ms;
    }

    /// Indices whose `create` failed and that are not retried while they stay in range.
    pub fn failed_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.failed.iter().copied()
    }

    /// Lets a previously failed index be created again on the next reconciliation.
    pub fn forget_failure(&mut self, index: usize) -> bool {
        self.failed.remove(&index)
    }

    pub fn is_due(&self, now_ms: u64) -> bool {
        match self.state {
            SchedulerState::Idle => false,
            SchedulerState::Scheduled => self.due_ms.is_none_or(|due| now_ms >= due),
            SchedulerState::Running => true,
        }
    }

    /// When the host should call back in. `None` while idle.
    pub fn next_wakeup(&self, now_ms: u64) -> Option<u64> {
        match self.state {
            SchedulerState::Idle => None,
            SchedulerState::Scheduled => Some(self.due_ms.unwrap_or(now_ms).max(now_ms)),
            SchedulerState::Running => Some(now_ms),
        }
    }

    /// Asks for a reconciliation.
    ///
    /// From `Idle` the request becomes due after the throttle interval since the last run.
    /// While `Scheduled` it is folded into the pending one. While `Running` the current plan is
    /// recomputed from the latest range on the next step. Returns `true` if this call moved the
    /// scheduler out of `Idle`.
    pub fn request(&mut self, now_ms: u64) -> bool {
        match self.state {
            SchedulerState::Idle => {
                let due = self
                    .last_run_ms
                    .map_or(now_ms, |last| last.saturating_add(self.min_interval_ms))
                    .max(now_ms);
                self.state = SchedulerState::Scheduled;
                self.due_ms = Some(due);
                vtrace!(now_ms, due_ms = due, "reconciliation scheduled");
                true
            }
            SchedulerState::Scheduled => {
                self.stats.coalesced += 1;
                false
            }
            SchedulerState::Running => {
                self.stats.coalesced += 1;
                self.replan = true;
                false
            }
        }
    }

    /// Drops any pending or in-flight reconciliation. Already bound handles stay bound.
    pub fn cancel(&mut self) {
        if self.state != SchedulerState::Idle {
            vtrace!(state = ?self.state, "reconciliation cancelled");
        }
        self.state = SchedulerState::Idle;
        self.due_ms = None;
        self.plan = None;
        self.replan = false;
    }

    /// Cancels and forgets everything tied to the previous dataset.
    pub fn reset(&mut self) {
        self.cancel();
        self.failed.clear();
        self.last_failures.clear();
    }

    /// Runs one step if a reconciliation is due, touching at most `budget` indices.
    pub fn step<C, I>(
        &mut self,
        cx: &mut ReconcileContext<'_, C, I>,
        now_ms: u64,
        budget: usize,
    ) -> StepOutcome
    where
        C: Container,
        I: RenderableItem<C>,
    {
        match self.state {
            SchedulerState::Idle => return StepOutcome::Idle,
            SchedulerState::Scheduled => {
                if let Some(due_ms) = self.due_ms.filter(|&due| now_ms < due) {
                    return StepOutcome::Waiting { due_ms };
                }
                self.begin(now_ms);
            }
            SchedulerState::Running => {}
        }
        self.advance(cx, now_ms, budget)
    }

    /// Runs a reconciliation to completion right now, ignoring the throttle.
    pub fn run_now<C, I>(
        &mut self,
        cx: &mut ReconcileContext<'_, C, I>,
        now_ms: u64,
        budget: usize,
    ) -> VisibleRange
    where
        C: Container,
        I: RenderableItem<C>,
    {
        match self.state {
            SchedulerState::Idle | SchedulerState::Scheduled => self.begin(now_ms),
            // Pick up the newest range instead of finishing a stale plan.
            SchedulerState::Running => self.replan = true,
        }
        loop {
            if let StepOutcome::Completed(range) = self.advance(cx, now_ms, budget) {
                return range;
            }
        }
    }

    fn begin(&mut self, now_ms: u64) {
        self.state = SchedulerState::Running;
        self.due_ms = None;
        self.started_ms = now_ms;
        self.plan = None;
        self.replan = false;
        self.last_failures.clear();
    }

    fn advance<C, I>(
        &mut self,
        cx: &mut ReconcileContext<'_, C, I>,
        now_ms: u64,
        budget: usize,
    ) -> StepOutcome
    where
        C: Container,
        I: RenderableItem<C>,
    {
        let stale = self
            .plan
            .as_ref()
            .is_some_and(|plan| plan.generation != cx.generation);
        if stale {
            vdebug!(generation = cx.generation, "discarding plan from a previous dataset");
        }
        if self.plan.is_none() || self.replan || stale {
            self.replan = false;
            self.plan = Some(self.make_plan(cx));
        }
        let Some(mut plan) = self.plan.take() else {
            return StepOutcome::Idle;
        };

        self.stats.steps += 1;
        let mut remaining = budget.max(1);
        while remaining > 0 {
            if let Some(index) = plan.remove.pop_front() {
                self.remove(cx, index);
            } else if let Some(index) = plan.add.pop_front() {
                self.add(cx, index);
            } else if let Some(index) = plan.update.pop_front() {
                self.update(cx, index);
            } else {
                break;
            }
            remaining -= 1;
        }

        if !plan.is_drained() {
            vtrace!(left = plan.len(), "reconciliation step done");
            self.plan = Some(plan);
            return StepOutcome::Progress;
        }

        self.state = SchedulerState::Idle;
        self.last_run_ms = Some(now_ms);
        self.stats.reconciliations += 1;
        self.stats
            .record_duration(now_ms.saturating_sub(self.started_ms));
        vdebug!(
            start = plan.target.start_index,
            end = plan.target.end_index,
            rendered = cx.pool.bound_len(),
            pooled = cx.pool.pooled_len(),
            failures = self.last_failures.len(),
            duration_ms = self.stats.last_duration_ms,
            "reconciliation complete"
        );
        StepOutcome::Completed(plan.target)
    }

    fn make_plan<C, I>(&mut self, cx: &ReconcileContext<'_, C, I>) -> Plan
    where
        C: Container,
    {
        let target = cx.target_range();
        // A failed index is retried once it has left the range and come back.
        self.failed.retain(|&index| target.contains(index));

        let mut remove = VecDeque::new();
        let mut update = VecDeque::new();
        for index in cx.pool.bound_indices() {
            if target.contains(index) {
                update.push_back(index);
            } else {
                remove.push_back(index);
            }
        }

        let loaded_end = target.end_index.min(cx.items.len());
        let add = (target.start_index..loaded_end)
            .filter(|index| !cx.pool.is_bound(*index) && !self.failed.contains(index))
            .collect();

        Plan {
            generation: cx.generation,
            target,
            remove,
            add,
            update,
        }
    }

    fn remove<C, I>(&mut self, cx: &mut ReconcileContext<'_, C, I>, index: usize)
    where
        C: Container,
        I: RenderableItem<C>,
    {
        let Some(handle) = cx.pool.unbind(index) else {
            return;
        };
        if let Some(error) = cx
            .pool
            .release(index, cx.items.get(index), handle, cx.container)
        {
            self.record(index, Phase::Destroy, error);
        }
        self.stats.removed += 1;
    }

    fn add<C, I>(&mut self, cx: &mut ReconcileContext<'_, C, I>, index: usize)
    where
        C: Container,
        I: RenderableItem<C>,
    {
        if cx.pool.is_bound(index) {
            return;
        }
        let Some(item) = cx.items.get(index) else {
            return;
        };

        let is_selected = cx.selection.is_selected(index);
        let mut handle = match cx.pool.acquire(cx.container, item, is_selected) {
            Ok(handle) => handle,
            Err(AcquireError::Create(error)) => {
                vwarn!(index, error = %error, "create failed; leaving index unrendered");
                self.failed.insert(index);
                self.record(index, Phase::Create, error);
                return;
            }
            Err(AcquireError::Update { handle, error }) => {
                vwarn!(index, error = %error, "update failed; showing placeholder");
                self.record(index, Phase::Update, error);
                handle
            }
        };

        let placement = Placement {
            index,
            top: cx.metrics.item_top(index),
            height: cx.metrics.item_height,
        };
        cx.container.place(&mut handle, placement);
        cx.pool.bind(index, handle);
        self.stats.added += 1;
    }

    fn update<C, I>(&mut self, cx: &mut ReconcileContext<'_, C, I>, index: usize)
    where
        C: Container,
        I: RenderableItem<C>,
    {
        let is_selected = cx.selection.is_selected(index);
        let (Some(item), Some(handle)) = (cx.items.get(index), cx.pool.bound_mut(index)) else {
            return;
        };
        if let Err(error) = item.update(handle, is_selected) {
            vwarn!(index, error = %error, "update failed; showing placeholder");
            cx.container.blank(handle);
            self.record(index, Phase::Update, error);
        }
        self.stats.updated += 1;
    }

    fn record(&mut self, index: usize, phase: Phase, error: ItemError) {
        self.stats.failures += 1;
        self.last_failures.push(RenderFailure {
            index,
            phase,
            error,
        });
    }

    /// Records failures that happened outside a reconciliation (selection repaints, refreshes).
    pub(crate) fn record_failures(&mut self, failures: impl IntoIterator<Item = RenderFailure>) {
        for failure in failures {
            self.record(failure.index, failure.phase, failure.error);
        }
    }
}

impl Default for RenderScheduler {
    fn default() -> Self {
        Self::new(1)
    }
}
