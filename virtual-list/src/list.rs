#[cfg(feature = "std")]
use alloc::boxed::Box;
use alloc::vec::Vec;

#[cfg(feature = "std")]
use crate::batch::{BatchConfig, BatchPreparer, Preparable, Preparation};
use crate::scheduler::ReconcileContext;
use crate::{
    Container, ListMetrics, ListSnapshot, Navigation, Phase, Placement, PoolStats, RecyclingPool,
    RenderFailure, RenderScheduler, RenderStats, RenderableItem, SchedulerState, ScrollController,
    ScrollInput, ScrollState, SelectionManager, StepOutcome, VirtualListOptions, VisibleRange,
};

/// A virtualized, recycling list.
///
/// The list owns the host's [`Container`], the loaded items, and every handle. It renders only
/// the rows intersecting the viewport plus a buffer, reusing a bounded pool of handles as rows
/// scroll in and out.
///
/// It never reads a clock or blocks. Drive it from your event loop:
/// - feed input through [`VirtualList::scroll`], [`VirtualList::navigate`],
///   [`VirtualList::press_at`] and [`VirtualList::set_viewport_height`];
/// - call [`VirtualList::tick`] with the current time and call again at the returned wake-up
///   time (or on the next frame).
///
/// Item failures never surface as errors; see [`VirtualList::last_failures`].
pub struct VirtualList<C: Container, I> {
    options: VirtualListOptions,
    container: C,
    items: Vec<I>,
    total_count: usize,
    viewport_height: u32,

    scroll: ScrollController,
    selection: SelectionManager,
    pool: RecyclingPool<C::Handle>,
    scheduler: RenderScheduler,

    generation: u64,
    clock_ms: u64,
    shut_down: bool,
    reported_range: Option<VisibleRange>,

    #[cfg(feature = "std")]
    preparer: Option<Box<dyn Preparation<I>>>,
}

impl<C, I> VirtualList<C, I>
where
    C: Container,
    I: RenderableItem<C>,
{
    pub fn new(container: C, options: VirtualListOptions) -> Self {
        vdebug!(
            item_height = options.item_height,
            buffer_items = options.buffer_items,
            max_pool_size = options.max_pool_size,
            "VirtualList::new"
        );
        Self {
            scroll: ScrollController::new(options.scroll_config()),
            selection: SelectionManager::new(),
            pool: RecyclingPool::new(options.max_pool_size),
            scheduler: RenderScheduler::new(options.min_update_interval_ms),
            options,
            container,
            items: Vec::new(),
            total_count: 0,
            viewport_height: 0,
            generation: 0,
            clock_ms: 0,
            shut_down: false,
            reported_range: None,
            #[cfg(feature = "std")]
            preparer: None,
        }
    }

    pub fn options(&self) -> &VirtualListOptions {
        &self.options
    }

    /// Replaces the options.
    ///
    /// A new pool bound takes effect right away. A new row height re-places every bound handle
    /// and re-renders immediately.
    pub fn set_options(&mut self, options: VirtualListOptions) {
        if self.shut_down {
            return;
        }
        let relayout = options.item_height != self.options.item_height;
        self.pool
            .set_max_pool_size(options.max_pool_size, &mut self.container);
        self.scroll.set_config(options.scroll_config());
        self.scheduler
            .set_min_interval_ms(options.min_update_interval_ms);
        self.options = options;
        vtrace!(
            item_height = self.options.item_height,
            buffer_items = self.options.buffer_items,
            "VirtualList::set_options"
        );

        if relayout {
            let metrics = self.metrics();
            for (index, handle) in self.pool.iter_bound_mut() {
                self.container.place(handle, placement(&metrics, index));
            }
            self.scroll.clamp_to(&metrics);
            self.container.set_content_height(metrics.total_height());
            self.schedule_update(true);
        }
    }

    /// Clones the current options, applies `f`, then delegates to `set_options`.
    pub fn update_options(&mut self, f: impl FnOnce(&mut VirtualListOptions)) {
        let mut next = self.options.clone();
        f(&mut next);
        self.set_options(next);
    }

    pub fn metrics(&self) -> ListMetrics {
        ListMetrics::new(
            self.total_count,
            self.options.item_height,
            self.viewport_height,
        )
    }

    // Dataset ----------------------------------------------------------------------------

    /// Replaces the dataset.
    ///
    /// `total_count` is the size of the logical index space; it may exceed `items.len()` when
    /// the rest is loaded later with [`VirtualList::extend_items`]. Smaller values are raised to
    /// `items.len()`.
    ///
    /// Every handle is released and the pool is emptied, scroll goes back to the top, the
    /// selection is cleared, any in-flight reconciliation or batch preparation is cancelled, and
    /// a fresh render is scheduled.
    pub fn set_items(&mut self, items: Vec<I>, total_count: usize) {
        if self.shut_down {
            return;
        }

        self.generation += 1;
        self.scheduler.reset();
        #[cfg(feature = "std")]
        if let Some(preparer) = self.preparer.as_mut() {
            preparer.cancel();
        }
        self.pool.clear_all(&self.items, &mut self.container);

        self.total_count = total_count.max(items.len());
        self.items = items;
        self.scroll.reset();
        self.selection.clear();
        self.reported_range = None;

        if let Some(first) = self.items.first() {
            let height = first.height();
            if height != self.options.item_height {
                vdebug!(
                    item_height = height,
                    configured = self.options.item_height,
                    "item height differs from the configured row height; using the configured one"
                );
            }
        }

        let metrics = self.metrics();
        self.container.set_content_height(metrics.total_height());
        #[cfg(feature = "std")]
        if let Some(preparer) = self.preparer.as_mut() {
            preparer.start(self.generation, 0, &self.items);
        }

        vinfo!(
            generation = self.generation,
            total_count = self.total_count,
            loaded = self.items.len(),
            "dataset replaced"
        );
        self.schedule_update(false);
    }

    /// Appends a page of loaded items, typically in answer to `on_load_more`.
    ///
    /// Scroll position (in pixels) and selection are kept.
    pub fn extend_items(&mut self, more: Vec<I>) {
        if self.shut_down || more.is_empty() {
            return;
        }

        let offset_px = self.scroll.offset(&self.metrics());
        let first_new = self.items.len();
        self.items.extend(more);
        self.total_count = self.total_count.max(self.items.len());

        let metrics = self.metrics();
        self.scroll.relayout(offset_px, &metrics);
        self.container.set_content_height(metrics.total_height());
        #[cfg(feature = "std")]
        if let Some(preparer) = self.preparer.as_mut() {
            preparer.start(self.generation, first_new, &self.items[first_new..]);
        }

        vdebug!(
            appended = self.items.len() - first_new,
            loaded = self.items.len(),
            total_count = self.total_count,
            "items appended"
        );
        self.schedule_update(false);
    }

    pub fn items(&self) -> &[I] {
        &self.items
    }

    pub fn item(&self, index: usize) -> Option<&I> {
        self.items.get(index)
    }

    /// Mutable access to a loaded item. Call [`VirtualList::refresh_item`] afterwards to push
    /// the change to its handle.
    pub fn item_mut(&mut self, index: usize) -> Option<&mut I> {
        self.items.get_mut(index)
    }

    pub fn total_count(&self) -> usize {
        self.total_count
    }

    pub fn loaded_count(&self) -> usize {
        self.items.len()
    }

    /// Incremented by every `set_items` and by `shutdown`.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Forces a re-update of one rendered index.
    ///
    /// An index whose creation failed earlier is retried by the next reconciliation. Returns
    /// `false` when the index is neither rendered nor waiting for such a retry.
    pub fn refresh_item(&mut self, index: usize) -> bool {
        if self.shut_down {
            return false;
        }

        let retry = self.scheduler.forget_failure(index);
        let is_selected = self.selection.is_selected(index);
        if let (Some(item), Some(handle)) = (self.items.get(index), self.pool.bound_mut(index)) {
            if let Err(error) = item.update(handle, is_selected) {
                vwarn!(index, error = %error, "refresh failed; showing placeholder");
                self.container.blank(handle);
                self.scheduler.record_failures([RenderFailure {
                    index,
                    phase: Phase::Update,
                    error,
                }]);
            }
            return true;
        }

        if retry && self.visible_range().contains(index) {
            self.schedule_update(false);
            return true;
        }
        false
    }

    // Viewport and scrolling -------------------------------------------------------------

    pub fn viewport_height(&self) -> u32 {
        self.viewport_height
    }

    /// Applies a new viewport height and re-renders immediately. Returns `false` if unchanged.
    pub fn set_viewport_height(&mut self, viewport_height: u32, now_ms: u64) -> bool {
        if self.shut_down || viewport_height == self.viewport_height {
            return false;
        }
        self.advance_clock(now_ms);
        self.viewport_height = viewport_height;
        let metrics = self.metrics();
        self.scroll.clamp_to(&metrics);
        vdebug!(viewport_height, "viewport resized");
        self.schedule_update(true);
        true
    }

    /// The window of indices that should be rendered right now (buffer included).
    pub fn visible_range(&self) -> VisibleRange {
        self.metrics()
            .visible_range(self.scroll.position(), self.options.buffer_items)
    }

    /// [`VirtualList::visible_range`] as `(start, end)`.
    pub fn visible_indices(&self) -> (usize, usize) {
        self.visible_range().as_tuple()
    }

    /// The rows actually intersecting the viewport, without the buffer.
    pub fn on_screen_range(&self) -> VisibleRange {
        self.metrics().on_screen_range(self.scroll.position())
    }

    pub fn scroll_state(&self) -> ScrollState {
        self.scroll.state()
    }

    pub fn scroll_position(&self) -> f64 {
        self.scroll.position()
    }

    pub fn scroll_offset(&self) -> f64 {
        self.scroll.offset(&self.metrics())
    }

    /// Applies one scroll input and schedules a render if the position moved.
    ///
    /// May fire `on_load_more`. Returns whether the position changed.
    pub fn scroll(&mut self, input: ScrollInput, now_ms: u64) -> bool {
        if self.shut_down {
            return false;
        }
        self.advance_clock(now_ms);
        let metrics = self.metrics();
        let moved = self.scroll.apply(input, &metrics, self.clock_ms);
        self.after_scroll(moved);
        moved
    }

    /// Brings `index` into view with a small margin, unless it is already fully on screen.
    ///
    /// Out-of-range indices are ignored. Returns whether the position changed.
    pub fn scroll_to_index(&mut self, index: usize) -> bool {
        if self.shut_down {
            return false;
        }
        let metrics = self.metrics();
        let moved = self.scroll.scroll_to_index(index, &metrics, self.clock_ms);
        if moved {
            self.schedule_update(false);
        }
        moved
    }

    pub fn scroll_to_end(&mut self) -> bool {
        if self.shut_down {
            return false;
        }
        let metrics = self.metrics();
        let moved = self.scroll.apply(ScrollInput::End, &metrics, self.clock_ms);
        self.after_scroll(moved);
        moved
    }

    /// True when at most `threshold_items` rows remain below the last on-screen row.
    pub fn is_at_bottom(&self, threshold_items: usize) -> bool {
        self.scroll.is_near_bottom(threshold_items, &self.metrics())
    }

    fn after_scroll(&mut self, moved: bool) {
        if !moved {
            return;
        }
        self.schedule_update(false);

        let Some(on_load_more) = self.options.on_load_more.clone() else {
            return;
        };
        let metrics = self.metrics();
        if self
            .scroll
            .should_load_more(&metrics, self.items.len(), self.clock_ms)
        {
            vdebug!(
                loaded = self.items.len(),
                total_count = self.total_count,
                "requesting more items"
            );
            on_load_more();
        }
    }

    // Selection and activation -----------------------------------------------------------

    pub fn selected_index(&self) -> Option<usize> {
        self.selection.selected()
    }

    pub fn selected_item(&self) -> Option<&I> {
        self.selection.selected().and_then(|index| self.items.get(index))
    }

    /// Selects `index`, updating the handles of the old and new selection right away.
    ///
    /// Returns `false` for an out-of-range index or when `index` is already selected; neither
    /// touches a handle or fires `on_select`.
    pub fn set_selection(&mut self, index: usize) -> bool {
        if self.shut_down {
            return false;
        }
        let change = self.selection.select(index, self.total_count);
        if !change.is_changed() {
            return false;
        }

        let failures =
            self.selection
                .repaint(change, &mut self.pool, &self.items, &mut self.container);
        self.scheduler.record_failures(failures);
        vtrace!(index, "selection changed");
        if let Some(on_select) = &self.options.on_select {
            on_select(index);
        }
        true
    }

    /// Drops the selection. Returns `false` if nothing was selected.
    pub fn clear_selection(&mut self) -> bool {
        if self.shut_down {
            return false;
        }
        let Some(previous) = self.selection.clear() else {
            return false;
        };
        if let (Some(item), Some(handle)) = (self.items.get(previous), self.pool.bound_mut(previous))
        {
            if let Err(error) = item.update(handle, false) {
                vwarn!(index = previous, error = %error, "selection update failed");
                self.container.blank(handle);
                self.scheduler.record_failures([RenderFailure {
                    index: previous,
                    phase: Phase::Update,
                    error,
                }]);
            }
        }
        true
    }

    /// Maps a viewport-relative y coordinate to the index under it.
    pub fn index_at(&self, y: f64) -> Option<usize> {
        if !(y >= 0.0) {
            return None;
        }
        let metrics = self.metrics();
        metrics.index_at_offset(self.scroll.offset(&metrics) + y)
    }

    /// Selects the row under a viewport-relative y coordinate.
    pub fn press_at(&mut self, y: f64) -> Option<usize> {
        if self.shut_down {
            return None;
        }
        let index = self.index_at(y)?;
        self.set_selection(index);
        Some(index)
    }

    /// Selects and activates the row under a viewport-relative y coordinate.
    pub fn activate_at(&mut self, y: f64) -> Option<usize> {
        let index = self.press_at(y)?;
        self.activate(index);
        Some(index)
    }

    /// Fires `on_activate` for `index`. Returns `false` for an out-of-range index.
    pub fn activate(&mut self, index: usize) -> bool {
        if self.shut_down || index >= self.total_count {
            return false;
        }
        vtrace!(index, "row activated");
        if let Some(on_activate) = &self.options.on_activate {
            on_activate(index);
        }
        true
    }

    /// Moves the selection and scrolls it into view. Returns the newly targeted index.
    pub fn navigate(&mut self, navigation: Navigation, now_ms: u64) -> Option<usize> {
        if self.shut_down {
            return None;
        }
        self.advance_clock(now_ms);
        let metrics = self.metrics();
        let target =
            self.selection
                .navigation_target(navigation, self.total_count, metrics.rows_per_page())?;
        self.set_selection(target);
        self.scroll_to_index(target);
        Some(target)
    }

    // Scheduling -------------------------------------------------------------------------

    /// Requests a reconciliation.
    ///
    /// With `immediate` it runs to completion before returning. Otherwise it is deferred to a
    /// later [`VirtualList::tick`], and requests within `min_update_interval_ms` of the last run
    /// collapse into one.
    pub fn schedule_update(&mut self, immediate: bool) {
        if self.shut_down {
            return;
        }
        if immediate {
            let budget = self.step_budget();
            let now_ms = self.clock_ms;
            let (scheduler, mut cx) = self.reconcile_parts();
            let range = scheduler.run_now(&mut cx, now_ms, budget);
            self.report_range(range);
        } else {
            self.scheduler.request(self.clock_ms);
        }
    }

    /// Advances the host clock and runs one scheduler step if one is due.
    ///
    /// Returns when the list wants to be ticked again, or `None` when it is idle.
    pub fn tick(&mut self, now_ms: u64) -> Option<u64> {
        if self.shut_down {
            return None;
        }
        self.advance_clock(now_ms);
        #[cfg(feature = "std")]
        self.apply_prepared();

        let now_ms = self.clock_ms;
        if self.scheduler.is_due(now_ms) {
            let budget = self.step_budget();
            let (scheduler, mut cx) = self.reconcile_parts();
            if let StepOutcome::Completed(range) = scheduler.step(&mut cx, now_ms, budget) {
                self.report_range(range);
            }
        }

        let wakeup = self.scheduler.next_wakeup(now_ms);
        #[cfg(feature = "std")]
        if wakeup.is_none() && self.is_preparing() {
            return Some(now_ms.saturating_add(1));
        }
        wakeup
    }

    /// Runs scheduler steps until idle. Mostly useful in tests and for hosts that render
    /// off-screen.
    pub fn flush(&mut self) {
        while !self.shut_down && self.scheduler.state() != SchedulerState::Idle {
            let now_ms = self
                .scheduler
                .next_wakeup(self.clock_ms)
                .unwrap_or(self.clock_ms);
            self.tick(now_ms);
        }
    }

    pub fn scheduler_state(&self) -> SchedulerState {
        self.scheduler.state()
    }

    pub fn scheduler(&self) -> &RenderScheduler {
        &self.scheduler
    }

    pub fn stats(&self) -> RenderStats {
        self.scheduler.stats()
    }

    /// Item failures recorded by the most recent reconciliation, plus any selection or refresh
    /// failures since.
    pub fn last_failures(&self) -> &[RenderFailure] {
        self.scheduler.last_failures()
    }

    fn step_budget(&self) -> usize {
        self.options
            .step_budget
            .unwrap_or_else(|| self.metrics().window_capacity(self.options.buffer_items))
            .max(1)
    }

    fn reconcile_parts(&mut self) -> (&mut RenderScheduler, ReconcileContext<'_, C, I>) {
        let metrics = self.metrics();
        let cx = ReconcileContext {
            container: &mut self.container,
            items: &self.items,
            pool: &mut self.pool,
            selection: &self.selection,
            metrics,
            scroll_position: self.scroll.position(),
            buffer_items: self.options.buffer_items,
            generation: self.generation,
        };
        (&mut self.scheduler, cx)
    }

    fn report_range(&mut self, range: VisibleRange) {
        if self.reported_range == Some(range) {
            return;
        }
        self.reported_range = Some(range);
        if let Some(on_viewport_change) = &self.options.on_viewport_change {
            on_viewport_change(range.start_index, range.end_index);
        }
    }

    fn advance_clock(&mut self, now_ms: u64) {
        self.clock_ms = self.clock_ms.max(now_ms);
    }

    // Handles and diagnostics ------------------------------------------------------------

    pub fn pool(&self) -> &RecyclingPool<C::Handle> {
        &self.pool
    }

    pub fn pool_stats(&self) -> PoolStats {
        self.pool.stats()
    }

    /// Bound handles in ascending index order.
    pub fn rendered(&self) -> impl Iterator<Item = (usize, &C::Handle)> {
        self.pool.iter_bound()
    }

    pub fn rendered_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.pool.bound_indices()
    }

    pub fn container(&self) -> &C {
        &self.container
    }

    pub fn container_mut(&mut self) -> &mut C {
        &mut self.container
    }

    pub fn snapshot(&self) -> ListSnapshot {
        ListSnapshot {
            generation: self.generation,
            total_count: self.total_count,
            loaded_count: self.items.len(),
            viewport_height: self.viewport_height,
            visible: self.visible_range(),
            scroll: self.scroll.state(),
            selection: self.selection.state(),
            rendered: self.pool.bound_len(),
            pooled: self.pool.pooled_len(),
            scheduler: self.scheduler.state(),
            render_stats: self.scheduler.stats(),
            pool_stats: self.pool.stats(),
            shut_down: self.shut_down,
        }
    }

    // Teardown ---------------------------------------------------------------------------

    /// Cancels pending work, releases every handle and empties the pool.
    ///
    /// Every later call on the list is a no-op.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;
        self.generation += 1;
        self.scheduler.cancel();
        #[cfg(feature = "std")]
        if let Some(mut preparer) = self.preparer.take() {
            preparer.cancel();
        }
        self.pool.clear_all(&self.items, &mut self.container);
        vinfo!(generation = self.generation, "virtual list shut down");
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }
}

#[cfg(feature = "std")]
impl<C, I> VirtualList<C, I>
where
    C: Container,
    I: RenderableItem<C> + Preparable + 'static,
{
    /// Prepares items on background threads from now on, starting with the loaded ones.
    ///
    /// Prepared values are handed to [`Preparable::accept`] during [`VirtualList::tick`]; values
    /// computed for a replaced dataset are dropped.
    pub fn enable_batch_preparation(&mut self, config: BatchConfig) {
        if self.shut_down {
            return;
        }
        if let Some(mut previous) = self.preparer.take() {
            previous.cancel();
        }
        let mut preparer = BatchPreparer::<I::Prepared>::new(config);
        Preparation::<I>::start(&mut preparer, self.generation, 0, &self.items);
        self.preparer = Some(Box::new(preparer));
    }
}

#[cfg(feature = "std")]
impl<C: Container, I> VirtualList<C, I> {
    pub fn disable_batch_preparation(&mut self) {
        if let Some(mut preparer) = self.preparer.take() {
            preparer.cancel();
        }
    }

    /// Whether background preparation still has batches in flight.
    pub fn is_preparing(&self) -> bool {
        self.preparer
            .as_ref()
            .is_some_and(|preparer| preparer.is_processing())
    }

    fn apply_prepared(&mut self) {
        let Some(preparer) = self.preparer.as_mut() else {
            return;
        };
        let applied = preparer.apply(self.generation, &mut self.items);
        if applied > 0 {
            vtrace!(applied, "prepared items applied");
        }
    }
}

impl<C: Container, I> core::fmt::Debug for VirtualList<C, I> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("VirtualList")
            .field("generation", &self.generation)
            .field("total_count", &self.total_count)
            .field("loaded", &self.items.len())
            .field("viewport_height", &self.viewport_height)
            .field("scroll", &self.scroll.state())
            .field("selection", &self.selection.selected())
            .field("pool", &self.pool)
            .field("scheduler", &self.scheduler.state())
            .field("shut_down", &self.shut_down)
            .finish_non_exhaustive()
    }
}

fn placement(metrics: &ListMetrics, index: usize) -> Placement {
    Placement {
        index,
        top: metrics.item_top(index),
        height: metrics.item_height,
    }
}
