use alloc::sync::Arc;

use crate::ScrollConfig;

/// Fired with the newly selected index.
pub type OnSelectCallback = Arc<dyn Fn(usize) + Send + Sync>;

/// Fired when a row is activated (double click, Enter).
pub type OnActivateCallback = Arc<dyn Fn(usize) + Send + Sync>;

/// Fired near the end of the loaded data while scrolling down, at most once per cooldown.
pub type OnLoadMoreCallback = Arc<dyn Fn() + Send + Sync>;

/// Fired with `(start, end)` after a reconciliation lands on a range different from the last one
/// reported.
pub type OnViewportChangeCallback = Arc<dyn Fn(usize, usize) + Send + Sync>;

/// Configuration for [`crate::VirtualList`].
///
/// Cheap to clone: callbacks live in `Arc`s.
pub struct VirtualListOptions {
    /// Uniform row height in pixels.
    pub item_height: u32,
    /// Extra rows rendered above and below the strictly visible ones.
    pub buffer_items: usize,
    /// Upper bound on detached handles kept for reuse.
    pub max_pool_size: usize,
    /// Throttle window for deferred `schedule_update` calls.
    pub min_update_interval_ms: u64,
    /// Maximum indices touched per scheduler step.
    ///
    /// `None` means one window's worth, `ceil(viewport / item_height) + 1 + 2 * buffer_items`:
    /// a viewport whose top edge falls mid-row shows one partial row more than fit exactly, so a
    /// budget of `viewport / item_height + 2 * buffer_items` would split such a window over two
    /// steps.
    pub step_budget: Option<usize>,
    pub load_more_threshold: usize,
    pub load_more_cooldown_ms: u64,
    /// Rows scrolled per wheel notch.
    pub wheel_lines: u32,
    /// Rows of context kept around a row that `scroll_to_index` had to bring into view.
    pub scroll_margin_items: usize,

    pub on_select: Option<OnSelectCallback>,
    pub on_activate: Option<OnActivateCallback>,
    pub on_load_more: Option<OnLoadMoreCallback>,
    pub on_viewport_change: Option<OnViewportChangeCallback>,
}

impl VirtualListOptions {
    pub fn new(item_height: u32) -> Self {
        Self {
            item_height,
            ..Self::default()
        }
    }

    pub fn with_item_height(mut self, item_height: u32) -> Self {
        self.item_height = item_height;
        self
    }

    pub fn with_buffer_items(mut self, buffer_items: usize) -> Self {
        self.buffer_items = buffer_items;
        self
    }

    pub fn with_max_pool_size(mut self, max_pool_size: usize) -> Self {
        self.max_pool_size = max_pool_size;
        self
    }

    pub fn with_min_update_interval_ms(mut self, min_update_interval_ms: u64) -> Self {
        self.min_update_interval_ms = min_update_interval_ms;
        self
    }

    pub fn with_step_budget(mut self, step_budget: Option<usize>) -> Self {
        self.step_budget = step_budget;
        self
    }

    pub fn with_load_more_threshold(mut self, load_more_threshold: usize) -> Self {
        self.load_more_threshold = load_more_threshold;
        self
    }

    pub fn with_load_more_cooldown_ms(mut self, load_more_cooldown_ms: u64) -> Self {
        self.load_more_cooldown_ms = load_more_cooldown_ms;
        self
    }

    pub fn with_wheel_lines(mut self, wheel_lines: u32) -> Self {
        self.wheel_lines = wheel_lines;
        self
    }

    pub fn with_scroll_margin_items(mut self, scroll_margin_items: usize) -> Self {
        self.scroll_margin_items = scroll_margin_items;
        self
    }

    pub fn with_on_select(mut self, f: impl Fn(usize) + Send + Sync + 'static) -> Self {
        self.on_select = Some(Arc::new(f));
        self
    }

    pub fn with_on_activate(mut self, f: impl Fn(usize) + Send + Sync + 'static) -> Self {
        self.on_activate = Some(Arc::new(f));
        self
    }

    pub fn with_on_load_more(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_load_more = Some(Arc::new(f));
        self
    }

    pub fn with_on_viewport_change(
        mut self,
        f: impl Fn(usize, usize) + Send + Sync + 'static,
    ) -> Self {
        self.on_viewport_change = Some(Arc::new(f));
        self
    }

    pub(crate) fn scroll_config(&self) -> ScrollConfig {
        ScrollConfig {
            wheel_lines: self.wheel_lines,
            load_more_threshold: self.load_more_threshold,
            load_more_cooldown_ms: self.load_more_cooldown_ms,
            scroll_margin_items: self.scroll_margin_items,
        }
    }
}

impl Default for VirtualListOptions {
    fn default() -> Self {
        Self {
            item_height: 56,
            buffer_items: 5,
            max_pool_size: 50,
            min_update_interval_ms: 1,
            step_budget: None,
            load_more_threshold: 10,
            load_more_cooldown_ms: 500,
            wheel_lines: 1,
            scroll_margin_items: 1,
            on_select: None,
            on_activate: None,
            on_load_more: None,
            on_viewport_change: None,
        }
    }
}

impl Clone for VirtualListOptions {
    fn clone(&self) -> Self {
        Self {
            item_height: self.item_height,
            buffer_items: self.buffer_items,
            max_pool_size: self.max_pool_size,
            min_update_interval_ms: self.min_update_interval_ms,
            step_budget: self.step_budget,
            load_more_threshold: self.load_more_threshold,
            load_more_cooldown_ms: self.load_more_cooldown_ms,
            wheel_lines: self.wheel_lines,
            scroll_margin_items: self.scroll_margin_items,
            on_select: self.on_select.clone(),
            on_activate: self.on_activate.clone(),
            on_load_more: self.on_load_more.clone(),
            on_viewport_change: self.on_viewport_change.clone(),
        }
    }
}

impl core::fmt::Debug for VirtualListOptions {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("VirtualListOptions")
            .field("item_height", &self.item_height)
            .field("buffer_items", &self.buffer_items)
            .field("max_pool_size", &self.max_pool_size)
            .field("min_update_interval_ms", &self.min_update_interval_ms)
            .field("step_budget", &self.step_budget)
            .field("load_more_threshold", &self.load_more_threshold)
            .field("load_more_cooldown_ms", &self.load_more_cooldown_ms)
            .field("wheel_lines", &self.wheel_lines)
            .field("scroll_margin_items", &self.scroll_margin_items)
            .field("on_select", &self.on_select.is_some())
            .field("on_activate", &self.on_activate.is_some())
            .field("on_load_more", &self.on_load_more.is_some())
            .field("on_viewport_change", &self.on_viewport_change.is_some())
            .finish()
    }
}
