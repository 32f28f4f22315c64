use crate::viewport::sanitize_position;
use crate::{ListMetrics, ScrollDirection};

/// Where the list is scrolled to and how it got there.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScrollState {
    /// Normalized offset of the viewport's top edge, `0.0..=1.0` of the content height.
    pub position: f64,
    pub direction: ScrollDirection,
    /// Change of `position` per second over the last update.
    pub velocity: f64,
    pub last_update_ms: Option<u64>,
}

/// A scroll request, already decoded from whatever the toolkit delivered.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ScrollInput {
    /// Wheel notches; positive scrolls down.
    Wheel(i32),
    /// Content pixels; positive scrolls down.
    Pixels(i64),
    /// Whole rows; positive scrolls down.
    Lines(i64),
    /// Whole viewports; positive scrolls down.
    Pages(i64),
    Home,
    End,
    /// Absolute normalized position, e.g. from dragging a scrollbar thumb.
    MoveTo(f64),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScrollConfig {
    pub wheel_lines: u32,
    pub load_more_threshold: usize,
    pub load_more_cooldown_ms: u64,
    pub scroll_margin_items: usize,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            wheel_lines: 1,
            load_more_threshold: 10,
            load_more_cooldown_ms: 500,
            scroll_margin_items: 1,
        }
    }
}

/// Turns scroll input into a clamped normalized position, tracking direction and velocity, and
/// decides when the host should be asked for more data.
#[derive(Clone, Debug, Default)]
pub struct ScrollController {
    state: ScrollState,
    config: ScrollConfig,
    last_load_ms: Option<u64>,
}

impl ScrollController {
    pub fn new(config: ScrollConfig) -> Self {
        Self {
            state: ScrollState::default(),
            config,
            last_load_ms: None,
        }
    }

    pub fn state(&self) -> ScrollState {
        self.state
    }

    pub fn position(&self) -> f64 {
        self.state.position
    }

    pub fn direction(&self) -> ScrollDirection {
        self.state.direction
    }

    pub fn velocity(&self) -> f64 {
        self.state.velocity
    }

    pub fn config(&self) -> ScrollConfig {
        self.config
    }

    pub fn set_config(&mut self, config: ScrollConfig) {
        self.config = config;
    }

    /// Back to the top with no motion history (new dataset).
    pub fn reset(&mut self) {
        self.state = ScrollState::default();
        self.last_load_ms = None;
    }

    /// The viewport's top edge in content pixels.
    pub fn offset(&self, metrics: &ListMetrics) -> f64 {
        metrics.offset_for_position(self.state.position)
    }

    /// Moves to `position`, clamped to `0.0..=metrics.max_position()`.
    ///
    /// Returns `false` when the clamped position equals the current one; direction and
    /// velocity are left untouched in that case.
    pub fn set_position(&mut self, position: f64, metrics: &ListMetrics, now_ms: u64) -> bool {
        let target = sanitize_position(position).min(metrics.max_position());
        let previous = self.state.position;
        if target == previous {
            return false;
        }

        let elapsed_ms = self
            .state
            .last_update_ms
            .map_or(0, |last| now_ms.saturating_sub(last))
            .max(1);
        self.state.velocity = (target - previous) / (elapsed_ms as f64 / 1000.0);
        self.state.direction = if target > previous {
            ScrollDirection::Down
        } else {
            ScrollDirection::Up
        };
        self.state.position = target;
        self.state.last_update_ms = Some(now_ms);
        vtrace!(
            position = target,
            velocity = self.state.velocity,
            "scroll position updated"
        );
        true
    }

    pub fn scroll_by_pixels(&mut self, delta: f64, metrics: &ListMetrics, now_ms: u64) -> bool {
        let offset = self.offset(metrics) + delta;
        let target = metrics.position_for_offset(offset);
        self.set_position(target, metrics, now_ms)
    }

    /// Applies one decoded input. Returns whether the position changed.
    pub fn apply(&mut self, input: ScrollInput, metrics: &ListMetrics, now_ms: u64) -> bool {
        let row = metrics.item_height as f64;
        match input {
            ScrollInput::Wheel(notches) => {
                let delta = notches as f64 * self.config.wheel_lines as f64 * row;
                self.scroll_by_pixels(delta, metrics, now_ms)
            }
            ScrollInput::Pixels(delta) => self.scroll_by_pixels(delta as f64, metrics, now_ms),
            ScrollInput::Lines(lines) => self.scroll_by_pixels(lines as f64 * row, metrics, now_ms),
            ScrollInput::Pages(pages) => {
                let page = metrics.rows_per_page() as f64 * row;
                self.scroll_by_pixels(pages as f64 * page, metrics, now_ms)
            }
            ScrollInput::Home => self.set_position(0.0, metrics, now_ms),
            ScrollInput::End => self.set_position(1.0, metrics, now_ms),
            ScrollInput::MoveTo(position) => self.set_position(position, metrics, now_ms),
        }
    }

    /// Pulls the position back inside the scrollable range after the content or viewport
    /// shrank. Direction and velocity are not touched: this is not user motion.
    pub fn clamp_to(&mut self, metrics: &ListMetrics) -> bool {
        let max = metrics.max_position();
        if self.state.position > max {
            self.state.position = max;
            return true;
        }
        false
    }

    /// Keeps the viewport's top edge at `offset_px` after the content height changed (rows were
    /// appended). Not user motion: direction and velocity are kept.
    pub fn relayout(&mut self, offset_px: f64, metrics: &ListMetrics) {
        self.state.position = metrics
            .position_for_offset(offset_px)
            .min(metrics.max_position());
    }

    /// True when at most `threshold_items` rows remain below the last on-screen row.
    ///
    /// Always false before the viewport is laid out.
    pub fn is_near_bottom(&self, threshold_items: usize, metrics: &ListMetrics) -> bool {
        self.is_near_end_of(metrics.total_count, threshold_items, metrics)
    }

    /// Like [`ScrollController::is_near_bottom`], but measured against the first `loaded_count`
    /// rows instead of the whole index space.
    pub fn is_near_end_of(
        &self,
        loaded_count: usize,
        threshold_items: usize,
        metrics: &ListMetrics,
    ) -> bool {
        if !metrics.is_laid_out() {
            return false;
        }
        let visible_bottom_index = metrics.on_screen_range(self.state.position).end_index;
        loaded_count.saturating_sub(visible_bottom_index) <= threshold_items
    }

    /// Decides whether to fire the host's load-more callback now.
    ///
    /// Fires only while scrolling down, within `load_more_threshold` rows of the end of the
    /// `loaded_count` loaded rows, and at most once per cooldown window. A `true` result starts a
    /// new cooldown window.
    pub fn should_load_more(
        &mut self,
        metrics: &ListMetrics,
        loaded_count: usize,
        now_ms: u64,
    ) -> bool {
        if self.state.direction != ScrollDirection::Down {
            return false;
        }
        if let Some(last) = self.last_load_ms {
            if now_ms.saturating_sub(last) < self.config.load_more_cooldown_ms {
                return false;
            }
        }
        if !self.is_near_end_of(loaded_count, self.config.load_more_threshold, metrics) {
            return false;
        }
        self.last_load_ms = Some(now_ms);
        true
    }

    /// Scrolls the minimum amount needed to show row `index` fully, plus the configured margin.
    ///
    /// A row that is already fully on screen, an out-of-range index, or a viewport that has not
    /// been laid out leave the position alone. Returns whether the position changed.
    pub fn scroll_to_index(&mut self, index: usize, metrics: &ListMetrics, now_ms: u64) -> bool {
        if index >= metrics.total_count || !metrics.is_laid_out() {
            return false;
        }

        let row = metrics.item_height as f64;
        let item_top = metrics.item_top(index) as f64;
        let item_bottom = item_top + row;
        let view_top = self.offset(metrics);
        let view_bottom = view_top + metrics.viewport_height as f64;
        if view_top <= item_top && item_bottom <= view_bottom {
            return false;
        }

        let margin = self.config.scroll_margin_items as f64 * row;
        let target = if item_top < view_top {
            item_top - margin
        } else {
            item_bottom + margin - metrics.viewport_height as f64
        };
        let target = if target > 0.0 { target } else { 0.0 };
        self.set_position(metrics.position_for_offset(target), metrics, now_ms)
    }
}
