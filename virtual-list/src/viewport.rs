//! Scroll position → visible index window.
//!
//! Everything here is pure. Positions are normalized (`0.0..=1.0` of the total content
//! height), offsets are content-space pixels.

use crate::VisibleRange;

/// The geometry a visible range is computed from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ListMetrics {
    pub total_count: usize,
    pub item_height: u32,
    /// Zero until the host has laid the viewport out.
    pub viewport_height: u32,
}

impl ListMetrics {
    pub fn new(total_count: usize, item_height: u32, viewport_height: u32) -> Self {
        Self {
            total_count,
            item_height,
            viewport_height,
        }
    }

    pub fn is_laid_out(&self) -> bool {
        self.viewport_height > 0 && self.item_height > 0
    }

    pub fn total_height(&self) -> u64 {
        (self.total_count as u64).saturating_mul(self.item_height as u64)
    }

    /// The largest pixel offset that still fills the viewport.
    pub fn max_offset(&self) -> u64 {
        self.total_height()
            .saturating_sub(self.viewport_height as u64)
    }

    /// The largest normalized position that still fills the viewport.
    pub fn max_position(&self) -> f64 {
        let total = self.total_height();
        if total == 0 {
            return 0.0;
        }
        self.max_offset() as f64 / total as f64
    }

    pub fn offset_for_position(&self, position: f64) -> f64 {
        sanitize_position(position) * self.total_height() as f64
    }

    pub fn position_for_offset(&self, offset: f64) -> f64 {
        let total = self.total_height();
        if total == 0 || !(offset > 0.0) {
            return 0.0;
        }
        offset / total as f64
    }

    pub fn item_top(&self, index: usize) -> u64 {
        (index as u64).saturating_mul(self.item_height as u64)
    }

    /// Whole rows that fit in the viewport (at least one once laid out).
    pub fn rows_per_page(&self) -> usize {
        if !self.is_laid_out() {
            return 0;
        }
        ((self.viewport_height / self.item_height) as usize).max(1)
    }

    /// Upper bound on `end - start` for any range computed with `buffer_items`.
    pub fn window_capacity(&self, buffer_items: usize) -> usize {
        if !self.is_laid_out() {
            return 0;
        }
        let rows = self.viewport_height.div_ceil(self.item_height) as usize;
        rows.saturating_add(1)
            .saturating_add(buffer_items.saturating_mul(2))
    }

    /// Maps a content-space pixel offset to the index whose row contains it.
    pub fn index_at_offset(&self, offset: f64) -> Option<usize> {
        if self.item_height == 0 || !(offset >= 0.0) {
            return None;
        }
        let index = floor_to_usize(offset / self.item_height as f64);
        (index < self.total_count).then_some(index)
    }

    /// [`visible_range`] for these metrics.
    pub fn visible_range(&self, scroll_position: f64, buffer_items: usize) -> VisibleRange {
        visible_range(
            scroll_position,
            self.viewport_height,
            self.total_count,
            self.item_height,
            buffer_items,
        )
    }

    /// The strictly visible window (no buffer), used for "is this row on screen" questions.
    pub fn on_screen_range(&self, scroll_position: f64) -> VisibleRange {
        self.visible_range(scroll_position, 0)
    }
}

/// Computes the window of indices to render for a normalized scroll position.
///
/// Returns [`VisibleRange::EMPTY`] for an empty list or a viewport that has not been laid out
/// yet. Never fails: out-of-range or non-finite positions are clamped into `0.0..=1.0`.
pub fn visible_range(
    scroll_position: f64,
    viewport_height: u32,
    total_count: usize,
    item_height: u32,
    buffer_items: usize,
) -> VisibleRange {
    if total_count == 0 || viewport_height == 0 || item_height == 0 {
        return VisibleRange::EMPTY;
    }

    let height = item_height as f64;
    let total_height = total_count as f64 * height;
    let visible_top_px = sanitize_position(scroll_position) * total_height;
    let visible_bottom_px = visible_top_px + viewport_height as f64;

    let first = floor_to_usize(visible_top_px / height);
    let last_exclusive = ceil_to_usize(visible_bottom_px / height);

    let start = first.saturating_sub(buffer_items).min(total_count);
    let end = last_exclusive
        .saturating_add(buffer_items)
        .clamp(start, total_count);

    VisibleRange {
        start_index: start,
        end_index: end,
    }
}

/// [`visible_range`] for a content-space pixel offset instead of a normalized position.
pub fn visible_range_for_offset(
    offset_px: f64,
    viewport_height: u32,
    total_count: usize,
    item_height: u32,
    buffer_items: usize,
) -> VisibleRange {
    let metrics = ListMetrics::new(total_count, item_height, viewport_height);
    visible_range(
        metrics.position_for_offset(offset_px),
        viewport_height,
        total_count,
        item_height,
        buffer_items,
    )
}

pub(crate) fn sanitize_position(position: f64) -> f64 {
    if position > 1.0 {
        1.0
    } else if position > 0.0 {
        position
    } else {
        // Negative, zero and NaN.
        0.0
    }
}

fn floor_to_usize(x: f64) -> usize {
    // `as` truncates toward zero and saturates, which is `floor` for non-negative input.
    x as usize
}

fn ceil_to_usize(x: f64) -> usize {
    let truncated = x as usize;
    if (truncated as f64) < x {
        truncated.saturating_add(1)
    } else {
        truncated
    }
}
