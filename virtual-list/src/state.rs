use crate::{PoolStats, RenderStats, SchedulerState, ScrollState, SelectionState, VisibleRange};

/// A serializable diagnostics snapshot of a [`crate::VirtualList`].
///
/// With `feature = "serde"`, this type implements `Serialize`/`Deserialize`. The list never
/// restores itself from one; it exists for inspection and debug dumps.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ListSnapshot {
    pub generation: u64,
    pub total_count: usize,
    pub loaded_count: usize,
    pub viewport_height: u32,
    pub visible: VisibleRange,
    pub scroll: ScrollState,
    pub selection: SelectionState,
    pub rendered: usize,
    pub pooled: usize,
    pub scheduler: SchedulerState,
    pub render_stats: RenderStats,
    pub pool_stats: PoolStats,
    pub shut_down: bool,
}
