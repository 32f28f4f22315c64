//! A headless, recycling virtual list engine.
//!
//! For input normalization, a frame-driven controller and a text-row binding, see the
//! `virtual-list-adapter` crate.
//!
//! The engine renders huge uniform-height lists by binding a small, bounded set of host handles
//! to the indices that intersect the viewport:
//! - [`visible_range`] maps a scroll position to a window of indices;
//! - [`RecyclingPool`] hands detached handles out again instead of creating new ones;
//! - [`RenderScheduler`] reconciles the rendered set with that window in bounded steps;
//! - [`ScrollController`] and [`SelectionManager`] turn input into state;
//! - [`VirtualList`] ties them together and is what a host talks to.
//!
//! It is UI-agnostic. A toolkit layer is expected to provide:
//! - a [`Container`] that can place, hide and discard handles
//! - items implementing [`RenderableItem`]
//! - viewport height, input, and the current time in milliseconds
#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

#[cfg(test)]
extern crate std;

#[macro_use]
mod macros;

#[cfg(feature = "std")]
mod batch;
mod error;
mod item;
mod list;
mod options;
mod pool;
mod scheduler;
mod scroll;
mod selection;
mod state;
mod types;
mod viewport;


#[cfg(feature = "std")]
pub use batch::{BatchConfig, BatchPreparer, Preparable, PreparedBatch};
pub use error::{AcquireError, ItemError, Phase, RenderFailure};
pub use item::{Container, RenderableItem};
pub use list::VirtualList;
pub use options::{
    OnActivateCallback, OnLoadMoreCallback, OnSelectCallback, OnViewportChangeCallback,
    VirtualListOptions,
};
pub use pool::{PoolStats, RecyclingPool};
pub use scheduler::{ReconcileContext, RenderScheduler, RenderStats, SchedulerState, StepOutcome};
pub use scroll::{ScrollConfig, ScrollController, ScrollInput, ScrollState};
pub use selection::{SelectionChange, SelectionManager, SelectionState};
pub use state::ListSnapshot;
pub use types::{Navigation, Placement, ScrollDirection, VisibleRange};
pub use viewport::{ListMetrics, visible_range, visible_range_for_offset};
