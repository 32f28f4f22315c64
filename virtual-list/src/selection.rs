use alloc::vec::Vec;

use crate::{Container, Navigation, Phase, RecyclingPool, RenderFailure, RenderableItem};

/// The single selected index, if any.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SelectionState {
    pub selected_index: Option<usize>,
}

/// What a selection request did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SelectionChange {
    /// The index was already selected; nothing was touched.
    Unchanged,
    /// The index is outside `0..total_count`; the request was ignored.
    OutOfRange,
    Changed {
        previous: Option<usize>,
        current: usize,
    },
}

impl SelectionChange {
    pub fn is_changed(&self) -> bool {
        matches!(self, Self::Changed { .. })
    }
}

/// Tracks the selected index and keeps bound handles' selection flags in sync with it.
///
/// Selection is by logical index, not by handle, so it survives recycling: whichever handle ends
/// up bound to the selected index is updated with `is_selected = true`.
#[derive(Clone, Debug, Default)]
pub struct SelectionManager {
    state: SelectionState,
}

impl SelectionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SelectionState {
        self.state
    }

    pub fn selected(&self) -> Option<usize> {
        self.state.selected_index
    }

    pub fn is_selected(&self, index: usize) -> bool {
        self.state.selected_index == Some(index)
    }

    pub fn select(&mut self, index: usize, total_count: usize) -> SelectionChange {
        if index >= total_count {
            vdebug!(index, total_count, "selection out of range");
            return SelectionChange::OutOfRange;
        }
        if self.state.selected_index == Some(index) {
            return SelectionChange::Unchanged;
        }
        let previous = self.state.selected_index.replace(index);
        SelectionChange::Changed {
            previous,
            current: index,
        }
    }

    /// Drops the selection, returning what was selected.
    pub fn clear(&mut self) -> Option<usize> {
        self.state.selected_index.take()
    }

    /// Where `nav` would move the selection, clamped to the list.
    ///
    /// Relative moves start from the current selection, or from the top when nothing is
    /// selected. Returns `None` for an empty list.
    pub fn navigation_target(
        &self,
        nav: Navigation,
        total_count: usize,
        rows_per_page: usize,
    ) -> Option<usize> {
        let last = total_count.checked_sub(1)?;
        let current = self.state.selected_index.unwrap_or(0).min(last);
        let page = rows_per_page.max(1);
        let target = match nav {
            Navigation::Up => current.saturating_sub(1),
            Navigation::Down => current.saturating_add(1),
            Navigation::PageUp => current.saturating_sub(page),
            Navigation::PageDown => current.saturating_add(page),
            Navigation::Home => 0,
            Navigation::End => last,
        };
        Some(target.min(last))
    }

    /// Pushes a selection change to the handles currently bound to the old and new index.
    ///
    /// Handles that are not bound are left alone: they pick the flag up on their next
    /// reconciliation. Update failures blank the handle and are returned for logging.
    pub fn repaint<C, I>(
        &self,
        change: SelectionChange,
        pool: &mut RecyclingPool<C::Handle>,
        items: &[I],
        container: &mut C,
    ) -> Vec<RenderFailure>
    where
        C: Container,
        I: RenderableItem<C>,
    {
        let mut failures = Vec::new();
        let SelectionChange::Changed { previous, current } = change else {
            return failures;
        };

        let targets = previous
            .map(|index| (index, false))
            .into_iter()
            .chain(core::iter::once((current, true)));
        for (index, is_selected) in targets {
            let (Some(item), Some(handle)) = (items.get(index), pool.bound_mut(index)) else {
                continue;
            };
            if let Err(error) = item.update(handle, is_selected) {
                vwarn!(index, error = %error, "selection update failed");
                container.blank(handle);
                failures.push(RenderFailure {
                    index,
                    phase: Phase::Update,
                    error,
                });
            }
        }
        failures
    }
}
