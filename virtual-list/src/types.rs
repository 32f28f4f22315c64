/// A half-open window of logical indices, `start_index..end_index`.
///
/// Always satisfies `start_index <= end_index <= total_count` for the list it was computed for.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VisibleRange {
    pub start_index: usize,
    pub end_index: usize, // exclusive
}

impl VisibleRange {
    pub const EMPTY: Self = Self {
        start_index: 0,
        end_index: 0,
    };

    pub fn new(start_index: usize, end_index: usize) -> Self {
        Self {
            start_index,
            end_index: end_index.max(start_index),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.start_index >= self.end_index
    }

    pub fn len(&self) -> usize {
        self.end_index.saturating_sub(self.start_index)
    }

    pub fn contains(&self, index: usize) -> bool {
        self.start_index <= index && index < self.end_index
    }

    pub fn as_tuple(&self) -> (usize, usize) {
        (self.start_index, self.end_index)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ScrollDirection {
    Up,
    Down,
    #[default]
    None,
}

/// Where the engine wants a bound handle to appear inside the scrollable content.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Placement {
    pub index: usize,
    /// Content-space offset of the row's top edge, in pixels.
    pub top: u64,
    pub height: u32,
}

/// Keyboard-style selection movement.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Navigation {
    Up,
    Down,
    PageUp,
    PageDown,
    Home,
    End,
}
