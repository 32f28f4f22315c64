//! A headless text-row binding: rows are plain strings kept in memory, which is enough to drive
//! the engine from a terminal demo or to assert on what a real toolkit would show.

use std::fmt::Display;

use virtual_list::{Container, ItemError, Placement, Preparable, RenderableItem, VirtualList};

/// One rendered text row.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TextRow {
    pub id: u64,
    /// The index the row was last placed at.
    pub index: usize,
    pub top: u64,
    pub text: String,
    pub selected: bool,
    pub visible: bool,
}

/// A [`Container`] whose handles are [`TextRow`]s.
#[derive(Clone, Debug, Default)]
pub struct TextSurface {
    next_id: u64,
    live: usize,
    discarded: usize,
    content_height: u64,
}

impl TextSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rows created and not yet discarded, bound or pooled.
    pub fn live_rows(&self) -> usize {
        self.live
    }

    pub fn discarded_rows(&self) -> usize {
        self.discarded
    }

    pub fn content_height(&self) -> u64 {
        self.content_height
    }

    pub fn create_row(&mut self) -> TextRow {
        self.next_id += 1;
        self.live += 1;
        TextRow {
            id: self.next_id,
            ..TextRow::default()
        }
    }
}

impl Container for TextSurface {
    type Handle = TextRow;

    fn place(&mut self, row: &mut TextRow, placement: Placement) {
        row.index = placement.index;
        row.top = placement.top;
        row.visible = true;
    }

    fn hide(&mut self, row: &mut TextRow) {
        row.visible = false;
    }

    fn blank(&mut self, row: &mut TextRow) {
        row.text.clear();
        row.selected = false;
    }

    fn discard(&mut self, _row: TextRow) {
        self.live = self.live.saturating_sub(1);
        self.discarded += 1;
    }

    fn set_content_height(&mut self, height: u64) {
        self.content_height = height;
    }
}

/// A record rendered as its `Display` output.
///
/// With batch preparation enabled the label is formatted on a worker thread and `update` only
/// copies it.
#[derive(Clone, Debug, PartialEq)]
pub struct TextItem<T> {
    value: T,
    height: u32,
    label: Option<String>,
}

impl<T: Display> TextItem<T> {
    pub fn new(value: T, height: u32) -> Self {
        Self {
            value,
            height,
            label: None,
        }
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    /// The prepared label, if a batch has delivered one.
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    fn text(&self) -> String {
        match &self.label {
            Some(label) => label.clone(),
            None => self.value.to_string(),
        }
    }
}

impl<T: Display> RenderableItem<TextSurface> for TextItem<T> {
    fn create(&self, surface: &mut TextSurface) -> Result<TextRow, ItemError> {
        Ok(surface.create_row())
    }

    fn update(&self, row: &mut TextRow, is_selected: bool) -> Result<(), ItemError> {
        row.text = self.text();
        row.selected = is_selected;
        Ok(())
    }

    fn height(&self) -> u32 {
        self.height
    }
}

impl<T> Preparable for TextItem<T>
where
    T: Display + Clone + Send + Sync + 'static,
{
    type Source = T;
    type Prepared = String;

    fn source(&self) -> T {
        self.value.clone()
    }

    fn prepare(source: &T) -> String {
        source.to_string()
    }

    fn accept(&mut self, label: String) {
        self.label = Some(label);
    }
}

/// The on-screen rows of `list`, top to bottom; the selected row is prefixed with `"> "`.
///
/// Rows in the buffer outside the viewport are skipped.
pub fn render_visible<I>(list: &VirtualList<TextSurface, I>) -> Vec<String>
where
    I: RenderableItem<TextSurface>,
{
    let on_screen = list.on_screen_range();
    list.rendered()
        .filter(|(index, row)| on_screen.contains(*index) && row.visible)
        .map(|(_, row)| {
            let marker = if row.selected { "> " } else { "  " };
            format!("{marker}{}", row.text)
        })
        .collect()
}
