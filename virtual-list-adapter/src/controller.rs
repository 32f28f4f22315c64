use virtual_list::{Container, RenderableItem, VirtualList, VirtualListOptions};

use crate::{InputEvent, Key};

/// Default quiet period before a viewport resize is applied.
pub const DEFAULT_RESIZE_DEBOUNCE_MS: u64 = 10;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct PendingResize {
    height: u32,
    due_ms: u64,
}

/// A framework-neutral controller that wraps a [`VirtualList`] and turns raw toolkit events into
/// list operations.
///
/// This type does not hold any UI objects beyond the list's own container. Adapters drive it by
/// calling:
/// - `handle(event, now_ms)` for every input event
/// - `tick(now_ms)` on each frame/timer tick, and again at the returned wake-up time
///
/// Resize events arrive in storms while a window is dragged; they are debounced and only the last
/// height is applied.
#[derive(Debug)]
pub struct Controller<C: Container, I> {
    list: VirtualList<C, I>,
    resize_debounce_ms: u64,
    pending_resize: Option<PendingResize>,
}

impl<C, I> Controller<C, I>
where
    C: Container,
    I: RenderableItem<C>,
{
    pub fn new(container: C, options: VirtualListOptions) -> Self {
        Self::from_list(VirtualList::new(container, options))
    }

    pub fn from_list(list: VirtualList<C, I>) -> Self {
        Self {
            list,
            resize_debounce_ms: DEFAULT_RESIZE_DEBOUNCE_MS,
            pending_resize: None,
        }
    }

    pub fn with_resize_debounce_ms(mut self, resize_debounce_ms: u64) -> Self {
        self.resize_debounce_ms = resize_debounce_ms;
        self
    }

    pub fn list(&self) -> &VirtualList<C, I> {
        &self.list
    }

    pub fn list_mut(&mut self) -> &mut VirtualList<C, I> {
        &mut self.list
    }

    pub fn into_list(self) -> VirtualList<C, I> {
        self.list
    }

    pub fn resize_debounce_ms(&self) -> u64 {
        self.resize_debounce_ms
    }

    /// The height a debounced resize will apply, if one is waiting.
    pub fn pending_resize(&self) -> Option<u32> {
        self.pending_resize.map(|pending| pending.height)
    }

    /// Applies one input event.
    ///
    /// Returns whether the event changed list state. A resize only reports `true` once the
    /// debounced height is applied by `tick`, so it returns `false` here.
    pub fn handle(&mut self, event: InputEvent, now_ms: u64) -> bool {
        if self.list.is_shut_down() {
            return false;
        }
        vtrace!(?event, now_ms, "input event");

        if let Some(input) = event.scroll_input() {
            return self.list.scroll(input, now_ms);
        }
        match event {
            InputEvent::Key(Key::Enter) => self
                .list
                .selected_index()
                .is_some_and(|index| self.list.activate(index)),
            InputEvent::Key(key) => key
                .navigation()
                .and_then(|navigation| self.list.navigate(navigation, now_ms))
                .is_some(),
            InputEvent::Press { y } => self.list.press_at(y).is_some(),
            InputEvent::DoublePress { y } => self.list.activate_at(y).is_some(),
            InputEvent::Resize { height } => {
                let height = u32::try_from(height).unwrap_or(0);
                self.pending_resize = Some(PendingResize {
                    height,
                    due_ms: now_ms.saturating_add(self.resize_debounce_ms),
                });
                false
            }
            InputEvent::Wheel { .. } | InputEvent::WheelButton(_) | InputEvent::ScrollbarMoveTo(_) => {
                false
            }
        }
    }

    /// Applies a due resize and advances the list.
    ///
    /// Returns when the controller wants to be ticked again, or `None` when it is idle.
    pub fn tick(&mut self, now_ms: u64) -> Option<u64> {
        if let Some(pending) = self.pending_resize {
            if now_ms >= pending.due_ms {
                self.pending_resize = None;
                if self.list.set_viewport_height(pending.height, now_ms) {
                    vdebug!(height = pending.height, "debounced resize applied");
                }
            }
        }

        let list_wakeup = self.list.tick(now_ms);
        let resize_wakeup = self.pending_resize.map(|pending| pending.due_ms);
        match (list_wakeup, resize_wakeup) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Applies any pending resize right away and runs the list until idle.
    pub fn flush(&mut self, now_ms: u64) {
        if let Some(pending) = self.pending_resize.take() {
            self.list.set_viewport_height(pending.height, now_ms);
        }
        self.list.tick(now_ms);
        self.list.flush();
    }

    /// Drops any pending resize and shuts the list down.
    pub fn shutdown(&mut self) {
        self.pending_resize = None;
        self.list.shutdown();
    }
}
