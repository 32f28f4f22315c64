use alloc::boxed::Box;
use alloc::sync::Arc;

use crate::{ItemError, Placement};

/// The toolkit side of the engine: the scrollable surface that renderable handles live in.
///
/// The engine owns a handle's *placement* (where it sits, whether it is shown) and drives it
/// exclusively through this trait. Content is owned by the item that the handle is bound to.
pub trait Container {
    /// An opaque renderable object (a widget, a row, a retained node, ...).
    type Handle;

    /// Shows `handle` at `placement`.
    fn place(&mut self, handle: &mut Self::Handle, placement: Placement);

    /// Hides `handle` without destroying it. Called before a handle goes back to the pool.
    fn hide(&mut self, handle: &mut Self::Handle);

    /// Clears a handle's content so it renders as an empty placeholder row.
    ///
    /// Called when an item's `update` fails, so a recycled handle never shows a previous
    /// record's content.
    fn blank(&mut self, _handle: &mut Self::Handle) {}

    /// Destroys a handle for good (pool full, dataset replaced, shutdown).
    fn discard(&mut self, handle: Self::Handle) {
        drop(handle);
    }

    /// Informs the container of the full content height so it can size its scroll region.
    fn set_content_height(&mut self, _height: u64) {}
}

/// A host record that knows how to render itself into a [`Container`] handle.
///
/// Implementations are typically heterogeneous (`Box<dyn RenderableItem<C>>`); the blanket
/// impls for `Box` and `Arc` make that work without extra glue.
pub trait RenderableItem<C: Container + ?Sized> {
    /// Creates a fresh handle inside `container`.
    fn create(&self, container: &mut C) -> Result<C::Handle, ItemError>;

    /// Writes this record's content and selection state into `handle`.
    ///
    /// Must be idempotent: the engine calls it on every reconciliation touching the index and
    /// whenever the selection changes.
    fn update(&self, handle: &mut C::Handle, is_selected: bool) -> Result<(), ItemError>;

    /// Row height in pixels. Layout uses the list's configured uniform height; see
    /// [`crate::VirtualList::set_items`] for how a mismatch is reported.
    fn height(&self) -> u32;

    /// Best-effort cleanup hook, called before a handle is pooled or destroyed.
    fn destroy(&self, _handle: &mut C::Handle) -> Result<(), ItemError> {
        Ok(())
    }
}

impl<C, T> RenderableItem<C> for Box<T>
where
    C: Container + ?Sized,
    T: RenderableItem<C> + ?Sized,
{
    fn create(&self, container: &mut C) -> Result<C::Handle, ItemError> {
        (**self).create(container)
    }

    fn update(&self, handle: &mut C::Handle, is_selected: bool) -> Result<(), ItemError> {
        (**self).update(handle, is_selected)
    }

    fn height(&self) -> u32 {
        (**self).height()
    }

    fn destroy(&self, handle: &mut C::Handle) -> Result<(), ItemError> {
        (**self).destroy(handle)
    }
}

impl<C, T> RenderableItem<C> for Arc<T>
where
    C: Container + ?Sized,
    T: RenderableItem<C> + ?Sized,
{
    fn create(&self, container: &mut C) -> Result<C::Handle, ItemError> {
        (**self).create(container)
    }

    fn update(&self, handle: &mut C::Handle, is_selected: bool) -> Result<(), ItemError> {
        (**self).update(handle, is_selected)
    }

    fn height(&self) -> u32 {
        (**self).height()
    }

    fn destroy(&self, handle: &mut C::Handle) -> Result<(), ItemError> {
        (**self).destroy(handle)
    }
}
