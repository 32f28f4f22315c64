use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use crate::{AcquireError, Container, ItemError, RenderableItem};

/// Counters describing how a [`RecyclingPool`] has been used.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PoolStats {
    /// Handles obtained from `create`.
    pub created: u64,
    /// Handles handed out again from the pool.
    pub reused: u64,
    /// Handles returned through `release`.
    pub released: u64,
    /// Handles destroyed for good.
    pub discarded: u64,
    /// Largest number of pooled handles observed at once.
    pub peak_pooled: usize,
}

/// Owns every live handle: the ones bound to a visible index and the detached ones kept for
/// reuse.
///
/// A handle is always in exactly one place: bound to one index, pooled, or destroyed. The pool
/// of detached handles never grows past `max_pool_size`; handles released while it is full are
/// discarded, so peak resource usage is independent of how many indices have ever been shown.
pub struct RecyclingPool<H> {
    bound: BTreeMap<usize, H>,
    pooled: Vec<H>, // LIFO: the most recently released handle is reused first
    max_pool_size: usize,
    stats: PoolStats,
}

impl<H> RecyclingPool<H> {
    pub fn new(max_pool_size: usize) -> Self {
        Self {
            bound: BTreeMap::new(),
            pooled: Vec::new(),
            max_pool_size,
            stats: PoolStats::default(),
        }
    }

    pub fn max_pool_size(&self) -> usize {
        self.max_pool_size
    }

    /// Changes the pool bound, discarding surplus pooled handles right away.
    pub fn set_max_pool_size<C>(&mut self, max_pool_size: usize, container: &mut C)
    where
        C: Container<Handle = H> + ?Sized,
    {
        self.max_pool_size = max_pool_size;
        while self.pooled.len() > max_pool_size {
            if let Some(handle) = self.pooled.pop() {
                self.stats.discarded += 1;
                container.discard(handle);
            }
        }
    }

    pub fn stats(&self) -> PoolStats {
        self.stats
    }

    pub fn pooled_len(&self) -> usize {
        self.pooled.len()
    }

    pub fn bound_len(&self) -> usize {
        self.bound.len()
    }

    pub fn pooled(&self) -> impl Iterator<Item = &H> {
        self.pooled.iter()
    }

    pub fn is_bound(&self, index: usize) -> bool {
        self.bound.contains_key(&index)
    }

    pub fn bound(&self, index: usize) -> Option<&H> {
        self.bound.get(&index)
    }

    pub fn bound_mut(&mut self, index: usize) -> Option<&mut H> {
        self.bound.get_mut(&index)
    }

    /// Bound handles in ascending index order.
    pub fn iter_bound(&self) -> impl Iterator<Item = (usize, &H)> {
        self.bound.iter().map(|(&i, h)| (i, h))
    }

    pub fn iter_bound_mut(&mut self) -> impl Iterator<Item = (usize, &mut H)> {
        self.bound.iter_mut().map(|(&i, h)| (i, h))
    }

    pub fn bound_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.bound.keys().copied()
    }

    /// Returns a handle for `item`: the most recently pooled one if any, otherwise a new one from
    /// `item.create`. Either way the handle is brought up to date with `item.update`.
    pub fn acquire<C, I>(
        &mut self,
        container: &mut C,
        item: &I,
        is_selected: bool,
    ) -> Result<H, AcquireError<H>>
    where
        C: Container<Handle = H> + ?Sized,
        I: RenderableItem<C> + ?Sized,
    {
        let mut handle = match self.pooled.pop() {
            Some(handle) => {
                self.stats.reused += 1;
                handle
            }
            None => {
                let handle = item.create(container).map_err(AcquireError::Create)?;
                self.stats.created += 1;
                handle
            }
        };

        if let Err(error) = item.update(&mut handle, is_selected) {
            container.blank(&mut handle);
            return Err(AcquireError::Update { handle, error });
        }
        Ok(handle)
    }

    /// Detaches `handle` from `index`: runs the item's `destroy` hook, hides it, then keeps it
    /// for reuse or discards it when the pool is full.
    ///
    /// `item` is `None` when the record the handle showed is no longer available; the hook is
    /// skipped in that case. A failing hook does not stop the release; its error is logged and
    /// returned.
    pub fn release<C, I>(
        &mut self,
        index: usize,
        item: Option<&I>,
        mut handle: H,
        container: &mut C,
    ) -> Option<ItemError>
    where
        C: Container<Handle = H> + ?Sized,
        I: RenderableItem<C> + ?Sized,
    {
        let hook_error = item.and_then(|item| item.destroy(&mut handle).err());
        if let Some(error) = &hook_error {
            vwarn!(index, error = %error, "destroy hook failed");
        }

        container.hide(&mut handle);
        self.stats.released += 1;

        if self.pooled.len() < self.max_pool_size {
            self.pooled.push(handle);
            self.stats.peak_pooled = self.stats.peak_pooled.max(self.pooled.len());
        } else {
            vtrace!(index, "pool full; discarding handle");
            self.stats.discarded += 1;
            container.discard(handle);
        }
        hook_error
    }

    /// Binds `handle` to `index`.
    ///
    /// Returns the handle previously bound there, which the caller must release; the
    /// reconciliation path never produces one.
    pub fn bind(&mut self, index: usize, handle: H) -> Option<H> {
        let displaced = self.bound.insert(index, handle);
        debug_assert!(displaced.is_none(), "index {index} was already bound");
        displaced
    }

    pub fn unbind(&mut self, index: usize) -> Option<H> {
        self.bound.remove(&index)
    }

    /// Releases every bound handle, then destroys every pooled handle.
    pub fn clear_all<C, I>(&mut self, items: &[I], container: &mut C)
    where
        C: Container<Handle = H> + ?Sized,
        I: RenderableItem<C>,
    {
        let bound = core::mem::take(&mut self.bound);
        let released = bound.len();
        for (index, handle) in bound {
            self.release(index, items.get(index), handle, container);
        }

        let pooled = self.pooled.len();
        for handle in self.pooled.drain(..) {
            self.stats.discarded += 1;
            container.discard(handle);
        }
        vdebug!(released, pooled, "pool cleared");
    }
}

impl<H> core::fmt::Debug for RecyclingPool<H> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RecyclingPool")
            .field("bound", &self.bound.len())
            .field("pooled", &self.pooled.len())
            .field("max_pool_size", &self.max_pool_size)
            .field("stats", &self.stats)
            .finish()
    }
}
