//! Background preparation of large item collections.
//!
//! Worker threads never touch the list: they send prepared values back over a channel and the
//! list applies them on its own thread during [`crate::VirtualList::tick`].

use alloc::boxed::Box;
use alloc::format;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc;
use std::thread;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BatchConfig {
    /// Items per batch.
    pub batch_size: usize,
    /// Worker threads spawned per `process` call.
    pub max_workers: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: 100,
            max_workers: 2,
        }
    }
}

/// One finished batch: `values[k]` belongs to index `start + k` of the dataset `generation`.
#[derive(Clone, Debug, PartialEq)]
pub struct PreparedBatch<P> {
    pub generation: u64,
    pub start: usize,
    pub values: Vec<P>,
}

/// An item whose derived display data can be computed off the UI thread.
pub trait Preparable {
    /// A thread-safe copy of whatever `prepare` needs, taken on the UI thread.
    type Source: Send + Sync + 'static;
    type Prepared: Send + 'static;

    fn source(&self) -> Self::Source;

    /// Runs on a worker thread.
    fn prepare(source: &Self::Source) -> Self::Prepared;

    /// Runs on the UI thread once the batch holding this item is drained.
    fn accept(&mut self, prepared: Self::Prepared);
}

/// Splits work into fixed-size batches and runs them on short-lived worker threads.
///
/// `process` is fire-and-forget. `cancel` stops workers before their next batch; a batch that is
/// already being computed finishes but its result is dropped. Workers are never joined.
///
/// A batch whose `prepare` panics is logged and skipped; the worker moves on to the next one.
pub struct BatchPreparer<P> {
    config: BatchConfig,
    sender: mpsc::Sender<Delivery<P>>,
    receiver: mpsc::Receiver<Delivery<P>>,
    cancelled: Arc<AtomicBool>,
    in_flight: Arc<AtomicUsize>,
    /// Bumped by `cancel`; deliveries from an older epoch are dropped on drain.
    epoch: u64,
    spawned: usize,
}

struct Delivery<P> {
    epoch: u64,
    batch: PreparedBatch<P>,
}

impl<P: Send + 'static> BatchPreparer<P> {
    pub fn new(config: BatchConfig) -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            config,
            sender,
            receiver,
            cancelled: Arc::new(AtomicBool::new(false)),
            in_flight: Arc::new(AtomicUsize::new(0)),
            epoch: 0,
            spawned: 0,
        }
    }

    pub fn config(&self) -> BatchConfig {
        self.config
    }

    /// Batches not yet delivered.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn is_processing(&self) -> bool {
        self.in_flight() > 0
    }

    /// Prepares `sources` in the background. `offset` is the dataset index of `sources[0]`.
    ///
    /// Returns the number of batches queued.
    pub fn process<S, F>(&mut self, generation: u64, offset: usize, sources: Vec<S>, prepare: F) -> usize
    where
        S: Send + Sync + 'static,
        F: Fn(&S) -> P + Send + Sync + 'static,
    {
        if sources.is_empty() {
            return 0;
        }

        let batch_size = self.config.batch_size.max(1);
        let batches = sources.len().div_ceil(batch_size);
        let workers = self.config.max_workers.clamp(1, batches);
        self.in_flight.fetch_add(batches, Ordering::AcqRel);

        let job = Arc::new(Job {
            epoch: self.epoch,
            generation,
            offset,
            batch_size,
            batches,
            sources,
            prepare: Box::new(prepare),
            next_batch: AtomicUsize::new(0),
        });

        let mut started = 0;
        for _ in 0..workers {
            let worker = Worker {
                job: Arc::clone(&job),
                sender: self.sender.clone(),
                cancelled: Arc::clone(&self.cancelled),
                in_flight: Arc::clone(&self.in_flight),
            };
            let name = format!("batch-preparer-{}", self.spawned);
            self.spawned += 1;
            match thread::Builder::new().name(name).spawn(move || worker.run()) {
                Ok(_) => started += 1,
                Err(error) => {
                    vwarn!(error = %error, "failed to spawn batch worker");
                }
            }
        }

        if started == 0 {
            self.in_flight.fetch_sub(batches, Ordering::AcqRel);
            return 0;
        }
        vdebug!(generation, offset, batches, workers = started, "batch preparation started");
        batches
    }

    /// Takes every batch delivered since the last `cancel`.
    pub fn drain(&self) -> Vec<PreparedBatch<P>> {
        self.receiver
            .try_iter()
            .filter(|delivery| delivery.epoch == self.epoch)
            .map(|delivery| delivery.batch)
            .collect()
    }

    /// Stops in-flight work and drops anything delivered but not yet drained, including batches
    /// that land after this call.
    pub fn cancel(&mut self) {
        self.cancelled.store(true, Ordering::Release);
        self.epoch += 1;
        // Running workers keep the old flag and counter; new work gets fresh ones.
        self.cancelled = Arc::new(AtomicBool::new(false));
        self.in_flight = Arc::new(AtomicUsize::new(0));
        let dropped = self.receiver.try_iter().count();
        vdebug!(dropped, "batch preparation cancelled");
    }

    #[cfg(test)]
    pub(crate) fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Delivers `batch` as if a worker of `epoch` had sent it.
    #[cfg(test)]
    pub(crate) fn deliver(&self, epoch: u64, batch: PreparedBatch<P>) {
        let _ = self.sender.send(Delivery { epoch, batch });
    }
}

impl<P> Drop for BatchPreparer<P> {
    fn drop(&mut self) {
        self.cancelled.store(true, Ordering::Release);
    }
}

impl<P> core::fmt::Debug for BatchPreparer<P> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BatchPreparer")
            .field("config", &self.config)
            .field("in_flight", &self.in_flight.load(Ordering::Relaxed))
            .field("epoch", &self.epoch)
            .finish_non_exhaustive()
    }
}

type PrepareFn<S, P> = Box<dyn Fn(&S) -> P + Send + Sync>;

struct Job<S, P> {
    epoch: u64,
    generation: u64,
    offset: usize,
    batch_size: usize,
    batches: usize,
    sources: Vec<S>,
    prepare: PrepareFn<S, P>,
    next_batch: AtomicUsize,
}

struct Worker<S, P> {
    job: Arc<Job<S, P>>,
    sender: mpsc::Sender<Delivery<P>>,
    cancelled: Arc<AtomicBool>,
    in_flight: Arc<AtomicUsize>,
}

impl<S, P> Worker<S, P> {
    fn run(self) {
        let job = &*self.job;
        loop {
            if self.cancelled.load(Ordering::Acquire) {
                return;
            }
            let batch = job.next_batch.fetch_add(1, Ordering::Relaxed);
            if batch >= job.batches {
                return;
            }

            let start = batch * job.batch_size;
            let end = (start + job.batch_size).min(job.sources.len());
            let computed = panic::catch_unwind(AssertUnwindSafe(|| {
                job.sources[start..end]
                    .iter()
                    .map(|source| (job.prepare)(source))
                    .collect::<Vec<P>>()
            }));
            let values = match computed {
                Ok(values) => values,
                Err(_) => {
                    vwarn!(
                        generation = job.generation,
                        start = job.offset + start,
                        len = end - start,
                        "batch preparation panicked; skipping batch"
                    );
                    self.in_flight.fetch_sub(1, Ordering::AcqRel);
                    continue;
                }
            };

            if self.cancelled.load(Ordering::Acquire) {
                return;
            }
            let delivery = Delivery {
                epoch: job.epoch,
                batch: PreparedBatch {
                    generation: job.generation,
                    start: job.offset + start,
                    values,
                },
            };
            if self.sender.send(delivery).is_err() {
                // The preparer is gone.
                return;
            }
            self.in_flight.fetch_sub(1, Ordering::AcqRel);
        }
    }
}

/// Object-safe view of a [`BatchPreparer`] specialised to one item type, so the list can hold it
/// without naming `Preparable` in its own bounds.
pub(crate) trait Preparation<I>: Send {
    fn start(&mut self, generation: u64, offset: usize, items: &[I]);

    /// Applies delivered batches of `generation` to `items`, dropping stale ones. Returns the
    /// number of items updated.
    fn apply(&mut self, generation: u64, items: &mut [I]) -> usize;

    fn cancel(&mut self);

    fn is_processing(&self) -> bool;
}

impl<I> Preparation<I> for BatchPreparer<I::Prepared>
where
    I: Preparable + 'static,
{
    fn start(&mut self, generation: u64, offset: usize, items: &[I]) {
        let sources = items.iter().map(Preparable::source).collect();
        self.process(generation, offset, sources, I::prepare);
    }

    fn apply(&mut self, generation: u64, items: &mut [I]) -> usize {
        let mut applied = 0;
        for batch in self.drain() {
            if batch.generation != generation {
                vtrace!(
                    batch_generation = batch.generation,
                    generation,
                    "dropping stale prepared batch"
                );
                continue;
            }
            for (index, value) in (batch.start..).zip(batch.values) {
                if let Some(item) = items.get_mut(index) {
                    item.accept(value);
                    applied += 1;
                }
            }
        }
        applied
    }

    fn cancel(&mut self) {
        BatchPreparer::cancel(self);
    }

    fn is_processing(&self) -> bool {
        BatchPreparer::is_processing(self)
    }
}
