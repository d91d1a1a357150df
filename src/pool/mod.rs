//! Bounded worker pool.
//!
//! A pool owns a fixed number of permits. Its dispatch loop hands one permit to
//! each spawned unit of work and gets it back when that unit finishes, so the
//! number of in-flight executions never exceeds the capacity the pool was built
//! with. Resizing means building a new pool.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::{debug, trace};

use crate::work::Work;


pub struct WorkerPool {
    permits: Arc<Semaphore>,
    capacity: u32,
}

impl WorkerPool {
    /// Builds a pool with `concurrency` permits, all immediately available.
    /// A zero-capacity pool never dispatches.
    #[must_use]
    pub fn new(concurrency: u32) -> Self {
        let capacity = usize::try_from(concurrency)
            .unwrap_or(usize::MAX)
            .min(Semaphore::MAX_PERMITS);
        Self {
            permits: Arc::new(Semaphore::new(capacity)),
            capacity: u32::try_from(capacity).unwrap_or(u32::MAX),
        }
    }

    #[must_use]
    pub const fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Number of permits currently checked out by running work.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        usize::try_from(self.capacity)
            .unwrap_or(usize::MAX)
            .saturating_sub(self.permits.available_permits())
    }

    /// Runs the dispatch loop until `stop` resolves and returns the number of
    /// executions dispatched.
    ///
    /// Stopping does not wait for in-flight work; use [`WorkerPool::drain`]
    /// for that.
    pub async fn run<W, S>(&self, work: Arc<W>, stop: S) -> u64
    where
        W: Work + ?Sized,
        S: Future<Output = ()>,
    {
        tokio::pin!(stop);
        let mut next_id: u64 = 0;
        debug!("Worker pool started with capacity {}", self.capacity);

        loop {
            tokio::select! {
                biased;
                () = &mut stop => {
                    debug!(
                        "Worker pool stopped after {} dispatches ({} in flight)",
                        next_id,
                        self.in_flight()
                    );
                    return next_id;
                }
                permit = Arc::clone(&self.permits).acquire_owned() => {
                    let Ok(permit) = permit else {
                        return next_id;
                    };
                    let id = next_id;
                    next_id = next_id.saturating_add(1);
                    let work = Arc::clone(&work);
                    tokio::spawn(async move {
                        trace!("Dispatching work {}", id);
                        work.run(id).await;
                        drop(permit);
                    });
                }
            }
        }
    }

    /// Waits until every permit has been returned, i.e. all in-flight work
    /// has finished.
    pub async fn drain(&self) {
        if self.capacity == 0 {
            return;
        }
        match self.permits.acquire_many(self.capacity).await {
            Ok(permits) => drop(permits),
            Err(_closed) => {}
        }
    }
}
