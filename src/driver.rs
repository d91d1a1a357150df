//! Top-level sequencing between lifecycle directives and worker pools.
//!
//! The driver is the only consumer of [`LifecycleRx`], so at most one pool is
//! dispatching at a time. A superseded pool is stopped without waiting for its
//! in-flight work; it is kept aside until that work finishes so shutdown can
//! drain it.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::lifecycle::LifecycleRx;
use crate::pool::WorkerPool;
use crate::shutdown::ShutdownReceiver;
use crate::work::Work;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DriverReport {
    pub pools_started: u64,
    pub dispatched: u64,
    pub drained: bool,
}

pub struct Driver<W: Work + ?Sized> {
    work: Arc<W>,
    lifecycle: LifecycleRx,
    drain_timeout: Duration,
}

impl<W: Work + ?Sized> Driver<W> {
    #[must_use]
    pub const fn new(work: Arc<W>, lifecycle: LifecycleRx, drain_timeout: Duration) -> Self {
        Self {
            work,
            lifecycle,
            drain_timeout,
        }
    }

    /// Runs pools as directed until shutdown (or until every directive sender
    /// is gone), then drains all in-flight work within the drain timeout.
    pub async fn run(mut self, mut shutdown_rx: ShutdownReceiver) -> DriverReport {
        let mut report = DriverReport::default();
        let mut retired: Vec<WorkerPool> = Vec::new();

        loop {
            let next = tokio::select! {
                _ = shutdown_rx.recv() => None,
                run = self.lifecycle.wait_for_run() => run,
            };
            let Some((generation, concurrency)) = next else {
                break;
            };

            let pool = WorkerPool::new(concurrency);
            info!(
                "Starting pool {} with concurrency {}",
                generation,
                pool.capacity()
            );
            report.pools_started = report.pools_started.saturating_add(1);

            let mut shutting_down = false;
            let lifecycle = &mut self.lifecycle;
            let shutdown = &mut shutdown_rx;
            let dispatched = pool
                .run(Arc::clone(&self.work), async {
                    tokio::select! {
                        () = lifecycle.superseded(generation) => {}
                        _ = shutdown.recv() => shutting_down = true,
                    }
                })
                .await;
            report.dispatched = report.dispatched.saturating_add(dispatched);
            debug!(
                "Pool {} stopped after {} dispatches, {} still in flight",
                generation,
                dispatched,
                pool.in_flight()
            );

            retired.retain(|retired_pool| retired_pool.in_flight() > 0);
            retired.push(pool);
            if shutting_down {
                break;
            }
        }

        report.drained = self.drain(&retired).await;
        report
    }

    async fn drain(&self, pools: &[WorkerPool]) -> bool {
        let in_flight: usize = pools.iter().map(WorkerPool::in_flight).sum();
        if in_flight == 0 {
            return true;
        }

        info!("Waiting for {} active workers to complete...", in_flight);
        let drained = timeout(self.drain_timeout, async {
            for pool in pools {
                pool.drain().await;
            }
        })
        .await
        .is_ok();

        if !drained {
            let remaining: usize = pools.iter().map(WorkerPool::in_flight).sum();
            warn!(
                "Gave up on {} in-flight workers after {:?}",
                remaining, self.drain_timeout
            );
        }
        drained
    }
}
