//! Start/stop hand-off between control sessions and the driver loop.
//!
//! The cell holds a single directive and the latest write wins. Publishing
//! never blocks, and a burst of transitions the driver has not seen yet
//! collapses into the last one. Every `Run` carries a fresh generation, so a
//! resize while running is observable even when the concurrency is unchanged.

use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    Idle,
    Run { generation: u64, concurrency: u32 },
}

pub struct LifecycleTx {
    tx: watch::Sender<Directive>,
    generation: AtomicU64,
}

pub struct LifecycleRx {
    rx: watch::Receiver<Directive>,
    // Highest generation handed out by `wait_for_run`.
    last_run: u64,
}

#[must_use]
pub fn lifecycle_channel() -> (LifecycleTx, LifecycleRx) {
    let (tx, rx) = watch::channel(Directive::Idle);
    (
        LifecycleTx {
            tx,
            generation: AtomicU64::new(0),
        },
        LifecycleRx { rx, last_run: 0 },
    )
}

impl LifecycleTx {
    /// Publishes a `Run` directive with a new generation and returns it.
    pub fn start(&self, concurrency: u32) -> Directive {
        let mut published = Directive::Idle;
        // Numbered under the channel's write lock so generations are published in order.
        self.tx.send_modify(|directive| {
            let generation = self
                .generation
                .fetch_add(1, Ordering::AcqRel)
                .saturating_add(1);
            *directive = Directive::Run {
                generation,
                concurrency,
            };
            published = *directive;
        });
        published
    }

    pub fn stop(&self) {
        self.tx.send_replace(Directive::Idle);
    }

    #[must_use]
    pub fn current(&self) -> Directive {
        *self.tx.borrow()
    }
}

impl LifecycleRx {
    /// Waits for a `Run` directive newer than the last one returned. Returns
    /// `None` once every sender is gone.
    pub async fn wait_for_run(&mut self) -> Option<(u64, u32)> {
        let last_run = self.last_run;
        let directive = self
            .rx
            .wait_for(|directive| {
                matches!(directive, Directive::Run { generation, .. } if *generation > last_run)
            })
            .await
            .ok()
            .map(|directive| *directive)?;
        match directive {
            Directive::Run {
                generation,
                concurrency,
            } => {
                self.last_run = generation;
                Some((generation, concurrency))
            }
            Directive::Idle => None,
        }
    }

    /// Resolves once the directive is anything other than `Run` with
    /// `generation`, or the senders are gone.
    pub async fn superseded(&mut self, generation: u64) {
        let changed = self
            .rx
            .wait_for(|directive| {
                !matches!(
                    directive,
                    Directive::Run { generation: current, .. } if *current == generation
                )
            })
            .await;
        drop(changed);
    }
}
