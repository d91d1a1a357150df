//! Shared run state visible to the control plane.
//!
//! The request counter is bumped by every worker; concurrency and the running
//! flag are written by the control session. Both live in atomics so readers
//! never take a lock and never observe a torn configuration.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

const RUNNING_BIT: u64 = 1 << 32;
const CONCURRENCY_MASK: u64 = u32::MAX as u64;

/// Point-in-time copy of [`RunState`], serialized as the status payload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSnapshot {
    pub num_requests: u64,
    pub concurrency: u32,
    pub running: bool,
}

#[derive(Debug, Default)]
pub struct RunState {
    requests: AtomicU64,
    // Low 32 bits hold the concurrency, bit 32 the running flag.
    config: AtomicU64,
}

impl RunState {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            requests: AtomicU64::new(0),
            config: AtomicU64::new(0),
        }
    }

    /// Records one completed unit of work. Safe under any number of callers.
    pub fn increment_request_count(&self) {
        self.requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn set_concurrency(&self, concurrency: u32) {
        self.update_config(|word| (word & RUNNING_BIT) | u64::from(concurrency));
    }

    pub fn set_running(&self, running: bool) {
        self.update_config(|word| {
            if running {
                word | RUNNING_BIT
            } else {
                word & CONCURRENCY_MASK
            }
        });
    }

    /// Sets concurrency and the running flag in a single store.
    pub fn configure(&self, concurrency: u32, running: bool) {
        self.config
            .store(pack(concurrency, running), Ordering::Release);
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.config.load(Ordering::Acquire) & RUNNING_BIT != 0
    }

    #[must_use]
    pub fn concurrency(&self) -> u32 {
        unpack(self.config.load(Ordering::Acquire)).0
    }

    #[must_use]
    pub fn snapshot(&self) -> RunSnapshot {
        let (concurrency, running) = unpack(self.config.load(Ordering::Acquire));
        RunSnapshot {
            num_requests: self.requests.load(Ordering::Relaxed),
            concurrency,
            running,
        }
    }

    fn update_config<F>(&self, f: F)
    where
        F: Fn(u64) -> u64,
    {
        let mut current = self.config.load(Ordering::Acquire);
        loop {
            match self.config.compare_exchange_weak(
                current,
                f(current),
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => break,
                Err(actual) => current = actual,
            }
        }
    }
}

const fn pack(concurrency: u32, running: bool) -> u64 {
    let word = concurrency as u64;
    if running { word | RUNNING_BIT } else { word }
}

fn unpack(word: u64) -> (u32, bool) {
    let concurrency = u32::try_from(word & CONCURRENCY_MASK).unwrap_or(u32::MAX);
    (concurrency, word & RUNNING_BIT != 0)
}
