//! Core library for the `surge` CLI.
//!
//! `surge` keeps a pool of workers hitting a single HTTP target and lets a
//! browser dashboard start, stop, and resize that pool over a WebSocket. The
//! pieces are usable on their own: [`pool::WorkerPool`] bounds concurrency,
//! [`state::RunState`] is the shared counter/config cell,
//! [`lifecycle`] carries start/stop directives to the [`driver::Driver`], and
//! [`control`] speaks the dashboard protocol.
pub mod args;
pub mod config;
pub mod control;
pub mod driver;
pub mod entry;
pub mod error;
pub mod lifecycle;
pub mod pool;
pub mod shutdown;
pub mod state;
pub mod system;
pub mod work;
