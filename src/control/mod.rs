//! Control plane: the `/ws` session protocol and the listener in front of it.
//!
//! A controller sends `start`, `stop`, or `update` actions; each one mutates
//! the shared [`RunState`](crate::state::RunState), publishes a lifecycle
//! directive for the driver, and is answered with the current state.
mod command;
mod http;
mod plane;
mod server;
mod session;
mod static_files;
mod wire;


pub use command::ControlCommand;
pub use plane::{ControlPlane, Transition};
pub use server::{CONTROL_ROUTE, ControlServer, DEFAULT_HEAD_TIMEOUT, ServerSettings};
pub use session::{Liveness, SessionEnd, run_session};
pub use wire::{ControlRequest, StatusMessage};
