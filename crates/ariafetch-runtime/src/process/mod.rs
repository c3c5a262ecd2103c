//! Subprocess spawning and supervision.

mod ports;
mod shutdown;
mod supervise;

pub use ports::free_loopback_port;
pub use shutdown::{SHUTDOWN_GRACE, shutdown_child};
pub use supervise::{ProcessExit, run_invocation, spawn_invocation};
