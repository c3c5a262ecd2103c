//! Loopback port allocation for the RPC daemon.

use std::net::{Ipv4Addr, TcpListener};

use tracing::debug;

use crate::error::{RuntimeError, RuntimeResult};

/// Ask the OS for a free loopback port.
///
/// The listener is dropped before returning, so the port is only very
/// likely to still be free when the daemon binds it. Callers retry on
/// startup failure.
pub fn free_loopback_port() -> RuntimeResult<u16> {
    let listener =
        TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).map_err(|_| RuntimeError::NoFreePort)?;
    let port = listener
        .local_addr()
        .map_err(|_| RuntimeError::NoFreePort)?
        .port();
    debug!(port, "Allocated loopback port");
    Ok(port)
}
