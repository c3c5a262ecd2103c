use std::net::Ipv4Addr;

/// Enumerates local IPv4 addresses the accelerator may bind to.
///
/// Best-effort: an empty list means "let the OS choose".
pub trait InterfaceProbe: Send + Sync {
    /// Addresses of interfaces that are up, excluding loopback and link-local.
    fn bindable_ipv4(&self) -> Vec<Ipv4Addr>;
}

/// Probe that never reports an interface.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoInterfaces;

impl InterfaceProbe for NoInterfaces {
    fn bindable_ipv4(&self) -> Vec<Ipv4Addr> {
        Vec::new()
    }
}
