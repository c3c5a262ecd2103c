//! Port definitions (trait abstractions) for external systems.
//!
//! Ports define the interfaces the download subsystem expects from
//! infrastructure. They contain no implementation details and use only
//! domain types.
//!
//! # Design Rules
//!
//! - No `reqwest`, `tokio::process` or `sysinfo` types in any signature
//! - Collaborators are injected as `Arc<dyn Port>` by the composition root
//! - Errors are reported with the shared `DownloadError` taxonomy

pub mod accelerator;
pub mod header_probe;
pub mod interface_probe;
pub mod native_transfer;
pub mod secret_store;

pub use accelerator::AcceleratorLocator;
pub use header_probe::{HeaderPairs, HeaderProbe};
pub use interface_probe::{InterfaceProbe, NoInterfaces};
pub use native_transfer::{NativeTransferPort, TransferJob, TransferJobId, TransferState};
pub use secret_store::{NoopSecretStore, SecretStore, SecretValue};
