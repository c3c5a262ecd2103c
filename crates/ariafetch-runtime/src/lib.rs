#![doc = include_str!("../README.md")]
#![deny(unsafe_code)]
#![deny(unused_crate_dependencies)]

pub mod aria2;
mod error;
pub mod http;
pub mod process;
pub mod system;
pub mod transfer;

pub use aria2::{
    Aria2Daemon, Aria2Installer, Aria2JobState, Aria2Locator, Aria2RpcClient, Aria2Status,
    DaemonConfig, PrebuiltAvailability, ToolCache, aria2_version, check_prebuilt_availability,
};
pub use error::{RuntimeError, RuntimeResult};
pub use http::build_http_client;
pub use process::{ProcessExit, run_invocation, shutdown_child};
pub use system::SysinfoInterfaceProbe;
pub use transfer::{HttpTransferService, STAGING_SUFFIX, staging_path};

#[cfg(test)]
use tokio_test as _;
