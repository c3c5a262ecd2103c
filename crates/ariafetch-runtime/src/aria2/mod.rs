//! aria2c integration: lookup, install, version probe and RPC daemon.

mod daemon;
mod install;
mod locate;
mod rpc;
mod version;

pub use daemon::{Aria2Daemon, DaemonConfig};
pub use install::{
    ARIA2_RELEASE_BASE_URL, ARIA2_VERSION, Aria2Installer, INSTALL_MARKER, InstallRecord,
    PrebuiltAvailability, check_prebuilt_availability,
};
pub use locate::{Aria2Locator, ToolCache};
pub use rpc::{Aria2JobState, Aria2RpcClient, Aria2Status, Aria2Version};
pub use version::aria2_version;
