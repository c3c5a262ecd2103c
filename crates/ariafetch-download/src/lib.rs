#![doc = include_str!("../README.md")]
#![deny(unused_crate_dependencies)]

// Re-export core types for convenience
pub use ariafetch_core::{
    BackendKind, BackendPreference, DownloadError, DownloadOutcome, DownloadRequest,
    DownloadResult, ProgressUpdate, UrlSource,
};

pub mod accelerated;
mod attempt;
pub mod auth;
mod builder;
pub mod native;
mod options;
pub mod orchestrator;
pub mod output;
pub mod resolver;
pub mod selector;

pub use accelerated::{AcceleratedEngine, DirectEngine, RpcEngine, RpcSession};
pub use attempt::Attempt;
pub use auth::{AttemptHeaders, RepoAuthenticator};
pub use builder::{OrchestratorDeps, build_orchestrator};
pub use native::NativeEngine;
pub use options::DownloadOptions;
pub use orchestrator::{DownloadReport, Orchestrator};
pub use resolver::{FilenameResolver, ReqwestHeaderProbe};
pub use selector::{BackendSelector, SelectedBackend, choose_backend};

#[cfg(test)]
use tokio_test as _;
