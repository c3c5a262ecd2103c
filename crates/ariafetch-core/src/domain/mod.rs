//! Domain types for the download subsystem.
//!
//! These types are pure data: no I/O beyond reading a URL list file, no
//! network, no processes.

mod invocation;
mod outcome;
mod progress;
mod request;

pub use invocation::{BackendInvocation, TimeoutPolicy};
pub use outcome::{AttemptFailure, BackendKind, DownloadOutcome, ResolvedTarget};
pub use progress::ProgressUpdate;
pub use request::{
    AcceleratorLogLevel, BackendPreference, DownloadRequest, MAX_CONNECTIONS_CEILING, SecretRef,
    UrlSource, parse_source_url, parse_url_list,
};
