#![doc = include_str!("../README.md")]
#![deny(unused_crate_dependencies)]

pub mod domain;
pub mod errors;
pub mod filename;
pub mod paths;
pub mod ports;
pub mod settings;

// Re-export commonly used types for convenience
pub use domain::{
    AcceleratorLogLevel, AttemptFailure, BackendInvocation, BackendKind, BackendPreference,
    DownloadOutcome, DownloadRequest, MAX_CONNECTIONS_CEILING, ProgressUpdate, ResolvedTarget,
    SecretRef, TimeoutPolicy, UrlSource, parse_source_url, parse_url_list,
};
pub use errors::{DownloadError, DownloadResult};
pub use paths::{
    DirectoryCreationStrategy, PathError, accelerator_file_name, data_root, ensure_directory,
    logs_dir, tools_dir, verify_writable,
};
pub use ports::{
    AcceleratorLocator, HeaderPairs, HeaderProbe, InterfaceProbe, NativeTransferPort,
    NoInterfaces, NoopSecretStore, SecretStore, SecretValue, TransferJob, TransferJobId,
    TransferState,
};
pub use settings::{AuthRule, DownloadSettings, SettingsError, validate_settings};
