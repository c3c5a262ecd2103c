//! Path utilities for ariafetch data directories.
//!
//! - Data root (`ARIAFETCH_DATA_DIR` or the platform data directory)
//! - Tools directory holding the installed accelerator
//! - Logs directory holding per-attempt accelerator logs
//!
//! # Design
//!
//! - Returns `PathBuf` and `PathError` for clear error handling
//! - No interactive/terminal I/O - adapters handle user prompts separately

mod ensure;
mod error;
mod platform;

pub use ensure::{DirectoryCreationStrategy, ensure_directory, verify_writable};
pub use error::PathError;
pub use platform::{
    DATA_DIR_ENV, accelerator_file_name, data_root, logs_dir, resolve_data_root, tools_dir,
};
