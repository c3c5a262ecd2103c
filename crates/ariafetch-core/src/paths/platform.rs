//! Platform path resolution.

use std::env;
use std::path::PathBuf;

use super::ensure::{DirectoryCreationStrategy, ensure_directory};
use super::error::PathError;

/// Environment variable overriding the data root.
pub const DATA_DIR_ENV: &str = "ARIAFETCH_DATA_DIR";

/// Get the root directory for application data (tools, logs).
///
/// Resolution order:
/// 1. `ARIAFETCH_DATA_DIR` environment variable
/// 2. System data directory (e.g., `~/.local/share/ariafetch`)
pub fn data_root() -> Result<PathBuf, PathError> {
    let root = resolve_data_root(env::var(DATA_DIR_ENV).ok().as_deref(), dirs::data_local_dir())?;
    ensure_directory(&root, DirectoryCreationStrategy::AutoCreate)?;
    Ok(root)
}

/// Pure resolution of the data root from its inputs.
pub fn resolve_data_root(
    env_override: Option<&str>,
    system_data_dir: Option<PathBuf>,
) -> Result<PathBuf, PathError> {
    if let Some(path) = env_override.map(str::trim).filter(|p| !p.is_empty()) {
        return Ok(PathBuf::from(path));
    }
    system_data_dir
        .map(|dir| dir.join("ariafetch"))
        .ok_or(PathError::NoDataDir)
}

/// Directory holding the installed accelerator.
pub fn tools_dir() -> Result<PathBuf, PathError> {
    let dir = data_root()?.join("tools");
    ensure_directory(&dir, DirectoryCreationStrategy::AutoCreate)?;
    Ok(dir)
}

/// Directory holding per-attempt accelerator logs.
pub fn logs_dir() -> Result<PathBuf, PathError> {
    let dir = data_root()?.join("logs");
    ensure_directory(&dir, DirectoryCreationStrategy::AutoCreate)?;
    Ok(dir)
}

/// Platform file name of the accelerator executable.
pub const fn accelerator_file_name() -> &'static str {
    if cfg!(windows) { "aria2c.exe" } else { "aria2c" }
}
