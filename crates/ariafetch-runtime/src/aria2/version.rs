use std::path::Path;
use std::process::Stdio;

use tokio::process::Command;

use crate::error::{RuntimeError, RuntimeResult};

/// First line of `aria2c --version`, e.g. `aria2 version 1.37.0`.
pub async fn aria2_version(executable: &Path) -> RuntimeResult<String> {
    let output = Command::new(executable)
        .arg("--version")
        .stdin(Stdio::null())
        .output()
        .await
        .map_err(|source| RuntimeError::SpawnFailed {
            path: executable.to_path_buf(),
            source,
        })?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    Ok(stdout
        .lines()
        .next()
        .map_or_else(|| "unknown".to_string(), |line| line.trim().to_string()))
}
