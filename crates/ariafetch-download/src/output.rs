//! Output file housekeeping shared by all engines.

use std::io;
use std::path::{Path, PathBuf};

use ariafetch_core::{DownloadError, DownloadResult};
use ariafetch_runtime::staging_path;
use tracing::debug;

/// aria2's resume control file for `output`.
pub fn control_file_path(output: &Path) -> PathBuf {
    let mut name = output
        .file_name()
        .map(std::ffi::OsStr::to_os_string)
        .unwrap_or_default();
    name.push(".aria2");
    output.with_file_name(name)
}

/// Delete a previous attempt's output and its side files.
///
/// Removes the output itself, the `.aria2` control file and the native
/// staging file. Missing files are fine.
pub async fn remove_stale_output(output: &Path) -> DownloadResult<()> {
    for path in [
        output.to_path_buf(),
        control_file_path(output),
        staging_path(output),
    ] {
        match tokio::fs::remove_file(&path).await {
            Ok(()) => debug!(path = %path.display(), "Removed stale file"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(DownloadError::from_io_error(&e)),
        }
    }
    Ok(())
}

/// Size of `output`, or `OutputMissingOrEmpty` when it is absent or empty.
pub async fn verify_output(output: &Path) -> DownloadResult<u64> {
    match tokio::fs::metadata(output).await {
        Ok(meta) if meta.is_file() && meta.len() > 0 => Ok(meta.len()),
        _ => Err(DownloadError::output_missing(output.display().to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_verify_rejects_missing_and_empty() {
        let tmp = tempdir().unwrap();
        let out = tmp.path().join("a.bin");

        assert!(matches!(
            verify_output(&out).await,
            Err(DownloadError::OutputMissingOrEmpty { .. })
        ));

        std::fs::write(&out, b"").unwrap();
        assert!(verify_output(&out).await.is_err());

        std::fs::write(&out, b"data").unwrap();
        assert_eq!(verify_output(&out).await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_remove_stale_output_clears_side_files() {
        let tmp = tempdir().unwrap();
        let out = tmp.path().join("a.iso");
        std::fs::write(&out, b"old").unwrap();
        std::fs::write(control_file_path(&out), b"ctl").unwrap();
        std::fs::write(staging_path(&out), b"part").unwrap();

        remove_stale_output(&out).await.unwrap();
        assert!(!out.exists());
        assert!(!control_file_path(&out).exists());
        assert!(!staging_path(&out).exists());

        // Nothing left to remove
        remove_stale_output(&out).await.unwrap();
    }

    #[test]
    fn test_control_file_path() {
        assert_eq!(
            control_file_path(Path::new("/d/a.iso")),
            PathBuf::from("/d/a.iso.aria2")
        );
    }
}
