//! install-aria2 command handler.

use anyhow::Result;
use ariafetch_core::{DownloadError, DownloadSettings, tools_dir};
use ariafetch_runtime::{Aria2Installer, build_http_client};

use crate::error::CliError;

/// Execute the install-aria2 command.
///
/// Platforms without an official prebuilt release exit with 69 and a hint
/// to use the system package manager.
pub async fn execute(force: bool) -> Result<()> {
    let settings = DownloadSettings::default();
    let client = build_http_client(&settings.user_agent, &settings.min_tls_version)
        .map_err(|e| CliError::from(DownloadError::from(e)))?;
    let installer = Aria2Installer::new(client, tools_dir().map_err(CliError::from)?);

    let path = installer
        .install(force)
        .await
        .map_err(|e| CliError::from(DownloadError::from(e)))?;

    println!("✓ aria2c installed at {}", path.display());
    if let Some(record) = installer.installed_record() {
        println!("  Version: {}", record.version);
        println!("  Asset: {}", record.asset);
    }
    Ok(())
}
