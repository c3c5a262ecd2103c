//! Check command handler.
//!
//! Reports which aria2c the accelerated backend would use. Never installs.

use std::path::PathBuf;

use anyhow::Result;
use ariafetch_core::{AcceleratorLocator, tools_dir};
use ariafetch_runtime::{Aria2Locator, PrebuiltAvailability, aria2_version, check_prebuilt_availability};

use crate::error::CliError;

/// Execute the check command.
pub async fn execute(aria2_path: Option<PathBuf>) -> Result<()> {
    let locator = Aria2Locator::new(tools_dir().map_err(CliError::from)?).with_explicit_path(aria2_path);

    match locator.locate().await {
        Ok(path) => {
            let version = aria2_version(&path)
                .await
                .unwrap_or_else(|e| format!("unknown ({e})"));
            println!("✓ aria2c: {}", path.display());
            println!("  {version}");
            println!("  Backend: accelerated (native fallback available)");
        }
        Err(e) => {
            println!("✗ aria2c not found: {}", e.user_message());
            println!("  Backend: native only");
            match check_prebuilt_availability() {
                PrebuiltAvailability::Available { description, .. } => {
                    println!("  Run `ariafetch install-aria2` to install the {description} build.");
                }
                PrebuiltAvailability::NotAvailable { reason } => println!("  {reason}"),
            }
        }
    }
    Ok(())
}
