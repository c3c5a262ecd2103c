//! Paths command handler.
//!
//! Displays resolved directories in `key = value` format.

use std::path::Path;

use anyhow::Result;
use ariafetch_core::{accelerator_file_name, data_root, logs_dir, tools_dir};

use crate::error::CliError;

/// Execute the paths command.
pub fn execute() -> Result<()> {
    let root = data_root().map_err(CliError::from)?;
    let tools = tools_dir().map_err(CliError::from)?;
    let logs = logs_dir().map_err(CliError::from)?;
    print!("{}", render(&root, &tools, &logs));
    Ok(())
}

fn render(root: &Path, tools: &Path, logs: &Path) -> String {
    format!(
        "data_root = {}\ntools_dir = {}\nlogs_dir = {}\naria2c = {}\n",
        root.display(),
        tools.display(),
        logs.display(),
        tools.join(accelerator_file_name()).display()
    )
}
