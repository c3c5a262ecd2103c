//! Get command handler.
//!
//! Downloads the URLs of one invocation and prints where they landed.

use std::process::ExitCode;

use anyhow::Result;
use ariafetch_core::{DownloadOutcome, UrlSource};
use ariafetch_download::DownloadReport;
use tracing::{debug, warn};

use crate::bootstrap::{
    bootstrap, download_options, request_template, settings_from_args, url_source,
};
use crate::commands::GetArgs;
use crate::error::CliError;
use crate::progress::ProgressDisplay;

/// Execute the get command.
///
/// One URL prints its path; a batch prints one line per URL and exits
/// with 1 when any of them failed.
pub async fn execute(args: &GetArgs) -> Result<ExitCode> {
    let settings = settings_from_args(args)?;
    let urls = url_source(args).load().map_err(CliError::from)?;
    let first = urls
        .first()
        .ok_or_else(|| CliError::Arguments("no URLs to download".to_string()))?;
    let template = request_template(args, first.as_str())?;
    let source = UrlSource::ByUrl(urls.iter().map(ToString::to_string).collect());

    let orchestrator = bootstrap(settings)?;

    let (progress_tx, display) = ProgressDisplay::start();
    let options = download_options(args).with_progress(progress_tx);

    let cancel = options.cancel.clone();
    let ctrl_c = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling downloads");
            cancel.cancel();
        }
    });

    let report = orchestrator
        .download_source(&source, &template, &options)
        .await;

    display.finish();
    ctrl_c.abort();
    if let Err(e) = orchestrator.shutdown().await {
        debug!(error = %e, "Backend shutdown failed");
    }

    match report.map_err(CliError::from)? {
        DownloadReport::Single(path) => {
            println!("{}", path.display());
            Ok(ExitCode::SUCCESS)
        }
        DownloadReport::Batch(outcomes) => {
            for outcome in &outcomes {
                println!("{}", outcome_line(outcome));
            }
            if outcomes.iter().all(|o| o.success) {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::FAILURE)
            }
        }
    }
}

/// One summary line per batch outcome.
pub fn outcome_line(outcome: &DownloadOutcome) -> String {
    match &outcome.error {
        None => format!("✓ {}", outcome.target.output_path().display()),
        Some(err) => format!("✗ {}: {}", outcome.target.source_url, err.user_message()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ariafetch_core::{BackendKind, DownloadError, ResolvedTarget};

    fn target() -> ResolvedTarget {
        ResolvedTarget::new(
            "https://example.com/archive.zip".parse().unwrap(),
            "/tmp/dl/archive.zip",
        )
    }

    #[test]
    fn test_success_line_shows_path() {
        let outcome = DownloadOutcome::succeeded(target(), BackendKind::Native, 9);
        assert_eq!(outcome_line(&outcome), "✓ /tmp/dl/archive.zip");
    }

    #[test]
    fn test_failure_line_shows_url_and_reason() {
        let outcome = DownloadOutcome::failed(
            target(),
            Some(BackendKind::Accelerated),
            DownloadError::auth_required("example.com", Some(403)),
        );
        let line = outcome_line(&outcome);
        assert!(line.starts_with("✗ https://example.com/archive.zip: "));
        assert!(line.contains("403"));
    }
}
