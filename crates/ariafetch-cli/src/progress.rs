//! Terminal progress bars fed from the download progress channel.

use ariafetch_core::ProgressUpdate;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::watch;
use tokio::task::JoinHandle;

const BAR_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec})";
const SPINNER_TEMPLATE: &str = "{spinner:.green} [{elapsed_precise}] {bytes} ({bytes_per_sec})";

fn bar_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template(BAR_TEMPLATE)
        .map_or_else(|_| ProgressStyle::default_bar(), |s| s.progress_chars("█▓░"))
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .template(SPINNER_TEMPLATE)
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

/// Renders `ProgressUpdate`s until dropped or finished.
///
/// Starts as a spinner and becomes a bar once a total size is known.
/// indicatif hides itself when stderr is not a terminal.
pub struct ProgressDisplay {
    bar: ProgressBar,
    task: JoinHandle<()>,
}

impl ProgressDisplay {
    /// Create the channel sender for `DownloadOptions` and start rendering.
    pub fn start() -> (watch::Sender<ProgressUpdate>, Self) {
        let (tx, mut rx) = watch::channel(ProgressUpdate::default());
        let bar = ProgressBar::new_spinner();
        bar.set_style(spinner_style());

        let renderer = bar.clone();
        let task = tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                let update = *rx.borrow_and_update();
                apply(&renderer, update);
            }
        });

        (tx, Self { bar, task })
    }

    pub fn finish(self) {
        self.task.abort();
        self.bar.finish_and_clear();
    }
}

fn apply(bar: &ProgressBar, update: ProgressUpdate) {
    match update.total {
        Some(total) if total > 0 => {
            if bar.length() != Some(total) {
                bar.set_style(bar_style());
                bar.set_length(total);
            }
        }
        _ => bar.tick(),
    }
    bar.set_position(update.downloaded);
}
