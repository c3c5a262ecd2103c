use serde::{Deserialize, Serialize};

/// Progress snapshot published by every engine on its watch channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressUpdate {
    pub downloaded: u64,
    /// Total size, when the server reported one.
    pub total: Option<u64>,
    /// Monotonic sequence number so observers can drop stale updates.
    pub seq: u64,
}

impl ProgressUpdate {
    pub const fn new(downloaded: u64, total: Option<u64>, seq: u64) -> Self {
        Self {
            downloaded,
            total,
            seq,
        }
    }

    /// Percentage complete, if the total is known and non-zero.
    #[allow(clippy::cast_precision_loss)]
    pub fn percentage(&self) -> Option<f64> {
        match self.total {
            Some(total) if total > 0 => Some(self.downloaded as f64 / total as f64 * 100.0),
            _ => None,
        }
    }
}
