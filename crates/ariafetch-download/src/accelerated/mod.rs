//! aria2c multi-connection engines.
//!
//! # Design
//!
//! - `DirectEngine` runs one aria2c process per file and waits for exit
//! - `RpcEngine` submits jobs to one long-lived aria2c daemon and polls them
//! - Both build the same option set (`args`) and classify failures the same
//!   way (`failure`)
//! - Both verify the output file after a reported success

pub mod args;
mod direct;
pub mod failure;
mod rpc;

use std::path::Path;

use ariafetch_core::DownloadResult;
use async_trait::async_trait;

use crate::attempt::Attempt;

pub use direct::DirectEngine;
pub use rpc::{RpcEngine, RpcSession};

/// An aria2c invocation strategy.
#[async_trait]
pub trait AcceleratedEngine: Send + Sync {
    /// Download `attempt` with the aria2c at `executable`; returns the byte count.
    async fn download(&self, executable: &Path, attempt: &Attempt<'_>) -> DownloadResult<u64>;

    /// Release long-lived resources (the RPC daemon).
    async fn shutdown(&self) -> DownloadResult<()> {
        Ok(())
    }
}
