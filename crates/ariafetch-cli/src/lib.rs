#![doc = include_str!("../README.md")]
#![deny(unsafe_code)]
#![deny(unused_crate_dependencies)]

#[cfg(test)]
use tokio_test as _;

// Used by main.rs only
use dotenvy as _;

pub mod bootstrap;
pub mod commands;
pub mod error;
pub mod handlers;
pub mod parser;
pub mod progress;
pub mod secrets;

pub use bootstrap::{bootstrap, init_tracing};
pub use commands::{Commands, GetArgs};
pub use error::{CliError, exit_code_for};
pub use parser::Cli;
pub use secrets::EnvSecretStore;
