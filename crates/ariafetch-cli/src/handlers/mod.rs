//! Command handlers.

pub mod check;
pub mod get;
pub mod install;
pub mod paths;
