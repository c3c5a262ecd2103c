//! Accelerator invocation description.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// How long the supervising wait may block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeoutPolicy {
    /// Wait until the process exits or the caller cancels.
    #[default]
    Unbounded,
    /// Give up after the duration and terminate the process.
    After(Duration),
}

impl TimeoutPolicy {
    #[must_use]
    pub const fn from_option(timeout: Option<Duration>) -> Self {
        match timeout {
            Some(d) => Self::After(d),
            None => Self::Unbounded,
        }
    }

    pub const fn duration(self) -> Option<Duration> {
        match self {
            Self::Unbounded => None,
            Self::After(d) => Some(d),
        }
    }
}

/// A fully built accelerator command line.
///
/// Built fresh for every attempt and never shared, so each attempt has its
/// own argument set and log file.
#[derive(Clone, PartialEq, Eq)]
pub struct BackendInvocation {
    pub executable: PathBuf,
    pub arguments: Vec<String>,
    pub working_directory: PathBuf,
    pub timeout: TimeoutPolicy,
    /// Where the accelerator writes its log, if anywhere.
    pub log_file: Option<PathBuf>,
}

impl BackendInvocation {
    pub fn new(executable: impl Into<PathBuf>, working_directory: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            arguments: Vec::new(),
            working_directory: working_directory.into(),
            timeout: TimeoutPolicy::Unbounded,
            log_file: None,
        }
    }

    #[must_use]
    pub fn with_arguments(mut self, arguments: Vec<String>) -> Self {
        self.arguments = arguments;
        self
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: TimeoutPolicy) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_log_file(mut self, log_file: impl Into<PathBuf>) -> Self {
        self.log_file = Some(log_file.into());
        self
    }

    pub fn log_file(&self) -> Option<&Path> {
        self.log_file.as_deref()
    }

    /// Arguments with credential-bearing header values masked.
    pub fn redacted_arguments(&self) -> Vec<String> {
        self.arguments.iter().map(|a| redact_argument(a)).collect()
    }
}

impl fmt::Debug for BackendInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendInvocation")
            .field("executable", &self.executable)
            .field("arguments", &self.redacted_arguments())
            .field("working_directory", &self.working_directory)
            .field("timeout", &self.timeout)
            .field("log_file", &self.log_file)
            .finish()
    }
}

fn redact_argument(arg: &str) -> String {
    let Some(header) = arg.strip_prefix("--header=") else {
        if arg.starts_with("--rpc-secret=") {
            return "--rpc-secret=<redacted>".to_string();
        }
        return arg.to_string();
    };
    match header.split_once(':') {
        Some((name, _)) if name.trim().eq_ignore_ascii_case("authorization") => {
            format!("--header={name}: <redacted>")
        }
        _ => arg.to_string(),
    }
}
