//! Commands enum and their arguments.

use std::path::PathBuf;

use ariafetch_core::{AcceleratorLogLevel, BackendPreference, MAX_CONNECTIONS_CEILING};
use clap::{Args, Subcommand};

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Download one or more URLs
    Get(GetArgs),

    /// Install the pinned aria2 release into the tools directory
    InstallAria2 {
        /// Reinstall even when aria2c is already present
        #[arg(short, long)]
        force: bool,
    },

    /// Show which aria2c would be used and its version
    Check {
        /// Explicit aria2c path to check
        #[arg(long = "aria2-path", env = "ARIAFETCH_ARIA2_PATH")]
        aria2_path: Option<PathBuf>,
    },

    /// Show resolved data, tools and log directories
    Paths,
}

/// Arguments for `get`.
#[derive(Args, Debug, Clone)]
pub struct GetArgs {
    /// URLs to download
    #[arg(required_unless_present = "url_file")]
    pub urls: Vec<String>,

    /// File with one URL per line (`#` starts a comment)
    #[arg(long = "url-file", conflicts_with = "urls")]
    pub url_file: Option<PathBuf>,

    /// Destination directory (created when missing)
    #[arg(short, long, env = "ARIAFETCH_DEST", default_value = ".")]
    pub dest: PathBuf,

    /// Backend: auto, accelerated or native
    #[arg(short, long, env = "ARIAFETCH_BACKEND", default_value = "auto")]
    pub backend: BackendPreference,

    /// Connections per server for aria2c
    #[arg(
        short,
        long,
        env = "ARIAFETCH_CONNECTIONS",
        default_value_t = MAX_CONNECTIONS_CEILING,
        value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_CONNECTIONS_CEILING))
    )]
    pub connections: u32,

    /// Extra request header, `Name: value` (repeatable)
    #[arg(short = 'H', long = "header", value_parser = parse_header)]
    pub headers: Vec<(String, String)>,

    /// Name of the secret holding a token for this download
    #[arg(long, env = "ARIAFETCH_SECRET")]
    pub secret: Option<String>,

    /// Give up after this many seconds
    #[arg(long, env = "ARIAFETCH_TIMEOUT")]
    pub timeout: Option<u64>,

    /// Drive aria2c through its JSON-RPC daemon
    #[arg(long, env = "ARIAFETCH_RPC")]
    pub rpc: bool,

    /// Do not pass network interfaces to aria2c
    #[arg(long = "no-multi-interface", env = "ARIAFETCH_NO_MULTI_INTERFACE")]
    pub no_multi_interface: bool,

    /// Do not install aria2c when it is missing
    #[arg(long = "no-install", env = "ARIAFETCH_NO_INSTALL")]
    pub no_install: bool,

    /// Explicit aria2c path
    #[arg(long = "aria2-path", env = "ARIAFETCH_ARIA2_PATH")]
    pub aria2_path: Option<PathBuf>,

    /// aria2c console log level: debug, info, notice, warn or error
    #[arg(long = "log-level", env = "ARIAFETCH_LOG_LEVEL", default_value = "notice")]
    pub log_level: AcceleratorLogLevel,
}

/// Parse `Name: value` into a header pair.
pub fn parse_header(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected 'Name: value', got '{raw}'"))?;
    let name = name.trim();
    if name.is_empty() || name.contains(char::is_whitespace) {
        return Err(format!("invalid header name in '{raw}'"));
    }
    Ok((name.to_string(), value.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_header() {
        assert_eq!(
            parse_header("Accept: application/octet-stream").unwrap(),
            ("Accept".to_string(), "application/octet-stream".to_string())
        );
        assert_eq!(
            parse_header("X-Empty:").unwrap(),
            ("X-Empty".to_string(), String::new())
        );
        assert!(parse_header("no colon").is_err());
        assert!(parse_header(": value").is_err());
        assert!(parse_header("Bad Name: value").is_err());
    }
}
