//! Root CLI parser and global options.

use clap::Parser;

use crate::commands::Commands;

/// Multi-connection file downloader with a native fallback.
#[derive(Parser, Debug)]
#[command(name = "ariafetch")]
#[command(about = "Fetch files with aria2c, falling back to a native HTTP transfer")]
#[command(version)]
pub struct Cli {
    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::GetArgs;
    use ariafetch_core::{AcceleratorLogLevel, BackendPreference};
    use clap::CommandFactory;

    fn get(args: &[&str]) -> GetArgs {
        let argv = ["ariafetch", "get"].iter().chain(args).copied();
        match Cli::try_parse_from(argv).unwrap().command {
            Commands::Get(args) => args,
            other => panic!("expected get, got {other:?}"),
        }
    }

    #[test]
    fn test_cli_parser_builds() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_get_defaults() {
        let args = get(&["https://example.com/archive.zip"]);
        assert_eq!(args.urls, ["https://example.com/archive.zip"]);
        assert_eq!(args.backend, BackendPreference::Auto);
        assert_eq!(args.connections, 16);
        assert_eq!(args.log_level, AcceleratorLogLevel::Notice);
        assert!(!args.rpc);
        assert!(args.headers.is_empty());
    }

    #[test]
    fn test_get_full_options() {
        let args = get(&[
            "--dest",
            "/tmp/dl",
            "--backend",
            "native",
            "-c",
            "4",
            "-H",
            "X-Trace: 1",
            "--secret",
            "github-token",
            "--timeout",
            "30",
            "--rpc",
            "--log-level",
            "warn",
            "https://example.com/a.bin",
            "https://example.com/b.bin",
        ]);
        assert_eq!(args.urls.len(), 2);
        assert_eq!(args.dest, std::path::PathBuf::from("/tmp/dl"));
        assert_eq!(args.backend, BackendPreference::Native);
        assert_eq!(args.connections, 4);
        assert_eq!(args.headers, [("X-Trace".to_string(), "1".to_string())]);
        assert_eq!(args.secret.as_deref(), Some("github-token"));
        assert_eq!(args.timeout, Some(30));
        assert!(args.rpc);
        assert_eq!(args.log_level, AcceleratorLogLevel::Warn);
    }

    #[test]
    fn test_get_rejects_bad_values() {
        let parse = |extra: &[&str]| {
            let argv = ["ariafetch", "get"]
                .iter()
                .chain(extra)
                .chain(&["https://example.com/a"])
                .copied()
                .collect::<Vec<_>>();
            Cli::try_parse_from(argv)
        };
        assert!(parse(&["--connections", "0"]).is_err());
        assert!(parse(&["--connections", "17"]).is_err());
        assert!(parse(&["--backend", "torrent"]).is_err());
        assert!(parse(&["--header", "nocolon"]).is_err());
    }

    #[test]
    fn test_get_requires_a_source() {
        assert!(Cli::try_parse_from(["ariafetch", "get"]).is_err());
        let args = Cli::try_parse_from(["ariafetch", "get", "--url-file", "urls.txt"]).unwrap();
        assert!(matches!(args.command, Commands::Get(a) if a.urls.is_empty()));
    }

    #[test]
    fn test_global_verbose() {
        let cli = Cli::try_parse_from(["ariafetch", "paths", "--verbose"]).unwrap();
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Paths));
    }
}
