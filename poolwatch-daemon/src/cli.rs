//! CLI argument definitions for poolwatch-daemon.
//!
//! Uses `clap` v4 derive macros to parse command-line arguments.

use std::path::PathBuf;

use clap::Parser;

/// Default configuration file location.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/poolwatch/poolwatch.toml";

/// Poolwatch access-log monitoring daemon.
///
/// Tails an nginx JSON access log and sends alerts on backend pool
/// failover and elevated 5xx error rate.
#[derive(Parser, Debug)]
#[command(name = "poolwatch-daemon")]
#[command(version, about, long_about = None)]
pub struct DaemonCli {
    /// Path to poolwatch.toml configuration file.
    ///
    /// When omitted, /etc/poolwatch/poolwatch.toml is used if it exists;
    /// otherwise built-in defaults plus POOLWATCH_* environment variables
    /// apply. An explicitly given path that does not exist is fatal.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Override log level (trace, debug, info, warn, error).
    ///
    /// Takes precedence over the config file and environment variables.
    #[arg(long)]
    pub log_level: Option<String>,

    /// Override log format (json, pretty).
    ///
    /// Takes precedence over the config file and environment variables.
    #[arg(long)]
    pub log_format: Option<String>,

    /// Validate configuration and exit without starting the daemon.
    #[arg(long)]
    pub validate: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_defaults() {
        let cli = DaemonCli::try_parse_from(["poolwatch-daemon"]).unwrap();
        assert!(cli.config.is_none());
        assert!(cli.log_level.is_none());
        assert!(!cli.validate);
    }

    #[test]
    fn parses_all_flags() {
        let cli = DaemonCli::try_parse_from([
            "poolwatch-daemon",
            "--config",
            "/tmp/poolwatch.toml",
            "--log-level",
            "debug",
            "--log-format",
            "pretty",
            "--validate",
        ])
        .unwrap();
        assert_eq!(cli.config.unwrap(), PathBuf::from("/tmp/poolwatch.toml"));
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        assert_eq!(cli.log_format.as_deref(), Some("pretty"));
        assert!(cli.validate);
    }

    #[test]
    fn rejects_unknown_flag() {
        assert!(DaemonCli::try_parse_from(["poolwatch-daemon", "--bogus"]).is_err());
    }
}
