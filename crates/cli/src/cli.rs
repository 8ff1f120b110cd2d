//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// RGB-D Capture - depth/color fusion and recording for a motion-tracking sensor
#[derive(Parser, Debug)]
#[command(
    name = "rgbd-capture",
    author,
    version,
    about = "RGB-D capture, fusion and recording pipeline",
    long_about = "Connects to the sensing service, caches pose, point-cloud and color \n\
                  streams by timestamp, fuses depth onto the color image for preview \n\
                  and optionally records the raw streams to disk."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "RGBD_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "compact",
        global = true,
        env = "RGBD_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a capture session
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Summarize a recorded session directory
    Inspect(InspectArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON); defaults apply when omitted
    #[arg(short, long, env = "RGBD_CONFIG")]
    pub config: Option<PathBuf>,

    /// Stop after this many fused frames (0 = unlimited)
    #[arg(long, default_value = "0", env = "RGBD_MAX_FRAMES")]
    pub max_frames: u64,

    /// Session timeout in seconds (0 = no timeout)
    #[arg(long, default_value = "0", env = "RGBD_TIMEOUT")]
    pub timeout: u64,

    /// Enable recording regardless of the configuration
    #[arg(long)]
    pub record: bool,

    /// Override the recording root directory
    #[arg(long, env = "RGBD_RECORD_DIR")]
    pub record_dir: Option<PathBuf>,

    /// Override the application name (first level of the recording path)
    #[arg(long, env = "RGBD_APP_NAME")]
    pub app_name: Option<String>,

    /// Prometheus metrics port (0 = disabled)
    #[arg(long, default_value = "0", env = "RGBD_METRICS_PORT")]
    pub metrics_port: u16,

    /// Validate configuration and exit without running
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `inspect` command
#[derive(Parser, Debug)]
pub struct InspectArgs {
    /// Session directory (`<base_dir>/<app_name>/<yyyyMMddHHmmss>`)
    pub dir: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    Pretty,
    /// Compact single-line format
    #[default]
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run_overrides() {
        let cli = Cli::parse_from([
            "rgbd-capture",
            "-v",
            "run",
            "--max-frames",
            "10",
            "--record",
            "--record-dir",
            "/tmp/rec",
        ]);
        assert_eq!(cli.verbose, 1);
        let Commands::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.max_frames, 10);
        assert!(args.record);
        assert_eq!(args.record_dir, Some(PathBuf::from("/tmp/rec")));
        assert!(args.config.is_none());
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["rgbd-capture", "-q", "-v", "run"]).is_err());
    }

    #[test]
    fn test_inspect_requires_dir() {
        assert!(Cli::try_parse_from(["rgbd-capture", "inspect"]).is_err());
        let cli = Cli::try_parse_from(["rgbd-capture", "inspect", "rec/app/20240101000000", "--json"])
            .unwrap();
        assert!(matches!(cli.command, Commands::Inspect(ref a) if a.json));
    }

    #[test]
    fn test_verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
