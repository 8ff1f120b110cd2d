//! # RGB-D Capture CLI
//!
//! 命令行接口入口点。
//!
//! 提供：
//! - 配置加载与验证
//! - 采集会话编排与生命周期管理
//! - 录制回读
//! - 优雅关闭处理

mod cli;
mod commands;
mod error;
mod pipeline;

use anyhow::Result;
use clap::Parser;
use observability::ObservabilityConfig;
use tracing::info;

use cli::{Cli, Commands};
use commands::{run_capture, run_inspect, run_validate};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // The Prometheus exporter is installed together with the subscriber
    let metrics_port = match &cli.command {
        Commands::Run(args) if args.metrics_port != 0 && !args.dry_run => Some(args.metrics_port),
        _ => None,
    };
    init_logging(&cli, metrics_port)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "RGB-D capture CLI starting"
    );

    let result = match &cli.command {
        Commands::Run(args) => run_capture(args).await,
        Commands::Validate(args) => run_validate(args),
        Commands::Inspect(args) => run_inspect(args),
    };

    if let Err(ref e) = result {
        tracing::error!(error = %e, "Command failed");
    }

    result
}

/// Initialize logging (and metrics export) based on CLI options
fn init_logging(cli: &Cli, metrics_port: Option<u16>) -> Result<()> {
    let default_log_level = if cli.quiet {
        "warn"
    } else {
        match cli.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    observability::init_with_config(ObservabilityConfig {
        log_format: cli.log_format.into(),
        metrics_port,
        default_log_level: default_log_level.to_string(),
    })
}
