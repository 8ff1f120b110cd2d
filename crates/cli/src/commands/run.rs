//! `run` command implementation.

use anyhow::{Context, Result};
use contracts::{AppConfig, RecordingMode};
use std::time::Duration;
use tracing::info;

use crate::cli::RunArgs;
use crate::error::CliError;
use crate::pipeline::{CaptureSession, StopReason};

/// Execute the `run` command
pub async fn run_capture(args: &RunArgs) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => {
            info!(config = %path.display(), "Loading configuration");
            if !path.exists() {
                return Err(CliError::config_not_found(path.display().to_string()).into());
            }
            config_loader::ConfigLoader::load_from_path(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?
        }
        None => {
            info!("No configuration file given, using defaults");
            AppConfig::default()
        }
    };

    apply_overrides(&mut config, args);
    config_loader::ConfigLoader::validate(&config).context("Invalid configuration after CLI overrides")?;

    info!(
        app = %config.session.app_name,
        width = config.session.image_width,
        height = config.session.image_height,
        recording = config.recorder.enabled,
        recording_mode = ?config.recorder.mode,
        "Configuration loaded"
    );

    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&config);
        return Ok(());
    }

    let max_frames = (args.max_frames != 0).then_some(args.max_frames);
    let timeout = (args.timeout != 0).then(|| Duration::from_secs(args.timeout));

    let session = CaptureSession::start(&config).context("Failed to start capture session")?;
    info!(?max_frames, ?timeout, "Capture running, press Ctrl+C to stop");

    let reason = session.run_until(max_frames, timeout).await;
    let stats = session.shutdown(reason);
    stats.print_summary();

    if reason == StopReason::Disconnected {
        return Err(CliError::session_fault("sensing service disconnected during capture").into());
    }

    info!("RGB-D capture finished");
    Ok(())
}

fn apply_overrides(config: &mut AppConfig, args: &RunArgs) {
    if args.record {
        info!("Recording enabled from CLI");
        config.recorder.enabled = true;
    }
    if let Some(dir) = &args.record_dir {
        info!(dir = %dir.display(), "Overriding recording directory from CLI");
        config.recorder.base_dir = dir.display().to_string();
    }
    if let Some(name) = &args.app_name {
        info!(app = %name, "Overriding application name from CLI");
        config.session.app_name = name.clone();
    }
}

/// Print configuration summary for dry-run mode
fn print_config_summary(config: &AppConfig) {
    let session = &config.session;
    println!("\n=== Configuration Summary ===\n");
    println!("Session:");
    println!("  App: {}", session.app_name);
    println!(
        "  Rates (Hz): pose {}, point cloud {}, color {}",
        session.pose_rate_hz, session.point_cloud_rate_hz, session.color_rate_hz
    );
    println!(
        "  Color frame: {}x{}, {} points per cloud",
        session.image_width, session.image_height, session.points_per_cloud
    );

    println!("\nFusion:");
    println!("  Interval: {} ms", config.fusion.interval_ms);
    println!("  Max depth: {} m", config.fusion.max_depth_m);
    println!("  Splat radius: {} px", config.fusion.splat_radius);

    println!("\nRecording:");
    if config.recorder.enabled {
        println!("  Directory: {}/{}", config.recorder.base_dir, session.app_name);
        println!(
            "  Depth: {:?}, color: {:?}",
            config.recorder.depth_mode, config.recorder.color_mode
        );
        match config.recorder.mode {
            RecordingMode::Inline => println!("  Mode: inline"),
            RecordingMode::Threaded => {
                println!("  Mode: threaded, every {} ms", config.recorder.interval_ms)
            }
        }
    } else {
        println!("  Disabled");
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn run_args(extra: &[&str]) -> RunArgs {
        let cli = crate::cli::Cli::parse_from(
            ["rgbd-capture", "run"].iter().chain(extra.iter()).copied(),
        );
        match cli.command {
            crate::cli::Commands::Run(args) => args,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_overrides_apply() {
        let mut config = AppConfig::default();
        let args = run_args(&["--record", "--record-dir", "/data/rec", "--app-name", "scan"]);
        apply_overrides(&mut config, &args);
        assert!(config.recorder.enabled);
        assert_eq!(config.recorder.base_dir, "/data/rec");
        assert_eq!(config.session.app_name, "scan");
    }

    #[tokio::test]
    async fn test_missing_config_file() {
        let args = run_args(&["--config", "/definitely/not/here.toml"]);
        let err = run_capture(&args).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CliError>(),
            Some(CliError::ConfigNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_invalid_override_is_rejected() {
        let args = run_args(&["--app-name", "../escape", "--dry-run"]);
        assert!(run_capture(&args).await.is_err());
    }

    #[tokio::test]
    async fn test_dry_run() {
        let args = run_args(&["--dry-run"]);
        assert!(run_capture(&args).await.is_ok());
    }
}
