//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::{AppConfig, RecordingMode};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    app_name: String,
    image_size: (u32, u32),
    fusion_interval_ms: u64,
    recording: bool,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(config) => {
            let warnings = collect_warnings(&config);
            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: (!warnings.is_empty()).then_some(warnings),
                summary: Some(ConfigSummary {
                    version: format!("{:?}", config.version),
                    app_name: config.session.app_name.clone(),
                    image_size: (config.session.image_width, config.session.image_height),
                    fusion_interval_ms: config.fusion.interval_ms,
                    recording: config.recorder.enabled,
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Non-fatal issues
fn collect_warnings(config: &AppConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    if config.session.fail_connect {
        warnings.push("session.fail_connect is set - every run will end in a session fault".to_string());
    }

    if config.recorder.enabled && config.recorder.mode == RecordingMode::Threaded {
        warnings.push(
            "threaded recording consumes samples from the same caches as fusion - preview frame rate will drop"
                .to_string(),
        );
    }

    // Fusion polls faster than clouds arrive: most cycles will be skipped
    let cloud_period_ms = 1000.0 / config.session.point_cloud_rate_hz;
    if (config.fusion.interval_ms as f64) * 4.0 < cloud_period_ms {
        warnings.push(format!(
            "fusion.interval_ms ({}) is far below the point cloud period ({:.0} ms)",
            config.fusion.interval_ms, cloud_period_ms
        ));
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  App: {}", summary.app_name);
            println!("  Image: {}x{}", summary.image_size.0, summary.image_size.1);
            println!("  Fusion interval: {} ms", summary.fusion_interval_ms);
            println!("  Recording: {}", if summary.recording { "on" } else { "off" });
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
