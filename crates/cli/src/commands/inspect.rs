//! `inspect` command implementation.

use anyhow::{Context, Result};
use recorder::SessionSummary;
use serde::Serialize;
use tracing::info;

use crate::cli::InspectArgs;

#[derive(Serialize)]
struct SessionInfo {
    dir: String,
    pose_records: usize,
    valid_poses: usize,
    point_cloud_records: usize,
    total_points: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    first_timestamp: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_timestamp: Option<f64>,
    color_bytes: u64,
    depth_bytes: u64,
}

impl From<&SessionSummary> for SessionInfo {
    fn from(summary: &SessionSummary) -> Self {
        Self {
            dir: summary.dir.display().to_string(),
            pose_records: summary.pose_records,
            valid_poses: summary.valid_poses,
            point_cloud_records: summary.point_cloud_records,
            total_points: summary.total_points,
            first_timestamp: summary.time_span.map(|(first, _)| first),
            last_timestamp: summary.time_span.map(|(_, last)| last),
            color_bytes: summary.color_bytes,
            depth_bytes: summary.depth_bytes,
        }
    }
}

/// Execute the `inspect` command
pub fn run_inspect(args: &InspectArgs) -> Result<()> {
    info!(dir = %args.dir.display(), "Inspecting recording");

    if !args.dir.is_dir() {
        anyhow::bail!("Recording directory not found: {}", args.dir.display());
    }

    let summary = SessionSummary::load(&args.dir)
        .with_context(|| format!("Failed to read recording in {}", args.dir.display()))?;

    if args.json {
        let json = serde_json::to_string_pretty(&SessionInfo::from(&summary))
            .context("Failed to serialize recording summary")?;
        println!("{}", json);
    } else {
        print!("{}", summary);
    }
    Ok(())
}
