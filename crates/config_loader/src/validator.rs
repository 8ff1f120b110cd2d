//! 配置校验模块
//!
//! 校验规则：
//! - 传感器频率 > 0，图像尺寸与点数 > 0
//! - 缓存容量 >= 1，通道容量 >= 1
//! - 融合周期 > 0，max_depth > 0，内参为正
//! - 外参旋转为单位四元数
//! - 独立线程录制只支持 point_cloud + raw

use contracts::{
    AppConfig, CameraIntrinsics, ColorRecordMode, ContractError, DepthRecordMode, RecordingMode,
};

/// 四元数模长容差
const UNIT_QUATERNION_TOLERANCE: f64 = 1e-6;

/// 校验 AppConfig
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(config: &AppConfig) -> Result<(), ContractError> {
    validate_session(config)?;
    validate_capacities(config)?;
    validate_fusion(config)?;
    validate_recorder(config)?;
    validate_preview(config)?;
    Ok(())
}

/// 校验会话 / mock 传感器参数
fn validate_session(config: &AppConfig) -> Result<(), ContractError> {
    let session = &config.session;
    if session.app_name.trim().is_empty() {
        return Err(ContractError::config_validation(
            "session.app_name",
            "app_name cannot be empty",
        ));
    }
    if session.app_name.contains(['/', '\\']) || session.app_name == ".." {
        return Err(ContractError::config_validation(
            "session.app_name",
            format!("app_name must be a single path component, got '{}'", session.app_name),
        ));
    }

    for (field, rate) in [
        ("session.pose_rate_hz", session.pose_rate_hz),
        ("session.point_cloud_rate_hz", session.point_cloud_rate_hz),
        ("session.color_rate_hz", session.color_rate_hz),
    ] {
        positive(field, rate)?;
    }

    for (field, value) in [
        ("session.image_width", session.image_width),
        ("session.image_height", session.image_height),
        ("session.points_per_cloud", session.points_per_cloud),
    ] {
        if value == 0 {
            return Err(ContractError::config_validation(field, "must be > 0"));
        }
    }
    positive("session.scene_depth_m", session.scene_depth_m as f64)
}

/// 校验缓存与通道容量
fn validate_capacities(config: &AppConfig) -> Result<(), ContractError> {
    for (field, capacity) in [
        ("cache.pose_capacity", config.cache.pose_capacity),
        ("cache.point_cloud_capacity", config.cache.point_cloud_capacity),
        ("cache.color_capacity", config.cache.color_capacity),
        ("ingestion.channel_capacity", config.ingestion.channel_capacity),
    ] {
        if capacity == 0 {
            return Err(ContractError::config_validation(
                field,
                "capacity must be >= 1",
            ));
        }
    }
    Ok(())
}

/// 校验融合参数
fn validate_fusion(config: &AppConfig) -> Result<(), ContractError> {
    let fusion = &config.fusion;
    if fusion.interval_ms == 0 {
        return Err(ContractError::config_validation(
            "fusion.interval_ms",
            "interval_ms must be > 0",
        ));
    }
    positive("fusion.max_depth_m", fusion.max_depth_m as f64)?;
    validate_intrinsics(&fusion.intrinsics)?;

    let norm = fusion
        .extrinsics
        .rotation
        .iter()
        .map(|v| v * v)
        .sum::<f64>()
        .sqrt();
    if (norm - 1.0).abs() > UNIT_QUATERNION_TOLERANCE {
        return Err(ContractError::config_validation(
            "fusion.extrinsics.rotation",
            format!("rotation must be a unit quaternion, norm is {norm}"),
        ));
    }
    if fusion.extrinsics.translation.iter().any(|v| !v.is_finite()) {
        return Err(ContractError::config_validation(
            "fusion.extrinsics.translation",
            "translation must be finite",
        ));
    }
    Ok(())
}

fn validate_intrinsics(k: &CameraIntrinsics) -> Result<(), ContractError> {
    if k.width == 0 || k.height == 0 {
        return Err(ContractError::config_validation(
            "fusion.intrinsics",
            "reference resolution must be > 0",
        ));
    }
    positive("fusion.intrinsics.fx", k.fx)?;
    positive("fusion.intrinsics.fy", k.fy)?;
    if !k.cx.is_finite() || !k.cy.is_finite() {
        return Err(ContractError::config_validation(
            "fusion.intrinsics",
            "principal point must be finite",
        ));
    }
    Ok(())
}

/// 校验录制配置
fn validate_recorder(config: &AppConfig) -> Result<(), ContractError> {
    let recorder = &config.recorder;
    if !recorder.enabled {
        return Ok(());
    }
    if recorder.base_dir.trim().is_empty() {
        return Err(ContractError::config_validation(
            "recorder.base_dir",
            "base_dir cannot be empty",
        ));
    }
    if recorder.mode == RecordingMode::Threaded {
        if recorder.interval_ms == 0 {
            return Err(ContractError::config_validation(
                "recorder.interval_ms",
                "interval_ms must be > 0",
            ));
        }
        // The recording thread never sees fused output
        if recorder.depth_mode != DepthRecordMode::PointCloud
            || recorder.color_mode != ColorRecordMode::Raw
        {
            return Err(ContractError::config_validation(
                "recorder.mode",
                "threaded recording supports only depth_mode = point_cloud and color_mode = raw",
            ));
        }
    }
    Ok(())
}

fn validate_preview(config: &AppConfig) -> Result<(), ContractError> {
    if config.preview.interval_ms == 0 {
        return Err(ContractError::config_validation(
            "preview.interval_ms",
            "interval_ms must be > 0",
        ));
    }
    Ok(())
}

fn positive(field: &str, value: f64) -> Result<(), ContractError> {
    if !(value > 0.0 && value.is_finite()) {
        return Err(ContractError::config_validation(
            field,
            format!("must be a finite value > 0, got {value}"),
        ));
    }
    Ok(())
}
