//! AppConfig - Config Loader 输出
//!
//! 描述完整的采集配置：会话、缓存、融合、录制、预览。

use serde::{Deserialize, Serialize};

/// 配置版本
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// 完整的采集配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// 配置版本
    #[serde(default)]
    pub version: ConfigVersion,

    /// 会话与 mock 传感器设置
    #[serde(default)]
    pub session: SessionConfig,

    /// 事件通道
    #[serde(default)]
    pub ingestion: IngestionConfig,

    /// 时间戳缓存容量
    #[serde(default)]
    pub cache: CacheConfig,

    /// 深度/彩色融合
    #[serde(default)]
    pub fusion: FusionConfig,

    /// 二进制录制
    #[serde(default)]
    pub recorder: RecorderConfig,

    /// 预览轮询
    #[serde(default)]
    pub preview: PreviewConfig,
}

/// 会话配置 (mock 传感器服务参数)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// 应用名，录制目录的第一级
    #[serde(default = "default_app_name")]
    pub app_name: String,

    /// 位姿频率 (Hz)
    #[serde(default = "default_pose_rate")]
    pub pose_rate_hz: f64,

    /// 点云频率 (Hz)
    #[serde(default = "default_point_cloud_rate")]
    pub point_cloud_rate_hz: f64,

    /// 彩色帧频率 (Hz)
    #[serde(default = "default_color_rate")]
    pub color_rate_hz: f64,

    #[serde(default = "default_image_width")]
    pub image_width: u32,

    #[serde(default = "default_image_height")]
    pub image_height: u32,

    /// 每帧点数
    #[serde(default = "default_points_per_cloud")]
    pub points_per_cloud: u32,

    /// Distance of the synthetic scene plane (meters)
    #[serde(default = "default_scene_depth")]
    pub scene_depth_m: f32,

    /// Simulate a service that refuses to connect
    #[serde(default)]
    pub fail_connect: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            app_name: default_app_name(),
            pose_rate_hz: default_pose_rate(),
            point_cloud_rate_hz: default_point_cloud_rate(),
            color_rate_hz: default_color_rate(),
            image_width: default_image_width(),
            image_height: default_image_height(),
            points_per_cloud: default_points_per_cloud(),
            scene_depth_m: default_scene_depth(),
            fail_connect: false,
        }
    }
}

fn default_app_name() -> String {
    "rgbd-capture".to_string()
}

fn default_pose_rate() -> f64 {
    60.0
}

fn default_point_cloud_rate() -> f64 {
    5.0
}

fn default_color_rate() -> f64 {
    30.0
}

fn default_image_width() -> u32 {
    320
}

fn default_image_height() -> u32 {
    180
}

fn default_points_per_cloud() -> u32 {
    2000
}

fn default_scene_depth() -> f32 {
    2.5
}

/// 丢包策略 (背压满时)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropPolicy {
    /// 丢弃最旧的事件
    #[default]
    DropOldest,
    /// 丢弃最新的事件
    DropNewest,
}

/// 事件通道配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionConfig {
    /// 通道容量
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,

    #[serde(default)]
    pub drop_policy: DropPolicy,
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            channel_capacity: default_channel_capacity(),
            drop_policy: DropPolicy::default(),
        }
    }
}

fn default_channel_capacity() -> usize {
    64
}

/// Default number of slots per timestamp cache
pub const DEFAULT_CACHE_CAPACITY: usize = 7;

/// Cache capacities per stream
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_capacity")]
    pub pose_capacity: usize,

    #[serde(default = "default_cache_capacity")]
    pub point_cloud_capacity: usize,

    #[serde(default = "default_cache_capacity")]
    pub color_capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            pose_capacity: DEFAULT_CACHE_CAPACITY,
            point_cloud_capacity: DEFAULT_CACHE_CAPACITY,
            color_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

fn default_cache_capacity() -> usize {
    DEFAULT_CACHE_CAPACITY
}

/// Pinhole intrinsics of the color camera at a reference resolution
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraIntrinsics {
    pub width: u32,
    pub height: u32,
    pub fx: f64,
    pub fy: f64,
    pub cx: f64,
    pub cy: f64,
}

impl Default for CameraIntrinsics {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            fx: 1042.0,
            fy: 1042.0,
            cx: 637.0,
            cy: 357.0,
        }
    }
}

impl CameraIntrinsics {
    /// Rescale to a frame of a different resolution
    pub fn scaled_to(&self, width: u32, height: u32) -> Self {
        let sx = width as f64 / self.width as f64;
        let sy = height as f64 / self.height as f64;
        Self {
            width,
            height,
            fx: self.fx * sx,
            fy: self.fy * sy,
            cx: self.cx * sx,
            cy: self.cy * sy,
        }
    }
}

/// Color camera pose relative to the depth camera (static device calibration)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extrinsics {
    /// (x, y, z, w)
    pub rotation: [f64; 4],
    pub translation: [f64; 3],
}

impl Default for Extrinsics {
    fn default() -> Self {
        Self {
            rotation: [0.0, 0.0, 0.0, 1.0],
            translation: [0.0; 3],
        }
    }
}

/// 融合配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FusionConfig {
    /// Fixed delay between cycles (ms)
    #[serde(default = "default_fusion_interval")]
    pub interval_ms: u64,

    /// Depth mapped to the "too far" color (meters)
    #[serde(default = "default_max_depth")]
    pub max_depth_m: f32,

    /// Pixel radius a projected point may fill
    #[serde(default = "default_splat_radius")]
    pub splat_radius: u32,

    #[serde(default)]
    pub intrinsics: CameraIntrinsics,

    #[serde(default)]
    pub extrinsics: Extrinsics,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_fusion_interval(),
            max_depth_m: default_max_depth(),
            splat_radius: default_splat_radius(),
            intrinsics: CameraIntrinsics::default(),
            extrinsics: Extrinsics::default(),
        }
    }
}

fn default_fusion_interval() -> u64 {
    30
}

fn default_max_depth() -> f32 {
    10.0
}

fn default_splat_radius() -> u32 {
    3
}

/// Depth stream format on disk
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepthRecordMode {
    /// `point_cloud.bin`: header + raw points
    #[default]
    PointCloud,
    /// `depth.bin`: dense per-pixel f32
    DepthImage,
}

/// Color stream format on disk
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorRecordMode {
    /// Source bytes as delivered
    #[default]
    Raw,
    /// Converted RGBA8
    Rgba,
}

/// Where recording runs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordingMode {
    /// On the fusion thread after each produced frame
    #[default]
    Inline,
    /// On its own periodic task pulling from the data store
    Threaded,
}

/// 录制配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecorderConfig {
    #[serde(default)]
    pub enabled: bool,

    /// Root directory; sessions land in `<base_dir>/<app_name>/<yyyyMMddHHmmss>`
    #[serde(default = "default_base_dir")]
    pub base_dir: String,

    #[serde(default)]
    pub depth_mode: DepthRecordMode,

    #[serde(default)]
    pub color_mode: ColorRecordMode,

    #[serde(default)]
    pub mode: RecordingMode,

    /// Period of the threaded recording loop (ms)
    #[serde(default = "default_recording_interval")]
    pub interval_ms: u64,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_dir: default_base_dir(),
            depth_mode: DepthRecordMode::default(),
            color_mode: ColorRecordMode::default(),
            mode: RecordingMode::default(),
            interval_ms: default_recording_interval(),
        }
    }
}

fn default_base_dir() -> String {
    "./recordings".to_string()
}

fn default_recording_interval() -> u64 {
    30
}

/// 预览配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewConfig {
    #[serde(default = "default_preview_interval")]
    pub interval_ms: u64,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_preview_interval(),
        }
    }
}

fn default_preview_interval() -> u64 {
    500
}
