//! # Config Loader
//!
//! 采集配置加载：TOML / JSON → `AppConfig`，缺省段落取默认值，
//! 加载后按字段路径校验 (`cache.color_capacity`, `recorder.app_name` ...)。
//!
//! # Example
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//! use std::path::Path;
//!
//! let config = ConfigLoader::load_from_path(Path::new("capture.toml")).unwrap();
//! println!("App: {}", config.session.app_name);
//! ```

mod validator;

pub use contracts::AppConfig;

use contracts::ContractError;
use std::path::Path;

/// 配置文件格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML (推荐)
    Toml,
    Json,
}

impl ConfigFormat {
    /// 从文件扩展名推断格式 (大小写不敏感)
    pub fn from_extension(ext: &str) -> Option<Self> {
        if ext.eq_ignore_ascii_case("toml") {
            Some(Self::Toml)
        } else if ext.eq_ignore_ascii_case("json") {
            Some(Self::Json)
        } else {
            None
        }
    }

    fn from_path(path: &Path) -> Result<Self, ContractError> {
        let ext = path.extension().and_then(|e| e.to_str()).ok_or_else(|| {
            ContractError::config_parse("cannot determine file format from extension")
        })?;
        Self::from_extension(ext).ok_or_else(|| {
            ContractError::config_parse(format!("unsupported config format: .{ext}"))
        })
    }

    /// Deserialize without validating; missing sections take their defaults
    pub fn parse(self, content: &str) -> Result<AppConfig, ContractError> {
        let parsed: Result<AppConfig, Box<dyn std::error::Error + Send + Sync>> = match self {
            Self::Toml => toml::from_str(content).map_err(Into::into),
            Self::Json => serde_json::from_str(content).map_err(Into::into),
        };
        parsed.map_err(|e| ContractError::ConfigParse {
            message: format!("{self:?} parse error: {e}"),
            source: Some(e),
        })
    }
}

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Read, parse and validate a `.toml` / `.json` file
    pub fn load_from_path(path: &Path) -> Result<AppConfig, ContractError> {
        let format = ConfigFormat::from_path(path)?;
        let content = std::fs::read_to_string(path)?;
        Self::load_from_str(&content, format)
    }

    pub fn load_from_str(content: &str, format: ConfigFormat) -> Result<AppConfig, ContractError> {
        let config = format.parse(content)?;
        validator::validate(&config)?;
        Ok(config)
    }

    /// Validate an already-built configuration (e.g. after CLI overrides)
    pub fn validate(config: &AppConfig) -> Result<(), ContractError> {
        validator::validate(config)
    }

    pub fn to_toml(config: &AppConfig) -> Result<String, ContractError> {
        toml::to_string_pretty(config)
            .map_err(|e| ContractError::config_parse(format!("TOML serialize error: {e}")))
    }

    pub fn to_json(config: &AppConfig) -> Result<String, ContractError> {
        serde_json::to_string_pretty(config)
            .map_err(|e| ContractError::config_parse(format!("JSON serialize error: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{DepthRecordMode, DropPolicy, RecordingMode};

    const CAPTURE_TOML: &str = r#"
[session]
app_name = "lab"
image_width = 160
image_height = 90

[fusion]
max_depth_m = 6.0

[recorder]
enabled = true
base_dir = "/tmp/captures"
mode = "threaded"
interval_ms = 50
"#;

    #[test]
    fn test_load_from_str_toml() {
        let result = ConfigLoader::load_from_str(CAPTURE_TOML, ConfigFormat::Toml);
        assert!(result.is_ok(), "Failed: {:?}", result.err());
        let config = result.unwrap();
        assert_eq!(config.session.app_name, "lab");
        assert_eq!(config.fusion.max_depth_m, 6.0);
        assert_eq!(config.recorder.interval_ms, 50);
    }

    #[test]
    fn test_round_trip_toml() {
        let config = ConfigLoader::load_from_str(CAPTURE_TOML, ConfigFormat::Toml).unwrap();
        let serialized = ConfigLoader::to_toml(&config).unwrap();
        let again = ConfigLoader::load_from_str(&serialized, ConfigFormat::Toml).unwrap();
        assert_eq!(config.session.app_name, again.session.app_name);
        assert_eq!(config.recorder.mode, again.recorder.mode);
        assert_eq!(config.fusion.intrinsics, again.fusion.intrinsics);
    }

    #[test]
    fn test_round_trip_json() {
        let config = ConfigLoader::load_from_str(CAPTURE_TOML, ConfigFormat::Toml).unwrap();
        let json = ConfigLoader::to_json(&config).unwrap();
        let again = ConfigLoader::load_from_str(&json, ConfigFormat::Json).unwrap();
        assert_eq!(config.session.image_width, again.session.image_width);
    }

    #[test]
    fn test_validation_runs_after_parse() {
        let content = "[cache]\ncolor_capacity = 0\n";
        let result = ConfigLoader::load_from_str(content, ConfigFormat::Toml);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("cache.color_capacity"));
    }

    #[test]
    fn test_load_from_path_detects_format() {
        let dir = std::env::temp_dir().join(format!("config-loader-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        let toml_path = dir.join("capture.toml");
        std::fs::write(&toml_path, CAPTURE_TOML).unwrap();
        assert!(ConfigLoader::load_from_path(&toml_path).is_ok());

        let yaml_path = dir.join("capture.yaml");
        std::fs::write(&yaml_path, "session: {}").unwrap();
        let err = ConfigLoader::load_from_path(&yaml_path).unwrap_err();
        assert!(err.to_string().contains("unsupported config format"));

        assert!(matches!(
            ConfigLoader::load_from_path(&dir.join("missing.toml")),
            Err(ContractError::Io(_))
        ));
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_parse_toml_sections() {
        let content = r#"
[session]
app_name = "bench"
point_cloud_rate_hz = 10.0

[ingestion]
drop_policy = "drop_newest"

[cache]
pose_capacity = 16

[fusion]
splat_radius = 2
[fusion.intrinsics]
width = 640
height = 480
fx = 500.0
fy = 500.0
cx = 320.0
cy = 240.0

[recorder]
enabled = true
depth_mode = "depth_image"
mode = "inline"
"#;
        let config = ConfigFormat::Toml.parse(content).unwrap();
        assert_eq!(config.session.app_name, "bench");
        assert_eq!(config.session.point_cloud_rate_hz, 10.0);
        assert_eq!(config.session.pose_rate_hz, 60.0);
        assert_eq!(config.ingestion.drop_policy, DropPolicy::DropNewest);
        assert_eq!(config.cache.pose_capacity, 16);
        assert_eq!(config.cache.color_capacity, 7);
        assert_eq!(config.fusion.splat_radius, 2);
        assert_eq!(config.fusion.intrinsics.width, 640);
        assert!(config.recorder.enabled);
        assert_eq!(config.recorder.depth_mode, DepthRecordMode::DepthImage);
        assert_eq!(config.recorder.mode, RecordingMode::Inline);
    }

    #[test]
    fn test_parse_json_minimal() {
        let content = r#"{
            "session": { "image_width": 64, "image_height": 48 },
            "recorder": { "enabled": true, "color_mode": "rgba" }
        }"#;
        let config = ConfigFormat::Json.parse(content).unwrap();
        assert_eq!(config.session.image_width, 64);
        assert!(config.recorder.enabled);
    }

    #[test]
    fn test_empty_document_is_default() {
        let config = ConfigFormat::Toml.parse("").unwrap();
        assert_eq!(config.fusion.interval_ms, 30);
        assert_eq!(config.preview.interval_ms, 500);
    }

    #[test]
    fn test_parse_toml_syntax_error() {
        let result = ConfigFormat::Toml.parse("invalid toml [[[");
        assert!(matches!(result, Err(ContractError::ConfigParse { .. })));
    }

    #[test]
    fn test_unknown_enum_value() {
        let result = ConfigFormat::Toml.parse("[recorder]\nmode = \"sometimes\"\n");
        assert!(matches!(result, Err(ContractError::ConfigParse { .. })));
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            ConfigFormat::from_extension("toml"),
            Some(ConfigFormat::Toml)
        );
        assert_eq!(
            ConfigFormat::from_extension("TOML"),
            Some(ConfigFormat::Toml)
        );
        assert_eq!(
            ConfigFormat::from_extension("json"),
            Some(ConfigFormat::Json)
        );
        assert_eq!(ConfigFormat::from_extension("yaml"), None);
    }
}
