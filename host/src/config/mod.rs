//! # Config 模块
//!
//! 运行时配置管理，集中管理所有配置项。
//!
//! ## 配置优先级
//!
//! 1. 命令行参数（最高）
//! 2. 配置文件 (config.json)
//! 3. 默认值（最低）

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use tracing::{Level, info, warn};

/// 应用配置
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// 时间配置
    #[serde(default)]
    pub timing: TimingConfig,

    /// 日志配置
    #[serde(default)]
    pub logging: LoggingConfig,

    /// 动画定义配置
    #[serde(default)]
    pub animations: AnimationConfig,
}

/// 时间配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimingConfig {
    /// headless 模式的固定帧率
    #[serde(default = "default_frame_rate")]
    pub frame_rate: u32,

    /// 缩放时间倍率（0 表示暂停）
    #[serde(default = "default_time_scale")]
    pub time_scale: f32,

    /// 单帧最大间隔（秒），防止卡顿后动画跳跃
    #[serde(default = "default_max_delta")]
    pub max_delta: f32,
}

/// 日志配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// 日志级别（trace/debug/info/warn/error）
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// 动画定义配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationConfig {
    /// 动画定义目录
    #[serde(default = "default_animations_dir")]
    pub dir: PathBuf,

    /// 控件默认是否使用非缩放时间
    #[serde(default)]
    pub use_unscaled_time: bool,
}

// 默认值函数
fn default_frame_rate() -> u32 {
    60
}

fn default_time_scale() -> f32 {
    1.0
}

fn default_max_delta() -> f32 {
    0.25
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_animations_dir() -> PathBuf {
    PathBuf::from("assets/animations")
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            frame_rate: default_frame_rate(),
            time_scale: default_time_scale(),
            max_delta: default_max_delta(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            dir: default_animations_dir(),
            use_unscaled_time: false,
        }
    }
}

impl TimingConfig {
    /// 固定帧间隔（秒）
    pub fn frame_delta(&self) -> f32 {
        1.0 / self.frame_rate.max(1) as f32
    }
}

impl LoggingConfig {
    /// 解析日志级别
    pub fn level(&self) -> Result<Level, ConfigError> {
        parse_level(&self.level)
    }
}

/// 解析日志级别字符串（大小写不敏感）
pub fn parse_level(level: &str) -> Result<Level, ConfigError> {
    Level::from_str(level.trim())
        .map_err(|_| ConfigError::ValidationFailed(format!("未知的日志级别: {level}")))
}

impl AppConfig {
    /// 加载配置文件
    ///
    /// 如果文件不存在或解析失败，返回默认配置并打印警告。
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            warn!(path = %path.display(), "配置文件不存在，使用默认配置");
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(config) => {
                    info!(path = %path.display(), "配置文件加载成功");
                    config
                }
                Err(e) => {
                    warn!(error = %e, "配置文件解析失败，使用默认配置");
                    Self::default()
                }
            },
            Err(e) => {
                warn!(error = %e, "配置文件读取失败，使用默认配置");
                Self::default()
            }
        }
    }

    /// 保存配置到文件
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializationFailed(e.to_string()))?;

        fs::write(path, json).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timing.frame_rate == 0 {
            return Err(ConfigError::ValidationFailed(
                "帧率必须大于 0".to_string(),
            ));
        }

        if !self.timing.time_scale.is_finite() || self.timing.time_scale < 0.0 {
            return Err(ConfigError::ValidationFailed(
                "时间倍率必须是非负数".to_string(),
            ));
        }

        if self.timing.max_delta.is_nan() || self.timing.max_delta <= 0.0 {
            return Err(ConfigError::ValidationFailed(
                "单帧最大间隔必须大于 0".to_string(),
            ));
        }

        self.logging.level()?;

        Ok(())
    }
}

/// 配置错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// 序列化失败
    #[error("配置序列化失败: {0}")]
    SerializationFailed(String),
    /// IO 错误
    #[error("配置 IO 错误: {0}")]
    IoError(String),
    /// 验证失败
    #[error("配置验证失败: {0}")]
    ValidationFailed(String),
}
