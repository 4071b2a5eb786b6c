//! # Host 层
//!
//! UI 动画引擎的宿主层实现，以 headless 方式驱动 `anim-runtime`。
//!
//! ## 架构说明
//!
//! Host 层负责：
//! - 配置加载与日志初始化
//! - 游戏时钟（时间倍率、暂停、最大帧间隔）
//! - UI 节点场景，为动画定义解析目标名称
//! - 基于动画序列的控件（显示/隐藏动画、屏幕转场）
//!
//! Host 层不包含插值与编排逻辑，只负责按帧推进 Runtime 的执行器。

pub mod app;
pub mod clock;
pub mod config;
pub mod error;
pub mod logging;
pub mod scene;
pub mod widgets;

pub use app::{HostApp, SequenceVariant};
pub use clock::GameClock;
pub use config::{AnimationConfig, AppConfig, ConfigError, LoggingConfig, TimingConfig};
pub use error::{HostError, HostResult};
pub use logging::init_logging;
pub use scene::Scene;
pub use widgets::{ScreenFader, UiAnimation, UiAnimationOptions};
