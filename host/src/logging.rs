//! # Logging 模块
//!
//! 初始化 `tracing` 输出。日志写到 stderr，stdout 留给命令输出。

use tracing::Level;

/// 安装全局 fmt subscriber
///
/// 重复调用（例如测试中）时返回 `false`，不会覆盖已安装的 subscriber。
pub fn init_logging(level: Level) -> bool {
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .is_ok()
}
