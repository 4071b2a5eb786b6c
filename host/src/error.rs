//! # Error 模块
//!
//! Host 层错误类型。

use std::path::PathBuf;

use anim_runtime::{AnimError, DefinitionError};
use thiserror::Error;

use crate::config::ConfigError;

/// Host 统一错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HostError {
    /// 配置错误
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// 动画定义无法绑定到场景
    #[error("动画定义错误: {0}")]
    Definition(#[from] DefinitionError),

    /// 动画定义文件无法解析
    #[error("{path}: {source}")]
    Load { path: PathBuf, source: AnimError },

    /// 文件读取失败
    #[error("读取 {path} 失败: {message}")]
    Io { path: PathBuf, message: String },
}

impl HostError {
    pub(crate) fn io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        HostError::Io {
            path: path.into(),
            message: err.to_string(),
        }
    }
}

/// Result 类型别名
pub type HostResult<T> = Result<T, HostError>;
