//! # Error 模块
//!
//! 定义 anim-runtime 中使用的错误类型。
//!
//! 动画运行本身不会失败（目标销毁、缺少组件都会降级为空操作），
//! 只有加载序列化的动画定义时才会返回错误。

use thiserror::Error;

/// 动画定义错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DefinitionError {
    /// 目标未找到
    #[error("操作 #{index}：目标 '{name}' 未找到")]
    UnknownTarget { index: usize, name: String },

    /// 目标名称为空
    #[error("操作 #{index}：目标名称为空")]
    EmptyTargetName { index: usize },

    /// 时间为负数
    #[error("操作 #{index}：{field} 不能为负数（{value}）")]
    NegativeTime {
        index: usize,
        field: &'static str,
        value: f32,
    },

    /// 序列未定义
    #[error("序列 '{name}' 未定义")]
    UnknownSequence { name: String },
}

/// anim-runtime 统一错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnimError {
    /// 定义错误
    #[error("定义错误: {0}")]
    Definition(#[from] DefinitionError),

    /// JSON 解析失败
    #[error("JSON 解析失败: {message}")]
    Json { message: String },
}

impl From<serde_json::Error> for AnimError {
    fn from(err: serde_json::Error) -> Self {
        AnimError::Json {
            message: err.to_string(),
        }
    }
}

/// Result 类型别名
pub type AnimResult<T> = Result<T, AnimError>;
