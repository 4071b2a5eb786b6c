//! # Anim Runtime
//!
//! UI 动画编排引擎的核心库。
//!
//! ## 架构概述
//!
//! `anim-runtime` 是纯逻辑核心，不依赖任何渲染引擎或 IO。
//! 它把声明式的动画描述转换为可恢复任务，通过 **执行桥** 交给宿主逐帧驱动：
//!
//! ```text
//! Host                          Runtime
//!   │                              │
//!   │──── sequence.play() ───────►│
//!   │◄─── submit(Task) ───────────│
//!   │                              │
//!   │ executor.tick(FrameTime)     │
//!   │──── poll ──────────────────►│ 写入目标属性
//!   │◄─── Wait / NextFrame / Done ─│
//! ```
//!
//! ## 核心类型
//!
//! - [`EaseType`]：缓动曲线
//! - [`AnimationOperation`]：对一个目标属性的一次定时修改
//! - [`AnimationSequence`]：按顺序组合的操作，支持反向、往返、循环、完成通知
//! - [`TaskBridge`] / [`Executor`]：任务提交/取消与逐帧执行
//! - [`Animatable`] / [`TargetRef`]：动画目标接口与弱引用
//! - [`SequenceDef`]：可序列化的序列定义
//!
//! ## 使用示例
//!
//! ```ignore
//! use anim_runtime::{AnimationOperation, AnimationSequence, Executor, FrameTime, UiNode};
//!
//! let executor = Executor::new();
//! let panel = UiNode::new("panel").with_canvas_group(0.0).shared();
//!
//! let sequence = AnimationSequence::new(executor.bridge());
//! sequence.add_operation(AnimationOperation::fade((&panel).into(), 0.0, 1.0, 0.5));
//! sequence.play();
//!
//! loop {
//!     executor.tick(FrameTime::uniform(1.0 / 60.0));
//! }
//! ```
//!
//! ## 模块结构
//!
//! - [`easing`]：缓动函数
//! - [`math`] / [`lerp`]：数学类型与插值
//! - [`target`] / [`node`]：动画目标
//! - [`task`] / [`routine`]：任务、执行桥与执行器
//! - [`operation`] / [`sequence`]：动画操作与序列
//! - [`definition`]：序列化定义
//! - [`error`]：错误类型定义

pub mod definition;
pub mod easing;
pub mod error;
pub mod lerp;
pub mod math;
pub mod node;
pub mod operation;
pub mod routine;
pub mod sequence;
pub mod target;
pub mod task;

// 重导出核心类型
pub use definition::{OperationDef, SequenceDef, SequenceLibrary, TargetResolver};
pub use easing::{EaseFn, EaseType};
pub use error::{AnimError, AnimResult, DefinitionError};
pub use lerp::{Lerp, Slerp, lerp, slerp};
pub use math::{Color, Quat, Vec2, Vec3};
pub use node::{Anchors, NodeState, UiNode};
pub use operation::{AnimationOperation, OperationKind, OperationSettings};
pub use routine::{LerpBundle, LerpRoutine, TimelineRoutine, TimelineStep};
pub use sequence::{
    AnimationSequence, FinishedHandler, PlanStep, SequenceState, TimelinePlan,
    ping_pong_operations, sequence_duration,
};
pub use target::{Animatable, Capability, PropertyValue, TargetRef};
pub use task::{Clock, Executor, FrameTime, Phase, Step, Task, TaskBridge, TaskContext, TaskHandle};
