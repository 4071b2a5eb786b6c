//! # Target 模块
//!
//! 动画目标抽象。
//!
//! ## 核心概念
//!
//! - `Animatable`: 可被动画写入的实体接口
//! - `Capability`: 实体具备的可写能力（变换、锚点、颜色、透明度）
//! - `TargetRef`: 对实体的弱引用，每次写入前检查存活
//!
//! 动画操作从不拥有目标。实体被销毁后，所有写入都会被静默跳过。

use std::fmt;
use std::rc::{Rc, Weak};

use tracing::trace;

use crate::math::{Color, Quat, Vec2, Vec3};

/// 实体能力
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// 缩放 / 旋转 / 位置
    Transform,
    /// 矩形锚点（anchor min / anchor max）
    RectAnchors,
    /// 颜色组件（如图片）
    Colour,
    /// 透明度组
    Opacity,
}

/// 一次属性写入
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PropertyValue {
    Active(bool),
    LocalScale(Vec3),
    Rotation(Quat),
    Position(Vec3),
    Anchors { min: Vec2, max: Vec2 },
    Colour(Color),
    Opacity(f32),
}

impl PropertyValue {
    /// 写入该值所需的能力；激活标记对所有实体都可用
    pub fn capability(&self) -> Option<Capability> {
        match self {
            PropertyValue::Active(_) => None,
            PropertyValue::LocalScale(_)
            | PropertyValue::Rotation(_)
            | PropertyValue::Position(_) => Some(Capability::Transform),
            PropertyValue::Anchors { .. } => Some(Capability::RectAnchors),
            PropertyValue::Colour(_) => Some(Capability::Colour),
            PropertyValue::Opacity(_) => Some(Capability::Opacity),
        }
    }
}

/// 可动画实体接口
///
/// 实体自己决定如何保存属性；动画系统只通过 `write` 写入。
/// 方法接收 `&self`，实现方使用内部可变性。
pub trait Animatable: 'static {
    /// 实体名称（用于日志）
    fn name(&self) -> &str;

    /// 是否具备某种能力
    fn supports(&self, capability: Capability) -> bool;

    /// 写入属性
    ///
    /// # 返回
    /// - `true`: 写入成功
    /// - `false`: 实体不支持该属性
    fn write(&self, value: PropertyValue) -> bool;
}

/// 目标弱引用
///
/// 可以为空（未设置目标），也可以指向已销毁的实体。
#[derive(Clone, Default)]
pub struct TargetRef {
    inner: Option<Weak<dyn Animatable>>,
}

impl TargetRef {
    /// 空目标
    pub fn none() -> Self {
        Self { inner: None }
    }

    /// 引用一个实体
    pub fn new<T: Animatable>(target: &Rc<T>) -> Self {
        let weak: Weak<T> = Rc::downgrade(target);
        Self {
            inner: Some(weak as Weak<dyn Animatable>),
        }
    }

    /// 引用一个 trait object 实体
    pub fn from_dyn(target: &Rc<dyn Animatable>) -> Self {
        Self {
            inner: Some(Rc::downgrade(target)),
        }
    }

    /// 是否设置了目标（不论是否存活）
    pub fn is_set(&self) -> bool {
        self.inner.is_some()
    }

    /// 目标是否存活
    pub fn is_alive(&self) -> bool {
        self.inner.as_ref().is_some_and(|w| w.strong_count() > 0)
    }

    /// 获取存活的实体
    pub fn upgrade(&self) -> Option<Rc<dyn Animatable>> {
        self.inner.as_ref()?.upgrade()
    }

    /// 目标名称（已销毁返回 `None`）
    pub fn name(&self) -> Option<String> {
        self.upgrade().map(|t| t.name().to_string())
    }

    /// 存活且具备能力
    pub fn supports(&self, capability: Capability) -> bool {
        self.upgrade().is_some_and(|t| t.supports(capability))
    }

    /// 检查存活后写入
    ///
    /// 目标已销毁时跳过写入并返回 `false`。
    pub fn write(&self, value: PropertyValue) -> bool {
        match self.upgrade() {
            Some(target) => target.write(value),
            None => {
                trace!(?value, "目标已销毁，跳过写入");
                false
            }
        }
    }

    /// 是否指向同一个实体
    pub fn same_target(&self, other: &Self) -> bool {
        match (&self.inner, &other.inner) {
            (Some(a), Some(b)) => Weak::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }
}

impl PartialEq for TargetRef {
    fn eq(&self, other: &Self) -> bool {
        self.same_target(other)
    }
}

impl fmt::Debug for TargetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.inner, self.upgrade()) {
            (None, _) => write!(f, "TargetRef(None)"),
            (Some(_), Some(target)) => write!(f, "TargetRef({})", target.name()),
            (Some(_), None) => write!(f, "TargetRef(<destroyed>)"),
        }
    }
}

impl<T: Animatable> From<&Rc<T>> for TargetRef {
    fn from(target: &Rc<T>) -> Self {
        Self::new(target)
    }
}
