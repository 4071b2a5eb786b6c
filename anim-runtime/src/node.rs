//! # Node 模块
//!
//! 标准的可动画 UI 节点实现。
//!
//! `UiNode` 使用 `RefCell` 保存状态，通过 `Rc<UiNode>` 共享所有权；
//! 动画操作只持有 `TargetRef` 弱引用。
//!
//! 可选组件决定节点具备的能力：
//! - 矩形锚点 → `Capability::RectAnchors`
//! - 图片颜色 → `Capability::Colour`
//! - 透明度组 → `Capability::Opacity`

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::math::{Color, Quat, Vec2, Vec3};
use crate::target::{Animatable, Capability, PropertyValue};

/// 矩形锚点
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Anchors {
    pub min: Vec2,
    pub max: Vec2,
}

impl Default for Anchors {
    fn default() -> Self {
        Self {
            min: Vec2::ZERO,
            max: Vec2::ONE,
        }
    }
}

/// 节点状态快照
#[derive(Debug, Clone, PartialEq)]
pub struct NodeState {
    /// 是否激活
    pub active: bool,
    /// 本地缩放
    pub local_scale: Vec3,
    /// 旋转
    pub rotation: Quat,
    /// 位置（节点没有层级，世界坐标即本地坐标）
    pub position: Vec3,
    /// 矩形锚点（没有矩形组件时为 `None`）
    pub anchors: Option<Anchors>,
    /// 图片颜色（没有图片组件时为 `None`）
    pub colour: Option<Color>,
    /// 透明度组 alpha（没有透明度组时为 `None`）
    pub opacity: Option<f32>,
}

impl Default for NodeState {
    fn default() -> Self {
        Self {
            active: true,
            local_scale: Vec3::ONE,
            rotation: Quat::IDENTITY,
            position: Vec3::ZERO,
            anchors: None,
            colour: None,
            opacity: None,
        }
    }
}

/// 可动画 UI 节点
#[derive(Debug)]
pub struct UiNode {
    name: String,
    state: RefCell<NodeState>,
    /// 成功写入次数
    writes: Cell<usize>,
}

impl UiNode {
    /// 创建只有变换的节点
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: RefCell::new(NodeState::default()),
            writes: Cell::new(0),
        }
    }

    /// 添加矩形组件
    pub fn with_rect(self, anchors: Anchors) -> Self {
        self.state.borrow_mut().anchors = Some(anchors);
        self
    }

    /// 添加图片组件
    pub fn with_image(self, colour: Color) -> Self {
        self.state.borrow_mut().colour = Some(colour);
        self
    }

    /// 添加透明度组
    pub fn with_canvas_group(self, alpha: f32) -> Self {
        self.state.borrow_mut().opacity = Some(alpha);
        self
    }

    /// 设置初始激活状态
    pub fn with_active(self, active: bool) -> Self {
        self.state.borrow_mut().active = active;
        self
    }

    /// 包装为共享节点
    pub fn shared(self) -> Rc<Self> {
        Rc::new(self)
    }

    /// 状态快照
    pub fn snapshot(&self) -> NodeState {
        self.state.borrow().clone()
    }

    pub fn is_active(&self) -> bool {
        self.state.borrow().active
    }

    pub fn local_scale(&self) -> Vec3 {
        self.state.borrow().local_scale
    }

    pub fn rotation(&self) -> Quat {
        self.state.borrow().rotation
    }

    pub fn position(&self) -> Vec3 {
        self.state.borrow().position
    }

    pub fn anchors(&self) -> Option<Anchors> {
        self.state.borrow().anchors
    }

    pub fn colour(&self) -> Option<Color> {
        self.state.borrow().colour
    }

    pub fn opacity(&self) -> Option<f32> {
        self.state.borrow().opacity
    }

    /// 累计成功写入次数
    pub fn write_count(&self) -> usize {
        self.writes.get()
    }
}

impl Animatable for UiNode {
    fn name(&self) -> &str {
        &self.name
    }

    fn supports(&self, capability: Capability) -> bool {
        let state = self.state.borrow();
        match capability {
            Capability::Transform => true,
            Capability::RectAnchors => state.anchors.is_some(),
            Capability::Colour => state.colour.is_some(),
            Capability::Opacity => state.opacity.is_some(),
        }
    }

    fn write(&self, value: PropertyValue) -> bool {
        let mut state = self.state.borrow_mut();
        let written = match value {
            PropertyValue::Active(active) => {
                state.active = active;
                true
            }
            PropertyValue::LocalScale(scale) => {
                state.local_scale = scale;
                true
            }
            PropertyValue::Rotation(rotation) => {
                state.rotation = rotation;
                true
            }
            PropertyValue::Position(position) => {
                state.position = position;
                true
            }
            PropertyValue::Anchors { min, max } => match state.anchors.as_mut() {
                Some(anchors) => {
                    *anchors = Anchors { min, max };
                    true
                }
                None => false,
            },
            PropertyValue::Colour(colour) => match state.colour.as_mut() {
                Some(c) => {
                    *c = colour;
                    true
                }
                None => false,
            },
            PropertyValue::Opacity(alpha) => match state.opacity.as_mut() {
                Some(a) => {
                    *a = alpha;
                    true
                }
                None => false,
            },
        };

        if written {
            self.writes.set(self.writes.get() + 1);
        }
        written
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::TargetRef;

    #[test]
    fn test_weak_reference_does_not_own() {
        let node = UiNode::new("weak").shared();
        let target: TargetRef = (&node).into();
        assert_eq!(target.name().as_deref(), Some("weak"));

        drop(node);
        assert!(!target.is_alive());
    }

    #[test]
    fn test_default_state() {
        let node = UiNode::new("panel");
        assert!(node.is_active());
        assert_eq!(node.local_scale(), Vec3::ONE);
        assert_eq!(node.opacity(), None);
        assert!(node.supports(Capability::Transform));
        assert!(!node.supports(Capability::Opacity));
    }

    #[test]
    fn test_components_grant_capabilities() {
        let node = UiNode::new("fader")
            .with_rect(Anchors::default())
            .with_image(Color::BLACK)
            .with_canvas_group(0.0);

        assert!(node.supports(Capability::RectAnchors));
        assert!(node.supports(Capability::Colour));
        assert!(node.supports(Capability::Opacity));
    }

    #[test]
    fn test_write_missing_component() {
        let node = UiNode::new("plain");
        assert!(!node.write(PropertyValue::Opacity(0.5)));
        assert_eq!(node.write_count(), 0);

        assert!(node.write(PropertyValue::Active(false)));
        assert!(!node.is_active());
        assert_eq!(node.write_count(), 1);
    }
}
