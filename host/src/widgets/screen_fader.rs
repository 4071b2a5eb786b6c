//! 全屏转场遮罩
//!
//! 遮罩的矩形锚点从覆盖全屏之外收缩到屏幕中心点（显示），或反向展开（隐藏）。
//! 隐藏时面板在遮罩展开结束后才停用。

use std::rc::Rc;

use anim_runtime::{
    Anchors, AnimationOperation, AnimationSequence, Color, EaseType, TargetRef, TaskBridge,
    UiNode, Vec2,
};
use tracing::debug;

use crate::scene::Scene;

/// 遮罩展开时的锚点（超出屏幕）
const OPEN: (Vec2, Vec2) = (Vec2::new(-1.0, -1.0), Vec2::new(2.0, 2.0));
/// 遮罩收缩时的锚点（屏幕中心）
const CLOSED: (Vec2, Vec2) = (Vec2::new(0.5, 0.5), Vec2::new(0.5, 0.5));

/// 全屏转场遮罩
pub struct ScreenFader {
    panel: TargetRef,
    mask: TargetRef,
    bridge: Rc<dyn TaskBridge>,
    current: Option<AnimationSequence>,
}

impl ScreenFader {
    /// 面板节点名称
    pub const PANEL: &'static str = "screen_fader_panel";
    /// 遮罩节点名称
    pub const MASK: &'static str = "screen_fader_mask";

    pub fn new(panel: TargetRef, mask: TargetRef, bridge: Rc<dyn TaskBridge>) -> Self {
        Self {
            panel,
            mask,
            bridge,
            current: None,
        }
    }

    /// 在场景中创建面板与遮罩节点
    pub fn spawn(scene: &mut Scene, bridge: Rc<dyn TaskBridge>) -> Self {
        let panel = scene.spawn(UiNode::new(Self::PANEL).with_active(false));
        let mask = scene.spawn(
            UiNode::new(Self::MASK)
                .with_rect(Anchors {
                    min: OPEN.0,
                    max: OPEN.1,
                })
                .with_image(Color::BLACK),
        );
        Self::new(TargetRef::new(&panel), TargetRef::new(&mask), bridge)
    }

    /// 显示序列：激活面板，遮罩收缩到中心
    pub fn show_sequence(&self, duration: f32) -> AnimationSequence {
        AnimationSequence::with_operations(
            [
                AnimationOperation::activate(self.panel.clone(), true),
                AnimationOperation::anchors(self.mask.clone(), OPEN, CLOSED, duration)
                    .with_easing(EaseType::QuarticIn),
            ],
            self.bridge.clone(),
        )
    }

    /// 隐藏序列：遮罩展开，结束后停用面板
    pub fn hide_sequence(&self, duration: f32) -> AnimationSequence {
        AnimationSequence::with_operations(
            [
                AnimationOperation::anchors(self.mask.clone(), CLOSED, OPEN, duration)
                    .with_easing(EaseType::QuarticIn),
                AnimationOperation::activate(self.panel.clone(), false).with_delay(duration),
            ],
            self.bridge.clone(),
        )
    }

    /// 播放转场；正在进行的转场会先被停止
    pub fn fade(&mut self, duration: f32, show: bool) -> AnimationSequence {
        if let Some(current) = self.current.take() {
            current.stop();
        }

        let sequence = if show {
            self.show_sequence(duration)
        } else {
            self.hide_sequence(duration)
        };
        debug!(duration, show, "屏幕转场");
        sequence.play();
        self.current = Some(sequence.clone());
        sequence
    }
}
