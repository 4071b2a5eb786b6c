//! # Operation 模块
//!
//! 单个动画操作：对一个目标的一种属性做一次定时修改。
//!
//! ## 操作类型
//!
//! | 类型 | 属性 | 所需能力 |
//! |------|------|----------|
//! | `Activate` | 激活标记 | 无 |
//! | `Scale` | 缩放 | `Transform` |
//! | `Rotate` | 旋转（欧拉角输入） | `Transform` |
//! | `WorldPosition` | 位置 | `Transform` |
//! | `AnchoredPosition` | 矩形锚点 | `RectAnchors` |
//! | `Colour` | 颜色 | `Colour` |
//! | `Fade` | 透明度 | `Opacity` |
//!
//! `prepare` 把操作转换为 `LerpBundle`，目标销毁或缺少能力时得到空操作。

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::easing::{EaseFn, EaseType};
use crate::lerp::{Lerp, lerp};
use crate::math::{Color, Quat, Vec2, Vec3};
use crate::routine::{LerpBundle, LerpRoutine};
use crate::target::{Capability, PropertyValue, TargetRef};
use crate::task::Clock;

/// 操作类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationKind {
    Activate,
    Scale,
    Rotate,
    WorldPosition,
    AnchoredPosition,
    Colour,
    Fade,
}

/// 操作参数
///
/// 每种类型只携带自己的起止值。序列化时以 `kind` 字段区分。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum OperationSettings {
    Activate {
        activate: bool,
    },
    Scale {
        start: Vec3,
        target: Vec3,
    },
    /// 欧拉角（角度制）
    Rotate {
        start_euler: Vec3,
        target_euler: Vec3,
    },
    WorldPosition {
        start: Vec3,
        target: Vec3,
    },
    AnchoredPosition {
        start_min: Vec2,
        start_max: Vec2,
        target_min: Vec2,
        target_max: Vec2,
    },
    Colour {
        start: Color,
        target: Color,
    },
    Fade {
        start_alpha: f32,
        target_alpha: f32,
    },
}

impl OperationSettings {
    /// 对应的操作类型
    pub fn kind(&self) -> OperationKind {
        match self {
            OperationSettings::Activate { .. } => OperationKind::Activate,
            OperationSettings::Scale { .. } => OperationKind::Scale,
            OperationSettings::Rotate { .. } => OperationKind::Rotate,
            OperationSettings::WorldPosition { .. } => OperationKind::WorldPosition,
            OperationSettings::AnchoredPosition { .. } => OperationKind::AnchoredPosition,
            OperationSettings::Colour { .. } => OperationKind::Colour,
            OperationSettings::Fade { .. } => OperationKind::Fade,
        }
    }

    /// 交换起止值；激活类型强制为激活
    pub fn reversed(&self) -> Self {
        match *self {
            OperationSettings::Activate { .. } => OperationSettings::Activate { activate: true },
            OperationSettings::Scale { start, target } => OperationSettings::Scale {
                start: target,
                target: start,
            },
            OperationSettings::Rotate {
                start_euler,
                target_euler,
            } => OperationSettings::Rotate {
                start_euler: target_euler,
                target_euler: start_euler,
            },
            OperationSettings::WorldPosition { start, target } => {
                OperationSettings::WorldPosition {
                    start: target,
                    target: start,
                }
            }
            OperationSettings::AnchoredPosition {
                start_min,
                start_max,
                target_min,
                target_max,
            } => OperationSettings::AnchoredPosition {
                start_min: target_min,
                start_max: target_max,
                target_min: start_min,
                target_max: start_max,
            },
            OperationSettings::Colour { start, target } => OperationSettings::Colour {
                start: target,
                target: start,
            },
            OperationSettings::Fade {
                start_alpha,
                target_alpha,
            } => OperationSettings::Fade {
                start_alpha: target_alpha,
                target_alpha: start_alpha,
            },
        }
    }
}

/// 动画操作
///
/// 值对象：克隆即复制，`with_*` 方法在副本上覆盖单个字段。
/// 目标以弱引用保存，比较时按实体身份比较。
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationOperation {
    pub target: TargetRef,
    pub easing: EaseType,
    /// 在序列中开始前的等待（秒）
    pub delay: f32,
    /// 插值持续时间（秒）
    pub duration: f32,
    pub settings: OperationSettings,
}

impl AnimationOperation {
    /// 创建新的操作
    ///
    /// 负的延迟和持续时间按 0 处理。
    pub fn new(
        target: TargetRef,
        easing: EaseType,
        delay: f32,
        duration: f32,
        settings: OperationSettings,
    ) -> Self {
        Self {
            target,
            easing,
            delay: delay.max(0.0),
            duration: duration.max(0.0),
            settings,
        }
    }

    // ========== 便捷构造 ==========

    /// 立即设置激活状态
    pub fn activate(target: TargetRef, activate: bool) -> Self {
        Self::new(
            target,
            EaseType::None,
            0.0,
            0.0,
            OperationSettings::Activate { activate },
        )
    }

    /// 不作用于任何目标的纯等待
    pub fn wait(delay: f32) -> Self {
        Self::new(
            TargetRef::none(),
            EaseType::None,
            delay,
            0.0,
            OperationSettings::Activate { activate: true },
        )
    }

    pub fn scale(target: TargetRef, start: Vec3, end: Vec3, duration: f32) -> Self {
        Self::new(
            target,
            EaseType::Linear,
            0.0,
            duration,
            OperationSettings::Scale { start, target: end },
        )
    }

    pub fn rotate(target: TargetRef, start_euler: Vec3, target_euler: Vec3, duration: f32) -> Self {
        Self::new(
            target,
            EaseType::Linear,
            0.0,
            duration,
            OperationSettings::Rotate {
                start_euler,
                target_euler,
            },
        )
    }

    pub fn move_to(target: TargetRef, start: Vec3, end: Vec3, duration: f32) -> Self {
        Self::new(
            target,
            EaseType::Linear,
            0.0,
            duration,
            OperationSettings::WorldPosition { start, target: end },
        )
    }

    pub fn anchors(
        target: TargetRef,
        start: (Vec2, Vec2),
        end: (Vec2, Vec2),
        duration: f32,
    ) -> Self {
        Self::new(
            target,
            EaseType::Linear,
            0.0,
            duration,
            OperationSettings::AnchoredPosition {
                start_min: start.0,
                start_max: start.1,
                target_min: end.0,
                target_max: end.1,
            },
        )
    }

    pub fn colour(target: TargetRef, start: Color, end: Color, duration: f32) -> Self {
        Self::new(
            target,
            EaseType::Linear,
            0.0,
            duration,
            OperationSettings::Colour { start, target: end },
        )
    }

    pub fn fade(target: TargetRef, start_alpha: f32, target_alpha: f32, duration: f32) -> Self {
        Self::new(
            target,
            EaseType::Linear,
            0.0,
            duration,
            OperationSettings::Fade {
                start_alpha,
                target_alpha,
            },
        )
    }

    // ========== 字段覆盖 ==========

    pub fn with_target(mut self, target: TargetRef) -> Self {
        self.target = target;
        self
    }

    pub fn with_easing(mut self, easing: EaseType) -> Self {
        self.easing = easing;
        self
    }

    pub fn with_delay(mut self, delay: f32) -> Self {
        self.delay = delay.max(0.0);
        self
    }

    pub fn with_duration(mut self, duration: f32) -> Self {
        self.duration = duration.max(0.0);
        self
    }

    pub fn with_settings(mut self, settings: OperationSettings) -> Self {
        self.settings = settings;
        self
    }

    /// 操作类型
    pub fn kind(&self) -> OperationKind {
        self.settings.kind()
    }

    /// 反向操作：交换起止值，激活类型强制为激活
    pub fn reversed(&self) -> Self {
        Self {
            settings: self.settings.reversed(),
            ..self.clone()
        }
    }

    // ========== 执行 ==========

    /// 生成插值回调
    ///
    /// 目标已销毁或缺少所需能力时返回空操作。
    /// 每个回调在写入前都会重新检查目标是否存活。
    pub fn prepare(&self) -> LerpBundle {
        if !self.target.is_alive() {
            debug!(kind = ?self.kind(), "目标不存在，操作为空");
            return LerpBundle::noop();
        }

        let ease = self.easing.ease_fn();
        match self.settings {
            OperationSettings::Activate { activate } => {
                let target = self.target.clone();
                LerpBundle::instant(move || {
                    target.write(PropertyValue::Active(activate));
                })
            }
            OperationSettings::Scale { start, target } => {
                self.interpolate(Capability::Transform, start, target, ease, PropertyValue::LocalScale)
            }
            OperationSettings::Rotate {
                start_euler,
                target_euler,
            } => self.interpolate(
                Capability::Transform,
                Quat::from_euler_degrees(start_euler),
                Quat::from_euler_degrees(target_euler),
                ease,
                PropertyValue::Rotation,
            ),
            OperationSettings::WorldPosition { start, target } => {
                self.interpolate(Capability::Transform, start, target, ease, PropertyValue::Position)
            }
            OperationSettings::AnchoredPosition {
                start_min,
                start_max,
                target_min,
                target_max,
            } => self.interpolate(
                Capability::RectAnchors,
                (start_min, start_max),
                (target_min, target_max),
                ease,
                |(min, max)| PropertyValue::Anchors { min, max },
            ),
            OperationSettings::Colour { start, target } => {
                self.interpolate(Capability::Colour, start, target, ease, PropertyValue::Colour)
            }
            OperationSettings::Fade {
                start_alpha,
                target_alpha,
            } => self.interpolate(
                Capability::Opacity,
                start_alpha,
                target_alpha,
                ease,
                PropertyValue::Opacity,
            ),
        }
    }

    /// 生成插值任务
    pub fn into_task(&self, clock: Clock) -> LerpRoutine {
        self.prepare().into_task(clock)
    }

    fn interpolate<T: Lerp + 'static>(
        &self,
        capability: Capability,
        start: T,
        end: T,
        ease: Option<EaseFn>,
        value: fn(T) -> PropertyValue,
    ) -> LerpBundle {
        if !self.target.supports(capability) {
            debug!(
                node = ?self.target,
                kind = ?self.kind(),
                ?capability,
                "目标缺少所需组件，操作为空"
            );
            return LerpBundle::noop();
        }

        let Some(ease) = ease else {
            let target = self.target.clone();
            return LerpBundle::instant(move || {
                target.write(value(end));
            });
        };

        let (on_start, on_tick, on_end) = (
            self.target.clone(),
            self.target.clone(),
            self.target.clone(),
        );
        LerpBundle {
            duration: self.duration,
            on_start: Some(Box::new(move || {
                on_start.write(value(start));
            })),
            on_tick: Some(Box::new(move |progress| {
                on_tick.write(value(lerp(start, end, progress, Some(ease))));
            })),
            on_end: Some(Box::new(move || {
                on_end.write(value(end));
            })),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{Anchors, UiNode};
    use crate::task::{Executor, FrameTime, TaskBridge};
    use std::rc::Rc;

    fn run(op: &AnimationOperation, frames: usize, dt: f32) -> Executor {
        let executor = Executor::new();
        executor.submit(Box::new(op.into_task(Clock::Scaled)));
        for _ in 0..frames {
            executor.tick(FrameTime::uniform(dt));
        }
        executor
    }

    #[test]
    fn test_fade_progress() {
        let node = UiNode::new("overlay").with_canvas_group(0.3).shared();
        let op = AnimationOperation::fade((&node).into(), 0.0, 1.0, 1.0);

        let executor = run(&op, 1, 0.25);
        // 开始时写入起始值
        assert_eq!(node.opacity(), Some(0.0));

        executor.tick(FrameTime::uniform(0.25));
        assert_eq!(node.opacity(), Some(0.25));

        for _ in 0..3 {
            executor.tick(FrameTime::uniform(0.25));
        }
        assert_eq!(node.opacity(), Some(1.0));
        assert!(executor.is_idle());
    }

    #[test]
    fn test_none_easing_applies_at_once() {
        let node = UiNode::new("panel").shared();
        let op = AnimationOperation::scale((&node).into(), Vec3::ZERO, Vec3::splat(2.0), 5.0)
            .with_easing(EaseType::None);

        let bundle = op.prepare();
        assert_eq!(bundle.duration, 0.0);
        assert!(bundle.on_start.is_none());
        assert!(bundle.on_tick.is_none());

        run(&op, 1, 0.1);
        assert_eq!(node.local_scale(), Vec3::splat(2.0));
        assert_eq!(node.write_count(), 1);
    }

    #[test]
    fn test_activate_ignores_easing() {
        let node = UiNode::new("panel").with_active(true).shared();
        let op = AnimationOperation::activate((&node).into(), false)
            .with_easing(EaseType::BounceOut)
            .with_duration(3.0);

        let bundle = op.prepare();
        assert_eq!(bundle.duration, 0.0);
        assert!(bundle.on_end.is_some());

        run(&op, 1, 0.1);
        assert!(!node.is_active());
    }

    #[test]
    fn test_missing_component_is_noop() {
        let node = UiNode::new("no-rect").shared();
        let op = AnimationOperation::anchors(
            (&node).into(),
            (Vec2::ZERO, Vec2::ZERO),
            (Vec2::ONE, Vec2::ONE),
            1.0,
        );
        assert!(op.prepare().is_noop());

        let faded = AnimationOperation::fade((&node).into(), 0.0, 1.0, 1.0);
        assert!(faded.prepare().is_noop());

        let tinted = AnimationOperation::colour((&node).into(), Color::CLEAR, Color::WHITE, 1.0);
        assert!(tinted.prepare().is_noop());
    }

    #[test]
    fn test_dead_target_is_noop() {
        let node = UiNode::new("gone").shared();
        let op = AnimationOperation::activate((&node).into(), false);
        drop(node);

        let bundle = op.prepare();
        assert!(bundle.is_noop());
        assert_eq!(bundle.duration, 0.0);
    }

    #[test]
    fn test_destroyed_mid_flight() {
        let node = UiNode::new("short-lived").with_canvas_group(0.0).shared();
        let op = AnimationOperation::fade((&node).into(), 0.0, 1.0, 1.0);
        let executor = run(&op, 2, 0.25);
        assert_eq!(node.write_count(), 3);

        drop(node);
        for _ in 0..5 {
            executor.tick(FrameTime::uniform(0.25));
        }
        assert!(executor.is_idle());
    }

    #[test]
    fn test_anchored_position() {
        let node = UiNode::new("iris").with_rect(Anchors::default()).shared();
        let op = AnimationOperation::anchors(
            (&node).into(),
            (Vec2::new(-1.0, -1.0), Vec2::new(2.0, 2.0)),
            (Vec2::new(0.5, 0.5), Vec2::new(0.5, 0.5)),
            0.5,
        );

        run(&op, 3, 0.25);
        assert_eq!(
            node.anchors(),
            Some(Anchors {
                min: Vec2::new(0.5, 0.5),
                max: Vec2::new(0.5, 0.5),
            })
        );
    }

    #[test]
    fn test_rotate_ends_on_target() {
        let node = UiNode::new("spinner").shared();
        let op = AnimationOperation::rotate(
            (&node).into(),
            Vec3::ZERO,
            Vec3::new(0.0, 0.0, 90.0),
            0.5,
        )
        .with_easing(EaseType::SineInOut);

        run(&op, 3, 0.25);
        let expected = Quat::from_euler_degrees(Vec3::new(0.0, 0.0, 90.0));
        assert!(node.rotation().angle_between(expected) < 1e-2);
    }

    #[test]
    fn test_reverse_swaps_endpoints() {
        let node = Rc::new(UiNode::new("n"));
        let target = TargetRef::new(&node);
        let ops = [
            AnimationOperation::scale(target.clone(), Vec3::ZERO, Vec3::ONE, 1.0),
            AnimationOperation::rotate(target.clone(), Vec3::ZERO, Vec3::splat(30.0), 1.0),
            AnimationOperation::move_to(target.clone(), Vec3::ZERO, Vec3::splat(4.0), 1.0),
            AnimationOperation::anchors(
                target.clone(),
                (Vec2::ZERO, Vec2::ONE),
                (Vec2::ONE, Vec2::ONE),
                1.0,
            ),
            AnimationOperation::colour(target.clone(), Color::BLACK, Color::WHITE, 1.0),
            AnimationOperation::fade(target.clone(), 0.2, 0.8, 1.0),
        ];

        for op in ops {
            let reversed = op.reversed();
            assert_ne!(reversed, op);
            assert_eq!(reversed.reversed(), op);
            assert_eq!(reversed.delay, op.delay);
            assert_eq!(reversed.duration, op.duration);
        }

        let fade = AnimationOperation::fade(target.clone(), 0.2, 0.8, 1.0).reversed();
        assert_eq!(
            fade.settings,
            OperationSettings::Fade {
                start_alpha: 0.8,
                target_alpha: 0.2
            }
        );
    }

    #[test]
    fn test_reverse_forces_activate() {
        let op = AnimationOperation::activate(TargetRef::none(), false);
        assert_eq!(
            op.reversed().settings,
            OperationSettings::Activate { activate: true }
        );
    }

    #[test]
    fn test_negative_times_clamped() {
        let op = AnimationOperation::fade(TargetRef::none(), 0.0, 1.0, -2.0).with_delay(-1.0);
        assert_eq!(op.duration, 0.0);
        assert_eq!(op.delay, 0.0);
    }

    #[test]
    fn test_settings_serde_tag() {
        let settings = OperationSettings::Fade {
            start_alpha: 0.0,
            target_alpha: 1.0,
        };
        let json = serde_json::to_string(&settings).unwrap();
        assert_eq!(json, r#"{"kind":"Fade","start_alpha":0.0,"target_alpha":1.0}"#);

        let parsed: OperationSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.kind(), OperationKind::Fade);
    }
}
