//! 显示/隐藏动画控件

use std::rc::Rc;

use anim_runtime::{AnimationSequence, DefinitionError, SequenceLibrary, TargetResolver, TaskBridge};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// 控件选项
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UiAnimationOptions {
    /// 播放时忽略时间缩放
    #[serde(default)]
    pub use_unscaled_time: bool,
    /// 启用时自动播放显示动画
    #[serde(default)]
    pub show_on_enable: bool,
    /// 停用时自动播放隐藏动画
    #[serde(default)]
    pub hide_on_disable: bool,
}

/// 显示/隐藏动画控件
///
/// 持有两段独立的序列副本；模板序列本身不会被播放。
/// 切换方向时先停止另一段，避免两段同时写入同一目标。
#[derive(Debug)]
pub struct UiAnimation {
    options: UiAnimationOptions,
    show: AnimationSequence,
    hide: AnimationSequence,
    enabled: bool,
}

impl UiAnimation {
    /// 从模板序列创建
    pub fn new(
        show_template: &AnimationSequence,
        hide_template: &AnimationSequence,
        bridge: Rc<dyn TaskBridge>,
        options: UiAnimationOptions,
    ) -> Self {
        Self {
            options,
            show: AnimationSequence::from_sequence(show_template, bridge.clone()),
            hide: AnimationSequence::from_sequence(hide_template, bridge),
            enabled: false,
        }
    }

    /// 从定义库中的两段命名序列创建
    pub fn from_library(
        library: &SequenceLibrary,
        show: &str,
        hide: &str,
        resolver: &dyn TargetResolver,
        bridge: Rc<dyn TaskBridge>,
        options: UiAnimationOptions,
    ) -> Result<Self, DefinitionError> {
        Ok(Self {
            options,
            show: library.build(show, resolver, bridge.clone())?,
            hide: library.build(hide, resolver, bridge)?,
            enabled: false,
        })
    }

    pub fn options(&self) -> UiAnimationOptions {
        self.options
    }

    pub fn show_sequence(&self) -> &AnimationSequence {
        &self.show
    }

    pub fn hide_sequence(&self) -> &AnimationSequence {
        &self.hide
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// 播放显示（`true`）或隐藏（`false`）动画
    pub fn show(&self, show: bool) {
        let (play, other) = if show {
            (&self.show, &self.hide)
        } else {
            (&self.hide, &self.show)
        };
        other.stop();
        play.stop();
        debug!(show, unscaled = self.options.use_unscaled_time, "UiAnimation 切换");
        play.play_with(self.options.use_unscaled_time);
    }

    /// 启用控件
    pub fn enable(&mut self) {
        if self.enabled {
            return;
        }
        self.enabled = true;
        if self.options.show_on_enable {
            self.show(true);
        }
    }

    /// 停用控件
    pub fn disable(&mut self) {
        if !self.enabled {
            return;
        }
        self.enabled = false;
        if self.options.hide_on_disable {
            self.show(false);
        }
    }

    /// 销毁控件：停止播放并清空两段序列的订阅
    pub fn teardown(&mut self) {
        self.enabled = false;
        for sequence in [&self.show, &self.hide] {
            sequence.stop();
            sequence.cleanup();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anim_runtime::{
        AnimationOperation, Executor, FrameTime, SequenceState, TargetRef, UiNode,
    };
    use std::cell::Cell;

    const DT: f32 = 0.125;

    fn fade_widget(
        executor: &Executor,
        node: &Rc<UiNode>,
        options: UiAnimationOptions,
    ) -> UiAnimation {
        let show = AnimationSequence::with_operations(
            [AnimationOperation::fade(node.into(), 0.0, 1.0, 0.5)],
            executor.bridge(),
        );
        let hide = AnimationSequence::with_operations(
            [AnimationOperation::fade(node.into(), 1.0, 0.0, 0.5)],
            executor.bridge(),
        );
        UiAnimation::new(&show, &hide, executor.bridge(), options)
    }

    fn tick(executor: &Executor, frames: usize) {
        for _ in 0..frames {
            executor.tick(FrameTime::uniform(DT));
        }
    }

    #[test]
    fn test_show_on_enable_and_hide_on_disable() {
        let executor = Executor::new();
        let node = UiNode::new("panel").with_canvas_group(0.0).shared();
        let mut widget = fade_widget(
            &executor,
            &node,
            UiAnimationOptions {
                show_on_enable: true,
                hide_on_disable: true,
                ..Default::default()
            },
        );

        widget.enable();
        assert!(widget.is_enabled());
        tick(&executor, 5);
        assert_eq!(node.opacity(), Some(1.0));

        widget.disable();
        tick(&executor, 5);
        assert_eq!(node.opacity(), Some(0.0));
        assert_eq!(widget.hide_sequence().state(), SequenceState::Completed);
    }

    #[test]
    fn test_enable_without_auto_show() {
        let executor = Executor::new();
        let node = UiNode::new("panel").with_canvas_group(0.0).shared();
        let mut widget = fade_widget(&executor, &node, UiAnimationOptions::default());

        widget.enable();
        widget.enable();
        tick(&executor, 5);
        assert_eq!(node.opacity(), Some(0.0));
        assert!(executor.is_idle());
    }

    #[test]
    fn test_switching_direction_stops_other_sequence() {
        let executor = Executor::new();
        let node = UiNode::new("panel").with_canvas_group(0.0).shared();
        let widget = fade_widget(&executor, &node, UiAnimationOptions::default());

        widget.show(true);
        tick(&executor, 2);
        widget.show(false);

        // 隐藏立即写入起始值
        tick(&executor, 1);
        assert_eq!(node.opacity(), Some(1.0));
        assert_eq!(widget.show_sequence().state(), SequenceState::Stopped);

        tick(&executor, 4);
        assert_eq!(node.opacity(), Some(0.0));
        tick(&executor, 5);
        assert_eq!(node.opacity(), Some(0.0));
    }

    #[test]
    fn test_unscaled_time_option() {
        let executor = Executor::new();
        let node = UiNode::new("panel").with_canvas_group(0.0).shared();
        let widget = fade_widget(
            &executor,
            &node,
            UiAnimationOptions {
                use_unscaled_time: true,
                ..Default::default()
            },
        );

        widget.show(true);
        for _ in 0..5 {
            executor.tick(FrameTime::new(0.0, DT));
        }
        assert_eq!(node.opacity(), Some(1.0));
    }

    #[test]
    fn test_templates_are_copied() {
        let executor = Executor::new();
        let node = UiNode::new("panel").with_canvas_group(0.0).shared();
        let template = AnimationSequence::with_operations(
            [AnimationOperation::fade((&node).into(), 0.0, 1.0, 0.5)],
            executor.bridge(),
        );
        template.enable_loop();

        let widget = UiAnimation::new(
            &template,
            &AnimationSequence::new(executor.bridge()),
            executor.bridge(),
            UiAnimationOptions::default(),
        );
        assert!(!widget.show_sequence().ptr_eq(&template));
        assert!(widget.show_sequence().is_looping());
        assert!(widget.hide_sequence().is_empty());
    }

    #[test]
    fn test_teardown_clears_subscribers() {
        let executor = Executor::new();
        let node = UiNode::new("panel").with_canvas_group(0.0).shared();
        let mut widget = fade_widget(&executor, &node, UiAnimationOptions::default());

        let count = Rc::new(Cell::new(0));
        let handler = {
            let count = count.clone();
            Rc::new(move || count.set(count.get() + 1))
        };
        widget.show_sequence().on_finished(handler);

        widget.show(true);
        tick(&executor, 2);
        widget.teardown();
        tick(&executor, 10);

        assert_eq!(count.get(), 0);
        assert_eq!(widget.show_sequence().subscriber_count(), 0);
        assert!(executor.is_idle());
    }

    #[test]
    fn test_from_library() {
        let executor = Executor::new();
        let node = UiNode::new("panel").with_canvas_group(0.0).shared();
        let resolver = |name: &str| (name == "panel").then(|| TargetRef::new(&node));
        let library = SequenceLibrary::from_json(
            r#"{
                "show": { "operations": [
                    { "kind": "Fade", "node": "panel", "duration": 0.5,
                      "start_alpha": 0, "target_alpha": 1 } ] },
                "hide": { "operations": [
                    { "kind": "Fade", "node": "panel", "duration": 0.5,
                      "start_alpha": 1, "target_alpha": 0 } ] }
            }"#,
        )
        .unwrap();

        let widget = UiAnimation::from_library(
            &library,
            "show",
            "hide",
            &resolver,
            executor.bridge(),
            UiAnimationOptions::default(),
        )
        .unwrap();
        widget.show(true);
        tick(&executor, 5);
        assert_eq!(node.opacity(), Some(1.0));

        let err = UiAnimation::from_library(
            &library,
            "show",
            "missing",
            &resolver,
            executor.bridge(),
            UiAnimationOptions::default(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            DefinitionError::UnknownSequence {
                name: "missing".to_string()
            }
        );
    }
}
