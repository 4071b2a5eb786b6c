//! # Scene 模块
//!
//! 按名称登记的 UI 节点集合。
//!
//! 场景持有节点的强引用，动画操作只持有弱引用：`destroy` 之后，
//! 仍在播放的操作会静默跳过该节点。

use std::collections::BTreeMap;
use std::rc::Rc;

use anim_runtime::{Anchors, Animatable, Color, NodeState, TargetRef, TargetResolver, UiNode};
use tracing::debug;

/// UI 节点场景
#[derive(Debug, Default)]
pub struct Scene {
    nodes: BTreeMap<String, Rc<UiNode>>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记节点；同名节点会被替换
    pub fn spawn(&mut self, node: UiNode) -> Rc<UiNode> {
        let node = node.shared();
        let name = node.name().to_string();
        if self.nodes.insert(name.clone(), node.clone()).is_some() {
            debug!(node = %name, "替换同名节点");
        }
        node
    }

    /// 登记带全部组件的节点（矩形、图片、透明度组）
    pub fn spawn_full(&mut self, name: &str) -> Rc<UiNode> {
        self.spawn(
            UiNode::new(name)
                .with_rect(Anchors::default())
                .with_image(Color::WHITE)
                .with_canvas_group(1.0),
        )
    }

    pub fn get(&self, name: &str) -> Option<Rc<UiNode>> {
        self.nodes.get(name).cloned()
    }

    /// 节点的弱引用
    pub fn target(&self, name: &str) -> Option<TargetRef> {
        self.nodes.get(name).map(TargetRef::new)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    /// 销毁节点
    ///
    /// 只释放场景持有的引用；其他地方仍持有 `Rc` 时节点继续存活。
    pub fn destroy(&mut self, name: &str) -> bool {
        let removed = self.nodes.remove(name).is_some();
        if removed {
            debug!(node = %name, "销毁节点");
        }
        removed
    }

    /// 节点名称（按字典序）
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// 所有节点的状态快照
    pub fn snapshot(&self) -> Vec<(String, NodeState)> {
        self.nodes
            .iter()
            .map(|(name, node)| (name.clone(), node.snapshot()))
            .collect()
    }
}

impl TargetResolver for Scene {
    fn resolve(&self, name: &str) -> Option<TargetRef> {
        self.target(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anim_runtime::{Capability, PropertyValue};

    #[test]
    fn test_spawn_and_resolve() {
        let mut scene = Scene::new();
        let panel = scene.spawn(UiNode::new("panel").with_canvas_group(0.0));

        let target = scene.resolve("panel").unwrap();
        assert!(target.same_target(&TargetRef::new(&panel)));
        assert!(scene.resolve("missing").is_none());
        assert_eq!(scene.len(), 1);
    }

    #[test]
    fn test_spawn_full_has_all_capabilities() {
        let mut scene = Scene::new();
        let node = scene.spawn_full("mask");
        for capability in [
            Capability::Transform,
            Capability::RectAnchors,
            Capability::Colour,
            Capability::Opacity,
        ] {
            assert!(node.supports(capability));
        }
        assert_eq!(node.opacity(), Some(1.0));
    }

    #[test]
    fn test_destroy_kills_weak_targets() {
        let mut scene = Scene::new();
        scene.spawn_full("panel");
        let target = scene.target("panel").unwrap();

        assert!(scene.destroy("panel"));
        assert!(!scene.destroy("panel"));
        assert!(!target.is_alive());
        assert!(!target.write(PropertyValue::Active(false)));
    }

    #[test]
    fn test_spawn_replaces_same_name() {
        let mut scene = Scene::new();
        let old = TargetRef::new(&scene.spawn(UiNode::new("a")));
        scene.spawn(UiNode::new("a").with_active(false));

        assert_eq!(scene.len(), 1);
        assert!(!old.is_alive());
        assert!(!scene.get("a").unwrap().is_active());
    }

    #[test]
    fn test_snapshot_sorted_by_name() {
        let mut scene = Scene::new();
        scene.spawn(UiNode::new("b"));
        scene.spawn(UiNode::new("a").with_active(false));

        let names: Vec<_> = scene.names().collect();
        assert_eq!(names, vec!["a", "b"]);

        let snapshot = scene.snapshot();
        assert_eq!(snapshot[0].0, "a");
        assert!(!snapshot[0].1.active);
    }
}
