//! # Definition 模块
//!
//! 可序列化的动画定义。
//!
//! 定义文件描述一组命名序列，目标以节点名称引用，加载时通过
//! `TargetResolver` 解析为实体弱引用。
//!
//! ```json
//! {
//!   "show": {
//!     "operations": [
//!       { "kind": "Activate", "node": "panel", "activate": true },
//!       { "kind": "Fade", "node": "panel", "easing": "SmoothStepSmoother",
//!         "duration": 0.5, "start_alpha": 0.0, "target_alpha": 1.0 }
//!     ]
//!   }
//! }
//! ```

use std::collections::BTreeMap;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::easing::EaseType;
use crate::error::{AnimResult, DefinitionError};
use crate::operation::{AnimationOperation, OperationSettings};
use crate::sequence::{AnimationSequence, TimelinePlan, ping_pong_operations};
use crate::target::TargetRef;
use crate::task::TaskBridge;

/// 节点名称解析
pub trait TargetResolver {
    /// 按名称查找实体；找不到返回 `None`
    fn resolve(&self, name: &str) -> Option<TargetRef>;
}

impl<F> TargetResolver for F
where
    F: Fn(&str) -> Option<TargetRef>,
{
    fn resolve(&self, name: &str) -> Option<TargetRef> {
        self(name)
    }
}

/// 操作定义
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationDef {
    /// 目标节点名称；缺省表示不作用于任何目标（纯等待）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node: Option<String>,
    #[serde(default)]
    pub easing: EaseType,
    #[serde(default)]
    pub delay: f32,
    #[serde(default)]
    pub duration: f32,
    #[serde(flatten)]
    pub settings: OperationSettings,
}

impl OperationDef {
    fn validate(&self, index: usize) -> Result<(), DefinitionError> {
        if self.node.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(DefinitionError::EmptyTargetName { index });
        }
        for (field, value) in [("delay", self.delay), ("duration", self.duration)] {
            if value < 0.0 {
                return Err(DefinitionError::NegativeTime {
                    index,
                    field,
                    value,
                });
            }
        }
        Ok(())
    }

    fn to_operation(&self, target: TargetRef) -> AnimationOperation {
        AnimationOperation::new(target, self.easing, self.delay, self.duration, self.settings)
    }
}

/// 序列定义
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SequenceDef {
    #[serde(default, rename = "loop")]
    pub looping: bool,
    #[serde(default)]
    pub ping_pong: bool,
    #[serde(default)]
    pub operations: Vec<OperationDef>,
}

impl SequenceDef {
    /// 从 JSON 解析并校验
    pub fn from_json(json: &str) -> AnimResult<Self> {
        let def: SequenceDef = serde_json::from_str(json)?;
        def.validate()?;
        Ok(def)
    }

    /// 序列化为 JSON
    pub fn to_json(&self) -> AnimResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// 校验时间与名称
    pub fn validate(&self) -> Result<(), DefinitionError> {
        self.operations
            .iter()
            .enumerate()
            .try_for_each(|(index, op)| op.validate(index))
    }

    /// 引用到的节点名称（去重，按首次出现排序）
    pub fn node_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for name in self.operations.iter().filter_map(|op| op.node.as_deref()) {
            if !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }

    /// 构建可播放的序列
    ///
    /// 先解析全部目标，任一目标找不到即返回错误；之后按定义应用往返与循环。
    pub fn build(
        &self,
        resolver: &dyn TargetResolver,
        bridge: Rc<dyn TaskBridge>,
    ) -> Result<AnimationSequence, DefinitionError> {
        self.validate()?;

        let mut operations = Vec::with_capacity(self.operations.len());
        for (index, op) in self.operations.iter().enumerate() {
            let target = match op.node.as_deref() {
                None => TargetRef::none(),
                Some(name) => {
                    resolver
                        .resolve(name)
                        .ok_or_else(|| DefinitionError::UnknownTarget {
                            index,
                            name: name.to_string(),
                        })?
                }
            };
            operations.push(op.to_operation(target));
        }

        let sequence = AnimationSequence::with_operations(operations, bridge);
        if self.ping_pong {
            sequence.ping_pong();
        }
        if self.looping {
            sequence.enable_loop();
        }
        Ok(sequence)
    }

    /// 不绑定目标的播放计划（用于检查和预览）
    pub fn preview(&self) -> Option<TimelinePlan> {
        let forward: Vec<AnimationOperation> = self
            .operations
            .iter()
            .map(|op| op.to_operation(TargetRef::none()))
            .collect();
        let operations = if self.ping_pong {
            ping_pong_operations(&forward)
        } else {
            forward
        };
        TimelinePlan::build(&operations)
    }
}

/// 命名序列集合（一个定义文件）
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SequenceLibrary {
    pub sequences: BTreeMap<String, SequenceDef>,
}

impl SequenceLibrary {
    /// 从 JSON 解析并校验所有序列
    pub fn from_json(json: &str) -> AnimResult<Self> {
        let library: SequenceLibrary = serde_json::from_str(json)?;
        for def in library.sequences.values() {
            def.validate()?;
        }
        Ok(library)
    }

    /// 序列名称
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.sequences.keys().map(String::as_str)
    }

    /// 按名称获取定义
    pub fn get(&self, name: &str) -> Result<&SequenceDef, DefinitionError> {
        self.sequences
            .get(name)
            .ok_or_else(|| DefinitionError::UnknownSequence {
                name: name.to_string(),
            })
    }

    /// 按名称构建序列
    pub fn build(
        &self,
        name: &str,
        resolver: &dyn TargetResolver,
        bridge: Rc<dyn TaskBridge>,
    ) -> Result<AnimationSequence, DefinitionError> {
        self.get(name)?.build(resolver, bridge)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AnimError;
    use crate::node::UiNode;
    use crate::operation::OperationKind;
    use crate::task::Executor;
    use std::collections::HashMap;

    const SHOW: &str = r#"{
        "operations": [
            { "kind": "Activate", "node": "panel", "activate": true },
            { "kind": "Fade", "node": "panel", "easing": "SmoothStepSmoother",
              "duration": 0.5, "start_alpha": 0.0, "target_alpha": 1.0 },
            { "kind": "Scale", "node": "badge", "delay": 0.25, "duration": 1,
              "start": { "x": 0, "y": 0, "z": 0 }, "target": { "x": 1, "y": 1, "z": 1 } }
        ]
    }"#;

    #[test]
    fn test_parse_defaults() {
        let def = SequenceDef::from_json(SHOW).unwrap();
        assert!(!def.looping);
        assert!(!def.ping_pong);
        assert_eq!(def.operations.len(), 3);

        let activate = &def.operations[0];
        assert_eq!(activate.easing, EaseType::None);
        assert_eq!(activate.delay, 0.0);
        assert_eq!(activate.settings.kind(), OperationKind::Activate);

        assert_eq!(def.operations[2].duration, 1.0);
        assert_eq!(def.node_names(), vec!["panel", "badge"]);
    }

    #[test]
    fn test_build_resolves_targets() {
        let executor = Executor::new();
        let panel = UiNode::new("panel").with_canvas_group(0.0).shared();
        let badge = UiNode::new("badge").shared();
        let mut nodes = HashMap::new();
        nodes.insert("panel".to_string(), TargetRef::new(&panel));
        nodes.insert("badge".to_string(), TargetRef::new(&badge));

        let resolver = move |name: &str| nodes.get(name).cloned();
        let def = SequenceDef::from_json(SHOW).unwrap();
        let sequence = def.build(&resolver, executor.bridge()).unwrap();
        let ops = sequence.operations();
        assert_eq!(ops.len(), 3);
        assert!(ops[1].target.same_target(&TargetRef::new(&panel)));
        assert!(ops[2].target.same_target(&TargetRef::new(&badge)));
        assert_eq!(sequence.duration(), 1.25);
    }

    #[test]
    fn test_unknown_target() {
        let executor = Executor::new();
        let resolver = |name: &str| (name == "panel").then(TargetRef::none);
        let def = SequenceDef::from_json(SHOW).unwrap();

        let err = def.build(&resolver, executor.bridge()).unwrap_err();
        assert_eq!(
            err,
            DefinitionError::UnknownTarget {
                index: 2,
                name: "badge".to_string()
            }
        );
        assert_eq!(err.to_string(), "操作 #2：目标 'badge' 未找到");
    }

    #[test]
    fn test_negative_time_rejected() {
        let json = r#"{ "operations": [
            { "kind": "Fade", "delay": -1, "start_alpha": 0, "target_alpha": 1 }
        ] }"#;
        let err = SequenceDef::from_json(json).unwrap_err();
        assert_eq!(
            err,
            AnimError::Definition(DefinitionError::NegativeTime {
                index: 0,
                field: "delay",
                value: -1.0
            })
        );
    }

    #[test]
    fn test_empty_node_name_rejected() {
        let json = r#"{ "operations": [ { "kind": "Activate", "node": " ", "activate": false } ] }"#;
        assert!(matches!(
            SequenceDef::from_json(json),
            Err(AnimError::Definition(DefinitionError::EmptyTargetName { index: 0 }))
        ));
    }

    #[test]
    fn test_unknown_kind_is_json_error() {
        let json = r#"{ "operations": [ { "kind": "Explode", "node": "panel" } ] }"#;
        assert!(matches!(
            SequenceDef::from_json(json),
            Err(AnimError::Json { .. })
        ));
    }

    #[test]
    fn test_flags_applied_on_build() {
        let executor = Executor::new();
        let json = r#"{ "loop": true, "ping_pong": true, "operations": [
            { "kind": "Fade", "duration": 1, "start_alpha": 0, "target_alpha": 1 }
        ] }"#;
        let def = SequenceDef::from_json(json).unwrap();
        let sequence = def.build(&|_: &str| -> Option<TargetRef> { None }, executor.bridge()).unwrap();

        assert!(sequence.is_looping());
        assert!(sequence.is_ping_pong());
        assert_eq!(sequence.len(), 3);
        assert_eq!(def.preview().map(|p| p.duration), Some(2.0));
    }

    #[test]
    fn test_round_trip_through_json() {
        let def = SequenceDef::from_json(SHOW).unwrap();
        let json = def.to_json().unwrap();
        assert_eq!(SequenceDef::from_json(&json).unwrap(), def);
    }

    #[test]
    fn test_library() {
        let json = format!(r#"{{ "show": {SHOW}, "hide": {{ "operations": [] }} }}"#);
        let library = SequenceLibrary::from_json(&json).unwrap();
        assert_eq!(library.names().collect::<Vec<_>>(), vec!["hide", "show"]);
        assert!(library.get("hide").unwrap().preview().is_none());
        assert_eq!(
            library.get("missing").unwrap_err(),
            DefinitionError::UnknownSequence {
                name: "missing".to_string()
            }
        );
    }
}
