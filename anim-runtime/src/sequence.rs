//! # Sequence 模块
//!
//! 动画序列：按顺序组合多个 `AnimationOperation`。
//!
//! ## 时间线
//!
//! 播放时向执行桥提交两个任务：
//!
//! - **播放时间线**：等待第一个操作的延迟；依次启动每个操作，
//!   启动第 i 个操作后等待第 i+1 个操作的延迟。操作启动后并行运行。
//! - **完成时间线**（`Phase::Late`）：等待 `duration()` 秒，按订阅顺序
//!   通知完成，循环模式下重新播放。
//!
//! ```text
//! delay₀ ─► op₀ ─ delay₁ ─► op₁ ─ delay₂ ─► op₂
//! ├──────────────── duration() ──────────────────┤─► on_finished
//! ```
//!
//! `AnimationSequence` 是共享句柄，克隆得到的是同一个序列。
//! 已提交的时间线持有序列状态，播放后即使释放所有句柄也会运行到结束；
//! 时间线结束或被取消后由执行器释放。

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use tracing::debug;

use crate::easing::EaseType;
use crate::operation::{AnimationOperation, OperationKind, OperationSettings};
use crate::routine::{TimelineRoutine, TimelineStep};
use crate::target::TargetRef;
use crate::task::{Clock, Phase, TaskBridge, TaskHandle};

/// 完成回调
pub type FinishedHandler = Rc<dyn Fn()>;

/// 序列播放状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SequenceState {
    /// 从未播放
    #[default]
    Idle,
    /// 播放中
    Playing,
    /// 已完成
    Completed,
    /// 已停止
    Stopped,
}

/// 计算序列总时长
///
/// 操作并行运行，时长是"最晚结束"的估计：
/// - 有延迟的操作：延迟把后续操作整体推后，只有超出当前最长持续时间的部分才计入
/// - 无延迟的操作：与前一个操作同时开始，只计入超出部分
/// - 激活操作不参与"最长持续时间"
pub fn sequence_duration(operations: &[AnimationOperation]) -> f32 {
    let mut sum = 0.0_f32;
    let mut greatest = 0.0_f32;

    for op in operations {
        let activate = op.kind() == OperationKind::Activate;
        if op.delay > 0.0 {
            if op.duration + op.delay > greatest {
                sum += op.duration + op.delay - greatest;
            } else if op.duration > greatest {
                sum += op.duration - greatest;
            } else {
                sum += op.delay;
            }
        } else if !activate && op.duration > greatest {
            sum += op.duration - greatest;
        }

        if !activate {
            greatest = greatest.max(op.duration);
        }
    }
    sum
}

/// 往返展开：正向列表 + 等待操作 + 反向列表
///
/// 等待操作在正向部分结束时触发：延迟总和为 0 时等待整个正向时长，
/// 否则等待 |时长 - 延迟总和|。它是指向第一个反向操作目标的激活操作。
pub fn ping_pong_operations(forward: &[AnimationOperation]) -> Vec<AnimationOperation> {
    let reversed: Vec<AnimationOperation> =
        forward.iter().rev().map(AnimationOperation::reversed).collect();
    let Some(first) = reversed.first() else {
        return Vec::new();
    };

    let duration = sequence_duration(forward);
    let delay_sum: f32 = forward.iter().map(|op| op.delay).sum();
    let bridge_delay = if delay_sum > 0.0 {
        (duration - delay_sum).abs()
    } else {
        duration
    };
    let bridge_op = first
        .clone()
        .with_easing(EaseType::None)
        .with_duration(0.0)
        .with_delay(bridge_delay)
        .with_settings(OperationSettings::Activate { activate: true });

    let mut operations = Vec::with_capacity(forward.len() * 2 + 1);
    operations.extend_from_slice(forward);
    operations.push(bridge_op);
    operations.extend(reversed);
    operations
}

// ========== 时间线计划 ==========

/// 播放计划中的一步
#[derive(Debug, Clone, PartialEq)]
pub struct PlanStep {
    pub operation: AnimationOperation,
    /// 启动本操作后、启动下一个操作前的等待
    pub wait_after: f32,
}

/// 播放计划
///
/// 由操作列表派生，列表变化时重新计算。
#[derive(Debug, Clone, PartialEq)]
pub struct TimelinePlan {
    /// 启动第一个操作前的等待
    pub initial_wait: f32,
    pub steps: Vec<PlanStep>,
    /// 完成通知前的等待
    pub duration: f32,
}

impl TimelinePlan {
    /// 从操作列表构建；空列表返回 `None`
    pub fn build(operations: &[AnimationOperation]) -> Option<Self> {
        let first = operations.first()?;
        let steps = operations
            .iter()
            .enumerate()
            .map(|(i, op)| PlanStep {
                operation: op.clone(),
                wait_after: operations.get(i + 1).map_or(0.0, |next| next.delay),
            })
            .collect();

        Some(Self {
            initial_wait: first.delay,
            steps,
            duration: sequence_duration(operations),
        })
    }

    /// 每个操作的启动时刻（相对播放开始）
    pub fn start_times(&self) -> Vec<f32> {
        let mut at = self.initial_wait;
        self.steps
            .iter()
            .map(|step| {
                let start = at;
                at += step.wait_after;
                start
            })
            .collect()
    }

    /// 可读的文本描述
    pub fn describe(&self) -> String {
        let mut lines = vec![format!("duration {:.3}s", self.duration)];
        for (start, step) in self.start_times().into_iter().zip(&self.steps) {
            let op = &step.operation;
            lines.push(format!(
                "[{:>7.3}s] {:<16} {:<12} {:.3}s {:?}",
                start,
                format!("{:?}", op.kind()),
                target_label(&op.target),
                op.duration,
                op.easing,
            ));
        }
        lines.join("\n")
    }
}

fn target_label(target: &TargetRef) -> String {
    match target.name() {
        Some(name) => name,
        None if target.is_set() => "<destroyed>".to_string(),
        None => "-".to_string(),
    }
}

// ========== 序列 ==========

struct SequenceInner {
    bridge: Rc<dyn TaskBridge>,
    operations: Vec<AnimationOperation>,
    plan: Option<TimelinePlan>,
    state: SequenceState,
    looping: bool,
    /// 循环重播是否挂接在完成通知上（`cleanup` 会断开）
    loop_attached: bool,
    ping_pong: bool,
    subscribers: Vec<FinishedHandler>,
    /// 正在通知订阅者
    notifying: bool,
    unscaled: bool,
    play_task: Option<TaskHandle>,
    done_task: Option<TaskHandle>,
    /// 本次播放已启动的操作任务
    op_tasks: Vec<TaskHandle>,
}

impl SequenceInner {
    fn new(bridge: Rc<dyn TaskBridge>, operations: Vec<AnimationOperation>) -> Self {
        let plan = TimelinePlan::build(&operations);
        Self {
            bridge,
            operations,
            plan,
            state: SequenceState::Idle,
            looping: false,
            loop_attached: false,
            ping_pong: false,
            subscribers: Vec::new(),
            notifying: false,
            unscaled: false,
            play_task: None,
            done_task: None,
            op_tasks: Vec::new(),
        }
    }

    /// 取出时间线与操作任务句柄
    fn take_handles(&mut self) -> Vec<TaskHandle> {
        let mut handles: Vec<TaskHandle> = self
            .play_task
            .take()
            .into_iter()
            .chain(self.done_task.take())
            .collect();
        handles.append(&mut self.op_tasks);
        handles
    }

    /// 操作列表变化后重新计算计划，并重新挂接循环
    fn operations_changed(&mut self) {
        self.plan = TimelinePlan::build(&self.operations);
        if self.looping {
            self.loop_attached = true;
        }
    }
}

/// 动画序列
#[derive(Clone)]
pub struct AnimationSequence {
    inner: Rc<RefCell<SequenceInner>>,
}

impl fmt::Debug for AnimationSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("AnimationSequence")
            .field("operations", &inner.operations.len())
            .field("state", &inner.state)
            .field("looping", &inner.looping)
            .field("ping_pong", &inner.ping_pong)
            .field("subscribers", &inner.subscribers.len())
            .finish()
    }
}

impl AnimationSequence {
    /// 创建空序列
    pub fn new(bridge: Rc<dyn TaskBridge>) -> Self {
        Self::with_operations(Vec::new(), bridge)
    }

    /// 用操作列表创建序列
    pub fn with_operations(
        operations: impl IntoIterator<Item = AnimationOperation>,
        bridge: Rc<dyn TaskBridge>,
    ) -> Self {
        Self {
            inner: Rc::new(RefCell::new(SequenceInner::new(
                bridge,
                operations.into_iter().collect(),
            ))),
        }
    }

    /// 复制另一个序列的操作与循环/往返配置，绑定到新的执行桥
    ///
    /// 订阅者与播放状态不会复制。
    pub fn from_sequence(other: &AnimationSequence, bridge: Rc<dyn TaskBridge>) -> Self {
        let (operations, looping, ping_pong) = {
            let o = other.inner.borrow();
            (o.operations.clone(), o.looping, o.ping_pong)
        };
        let sequence = Self::with_operations(operations, bridge);
        sequence.inner.borrow_mut().ping_pong = ping_pong;
        if looping {
            sequence.enable_loop();
        }
        sequence
    }

    // ========== 查询 ==========

    /// 操作列表副本
    pub fn operations(&self) -> Vec<AnimationOperation> {
        self.inner.borrow().operations.clone()
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.borrow().operations.is_empty()
    }

    /// 总时长（秒）
    pub fn duration(&self) -> f32 {
        sequence_duration(&self.inner.borrow().operations)
    }

    /// 当前播放计划
    pub fn plan(&self) -> Option<TimelinePlan> {
        self.inner.borrow().plan.clone()
    }

    pub fn state(&self) -> SequenceState {
        self.inner.borrow().state
    }

    pub fn is_playing(&self) -> bool {
        self.state() == SequenceState::Playing
    }

    pub fn is_looping(&self) -> bool {
        self.inner.borrow().looping
    }

    pub fn is_ping_pong(&self) -> bool {
        self.inner.borrow().ping_pong
    }

    /// 订阅者数量
    pub fn subscriber_count(&self) -> usize {
        self.inner.borrow().subscribers.len()
    }

    /// 绑定的执行桥
    pub fn bridge(&self) -> Rc<dyn TaskBridge> {
        self.inner.borrow().bridge.clone()
    }

    /// 是否为同一个序列的句柄
    pub fn ptr_eq(&self, other: &AnimationSequence) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    // ========== 编辑 ==========

    /// 追加操作
    pub fn add_operation(&self, operation: AnimationOperation) {
        self.add_operations([operation]);
    }

    /// 追加多个操作
    pub fn add_operations(&self, operations: impl IntoIterator<Item = AnimationOperation>) {
        let mut inner = self.inner.borrow_mut();
        inner.operations.extend(operations);
        inner.operations_changed();
    }

    /// 追加一段纯等待；非正数忽略
    pub fn add_delay(&self, delay: f32) {
        if delay > 0.0 {
            self.add_operation(AnimationOperation::wait(delay));
        }
    }

    /// 移除第一个相等的操作
    ///
    /// # 返回
    /// 是否找到并移除
    pub fn remove_operation(&self, operation: &AnimationOperation) -> bool {
        let mut inner = self.inner.borrow_mut();
        let Some(pos) = inner.operations.iter().position(|op| op == operation) else {
            return false;
        };
        inner.operations.remove(pos);
        inner.operations_changed();
        true
    }

    /// 反向序列
    ///
    /// 操作顺序反转，每个操作交换起止值。绑定同一个执行桥，
    /// 不继承循环/往返配置与订阅者。
    pub fn reversed(&self) -> AnimationSequence {
        let (operations, bridge) = {
            let inner = self.inner.borrow();
            (inner.operations.clone(), inner.bridge.clone())
        };
        Self::with_operations(operations.iter().rev().map(AnimationOperation::reversed), bridge)
    }

    /// 往返：在正向列表后追加一个等待操作和反向列表
    ///
    /// 见 [`ping_pong_operations`]。
    pub fn ping_pong(&self) {
        let mut inner = self.inner.borrow_mut();
        inner.ping_pong = true;
        if inner.operations.is_empty() {
            debug!("空序列，往返不改变操作");
            return;
        }
        inner.operations = ping_pong_operations(&inner.operations);
        inner.operations_changed();
    }

    /// 开启循环：每次完成后自动重播
    ///
    /// 重复调用不会叠加重播。
    pub fn enable_loop(&self) {
        let mut inner = self.inner.borrow_mut();
        inner.looping = true;
        inner.loop_attached = true;
    }

    // ========== 完成通知 ==========

    /// 订阅完成通知
    ///
    /// 同一个回调只会登记一次。
    ///
    /// # 返回
    /// 是否新登记
    pub fn on_finished(&self, handler: FinishedHandler) -> bool {
        let mut inner = self.inner.borrow_mut();
        if inner.subscribers.iter().any(|h| Rc::ptr_eq(h, &handler)) {
            return false;
        }
        inner.subscribers.push(handler);
        true
    }

    /// 取消订阅
    pub fn remove_on_finished(&self, handler: &FinishedHandler) -> bool {
        let mut inner = self.inner.borrow_mut();
        let before = inner.subscribers.len();
        inner.subscribers.retain(|h| !Rc::ptr_eq(h, handler));
        inner.subscribers.len() != before
    }

    /// 清除所有订阅者并断开循环重播
    ///
    /// 之后编辑操作列表会在循环模式下重新挂接重播。
    pub fn cleanup(&self) {
        let mut inner = self.inner.borrow_mut();
        inner.subscribers.clear();
        inner.loop_attached = false;
    }

    // ========== 播放 ==========

    /// 使用缩放时间播放
    pub fn play(&self) {
        self.play_with(false);
    }

    /// 播放；`unscaled` 为 `true` 时忽略时间缩放
    ///
    /// 空序列不做任何事。播放中再次调用会先取消上一次播放的时间线与操作，
    /// 从头开始。
    pub fn play_with(&self, unscaled: bool) {
        let (plan, bridge, stale) = {
            let mut inner = self.inner.borrow_mut();
            let Some(plan) = inner.plan.clone() else {
                debug!("空序列，忽略播放");
                return;
            };
            let stale = if inner.state == SequenceState::Playing {
                inner.take_handles()
            } else {
                inner.op_tasks.clear();
                Vec::new()
            };
            inner.unscaled = unscaled;
            inner.state = SequenceState::Playing;
            (plan, inner.bridge.clone(), stale)
        };

        if !stale.is_empty() {
            debug!(tasks = stale.len(), "重新播放，取消上一次播放");
        }
        for handle in stale {
            bridge.cancel(handle);
        }

        let clock = Clock::from_unscaled(unscaled);

        let initial_wait = plan.initial_wait;
        let mut steps: Vec<TimelineStep> = Vec::with_capacity(plan.steps.len() + 1);
        steps.push(Box::new(move || initial_wait));
        for PlanStep {
            operation,
            wait_after,
        } in plan.steps
        {
            let inner = self.inner.clone();
            steps.push(Box::new(move || {
                launch(&inner, &operation, clock);
                wait_after
            }));
        }
        let play_task = bridge.submit(Box::new(
            TimelineRoutine::new(steps, clock).with_label("sequence-play"),
        ));

        let duration = plan.duration;
        let inner = self.inner.clone();
        let done_steps = vec![
            Box::new(move || duration) as TimelineStep,
            Box::new(move || {
                complete(&inner);
                0.0_f32
            }) as TimelineStep,
        ];
        let done_task = bridge.submit(Box::new(
            TimelineRoutine::new(done_steps, clock)
                .with_phase(Phase::Late)
                .with_label("sequence-done"),
        ));

        let mut inner = self.inner.borrow_mut();
        inner.play_task = Some(play_task);
        inner.done_task = Some(done_task);
        debug!(
            operations = inner.operations.len(),
            duration,
            unscaled,
            "序列开始播放"
        );
    }

    /// 通过自身绑定的执行桥停止
    pub fn stop(&self) {
        let bridge = self.bridge();
        self.stop_via(bridge.as_ref());
    }

    /// 通过指定执行桥取消两条时间线与已启动的操作
    ///
    /// 未在播放时不做任何事；在完成回调中调用时阻止循环重播。
    /// 停止后不会通知完成，也不会循环重播。
    pub fn stop_via(&self, bridge: &dyn TaskBridge) {
        let handles: Vec<TaskHandle> = {
            let mut inner = self.inner.borrow_mut();
            let completing = inner.state == SequenceState::Completed && inner.notifying;
            if inner.state != SequenceState::Playing && !completing {
                return;
            }
            inner.state = SequenceState::Stopped;
            inner.take_handles()
        };

        debug!(tasks = handles.len(), "序列停止");
        for handle in handles {
            bridge.cancel(handle);
        }
    }
}

/// 启动单个操作
fn launch(inner: &Rc<RefCell<SequenceInner>>, operation: &AnimationOperation, clock: Clock) {
    let bridge = inner.borrow().bridge.clone();
    let handle = bridge.submit(Box::new(operation.into_task(clock)));
    inner.borrow_mut().op_tasks.push(handle);
}

/// 完成通知与循环重播
fn complete(inner: &Rc<RefCell<SequenceInner>>) {
    let handlers = {
        let mut state = inner.borrow_mut();
        state.state = SequenceState::Completed;
        state.play_task = None;
        state.done_task = None;
        state.notifying = true;
        state.subscribers.clone()
    };

    debug!(subscribers = handlers.len(), "序列完成");
    for handler in &handlers {
        handler();
    }
    inner.borrow_mut().notifying = false;

    // 回调中可能停止、重新播放或清理了序列
    let replay = {
        let state = inner.borrow();
        state.state == SequenceState::Completed && state.looping && state.loop_attached
    };
    if replay {
        let unscaled = inner.borrow().unscaled;
        AnimationSequence {
            inner: inner.clone(),
        }
        .play_with(unscaled);
    }
}
