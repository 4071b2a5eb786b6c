//! # Task 模块
//!
//! 协作式任务与执行桥。
//!
//! ## 核心概念
//!
//! - `Task`: 可恢复的步进函数，每次 `poll` 返回下一次挂起的方式
//! - `TaskBridge`: 宿主提供的提交/取消通道
//! - `Executor`: 单线程逐帧驱动器，实现 `TaskBridge`
//!
//! ```text
//! Sequence                      Executor (Host)
//!   │                              │
//!   │──── submit(task) ──────────►│
//!   │◄─── TaskHandle ─────────────│
//!   │                              │ tick(FrameTime)
//!   │                              │   poll → Wait / NextFrame / Done
//!   │──── cancel(handle) ────────►│
//! ```
//!
//! 挂起点只有两种："等待 N 秒" 和 "等待一帧"，任务不会在写入中途被打断。

use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt;
use std::mem;
use std::rc::Rc;

use tracing::trace;

/// 等待结束判定的容差
const WAIT_EPSILON: f32 = 1e-5;

/// 时间源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Clock {
    /// 受全局时间缩放/暂停影响
    #[default]
    Scaled,
    /// 真实墙钟时间
    Unscaled,
}

impl Clock {
    /// 根据是否使用非缩放时间选择时间源
    pub fn from_unscaled(unscaled: bool) -> Self {
        if unscaled {
            Clock::Unscaled
        } else {
            Clock::Scaled
        }
    }
}

/// 一帧的时间增量
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameTime {
    /// 缩放后的增量（秒）
    pub scaled: f32,
    /// 真实增量（秒）
    pub unscaled: f32,
}

impl FrameTime {
    pub fn new(scaled: f32, unscaled: f32) -> Self {
        Self { scaled, unscaled }
    }

    /// 两个时间源相同的增量
    pub fn uniform(delta: f32) -> Self {
        Self::new(delta, delta)
    }

    /// 获取指定时间源的增量
    pub fn delta(&self, clock: Clock) -> f32 {
        match clock {
            Clock::Scaled => self.scaled,
            Clock::Unscaled => self.unscaled,
        }
    }
}

/// 任务挂起方式
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Step {
    /// 等待指定秒数（非正数等价于等待一帧）
    Wait { seconds: f32, clock: Clock },
    /// 等待下一帧
    NextFrame,
    /// 任务结束
    Done,
}

/// 执行阶段
///
/// 每帧先执行所有 `Update` 任务，再执行 `Late` 任务。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Update,
    Late,
}

/// 任务轮询上下文
#[derive(Debug, Clone, Copy)]
pub struct TaskContext {
    frame: FrameTime,
    first_poll: bool,
}

impl TaskContext {
    pub fn new(frame: FrameTime, first_poll: bool) -> Self {
        Self { frame, first_poll }
    }

    /// 本次轮询对应的时间增量
    ///
    /// 任务的计时从第一次轮询开始，因此第一次轮询的增量为 0。
    pub fn delta(&self, clock: Clock) -> f32 {
        if self.first_poll {
            0.0
        } else {
            self.frame.delta(clock)
        }
    }

    /// 是否为第一次轮询
    pub fn is_first_poll(&self) -> bool {
        self.first_poll
    }
}

/// 可恢复任务
pub trait Task {
    /// 推进任务直到下一个挂起点
    fn poll(&mut self, cx: &mut TaskContext) -> Step;

    /// 执行阶段
    fn phase(&self) -> Phase {
        Phase::Update
    }

    /// 任务描述（用于日志）
    fn label(&self) -> &str {
        "task"
    }
}

/// 任务句柄
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskHandle(u64);

impl TaskHandle {
    /// 获取内部 ID 值
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TaskHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TaskHandle({})", self.0)
    }
}

/// 执行桥
///
/// 宿主实现此接口，负责在逐帧驱动器上运行任务。
pub trait TaskBridge {
    /// 提交任务，返回可用于取消的句柄
    fn submit(&self, task: Box<dyn Task>) -> TaskHandle;

    /// 取消任务
    ///
    /// 任务在下一个挂起点停止，剩余步骤不会执行。
    /// 取消已结束或未知的句柄是安全的空操作。
    fn cancel(&self, handle: TaskHandle);
}

/// 等待中的计时
#[derive(Debug, Clone, Copy)]
struct PendingWait {
    remaining: f32,
    clock: Clock,
}

/// 已提交的任务
struct Entry {
    handle: TaskHandle,
    task: Box<dyn Task>,
    phase: Phase,
    started: bool,
    wait: Option<PendingWait>,
}

#[derive(Default)]
struct ExecutorState {
    next_id: u64,
    /// 已提交但尚未开始的任务
    incoming: Vec<Entry>,
    /// 运行中的任务（当前阶段的任务在轮询期间会被临时取出）
    running: Vec<Entry>,
    /// 所有未结束的任务
    live: HashSet<TaskHandle>,
    /// 已执行的帧数
    frames: u64,
}

impl ExecutorState {
    fn drain_incoming(&mut self, phase: Phase) -> Vec<Entry> {
        let (matched, rest): (Vec<_>, Vec<_>) = mem::take(&mut self.incoming)
            .into_iter()
            .partition(|e| e.phase == phase);
        self.incoming = rest;
        matched
    }
}

/// 单线程逐帧执行器
///
/// 克隆得到的是同一个执行器的句柄。
///
/// ## 调度规则
///
/// - 每次 `tick` 先轮询 `Update` 阶段，再轮询 `Late` 阶段
/// - `Update` 阶段提交的任务在本帧开始（`Update` 任务立即开始，`Late` 任务在本帧的 `Late` 阶段开始）
/// - `Late` 阶段提交的任务从下一帧开始
/// - 任务计时从第一次轮询开始
#[derive(Clone, Default)]
pub struct Executor {
    shared: Rc<RefCell<ExecutorState>>,
}

impl fmt::Debug for Executor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.borrow();
        f.debug_struct("Executor")
            .field("live", &state.live.len())
            .field("frames", &state.frames)
            .finish()
    }
}

impl Executor {
    /// 创建新的执行器
    pub fn new() -> Self {
        Self::default()
    }

    /// 作为执行桥共享
    pub fn bridge(&self) -> Rc<dyn TaskBridge> {
        Rc::new(self.clone())
    }

    /// 未结束的任务数量
    pub fn len(&self) -> usize {
        self.shared.borrow().live.len()
    }

    /// 是否没有未结束的任务
    pub fn is_idle(&self) -> bool {
        self.len() == 0
    }

    /// 任务是否仍未结束
    pub fn is_live(&self, handle: TaskHandle) -> bool {
        self.shared.borrow().live.contains(&handle)
    }

    /// 已执行的帧数
    pub fn frame_count(&self) -> u64 {
        self.shared.borrow().frames
    }

    /// 丢弃所有任务（不执行任何剩余步骤）
    pub fn clear(&self) {
        let dropped = {
            let mut state = self.shared.borrow_mut();
            state.live.clear();
            let mut dropped = mem::take(&mut state.incoming);
            dropped.append(&mut state.running);
            dropped
        };
        drop(dropped);
    }

    /// 推进一帧
    pub fn tick(&self, frame: FrameTime) {
        self.run_phase(Phase::Update, frame);
        self.run_phase(Phase::Late, frame);
        self.shared.borrow_mut().frames += 1;
    }

    fn run_phase(&self, phase: Phase, frame: FrameTime) {
        let mut batch = {
            let mut state = self.shared.borrow_mut();
            let (mut matched, rest): (Vec<_>, Vec<_>) = mem::take(&mut state.running)
                .into_iter()
                .partition(|e| e.phase == phase);
            state.running = rest;
            matched.extend(state.drain_incoming(phase));
            matched
        };

        let mut survivors = Vec::new();
        while !batch.is_empty() {
            for entry in batch {
                if let Some(entry) = self.resume(entry, frame) {
                    survivors.push(entry);
                }
            }
            // Update 阶段内新提交的 Update 任务立即开始；Late 阶段提交的任务留到下一帧
            batch = match phase {
                Phase::Update => self.shared.borrow_mut().drain_incoming(phase),
                Phase::Late => Vec::new(),
            };
        }

        let cancelled = {
            let mut state = self.shared.borrow_mut();
            let (keep, cancelled): (Vec<_>, Vec<_>) = survivors
                .into_iter()
                .partition(|e| state.live.contains(&e.handle));
            state.running.extend(keep);
            cancelled
        };
        drop(cancelled);
    }

    /// 推进单个任务；返回 `None` 表示任务已结束或被取消
    fn resume(&self, mut entry: Entry, frame: FrameTime) -> Option<Entry> {
        if !self.is_live(entry.handle) {
            return None;
        }

        if let Some(wait) = entry.wait.as_mut() {
            wait.remaining -= frame.delta(wait.clock);
            if wait.remaining > WAIT_EPSILON {
                return Some(entry);
            }
            entry.wait = None;
        }

        let mut cx = TaskContext::new(frame, !entry.started);
        entry.started = true;
        let step = entry.task.poll(&mut cx);

        match step {
            Step::Done => {
                trace!(handle = %entry.handle, label = entry.task.label(), "任务结束");
                self.shared.borrow_mut().live.remove(&entry.handle);
                None
            }
            Step::NextFrame => Some(entry),
            Step::Wait { seconds, clock } => {
                if seconds > WAIT_EPSILON {
                    entry.wait = Some(PendingWait {
                        remaining: seconds,
                        clock,
                    });
                }
                Some(entry)
            }
        }
    }
}

impl TaskBridge for Executor {
    fn submit(&self, task: Box<dyn Task>) -> TaskHandle {
        let mut state = self.shared.borrow_mut();
        state.next_id += 1;
        let handle = TaskHandle(state.next_id);
        let phase = task.phase();
        state.live.insert(handle);
        state.incoming.push(Entry {
            handle,
            task,
            phase,
            started: false,
            wait: None,
        });
        handle
    }

    fn cancel(&self, handle: TaskHandle) {
        let removed = {
            let mut guard = self.shared.borrow_mut();
            let state = &mut *guard;
            if !state.live.remove(&handle) {
                return;
            }
            let mut removed = Vec::new();
            for list in [&mut state.incoming, &mut state.running] {
                if let Some(pos) = list.iter().position(|e| e.handle == handle) {
                    removed.push(list.remove(pos));
                }
            }
            removed
        };
        trace!(%handle, "任务已取消");
        drop(removed);
    }
}
