//! # Routine 模块
//!
//! 动画使用的两种任务：
//!
//! - `LerpRoutine`: 按墙钟进度驱动一次插值（开始 → 逐帧 → 结束）
//! - `TimelineRoutine`: 依次执行一组步骤，每个步骤返回下一步之前的等待秒数

use std::fmt;

use crate::task::{Clock, Phase, Step, Task, TaskContext};

/// 插值回调集合
///
/// 由 `AnimationOperation::prepare` 生成，交给 `LerpRoutine` 执行。
/// 所有回调都可能缺省；全部缺省时为空操作。
#[derive(Default)]
pub struct LerpBundle {
    /// 持续时间（秒）
    pub duration: f32,
    pub on_start: Option<Box<dyn FnMut()>>,
    /// 参数为墙钟进度（0.0 - 1.0），缓动由回调自己处理
    pub on_tick: Option<Box<dyn FnMut(f32)>>,
    pub on_end: Option<Box<dyn FnMut()>>,
}

impl LerpBundle {
    /// 空操作
    pub fn noop() -> Self {
        Self::default()
    }

    /// 只在结束时执行一次的瞬时操作
    pub fn instant(on_end: impl FnMut() + 'static) -> Self {
        Self {
            duration: 0.0,
            on_start: None,
            on_tick: None,
            on_end: Some(Box::new(on_end)),
        }
    }

    /// 是否为空操作
    pub fn is_noop(&self) -> bool {
        self.on_start.is_none() && self.on_tick.is_none() && self.on_end.is_none()
    }

    /// 转换为任务
    pub fn into_task(self, clock: Clock) -> LerpRoutine {
        LerpRoutine::new(self, clock)
    }
}

impl fmt::Debug for LerpBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LerpBundle")
            .field("duration", &self.duration)
            .field("on_start", &self.on_start.is_some())
            .field("on_tick", &self.on_tick.is_some())
            .field("on_end", &self.on_end.is_some())
            .finish()
    }
}

/// 插值任务
///
/// ## 时序
///
/// - 第一次轮询：`on_start`，然后 `on_tick(0.0)`；持续时间为 0 时直接 `on_end`
/// - 之后每次轮询：累计时间，`progress = min(elapsed / duration, 1)`
/// - 进度到达 1 的那次轮询执行 `on_end` 并结束
pub struct LerpRoutine {
    bundle: LerpBundle,
    clock: Clock,
    elapsed: f32,
    started: bool,
}

impl LerpRoutine {
    pub fn new(bundle: LerpBundle, clock: Clock) -> Self {
        Self {
            bundle,
            clock,
            elapsed: 0.0,
            started: false,
        }
    }

    fn finish(&mut self) -> Step {
        if let Some(on_end) = self.bundle.on_end.as_mut() {
            on_end();
        }
        Step::Done
    }

    fn tick(&mut self, progress: f32) {
        if let Some(on_tick) = self.bundle.on_tick.as_mut() {
            on_tick(progress);
        }
    }
}

impl Task for LerpRoutine {
    fn poll(&mut self, cx: &mut TaskContext) -> Step {
        if !self.started {
            self.started = true;
            if let Some(on_start) = self.bundle.on_start.as_mut() {
                on_start();
            }
            if self.bundle.duration <= 0.0 {
                return self.finish();
            }
        }

        self.elapsed += cx.delta(self.clock);
        let progress = (self.elapsed / self.bundle.duration).min(1.0);
        if progress >= 1.0 {
            return self.finish();
        }

        self.tick(progress);
        Step::NextFrame
    }

    fn label(&self) -> &str {
        "lerp"
    }
}

/// 时间线步骤：执行副作用并返回下一步之前的等待秒数
pub type TimelineStep = Box<dyn FnMut() -> f32>;

/// 时间线任务
///
/// 依次执行步骤；每个步骤返回的秒数在执行下一步之前等待。
/// 最后一个步骤的返回值被忽略。非正的等待不挂起。
pub struct TimelineRoutine {
    steps: Vec<TimelineStep>,
    next: usize,
    clock: Clock,
    phase: Phase,
    label: &'static str,
}

impl TimelineRoutine {
    pub fn new(steps: Vec<TimelineStep>, clock: Clock) -> Self {
        Self {
            steps,
            next: 0,
            clock,
            phase: Phase::Update,
            label: "timeline",
        }
    }

    /// 设置执行阶段
    pub fn with_phase(mut self, phase: Phase) -> Self {
        self.phase = phase;
        self
    }

    /// 设置日志标签
    pub fn with_label(mut self, label: &'static str) -> Self {
        self.label = label;
        self
    }
}

impl Task for TimelineRoutine {
    fn poll(&mut self, _cx: &mut TaskContext) -> Step {
        while self.next < self.steps.len() {
            let wait = (self.steps[self.next])();
            self.next += 1;

            if self.next == self.steps.len() {
                break;
            }
            if wait > 0.0 {
                return Step::Wait {
                    seconds: wait,
                    clock: self.clock,
                };
            }
        }
        Step::Done
    }

    fn phase(&self) -> Phase {
        self.phase
    }

    fn label(&self) -> &str {
        self.label
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{Executor, FrameTime, TaskBridge};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn recording_bundle(duration: f32, log: &Rc<RefCell<Vec<String>>>) -> LerpBundle {
        let (a, b, c) = (log.clone(), log.clone(), log.clone());
        LerpBundle {
            duration,
            on_start: Some(Box::new(move || a.borrow_mut().push("start".into()))),
            on_tick: Some(Box::new(move |p| b.borrow_mut().push(format!("tick {p}")))),
            on_end: Some(Box::new(move || c.borrow_mut().push("end".into()))),
        }
    }

    #[test]
    fn test_lerp_routine_sequence() {
        let executor = Executor::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        executor.submit(Box::new(recording_bundle(1.0, &log).into_task(Clock::Scaled)));

        for _ in 0..5 {
            executor.tick(FrameTime::uniform(0.25));
        }

        assert_eq!(
            *log.borrow(),
            vec!["start", "tick 0", "tick 0.25", "tick 0.5", "tick 0.75", "end"]
        );
        assert!(executor.is_idle());
    }

    #[test]
    fn test_lerp_routine_zero_duration() {
        let executor = Executor::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        executor.submit(Box::new(recording_bundle(0.0, &log).into_task(Clock::Scaled)));

        executor.tick(FrameTime::uniform(0.25));
        assert_eq!(*log.borrow(), vec!["start", "end"]);
    }

    #[test]
    fn test_lerp_routine_overshooting_frame_ends() {
        let executor = Executor::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        executor.submit(Box::new(recording_bundle(0.3, &log).into_task(Clock::Scaled)));

        executor.tick(FrameTime::uniform(1.0));
        executor.tick(FrameTime::uniform(1.0));
        assert_eq!(*log.borrow(), vec!["start", "tick 0", "end"]);
    }

    #[test]
    fn test_lerp_routine_paused_clock() {
        let executor = Executor::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        executor.submit(Box::new(recording_bundle(0.5, &log).into_task(Clock::Scaled)));

        for _ in 0..3 {
            executor.tick(FrameTime::new(0.0, 0.25));
        }
        assert_eq!(*log.borrow(), vec!["start", "tick 0", "tick 0", "tick 0"]);
    }

    #[test]
    fn test_noop_bundle() {
        let bundle = LerpBundle::noop();
        assert!(bundle.is_noop());
        assert!(!LerpBundle::instant(|| {}).is_noop());
    }

    #[test]
    fn test_timeline_waits_between_steps() {
        let executor = Executor::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        let steps: Vec<TimelineStep> = (0..3)
            .map(|i| {
                let log = log.clone();
                Box::new(move || {
                    log.borrow_mut().push(i);
                    0.5_f32
                }) as TimelineStep
            })
            .collect();
        executor.submit(Box::new(TimelineRoutine::new(steps, Clock::Scaled)));

        executor.tick(FrameTime::uniform(0.25));
        assert_eq!(*log.borrow(), vec![0]);
        executor.tick(FrameTime::uniform(0.25));
        assert_eq!(*log.borrow(), vec![0]);
        executor.tick(FrameTime::uniform(0.25));
        assert_eq!(*log.borrow(), vec![0, 1]);
        executor.tick(FrameTime::uniform(0.25));
        executor.tick(FrameTime::uniform(0.25));
        assert_eq!(*log.borrow(), vec![0, 1, 2]);
        // 最后一步的等待被忽略
        assert!(executor.is_idle());
    }

    #[test]
    fn test_timeline_zero_waits_run_immediately() {
        let executor = Executor::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let steps: Vec<TimelineStep> = (0..4)
            .map(|i| {
                let log = log.clone();
                Box::new(move || {
                    log.borrow_mut().push(i);
                    0.0_f32
                }) as TimelineStep
            })
            .collect();
        executor.submit(Box::new(TimelineRoutine::new(steps, Clock::Scaled)));

        executor.tick(FrameTime::uniform(0.1));
        assert_eq!(*log.borrow(), vec![0, 1, 2, 3]);
        assert!(executor.is_idle());
    }

    #[test]
    fn test_timeline_cancel_skips_remaining() {
        let executor = Executor::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let steps: Vec<TimelineStep> = (0..2)
            .map(|i| {
                let log = log.clone();
                Box::new(move || {
                    log.borrow_mut().push(i);
                    1.0_f32
                }) as TimelineStep
            })
            .collect();
        let handle = executor.submit(Box::new(TimelineRoutine::new(steps, Clock::Scaled)));

        executor.tick(FrameTime::uniform(0.5));
        executor.cancel(handle);
        executor.tick(FrameTime::uniform(0.5));
        executor.tick(FrameTime::uniform(0.5));
        assert_eq!(*log.borrow(), vec![0]);
    }
}
