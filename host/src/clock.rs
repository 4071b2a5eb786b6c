//! # Clock 模块
//!
//! 游戏时钟：把真实帧间隔转换为动画执行器使用的 [`FrameTime`]。
//!
//! - 非缩放时间只做最大间隔限制
//! - 缩放时间再乘以时间倍率，暂停时为 0

use anim_runtime::FrameTime;

use crate::config::TimingConfig;

/// 游戏时钟
#[derive(Debug, Clone, PartialEq)]
pub struct GameClock {
    time_scale: f32,
    max_delta: f32,
    paused: bool,
    /// 累计缩放时间
    scaled_elapsed: f64,
    /// 累计真实时间
    unscaled_elapsed: f64,
}

impl Default for GameClock {
    fn default() -> Self {
        Self::from_config(&TimingConfig::default())
    }
}

impl GameClock {
    pub fn from_config(timing: &TimingConfig) -> Self {
        Self {
            time_scale: timing.time_scale.max(0.0),
            max_delta: timing.max_delta,
            paused: false,
            scaled_elapsed: 0.0,
            unscaled_elapsed: 0.0,
        }
    }

    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    /// 设置时间倍率（负数按 0 处理）
    pub fn set_time_scale(&mut self, scale: f32) {
        self.time_scale = scale.max(0.0);
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn scaled_elapsed(&self) -> f64 {
        self.scaled_elapsed
    }

    pub fn unscaled_elapsed(&self) -> f64 {
        self.unscaled_elapsed
    }

    /// 推进一帧
    pub fn advance(&mut self, real_delta: f32) -> FrameTime {
        let unscaled = real_delta.clamp(0.0, self.max_delta);
        let scaled = if self.paused {
            0.0
        } else {
            unscaled * self.time_scale
        };

        self.scaled_elapsed += scaled as f64;
        self.unscaled_elapsed += unscaled as f64;
        FrameTime::new(scaled, unscaled)
    }
}
