//! # Lerp 模块
//!
//! 带缓动的插值原语。
//!
//! `t` 是墙钟进度（0.0 - 1.0），函数内部先计算 `ease(t)`，
//! 再对具体类型做插值。未指定缓动时使用线性。

use crate::easing::{EaseFn, linear};
use crate::math::{Color, Quat, Vec2, Vec3};

/// 可线性插值的类型
pub trait Lerp: Copy {
    /// 按（已缓动的）进度插值，不限制进度范围
    fn lerp_to(self, other: Self, progress: f32) -> Self;
}

/// 可球面插值的类型
pub trait Slerp: Copy {
    fn slerp_to(self, other: Self, progress: f32) -> Self;
}

impl Lerp for f32 {
    fn lerp_to(self, other: Self, progress: f32) -> Self {
        self + (other - self) * progress
    }
}

impl Lerp for Vec2 {
    fn lerp_to(self, other: Self, progress: f32) -> Self {
        self.lerp(other, progress)
    }
}

impl Lerp for Vec3 {
    fn lerp_to(self, other: Self, progress: f32) -> Self {
        self.lerp(other, progress)
    }
}

impl Lerp for Color {
    fn lerp_to(self, other: Self, progress: f32) -> Self {
        self.lerp(other, progress)
    }
}

/// 旋转使用归一化四元数插值，而不是逐分量插值
impl Lerp for Quat {
    fn lerp_to(self, other: Self, progress: f32) -> Self {
        self.nlerp(other, progress)
    }
}

/// 成对插值（如锚点的 min / max）
impl<A: Lerp, B: Lerp> Lerp for (A, B) {
    fn lerp_to(self, other: Self, progress: f32) -> Self {
        (
            self.0.lerp_to(other.0, progress),
            self.1.lerp_to(other.1, progress),
        )
    }
}

impl Slerp for Vec3 {
    fn slerp_to(self, other: Self, progress: f32) -> Self {
        self.slerp(other, progress)
    }
}

impl Slerp for Quat {
    fn slerp_to(self, other: Self, progress: f32) -> Self {
        self.slerp(other, progress)
    }
}

/// 带缓动的线性插值
pub fn lerp<T: Lerp>(a: T, b: T, t: f32, ease: Option<EaseFn>) -> T {
    let ease = ease.unwrap_or(linear);
    a.lerp_to(b, ease(t))
}

/// 带缓动的球面插值
pub fn slerp<T: Slerp>(a: T, b: T, t: f32, ease: Option<EaseFn>) -> T {
    let ease = ease.unwrap_or(linear);
    a.slerp_to(b, ease(t))
}
