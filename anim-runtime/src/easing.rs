//! # Easing 模块
//!
//! 缓动函数库，把归一化时间映射为缓动后的进度。
//!
//! 所有曲线都是纯函数；`EaseType::None` 没有对应的曲线，
//! 调用方需要特殊处理（跳过插值，直接应用目标值）。

use std::f32::consts::PI;

use serde::{Deserialize, Serialize};

/// 缓动曲线函数签名
pub type EaseFn = fn(f32) -> f32;

/// 缓动类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EaseType {
    /// 无插值：在结束时直接应用目标值
    #[default]
    None,
    /// 线性（匀速）
    Linear,
    QuadraticIn,
    QuadraticOut,
    QuadraticInOut,
    CubicIn,
    CubicOut,
    CubicInOut,
    QuarticIn,
    QuarticOut,
    QuarticInOut,
    QuinticIn,
    QuinticOut,
    QuinticInOut,
    ExponentialIn,
    ExponentialOut,
    ExponentialInOut,
    SineIn,
    SineOut,
    SineInOut,
    CircularIn,
    CircularOut,
    CircularInOut,
    ElasticIn,
    ElasticOut,
    ElasticInOut,
    BackIn,
    BackOut,
    BackInOut,
    BounceIn,
    BounceOut,
    BounceInOut,
    /// 三次平滑阶跃
    SmoothStepSmooth,
    /// 五次平滑阶跃（Perlin smootherstep）
    SmoothStepSmoother,
    /// 七次平滑阶跃
    SmoothStepSmoothest,
}

impl EaseType {
    /// 所有缓动类型（含 `None`）
    pub const ALL: [EaseType; 35] = [
        EaseType::None,
        EaseType::Linear,
        EaseType::QuadraticIn,
        EaseType::QuadraticOut,
        EaseType::QuadraticInOut,
        EaseType::CubicIn,
        EaseType::CubicOut,
        EaseType::CubicInOut,
        EaseType::QuarticIn,
        EaseType::QuarticOut,
        EaseType::QuarticInOut,
        EaseType::QuinticIn,
        EaseType::QuinticOut,
        EaseType::QuinticInOut,
        EaseType::ExponentialIn,
        EaseType::ExponentialOut,
        EaseType::ExponentialInOut,
        EaseType::SineIn,
        EaseType::SineOut,
        EaseType::SineInOut,
        EaseType::CircularIn,
        EaseType::CircularOut,
        EaseType::CircularInOut,
        EaseType::ElasticIn,
        EaseType::ElasticOut,
        EaseType::ElasticInOut,
        EaseType::BackIn,
        EaseType::BackOut,
        EaseType::BackInOut,
        EaseType::BounceIn,
        EaseType::BounceOut,
        EaseType::BounceInOut,
        EaseType::SmoothStepSmooth,
        EaseType::SmoothStepSmoother,
        EaseType::SmoothStepSmoothest,
    ];

    /// 获取对应的缓动曲线
    ///
    /// `None` 返回 `None`，表示不做插值。
    pub fn ease_fn(self) -> Option<EaseFn> {
        let f: EaseFn = match self {
            EaseType::None => return None,
            EaseType::Linear => linear,
            EaseType::QuadraticIn => quadratic_in,
            EaseType::QuadraticOut => quadratic_out,
            EaseType::QuadraticInOut => quadratic_in_out,
            EaseType::CubicIn => cubic_in,
            EaseType::CubicOut => cubic_out,
            EaseType::CubicInOut => cubic_in_out,
            EaseType::QuarticIn => quartic_in,
            EaseType::QuarticOut => quartic_out,
            EaseType::QuarticInOut => quartic_in_out,
            EaseType::QuinticIn => quintic_in,
            EaseType::QuinticOut => quintic_out,
            EaseType::QuinticInOut => quintic_in_out,
            EaseType::ExponentialIn => exponential_in,
            EaseType::ExponentialOut => exponential_out,
            EaseType::ExponentialInOut => exponential_in_out,
            EaseType::SineIn => sine_in,
            EaseType::SineOut => sine_out,
            EaseType::SineInOut => sine_in_out,
            EaseType::CircularIn => circular_in,
            EaseType::CircularOut => circular_out,
            EaseType::CircularInOut => circular_in_out,
            EaseType::ElasticIn => elastic_in,
            EaseType::ElasticOut => elastic_out,
            EaseType::ElasticInOut => elastic_in_out,
            EaseType::BackIn => back_in,
            EaseType::BackOut => back_out,
            EaseType::BackInOut => back_in_out,
            EaseType::BounceIn => bounce_in,
            EaseType::BounceOut => bounce_out,
            EaseType::BounceInOut => bounce_in_out,
            EaseType::SmoothStepSmooth => smooth_step,
            EaseType::SmoothStepSmoother => smoother_step,
            EaseType::SmoothStepSmoothest => smoothest_step,
        };
        Some(f)
    }

    /// 计算缓动值
    ///
    /// # 参数
    /// - `t`: 时间进度，会被限制到 0.0 - 1.0
    ///
    /// # 返回
    /// - 缓动后的进度值（elastic/back 会越过 0..1）
    /// - `None` 类型视为瞬间完成，始终返回 1.0
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self.ease_fn() {
            Some(f) => f(t),
            None => 1.0,
        }
    }

    /// 是否为瞬间应用（无插值）
    pub fn is_instant(self) -> bool {
        self == EaseType::None
    }
}

/// 线性
pub fn linear(x: f32) -> f32 {
    x
}

fn quadratic_in(x: f32) -> f32 {
    x * x
}

fn quadratic_out(x: f32) -> f32 {
    1.0 - (1.0 - x) * (1.0 - x)
}

fn quadratic_in_out(x: f32) -> f32 {
    if x < 0.5 {
        2.0 * x * x
    } else {
        1.0 - (-2.0 * x + 2.0).powi(2) / 2.0
    }
}

fn cubic_in(x: f32) -> f32 {
    x * x * x
}

fn cubic_out(x: f32) -> f32 {
    1.0 - (1.0 - x).powi(3)
}

fn cubic_in_out(x: f32) -> f32 {
    if x < 0.5 {
        4.0 * x * x * x
    } else {
        1.0 - (-2.0 * x + 2.0).powi(3) / 2.0
    }
}

fn quartic_in(x: f32) -> f32 {
    x * x * x * x
}

fn quartic_out(x: f32) -> f32 {
    1.0 - (1.0 - x).powi(4)
}

fn quartic_in_out(x: f32) -> f32 {
    if x < 0.5 {
        8.0 * x * x * x * x
    } else {
        1.0 - (-2.0 * x + 2.0).powi(4) / 2.0
    }
}

fn quintic_in(x: f32) -> f32 {
    x * x * x * x * x
}

fn quintic_out(x: f32) -> f32 {
    1.0 - (1.0 - x).powi(5)
}

fn quintic_in_out(x: f32) -> f32 {
    if x < 0.5 {
        16.0 * x * x * x * x * x
    } else {
        1.0 - (-2.0 * x + 2.0).powi(5) / 2.0
    }
}

/// 端点附近直接吸附到 1.0
fn near_one(x: f32) -> bool {
    (x - 1.0).abs() < 0.01
}

fn exponential_in(x: f32) -> f32 {
    if x == 0.0 {
        0.0
    } else {
        2.0_f32.powf(10.0 * x - 10.0)
    }
}

fn exponential_out(x: f32) -> f32 {
    if near_one(x) {
        1.0
    } else {
        1.0 - 2.0_f32.powf(-10.0 * x)
    }
}

fn exponential_in_out(x: f32) -> f32 {
    if x == 0.0 {
        0.0
    } else if near_one(x) {
        1.0
    } else if x < 0.5 {
        2.0_f32.powf(20.0 * x - 10.0) / 2.0
    } else {
        (2.0 - 2.0_f32.powf(-20.0 * x + 10.0)) / 2.0
    }
}

fn sine_in(x: f32) -> f32 {
    1.0 - (x * PI / 2.0).cos()
}

fn sine_out(x: f32) -> f32 {
    (x * PI / 2.0).sin()
}

fn sine_in_out(x: f32) -> f32 {
    -((PI * x).cos() - 1.0) / 2.0
}

fn circular_in(x: f32) -> f32 {
    1.0 - (1.0 - x * x).max(0.0).sqrt()
}

fn circular_out(x: f32) -> f32 {
    (1.0 - (x - 1.0).powi(2)).max(0.0).sqrt()
}

fn circular_in_out(x: f32) -> f32 {
    if x < 0.5 {
        (1.0 - (1.0 - (2.0 * x).powi(2)).max(0.0).sqrt()) / 2.0
    } else {
        ((1.0 - (-2.0 * x + 2.0).powi(2)).max(0.0).sqrt() + 1.0) / 2.0
    }
}

fn elastic_in(x: f32) -> f32 {
    let c4 = (2.0 * PI) / 3.0;
    if x == 0.0 {
        0.0
    } else if near_one(x) {
        1.0
    } else {
        -(2.0_f32.powf(10.0 * x - 10.0)) * ((x * 10.0 - 10.75) * c4).sin()
    }
}

fn elastic_out(x: f32) -> f32 {
    let c4 = (2.0 * PI) / 3.0;
    if x == 0.0 {
        0.0
    } else if near_one(x) {
        1.0
    } else {
        2.0_f32.powf(-10.0 * x) * ((x * 10.0 - 0.75) * c4).sin() + 1.0
    }
}

fn elastic_in_out(x: f32) -> f32 {
    let c5 = (2.0 * PI) / 4.5;
    if x == 0.0 {
        0.0
    } else if near_one(x) {
        1.0
    } else if x < 0.5 {
        -(2.0_f32.powf(20.0 * x - 10.0) * ((20.0 * x - 11.125) * c5).sin()) / 2.0
    } else {
        2.0_f32.powf(-20.0 * x + 10.0) * ((20.0 * x - 11.125) * c5).sin() / 2.0 + 1.0
    }
}

const BACK_C1: f32 = 1.70158;
const BACK_C2: f32 = BACK_C1 * 1.525;
const BACK_C3: f32 = BACK_C1 + 1.0;

fn back_in(x: f32) -> f32 {
    BACK_C3 * x * x * x - BACK_C1 * x * x
}

fn back_out(x: f32) -> f32 {
    1.0 + BACK_C3 * (x - 1.0).powi(3) + BACK_C1 * (x - 1.0).powi(2)
}

fn back_in_out(x: f32) -> f32 {
    if x < 0.5 {
        (2.0 * x).powi(2) * ((BACK_C2 + 1.0) * 2.0 * x - BACK_C2) / 2.0
    } else {
        ((2.0 * x - 2.0).powi(2) * ((BACK_C2 + 1.0) * (x * 2.0 - 2.0) + BACK_C2) + 2.0) / 2.0
    }
}

fn bounce_in(x: f32) -> f32 {
    1.0 - bounce_out(1.0 - x)
}

/// 弹跳缓出
fn bounce_out(x: f32) -> f32 {
    let n1 = 7.5625;
    let d1 = 2.75;

    if x < 1.0 / d1 {
        n1 * x * x
    } else if x < 2.0 / d1 {
        let x = x - 1.5 / d1;
        n1 * x * x + 0.75
    } else if x < 2.5 / d1 {
        let x = x - 2.25 / d1;
        n1 * x * x + 0.9375
    } else {
        let x = x - 2.625 / d1;
        n1 * x * x + 0.984375
    }
}

fn bounce_in_out(x: f32) -> f32 {
    if x < 0.5 {
        (1.0 - bounce_out(1.0 - 2.0 * x)) / 2.0
    } else {
        (1.0 + bounce_out(2.0 * x - 1.0)) / 2.0
    }
}

fn smooth_step(x: f32) -> f32 {
    x * x * (3.0 - 2.0 * x)
}

fn smoother_step(x: f32) -> f32 {
    x * x * x * (x * (6.0 * x - 15.0) + 10.0)
}

fn smoothest_step(x: f32) -> f32 {
    -20.0 * x.powi(7) + 70.0 * x.powi(6) - 84.0 * x.powi(5) + 35.0 * x.powi(4)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-3;

    #[test]
    fn test_endpoints() {
        for ease in EaseType::ALL {
            let Some(f) = ease.ease_fn() else {
                assert_eq!(ease, EaseType::None);
                continue;
            };
            assert!(f(0.0).abs() < EPS, "{ease:?}(0) = {}", f(0.0));
            assert!((f(1.0) - 1.0).abs() < EPS, "{ease:?}(1) = {}", f(1.0));
        }
    }

    #[test]
    fn test_none_has_no_curve() {
        assert!(EaseType::None.ease_fn().is_none());
        assert!(EaseType::None.is_instant());
        assert_eq!(EaseType::None.apply(0.0), 1.0);
    }

    #[test]
    fn test_linear() {
        let easing = EaseType::Linear;
        assert_eq!(easing.apply(0.0), 0.0);
        assert_eq!(easing.apply(0.5), 0.5);
        assert_eq!(easing.apply(1.0), 1.0);
    }

    #[test]
    fn test_clamp() {
        let easing = EaseType::Linear;
        // 超出范围应该被限制
        assert_eq!(easing.apply(-0.5), 0.0);
        assert_eq!(easing.apply(1.5), 1.0);
    }

    #[test]
    fn test_known_values() {
        // cubic-out: 1 - (1 - x)^3
        assert!((EaseType::CubicOut.apply(0.5) - 0.875).abs() < 1e-6);
        assert!((EaseType::QuadraticIn.apply(0.5) - 0.25).abs() < 1e-6);
        assert!((EaseType::SmoothStepSmooth.apply(0.5) - 0.5).abs() < 1e-6);
        assert!((EaseType::SmoothStepSmoother.apply(0.5) - 0.5).abs() < 1e-6);
        assert!((EaseType::SmoothStepSmoothest.apply(0.5) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_bounce_breakpoints() {
        let d1 = 2.75_f32;
        // 每次落地都回到 1.0
        for x in [1.0 / d1, 2.0 / d1, 2.5 / d1, 1.0] {
            assert!((EaseType::BounceOut.apply(x) - 1.0).abs() < 1e-4, "x = {x}");
        }
        // 每段弹跳的最低点
        assert!((EaseType::BounceOut.apply(1.5 / d1) - 0.75).abs() < 1e-4);
        assert!((EaseType::BounceOut.apply(2.25 / d1) - 0.9375).abs() < 1e-4);
        assert!((EaseType::BounceOut.apply(2.625 / d1) - 0.984375).abs() < 1e-4);
    }

    #[test]
    fn test_overshoot_curves() {
        // back 曲线会先向反方向运动
        assert!(EaseType::BackIn.apply(0.2) < 0.0);
        assert!(EaseType::BackOut.apply(0.8) > 1.0);
        // elastic 出口附近越过 1.0
        assert!(EaseType::ElasticOut.apply(0.1) > 1.0);
    }

    #[test]
    fn test_exponential_edge_cases() {
        assert_eq!(EaseType::ExponentialIn.apply(0.0), 0.0);
        assert_eq!(EaseType::ExponentialOut.apply(0.995), 1.0);
        assert_eq!(EaseType::ElasticInOut.apply(0.0), 0.0);
        assert_eq!(EaseType::ElasticInOut.apply(0.999), 1.0);
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&EaseType::QuarticIn).unwrap();
        assert_eq!(json, "\"QuarticIn\"");
        let back: EaseType = serde_json::from_str("\"SmoothStepSmoother\"").unwrap();
        assert_eq!(back, EaseType::SmoothStepSmoother);
    }
}
