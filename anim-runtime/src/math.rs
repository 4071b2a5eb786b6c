//! # Math 模块
//!
//! 动画用到的基础数学类型：二维/三维向量、四元数、颜色。

use std::ops::{Add, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};

/// 二维向量
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    /// 零向量
    pub const ZERO: Self = Self::new(0.0, 0.0);
    /// 单位向量 (1, 1)
    pub const ONE: Self = Self::new(1.0, 1.0);

    /// 创建新的向量
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// 线性插值（不限制 t）
    pub fn lerp(self, other: Self, t: f32) -> Self {
        Self {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
        }
    }
}

impl From<(f32, f32)> for Vec2 {
    fn from((x, y): (f32, f32)) -> Self {
        Self { x, y }
    }
}

impl From<Vec2> for (f32, f32) {
    fn from(v: Vec2) -> Self {
        (v.x, v.y)
    }
}

/// 三维向量
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    /// 零向量
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);
    /// 单位向量 (1, 1, 1)
    pub const ONE: Self = Self::new(1.0, 1.0, 1.0);

    /// 创建新的向量
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// 所有分量相同的向量
    pub const fn splat(v: f32) -> Self {
        Self::new(v, v, v)
    }

    /// 点积
    pub fn dot(self, other: Self) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// 长度
    pub fn length(self) -> f32 {
        self.dot(self).sqrt()
    }

    /// 线性插值（不限制 t）
    pub fn lerp(self, other: Self, t: f32) -> Self {
        self + (other - self) * t
    }

    /// 球面插值
    ///
    /// 方向沿大圆插值，长度线性插值。任一端点接近零向量，
    /// 或两方向几乎平行/反向时退化为线性插值。
    pub fn slerp(self, other: Self, t: f32) -> Self {
        let (len_a, len_b) = (self.length(), other.length());
        if len_a < 1e-6 || len_b < 1e-6 {
            return self.lerp(other, t);
        }

        let (dir_a, dir_b) = (self * (1.0 / len_a), other * (1.0 / len_b));
        let theta = dir_a.dot(dir_b).clamp(-1.0, 1.0).acos();
        let sin_theta = theta.sin();
        if sin_theta.abs() < 1e-4 {
            return self.lerp(other, t);
        }

        let wa = ((1.0 - t) * theta).sin() / sin_theta;
        let wb = (t * theta).sin() / sin_theta;
        let length = len_a + (len_b - len_a) * t;
        (dir_a * wa + dir_b * wb) * length
    }
}

impl Add for Vec3 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f32> for Vec3 {
    type Output = Self;

    fn mul(self, rhs: f32) -> Self {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl From<(f32, f32, f32)> for Vec3 {
    fn from((x, y, z): (f32, f32, f32)) -> Self {
        Self { x, y, z }
    }
}

/// 四元数（单位四元数表示旋转）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quat {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Default for Quat {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Quat {
    /// 单位旋转
    pub const IDENTITY: Self = Self::new(0.0, 0.0, 0.0, 1.0);

    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    /// 绕单位轴旋转 `radians`
    pub fn from_axis_angle(axis: Vec3, radians: f32) -> Self {
        let (s, c) = (radians * 0.5).sin_cos();
        Self::new(axis.x * s, axis.y * s, axis.z * s, c)
    }

    /// 由欧拉角（角度制）构造
    ///
    /// 旋转顺序：先绕 Z，再绕 X，最后绕 Y。
    pub fn from_euler_degrees(euler: Vec3) -> Self {
        let x = Self::from_axis_angle(Vec3::new(1.0, 0.0, 0.0), euler.x.to_radians());
        let y = Self::from_axis_angle(Vec3::new(0.0, 1.0, 0.0), euler.y.to_radians());
        let z = Self::from_axis_angle(Vec3::new(0.0, 0.0, 1.0), euler.z.to_radians());
        y * x * z
    }

    pub fn dot(self, other: Self) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z + self.w * other.w
    }

    /// 归一化；长度为零时返回单位旋转
    pub fn normalize(self) -> Self {
        let len = self.dot(self).sqrt();
        if len < 1e-8 {
            return Self::IDENTITY;
        }
        let inv = 1.0 / len;
        Self::new(self.x * inv, self.y * inv, self.z * inv, self.w * inv)
    }

    /// 两个旋转之间的夹角（弧度）
    pub fn angle_between(self, other: Self) -> f32 {
        let d = self.normalize().dot(other.normalize()).abs().min(1.0);
        2.0 * d.acos()
    }

    /// 归一化线性插值，走最短路径
    pub fn nlerp(self, other: Self, t: f32) -> Self {
        let other = if self.dot(other) < 0.0 { -other } else { other };
        Self::new(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
            self.z + (other.z - self.z) * t,
            self.w + (other.w - self.w) * t,
        )
        .normalize()
    }

    /// 球面线性插值，走最短路径
    pub fn slerp(self, other: Self, t: f32) -> Self {
        let mut cos_theta = self.dot(other);
        let other = if cos_theta < 0.0 {
            cos_theta = -cos_theta;
            -other
        } else {
            other
        };

        // 角度很小时直接用 nlerp，避免除以接近零的 sin
        if cos_theta > 0.9995 {
            return self.nlerp(other, t);
        }

        let theta = cos_theta.clamp(-1.0, 1.0).acos();
        let sin_theta = theta.sin();
        let wa = ((1.0 - t) * theta).sin() / sin_theta;
        let wb = (t * theta).sin() / sin_theta;
        Self::new(
            self.x * wa + other.x * wb,
            self.y * wa + other.y * wb,
            self.z * wa + other.z * wb,
            self.w * wa + other.w * wb,
        )
        .normalize()
    }
}

impl Mul for Quat {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        Self::new(
            self.w * rhs.x + self.x * rhs.w + self.y * rhs.z - self.z * rhs.y,
            self.w * rhs.y - self.x * rhs.z + self.y * rhs.w + self.z * rhs.x,
            self.w * rhs.z + self.x * rhs.y - self.y * rhs.x + self.z * rhs.w,
            self.w * rhs.w - self.x * rhs.x - self.y * rhs.y - self.z * rhs.z,
        )
    }
}

impl Neg for Quat {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z, -self.w)
    }
}

/// RGBA 颜色（线性 0.0 - 1.0）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    #[serde(default = "default_alpha")]
    pub a: f32,
}

fn default_alpha() -> f32 {
    1.0
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

impl Color {
    pub const WHITE: Self = Self::rgba(1.0, 1.0, 1.0, 1.0);
    pub const BLACK: Self = Self::rgba(0.0, 0.0, 0.0, 1.0);
    pub const CLEAR: Self = Self::rgba(0.0, 0.0, 0.0, 0.0);

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// 线性插值（逐通道，不限制 t）
    pub fn lerp(self, other: Self, t: f32) -> Self {
        Self {
            r: self.r + (other.r - self.r) * t,
            g: self.g + (other.g - self.g) * t,
            b: self.b + (other.b - self.b) * t,
            a: self.a + (other.a - self.a) * t,
        }
    }
}
