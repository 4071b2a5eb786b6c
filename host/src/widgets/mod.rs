//! # Widgets 模块
//!
//! 基于动画序列的 UI 控件。
//!
//! - [`UiAnimation`]：显示/隐藏两段序列，跟随启用状态自动播放
//! - [`ScreenFader`]：全屏遮罩的收缩/展开转场

mod screen_fader;
mod ui_animation;

pub use screen_fader::ScreenFader;
pub use ui_animation::{UiAnimation, UiAnimationOptions};
