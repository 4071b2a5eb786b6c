//! # App 模块
//!
//! Host 应用：持有配置、执行器、时钟、场景和动画定义库，按帧驱动动画。

use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use anim_runtime::{
    AnimationSequence, Executor, FrameTime, SequenceDef, SequenceLibrary, TaskBridge,
};
use tracing::{debug, info, warn};

use crate::clock::GameClock;
use crate::config::AppConfig;
use crate::error::{HostError, HostResult};
use crate::scene::Scene;

/// 序列变体：在定义之上追加的反向/往返/循环
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SequenceVariant {
    pub reverse: bool,
    pub ping_pong: bool,
    pub looping: bool,
}

/// Host 应用
pub struct HostApp {
    config: AppConfig,
    executor: Executor,
    clock: GameClock,
    scene: Scene,
    library: SequenceLibrary,
    frames: u64,
}

impl HostApp {
    pub fn new(config: AppConfig) -> Self {
        let clock = GameClock::from_config(&config.timing);
        Self {
            config,
            executor: Executor::new(),
            clock,
            scene: Scene::new(),
            library: SequenceLibrary::default(),
            frames: 0,
        }
    }

    // ========== 访问器 ==========

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn executor(&self) -> &Executor {
        &self.executor
    }

    /// 动画序列使用的执行桥
    pub fn bridge(&self) -> Rc<dyn TaskBridge> {
        self.executor.bridge()
    }

    pub fn clock(&self) -> &GameClock {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut GameClock {
        &mut self.clock
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    pub fn library(&self) -> &SequenceLibrary {
        &self.library
    }

    /// 已推进的帧数
    pub fn frames(&self) -> u64 {
        self.frames
    }

    // ========== 动画定义 ==========

    /// 加载一个定义文件，合并到定义库
    ///
    /// 同名序列以后加载的为准。返回文件中的序列数量。
    pub fn load_library(&mut self, path: impl AsRef<Path>) -> HostResult<usize> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| HostError::io(path, e))?;
        let loaded = SequenceLibrary::from_json(&content).map_err(|source| HostError::Load {
            path: path.to_path_buf(),
            source,
        })?;

        let count = loaded.sequences.len();
        for (name, def) in loaded.sequences {
            if self.library.sequences.insert(name.clone(), def).is_some() {
                warn!(sequence = %name, path = %path.display(), "序列重复定义，覆盖旧定义");
            }
        }
        info!(path = %path.display(), count, "动画定义加载完成");
        Ok(count)
    }

    /// 加载配置目录下的所有 `.json` 定义文件（按文件名排序）
    pub fn load_library_dir(&mut self) -> HostResult<usize> {
        let dir = self.config.animations.dir.clone();
        let entries = fs::read_dir(&dir).map_err(|e| HostError::io(&dir, e))?;

        let mut files: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "json"))
            .collect();
        files.sort();

        let mut total = 0;
        for file in &files {
            total += self.load_library(file)?;
        }
        debug!(dir = %dir.display(), files = files.len(), total, "动画目录加载完成");
        Ok(total)
    }

    /// 按名称获取定义
    pub fn definition(&self, name: &str) -> HostResult<&SequenceDef> {
        Ok(self.library.get(name)?)
    }

    /// 把命名序列绑定到当前场景
    pub fn build_sequence(&self, name: &str) -> HostResult<AnimationSequence> {
        Ok(self.library.build(name, &self.scene, self.bridge())?)
    }

    /// 构建命名序列并应用变体
    ///
    /// 反向时保留定义中的循环配置；定义已往返时操作列表已经展开，不会再次展开。
    pub fn build_variant(
        &self,
        name: &str,
        variant: SequenceVariant,
    ) -> HostResult<AnimationSequence> {
        let mut sequence = self.build_sequence(name)?;
        let ping_pong = sequence.is_ping_pong();
        let looping = sequence.is_looping();

        if variant.reverse {
            sequence = sequence.reversed();
        }
        if variant.ping_pong && !ping_pong {
            sequence.ping_pong();
        }
        if variant.looping || looping {
            sequence.enable_loop();
        }
        Ok(sequence)
    }

    // ========== 帧驱动 ==========

    /// 推进一帧
    pub fn step(&mut self, real_delta: f32) -> FrameTime {
        let frame = self.clock.advance(real_delta);
        self.executor.tick(frame);
        self.frames += 1;
        frame
    }

    /// 以固定帧率运行指定秒数，返回推进的帧数
    pub fn run_for(&mut self, seconds: f32) -> usize {
        let dt = self.config.timing.frame_delta();
        let frames = (seconds.max(0.0) / dt).ceil() as usize;
        for _ in 0..frames {
            self.step(dt);
        }
        frames
    }

    /// 以固定帧率运行直到没有任务，最多 `max_frames` 帧
    pub fn run_until_idle(&mut self, max_frames: usize) -> usize {
        let dt = self.config.timing.frame_delta();
        let mut frames = 0;
        while !self.executor.is_idle() && frames < max_frames {
            self.step(dt);
            frames += 1;
        }
        frames
    }
}
