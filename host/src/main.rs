//! # court-host
//!
//! headless 动画播放器：加载动画定义文件，按固定帧率驱动并输出节点最终状态。
//!
//! ## 用法
//!
//! ```bash
//! cargo run -p court-host -- inspect host/assets/animations/menu.json
//! cargo run -p court-host -- play host/assets/animations/menu.json --sequence menu_show
//! cargo run -p court-host -- play host/assets/animations/menu.json --sequence button_pulse --seconds 3
//! cargo run -p court-host -- --log-level debug play host/assets/animations/cinema_bar.json \
//!     --sequence cinema_bar_show --reverse --unscaled
//! ```

use std::cell::Cell;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::rc::Rc;

use anim_runtime::{NodeState, SequenceLibrary};
use clap::{Parser, Subcommand};
use court_host::{AppConfig, HostApp, SequenceVariant, config::parse_level, init_logging};

#[derive(Parser)]
#[command(name = "court-host")]
#[command(about = "UI 动画 headless 播放器")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// 配置文件（默认：config.json）
    #[arg(short, long, default_value = "config.json", global = true)]
    config: PathBuf,

    /// 日志级别，覆盖配置文件（trace/debug/info/warn/error）
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// 播放一个序列并输出节点最终状态
    Play {
        /// 动画定义文件
        file: PathBuf,

        /// 序列名称（文件只有一个序列时可省略）
        #[arg(short, long)]
        sequence: Option<String>,

        /// 运行时长（秒），默认运行到序列结束
        #[arg(long)]
        seconds: Option<f32>,

        /// 使用非缩放时间
        #[arg(long)]
        unscaled: bool,

        /// 反向播放
        #[arg(long)]
        reverse: bool,

        /// 往返播放
        #[arg(long)]
        ping_pong: bool,

        /// 循环播放
        #[arg(long = "loop")]
        looping: bool,

        /// 时间倍率，覆盖配置文件
        #[arg(long)]
        time_scale: Option<f32>,
    },

    /// 输出文件中每个序列的播放计划
    Inspect {
        /// 动画定义文件
        file: PathBuf,
    },
}

fn main() -> ExitCode {
    if let Err(e) = real_main() {
        eprintln!("court-host error: {e:#}");
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn real_main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(&cli.config);
    if let Some(level) = &cli.log_level {
        config.logging.level = level.clone();
    }
    init_logging(parse_level(&config.logging.level)?);

    match cli.command {
        Commands::Play {
            file,
            sequence,
            seconds,
            unscaled,
            reverse,
            ping_pong,
            looping,
            time_scale,
        } => {
            if let Some(scale) = time_scale {
                config.timing.time_scale = scale;
            }
            config.validate()?;
            play(
                config,
                &file,
                sequence.as_deref(),
                PlayOptions {
                    seconds,
                    unscaled,
                    reverse,
                    ping_pong,
                    looping,
                },
            )
        }
        Commands::Inspect { file } => inspect(&file),
    }
}

struct PlayOptions {
    seconds: Option<f32>,
    unscaled: bool,
    reverse: bool,
    ping_pong: bool,
    looping: bool,
}

fn play(
    config: AppConfig,
    file: &Path,
    sequence: Option<&str>,
    options: PlayOptions,
) -> anyhow::Result<()> {
    let unscaled = options.unscaled || config.animations.use_unscaled_time;
    let mut app = HostApp::new(config);
    app.load_library(file)?;

    let name = match sequence {
        Some(name) => name.to_string(),
        None => {
            let names: Vec<&str> = app.library().names().collect();
            match names.as_slice() {
                [only] => only.to_string(),
                _ => anyhow::bail!("文件包含多个序列，请用 --sequence 指定: {}", names.join(", ")),
            }
        }
    };

    // 为定义中引用的节点创建带全部组件的实体
    let nodes: Vec<String> = app
        .definition(&name)?
        .node_names()
        .into_iter()
        .map(str::to_string)
        .collect();
    for node in &nodes {
        if !app.scene().contains(node) {
            app.scene_mut().spawn_full(node);
        }
    }

    let sequence = app.build_variant(
        &name,
        SequenceVariant {
            reverse: options.reverse,
            ping_pong: options.ping_pong,
            looping: options.looping,
        },
    )?;

    let completions = Rc::new(Cell::new(0u32));
    {
        let completions = completions.clone();
        sequence.on_finished(Rc::new(move || completions.set(completions.get() + 1)));
    }

    sequence.play_with(unscaled);
    let frames = match options.seconds {
        Some(seconds) => app.run_for(seconds),
        None if sequence.is_looping() => app.run_for(sequence.duration()),
        None => {
            let rate = app.config().timing.frame_rate as f32;
            let limit = ((sequence.duration() + 1.0) * rate).ceil() as usize;
            app.run_until_idle(limit)
        }
    };

    println!(
        "sequence '{name}': {:?}, {} completion(s), {frames} frame(s), duration {:.3}s",
        sequence.state(),
        completions.get(),
        sequence.duration()
    );
    for (node, state) in app.scene().snapshot() {
        println!("  {node}: {}", describe_node(&state));
    }
    Ok(())
}

fn inspect(file: &Path) -> anyhow::Result<()> {
    let content = std::fs::read_to_string(file)?;
    let library = SequenceLibrary::from_json(&content)?;

    for (name, def) in &library.sequences {
        println!(
            "== {name} (loop: {}, ping_pong: {}, operations: {})",
            def.looping,
            def.ping_pong,
            def.operations.len()
        );
        match def.preview() {
            Some(plan) => println!("{}", plan.describe()),
            None => println!("(empty)"),
        }
    }
    Ok(())
}

fn describe_node(state: &NodeState) -> String {
    let mut parts = vec![
        format!("active={}", state.active),
        format!(
            "scale=({:.3}, {:.3}, {:.3})",
            state.local_scale.x, state.local_scale.y, state.local_scale.z
        ),
        format!(
            "rotation=({:.3}, {:.3}, {:.3}, {:.3})",
            state.rotation.x, state.rotation.y, state.rotation.z, state.rotation.w
        ),
        format!(
            "position=({:.3}, {:.3}, {:.3})",
            state.position.x, state.position.y, state.position.z
        ),
    ];
    if let Some(anchors) = state.anchors {
        parts.push(format!(
            "anchors=({:.3}, {:.3})-({:.3}, {:.3})",
            anchors.min.x, anchors.min.y, anchors.max.x, anchors.max.y
        ));
    }
    if let Some(c) = state.colour {
        parts.push(format!("colour=({:.3}, {:.3}, {:.3}, {:.3})", c.r, c.g, c.b, c.a));
    }
    if let Some(alpha) = state.opacity {
        parts.push(format!("opacity={alpha:.3}"));
    }
    parts.join(" ")
}
