//! # xtask - 开发辅助工具
//!
//! 提供本地质量门禁与开发辅助命令。
//!
//! ## 命令
//!
//! - `check-all`: 运行 fmt、clippy、test
//! - `cov-runtime`: 运行 anim-runtime 覆盖率
//! - `cov-workspace`: 运行 workspace 覆盖率
//! - `anim-check`: 检查动画定义文件（JSON 结构、时间、序列时长）

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anim_runtime::{AnimError, SequenceLibrary};
use clap::{Parser, Subcommand};
use walkdir::WalkDir;
use xshell::{Shell, cmd};

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "开发辅助工具")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 运行 fmt、clippy、test 门禁检查
    CheckAll,
    /// 运行 anim-runtime 覆盖率报告
    CovRuntime,
    /// 运行 workspace 覆盖率报告
    CovWorkspace,
    /// 检查动画定义文件
    ///
    /// 不带参数时检查 host/assets/animations/ 下所有 .json 文件。
    AnimCheck {
        /// 文件或目录
        path: Option<PathBuf>,

        /// 以 JSON 输出检查报告
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    if let Err(e) = real_main() {
        eprintln!("xtask error: {e:#}");
        return ExitCode::from(1);
    }
    ExitCode::from(0)
}

fn real_main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let sh = Shell::new()?;

    match cli.command {
        Commands::CheckAll => {
            eprintln!("\n==> cargo fmt --all -- --check");
            cmd!(sh, "cargo fmt --all -- --check").run()?;

            eprintln!("\n==> cargo clippy --workspace --all-targets");
            cmd!(sh, "cargo clippy --workspace --all-targets").run()?;

            eprintln!("\n==> cargo test --workspace");
            cmd!(sh, "cargo test --workspace").run()?;
        }
        Commands::CovRuntime => {
            ensure_cargo_llvm_cov_available(&sh)?;

            eprintln!("\n==> cargo llvm-cov -p anim-runtime --all-features --html");
            cmd!(sh, "cargo llvm-cov -p anim-runtime --all-features --html").run()?;

            eprintln!("\nCoverage HTML: target/llvm-cov/html/index.html");
        }
        Commands::CovWorkspace => {
            ensure_cargo_llvm_cov_available(&sh)?;

            // 排除 xtask，避免稀释覆盖率信号
            eprintln!("\n==> cargo llvm-cov --workspace --exclude xtask --all-features --html");
            cmd!(
                sh,
                "cargo llvm-cov --workspace --exclude xtask --all-features --html"
            )
            .run()?;

            eprintln!("\nCoverage HTML: target/llvm-cov/html/index.html");
        }
        Commands::AnimCheck { path, json } => anim_check(path.as_deref(), json)?,
    }

    Ok(())
}

fn ensure_cargo_llvm_cov_available(sh: &Shell) -> anyhow::Result<()> {
    match cmd!(sh, "cargo llvm-cov --version").quiet().ignore_stdout().run() {
        Ok(()) => Ok(()),
        Err(_) => anyhow::bail!(
            "cargo llvm-cov 不可用。\n\
请先安装：\n\
  - cargo install cargo-llvm-cov\n\
  - rustup component add llvm-tools-preview\n\
然后重试。"
        ),
    }
}

//=============================================================================
// anim-check 命令实现
//=============================================================================

/// 默认的动画定义目录（相对于 workspace root）
const DEFAULT_ANIMATIONS_DIR: &str = "host/assets/animations";

/// 单个文件的检查结果
struct FileReport {
    path: PathBuf,
    outcome: Result<Vec<SequenceSummary>, AnimError>,
}

/// 序列摘要
struct SequenceSummary {
    name: String,
    operations: usize,
    duration: f32,
    looping: bool,
    ping_pong: bool,
}

/// 执行动画定义检查
fn anim_check(path: Option<&Path>, json: bool) -> anyhow::Result<()> {
    let files = match path {
        Some(path) if path.is_file() => vec![path.to_path_buf()],
        Some(path) if path.is_dir() => collect_definition_files(path),
        Some(path) => anyhow::bail!("路径不存在: {}", path.display()),
        None => {
            let dir = Path::new(DEFAULT_ANIMATIONS_DIR);
            if !dir.exists() {
                anyhow::bail!(
                    "默认动画目录不存在: {}\n请在 workspace 根目录运行，或指定路径",
                    dir.display()
                );
            }
            collect_definition_files(dir)
        }
    };

    if files.is_empty() {
        eprintln!("未找到动画定义文件（.json）");
        return Ok(());
    }

    let reports: Vec<FileReport> = files.iter().map(|file| check_file(file)).collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&reports_to_json(&reports))?);
    } else {
        print_reports(&reports);
    }

    if reports.iter().any(|r| r.outcome.is_err()) {
        anyhow::bail!("动画定义检查发现错误");
    }
    Ok(())
}

/// 递归收集目录下的 `.json` 文件
fn collect_definition_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    files.sort();
    files
}

/// 检查单个文件
fn check_file(path: &Path) -> FileReport {
    let outcome = std::fs::read_to_string(path)
        .map_err(|e| AnimError::Json {
            message: format!("无法读取文件 - {e}"),
        })
        .and_then(|content| SequenceLibrary::from_json(&content))
        .map(|library| {
            library
                .sequences
                .iter()
                .map(|(name, def)| SequenceSummary {
                    name: name.clone(),
                    operations: def.operations.len(),
                    duration: def.preview().map_or(0.0, |plan| plan.duration),
                    looping: def.looping,
                    ping_pong: def.ping_pong,
                })
                .collect()
        });

    FileReport {
        path: path.to_path_buf(),
        outcome,
    }
}

fn reports_to_json(reports: &[FileReport]) -> serde_json::Value {
    let files: Vec<serde_json::Value> = reports
        .iter()
        .map(|report| match &report.outcome {
            Ok(sequences) => serde_json::json!({
                "path": report.path.display().to_string(),
                "sequences": sequences
                    .iter()
                    .map(|s| serde_json::json!({
                        "name": s.name,
                        "operations": s.operations,
                        "duration": s.duration,
                        "loop": s.looping,
                        "ping_pong": s.ping_pong,
                    }))
                    .collect::<Vec<_>>(),
            }),
            Err(e) => serde_json::json!({
                "path": report.path.display().to_string(),
                "error": e.to_string(),
            }),
        })
        .collect();
    serde_json::json!({ "files": files })
}

/// 输出检查结果
fn print_reports(reports: &[FileReport]) {
    let mut sequences = 0;
    let mut errors = 0;

    for report in reports {
        match &report.outcome {
            Ok(summaries) => {
                eprintln!("[OK] {}", report.path.display());
                for s in summaries {
                    let mut flags = Vec::new();
                    if s.looping {
                        flags.push("loop");
                    }
                    if s.ping_pong {
                        flags.push("ping-pong");
                    }
                    eprintln!(
                        "     {:<24} {:>3} ops {:>8.3}s {}",
                        s.name,
                        s.operations,
                        s.duration,
                        flags.join(" ")
                    );
                }
                sequences += summaries.len();
            }
            Err(e) => {
                eprintln!("[ERROR] {}: {}", report.path.display(), e);
                errors += 1;
            }
        }
    }

    eprintln!("─────────────────────────────────────────────────────");
    eprintln!("检查完成: {} 个文件, {} 个序列", reports.len(), sequences);
    if errors > 0 {
        eprintln!("❌ {} 个错误", errors);
    } else {
        eprintln!("✅ 检查通过，无错误");
    }
}
