//! # xtask - 开发辅助工具
//!
//! 提供本地质量门禁与开发辅助命令。
//!
//! ## 命令
//!
//! - `check-all`: 运行 fmt、clippy、test
//! - `cov-core`: 运行 view-fx 覆盖率
//! - `cov-workspace`: 运行 workspace 覆盖率
//! - `config-check`: 检查配置文件（JSON 语法、字段取值）

use std::path::{Path, PathBuf};
use std::process::{Command, ExitCode};

use clap::{Parser, Subcommand};
use view_fx::FxConfig;
use walkdir::WalkDir;

#[derive(Parser)]
#[command(name = "xtask", about = "开发辅助工具")]
struct Cli {
    #[command(subcommand)]
    command: Task,
}

#[derive(Subcommand)]
enum Task {
    /// 运行 fmt、clippy、test 门禁检查
    CheckAll,
    /// 运行 view-fx 覆盖率报告
    CovCore,
    /// 运行 workspace 覆盖率报告
    CovWorkspace,
    /// 检查配置文件
    ///
    /// 不带参数时检查当前目录下的 view-fx.json；
    /// 路径为目录时检查其中所有 .json 文件。
    ConfigCheck {
        /// 文件或目录
        path: Option<PathBuf>,
        /// 打印补全默认值后的配置
        #[arg(long)]
        show: bool,
    },
}

fn run(step: &str, cmd: &mut Command) -> anyhow::Result<()> {
    eprintln!("\n==> {step}");
    let status = cmd.status()?;
    if !status.success() {
        anyhow::bail!("{step} failed with {status}");
    }
    Ok(())
}

fn ensure_cargo_llvm_cov_available() -> anyhow::Result<()> {
    let mut cmd = Command::new("cargo");
    cmd.args(["llvm-cov", "--version"]);
    match cmd.status() {
        Ok(s) if s.success() => Ok(()),
        _ => anyhow::bail!(
            "cargo llvm-cov 不可用。\n\
请先安装：\n\
  - cargo install cargo-llvm-cov\n\
  - rustup component add llvm-tools-preview\n\
然后重试。"
        ),
    }
}

fn main() -> ExitCode {
    if let Err(e) = real_main() {
        eprintln!("xtask error: {e:#}");
        return ExitCode::from(1);
    }
    ExitCode::from(0)
}

fn real_main() -> anyhow::Result<()> {
    match Cli::parse().command {
        Task::CheckAll => {
            let mut fmt = Command::new("cargo");
            fmt.args(["fmt", "--all", "--", "--check"]);
            run("cargo fmt --all -- --check", &mut fmt)?;

            let mut clippy = Command::new("cargo");
            clippy.args(["clippy", "--workspace", "--all-targets"]);
            run("cargo clippy --workspace --all-targets", &mut clippy)?;

            let mut test = Command::new("cargo");
            test.args(["test", "--workspace"]);
            run("cargo test --workspace", &mut test)?;
        }
        Task::CovCore => {
            ensure_cargo_llvm_cov_available()?;

            let mut cov = Command::new("cargo");
            cov.args(["llvm-cov", "-p", "view-fx", "--all-features", "--html"]);
            run("cargo llvm-cov -p view-fx --all-features --html", &mut cov)?;

            eprintln!("\nCoverage HTML: target/llvm-cov/html/index.html");
        }
        Task::CovWorkspace => {
            ensure_cargo_llvm_cov_available()?;

            // 排除 xtask 以免稀释信号
            let mut cov = Command::new("cargo");
            cov.args([
                "llvm-cov",
                "--workspace",
                "--exclude",
                "xtask",
                "--all-features",
                "--html",
            ]);
            run(
                "cargo llvm-cov --workspace --exclude xtask --all-features --html",
                &mut cov,
            )?;

            eprintln!("\nCoverage HTML: target/llvm-cov/html/index.html");
        }
        Task::ConfigCheck { path, show } => {
            config_check(path.as_deref(), show)?;
        }
    }

    Ok(())
}

//=============================================================================
// config-check 命令实现
//=============================================================================

/// 执行配置检查
fn config_check(path: Option<&Path>, show: bool) -> anyhow::Result<()> {
    let path = path.unwrap_or(Path::new("view-fx.json"));

    let files = if path.is_file() {
        vec![path.to_path_buf()]
    } else if path.is_dir() {
        collect_config_files(path)
    } else {
        anyhow::bail!("路径不存在: {}", path.display());
    };

    if files.is_empty() {
        eprintln!("未找到配置文件（.json）");
        return Ok(());
    }

    eprintln!("==> 检查 {} 个配置文件...\n", files.len());

    let mut errors = 0;
    for file in &files {
        match check_config_file(file) {
            Ok(config) => {
                eprintln!("[OK] {}", file.display());
                if show {
                    println!("{}", config.to_json()?);
                }
            }
            Err(e) => {
                eprintln!("[ERROR] {}: {e:#}", file.display());
                errors += 1;
            }
        }
    }

    eprintln!();
    if errors > 0 {
        anyhow::bail!("{errors} 个配置文件无效");
    }
    eprintln!("✅ 检查通过，无错误");
    Ok(())
}

/// 收集目录下的所有 .json 文件
fn collect_config_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
        .collect();
    files.sort();
    files
}

/// 检查单个配置文件
fn check_config_file(file: &Path) -> anyhow::Result<FxConfig> {
    let content = std::fs::read_to_string(file)?;
    let config = FxConfig::from_json(&content)?;
    config.validate()?;
    Ok(config)
}
