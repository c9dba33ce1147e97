// apps/afv_cli/src/main.rs

//! AeroFV 命令行界面
//!
//! 定常可压缩流求解器的命令行工具：
//! - `run`: 按控制文件运行求解并写出结果
//! - `validate`: 解析控制文件并输出解析后的配置
//! - `info`: 显示网格信息

mod commands;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// AeroFV 求解器命令行工具
#[derive(Parser)]
#[command(name = "afv_cli")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "AeroFV compressible flow solver", long_about = None)]
struct Cli {
    /// 日志级别 (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 运行求解
    Run(commands::run::RunArgs),
    /// 验证控制文件
    Validate(commands::validate::ValidateArgs),
    /// 显示网格信息
    Info(commands::info::InfoArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Run(args) => commands::run::execute(args),
        Commands::Validate(args) => commands::validate::execute(args),
        Commands::Info(args) => commands::info::execute(args),
    }
}
