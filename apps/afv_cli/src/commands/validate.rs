// apps/afv_cli/src/commands/validate.rs

//! validate 子命令：解析控制文件并回显解析结果

use anyhow::Context;
use afv_config::FlowParserOptions;
use clap::Args;
use std::path::PathBuf;

/// validate 参数
#[derive(Args)]
pub struct ValidateArgs {
    /// 控制文件路径
    pub control: PathBuf,
}

/// 执行
pub fn execute(args: ValidateArgs) -> anyhow::Result<()> {
    let opts = FlowParserOptions::from_file(&args.control)
        .with_context(|| format!("cannot parse control file {}", args.control.display()))?;
    println!("{}", serde_json::to_string_pretty(&opts)?);
    Ok(())
}
