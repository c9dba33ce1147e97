// apps/afv_cli/src/commands/info.rs

//! info 子命令：显示网格规模与边界标记

use afv_mesh::{FvMesh, GmshLoader};
use clap::Args;
use std::path::PathBuf;

/// info 参数
#[derive(Args)]
pub struct InfoArgs {
    /// 网格路径
    pub mesh: PathBuf,
}

/// 执行
pub fn execute(args: InfoArgs) -> anyhow::Result<()> {
    let data = GmshLoader::load(&args.mesh)?;
    let mesh = FvMesh::build(&data)?;

    println!("mesh: {}", args.mesh.display());
    println!("  nodes:          {}", mesh.n_nodes());
    println!("  cells:          {}", mesh.n_cells());
    println!("  faces:          {}", mesh.n_faces());
    println!("  boundary faces: {}", mesh.n_bfaces());
    println!("  markers:        {:?}", mesh.markers());
    for (tag, name) in &data.physical_names {
        println!("    {tag}: \"{name}\"");
    }
    Ok(())
}
