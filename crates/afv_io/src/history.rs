// crates/afv_io/src/history.rs

//! 残差收敛历史输出
//!
//! `<prefix>.tlog`，列：步号、CFL、相对残差、墙钟秒。

use crate::error::OutputResult;
use afv_physics::StepRecord;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// 收敛历史写出器
#[derive(Debug, Clone, Copy, Default)]
pub struct HistoryWriter;

impl HistoryWriter {
    /// 目标文件路径 `<prefix>.tlog`
    pub fn path_for(prefix: &str) -> PathBuf {
        PathBuf::from(format!("{prefix}.tlog"))
    }

    /// 写出一个阶段的历史
    pub fn write<P: AsRef<Path>>(&self, path: P, history: &[StepRecord]) -> OutputResult<()> {
        let file = File::create(path.as_ref())?;
        let mut w = BufWriter::new(file);
        writeln!(w, "# step  cfl  relative-residual  wall-time[s]")?;
        for rec in history {
            writeln!(
                w,
                "{} {:.6e} {:.10e} {:.4e}",
                rec.step, rec.cfl, rec.rel_residual, rec.wall_time
            )?;
        }
        w.flush()?;
        Ok(())
    }
}
