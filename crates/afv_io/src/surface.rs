// crates/afv_io/src/surface.rs

//! 壁面气动系数输出
//!
//! 每个壁面标记写一个纯文本文件 `<prefix>-<marker>.dat`：
//! 头两行是 CL/CD，随后逐面一行 (x, y, cp)。

use crate::error::OutputResult;
use afv_physics::SurfaceReport;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// 表面系数写出器
#[derive(Debug, Clone, Copy, Default)]
pub struct SurfaceWriter;

impl SurfaceWriter {
    /// 目标文件路径 `<prefix>-<marker>.dat`
    pub fn path_for(prefix: &str, marker: i32) -> PathBuf {
        PathBuf::from(format!("{prefix}-{marker}.dat"))
    }

    /// 写出单个标记的报告
    pub fn write<P: AsRef<Path>>(&self, path: P, report: &SurfaceReport) -> OutputResult<()> {
        let file = File::create(path.as_ref())?;
        let mut w = BufWriter::new(file);
        writeln!(w, "# marker {}", report.marker)?;
        writeln!(w, "# CL = {:.10e}", report.cl)?;
        writeln!(w, "# CD = {:.10e}", report.cd)?;
        writeln!(w, "# x  y  cp")?;
        for &(x, y, cp) in &report.rows {
            writeln!(w, "{x:.10e} {y:.10e} {cp:.10e}")?;
        }
        w.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_naming() {
        assert_eq!(
            SurfaceWriter::path_for("cyl-surf", 2),
            PathBuf::from("cyl-surf-2.dat")
        );
    }

    #[test]
    fn test_write_format() {
        let report = SurfaceReport {
            marker: 2,
            cl: 0.125,
            cd: 0.0375,
            rows: vec![(0.0, 0.5, -1.25), (1.0, 0.5, 0.75)],
        };
        let path = std::env::temp_dir().join("afv_io_surface_test.dat");
        SurfaceWriter.write(&path, &report).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("# marker 2"));
        assert!(text.contains("# CL = 1.2500000000e-1"));
        assert!(text.contains("# CD = 3.7500000000e-2"));
        assert_eq!(text.lines().count(), 6);
        std::fs::remove_file(&path).ok();
    }
}
