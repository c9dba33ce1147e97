// crates/afv_io/src/vtu.rs

//! VTU 体输出
//!
//! ASCII VTK UnstructuredGrid，节点数据：density、mach-number、
//! pressure 标量与 velocity 向量，供 ParaView 查看。

use crate::error::{OutputError, OutputResult};
use afv_mesh::FvMesh;
use afv_physics::NodalOutput;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// 三角形单元类型号
const VTK_TRIANGLE: u8 = 5;
/// 四边形单元类型号
const VTK_QUAD: u8 = 9;

/// VTU 导出器
#[derive(Debug, Clone, Copy, Default)]
pub struct VtuWriter;

impl VtuWriter {
    /// 写出节点数据体文件
    pub fn write<P: AsRef<Path>>(
        &self,
        path: P,
        mesh: &FvMesh,
        data: &NodalOutput,
    ) -> OutputResult<()> {
        if data.density.len() != mesh.n_nodes() {
            return Err(OutputError::InvalidData {
                message: format!(
                    "nodal array length {} does not match {} mesh nodes",
                    data.density.len(),
                    mesh.n_nodes()
                ),
            });
        }

        let file = File::create(path.as_ref())?;
        let mut w = BufWriter::new(file);

        writeln!(w, r#"<?xml version="1.0"?>"#)?;
        writeln!(
            w,
            r#"<VTKFile type="UnstructuredGrid" version="0.1" byte_order="LittleEndian">"#
        )?;
        writeln!(w, r#"  <UnstructuredGrid>"#)?;
        writeln!(
            w,
            r#"    <Piece NumberOfPoints="{}" NumberOfCells="{}">"#,
            mesh.n_nodes(),
            mesh.n_cells()
        )?;

        // 节点数据
        writeln!(w, r#"      <PointData Scalars="density" Vectors="velocity">"#)?;
        self.write_scalar(&mut w, "density", &data.density)?;
        self.write_scalar(&mut w, "mach-number", &data.mach)?;
        self.write_scalar(&mut w, "pressure", &data.pressure)?;
        writeln!(
            w,
            r#"        <DataArray type="Float64" Name="velocity" NumberOfComponents="3" format="ascii">"#
        )?;
        for v in &data.velocity {
            writeln!(w, "          {} {} 0", v.x, v.y)?;
        }
        writeln!(w, r#"        </DataArray>"#)?;
        writeln!(w, r#"      </PointData>"#)?;

        // 坐标
        writeln!(w, r#"      <Points>"#)?;
        writeln!(
            w,
            r#"        <DataArray type="Float64" NumberOfComponents="3" format="ascii">"#
        )?;
        for i in 0..mesh.n_nodes() {
            let p = mesh.node(i);
            writeln!(w, "          {} {} 0", p.x, p.y)?;
        }
        writeln!(w, r#"        </DataArray>"#)?;
        writeln!(w, r#"      </Points>"#)?;

        // 连接关系
        writeln!(w, r#"      <Cells>"#)?;
        writeln!(
            w,
            r#"        <DataArray type="Int64" Name="connectivity" format="ascii">"#
        )?;
        for ic in 0..mesh.n_cells() {
            write!(w, "          ")?;
            for n in mesh.cell_nodes(ic) {
                write!(w, "{n} ")?;
            }
            writeln!(w)?;
        }
        writeln!(w, r#"        </DataArray>"#)?;
        writeln!(
            w,
            r#"        <DataArray type="Int64" Name="offsets" format="ascii">"#
        )?;
        let mut offset = 0;
        for ic in 0..mesh.n_cells() {
            offset += mesh.cell_nodes(ic).len();
            writeln!(w, "          {offset}")?;
        }
        writeln!(w, r#"        </DataArray>"#)?;
        writeln!(
            w,
            r#"        <DataArray type="UInt8" Name="types" format="ascii">"#
        )?;
        for ic in 0..mesh.n_cells() {
            let t = if mesh.cell_nodes(ic).len() == 3 {
                VTK_TRIANGLE
            } else {
                VTK_QUAD
            };
            writeln!(w, "          {t}")?;
        }
        writeln!(w, r#"        </DataArray>"#)?;
        writeln!(w, r#"      </Cells>"#)?;

        writeln!(w, r#"    </Piece>"#)?;
        writeln!(w, r#"  </UnstructuredGrid>"#)?;
        writeln!(w, r#"</VTKFile>"#)?;
        w.flush()?;
        Ok(())
    }

    fn write_scalar<W: Write>(&self, w: &mut W, name: &str, values: &[f64]) -> OutputResult<()> {
        writeln!(
            w,
            r#"        <DataArray type="Float64" Name="{name}" format="ascii">"#
        )?;
        for v in values {
            writeln!(w, "          {v}")?;
        }
        writeln!(w, r#"        </DataArray>"#)?;
        Ok(())
    }
}
