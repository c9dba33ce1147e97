// crates/afv_physics/src/spatial/mod.rs

//! 空间离散
//!
//! 残差算子 R(u) 与其 Jacobian 的装配。伪时间驱动器只通过
//! [`SpatialDiscretization`] 契约使用空间离散：流动（NVARS = 4）
//! 与标量扩散验证（NVARS = 1）共用同一驱动器与线性代数。

pub mod diffusion;
pub mod flow;
pub mod viscous;

pub use diffusion::DiffusionSpatial;
pub use flow::{FlowSpatial, GhostCenterPolicy, NodalOutput, SurfaceReport};

use crate::numerics::linear_algebra::BlockMatrix;
use afv_mesh::FvMesh;

/// 空间离散契约
///
/// 驱动器的约定：`compute_residual` 自行清零输出并写入残差与
/// 逐单元物理时间步；`compute_jacobian` 把通量 Jacobian 贡献
/// 累加进已放入 V/Δt 对角的线性算子。
pub trait SpatialDiscretization<const N: usize> {
    /// 单元数
    fn n_cells(&self) -> usize;

    /// 单元体积（二维即面积）
    fn cell_volume(&self, i: usize) -> f64;

    /// 计算残差与逐单元物理时间步
    ///
    /// `u`/`residual` 长度 n_cells·N，`dtm` 长度 n_cells。
    fn compute_residual(&self, u: &[f64], residual: &mut [f64], dtm: &mut [f64]);

    /// 将 ∂R/∂u 贡献累加进线性算子
    fn compute_jacobian(&self, u: &[f64], mat: &mut BlockMatrix<N>);
}

/// 全部内部面的 (left, right) 单元对
///
/// 线性算子的稀疏模式与面索引存储都由它确定，次序即内部面
/// 在网格中的次序。
pub fn interior_face_cells(mesh: &FvMesh) -> Vec<(usize, usize)> {
    (mesh.n_bfaces()..mesh.n_faces())
        .map(|f| {
            let face = mesh.face(f);
            (face.left, face.right)
        })
        .collect()
}
