// crates/afv_physics/src/numerics/gradient/mod.rs

//! 单元梯度重构
//!
//! 输入：所有内部单元的平均值、按边界面索引的幽灵值及幽灵中心。
//! 输出：逐单元逐分量的 (∂u/∂x, ∂u/∂y)。
//!
//! 变体集合封闭：{常量（一阶）, Green-Gauss, 加权最小二乘}。

mod green_gauss;
mod least_squares;

use afv_mesh::FvMesh;
use afv_config::GradientName;
use glam::DVec2;

pub use green_gauss::green_gauss_gradients;
pub use least_squares::least_squares_gradients;

/// 梯度重构方案
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GradientScheme {
    /// 零梯度（一阶）
    Constant,
    /// Green-Gauss 面积分
    GreenGauss,
    /// 加权最小二乘（w = 1/‖Δr‖²）
    LeastSquares,
}

impl GradientScheme {
    /// 按配置名创建
    pub fn create(name: GradientName) -> Self {
        match name {
            GradientName::None => Self::Constant,
            GradientName::GreenGauss => Self::GreenGauss,
            GradientName::LeastSquares => Self::LeastSquares,
        }
    }

    /// 方案名
    pub fn name(&self) -> &'static str {
        match self {
            Self::Constant => "constant",
            Self::GreenGauss => "Green-Gauss",
            Self::LeastSquares => "weighted least squares",
        }
    }

    /// 计算全场梯度
    ///
    /// `ug`/`ghost_centers` 按边界面索引；周期面的幽灵值由调用方
    /// 填入周期邻居的单元值。
    pub fn compute<const N: usize>(
        &self,
        mesh: &FvMesh,
        u: &[[f64; N]],
        ug: &[[f64; N]],
        ghost_centers: &[DVec2],
        dudx: &mut [[f64; N]],
        dudy: &mut [[f64; N]],
    ) {
        match self {
            Self::Constant => {
                dudx.fill([0.0; N]);
                dudy.fill([0.0; N]);
            }
            Self::GreenGauss => green_gauss_gradients(mesh, u, ug, dudx, dudy),
            Self::LeastSquares => {
                least_squares_gradients(mesh, u, ug, ghost_centers, dudx, dudy)
            }
        }
    }
}
