// crates/afv_physics/src/numerics/linear_algebra/preconditioner.rs

//! 块预条件器
//!
//! - [`IdentityPreconditioner`]: 无预条件
//! - [`BlockJacobi`]: 对角块求逆
//! - [`BlockSgs`]: 块对称 Gauss-Seidel 松弛，扫掠数可配

use super::block::{block_invert, block_mat_vec, Block};
use super::operator::BlockMatrix;
use crate::error::SolveError;

/// 预条件器：z ≈ M⁻¹ r
pub trait Preconditioner {
    /// 应用预条件
    fn apply(&self, r: &[f64], z: &mut [f64]);
}

/// 恒等预条件器
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityPreconditioner;

impl Preconditioner for IdentityPreconditioner {
    fn apply(&self, r: &[f64], z: &mut [f64]) {
        z.copy_from_slice(r);
    }
}

/// 块 Jacobi 预条件器
///
/// 构建时求逆所有对角块；矩阵重装配后需重建。
pub struct BlockJacobi<const N: usize> {
    dinv: Vec<Block<N>>,
}

impl<const N: usize> BlockJacobi<N> {
    /// 从装配完成的矩阵构建
    pub fn build(mat: &BlockMatrix<N>) -> Result<Self, SolveError> {
        let mut dinv = Vec::with_capacity(mat.n_rows());
        for i in 0..mat.n_rows() {
            let inv = block_invert(mat.diag(i))
                .ok_or(SolveError::SingularDiagonal { cell: i })?;
            dinv.push(inv);
        }
        Ok(Self { dinv })
    }
}

impl<const N: usize> Preconditioner for BlockJacobi<N> {
    fn apply(&self, r: &[f64], z: &mut [f64]) {
        for (i, inv) in self.dinv.iter().enumerate() {
            let zi = block_mat_vec(inv, &r[i * N..(i + 1) * N]);
            z[i * N..(i + 1) * N].copy_from_slice(&zi);
        }
    }
}

/// 块对称 Gauss-Seidel 预条件器
///
/// 以零初值做 `sweeps` 次（前向 + 后向）扫掠。借用矩阵本体，
/// 生命周期限定在单个线性求解内。
pub struct BlockSgs<'a, const N: usize> {
    mat: &'a BlockMatrix<N>,
    dinv: Vec<Block<N>>,
    sweeps: usize,
}

impl<'a, const N: usize> BlockSgs<'a, N> {
    /// 从装配完成的矩阵构建
    pub fn build(mat: &'a BlockMatrix<N>, sweeps: usize) -> Result<Self, SolveError> {
        let jacobi = BlockJacobi::build(mat)?;
        Ok(Self {
            mat,
            dinv: jacobi.dinv,
            sweeps: sweeps.max(1),
        })
    }

    fn relax_row(&self, row: usize, r: &[f64], z: &mut [f64]) {
        let mut rhs = [0.0; N];
        rhs.copy_from_slice(&r[row * N..(row + 1) * N]);
        self.mat.for_each_offdiag(row, |col, block| {
            let c = block_mat_vec(block, &z[col * N..(col + 1) * N]);
            for k in 0..N {
                rhs[k] -= c[k];
            }
        });
        let zi = block_mat_vec(&self.dinv[row], &rhs);
        z[row * N..(row + 1) * N].copy_from_slice(&zi);
    }
}

impl<const N: usize> Preconditioner for BlockSgs<'_, N> {
    fn apply(&self, r: &[f64], z: &mut [f64]) {
        let n = self.mat.n_rows();
        z.fill(0.0);
        for _ in 0..self.sweeps {
            for row in 0..n {
                self.relax_row(row, r, z);
            }
            for row in (0..n).rev() {
                self.relax_row(row, r, z);
            }
        }
    }
}
