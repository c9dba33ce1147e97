// crates/afv_physics/src/numerics/linear_algebra/matrix_free.rs

//! 矩阵自由 Jacobian-向量积
//!
//! 有限差分近似 J·v ≈ (R(u + εv/‖v‖) − R(u))/(ε/‖v‖)，
//! ε = √(机器舍入)/10。可选叠加伪时间对角项 A_i/Δt_i·v_i，
//! 从而整体近似 (V/Δt + ∂R/∂u)·v。
//!
//! 实现 [`LinearOperator`]，Krylov 求解器无须感知差异；
//! 预条件仍取装配矩阵（见隐式驱动器）。

use super::operator::LinearOperator;
use super::vector_ops::norm2;
use crate::spatial::SpatialDiscretization;
use std::cell::RefCell;

/// 有限差分扰动量 ε = √ulp / 10
pub fn fd_epsilon() -> f64 {
    f64::EPSILON.sqrt() / 10.0
}

struct MfBuffers {
    u_pert: Vec<f64>,
    r_pert: Vec<f64>,
    dtm: Vec<f64>,
}

/// 矩阵自由 Jacobian 算子
///
/// 借用基态 `u` 与基残差 `r_base`（本步已算出，不重复计算）。
pub struct MatrixFreeJacobian<'a, S, const N: usize> {
    spatial: &'a S,
    u: &'a [f64],
    r_base: &'a [f64],
    /// 伪时间对角项 A_i/Δt_i（逐单元），None 表示纯 ∂R/∂u·v
    vol_over_dt: Option<&'a [f64]>,
    buffers: RefCell<MfBuffers>,
}

impl<'a, S: SpatialDiscretization<N>, const N: usize> MatrixFreeJacobian<'a, S, N> {
    /// 创建
    pub fn new(
        spatial: &'a S,
        u: &'a [f64],
        r_base: &'a [f64],
        vol_over_dt: Option<&'a [f64]>,
    ) -> Self {
        let n = u.len();
        Self {
            spatial,
            u,
            r_base,
            vol_over_dt,
            buffers: RefCell::new(MfBuffers {
                u_pert: vec![0.0; n],
                r_pert: vec![0.0; n],
                dtm: vec![0.0; n / N],
            }),
        }
    }
}

impl<S: SpatialDiscretization<N>, const N: usize> LinearOperator
    for MatrixFreeJacobian<'_, S, N>
{
    fn dim(&self) -> usize {
        self.u.len()
    }

    fn apply(&self, v: &[f64], y: &mut [f64]) {
        let vnorm = norm2(v);
        if vnorm == 0.0 {
            y.fill(0.0);
            return;
        }

        let eps = fd_epsilon();
        let mut buf = self.buffers.borrow_mut();
        let scale = eps / vnorm;
        for i in 0..self.u.len() {
            buf.u_pert[i] = self.u[i] + scale * v[i];
        }

        let MfBuffers {
            u_pert,
            r_pert,
            dtm,
        } = &mut *buf;
        self.spatial.compute_residual(u_pert, r_pert, dtm);

        let inv = vnorm / eps;
        for i in 0..y.len() {
            y[i] = (r_pert[i] - self.r_base[i]) * inv;
        }

        if let Some(voldt) = self.vol_over_dt {
            for cell in 0..voldt.len() {
                for k in 0..N {
                    y[cell * N + k] += voldt[cell] * v[cell * N + k];
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::numerics::linear_algebra::operator::BlockMatrix;

    /// R(u)_i = u_i²（逐分量），J = diag(2u)
    struct QuadraticSpatial {
        n: usize,
    }

    impl SpatialDiscretization<1> for QuadraticSpatial {
        fn n_cells(&self) -> usize {
            self.n
        }

        fn cell_volume(&self, _i: usize) -> f64 {
            1.0
        }

        fn compute_residual(&self, u: &[f64], residual: &mut [f64], dtm: &mut [f64]) {
            for i in 0..u.len() {
                residual[i] = u[i] * u[i];
            }
            dtm.fill(1.0);
        }

        fn compute_jacobian(&self, _u: &[f64], _mat: &mut BlockMatrix<1>) {}
    }

    #[test]
    fn test_jv_matches_analytic() {
        let spatial = QuadraticSpatial { n: 4 };
        let u = vec![1.0, 2.0, -0.5, 3.0];
        let mut r0 = vec![0.0; 4];
        let mut dtm = vec![0.0; 4];
        spatial.compute_residual(&u, &mut r0, &mut dtm);

        let op = MatrixFreeJacobian::<_, 1>::new(&spatial, &u, &r0, None);
        let v = vec![0.1, -0.2, 0.4, 1.0];
        let mut y = vec![0.0; 4];
        op.apply(&v, &mut y);

        for i in 0..4 {
            let exact = 2.0 * u[i] * v[i];
            assert!(
                (y[i] - exact).abs() < 1e-5,
                "row {i}: {} vs {exact}",
                y[i]
            );
        }
    }

    #[test]
    fn test_pseudo_time_term() {
        let spatial = QuadraticSpatial { n: 2 };
        let u = vec![1.0, 1.0];
        let mut r0 = vec![0.0; 2];
        let mut dtm = vec![0.0; 2];
        spatial.compute_residual(&u, &mut r0, &mut dtm);

        let voldt = vec![10.0, 20.0];
        let op = MatrixFreeJacobian::<_, 1>::new(&spatial, &u, &r0, Some(&voldt));
        let v = vec![1.0, 1.0];
        let mut y = vec![0.0; 2];
        op.apply(&v, &mut y);

        // (V/Δt + 2u)·v
        assert!((y[0] - 12.0).abs() < 1e-5, "y0 = {}", y[0]);
        assert!((y[1] - 22.0).abs() < 1e-5, "y1 = {}", y[1]);
    }

    #[test]
    fn test_zero_vector() {
        let spatial = QuadraticSpatial { n: 2 };
        let u = vec![1.0, 2.0];
        let r0 = vec![1.0, 4.0];
        let op = MatrixFreeJacobian::<_, 1>::new(&spatial, &u, &r0, None);
        let mut y = vec![5.0; 2];
        op.apply(&[0.0, 0.0], &mut y);
        assert_eq!(y, vec![0.0, 0.0]);
    }

    #[test]
    fn test_scaling_invariance() {
        // J(cv) = c·J(v)：扰动步长按 ‖v‖ 归一
        let spatial = QuadraticSpatial { n: 3 };
        let u = vec![1.0, -2.0, 0.5];
        let mut r0 = vec![0.0; 3];
        let mut dtm = vec![0.0; 3];
        spatial.compute_residual(&u, &mut r0, &mut dtm);
        let op = MatrixFreeJacobian::<_, 1>::new(&spatial, &u, &r0, None);

        let v = vec![0.3, 0.1, -0.7];
        let v_scaled: Vec<f64> = v.iter().map(|x| 1000.0 * x).collect();
        let mut y1 = vec![0.0; 3];
        let mut y2 = vec![0.0; 3];
        op.apply(&v, &mut y1);
        op.apply(&v_scaled, &mut y2);
        for i in 0..3 {
            assert!((y2[i] - 1000.0 * y1[i]).abs() < 1e-2 * y2[i].abs().max(1.0));
        }
    }
}
