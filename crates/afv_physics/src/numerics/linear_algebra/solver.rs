// crates/afv_physics/src/numerics/linear_algebra/solver.rs

//! 迭代线性求解器
//!
//! 隐式伪时间系统是非对称的，使用预条件 BiCGStab。
//! 求解器只依赖 [`LinearOperator`] 的矩阵-向量积与
//! [`Preconditioner`] 的应用操作，不感知存储格式，
//! 因而同一实现可驱动装配矩阵与矩阵自由算子。

use super::operator::LinearOperator;
use super::preconditioner::Preconditioner;
use super::vector_ops::{axpy, copy, dot, norm2};

/// 线性求解配置
#[derive(Debug, Clone)]
pub struct LinearSolverConfig {
    /// 相对收敛容差
    pub rtol: f64,
    /// 绝对收敛容差
    pub atol: f64,
    /// 最大迭代次数
    pub max_iter: usize,
}

impl Default for LinearSolverConfig {
    fn default() -> Self {
        Self {
            rtol: 1e-3,
            atol: 1e-14,
            max_iter: 80,
        }
    }
}

impl LinearSolverConfig {
    /// 创建
    pub fn new(rtol: f64, max_iter: usize) -> Self {
        Self {
            rtol,
            max_iter,
            ..Default::default()
        }
    }
}

/// 求解状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinearSolveStatus {
    /// 收敛
    Converged,
    /// 达到最大迭代次数（部分解可用）
    MaxIterationsReached,
    /// 停滞（breakdown）
    Stagnated,
    /// 发散
    Diverged,
}

/// 求解结果
#[derive(Debug, Clone)]
pub struct LinearSolveResult {
    /// 状态
    pub status: LinearSolveStatus,
    /// 迭代次数
    pub iterations: usize,
    /// 最终残差范数
    pub residual_norm: f64,
    /// 初始残差范数
    pub initial_residual_norm: f64,
}

impl LinearSolveResult {
    /// 是否收敛
    pub fn converged(&self) -> bool {
        self.status == LinearSolveStatus::Converged
    }
}

/// BiCGStab 求解器
///
/// 工作向量在实例内复用，按需扩容。
pub struct BiCgStab {
    config: LinearSolverConfig,
    r: Vec<f64>,
    r0: Vec<f64>,
    p: Vec<f64>,
    v: Vec<f64>,
    s: Vec<f64>,
    t: Vec<f64>,
    z: Vec<f64>,
}

impl BiCgStab {
    /// 创建
    pub fn new(config: LinearSolverConfig) -> Self {
        Self {
            config,
            r: Vec::new(),
            r0: Vec::new(),
            p: Vec::new(),
            v: Vec::new(),
            s: Vec::new(),
            t: Vec::new(),
            z: Vec::new(),
        }
    }

    /// 更新最大迭代数（线性迭代预算随 CFL 渐升）
    pub fn set_max_iter(&mut self, max_iter: usize) {
        self.config.max_iter = max_iter;
    }

    fn ensure_workspace(&mut self, n: usize) {
        if self.r.len() != n {
            self.r = vec![0.0; n];
            self.r0 = vec![0.0; n];
            self.p = vec![0.0; n];
            self.v = vec![0.0; n];
            self.s = vec![0.0; n];
            self.t = vec![0.0; n];
            self.z = vec![0.0; n];
        }
    }

    /// 求解 A·x = b
    pub fn solve<A: LinearOperator + ?Sized, P: Preconditioner + ?Sized>(
        &mut self,
        op: &A,
        b: &[f64],
        x: &mut [f64],
        precond: &P,
    ) -> LinearSolveResult {
        let n = b.len();
        self.ensure_workspace(n);
        let rtol = self.config.rtol;
        let atol = self.config.atol;
        const STAG_TOL: f64 = 1e-30;
        const DIV_FACTOR: f64 = 1e6;

        // r = b − A·x
        op.apply(x, &mut self.r);
        for i in 0..n {
            self.r[i] = b[i] - self.r[i];
        }

        let initial_norm = norm2(&self.r);
        if initial_norm < atol {
            return LinearSolveResult {
                status: LinearSolveStatus::Converged,
                iterations: 0,
                residual_norm: initial_norm,
                initial_residual_norm: initial_norm,
            };
        }

        // 影子残差固定为初始残差
        copy(&self.r, &mut self.r0);

        let mut rho_old = 1.0;
        let mut alpha = 1.0;
        let mut omega = 1.0;
        self.v.fill(0.0);
        self.p.fill(0.0);

        let finish = |status, iterations, res: f64| LinearSolveResult {
            status,
            iterations,
            residual_norm: res,
            initial_residual_norm: initial_norm,
        };

        for iter in 0..self.config.max_iter {
            let rho = dot(&self.r0, &self.r);
            if rho.abs() < STAG_TOL {
                return finish(LinearSolveStatus::Stagnated, iter, norm2(&self.r));
            }

            let beta = if iter == 0 {
                0.0
            } else {
                (rho / rho_old) * (alpha / omega)
            };
            rho_old = rho;

            // p = r + beta (p − omega v)
            for i in 0..n {
                self.p[i] = self.r[i] + beta * (self.p[i] - omega * self.v[i]);
            }

            // v = A M⁻¹ p
            precond.apply(&self.p, &mut self.z);
            op.apply(&self.z, &mut self.v);

            let r0v = dot(&self.r0, &self.v);
            if r0v.abs() < STAG_TOL {
                return finish(LinearSolveStatus::Stagnated, iter, norm2(&self.r));
            }
            alpha = rho / r0v;

            // s = r − alpha v
            for i in 0..n {
                self.s[i] = self.r[i] - alpha * self.v[i];
            }

            let s_norm = norm2(&self.s);
            if s_norm < atol || s_norm < rtol * initial_norm {
                precond.apply(&self.p, &mut self.z);
                axpy(alpha, &self.z, x);
                return finish(LinearSolveStatus::Converged, iter + 1, s_norm);
            }

            // t = A M⁻¹ s
            precond.apply(&self.s, &mut self.z);
            op.apply(&self.z, &mut self.t);

            let tt = dot(&self.t, &self.t);
            omega = if tt.abs() < STAG_TOL {
                1.0
            } else {
                dot(&self.t, &self.s) / tt
            };
            if omega.abs() < STAG_TOL {
                precond.apply(&self.p, &mut self.z);
                axpy(alpha, &self.z, x);
                return finish(LinearSolveStatus::Stagnated, iter + 1, s_norm);
            }

            // x += alpha M⁻¹p + omega M⁻¹s
            precond.apply(&self.p, &mut self.z);
            axpy(alpha, &self.z, x);
            precond.apply(&self.s, &mut self.z);
            axpy(omega, &self.z, x);

            // r = s − omega t
            for i in 0..n {
                self.r[i] = self.s[i] - omega * self.t[i];
            }

            let res_norm = norm2(&self.r);
            tracing::trace!(iter = iter + 1, residual = res_norm, "BiCGStab");

            if res_norm < atol || res_norm < rtol * initial_norm {
                return finish(LinearSolveStatus::Converged, iter + 1, res_norm);
            }
            if res_norm > initial_norm * DIV_FACTOR {
                return finish(LinearSolveStatus::Diverged, iter + 1, res_norm);
            }
        }

        finish(
            LinearSolveStatus::MaxIterationsReached,
            self.config.max_iter,
            norm2(&self.r),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::numerics::linear_algebra::operator::{BlockMatrix, SubmitPosition};
    use crate::numerics::linear_algebra::preconditioner::{
        BlockJacobi, BlockSgs, IdentityPreconditioner,
    };

    /// 非对称对角占优三对角矩阵（1×1 块）
    fn test_matrix(n: usize) -> BlockMatrix<1> {
        let faces: Vec<(usize, usize)> = (0..n - 1).map(|i| (i, i + 1)).collect();
        let mut m = BlockMatrix::<1>::general(n, &faces);
        for i in 0..n {
            m.update_diag_block(i, &[[4.0]]);
        }
        for &(l, r) in &faces {
            m.submit_block(l, r, &[[-1.0]], SubmitPosition::General);
            m.submit_block(r, l, &[[-2.0]], SubmitPosition::General);
        }
        m
    }

    fn check_solution<const N: usize>(m: &BlockMatrix<N>, b: &[f64], x: &[f64], tol: f64) {
        let mut ax = vec![0.0; b.len()];
        use crate::numerics::linear_algebra::operator::LinearOperator;
        m.apply(x, &mut ax);
        for i in 0..b.len() {
            assert!((ax[i] - b[i]).abs() < tol, "row {i}: {} vs {}", ax[i], b[i]);
        }
    }

    #[test]
    fn test_bicgstab_identity_precond() {
        let m = test_matrix(20);
        let b = vec![1.0; 20];
        let mut x = vec![0.0; 20];
        let mut solver = BiCgStab::new(LinearSolverConfig::new(1e-12, 200));
        let result = solver.solve(&m, &b, &mut x, &IdentityPreconditioner);
        assert!(result.converged(), "{:?}", result.status);
        check_solution(&m, &b, &x, 1e-8);
    }

    #[test]
    fn test_bicgstab_jacobi_precond() {
        let m = test_matrix(20);
        let b: Vec<f64> = (0..20).map(|i| (i as f64 * 0.7).sin()).collect();
        let mut x = vec![0.0; 20];
        let mut solver = BiCgStab::new(LinearSolverConfig::new(1e-12, 200));
        let p = BlockJacobi::build(&m).unwrap();
        let result = solver.solve(&m, &b, &mut x, &p);
        assert!(result.converged());
        check_solution(&m, &b, &x, 1e-8);
    }

    #[test]
    fn test_sgs_precond_fewer_iterations() {
        let m = test_matrix(50);
        let b = vec![1.0; 50];

        let mut x1 = vec![0.0; 50];
        let mut s1 = BiCgStab::new(LinearSolverConfig::new(1e-10, 500));
        let r1 = s1.solve(&m, &b, &mut x1, &IdentityPreconditioner);

        let mut x2 = vec![0.0; 50];
        let mut s2 = BiCgStab::new(LinearSolverConfig::new(1e-10, 500));
        let p = BlockSgs::build(&m, 2).unwrap();
        let r2 = s2.solve(&m, &b, &mut x2, &p);

        assert!(r1.converged() && r2.converged());
        assert!(r2.iterations <= r1.iterations);
        check_solution(&m, &b, &x2, 1e-7);
    }

    #[test]
    fn test_already_converged() {
        let m = test_matrix(5);
        let x_exact = vec![0.5; 5];
        let mut b = vec![0.0; 5];
        use crate::numerics::linear_algebra::operator::LinearOperator;
        m.apply(&x_exact, &mut b);

        let mut x = x_exact.clone();
        let mut solver = BiCgStab::new(LinearSolverConfig::default());
        let result = solver.solve(&m, &b, &mut x, &IdentityPreconditioner);
        assert!(result.converged());
        assert_eq!(result.iterations, 0);
    }

    #[test]
    fn test_max_iter_returns_partial() {
        let m = test_matrix(50);
        let b = vec![1.0; 50];
        let mut x = vec![0.0; 50];
        let mut solver = BiCgStab::new(LinearSolverConfig::new(1e-14, 2));
        let result = solver.solve(&m, &b, &mut x, &IdentityPreconditioner);
        // 未收敛但应给出降低了残差的部分解
        assert_eq!(result.status, LinearSolveStatus::MaxIterationsReached);
        assert!(result.residual_norm < result.initial_residual_norm);
    }

    #[test]
    fn test_block4_system() {
        // 4×4 块系统（与流动自由度布局一致）
        let faces = vec![(0, 1), (1, 2)];
        let mut m = BlockMatrix::<4>::face_indexed(3, faces.clone());
        for i in 0..3 {
            let mut d = [[0.0; 4]; 4];
            for k in 0..4 {
                d[k][k] = 5.0 + k as f64;
            }
            d[0][1] = 0.5;
            m.update_diag_block(i, &d);
        }
        let mut off = [[0.0; 4]; 4];
        for k in 0..4 {
            off[k][k] = -1.0;
        }
        for (fi, &(l, r)) in faces.iter().enumerate() {
            m.submit_block(l, r, &off, SubmitPosition::Upper { iface: fi });
            m.submit_block(r, l, &off, SubmitPosition::Lower { iface: fi });
        }

        let b: Vec<f64> = (0..12).map(|i| 1.0 + 0.1 * i as f64).collect();
        let mut x = vec![0.0; 12];
        let mut solver = BiCgStab::new(LinearSolverConfig::new(1e-12, 100));
        let p = BlockJacobi::build(&m).unwrap();
        let result = solver.solve(&m, &b, &mut x, &p);
        assert!(result.converged());
        check_solution(&m, &b, &x, 1e-8);
    }
}
