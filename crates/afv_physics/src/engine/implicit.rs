// crates/afv_physics/src/engine/implicit.rs

//! 隐式后向 Euler 伪时间推进
//!
//! 每步求解 (V/Δt + ∂R/∂u)Δu = −R，更新 u ← u + Δu。
//! 对角先放入 V/Δt，再由空间离散累加通量 Jacobian；
//! 线性系统用预条件 BiCGStab，迭代预算随 CFL 渐升放宽。
//!
//! 矩阵自由模式用有限差分 J·v 驱动 Krylov 迭代，预条件仍取
//! 装配矩阵。
//!
//! 更新产生非物理状态（ρ ≤ 0 或 p ≤ 0）时本步作废：CFL 减半
//! 重试，预算耗尽报 NumericError。

use super::ramp::{linear_ramp, linear_ramp_usize};
use super::timing::{StepRecord, SteadyOutcome, TimingData};
use crate::error::{NumericError, SolveError, SteadySolveError};
use crate::numerics::linear_algebra::{
    block_scaled_identity, BiCgStab, BlockJacobi, BlockMatrix, BlockSgs, LinearSolveStatus,
    LinearSolverConfig, MatrixFreeJacobian, Preconditioner,
};
use crate::numerics::linear_algebra::vector_ops::norm2;
use crate::spatial::SpatialDiscretization;
use afv_config::{PreconditionerName, SteadyStageConfig};
use std::time::Instant;

/// 非物理状态的连续重试预算
const RETRY_BUDGET: usize = 5;

/// 可采纳性检查：返回第一个违例 (单元, 量名)
pub type AdmissibilityCheck = dyn Fn(&[f64]) -> Option<(usize, &'static str)> + Sync;

/// 隐式求解设置
#[derive(Debug, Clone)]
pub struct ImplicitSettings {
    /// 阶段配置（CFL 渐升、容差、步数上限）
    pub stage: SteadyStageConfig,
    /// 线性求解相对容差
    pub lin_tolerance: f64,
    /// 渐升起点的线性迭代预算
    pub lin_max_iter_start: usize,
    /// 渐升终点的线性迭代预算
    pub lin_max_iter_end: usize,
    /// 预条件器选择
    pub preconditioner: PreconditionerName,
    /// SGS 应用扫掠数
    pub napplysweeps: usize,
    /// 矩阵自由模式
    pub use_matrix_free: bool,
}

/// 隐式后向 Euler 定常求解器
///
/// 借用空间离散；线性算子由调用方按存储格式构建后交由本结构
/// 在各步间复用。
pub struct SteadyBackwardEuler<'a, S, const N: usize> {
    spatial: &'a S,
    settings: ImplicitSettings,
    mat: BlockMatrix<N>,
    admissibility: Option<Box<AdmissibilityCheck>>,
}

impl<'a, S: SpatialDiscretization<N>, const N: usize> SteadyBackwardEuler<'a, S, N> {
    /// 创建
    pub fn new(spatial: &'a S, settings: ImplicitSettings, mat: BlockMatrix<N>) -> Self {
        Self {
            spatial,
            settings,
            mat,
            admissibility: None,
        }
    }

    /// 设置可采纳性检查
    pub fn with_admissibility(mut self, check: Box<AdmissibilityCheck>) -> Self {
        self.admissibility = Some(check);
        self
    }

    /// 推进到容差或步数上限
    pub fn solve(&mut self, u: &mut [f64]) -> Result<SteadyOutcome, SteadySolveError> {
        let n_cells = self.spatial.n_cells();
        let n_dof = n_cells * N;
        let start = Instant::now();
        let mut timing = TimingData {
            n_cells,
            ..Default::default()
        };
        let mut history = Vec::new();

        let mut residual = vec![0.0; n_dof];
        let mut dtm = vec![0.0; n_cells];
        let mut rhs = vec![0.0; n_dof];
        let mut du = vec![0.0; n_dof];
        let mut utrial = vec![0.0; n_dof];
        let mut voldt = vec![0.0; n_cells];

        let mut solver = BiCgStab::new(LinearSolverConfig::new(
            self.settings.lin_tolerance,
            self.settings.lin_max_iter_start,
        ));

        let stage = self.settings.stage.clone();
        let mut res0 = 0.0;
        let mut rel_res = 1.0;
        let mut converged = false;

        for step in 0..stage.max_timesteps {
            let t_asm = Instant::now();
            self.spatial.compute_residual(u, &mut residual, &mut dtm);
            timing.assembly_wall += t_asm.elapsed();

            let resnorm = norm2(&residual);
            if !resnorm.is_finite() {
                return Err(NumericError::ResidualNan { step }.into());
            }
            if step == 0 {
                res0 = resnorm;
            }
            rel_res = if res0 > 0.0 { resnorm / res0 } else { 0.0 };

            let cfl_base = linear_ramp(
                stage.cfl_min,
                stage.cfl_max,
                stage.ramp_start,
                stage.ramp_end,
                step,
            );
            history.push(StepRecord {
                step: step + 1,
                cfl: cfl_base,
                rel_residual: rel_res,
                wall_time: start.elapsed().as_secs_f64(),
            });
            tracing::debug!(step, cfl = cfl_base, rel_res, "implicit step");

            if rel_res < stage.tolerance {
                converged = true;
                timing.num_timesteps = step;
                break;
            }

            solver.set_max_iter(linear_ramp_usize(
                self.settings.lin_max_iter_start,
                self.settings.lin_max_iter_end,
                stage.ramp_start,
                stage.ramp_end,
                step,
            ));

            for (b, r) in rhs.iter_mut().zip(&residual) {
                *b = -r;
            }

            // 非物理更新重试：CFL 减半重装配重解
            let mut cfl = cfl_base;
            let mut attempts = 0;
            loop {
                let t_asm = Instant::now();
                self.mat.clear();
                for i in 0..n_cells {
                    voldt[i] = self.spatial.cell_volume(i) / (cfl * dtm[i]);
                    self.mat
                        .update_diag_block(i, &block_scaled_identity::<N>(voldt[i]));
                }
                self.spatial.compute_jacobian(u, &mut self.mat);
                timing.assembly_wall += t_asm.elapsed();

                let t_pc = Instant::now();
                let precond = build_preconditioner(
                    &self.mat,
                    self.settings.preconditioner,
                    self.settings.napplysweeps,
                )
                .map_err(SteadySolveError::Linear)?;
                timing.precond_build_wall += t_pc.elapsed();

                du.fill(0.0);
                let t_lin = Instant::now();
                let lin = if self.settings.use_matrix_free {
                    let op = MatrixFreeJacobian::<_, N>::new(
                        self.spatial,
                        u,
                        &residual,
                        Some(&voldt),
                    );
                    solver.solve(&op, &rhs, &mut du, &precond)
                } else {
                    solver.solve(&self.mat, &rhs, &mut du, &precond)
                };
                timing.lin_solve_wall += t_lin.elapsed();
                timing.total_lin_iters += lin.iterations;

                if lin.status != LinearSolveStatus::Converged {
                    // 单步线性不收敛只警告，继续用部分更新
                    tracing::warn!(
                        step,
                        status = ?lin.status,
                        iterations = lin.iterations,
                        residual = lin.residual_norm,
                        "linear solve not converged; continuing with partial update"
                    );
                }

                for i in 0..n_dof {
                    utrial[i] = u[i] + du[i];
                }

                if let Some(check) = &self.admissibility {
                    if let Some((cell, what)) = check(&utrial) {
                        attempts += 1;
                        if attempts > RETRY_BUDGET {
                            return Err(NumericError::NegativeState { cell, what }.into());
                        }
                        cfl *= 0.5;
                        tracing::warn!(
                            step,
                            cell,
                            what,
                            retry = attempts,
                            cfl,
                            "inadmissible update; halving CFL and retrying"
                        );
                        continue;
                    }
                }
                break;
            }

            u.copy_from_slice(&utrial);
            timing.num_timesteps = step + 1;
        }

        timing.converged = converged;
        timing.ode_wall = start.elapsed();
        timing.finalize();
        if !converged {
            tracing::warn!(
                rel_res,
                max = stage.max_timesteps,
                "implicit stage hit step limit before tolerance"
            );
        }

        Ok(SteadyOutcome {
            converged,
            steps: timing.num_timesteps,
            final_rel_residual: rel_res,
            history,
            timing,
        })
    }
}

/// 按配置构建预条件器
enum PrecondChoice<'m, const N: usize> {
    Jacobi(BlockJacobi<N>),
    Sgs(BlockSgs<'m, N>),
}

impl<const N: usize> Preconditioner for PrecondChoice<'_, N> {
    fn apply(&self, r: &[f64], z: &mut [f64]) {
        match self {
            Self::Jacobi(p) => p.apply(r, z),
            Self::Sgs(p) => p.apply(r, z),
        }
    }
}

fn build_preconditioner<const N: usize>(
    mat: &BlockMatrix<N>,
    name: PreconditionerName,
    sweeps: usize,
) -> Result<PrecondChoice<'_, N>, SolveError> {
    Ok(match name {
        PreconditionerName::Jacobi => PrecondChoice::Jacobi(BlockJacobi::build(mat)?),
        PreconditionerName::Sgs => PrecondChoice::Sgs(BlockSgs::build(mat, sweeps)?),
    })
}
