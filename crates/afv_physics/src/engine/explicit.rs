// crates/afv_physics/src/engine/explicit.rs

//! 显式前向 Euler 伪时间推进
//!
//! 局部时间步 Δt_i = CFL·A_i/w_i，更新 u_i ← u_i − (Δt_i/A_i)R_i。
//! 可选隐式残差光顺 (1 + βL)R̃ = R，按 Jacobi 扫掠近似求解，
//! 放宽显式 CFL 限制。

use super::ramp::linear_ramp;
use super::timing::{StepRecord, SteadyOutcome, TimingData};
use crate::error::NumericError;
use crate::numerics::linear_algebra::vector_ops::norm2;
use crate::spatial::SpatialDiscretization;
use afv_config::SteadyStageConfig;
use std::time::Instant;

/// 残差光顺配置
///
/// `neighbors[i]` 为单元 i 的面邻单元（不含幽灵）。
pub struct ResidualSmoothing {
    /// 单元邻接
    pub neighbors: Vec<Vec<usize>>,
    /// 光顺系数 β
    pub beta: f64,
    /// Jacobi 扫掠数
    pub sweeps: usize,
}

impl ResidualSmoothing {
    /// 就地光顺：R ← (1 + βL)⁻¹ R 的 Jacobi 近似
    fn apply<const N: usize>(&self, residual: &mut [f64], work: &mut [f64]) {
        work.copy_from_slice(residual);
        for _ in 0..self.sweeps {
            for (i, nbrs) in self.neighbors.iter().enumerate() {
                for k in 0..N {
                    let mut s = residual[i * N + k];
                    for &j in nbrs {
                        s += self.beta * work[j * N + k];
                    }
                    work[i * N + k] = s / (1.0 + self.beta * nbrs.len() as f64);
                }
            }
        }
        residual.copy_from_slice(work);
    }
}

/// 显式前向 Euler 定常求解器
pub struct SteadyForwardEuler<'a, S, const N: usize> {
    spatial: &'a S,
    config: SteadyStageConfig,
    smoothing: Option<ResidualSmoothing>,
}

impl<'a, S: SpatialDiscretization<N>, const N: usize> SteadyForwardEuler<'a, S, N> {
    /// 创建
    pub fn new(spatial: &'a S, config: SteadyStageConfig) -> Self {
        Self {
            spatial,
            config,
            smoothing: None,
        }
    }

    /// 启用残差光顺
    pub fn with_smoothing(mut self, smoothing: ResidualSmoothing) -> Self {
        self.smoothing = Some(smoothing);
        self
    }

    /// 推进到容差或步数上限
    pub fn solve(&self, u: &mut [f64]) -> Result<SteadyOutcome, NumericError> {
        let n_cells = self.spatial.n_cells();
        let start = Instant::now();
        let mut timing = TimingData {
            n_cells,
            ..Default::default()
        };
        let mut history = Vec::new();

        let mut residual = vec![0.0; n_cells * N];
        let mut work = vec![0.0; n_cells * N];
        let mut dtm = vec![0.0; n_cells];

        let mut res0 = 0.0;
        let mut rel_res = 1.0;
        let mut converged = false;

        for step in 0..self.config.max_timesteps {
            let t_asm = Instant::now();
            self.spatial.compute_residual(u, &mut residual, &mut dtm);
            timing.assembly_wall += t_asm.elapsed();

            let resnorm = norm2(&residual);
            if !resnorm.is_finite() {
                return Err(NumericError::ResidualNan { step });
            }
            if step == 0 {
                res0 = resnorm;
            }
            rel_res = if res0 > 0.0 { resnorm / res0 } else { 0.0 };

            let cfl = linear_ramp(
                self.config.cfl_min,
                self.config.cfl_max,
                self.config.ramp_start,
                self.config.ramp_end,
                step,
            );
            history.push(StepRecord {
                step: step + 1,
                cfl,
                rel_residual: rel_res,
                wall_time: start.elapsed().as_secs_f64(),
            });
            tracing::debug!(step, cfl, rel_res, "explicit step");

            if rel_res < self.config.tolerance {
                converged = true;
                timing.num_timesteps = step;
                break;
            }

            if let Some(s) = &self.smoothing {
                s.apply::<N>(&mut residual, &mut work);
            }

            // u_i ← u_i − (CFL·Δt_phys/A_i)·R_i
            for i in 0..n_cells {
                let factor = cfl * dtm[i] / self.spatial.cell_volume(i);
                for k in 0..N {
                    u[i * N + k] -= factor * residual[i * N + k];
                }
            }
            timing.num_timesteps = step + 1;
        }

        timing.converged = converged;
        timing.ode_wall = start.elapsed();
        timing.finalize();
        if !converged {
            tracing::warn!(
                rel_res,
                max = self.config.max_timesteps,
                "explicit stage hit step limit before tolerance"
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
