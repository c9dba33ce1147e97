// crates/afv_physics/src/engine/driver.rs

//! 定常求解驱动器：starter/main 两阶段编排
//!
//! 状态机：Idle → StarterRunning（若配置）→ MainRunning →
//! Converged / Diverged。starter 用低保真（通常一阶）空间离散
//! 以松容差生成初值；main 用配置的离散推进到目标容差。
//! 达到步数上限按"收敛但有警告"处理；残差 NaN 为致命。

use super::explicit::{ResidualSmoothing, SteadyForwardEuler};
use super::implicit::{ImplicitSettings, SteadyBackwardEuler};
use super::timing::SteadyOutcome;
use crate::error::SteadySolveError;
use crate::physics::IdealGasPhysics;
use crate::numerics::linear_algebra::BlockMatrix;
use crate::spatial::{interior_face_cells, FlowSpatial};
use crate::state::{ConsState, NVARS_FLOW};
use afv_config::{MatrixStorageName, PseudoTimeOptions, SteadyStageConfig, SteppingKind};

/// 驱动器状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    /// 未开始
    Idle,
    /// starter 阶段运行中
    StarterRunning,
    /// 主阶段运行中
    MainRunning,
    /// 完成（含达步数上限的警告情形）
    Converged,
    /// 残差 NaN 或非物理状态不可恢复
    Diverged,
}

/// 求解报告
#[derive(Debug, Clone)]
pub struct DriverReport {
    /// 终态
    pub state: DriverState,
    /// starter 阶段结果
    pub starter: Option<SteadyOutcome>,
    /// 主阶段结果
    pub main: SteadyOutcome,
}

/// 流动定常求解驱动器
///
/// 借用两个空间离散（starter 与 main）；解与残差缓冲由调用方
/// 分配并传入。
pub struct SteadyFlowDriver<'a> {
    starter: Option<&'a FlowSpatial<'a>>,
    main: &'a FlowSpatial<'a>,
    opts: &'a PseudoTimeOptions,
}

impl<'a> SteadyFlowDriver<'a> {
    /// 创建
    pub fn new(
        main: &'a FlowSpatial<'a>,
        starter: Option<&'a FlowSpatial<'a>>,
        opts: &'a PseudoTimeOptions,
    ) -> Self {
        Self {
            starter: if opts.use_starter { starter } else { None },
            main,
            opts,
        }
    }

    /// 求解：u 含初值，返回时为终态解
    ///
    /// 状态转移 Idle → StarterRunning → MainRunning → Converged；
    /// 错误返回对应 Diverged。
    pub fn solve(&self, u: &mut [f64]) -> Result<DriverReport, SteadySolveError> {
        let starter_outcome = if let Some(sp) = self.starter {
            tracing::info!(
                state = ?DriverState::StarterRunning,
                tolerance = self.opts.initialization.tolerance,
                max = self.opts.initialization.max_timesteps,
                "starter stage"
            );
            let out = self.run_stage(sp, &self.opts.initialization, u)?;
            tracing::info!(
                steps = out.steps,
                rel_res = out.final_rel_residual,
                "starter stage finished"
            );
            Some(out)
        } else {
            None
        };

        tracing::info!(
            state = ?DriverState::MainRunning,
            tolerance = self.opts.main.tolerance,
            max = self.opts.main.max_timesteps,
            "main stage"
        );
        let main_outcome = self.run_stage(self.main, &self.opts.main, u)?;
        if !main_outcome.converged {
            tracing::warn!(
                rel_res = main_outcome.final_rel_residual,
                "main stage returned at step limit without reaching tolerance"
            );
        }

        Ok(DriverReport {
            state: DriverState::Converged,
            starter: starter_outcome,
            main: main_outcome,
        })
    }

    fn run_stage(
        &self,
        spatial: &FlowSpatial<'_>,
        stage: &SteadyStageConfig,
        u: &mut [f64],
    ) -> Result<SteadyOutcome, SteadySolveError> {
        match self.opts.stepping {
            SteppingKind::Explicit => {
                let mut solver = SteadyForwardEuler::<_, NVARS_FLOW>::new(spatial, stage.clone());
                if self.opts.residual_smoothing {
                    solver = solver.with_smoothing(self.smoothing_context(spatial));
                }
                solver.solve(u).map_err(SteadySolveError::Numeric)
            }
            SteppingKind::Implicit => {
                let mesh = spatial.mesh();
                let fc = interior_face_cells(mesh);
                let mat = match self.opts.matrix_storage {
                    MatrixStorageName::FaceIndexed => {
                        BlockMatrix::<NVARS_FLOW>::face_indexed(mesh.n_cells(), fc)
                    }
                    MatrixStorageName::Csr => {
                        BlockMatrix::<NVARS_FLOW>::general(mesh.n_cells(), &fc)
                    }
                };
                let settings = ImplicitSettings {
                    stage: stage.clone(),
                    lin_tolerance: self.opts.lin_tolerance,
                    lin_max_iter_start: self.opts.lin_max_iter_start,
                    lin_max_iter_end: self.opts.lin_max_iter_end,
                    preconditioner: self.opts.preconditioner,
                    napplysweeps: self.opts.napplysweeps,
                    use_matrix_free: self.opts.use_matrix_free,
                };
                let mut solver = SteadyBackwardEuler::new(spatial, settings, mat)
                    .with_admissibility(flow_admissibility(*spatial.physics()));
                solver.solve(u)
            }
        }
    }

    /// 残差光顺的邻接（面邻单元）
    fn smoothing_context(&self, spatial: &FlowSpatial<'_>) -> ResidualSmoothing {
        let mesh = spatial.mesh();
        let mut neighbors: Vec<Vec<usize>> = vec![Vec::new(); mesh.n_cells()];
        for (l, r) in interior_face_cells(mesh) {
            neighbors[l].push(r);
            neighbors[r].push(l);
        }
        ResidualSmoothing {
            neighbors,
            beta: 0.6,
            sweeps: self.opts.napplysweeps.max(1),
        }
    }
}

/// 流动的可采纳性检查：ρ > 0 且 p > 0
fn flow_admissibility(
    phys: IdealGasPhysics,
) -> Box<dyn Fn(&[f64]) -> Option<(usize, &'static str)> + Sync> {
    Box::new(move |u: &[f64]| {
        for (i, c) in u.chunks_exact(NVARS_FLOW).enumerate() {
            let s = ConsState::from_slice(c);
            if !(s.rho > 0.0) {
                return Some((i, "density"));
            }
            if !(phys.pressure(&s) > 0.0) {
                return Some((i, "pressure"));
            }
        }
        None
    })
}
