// crates/afv_physics/src/engine/timing.rs

//! 伪时间求解的计时与收敛历史

use std::time::Duration;

/// 求解计时数据
#[derive(Debug, Clone, Default)]
pub struct TimingData {
    /// 问题规模（单元数）
    pub n_cells: usize,
    /// 使用的线程数
    pub num_threads: usize,
    /// 伪时间步数
    pub num_timesteps: usize,
    /// 线性迭代总数
    pub total_lin_iters: usize,
    /// 每步平均线性迭代数
    pub avg_lin_iters: usize,
    /// 残差与 Jacobian 装配墙钟时间
    pub assembly_wall: Duration,
    /// 预条件器构建墙钟时间
    pub precond_build_wall: Duration,
    /// 线性求解墙钟时间（含预条件应用）
    pub lin_solve_wall: Duration,
    /// 整个非线性求解墙钟时间
    pub ode_wall: Duration,
    /// 非线性是否收敛
    pub converged: bool,
}

impl TimingData {
    /// 结束时补齐派生量
    pub fn finalize(&mut self) {
        self.num_threads = rayon::current_num_threads();
        self.avg_lin_iters = if self.num_timesteps > 0 {
            self.total_lin_iters / self.num_timesteps
        } else {
            0
        };
    }
}

/// 单步收敛记录
#[derive(Debug, Clone, Copy)]
pub struct StepRecord {
    /// 步号（从 1 起）
    pub step: usize,
    /// 本步 CFL
    pub cfl: f64,
    /// 相对残差 ‖R‖₂/‖R₀‖₂
    pub rel_residual: f64,
    /// 距求解开始的墙钟秒数
    pub wall_time: f64,
}

/// 单阶段求解结果
#[derive(Debug, Clone)]
pub struct SteadyOutcome {
    /// 是否达到容差
    pub converged: bool,
    /// 实际步数
    pub steps: usize,
    /// 最终相对残差
    pub final_rel_residual: f64,
    /// 逐步历史
    pub history: Vec<StepRecord>,
    /// 计时
    pub timing: TimingData,
}
