// crates/afv_physics/src/error.rs

//! 求解器错误类型

/// 数值错误
///
/// 数值错误终止本次求解；驱动器在日志中记录最后一次有效残差。
#[derive(Debug, thiserror::Error)]
pub enum NumericError {
    /// 残差出现 NaN/Inf
    #[error("第 {step} 步残差出现 NaN/Inf")]
    ResidualNan {
        /// 伪时间步号
        step: usize,
    },

    /// 更新后出现非物理状态且重试预算耗尽
    #[error("单元 {cell} 更新后 {what} 非正，重试预算已耗尽")]
    NegativeState {
        /// 单元索引
        cell: usize,
        /// "density" 或 "pressure"
        what: &'static str,
    },
}

/// 定常求解的统一错误
#[derive(Debug, thiserror::Error)]
pub enum SteadySolveError {
    /// 数值错误
    #[error(transparent)]
    Numeric(#[from] NumericError),
    /// 线性求解器错误
    #[error(transparent)]
    Linear(#[from] SolveError),
}

/// 线性求解错误
///
/// 单步不收敛只是警告（继续使用部分更新）；此错误表示求解器
/// 自身崩溃（breakdown / 发散）。
#[derive(Debug, thiserror::Error)]
pub enum SolveError {
    /// 迭代崩溃
    #[error("线性求解器在第 {iteration} 次迭代崩溃: {message}")]
    Breakdown {
        /// 崩溃时的迭代号
        iteration: usize,
        /// 说明
        message: String,
    },

    /// 对角块奇异，预条件器无法构建
    #[error("单元 {cell} 的对角块奇异，预条件器无法构建")]
    SingularDiagonal {
        /// 单元索引
        cell: usize,
    },
}
