// crates/afv_physics/src/lib.rs

//! 可压缩 Euler / Navier-Stokes 的格心有限体积空间离散与
//! 伪时间定常求解
//!
//! 核心数据流（每个非线性步）：
//! 单元状态 u → 边界幽灵状态 →（可选）重构 + 限制 → 左右面值
//! → 数值通量与最大波速积分 → 单元残差 R 与局部 Δt；
//! 隐式模式再装配 ∂R/∂u，求解 (V/Δt + ∂R/∂u)Δu = −R 并更新。
//!
//! 空间离散借用只读网格视图（[`afv_mesh::FvMesh`]）；配置与
//! 来流参考都是各实例私有的，没有全局可变状态。

pub mod boundary;
pub mod engine;
pub mod error;
pub mod numerics;
pub mod physics;
pub mod schemes;
pub mod spatial;
pub mod state;

pub use boundary::{BoundaryRule, BoundarySet};
pub use engine::{
    DriverReport, DriverState, StepRecord, SteadyFlowDriver, SteadyOutcome, TimingData,
};
pub use error::{NumericError, SolveError, SteadySolveError};
pub use physics::IdealGasPhysics;
pub use schemes::InviscidFluxScheme;
pub use spatial::{
    DiffusionSpatial, FlowSpatial, GhostCenterPolicy, NodalOutput, SpatialDiscretization,
    SurfaceReport,
};
pub use state::{ConsState, PrimState, NVARS_FLOW};
