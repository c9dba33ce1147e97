// crates/afv_config/src/lib.rs

//! 控制文件解析与类型化配置记录
//!
//! 控制文件语法见 [`tree`]；类型化提取见 [`options`]。
//! 配置在构造后不可变，物理与数值配置在求解器各实例间独立。

pub mod error;
pub mod options;
pub mod tree;

pub use error::{ConfigError, ConfigResult};
pub use options::{
    FlowNumericsConfig, FlowParserOptions, FlowPhysicsConfig, FlowType, FluxName, GradientName,
    IoOptions, LimiterName, MatrixStorageName, PreconditionerName, PseudoTimeOptions,
    ReconstructionVars, SteadyStageConfig, SteppingKind, SurfaceOutputOptions, MESH_FROM_CMD,
    UNUSED_MARKER,
};
pub use tree::{ConfigBlock, ConfigValue};
