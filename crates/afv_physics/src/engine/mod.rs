// crates/afv_physics/src/engine/mod.rs

//! 伪时间驱动：显式/隐式定常推进与 starter/main 编排

pub mod driver;
pub mod explicit;
pub mod implicit;
pub mod ramp;
pub mod timing;

pub use driver::{DriverReport, DriverState, SteadyFlowDriver};
pub use explicit::{ResidualSmoothing, SteadyForwardEuler};
pub use implicit::{ImplicitSettings, SteadyBackwardEuler};
pub use ramp::{linear_ramp, linear_ramp_usize};
pub use timing::{StepRecord, SteadyOutcome, TimingData};
