// crates/afv_physics/src/schemes/mod.rs

//! 数值格式：无黏近似黎曼求解器族

pub mod riemann;

pub use riemann::{FluxJacobian, InviscidFluxScheme};
