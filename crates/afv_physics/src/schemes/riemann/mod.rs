// crates/afv_physics/src/schemes/riemann/mod.rs

//! 无黏数值通量族
//!
//! 变体集合封闭：{LLF, Van Leer, HLL, HLLC, Roe}，以枚举分发，
//! 按配置构造（见 [`InviscidFluxScheme::create`]）。
//!
//! 每个变体提供两个操作：
//! - `flux(u_L, u_R, n)`: 单位法向数值通量，满足一致性
//!   F(u,u,n) = F_phys(u,n) 与守恒性 F(u_L,u_R,n) = −F(u_R,u_L,−n)
//! - `jacobian(u_L, u_R, n)`: 隐式装配用的 4×4 解析块
//!   (∂F/∂u_L, ∂F/∂u_R)
//!
//! Jacobian 的精确程度按变体不同（LLF 与 Van Leer 为精确导数，
//! HLL/HLLC 冻结波速，Roe 冻结 |Ã|）；配置允许残差通量与
//! Jacobian 通量分开选取，昂贵的通量可以搭配更便宜的 Jacobian。

mod hll;
mod hllc;
mod llf;
mod roe;
mod van_leer;

pub use hll::HllFlux;
pub use hllc::HllcFlux;
pub use llf::LlfFlux;
pub use roe::RoeFlux;
pub use van_leer::VanLeerFlux;

use crate::state::ConsState;
use afv_config::FluxName;
use glam::DVec2;

/// 通量对守恒变量的 4×4 Jacobian 块
pub type FluxJacobian = [[f64; 4]; 4];

/// 零 Jacobian 块
pub const JAC_ZERO: FluxJacobian = [[0.0; 4]; 4];

/// 无黏通量格式（封闭枚举分发）
#[derive(Debug, Clone, Copy)]
pub enum InviscidFluxScheme {
    /// 局部 Lax-Friedrichs
    Llf(LlfFlux),
    /// Van Leer 通量矢量分裂
    VanLeer(VanLeerFlux),
    /// HLL
    Hll(HllFlux),
    /// HLLC
    Hllc(HllcFlux),
    /// Roe
    Roe(RoeFlux),
}

impl InviscidFluxScheme {
    /// 按配置名创建
    pub fn create(name: FluxName, gamma: f64) -> Self {
        match name {
            FluxName::Llf => Self::Llf(LlfFlux::new(gamma)),
            FluxName::VanLeer => Self::VanLeer(VanLeerFlux::new(gamma)),
            FluxName::Hll => Self::Hll(HllFlux::new(gamma)),
            FluxName::Hllc => Self::Hllc(HllcFlux::new(gamma)),
            FluxName::Roe => Self::Roe(RoeFlux::new(gamma)),
        }
    }

    /// 格式名
    pub fn name(&self) -> &'static str {
        match self {
            Self::Llf(_) => "LLF",
            Self::VanLeer(_) => "VanLeer",
            Self::Hll(_) => "HLL",
            Self::Hllc(_) => "HLLC",
            Self::Roe(_) => "Roe",
        }
    }

    /// 数值通量
    #[inline]
    pub fn flux(&self, ul: &ConsState, ur: &ConsState, n: DVec2) -> ConsState {
        match self {
            Self::Llf(f) => f.flux(ul, ur, n),
            Self::VanLeer(f) => f.flux(ul, ur, n),
            Self::Hll(f) => f.flux(ul, ur, n),
            Self::Hllc(f) => f.flux(ul, ur, n),
            Self::Roe(f) => f.flux(ul, ur, n),
        }
    }

    /// 通量 Jacobian (∂F/∂u_L, ∂F/∂u_R)
    #[inline]
    pub fn jacobian(&self, ul: &ConsState, ur: &ConsState, n: DVec2) -> (FluxJacobian, FluxJacobian) {
        match self {
            Self::Llf(f) => f.jacobian(ul, ur, n),
            Self::VanLeer(f) => f.jacobian(ul, ur, n),
            Self::Hll(f) => f.jacobian(ul, ur, n),
            Self::Hllc(f) => f.jacobian(ul, ur, n),
            Self::Roe(f) => f.jacobian(ul, ur, n),
        }
    }
}

// ============================================================
// 各变体共用的解析工具
// ============================================================

/// 物理法向通量 F(u, n)
#[inline]
pub(crate) fn physical_flux(u: &ConsState, n: DVec2, g: f64) -> ConsState {
    let vn = (u.rho_vx * n.x + u.rho_vy * n.y) / u.rho;
    let p = (g - 1.0) * (u.rho_e - 0.5 * (u.rho_vx * u.rho_vx + u.rho_vy * u.rho_vy) / u.rho);
    ConsState::new(
        u.rho * vn,
        u.rho_vx * vn + p * n.x,
        u.rho_vy * vn + p * n.y,
        (u.rho_e + p) * vn,
    )
}

/// 物理通量的精确 Jacobian A(u, n) = ∂F/∂u
pub(crate) fn physical_flux_jacobian(u: &ConsState, n: DVec2, g: f64) -> FluxJacobian {
    let rho = u.rho;
    let vx = u.rho_vx / rho;
    let vy = u.rho_vy / rho;
    let vn = vx * n.x + vy * n.y;
    let phi = 0.5 * (g - 1.0) * (vx * vx + vy * vy);
    let p = (g - 1.0) * u.rho_e - phi * rho;
    let h = (u.rho_e + p) / rho;

    [
        [0.0, n.x, n.y, 0.0],
        [
            phi * n.x - vx * vn,
            vn + (2.0 - g) * vx * n.x,
            vx * n.y - (g - 1.0) * vy * n.x,
            (g - 1.0) * n.x,
        ],
        [
            phi * n.y - vy * vn,
            vy * n.x - (g - 1.0) * vx * n.y,
            vn + (2.0 - g) * vy * n.y,
            (g - 1.0) * n.y,
        ],
        [
            (phi - h) * vn,
            h * n.x - (g - 1.0) * vx * vn,
            h * n.y - (g - 1.0) * vy * vn,
            g * vn,
        ],
    ]
}

/// 谱半径 |vₙ| + c 对守恒变量的梯度
pub(crate) fn wave_speed_gradient(u: &ConsState, n: DVec2, g: f64) -> [f64; 4] {
    let rho = u.rho;
    let vx = u.rho_vx / rho;
    let vy = u.rho_vy / rho;
    let vn = vx * n.x + vy * n.y;
    let phi = 0.5 * (g - 1.0) * (vx * vx + vy * vy);
    let p = (g - 1.0) * u.rho_e - phi * rho;
    let c = (g * p / rho).sqrt();
    let sgn = if vn >= 0.0 { 1.0 } else { -1.0 };

    // d|vn| = sgn(vn) dvn; dc = γ/(2cρ) dp − c/(2ρ) dρ
    let k = g / (2.0 * c * rho);
    [
        sgn * (-vn / rho) + k * phi - c / (2.0 * rho),
        sgn * n.x / rho + k * (-(g - 1.0) * vx),
        sgn * n.y / rho + k * (-(g - 1.0) * vy),
        k * (g - 1.0),
    ]
}

/// Roe 平均
///
/// 返回 (ρ̃, ṽ, H̃, c̃)。
pub(crate) fn roe_average(
    ul: &ConsState,
    ur: &ConsState,
    g: f64,
) -> (f64, DVec2, f64, f64) {
    let rl = ul.rho.sqrt();
    let rr = ur.rho.sqrt();
    let inv = 1.0 / (rl + rr);

    let vl = ul.velocity();
    let vr = ur.velocity();
    let pl = (g - 1.0) * (ul.rho_e - 0.5 * ul.rho * vl.length_squared());
    let pr = (g - 1.0) * (ur.rho_e - 0.5 * ur.rho * vr.length_squared());
    let hl = (ul.rho_e + pl) / ul.rho;
    let hr = (ur.rho_e + pr) / ur.rho;

    let rho = rl * rr;
    let v = (vl * rl + vr * rr) * inv;
    let h = (hl * rl + hr * rr) * inv;
    let c2 = (g - 1.0) * (h - 0.5 * v.length_squared());
    (rho, v, h, c2.max(1e-14).sqrt())
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::physics::IdealGasPhysics;
    use crate::state::PrimState;

    pub const GAMMA: f64 = 1.4;
    pub const TOL: f64 = 1e-11;

    /// 亚声速测试状态
    pub fn subsonic_state() -> ConsState {
        IdealGasPhysics::new(GAMMA, 0.5).prim_to_cons(&PrimState::new(1.1, 0.3, -0.1, 1.4))
    }

    /// 第二个亚声速状态
    pub fn subsonic_state_b() -> ConsState {
        IdealGasPhysics::new(GAMMA, 0.5).prim_to_cons(&PrimState::new(0.9, 0.2, 0.15, 1.1))
    }

    /// 超声速（x 正向）状态
    pub fn supersonic_state() -> ConsState {
        IdealGasPhysics::new(GAMMA, 2.0).prim_to_cons(&PrimState::new(1.0, 3.0, 0.0, 0.9))
    }

    /// 斜向单位法向
    pub fn oblique_normal() -> DVec2 {
        DVec2::new(0.6, 0.8)
    }

    /// 一致性: F(u,u,n) = F_phys(u,n)
    pub fn check_consistency(scheme: &InviscidFluxScheme, u: &ConsState, n: DVec2) {
        let f = scheme.flux(u, u, n);
        let fp = physical_flux(u, n, GAMMA);
        for (a, b) in f.to_array().iter().zip(fp.to_array().iter()) {
            assert!(
                (a - b).abs() < TOL,
                "{} consistency violated: {a} vs {b}",
                scheme.name()
            );
        }
    }

    /// 守恒性: F(uL,uR,n) + F(uR,uL,−n) = 0
    pub fn check_conservation(
        scheme: &InviscidFluxScheme,
        ul: &ConsState,
        ur: &ConsState,
        n: DVec2,
    ) {
        let f1 = scheme.flux(ul, ur, n);
        let f2 = scheme.flux(ur, ul, -n);
        for (a, b) in f1.to_array().iter().zip(f2.to_array().iter()) {
            assert!(
                (a + b).abs() < TOL,
                "{} conservation violated: {a} vs {b}",
                scheme.name()
            );
        }
    }

    /// 等值状态处 Jacobian 和的一致性
    ///
    /// 由 F(u,u,n) = F_phys(u,n) 得 ∂F/∂u_L + ∂F/∂u_R = A(u,n)，
    /// 冻结系数的近似 Jacobian 也必须满足。
    pub fn check_jacobian_sum_consistency(scheme: &InviscidFluxScheme, u: &ConsState, n: DVec2) {
        let (jl, jr) = scheme.jacobian(u, u, n);
        let a = physical_flux_jacobian(u, n, GAMMA);
        for i in 0..4 {
            for k in 0..4 {
                assert!(
                    (jl[i][k] + jr[i][k] - a[i][k]).abs() < 1e-9,
                    "{} (JL+JR)[{i}][{k}] = {} vs A = {}",
                    scheme.name(),
                    jl[i][k] + jr[i][k],
                    a[i][k]
                );
            }
        }
    }

    /// 任意左右状态处 Jacobian 与有限差分比对
    ///
    /// 仅对精确导数的变体（LLF、Van Leer）使用。
    pub fn check_jacobian_fd(
        scheme: &InviscidFluxScheme,
        ul: &ConsState,
        ur: &ConsState,
        n: DVec2,
    ) {
        let eps = 1e-7;
        let (jl, jr) = scheme.jacobian(ul, ur, n);
        let f0 = scheme.flux(ul, ur, n);
        for k in 0..4 {
            let mut ulp = ul.to_array();
            ulp[k] += eps;
            let ulp = ConsState::from_array(ulp);
            let mut urp = ur.to_array();
            urp[k] += eps;
            let urp = ConsState::from_array(urp);

            let fd_l = (scheme.flux(&ulp, ur, n) - f0).to_array();
            let fd_r = (scheme.flux(ul, &urp, n) - f0).to_array();
            for i in 0..4 {
                assert!(
                    (jl[i][k] - fd_l[i] / eps).abs() < 2e-5,
                    "{} dF/duL[{i}][{k}]: analytic {} vs fd {}",
                    scheme.name(),
                    jl[i][k],
                    fd_l[i] / eps
                );
                assert!(
                    (jr[i][k] - fd_r[i] / eps).abs() < 2e-5,
                    "{} dF/duR[{i}][{k}]: analytic {} vs fd {}",
                    scheme.name(),
                    jr[i][k],
                    fd_r[i] / eps
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn test_physical_flux_jacobian_fd() {
        let u = subsonic_state();
        let n = oblique_normal();
        let a = physical_flux_jacobian(&u, n, GAMMA);
        let eps = 1e-7;
        for k in 0..4 {
            let mut up = u.to_array();
            up[k] += eps;
            let up = ConsState::from_array(up);
            let fd = physical_flux(&up, n, GAMMA) - physical_flux(&u, n, GAMMA);
            let fd = fd.to_array();
            for i in 0..4 {
                assert!(
                    (a[i][k] - fd[i] / eps).abs() < 1e-5,
                    "A[{i}][{k}]: {} vs {}",
                    a[i][k],
                    fd[i] / eps
                );
            }
        }
    }

    #[test]
    fn test_wave_speed_gradient_fd() {
        let u = subsonic_state();
        let n = oblique_normal();
        let grad = wave_speed_gradient(&u, n, GAMMA);
        let phys = crate::physics::IdealGasPhysics::new(GAMMA, 0.5);
        let eps = 1e-7;
        for k in 0..4 {
            let mut up = u.to_array();
            up[k] += eps;
            let up = ConsState::from_array(up);
            let fd = (phys.max_wave_speed(&up, n) - phys.max_wave_speed(&u, n)) / eps;
            assert!(
                (grad[k] - fd).abs() < 1e-5,
                "d(|vn|+c)/du[{k}]: {} vs {fd}",
                grad[k]
            );
        }
    }

    #[test]
    fn test_roe_average_reduces_to_state() {
        // 等值状态的 Roe 平均就是该状态
        let u = subsonic_state();
        let (rho, v, _h, c) = roe_average(&u, &u, GAMMA);
        assert!((rho - u.rho).abs() < 1e-13);
        assert!((v - u.velocity()).length() < 1e-13);
        let phys = crate::physics::IdealGasPhysics::new(GAMMA, 0.5);
        assert!((c - phys.sound_speed(&u)).abs() < 1e-12);
    }

    #[test]
    fn test_create_by_name() {
        assert_eq!(
            InviscidFluxScheme::create(FluxName::Roe, GAMMA).name(),
            "Roe"
        );
        assert_eq!(
            InviscidFluxScheme::create(FluxName::VanLeer, GAMMA).name(),
            "VanLeer"
        );
        assert_eq!(
            InviscidFluxScheme::create(FluxName::Llf, GAMMA).name(),
            "LLF"
        );
    }
}
