// crates/afv_physics/src/schemes/riemann/hll.rs

//! HLL 近似黎曼求解器
//!
//! 双波近似，波速取 Einfeldt 估计（左右特征速度与 Roe 平均特征
//! 速度的包络）：
//!
//! ```text
//! s_L = min(vₙL − c_L, ṽₙ − c̃)
//! s_R = max(vₙR + c_R, ṽₙ + c̃)
//! ```
//!
//! Jacobian 冻结波速（对 s_L、s_R 的导数不计入）；
//! 冻结近似在 u_L = u_R 处与精确导数一致。

use super::{
    physical_flux, physical_flux_jacobian, roe_average, FluxJacobian, JAC_ZERO,
};
use crate::state::ConsState;
use glam::DVec2;

/// HLL 通量
#[derive(Debug, Clone, Copy)]
pub struct HllFlux {
    g: f64,
}

impl HllFlux {
    /// 创建
    pub fn new(gamma: f64) -> Self {
        Self { g: gamma }
    }

    /// Einfeldt 波速估计
    pub(crate) fn wave_speeds(&self, ul: &ConsState, ur: &ConsState, n: DVec2) -> (f64, f64) {
        let g = self.g;
        let vnl = ul.normal_velocity(n);
        let vnr = ur.normal_velocity(n);
        let pl = (g - 1.0)
            * (ul.rho_e - 0.5 * (ul.rho_vx * ul.rho_vx + ul.rho_vy * ul.rho_vy) / ul.rho);
        let pr = (g - 1.0)
            * (ur.rho_e - 0.5 * (ur.rho_vx * ur.rho_vx + ur.rho_vy * ur.rho_vy) / ur.rho);
        let cl = (g * pl / ul.rho).sqrt();
        let cr = (g * pr / ur.rho).sqrt();

        let (_, v_roe, _, c_roe) = roe_average(ul, ur, g);
        let vn_roe = v_roe.dot(n);

        ((vnl - cl).min(vn_roe - c_roe), (vnr + cr).max(vn_roe + c_roe))
    }

    /// 数值通量
    pub fn flux(&self, ul: &ConsState, ur: &ConsState, n: DVec2) -> ConsState {
        let (sl, sr) = self.wave_speeds(ul, ur, n);
        if sl >= 0.0 {
            return physical_flux(ul, n, self.g);
        }
        if sr <= 0.0 {
            return physical_flux(ur, n, self.g);
        }
        let fl = physical_flux(ul, n, self.g);
        let fr = physical_flux(ur, n, self.g);
        let inv = 1.0 / (sr - sl);
        (fl * sr - fr * sl + (*ur - *ul) * (sl * sr)) * inv
    }

    /// 冻结波速 Jacobian
    pub fn jacobian(&self, ul: &ConsState, ur: &ConsState, n: DVec2) -> (FluxJacobian, FluxJacobian) {
        let (sl, sr) = self.wave_speeds(ul, ur, n);
        if sl >= 0.0 {
            return (physical_flux_jacobian(ul, n, self.g), JAC_ZERO);
        }
        if sr <= 0.0 {
            return (JAC_ZERO, physical_flux_jacobian(ur, n, self.g));
        }

        let al = physical_flux_jacobian(ul, n, self.g);
        let ar = physical_flux_jacobian(ur, n, self.g);
        let inv = 1.0 / (sr - sl);

        let mut jl = JAC_ZERO;
        let mut jr = JAC_ZERO;
        for i in 0..4 {
            for k in 0..4 {
                jl[i][k] = sr * al[i][k] * inv;
                jr[i][k] = -sl * ar[i][k] * inv;
            }
            jl[i][i] -= sl * sr * inv;
            jr[i][i] += sl * sr * inv;
        }
        (jl, jr)
    }
}
