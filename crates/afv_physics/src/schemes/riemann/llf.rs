// crates/afv_physics/src/schemes/riemann/llf.rs

//! 局部 Lax-Friedrichs (Rusanov) 通量
//!
//! F = ½(F_L + F_R) − ½λ(u_R − u_L)，λ = max(|vₙ|+c)。
//! 最耗散也最稳健的变体，常用作昂贵通量的 Jacobian 搭配。
//!
//! Jacobian 为精确导数，含谱半径 λ 对取大一侧状态的导数项。

use super::{
    physical_flux, physical_flux_jacobian, wave_speed_gradient, FluxJacobian, JAC_ZERO,
};
use crate::state::ConsState;
use glam::DVec2;

/// 局部 Lax-Friedrichs 通量
#[derive(Debug, Clone, Copy)]
pub struct LlfFlux {
    g: f64,
}

impl LlfFlux {
    /// 创建
    pub fn new(gamma: f64) -> Self {
        Self { g: gamma }
    }

    /// 左右两侧的谱半径
    #[inline]
    fn speeds(&self, ul: &ConsState, ur: &ConsState, n: DVec2) -> (f64, f64) {
        let g = self.g;
        let pl = (g - 1.0)
            * (ul.rho_e - 0.5 * (ul.rho_vx * ul.rho_vx + ul.rho_vy * ul.rho_vy) / ul.rho);
        let pr = (g - 1.0)
            * (ur.rho_e - 0.5 * (ur.rho_vx * ur.rho_vx + ur.rho_vy * ur.rho_vy) / ur.rho);
        let ll = ul.normal_velocity(n).abs() + (g * pl / ul.rho).sqrt();
        let lr = ur.normal_velocity(n).abs() + (g * pr / ur.rho).sqrt();
        (ll, lr)
    }

    /// 数值通量
    pub fn flux(&self, ul: &ConsState, ur: &ConsState, n: DVec2) -> ConsState {
        let (ll, lr) = self.speeds(ul, ur, n);
        let lambda = ll.max(lr);
        let fl = physical_flux(ul, n, self.g);
        let fr = physical_flux(ur, n, self.g);
        (fl + fr) * 0.5 - (*ur - *ul) * (0.5 * lambda)
    }

    /// 精确 Jacobian
    pub fn jacobian(&self, ul: &ConsState, ur: &ConsState, n: DVec2) -> (FluxJacobian, FluxJacobian) {
        let (ll, lr) = self.speeds(ul, ur, n);
        let lambda = ll.max(lr);

        let al = physical_flux_jacobian(ul, n, self.g);
        let ar = physical_flux_jacobian(ur, n, self.g);

        let mut jl = JAC_ZERO;
        let mut jr = JAC_ZERO;
        for i in 0..4 {
            for k in 0..4 {
                jl[i][k] = 0.5 * al[i][k];
                jr[i][k] = 0.5 * ar[i][k];
            }
            jl[i][i] += 0.5 * lambda;
            jr[i][i] -= 0.5 * lambda;
        }

        // λ 取大一侧的导数贡献: −½ (u_R − u_L) ⊗ dλ/du
        let du = (*ur - *ul).to_array();
        if ll >= lr {
            let dl = wave_speed_gradient(ul, n, self.g);
            for i in 0..4 {
                for k in 0..4 {
                    jl[i][k] -= 0.5 * du[i] * dl[k];
                }
            }
        } else {
            let dl = wave_speed_gradient(ur, n, self.g);
            for i in 0..4 {
                for k in 0..4 {
                    jr[i][k] -= 0.5 * du[i] * dl[k];
                }
            }
        }
        (jl, jr)
    }
}
