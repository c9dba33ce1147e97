// crates/afv_physics/src/schemes/riemann/hllc.rs

//! HLLC 近似黎曼求解器
//!
//! 在 HLL 双波近似上恢复接触波：由左右状态估计接触波速 s_M，
//! 按波区选取星区状态（Toro 形式）。波速估计与 HLL 相同
//! （Einfeldt 包络）。
//!
//! Jacobian 复用 HLL 的冻结波速块：接触波的导数贡献不计入，
//! 这是残差通量与 Jacobian 通量允许分离的典型情形。

use super::hll::HllFlux;
use super::{physical_flux, FluxJacobian};
use crate::state::ConsState;
use glam::DVec2;

/// HLLC 通量
#[derive(Debug, Clone, Copy)]
pub struct HllcFlux {
    g: f64,
    hll: HllFlux,
}

impl HllcFlux {
    /// 创建
    pub fn new(gamma: f64) -> Self {
        Self {
            g: gamma,
            hll: HllFlux::new(gamma),
        }
    }

    /// 星区状态
    ///
    /// u* = ρ(s − vₙ)/(s − s_M) · [1, v + (s_M − vₙ)n, E/ρ + (s_M − vₙ)(s_M + p/(ρ(s − vₙ)))]
    fn star_state(
        &self,
        u: &ConsState,
        p: f64,
        vn: f64,
        s: f64,
        sm: f64,
        n: DVec2,
    ) -> ConsState {
        let factor = u.rho * (s - vn) / (s - sm);
        let vx = u.rho_vx / u.rho;
        let vy = u.rho_vy / u.rho;
        ConsState::new(
            factor,
            factor * (vx + (sm - vn) * n.x),
            factor * (vy + (sm - vn) * n.y),
            factor * (u.rho_e / u.rho + (sm - vn) * (sm + p / (u.rho * (s - vn)))),
        )
    }

    /// 数值通量
    pub fn flux(&self, ul: &ConsState, ur: &ConsState, n: DVec2) -> ConsState {
        let g = self.g;
        let (sl, sr) = self.hll.wave_speeds(ul, ur, n);
        if sl >= 0.0 {
            return physical_flux(ul, n, g);
        }
        if sr <= 0.0 {
            return physical_flux(ur, n, g);
        }

        let vnl = ul.normal_velocity(n);
        let vnr = ur.normal_velocity(n);
        let pl = (g - 1.0)
            * (ul.rho_e - 0.5 * (ul.rho_vx * ul.rho_vx + ul.rho_vy * ul.rho_vy) / ul.rho);
        let pr = (g - 1.0)
            * (ur.rho_e - 0.5 * (ur.rho_vx * ur.rho_vx + ur.rho_vy * ur.rho_vy) / ur.rho);

        // 接触波速
        let num = pr - pl + ul.rho * vnl * (sl - vnl) - ur.rho * vnr * (sr - vnr);
        let den = ul.rho * (sl - vnl) - ur.rho * (sr - vnr);
        let sm = if den.abs() < 1e-14 {
            0.5 * (vnl + vnr)
        } else {
            num / den
        };

        if sm >= 0.0 {
            let ustar = self.star_state(ul, pl, vnl, sl, sm, n);
            physical_flux(ul, n, g) + (ustar - *ul) * sl
        } else {
            let ustar = self.star_state(ur, pr, vnr, sr, sm, n);
            physical_flux(ur, n, g) + (ustar - *ur) * sr
        }
    }

    /// Jacobian（HLL 冻结波速块）
    pub fn jacobian(&self, ul: &ConsState, ur: &ConsState, n: DVec2) -> (FluxJacobian, FluxJacobian) {
        self.hll.jacobian(ul, ur, n)
    }
}
