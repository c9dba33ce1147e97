// crates/afv_physics/src/schemes/riemann/van_leer.rs

//! Van Leer 通量矢量分裂
//!
//! F = F⁺(u_L) + F⁻(u_R)。亚声速分支
//!
//! ```text
//! f_m± = ±ρc(Mₙ±1)²/4
//! F±   = f_m± · [1, vx + nx(−vₙ±2c)/γ, vy + ny(−vₙ±2c)/γ, w±]
//! w±   = ((γ−1)vₙ ± 2c)²/(2(γ²−1)) + (|v|²−vₙ²)/2
//! ```
//!
//! 分裂多项式对 Mach 数连续可微，Jacobian 按链式法则给出精确导数。

use super::{physical_flux, physical_flux_jacobian, FluxJacobian, JAC_ZERO};
use crate::state::ConsState;
use glam::DVec2;

/// Van Leer 通量分裂
#[derive(Debug, Clone, Copy)]
pub struct VanLeerFlux {
    g: f64,
}

/// 单侧状态的派生量及其守恒变量导数
struct SideDerivs {
    rho: f64,
    vx: f64,
    vy: f64,
    vn: f64,
    c: f64,
    drho: [f64; 4],
    dvx: [f64; 4],
    dvy: [f64; 4],
    dvn: [f64; 4],
    dc: [f64; 4],
}

impl SideDerivs {
    fn new(u: &ConsState, n: DVec2, g: f64) -> Self {
        let rho = u.rho;
        let vx = u.rho_vx / rho;
        let vy = u.rho_vy / rho;
        let vn = vx * n.x + vy * n.y;
        let phi = 0.5 * (g - 1.0) * (vx * vx + vy * vy);
        let p = (g - 1.0) * u.rho_e - phi * rho;
        let c = (g * p / rho).sqrt();

        let dp = [phi, -(g - 1.0) * vx, -(g - 1.0) * vy, g - 1.0];
        let kc = g / (2.0 * c * rho);
        let mut dc = [0.0; 4];
        for k in 0..4 {
            dc[k] = kc * dp[k];
        }
        dc[0] -= c / (2.0 * rho);

        Self {
            rho,
            vx,
            vy,
            vn,
            c,
            drho: [1.0, 0.0, 0.0, 0.0],
            dvx: [-vx / rho, 1.0 / rho, 0.0, 0.0],
            dvy: [-vy / rho, 0.0, 1.0 / rho, 0.0],
            dvn: [-vn / rho, n.x / rho, n.y / rho, 0.0],
            dc,
        }
    }

    #[inline]
    fn mach(&self) -> f64 {
        self.vn / self.c
    }
}

impl VanLeerFlux {
    /// 创建
    pub fn new(gamma: f64) -> Self {
        Self { g: gamma }
    }

    /// 亚声速正分裂通量
    fn split_plus(&self, s: &SideDerivs, n: DVec2, sign: f64) -> ConsState {
        let g = self.g;
        // sign = +1 给出 F⁺，sign = −1 给出 F⁻
        let fm = sign * s.rho * (s.vn + sign * s.c).powi(2) / (4.0 * s.c);
        let wx = s.vx + n.x * (-s.vn + sign * 2.0 * s.c) / g;
        let wy = s.vy + n.y * (-s.vn + sign * 2.0 * s.c) / g;
        let we = ((g - 1.0) * s.vn + sign * 2.0 * s.c).powi(2) / (2.0 * (g * g - 1.0))
            + 0.5 * (s.vx * s.vx + s.vy * s.vy - s.vn * s.vn);
        ConsState::new(fm, fm * wx, fm * wy, fm * we)
    }

    /// 亚声速分裂通量的精确 Jacobian
    fn split_jacobian(&self, s: &SideDerivs, n: DVec2, sign: f64) -> FluxJacobian {
        let g = self.g;
        let q = s.vn + sign * s.c;
        let fm = sign * s.rho * q * q / (4.0 * s.c);
        let wx = s.vx + n.x * (-s.vn + sign * 2.0 * s.c) / g;
        let wy = s.vy + n.y * (-s.vn + sign * 2.0 * s.c) / g;
        let ge = (g - 1.0) * s.vn + sign * 2.0 * s.c;
        let we = ge * ge / (2.0 * (g * g - 1.0))
            + 0.5 * (s.vx * s.vx + s.vy * s.vy - s.vn * s.vn);

        let mut dfm = [0.0; 4];
        let mut dwx = [0.0; 4];
        let mut dwy = [0.0; 4];
        let mut dwe = [0.0; 4];
        for k in 0..4 {
            // dfm = sign[q²/(4c)dρ + ρq/(2c)(dvn + sign·dc) − ρq²/(4c²)dc]
            dfm[k] = sign
                * (q * q / (4.0 * s.c) * s.drho[k]
                    + s.rho * q / (2.0 * s.c) * (s.dvn[k] + sign * s.dc[k])
                    - s.rho * q * q / (4.0 * s.c * s.c) * s.dc[k]);
            dwx[k] = s.dvx[k] + n.x / g * (sign * 2.0 * s.dc[k] - s.dvn[k]);
            dwy[k] = s.dvy[k] + n.y / g * (sign * 2.0 * s.dc[k] - s.dvn[k]);
            dwe[k] = ge / (g * g - 1.0) * ((g - 1.0) * s.dvn[k] + sign * 2.0 * s.dc[k])
                + s.vx * s.dvx[k]
                + s.vy * s.dvy[k]
                - s.vn * s.dvn[k];
        }

        let mut jac = JAC_ZERO;
        for k in 0..4 {
            jac[0][k] = dfm[k];
            jac[1][k] = wx * dfm[k] + fm * dwx[k];
            jac[2][k] = wy * dfm[k] + fm * dwy[k];
            jac[3][k] = we * dfm[k] + fm * dwe[k];
        }
        jac
    }

    /// 数值通量
    pub fn flux(&self, ul: &ConsState, ur: &ConsState, n: DVec2) -> ConsState {
        let sl = SideDerivs::new(ul, n, self.g);
        let sr = SideDerivs::new(ur, n, self.g);

        let fplus = if sl.mach() >= 1.0 {
            physical_flux(ul, n, self.g)
        } else if sl.mach() <= -1.0 {
            ConsState::ZERO
        } else {
            self.split_plus(&sl, n, 1.0)
        };

        let fminus = if sr.mach() <= -1.0 {
            physical_flux(ur, n, self.g)
        } else if sr.mach() >= 1.0 {
            ConsState::ZERO
        } else {
            self.split_plus(&sr, n, -1.0)
        };

        fplus + fminus
    }

    /// 精确 Jacobian
    pub fn jacobian(&self, ul: &ConsState, ur: &ConsState, n: DVec2) -> (FluxJacobian, FluxJacobian) {
        let sl = SideDerivs::new(ul, n, self.g);
        let sr = SideDerivs::new(ur, n, self.g);

        let jl = if sl.mach() >= 1.0 {
            physical_flux_jacobian(ul, n, self.g)
        } else if sl.mach() <= -1.0 {
            JAC_ZERO
        } else {
            self.split_jacobian(&sl, n, 1.0)
        };

        let jr = if sr.mach() <= -1.0 {
            physical_flux_jacobian(ur, n, self.g)
        } else if sr.mach() >= 1.0 {
            JAC_ZERO
        } else {
            self.split_jacobian(&sr, n, -1.0)
        };

        (jl, jr)
    }
}
