// crates/afv_physics/src/physics.rs

//! 理想气体物理量换算
//!
//! 全部为纯函数。无量纲约定：参考密度与速度取来流值，
//! 压强 p = ρT/(γ M∞²)，来流状态为
//! ρ∞ = 1，v∞ = (cos α, sin α)，p∞ = 1/(γ M∞²)，
//! E∞ = 1/((γ−1) γ M∞²) + 1/2。

use crate::state::{ConsState, PrimState};
use glam::DVec2;

/// Sutherland 常数 [K]
const SUTHERLAND_S: f64 = 110.4;

/// 理想气体物理
#[derive(Debug, Clone, Copy)]
pub struct IdealGasPhysics {
    /// 比热比 γ
    pub gamma: f64,
    /// 来流 Mach 数
    pub mach_inf: f64,
    /// 来流温度 [K]（仅黏性时用于 Sutherland 公式）
    pub temperature_inf: f64,
}

impl IdealGasPhysics {
    /// 创建
    pub fn new(gamma: f64, mach_inf: f64) -> Self {
        Self {
            gamma,
            mach_inf,
            temperature_inf: 0.0,
        }
    }

    /// 创建（带来流温度，黏性算例）
    pub fn with_temperature(gamma: f64, mach_inf: f64, temperature_inf: f64) -> Self {
        Self {
            gamma,
            mach_inf,
            temperature_inf,
        }
    }

    /// 压强 p = (γ−1)(ρE − ½ρ|v|²)
    #[inline]
    pub fn pressure(&self, u: &ConsState) -> f64 {
        (self.gamma - 1.0)
            * (u.rho_e - 0.5 * (u.rho_vx * u.rho_vx + u.rho_vy * u.rho_vy) / u.rho)
    }

    /// 无量纲温度 T = γ M∞² p/ρ
    #[inline]
    pub fn temperature(&self, u: &ConsState) -> f64 {
        self.gamma * self.mach_inf * self.mach_inf * self.pressure(u) / u.rho
    }

    /// 声速 c = √(γp/ρ)
    #[inline]
    pub fn sound_speed(&self, u: &ConsState) -> f64 {
        (self.gamma * self.pressure(u) / u.rho).sqrt()
    }

    /// 熵 s = p/ρ^γ
    #[inline]
    pub fn entropy(&self, u: &ConsState) -> f64 {
        self.pressure(u) / u.rho.powf(self.gamma)
    }

    /// 最大特征波速 |vₙ| + c
    #[inline]
    pub fn max_wave_speed(&self, u: &ConsState, n: DVec2) -> f64 {
        u.normal_velocity(n).abs() + self.sound_speed(u)
    }

    /// 由 (ρ, v, T) 计算总能密度
    ///
    /// p = ρT/(γM∞²)，ρE = p/(γ−1) + ½ρ|v|²
    #[inline]
    pub fn energy_from_t(&self, rho: f64, v: DVec2, t: f64) -> f64 {
        let p = rho * t / (self.gamma * self.mach_inf * self.mach_inf);
        p / (self.gamma - 1.0) + 0.5 * rho * v.length_squared()
    }

    /// 由 (ρ, T) 反推压强
    #[inline]
    pub fn pressure_from_rho_t(&self, rho: f64, t: f64) -> f64 {
        rho * t / (self.gamma * self.mach_inf * self.mach_inf)
    }

    /// 由 (p, T) 反推密度
    #[inline]
    pub fn rho_from_p_t(&self, p: f64, t: f64) -> f64 {
        self.gamma * self.mach_inf * self.mach_inf * p / t
    }

    /// 守恒 → 原始 (ρ, vx, vy, p)
    #[inline]
    pub fn cons_to_prim(&self, u: &ConsState) -> PrimState {
        PrimState::new(
            u.rho,
            u.rho_vx / u.rho,
            u.rho_vy / u.rho,
            self.pressure(u),
        )
    }

    /// 原始 → 守恒
    #[inline]
    pub fn prim_to_cons(&self, w: &PrimState) -> ConsState {
        ConsState::new(
            w.rho,
            w.rho * w.vx,
            w.rho * w.vy,
            w.p / (self.gamma - 1.0) + 0.5 * w.rho * (w.vx * w.vx + w.vy * w.vy),
        )
    }

    /// 来流参考状态
    pub fn freestream(&self, alpha: f64) -> ConsState {
        let rho = 1.0;
        let v = DVec2::new(alpha.cos(), alpha.sin());
        let p = 1.0 / (self.gamma * self.mach_inf * self.mach_inf);
        ConsState::new(
            rho,
            rho * v.x,
            rho * v.y,
            p / (self.gamma - 1.0) + 0.5 * rho * v.length_squared(),
        )
    }

    /// 无量纲分子黏性
    ///
    /// Sutherland 公式以来流温度无量纲化，μ(T=1) = 1；
    /// `constant` 为真时返回 1。
    #[inline]
    pub fn viscosity(&self, t: f64, constant: bool) -> f64 {
        if constant || self.temperature_inf <= 0.0 {
            return 1.0;
        }
        let s = SUTHERLAND_S / self.temperature_inf;
        t.powf(1.5) * (1.0 + s) / (t + s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn phys() -> IdealGasPhysics {
        IdealGasPhysics::new(1.4, 0.38)
    }

    #[test]
    fn test_freestream_state() {
        let p = phys();
        let uinf = p.freestream(0.0);
        assert!((uinf.rho - 1.0).abs() < 1e-14);
        assert!((uinf.rho_vx - 1.0).abs() < 1e-14);
        assert!(uinf.rho_vy.abs() < 1e-14);
        // E∞ = 1/((γ−1)γM∞²) + 1/2
        let e_expected = 1.0 / (0.4 * 1.4 * 0.38 * 0.38) + 0.5;
        assert!((uinf.rho_e - e_expected).abs() < 1e-12);
        // p∞ = 1/(γM∞²)
        assert!((p.pressure(&uinf) - 1.0 / (1.4 * 0.38 * 0.38)).abs() < 1e-12);
    }

    #[test]
    fn test_freestream_with_angle() {
        let p = phys();
        let alpha = 0.3_f64;
        let uinf = p.freestream(alpha);
        assert!((uinf.rho_vx - alpha.cos()).abs() < 1e-14);
        assert!((uinf.rho_vy - alpha.sin()).abs() < 1e-14);
        // 攻角不改变压强
        let u0 = p.freestream(0.0);
        assert!((p.pressure(&uinf) - p.pressure(&u0)).abs() < 1e-12);
    }

    #[test]
    fn test_prim_cons_roundtrip() {
        let p = phys();
        let w = PrimState::new(0.8, 0.3, -0.2, 1.9);
        let u = p.prim_to_cons(&w);
        let w2 = p.cons_to_prim(&u);
        assert!((w.rho - w2.rho).abs() < 1e-14);
        assert!((w.vx - w2.vx).abs() < 1e-14);
        assert!((w.vy - w2.vy).abs() < 1e-14);
        assert!((w.p - w2.p).abs() < 1e-13);
    }

    #[test]
    fn test_temperature_identity() {
        // p = ρT/(γM∞²) 的互逆性
        let p = phys();
        let u = p.prim_to_cons(&PrimState::new(1.2, 0.1, 0.2, 2.5));
        let t = p.temperature(&u);
        assert!((p.pressure_from_rho_t(u.rho, t) - p.pressure(&u)).abs() < 1e-13);
        assert!((p.rho_from_p_t(p.pressure(&u), t) - u.rho).abs() < 1e-13);
    }

    #[test]
    fn test_freestream_temperature_is_unity() {
        let p = phys();
        let uinf = p.freestream(0.0);
        assert!((p.temperature(&uinf) - 1.0).abs() < 1e-13);
    }

    #[test]
    fn test_entropy() {
        let p = phys();
        let u = p.prim_to_cons(&PrimState::new(2.0, 0.0, 0.0, 3.0));
        assert!((p.entropy(&u) - 3.0 / 2.0_f64.powf(1.4)).abs() < 1e-13);
    }

    #[test]
    fn test_sutherland_normalization() {
        let p = IdealGasPhysics::with_temperature(1.4, 0.2, 300.0);
        assert!((p.viscosity(1.0, false) - 1.0).abs() < 1e-14);
        // 温度升高黏性增大
        assert!(p.viscosity(1.5, false) > 1.0);
        assert!((p.viscosity(2.0, true) - 1.0).abs() < 1e-14);
    }
}
