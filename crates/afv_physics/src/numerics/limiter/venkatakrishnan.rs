// crates/afv_physics/src/numerics/limiter/venkatakrishnan.rs

//! Venkatakrishnan 限制器
//!
//! 光滑有理函数替代 Barth-Jespersen 的 min 操作，避免极限环，
//! 利于定常收敛。ε² = (K·h)³，h 为单元特征尺度。
//!
//! # K 参数
//! - 小 K（≈0.1–1）强限制，适于激波
//! - 大 K（≈4–10）弱限制，适于光滑流动
//!
//! 参考：Venkatakrishnan (1993), AIAA 93-0880.

/// Venkatakrishnan 限制器
#[derive(Debug, Clone, Copy)]
pub struct VenkatakrishnanLimiter {
    k: f64,
}

impl VenkatakrishnanLimiter {
    /// 创建
    pub fn new(k: f64) -> Self {
        Self { k }
    }

    /// K 参数
    #[inline]
    pub fn k(&self) -> f64 {
        self.k
    }

    /// 光滑限制函数
    ///
    /// φ(Δ, δ) = (Δ² + ε² + 2δΔ)/(Δ² + 2δ² + Δδ + ε²)，
    /// δ → 0 时 φ → 1，δ → ∞ 时 φ → Δ/δ。
    #[inline]
    fn phi(delta2: f64, delta: f64, eps2: f64) -> f64 {
        let num = delta2 * delta2 + eps2 + 2.0 * delta * delta2;
        let den = delta2 * delta2 + 2.0 * delta * delta + delta2 * delta + eps2;
        if den.abs() < 1e-30 {
            1.0
        } else {
            num / den
        }
    }

    /// 限制因子 α ∈ [0, 1]
    ///
    /// `delta`: 重构增量 ∇u·Δr；`dmax`/`dmin`: 邻域极值相对单元值
    /// 的增量；`h`: 单元特征尺度。
    #[inline]
    pub fn limit(&self, delta: f64, dmax: f64, dmin: f64, h: f64) -> f64 {
        const TOL: f64 = 1e-12;
        if delta.abs() < TOL {
            return 1.0;
        }
        let kh = self.k * h;
        let eps2 = kh * kh * kh;
        let phi = if delta > 0.0 {
            Self::phi(dmax, delta, eps2)
        } else {
            Self::phi(dmin, delta, eps2)
        };
        phi.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter() -> VenkatakrishnanLimiter {
        VenkatakrishnanLimiter::new(4.0)
    }

    #[test]
    fn test_zero_gradient_unlimited() {
        assert_eq!(limiter().limit(0.0, 0.5, -0.5, 0.1), 1.0);
    }

    #[test]
    fn test_bounded() {
        let lim = VenkatakrishnanLimiter::new(1.0);
        for &delta in &[0.01, 0.1, 0.5, 2.0, -0.01, -0.5, -2.0] {
            let a = lim.limit(delta, 0.3, -0.3, 0.01);
            assert!((0.0..=1.0).contains(&a), "alpha = {a} for delta = {delta}");
        }
    }

    #[test]
    fn test_large_overshoot_limited() {
        // 重构增量远超邻域极值时强限制
        let a = VenkatakrishnanLimiter::new(0.5).limit(2.0, 0.1, -0.1, 0.01);
        assert!(a < 0.2, "alpha = {a}");
    }

    #[test]
    fn test_smooth_region_nearly_unlimited() {
        // 增量远小于邻域范围且 ε 吸收小波动
        let a = limiter().limit(0.01, 0.5, -0.5, 0.5);
        assert!(a > 0.9, "alpha = {a}");
    }

    #[test]
    fn test_symmetry() {
        let lim = limiter();
        let pos = lim.limit(0.3, 0.5, -0.5, 0.1);
        let neg = lim.limit(-0.3, 0.5, -0.5, 0.1);
        assert!((pos - neg).abs() < 1e-13);
    }

    #[test]
    fn test_smoothness() {
        // 限制因子随 δ 连续变化，无跳变
        let lim = VenkatakrishnanLimiter::new(2.0);
        let mut prev = lim.limit(0.001, 0.2, -0.2, 0.05);
        for i in 2..200 {
            let a = lim.limit(i as f64 * 0.001, 0.2, -0.2, 0.05);
            assert!((a - prev).abs() < 0.05, "jump at i = {i}");
            prev = a;
        }
    }

    #[test]
    fn test_k_monotonicity() {
        // K 越大限制越弱
        let d = 0.3;
        let a1 = VenkatakrishnanLimiter::new(0.5).limit(d, 0.2, -0.2, 0.1);
        let a2 = VenkatakrishnanLimiter::new(4.0).limit(d, 0.2, -0.2, 0.1);
        assert!(a1 <= a2 + 1e-13);
    }
}
