// crates/afv_physics/src/schemes/riemann/roe.rs

//! Roe 近似黎曼求解器
//!
//! F = ½(F_L + F_R) − ½ Σ|λ̃ₖ| αₖ K̃ₖ，特征量取 Roe 平均。
//! 声波特征值使用 Harten 熵修正，避免声速点处的膨胀激波。
//!
//! Jacobian 取冻结 |Ã| 形式：
//! ∂F/∂u_L ≈ ½(A(u_L) + |Ã|)，∂F/∂u_R ≈ ½(A(u_R) − |Ã|)，
//! 其中 |Ã| = R̃|Λ̃|R̃⁻¹ 按当前 Roe 平均装配后冻结。

use super::{physical_flux, physical_flux_jacobian, roe_average, FluxJacobian, JAC_ZERO};
use crate::state::ConsState;
use glam::DVec2;

/// Harten 熵修正阈值系数（乘以 Roe 声速）
const ENTROPY_FIX_FRACTION: f64 = 0.1;

/// Roe 通量
#[derive(Debug, Clone, Copy)]
pub struct RoeFlux {
    g: f64,
}

/// Roe 平均下的特征分解
struct RoeWaves {
    /// 熵修正后的 |λ|，次序 (ṽₙ−c̃, ṽₙ, ṽₙ, ṽₙ+c̃)
    abs_lambda: [f64; 4],
    /// 右特征向量（列）
    right: [[f64; 4]; 4],
    /// 左特征向量（行）
    left: [[f64; 4]; 4],
}

impl RoeWaves {
    fn new(ul: &ConsState, ur: &ConsState, n: DVec2, g: f64) -> Self {
        let (_, v, h, c) = roe_average(ul, ur, g);
        let vn = v.dot(n);
        let t = DVec2::new(-n.y, n.x);
        let vt = v.dot(t);
        let q2 = v.length_squared();
        let phi = 0.5 * (g - 1.0) * q2;

        // Harten 熵修正：|λ| < ε 时替换为 (λ²+ε²)/(2ε)
        let eps = ENTROPY_FIX_FRACTION * c;
        let fix = |lambda: f64| -> f64 {
            let a = lambda.abs();
            if a < eps {
                (lambda * lambda + eps * eps) / (2.0 * eps)
            } else {
                a
            }
        };

        let abs_lambda = [fix(vn - c), vn.abs(), vn.abs(), fix(vn + c)];

        // 右特征向量 K̃ₖ（列）
        let right = [
            [1.0, v.x - c * n.x, v.y - c * n.y, h - c * vn],
            [1.0, v.x, v.y, 0.5 * q2],
            [0.0, t.x, t.y, vt],
            [1.0, v.x + c * n.x, v.y + c * n.y, h + c * vn],
        ];

        // 左特征向量（行），满足 L·R = I
        let a1 = g - 1.0;
        let ic2 = 1.0 / (c * c);
        let left = [
            [
                0.5 * ic2 * (phi + c * vn),
                0.5 * ic2 * (-a1 * v.x - c * n.x),
                0.5 * ic2 * (-a1 * v.y - c * n.y),
                0.5 * ic2 * a1,
            ],
            [
                ic2 * (c * c - phi),
                ic2 * a1 * v.x,
                ic2 * a1 * v.y,
                -ic2 * a1,
            ],
            [-vt, t.x, t.y, 0.0],
            [
                0.5 * ic2 * (phi - c * vn),
                0.5 * ic2 * (-a1 * v.x + c * n.x),
                0.5 * ic2 * (-a1 * v.y + c * n.y),
                0.5 * ic2 * a1,
            ],
        ];

        Self {
            abs_lambda,
            right,
            left,
        }
    }

    /// |Ã| w = Σₖ |λ̃ₖ| (Lₖ·w) K̃ₖ
    fn abs_a_times(&self, w: [f64; 4]) -> [f64; 4] {
        let mut out = [0.0; 4];
        for k in 0..4 {
            let alpha = self.abs_lambda[k]
                * (self.left[k][0] * w[0]
                    + self.left[k][1] * w[1]
                    + self.left[k][2] * w[2]
                    + self.left[k][3] * w[3]);
            for i in 0..4 {
                out[i] += alpha * self.right[k][i];
            }
        }
        out
    }

    /// 装配 |Ã| 矩阵
    fn abs_a_matrix(&self) -> FluxJacobian {
        let mut m = JAC_ZERO;
        for k in 0..4 {
            let mut e = [0.0; 4];
            e[k] = 1.0;
            let col = self.abs_a_times(e);
            for i in 0..4 {
                m[i][k] = col[i];
            }
        }
        m
    }
}

impl RoeFlux {
    /// 创建
    pub fn new(gamma: f64) -> Self {
        Self { g: gamma }
    }

    /// 数值通量
    pub fn flux(&self, ul: &ConsState, ur: &ConsState, n: DVec2) -> ConsState {
        let waves = RoeWaves::new(ul, ur, n, self.g);
        let fl = physical_flux(ul, n, self.g);
        let fr = physical_flux(ur, n, self.g);
        let diss = waves.abs_a_times((*ur - *ul).to_array());
        ConsState::new(
            0.5 * (fl.rho + fr.rho - diss[0]),
            0.5 * (fl.rho_vx + fr.rho_vx - diss[1]),
            0.5 * (fl.rho_vy + fr.rho_vy - diss[2]),
            0.5 * (fl.rho_e + fr.rho_e - diss[3]),
        )
    }

    /// 冻结 |Ã| Jacobian
    pub fn jacobian(&self, ul: &ConsState, ur: &ConsState, n: DVec2) -> (FluxJacobian, FluxJacobian) {
        let waves = RoeWaves::new(ul, ur, n, self.g);
        let abs_a = waves.abs_a_matrix();
        let al = physical_flux_jacobian(ul, n, self.g);
        let ar = physical_flux_jacobian(ur, n, self.g);

        let mut jl = JAC_ZERO;
        let mut jr = JAC_ZERO;
        for i in 0..4 {
            for k in 0..4 {
                jl[i][k] = 0.5 * (al[i][k] + abs_a[i][k]);
                jr[i][k] = 0.5 * (ar[i][k] - abs_a[i][k]);
            }
        }
        (jl, jr)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::super::InviscidFluxScheme;
    use super::*;
    use crate::physics::IdealGasPhysics;
    use crate::state::PrimState;

    fn scheme() -> InviscidFluxScheme {
        InviscidFluxScheme::Roe(RoeFlux::new(GAMMA))
    }

    #[test]
    fn test_consistency() {
        check_consistency(&scheme(), &subsonic_state(), oblique_normal());
        check_consistency(&scheme(), &supersonic_state(), DVec2::new(1.0, 0.0));
    }

    #[test]
    fn test_conservation() {
        check_conservation(
            &scheme(),
            &subsonic_state(),
            &subsonic_state_b(),
            oblique_normal(),
        );
    }

    #[test]
    fn test_eigen_inverse() {
        // L·R = I
        let waves = RoeWaves::new(&subsonic_state(), &subsonic_state_b(), oblique_normal(), GAMMA);
        for i in 0..4 {
            for j in 0..4 {
                let mut s = 0.0;
                for k in 0..4 {
                    s += waves.left[i][k] * waves.right[j][k];
                }
                let expect = if i == j { 1.0 } else { 0.0 };
                assert!((s - expect).abs() < 1e-10, "L·R[{i}][{j}] = {s}");
            }
        }
    }

    #[test]
    fn test_abs_a_reproduces_a_for_supersonic() {
        // 全部 λ 同号（超声速）时 |Ã| w = Ã w = A w（等值状态下）
        let u = supersonic_state();
        let n = DVec2::new(1.0, 0.0);
        let waves = RoeWaves::new(&u, &u, n, GAMMA);
        let a = physical_flux_jacobian(&u, n, GAMMA);
        let w = [0.3, -0.1, 0.7, 0.2];
        let got = waves.abs_a_times(w);
        let mut expect = [0.0; 4];
        for i in 0..4 {
            for k in 0..4 {
                expect[i] += a[i][k] * w[k];
            }
        }
        for i in 0..4 {
            assert!((got[i] - expect[i]).abs() < 1e-9, "row {i}: {} vs {}", got[i], expect[i]);
        }
    }

    #[test]
    fn test_stationary_contact_resolved() {
        // 静止接触波（vₙ = 0、等压）：动量通量严格等于压强
        let phys = IdealGasPhysics::new(GAMMA, 0.5);
        let ul = phys.prim_to_cons(&PrimState::new(1.0, 0.0, 0.0, 1.0));
        let ur = phys.prim_to_cons(&PrimState::new(0.4, 0.0, 0.0, 1.0));
        let n = DVec2::new(1.0, 0.0);
        let f = scheme().flux(&ul, &ur, n);
        // 熵修正作用在 vₙ = 0 的接触特征上，耗散与 ε 同阶，
        // 但压强平衡使物理通量部分严格相等
        assert!((f.rho_vx - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_jacobian_sum_consistency() {
        check_jacobian_sum_consistency(&scheme(), &subsonic_state(), oblique_normal());
    }
}
