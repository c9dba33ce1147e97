// crates/afv_physics/src/spatial/viscous.rs

//! 层流黏性通量
//!
//! 面梯度由两侧单元的原始变量梯度平均并做法向一致性修正：
//!
//! ```text
//! ∇φ_f = ∇φ̄ + [(φ_R − φ_L)/d − ∇φ̄·ê] ê
//! ```
//!
//! 无量纲应力 τ = (μ/Re∞)(∇v + ∇vᵀ − ⅔(∇·v)I)，
//! 热流 q = −μ/((γ−1)M∞²·Re∞·Pr)·∇T。
//! 原始变量梯度次序固定为 (ρ, vx, vy, T)。

use crate::physics::IdealGasPhysics;
use crate::state::ConsState;
use glam::DVec2;

/// 黏性参数
#[derive(Debug, Clone, Copy)]
pub struct ViscousParams {
    /// 来流 Reynolds 数
    pub reynolds: f64,
    /// Prandtl 数
    pub prandtl: f64,
    /// 常黏性开关
    pub constant_viscosity: bool,
}

/// 原始变量 (ρ, vx, vy, T) 的面状态与梯度
#[derive(Debug, Clone, Copy)]
pub struct FaceGradientState {
    /// 面值（两侧平均）
    pub w: [f64; 4],
    /// x 方向梯度
    pub gx: [f64; 4],
    /// y 方向梯度
    pub gy: [f64; 4],
}

/// 平均 + 法向修正的面梯度
///
/// `wl`/`wr` 为两侧 (ρ, vx, vy, T)；`dr` 为左中心指向右中心
/// （或幽灵中心）的向量。
pub fn face_gradient_state(
    wl: &[f64; 4],
    wr: &[f64; 4],
    gl_x: &[f64; 4],
    gl_y: &[f64; 4],
    gr_x: &[f64; 4],
    gr_y: &[f64; 4],
    dr: DVec2,
) -> FaceGradientState {
    let d = dr.length();
    let e = dr / d;
    let mut out = FaceGradientState {
        w: [0.0; 4],
        gx: [0.0; 4],
        gy: [0.0; 4],
    };
    for k in 0..4 {
        out.w[k] = 0.5 * (wl[k] + wr[k]);
        let gx = 0.5 * (gl_x[k] + gr_x[k]);
        let gy = 0.5 * (gl_y[k] + gr_y[k]);
        // 法向一致性修正：连线方向的方向导数用两点差分替换
        let correction = (wr[k] - wl[k]) / d - (gx * e.x + gy * e.y);
        out.gx[k] = gx + correction * e.x;
        out.gy[k] = gy + correction * e.y;
    }
    out
}

/// 黏性法向通量（对守恒方程的贡献，含能量方程的功与热流）
///
/// 返回值直接加到面通量上（残差约定同无黏通量）。
pub fn viscous_flux(
    phys: &IdealGasPhysics,
    params: &ViscousParams,
    fgs: &FaceGradientState,
    n: DVec2,
) -> ConsState {
    let mu = phys.viscosity(fgs.w[3], params.constant_viscosity) / params.reynolds;

    let dudx = fgs.gx[1];
    let dudy = fgs.gy[1];
    let dvdx = fgs.gx[2];
    let dvdy = fgs.gy[2];
    let div = dudx + dvdy;

    let txx = mu * (2.0 * dudx - 2.0 / 3.0 * div);
    let tyy = mu * (2.0 * dvdy - 2.0 / 3.0 * div);
    let txy = mu * (dudy + dvdx);

    let g = phys.gamma;
    let k_cond = mu / ((g - 1.0) * phys.mach_inf * phys.mach_inf * params.prandtl);
    let qx = -k_cond * fgs.gx[3];
    let qy = -k_cond * fgs.gy[3];

    let vx = fgs.w[1];
    let vy = fgs.w[2];

    // 黏性通量在残差中的符号与无黏通量相反（扩散项）
    ConsState::new(
        0.0,
        -(txx * n.x + txy * n.y),
        -(txy * n.x + tyy * n.y),
        -((txx * vx + txy * vy - qx) * n.x + (txy * vx + tyy * vy - qy) * n.y),
    )
}

/// 黏性谱半径对波速积分的贡献
///
/// λ_v·ℓ ≈ μγ/(ρ Pr Re)·ℓ/d，d 为两侧中心距。
pub fn viscous_wave_speed(
    phys: &IdealGasPhysics,
    params: &ViscousParams,
    rho_face: f64,
    t_face: f64,
    length: f64,
    dist: f64,
) -> f64 {
    let mu = phys.viscosity(t_face, params.constant_viscosity) / params.reynolds;
    mu * phys.gamma / (rho_face * params.prandtl) * length / dist
}
