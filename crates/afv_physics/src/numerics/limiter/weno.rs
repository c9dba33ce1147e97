// crates/afv_physics/src/numerics/limiter/weno.rs

//! WENO 型梯度加权
//!
//! 候选梯度为本单元与各面邻单元的重构梯度，按振荡指标
//! β = |∇u|² 加权：w_k ∝ λ_k/(β_k + ε)^p。中心候选权重放大，
//! 光滑区退回本单元梯度，间断附近偏向振荡最小的邻居梯度。

/// 中心候选的线性权放大倍数
const CENTRAL_WEIGHT: f64 = 1000.0;
/// 振荡指标幂次
const OSC_POWER: i32 = 4;
/// 防零参数
const EPS: f64 = 1e-5;

/// 混合本单元与邻居的梯度
///
/// `own`: 本单元 (∂u/∂x, ∂u/∂y)；`neighbors`: 邻单元梯度。
pub fn weno_blend(own: (f64, f64), neighbors: &[(f64, f64)]) -> (f64, f64) {
    let osc = |g: (f64, f64)| g.0 * g.0 + g.1 * g.1;

    let mut wsum = CENTRAL_WEIGHT / (osc(own) + EPS).powi(OSC_POWER);
    let mut gx = wsum * own.0;
    let mut gy = wsum * own.1;

    for &g in neighbors {
        let w = 1.0 / (osc(g) + EPS).powi(OSC_POWER);
        wsum += w;
        gx += w * g.0;
        gy += w * g.1;
    }

    (gx / wsum, gy / wsum)
}
