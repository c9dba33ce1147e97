// crates/afv_physics/src/boundary.rs

//! 边界闭合：按标记的幽灵状态规则
//!
//! 每条边界面由内部状态 u_L、面法向与该面标记对应的规则给出
//! 幽灵状态 u_g。规则集合：
//!
//! - 滑移壁：镜像法向动量，保持 ρ 与 ρE
//! - 绝热壁：速度整体反向（无滑移），能量用内部温度重算
//! - 等温壁：速度反向，能量用给定壁温重算
//! - 等温定压壁：等温壁之外再给定压强
//! - 远场 / 入流出流：远场恒取 u∞；入流出流按内部法向 Mach 数
//!   在 u∞ 与内部外推之间切换
//! - 零梯度外推：复制内部状态
//! - 超声速涡入流：解析涡状态（验证算例）
//! - 周期：由网格预链接处理，此处不给显式规则

use crate::physics::IdealGasPhysics;
use crate::state::ConsState;
use afv_config::{FlowPhysicsConfig, UNUSED_MARKER};
use glam::DVec2;
use std::collections::HashMap;

/// 超声速涡算例的入流参数（内半径、内圈 Mach 数、内圈密度）
pub const VORTEX_RI: f64 = 1.0;
/// 内圈 Mach 数
pub const VORTEX_MI: f64 = 2.25;
/// 内圈密度
pub const VORTEX_RHOI: f64 = 1.0;

/// 单个边界标记的幽灵状态规则
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BoundaryRule {
    /// 滑移壁
    SlipWall,
    /// 绝热壁（可带切向壁速）
    AdiabaticWall {
        /// 壁面切向速度
        wall_velocity: f64,
    },
    /// 等温壁
    IsothermalWall {
        /// 壁温（无量纲）
        temperature: f64,
        /// 壁面切向速度
        wall_velocity: f64,
    },
    /// 等温定压壁
    IsothermalPressureWall {
        /// 壁温（无量纲）
        temperature: f64,
        /// 壁面切向速度
        wall_velocity: f64,
        /// 壁面压强（无量纲）
        pressure: f64,
    },
    /// 远场
    FarField,
    /// 入流出流；`characteristic` 开启实验性特征规则
    InflowOutflow {
        /// 是否使用特征分支
        characteristic: bool,
    },
    /// 零梯度外推
    Extrapolation,
    /// 超声速涡解析入流
    VortexInflow,
    /// 周期（由网格配对处理）
    Periodic,
}

impl BoundaryRule {
    /// 幽灵状态是否依赖内部状态
    ///
    /// 隐式装配据此决定是否把右 Jacobian 折入对角块。
    pub fn ghost_depends_on_interior(&self) -> bool {
        !matches!(self, Self::FarField | Self::VortexInflow | Self::Periodic)
    }

    /// 计算幽灵状态
    ///
    /// `n` 为面外法向（指向幽灵侧），`face_mid` 为面中点
    /// （解析入流需要）。
    pub fn ghost_state(
        &self,
        phys: &IdealGasPhysics,
        uinf: &ConsState,
        ul: &ConsState,
        n: DVec2,
        face_mid: DVec2,
    ) -> ConsState {
        match *self {
            Self::SlipWall => {
                // u_g = (ρ, ρv − 2(ρv·n)n, ρE)
                let mn = ul.rho_vx * n.x + ul.rho_vy * n.y;
                ConsState::new(
                    ul.rho,
                    ul.rho_vx - 2.0 * mn * n.x,
                    ul.rho_vy - 2.0 * mn * n.y,
                    ul.rho_e,
                )
            }
            Self::AdiabaticWall { wall_velocity } => {
                let t = phys.temperature(ul);
                wall_ghost(phys, ul, n, wall_velocity, t, None)
            }
            Self::IsothermalWall {
                temperature,
                wall_velocity,
            } => wall_ghost(phys, ul, n, wall_velocity, temperature, None),
            Self::IsothermalPressureWall {
                temperature,
                wall_velocity,
                pressure,
            } => wall_ghost(phys, ul, n, wall_velocity, temperature, Some(pressure)),
            Self::FarField => *uinf,
            Self::InflowOutflow { characteristic } => {
                inflow_outflow_ghost(phys, uinf, ul, n, characteristic)
            }
            Self::Extrapolation => *ul,
            Self::VortexInflow => {
                supersonic_vortex_state(phys.gamma, VORTEX_MI, VORTEX_RI, VORTEX_RHOI, face_mid.y)
            }
            // 周期面的邻值由网格配对提供，不应走到这里
            Self::Periodic => *ul,
        }
    }
}

/// 无滑移壁幽灵状态
///
/// 速度反向并叠加 2·壁速 的切向分量，使面平均满足壁面条件；
/// 密度取内部值（或由给定压强反推），能量由 (ρ, v, T) 重算。
fn wall_ghost(
    phys: &IdealGasPhysics,
    ul: &ConsState,
    n: DVec2,
    wall_velocity: f64,
    temperature: f64,
    pressure: Option<f64>,
) -> ConsState {
    let tangent = DVec2::new(-n.y, n.x);
    let vg = -ul.velocity() + tangent * (2.0 * wall_velocity);
    let rho = match pressure {
        Some(p) => phys.rho_from_p_t(p, temperature),
        None => ul.rho,
    };
    ConsState::new(
        rho,
        rho * vg.x,
        rho * vg.y,
        phys.energy_from_t(rho, vg, temperature),
    )
}

/// 入流出流幽灵状态
///
/// 默认规则：内部法向 Mach 数 < 1 取 u∞，否则外推内部状态。
/// 实验性特征规则按四个波区分支（亚声速入流取 u∞ 的质量与动量、
/// 内部压强的内能；亚声速出流取内部质量与动量、远场压强的内能）。
// TODO: 特征分支尚无算例验证，默认关闭；cylinder 系列算例通过后
// 再放开亚声速入流分支的回归测试
fn inflow_outflow_ghost(
    phys: &IdealGasPhysics,
    uinf: &ConsState,
    ul: &ConsState,
    n: DVec2,
    characteristic: bool,
) -> ConsState {
    let g = phys.gamma;
    let mn = ul.normal_velocity(n) / phys.sound_speed(ul);

    if !characteristic {
        return if mn < 1.0 { *uinf } else { *ul };
    }

    if mn <= -1.0 {
        // 超声速入流
        *uinf
    } else if mn < 0.0 {
        // 亚声速入流：远场质量/动量 + 内部压强
        let pi = phys.pressure(ul);
        let kin_inf =
            0.5 * (uinf.rho_vx * uinf.rho_vx + uinf.rho_vy * uinf.rho_vy) / uinf.rho;
        ConsState::new(
            uinf.rho,
            uinf.rho_vx,
            uinf.rho_vy,
            pi / (g - 1.0) + kin_inf,
        )
    } else if mn < 1.0 {
        // 亚声速出流：内部质量/动量 + 远场压强
        let pinf = phys.pressure(uinf);
        let kin = 0.5 * (ul.rho_vx * ul.rho_vx + ul.rho_vy * ul.rho_vy) / ul.rho;
        ConsState::new(ul.rho, ul.rho_vx, ul.rho_vy, pinf / (g - 1.0) + kin)
    } else {
        // 超声速出流
        *ul
    }
}

/// 超声速涡解析解
///
/// Krivodonova & Berger (JCP 211, 2006)：半径 r 处的状态由
/// 内圈 (r_i, M_i, ρ_i) 给出。
pub fn supersonic_vortex_state(g: f64, mi: f64, ri: f64, rhoi: f64, r: f64) -> ConsState {
    let p_factor = 1.0 + (g - 1.0) * 0.5 * mi * mi * (1.0 - ri * ri / (r * r));
    let rho = rhoi * p_factor.powf(1.0 / (g - 1.0));
    let ci = rhoi.powf(g - 1.0).sqrt();
    let v = ci * mi / r;
    let p = rho.powf(g) / g;
    ConsState::new(rho, rho * v, 0.0, p / (g - 1.0) + 0.5 * rho * v * v)
}

/// 涡算例初始速度方向（切向）
pub fn supersonic_vortex_initial_velocity(vmag: f64, x: f64, y: f64) -> DVec2 {
    let theta = y.atan2(x) - std::f64::consts::FRAC_PI_2;
    DVec2::new(vmag * theta.cos(), vmag * theta.sin())
}

// ============================================================
// 标记 → 规则 映射
// ============================================================

/// 全部边界标记的规则集合
#[derive(Debug, Clone)]
pub struct BoundarySet {
    rules: HashMap<i32, BoundaryRule>,
}

impl BoundarySet {
    /// 从物理配置构建
    pub fn from_config(cfg: &FlowPhysicsConfig) -> Self {
        let mut rules = HashMap::new();
        let mut add = |marker: i32, rule: BoundaryRule| {
            if marker != UNUSED_MARKER {
                rules.insert(marker, rule);
            }
        };

        add(cfg.slipwall_marker, BoundaryRule::SlipWall);
        add(cfg.farfield_marker, BoundaryRule::FarField);
        add(
            cfg.inflow_outflow_marker,
            BoundaryRule::InflowOutflow {
                characteristic: cfg.characteristic_experimental,
            },
        );
        add(cfg.extrapolation_marker, BoundaryRule::Extrapolation);
        add(
            cfg.adiabatic_wall_marker,
            BoundaryRule::AdiabaticWall {
                wall_velocity: cfg.adiabatic_wall_velocity,
            },
        );
        add(
            cfg.isothermal_wall_marker,
            BoundaryRule::IsothermalWall {
                temperature: cfg.isothermal_wall_temperature,
                wall_velocity: cfg.isothermal_wall_velocity,
            },
        );
        add(
            cfg.isothermal_pressure_wall_marker,
            BoundaryRule::IsothermalPressureWall {
                temperature: cfg.isothermal_pressure_wall_temperature,
                wall_velocity: cfg.isothermal_pressure_wall_velocity,
                pressure: cfg.isothermal_pressure_wall_pressure,
            },
        );
        add(cfg.vortex_inflow_marker, BoundaryRule::VortexInflow);
        for &m in &cfg.periodic_markers {
            add(m, BoundaryRule::Periodic);
        }

        Self { rules }
    }

    /// 手工构建（测试与标量验证）
    pub fn from_rules(rules: HashMap<i32, BoundaryRule>) -> Self {
        Self { rules }
    }

    /// 查询标记对应的规则
    pub fn rule(&self, marker: i32) -> Option<&BoundaryRule> {
        self.rules.get(&marker)
    }

    /// 已配置的标记列表
    pub fn markers(&self) -> Vec<i32> {
        let mut m: Vec<i32> = self.rules.keys().copied().collect();
        m.sort_unstable();
        m
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::PrimState;

    fn phys() -> IdealGasPhysics {
        IdealGasPhysics::new(1.4, 0.38)
    }

    fn interior() -> ConsState {
        phys().prim_to_cons(&PrimState::new(1.1, 0.4, 0.2, 1.8))
    }

    const N: DVec2 = DVec2::new(1.0, 0.0);
    const MID: DVec2 = DVec2::new(0.0, 2.0);

    #[test]
    fn test_slip_wall_mirror() {
        let p = phys();
        let ul = interior();
        let g = BoundaryRule::SlipWall.ghost_state(&p, &p.freestream(0.0), &ul, N, MID);
        // ρ、ρE 保持，法向动量反向，切向保持
        assert_eq!(g.rho, ul.rho);
        assert_eq!(g.rho_e, ul.rho_e);
        assert!((g.rho_vx + ul.rho_vx).abs() < 1e-14);
        assert!((g.rho_vy - ul.rho_vy).abs() < 1e-14);
    }

    #[test]
    fn test_slip_wall_oblique_normal() {
        let p = phys();
        let ul = interior();
        let n = DVec2::new(0.6, 0.8);
        let g = BoundaryRule::SlipWall.ghost_state(&p, &p.freestream(0.0), &ul, n, MID);
        // 面平均的法向速度为零
        let vn_avg = 0.5 * (g.normal_velocity(n) * g.rho + ul.normal_velocity(n) * ul.rho);
        assert!(vn_avg.abs() < 1e-13);
    }

    #[test]
    fn test_adiabatic_wall_no_slip() {
        let p = phys();
        let ul = interior();
        let g = BoundaryRule::AdiabaticWall { wall_velocity: 0.0 }
            .ghost_state(&p, &p.freestream(0.0), &ul, N, MID);
        // 全速度反向，温度保持内部值
        let v = g.velocity();
        let vi = ul.velocity();
        assert!((v + vi).length() < 1e-13);
        assert!((p.temperature(&g) - p.temperature(&ul)).abs() < 1e-12);
    }

    #[test]
    fn test_isothermal_wall_temperature() {
        let p = phys();
        let ul = interior();
        let tw = 1.3;
        let g = BoundaryRule::IsothermalWall {
            temperature: tw,
            wall_velocity: 0.0,
        }
        .ghost_state(&p, &p.freestream(0.0), &ul, N, MID);
        assert!((p.temperature(&g) - tw).abs() < 1e-12);
        assert!((g.velocity() + ul.velocity()).length() < 1e-13);
    }

    #[test]
    fn test_isothermal_pressure_wall() {
        let p = phys();
        let ul = interior();
        let (tw, pw) = (1.2, 2.0);
        let g = BoundaryRule::IsothermalPressureWall {
            temperature: tw,
            wall_velocity: 0.0,
            pressure: pw,
        }
        .ghost_state(&p, &p.freestream(0.0), &ul, N, MID);
        assert!((p.temperature(&g) - tw).abs() < 1e-12);
        assert!((p.pressure(&g) - pw).abs() < 1e-12);
    }

    #[test]
    fn test_moving_wall_tangential_velocity() {
        let p = phys();
        let ul = interior();
        let vw = 0.5;
        let g = BoundaryRule::AdiabaticWall { wall_velocity: vw }
            .ghost_state(&p, &p.freestream(0.0), &ul, N, MID);
        // 面平均切向速度 = 壁速；n = x 方向时切向为 y
        let vt_avg = 0.5 * (g.velocity().y + ul.velocity().y);
        assert!((vt_avg - vw).abs() < 1e-13);
    }

    #[test]
    fn test_farfield_always_freestream() {
        let p = phys();
        let uinf = p.freestream(0.1);
        let g = BoundaryRule::FarField.ghost_state(&p, &uinf, &interior(), N, MID);
        assert_eq!(g, uinf);
    }

    #[test]
    fn test_inflow_outflow_subsonic_takes_freestream() {
        let p = phys();
        let uinf = p.freestream(0.0);
        let ul = interior(); // 亚声速
        let g = BoundaryRule::InflowOutflow {
            characteristic: false,
        }
        .ghost_state(&p, &uinf, &ul, N, MID);
        assert_eq!(g, uinf);
    }

    #[test]
    fn test_inflow_outflow_supersonic_extrapolates() {
        let p = IdealGasPhysics::new(1.4, 2.0);
        let uinf = p.freestream(0.0);
        let ul = p.prim_to_cons(&PrimState::new(1.0, 3.0, 0.0, 0.9)); // 超声速出流
        let g = BoundaryRule::InflowOutflow {
            characteristic: false,
        }
        .ghost_state(&p, &uinf, &ul, N, MID);
        assert_eq!(g, ul);
    }

    #[test]
    fn test_characteristic_subsonic_outflow_pressure() {
        // 特征规则亚声速出流：动量取内部，内能取远场压强
        let p = phys();
        let uinf = p.freestream(0.0);
        let ul = interior();
        assert!(ul.normal_velocity(N) > 0.0);
        let g = BoundaryRule::InflowOutflow {
            characteristic: true,
        }
        .ghost_state(&p, &uinf, &ul, N, MID);
        assert_eq!(g.rho, ul.rho);
        assert_eq!(g.rho_vx, ul.rho_vx);
        assert!((p.pressure(&g) - p.pressure(&uinf)).abs() < 1e-12);
    }

    #[test]
    fn test_extrapolation_copies() {
        let p = phys();
        let ul = interior();
        let g = BoundaryRule::Extrapolation.ghost_state(&p, &p.freestream(0.0), &ul, N, MID);
        assert_eq!(g, ul);
    }

    #[test]
    fn test_vortex_state_at_inner_radius() {
        // r = r_i 处恢复内圈参数
        let u = supersonic_vortex_state(1.4, VORTEX_MI, VORTEX_RI, VORTEX_RHOI, VORTEX_RI);
        assert!((u.rho - VORTEX_RHOI).abs() < 1e-13);
        let v = (u.rho_vx / u.rho).abs();
        // v = c_i·M_i/r，ρ_i = 1 时 c_i = 1
        assert!((v - VORTEX_MI).abs() < 1e-12);
    }

    #[test]
    fn test_vortex_density_decreases_outward() {
        let u1 = supersonic_vortex_state(1.4, VORTEX_MI, VORTEX_RI, VORTEX_RHOI, 1.0);
        let u2 = supersonic_vortex_state(1.4, VORTEX_MI, VORTEX_RI, VORTEX_RHOI, 1.4);
        assert!(u2.rho > u1.rho);
    }

    #[test]
    fn test_boundary_set_from_config() {
        let cfg = FlowPhysicsConfig {
            flow_type: afv_config::FlowType::Euler,
            gamma: 1.4,
            alpha: 0.0,
            mach_inf: 0.38,
            reynolds_inf: 0.0,
            temperature_inf: 0.0,
            prandtl: 0.0,
            viscous: false,
            constant_viscosity: false,
            slipwall_marker: 2,
            farfield_marker: 4,
            inflow_outflow_marker: UNUSED_MARKER,
            extrapolation_marker: UNUSED_MARKER,
            periodic_markers: vec![7, 8],
            periodic_axis: "x".to_string(),
            isothermal_wall_marker: UNUSED_MARKER,
            adiabatic_wall_marker: UNUSED_MARKER,
            isothermal_pressure_wall_marker: UNUSED_MARKER,
            vortex_inflow_marker: UNUSED_MARKER,
            isothermal_wall_temperature: 1.0,
            isothermal_wall_velocity: 0.0,
            adiabatic_wall_velocity: 0.0,
            isothermal_pressure_wall_temperature: 1.0,
            isothermal_pressure_wall_velocity: 0.0,
            isothermal_pressure_wall_pressure: 1.0,
            characteristic_experimental: false,
        };
        let set = BoundarySet::from_config(&cfg);
        assert_eq!(set.rule(2), Some(&BoundaryRule::SlipWall));
        assert_eq!(set.rule(4), Some(&BoundaryRule::FarField));
        assert_eq!(set.rule(7), Some(&BoundaryRule::Periodic));
        assert_eq!(set.rule(99), None);
        assert_eq!(set.markers(), vec![2, 4, 7, 8]);
    }

    #[test]
    fn test_ghost_dependence_flags() {
        assert!(BoundaryRule::SlipWall.ghost_depends_on_interior());
        assert!(BoundaryRule::Extrapolation.ghost_depends_on_interior());
        assert!(!BoundaryRule::FarField.ghost_depends_on_interior());
        assert!(!BoundaryRule::VortexInflow.ghost_depends_on_interior());
    }
}
