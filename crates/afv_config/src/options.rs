// crates/afv_config/src/options.rs

//! 类型化求解器配置
//!
//! 从控制文件语法树提取出的不可变配置记录。构造完成后只读。
//!
//! 顶层块：`io`、`flow_conditions`、`bc`、`time`、
//! `spatial_discretization`、`pseudotime`，以及零散键
//! （如 `Jacobian_inviscid_flux`）。

use crate::error::{ConfigError, ConfigResult};
use crate::tree::ConfigBlock;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 未使用的边界标记哨兵值
pub const UNUSED_MARKER: i32 = -1;

// ============================================================
// 变体名称枚举
// ============================================================

/// 无黏数值通量名称
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FluxName {
    /// 局部 Lax-Friedrichs
    Llf,
    /// Van Leer 通量分裂
    VanLeer,
    /// HLL
    Hll,
    /// HLLC
    Hllc,
    /// Roe
    Roe,
}

impl FluxName {
    /// 大小写不敏感解析
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "llf" => Some(Self::Llf),
            "vanleer" => Some(Self::VanLeer),
            "hll" => Some(Self::Hll),
            "hllc" => Some(Self::Hllc),
            "roe" => Some(Self::Roe),
            _ => None,
        }
    }
}

/// 梯度重构方法名称
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GradientName {
    /// 常量重构（一阶）
    None,
    /// 加权最小二乘
    LeastSquares,
    /// Green-Gauss
    GreenGauss,
}

impl GradientName {
    /// 大小写不敏感解析
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "none" => Some(Self::None),
            "leastsquares" => Some(Self::LeastSquares),
            "greengauss" => Some(Self::GreenGauss),
            _ => None,
        }
    }
}

/// 斜率限制器名称
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LimiterName {
    /// 不限制
    None,
    /// WENO 型梯度加权
    Weno,
    /// Van Albada
    VanAlbada,
    /// Barth-Jespersen
    BarthJespersen,
    /// Venkatakrishnan
    Venkatakrishnan,
}

impl LimiterName {
    /// 大小写不敏感解析
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "none" => Some(Self::None),
            "weno" => Some(Self::Weno),
            "vanalbada" => Some(Self::VanAlbada),
            "barthjespersen" => Some(Self::BarthJespersen),
            "venkatakrishnan" => Some(Self::Venkatakrishnan),
            _ => None,
        }
    }
}

/// 流动类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowType {
    /// 无黏
    Euler,
    /// 层流 Navier-Stokes
    NavierStokes,
}

/// 伪时间推进方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SteppingKind {
    /// 显式前向 Euler
    Explicit,
    /// 隐式后向 Euler
    Implicit,
}

/// 预条件器名称
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PreconditionerName {
    /// 块 Jacobi
    Jacobi,
    /// 块对称 Gauss-Seidel
    Sgs,
}

/// 重构变量空间
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReconstructionVars {
    /// 守恒变量
    Conservative,
    /// 原始变量
    Primitive,
}

/// 块稀疏矩阵存储格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatrixStorageName {
    /// 非对角块按内部面索引（"d" 格式）
    FaceIndexed,
    /// 通用块 CSR
    Csr,
}

// ============================================================
// 配置记录
// ============================================================

/// IO 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IoOptions {
    /// 网格路径；"from-cmd" 表示取自命令行
    pub mesh_file: String,
    /// 体输出 VTU 路径
    pub solution_output_file: String,
    /// 残差历史文件前缀
    pub log_file_prefix: String,
    /// 是否输出收敛历史
    pub convergence_history_required: bool,
}

/// 网格路径取自命令行的哨兵值
pub const MESH_FROM_CMD: &str = "from-cmd";

/// 流动物理配置
///
/// 攻角在解析时由度转为弧度。标记为 [`UNUSED_MARKER`] 的边界不启用。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowPhysicsConfig {
    /// 流动类型
    pub flow_type: FlowType,
    /// 比热比 γ
    pub gamma: f64,
    /// 攻角 [rad]
    pub alpha: f64,
    /// 来流 Mach 数
    pub mach_inf: f64,
    /// 来流 Reynolds 数（黏性）
    pub reynolds_inf: f64,
    /// 来流温度（黏性，量纲化，用于 Sutherland）
    pub temperature_inf: f64,
    /// Prandtl 数
    pub prandtl: f64,
    /// 是否黏性
    pub viscous: bool,
    /// 是否使用常黏性系数
    pub constant_viscosity: bool,

    /// 滑移壁标记
    pub slipwall_marker: i32,
    /// 远场标记
    pub farfield_marker: i32,
    /// 入流出流标记
    pub inflow_outflow_marker: i32,
    /// 零梯度外推标记
    pub extrapolation_marker: i32,
    /// 周期标记（可多个）
    pub periodic_markers: Vec<i32>,
    /// 周期平移轴标签（"x"/"y"）
    pub periodic_axis: String,
    /// 等温壁标记
    pub isothermal_wall_marker: i32,
    /// 绝热壁标记
    pub adiabatic_wall_marker: i32,
    /// 等温定压壁标记
    pub isothermal_pressure_wall_marker: i32,
    /// 超声速涡入流标记（解析算例）
    pub vortex_inflow_marker: i32,

    /// 等温壁温度设定值（无量纲）
    pub isothermal_wall_temperature: f64,
    /// 等温壁切向速度设定值
    pub isothermal_wall_velocity: f64,
    /// 绝热壁切向速度设定值
    pub adiabatic_wall_velocity: f64,
    /// 等温定压壁温度
    pub isothermal_pressure_wall_temperature: f64,
    /// 等温定压壁切向速度
    pub isothermal_pressure_wall_velocity: f64,
    /// 等温定压壁压强
    pub isothermal_pressure_wall_pressure: f64,

    /// 是否启用实验性特征边界（见 DESIGN.md 未决问题）
    pub characteristic_experimental: bool,
}

/// 空间离散数值配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowNumericsConfig {
    /// 残差使用的无黏通量
    pub inviscid_flux: FluxName,
    /// Jacobian 使用的无黏通量；None 表示与残差一致（"consistent"）
    pub jacobian_flux: Option<FluxName>,
    /// 梯度重构方法
    pub gradient: GradientName,
    /// 斜率限制器
    pub limiter: LimiterName,
    /// 限制器参数（Venkatakrishnan 的 K 等）
    pub limiter_parameter: f64,
    /// 二阶开关；gradient == None 时为假
    pub second_order: bool,
    /// 重构变量空间
    pub reconstruction_vars: ReconstructionVars,
}

impl FlowNumericsConfig {
    /// Jacobian 通量（"consistent" 映射为残差通量）
    pub fn jacobian_flux_resolved(&self) -> FluxName {
        self.jacobian_flux.unwrap_or(self.inviscid_flux)
    }
}

/// 单阶段伪时间配置（starter 或 main）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SteadyStageConfig {
    /// 初始 CFL
    pub cfl_min: f64,
    /// 终止 CFL
    pub cfl_max: f64,
    /// CFL 渐升起始步
    pub ramp_start: usize,
    /// CFL 渐升终止步
    pub ramp_end: usize,
    /// 非线性收敛容差（相对残差）
    pub tolerance: f64,
    /// 最大伪时间步数
    pub max_timesteps: usize,
}

/// 伪时间推进配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PseudoTimeOptions {
    /// 显式 / 隐式
    pub stepping: SteppingKind,
    /// 是否运行 starter 阶段
    pub use_starter: bool,
    /// 主阶段
    pub main: SteadyStageConfig,
    /// starter 阶段（一阶空间离散，松容差）
    pub initialization: SteadyStageConfig,
    /// 是否使用矩阵自由 Jacobian-向量积
    pub use_matrix_free: bool,
    /// 块稀疏矩阵存储格式
    pub matrix_storage: MatrixStorageName,
    /// 线性求解相对容差
    pub lin_tolerance: f64,
    /// 渐升起点处的线性迭代上限
    pub lin_max_iter_start: usize,
    /// 渐升终点处的线性迭代上限
    pub lin_max_iter_end: usize,
    /// 预条件器
    pub preconditioner: PreconditionerName,
    /// 预条件构建扫掠数
    pub nbuildsweeps: usize,
    /// 预条件应用扫掠数
    pub napplysweeps: usize,
    /// 显式模式的隐式残差光顺
    pub residual_smoothing: bool,
}

/// 表面输出配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurfaceOutputOptions {
    /// 输出气动系数的壁面标记
    pub wall_markers: Vec<i32>,
    /// 其它需要输出的边界标记
    pub other_markers: Vec<i32>,
    /// 表面输出文件前缀
    pub file_prefix: String,
}

/// 控制文件的全部解析结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowParserOptions {
    /// IO 配置
    pub io: IoOptions,
    /// 物理配置
    pub physics: FlowPhysicsConfig,
    /// 数值配置
    pub numerics: FlowNumericsConfig,
    /// 伪时间配置
    pub pseudotime: PseudoTimeOptions,
    /// 表面输出配置
    pub surface_output: SurfaceOutputOptions,
}

impl FlowParserOptions {
    /// 从控制文件解析
    pub fn from_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let root = ConfigBlock::from_file(path)?;
        Self::from_tree(&root)
    }

    /// 从文本解析（include 相对 `base` 解析）
    pub fn from_text(text: &str, base: &Path) -> ConfigResult<Self> {
        let root = ConfigBlock::from_text(text, base)?;
        Self::from_tree(&root)
    }

    /// 从语法树提取
    pub fn from_tree(root: &ConfigBlock) -> ConfigResult<Self> {
        let io_blk = root.block("io")?;
        let io = IoOptions {
            mesh_file: io_blk.get_str("mesh_file")?,
            solution_output_file: io_blk.get_str_or("solution_output_file", "solution.vtu")?,
            log_file_prefix: io_blk.get_str_or("log_file_prefix", "run")?,
            convergence_history_required: io_blk
                .get_bool_or("convergence_history_required", true)?,
        };

        // time 块：核心仅支持定常
        if let Some(time) = root.block_opt("time") {
            let sim = time.get_str_or("simulation_type", "steady")?;
            if sim.to_lowercase() != "steady" {
                return Err(ConfigError::UnknownValue {
                    key: "time.simulation_type".to_string(),
                    value: sim,
                });
            }
        }

        let physics = Self::extract_physics(root.block("flow_conditions")?, root.block("bc")?)?;
        let numerics = Self::extract_numerics(root)?;
        let pseudotime = Self::extract_pseudotime(root.block("pseudotime")?)?;

        let bc = root.block("bc")?;
        let surface_output = SurfaceOutputOptions {
            wall_markers: bc.get_i32_list_or_empty("listof_output_wall_boundaries")?,
            other_markers: bc.get_i32_list_or_empty("listof_output_other_boundaries")?,
            file_prefix: bc.get_str_or("surface_output_file_prefix", "surf")?,
        };

        Ok(Self {
            io,
            physics,
            numerics,
            pseudotime,
            surface_output,
        })
    }

    fn extract_physics(
        fc: &ConfigBlock,
        bc: &ConfigBlock,
    ) -> ConfigResult<FlowPhysicsConfig> {
        let flow_type_s = fc.get_str("flow_type")?;
        let flow_type = match flow_type_s.to_lowercase().as_str() {
            "euler" => FlowType::Euler,
            "navierstokes" => FlowType::NavierStokes,
            _ => {
                return Err(ConfigError::UnknownValue {
                    key: "flow_conditions.flow_type".to_string(),
                    value: flow_type_s,
                })
            }
        };
        let viscous = flow_type == FlowType::NavierStokes;

        Ok(FlowPhysicsConfig {
            flow_type,
            gamma: fc.get_f64_or("adiabatic_index", 1.4)?,
            alpha: fc.get_f64_or("angle_of_attack", 0.0)?.to_radians(),
            mach_inf: fc.get_f64("freestream_Mach_number")?,
            reynolds_inf: if viscous {
                fc.get_f64("freestream_Reynolds_number")?
            } else {
                0.0
            },
            temperature_inf: if viscous {
                fc.get_f64("freestream_temperature")?
            } else {
                0.0
            },
            prandtl: if viscous {
                fc.get_f64("Prandtl_number")?
            } else {
                0.0
            },
            viscous,
            constant_viscosity: fc.get_bool_or("use_constant_viscosity", false)?,

            slipwall_marker: bc.get_i32_or("slipwall_marker", UNUSED_MARKER)?,
            farfield_marker: bc.get_i32_or("farfield_marker", UNUSED_MARKER)?,
            inflow_outflow_marker: bc.get_i32_or("inflow_outflow_marker", UNUSED_MARKER)?,
            extrapolation_marker: bc.get_i32_or("extrapolation_marker", UNUSED_MARKER)?,
            periodic_markers: bc.get_i32_list_or_empty("periodic_markers")?,
            periodic_axis: bc.get_str_or("periodic_axis", "x")?,
            isothermal_wall_marker: bc.get_i32_or("isothermal_wall_marker", UNUSED_MARKER)?,
            adiabatic_wall_marker: bc.get_i32_or("adiabatic_wall_marker", UNUSED_MARKER)?,
            isothermal_pressure_wall_marker: bc
                .get_i32_or("isothermal_pressure_wall_marker", UNUSED_MARKER)?,
            vortex_inflow_marker: bc.get_i32_or("vortex_inflow_marker", UNUSED_MARKER)?,

            isothermal_wall_temperature: bc.get_f64_or("isothermal_wall_temperature", 1.0)?,
            isothermal_wall_velocity: bc.get_f64_or("isothermal_wall_velocity", 0.0)?,
            adiabatic_wall_velocity: bc.get_f64_or("adiabatic_wall_velocity", 0.0)?,
            isothermal_pressure_wall_temperature: bc
                .get_f64_or("isothermal_pressure_wall_temperature", 1.0)?,
            isothermal_pressure_wall_velocity: bc
                .get_f64_or("isothermal_pressure_wall_velocity", 0.0)?,
            isothermal_pressure_wall_pressure: bc
                .get_f64_or("isothermal_pressure_wall_pressure", 1.0)?,

            characteristic_experimental: bc.get_bool_or("characteristic_experimental", false)?,
        })
    }

    fn extract_numerics(root: &ConfigBlock) -> ConfigResult<FlowNumericsConfig> {
        let sd = root.block("spatial_discretization")?;

        let flux_s = sd.get_str("inviscid_flux")?;
        let inviscid_flux = FluxName::parse(&flux_s).ok_or_else(|| ConfigError::UnknownValue {
            key: "spatial_discretization.inviscid_flux".to_string(),
            value: flux_s,
        })?;

        let grad_s = sd.get_str_or("gradient_method", "none")?;
        let gradient = GradientName::parse(&grad_s).ok_or_else(|| ConfigError::UnknownValue {
            key: "spatial_discretization.gradient_method".to_string(),
            value: grad_s,
        })?;

        let lim_s = sd.get_str_or("limiter", "none")?;
        let limiter = LimiterName::parse(&lim_s).ok_or_else(|| ConfigError::UnknownValue {
            key: "spatial_discretization.limiter".to_string(),
            value: lim_s,
        })?;

        // 零散顶层键；"consistent" 表示与残差通量一致
        let jacobian_flux = if root.contains("Jacobian_inviscid_flux") {
            let s = root.get_str("Jacobian_inviscid_flux")?;
            if s.to_lowercase() == "consistent" {
                None
            } else {
                Some(FluxName::parse(&s).ok_or_else(|| ConfigError::UnknownValue {
                    key: "Jacobian_inviscid_flux".to_string(),
                    value: s,
                })?)
            }
        } else {
            None
        };

        let recvars_s = sd.get_str_or("reconstruction_variables", "conservative")?;
        let reconstruction_vars = match recvars_s.to_lowercase().as_str() {
            "conservative" => ReconstructionVars::Conservative,
            "primitive" => ReconstructionVars::Primitive,
            _ => {
                return Err(ConfigError::UnknownValue {
                    key: "spatial_discretization.reconstruction_variables".to_string(),
                    value: recvars_s,
                })
            }
        };

        Ok(FlowNumericsConfig {
            inviscid_flux,
            jacobian_flux,
            gradient,
            limiter,
            limiter_parameter: sd.get_f64_or("limiter_parameter", 4.0)?,
            second_order: gradient != GradientName::None,
            reconstruction_vars,
        })
    }

    fn extract_pseudotime(pt: &ConfigBlock) -> ConfigResult<PseudoTimeOptions> {
        let kind_s = pt.get_str("pseudotime_stepping_type")?;
        let stepping = match kind_s.to_lowercase().as_str() {
            "explicit" => SteppingKind::Explicit,
            "implicit" => SteppingKind::Implicit,
            _ => {
                return Err(ConfigError::UnknownValue {
                    key: "pseudotime.pseudotime_stepping_type".to_string(),
                    value: kind_s,
                })
            }
        };

        let main = Self::extract_stage(pt.block("main")?)?;
        let (initialization, has_init) = match pt.block_opt("initialization") {
            Some(b) => (Self::extract_stage(b)?, true),
            None => (
                SteadyStageConfig {
                    cfl_min: main.cfl_min,
                    cfl_max: main.cfl_min,
                    ramp_start: 0,
                    ramp_end: 0,
                    tolerance: 1e-1,
                    max_timesteps: 0,
                },
                false,
            ),
        };

        Ok(PseudoTimeOptions {
            stepping,
            use_starter: pt.get_bool_or("use_starter", has_init)?,
            main,
            initialization,
            use_matrix_free: pt.get_bool_or("use_matrix_free", false)?,
            matrix_storage: match pt.get_str_or("matrix_storage", "face")?.to_lowercase().as_str()
            {
                "face" | "d" => MatrixStorageName::FaceIndexed,
                "csr" => MatrixStorageName::Csr,
                other => {
                    return Err(ConfigError::UnknownValue {
                        key: "pseudotime.matrix_storage".to_string(),
                        value: other.to_string(),
                    })
                }
            },
            lin_tolerance: pt.get_f64_or("lin_tolerance", 1e-3)?,
            lin_max_iter_start: pt.get_usize_or("lin_max_iter_start", 30)?,
            lin_max_iter_end: pt.get_usize_or("lin_max_iter_end", 80)?,
            preconditioner: match pt.get_str_or("preconditioner", "sgs")?.to_lowercase().as_str()
            {
                "jacobi" => PreconditionerName::Jacobi,
                "sgs" => PreconditionerName::Sgs,
                other => {
                    return Err(ConfigError::UnknownValue {
                        key: "pseudotime.preconditioner".to_string(),
                        value: other.to_string(),
                    })
                }
            },
            nbuildsweeps: pt.get_usize_or("nbuildsweeps", 1)?,
            napplysweeps: pt.get_usize_or("napplysweeps", 2)?,
            residual_smoothing: pt.get_bool_or("residual_smoothing", false)?,
        })
    }

    fn extract_stage(b: &ConfigBlock) -> ConfigResult<SteadyStageConfig> {
        let cfl_min = b.get_f64("cfl_min")?;
        let cfl_max = b.get_f64_or("cfl_max", cfl_min)?;
        Ok(SteadyStageConfig {
            cfl_min,
            cfl_max,
            ramp_start: b.get_usize_or("ramp_start", 0)?,
            ramp_end: b.get_usize_or("ramp_end", 0)?,
            tolerance: b.get_f64("tolerance")?,
            max_timesteps: b.get_usize("max_timesteps")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONTROL: &str = r#"
io {
    mesh_file "from-cmd"
    solution_output_file "cyl.vtu"
    log_file_prefix "cyl"
    convergence_history_required true
}
flow_conditions {
    flow_type euler
    adiabatic_index 1.4
    angle_of_attack 0.0
    freestream_Mach_number 0.38
}
bc {
    slipwall_marker 2
    farfield_marker 4
    listof_output_wall_boundaries 2
    surface_output_file_prefix "cyl-surf"
}
time {
    simulation_type steady
}
spatial_discretization {
    inviscid_flux ROE
    gradient_method leastSquares
    limiter NONE
    limiter_parameter 4.0
}
pseudotime {
    pseudotime_stepping_type implicit
    main {
        cfl_min 100
        cfl_max 2000
        ramp_start 20
        ramp_end 60
        tolerance 1e-5
        max_timesteps 500
    }
    initialization {
        cfl_min 25
        cfl_max 250
        tolerance 1e-1
        max_timesteps 250
    }
}
Jacobian_inviscid_flux consistent
"#;

    fn parse(text: &str) -> FlowParserOptions {
        FlowParserOptions::from_text(text, Path::new(".")).unwrap()
    }

    #[test]
    fn test_full_control_file() {
        let opts = parse(CONTROL);
        assert_eq!(opts.io.mesh_file, MESH_FROM_CMD);
        assert_eq!(opts.physics.flow_type, FlowType::Euler);
        assert!(!opts.physics.viscous);
        assert_eq!(opts.physics.slipwall_marker, 2);
        assert_eq!(opts.physics.farfield_marker, 4);
        assert_eq!(opts.numerics.inviscid_flux, FluxName::Roe);
        assert_eq!(opts.numerics.gradient, GradientName::LeastSquares);
        assert!(opts.numerics.second_order);
        assert_eq!(opts.pseudotime.stepping, SteppingKind::Implicit);
        assert!(opts.pseudotime.use_starter);
        assert_eq!(opts.pseudotime.main.max_timesteps, 500);
        assert_eq!(opts.pseudotime.initialization.cfl_min, 25.0);
        assert_eq!(opts.surface_output.wall_markers, vec![2]);
    }

    #[test]
    fn test_consistent_jacobian_flux() {
        let opts = parse(CONTROL);
        assert_eq!(opts.numerics.jacobian_flux, None);
        assert_eq!(opts.numerics.jacobian_flux_resolved(), FluxName::Roe);
    }

    #[test]
    fn test_explicit_jacobian_flux() {
        let text = CONTROL.replace(
            "Jacobian_inviscid_flux consistent",
            "Jacobian_inviscid_flux LLF",
        );
        let opts = parse(&text);
        assert_eq!(opts.numerics.jacobian_flux_resolved(), FluxName::Llf);
    }

    #[test]
    fn test_case_insensitive_names() {
        assert_eq!(FluxName::parse("hllc"), Some(FluxName::Hllc));
        assert_eq!(FluxName::parse("HLLC"), Some(FluxName::Hllc));
        assert_eq!(FluxName::parse("VanLeer"), Some(FluxName::VanLeer));
        assert_eq!(GradientName::parse("greengauss"), Some(GradientName::GreenGauss));
        assert_eq!(
            LimiterName::parse("venkatakrishnan"),
            Some(LimiterName::Venkatakrishnan)
        );
        assert_eq!(FluxName::parse("upwind"), None);
    }

    #[test]
    fn test_unsteady_rejected() {
        let text = CONTROL.replace("simulation_type steady", "simulation_type unsteady");
        let err = FlowParserOptions::from_text(&text, Path::new(".")).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownValue { .. }));
    }

    #[test]
    fn test_alpha_in_radians() {
        let text = CONTROL.replace("angle_of_attack 0.0", "angle_of_attack 90.0");
        let opts = parse(&text);
        assert!((opts.physics.alpha - std::f64::consts::FRAC_PI_2).abs() < 1e-14);
    }

    #[test]
    fn test_navierstokes_requires_parameters() {
        let text = CONTROL.replace("flow_type euler", "flow_type navierstokes");
        // 缺 Reynolds 数等应报缺失
        let err = FlowParserOptions::from_text(&text, Path::new(".")).unwrap_err();
        assert!(matches!(err, ConfigError::Missing { .. }));
    }

    #[test]
    fn test_no_starter_without_init_block() {
        let start = CONTROL.find("    initialization {").unwrap();
        let end = CONTROL[start..].find("\n    }").unwrap() + start + 6;
        let text = format!("{}{}", &CONTROL[..start], &CONTROL[end..]);
        let opts = parse(&text);
        assert!(!opts.pseudotime.use_starter);
    }
}
