// crates/afv_physics/src/spatial/flow.rs

//! 流动方程的有限体积空间离散
//!
//! 每个非线性步的数据流：单元状态 → 边界幽灵状态 →（可选）
//! 重构 + 限制 → 左右面值 → 数值通量与最大波速积分 → 单元残差
//! 与局部时间步。隐式模式另外把 ∂R/∂u 装配进块稀疏算子。
//!
//! 面循环按面并行，共享单元的累加用原子操作；Jacobian 装配
//! 先并行算块、后串行散布（收集后累加）。

use crate::boundary::{supersonic_vortex_initial_velocity, BoundarySet};
use crate::numerics::atomic::AtomicF64Slice;
use crate::numerics::gradient::GradientScheme;
use crate::numerics::limiter::FaceReconstruction;
use crate::numerics::linear_algebra::{
    block_scaled_identity, Block, BlockMatrix, SubmitPosition,
};
use crate::physics::IdealGasPhysics;
use crate::schemes::riemann::InviscidFluxScheme;
use crate::spatial::viscous::{
    face_gradient_state, viscous_flux, viscous_wave_speed, ViscousParams,
};
use crate::spatial::SpatialDiscretization;
use crate::state::{ConsState, NVARS_FLOW};
use afv_config::{FlowNumericsConfig, FlowPhysicsConfig, ReconstructionVars};
use afv_mesh::{FvMesh, MeshError, MeshResult};
use glam::DVec2;
use rayon::prelude::*;

/// 每条面的重构点数
const NGAUSS: usize = 1;

/// 孤立单元（波速积分为零）的时间步上限
const DT_CAP: f64 = 1e30;

/// 幽灵中心策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GhostCenterPolicy {
    /// 关于面中点反射（默认）
    #[default]
    MidpointReflection,
    /// 关于面所在直线反射
    FaceReflection,
}

/// 流动空间离散
///
/// 借用网格；拥有通量、重构、限制器、物理与来流参考。
#[derive(Debug)]
pub struct FlowSpatial<'m> {
    mesh: &'m FvMesh,
    phys: IdealGasPhysics,
    uinf: ConsState,
    alpha: f64,
    flux: InviscidFluxScheme,
    jflux: InviscidFluxScheme,
    gradient: GradientScheme,
    limiter: FaceReconstruction,
    bcs: BoundarySet,
    second_order: bool,
    reconstruct_primitive: bool,
    viscous: Option<ViscousParams>,
    /// 按边界面索引的幽灵中心
    ghost_centers: Vec<DVec2>,
    /// 每面一个重构点
    gauss: Vec<DVec2>,
}

impl<'m> FlowSpatial<'m> {
    /// 创建
    ///
    /// 网格中出现的每个边界标记都必须在 `bc` 配置中有规则，
    /// 否则报 [`MeshError::UnknownMarker`]。
    pub fn new(
        mesh: &'m FvMesh,
        physics_cfg: &FlowPhysicsConfig,
        numerics: &FlowNumericsConfig,
        ghost_policy: GhostCenterPolicy,
    ) -> MeshResult<Self> {
        let phys = IdealGasPhysics::with_temperature(
            physics_cfg.gamma,
            physics_cfg.mach_inf,
            physics_cfg.temperature_inf,
        );
        let bcs = BoundarySet::from_config(physics_cfg);
        for marker in mesh.markers() {
            if bcs.rule(marker).is_none() {
                return Err(MeshError::UnknownMarker { marker });
            }
        }

        let ghost_centers = compute_ghost_centers(mesh, ghost_policy);
        let gauss = compute_gauss_points(mesh);

        let viscous = physics_cfg.viscous.then(|| ViscousParams {
            reynolds: physics_cfg.reynolds_inf,
            prandtl: physics_cfg.prandtl,
            constant_viscosity: physics_cfg.constant_viscosity,
        });

        Ok(Self {
            mesh,
            phys,
            uinf: phys.freestream(physics_cfg.alpha),
            alpha: physics_cfg.alpha,
            flux: InviscidFluxScheme::create(numerics.inviscid_flux, physics_cfg.gamma),
            jflux: InviscidFluxScheme::create(
                numerics.jacobian_flux_resolved(),
                physics_cfg.gamma,
            ),
            gradient: GradientScheme::create(numerics.gradient),
            limiter: FaceReconstruction::create(numerics.limiter, numerics.limiter_parameter),
            bcs,
            second_order: numerics.second_order,
            reconstruct_primitive: numerics.reconstruction_vars == ReconstructionVars::Primitive,
            viscous,
            ghost_centers,
            gauss,
        })
    }

    /// 网格引用
    pub fn mesh(&self) -> &FvMesh {
        self.mesh
    }

    /// 物理量换算
    pub fn physics(&self) -> &IdealGasPhysics {
        &self.phys
    }

    /// 来流参考状态
    pub fn freestream(&self) -> ConsState {
        self.uinf
    }

    /// 初始化未知量
    ///
    /// 默认全场取来流；`vortex` 为真时用超声速涡的切向速度场。
    pub fn initialize_unknowns(&self, vortex: bool) -> Vec<f64> {
        let n = self.mesh.n_cells();
        let mut u = vec![0.0; n * NVARS_FLOW];
        if vortex {
            let vmag = (self.uinf.rho_vx * self.uinf.rho_vx
                + self.uinf.rho_vy * self.uinf.rho_vy)
                .sqrt()
                / self.uinf.rho;
            for i in 0..n {
                let c = self.mesh.cell_center(i);
                let v = supersonic_vortex_initial_velocity(vmag, c.x, c.y);
                let s = ConsState::new(
                    self.uinf.rho,
                    self.uinf.rho * v.x,
                    self.uinf.rho * v.y,
                    self.uinf.rho_e,
                );
                s.write_to(&mut u[i * NVARS_FLOW..(i + 1) * NVARS_FLOW]);
            }
        } else {
            for i in 0..n {
                self.uinf
                    .write_to(&mut u[i * NVARS_FLOW..(i + 1) * NVARS_FLOW]);
            }
        }
        u
    }

    /// 由给定的左值计算边界面幽灵状态
    ///
    /// 周期面取配对单元的平均值；其余按标记规则。
    fn boundary_states(
        &self,
        u: &[[f64; NVARS_FLOW]],
        left_values: &[[f64; NVARS_FLOW]],
        out: &mut [[f64; NVARS_FLOW]],
    ) {
        for bf in 0..self.mesh.n_bfaces() {
            out[bf] = if let Some(pc) = self.mesh.face_periodic_cell(bf) {
                u[pc]
            } else {
                let face = self.mesh.face(bf);
                let rule = self
                    .bcs
                    .rule(face.marker)
                    .expect("marker validated at construction");
                let ul = ConsState::from_array(left_values[bf]);
                rule.ghost_state(
                    &self.phys,
                    &self.uinf,
                    &ul,
                    face.normal,
                    self.mesh.face_midpoint(bf),
                )
                .to_array()
            };
        }
    }

    /// 原始变量 (ρ, vx, vy, T)
    fn prim_t(&self, u: &ConsState) -> [f64; NVARS_FLOW] {
        [
            u.rho,
            u.rho_vx / u.rho,
            u.rho_vy / u.rho,
            self.phys.temperature(u),
        ]
    }

    /// 计算左右面值（二阶路径）
    fn reconstruct_faces(
        &self,
        u: &[[f64; NVARS_FLOW]],
        ug: &[[f64; NVARS_FLOW]],
        uleft: &mut [[f64; NVARS_FLOW]],
        uright: &mut [[f64; NVARS_FLOW]],
    ) {
        let n_cells = self.mesh.n_cells();
        let n_bfaces = self.mesh.n_bfaces();

        // 可配置的重构空间：原始变量重构先转换，面值再转回守恒
        let (vals, gvals): (Vec<[f64; NVARS_FLOW]>, Vec<[f64; NVARS_FLOW]>) =
            if self.reconstruct_primitive {
                (
                    u.iter()
                        .map(|a| {
                            self.phys
                                .cons_to_prim(&ConsState::from_array(*a))
                                .to_array()
                        })
                        .collect(),
                    ug.iter()
                        .map(|a| {
                            self.phys
                                .cons_to_prim(&ConsState::from_array(*a))
                                .to_array()
                        })
                        .collect(),
                )
            } else {
                (u.to_vec(), ug.to_vec())
            };

        let mut dudx = vec![[0.0; NVARS_FLOW]; n_cells];
        let mut dudy = vec![[0.0; NVARS_FLOW]; n_cells];
        self.gradient.compute(
            self.mesh,
            &vals,
            &gvals,
            &self.ghost_centers,
            &mut dudx,
            &mut dudy,
        );
        self.limiter.compute_face_values(
            self.mesh,
            &self.gauss,
            &vals,
            &gvals,
            &self.ghost_centers,
            &dudx,
            &dudy,
            uleft,
            uright,
        );

        if self.reconstruct_primitive {
            for (fi, ul) in uleft.iter_mut().enumerate() {
                *ul = self
                    .phys
                    .prim_to_cons(&crate::state::PrimState::from_array(*ul))
                    .to_array();
                if fi >= n_bfaces {
                    uright[fi] = self
                        .phys
                        .prim_to_cons(&crate::state::PrimState::from_array(uright[fi]))
                        .to_array();
                }
            }
        }
    }
}

/// 幽灵中心坐标
fn compute_ghost_centers(mesh: &FvMesh, policy: GhostCenterPolicy) -> Vec<DVec2> {
    (0..mesh.n_bfaces())
        .map(|bf| {
            let face = mesh.face(bf);
            let rc = mesh.cell_center(face.left);
            match policy {
                // r_g + r_L = 2·midpoint
                GhostCenterPolicy::MidpointReflection => 2.0 * mesh.face_midpoint(bf) - rc,
                // 关于面直线反射：沿法向平移两倍法向距离
                GhostCenterPolicy::FaceReflection => {
                    let d = (mesh.face_midpoint(bf) - rc).dot(face.normal);
                    rc + 2.0 * d * face.normal
                }
            }
        })
        .collect()
}

/// 面重构点：端点之间按 (i+1)/(NGAUSS+1) 均布
fn compute_gauss_points(mesh: &FvMesh) -> Vec<DVec2> {
    (0..mesh.n_faces())
        .map(|fi| {
            let [a, b] = mesh.face(fi).nodes;
            let pa = mesh.node(a);
            let pb = mesh.node(b);
            let t = 1.0 / (NGAUSS as f64 + 1.0);
            pa + (pb - pa) * t
        })
        .collect()
}

impl SpatialDiscretization<NVARS_FLOW> for FlowSpatial<'_> {
    fn n_cells(&self) -> usize {
        self.mesh.n_cells()
    }

    fn cell_volume(&self, i: usize) -> f64 {
        self.mesh.cell_area(i)
    }

    fn compute_residual(&self, u_flat: &[f64], residual: &mut [f64], dtm: &mut [f64]) {
        let n_cells = self.mesh.n_cells();
        let n_faces = self.mesh.n_faces();
        let n_bfaces = self.mesh.n_bfaces();
        debug_assert_eq!(u_flat.len(), n_cells * NVARS_FLOW);

        let u: Vec<[f64; NVARS_FLOW]> = u_flat
            .chunks_exact(NVARS_FLOW)
            .map(|c| [c[0], c[1], c[2], c[3]])
            .collect();

        let mut uleft = vec![[0.0; NVARS_FLOW]; n_faces];
        let mut uright = vec![[0.0; NVARS_FLOW]; n_faces];
        let mut ug = vec![[0.0; NVARS_FLOW]; n_bfaces];

        // 边界面左值先取单元值（幽灵平均值由它得出）
        for bf in 0..n_bfaces {
            uleft[bf] = u[self.mesh.face(bf).left];
        }

        let need_ghosts = self.second_order || self.viscous.is_some();
        if need_ghosts {
            self.boundary_states(&u, &uleft, &mut ug);
        }

        if self.second_order {
            self.reconstruct_faces(&u, &ug, &mut uleft, &mut uright);
        } else {
            for fi in n_bfaces..n_faces {
                let face = self.mesh.face(fi);
                uleft[fi] = u[face.left];
                uright[fi] = u[face.right];
            }
        }

        // 边界面右值：由（可能重构过的）左值经边界规则
        {
            let (ur_b, _) = uright.split_at_mut(n_bfaces);
            self.boundary_states(&u, &uleft, ur_b);
        }

        // 黏性路径的原始变量梯度（始终守恒于单元平均值）
        let visc = self.viscous.as_ref().map(|params| {
            let wv: Vec<[f64; NVARS_FLOW]> = u
                .iter()
                .map(|a| self.prim_t(&ConsState::from_array(*a)))
                .collect();
            let wgv: Vec<[f64; NVARS_FLOW]> = ug
                .iter()
                .map(|a| self.prim_t(&ConsState::from_array(*a)))
                .collect();
            let scheme = if self.gradient == GradientScheme::Constant {
                GradientScheme::GreenGauss
            } else {
                self.gradient
            };
            let mut gvx = vec![[0.0; NVARS_FLOW]; n_cells];
            let mut gvy = vec![[0.0; NVARS_FLOW]; n_cells];
            scheme.compute(self.mesh, &wv, &wgv, &self.ghost_centers, &mut gvx, &mut gvy);
            (params, wv, wgv, gvx, gvy)
        });

        // 通量面循环：并行 + 原子累加
        let res_acc = AtomicF64Slice::zeroed(n_cells * NVARS_FLOW);
        let integ = AtomicF64Slice::zeroed(n_cells);

        (0..n_faces).into_par_iter().for_each(|fi| {
            let face = self.mesh.face(fi);
            let n = face.normal;
            let len = face.length;
            let ul = ConsState::from_array(uleft[fi]);
            let ur = ConsState::from_array(uright[fi]);

            let mut f = self.flux.flux(&ul, &ur, n);

            let mut wave_l = self.phys.max_wave_speed(&ul, n) * len;
            let mut wave_r = self.phys.max_wave_speed(&ur, n) * len;

            if let Some((params, wv, wgv, gvx, gvy)) = &visc {
                let l = face.left;
                let (wl, wr, glx, gly, grx, gry, dr) = if face.right < n_cells {
                    let r = face.right;
                    (
                        &wv[l],
                        &wv[r],
                        &gvx[l],
                        &gvy[l],
                        &gvx[r],
                        &gvy[r],
                        self.mesh.cell_center(r) - self.mesh.cell_center(l),
                    )
                } else {
                    (
                        &wv[l],
                        &wgv[fi],
                        &gvx[l],
                        &gvy[l],
                        &gvx[l],
                        &gvy[l],
                        self.ghost_centers[fi] - self.mesh.cell_center(l),
                    )
                };
                let fgs = face_gradient_state(wl, wr, glx, gly, grx, gry, dr);
                f = f + viscous_flux(&self.phys, params, &fgs, n);

                // viscous_wave_speed 已含 ℓ/d 因子，直接并入波速积分
                let wv_spd =
                    viscous_wave_speed(&self.phys, params, fgs.w[0], fgs.w[3], len, dr.length());
                wave_l += wv_spd;
                wave_r += wv_spd;
            }

            let f = f * len;
            let fa = f.to_array();
            for k in 0..NVARS_FLOW {
                res_acc.add(face.left * NVARS_FLOW + k, fa[k]);
            }
            integ.add(face.left, wave_l);
            if face.right < n_cells {
                for k in 0..NVARS_FLOW {
                    res_acc.add(face.right * NVARS_FLOW + k, -fa[k]);
                }
                integ.add(face.right, wave_r);
            }
        });

        for (i, r) in residual.iter_mut().enumerate() {
            *r = res_acc.get(i);
        }
        for (i, dt) in dtm.iter_mut().enumerate() {
            let w = integ.get(i);
            *dt = if w > 0.0 {
                self.mesh.cell_area(i) / w
            } else {
                DT_CAP
            };
        }
    }

    fn compute_jacobian(&self, u_flat: &[f64], mat: &mut BlockMatrix<NVARS_FLOW>) {
        let n_cells = self.mesh.n_cells();
        let n_faces = self.mesh.n_faces();
        let n_bfaces = self.mesh.n_bfaces();
        let u: Vec<ConsState> = u_flat
            .chunks_exact(NVARS_FLOW)
            .map(ConsState::from_slice)
            .collect();
        let storage = mat.storage();

        // 边界面：并行算块，串行散布
        let bjacs: Vec<(Block<NVARS_FLOW>, Block<NVARS_FLOW>, bool)> = (0..n_bfaces)
            .into_par_iter()
            .map(|bf| {
                let face = self.mesh.face(bf);
                let ul = u[face.left];
                let (ughost, depends) = match self.mesh.face_periodic_cell(bf) {
                    // 周期耦合不进入稀疏模式，只保留对角贡献
                    Some(pc) => (u[pc], false),
                    None => {
                        let rule = self
                            .bcs
                            .rule(face.marker)
                            .expect("marker validated at construction");
                        (
                            rule.ghost_state(
                                &self.phys,
                                &self.uinf,
                                &ul,
                                face.normal,
                                self.mesh.face_midpoint(bf),
                            ),
                            rule.ghost_depends_on_interior(),
                        )
                    }
                };
                let (mut jl, mut jr) = self.jflux.jacobian(&ul, &ughost, face.normal);
                scale_block(&mut jl, face.length);
                scale_block(&mut jr, face.length);
                (jl, jr, depends)
            })
            .collect();

        for (bf, (jl, jr, depends)) in bjacs.iter().enumerate() {
            let left = self.mesh.face(bf).left;
            mat.update_diag_block(left, jl);
            if *depends {
                // 幽灵灵敏度 ∂u_g/∂u_L ≈ I 折入对角
                mat.update_diag_block(left, jr);
            }
        }

        // 内部面
        let ijacs: Vec<(Block<NVARS_FLOW>, Block<NVARS_FLOW>)> = (n_bfaces..n_faces)
            .into_par_iter()
            .map(|fi| {
                let face = self.mesh.face(fi);
                let (mut jl, mut jr) =
                    self.jflux.jacobian(&u[face.left], &u[face.right], face.normal);
                scale_block(&mut jl, face.length);
                scale_block(&mut jr, face.length);
                (jl, jr)
            })
            .collect();

        for (k, (jl, jr)) in ijacs.iter().enumerate() {
            let fi = n_bfaces + k;
            let face = self.mesh.face(fi);
            let (l, r) = (face.left, face.right);

            // R_L += ℓF, R_R −= ℓF：
            //   D_L += ℓ∂F/∂u_L，A[L,R] += ℓ∂F/∂u_R
            //   D_R −= ℓ∂F/∂u_R，A[R,L] −= ℓ∂F/∂u_L
            mat.update_diag_block(l, jl);
            let mut neg_jr = *jr;
            scale_block(&mut neg_jr, -1.0);
            mat.update_diag_block(r, &neg_jr);

            let mut neg_jl = *jl;
            scale_block(&mut neg_jl, -1.0);
            match storage {
                crate::numerics::linear_algebra::StorageFlavor::FaceIndexed => {
                    mat.submit_block(l, r, jr, SubmitPosition::Upper { iface: k });
                    mat.submit_block(r, l, &neg_jl, SubmitPosition::Lower { iface: k });
                }
                crate::numerics::linear_algebra::StorageFlavor::General => {
                    mat.submit_block(l, r, jr, SubmitPosition::General);
                    mat.submit_block(r, l, &neg_jl, SubmitPosition::General);
                }
            }
        }

        // 黏性贡献按标量扩散谱半径近似
        if let Some(params) = &self.viscous {
            for fi in 0..n_faces {
                let face = self.mesh.face(fi);
                let l = face.left;
                let (rho_f, t_f, dist, right) = if face.right < n_cells {
                    let r = face.right;
                    (
                        0.5 * (u[l].rho + u[r].rho),
                        0.5 * (self.phys.temperature(&u[l]) + self.phys.temperature(&u[r])),
                        (self.mesh.cell_center(r) - self.mesh.cell_center(l)).length(),
                        Some(r),
                    )
                } else {
                    (
                        u[l].rho,
                        self.phys.temperature(&u[l]),
                        (self.ghost_centers[fi] - self.mesh.cell_center(l)).length(),
                        None,
                    )
                };
                let c = viscous_wave_speed(&self.phys, params, rho_f, t_f, face.length, dist);
                let diag = block_scaled_identity::<NVARS_FLOW>(c);
                mat.update_diag_block(l, &diag);
                if let Some(r) = right {
                    mat.update_diag_block(r, &diag);
                    let off = block_scaled_identity::<NVARS_FLOW>(-c);
                    let k = fi - n_bfaces;
                    match storage {
                        crate::numerics::linear_algebra::StorageFlavor::FaceIndexed => {
                            mat.submit_block(l, r, &off, SubmitPosition::Upper { iface: k });
                            mat.submit_block(r, l, &off, SubmitPosition::Lower { iface: k });
                        }
                        crate::numerics::linear_algebra::StorageFlavor::General => {
                            mat.submit_block(l, r, &off, SubmitPosition::General);
                            mat.submit_block(r, l, &off, SubmitPosition::General);
                        }
                    }
                }
            }
        }
    }
}

#[inline]
fn scale_block(b: &mut Block<NVARS_FLOW>, s: f64) {
    for row in b.iter_mut() {
        for v in row.iter_mut() {
            *v *= s;
        }
    }
}

// ============================================================
// 后处理
// ============================================================

/// 节点后处理输出
#[derive(Debug, Clone)]
pub struct NodalOutput {
    /// 节点密度
    pub density: Vec<f64>,
    /// 节点 Mach 数
    pub mach: Vec<f64>,
    /// 节点压强
    pub pressure: Vec<f64>,
    /// 节点速度
    pub velocity: Vec<DVec2>,
}

/// 表面系数输出
#[derive(Debug, Clone)]
pub struct SurfaceReport {
    /// 边界标记
    pub marker: i32,
    /// 升力系数
    pub cl: f64,
    /// 阻力系数
    pub cd: f64,
    /// 逐面 (x, y, cp)
    pub rows: Vec<(f64, f64, f64)>,
}

impl FlowSpatial<'_> {
    /// 面积加权散布到节点的后处理量
    pub fn postprocess_point(&self, u_flat: &[f64]) -> NodalOutput {
        let n_nodes = self.mesh.n_nodes();
        let mut up = vec![[0.0; NVARS_FLOW]; n_nodes];
        let mut areasum = vec![0.0; n_nodes];

        for ic in 0..self.mesh.n_cells() {
            let area = self.mesh.cell_area(ic);
            for &node in self.mesh.cell_nodes(ic) {
                for k in 0..NVARS_FLOW {
                    up[node][k] += u_flat[ic * NVARS_FLOW + k] * area;
                }
                areasum[node] += area;
            }
        }

        let mut density = Vec::with_capacity(n_nodes);
        let mut mach = Vec::with_capacity(n_nodes);
        let mut pressure = Vec::with_capacity(n_nodes);
        let mut velocity = Vec::with_capacity(n_nodes);
        for ip in 0..n_nodes {
            let inv = 1.0 / areasum[ip];
            let s = ConsState::new(
                up[ip][0] * inv,
                up[ip][1] * inv,
                up[ip][2] * inv,
                up[ip][3] * inv,
            );
            let v = s.velocity();
            let p = self.phys.pressure(&s);
            let c = self.phys.sound_speed(&s);
            density.push(s.rho);
            mach.push(v.length() / c);
            pressure.push(p);
            velocity.push(v);
        }

        NodalOutput {
            density,
            mach,
            pressure,
            velocity,
        }
    }

    /// 相对来流的熵误差（L2 面积加权）
    ///
    /// 返回 (log10 h, log10 误差)，h = 1/√N_cell，
    /// 供网格加密研究绘制收敛斜率。
    pub fn entropy_error(&self, u_flat: &[f64]) -> (f64, f64) {
        let sinf = self.phys.entropy(&self.uinf);
        let mut error = 0.0;
        for ic in 0..self.mesh.n_cells() {
            let s = ConsState::from_slice(&u_flat[ic * NVARS_FLOW..(ic + 1) * NVARS_FLOW]);
            let serr = (self.phys.entropy(&s) - sinf) / sinf;
            error += serr * serr * self.mesh.cell_area(ic);
        }
        let error = error.sqrt();
        let h = 1.0 / (self.mesh.n_cells() as f64).sqrt();
        (h.log10(), error.log10())
    }

    /// 单个壁面标记的气动系数
    ///
    /// 压强力按 (p − p∞) 对面积分；黏性算例再叠加壁面剪切。
    /// 参考动压 q∞ = ½ρ∞|v∞|²，参考弦长取 1。
    pub fn surface_report(&self, u_flat: &[f64], marker: i32) -> SurfaceReport {
        let u: Vec<ConsState> = u_flat
            .chunks_exact(NVARS_FLOW)
            .map(ConsState::from_slice)
            .collect();
        let pinf = self.phys.pressure(&self.uinf);
        let vinf2 = (self.uinf.rho_vx * self.uinf.rho_vx
            + self.uinf.rho_vy * self.uinf.rho_vy)
            / (self.uinf.rho * self.uinf.rho);
        let qinf = 0.5 * self.uinf.rho * vinf2;

        // 黏性时需要速度梯度求壁面剪切
        let visc_grads = self.viscous.as_ref().map(|params| {
            let wv: Vec<[f64; NVARS_FLOW]> =
                u.iter().map(|s| self.prim_t(s)).collect();
            let mut uleft = vec![[0.0; NVARS_FLOW]; self.mesh.n_bfaces()];
            for bf in 0..self.mesh.n_bfaces() {
                uleft[bf] = u[self.mesh.face(bf).left].to_array();
            }
            let mut ug = vec![[0.0; NVARS_FLOW]; self.mesh.n_bfaces()];
            let ucells: Vec<[f64; NVARS_FLOW]> = u.iter().map(|s| s.to_array()).collect();
            self.boundary_states(&ucells, &uleft, &mut ug);
            let wgv: Vec<[f64; NVARS_FLOW]> = ug
                .iter()
                .map(|a| self.prim_t(&ConsState::from_array(*a)))
                .collect();
            let scheme = if self.gradient == GradientScheme::Constant {
                GradientScheme::GreenGauss
            } else {
                self.gradient
            };
            let mut gvx = vec![[0.0; NVARS_FLOW]; self.mesh.n_cells()];
            let mut gvy = vec![[0.0; NVARS_FLOW]; self.mesh.n_cells()];
            scheme.compute(self.mesh, &wv, &wgv, &self.ghost_centers, &mut gvx, &mut gvy);
            (params, wv, wgv, gvx, gvy)
        });

        let mut force = DVec2::ZERO;
        let mut rows = Vec::new();
        for bf in 0..self.mesh.n_bfaces() {
            let face = self.mesh.face(bf);
            if face.marker != marker {
                continue;
            }
            let ul = &u[face.left];
            let p = self.phys.pressure(ul);
            let cp = (p - pinf) / qinf;
            force += (p - pinf) * face.length * face.normal;

            if let Some((params, wv, wgv, gvx, gvy)) = &visc_grads {
                let l = face.left;
                let dr = self.ghost_centers[bf] - self.mesh.cell_center(l);
                let fgs = face_gradient_state(
                    &wv[l], &wgv[bf], &gvx[l], &gvy[l], &gvx[l], &gvy[l], dr,
                );
                let fv = viscous_flux(&self.phys, params, &fgs, face.normal);
                // 壁面黏性通量的动量分量即 −τ·n
                force -= DVec2::new(fv.rho_vx, fv.rho_vy) * face.length;
            }

            let m = self.mesh.face_midpoint(bf);
            rows.push((m.x, m.y, cp));
        }

        let lift_dir = DVec2::new(-self.alpha.sin(), self.alpha.cos());
        let drag_dir = DVec2::new(self.alpha.cos(), self.alpha.sin());
        SurfaceReport {
            marker,
            cl: force.dot(lift_dir) / qinf,
            cd: force.dot(drag_dir) / qinf,
            rows,
        }
    }
}
