// crates/afv_physics/src/spatial/diffusion.rs

//! 标量扩散验证离散（NVARS = 1）
//!
//! ∇·(ν∇u) + f = 0 的伴随验证问题：与流动离散共用同一
//! [`SpatialDiscretization`] 契约、线性算子与伪时间驱动器，
//! 用制造解检验装配与求解管线。
//!
//! 面法向导数取两点差分 (u_R − u_L)/d；Dirichlet 边界以幽灵值
//! u_g = 2g − u_L 闭合，边界 Jacobian 按 ∂u_g/∂u_L = −1 精确折叠。

use crate::numerics::linear_algebra::{BlockMatrix, SubmitPosition, StorageFlavor};
use crate::spatial::SpatialDiscretization;
use afv_mesh::FvMesh;
use glam::DVec2;

/// 标量扩散空间离散
pub struct DiffusionSpatial<'m> {
    mesh: &'m FvMesh,
    nu: f64,
    source: Box<dyn Fn(DVec2) -> f64 + Sync>,
    dirichlet: Box<dyn Fn(DVec2) -> f64 + Sync>,
    ghost_centers: Vec<DVec2>,
}

impl<'m> DiffusionSpatial<'m> {
    /// 创建
    pub fn new(
        mesh: &'m FvMesh,
        nu: f64,
        source: Box<dyn Fn(DVec2) -> f64 + Sync>,
        dirichlet: Box<dyn Fn(DVec2) -> f64 + Sync>,
    ) -> Self {
        let ghost_centers = (0..mesh.n_bfaces())
            .map(|bf| 2.0 * mesh.face_midpoint(bf) - mesh.cell_center(mesh.face(bf).left))
            .collect();
        Self {
            mesh,
            nu,
            source,
            dirichlet,
            ghost_centers,
        }
    }

    /// 面扩散系数 νℓ/d
    fn face_coeff(&self, fi: usize) -> f64 {
        let face = self.mesh.face(fi);
        let rl = self.mesh.cell_center(face.left);
        let rr = if face.right < self.mesh.n_cells() {
            self.mesh.cell_center(face.right)
        } else {
            self.ghost_centers[fi]
        };
        self.nu * face.length / (rr - rl).length()
    }
}

impl SpatialDiscretization<1> for DiffusionSpatial<'_> {
    fn n_cells(&self) -> usize {
        self.mesh.n_cells()
    }

    fn cell_volume(&self, i: usize) -> f64 {
        self.mesh.cell_area(i)
    }

    fn compute_residual(&self, u: &[f64], residual: &mut [f64], dtm: &mut [f64]) {
        let n_cells = self.mesh.n_cells();
        residual.fill(0.0);
        let mut integ = vec![0.0; n_cells];

        for fi in 0..self.mesh.n_faces() {
            let face = self.mesh.face(fi);
            let l = face.left;
            let c = self.face_coeff(fi);
            let ur = if face.right < n_cells {
                u[face.right]
            } else {
                2.0 * (self.dirichlet)(self.mesh.face_midpoint(fi)) - u[l]
            };
            // φ = −ν(u_R − u_L)/d·ℓ
            let phi = -c * (ur - u[l]);
            residual[l] += phi;
            integ[l] += c;
            if face.right < n_cells {
                residual[face.right] -= phi;
                integ[face.right] += c;
            } else {
                // Dirichlet 幽灵：对 u_L 的有效系数翻倍
                integ[l] += c;
            }
        }

        for i in 0..n_cells {
            residual[i] -= self.mesh.cell_area(i) * (self.source)(self.mesh.cell_center(i));
            dtm[i] = if integ[i] > 0.0 {
                self.mesh.cell_area(i) / integ[i]
            } else {
                1e30
            };
        }
    }

    fn compute_jacobian(&self, _u: &[f64], mat: &mut BlockMatrix<1>) {
        let n_cells = self.mesh.n_cells();
        let n_bfaces = self.mesh.n_bfaces();
        let storage = mat.storage();

        for fi in 0..self.mesh.n_faces() {
            let face = self.mesh.face(fi);
            let l = face.left;
            let c = self.face_coeff(fi);

            if face.right < n_cells {
                let r = face.right;
                mat.update_diag_block(l, &[[c]]);
                mat.update_diag_block(r, &[[c]]);
                let k = fi - n_bfaces;
                match storage {
                    StorageFlavor::FaceIndexed => {
                        mat.submit_block(l, r, &[[-c]], SubmitPosition::Upper { iface: k });
                        mat.submit_block(r, l, &[[-c]], SubmitPosition::Lower { iface: k });
                    }
                    StorageFlavor::General => {
                        mat.submit_block(l, r, &[[-c]], SubmitPosition::General);
                        mat.submit_block(r, l, &[[-c]], SubmitPosition::General);
                    }
                }
            } else {
                // ∂φ/∂u_L + ∂φ/∂u_g·∂u_g/∂u_L = c + (−c)(−1) = 2c
                mat.update_diag_block(l, &[[2.0 * c]]);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::numerics::linear_algebra::LinearOperator;
    use crate::spatial::interior_face_cells;

    /// n×n 单位方腔
    fn unit_square(n: usize) -> FvMesh {
        let nn = n + 1;
        let mut nodes = Vec::new();
        for j in 0..nn {
            for i in 0..nn {
                nodes.push(DVec2::new(i as f64 / n as f64, j as f64 / n as f64));
            }
        }
        let mut cells = Vec::new();
        for j in 0..n {
            for i in 0..n {
                let a = j * nn + i;
                cells.push(vec![a, a + 1, a + nn + 1, a + nn]);
            }
        }
        let mut bedges = Vec::new();
        for i in 0..n {
            bedges.push((1, [i, i + 1]));
            bedges.push((1, [nn * n + i, nn * n + i + 1]));
            bedges.push((1, [i * nn, (i + 1) * nn]));
            bedges.push((1, [i * nn + n, (i + 1) * nn + n]));
        }
        FvMesh::from_raw(nodes, cells, &bedges).unwrap()
    }

    /// 制造解 u = 1 + 2x − y（调和），f = 0，Dirichlet 取解本身
    fn manufactured(mesh: &FvMesh, nu: f64) -> DiffusionSpatial<'_> {
        DiffusionSpatial::new(
            mesh,
            nu,
            Box::new(|_| 0.0),
            Box::new(|p| 1.0 + 2.0 * p.x - p.y),
        )
    }

    #[test]
    fn test_manufactured_solution_zero_residual() {
        // 两点差分与线性反射幽灵对线性解精确
        let mesh = unit_square(4);
        let sp = manufactured(&mesh, 0.7);
        let u: Vec<f64> = (0..mesh.n_cells())
            .map(|i| {
                let c = mesh.cell_center(i);
                1.0 + 2.0 * c.x - c.y
            })
            .collect();
        let mut r = vec![0.0; u.len()];
        let mut dtm = vec![0.0; u.len()];
        sp.compute_residual(&u, &mut r, &mut dtm);
        for (i, v) in r.iter().enumerate() {
            assert!(v.abs() < 1e-12, "residual[{i}] = {v}");
        }
        assert!(dtm.iter().all(|&d| d > 0.0 && d.is_finite()));
    }

    #[test]
    fn test_jacobian_matches_fd() {
        let mesh = unit_square(3);
        let sp = manufactured(&mesh, 1.3);
        let n = mesh.n_cells();
        let u: Vec<f64> = (0..n).map(|i| (i as f64 * 0.61).sin()).collect();

        let mut mat = BlockMatrix::<1>::general(n, &interior_face_cells(&mesh));
        sp.compute_jacobian(&u, &mut mat);

        let mut r0 = vec![0.0; n];
        let mut dtm = vec![0.0; n];
        sp.compute_residual(&u, &mut r0, &mut dtm);

        let eps = 1e-7;
        for k in 0..n {
            let mut up = u.clone();
            up[k] += eps;
            let mut r1 = vec![0.0; n];
            sp.compute_residual(&up, &mut r1, &mut dtm);
            let mut col = vec![0.0; n];
            let mut e = vec![0.0; n];
            e[k] = 1.0;
            mat.apply(&e, &mut col);
            for i in 0..n {
                let fd = (r1[i] - r0[i]) / eps;
                assert!(
                    (col[i] - fd).abs() < 1e-6,
                    "J[{i}][{k}] = {} vs fd = {fd}",
                    col[i]
                );
            }
        }
    }

    #[test]
    fn test_residual_linear_in_u() {
        // 扩散算子是仿射的：R(u+v) − R(u) 与 R(v) − R(0) 一致
        let mesh = unit_square(3);
        let sp = manufactured(&mesh, 1.0);
        let n = mesh.n_cells();
        let u: Vec<f64> = (0..n).map(|i| (i % 5) as f64 * 0.2).collect();
        let v: Vec<f64> = (0..n).map(|i| ((i * 3) % 7) as f64 * 0.1).collect();
        let uv: Vec<f64> = u.iter().zip(&v).map(|(a, b)| a + b).collect();
        let zero = vec![0.0; n];

        let mut dtm = vec![0.0; n];
        let mut r_u = vec![0.0; n];
        let mut r_v = vec![0.0; n];
        let mut r_uv = vec![0.0; n];
        let mut r_0 = vec![0.0; n];
        sp.compute_residual(&u, &mut r_u, &mut dtm);
        sp.compute_residual(&v, &mut r_v, &mut dtm);
        sp.compute_residual(&uv, &mut r_uv, &mut dtm);
        sp.compute_residual(&zero, &mut r_0, &mut dtm);

        for i in 0..n {
            let lhs = r_uv[i] - r_u[i];
            let rhs = r_v[i] - r_0[i];
            assert!((lhs - rhs).abs() < 1e-12);
        }
    }
}
