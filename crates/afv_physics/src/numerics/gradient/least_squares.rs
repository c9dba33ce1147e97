// crates/afv_physics/src/numerics/gradient/least_squares.rs

//! 加权最小二乘梯度
//!
//! 对每个单元最小化 Σ_j w_ij (u_j − u_i − ∇u_i·(r_j − r_i))²，
//! 邻居取面邻单元（边界单元包含幽灵邻居），权 w_ij = 1/‖r_j − r_i‖²。
//! 2×2 正规方程逐单元解析求解。

use afv_mesh::FvMesh;
use glam::DVec2;
use rayon::prelude::*;

/// 计算全场加权最小二乘梯度
pub fn least_squares_gradients<const N: usize>(
    mesh: &FvMesh,
    u: &[[f64; N]],
    ug: &[[f64; N]],
    ghost_centers: &[DVec2],
    dudx: &mut [[f64; N]],
    dudy: &mut [[f64; N]],
) {
    dudx.par_iter_mut()
        .zip(dudy.par_iter_mut())
        .enumerate()
        .for_each(|(ic, (gx, gy))| {
            let ri = mesh.cell_center(ic);
            let mut a11 = 0.0;
            let mut a12 = 0.0;
            let mut a22 = 0.0;
            let mut bx = [0.0; N];
            let mut by = [0.0; N];

            for &fi in mesh.cell_faces(ic) {
                let face = mesh.face(fi);
                let (rj, uj): (DVec2, &[f64; N]) = if face.left == ic {
                    if face.right < mesh.n_cells() {
                        (mesh.cell_center(face.right), &u[face.right])
                    } else {
                        (ghost_centers[fi], &ug[fi])
                    }
                } else {
                    (mesh.cell_center(face.left), &u[face.left])
                };

                let dr = rj - ri;
                let w = 1.0 / dr.length_squared();
                a11 += w * dr.x * dr.x;
                a12 += w * dr.x * dr.y;
                a22 += w * dr.y * dr.y;
                for k in 0..N {
                    let du = uj[k] - u[ic][k];
                    bx[k] += w * dr.x * du;
                    by[k] += w * dr.y * du;
                }
            }

            let det = a11 * a22 - a12 * a12;
            if det.abs() < 1e-14 {
                *gx = [0.0; N];
                *gy = [0.0; N];
                return;
            }
            let inv = 1.0 / det;
            for k in 0..N {
                gx[k] = (a22 * bx[k] - a12 * by[k]) * inv;
                gy[k] = (a11 * by[k] - a12 * bx[k]) * inv;
            }
        });
}
