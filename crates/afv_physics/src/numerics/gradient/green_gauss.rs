// crates/afv_physics/src/numerics/gradient/green_gauss.rs

//! Green-Gauss 梯度
//!
//! 体积分化为面积分：∇u_i ≈ (1/A_i) Σ_f ½(u_i + u_nbr) n_f ℓ_f，
//! 法向取该单元的外向符号。边界面的邻值为幽灵值。

use afv_mesh::FvMesh;
use rayon::prelude::*;

/// 计算全场 Green-Gauss 梯度
pub fn green_gauss_gradients<const N: usize>(
    mesh: &FvMesh,
    u: &[[f64; N]],
    ug: &[[f64; N]],
    dudx: &mut [[f64; N]],
    dudy: &mut [[f64; N]],
) {
    dudx.par_iter_mut()
        .zip(dudy.par_iter_mut())
        .enumerate()
        .for_each(|(ic, (gx, gy))| {
            let mut sx = [0.0; N];
            let mut sy = [0.0; N];
            for &fi in mesh.cell_faces(ic) {
                let face = mesh.face(fi);
                // 外向符号：法向从左指向右
                let sign = if face.left == ic { 1.0 } else { -1.0 };
                let other: &[f64; N] = if face.left == ic {
                    if face.right < mesh.n_cells() {
                        &u[face.right]
                    } else {
                        &ug[fi]
                    }
                } else {
                    &u[face.left]
                };
                let nx = sign * face.normal.x * face.length;
                let ny = sign * face.normal.y * face.length;
                for k in 0..N {
                    let uf = 0.5 * (u[ic][k] + other[k]);
                    sx[k] += uf * nx;
                    sy[k] += uf * ny;
                }
            }
            let inv_a = 1.0 / mesh.cell_area(ic);
            for k in 0..N {
                gx[k] = sx[k] * inv_a;
                gy[k] = sy[k] * inv_a;
            }
        });
}
