// crates/afv_physics/src/numerics/linear_algebra/operator.rs

//! 块稀疏线性算子
//!
//! 驱动器消费的最小契约：对角块累加、非对角块提交、矩阵-向量积。
//! 存储格式不外露，仅以 [`StorageFlavor`] 区分两种提交寻址方式：
//!
//! - 面索引（"d"）格式：非对角块按内部面索引存放，提交时带
//!   下/上三角标签与面号
//! - 通用格式：块 CSR，按 (row, col) 提交
//!
//! 装配方按 [`BlockMatrix::storage`] 分支选择提交方式。

use super::block::{block_add_assign, block_mat_vec, block_zero, Block};

/// 只需矩阵-向量积的线性算子抽象
///
/// 块矩阵与矩阵自由 Jacobian 算子都实现它；Krylov 求解器只
/// 依赖此 trait。
pub trait LinearOperator {
    /// 自由度总数
    fn dim(&self) -> usize;

    /// y = A·x
    fn apply(&self, x: &[f64], y: &mut [f64]);
}

/// 存储格式标签
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageFlavor {
    /// 非对角块按内部面索引（"d" 格式）
    FaceIndexed,
    /// 通用 (row, col) 寻址
    General,
}

/// 非对角块提交位置
#[derive(Debug, Clone, Copy)]
pub enum SubmitPosition {
    /// 下三角块 A[right, left]，面索引寻址
    Lower {
        /// 内部面序号（从首个内部面起计）
        iface: usize,
    },
    /// 上三角块 A[left, right]，面索引寻址
    Upper {
        /// 内部面序号
        iface: usize,
    },
    /// 通用 (row, col) 寻址
    General,
}

// ============================================================
// 面索引格式（D/L/U 三元组）
// ============================================================

/// 面索引块矩阵
///
/// 对角块按单元存放；每条内部面存放一对非对角块：
/// upper = A[left, right]，lower = A[right, left]。
#[derive(Debug, Clone)]
pub struct DluMatrix<const N: usize> {
    n_cells: usize,
    diag: Vec<Block<N>>,
    lower: Vec<Block<N>>,
    upper: Vec<Block<N>>,
    /// 每条内部面的 (left, right)
    face_cells: Vec<(usize, usize)>,
    /// 每个单元关联的 (内部面序号, 该单元是否为左单元)
    row_faces: Vec<Vec<(usize, bool)>>,
}

impl<const N: usize> DluMatrix<N> {
    /// 创建（`face_cells` 为全部内部面的左右单元对）
    pub fn new(n_cells: usize, face_cells: Vec<(usize, usize)>) -> Self {
        let nif = face_cells.len();
        let mut row_faces: Vec<Vec<(usize, bool)>> = vec![Vec::new(); n_cells];
        for (fi, &(l, r)) in face_cells.iter().enumerate() {
            row_faces[l].push((fi, true));
            row_faces[r].push((fi, false));
        }
        Self {
            n_cells,
            diag: vec![block_zero(); n_cells],
            lower: vec![block_zero(); nif],
            upper: vec![block_zero(); nif],
            face_cells,
            row_faces,
        }
    }
}

// ============================================================
// 通用格式（块 CSR）
// ============================================================

/// 块 CSR 矩阵
///
/// 稀疏模式在构建时由单元邻接确定（对角 + 面邻），之后只改值。
#[derive(Debug, Clone)]
pub struct BsrMatrix<const N: usize> {
    n_cells: usize,
    row_ptr: Vec<usize>,
    col_idx: Vec<usize>,
    blocks: Vec<Block<N>>,
    /// 每行对角块在 blocks 中的索引
    diag_idx: Vec<usize>,
}

impl<const N: usize> BsrMatrix<N> {
    /// 从单元邻接构建稀疏模式
    pub fn new(n_cells: usize, face_cells: &[(usize, usize)]) -> Self {
        let mut rows: Vec<Vec<usize>> = (0..n_cells).map(|i| vec![i]).collect();
        for &(l, r) in face_cells {
            rows[l].push(r);
            rows[r].push(l);
        }

        let mut row_ptr = Vec::with_capacity(n_cells + 1);
        let mut col_idx = Vec::new();
        row_ptr.push(0);
        for row in &mut rows {
            row.sort_unstable();
            row.dedup();
            col_idx.extend_from_slice(row);
            row_ptr.push(col_idx.len());
        }

        let diag_idx = (0..n_cells)
            .map(|i| {
                let start = row_ptr[i];
                let end = row_ptr[i + 1];
                start
                    + col_idx[start..end]
                        .binary_search(&i)
                        .expect("diagonal entry present by construction")
            })
            .collect();

        let nnz = col_idx.len();
        Self {
            n_cells,
            row_ptr,
            col_idx,
            blocks: vec![block_zero(); nnz],
            diag_idx,
        }
    }

    fn find_index(&self, row: usize, col: usize) -> Option<usize> {
        let start = self.row_ptr[row];
        let end = self.row_ptr[row + 1];
        self.col_idx[start..end]
            .binary_search(&col)
            .ok()
            .map(|k| start + k)
    }
}

// ============================================================
// 统一封装
// ============================================================

/// 块稀疏矩阵（两种存储格式之一）
#[derive(Debug, Clone)]
pub enum BlockMatrix<const N: usize> {
    /// 面索引格式
    FaceIndexed(DluMatrix<N>),
    /// 通用块 CSR
    General(BsrMatrix<N>),
}

impl<const N: usize> BlockMatrix<N> {
    /// 创建面索引格式矩阵
    pub fn face_indexed(n_cells: usize, face_cells: Vec<(usize, usize)>) -> Self {
        Self::FaceIndexed(DluMatrix::new(n_cells, face_cells))
    }

    /// 创建通用格式矩阵
    pub fn general(n_cells: usize, face_cells: &[(usize, usize)]) -> Self {
        Self::General(BsrMatrix::new(n_cells, face_cells))
    }

    /// 存储格式
    pub fn storage(&self) -> StorageFlavor {
        match self {
            Self::FaceIndexed(_) => StorageFlavor::FaceIndexed,
            Self::General(_) => StorageFlavor::General,
        }
    }

    /// 单元（块行）数
    pub fn n_rows(&self) -> usize {
        match self {
            Self::FaceIndexed(m) => m.n_cells,
            Self::General(m) => m.n_cells,
        }
    }

    /// 全部清零（保持稀疏模式）
    pub fn clear(&mut self) {
        match self {
            Self::FaceIndexed(m) => {
                m.diag.fill(block_zero());
                m.lower.fill(block_zero());
                m.upper.fill(block_zero());
            }
            Self::General(m) => m.blocks.fill(block_zero()),
        }
    }

    /// 对角块累加
    pub fn update_diag_block(&mut self, row: usize, block: &Block<N>) {
        match self {
            Self::FaceIndexed(m) => block_add_assign(&mut m.diag[row], block),
            Self::General(m) => {
                let idx = m.diag_idx[row];
                block_add_assign(&mut m.blocks[idx], block);
            }
        }
    }

    /// 非对角块提交（累加）
    ///
    /// 面索引格式要求 `pos` 携带面号；通用格式要求
    /// `SubmitPosition::General`。
    pub fn submit_block(
        &mut self,
        row: usize,
        col: usize,
        block: &Block<N>,
        pos: SubmitPosition,
    ) {
        match (self, pos) {
            (Self::FaceIndexed(m), SubmitPosition::Lower { iface }) => {
                debug_assert_eq!(m.face_cells[iface].0, col);
                debug_assert_eq!(m.face_cells[iface].1, row);
                block_add_assign(&mut m.lower[iface], block);
            }
            (Self::FaceIndexed(m), SubmitPosition::Upper { iface }) => {
                debug_assert_eq!(m.face_cells[iface].0, row);
                debug_assert_eq!(m.face_cells[iface].1, col);
                block_add_assign(&mut m.upper[iface], block);
            }
            (Self::General(m), SubmitPosition::General) => {
                let idx = m
                    .find_index(row, col)
                    .expect("off-diagonal block outside sparsity pattern");
                block_add_assign(&mut m.blocks[idx], block);
            }
            _ => panic!("submit position does not match matrix storage flavor"),
        }
    }

    /// 对角块
    pub fn diag(&self, row: usize) -> &Block<N> {
        match self {
            Self::FaceIndexed(m) => &m.diag[row],
            Self::General(m) => &m.blocks[m.diag_idx[row]],
        }
    }

    /// 遍历一行的非对角块
    pub fn for_each_offdiag(&self, row: usize, mut f: impl FnMut(usize, &Block<N>)) {
        match self {
            Self::FaceIndexed(m) => {
                for &(fi, is_left) in &m.row_faces[row] {
                    let (l, r) = m.face_cells[fi];
                    if is_left {
                        f(r, &m.upper[fi]);
                    } else {
                        f(l, &m.lower[fi]);
                    }
                }
            }
            Self::General(m) => {
                for idx in m.row_ptr[row]..m.row_ptr[row + 1] {
                    let col = m.col_idx[idx];
                    if col != row {
                        f(col, &m.blocks[idx]);
                    }
                }
            }
        }
    }
}

impl<const N: usize> LinearOperator for BlockMatrix<N> {
    fn dim(&self) -> usize {
        self.n_rows() * N
    }

    fn apply(&self, x: &[f64], y: &mut [f64]) {
        debug_assert_eq!(x.len(), self.dim());
        debug_assert_eq!(y.len(), self.dim());
        match self {
            Self::FaceIndexed(m) => {
                for i in 0..m.n_cells {
                    let yi = block_mat_vec(&m.diag[i], &x[i * N..(i + 1) * N]);
                    y[i * N..(i + 1) * N].copy_from_slice(&yi);
                }
                for (fi, &(l, r)) in m.face_cells.iter().enumerate() {
                    let yl = block_mat_vec(&m.upper[fi], &x[r * N..(r + 1) * N]);
                    let yr = block_mat_vec(&m.lower[fi], &x[l * N..(l + 1) * N]);
                    for k in 0..N {
                        y[l * N + k] += yl[k];
                        y[r * N + k] += yr[k];
                    }
                }
            }
            Self::General(m) => {
                for i in 0..m.n_cells {
                    let mut yi = [0.0; N];
                    for idx in m.row_ptr[i]..m.row_ptr[i + 1] {
                        let col = m.col_idx[idx];
                        let contrib = block_mat_vec(&m.blocks[idx], &x[col * N..(col + 1) * N]);
                        for k in 0..N {
                            yi[k] += contrib[k];
                        }
                    }
                    y[i * N..(i + 1) * N].copy_from_slice(&yi);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 三个单元一条链：0-1-2，两条内部面
    fn face_cells() -> Vec<(usize, usize)> {
        vec![(0, 1), (1, 2)]
    }

    fn fill_test_matrix(mat: &mut BlockMatrix<2>) {
        // D_i = (i+2)·I
        for i in 0..3 {
            let mut d = block_zero::<2>();
            d[0][0] = (i + 2) as f64;
            d[1][1] = (i + 2) as f64;
            mat.update_diag_block(i, &d);
        }
        // 非对角：每条面 upper = 1·E01, lower = −1·E10
        let mut up = block_zero::<2>();
        up[0][1] = 1.0;
        let mut lo = block_zero::<2>();
        lo[1][0] = -1.0;
        match mat.storage() {
            StorageFlavor::FaceIndexed => {
                for fi in 0..2 {
                    let (l, r) = face_cells()[fi];
                    mat.submit_block(l, r, &up, SubmitPosition::Upper { iface: fi });
                    mat.submit_block(r, l, &lo, SubmitPosition::Lower { iface: fi });
                }
            }
            StorageFlavor::General => {
                for fi in 0..2 {
                    let (l, r) = face_cells()[fi];
                    mat.submit_block(l, r, &up, SubmitPosition::General);
                    mat.submit_block(r, l, &lo, SubmitPosition::General);
                }
            }
        }
    }

    #[test]
    fn test_two_flavors_same_apply() {
        let mut a = BlockMatrix::<2>::face_indexed(3, face_cells());
        let mut b = BlockMatrix::<2>::general(3, &face_cells());
        fill_test_matrix(&mut a);
        fill_test_matrix(&mut b);

        let x: Vec<f64> = (0..6).map(|i| 0.5 + i as f64).collect();
        let mut ya = vec![0.0; 6];
        let mut yb = vec![0.0; 6];
        a.apply(&x, &mut ya);
        b.apply(&x, &mut yb);
        for k in 0..6 {
            assert!((ya[k] - yb[k]).abs() < 1e-14, "k = {k}: {} vs {}", ya[k], yb[k]);
        }
    }

    #[test]
    fn test_apply_values() {
        let mut a = BlockMatrix::<2>::general(3, &face_cells());
        fill_test_matrix(&mut a);
        let x = vec![1.0, 1.0, 1.0, 1.0, 1.0, 1.0];
        let mut y = vec![0.0; 6];
        a.apply(&x, &mut y);
        // 行 0: D0·[1,1] + U01·[1,1] = [2+1, 2] = [3, 2]
        assert_eq!(&y[0..2], &[3.0, 2.0]);
        // 行 1: L10·[1,1] + D1·[1,1] + U12·[1,1] = [0+3+1, −1+3+0] = [4, 2]
        assert_eq!(&y[2..4], &[4.0, 2.0]);
        // 行 2: L21·[1,1] + D2·[1,1] = [4, −1+4] = [4, 3]
        assert_eq!(&y[4..6], &[4.0, 3.0]);
    }

    #[test]
    fn test_diag_accumulates() {
        let mut a = BlockMatrix::<2>::face_indexed(3, face_cells());
        let d = block_scaled_identity_for_test(2.0);
        a.update_diag_block(1, &d);
        a.update_diag_block(1, &d);
        assert_eq!(a.diag(1)[0][0], 4.0);
    }

    fn block_scaled_identity_for_test(s: f64) -> Block<2> {
        let mut b = block_zero::<2>();
        b[0][0] = s;
        b[1][1] = s;
        b
    }

    #[test]
    fn test_clear_keeps_pattern() {
        let mut a = BlockMatrix::<2>::general(3, &face_cells());
        fill_test_matrix(&mut a);
        a.clear();
        let x = vec![1.0; 6];
        let mut y = vec![7.0; 6];
        a.apply(&x, &mut y);
        assert!(y.iter().all(|&v| v == 0.0));
        // 模式仍在，可以重新提交
        fill_test_matrix(&mut a);
    }

    #[test]
    fn test_offdiag_iteration() {
        let mut a = BlockMatrix::<2>::general(3, &face_cells());
        fill_test_matrix(&mut a);
        let mut cols = Vec::new();
        a.for_each_offdiag(1, |col, _| cols.push(col));
        cols.sort_unstable();
        assert_eq!(cols, vec![0, 2]);
    }
}
