// crates/afv_mesh/src/topology.rs

//! 面拓扑构建与只读网格视图
//!
//! 从 GMSH 原始数据建立以面为中心的拓扑：
//! - 每条面记录左右单元、两端节点、单位法向、长度与边界标记
//! - 边界面排在前面：面索引 [0, n_bfaces) 为边界面，其余为内部面
//! - 法向从左单元指向右单元；边界面的右单元是幽灵槽位
//!   （索引 = n_cells + 边界面索引）
//!
//! 周期边界在此阶段预链接：周期面的配对内部单元通过
//! [`FvMesh::face_periodic_cell`] 暴露，面本身仍保持边界面身份，
//! 通量装配只向各自的左单元累加，由配对面的反向法向保证守恒。

use crate::error::{MeshError, MeshResult};
use crate::gmsh::GmshMeshData;
use glam::DVec2;
use std::collections::HashMap;

/// 内部面的标记哨兵值
pub const INTERIOR_MARKER: i32 = -1;

/// 周期配对轴
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodicAxis {
    /// 沿 x 方向平移周期
    X,
    /// 沿 y 方向平移周期
    Y,
}

impl PeriodicAxis {
    /// 从轴标签解析
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "x" => Some(Self::X),
            "y" => Some(Self::Y),
            _ => None,
        }
    }
}

/// 单条面记录
#[derive(Debug, Clone, Copy)]
pub struct Face {
    /// 左单元（总是内部单元）
    pub left: usize,
    /// 右单元；>= n_cells 表示幽灵槽位
    pub right: usize,
    /// 两端节点索引
    pub nodes: [usize; 2],
    /// 单位法向，从左指向右
    pub normal: DVec2,
    /// 面长度
    pub length: f64,
    /// 边界标记；内部面为 [`INTERIOR_MARKER`]
    pub marker: i32,
}

/// 只读网格视图
///
/// 空间离散只借用此结构，不持有所有权（见调用方）。
/// 邻接关系以扁平 offset/index 数组存储。
#[derive(Debug, Clone)]
pub struct FvMesh {
    nodes: Vec<DVec2>,
    cell_node_offsets: Vec<usize>,
    cell_node_indices: Vec<usize>,
    cell_face_offsets: Vec<usize>,
    cell_face_indices: Vec<usize>,
    cell_area: Vec<f64>,
    cell_center: Vec<DVec2>,
    faces: Vec<Face>,
    n_bfaces: usize,
    /// 按边界面索引存储的周期配对单元
    periodic_cell: Vec<Option<usize>>,
}

impl FvMesh {
    /// 从 GMSH 数据构建
    pub fn build(data: &GmshMeshData) -> MeshResult<Self> {
        Self::from_raw(data.nodes.clone(), data.cells.clone(), &data.boundary_edges)
    }

    /// 从原始节点/单元/边界边构建
    ///
    /// 单元节点序自动规范为逆时针。未标记的裸边界边视为拓扑错误。
    pub fn from_raw(
        nodes: Vec<DVec2>,
        mut cells: Vec<Vec<usize>>,
        boundary_edges: &[(i32, [usize; 2])],
    ) -> MeshResult<Self> {
        let n_cells = cells.len();
        let n_nodes = nodes.len();

        for (i, cell) in cells.iter_mut().enumerate() {
            for &n in cell.iter() {
                if n >= n_nodes {
                    return Err(MeshError::topology(format!(
                        "cell {i} references node {n} out of {n_nodes}"
                    )));
                }
            }
            // 规范为逆时针，保证外法向公式一致
            if signed_area(cell, &nodes) < 0.0 {
                cell.reverse();
            }
        }

        // 边界边标记查找表，键为排序后的节点对
        let mut edge_marker: HashMap<(usize, usize), i32> = HashMap::new();
        for (tag, [a, b]) in boundary_edges {
            edge_marker.insert(sorted_pair(*a, *b), *tag);
        }

        // 第一次出现记录 (左单元, 有向节点对)；第二次出现补上右单元
        struct EdgeRec {
            left: usize,
            nodes: [usize; 2],
            right: Option<usize>,
        }
        let mut edge_map: HashMap<(usize, usize), EdgeRec> = HashMap::new();

        for (ic, cell) in cells.iter().enumerate() {
            let k = cell.len();
            for i in 0..k {
                let a = cell[i];
                let b = cell[(i + 1) % k];
                let key = sorted_pair(a, b);
                match edge_map.get_mut(&key) {
                    None => {
                        edge_map.insert(
                            key,
                            EdgeRec {
                                left: ic,
                                nodes: [a, b],
                                right: None,
                            },
                        );
                    }
                    Some(rec) => {
                        if rec.right.is_some() {
                            return Err(MeshError::topology(format!(
                                "edge ({a}, {b}) shared by more than two cells"
                            )));
                        }
                        rec.right = Some(ic);
                    }
                }
            }
        }

        // 分离边界面与内部面，边界面在前
        let mut bfaces = Vec::new();
        let mut ifaces = Vec::new();
        for (key, rec) in edge_map {
            let [a, b] = rec.nodes;
            let t = nodes[b] - nodes[a];
            let length = t.length();
            if length <= 0.0 {
                return Err(MeshError::topology(format!("zero-length edge ({a}, {b})")));
            }
            // 逆时针多边形的 a→b 边，外法向为 (ty, -tx)
            let normal = DVec2::new(t.y, -t.x) / length;

            match rec.right {
                Some(right) => ifaces.push(Face {
                    left: rec.left,
                    right,
                    nodes: rec.nodes,
                    normal,
                    length,
                    marker: INTERIOR_MARKER,
                }),
                None => {
                    let marker = *edge_marker.get(&key).ok_or_else(|| {
                        MeshError::topology(format!("untagged boundary edge ({a}, {b})"))
                    })?;
                    bfaces.push(Face {
                        left: rec.left,
                        right: usize::MAX, // 幽灵槽位稍后编号
                        nodes: rec.nodes,
                        normal,
                        length,
                        marker,
                    });
                }
            }
        }

        // HashMap 迭代序不确定，排序保证可复现的面编号
        bfaces.sort_unstable_by_key(|f| (f.marker, f.nodes));
        ifaces.sort_unstable_by_key(|f| f.nodes);

        let n_bfaces = bfaces.len();
        for (i, f) in bfaces.iter_mut().enumerate() {
            f.right = n_cells + i;
        }
        let mut faces = bfaces;
        faces.extend(ifaces);

        // 单元几何：面积为鞋带公式，中心取节点平均
        let mut cell_area = Vec::with_capacity(n_cells);
        let mut cell_center = Vec::with_capacity(n_cells);
        let mut cell_node_offsets = Vec::with_capacity(n_cells + 1);
        let mut cell_node_indices = Vec::new();
        cell_node_offsets.push(0);
        for cell in &cells {
            let area = signed_area(cell, &nodes);
            if area <= 0.0 {
                return Err(MeshError::topology("degenerate cell with zero area"));
            }
            cell_area.push(area);
            let c = cell.iter().map(|&n| nodes[n]).sum::<DVec2>() / cell.len() as f64;
            cell_center.push(c);
            cell_node_indices.extend_from_slice(cell);
            cell_node_offsets.push(cell_node_indices.len());
        }

        // 单元 → 面 邻接
        let mut per_cell: Vec<Vec<usize>> = vec![Vec::new(); n_cells];
        for (fi, f) in faces.iter().enumerate() {
            per_cell[f.left].push(fi);
            if f.right < n_cells {
                per_cell[f.right].push(fi);
            }
        }
        let mut cell_face_offsets = Vec::with_capacity(n_cells + 1);
        let mut cell_face_indices = Vec::new();
        cell_face_offsets.push(0);
        for fs in &per_cell {
            cell_face_indices.extend_from_slice(fs);
            cell_face_offsets.push(cell_face_indices.len());
        }

        Ok(Self {
            nodes,
            cell_node_offsets,
            cell_node_indices,
            cell_face_offsets,
            cell_face_indices,
            cell_area,
            cell_center,
            faces,
            n_bfaces,
            periodic_cell: vec![None; n_bfaces],
        })
    }

    /// 预链接周期边界
    ///
    /// `markers` 中的边界面按与 `axis` 正交的中点坐标配对，
    /// 配对面的内部单元互为周期邻居。
    pub fn link_periodic(&mut self, markers: &[i32], axis: PeriodicAxis) -> MeshResult<()> {
        let mut candidates: Vec<usize> = (0..self.n_bfaces)
            .filter(|&f| markers.contains(&self.faces[f].marker))
            .collect();
        if candidates.is_empty() {
            return Err(MeshError::UnknownMarker {
                marker: markers.first().copied().unwrap_or(-1),
            });
        }
        if candidates.len() % 2 != 0 {
            return Err(MeshError::topology(format!(
                "odd number of periodic faces: {}",
                candidates.len()
            )));
        }

        // 配对键：与平移轴正交的中点坐标
        let key = |f: usize| -> f64 {
            let m = self.face_midpoint(f);
            match axis {
                PeriodicAxis::X => m.y,
                PeriodicAxis::Y => m.x,
            }
        };
        candidates.sort_by(|&a, &b| key(a).total_cmp(&key(b)));

        let tol = 1e-9
            * self
                .faces
                .iter()
                .map(|f| f.length)
                .fold(f64::MIN, f64::max)
                .max(1.0);

        let keys: Vec<f64> = candidates.iter().map(|&f| key(f)).collect();

        let mut i = 0;
        while i < candidates.len() {
            let fa = candidates[i];
            let fb = candidates[i + 1];
            if (keys[i] - keys[i + 1]).abs() > tol {
                return Err(MeshError::topology(format!(
                    "periodic face {fa} has no matching partner"
                )));
            }
            self.periodic_cell[fa] = Some(self.faces[fb].left);
            self.periodic_cell[fb] = Some(self.faces[fa].left);
            i += 2;
        }
        Ok(())
    }

    // ============================================================
    // 只读查询
    // ============================================================

    /// 单元数量
    #[inline]
    pub fn n_cells(&self) -> usize {
        self.cell_area.len()
    }

    /// 边界面数量
    #[inline]
    pub fn n_bfaces(&self) -> usize {
        self.n_bfaces
    }

    /// 面总数
    #[inline]
    pub fn n_faces(&self) -> usize {
        self.faces.len()
    }

    /// 节点数量
    #[inline]
    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// 节点坐标
    #[inline]
    pub fn node(&self, i: usize) -> DVec2 {
        self.nodes[i]
    }

    /// 单元的节点索引
    #[inline]
    pub fn cell_nodes(&self, i: usize) -> &[usize] {
        &self.cell_node_indices[self.cell_node_offsets[i]..self.cell_node_offsets[i + 1]]
    }

    /// 单元关联的面索引
    #[inline]
    pub fn cell_faces(&self, i: usize) -> &[usize] {
        &self.cell_face_indices[self.cell_face_offsets[i]..self.cell_face_offsets[i + 1]]
    }

    /// 单元面积
    #[inline]
    pub fn cell_area(&self, i: usize) -> f64 {
        self.cell_area[i]
    }

    /// 单元中心（节点平均）
    #[inline]
    pub fn cell_center(&self, i: usize) -> DVec2 {
        self.cell_center[i]
    }

    /// 单元特征长度
    #[inline]
    pub fn cell_char_length(&self, i: usize) -> f64 {
        self.cell_area[i].sqrt()
    }

    /// 面记录
    #[inline]
    pub fn face(&self, f: usize) -> &Face {
        &self.faces[f]
    }

    /// 面是否为边界面
    #[inline]
    pub fn is_boundary_face(&self, f: usize) -> bool {
        f < self.n_bfaces
    }

    /// 面中点
    #[inline]
    pub fn face_midpoint(&self, f: usize) -> DVec2 {
        let [a, b] = self.faces[f].nodes;
        0.5 * (self.nodes[a] + self.nodes[b])
    }

    /// 边界面的周期配对单元
    #[inline]
    pub fn face_periodic_cell(&self, bface: usize) -> Option<usize> {
        self.periodic_cell.get(bface).copied().flatten()
    }

    /// 网格中出现的全部边界标记
    pub fn markers(&self) -> Vec<i32> {
        let mut m: Vec<i32> = self.faces[..self.n_bfaces]
            .iter()
            .map(|f| f.marker)
            .collect();
        m.sort_unstable();
        m.dedup();
        m
    }

    /// 校验标记存在
    pub fn require_marker(&self, marker: i32) -> MeshResult<()> {
        if self.markers().contains(&marker) {
            Ok(())
        } else {
            Err(MeshError::UnknownMarker { marker })
        }
    }
}

/// 有序对
#[inline]
fn sorted_pair(a: usize, b: usize) -> (usize, usize) {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

/// 多边形有符号面积（鞋带公式）
fn signed_area(cell: &[usize], nodes: &[DVec2]) -> f64 {
    let k = cell.len();
    let mut s = 0.0;
    for i in 0..k {
        let p = nodes[cell[i]];
        let q = nodes[cell[(i + 1) % k]];
        s += p.x * q.y - q.x * p.y;
    }
    0.5 * s
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 两个并排的单位正方形单元
    ///
    /// ```text
    /// 3---4---5
    /// | 0 | 1 |
    /// 0---1---2
    /// ```
    fn two_quads() -> FvMesh {
        let nodes = vec![
            DVec2::new(0.0, 0.0),
            DVec2::new(1.0, 0.0),
            DVec2::new(2.0, 0.0),
            DVec2::new(0.0, 1.0),
            DVec2::new(1.0, 1.0),
            DVec2::new(2.0, 1.0),
        ];
        let cells = vec![vec![0, 1, 4, 3], vec![1, 2, 5, 4]];
        let bedges = vec![
            (2, [0, 1]),
            (2, [1, 2]),
            (2, [4, 3]),
            (2, [5, 4]),
            (7, [3, 0]),
            (8, [2, 5]),
        ];
        FvMesh::from_raw(nodes, cells, &bedges).unwrap()
    }

    #[test]
    fn test_counts() {
        let m = two_quads();
        assert_eq!(m.n_cells(), 2);
        assert_eq!(m.n_faces(), 7);
        assert_eq!(m.n_bfaces(), 6);
    }

    #[test]
    fn test_geometry() {
        let m = two_quads();
        assert!((m.cell_area(0) - 1.0).abs() < 1e-14);
        assert!((m.cell_center(0) - DVec2::new(0.5, 0.5)).length() < 1e-14);
        assert!((m.cell_center(1) - DVec2::new(1.5, 0.5)).length() < 1e-14);
    }

    #[test]
    fn test_interior_face_orientation() {
        let m = two_quads();
        // 唯一的内部面是最后一条
        let f = m.face(m.n_faces() - 1);
        assert_eq!(f.marker, INTERIOR_MARKER);
        // 法向从左单元指向右单元
        let d = m.cell_center(f.right) - m.cell_center(f.left);
        assert!(f.normal.dot(d) > 0.0);
        assert!((f.normal.length() - 1.0).abs() < 1e-14);
        assert!((f.length - 1.0).abs() < 1e-14);
    }

    #[test]
    fn test_boundary_normals_outward() {
        let m = two_quads();
        for fi in 0..m.n_bfaces() {
            let f = m.face(fi);
            assert!(f.right >= m.n_cells());
            let out = m.face_midpoint(fi) - m.cell_center(f.left);
            assert!(f.normal.dot(out) > 0.0, "face {fi} normal not outward");
        }
    }

    #[test]
    fn test_clockwise_cell_is_normalized() {
        // 顺时针给出的单元应被翻转，面积保持为正
        let nodes = vec![
            DVec2::new(0.0, 0.0),
            DVec2::new(1.0, 0.0),
            DVec2::new(0.0, 1.0),
        ];
        let cells = vec![vec![0, 2, 1]];
        let bedges = vec![(1, [0, 1]), (1, [1, 2]), (1, [2, 0])];
        let m = FvMesh::from_raw(nodes, cells, &bedges).unwrap();
        assert!((m.cell_area(0) - 0.5).abs() < 1e-14);
    }

    #[test]
    fn test_untagged_boundary_edge_rejected() {
        let nodes = vec![
            DVec2::new(0.0, 0.0),
            DVec2::new(1.0, 0.0),
            DVec2::new(0.0, 1.0),
        ];
        let cells = vec![vec![0, 1, 2]];
        let bedges = vec![(1, [0, 1]), (1, [1, 2])]; // 缺一条
        let err = FvMesh::from_raw(nodes, cells, &bedges).unwrap_err();
        assert!(matches!(err, MeshError::Topology { .. }));
    }

    #[test]
    fn test_periodic_linking() {
        let mut m = two_quads();
        // 左(7)右(8)边界沿 x 周期
        m.link_periodic(&[7, 8], PeriodicAxis::X).unwrap();

        let left_face = (0..m.n_bfaces()).find(|&f| m.face(f).marker == 7).unwrap();
        let right_face = (0..m.n_bfaces()).find(|&f| m.face(f).marker == 8).unwrap();
        assert_eq!(m.face_periodic_cell(left_face), Some(1));
        assert_eq!(m.face_periodic_cell(right_face), Some(0));
        // 非周期边界面不受影响
        let wall = (0..m.n_bfaces()).find(|&f| m.face(f).marker == 2).unwrap();
        assert_eq!(m.face_periodic_cell(wall), None);
    }

    #[test]
    fn test_require_marker() {
        let m = two_quads();
        assert!(m.require_marker(2).is_ok());
        assert!(matches!(
            m.require_marker(99),
            Err(MeshError::UnknownMarker { marker: 99 })
        ));
    }
}
