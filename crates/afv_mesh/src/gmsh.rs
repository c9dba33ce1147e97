// crates/afv_mesh/src/gmsh.rs

//! GMSH v2 ASCII 格式读取
//!
//! 仅使用二维信息：节点取 (x, y)，单元取三角形与四边形，
//! 边界边按其物理标记识别。
//!
//! # 示例
//!
//! ```ignore
//! use afv_mesh::gmsh::GmshLoader;
//!
//! let data = GmshLoader::load("cylinder.msh")?;
//! println!("{} nodes, {} cells", data.n_nodes(), data.n_cells());
//! ```

use crate::error::{MeshError, MeshResult};
use glam::DVec2;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// GMSH 加载的原始网格数据
///
/// 尚未建立面拓扑，仅是文件内容的结构化形式。
#[derive(Debug, Clone)]
pub struct GmshMeshData {
    /// 节点坐标
    pub nodes: Vec<DVec2>,
    /// 单元节点索引（三角形 3 个，四边形 4 个）
    pub cells: Vec<Vec<usize>>,
    /// 边界边 (物理标记, 两端节点)
    pub boundary_edges: Vec<(i32, [usize; 2])>,
    /// 物理名称映射
    pub physical_names: HashMap<i32, String>,
}

impl GmshMeshData {
    /// 节点数量
    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// 单元数量
    pub fn n_cells(&self) -> usize {
        self.cells.len()
    }

    /// 边界边数量
    pub fn n_boundary_edges(&self) -> usize {
        self.boundary_edges.len()
    }

    /// 网格中出现的全部边界标记
    pub fn markers(&self) -> Vec<i32> {
        let mut m: Vec<i32> = self.boundary_edges.iter().map(|(tag, _)| *tag).collect();
        m.sort_unstable();
        m.dedup();
        m
    }
}

/// GMSH 文件加载器
pub struct GmshLoader;

impl GmshLoader {
    /// 加载 GMSH 文件
    pub fn load<P: AsRef<Path>>(path: P) -> MeshResult<GmshMeshData> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|_| MeshError::FileNotFound {
            path: path.to_path_buf(),
        })?;
        Self::load_from_reader(BufReader::new(file))
    }

    /// 从 reader 加载
    pub fn load_from_reader<R: BufRead>(reader: R) -> MeshResult<GmshMeshData> {
        let mut lines = reader.lines();
        let mut nodes = Vec::new();
        let mut node_map: HashMap<usize, usize> = HashMap::new();
        let mut cells = Vec::new();
        let mut boundary_edges = Vec::new();
        let mut physical_names = HashMap::new();

        while let Some(line) = lines.next() {
            let line = line?;
            match line.trim() {
                "$MeshFormat" => {
                    if let Some(fmt) = lines.next() {
                        let fmt = fmt?;
                        let version = fmt
                            .split_whitespace()
                            .next()
                            .and_then(|s| s.parse::<f64>().ok())
                            .unwrap_or(2.0);
                        if version >= 4.0 {
                            return Err(MeshError::malformed(format!(
                                "unsupported GMSH format version {version}; expected 2.x ASCII"
                            )));
                        }
                    }
                    Self::skip_to(&mut lines, "$EndMeshFormat")?;
                }
                "$PhysicalNames" => {
                    physical_names = Self::parse_physical_names(&mut lines)?;
                }
                "$Nodes" => {
                    let (xy, map) = Self::parse_nodes(&mut lines)?;
                    nodes = xy;
                    node_map = map;
                }
                "$Elements" => {
                    let (c, b) = Self::parse_elements(&mut lines, &node_map)?;
                    cells = c;
                    boundary_edges = b;
                }
                _ => {}
            }
        }

        if nodes.is_empty() {
            return Err(MeshError::malformed("no nodes in GMSH file"));
        }
        if cells.is_empty() {
            return Err(MeshError::malformed("no 2D cells in GMSH file"));
        }

        Ok(GmshMeshData {
            nodes,
            cells,
            boundary_edges,
            physical_names,
        })
    }

    /// 跳过到指定结束标记
    fn skip_to<I: Iterator<Item = std::io::Result<String>>>(
        lines: &mut I,
        end: &str,
    ) -> MeshResult<()> {
        for l in lines {
            if l?.trim() == end {
                return Ok(());
            }
        }
        Err(MeshError::malformed(format!("missing {end}")))
    }

    /// 解析物理名称
    fn parse_physical_names<I: Iterator<Item = std::io::Result<String>>>(
        lines: &mut I,
    ) -> MeshResult<HashMap<i32, String>> {
        let mut m = HashMap::new();
        lines.next(); // 数量行

        for l in lines {
            let l = l?;
            let t = l.trim();
            if t == "$EndPhysicalNames" {
                break;
            }

            let parts: Vec<&str> = t.split_whitespace().collect();
            if parts.len() >= 3 {
                if let Ok(tag) = parts[1].parse::<i32>() {
                    let name = parts[2..].join(" ").trim_matches('"').to_string();
                    m.insert(tag, name);
                }
            }
        }
        Ok(m)
    }

    /// 解析节点段
    ///
    /// 返回 (坐标, 文件标签 → 连续索引 的映射)。GMSH 节点标签不保证连续。
    fn parse_nodes<I: Iterator<Item = std::io::Result<String>>>(
        lines: &mut I,
    ) -> MeshResult<(Vec<DVec2>, HashMap<usize, usize>)> {
        let mut xy = Vec::new();
        let mut m = HashMap::new();

        if let Some(c) = lines.next() {
            if let Ok(n) = c?.trim().parse::<usize>() {
                xy.reserve(n);
                m.reserve(n);
            }
        }

        for l in lines {
            let l = l?;
            let t = l.trim();
            if t == "$EndNodes" {
                break;
            }

            let parts: Vec<&str> = t.split_whitespace().collect();
            if parts.len() >= 3 {
                if let (Ok(tag), Ok(x), Ok(y)) =
                    (parts[0].parse(), parts[1].parse(), parts[2].parse())
                {
                    m.insert(tag, xy.len());
                    xy.push(DVec2::new(x, y));
                }
            }
        }
        Ok((xy, m))
    }

    /// 解析单元段
    ///
    /// 类型 1 是两节点线（边界边），2 是三角形，3 是四边形；其余忽略。
    fn parse_elements<I: Iterator<Item = std::io::Result<String>>>(
        lines: &mut I,
        nm: &HashMap<usize, usize>,
    ) -> MeshResult<(Vec<Vec<usize>>, Vec<(i32, [usize; 2])>)> {
        let mut cells = Vec::new();
        let mut edges = Vec::new();

        lines.next(); // 数量行

        for l in lines {
            let l = l?;
            let t = l.trim();
            if t == "$EndElements" {
                break;
            }

            let parts: Vec<&str> = t.split_whitespace().collect();
            if parts.len() < 4 {
                continue;
            }

            let elem_type = parts[1].parse::<usize>().unwrap_or(0);
            let n_tags = parts[2].parse::<usize>().unwrap_or(0);
            let tag = if n_tags > 0 {
                parts[3].parse::<i32>().unwrap_or(0)
            } else {
                0
            };
            let start = 3 + n_tags;

            let n_nodes = match elem_type {
                1 => 2,
                2 => 3,
                3 => 4,
                _ => continue,
            };
            if parts.len() < start + n_nodes {
                return Err(MeshError::malformed(format!(
                    "truncated element record: {t}"
                )));
            }

            let ns: Option<Vec<usize>> = parts[start..start + n_nodes]
                .iter()
                .map(|s| s.parse::<usize>().ok().and_then(|t| nm.get(&t).copied()))
                .collect();
            let ns = ns.ok_or_else(|| {
                MeshError::malformed(format!("element references unknown node: {t}"))
            })?;

            if elem_type == 1 {
                edges.push((tag, [ns[0], ns[1]]));
            } else {
                cells.push(ns);
            }
        }
        Ok((cells, edges))
    }
}
