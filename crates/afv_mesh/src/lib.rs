// crates/afv_mesh/src/lib.rs

//! 非结构二维网格：GMSH 读取、拓扑预处理与只读视图
//!
//! 本 crate 为求解器提供只读的网格邻接与几何查询。
//! 空间离散层只借用 [`FvMesh`]，不承担其所有权。

pub mod error;
pub mod gmsh;
pub mod topology;

pub use error::{MeshError, MeshResult};
pub use gmsh::{GmshLoader, GmshMeshData};
pub use topology::{Face, FvMesh, PeriodicAxis, INTERIOR_MARKER};
