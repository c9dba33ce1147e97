// crates/afv_mesh/src/error.rs

//! 网格层错误类型

use std::path::PathBuf;

/// 网格错误
#[derive(Debug, thiserror::Error)]
pub enum MeshError {
    /// IO 错误
    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),

    /// 无法打开网格文件
    #[error("无法打开网格文件: {path}")]
    FileNotFound {
        /// 请求的文件路径
        path: PathBuf,
    },

    /// 网格文件格式错误
    #[error("网格文件格式错误: {message}")]
    Malformed {
        /// 说明
        message: String,
    },

    /// 配置引用的边界标记在网格中不存在
    #[error("边界标记 {marker} 在网格中不存在")]
    UnknownMarker {
        /// 缺失的物理标记
        marker: i32,
    },

    /// 拓扑不一致
    #[error("拓扑错误: {message}")]
    Topology {
        /// 说明
        message: String,
    },
}

/// 网格层结果类型别名
pub type MeshResult<T> = Result<T, MeshError>;

impl MeshError {
    /// 创建格式错误
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed {
            message: message.into(),
        }
    }

    /// 创建拓扑错误
    pub fn topology(message: impl Into<String>) -> Self {
        Self::Topology {
            message: message.into(),
        }
    }
}
