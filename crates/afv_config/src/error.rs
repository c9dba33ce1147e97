// crates/afv_config/src/error.rs

//! 配置层错误类型

/// 配置错误
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO 错误
    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),

    /// 语法错误
    #[error("控制文件第 {line} 行解析失败: {message}")]
    Parse {
        /// 行号（1 起）
        line: usize,
        /// 说明
        message: String,
    },

    /// 缺失必需键
    #[error("缺失配置项: {key}")]
    Missing {
        /// 完整键路径
        key: String,
    },

    /// 类型不符
    #[error("配置项 '{key}' 类型错误，期望 {expected}")]
    BadType {
        /// 完整键路径
        key: String,
        /// 期望的类型描述
        expected: &'static str,
    },

    /// 未识别的取值
    #[error("配置项 '{key}' 的取值 '{value}' 不可识别")]
    UnknownValue {
        /// 完整键路径
        key: String,
        /// 实际取值
        value: String,
    },

    /// include 文件解析失败
    #[error("无法包含文件 '{path}': {message}")]
    Include {
        /// include 的路径
        path: String,
        /// 说明
        message: String,
    },
}

/// 配置层结果类型别名
pub type ConfigResult<T> = Result<T, ConfigError>;
