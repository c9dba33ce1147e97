// crates/afv_io/src/error.rs

//! 输出层错误类型

/// 输出错误
///
/// 非关键输出失败时调用方可以只警告并继续。
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    /// IO 错误
    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),

    /// 数据不一致
    #[error("输出数据不一致: {message}")]
    InvalidData {
        /// 说明
        message: String,
    },
}

/// 输出层结果类型别名
pub type OutputResult<T> = Result<T, OutputError>;
