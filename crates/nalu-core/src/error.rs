//! 统一错误类型定义.
//!
//! 所有 NALU crate 共用的错误类型, 支持跨模块传播.

use thiserror::Error;

/// NALU 统一错误类型
#[derive(Debug, Error)]
pub enum NaluError {
    /// 无效参数
    #[error("无效参数: {0}")]
    InvalidArgument(String),

    /// 不支持的操作或媒体类型
    #[error("不支持的操作: {0}")]
    Unsupported(String),

    /// 无效数据 (缺少起始码, 码流过短等)
    #[error("无效数据: {0}")]
    InvalidData(String),

    /// I/O 错误
    #[error("I/O 错误: {0}")]
    Io(#[from] std::io::Error),

    /// 数据不足, 需要更多输入
    #[error("数据不足, 需要更多输入")]
    NeedMoreData,

    /// 已到达流末尾
    #[error("已到达流末尾")]
    Eof,

    /// 预留空间不足 (prepend / consume_postbuffer)
    #[error("预留空间不足: {0}")]
    Capacity(String),
}

/// NALU 统一 Result 类型
pub type NaluResult<T> = Result<T, NaluError>;
