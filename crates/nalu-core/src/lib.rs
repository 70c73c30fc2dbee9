//! # nalu-core
//!
//! NALU 核心类型与工具库.
//!
//! 提供 Annex B 码流处理所需的基础设施:
//! - 错误类型 ([`NaluError`], [`NaluResult`])
//! - 带前后预留空间的字节缓冲区 ([`ByteBuffer`])
//! - 比特流读写 ([`BitReader`], [`BitWriter`])

pub mod bitreader;
pub mod bitwriter;
pub mod buffer;
pub mod error;

pub use bitreader::BitReader;
pub use bitwriter::BitWriter;
pub use buffer::ByteBuffer;
pub use error::{NaluError, NaluResult};
