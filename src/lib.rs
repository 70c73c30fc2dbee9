//! # nalu
//!
//! 纯 Rust 实现的 H.264/H.265 Annex B 访问单元提取库.
//!
//! - **码流解析**: 起始码扫描, NAL 头部与 SVC 扩展头部解析
//! - **边界判定**: H.264 (含 SVC) 与 H.265 访问单元边界
//! - **提取**: 流式提取与批量提取
//! - **媒体源**: 预扫描索引的 Annex B 文件源, 原始 YUV 源, 分块流读取
//!
//! # 快速开始
//!
//! ```rust,no_run
//! use nalu::codec::{MediaType, StreamingExtractor, TimestampMode};
//!
//! let data = std::fs::read("clip.264").unwrap();
//! let extractor = StreamingExtractor::new(MediaType::H264, TimestampMode::None);
//! let access_units = extractor.extract_all(&data, 0.0).unwrap();
//! println!("访问单元: {}", access_units.len());
//! ```
//!
//! # Crate 结构
//!
//! | Crate | 功能 |
//! |-------|------|
//! | `nalu-core` | 错误类型, 字节缓冲区, 位读写 |
//! | `nalu-codec` | 起始码扫描, 边界判定, 访问单元提取 |
//! | `nalu-format` | I/O, 媒体源, Annex B 写出 |

/// 错误类型, 字节缓冲区与位读写
pub use nalu_core as core;

/// 码流解析与访问单元提取
pub use nalu_codec as codec;

/// 媒体源与 Annex B 写出
pub use nalu_format as format;

/// 获取版本号
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
