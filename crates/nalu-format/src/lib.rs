//! # nalu-format
//!
//! NALU 媒体源与输出库.
//!
//! - I/O 抽象 ([`io`])
//! - 索引媒体源与 YUV 媒体源 ([`source`])
//! - 分块 Annex B 流读取 ([`AnnexBStreamReader`])
//! - Annex B 写出 ([`AnnexBWriter`])

pub mod io;
pub mod reader;
pub mod sink;
pub mod source;

pub use io::IoContext;
pub use reader::AnnexBStreamReader;
pub use sink::{AnnexBWriter, build_aud};
pub use source::{
    IndexedMediaSource, LoopConfig, MediaSource, SourceConfig, YuvConfig, YuvMediaSource,
};
