//! # nalu-codec
//!
//! H.264/H.265 Annex B 码流解析库.
//!
//! - 起始码扫描与 NAL 头部解析 ([`parsers`])
//! - 访问单元边界判定 ([`boundary`])
//! - 流式与批量访问单元提取 ([`StreamingExtractor`])
//! - 访问单元时间戳 ([`timing`])
//! - 编码通道边界 ([`MediaTransform`])

pub mod boundary;
pub mod extractor;
pub mod media_sample;
pub mod media_type;
pub mod parsers;
pub mod timing;
pub mod transform;

pub use boundary::{AccessUnitBoundary, H264Boundary, H265Boundary, boundary_for};
pub use extractor::{ExtractStatus, Extraction, StreamingExtractor};
pub use media_sample::{AccessUnit, MediaSample};
pub use media_type::{MediaType, VideoCodec};
pub use parsers::{NalHeader, StartCode};
pub use timing::{AccessUnitClock, Timestamp, TimestampMode};
pub use transform::MediaTransform;
