//! H.265/HEVC 码流解析.

pub mod nal;

pub use nal::HevcNalUnitType;
