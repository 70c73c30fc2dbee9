//! Annex B 码流解析器.
//!
//! 起始码扫描与两种编码族的 NAL 头部解析.

pub mod h264;
pub mod h265;
pub mod header;
pub mod start_code;

pub use header::NalHeader;
pub use start_code::{
    MIN_NAL_UNIT_LEN, NalUnitDescriptor, StartCode, StartCodeIndexer, StartCodeMatch,
    find_final_start_code, find_nal_unit, find_start_code, leading_start_code, scan_nal_units,
};
