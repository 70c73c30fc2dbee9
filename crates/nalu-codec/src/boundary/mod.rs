//! 访问单元边界判定.
//!
//! 每种编码族实现 [`AccessUnitBoundary`], 按码流顺序逐个观察 NAL 头部,
//! 判断该单元是否开启新的访问单元. 流式提取器与批量分组共用同一套判定.

mod h264;
mod h265;

pub use h264::H264Boundary;
pub use h265::H265Boundary;

use crate::media_type::VideoCodec;
use crate::parsers::NalHeader;

/// 访问单元边界判定 trait
pub trait AccessUnitBoundary: Send {
    /// 编码族
    fn codec(&self) -> VideoCodec;

    /// 观察下一个 NAL 单元头部, 返回它是否开启新的访问单元
    ///
    /// 每个 NAL 单元按码流顺序恰好调用一次.
    fn starts_access_unit(&mut self, header: &NalHeader) -> bool;

    /// 分配下一个解码顺序号 (DON), 不使用 DON 的编码族返回 None
    fn next_decoding_order_number(&mut self) -> Option<u16> {
        None
    }

    /// 清空状态, 回到码流起点
    fn reset(&mut self);
}

/// 为编码族创建边界判定器
pub fn boundary_for(codec: VideoCodec) -> Box<dyn AccessUnitBoundary> {
    match codec {
        VideoCodec::H264 => Box::new(H264Boundary::new()),
        VideoCodec::H265 => Box::new(H265Boundary::new()),
    }
}

/// 按边界判定把 NAL 单元序列分组为访问单元
///
/// 第一个单元总是开启第一个访问单元, 但仍会送入判定器以更新其状态.
pub fn group_access_units<T>(
    units: impl IntoIterator<Item = (NalHeader, T)>,
    boundary: &mut dyn AccessUnitBoundary,
) -> Vec<Vec<T>> {
    let mut groups: Vec<Vec<T>> = Vec::new();
    for (header, unit) in units {
        let starts = boundary.starts_access_unit(&header);
        match groups.last_mut() {
            Some(group) if !starts => group.push(unit),
            _ => groups.push(vec![unit]),
        }
    }
    groups
}
