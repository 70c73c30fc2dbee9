//! H.265 访问单元边界判定.
//!
//! 新访问单元开始于: AUD, 或 (first_slice_segment_in_pic_flag 为 1, 且
//! nuh_layer_id 为 0, 且上一个单元不是 VPS/SPS/PPS).
//!
//! nuh_layer_id > 0 的多层码流只按上述规则处理, 不做进一步推断.

use super::AccessUnitBoundary;
use crate::media_type::VideoCodec;
use crate::parsers::NalHeader;
use crate::parsers::h265::HevcNalUnitType;

/// H.265 边界判定器
#[derive(Debug, Clone, Default)]
pub struct H265Boundary {
    /// 上一个单元的类型
    previous_type: Option<HevcNalUnitType>,
    /// 下一个解码顺序号
    next_don: u16,
}

impl H265Boundary {
    pub fn new() -> Self {
        Self::default()
    }

    /// 指定第一个解码顺序号
    pub fn with_initial_don(don: u16) -> Self {
        Self {
            previous_type: None,
            next_don: don,
        }
    }
}

impl AccessUnitBoundary for H265Boundary {
    fn codec(&self) -> VideoCodec {
        VideoCodec::H265
    }

    fn starts_access_unit(&mut self, header: &NalHeader) -> bool {
        let nal_type = header.h265_type();
        let after_parameter_set = self
            .previous_type
            .is_some_and(|prev| prev.is_parameter_set());
        let starts = nal_type == HevcNalUnitType::Aud
            || (header.first_slice_segment && header.layer_id == 0 && !after_parameter_set);
        self.previous_type = Some(nal_type);
        starts
    }

    fn next_decoding_order_number(&mut self) -> Option<u16> {
        let don = self.next_don;
        self.next_don = self.next_don.wrapping_add(1);
        Some(don)
    }

    fn reset(&mut self) {
        self.previous_type = None;
        self.next_don = 0;
    }
}
