//! 两种编码族共用的 NAL 头部摘要.
//!
//! 只包含判定访问单元边界所需的字段.

use super::h264::NalUnitType;
use super::h265::HevcNalUnitType;
use crate::media_type::VideoCodec;

/// NAL 头部摘要
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NalHeader {
    /// 编码族
    pub codec: VideoCodec,
    /// NAL 类型编号
    pub nal_type: u8,
    /// nuh_layer_id (H.264 恒为 0)
    pub layer_id: u8,
    /// nuh_temporal_id_plus1 (H.264 恒为 0)
    pub temporal_id_plus1: u8,
    /// 是否为图像的第一个切片段 (H.264 恒为 false)
    pub first_slice_segment: bool,
}

impl NalHeader {
    /// 解析 NAL 头部, 字节不足 `codec.header_probe_len()` 时返回 None
    pub fn parse(codec: VideoCodec, payload: &[u8]) -> Option<Self> {
        if payload.len() < codec.header_probe_len() {
            return None;
        }
        Some(Self::parse_truncated(codec, payload))
    }

    /// 解析 NAL 头部, 缺失的字节按 0 处理
    ///
    /// 用于码流末尾被截断的 NAL 单元.
    pub fn parse_truncated(codec: VideoCodec, payload: &[u8]) -> Self {
        let byte = |i: usize| payload.get(i).copied().unwrap_or(0);
        match codec {
            VideoCodec::H264 => Self {
                codec,
                nal_type: byte(0) & 0x1F,
                layer_id: 0,
                temporal_id_plus1: 0,
                first_slice_segment: false,
            },
            VideoCodec::H265 => {
                let nal_type = (byte(0) & 0x7E) >> 1;
                let first_slice_segment = (byte(2) & 0x80) != 0
                    && HevcNalUnitType::from_type_id(nal_type).may_start_picture();
                Self {
                    codec,
                    nal_type,
                    layer_id: ((byte(0) & 0x01) << 5) | ((byte(1) & 0xF8) >> 3),
                    temporal_id_plus1: byte(1) & 0x07,
                    first_slice_segment,
                }
            }
        }
    }

    /// 按 H.264 解释类型
    pub fn h264_type(&self) -> NalUnitType {
        NalUnitType::from_type_id(self.nal_type)
    }

    /// 按 H.265 解释类型
    pub fn h265_type(&self) -> HevcNalUnitType {
        HevcNalUnitType::from_type_id(self.nal_type)
    }

    /// 是否为访问单元分隔符
    pub fn is_aud(&self) -> bool {
        match self.codec {
            VideoCodec::H264 => self.h264_type() == NalUnitType::Aud,
            VideoCodec::H265 => self.h265_type() == HevcNalUnitType::Aud,
        }
    }

    /// 是否为参数集 (H.264 SPS/PPS, H.265 VPS/SPS/PPS)
    pub fn is_parameter_set(&self) -> bool {
        match self.codec {
            VideoCodec::H264 => self.h264_type().is_parameter_set(),
            VideoCodec::H265 => self.h265_type().is_parameter_set(),
        }
    }

    /// 是否为 VCL 单元 (携带切片数据)
    pub fn is_vcl(&self) -> bool {
        match self.codec {
            VideoCodec::H264 => self.h264_type().is_vcl(),
            VideoCodec::H265 => self.h265_type().is_vcl(),
        }
    }

    /// 是否为随机访问点 (H.264 IDR, H.265 IRAP)
    pub fn is_random_access(&self) -> bool {
        match self.codec {
            VideoCodec::H264 => self.h264_type().is_idr(),
            VideoCodec::H265 => self.h265_type().is_irap(),
        }
    }

    /// 类型名称, 用于日志
    pub fn type_name(&self) -> String {
        match self.codec {
            VideoCodec::H264 => self.h264_type().to_string(),
            VideoCodec::H265 => self.h265_type().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_h264() {
        let hdr = NalHeader::parse(VideoCodec::H264, &[0x65]).unwrap();
        assert_eq!(hdr.h264_type(), NalUnitType::SliceIdr);
        assert_eq!(hdr.layer_id, 0);
        assert!(NalHeader::parse(VideoCodec::H264, &[]).is_none());
    }

    #[test]
    fn test_parse_h265_fields() {
        // type=1 (TRAIL_R), layer_id=0b100001, tid_plus1=2, first_slice=1
        let hdr = NalHeader::parse(VideoCodec::H265, &[0x03, 0x0A, 0x80]).unwrap();
        assert_eq!(hdr.h265_type(), HevcNalUnitType::TrailR);
        assert_eq!(hdr.layer_id, 0b100001);
        assert_eq!(hdr.temporal_id_plus1, 2);
        assert!(hdr.first_slice_segment);
    }

    #[test]
    fn test_h265_first_slice_masked_for_parameter_sets() {
        let pps = NalHeader::parse(VideoCodec::H265, &[0x44, 0x01, 0xC1]).unwrap();
        assert_eq!(pps.h265_type(), HevcNalUnitType::Pps);
        assert!(!pps.first_slice_segment);
        let sei = NalHeader::parse(VideoCodec::H265, &[0x4E, 0x01, 0x80]).unwrap();
        assert!(!sei.first_slice_segment);
    }

    #[test]
    fn test_h265_truncated() {
        assert!(NalHeader::parse(VideoCodec::H265, &[0x26, 0x01]).is_none());
        let hdr = NalHeader::parse_truncated(VideoCodec::H265, &[0x26, 0x01]);
        assert_eq!(hdr.h265_type(), HevcNalUnitType::IdrWRadl);
        assert!(!hdr.first_slice_segment);
    }

    #[test]
    fn test_vcl_and_random_access() {
        let idr = NalHeader::parse(VideoCodec::H264, &[0x65]).unwrap();
        assert!(idr.is_vcl());
        assert!(idr.is_random_access());
        let non_idr = NalHeader::parse(VideoCodec::H264, &[0x41]).unwrap();
        assert!(non_idr.is_vcl());
        assert!(!non_idr.is_random_access());
        let sps = NalHeader::parse(VideoCodec::H264, &[0x67]).unwrap();
        assert!(!sps.is_vcl());
        assert!(!sps.is_random_access());

        let cra = NalHeader::parse(VideoCodec::H265, &[0x2A, 0x01, 0x80]).unwrap();
        assert_eq!(cra.h265_type(), HevcNalUnitType::Cra);
        assert!(cra.is_vcl());
        assert!(cra.is_random_access());
        let trail = NalHeader::parse(VideoCodec::H265, &[0x02, 0x01, 0x80]).unwrap();
        assert!(trail.is_vcl());
        assert!(!trail.is_random_access());
        let vps = NalHeader::parse(VideoCodec::H265, &[0x40, 0x01, 0x0C]).unwrap();
        assert!(!vps.is_vcl());
    }
}
