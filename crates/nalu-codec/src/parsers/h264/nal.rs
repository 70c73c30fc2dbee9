//! H.264 NAL 单元类型.
//!
//! # NAL 头部 (1 字节)
//! ```text
//! ┌─────────────────────────────────────┐
//! │ forbidden(1) | ref_idc(2) | type(5) │
//! └─────────────────────────────────────┘
//! ```
//!
//! SVC 扩展 (Annex G) 引入类型 14 (前缀 NAL) 与 20 (切片扩展),
//! 二者在 1 字节头部之后还带有 3 字节的 SVC 扩展头.

/// NAL 单元类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NalUnitType {
    /// 非 IDR 图像切片 (P/B slice)
    Slice,
    /// 数据分区 A (DPA)
    SliceDpa,
    /// 数据分区 B (DPB)
    SliceDpb,
    /// 数据分区 C (DPC)
    SliceDpc,
    /// IDR 图像切片 (关键帧)
    SliceIdr,
    /// 增补增强信息 (SEI)
    Sei,
    /// 序列参数集 (SPS)
    Sps,
    /// 图像参数集 (PPS)
    Pps,
    /// 访问单元分隔符 (AUD)
    Aud,
    /// 序列结束
    EndOfSequence,
    /// 流结束
    EndOfStream,
    /// 填充数据
    FillerData,
    /// SPS 扩展
    SpsExtension,
    /// 前缀 NAL (SVC/MVC)
    PrefixNal,
    /// 子集 SPS (SVC/MVC)
    SubsetSps,
    /// 辅助图像切片
    AuxiliarySlice,
    /// 切片扩展 (SVC 增强层)
    CodedSliceExtension,
    /// 类型 21, 深度视图切片扩展 (早期版本中为保留类型)
    CodedSliceExtensionDepth,
    /// 未知类型
    Unknown(u8),
}

impl NalUnitType {
    /// 从 NAL 类型编号创建
    pub fn from_type_id(type_id: u8) -> Self {
        match type_id {
            1 => Self::Slice,
            2 => Self::SliceDpa,
            3 => Self::SliceDpb,
            4 => Self::SliceDpc,
            5 => Self::SliceIdr,
            6 => Self::Sei,
            7 => Self::Sps,
            8 => Self::Pps,
            9 => Self::Aud,
            10 => Self::EndOfSequence,
            11 => Self::EndOfStream,
            12 => Self::FillerData,
            13 => Self::SpsExtension,
            14 => Self::PrefixNal,
            15 => Self::SubsetSps,
            19 => Self::AuxiliarySlice,
            20 => Self::CodedSliceExtension,
            21 => Self::CodedSliceExtensionDepth,
            _ => Self::Unknown(type_id),
        }
    }

    /// 从 NAL 头部字节解析 (取低 5 位)
    pub fn from_header_byte(byte: u8) -> Self {
        Self::from_type_id(byte & 0x1F)
    }

    /// 获取类型编号
    pub fn type_id(&self) -> u8 {
        match self {
            Self::Slice => 1,
            Self::SliceDpa => 2,
            Self::SliceDpb => 3,
            Self::SliceDpc => 4,
            Self::SliceIdr => 5,
            Self::Sei => 6,
            Self::Sps => 7,
            Self::Pps => 8,
            Self::Aud => 9,
            Self::EndOfSequence => 10,
            Self::EndOfStream => 11,
            Self::FillerData => 12,
            Self::SpsExtension => 13,
            Self::PrefixNal => 14,
            Self::SubsetSps => 15,
            Self::AuxiliarySlice => 19,
            Self::CodedSliceExtension => 20,
            Self::CodedSliceExtensionDepth => 21,
            Self::Unknown(id) => *id,
        }
    }

    /// 是否为 VCL (Video Coding Layer) NAL
    pub fn is_vcl(&self) -> bool {
        matches!(
            self,
            Self::Slice | Self::SliceDpa | Self::SliceDpb | Self::SliceDpc | Self::SliceIdr
        )
    }

    /// 是否为关键帧 (IDR)
    pub fn is_idr(&self) -> bool {
        matches!(self, Self::SliceIdr)
    }

    /// 是否为参数集 (SPS/PPS/子集 SPS)
    pub fn is_parameter_set(&self) -> bool {
        matches!(self, Self::Sps | Self::Pps | Self::SubsetSps)
    }

    /// 是否为增强层切片扩展 (类型 20/21)
    pub fn is_slice_extension(&self) -> bool {
        matches!(
            self,
            Self::CodedSliceExtension | Self::CodedSliceExtensionDepth
        )
    }
}

impl std::fmt::Display for NalUnitType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Slice => write!(f, "Slice"),
            Self::SliceDpa => write!(f, "SliceDPA"),
            Self::SliceDpb => write!(f, "SliceDPB"),
            Self::SliceDpc => write!(f, "SliceDPC"),
            Self::SliceIdr => write!(f, "IDR"),
            Self::Sei => write!(f, "SEI"),
            Self::Sps => write!(f, "SPS"),
            Self::Pps => write!(f, "PPS"),
            Self::Aud => write!(f, "AUD"),
            Self::EndOfSequence => write!(f, "EndOfSeq"),
            Self::EndOfStream => write!(f, "EndOfStream"),
            Self::FillerData => write!(f, "Filler"),
            Self::SpsExtension => write!(f, "SPSExt"),
            Self::PrefixNal => write!(f, "Prefix"),
            Self::SubsetSps => write!(f, "SubsetSPS"),
            Self::AuxiliarySlice => write!(f, "AuxSlice"),
            Self::CodedSliceExtension => write!(f, "SliceExt"),
            Self::CodedSliceExtensionDepth => write!(f, "SliceExtDepth"),
            Self::Unknown(id) => write!(f, "Unknown({id})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_id_roundtrip() {
        for id in 0..32u8 {
            assert_eq!(NalUnitType::from_type_id(id).type_id(), id);
        }
    }

    #[test]
    fn test_header_byte_masks_ref_idc() {
        // 0x67 = ref_idc 3, type 7
        assert_eq!(NalUnitType::from_header_byte(0x67), NalUnitType::Sps);
        assert_eq!(NalUnitType::from_header_byte(0x09), NalUnitType::Aud);
        assert_eq!(
            NalUnitType::from_header_byte(0x74),
            NalUnitType::CodedSliceExtension
        );
    }

    #[test]
    fn test_classification() {
        assert!(NalUnitType::SliceIdr.is_vcl());
        assert!(!NalUnitType::Sps.is_vcl());
        assert!(NalUnitType::CodedSliceExtensionDepth.is_slice_extension());
        assert!(!NalUnitType::PrefixNal.is_slice_extension());
        assert_eq!(NalUnitType::Unknown(30).to_string(), "Unknown(30)");
    }
}
