//! H.264 SVC 扩展头解析与分层.
//!
//! 类型 14/20 的 NAL 单元在 1 字节头部之后携带 3 字节扩展:
//! ```text
//! svc_extension_flag(1) idr_flag(1) priority_id(6)
//! no_inter_layer_pred_flag(1) dependency_id(3) quality_id(4)
//! temporal_id(3) use_ref_base_pic_flag(1) discardable_flag(1)
//! output_flag(1) reserved_three_2bits(2)
//! ```

use nalu_core::{BitReader, NaluError, NaluResult};

use super::nal::NalUnitType;
use crate::media_sample::MediaSample;

/// SVC NAL 扩展头
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SvcExtensionHeader {
    pub idr: bool,
    pub priority_id: u8,
    pub no_inter_layer_pred: bool,
    pub dependency_id: u8,
    pub quality_id: u8,
    pub temporal_id: u8,
    pub use_ref_base_pic: bool,
    pub discardable: bool,
    pub output: bool,
    pub reserved_three_2bits: u8,
}

impl SvcExtensionHeader {
    /// 从 NAL 数据 (含 1 字节头部, 不含起始码) 解析
    ///
    /// 非类型 14/20 或 svc_extension_flag 为 0 (MVC 扩展) 时返回 `Ok(None)`.
    pub fn parse(nal: &[u8]) -> NaluResult<Option<Self>> {
        let Some(&first) = nal.first() else {
            return Err(NaluError::InvalidData("H.264: NAL 单元数据为空".into()));
        };
        if !matches!(
            NalUnitType::from_header_byte(first),
            NalUnitType::PrefixNal | NalUnitType::CodedSliceExtension
        ) {
            return Ok(None);
        }

        let mut br = BitReader::new(nal);
        br.skip_bits(8)?;
        if !br.read_flag()? {
            return Ok(None);
        }
        Ok(Some(Self {
            idr: br.read_flag()?,
            priority_id: br.read_u8(6)?,
            no_inter_layer_pred: br.read_flag()?,
            dependency_id: br.read_u8(3)?,
            quality_id: br.read_u8(4)?,
            temporal_id: br.read_u8(3)?,
            use_ref_base_pic: br.read_flag()?,
            discardable: br.read_flag()?,
            output: br.read_flag()?,
            reserved_three_2bits: br.read_u8(2)?,
        }))
    }

    /// 是否属于基本层 (dependency_id 与 quality_id 均为 0)
    pub fn is_base_layer(&self) -> bool {
        self.dependency_id == 0 && self.quality_id == 0
    }
}

/// 是否为仅增强层解码需要的 NAL 类型
pub fn is_enhancement_nal(nal_type: NalUnitType) -> bool {
    matches!(
        nal_type,
        NalUnitType::PrefixNal | NalUnitType::SubsetSps
    ) || nal_type.is_slice_extension()
}

/// 将一个访问单元拆分为 (基本层, 增强层) 两部分
///
/// 两部分各自保持原有顺序, 且各自最后一个样本的 marker 被置位.
pub fn split_layers(access_unit: Vec<MediaSample>) -> (Vec<MediaSample>, Vec<MediaSample>) {
    let (mut base, mut enhancement): (Vec<_>, Vec<_>) = access_unit
        .into_iter()
        .partition(|sample| match sample.payload().first() {
            Some(&byte) => !is_enhancement_nal(NalUnitType::from_header_byte(byte)),
            None => true,
        });

    for layer in [&mut base, &mut enhancement] {
        let last = layer.len().saturating_sub(1);
        for (i, sample) in layer.iter_mut().enumerate() {
            sample.marker = i == last;
        }
    }
    (base, enhancement)
}
