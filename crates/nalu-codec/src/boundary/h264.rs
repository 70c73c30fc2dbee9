//! H.264 (含 SVC) 访问单元边界判定.
//!
//! - AUD 开启新的访问单元.
//! - 切片扩展 (类型 20/21) 属于增强层, 延续当前访问单元.
//! - 增强层之后出现的任意非扩展单元回到基本层, 开启新的访问单元.

use super::AccessUnitBoundary;
use crate::media_type::VideoCodec;
use crate::parsers::NalHeader;
use crate::parsers::h264::NalUnitType;

/// H.264 边界判定器
#[derive(Debug, Clone)]
pub struct H264Boundary {
    /// 上一个单元是否属于基本层
    base_layer: bool,
}

impl Default for H264Boundary {
    fn default() -> Self {
        Self::new()
    }
}

impl H264Boundary {
    pub fn new() -> Self {
        Self { base_layer: true }
    }
}

impl AccessUnitBoundary for H264Boundary {
    fn codec(&self) -> VideoCodec {
        VideoCodec::H264
    }

    fn starts_access_unit(&mut self, header: &NalHeader) -> bool {
        let nal_type = header.h264_type();
        let extension = nal_type.is_slice_extension();
        if nal_type == NalUnitType::Aud || (!self.base_layer && !extension) {
            self.base_layer = true;
            true
        } else {
            if extension {
                self.base_layer = false;
            }
            false
        }
    }

    fn reset(&mut self) {
        self.base_layer = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(boundary: &mut H264Boundary, types: &[u8]) -> Vec<bool> {
        types
            .iter()
            .map(|&t| {
                boundary.starts_access_unit(&NalHeader::parse_truncated(VideoCodec::H264, &[t]))
            })
            .collect()
    }

    #[test]
    fn test_aud_starts_access_unit() {
        let mut b = H264Boundary::new();
        assert_eq!(
            feed(&mut b, &[9, 7, 8, 5, 9, 1]),
            vec![true, false, false, false, true, false]
        );
    }

    #[test]
    fn test_enhancement_layer_continues_access_unit() {
        let mut b = H264Boundary::new();
        // AUD, 基本层切片, 两个增强层切片, 然后下一幅图像的基本层切片 (无 AUD)
        assert_eq!(
            feed(&mut b, &[9, 14, 1, 20, 20, 14, 1]),
            vec![true, false, false, false, false, true, false]
        );
    }

    #[test]
    fn test_type_21_is_extension() {
        let mut b = H264Boundary::new();
        assert_eq!(feed(&mut b, &[5, 21, 21, 6]), vec![false, false, false, true]);
        b.reset();
        assert_eq!(feed(&mut b, &[6]), vec![false]);
    }
}
