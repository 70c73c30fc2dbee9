//! 媒体类型标识.

use std::fmt;
use std::str::FromStr;

use nalu_core::{NaluError, NaluResult};
use serde::{Deserialize, Serialize};

/// 编码族 (决定 NAL 头部布局与边界判定规则)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VideoCodec {
    /// H.264/AVC (含 SVC 扩展)
    H264,
    /// H.265/HEVC
    H265,
}

impl VideoCodec {
    /// 判定访问单元边界所需的 NAL 头部字节数
    ///
    /// H.265 除 2 字节头部外还需要切片头首字节 (first_slice_segment_in_pic_flag).
    pub fn header_probe_len(&self) -> usize {
        match self {
            Self::H264 => 1,
            Self::H265 => 3,
        }
    }
}

/// 媒体类型选择器
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MediaType {
    /// H.264/AVC
    #[serde(rename = "H264")]
    H264,
    /// H.264 可伸缩扩展 (SVC)
    #[serde(rename = "H264-SVC")]
    H264Svc,
    /// H.265/HEVC
    #[serde(rename = "H265")]
    H265,
}

impl MediaType {
    /// 获取编码族
    pub fn codec(&self) -> VideoCodec {
        match self {
            Self::H264 | Self::H264Svc => VideoCodec::H264,
            Self::H265 => VideoCodec::H265,
        }
    }

    /// 按文件扩展名推断媒体类型
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "264" | "h264" | "avc" => Some(Self::H264),
            "265" | "h265" | "hevc" => Some(Self::H265),
            _ => None,
        }
    }

    /// 名称 (与配置文件中的写法一致)
    pub fn name(&self) -> &'static str {
        match self {
            Self::H264 => "H264",
            Self::H264Svc => "H264-SVC",
            Self::H265 => "H265",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MediaType {
    type Err = NaluError;

    fn from_str(s: &str) -> NaluResult<Self> {
        match s.to_ascii_uppercase().as_str() {
            "H264" | "H.264" | "AVC" => Ok(Self::H264),
            "H264-SVC" | "H264SVC" | "SVC" => Ok(Self::H264Svc),
            "H265" | "H.265" | "HEVC" => Ok(Self::H265),
            _ => Err(NaluError::Unsupported(format!("媒体类型: {}", s))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_media_type() {
        assert_eq!("h264".parse::<MediaType>().unwrap(), MediaType::H264);
        assert_eq!("H264-SVC".parse::<MediaType>().unwrap(), MediaType::H264Svc);
        assert_eq!("hevc".parse::<MediaType>().unwrap(), MediaType::H265);
        assert!("VP8".parse::<MediaType>().is_err());
    }

    #[test]
    fn test_svc_uses_h264_family() {
        assert_eq!(MediaType::H264Svc.codec(), VideoCodec::H264);
        assert_eq!(MediaType::H265.codec().header_probe_len(), 3);
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&MediaType::H264Svc).unwrap();
        assert_eq!(json, "\"H264-SVC\"");
        let parsed: MediaType = serde_json::from_str("\"H265\"").unwrap();
        assert_eq!(parsed, MediaType::H265);
        assert_eq!(MediaType::from_extension("HEVC"), Some(MediaType::H265));
    }
}
