//! 媒体样本: 一个 NAL 单元的负载及其元数据.

use chrono::{DateTime, Utc};
use nalu_core::ByteBuffer;

use crate::media_type::VideoCodec;
use crate::parsers::{NalHeader, StartCode, leading_start_code};

/// 访问单元: 构成一幅编码图像的有序样本序列
///
/// 最后一个样本的 marker 为 true, 其余为 false.
pub type AccessUnit = Vec<MediaSample>;

/// 媒体样本
///
/// 由生产者填写, 交给消费者之后不再修改.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MediaSample {
    /// 负载数据
    pub data: ByteBuffer,
    /// 展示时间 (秒)
    pub start_time: f64,
    /// 挂钟展示时间 (直播模式)
    pub presentation_time: Option<DateTime<Utc>>,
    /// 是否为访问单元的最后一个样本
    pub marker: bool,
    /// RTP 时间戳
    pub rtp_time: Option<u32>,
    /// 解码顺序号 (DON)
    pub decoding_order_number: Option<u16>,
    /// 流 ID 提示
    pub flow_id_hint: Option<u32>,
    /// 原码流中的起始码长度
    pub start_code: Option<StartCode>,
    /// `data` 是否仍包含起始码
    pub contains_start_code: bool,
}

impl MediaSample {
    /// 从负载数据创建样本
    pub fn new(data: impl Into<ByteBuffer>) -> Self {
        Self {
            data: data.into(),
            ..Self::default()
        }
    }

    /// NAL 单元数据 (含 NAL 头部, 不含起始码)
    pub fn payload(&self) -> &[u8] {
        let data = self.data.as_slice();
        match leading_start_code(data) {
            Some(sc) if self.contains_start_code => &data[sc.size()..],
            _ => data,
        }
    }

    /// 负载字节数 (不含起始码)
    pub fn payload_size(&self) -> usize {
        self.payload().len()
    }

    /// 解析 NAL 头部
    pub fn nal_header(&self, codec: VideoCodec) -> NalHeader {
        NalHeader::parse_truncated(codec, self.payload())
    }
}
