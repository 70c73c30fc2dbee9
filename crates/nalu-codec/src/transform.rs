//! 编码通道 trait 定义.
//!
//! 编码器实现 (第三方 SDK 封装等) 不在本库范围内, 这里只约定其边界:
//! 输入原始图像样本, 输出带类型信息的编码负载.

use nalu_core::NaluResult;

use crate::media_sample::MediaSample;
use crate::media_type::MediaType;

/// 媒体变换 trait
///
/// 流程:
/// 1. 调用 `transform()` 送入一个访问单元的原始样本, 取回已产出的编码样本
/// 2. 编码器可能延迟产出, 因此单次调用可能返回空
/// 3. 输入结束后调用 `flush()` 取出剩余样本
pub trait MediaTransform: Send {
    /// 变换名称
    fn name(&self) -> &str;

    /// 输出的媒体类型
    fn output_media_type(&self) -> MediaType;

    /// 送入原始样本, 返回已产出的编码样本 (Annex B 或裸 NAL 负载)
    fn transform(&mut self, input: &[MediaSample]) -> NaluResult<Vec<MediaSample>>;

    /// 取出缓存的编码样本
    fn flush(&mut self) -> NaluResult<Vec<MediaSample>> {
        Ok(Vec::new())
    }
}
