//! 流式访问单元提取器.
//!
//! 调用方按任意分块送入 Annex B 数据, 提取器每次处理缓冲区开头的一个 NAL 单元.
//! 一个样本的 marker 取决于其后继单元是否开启新的访问单元, 因此提取器始终
//! 缓存一个样本, 待后继单元的类型确定后才将其交出.
//!
//! 调用约定:
//! - `Consumed(n)`: 调用方丢弃缓冲区前 n 字节后再次调用
//! - `NeedMoreData`: 调用方追加数据后以同一缓冲区再次调用
//! - `EndOfStream`: 码流结束, 最后一个样本已交出

use log::{debug, trace};
use nalu_core::{ByteBuffer, NaluError, NaluResult};

use crate::boundary::{AccessUnitBoundary, boundary_for, group_access_units};
use crate::media_sample::{AccessUnit, MediaSample};
use crate::media_type::MediaType;
use crate::parsers::{
    MIN_NAL_UNIT_LEN, NalHeader, find_final_start_code, find_start_code, leading_start_code,
    scan_nal_units,
};
use crate::timing::{AccessUnitClock, Timestamp, TimestampMode};

/// 查找下一个起始码的起点 (跳过最短起始码)
const NEXT_SEARCH_OFFSET: usize = 3;

/// 一次提取调用的状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractStatus {
    /// 已消耗缓冲区前 n 字节
    Consumed(usize),
    /// 边界尚不能确定, 需要更多数据
    NeedMoreData,
    /// 码流结束
    EndOfStream,
}

/// 一次提取调用的结果
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    /// 交出的样本 (上一次缓存的单元)
    pub sample: Option<MediaSample>,
    /// 调用状态
    pub status: ExtractStatus,
}

impl Extraction {
    fn need_more_data() -> Self {
        Self {
            sample: None,
            status: ExtractStatus::NeedMoreData,
        }
    }

    /// 以整数表示的消耗长度: 结束为 -1, 需要更多数据为 0
    pub fn consumed_length(&self) -> isize {
        match self.status {
            ExtractStatus::Consumed(n) => n as isize,
            ExtractStatus::NeedMoreData => 0,
            ExtractStatus::EndOfStream => -1,
        }
    }
}

/// 流式访问单元提取器
pub struct StreamingExtractor {
    media_type: MediaType,
    boundary: Box<dyn AccessUnitBoundary>,
    clock: AccessUnitClock,
    /// 待交出的样本
    pending: Option<MediaSample>,
    /// 缓冲区开头的单元是否开启新的访问单元
    new_access_unit: bool,
    /// 是否已观察过第一个单元
    primed: bool,
    /// 已开始的访问单元数
    access_unit_count: u64,
    /// 当前访问单元的时间戳
    current_time: Timestamp,
}

impl StreamingExtractor {
    /// 创建提取器
    pub fn new(media_type: MediaType, timestamp_mode: TimestampMode) -> Self {
        Self::with_boundary(media_type, boundary_for(media_type.codec()), timestamp_mode)
    }

    /// 使用指定的边界判定器创建提取器
    pub fn with_boundary(
        media_type: MediaType,
        boundary: Box<dyn AccessUnitBoundary>,
        timestamp_mode: TimestampMode,
    ) -> Self {
        Self {
            media_type,
            boundary,
            clock: AccessUnitClock::new(timestamp_mode),
            pending: None,
            new_access_unit: true,
            primed: false,
            access_unit_count: 0,
            current_time: Timestamp::default(),
        }
    }

    pub fn media_type(&self) -> MediaType {
        self.media_type
    }

    /// 已开始的访问单元数
    pub fn access_unit_count(&self) -> u64 {
        self.access_unit_count
    }

    /// 处理缓冲区开头的 NAL 单元
    ///
    /// `buffer` 必须以起始码开头. `more_data_waiting` 表示码流尚未结束.
    pub fn extract(&mut self, buffer: &[u8], more_data_waiting: bool) -> NaluResult<Extraction> {
        if buffer.len() < MIN_NAL_UNIT_LEN {
            if more_data_waiting {
                return Ok(Extraction::need_more_data());
            }
            return Ok(Extraction {
                sample: self.flush(),
                status: ExtractStatus::EndOfStream,
            });
        }

        let Some(start_code) = leading_start_code(buffer) else {
            return Err(NaluError::InvalidData(
                "Annex B: 缓冲区开头缺少起始码".into(),
            ));
        };
        let payload_offset = start_code.size();
        let codec = self.media_type.codec();

        // 流结束后缓冲区已完整, 末尾只带 1 字节负载的起始码也是一个单元
        let next = if more_data_waiting {
            find_start_code(buffer, NEXT_SEARCH_OFFSET)
        } else {
            find_final_start_code(buffer, NEXT_SEARCH_OFFSET)
        };
        let next_header = match next {
            Some(m) => {
                let probe = &buffer[m.payload_offset()..];
                match NalHeader::parse(codec, probe) {
                    Some(header) => Some(header),
                    None if more_data_waiting => return Ok(Extraction::need_more_data()),
                    None => Some(NalHeader::parse_truncated(codec, probe)),
                }
            }
            None if more_data_waiting => return Ok(Extraction::need_more_data()),
            None => None,
        };

        if !self.primed {
            let header = NalHeader::parse_truncated(codec, &buffer[payload_offset..]);
            self.boundary.starts_access_unit(&header);
            self.primed = true;
            self.new_access_unit = true;
        }

        let end = next.map_or(buffer.len(), |m| m.offset.max(payload_offset));

        let emitted = self.pending.take().map(|mut prev| {
            prev.marker = self.new_access_unit;
            prev
        });

        if self.new_access_unit {
            self.current_time = self.clock.stamp(self.access_unit_count);
            self.access_unit_count += 1;
            trace!(
                "访问单元 #{} 开始, t={:.3}",
                self.access_unit_count - 1,
                self.current_time.seconds
            );
        }

        let mut sample = MediaSample::new(ByteBuffer::from(&buffer[payload_offset..end]));
        sample.start_time = self.current_time.seconds;
        sample.presentation_time = self.current_time.wall_clock;
        sample.start_code = Some(start_code);
        sample.decoding_order_number = self.boundary.next_decoding_order_number();

        match next_header {
            Some(header) => {
                self.new_access_unit = self.boundary.starts_access_unit(&header);
            }
            None => {
                // 最后一个单元
                sample.marker = true;
                self.new_access_unit = true;
            }
        }
        self.pending = Some(sample);

        Ok(Extraction {
            sample: emitted,
            status: ExtractStatus::Consumed(end),
        })
    }

    /// 交出缓存的样本 (marker 置位)
    pub fn flush(&mut self) -> Option<MediaSample> {
        self.pending.take().map(|mut sample| {
            sample.marker = true;
            sample
        })
    }

    /// 回到初始状态
    pub fn reset(&mut self) {
        self.boundary.reset();
        self.clock.reset();
        self.pending = None;
        self.new_access_unit = true;
        self.primed = false;
        self.access_unit_count = 0;
        self.current_time = Timestamp::default();
    }

    /// 批量提取: 缓冲区包含一个或多个完整的访问单元
    ///
    /// 不与流式状态交互. 所有样本使用同一时间 `start_time`,
    /// 每组最后一个样本的 marker 置位.
    pub fn extract_all(&self, buffer: &[u8], start_time: f64) -> NaluResult<Vec<AccessUnit>> {
        if buffer.len() < MIN_NAL_UNIT_LEN {
            return Ok(Vec::new());
        }
        if leading_start_code(buffer).is_none() {
            return Err(NaluError::InvalidData(
                "Annex B: 缓冲区开头缺少起始码".into(),
            ));
        }

        let codec = self.media_type.codec();
        let mut boundary = boundary_for(codec);
        let units = scan_nal_units(buffer).into_iter().map(|unit| {
            let start = unit.payload_offset as usize;
            let end = unit.end_offset() as usize;
            let mut sample = MediaSample::new(ByteBuffer::from(&buffer[start..end]));
            sample.start_time = start_time;
            sample.start_code = Some(unit.start_code);
            (unit.header(codec), sample)
        });
        let mut groups = group_access_units(units, boundary.as_mut());

        for group in &mut groups {
            let last = group.len().saturating_sub(1);
            for (i, sample) in group.iter_mut().enumerate() {
                sample.marker = i == last;
                sample.decoding_order_number = boundary.next_decoding_order_number();
            }
        }
        debug!(
            "{} 批量提取: {} 字节, {} 个访问单元",
            self.media_type,
            buffer.len(),
            groups.len()
        );
        Ok(groups)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn h264_stream() -> Vec<u8> {
        [
            &[0u8, 0, 0, 1, 0x09, 0xF0][..],
            &[0, 0, 0, 1, 0x67, 0x42, 0x00, 0x1E],
            &[0, 0, 0, 1, 0x68, 0xCE, 0x38, 0x80],
            &[0, 0, 1, 0x65, 0x88, 0x84, 0x21],
            &[0, 0, 0, 1, 0x09, 0xF0],
            &[0, 0, 1, 0x41, 0x9A, 0x02, 0x11],
        ]
        .concat()
    }

    /// 以完整缓冲区驱动提取器直到结束
    fn drive(extractor: &mut StreamingExtractor, data: &[u8]) -> Vec<MediaSample> {
        let mut out = Vec::new();
        let mut pos = 0;
        loop {
            let result = extractor.extract(&data[pos..], false).unwrap();
            out.extend(result.sample);
            match result.status {
                ExtractStatus::Consumed(n) => pos += n,
                ExtractStatus::EndOfStream => break,
                ExtractStatus::NeedMoreData => unreachable!(),
            }
        }
        out
    }

    #[test]
    fn test_extract_emits_previous_sample() {
        let data = h264_stream();
        let mut ex = StreamingExtractor::new(MediaType::H264, TimestampMode::None);

        let first = ex.extract(&data, false).unwrap();
        assert_eq!(first.sample, None);
        assert_eq!(first.status, ExtractStatus::Consumed(6));
        assert_eq!(first.consumed_length(), 6);

        let second = ex.extract(&data[6..], false).unwrap();
        let aud = second.sample.unwrap();
        assert_eq!(aud.payload(), &[0x09, 0xF0]);
        assert!(!aud.marker);
        assert_eq!(aud.start_code, Some(crate::parsers::StartCode::Long));
    }

    #[test]
    fn test_markers_follow_access_units() {
        let data = h264_stream();
        let mut ex = StreamingExtractor::new(MediaType::H264, TimestampMode::FrameRate { fps: 25 });
        let samples = drive(&mut ex, &data);
        let markers: Vec<bool> = samples.iter().map(|s| s.marker).collect();
        assert_eq!(markers, vec![false, false, false, true, false, true]);
        assert_eq!(ex.access_unit_count(), 2);
        assert_eq!(samples[3].start_time, 0.0);
        assert_eq!(samples[4].start_time, 0.04);
        assert_eq!(samples[5].payload(), &[0x41, 0x9A, 0x02, 0x11]);
    }

    #[test]
    fn test_short_buffer() {
        let mut ex = StreamingExtractor::new(MediaType::H264, TimestampMode::None);
        let r = ex.extract(&[0, 0, 1, 9], true).unwrap();
        assert_eq!(r.status, ExtractStatus::NeedMoreData);
        assert_eq!(r.consumed_length(), 0);
        let r = ex.extract(&[0, 0, 1, 9], false).unwrap();
        assert_eq!(r.status, ExtractStatus::EndOfStream);
        assert_eq!(r.consumed_length(), -1);
        assert_eq!(r.sample, None);
    }

    #[test]
    fn test_missing_start_code_is_error() {
        let mut ex = StreamingExtractor::new(MediaType::H264, TimestampMode::None);
        let err = ex.extract(&[0x12, 0x34, 0x56, 0x78, 0x9A, 0xBC], true);
        assert!(matches!(err, Err(NaluError::InvalidData(_))));
        let ex = StreamingExtractor::new(MediaType::H264, TimestampMode::None);
        assert!(ex.extract_all(&[1, 2, 3, 4, 5, 6], 0.0).is_err());
    }

    #[test]
    fn test_unresolved_tail_waits_for_data() {
        let data = h264_stream();
        let mut ex = StreamingExtractor::new(MediaType::H264, TimestampMode::None);
        // 只有第一个单元和半个起始码
        let r = ex.extract(&data[..8], true).unwrap();
        assert_eq!(r.status, ExtractStatus::NeedMoreData);
        let r = ex.extract(&data[..12], true).unwrap();
        assert_eq!(r.status, ExtractStatus::Consumed(6));
    }

    #[test]
    fn test_flush_is_idempotent() {
        let data = h264_stream();
        let mut ex = StreamingExtractor::new(MediaType::H264, TimestampMode::None);
        ex.extract(&data, true).unwrap();
        let flushed = ex.flush().unwrap();
        assert!(flushed.marker);
        assert!(ex.flush().is_none());
    }

    #[test]
    fn test_extract_all_groups() {
        let data = h264_stream();
        let ex = StreamingExtractor::new(MediaType::H264, TimestampMode::None);
        let groups = ex.extract_all(&data, 1.5).unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].len(), 4);
        assert_eq!(groups[1].len(), 2);
        for group in &groups {
            let (last, rest) = group.split_last().unwrap();
            assert!(last.marker);
            assert!(rest.iter().all(|s| !s.marker));
            assert!(group.iter().all(|s| s.start_time == 1.5));
        }
    }

    #[test]
    fn test_h265_assigns_don() {
        let data: Vec<u8> = [
            &[0u8, 0, 0, 1, 0x40, 0x01, 0x0C][..],
            &[0, 0, 0, 1, 0x42, 0x01, 0x01],
            &[0, 0, 0, 1, 0x44, 0x01, 0xC1],
            &[0, 0, 0, 1, 0x26, 0x01, 0xAF, 0x11],
            &[0, 0, 0, 1, 0x02, 0x01, 0xD0, 0x22],
        ]
        .concat();
        let mut ex = StreamingExtractor::new(MediaType::H265, TimestampMode::None);
        let samples = drive(&mut ex, &data);
        let dons: Vec<Option<u16>> = samples.iter().map(|s| s.decoding_order_number).collect();
        assert_eq!(dons, vec![Some(0), Some(1), Some(2), Some(3), Some(4)]);
        let markers: Vec<bool> = samples.iter().map(|s| s.marker).collect();
        assert_eq!(markers, vec![false, false, false, true, true]);
    }

    #[test]
    fn test_trailing_one_byte_unit_at_end_of_stream() {
        let data = [
            0, 0, 0, 1, 0x09, 0xF0, //
            0, 0, 1, 0x65, 0x88, 0x84, //
            0, 0, 0, 1, 0x0B,
        ];
        let mut ex = StreamingExtractor::new(MediaType::H264, TimestampMode::None);
        // 流未结束时末尾起始码尚不能确定
        let r = ex.extract(&data[6..], true).unwrap();
        assert_eq!(r.status, ExtractStatus::NeedMoreData);

        let mut ex = StreamingExtractor::new(MediaType::H264, TimestampMode::None);
        let samples = drive(&mut ex, &data);
        let payloads: Vec<&[u8]> = samples.iter().map(|s| s.payload()).collect();
        assert_eq!(payloads, vec![&[0x09, 0xF0][..], &[0x65, 0x88, 0x84][..], &[0x0B][..]]);
        assert_eq!(samples[2].start_code, Some(crate::parsers::StartCode::Long));

        let groups = ex.extract_all(&data, 0.0).unwrap();
        let batch: Vec<&[u8]> = groups.iter().flatten().map(|s| s.payload()).collect();
        assert_eq!(batch, payloads);
    }
}
