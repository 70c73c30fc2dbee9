//! 分块 Annex B 流读取器.
//!
//! 按固定大小分块读取 I/O 上下文, 累积到 [`BytesMut`] 中驱动
//! [`StreamingExtractor`], 并按 marker 把样本组合成访问单元.

use std::path::Path;

use bytes::{Buf, BytesMut};
use log::{debug, warn};
use nalu_codec::parsers::{
    MIN_NAL_UNIT_LEN, find_final_start_code, find_start_code, leading_start_code,
};
use nalu_codec::{
    AccessUnit, ExtractStatus, MediaSample, MediaType, StreamingExtractor, TimestampMode,
};
use nalu_core::{NaluError, NaluResult};

use crate::io::IoContext;
use crate::source::MediaSource;

/// 默认读取块大小
const DEFAULT_CHUNK_SIZE: usize = 4096;

/// 分块 Annex B 流读取器
pub struct AnnexBStreamReader {
    io: IoContext,
    extractor: StreamingExtractor,
    buffer: BytesMut,
    chunk_size: usize,
    /// 输入已读完
    input_done: bool,
    /// 已对齐到第一个起始码
    synced: bool,
    /// 提取器已报告流结束
    finished: bool,
    io_ok: bool,
}

impl AnnexBStreamReader {
    pub fn new(io: IoContext, media_type: MediaType, timestamp_mode: TimestampMode) -> Self {
        Self {
            io,
            extractor: StreamingExtractor::new(media_type, timestamp_mode),
            buffer: BytesMut::with_capacity(DEFAULT_CHUNK_SIZE * 2),
            chunk_size: DEFAULT_CHUNK_SIZE,
            input_done: false,
            synced: false,
            finished: false,
            io_ok: true,
        }
    }

    /// 打开文件
    pub fn open(
        path: impl AsRef<Path>,
        media_type: MediaType,
        timestamp_mode: TimestampMode,
    ) -> NaluResult<Self> {
        Ok(Self::new(IoContext::open_read(path)?, media_type, timestamp_mode))
    }

    /// 设置读取块大小 (最小 1 字节)
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn extractor(&self) -> &StreamingExtractor {
        &self.extractor
    }

    /// 读入下一块数据
    fn fill(&mut self) -> NaluResult<()> {
        let start = self.buffer.len();
        self.buffer.resize(start + self.chunk_size, 0);
        let n = self.io.read_some(&mut self.buffer[start..])?;
        self.buffer.truncate(start + n);
        if n == 0 {
            self.input_done = true;
            debug!("输入读取完毕, 剩余 {} 字节待处理", self.buffer.len());
        }
        Ok(())
    }

    /// 跳过第一个起始码之前的数据
    fn sync(&mut self) -> NaluResult<bool> {
        if leading_start_code(&self.buffer).is_some() {
            self.synced = true;
            return Ok(true);
        }
        let found = if self.input_done {
            find_final_start_code(&self.buffer, 0)
        } else {
            find_start_code(&self.buffer, 0)
        };
        match found {
            Some(m) => {
                warn!("跳过起始码之前的 {} 字节", m.offset);
                self.buffer.advance(m.offset);
                self.synced = true;
            }
            None if !self.input_done => self.fill()?,
            None if self.buffer.len() >= MIN_NAL_UNIT_LEN => {
                return Err(NaluError::InvalidData(
                    "Annex B: 输入中没有起始码".into(),
                ));
            }
            None => self.synced = true,
        }
        Ok(self.synced)
    }

    /// 读取下一个样本, 流结束返回 None
    pub fn next_sample(&mut self) -> NaluResult<Option<MediaSample>> {
        while !self.finished {
            if !self.synced && !self.sync()? {
                continue;
            }
            let extraction = self.extractor.extract(&self.buffer, !self.input_done)?;
            match extraction.status {
                ExtractStatus::Consumed(n) => {
                    self.buffer.advance(n);
                    if extraction.sample.is_some() {
                        return Ok(extraction.sample);
                    }
                }
                ExtractStatus::NeedMoreData => self.fill()?,
                ExtractStatus::EndOfStream => {
                    self.finished = true;
                    debug!(
                        "{} 流读取结束: {} 个访问单元",
                        self.extractor.media_type(),
                        self.extractor.access_unit_count()
                    );
                    return Ok(extraction.sample);
                }
            }
        }
        Ok(None)
    }

    /// 读取下一个完整的访问单元, 流结束返回 None
    pub fn read_access_unit(&mut self) -> NaluResult<Option<AccessUnit>> {
        let mut samples = Vec::new();
        while let Some(sample) = self.next_sample()? {
            let marker = sample.marker;
            samples.push(sample);
            if marker {
                return Ok(Some(samples));
            }
        }
        Ok((!samples.is_empty()).then_some(samples))
    }
}

impl MediaSource for AnnexBStreamReader {
    fn name(&self) -> &'static str {
        self.extractor.media_type().name()
    }

    fn is_good(&self) -> bool {
        self.io_ok && !self.finished
    }

    fn next_access_unit(&mut self) -> AccessUnit {
        if !self.io_ok {
            return Vec::new();
        }
        match self.read_access_unit() {
            Ok(au) => au.unwrap_or_default(),
            Err(e) => {
                warn!("读取 Annex B 流失败: {}", e);
                self.io_ok = false;
                Vec::new()
            }
        }
    }
}
