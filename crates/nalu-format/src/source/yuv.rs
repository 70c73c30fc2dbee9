//! 原始 YUV 4:2:0 媒体源.
//!
//! 文件由等长帧拼接而成, 每帧作为只含一个样本的访问单元交出.

use std::io::SeekFrom;
use std::path::Path;

use log::{debug, warn};
use nalu_codec::{AccessUnit, AccessUnitClock, MediaSample, TimestampMode};
use nalu_core::{ByteBuffer, NaluError, NaluResult};
use serde::{Deserialize, Serialize};

use super::{LoopConfig, LoopCursor, MediaSource};
use crate::io::IoContext;

/// YUV 源配置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YuvConfig {
    pub width: u32,
    pub height: u32,
    #[serde(default, rename = "loop")]
    pub looping: LoopConfig,
    #[serde(default)]
    pub timestamp_mode: TimestampMode,
}

impl YuvConfig {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            looping: LoopConfig::default(),
            timestamp_mode: TimestampMode::default(),
        }
    }

    pub fn with_loop(mut self, looping: LoopConfig) -> Self {
        self.looping = looping;
        self
    }

    /// 一帧 4:2:0 图像的字节数
    pub fn frame_size(&self) -> usize {
        self.width as usize * self.height as usize * 3 / 2
    }
}

/// YUV 4:2:0 媒体源
pub struct YuvMediaSource {
    config: YuvConfig,
    io: Option<IoContext>,
    frame_count: usize,
    clock: AccessUnitClock,
    cursor: LoopCursor,
    io_ok: bool,
}

impl YuvMediaSource {
    /// 打开文件, 失败时 `is_good()` 为 false
    pub fn open(path: impl AsRef<Path>, config: YuvConfig) -> Self {
        let path = path.as_ref();
        match IoContext::open_read(path) {
            Ok(io) => Self::from_io(io, config),
            Err(e) => {
                warn!("打开 YUV 文件失败: {}: {}", path.display(), e);
                Self::build(config, None, 0)
            }
        }
    }

    /// 从内存数据创建
    pub fn from_bytes(data: Vec<u8>, config: YuvConfig) -> Self {
        Self::from_io(IoContext::from_memory(data), config)
    }

    /// 从 I/O 上下文创建
    pub fn from_io(io: IoContext, config: YuvConfig) -> Self {
        match count_frames(&io, &config) {
            Ok(frame_count) => Self::build(config, Some(io), frame_count),
            Err(e) => {
                warn!("YUV 源不可用: {}", e);
                Self::build(config, None, 0)
            }
        }
    }

    fn build(config: YuvConfig, io: Option<IoContext>, frame_count: usize) -> Self {
        Self {
            config,
            io_ok: io.is_some(),
            io,
            frame_count,
            clock: AccessUnitClock::new(config.timestamp_mode),
            cursor: LoopCursor::new(config.looping, frame_count),
        }
    }

    /// 一轮中的帧数
    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    pub fn config(&self) -> &YuvConfig {
        &self.config
    }

    fn read_frame(&mut self, index: usize) -> NaluResult<MediaSample> {
        let frame_size = self.config.frame_size();
        let io = self
            .io
            .as_mut()
            .ok_or_else(|| NaluError::InvalidArgument("媒体源没有可用的 I/O".into()))?;
        let mut frame = ByteBuffer::allocate(frame_size);
        io.seek(SeekFrom::Start((index * frame_size) as u64))?;
        io.read_exact(frame.as_mut_slice())?;

        let timestamp = self.clock.stamp(self.cursor.served());
        let mut sample = MediaSample::new(frame);
        sample.start_time = timestamp.seconds;
        sample.presentation_time = timestamp.wall_clock;
        sample.marker = true;
        Ok(sample)
    }
}

impl MediaSource for YuvMediaSource {
    fn name(&self) -> &'static str {
        "YUV420"
    }

    fn is_good(&self) -> bool {
        self.io_ok && !self.cursor.is_eos()
    }

    fn next_access_unit(&mut self) -> AccessUnit {
        if !self.is_good() {
            return Vec::new();
        }
        match self.read_frame(self.cursor.position()) {
            Ok(sample) => {
                self.cursor.advance();
                vec![sample]
            }
            Err(e) => {
                warn!("读取 YUV 帧失败: {}", e);
                self.io_ok = false;
                Vec::new()
            }
        }
    }
}

fn count_frames(io: &IoContext, config: &YuvConfig) -> NaluResult<usize> {
    let frame_size = config.frame_size();
    if frame_size == 0 {
        return Err(NaluError::InvalidArgument(format!(
            "无效的 YUV 尺寸: {}x{}",
            config.width, config.height
        )));
    }
    let size = io
        .size()
        .ok_or_else(|| NaluError::Unsupported("YUV 源需要已知大小的输入".into()))?;
    let size = usize::try_from(size).map_err(|_| NaluError::InvalidData("YUV 输入过大".into()))?;
    let frame_count = size / frame_size;
    let trailing = size % frame_size;
    if trailing != 0 {
        warn!("YUV 输入末尾有 {} 字节不足一帧, 已忽略", trailing);
    }
    debug!(
        "YUV {}x{}: 帧大小 {} 字节, {} 帧",
        config.width, config.height, frame_size, frame_count
    );
    Ok(frame_count)
}
