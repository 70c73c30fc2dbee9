//! 索引媒体源.
//!
//! 构造时分块扫描整个输入一次, 记录每个 NAL 单元的字节区间并按边界判定
//! 分组为访问单元. 之后每次读取只 seek 并读出一个访问单元覆盖的字节.

use std::io::SeekFrom;
use std::path::Path;

use log::{debug, warn};
use nalu_codec::boundary::{AccessUnitBoundary, boundary_for, group_access_units};
use nalu_codec::parsers::{NalUnitDescriptor, StartCodeIndexer};
use nalu_codec::{AccessUnit, AccessUnitClock, MediaSample, MediaType};
use nalu_core::{ByteBuffer, NaluError, NaluResult};

use super::{LoopCursor, MediaSource, SourceConfig};
use crate::io::IoContext;

/// 预扫描的分块大小
const READ_CHUNK_SIZE: usize = 20_000;

/// 索引媒体源
pub struct IndexedMediaSource {
    config: SourceConfig,
    io: Option<IoContext>,
    /// 访问单元索引
    access_units: Vec<Vec<NalUnitDescriptor>>,
    /// 分组时使用的判定器, 之后继续分配解码顺序号
    boundary: Box<dyn AccessUnitBoundary>,
    clock: AccessUnitClock,
    cursor: LoopCursor,
    io_ok: bool,
}

impl IndexedMediaSource {
    /// 打开文件
    ///
    /// 打开或扫描失败时返回的媒体源 `is_good()` 为 false.
    pub fn open(path: impl AsRef<Path>, config: SourceConfig) -> Self {
        let path = path.as_ref();
        match IoContext::open_read(path) {
            Ok(io) => Self::from_io(io, config),
            Err(e) => {
                warn!("打开媒体文件失败: {}: {}", path.display(), e);
                Self::failed(config)
            }
        }
    }

    /// 从内存数据创建
    pub fn from_bytes(data: Vec<u8>, config: SourceConfig) -> Self {
        Self::from_io(IoContext::from_memory(data), config)
    }

    /// 从 I/O 上下文创建
    pub fn from_io(mut io: IoContext, config: SourceConfig) -> Self {
        let mut boundary = boundary_for(config.media_type.codec());
        match index_access_units(&mut io, config.media_type, boundary.as_mut()) {
            Ok(access_units) => {
                boundary.reset();
                // 解码顺序号从 0 开始分配
                Self {
                    config,
                    io: Some(io),
                    cursor: LoopCursor::new(config.looping, access_units.len()),
                    access_units,
                    boundary,
                    clock: AccessUnitClock::new(config.timestamp_mode),
                    io_ok: true,
                }
            }
            Err(e) => {
                warn!("{} 索引失败: {}", config.media_type, e);
                Self::failed(config)
            }
        }
    }

    fn failed(config: SourceConfig) -> Self {
        Self {
            config,
            io: None,
            access_units: Vec::new(),
            boundary: boundary_for(config.media_type.codec()),
            clock: AccessUnitClock::new(config.timestamp_mode),
            cursor: LoopCursor::new(config.looping, 0),
            io_ok: false,
        }
    }

    /// 一轮中的访问单元数
    pub fn access_units_per_pass(&self) -> usize {
        self.access_units.len()
    }

    /// 访问单元索引
    pub fn access_units(&self) -> &[Vec<NalUnitDescriptor>] {
        &self.access_units
    }

    pub fn media_type(&self) -> MediaType {
        self.config.media_type
    }

    pub fn config(&self) -> &SourceConfig {
        &self.config
    }

    /// 读出第 `index` 个访问单元的样本
    fn materialize(&mut self, index: usize) -> NaluResult<AccessUnit> {
        let units = &self.access_units[index];
        let (Some(first), Some(last)) = (units.first(), units.last()) else {
            return Ok(Vec::new());
        };
        let io = self
            .io
            .as_mut()
            .ok_or_else(|| NaluError::InvalidArgument("媒体源没有可用的 I/O".into()))?;

        let span_start = first.start_code_offset;
        let span_len = usize::try_from(last.end_offset() - span_start)
            .map_err(|_| NaluError::InvalidData("访问单元过大".into()))?;
        let mut span = vec![0u8; span_len];
        io.seek(SeekFrom::Start(span_start))?;
        io.read_exact(&mut span)?;

        let timestamp = self.clock.stamp(self.cursor.served());
        let count = units.len();
        let samples = units
            .iter()
            .enumerate()
            .map(|(i, unit)| {
                let start = (unit.payload_offset - span_start) as usize;
                let end = (unit.end_offset() - span_start) as usize;
                let mut sample = MediaSample::new(ByteBuffer::from(&span[start..end]));
                sample.start_time = timestamp.seconds;
                sample.presentation_time = timestamp.wall_clock;
                sample.start_code = Some(unit.start_code);
                sample.marker = i + 1 == count;
                sample.decoding_order_number = self.boundary.next_decoding_order_number();
                sample
            })
            .collect();
        Ok(samples)
    }
}

impl MediaSource for IndexedMediaSource {
    fn name(&self) -> &'static str {
        self.config.media_type.name()
    }

    fn is_good(&self) -> bool {
        self.io_ok && !self.cursor.is_eos()
    }

    fn next_access_unit(&mut self) -> AccessUnit {
        if !self.is_good() {
            return Vec::new();
        }
        match self.materialize(self.cursor.position()) {
            Ok(samples) => {
                self.cursor.advance();
                samples
            }
            Err(e) => {
                warn!("读取访问单元失败: {}", e);
                self.io_ok = false;
                Vec::new()
            }
        }
    }
}

/// 分块扫描输入并把 NAL 单元分组为访问单元
fn index_access_units(
    io: &mut IoContext,
    media_type: MediaType,
    boundary: &mut dyn AccessUnitBoundary,
) -> NaluResult<Vec<Vec<NalUnitDescriptor>>> {
    io.seek(SeekFrom::Start(0))?;
    let mut indexer = StartCodeIndexer::new();
    let mut chunk = vec![0u8; READ_CHUNK_SIZE];
    let mut total_len = 0u64;
    loop {
        let n = io.read_some(&mut chunk)?;
        if n == 0 {
            break;
        }
        indexer.push(&chunk[..n]);
        total_len += n as u64;
    }

    let units = indexer.finish(total_len);
    if units.is_empty() {
        return Err(NaluError::InvalidData(format!(
            "Annex B: {} 字节的输入中没有 NAL 单元",
            total_len
        )));
    }

    let codec = media_type.codec();
    let nal_count = units.len();
    let access_units = group_access_units(
        units.into_iter().map(|unit| (unit.header(codec), unit)),
        boundary,
    );
    debug!(
        "{} 索引完成: {} 字节, {} 个 NAL 单元, {} 个访问单元",
        media_type,
        total_len,
        nal_count,
        access_units.len()
    );
    Ok(access_units)
}
