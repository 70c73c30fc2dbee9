//! Annex B 起始码扫描.
//!
//! Annex B 使用起始码 (start code) 分隔 NAL 单元:
//! - 3 字节起始码: `00 00 01`
//! - 4 字节起始码: `00 00 00 01`
//!
//! 扫描以 `00 00 01` 为模式, 若模式前一字节也是 0 则视为 4 字节起始码.
//! 流未结束时, 扫描在区间末尾前 4 字节处停止: 末尾残缺的起始码需要更多数据才能确定.
//! 流结束后, 只要起始码之后还有 1 字节负载即认定.

use super::header::NalHeader;
use crate::media_type::VideoCodec;

/// 流未结束时起始码模式之后至少需要的字节数, 不足时不认定为起始码
const TAIL_GUARD: usize = 4;

/// 流结束后起始码模式之后至少需要的字节数 (1 字节负载)
const FINAL_TAIL_GUARD: usize = 3;

/// 可单独成为一个样本的最短单元 (3 字节起始码 + 2 字节, 或 4 字节起始码 + 1 字节)
pub const MIN_NAL_UNIT_LEN: usize = 5;

/// 起始码长度
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartCode {
    /// `00 00 01`
    Short,
    /// `00 00 00 01`
    Long,
}

impl StartCode {
    /// 字节长度
    pub fn size(&self) -> usize {
        match self {
            Self::Short => 3,
            Self::Long => 4,
        }
    }

    /// 起始码字节
    pub fn bytes(&self) -> &'static [u8] {
        match self {
            Self::Short => &[0, 0, 1],
            Self::Long => &[0, 0, 0, 1],
        }
    }

    /// 从字节长度创建
    pub fn from_len(len: usize) -> Option<Self> {
        match len {
            3 => Some(Self::Short),
            4 => Some(Self::Long),
            _ => None,
        }
    }
}

/// 一次起始码匹配
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartCodeMatch {
    /// 起始码首字节偏移
    pub offset: usize,
    /// 起始码长度
    pub start_code: StartCode,
}

impl StartCodeMatch {
    /// NAL 单元负载 (含 NAL 头部) 的起始偏移
    pub fn payload_offset(&self) -> usize {
        self.offset + self.start_code.size()
    }
}

/// 检查数据开头是否为起始码 (先检查 4 字节, 再检查 3 字节)
pub fn leading_start_code(data: &[u8]) -> Option<StartCode> {
    if data.starts_with(StartCode::Long.bytes()) {
        Some(StartCode::Long)
    } else if data.starts_with(StartCode::Short.bytes()) {
        Some(StartCode::Short)
    } else {
        None
    }
}

/// 从 `from` 开始查找下一个起始码
pub fn find_start_code(data: &[u8], from: usize) -> Option<StartCodeMatch> {
    find_pattern(data, from, TAIL_GUARD)
}

/// 在已完整的数据中查找下一个起始码
///
/// 与 [`find_start_code`] 不同, 末尾只带 1 字节负载的起始码也会被认定.
pub fn find_final_start_code(data: &[u8], from: usize) -> Option<StartCodeMatch> {
    find_pattern(data, from, FINAL_TAIL_GUARD)
}

fn find_pattern(data: &[u8], from: usize, guard: usize) -> Option<StartCodeMatch> {
    let end = data.len().saturating_sub(guard);
    (from..end)
        .find(|&i| data[i] == 0 && data[i + 1] == 0 && data[i + 2] == 1)
        .map(|i| {
            if i > 0 && data[i - 1] == 0 {
                StartCodeMatch {
                    offset: i - 1,
                    start_code: StartCode::Long,
                }
            } else {
                StartCodeMatch {
                    offset: i,
                    start_code: StartCode::Short,
                }
            }
        })
}

/// 查找下一个起始码, 并解析其后的 NAL 头部
///
/// 头部字节可能超出数据末尾, 缺失部分按 0 处理.
pub fn find_nal_unit(
    data: &[u8],
    from: usize,
    codec: VideoCodec,
) -> Option<(StartCodeMatch, NalHeader)> {
    find_start_code(data, from).map(|m| {
        let header = NalHeader::parse_truncated(codec, &data[m.payload_offset()..]);
        (m, header)
    })
}

/// NAL 单元描述符 (绝对偏移)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NalUnitDescriptor {
    /// 起始码偏移
    pub start_code_offset: u64,
    /// 起始码长度
    pub start_code: StartCode,
    /// 负载偏移
    pub payload_offset: u64,
    /// 负载长度 (遇到下一个起始码或流结束时回填)
    pub payload_len: u64,
    /// 负载开头的头部字节 (不足部分为 0)
    header_bytes: [u8; 3],
    /// 已获得的头部字节数
    header_filled: u8,
}

impl NalUnitDescriptor {
    /// 负载结束偏移
    pub fn end_offset(&self) -> u64 {
        self.payload_offset + self.payload_len
    }

    /// 起始码与负载的总长度
    pub fn total_len(&self) -> u64 {
        self.end_offset() - self.start_code_offset
    }

    /// 解析 NAL 头部
    pub fn header(&self, codec: VideoCodec) -> NalHeader {
        NalHeader::parse_truncated(codec, &self.header_bytes[..self.header_filled as usize])
    }
}

/// 分块增量起始码索引器
///
/// 每块保留最后 3 字节与下一块拼接, 以识别跨块边界的起始码;
/// 另记住保留区之前的一个字节, 以识别跨块的 4 字节起始码.
#[derive(Debug, Default)]
pub struct StartCodeIndexer {
    /// 上一块末尾保留的字节
    carry: Vec<u8>,
    /// carry[0] 的绝对偏移
    carry_offset: u64,
    /// carry 之前的一个字节
    prev_byte: Option<u8>,
    /// 拼接窗口 (复用分配)
    window: Vec<u8>,
    /// 已发现的 NAL 单元
    units: Vec<NalUnitDescriptor>,
}

impl StartCodeIndexer {
    pub fn new() -> Self {
        Self::default()
    }

    /// 送入下一块数据
    pub fn push(&mut self, chunk: &[u8]) {
        self.window.clear();
        self.window.extend_from_slice(&self.carry);
        self.window.extend_from_slice(chunk);
        let base = self.carry_offset;
        let len = self.window.len();

        // 最后 3 个位置留到下一块再检查
        for i in 0..len.saturating_sub(3) {
            let w = &self.window;
            if !(w[i] == 0 && w[i + 1] == 0 && w[i + 2] == 1) {
                continue;
            }
            let preceding = if i > 0 { Some(w[i - 1]) } else { self.prev_byte };
            let start_code = if preceding == Some(0) {
                StartCode::Long
            } else {
                StartCode::Short
            };
            let pattern_offset = base + i as u64;
            let start_code_offset = pattern_offset + 3 - start_code.size() as u64;
            if let Some(last) = self.units.last_mut() {
                last.payload_len = start_code_offset.saturating_sub(last.payload_offset);
            }
            self.units.push(NalUnitDescriptor {
                start_code_offset,
                start_code,
                payload_offset: pattern_offset + 3,
                payload_len: 0,
                header_bytes: [0; 3],
                header_filled: 0,
            });
        }

        self.fill_headers(base);

        let keep = len.min(3);
        if len > keep {
            self.prev_byte = Some(self.window[len - keep - 1]);
        }
        self.carry.clear();
        self.carry.extend_from_slice(&self.window[len - keep..]);
        self.carry_offset = base + (len - keep) as u64;
    }

    /// 用当前窗口补齐尚未完整的头部字节
    fn fill_headers(&mut self, base: u64) {
        let window_end = base + self.window.len() as u64;
        for unit in self.units.iter_mut().rev() {
            if unit.header_filled as usize == unit.header_bytes.len() {
                break;
            }
            while (unit.header_filled as usize) < unit.header_bytes.len() {
                let pos = unit.payload_offset + u64::from(unit.header_filled);
                if pos < base || pos >= window_end {
                    break;
                }
                unit.header_bytes[unit.header_filled as usize] = self.window[(pos - base) as usize];
                unit.header_filled += 1;
            }
        }
    }

    /// 结束扫描, 回填最后一个单元的长度
    ///
    /// 与流式提取在流结束时的处理一致: 末尾单元不足 [`MIN_NAL_UNIT_LEN`] 字节时丢弃,
    /// 前一个单元的长度仍截止到被丢弃单元的起始码, 不会把起始码并入前一个单元.
    pub fn finish(mut self, total_len: u64) -> Vec<NalUnitDescriptor> {
        let short_tail = self.units.last().is_some_and(|last| {
            total_len.saturating_sub(last.start_code_offset) < MIN_NAL_UNIT_LEN as u64
        });
        if short_tail {
            self.units.pop();
        } else if let Some(last) = self.units.last_mut() {
            last.payload_len = total_len.saturating_sub(last.payload_offset);
        }
        self.units
    }
}

/// 扫描完整数据块中的所有 NAL 单元
pub fn scan_nal_units(data: &[u8]) -> Vec<NalUnitDescriptor> {
    let mut indexer = StartCodeIndexer::new();
    indexer.push(data);
    indexer.finish(data.len() as u64)
}
