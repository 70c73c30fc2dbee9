//! 比特流写入器.
//!
//! 提供向可增长字节缓冲区按位写入数据的能力, 与 BitReader 对应.
//!
//! 按大端位序写入 (MSB first). 空间不足时缓冲区至少扩大一倍并拷贝已写入内容.

use crate::{BitReader, ByteBuffer, NaluError, NaluResult};

/// 默认初始容量 (字节)
const DEFAULT_CAPACITY: usize = 1024;

/// 比特流写入器
///
/// 向字节缓冲区按位写入数据, 使用大端位序 (MSB first).
/// 可在写入区域之前保留前置空间, 供 [`ByteBuffer::prepend`] 插入头部.
///
/// # 示例
/// ```
/// use nalu_core::BitWriter;
///
/// let mut bw = BitWriter::new();
/// bw.write_bits(0b1011, 4);
/// bw.write_bits(0b0001, 4);
/// bw.write_bits(0b01010101, 8);
/// let buf = bw.finalize();
/// assert_eq!(buf.as_slice(), &[0b10110001, 0b01010101]);
/// ```
#[derive(Debug, Clone)]
pub struct BitWriter {
    /// 物理存储 (含前置预留)
    data: Vec<u8>,
    /// 前置预留字节数
    prebuffer: usize,
    /// 当前字节索引 (相对写入区起点)
    byte_pos: usize,
    /// 当前字节中已填充的位数 (0-7)
    bit_pos: u8,
}

impl Default for BitWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl BitWriter {
    /// 以默认容量创建比特流写入器
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// 以指定容量创建比特流写入器
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_prebuffer(capacity, 0)
    }

    /// 以指定容量和前置预留创建比特流写入器
    pub fn with_prebuffer(capacity: usize, prebuffer: usize) -> Self {
        Self {
            data: vec![0u8; prebuffer + capacity],
            prebuffer,
            byte_pos: 0,
            bit_pos: 0,
        }
    }

    /// 写入区容量 (字节)
    pub fn capacity(&self) -> usize {
        self.data.len() - self.prebuffer
    }

    /// 获取已写入的总位数
    pub fn bits_written(&self) -> usize {
        self.byte_pos * 8 + self.bit_pos as usize
    }

    /// 已使用字节数 (未写满的字节计为 1)
    pub fn bytes_used(&self) -> usize {
        self.byte_pos + usize::from(self.bit_pos > 0)
    }

    /// 是否位于字节边界
    pub fn is_byte_aligned(&self) -> bool {
        self.bit_pos == 0
    }

    /// 写入 1 个位
    pub fn write_bit(&mut self, bit: u32) {
        self.write_bits(bit & 1, 1);
    }

    /// 写入布尔标志
    pub fn write_flag(&mut self, flag: bool) {
        self.write_bits(u32::from(flag), 1);
    }

    /// 写入 N 个位 (最多 32 位)
    ///
    /// 值的低 N 位被写入, 高位在前 (大端).
    /// `n` 超过 32 时按 32 处理, 即写入整个 `value`; 更宽的字段用 [`Self::write_bits_u64`].
    pub fn write_bits(&mut self, value: u32, n: u32) {
        let n = n.min(32);
        if n == 0 {
            return;
        }

        self.reserve_bits(n as usize);

        // 快速路径: 字节对齐时整字节写入
        if self.bit_pos == 0 && n % 8 == 0 {
            let start = self.prebuffer + self.byte_pos;
            let bytes = value.to_be_bytes();
            let count = (n / 8) as usize;
            self.data[start..start + count].copy_from_slice(&bytes[4 - count..]);
            self.byte_pos += count;
            return;
        }

        let mut remaining = n;
        while remaining > 0 {
            let free = 8 - self.bit_pos as u32;
            let to_write = remaining.min(free);

            // 取出本轮要写入的位, 移到当前字节的空闲位置
            let mask = (1u32 << to_write) - 1;
            let bits = ((value >> (remaining - to_write)) & mask) as u8;
            let shift = free - to_write;
            self.data[self.prebuffer + self.byte_pos] |= bits << shift;

            self.bit_pos += to_write as u8;
            if self.bit_pos >= 8 {
                self.bit_pos = 0;
                self.byte_pos += 1;
            }
            remaining -= to_write;
        }
    }

    /// 写入 N 个位 (最多 64 位)
    pub fn write_bits_u64(&mut self, value: u64, n: u32) {
        if n <= 32 {
            self.write_bits(value as u32, n);
        } else {
            let high_bits = n.min(64) - 32;
            self.write_bits((value >> 32) as u32, high_bits);
            self.write_bits(value as u32, 32);
        }
    }

    /// 写入原始字节
    ///
    /// 仅在字节对齐时可用.
    pub fn write_bytes(&mut self, src: &[u8]) -> NaluResult<()> {
        if self.bit_pos != 0 {
            return Err(NaluError::InvalidArgument("write_bytes 需要字节对齐".into()));
        }
        self.reserve_bits(src.len() * 8);
        let start = self.prebuffer + self.byte_pos;
        self.data[start..start + src.len()].copy_from_slice(src);
        self.byte_pos += src.len();
        Ok(())
    }

    /// 从读取器转移其剩余的全部字节
    pub fn transfer_from(&mut self, reader: &mut BitReader<'_>) -> NaluResult<()> {
        let n = reader.bytes_left();
        self.transfer_bytes_from(reader, n)
    }

    /// 从读取器转移 n 个字节
    ///
    /// 写入器与读取器都必须字节对齐, 且读取器至少剩余 n 字节.
    pub fn transfer_bytes_from(&mut self, reader: &mut BitReader<'_>, n: usize) -> NaluResult<()> {
        if self.bit_pos != 0 {
            return Err(NaluError::InvalidArgument(
                "transfer_from: 写入器未字节对齐".into(),
            ));
        }
        if reader.bits_left() % 8 != 0 {
            return Err(NaluError::InvalidArgument(
                "transfer_from: 读取器剩余位数未字节对齐".into(),
            ));
        }
        if reader.bytes_left() < n {
            return Err(NaluError::Eof);
        }
        let src = reader.read_bytes(n)?;
        self.write_bytes(src)
    }

    /// 对齐到下一个字节边界 (剩余位补 0)
    pub fn align_to_byte(&mut self) {
        if self.bit_pos > 0 {
            self.bit_pos = 0;
            self.byte_pos += 1;
        }
    }

    /// 清空写入位置, 保留已分配空间
    pub fn reset(&mut self) {
        let used = self.bytes_used();
        self.data[self.prebuffer..self.prebuffer + used].fill(0);
        self.byte_pos = 0;
        self.bit_pos = 0;
    }

    /// 已写入内容 (含未写满的最后一个字节)
    pub fn as_slice(&self) -> &[u8] {
        &self.data[self.prebuffer..self.prebuffer + self.bytes_used()]
    }

    /// 拷贝已写入内容到新的字节缓冲区
    ///
    /// 返回的缓冲区保留相同的前置预留.
    pub fn finalize(&self) -> ByteBuffer {
        let end = self.prebuffer + self.bytes_used();
        ByteBuffer::with_prebuffer(self.data[..end].to_vec(), self.prebuffer)
    }

    /// 消耗写入器, 返回已写入内容
    pub fn into_buffer(mut self) -> ByteBuffer {
        let end = self.prebuffer + self.bytes_used();
        self.data.truncate(end);
        ByteBuffer::with_prebuffer(self.data, self.prebuffer)
    }

    /// 保证还能写入 `bits` 个位, 不足时扩容
    fn reserve_bits(&mut self, bits: usize) {
        let needed = (self.bit_pos as usize + bits).div_ceil(8);
        let capacity = self.capacity();
        if self.byte_pos + needed <= capacity {
            return;
        }
        let new_capacity = (capacity * 2).max((capacity + needed) * 2);
        log::trace!("BitWriter 扩容: {} -> {} 字节", capacity, new_capacity);
        self.data.resize(self.prebuffer + new_capacity, 0);
    }
}
