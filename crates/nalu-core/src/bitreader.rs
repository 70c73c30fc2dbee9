//! 比特流读取器.
//!
//! 提供从字节缓冲区中按位读取数据的能力, 用于解析 NAL 单元头部及其扩展字段.
//!
//! 按大端位序读取 (MSB first): 每个字节先贡献其最高的未读位.

use crate::{ByteBuffer, NaluError, NaluResult};

/// 比特流读取器
///
/// 从字节缓冲区中按位读取数据, 使用大端位序 (MSB first).
/// 读取是非破坏性的, 底层数据不会被修改.
///
/// # 示例
/// ```
/// use nalu_core::BitReader;
///
/// let data = [0b10110001, 0b01010101];
/// let mut br = BitReader::new(&data);
/// assert_eq!(br.read_u8(4).unwrap(), 0b1011);
/// assert_eq!(br.read_u8(4).unwrap(), 0b0001);
/// assert_eq!(br.read_bits(8).unwrap(), 0b01010101);
/// assert!(br.read_u8(9).is_err());
/// ```
#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    /// 源数据
    data: &'a [u8],
    /// 当前字节索引
    byte_pos: usize,
    /// 当前字节中的位位置 (0-7, 0 表示最高位)
    bit_pos: u8,
}

impl<'a> BitReader<'a> {
    /// 创建新的比特流读取器
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            byte_pos: 0,
            bit_pos: 0,
        }
    }

    /// 在字节缓冲区的逻辑数据上创建读取器
    pub fn from_buffer(buffer: &'a ByteBuffer) -> Self {
        Self::new(buffer.as_slice())
    }

    /// 获取已读取的总位数
    pub fn bits_read(&self) -> usize {
        self.byte_pos * 8 + self.bit_pos as usize
    }

    /// 获取剩余可读位数
    pub fn bits_left(&self) -> usize {
        if self.byte_pos >= self.data.len() {
            return 0;
        }
        (self.data.len() - self.byte_pos) * 8 - self.bit_pos as usize
    }

    /// 获取剩余完整字节数
    pub fn bytes_left(&self) -> usize {
        self.bits_left() / 8
    }

    /// 当前字节中尚未读取的位数 (1-8)
    pub fn bits_left_in_byte(&self) -> u8 {
        8 - self.bit_pos
    }

    /// 是否已到达末尾
    pub fn is_eof(&self) -> bool {
        self.bits_left() == 0
    }

    /// 是否位于字节边界
    pub fn is_byte_aligned(&self) -> bool {
        self.bit_pos == 0
    }

    /// 读取 1 个位
    pub fn read_bit(&mut self) -> NaluResult<u32> {
        if self.byte_pos >= self.data.len() {
            return Err(NaluError::Eof);
        }

        let bit = (self.data[self.byte_pos] >> (7 - self.bit_pos)) & 1;
        self.bit_pos += 1;
        if self.bit_pos >= 8 {
            self.bit_pos = 0;
            self.byte_pos += 1;
        }

        Ok(u32::from(bit))
    }

    /// 读取 1 个位作为布尔标志
    pub fn read_flag(&mut self) -> NaluResult<bool> {
        Ok(self.read_bit()? != 0)
    }

    /// 读取 N 个位到 u8 (N 最多 8)
    pub fn read_u8(&mut self, n: u32) -> NaluResult<u8> {
        Ok(self.read_checked(n, u8::BITS, "read_u8")? as u8)
    }

    /// 读取 N 个位到 u16 (N 最多 16)
    pub fn read_u16(&mut self, n: u32) -> NaluResult<u16> {
        Ok(self.read_checked(n, u16::BITS, "read_u16")? as u16)
    }

    /// 读取 N 个位 (最多 32 位)
    ///
    /// 按大端位序读取, 返回值的低 N 位有效.
    pub fn read_bits(&mut self, n: u32) -> NaluResult<u32> {
        Ok(self.read_checked(n, u32::BITS, "read_bits")? as u32)
    }

    /// 读取 N 个位 (最多 64 位)
    pub fn read_bits_u64(&mut self, n: u32) -> NaluResult<u64> {
        self.read_checked(n, u64::BITS, "read_bits_u64")
    }

    /// 宽度与剩余位数检查后按位累加
    fn read_checked(&mut self, n: u32, capacity: u32, op: &str) -> NaluResult<u64> {
        if n > capacity {
            return Err(NaluError::InvalidArgument(format!(
                "{}: n={} 超过 {} 位",
                op, n, capacity,
            )));
        }
        if n == 0 {
            return Ok(0);
        }
        if (n as usize) > self.bits_left() {
            return Err(NaluError::Eof);
        }

        let mut result: u64 = 0;
        let mut remaining = n;

        while remaining > 0 {
            let available = 8 - self.bit_pos as u32;
            let to_read = remaining.min(available);

            // 从当前字节中提取位
            let shift = available - to_read;
            let mask = ((1u32 << to_read) - 1) as u8;
            let bits = (self.data[self.byte_pos] >> shift) & mask;

            result = (result << to_read) | u64::from(bits);

            self.bit_pos += to_read as u8;
            if self.bit_pos >= 8 {
                self.bit_pos = 0;
                self.byte_pos += 1;
            }
            remaining -= to_read;
        }

        Ok(result)
    }

    /// 窥视 N 个位 (不移动位置)
    pub fn peek_bits(&mut self, n: u32) -> NaluResult<u32> {
        let saved_byte = self.byte_pos;
        let saved_bit = self.bit_pos;
        let result = self.read_bits(n);
        self.byte_pos = saved_byte;
        self.bit_pos = saved_bit;
        result
    }

    /// 窥视当前字节 (不移动位置, 忽略位偏移)
    pub fn peek_current_byte(&self) -> NaluResult<u8> {
        self.data.get(self.byte_pos).copied().ok_or(NaluError::Eof)
    }

    /// 跳过 N 个位
    pub fn skip_bits(&mut self, n: usize) -> NaluResult<()> {
        if n > self.bits_left() {
            return Err(NaluError::Eof);
        }

        let total_bits = self.bit_pos as usize + n;
        self.byte_pos += total_bits / 8;
        self.bit_pos = (total_bits % 8) as u8;

        Ok(())
    }

    /// 跳过 N 个字节
    ///
    /// 仅在字节对齐时可用.
    pub fn skip_bytes(&mut self, n: usize) -> NaluResult<()> {
        if self.bit_pos != 0 {
            return Err(NaluError::InvalidArgument("skip_bytes 需要字节对齐".into()));
        }
        if n > self.bytes_left() {
            return Err(NaluError::Eof);
        }
        self.byte_pos += n;
        Ok(())
    }

    /// 对齐到下一个字节边界
    ///
    /// 如果当前已在字节边界, 则不做任何事.
    pub fn align_to_byte(&mut self) {
        if self.bit_pos > 0 {
            self.bit_pos = 0;
            self.byte_pos += 1;
        }
    }

    /// 获取当前字节位置
    pub fn byte_position(&self) -> usize {
        self.byte_pos
    }

    /// 从当前位置读取原始字节切片
    ///
    /// 仅在字节对齐时可用.
    pub fn read_bytes(&mut self, n: usize) -> NaluResult<&'a [u8]> {
        if self.bit_pos != 0 {
            return Err(NaluError::InvalidArgument("read_bytes 需要字节对齐".into()));
        }

        let end = self.byte_pos + n;
        if end > self.data.len() {
            return Err(NaluError::Eof);
        }

        let slice = &self.data[self.byte_pos..end];
        self.byte_pos = end;
        Ok(slice)
    }

    /// 读取字节填满 `dest`
    ///
    /// 仅在字节对齐时可用.
    pub fn read_bytes_into(&mut self, dest: &mut [u8]) -> NaluResult<()> {
        let src = self.read_bytes(dest.len())?;
        dest.copy_from_slice(src);
        Ok(())
    }

    /// 获取底层数据的引用
    pub fn data(&self) -> &'a [u8] {
        self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_bits_basic() {
        let data = [0b10110001, 0b01010101];
        let mut br = BitReader::new(&data);

        assert_eq!(br.read_bits(1).unwrap(), 1);
        assert_eq!(br.read_bits(1).unwrap(), 0);
        assert_eq!(br.read_bits(2).unwrap(), 0b11);
        assert_eq!(br.read_bits(4).unwrap(), 0b0001);
        assert_eq!(br.read_bits(8).unwrap(), 0b01010101);

        assert!(br.is_eof());
    }

    #[test]
    fn test_read_width_exceeds_type() {
        let data = [0xFF; 16];
        let mut br = BitReader::new(&data);
        assert!(matches!(br.read_u8(9), Err(NaluError::InvalidArgument(_))));
        assert!(matches!(br.read_u16(17), Err(NaluError::InvalidArgument(_))));
        assert!(matches!(br.read_bits(33), Err(NaluError::InvalidArgument(_))));
        assert!(matches!(
            br.read_bits_u64(65),
            Err(NaluError::InvalidArgument(_))
        ));
        // 失败的读取不移动位置
        assert_eq!(br.bits_read(), 0);
    }

    #[test]
    fn test_read_beyond_remaining() {
        let data = [0xAB];
        let mut br = BitReader::new(&data);
        assert_eq!(br.read_u8(3).unwrap(), 0b101);
        assert!(matches!(br.read_u8(6), Err(NaluError::Eof)));
        assert_eq!(br.read_u8(5).unwrap(), 0b01011);
        assert!(matches!(br.read_bit(), Err(NaluError::Eof)));
    }

    #[test]
    fn test_read_bits_u64_crosses_bytes() {
        let data = [0x12, 0x34, 0x56, 0x78, 0x9A, 0xBC, 0xDE, 0xF0];
        let mut br = BitReader::new(&data);
        assert_eq!(br.read_bits(4).unwrap(), 0x1);
        assert_eq!(br.read_bits_u64(60).unwrap(), 0x2_3456_789A_BCDE_F0);
        assert!(br.is_eof());
    }

    #[test]
    fn test_byte_ops_require_alignment() {
        let data = [0x00, 0x11, 0x22, 0x33];
        let mut br = BitReader::new(&data);
        br.skip_bits(4).unwrap();
        assert!(br.read_bytes(1).is_err());
        assert!(br.skip_bytes(1).is_err());
        assert_eq!(br.bytes_left(), 3);
        assert_eq!(br.bits_left_in_byte(), 4);

        br.align_to_byte();
        let mut dest = [0u8; 2];
        br.read_bytes_into(&mut dest).unwrap();
        assert_eq!(dest, [0x11, 0x22]);
        br.skip_bytes(1).unwrap();
        assert!(br.skip_bytes(1).is_err());
    }

    #[test]
    fn test_peek_does_not_advance() {
        let buffer = ByteBuffer::from_vec(vec![0xC0, 0x01]);
        let mut br = BitReader::from_buffer(&buffer);
        assert_eq!(br.peek_bits(2).unwrap(), 0b11);
        assert_eq!(br.peek_current_byte().unwrap(), 0xC0);
        br.skip_bits(3).unwrap();
        // 位偏移不影响当前字节窥视
        assert_eq!(br.peek_current_byte().unwrap(), 0xC0);
        br.skip_bits(5).unwrap();
        assert_eq!(br.peek_current_byte().unwrap(), 0x01);
    }
}
