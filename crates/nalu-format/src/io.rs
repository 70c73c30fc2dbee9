//! I/O 抽象层.
//!
//! 为媒体源与 Annex B 写出提供统一的读写接口,
//! 支持文件与内存缓冲区两种后端.

use std::io::{self, Read, Seek, Write};
use std::path::Path;

use nalu_core::{NaluError, NaluResult};

/// I/O 上下文
///
/// 封装底层 I/O 操作, 带读缓冲区.
pub struct IoContext {
    /// 内部 I/O 实现
    inner: Box<dyn IoBackend>,
    /// 读缓冲区
    buffer: Vec<u8>,
    /// 缓冲区中的有效数据长度
    buf_len: usize,
    /// 缓冲区当前读取位置
    buf_pos: usize,
}

/// I/O 后端 trait
///
/// 实现此 trait 以支持不同的 I/O 来源.
pub trait IoBackend: Send {
    /// 读取数据到缓冲区
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// 全部写入
    fn write_all(&mut self, buf: &[u8]) -> io::Result<()>;

    /// 定位 (seek)
    fn seek(&mut self, pos: io::SeekFrom) -> io::Result<u64>;

    /// 获取当前位置
    fn position(&mut self) -> io::Result<u64>;

    /// 获取总大小 (如果可知)
    fn size(&self) -> Option<u64>;

    /// 取出内存数据 (仅内存后端)
    fn into_data(self: Box<Self>) -> Option<Vec<u8>> {
        None
    }
}

/// 默认缓冲区大小 (32 KB)
const DEFAULT_BUFFER_SIZE: usize = 32 * 1024;

impl IoContext {
    /// 从 I/O 后端创建上下文
    pub fn new(backend: Box<dyn IoBackend>) -> Self {
        Self {
            inner: backend,
            buffer: vec![0u8; DEFAULT_BUFFER_SIZE],
            buf_len: 0,
            buf_pos: 0,
        }
    }

    /// 从文件路径打开 (只读)
    pub fn open_read(path: impl AsRef<Path>) -> NaluResult<Self> {
        let file = std::fs::File::open(path)?;
        Ok(Self::new(Box::new(FileBackend::new(file))))
    }

    /// 从文件路径打开 (写入)
    pub fn open_write(path: impl AsRef<Path>) -> NaluResult<Self> {
        let file = std::fs::File::create(path)?;
        Ok(Self::new(Box::new(FileBackend::new(file))))
    }

    /// 从内存数据创建 (可读可写)
    pub fn from_memory(data: Vec<u8>) -> Self {
        Self::new(Box::new(MemoryBackend::from_data(data)))
    }

    /// 创建空内存缓冲区 (用于写入)
    pub fn memory() -> Self {
        Self::from_memory(Vec::new())
    }

    // ========================
    // 读取方法
    // ========================

    /// 尽量读满 `buf`, 返回实际读取的字节数 (流结束时小于 `buf.len()`)
    pub fn read_some(&mut self, buf: &mut [u8]) -> NaluResult<usize> {
        let mut total_read = 0;
        while total_read < buf.len() {
            let buffered = self.buf_len - self.buf_pos;
            if buffered > 0 {
                let to_copy = buffered.min(buf.len() - total_read);
                buf[total_read..total_read + to_copy]
                    .copy_from_slice(&self.buffer[self.buf_pos..self.buf_pos + to_copy]);
                self.buf_pos += to_copy;
                total_read += to_copy;
            } else {
                self.buf_pos = 0;
                self.buf_len = self.inner.read(&mut self.buffer)?;
                if self.buf_len == 0 {
                    break;
                }
            }
        }
        Ok(total_read)
    }

    /// 读取指定字节数, 不足时返回 [`NaluError::Eof`]
    pub fn read_exact(&mut self, buf: &mut [u8]) -> NaluResult<()> {
        if self.read_some(buf)? < buf.len() {
            return Err(NaluError::Eof);
        }
        Ok(())
    }

    // ========================
    // 写入方法
    // ========================

    /// 写入全部数据
    pub fn write_all(&mut self, buf: &[u8]) -> NaluResult<()> {
        self.inner.write_all(buf)?;
        Ok(())
    }

    // ========================
    // 定位方法
    // ========================

    /// 定位 (seek)
    ///
    /// 注意: seek 会清空读缓冲区.
    pub fn seek(&mut self, pos: io::SeekFrom) -> NaluResult<u64> {
        self.buf_pos = 0;
        self.buf_len = 0;
        Ok(self.inner.seek(pos)?)
    }

    /// 获取当前位置
    ///
    /// 考虑读缓冲区中尚未消耗的数据量.
    pub fn position(&mut self) -> NaluResult<u64> {
        let raw_pos = self.inner.position()?;
        let buffered = (self.buf_len - self.buf_pos) as u64;
        Ok(raw_pos - buffered)
    }

    /// 获取总大小
    pub fn size(&self) -> Option<u64> {
        self.inner.size()
    }

    /// 取出内存后端中的数据
    pub fn into_memory_data(self) -> Option<Vec<u8>> {
        self.inner.into_data()
    }
}

/// 文件 I/O 后端
struct FileBackend {
    file: std::fs::File,
    size: Option<u64>,
}

impl FileBackend {
    fn new(file: std::fs::File) -> Self {
        let size = file.metadata().ok().map(|m| m.len());
        Self { file, size }
    }
}

impl IoBackend for FileBackend {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf)
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.file.write_all(buf)?;
        self.size = self.file.metadata().ok().map(|m| m.len());
        Ok(())
    }

    fn seek(&mut self, pos: io::SeekFrom) -> io::Result<u64> {
        self.file.seek(pos)
    }

    fn position(&mut self) -> io::Result<u64> {
        self.file.stream_position()
    }

    fn size(&self) -> Option<u64> {
        self.size
    }
}

/// 内存缓冲区 I/O 后端
struct MemoryBackend {
    /// 数据缓冲区
    data: Vec<u8>,
    /// 当前位置
    pos: usize,
}

impl MemoryBackend {
    fn from_data(data: Vec<u8>) -> Self {
        Self { data, pos: 0 }
    }
}

impl IoBackend for MemoryBackend {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let available = self.data.len().saturating_sub(self.pos);
        let to_read = buf.len().min(available);
        if to_read == 0 {
            return Ok(0);
        }
        buf[..to_read].copy_from_slice(&self.data[self.pos..self.pos + to_read]);
        self.pos += to_read;
        Ok(to_read)
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        // 如果当前位置在数据末尾, 追加
        if self.pos >= self.data.len() {
            self.data.extend_from_slice(buf);
        } else {
            // 覆盖已有数据
            let overlap = (self.data.len() - self.pos).min(buf.len());
            self.data[self.pos..self.pos + overlap].copy_from_slice(&buf[..overlap]);
            if buf.len() > overlap {
                self.data.extend_from_slice(&buf[overlap..]);
            }
        }
        self.pos += buf.len();
        Ok(())
    }

    fn seek(&mut self, pos: io::SeekFrom) -> io::Result<u64> {
        let new_pos = match pos {
            io::SeekFrom::Start(offset) => offset as i64,
            io::SeekFrom::End(offset) => self.data.len() as i64 + offset,
            io::SeekFrom::Current(offset) => self.pos as i64 + offset,
        };
        if new_pos < 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "seek 位置不能为负",
            ));
        }
        self.pos = new_pos as usize;
        Ok(self.pos as u64)
    }

    fn position(&mut self) -> io::Result<u64> {
        Ok(self.pos as u64)
    }

    fn size(&self) -> Option<u64> {
        Some(self.data.len() as u64)
    }

    fn into_data(self: Box<Self>) -> Option<Vec<u8>> {
        Some(self.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_read_some_and_exact() {
        let mut io = IoContext::from_memory((0u8..10).collect());
        let mut buf = [0u8; 4];
        assert_eq!(io.read_some(&mut buf).unwrap(), 4);
        assert_eq!(buf, [0, 1, 2, 3]);
        assert_eq!(io.position().unwrap(), 4);

        let mut rest = [0u8; 8];
        assert_eq!(io.read_some(&mut rest).unwrap(), 6);
        assert!(matches!(io.read_exact(&mut buf), Err(NaluError::Eof)));

        io.seek(io::SeekFrom::Start(8)).unwrap();
        let mut two = [0u8; 2];
        io.read_exact(&mut two).unwrap();
        assert_eq!(two, [8, 9]);
    }

    #[test]
    fn test_memory_write_and_take() {
        let mut io = IoContext::memory();
        io.write_all(&[1, 2, 3]).unwrap();
        io.write_all(&[4]).unwrap();
        assert_eq!(io.size(), Some(4));
        assert_eq!(io.into_memory_data(), Some(vec![1, 2, 3, 4]));
    }

    #[test]
    fn test_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("io.bin");
        let mut out = IoContext::open_write(&path).unwrap();
        out.write_all(&[0xAA; 100]).unwrap();
        drop(out);

        let mut input = IoContext::open_read(&path).unwrap();
        assert_eq!(input.size(), Some(100));
        let mut buf = vec![0u8; 100];
        input.read_exact(&mut buf).unwrap();
        assert!(buf.iter().all(|&b| b == 0xAA));
        assert!(input.into_memory_data().is_none());
    }
}
