//! 带前后预留空间的字节缓冲区.
//!
//! 物理存储被划分为三段: `[prebuffer | 逻辑数据 | postbuffer]`.
//! 前置预留允许在不重新分配的情况下 prepend 头部 (如 RTP 头),
//! 后置预留允许直接在尾部追加数据.
//!
//! 所有下标访问都相对于逻辑起点 (偏移 prebuffer).

use std::ops::{Deref, DerefMut};

use crate::{NaluError, NaluResult};

/// 字节缓冲区
///
/// 独占其存储. `clone()` 产生独立的深拷贝, 不会与原缓冲区共享内存.
///
/// # 示例
/// ```
/// use nalu_core::ByteBuffer;
///
/// let mut buf = ByteBuffer::with_reserve(8, 2, 0).unwrap();
/// assert_eq!(buf.len(), 6);
/// buf.prepend(&[0xAA, 0xBB]).unwrap();
/// assert_eq!(buf.len(), 8);
/// assert_eq!(buf[0], 0xAA);
/// assert!(buf.prepend(&[0xCC]).is_err());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ByteBuffer {
    /// 物理存储
    storage: Vec<u8>,
    /// 前置预留字节数
    prebuffer: usize,
    /// 后置预留字节数
    postbuffer: usize,
}

impl ByteBuffer {
    /// 创建空缓冲区
    pub fn new() -> Self {
        Self::default()
    }

    /// 分配指定大小的缓冲区 (内容清零, 无预留)
    pub fn allocate(size: usize) -> Self {
        Self {
            storage: vec![0u8; size],
            prebuffer: 0,
            postbuffer: 0,
        }
    }

    /// 分配缓冲区并划出前后预留空间
    ///
    /// `prebuffer + postbuffer` 超过 `size` 时失败.
    pub fn with_reserve(size: usize, prebuffer: usize, postbuffer: usize) -> NaluResult<Self> {
        check_reserve(size, prebuffer, postbuffer)?;
        Ok(Self {
            storage: vec![0u8; size],
            prebuffer,
            postbuffer,
        })
    }

    /// 接管已有数据 (无预留)
    pub fn from_vec(data: Vec<u8>) -> Self {
        Self {
            storage: data,
            prebuffer: 0,
            postbuffer: 0,
        }
    }

    /// 接管已有数据, 其前 `prebuffer` 字节作为前置预留
    ///
    /// `prebuffer` 超过数据长度时截断为数据长度.
    pub fn with_prebuffer(data: Vec<u8>, prebuffer: usize) -> Self {
        let prebuffer = prebuffer.min(data.len());
        Self {
            storage: data,
            prebuffer,
            postbuffer: 0,
        }
    }

    /// 替换存储内容 (无预留)
    pub fn set(&mut self, data: Vec<u8>) {
        self.storage = data;
        self.prebuffer = 0;
        self.postbuffer = 0;
    }

    /// 替换存储内容, 并在新存储中划出前后预留空间
    pub fn set_with_reserve(
        &mut self,
        data: Vec<u8>,
        prebuffer: usize,
        postbuffer: usize,
    ) -> NaluResult<()> {
        check_reserve(data.len(), prebuffer, postbuffer)?;
        self.storage = data;
        self.prebuffer = prebuffer;
        self.postbuffer = postbuffer;
        Ok(())
    }

    /// 在逻辑数据前插入字节
    ///
    /// 仅当 `bytes.len() <= prebuffer` 时成功, 成功后前置预留相应减少.
    pub fn prepend(&mut self, bytes: &[u8]) -> NaluResult<()> {
        if bytes.len() > self.prebuffer {
            return Err(NaluError::Capacity(format!(
                "prepend {} 字节, 前置预留仅 {} 字节",
                bytes.len(),
                self.prebuffer,
            )));
        }
        let start = self.prebuffer - bytes.len();
        self.storage[start..self.prebuffer].copy_from_slice(bytes);
        self.prebuffer = start;
        Ok(())
    }

    /// 将 n 字节后置预留并入逻辑数据
    ///
    /// 并入的字节可通过下标直接写入.
    pub fn consume_postbuffer(&mut self, n: usize) -> NaluResult<()> {
        if n > self.postbuffer {
            return Err(NaluError::Capacity(format!(
                "consume_postbuffer {} 字节, 后置预留仅 {} 字节",
                n, self.postbuffer,
            )));
        }
        self.postbuffer -= n;
        Ok(())
    }

    /// 逻辑数据长度
    pub fn len(&self) -> usize {
        self.storage.len() - self.prebuffer - self.postbuffer
    }

    /// 逻辑数据是否为空
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 物理存储长度
    pub fn physical_len(&self) -> usize {
        self.storage.len()
    }

    /// 剩余前置预留字节数
    pub fn prebuffer_len(&self) -> usize {
        self.prebuffer
    }

    /// 剩余后置预留字节数
    pub fn postbuffer_len(&self) -> usize {
        self.postbuffer
    }

    /// 逻辑数据切片
    pub fn as_slice(&self) -> &[u8] {
        &self.storage[self.prebuffer..self.storage.len() - self.postbuffer]
    }

    /// 逻辑数据可变切片
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        let end = self.storage.len() - self.postbuffer;
        &mut self.storage[self.prebuffer..end]
    }

    /// 取出逻辑数据 (丢弃预留空间)
    pub fn into_vec(mut self) -> Vec<u8> {
        let end = self.storage.len() - self.postbuffer;
        self.storage.truncate(end);
        self.storage.drain(..self.prebuffer);
        self.storage
    }
}

fn check_reserve(size: usize, prebuffer: usize, postbuffer: usize) -> NaluResult<()> {
    if prebuffer.saturating_add(postbuffer) > size {
        return Err(NaluError::InvalidArgument(format!(
            "预留空间 {}+{} 超过缓冲区大小 {}",
            prebuffer, postbuffer, size,
        )));
    }
    Ok(())
}

impl Deref for ByteBuffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.as_slice()
    }
}

impl DerefMut for ByteBuffer {
    fn deref_mut(&mut self) -> &mut [u8] {
        self.as_mut_slice()
    }
}

impl AsRef<[u8]> for ByteBuffer {
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}

impl From<Vec<u8>> for ByteBuffer {
    fn from(data: Vec<u8>) -> Self {
        Self::from_vec(data)
    }
}

impl From<&[u8]> for ByteBuffer {
    fn from(data: &[u8]) -> Self {
        Self::from_vec(data.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserve_exceeds_size() {
        assert!(ByteBuffer::with_reserve(4, 3, 2).is_err());
        let buf = ByteBuffer::with_reserve(5, 3, 2).unwrap();
        assert_eq!(buf.len(), 0);
        assert_eq!(buf.physical_len(), 5);
    }

    #[test]
    fn test_prepend_consumes_prebuffer() {
        let mut buf = ByteBuffer::new();
        buf.set_with_reserve(vec![0, 0, 0, 1, 2, 3], 3, 0).unwrap();
        assert_eq!(buf.as_slice(), &[1, 2, 3]);

        buf.prepend(&[9, 8]).unwrap();
        assert_eq!(buf.as_slice(), &[9, 8, 1, 2, 3]);
        assert_eq!(buf.prebuffer_len(), 1);

        let err = buf.prepend(&[7, 7]).unwrap_err();
        assert!(matches!(err, NaluError::Capacity(_)));
        assert_eq!(buf.as_slice(), &[9, 8, 1, 2, 3]);

        buf.prepend(&[7]).unwrap();
        assert_eq!(buf.as_slice(), &[7, 9, 8, 1, 2, 3]);
        assert_eq!(buf.prebuffer_len(), 0);
    }

    #[test]
    fn test_consume_postbuffer() {
        let mut buf = ByteBuffer::with_reserve(6, 0, 2).unwrap();
        assert_eq!(buf.len(), 4);
        buf.consume_postbuffer(1).unwrap();
        assert_eq!(buf.len(), 5);
        buf[4] = 0x55;
        assert_eq!(buf.get(4), Some(&0x55));
        assert!(buf.consume_postbuffer(2).is_err());
        buf.consume_postbuffer(1).unwrap();
        assert_eq!(buf.postbuffer_len(), 0);
    }

    #[test]
    fn test_clone_is_deep_copy() {
        let original = ByteBuffer::from_vec(vec![1, 2, 3]);
        let mut copy = original.clone();
        copy[0] = 0xFF;
        assert_eq!(original[0], 1);
        assert_eq!(copy[0], 0xFF);
    }

    #[test]
    fn test_index_relative_to_logical_start() {
        let mut buf = ByteBuffer::with_reserve(4, 2, 1).unwrap();
        buf[0] = 0x42;
        assert_eq!(buf.len(), 1);
        assert_eq!(buf.get(1), None);
        assert_eq!(buf.clone().into_vec(), vec![0x42]);
    }
}
