//! BinaryReader - 二进制数据读取工具
//!
//! 指令数据与账户数据都是固定偏移的小端布局，所有读取先做边界检查，
//! 越界返回 `ReadError` 而不是 panic

use solana_sdk::pubkey::Pubkey;

/// 读取错误
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReadError {
    #[error("数据越界: 需要在 offset {offset} 读取 {length} 字节，缓冲区长度 {buffer_len}")]
    OutOfBounds { offset: usize, length: usize, buffer_len: usize },
}

#[derive(Debug, Clone)]
pub struct BinaryReader<'a> {
    buffer: &'a [u8],
    offset: usize,
}

impl<'a> BinaryReader<'a> {
    pub fn new(buffer: &'a [u8]) -> Self {
        Self { buffer, offset: 0 }
    }

    /// 从指定 offset 开始读取
    pub fn at(buffer: &'a [u8], offset: usize) -> Self {
        Self { buffer, offset }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn remaining(&self) -> usize {
        self.buffer.len().saturating_sub(self.offset)
    }

    fn take(&mut self, length: usize) -> Result<&'a [u8], ReadError> {
        let end = self.offset.checked_add(length).filter(|end| *end <= self.buffer.len());
        match end {
            Some(end) => {
                let bytes = &self.buffer[self.offset..end];
                self.offset = end;
                Ok(bytes)
            }
            None => Err(ReadError::OutOfBounds {
                offset: self.offset,
                length,
                buffer_len: self.buffer.len(),
            }),
        }
    }

    fn take_array<const N: usize>(&mut self) -> Result<[u8; N], ReadError> {
        let mut array = [0u8; N];
        array.copy_from_slice(self.take(N)?);
        Ok(array)
    }

    pub fn read_u8(&mut self) -> Result<u8, ReadError> {
        Ok(self.take_array::<1>()?[0])
    }

    pub fn read_u32(&mut self) -> Result<u32, ReadError> {
        self.take_array().map(u32::from_le_bytes)
    }

    pub fn read_u64(&mut self) -> Result<u64, ReadError> {
        self.take_array().map(u64::from_le_bytes)
    }

    pub fn read_pubkey(&mut self) -> Result<Pubkey, ReadError> {
        self.take_array::<32>().map(Pubkey::new_from_array)
    }

    pub fn skip(&mut self, length: usize) -> Result<(), ReadError> {
        self.take(length).map(|_| ())
    }
}
