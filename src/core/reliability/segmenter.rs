//! The segmenter cuts the payload into segments addressed by byte offset.
//!
//! Segmenter 将载荷切分为以字节偏移量寻址的数据段。

use bytes::Bytes;

/// Splits a byte buffer into segments of at most `max_payload_size` bytes.
///
/// Segments are zero-copy slices of the original buffer, so the segmenter can
/// be asked for the same offset again when a segment has to be retransmitted.
///
/// 将字节缓冲区切分为最多 `max_payload_size` 字节的数据段。
/// 数据段是原始缓冲区的零拷贝切片，因此重传时可以再次请求相同的偏移量。
#[derive(Debug, Clone)]
pub struct Segmenter {
    data: Bytes,
    max_payload_size: usize,
}

impl Segmenter {
    pub fn new(data: Bytes, max_payload_size: usize) -> Self {
        Self {
            data,
            max_payload_size: max_payload_size.max(1),
        }
    }

    /// The total number of payload bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn max_payload_size(&self) -> usize {
        self.max_payload_size
    }

    /// Returns the segment starting at `offset`, or `None` once the offset
    /// reaches the end of the buffer.
    ///
    /// 返回从 `offset` 开始的数据段；偏移量到达缓冲区末尾时返回 `None`。
    pub fn segment_at(&self, offset: usize) -> Option<(usize, Bytes)> {
        if offset >= self.data.len() {
            return None;
        }
        let end = offset.saturating_add(self.max_payload_size).min(self.data.len());
        Some((offset, self.data.slice(offset..end)))
    }

    /// Iterates over the segments from `offset` onwards.
    pub fn iter_from(&self, offset: usize) -> Segments<'_> {
        Segments {
            segmenter: self,
            offset,
        }
    }

    pub fn iter(&self) -> Segments<'_> {
        self.iter_from(0)
    }
}

/// A lazy iterator over `(offset, payload)` pairs.
#[derive(Debug, Clone)]
pub struct Segments<'a> {
    segmenter: &'a Segmenter,
    offset: usize,
}

impl Iterator for Segments<'_> {
    type Item = (usize, Bytes);

    fn next(&mut self) -> Option<Self::Item> {
        let (offset, payload) = self.segmenter.segment_at(self.offset)?;
        self.offset += payload.len();
        Some((offset, payload))
    }
}
