use std::io::{Read, Seek, SeekFrom};

use byteorder::{ByteOrder, LittleEndian};
use zstd::Decoder;

use super::{ChunkHeader, Compression, SIZE_CHUNK_HEADER};
use crate::error::{ReadError, Result};
use crate::overlap::SIZE_WORD;

/// Buffered reader handing out whole records from an inner reader
///
/// The buffer is refilled transparently when a request cannot be served from
/// what is left in it. Unconsumed bytes are moved to the front of the buffer
/// before a refill, so records that straddle two physical reads come out
/// whole.
pub struct ChunkReader<R: Read + Seek> {
    /// The source reader
    inner: R,
    /// Valid (decompressed) bytes; `buf.len()` is the valid length
    buf: Vec<u8>,
    /// Read cursor into `buf`
    pos: usize,
    /// Nominal capacity of `buf` in bytes
    capacity: usize,
    compression: Compression,
    /// Reusable buffer for compressed chunk bodies
    zbuf: Vec<u8>,
    /// Byte position of `inner`, used to report bad chunk headers
    offset: u64,
}
impl<R: Read + Seek> ChunkReader<R> {
    #[must_use]
    pub fn new(inner: R, capacity: usize, compression: Compression) -> Self {
        Self {
            inner,
            buf: Vec::with_capacity(capacity),
            pos: 0,
            capacity,
            compression,
            zbuf: Vec::new(),
            offset: 0,
        }
    }

    /// Number of bytes left in the buffer
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Loads the next physical chunk after the unconsumed tail of the buffer
    ///
    /// Returns `Ok(false)` if the inner reader had nothing left.
    pub fn refill(&mut self) -> Result<bool> {
        // Move remaining data to beginning of buffer
        self.buf.drain(..self.pos);
        self.pos = 0;

        if self.compression.is_compressed() {
            self.refill_compressed()
        } else {
            self.refill_uncompressed()
        }
    }

    fn refill_uncompressed(&mut self) -> Result<bool> {
        let want = self.capacity.saturating_sub(self.buf.len()) as u64;
        let n = (&mut self.inner).take(want).read_to_end(&mut self.buf)?;
        self.offset += n as u64;
        Ok(n > 0)
    }

    fn refill_compressed(&mut self) -> Result<bool> {
        let Some(header) = ChunkHeader::from_reader(&mut self.inner, self.offset)? else {
            return Ok(false);
        };
        self.offset += SIZE_CHUNK_HEADER as u64;

        self.zbuf.clear();
        let got = (&mut self.inner)
            .take(header.zlen)
            .read_to_end(&mut self.zbuf)? as u64;
        if got != header.zlen {
            return Err(ReadError::TruncatedChunk {
                expected: header.zlen,
                got,
            }
            .into());
        }
        self.offset += got;

        let before = self.buf.len();
        let mut decoder = Decoder::with_buffer(&self.zbuf[..])?;
        decoder.read_to_end(&mut self.buf)?;
        let len = (self.buf.len() - before) as u64;
        if len != header.len {
            return Err(ReadError::ChunkSizeMismatch {
                expected: header.len,
                got: len,
            }
            .into());
        }
        Ok(true)
    }

    /// Returns the next `size` bytes, or `None` at a clean end of stream
    ///
    /// # Errors
    ///
    /// Returns [`ReadError::PartialRecord`] if the stream ends with fewer
    /// than `size` bytes left.
    pub fn next_record_bytes(&mut self, size: usize) -> Result<Option<&[u8]>> {
        while self.remaining() < size {
            if !self.refill()? {
                return match self.remaining() {
                    0 => Ok(None),
                    n => Err(ReadError::PartialRecord(n).into()),
                };
            }
        }
        let start = self.pos;
        self.pos += size;
        Ok(Some(&self.buf[start..start + size]))
    }

    /// Returns the next little-endian word
    pub fn next_word(&mut self) -> Result<Option<u32>> {
        Ok(self.next_record_bytes(SIZE_WORD)?.map(LittleEndian::read_u32))
    }

    /// Positions the reader at record `index`
    ///
    /// Uncompressed streams seek directly. Compressed streams are walked from
    /// the start, skipping whole chunks by their headers, and the target
    /// chunk is decompressed.
    pub fn seek_record(&mut self, index: u64, record_size: usize) -> Result<()> {
        let target = index * record_size as u64;
        self.buf.clear();
        self.pos = 0;

        if !self.compression.is_compressed() {
            self.offset = self.inner.seek(SeekFrom::Start(target))?;
            return Ok(());
        }

        self.offset = self.inner.seek(SeekFrom::Start(0))?;
        let mut skipped = 0u64;
        while let Some(header) = ChunkHeader::from_reader(&mut self.inner, self.offset)? {
            if skipped + header.len > target {
                // Rewind to the header and let refill decode the chunk
                self.offset = self
                    .inner
                    .seek(SeekFrom::Current(-(SIZE_CHUNK_HEADER as i64)))?;
                self.refill()?;
                self.pos = (target - skipped) as usize;
                return Ok(());
            }
            skipped += header.len;
            self.offset = self
                .inner
                .seek(SeekFrom::Current(header.zlen as i64))?;
        }
        // Past the end: leave the reader exhausted
        Ok(())
    }

    /// Consumes the reader and returns the inner reader
    pub fn into_inner(self) -> R {
        self.inner
    }
}
