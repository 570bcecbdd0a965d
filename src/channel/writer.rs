use std::io::Write;

use zstd::Encoder as ZstdEncoder;

use super::{ChunkHeader, Compression, DEFAULT_COMPRESSION_LEVEL};
use crate::error::{Result, WriteError};

/// Buffered writer draining whole records to an inner writer
///
/// Bytes are staged in a buffer of fixed capacity. Appending a record that
/// does not fit first drains the buffer, so a record is never split across
/// two physical writes.
pub struct ChunkWriter<W: Write> {
    /// The underlying writer for output
    inner: W,
    /// Staged (uncompressed) bytes
    ubuf: Vec<u8>,
    /// Compressed side buffer
    zbuf: Vec<u8>,
    /// Capacity of `ubuf` in bytes
    capacity: usize,
    compression: Compression,
    level: i32,
    /// Number of physical writes so far
    chunks: u64,
    /// Bytes handed to `inner` so far (including chunk headers)
    bytes_written: u64,
}
impl<W: Write> ChunkWriter<W> {
    #[must_use]
    pub fn new(inner: W, capacity: usize, compression: Compression) -> Self {
        Self::with_level(inner, capacity, compression, DEFAULT_COMPRESSION_LEVEL)
    }

    #[must_use]
    pub fn with_level(inner: W, capacity: usize, compression: Compression, level: i32) -> Self {
        Self {
            inner,
            ubuf: Vec::with_capacity(capacity),
            zbuf: Vec::new(),
            capacity,
            compression,
            level,
            chunks: 0,
            bytes_written: 0,
        }
    }

    /// Stages the bytes of one record
    ///
    /// # Errors
    ///
    /// Returns [`WriteError::RecordExceedsBuffer`] if the record can never fit
    /// the buffer, or any I/O error from the implicit flush.
    pub fn append(&mut self, bytes: &[u8]) -> Result<()> {
        if bytes.len() > self.capacity {
            return Err(WriteError::RecordExceedsBuffer(bytes.len(), self.capacity).into());
        }
        if self.ubuf.len() + bytes.len() > self.capacity {
            self.flush(true)?;
        }
        self.ubuf.extend_from_slice(bytes);
        Ok(())
    }

    /// Drains the buffer if it is full, or unconditionally if `force` is set
    pub fn flush(&mut self, force: bool) -> Result<()> {
        if self.ubuf.is_empty() || (!force && self.ubuf.len() < self.capacity) {
            return Ok(());
        }
        if self.compression.is_compressed() {
            self.flush_compressed()?;
        } else {
            self.flush_uncompressed()?;
        }
        self.chunks += 1;
        self.ubuf.clear();
        Ok(())
    }

    fn flush_uncompressed(&mut self) -> Result<()> {
        self.inner.write_all(&self.ubuf)?;
        self.bytes_written += self.ubuf.len() as u64;
        log::trace!("wrote chunk {} ({} bytes)", self.chunks, self.ubuf.len());
        Ok(())
    }

    fn flush_compressed(&mut self) -> Result<()> {
        // Encode the chunk
        self.zbuf.clear();
        let mut encoder = ZstdEncoder::new(&mut self.zbuf, self.level)?;
        encoder.write_all(&self.ubuf)?;
        encoder.finish()?;

        // Write the chunk header and compressed body
        let header = ChunkHeader::new(self.zbuf.len() as u64, self.ubuf.len() as u64);
        header.write_bytes(&mut self.inner)?;
        self.inner.write_all(&self.zbuf)?;

        self.bytes_written += (super::SIZE_CHUNK_HEADER + self.zbuf.len()) as u64;
        log::trace!(
            "wrote chunk {} ({} bytes, {} compressed)",
            self.chunks,
            self.ubuf.len(),
            self.zbuf.len()
        );
        Ok(())
    }

    /// Drains everything staged and flushes the inner writer
    pub fn finish(&mut self) -> Result<()> {
        self.flush(true)?;
        self.inner.flush()?;
        Ok(())
    }

    /// Bytes currently staged
    #[must_use]
    pub fn buffered(&self) -> usize {
        self.ubuf.len()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[must_use]
    pub fn chunks(&self) -> u64 {
        self.chunks
    }

    #[must_use]
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Gets a mutable reference to the underlying writer
    pub fn by_ref(&mut self) -> &mut W {
        &mut self.inner
    }

    /// Consumes the writer and returns the underlying writer
    ///
    /// Staged bytes are *not* drained; call [`finish`](Self::finish) first.
    pub fn into_inner(self) -> W {
        self.inner
    }
}
