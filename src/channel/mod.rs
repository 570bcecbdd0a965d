//! # channel
//!
//! Fixed-capacity buffering between the record codec and a file.
//!
//! Records are appended to an in-memory buffer which is drained to the
//! underlying writer whenever it fills up or a flush is forced. A drain only
//! ever happens on a record boundary, so every physical write holds whole
//! records.
//!
//! ## Uncompressed channels
//!
//! Drained bytes are written as-is. The file is a plain concatenation of
//! records, which keeps it seekable by `index * record_size` and mappable
//! by [`MmapOverlaps`](crate::MmapOverlaps).
//!
//! ## Compressed channels
//!
//! Each drain is compressed with zstd into a side buffer and written as a
//! chunk:
//!
//! | Offset | Size (bytes) | Name     | Description                      | Type   |
//! | ------ | ------------ | -------- | -------------------------------- | ------ |
//! | 0      | 8            | magic    | Magic number ("OVLCHUNK")        | uint64 |
//! | 8      | 8            | zlen     | Compressed length of the chunk   | uint64 |
//! | 16     | 8            | len      | Uncompressed length of the chunk | uint64 |
//! | 24     | 8            | reserved | Reserved for future use          | bytes  |
//!
//! followed by `zlen` bytes of zstd frame.

use std::io::{Read, Write};
use std::path::Path;

use byteorder::{ByteOrder, LittleEndian};

use crate::error::{ReadError, Result};
use crate::shard::ZSTD_SUFFIX;

mod reader;
mod writer;

pub use reader::ChunkReader;
pub use writer::ChunkWriter;

/// Default buffer capacity in bytes: 1MB
pub const DEFAULT_BUFFER_SIZE: usize = 1024 * 1024;

/// Default zstd compression level
pub const DEFAULT_COMPRESSION_LEVEL: i32 = 3;

/// Size of a chunk header in bytes
pub(crate) const SIZE_CHUNK_HEADER: usize = 32;

/// Magic number for chunk identification: "OVLCHUNK" in ASCII (little-endian)
#[allow(clippy::unreadable_literal)]
const CHUNK_MAGIC: u64 = 0x4b4e5548434c564f;

/// Reserved bytes in the chunk header
const RESERVED_BYTES_CHUNK: [u8; 8] = [42; 8];

/// Whether physical writes are compressed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Compression {
    #[default]
    None,
    Zstd,
}
impl Compression {
    /// Compression implied by a file name: zstd for names ending in `.zst`
    pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
        let is_zstd = path
            .as_ref()
            .to_str()
            .is_some_and(|s| s.ends_with(ZSTD_SUFFIX));
        if is_zstd {
            Self::Zstd
        } else {
            Self::None
        }
    }

    #[must_use]
    pub fn is_compressed(self) -> bool {
        self == Self::Zstd
    }
}

/// Header written in front of every compressed chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ChunkHeader {
    pub magic: u64,
    /// Compressed size of the chunk body
    pub zlen: u64,
    /// Size of the chunk body once decompressed
    pub len: u64,
    pub reserved: [u8; 8],
}
impl ChunkHeader {
    #[must_use]
    pub fn new(zlen: u64, len: u64) -> Self {
        Self {
            magic: CHUNK_MAGIC,
            zlen,
            len,
            reserved: RESERVED_BYTES_CHUNK,
        }
    }

    pub fn write_bytes<W: Write>(&self, writer: &mut W) -> Result<()> {
        let mut buffer = [0u8; SIZE_CHUNK_HEADER];
        LittleEndian::write_u64(&mut buffer[0..8], self.magic);
        LittleEndian::write_u64(&mut buffer[8..16], self.zlen);
        LittleEndian::write_u64(&mut buffer[16..24], self.len);
        buffer[24..].copy_from_slice(&self.reserved);
        writer.write_all(&buffer)?;
        Ok(())
    }

    /// Parses a chunk header, validating its magic number
    ///
    /// `offset` is only used to report where a bad header was found.
    pub fn from_bytes(buffer: &[u8; SIZE_CHUNK_HEADER], offset: u64) -> Result<Self> {
        let magic = LittleEndian::read_u64(&buffer[0..8]);
        if magic != CHUNK_MAGIC {
            return Err(ReadError::InvalidChunkMagic(magic, offset).into());
        }
        let zlen = LittleEndian::read_u64(&buffer[8..16]);
        let len = LittleEndian::read_u64(&buffer[16..24]);
        Ok(Self::new(zlen, len))
    }

    /// Reads the next chunk header
    ///
    /// Returns `Ok(None)` at a clean end of stream and an error if the stream
    /// ends part way through the header.
    pub fn from_reader<R: Read>(reader: &mut R, offset: u64) -> Result<Option<Self>> {
        let mut buffer = Vec::with_capacity(SIZE_CHUNK_HEADER);
        reader
            .take(SIZE_CHUNK_HEADER as u64)
            .read_to_end(&mut buffer)?;
        match buffer.len() {
            0 => Ok(None),
            SIZE_CHUNK_HEADER => {
                let mut bytes = [0u8; SIZE_CHUNK_HEADER];
                bytes.copy_from_slice(&buffer);
                Self::from_bytes(&bytes, offset).map(Some)
            }
            n => Err(ReadError::TruncatedChunkHeader(n).into()),
        }
    }
}
