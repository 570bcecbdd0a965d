//! Overlap record module
//!
//! An overlap is a fixed-size record: the two read identifiers it joins and
//! a fixed number of payload words describing the alignment.
//!
//! ## Record Format
//!
//! | Field   | Size (bytes)                  | Present in     |
//! | ------- | ----------------------------- | -------------- |
//! | `a_iid` | 4                             | full layout    |
//! | `b_iid` | 4                             | both layouts   |
//! | `dat`   | `OVERLAP_NWORDS * SIZE_WORD`  | both layouts   |
//!
//! All words are stored little-endian with no padding and no per-record
//! length prefix. Files carry no header, so the layout must be known by
//! whoever opens the file (see [`FileMode`](crate::FileMode)).

use std::io::Write;

use byteorder::{ByteOrder, LittleEndian, WriteBytesExt};

use crate::error::{ReadError, Result};

/// Payload word type
pub type OverlapWord = u32;

/// Number of payload words in every overlap
pub const OVERLAP_NWORDS: usize = 5;

/// Size of a read identifier in bytes
pub const SIZE_ID: usize = std::mem::size_of::<u32>();

/// Size of a payload word in bytes
pub const SIZE_WORD: usize = std::mem::size_of::<OverlapWord>();

/// Size of the full payload in bytes
pub const SIZE_DAT: usize = OVERLAP_NWORDS * SIZE_WORD;

/// Which identifiers are stored with each record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordLayout {
    /// Only `b_iid` is stored; the file belongs to a single `a_iid`
    Normal,
    /// Both `a_iid` and `b_iid` are stored (overlapper output)
    Full,
}
impl RecordLayout {
    /// Number of identifiers stored per record
    #[must_use]
    pub const fn num_ids(self) -> usize {
        match self {
            Self::Normal => 1,
            Self::Full => 2,
        }
    }

    /// Size of one encoded record in bytes
    #[must_use]
    pub const fn record_size(self) -> usize {
        SIZE_ID * self.num_ids() + SIZE_DAT
    }
}

/// A single overlap between two reads
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Overlap {
    /// First read of the pair
    pub a_iid: u32,
    /// Second read of the pair
    pub b_iid: u32,
    /// Alignment payload, opaque to the file layer
    pub dat: [OverlapWord; OVERLAP_NWORDS],
}
impl Overlap {
    #[must_use]
    pub fn new(a_iid: u32, b_iid: u32, dat: [OverlapWord; OVERLAP_NWORDS]) -> Self {
        Self { a_iid, b_iid, dat }
    }

    /// Appends the encoded record to `buf`
    pub fn encode_into(&self, layout: RecordLayout, buf: &mut Vec<u8>) {
        let start = buf.len();
        buf.resize(start + layout.record_size(), 0);
        let out = &mut buf[start..];

        let mut pos = 0;
        if layout == RecordLayout::Full {
            LittleEndian::write_u32(&mut out[pos..pos + SIZE_ID], self.a_iid);
            pos += SIZE_ID;
        }
        LittleEndian::write_u32(&mut out[pos..pos + SIZE_ID], self.b_iid);
        pos += SIZE_ID;
        LittleEndian::write_u32_into(&self.dat, &mut out[pos..pos + SIZE_DAT]);
    }

    /// Writes the encoded record to a writer
    pub fn write_bytes<W: Write>(&self, layout: RecordLayout, writer: &mut W) -> Result<()> {
        if layout == RecordLayout::Full {
            writer.write_u32::<LittleEndian>(self.a_iid)?;
        }
        writer.write_u32::<LittleEndian>(self.b_iid)?;
        self.dat
            .iter()
            .try_for_each(|&w| writer.write_u32::<LittleEndian>(w))?;
        Ok(())
    }

    /// Decodes a record from the front of `bytes`
    ///
    /// With the normal layout the returned `a_iid` is zero.
    ///
    /// # Errors
    ///
    /// Returns [`ReadError::TruncatedRecord`] if `bytes` is shorter than one record.
    pub fn from_bytes(bytes: &[u8], layout: RecordLayout) -> Result<Self> {
        let mut overlap = Self::default();
        overlap.decode_into(bytes, layout)?;
        Ok(overlap)
    }

    /// Decodes a record from the front of `bytes` into `self`
    ///
    /// With the normal layout `a_iid` is left untouched, since the caller
    /// is the one who knows which read the file belongs to.
    pub fn decode_into(&mut self, bytes: &[u8], layout: RecordLayout) -> Result<()> {
        let size = layout.record_size();
        if bytes.len() < size {
            return Err(ReadError::TruncatedRecord {
                expected: size,
                got: bytes.len(),
            }
            .into());
        }

        let mut pos = 0;
        if layout == RecordLayout::Full {
            self.a_iid = LittleEndian::read_u32(&bytes[pos..pos + SIZE_ID]);
            pos += SIZE_ID;
        }
        self.b_iid = LittleEndian::read_u32(&bytes[pos..pos + SIZE_ID]);
        pos += SIZE_ID;
        LittleEndian::read_u32_into(&bytes[pos..pos + SIZE_DAT], &mut self.dat);
        Ok(())
    }
}
