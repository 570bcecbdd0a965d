//! # counts
//!
//! Per-read overlap tallies kept next to a full overlap file.
//!
//! While overlapper output is written, every overlap bumps the tally of both
//! of its reads. At close the table is saved to `<prefix>.oc` so the store
//! builder can size its per-read buffers without scanning the overlaps.
//!
//! ## Sidecar Format
//!
//! | Offset | Size (bytes)  | Name  | Description                       | Type         |
//! | ------ | ------------- | ----- | --------------------------------- | ------------ |
//! | 0      | 4             | total | Number of overlaps in the file    | uint32       |
//! | 4      | 4             | len   | Table length (number of reads + 1)| uint32       |
//! | 8      | 4 * len       | table | Overlaps per read id              | uint32 array |
//!
//! All fields are little-endian. The total is tracked as 64 bits in memory
//! but stored in 32; saving a total that does not fit is an error.

use auto_impl::auto_impl;

mod reader;
mod writer;

pub use reader::CountsReader;
pub use writer::CountsWriter;

/// Size of the fixed sidecar preamble in bytes (total + table length)
pub const SIZE_COUNTS_HEADER: usize = 8;

/// The single question the file layer asks of the sequence store
#[auto_impl(&, &mut, Box, Rc, Arc)]
pub trait ReadStore {
    /// Total number of reads; valid read ids are `1..=num_reads`
    fn num_reads(&self) -> u32;
}

impl ReadStore for u32 {
    fn num_reads(&self) -> u32 {
        *self
    }
}

/// Length of a counts table for a store of `num_reads` reads
#[must_use]
pub fn table_len(num_reads: u32) -> usize {
    num_reads as usize + 1
}
