//! # ovstore-file
//!
//! Sharded files of overlap records for building an overlap store.
//!
//! Overlapper workers each own one `(slice, piece)` shard of a store and
//! write their overlaps to it through an [`OverlapFile`]. While writing, the
//! overlaps are tallied per read and the tally is saved next to the shard,
//! so the store builder can size its buckets before reading a single record
//! back.
//!
//! ## Files
//!
//! | File                            | Content                                   |
//! | ------------------------------- | ----------------------------------------- |
//! | `{store}.{slice}.{piece}`       | fixed-size records (see [`RecordLayout`]) |
//! | `{store}.{slice}.{piece}.zst`   | the same records in zstd chunks           |
//! | `{store}.{slice}.{piece}.oc`    | per-read overlap counts                   |
//!
//! ## Example
//!
//! ```no_run
//! use ovstore_file::{FileMode, Overlap, OverlapFileBuilder, Result, ShardAddress};
//!
//! fn main() -> Result<()> {
//!     let address = ShardAddress::new("asm.ovlStore", 0, 0);
//!
//!     let mut file = OverlapFileBuilder::new()
//!         .mode(FileMode::FullWrite)
//!         .num_reads(5)
//!         .open_shard(&address)?;
//!     file.write_overlap(&Overlap::new(1, 2, [0; 5]))?;
//!     file.close()?;
//!
//!     let file = OverlapFileBuilder::new()
//!         .mode(FileMode::FullCounts)
//!         .num_reads(5)
//!         .open_shard(&address)?;
//!     assert_eq!(file.counts()?.overlaps_for(1), 1);
//!     Ok(())
//! }
//! ```

mod channel;
mod counts;
mod error;
mod file;
mod histogram;
mod mmap;
mod mode;
mod overlap;
mod shard;

pub use channel::{
    ChunkReader, ChunkWriter, Compression, DEFAULT_BUFFER_SIZE, DEFAULT_COMPRESSION_LEVEL,
};
pub use counts::{table_len, CountsReader, CountsWriter, ReadStore, SIZE_COUNTS_HEADER};
pub use error::{BuilderError, CountsError, Error, ModeError, ReadError, Result, WriteError};
pub use file::{OverlapFile, OverlapFileBuilder, DEFAULT_MAX_OVERLAPS};
pub use histogram::{OverlapAccumulator, OverlapHistogram};
pub use mmap::MmapOverlaps;
pub use mode::FileMode;
pub use overlap::{
    Overlap, OverlapWord, RecordLayout, OVERLAP_NWORDS, SIZE_DAT, SIZE_ID, SIZE_WORD,
};
pub use shard::{counts_path_for, shard_file_name, ShardAddress, COUNTS_SUFFIX, ZSTD_SUFFIX};
