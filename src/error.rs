use std::path::{Path, PathBuf};

use crate::mode::FileMode;

/// Custom Result type for overlap file operations, wrapping the custom [`Error`] type
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for the crate, encompassing all possible error cases
/// that can occur while reading or writing overlap shards.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// An operation was attempted on a handle opened in an incompatible mode
    #[error(transparent)]
    ModeError(#[from] ModeError),

    /// Errors that occur during read operations
    #[error(transparent)]
    ReadError(#[from] ReadError),

    /// Errors that occur during write operations
    #[error(transparent)]
    WriteError(#[from] WriteError),

    /// Errors related to the overlap count sidecar
    #[error(transparent)]
    CountsError(#[from] CountsError),

    /// Errors raised while configuring a handle
    #[error(transparent)]
    BuilderError(#[from] BuilderError),

    /// A file could not be opened or created
    #[error("Failed to {op} '{}': {source}", path.display())]
    File {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Standard I/O errors from the Rust standard library
    #[error(transparent)]
    IoError(#[from] std::io::Error),
}
impl Error {
    /// Wraps an I/O error with the operation and file it happened on
    pub fn file<P: AsRef<Path>>(op: &'static str, path: P, source: std::io::Error) -> Self {
        Self::File {
            op,
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

/// Misuse of a handle: the operation is not available in the mode it was opened with
#[derive(thiserror::Error, Debug)]
pub enum ModeError {
    #[error("Cannot write overlaps to a file opened in {0:?} mode")]
    NotWritable(FileMode),

    #[error("Cannot read overlaps from a file opened in {0:?} mode")]
    NotReadable(FileMode),

    #[error("Cannot seek in a file opened in {0:?} mode")]
    NotSeekable(FileMode),

    #[error("Overlap counts are not available in {0:?} mode")]
    NoCounts(FileMode),
}

/// Errors that can occur while reading overlap data
#[derive(thiserror::Error, Debug)]
pub enum ReadError {
    /// The file being read is not a regular file (e.g., it might be a directory or special file)
    #[error("File is not regular")]
    IncompatibleFile,

    /// The file size is not a whole number of records
    ///
    /// # Arguments
    /// * `usize` - The size of the file in bytes
    #[error(
        "Number of bytes in file does not match expectation - possibly truncated at byte pos {0}"
    )]
    FileTruncation(usize),

    /// Attempted to access a record index that is beyond the available range
    #[error("Requested record index ({0}) is out of record range ({1})")]
    OutOfRange(usize, usize),

    /// Fewer bytes than one record were handed to the decoder
    #[error("Truncated record: expected {expected} bytes, got {got}")]
    TruncatedRecord { expected: usize, got: usize },

    /// The stream ended in the middle of a record
    ///
    /// # Arguments
    /// * `usize` - The number of dangling bytes
    #[error("Stream ended with a partial record ({0} trailing bytes)")]
    PartialRecord(usize),

    /// A compressed chunk did not start with the chunk magic number
    #[error("Invalid chunk magic number: {0:#x} at byte pos {1}")]
    InvalidChunkMagic(u64, u64),

    /// The stream ended in the middle of a chunk header
    #[error("Stream ended inside a chunk header ({0} bytes)")]
    TruncatedChunkHeader(usize),

    /// The stream ended before the advertised compressed chunk length
    #[error("Truncated chunk: expected {expected} bytes, got {got}")]
    TruncatedChunk { expected: u64, got: u64 },

    /// A chunk decompressed to a different size than its header claims
    #[error("Chunk decompressed to {got} bytes, header says {expected}")]
    ChunkSizeMismatch { expected: u64, got: u64 },
}

/// Errors that can occur while writing overlap data
#[derive(thiserror::Error, Debug)]
pub enum WriteError {
    /// A single record is larger than the whole write buffer
    #[error("Record size ({0}) exceeds the buffer capacity ({1})")]
    RecordExceedsBuffer(usize, usize),
}

/// Errors specific to the overlap count sidecar
#[derive(thiserror::Error, Debug)]
pub enum CountsError {
    /// The sidecar table does not match the number of reads in the store
    #[error("Counts table has {found} entries, expected {expected}")]
    TableLengthMismatch { expected: u32, found: u32 },

    /// The total does not fit the 32-bit field of the sidecar format
    #[error("Overlap total ({0}) does not fit in the 32-bit counts field")]
    TotalOverflow(u64),
}

/// Errors raised while building a handle
#[derive(thiserror::Error, Debug)]
pub enum BuilderError {
    /// Per-read counting was requested without the number of reads
    #[error("Mode {0:?} needs the number of reads in the store")]
    MissingReadCount(FileMode),

    /// The buffer cannot hold a single record
    #[error("Buffer capacity ({0}) is smaller than one record ({1})")]
    CapacityTooSmall(usize, usize),
}
