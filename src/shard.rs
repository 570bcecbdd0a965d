//! Shard addressing
//!
//! Every overlap worker owns one `(slice, piece)` pair of a store and writes
//! to the file derived from it. The same functions are used by the merge
//! phase to find those files again, so naming must stay a pure function of
//! its inputs.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Suffix of the overlap counts sidecar
pub const COUNTS_SUFFIX: &str = ".oc";

/// Suffix of zstd-compressed record data
pub const ZSTD_SUFFIX: &str = ".zst";

/// Builds the data file name of a shard: `{store}.{slice}.{piece}`
///
/// Slice and piece are plain decimal numbers, which never contain the
/// separator, so distinct pairs always map to distinct names.
#[must_use]
pub fn shard_file_name<P: AsRef<Path>>(store: P, slice: u32, piece: u32) -> PathBuf {
    append_suffix(store.as_ref(), &format!(".{slice}.{piece}"))
}

/// Path of the counts sidecar for a data file
///
/// A trailing compression suffix is stripped first so a compressed shard and
/// an uncompressed one share the same sidecar name.
#[must_use]
pub fn counts_path_for<P: AsRef<Path>>(data: P) -> PathBuf {
    append_suffix(&strip_compression_suffix(data.as_ref()), COUNTS_SUFFIX)
}

/// Removes a trailing [`ZSTD_SUFFIX`], if any
#[must_use]
pub(crate) fn strip_compression_suffix(path: &Path) -> PathBuf {
    match path.to_str().and_then(|s| s.strip_suffix(ZSTD_SUFFIX)) {
        Some(stripped) => PathBuf::from(stripped),
        None => path.to_path_buf(),
    }
}

fn append_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

/// Location of one shard within a store
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ShardAddress {
    /// Logical store name (a path prefix)
    pub store: PathBuf,
    pub slice: u32,
    pub piece: u32,
}
impl ShardAddress {
    #[must_use]
    pub fn new<P: AsRef<Path>>(store: P, slice: u32, piece: u32) -> Self {
        Self {
            store: store.as_ref().to_path_buf(),
            slice,
            piece,
        }
    }

    /// Uncompressed record data
    #[must_use]
    pub fn data_path(&self) -> PathBuf {
        shard_file_name(&self.store, self.slice, self.piece)
    }

    /// Compressed record data
    #[must_use]
    pub fn compressed_data_path(&self) -> PathBuf {
        append_suffix(&self.data_path(), ZSTD_SUFFIX)
    }

    /// Overlap counts sidecar
    #[must_use]
    pub fn counts_path(&self) -> PathBuf {
        counts_path_for(self.data_path())
    }

    /// The address a writer rolls over to once its current piece is full
    #[must_use]
    pub fn next_piece(&self) -> Self {
        Self {
            store: self.store.clone(),
            slice: self.slice,
            piece: self.piece + 1,
        }
    }
}
