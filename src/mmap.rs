use std::fs::File;
use std::ops::Range;
use std::path::Path;
use std::sync::Arc;

use bytemuck::cast_slice;
use memmap2::Mmap;

use crate::error::{Error, ReadError, Result};
use crate::overlap::{Overlap, RecordLayout};

/// Random access over an uncompressed overlap file
///
/// The file is memory-mapped and records are decoded on demand, so any
/// record can be fetched without streaming through the ones before it.
/// Compressed files have no fixed record offsets and cannot be mapped.
///
/// # Examples
///
/// ```no_run
/// use ovstore_file::{MmapOverlaps, RecordLayout, Result};
///
/// fn main() -> Result<()> {
///     let overlaps = MmapOverlaps::new("asm.ovlStore.1.0", RecordLayout::Full)?;
///     let overlap = overlaps.get(20)?;
///     println!("{} -> {}", overlap.a_iid, overlap.b_iid);
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct MmapOverlaps {
    /// Memory mapped file contents, shared between clones
    mmap: Arc<Mmap>,
    layout: RecordLayout,
}
impl MmapOverlaps {
    /// Maps the record file at `path`
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// * The file cannot be opened
    /// * The file is not a regular file
    /// * The file size is not a whole number of records
    pub fn new<P: AsRef<Path>>(path: P, layout: RecordLayout) -> Result<Self> {
        let path = path.as_ref();

        // Verify input file is a file before attempting to map
        let file = File::open(path).map_err(|e| Error::file("open", path, e))?;
        if !file.metadata()?.is_file() {
            return Err(ReadError::IncompatibleFile.into());
        }

        // Safety: the file is open and won't be modified while mapped
        let mmap = unsafe { Mmap::map(&file)? };

        if !mmap.len().is_multiple_of(layout.record_size()) {
            return Err(ReadError::FileTruncation(mmap.len()).into());
        }

        log::debug!(
            "mapped {} {layout:?} overlaps from '{}'",
            mmap.len() / layout.record_size(),
            path.display()
        );
        Ok(Self {
            mmap: Arc::new(mmap),
            layout,
        })
    }

    #[must_use]
    pub fn num_records(&self) -> usize {
        self.mmap.len() / self.layout.record_size()
    }

    #[must_use]
    pub fn layout(&self) -> RecordLayout {
        self.layout
    }

    /// Decodes the record at `idx`
    ///
    /// With the normal layout the returned `a_iid` is zero.
    pub fn get(&self, idx: usize) -> Result<Overlap> {
        Overlap::from_bytes(self.record_bytes(idx..idx + 1)?, self.layout)
    }

    /// Raw words of a range of records, as stored
    ///
    /// Words are little-endian on disk and are not swapped here.
    pub fn get_words(&self, range: Range<usize>) -> Result<&[u32]> {
        Ok(cast_slice(self.record_bytes(range)?))
    }

    /// Iterates over all records in file order
    pub fn iter(&self) -> impl Iterator<Item = Result<Overlap>> + '_ {
        self.mmap
            .chunks_exact(self.layout.record_size())
            .map(|bytes| Overlap::from_bytes(bytes, self.layout))
    }

    fn record_bytes(&self, range: Range<usize>) -> Result<&[u8]> {
        if range.end > self.num_records() || range.start > range.end {
            return Err(ReadError::OutOfRange(range.end, self.num_records()).into());
        }
        let rsize = self.layout.record_size();
        Ok(&self.mmap[range.start * rsize..range.end * rsize])
    }
}
