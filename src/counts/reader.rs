use std::fs::File;
use std::io::{BufReader, ErrorKind, Read};
use std::path::{Path, PathBuf};

use byteorder::{LittleEndian, ReadBytesExt};

use super::table_len;
use crate::error::{CountsError, Error, Result};
use crate::shard::counts_path_for;

/// Per-read overlap counts loaded from a sidecar
///
/// A missing sidecar is not an error: files that are still being written,
/// or that were written without counts, simply have none. In that case every
/// query answers zero.
#[derive(Debug, Clone, Default)]
pub struct CountsReader {
    total: u64,
    table: Vec<u32>,
    path: Option<PathBuf>,
}
impl CountsReader {
    /// Loads the counts of the data file `prefix`, if it has any
    ///
    /// # Errors
    ///
    /// Returns an error if the sidecar exists but cannot be opened or read,
    /// or if its table does not match a store of `num_reads` reads.
    pub fn new(num_reads: u32, prefix: Option<&Path>) -> Result<Self> {
        let Some(prefix) = prefix else {
            return Ok(Self::default());
        };

        let path = counts_path_for(prefix);
        let mut reader = match File::open(&path) {
            Ok(file) => BufReader::new(file),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::debug!("no overlap counts at '{}'", path.display());
                return Ok(Self::default());
            }
            Err(e) => return Err(Error::file("open", &path, e)),
        };
        let counts = Self::from_reader(&mut reader, num_reads)?;
        log::debug!(
            "loaded {} overlaps over {} reads from '{}'",
            counts.total,
            num_reads,
            path.display()
        );
        Ok(Self {
            path: Some(path),
            ..counts
        })
    }

    /// Parses sidecar bytes for a store of `num_reads` reads
    pub fn from_reader<R: Read>(reader: &mut R, num_reads: u32) -> Result<Self> {
        let total = reader.read_u32::<LittleEndian>()?;
        let len = reader.read_u32::<LittleEndian>()?;
        if len as usize != table_len(num_reads) {
            return Err(CountsError::TableLengthMismatch {
                expected: table_len(num_reads) as u32,
                found: len,
            }
            .into());
        }
        let mut table = vec![0u32; len as usize];
        reader.read_u32_into::<LittleEndian>(&mut table)?;
        Ok(Self {
            total: u64::from(total),
            table,
            path: None,
        })
    }

    /// True if a sidecar was found and loaded
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        !self.table.is_empty()
    }

    /// Total number of overlaps in the file
    #[must_use]
    pub fn num_overlaps(&self) -> u64 {
        self.total
    }

    /// Number of overlaps involving `read_id`
    ///
    /// # Panics
    ///
    /// Panics if a sidecar was loaded and `read_id` is beyond its table.
    #[must_use]
    pub fn overlaps_for(&self, read_id: u32) -> u32 {
        if !self.is_loaded() {
            return 0;
        }
        assert!(
            (read_id as usize) < self.table.len(),
            "read {read_id} is beyond the counts table ({} reads)",
            self.table.len() - 1
        );
        self.table[read_id as usize]
    }

    /// The whole table, indexed by read id
    #[must_use]
    pub fn table(&self) -> &[u32] {
        &self.table
    }

    /// Sidecar the counts were loaded from
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}
