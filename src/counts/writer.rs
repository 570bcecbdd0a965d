use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use byteorder::{LittleEndian, WriteBytesExt};

use super::table_len;
use crate::error::{CountsError, Error, Result};
use crate::shard::counts_path_for;

/// Tallies overlaps while a file is written
///
/// Without a prefix only the running total is kept, which is all a writer
/// needs to decide when its file is too big. With a prefix, overlaps are also
/// counted per read and the table is saved to `<prefix>.oc` when the writer
/// is finished or dropped, even if no overlap was ever added.
pub struct CountsWriter {
    /// Total number of overlaps added
    total: u64,
    /// Overlaps per read id; empty when only the total is tracked
    table: Vec<u32>,
    /// Where the table is saved
    path: Option<PathBuf>,
    /// Set once the table has been saved (or there is nothing to save)
    finished: bool,
}
impl CountsWriter {
    /// Creates a writer for a store of `num_reads` reads
    ///
    /// `prefix` is the data file the counts belong to; `None` tracks only the
    /// total.
    #[must_use]
    pub fn new(num_reads: u32, prefix: Option<&Path>) -> Self {
        match prefix {
            Some(prefix) => Self {
                total: 0,
                table: vec![0; table_len(num_reads)],
                path: Some(counts_path_for(prefix)),
                finished: false,
            },
            None => Self::total_only(),
        }
    }

    /// Creates a writer that tallies per read but never saves a sidecar
    #[must_use]
    pub fn in_memory(num_reads: u32) -> Self {
        Self {
            total: 0,
            table: vec![0; table_len(num_reads)],
            path: None,
            finished: true,
        }
    }

    /// Creates a writer that only tracks the total
    #[must_use]
    pub fn total_only() -> Self {
        Self {
            total: 0,
            table: Vec::new(),
            path: None,
            finished: true,
        }
    }

    /// True if overlaps are tallied per read
    #[must_use]
    pub fn is_tracking(&self) -> bool {
        !self.table.is_empty()
    }

    /// Records one overlap between `a_iid` and `b_iid`
    ///
    /// Per-read tallies saturate at `u32::MAX`, the widest the sidecar can
    /// store.
    ///
    /// # Panics
    ///
    /// Panics if per-read tracking is active and either id is larger than the
    /// number of reads the writer was created for. Nothing is counted then.
    pub fn add_overlap(&mut self, a_iid: u32, b_iid: u32) {
        if !self.is_tracking() {
            self.total += 1;
            return;
        }

        let len = self.table.len();
        assert!(
            (a_iid as usize) < len && (b_iid as usize) < len,
            "overlap ({a_iid}, {b_iid}) references a read beyond the store ({} reads)",
            len - 1
        );
        self.total += 1;
        for id in [a_iid, b_iid] {
            let tally = &mut self.table[id as usize];
            *tally = tally.saturating_add(1);
        }
    }

    /// Total number of overlaps added so far
    #[must_use]
    pub fn num_overlaps(&self) -> u64 {
        self.total
    }

    /// Tally of a single read (zero when only the total is tracked)
    #[must_use]
    pub fn overlaps_for(&self, read_id: u32) -> u32 {
        self.table.get(read_id as usize).copied().unwrap_or(0)
    }

    /// Path of the sidecar this writer saves to
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Writes the sidecar bytes to a writer
    pub fn write_bytes<W: Write>(&self, writer: &mut W) -> Result<()> {
        let total =
            u32::try_from(self.total).map_err(|_| CountsError::TotalOverflow(self.total))?;
        writer.write_u32::<LittleEndian>(total)?;
        writer.write_u32::<LittleEndian>(self.table.len() as u32)?;
        self.table
            .iter()
            .try_for_each(|&n| writer.write_u32::<LittleEndian>(n))?;
        Ok(())
    }

    /// Gives up on the sidecar without saving it
    ///
    /// Used when the data file it describes could not be written, so that no
    /// sidecar claims overlaps that never reached the disk.
    pub fn abandon(&mut self) {
        self.finished = true;
    }

    /// Saves the sidecar, once
    ///
    /// Does nothing for total-only writers or if the sidecar was already
    /// saved.
    pub fn finish(&mut self) -> Result<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;

        let Some(path) = self.path.as_deref() else {
            return Ok(());
        };
        let mut writer = File::create(path)
            .map(BufWriter::new)
            .map_err(|e| Error::file("create", path, e))?;
        self.write_bytes(&mut writer)?;
        writer.flush()?;
        log::debug!(
            "saved {} overlaps over {} reads to '{}'",
            self.total,
            self.table.len().saturating_sub(1),
            path.display()
        );
        Ok(())
    }
}

impl Drop for CountsWriter {
    fn drop(&mut self) {
        if let Err(err) = self.finish() {
            if std::thread::panicking() {
                log::error!("CountsWriter: failed to save overlap counts: {err}");
            } else {
                panic!("CountsWriter: failed to save overlap counts: {err}");
            }
        }
    }
}
