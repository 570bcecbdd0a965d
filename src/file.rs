//! # file
//!
//! A single handle over one overlap shard.
//!
//! [`OverlapFile`] ties the record codec, the buffered channel and the counts
//! sidecar together under a [`FileMode`]. The mode is checked once per
//! operation and decides which parts exist at all:
//!
//! | Mode                | Channel | Counts                 | Histogram |
//! | ------------------- | ------- | ---------------------- | --------- |
//! | `NormalRead`        | reader  | none                   | none      |
//! | `NormalWrite`       | writer  | total only             | yes       |
//! | `FullRead`          | reader  | sidecar reader         | none      |
//! | `FullCounts`        | none    | sidecar reader         | none      |
//! | `FullWrite`         | writer  | per-read, saved at end | yes       |
//! | `FullWriteNoCounts` | writer  | total only             | yes       |

use std::fs::File;
use std::path::{Path, PathBuf};

use crate::channel::{
    ChunkReader, ChunkWriter, Compression, DEFAULT_BUFFER_SIZE, DEFAULT_COMPRESSION_LEVEL,
};
use crate::counts::{CountsReader, CountsWriter, ReadStore};
use crate::error::{BuilderError, Error, ModeError, Result};
use crate::histogram::{OverlapAccumulator, OverlapHistogram};
use crate::mode::FileMode;
use crate::overlap::{Overlap, RecordLayout, SIZE_DAT, SIZE_ID};
use crate::shard::ShardAddress;

/// Number of overlaps after which a writer reports its file as too big
///
/// Sized so that a file of normal records stays around 1GB.
pub const DEFAULT_MAX_OVERLAPS: u64 = (1024 * 1024 * 1024) / (SIZE_DAT + SIZE_ID) as u64;

enum Channel {
    Writer(ChunkWriter<File>),
    Reader(ChunkReader<File>),
    None,
}

enum Counts {
    Writer(CountsWriter),
    Reader(CountsReader),
    None,
}

/// Builder for [`OverlapFile`] handles
///
/// # Examples
///
/// ```no_run
/// # use ovstore_file::{FileMode, OverlapFile, OverlapFileBuilder, Result, ShardAddress};
/// # fn main() -> Result<()> {
/// let address = ShardAddress::new("asm.ovlStore", 1, 0);
/// let mut file: OverlapFile = OverlapFileBuilder::new()
///     .mode(FileMode::FullWrite)
///     .num_reads(1000)
///     .open_shard(&address)?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct OverlapFileBuilder {
    mode: Option<FileMode>,
    /// Number of reads in the store, needed to size the counts table
    num_reads: Option<u32>,
    buffer_capacity: Option<usize>,
    /// Detected from the file name when not set
    compression: Option<Compression>,
    compression_level: Option<i32>,
    max_overlaps: Option<u64>,
}
impl OverlapFileBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn mode(mut self, mode: FileMode) -> Self {
        self.mode = Some(mode);
        self
    }

    #[must_use]
    pub fn num_reads(mut self, num_reads: u32) -> Self {
        self.num_reads = Some(num_reads);
        self
    }

    /// Takes the number of reads from a sequence store
    #[must_use]
    pub fn read_store<S: ReadStore>(self, store: S) -> Self {
        self.num_reads(store.num_reads())
    }

    #[must_use]
    pub fn buffer_capacity(mut self, capacity: usize) -> Self {
        self.buffer_capacity = Some(capacity);
        self
    }

    #[must_use]
    pub fn compression(mut self, compression: Compression) -> Self {
        self.compression = Some(compression);
        self
    }

    #[must_use]
    pub fn compression_level(mut self, level: i32) -> Self {
        self.compression_level = Some(level);
        self
    }

    #[must_use]
    pub fn max_overlaps(mut self, max_overlaps: u64) -> Self {
        self.max_overlaps = Some(max_overlaps);
        self
    }

    /// Opens `path` with the default histogram
    pub fn open<P: AsRef<Path>>(self, path: P) -> Result<OverlapFile> {
        self.open_with(path)
    }

    /// Opens the data file of a shard
    ///
    /// The compressed name is used when zstd compression was requested.
    pub fn open_shard(self, address: &ShardAddress) -> Result<OverlapFile> {
        let path = match self.compression {
            Some(Compression::Zstd) => address.compressed_data_path(),
            _ => address.data_path(),
        };
        self.open(path)
    }

    /// Opens `path`, feeding written overlaps to an accumulator of type `H`
    pub fn open_with<H, P>(self, path: P) -> Result<OverlapFile<H>>
    where
        H: OverlapAccumulator + Default,
        P: AsRef<Path>,
    {
        let path = path.as_ref().to_path_buf();
        let mode = self.mode.unwrap_or_default();
        let layout = mode.layout();

        let capacity = self.buffer_capacity.unwrap_or(DEFAULT_BUFFER_SIZE);
        if capacity < layout.record_size() {
            return Err(BuilderError::CapacityTooSmall(capacity, layout.record_size()).into());
        }
        let num_reads = if mode.writes_counts() || mode.reads_counts() {
            let Some(num_reads) = self.num_reads else {
                return Err(BuilderError::MissingReadCount(mode).into());
            };
            num_reads
        } else {
            self.num_reads.unwrap_or(0)
        };
        let compression = self
            .compression
            .unwrap_or_else(|| Compression::from_path(&path));

        let channel = if mode.is_output() {
            let file = File::create(&path).map_err(|e| Error::file("create", &path, e))?;
            Channel::Writer(ChunkWriter::with_level(
                file,
                capacity,
                compression,
                self.compression_level.unwrap_or(DEFAULT_COMPRESSION_LEVEL),
            ))
        } else if mode.reads_records() {
            let file = File::open(&path).map_err(|e| Error::file("open", &path, e))?;
            Channel::Reader(ChunkReader::new(file, capacity, compression))
        } else {
            Channel::None
        };

        let counts = if mode.writes_counts() {
            Counts::Writer(CountsWriter::new(num_reads, Some(path.as_path())))
        } else if mode.is_output() {
            Counts::Writer(CountsWriter::total_only())
        } else if mode.reads_counts() {
            Counts::Reader(CountsReader::new(num_reads, Some(path.as_path()))?)
        } else {
            Counts::None
        };

        log::debug!(
            "opened '{}' in {mode:?} mode ({compression:?}, {capacity} byte buffer)",
            path.display()
        );

        Ok(OverlapFile {
            path,
            mode,
            layout,
            channel,
            counts,
            histogram: mode.is_output().then(H::default),
            max_overlaps: self.max_overlaps.unwrap_or(DEFAULT_MAX_OVERLAPS),
            position: 0,
            ebuf: Vec::with_capacity(layout.record_size()),
            finished: false,
        })
    }
}

/// Handle over one overlap file and its counts sidecar
///
/// Writers are finished when dropped: pending records are flushed and, in
/// [`FileMode::FullWrite`], the counts sidecar is saved even if no overlap
/// was written. If any record fails to reach the data file, no sidecar is
/// saved. Use [`close`](Self::close) to observe errors from that step.
pub struct OverlapFile<H: OverlapAccumulator = OverlapHistogram> {
    path: PathBuf,
    mode: FileMode,
    layout: RecordLayout,
    channel: Channel,
    counts: Counts,
    histogram: Option<H>,
    max_overlaps: u64,
    /// Records consumed by a reader
    position: u64,
    /// Encoding buffer reused across writes
    ebuf: Vec<u8>,
    finished: bool,
}
impl<H: OverlapAccumulator> OverlapFile<H> {
    /// Writes one overlap
    ///
    /// The overlap is also added to the counts and to the histogram, if one
    /// is attached.
    ///
    /// # Panics
    ///
    /// In [`FileMode::FullWrite`], panics if either read id is beyond the
    /// number of reads the file was opened with.
    pub fn write_overlap(&mut self, overlap: &Overlap) -> Result<()> {
        let Channel::Writer(writer) = &mut self.channel else {
            return Err(ModeError::NotWritable(self.mode).into());
        };
        // Tally first: an id beyond the store panics before the record is staged
        if let Counts::Writer(counts) = &mut self.counts {
            counts.add_overlap(overlap.a_iid, overlap.b_iid);
        }

        self.ebuf.clear();
        overlap.encode_into(self.layout, &mut self.ebuf);
        if let Err(err) = writer.append(&self.ebuf) {
            self.abandon_counts();
            return Err(err);
        }

        if let Some(histogram) = &mut self.histogram {
            histogram.add_overlap(overlap);
        }
        Ok(())
    }

    /// Writes a batch of overlaps
    ///
    /// Stops at the first error; overlaps written before it stay written.
    pub fn write_overlaps(&mut self, overlaps: &[Overlap]) -> Result<()> {
        overlaps
            .iter()
            .try_for_each(|overlap| self.write_overlap(overlap))
    }

    /// Reads the next overlap into `overlap`
    ///
    /// Returns `Ok(false)` at the end of the file. With normal records the
    /// `a_iid` of `overlap` is left as it was.
    pub fn read_overlap(&mut self, overlap: &mut Overlap) -> Result<bool> {
        let Channel::Reader(reader) = &mut self.channel else {
            return Err(ModeError::NotReadable(self.mode).into());
        };
        match reader.next_record_bytes(self.layout.record_size())? {
            Some(bytes) => {
                overlap.decode_into(bytes, self.layout)?;
                self.position += 1;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Fills `overlaps` from the file, returning how many were read
    ///
    /// Fewer than `overlaps.len()` means the end of the file was reached.
    pub fn read_overlaps(&mut self, overlaps: &mut [Overlap]) -> Result<usize> {
        let mut n = 0;
        for overlap in overlaps.iter_mut() {
            if !self.read_overlap(overlap)? {
                break;
            }
            n += 1;
        }
        Ok(n)
    }

    /// Positions a reader so the next read returns overlap `index`
    pub fn seek_overlap(&mut self, index: u64) -> Result<()> {
        let Channel::Reader(reader) = &mut self.channel else {
            return Err(ModeError::NotSeekable(self.mode).into());
        };
        reader.seek_record(index, self.layout.record_size())?;
        self.position = index;
        Ok(())
    }

    /// True once a writer holds more overlaps than its cap
    ///
    /// The caller is expected to close the file and continue with the next
    /// piece of its shard. Always false for readers.
    #[must_use]
    pub fn file_too_big(&self) -> bool {
        match &self.counts {
            Counts::Writer(counts) => counts.num_overlaps() > self.max_overlaps,
            _ => false,
        }
    }

    /// Overlaps written so far, or overlaps consumed so far for a reader
    #[must_use]
    pub fn file_position(&self) -> u64 {
        match &self.counts {
            Counts::Writer(counts) => counts.num_overlaps(),
            _ => self.position,
        }
    }

    /// Counts sidecar of a full file opened for reading
    pub fn counts(&self) -> Result<&CountsReader> {
        match &self.counts {
            Counts::Reader(counts) => Ok(counts),
            _ => Err(ModeError::NoCounts(self.mode).into()),
        }
    }

    /// The attached histogram, if any
    #[must_use]
    pub fn histogram(&self) -> Option<&H> {
        self.histogram.as_ref()
    }

    pub fn histogram_mut(&mut self) -> Option<&mut H> {
        self.histogram.as_mut()
    }

    /// Detaches the histogram, handing its ownership to the caller
    ///
    /// Overlaps written afterwards are no longer accumulated.
    pub fn remove_histogram(&mut self) -> Option<H> {
        self.histogram.take()
    }

    /// Size of one record in this file
    #[must_use]
    pub fn record_size(&self) -> usize {
        self.layout.record_size()
    }

    #[must_use]
    pub fn layout(&self) -> RecordLayout {
        self.layout
    }

    #[must_use]
    pub fn mode(&self) -> FileMode {
        self.mode
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Drains the write buffer if it is full, or unconditionally if `force` is set
    pub fn flush_buffer(&mut self, force: bool) -> Result<()> {
        match &mut self.channel {
            Channel::Writer(writer) => writer.flush(force),
            _ => Err(ModeError::NotWritable(self.mode).into()),
        }
    }

    /// Finishes the file, reporting any error from the final flush or from
    /// saving the counts sidecar
    pub fn close(mut self) -> Result<()> {
        self.finish()
    }

    /// Flushes the channel, then saves the sidecar
    ///
    /// The sidecar is only saved once every record reached the data file.
    fn finish(&mut self) -> Result<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;

        if let Channel::Writer(writer) = &mut self.channel {
            if let Err(err) = writer.finish() {
                self.abandon_counts();
                return Err(err);
            }
        }
        if let Counts::Writer(counts) = &mut self.counts {
            counts.finish()?;
        }
        log::debug!(
            "closed '{}' at overlap {}",
            self.path.display(),
            self.file_position()
        );
        Ok(())
    }

    /// Drops the pending sidecar of a writer whose data file is incomplete
    fn abandon_counts(&mut self) {
        if let Counts::Writer(counts) = &mut self.counts {
            if counts.is_tracking() {
                log::error!(
                    "not saving overlap counts for incomplete file '{}'",
                    self.path.display()
                );
            }
            counts.abandon();
        }
    }
}

impl<H: OverlapAccumulator> Drop for OverlapFile<H> {
    fn drop(&mut self) {
        if let Err(err) = self.finish() {
            if std::thread::panicking() {
                log::error!("OverlapFile: failed to finish '{}': {err}", self.path.display());
            } else {
                panic!("OverlapFile: failed to finish '{}': {err}", self.path.display());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::{rngs::SmallRng, Rng, SeedableRng};

    use super::*;
    use crate::error::ReadError;
    use crate::OVERLAP_NWORDS;

    fn overlap(a: u32, b: u32) -> Overlap {
        Overlap::new(a, b, [a, b, a ^ b, 0, u32::MAX])
    }

    fn random_overlaps(n: usize, num_reads: u32) -> Vec<Overlap> {
        let mut rng = SmallRng::seed_from_u64(42);
        (0..n)
            .map(|_| {
                Overlap::new(
                    rng.random_range(1..=num_reads),
                    rng.random_range(1..=num_reads),
                    rng.random(),
                )
            })
            .collect()
    }

    fn read_all<H: OverlapAccumulator>(file: &mut OverlapFile<H>) -> Result<Vec<Overlap>> {
        let mut out = Vec::new();
        let mut overlap = Overlap::default();
        while file.read_overlap(&mut overlap)? {
            out.push(overlap);
        }
        Ok(out)
    }

    #[test]
    fn test_full_write_then_counts() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let address = ShardAddress::new(dir.path().join("store"), 0, 0);

        let mut file = OverlapFileBuilder::new()
            .mode(FileMode::FullWrite)
            .num_reads(5)
            .open_shard(&address)?;
        file.write_overlaps(&[overlap(1, 2), overlap(1, 3), overlap(3, 4)])?;
        assert_eq!(file.file_position(), 3);
        assert!(!file.file_too_big());
        file.close()?;

        assert!(address.data_path().exists());
        assert!(address.counts_path().exists());

        let file = OverlapFileBuilder::new()
            .mode(FileMode::FullCounts)
            .num_reads(5)
            .open_shard(&address)?;
        let counts = file.counts()?;
        assert_eq!(counts.num_overlaps(), 3);
        assert_eq!(counts.overlaps_for(1), 2);
        assert_eq!(counts.overlaps_for(2), 1);
        assert_eq!(counts.overlaps_for(3), 2);
        assert_eq!(counts.overlaps_for(4), 1);
        assert_eq!(counts.overlaps_for(5), 0);

        let mut file = OverlapFileBuilder::new()
            .mode(FileMode::FullRead)
            .num_reads(5)
            .open_shard(&address)?;
        assert_eq!(file.counts()?.num_overlaps(), 3);
        assert_eq!(
            read_all(&mut file)?,
            vec![overlap(1, 2), overlap(1, 3), overlap(3, 4)]
        );
        assert_eq!(file.file_position(), 3);
        Ok(())
    }

    #[test]
    fn test_wrong_mode_errors() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("modes.0.0");

        let mut writer = OverlapFileBuilder::new()
            .mode(FileMode::NormalWrite)
            .open(&path)?;
        let mut target = Overlap::default();
        assert!(matches!(
            writer.read_overlap(&mut target),
            Err(Error::ModeError(ModeError::NotReadable(FileMode::NormalWrite)))
        ));
        assert!(matches!(
            writer.seek_overlap(0),
            Err(Error::ModeError(ModeError::NotSeekable(_)))
        ));
        assert!(matches!(
            writer.counts(),
            Err(Error::ModeError(ModeError::NoCounts(_)))
        ));
        writer.write_overlap(&overlap(0, 7))?;
        writer.close()?;

        let mut reader = OverlapFileBuilder::new()
            .mode(FileMode::NormalRead)
            .open(&path)?;
        assert!(matches!(
            reader.write_overlap(&overlap(1, 2)),
            Err(Error::ModeError(ModeError::NotWritable(FileMode::NormalRead)))
        ));
        assert!(matches!(
            reader.flush_buffer(true),
            Err(Error::ModeError(ModeError::NotWritable(_)))
        ));
        assert!(matches!(
            reader.counts(),
            Err(Error::ModeError(ModeError::NoCounts(FileMode::NormalRead)))
        ));
        assert!(reader.histogram().is_none());
        Ok(())
    }

    #[test]
    fn test_counts_only_has_no_records() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("counts.0.0");
        drop(
            OverlapFileBuilder::new()
                .mode(FileMode::FullWrite)
                .num_reads(3)
                .open(&path)?,
        );

        let mut file = OverlapFileBuilder::new()
            .mode(FileMode::FullCounts)
            .num_reads(3)
            .open(&path)?;
        assert!(matches!(
            file.read_overlap(&mut Overlap::default()),
            Err(Error::ModeError(ModeError::NotReadable(FileMode::FullCounts)))
        ));
        // zero-overlap writers still leave a loadable sidecar
        assert!(file.counts()?.is_loaded());
        assert_eq!(file.counts()?.num_overlaps(), 0);
        assert_eq!(file.file_position(), 0);
        Ok(())
    }

    #[test]
    fn test_missing_read_count() {
        for mode in [FileMode::FullWrite, FileMode::FullRead, FileMode::FullCounts] {
            let err = OverlapFileBuilder::new()
                .mode(mode)
                .open("never-created.0.0")
                .err();
            assert!(matches!(
                err,
                Some(Error::BuilderError(BuilderError::MissingReadCount(m))) if m == mode
            ));
        }
    }

    #[test]
    fn test_capacity_too_small() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let err = OverlapFileBuilder::new()
            .mode(FileMode::FullWriteNoCounts)
            .buffer_capacity(27)
            .open(dir.path().join("tiny.0.0"))
            .err();
        assert!(matches!(
            err,
            Some(Error::BuilderError(BuilderError::CapacityTooSmall(27, 28)))
        ));
        Ok(())
    }

    #[test]
    fn test_missing_data_file() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("absent.0.0");
        let err = OverlapFileBuilder::new().open(&path).err();
        assert!(matches!(err, Some(Error::File { op: "open", .. })));
        Ok(())
    }

    #[test]
    fn test_file_too_big() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("capped.0.0");
        let mut file = OverlapFileBuilder::new()
            .mode(FileMode::FullWriteNoCounts)
            .max_overlaps(2)
            .open(&path)?;
        file.write_overlap(&overlap(1, 2))?;
        file.write_overlap(&overlap(2, 3))?;
        assert!(!file.file_too_big());
        file.write_overlap(&overlap(3, 4))?;
        assert!(file.file_too_big());
        assert_eq!(file.file_position(), 3);
        file.close()?;

        // no tally was kept, so no sidecar either
        assert!(!crate::shard::counts_path_for(&path).exists());
        Ok(())
    }

    #[test]
    fn test_default_cap() {
        assert_eq!(DEFAULT_MAX_OVERLAPS, 1024 * 1024 * 1024 / 24);
    }

    #[test]
    fn test_compressed_shard() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let address = ShardAddress::new(dir.path().join("zst"), 3, 1);
        let input = random_overlaps(500, 40);

        let mut file = OverlapFileBuilder::new()
            .mode(FileMode::FullWrite)
            .read_store(40u32)
            .compression(Compression::Zstd)
            .buffer_capacity(28 * 16)
            .open_shard(&address)?;
        assert!(file.path().to_string_lossy().ends_with(".zst"));
        file.write_overlaps(&input)?;
        file.close()?;
        assert!(address.counts_path().exists());

        // compression is picked up from the file name
        let mut file = OverlapFileBuilder::new()
            .mode(FileMode::FullRead)
            .num_reads(40)
            .buffer_capacity(100)
            .open(address.compressed_data_path())?;
        assert_eq!(file.counts()?.num_overlaps(), 500);
        assert_eq!(read_all(&mut file)?, input);

        file.seek_overlap(123)?;
        let mut target = Overlap::default();
        assert!(file.read_overlap(&mut target)?);
        assert_eq!(target, input[123]);
        Ok(())
    }

    #[test]
    fn test_normal_seek_and_batch_read() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("normal.0.0");
        let mut file = OverlapFileBuilder::new()
            .mode(FileMode::NormalWrite)
            .buffer_capacity(24 * 7)
            .open(&path)?;
        for b in 0..100 {
            file.write_overlap(&overlap(9, b))?;
        }
        file.flush_buffer(false)?;
        assert_eq!(file.record_size(), 24);
        file.close()?;
        assert_eq!(std::fs::metadata(&path)?.len(), 24 * 100);

        let mut file = OverlapFileBuilder::new().open(&path)?;
        assert_eq!(file.mode(), FileMode::NormalRead);
        file.seek_overlap(42)?;
        assert_eq!(file.file_position(), 42);

        // normal records leave the caller's a_iid in place
        let mut batch = [Overlap::new(9, 0, [0; OVERLAP_NWORDS]); 10];
        assert_eq!(file.read_overlaps(&mut batch)?, 10);
        for (i, overlap) in batch.iter().enumerate() {
            assert_eq!(overlap.a_iid, 9);
            assert_eq!(overlap.b_iid, 42 + i as u32);
        }
        assert_eq!(file.file_position(), 52);

        file.seek_overlap(95)?;
        assert_eq!(file.read_overlaps(&mut batch)?, 5);
        Ok(())
    }

    #[test]
    fn test_truncated_file() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("cut.0.0");
        let mut file = OverlapFileBuilder::new()
            .mode(FileMode::FullWriteNoCounts)
            .open(&path)?;
        file.write_overlaps(&[overlap(1, 2), overlap(2, 3)])?;
        file.close()?;

        let bytes = std::fs::read(&path)?;
        std::fs::write(&path, &bytes[..bytes.len() - 4])?;

        let mut file = OverlapFileBuilder::new()
            .mode(FileMode::FullRead)
            .num_reads(3)
            .open(&path)?;
        // no sidecar was written for this file
        assert!(!file.counts()?.is_loaded());
        let mut target = Overlap::default();
        assert!(file.read_overlap(&mut target)?);
        assert!(matches!(
            file.read_overlap(&mut target),
            Err(Error::ReadError(ReadError::PartialRecord(24)))
        ));
        Ok(())
    }

    #[test]
    fn test_histogram_feed() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let mut file = OverlapFileBuilder::new()
            .mode(FileMode::FullWrite)
            .num_reads(5)
            .open(dir.path().join("hist.0.0"))?;
        file.write_overlaps(&[overlap(1, 2), overlap(1, 3), overlap(3, 4)])?;

        let histogram = file.remove_histogram();
        assert!(file.histogram().is_none());
        file.write_overlap(&overlap(1, 5))?;

        let histogram = histogram.unwrap_or_default();
        assert_eq!(histogram.num_overlaps(), 3);
        assert_eq!(histogram.overlaps_for(1), 2);
        assert_eq!(histogram.overlaps_for(3), 1);
        assert_eq!(file.file_position(), 4);
        Ok(())
    }

    #[derive(Default)]
    struct PairCollector(Vec<(u32, u32)>);
    impl OverlapAccumulator for PairCollector {
        fn add_overlap(&mut self, overlap: &Overlap) {
            self.0.push((overlap.a_iid, overlap.b_iid));
        }
    }

    #[test]
    fn test_custom_accumulator() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let mut file = OverlapFileBuilder::new()
            .mode(FileMode::FullWriteNoCounts)
            .open_with::<PairCollector, _>(dir.path().join("custom.0.0"))?;
        file.write_overlap(&overlap(4, 8))?;
        if let Some(collector) = file.histogram_mut() {
            collector.0.push((0, 0));
        }
        assert_eq!(file.histogram().map(|c| c.0.clone()), Some(vec![(4, 8), (0, 0)]));
        Ok(())
    }

    #[test]
    fn test_read_id_beyond_store_is_not_written() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("rejected.0.0");
        let mut file = OverlapFileBuilder::new()
            .mode(FileMode::FullWrite)
            .num_reads(5)
            .open(&path)?;
        file.write_overlap(&overlap(1, 2))?;
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            file.write_overlap(&overlap(1, 6))
        }));
        assert!(result.is_err());
        assert_eq!(file.file_position(), 1);
        file.close()?;

        let mut file = OverlapFileBuilder::new()
            .mode(FileMode::FullRead)
            .num_reads(5)
            .open(&path)?;
        let counts = file.counts()?;
        assert_eq!(counts.num_overlaps(), 1);
        assert_eq!(counts.table().iter().sum::<u32>(), 2);
        assert_eq!(read_all(&mut file)?, vec![overlap(1, 2)]);
        Ok(())
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_failed_close_leaves_no_sidecar() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("full.0.0");
        std::os::unix::fs::symlink("/dev/full", &path)?;

        let mut file = OverlapFileBuilder::new()
            .mode(FileMode::FullWrite)
            .num_reads(5)
            .open(&path)?;
        file.write_overlaps(&[overlap(1, 2), overlap(3, 4)])?;
        assert!(matches!(file.close(), Err(Error::IoError(_))));
        assert!(!crate::shard::counts_path_for(&path).exists());
        Ok(())
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_failed_write_leaves_no_sidecar() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("full.1.0");
        std::os::unix::fs::symlink("/dev/full", &path)?;

        let mut file = OverlapFileBuilder::new()
            .mode(FileMode::FullWrite)
            .num_reads(5)
            .buffer_capacity(28 * 2)
            .open(&path)?;
        file.write_overlaps(&[overlap(1, 2), overlap(3, 4)])?;
        // the third record drains the full buffer into /dev/full
        assert!(file.write_overlap(&overlap(2, 5)).is_err());
        assert!(file.close().is_err());
        assert!(!crate::shard::counts_path_for(&path).exists());
        Ok(())
    }

    #[test]
    #[should_panic(expected = "beyond the store")]
    fn test_read_id_beyond_store() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = OverlapFileBuilder::new()
            .mode(FileMode::FullWrite)
            .num_reads(5)
            .open(dir.path().join("oob.0.0"))
            .unwrap();
        let _ = file.write_overlap(&overlap(1, 6));
    }
}
