use crate::overlap::RecordLayout;

/// How an overlap file is opened
///
/// Normal modes handle records carrying only `b_iid` (files inside a built
/// store). Full modes handle records carrying both ids (overlapper output,
/// the input to store building). The mode is fixed for the lifetime of a
/// handle and decides the record layout, so it has to be supplied again
/// whenever the file is reopened.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum FileMode {
    /// Reading of `b_iid` overlaps
    #[default]
    NormalRead,
    /// Writing of `b_iid` overlaps
    NormalWrite,
    /// Reading of `a_iid` + `b_iid` overlaps, with their counts sidecar
    FullRead,
    /// Loading only the counts sidecar of a full file, no overlaps
    FullCounts,
    /// Writing of `a_iid` + `b_iid` overlaps, tallying overlaps per read
    FullWrite,
    /// Writing of `a_iid` + `b_iid` overlaps without the per-read tally
    FullWriteNoCounts,
}
impl FileMode {
    /// True for modes that accept `write_overlap`
    #[must_use]
    pub fn is_output(self) -> bool {
        matches!(
            self,
            Self::NormalWrite | Self::FullWrite | Self::FullWriteNoCounts
        )
    }

    /// True for modes whose records omit `a_iid`
    #[must_use]
    pub fn is_normal(self) -> bool {
        matches!(self, Self::NormalRead | Self::NormalWrite)
    }

    /// True for modes that stream records from the data file
    #[must_use]
    pub fn reads_records(self) -> bool {
        matches!(self, Self::NormalRead | Self::FullRead)
    }

    /// True for modes that load the counts sidecar
    #[must_use]
    pub fn reads_counts(self) -> bool {
        matches!(self, Self::FullRead | Self::FullCounts)
    }

    /// True for the mode that tallies per-read counts and persists a sidecar
    #[must_use]
    pub fn writes_counts(self) -> bool {
        matches!(self, Self::FullWrite)
    }

    /// Record layout implied by this mode
    #[must_use]
    pub fn layout(self) -> RecordLayout {
        if self.is_normal() {
            RecordLayout::Normal
        } else {
            RecordLayout::Full
        }
    }
}
