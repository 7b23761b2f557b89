use std::{
    fmt::{self, Debug, Formatter},
    ops::Range,
};

use bitvec::vec::BitVec;

/// An ordered set of zero-based offsets into a sequence.
///
/// Offsets are stored densely, one bit per position up to the largest offset
/// ever inserted, which suits the changesets produced by the diff engine: every
/// offset is bounded by the length of one of the two diffed sequences.
#[derive(Clone, Default)]
pub struct OffsetSet {
    bits: BitVec,
    len: usize,
}

impl OffsetSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a set containing every offset in `range`.
    pub fn from_range(range: Range<usize>) -> Self {
        let mut bits = BitVec::repeat(false, range.start);
        bits.resize(range.end.max(range.start), true);
        Self {
            len: range.len(),
            bits,
        }
    }

    /// Inserts `offset`, returning `true` if it was not already present.
    pub fn insert(&mut self, offset: usize) -> bool {
        if offset >= self.bits.len() {
            self.bits.resize(offset + 1, false);
        }
        if self.bits[offset] {
            return false;
        }
        self.bits.set(offset, true);
        self.len += 1;
        true
    }

    pub fn contains(&self, offset: usize) -> bool {
        self.bits.get(offset).is_some_and(|bit| *bit)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn last(&self) -> Option<usize> {
        self.bits.last_one()
    }

    /// Iterates over the offsets in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.bits.iter_ones()
    }

    /// Iterates over the maximal runs of consecutive offsets, in ascending
    /// order.  Each run is reported as a half-open range.
    pub fn ranges(&self) -> impl Iterator<Item = Range<usize>> + '_ {
        let mut ones = self.bits.iter_ones().peekable();
        std::iter::from_fn(move || {
            let start = ones.next()?;
            let mut end = start + 1;
            while ones.next_if_eq(&end).is_some() {
                end += 1;
            }
            Some(start..end)
        })
    }

    /// Counts the offsets that fall within `range`.
    pub fn count_in(&self, range: Range<usize>) -> usize {
        let end = range.end.min(self.bits.len());
        if range.start >= end {
            return 0;
        }
        self.bits[range.start..end].count_ones()
    }
}

impl PartialEq for OffsetSet {
    fn eq(&self, other: &Self) -> bool {
        // Trailing unset bits are not significant.
        self.len == other.len && self.iter().eq(other.iter())
    }
}

impl Eq for OffsetSet {}

impl Debug for OffsetSet {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl Extend<usize> for OffsetSet {
    fn extend<I: IntoIterator<Item = usize>>(&mut self, iter: I) {
        for offset in iter {
            self.insert(offset);
        }
    }
}

impl FromIterator<usize> for OffsetSet {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        let mut set = OffsetSet::new();
        set.extend(iter);
        set
    }
}

impl From<Range<usize>> for OffsetSet {
    fn from(range: Range<usize>) -> Self {
        OffsetSet::from_range(range)
    }
}

impl<const N: usize> From<[usize; N]> for OffsetSet {
    fn from(offsets: [usize; N]) -> Self {
        offsets.into_iter().collect()
    }
}
