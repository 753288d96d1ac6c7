//! Compact per-slot bitmaps.
//!
//! A [`SlotBitmap`] stores one bit per page slot, packed into `u64` words.
//! It backs both of the page's occupancy maps (`inuse` and `starts`) and
//! provides the word-skipping probes the allocation scan, the deallocation
//! next-start scan, and reverse lookup are built on.

use std::ops::Range;

const WORD_BITS: usize = 64;

/// A fixed-length bitset with one bit per slot.
///
/// Bits outside `0..len` are never set; the trailing bits of the last word
/// stay zero, so whole-word operations ([`SlotBitmap::count_set`],
/// [`SlotBitmap::none_set`]) need no edge masking.
#[derive(Clone, Debug)]
pub struct SlotBitmap {
    words: Vec<u64>,
    len: usize,
}

impl SlotBitmap {
    /// Create an all-clear bitmap covering `len` slots.
    pub fn new(len: usize) -> Self {
        Self {
            words: vec![0; len.div_ceil(WORD_BITS)],
            len,
        }
    }

    /// Number of slots covered.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the bitmap covers zero slots.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Read the bit for `slot`.
    ///
    /// # Panics
    ///
    /// Panics if `slot >= len`.
    pub fn get(&self, slot: usize) -> bool {
        assert!(slot < self.len, "slot {slot} out of range ({})", self.len);
        self.words[slot / WORD_BITS] & (1 << (slot % WORD_BITS)) != 0
    }

    /// Set the bit for `slot`.
    ///
    /// # Panics
    ///
    /// Panics if `slot >= len`.
    pub fn set(&mut self, slot: usize) {
        assert!(slot < self.len, "slot {slot} out of range ({})", self.len);
        self.words[slot / WORD_BITS] |= 1 << (slot % WORD_BITS);
    }

    /// Clear the bit for `slot`.
    ///
    /// # Panics
    ///
    /// Panics if `slot >= len`.
    pub fn clear(&mut self, slot: usize) {
        assert!(slot < self.len, "slot {slot} out of range ({})", self.len);
        self.words[slot / WORD_BITS] &= !(1 << (slot % WORD_BITS));
    }

    /// Set every bit in `range` using word-wide masks.
    ///
    /// # Panics
    ///
    /// Panics if `range.end > len`.
    pub fn set_range(&mut self, range: Range<usize>) {
        assert!(
            range.end <= self.len,
            "range end {} out of range ({})",
            range.end,
            self.len
        );
        let mut slot = range.start;
        while slot < range.end {
            let bit = slot % WORD_BITS;
            let span = (range.end - slot).min(WORD_BITS - bit);
            let mask = if span == WORD_BITS {
                u64::MAX
            } else {
                ((1u64 << span) - 1) << bit
            };
            self.words[slot / WORD_BITS] |= mask;
            slot += span;
        }
    }

    /// Lowest set bit in `range`, or `None` if the range is all-clear.
    ///
    /// Skips all-clear words without probing individual bits, so probing a
    /// long free run costs one load per 64 slots.
    ///
    /// # Panics
    ///
    /// Panics if `range.end > len`.
    pub fn first_set_in(&self, range: Range<usize>) -> Option<usize> {
        assert!(
            range.end <= self.len,
            "range end {} out of range ({})",
            range.end,
            self.len
        );
        let mut slot = range.start;
        while slot < range.end {
            let word_idx = slot / WORD_BITS;
            let shifted = self.words[word_idx] >> (slot % WORD_BITS);
            if shifted == 0 {
                slot = (word_idx + 1) * WORD_BITS;
                continue;
            }
            let found = slot + shifted.trailing_zeros() as usize;
            return (found < range.end).then_some(found);
        }
        None
    }

    /// Highest set bit in `range`, or `None` if the range is all-clear.
    ///
    /// The backward counterpart of [`SlotBitmap::first_set_in`], used to
    /// resolve an interior pointer to its allocation start.
    ///
    /// # Panics
    ///
    /// Panics if `range.end > len`.
    pub fn last_set_in(&self, range: Range<usize>) -> Option<usize> {
        assert!(
            range.end <= self.len,
            "range end {} out of range ({})",
            range.end,
            self.len
        );
        let mut slot = range.end;
        while slot > range.start {
            let word_idx = (slot - 1) / WORD_BITS;
            let top = (slot - 1) % WORD_BITS;
            let mask = if top == WORD_BITS - 1 {
                u64::MAX
            } else {
                (1u64 << (top + 1)) - 1
            };
            let masked = self.words[word_idx] & mask;
            if masked == 0 {
                slot = word_idx * WORD_BITS;
                continue;
            }
            let found = word_idx * WORD_BITS + (WORD_BITS - 1 - masked.leading_zeros() as usize);
            return (found >= range.start).then_some(found);
        }
        None
    }

    /// Number of set bits.
    pub fn count_set(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Whether every bit is clear.
    pub fn none_set(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }
}
