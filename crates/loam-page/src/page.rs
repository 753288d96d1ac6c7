//! The fixed-size page arena: storage, occupancy bitmaps, and the
//! allocate/deallocate pair.
//!
//! A [`Page`] owns one contiguous, address-stable byte buffer and hands out
//! variable-sized, alignment-correct allocations from it. Occupancy is
//! tracked with two [`SlotBitmap`]s instead of a free list:
//!
//! - `inuse` — one bit per slot, set while the slot is inside any live
//!   allocation.
//! - `starts` — one bit per slot, set only on the first slot of a live
//!   allocation. This is what lets reverse lookup distinguish "start of an
//!   object" from "interior of an object".
//!
//! A cached request bound makes oversized allocation attempts fail in O(1):
//! any request strictly larger than the bound is rejected without scanning.
//! The bound is tightened by failed scans and relaxed by deallocation.

use std::fmt;
use std::ptr::NonNull;

use crate::bitmap::SlotBitmap;
use crate::config::PageConfig;
use crate::error::PageError;

/// Granularity of the backing buffer, in bytes.
///
/// Storage is allocated as 16-byte, 16-aligned units so the base address is
/// at least 16-aligned without any unsafe code. Requests with stricter
/// alignment are satisfied by offsetting into the buffer.
const CHUNK_BYTES: usize = 16;

#[repr(align(16))]
#[derive(Clone, Copy)]
struct StorageChunk {
    _bytes: [u8; CHUNK_BYTES],
}

const ZERO_CHUNK: StorageChunk = StorageChunk {
    _bytes: [0; CHUNK_BYTES],
};

/// A single fixed-size allocation arena.
///
/// The page is the foundational primitive beneath a garbage-collected heap:
/// the heap owns many pages, picks one to satisfy each request, and queries
/// pages via [`Page::contains`](crate::Page::contains) to classify candidate
/// pointers during tracing.
///
/// The backing buffer is allocated once at construction and never resized or
/// moved, so every address handed out stays valid for the page's lifetime.
/// `Page` is deliberately not `Clone` — it is a single-owner resource, and
/// duplicating it would duplicate claimed addresses.
///
/// The page is not internally synchronized. All operations take `&mut self`
/// or `&self` and never block; concurrent use requires external locking by
/// the owning heap.
///
/// The page never reads or writes its storage bytes — it only computes
/// addresses. Writing through a returned pointer is the caller's business
/// (and the caller's `unsafe`).
pub struct Page {
    /// Byte capacity. Always a multiple of `min_alloc`.
    total_size: usize,
    /// Slot granularity in bytes.
    min_alloc: usize,
    /// Backing buffer. The box is never reallocated, so `storage.as_ptr()`
    /// is stable for the page's lifetime.
    storage: Box<[StorageChunk]>,
    /// Per-slot occupancy.
    pub(crate) inuse: SlotBitmap,
    /// Per-slot "first slot of an allocation" marker. `starts` implies
    /// `inuse`.
    pub(crate) starts: SlotBitmap,
    /// Cached upper bound: requests strictly larger than this are rejected
    /// without scanning. Tightened on failed scans, relaxed on deallocation,
    /// never above `total_size`.
    known_request_bound: usize,
}

impl Page {
    /// Build a page from a validated config.
    ///
    /// `total_size` is rounded up to the next multiple of `min_alloc`, the
    /// storage is allocated, both bitmaps start all-clear, and the request
    /// bound starts at the full capacity.
    pub fn new(config: PageConfig) -> Result<Self, PageError> {
        config.validate()?;
        let total_size = config.rounded_total_size();
        let min_alloc = config.min_alloc;
        let locations = total_size / min_alloc;
        let storage = vec![ZERO_CHUNK; total_size.div_ceil(CHUNK_BYTES)].into_boxed_slice();
        Ok(Self {
            total_size,
            min_alloc,
            storage,
            inuse: SlotBitmap::new(locations),
            starts: SlotBitmap::new(locations),
            known_request_bound: total_size,
        })
    }

    /// Build a page with the default 1024-byte / 4-byte-slot config.
    pub fn with_defaults() -> Self {
        Self::new(PageConfig::default()).expect("default page config is valid")
    }

    /// Byte capacity of the page.
    pub fn total_size(&self) -> usize {
        self.total_size
    }

    /// Slot granularity in bytes.
    pub fn min_alloc(&self) -> usize {
        self.min_alloc
    }

    /// Number of slots (`total_size / min_alloc`).
    pub fn locations(&self) -> usize {
        self.inuse.len()
    }

    /// First byte of the backing buffer.
    pub fn base_address(&self) -> NonNull<u8> {
        self.slot_ptr(0)
    }

    /// Current value of the cached request bound.
    ///
    /// Requests strictly larger than this are guaranteed to fail without a
    /// scan. Requests at or below it are merely *not known* to fail.
    pub fn known_request_bound(&self) -> usize {
        self.known_request_bound
    }

    /// Number of live allocations (set bits in `starts`).
    pub fn live_allocations(&self) -> usize {
        self.starts.count_set()
    }

    /// Whether the page holds no live allocations at all.
    pub fn is_empty(&self) -> bool {
        self.inuse.none_set()
    }

    /// Number of slots currently inside a live allocation.
    pub fn used_locations(&self) -> usize {
        self.inuse.count_set()
    }

    /// Base address of the page as an integer.
    pub(crate) fn base(&self) -> usize {
        self.storage.as_ptr() as usize
    }

    /// Address of `slot`'s first byte.
    pub(crate) fn slot_ptr(&self, slot: usize) -> NonNull<u8> {
        let ptr = self
            .storage
            .as_ptr()
            .cast::<u8>()
            .cast_mut()
            .wrapping_add(slot * self.min_alloc);
        NonNull::new(ptr).expect("storage is a live box, so slot addresses are non-null")
    }

    /// Smallest slot at or after `from` whose address satisfies `align`,
    /// or `None` if no such slot exists on the page.
    ///
    /// Worked out against the actual slot address rather than a fixed
    /// stride, so the answer is correct for any `min_alloc`, including ones
    /// that do not divide `align`.
    fn next_aligned_slot(&self, from: usize, align: usize) -> Option<usize> {
        let base = self.base();
        let mut slot = from;
        loop {
            if slot >= self.locations() {
                return None;
            }
            let addr = base + slot * self.min_alloc;
            let aligned = addr.checked_add(align - 1)? & !(align - 1);
            if aligned == addr {
                return Some(slot);
            }
            // Round the aligned address back up to a slot boundary. The
            // offset is at least one byte, so the loop always advances.
            slot += (aligned - addr).div_ceil(self.min_alloc);
        }
    }

    /// Record that a request of `bytes_needed` bytes could not be satisfied.
    fn note_unsatisfiable(&mut self, bytes_needed: usize) {
        self.known_request_bound = self.known_request_bound.min(bytes_needed - 1);
    }

    /// Reserve a contiguous, `align`-aligned run of slots holding `count`
    /// elements of `elem_size` bytes each.
    ///
    /// Returns the address of the first byte, or `None` if no such run
    /// exists right now — exhaustion is an expected outcome, and the caller
    /// (the owning heap) is expected to try another page.
    ///
    /// First-fit, lowest address, probing only alignment-eligible candidate
    /// slots. Array requests (`count > 1`) reserve one extra trailing slot so
    /// one-past-the-end pointers still resolve to this allocation during
    /// tracing. Requests with `elem_size == 0` or `count == 0`, and requests
    /// whose byte size overflows, fail as ordinary `None`.
    ///
    /// `align` must be a power of two (debug-asserted).
    pub fn allocate(&mut self, elem_size: usize, align: usize, count: usize) -> Option<NonNull<u8>> {
        debug_assert!(align.is_power_of_two(), "align must be a power of two");
        if elem_size == 0 || count == 0 {
            return None;
        }
        let bytes_needed = elem_size.checked_mul(count)?;

        // Fast reject: a failed scan already proved requests this large
        // cannot currently be satisfied.
        if bytes_needed > self.known_request_bound {
            return None;
        }

        // The extra slot for arrays keeps one-past-the-end arithmetic inside
        // slots this page still attributes to the allocation.
        let locations_needed =
            bytes_needed.div_ceil(self.min_alloc) + usize::from(count > 1);

        // Alignment pre-check: the first aligned address must leave room for
        // the payload at all. Failing here says nothing about other sizes,
        // so the bound is not tightened.
        let first = self.next_aligned_slot(0, align)?;
        if first * self.min_alloc + bytes_needed > self.total_size {
            return None;
        }

        let locations = self.locations();
        if locations_needed <= locations {
            // One past the last candidate that leaves room for the run.
            let end = locations - locations_needed + 1;
            let mut candidate = first;
            while candidate < end {
                match self.inuse.first_set_in(candidate..candidate + locations_needed) {
                    None => {
                        self.starts.set(candidate);
                        self.inuse.set_range(candidate..candidate + locations_needed);
                        self.known_request_bound = self
                            .known_request_bound
                            .saturating_sub(self.min_alloc * locations_needed);
                        return Some(self.slot_ptr(candidate));
                    }
                    Some(occupied) => {
                        // Skip past the occupied slot — never re-probe a
                        // slot already known to be in use.
                        candidate = match self.next_aligned_slot(occupied + 1, align) {
                            Some(slot) => slot,
                            None => break,
                        };
                    }
                }
            }
        }

        self.note_unsatisfiable(bytes_needed);
        None
    }

    /// Release the allocation starting at `ptr`.
    ///
    /// `ptr` must be a pointer previously returned by this page's
    /// [`Page::allocate`] and not yet deallocated. Anything else is a
    /// caller-side contract violation — it indicates memory corruption, not
    /// an expected runtime condition — and panics.
    ///
    /// The freed run is delimited by the next allocation start (or the end
    /// of the page). The request bound is relaxed to the freed run plus any
    /// adjacent free space on either side, so draining the page fully, in
    /// any order, restores the bound to the full capacity.
    pub fn deallocate(&mut self, ptr: NonNull<u8>) {
        let base = self.base();
        let addr = ptr.as_ptr() as usize;
        assert!(
            addr >= base && addr < base + self.total_size,
            "deallocate: pointer does not belong to this page"
        );
        let here = (addr - base) / self.min_alloc;
        assert!(
            self.starts.get(here),
            "deallocate: pointer is not the start of a live allocation"
        );
        assert!(
            self.inuse.get(here),
            "deallocate: allocation start slot is not marked in use"
        );

        self.starts.clear(here);

        // Delimit the freed run: everything up to the next allocation start,
        // or the end of the page.
        let locations = self.locations();
        let next_start = self
            .starts
            .first_set_in(here + 1..locations)
            .unwrap_or(locations);

        // Relax the bound over the whole free gap this run now sits in,
        // including free slots before it. The last deallocation therefore
        // always observes the whole page and restores the full bound.
        let gap_start = self.inuse.last_set_in(0..here).map_or(0, |s| s + 1);
        self.known_request_bound = self
            .known_request_bound
            .max((next_start - gap_start) * self.min_alloc);

        // Clear only this allocation's own slots: stop at the first slot
        // that is already free (trailing gap) or at the next start.
        let mut slot = here;
        while slot < next_start && self.inuse.get(slot) {
            self.inuse.clear(slot);
            slot += 1;
        }
    }
}

impl fmt::Display for Page {
    /// Human-readable occupancy map: `A` marks an allocation start, `a` an
    /// interior (or sentinel) slot, `.` a free slot. Rows are 64 slots,
    /// prefixed with the row's byte offset; pure observer, used by nothing
    /// in the allocator itself.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "page: total_size {} min_alloc {} locations {} bound {} live {}",
            self.total_size,
            self.min_alloc,
            self.locations(),
            self.known_request_bound,
            self.live_allocations(),
        )?;
        let locations = self.locations();
        let mut slot = 0;
        while slot < locations {
            write!(f, "{:06x} ", slot * self.min_alloc)?;
            let row_end = (slot + 64).min(locations);
            while slot < row_end {
                let mark = if self.starts.get(slot) {
                    'A'
                } else if self.inuse.get(slot) {
                    'a'
                } else {
                    '.'
                };
                write!(f, "{mark}")?;
                if slot % 8 == 7 {
                    write!(f, " ")?;
                }
                slot += 1;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(total_size: usize, min_alloc: usize) -> Page {
        Page::new(PageConfig::new(total_size, min_alloc)).unwrap()
    }

    fn offset_of(page: &Page, ptr: NonNull<u8>) -> usize {
        ptr.as_ptr() as usize - page.base_address().as_ptr() as usize
    }

    #[test]
    fn construction_rounds_total_size_up() {
        let p = page(1022, 4);
        assert_eq!(p.total_size(), 1024);
        assert_eq!(p.locations(), 256);
        assert_eq!(p.known_request_bound(), 1024);
        assert!(p.inuse.none_set());
        assert!(p.starts.none_set());
    }

    #[test]
    fn base_address_is_chunk_aligned() {
        let p = page(64, 4);
        assert_eq!(p.base_address().as_ptr() as usize % CHUNK_BYTES, 0);
    }

    #[test]
    fn first_allocation_lands_at_base() {
        let mut p = page(1024, 4);
        let ptr = p.allocate(8, 4, 1).unwrap();
        assert_eq!(offset_of(&p, ptr), 0);
        assert!(p.starts.get(0));
        assert!(p.inuse.get(0) && p.inuse.get(1) && !p.inuse.get(2));
        assert_eq!(p.known_request_bound(), 1024 - 8);
    }

    #[test]
    fn scalar_allocation_has_no_sentinel_slot() {
        let mut p = page(1024, 4);
        p.allocate(8, 4, 1).unwrap();
        assert_eq!(p.used_locations(), 2);
    }

    #[test]
    fn array_allocation_reserves_sentinel_slot() {
        let mut p = page(1024, 4);
        let ptr = p.allocate(4, 4, 10).unwrap();
        assert_eq!(offset_of(&p, ptr), 0);
        // 10 data slots + 1 one-past-the-end slot.
        assert_eq!(p.used_locations(), 11);
        assert_eq!(p.known_request_bound(), 1024 - 44);
    }

    #[test]
    fn allocations_are_packed_first_fit() {
        let mut p = page(1024, 4);
        let a = p.allocate(8, 4, 1).unwrap();
        let b = p.allocate(8, 4, 1).unwrap();
        assert_eq!(offset_of(&p, a), 0);
        assert_eq!(offset_of(&p, b), 8);
    }

    #[test]
    fn freed_space_is_reused_lowest_address_first() {
        let mut p = page(1024, 4);
        let a = p.allocate(8, 4, 1).unwrap();
        let _b = p.allocate(8, 4, 1).unwrap();
        p.deallocate(a);
        let c = p.allocate(8, 4, 1).unwrap();
        assert_eq!(offset_of(&p, c), 0);
    }

    #[test]
    fn allocation_skips_occupied_runs() {
        let mut p = page(64, 4);
        let a = p.allocate(4, 4, 1).unwrap();
        let _b = p.allocate(8, 4, 1).unwrap();
        p.deallocate(a);
        // One free slot at 0, then b at slots 1-2. A two-slot request must
        // skip past b rather than re-probing its interior.
        let c = p.allocate(8, 4, 1).unwrap();
        assert_eq!(offset_of(&p, c), 12);
    }

    #[test]
    fn returned_pointers_respect_alignment() {
        let mut p = page(1024, 4);
        for _ in 0..8 {
            let ptr = p.allocate(12, 8, 1).unwrap();
            assert_eq!(ptr.as_ptr() as usize % 8, 0);
        }
        let big = p.allocate(16, 64, 1).unwrap();
        assert_eq!(big.as_ptr() as usize % 64, 0);
    }

    #[test]
    fn alignment_beyond_min_alloc_skips_slots() {
        let mut p = page(256, 4);
        p.allocate(4, 4, 1).unwrap();
        // Base is 16-aligned, so the next 16-aligned candidate is slot 4.
        let b = p.allocate(4, 16, 1).unwrap();
        assert_eq!(offset_of(&p, b), 16);
        assert_eq!(b.as_ptr() as usize % 16, 0);
    }

    #[test]
    fn zero_sized_requests_fail() {
        let mut p = page(64, 4);
        assert!(p.allocate(0, 1, 1).is_none());
        assert!(p.allocate(4, 1, 0).is_none());
        // And leave no trace.
        assert!(p.inuse.none_set());
        assert_eq!(p.known_request_bound(), 64);
    }

    #[test]
    fn overflowing_request_fails() {
        let mut p = page(64, 4);
        assert!(p.allocate(usize::MAX, 1, 2).is_none());
    }

    #[test]
    fn fast_reject_leaves_bound_untouched() {
        let mut p = page(64, 4);
        assert!(p.allocate(128, 4, 1).is_none());
        assert_eq!(p.known_request_bound(), 64);
    }

    #[test]
    fn sentinel_overflow_fails_scan_and_tightens() {
        let mut p = page(64, 4);
        // 64 bytes of array data passes the fast-reject gate, but the
        // sentinel needs a 17th slot on a 16-slot page: the scan fails and
        // records the size.
        assert!(p.allocate(4, 4, 16).is_none());
        assert_eq!(p.known_request_bound(), 63);
        // A whole-page scalar now fast-rejects as well. A false failure by
        // design: the heap's answer is to use another page.
        assert!(p.allocate(64, 4, 1).is_none());
        assert_eq!(p.known_request_bound(), 63);
        // Smaller scalars are unaffected.
        assert!(p.allocate(60, 4, 1).is_some());
    }

    #[test]
    fn exhaustion_drives_bound_to_zero() {
        // 4 slots, two 2-slot allocations.
        let mut p = page(16, 4);
        let a = p.allocate(5, 4, 1).unwrap();
        let b = p.allocate(5, 4, 1).unwrap();
        assert_eq!(offset_of(&p, a), 0);
        assert_eq!(offset_of(&p, b), 8);
        assert_eq!(p.known_request_bound(), 0);
        // Every further request fast-rejects until something is freed.
        assert!(p.allocate(1, 1, 1).is_none());
        assert_eq!(p.known_request_bound(), 0);
    }

    #[test]
    fn failed_scan_over_fragmented_page_tightens_bound() {
        let mut p = page(24, 4);
        let ptrs: Vec<_> = (0..6).map(|_| p.allocate(4, 4, 1).unwrap()).collect();
        assert_eq!(p.known_request_bound(), 0);
        p.deallocate(ptrs[1]);
        p.deallocate(ptrs[2]);
        p.deallocate(ptrs[4]);
        // Holes: slots 1-2 (8 bytes) and slot 4 (4 bytes). The combined-gap
        // relax left the bound at 8.
        assert_eq!(p.known_request_bound(), 8);
        // A 2-element request needs 3 slots (2 data + sentinel): no hole
        // fits, so the scan fails and tightens the bound below 6 bytes.
        assert!(p.allocate(3, 1, 2).is_none());
        assert_eq!(p.known_request_bound(), 5);
        // Anything at least that large now fast-rejects...
        assert!(p.allocate(8, 4, 1).is_none());
        assert_eq!(p.known_request_bound(), 5);
        // ...but hole-sized scalars still succeed, first-fit.
        let c = p.allocate(4, 4, 1).unwrap();
        assert_eq!(offset_of(&p, c), 4);
    }

    #[test]
    fn deallocate_relaxes_bound_over_trailing_gap() {
        // Freeing a middle allocation with a free gap after it must widen
        // the bound to the combined length.
        let mut p = page(64, 4);
        let _a = p.allocate(8, 4, 1).unwrap();
        let b = p.allocate(8, 4, 1).unwrap();
        let gap = p.allocate(8, 4, 1).unwrap();
        let _d = p.allocate(8, 4, 1).unwrap();
        p.allocate(32, 4, 1).unwrap(); // fill the tail: bound now 0
        assert_eq!(p.known_request_bound(), 0);
        p.deallocate(gap);
        assert_eq!(p.known_request_bound(), 8);
        // b's own 8 bytes + the 8-byte gap after it.
        p.deallocate(b);
        assert_eq!(p.known_request_bound(), 16);
    }

    #[test]
    fn deallocate_relaxes_bound_over_leading_gap() {
        let mut p = page(32, 4);
        let a = p.allocate(8, 4, 1).unwrap();
        let b = p.allocate(8, 4, 1).unwrap();
        p.allocate(16, 4, 1).unwrap(); // fill the tail
        p.deallocate(a);
        assert_eq!(p.known_request_bound(), 8);
        // Freeing b merges with the free slots before it.
        p.deallocate(b);
        assert_eq!(p.known_request_bound(), 16);
    }

    #[test]
    fn full_drain_restores_pristine_state() {
        let mut p = page(64, 4);
        let a = p.allocate(8, 4, 1).unwrap();
        let b = p.allocate(4, 4, 5).unwrap();
        let c = p.allocate(12, 4, 1).unwrap();
        p.deallocate(a);
        p.deallocate(c);
        p.deallocate(b);
        assert!(p.inuse.none_set());
        assert!(p.starts.none_set());
        assert_eq!(p.known_request_bound(), 64);
        assert_eq!(p.live_allocations(), 0);
    }

    #[test]
    fn is_empty_tracks_occupancy() {
        let mut p = page(64, 4);
        assert!(p.is_empty());
        let a = p.allocate(8, 4, 1).unwrap();
        assert!(!p.is_empty());
        p.deallocate(a);
        assert!(p.is_empty());
    }

    #[test]
    fn deallocate_then_reallocate_exact_fit() {
        let mut p = page(16, 4);
        let a = p.allocate(16, 4, 1).unwrap();
        p.deallocate(a);
        let b = p.allocate(16, 4, 1).unwrap();
        assert_eq!(offset_of(&p, b), 0);
    }

    #[test]
    fn adjacent_allocation_bounds_the_freed_run() {
        let mut p = page(64, 4);
        let a = p.allocate(8, 4, 1).unwrap();
        let _b = p.allocate(8, 4, 1).unwrap();
        p.deallocate(a);
        // b, immediately adjacent, must be untouched.
        assert!(p.starts.get(2));
        assert!(p.inuse.get(2) && p.inuse.get(3));
        assert!(!p.inuse.get(0) && !p.inuse.get(1));
    }

    #[test]
    #[should_panic(expected = "does not belong to this page")]
    fn deallocate_foreign_pointer_panics() {
        let mut p = page(64, 4);
        let foreign = NonNull::<u8>::dangling();
        p.deallocate(foreign);
    }

    #[test]
    #[should_panic(expected = "not the start of a live allocation")]
    fn deallocate_interior_pointer_panics() {
        let mut p = page(64, 4);
        let a = p.allocate(16, 4, 1).unwrap();
        let interior = NonNull::new(a.as_ptr().wrapping_add(4)).unwrap();
        p.deallocate(interior);
    }

    #[test]
    #[should_panic(expected = "not the start of a live allocation")]
    fn double_deallocate_panics() {
        let mut p = page(64, 4);
        let a = p.allocate(16, 4, 1).unwrap();
        p.deallocate(a);
        p.deallocate(a);
    }

    #[test]
    fn min_alloc_one_byte_granularity() {
        let mut p = page(16, 1);
        assert_eq!(p.locations(), 16);
        let a = p.allocate(3, 1, 1).unwrap();
        let b = p.allocate(3, 1, 1).unwrap();
        assert_eq!(offset_of(&p, a), 0);
        assert_eq!(offset_of(&p, b), 3);
        assert_eq!(p.used_locations(), 6);
    }

    #[test]
    fn display_maps_occupancy() {
        let mut p = page(64, 4);
        p.allocate(8, 4, 1).unwrap();
        let dump = p.to_string();
        assert!(dump.starts_with("page: total_size 64 min_alloc 4"));
        assert!(dump.contains("000000 Aa......"));
    }

    #[test]
    fn display_marks_every_slot_kind() {
        let mut p = page(32, 4);
        let a = p.allocate(8, 4, 1).unwrap();
        p.allocate(8, 4, 1).unwrap();
        p.deallocate(a);
        let dump = p.to_string();
        assert!(dump.contains('A'));
        assert!(dump.contains('a'));
        assert!(dump.contains('.'));
    }

    #[cfg(not(miri))]
    mod proptests {
        use super::*;
        use proptest::prelude::*;

        /// Check the structural invariants the bitmaps must uphold at every
        /// observable point.
        fn assert_invariants(p: &Page) {
            for slot in 0..p.locations() {
                if p.starts.get(slot) {
                    assert!(p.inuse.get(slot), "starts[{slot}] without inuse[{slot}]");
                }
                // The first slot of every maximal in-use run is a start.
                if p.inuse.get(slot) && (slot == 0 || !p.inuse.get(slot - 1)) {
                    assert!(p.starts.get(slot), "run at {slot} has no start bit");
                }
            }
            assert!(p.known_request_bound() <= p.total_size());
        }

        proptest! {
            #[test]
            fn random_churn_upholds_invariants(
                ops in proptest::collection::vec(
                    (1usize..24, 0u32..3, 1usize..5, any::<bool>()),
                    1..60,
                ),
            ) {
                let mut p = Page::new(PageConfig::new(256, 4)).unwrap();
                let mut live: Vec<NonNull<u8>> = Vec::new();
                for (elem_size, align_pow, count, dealloc_oldest) in ops {
                    let align = 1usize << align_pow;
                    if let Some(ptr) = p.allocate(elem_size, align, count) {
                        prop_assert_eq!(ptr.as_ptr() as usize % align, 0);
                        live.push(ptr);
                    } else if dealloc_oldest && !live.is_empty() {
                        p.deallocate(live.remove(0));
                    }
                    assert_invariants(&p);
                    prop_assert_eq!(p.live_allocations(), live.len());
                }
                for ptr in live {
                    p.deallocate(ptr);
                    assert_invariants(&p);
                }
                prop_assert!(p.inuse.none_set());
                prop_assert!(p.starts.none_set());
                prop_assert_eq!(p.known_request_bound(), p.total_size());
            }

            #[test]
            fn live_allocations_never_overlap(
                sizes in proptest::collection::vec(1usize..40, 1..20),
            ) {
                let mut p = Page::new(PageConfig::new(512, 4)).unwrap();
                let mut claimed: Vec<(usize, usize)> = Vec::new();
                let base = p.base_address().as_ptr() as usize;
                for size in sizes {
                    if let Some(ptr) = p.allocate(size, 4, 1) {
                        let start = ptr.as_ptr() as usize - base;
                        let end = start + size;
                        for &(s, e) in &claimed {
                            prop_assert!(end <= s || start >= e, "overlap with [{s}, {e})");
                        }
                        claimed.push((start, end));
                    }
                }
            }

            #[test]
            fn failed_scan_bound_is_monotone(
                fill in proptest::collection::vec(1usize..20, 1..12),
                probe in 1usize..200,
            ) {
                let mut p = Page::new(PageConfig::new(128, 4)).unwrap();
                for size in fill {
                    let _ = p.allocate(size, 4, 1);
                }
                if p.allocate(probe, 4, 1).is_none() && probe <= p.total_size() {
                    // After a failed scan the bound excludes this size...
                    prop_assert!(p.known_request_bound() < probe);
                    // ...and anything at least as large fast-rejects.
                    prop_assert!(p.allocate(probe, 4, 1).is_none());
                    prop_assert!(p.allocate(probe + 1, 4, 1).is_none());
                }
            }
        }
    }
}
