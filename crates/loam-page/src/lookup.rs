//! Reverse lookup: classifying arbitrary pointers against a page.
//!
//! A tracing collector walks object graphs and meets candidate references of
//! unknown provenance. [`Page::contains`] answers, without mutating anything:
//! does this pointer land in my storage, and if so, is it free space, the
//! start of a live allocation, or the interior of one? Interior pointers are
//! resolved to their allocation's start by a backward probe of the `starts`
//! bitmap.

use std::ptr::NonNull;

use crate::page::Page;

/// Classification of a pointer relative to a page.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Containment {
    /// The pointer is outside the page's storage entirely.
    NotInRange,
    /// The pointer lands in the page but in a free slot.
    Unallocated {
        /// Slot the pointer lands in.
        slot: usize,
    },
    /// The pointer lands inside a live allocation, past its first slot.
    AllocatedInterior {
        /// Slot the pointer lands in.
        slot: usize,
        /// First slot of the allocation containing it.
        start_slot: usize,
    },
    /// The pointer lands in the first slot of a live allocation.
    AllocatedStart {
        /// Slot the pointer lands in.
        slot: usize,
    },
}

/// Result of a raw slot query: start flag plus the slot's address.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LocationInfo {
    /// Whether a live allocation starts at this slot.
    pub is_start: bool,
    /// Address of the slot's first byte.
    pub address: NonNull<u8>,
}

impl Page {
    /// Classify an arbitrary pointer against this page.
    ///
    /// Accepts any pointer, null included — a collector probes candidate
    /// references it has not yet proven to be pointers at all. Never mutates
    /// page state.
    pub fn contains(&self, ptr: *const u8) -> Containment {
        let base = self.base();
        let addr = ptr as usize;
        if addr < base || addr >= base + self.total_size() {
            return Containment::NotInRange;
        }
        let slot = (addr - base) / self.min_alloc();
        if !self.inuse.get(slot) {
            return Containment::Unallocated { slot };
        }
        if self.starts.get(slot) {
            return Containment::AllocatedStart { slot };
        }
        // Interior slot: the nearest start bit at or below it names the
        // allocation. One always exists while the bitmap invariants hold.
        let start_slot = self
            .starts
            .last_set_in(0..slot)
            .expect("in-use interior slot is always preceded by an allocation start");
        Containment::AllocatedInterior { slot, start_slot }
    }

    /// Whether an allocation starts at `slot`, plus the slot's address.
    ///
    /// Pure O(1) lookup, no scanning.
    ///
    /// # Panics
    ///
    /// Panics if `slot >= locations()`.
    pub fn location_info(&self, slot: usize) -> LocationInfo {
        assert!(
            slot < self.locations(),
            "slot {slot} out of range ({})",
            self.locations()
        );
        LocationInfo {
            is_start: self.starts.get(slot),
            address: self.slot_ptr(slot),
        }
    }
}
