//! Fixed-size bitmap-tracked page arena for garbage-collected heaps.
//!
//! A [`Page`] is one contiguous, pre-reserved byte buffer that hands out
//! variable-sized, alignment-correct allocations and answers reverse
//! lookups ("does this pointer belong to me, and where does its allocation
//! start?"). It is the allocation primitive beneath a tracing heap: the heap
//! owns many pages, picks one per request, and queries pages to classify
//! candidate pointers during tracing. That heap lives above this crate.
//!
//! # Architecture
//!
//! ```text
//! Page (single-owner arena)
//! ├── storage: Box<[16-byte chunk]>   fixed address, never resized
//! ├── inuse:   SlotBitmap             one bit per slot, "part of a live allocation"
//! ├── starts:  SlotBitmap             one bit per slot, "first slot of an allocation"
//! └── known_request_bound: usize      O(1) fast-reject for oversized requests
//! ```
//!
//! Allocation is a first-fit, lowest-address probe over alignment-eligible
//! candidate slots, skipping whole failed runs. Deallocation clears the
//! start bit, delimits the freed run at the next start, and relaxes the
//! request bound over the surrounding free gap. Reverse lookup walks the
//! `starts` bitmap backward from an interior slot.
//!
//! # What the page does not do
//!
//! No growth, no internal locking (the owning heap synchronizes), no
//! compaction, no object typing. Allocation failure is an ordinary `None`;
//! deallocating a pointer this page never produced is a contract violation
//! and panics.
//!
//! The crate contains no unsafe code: the page computes addresses but never
//! dereferences its storage.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod bitmap;
pub mod config;
pub mod error;
pub mod lookup;
pub mod page;

// Public re-exports for the primary API surface.
pub use config::PageConfig;
pub use error::PageError;
pub use lookup::{Containment, LocationInfo};
pub use page::Page;
