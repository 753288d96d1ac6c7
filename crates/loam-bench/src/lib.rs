//! Benchmark workloads for the loam page arena.
//!
//! Provides reusable, deterministic workload builders so the criterion
//! benches and ad-hoc profiling runs measure the same traffic:
//!
//! - [`request_mix`]: a seeded stream of (elem_size, align, count) requests
//!   shaped like small-object GC traffic.
//! - [`fragment_page`]: fills a page and frees every other allocation,
//!   producing the fragmented occupancy the scan has to work hardest on.

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::ptr::NonNull;

use loam_page::Page;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

/// An allocation request: element size in bytes, alignment, element count.
pub type Request = (usize, usize, usize);

/// Build a deterministic stream of `n` allocation requests.
///
/// Sizes follow small-object GC traffic: mostly scalars of 8-64 bytes with
/// the occasional short array. Identical seeds produce identical streams.
pub fn request_mix(seed: u64, n: usize) -> Vec<Request> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..n)
        .map(|_| {
            let elem_size = rng.random_range(1..=64);
            let align = 1 << rng.random_range(0..=3);
            let count = if rng.random_range(0..8) == 0 {
                rng.random_range(2..=8)
            } else {
                1
            };
            (elem_size, align, count)
        })
        .collect()
}

/// Fill `page` with scalar allocations of `elem_size` bytes, then free every
/// other one, leaving a maximally fragmented occupancy map.
///
/// Returns the surviving pointers so the caller keeps the page half-full.
pub fn fragment_page(page: &mut Page, elem_size: usize) -> Vec<NonNull<u8>> {
    let mut all = Vec::new();
    while let Some(ptr) = page.allocate(elem_size, 8, 1) {
        all.push(ptr);
    }
    let mut kept = Vec::with_capacity(all.len() / 2);
    for (i, ptr) in all.into_iter().enumerate() {
        if i % 2 == 0 {
            page.deallocate(ptr);
        } else {
            kept.push(ptr);
        }
    }
    kept
}
