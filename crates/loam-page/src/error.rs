//! Page-specific error types.
//!
//! Only configuration problems are reported as error values. A failed
//! allocation is an expected outcome and is signalled by `None` from
//! [`Page::allocate`](crate::Page::allocate); handing
//! [`Page::deallocate`](crate::Page::deallocate) a pointer that did not come
//! from this page is a caller-side contract violation and panics instead of
//! returning an error.

use std::error::Error;
use std::fmt;

/// Errors that can occur while constructing a page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PageError {
    /// `total_size` was zero — a page must have at least one slot.
    ZeroTotalSize,
    /// `min_alloc` was zero — the slot granularity must be at least one byte.
    ZeroMinAlloc,
}

impl fmt::Display for PageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroTotalSize => {
                write!(f, "invalid page config: total_size must be non-zero")
            }
            Self::ZeroMinAlloc => {
                write!(f, "invalid page config: min_alloc must be non-zero")
            }
        }
    }
}

impl Error for PageError {}
