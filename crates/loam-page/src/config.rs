//! Page configuration parameters.

use crate::error::PageError;

/// Configuration for a fixed-size page.
///
/// Controls the page's byte capacity and its allocation granularity.
/// Validated at construction; both values are immutable once the page
/// exists.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageConfig {
    /// Total arena capacity in bytes.
    ///
    /// Rounded up to the next multiple of `min_alloc` at page construction,
    /// so the page always holds a whole number of slots.
    pub total_size: usize,

    /// Minimum allocation granularity in bytes (the slot size).
    ///
    /// Every allocation occupies a whole number of slots. Must be non-zero;
    /// it is typically small relative to object alignment (the default is 4).
    pub min_alloc: usize,
}

impl PageConfig {
    /// Default page capacity in bytes.
    pub const DEFAULT_TOTAL_SIZE: usize = 1024;

    /// Default slot granularity in bytes.
    pub const DEFAULT_MIN_ALLOC: usize = 4;

    /// Create a config with the given capacity and granularity.
    pub fn new(total_size: usize, min_alloc: usize) -> Self {
        Self {
            total_size,
            min_alloc,
        }
    }

    /// Check the config for values a page cannot be built from.
    pub fn validate(&self) -> Result<(), PageError> {
        if self.total_size == 0 {
            return Err(PageError::ZeroTotalSize);
        }
        if self.min_alloc == 0 {
            return Err(PageError::ZeroMinAlloc);
        }
        Ok(())
    }

    /// `total_size` rounded up to the next multiple of `min_alloc`.
    ///
    /// Meaningful only for a config that passes [`PageConfig::validate`].
    pub fn rounded_total_size(&self) -> usize {
        self.total_size.div_ceil(self.min_alloc) * self.min_alloc
    }

    /// Number of slots the page will hold.
    ///
    /// Meaningful only for a config that passes [`PageConfig::validate`].
    pub fn locations(&self) -> usize {
        self.rounded_total_size() / self.min_alloc
    }
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            total_size: Self::DEFAULT_TOTAL_SIZE,
            min_alloc: Self::DEFAULT_MIN_ALLOC,
        }
    }
}
