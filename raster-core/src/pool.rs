//! Bump-allocated arena for [`Profile`](crate::profile::Profile) records and
//! their x-intersection arrays, plus the y-turn list that grows from the
//! opposite end.
//!
//! Grounded in `ftrast2.c`'s `ras.buff`/`ras.sizeBuff` pool: a single caller
//! supplied buffer, profiles bumped upward from the base, y-turns bumped
//! downward from the limit, `Overflow` the moment the two cursors cross.

use crate::error::{RasterError, Result};

/// Minimum pool size accepted by [`RenderPool::new`].
pub const MIN_POOL_SIZE: usize = 4096;

/// A single contiguous arena of `i32` cells, bump-allocated from both ends.
///
/// Profile records and their x-offset arrays are allocated growing up from
/// index 0 (`cursor`); the y-turn list is allocated growing down from the
/// end (`limit`). The two meet in the middle on overflow.
pub struct RenderPool {
    cells: Vec<i32>,
    cursor: usize,
    limit: usize,
}

impl RenderPool {
    /// Creates a pool with room for `size_bytes` bytes, rounded down to a
    /// multiple of 8 and then to whole `i32` cells.
    ///
    /// Fails with [`RasterError::InvalidPool`] if `size_bytes` is below
    /// [`MIN_POOL_SIZE`].
    pub fn new(size_bytes: usize) -> Result<Self> {
        if size_bytes < MIN_POOL_SIZE {
            return Err(RasterError::InvalidPool);
        }
        let rounded = size_bytes - (size_bytes % 8);
        let cell_count = rounded / core::mem::size_of::<i32>();
        Ok(Self {
            cells: vec![0i32; cell_count],
            cursor: 0,
            limit: cell_count,
        })
    }

    /// Resets both cursors to their initial positions, releasing every
    /// allocation made since the pool (or its last reset).
    pub fn reset(&mut self) {
        self.cursor = 0;
        self.limit = self.cells.len();
    }

    /// Number of cells still available between the two cursors.
    pub fn available(&self) -> usize {
        self.limit.saturating_sub(self.cursor)
    }

    /// Bump-allocates `count` cells from the low end, returning their start
    /// index into [`Self::cells`]/[`Self::cells_mut`].
    pub fn alloc_low(&mut self, count: usize) -> Result<usize> {
        if count > self.available() {
            return Err(RasterError::Overflow);
        }
        let start = self.cursor;
        self.cursor += count;
        Ok(start)
    }

    /// Bump-allocates one cell from the high end (used for the y-turn
    /// list), returning its index.
    pub fn alloc_high(&mut self) -> Result<usize> {
        if self.available() == 0 {
            return Err(RasterError::Overflow);
        }
        self.limit -= 1;
        Ok(self.limit)
    }

    pub fn cells(&self) -> &[i32] {
        &self.cells
    }

    pub fn cells_mut(&mut self) -> &mut [i32] {
        &mut self.cells
    }

    /// Index one past the last low-end allocation; also the first index
    /// still free.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// First index occupied by a high-end allocation (or `cells.len()` if
    /// none has been made yet).
    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn capacity(&self) -> usize {
        self.cells.len()
    }
}
