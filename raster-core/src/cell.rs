//! The alternate anti-aliased path: instead of profiles, every scanline
//! crossing produces a sub-pixel "cell" record; cells are sorted and swept
//! into coverage spans delivered to a caller-supplied sink.
//!
//! Grounded in `ftgrays2.c`'s `TCell`/`grays_sweep`: cells are pushed
//! unsorted as the outline is walked, sorted lexicographically, then swept
//! row by row, accumulating `varea`/`cover` per (y, x) group. `harea` is
//! always zero here since this module only runs the vertical pass (an axis
//! swap for the horizontal sub-pass is not implemented — see
//! [`crate::sweep`]'s `single_pass` handling for the profile path's take on
//! the same trade-off). As with the profile path, cells are bump-allocated
//! out of the caller's [`RenderPool`] (four `i32` words apiece: `y`, `x`,
//! `pos`, `dir`) rather than pushed onto a growable heap `Vec`.

use crate::bezier;
use crate::error::Result;
use crate::outline::{decompose, Outline, OutlineSink};
use crate::pool::RenderPool;
use raster_types::{F26Dot6, Point};

/// One pixel's worth of fixed-point units (26.6).
const ONE_PIXEL: i32 = 64;

/// Number of pool cells (`i32` words) one [`RawCell`] occupies.
const CELL_WORDS: usize = 4;

/// Crossing direction of a cell: `Up` for an ascending (y-increasing) edge,
/// `Down` for descending. `Left`/`Right` exist in the reference for the
/// horizontal sub-pass and are unused here.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
enum Dir {
    Up,
    Down,
}

impl Dir {
    fn to_word(self) -> i32 {
        match self {
            Dir::Up => 0,
            Dir::Down => 1,
        }
    }

    fn from_word(word: i32) -> Self {
        if word == 0 {
            Dir::Up
        } else {
            Dir::Down
        }
    }
}

#[derive(Copy, Clone, Debug)]
struct RawCell {
    y: i32,
    x: i32,
    /// Sub-pixel x offset (0..ONE_PIXEL) at the scanline crossing.
    pos: i32,
    dir: Dir,
}

/// A resolved coverage span for one scanline: `[x, x + len)` at a uniform
/// 8-bit coverage.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Span {
    pub x: i32,
    pub len: i32,
    pub coverage: u8,
}

/// Receives coverage spans, one scanline at a time, for the direct
/// anti-aliased rendering path.
pub trait SpanSink {
    /// Called once per scanline with that row's spans. Adjacent spans with
    /// identical coverage SHOULD already be coalesced (this module does so
    /// before calling).
    fn spans(&mut self, y: i32, spans: &[Span]);
}

/// Default capacity of the in-progress span buffer before it is flushed to
/// the sink mid-scanline.
pub const SPAN_BUFFER_CAPACITY: usize = 32;

/// A window onto `count` [`RawCell`] records packed into a [`RenderPool`]
/// starting at word index `base`, with index-based get/set/swap standing in
/// for slice indexing since the records aren't directly addressable as a
/// Rust `[RawCell]`.
struct PoolCells<'p> {
    pool: &'p mut RenderPool,
    base: usize,
    count: usize,
}

impl<'p> PoolCells<'p> {
    fn get(&self, i: usize) -> RawCell {
        let off = self.base + i * CELL_WORDS;
        let c = self.pool.cells();
        RawCell {
            y: c[off],
            x: c[off + 1],
            pos: c[off + 2],
            dir: Dir::from_word(c[off + 3]),
        }
    }

    fn set(&mut self, i: usize, cell: RawCell) {
        let off = self.base + i * CELL_WORDS;
        let c = self.pool.cells_mut();
        c[off] = cell.y;
        c[off + 1] = cell.x;
        c[off + 2] = cell.pos;
        c[off + 3] = cell.dir.to_word();
    }

    fn swap(&mut self, i: usize, j: usize) {
        if i == j {
            return;
        }
        let a = self.get(i);
        let b = self.get(j);
        self.set(i, b);
        self.set(j, a);
    }

    fn len(&self) -> usize {
        self.count
    }

    /// Compacts the view in place, keeping only cells matching `keep`, and
    /// shrinks `count` to the number retained. No heap allocation.
    fn retain(&mut self, mut keep: impl FnMut(RawCell) -> bool) {
        let mut write = 0;
        for read in 0..self.count {
            let cell = self.get(read);
            if keep(cell) {
                if write != read {
                    self.set(write, cell);
                }
                write += 1;
            }
        }
        self.count = write;
    }
}

struct CellBuilder<'p> {
    pool: &'p mut RenderPool,
    base: usize,
    count: usize,
    current: Point<F26Dot6>,
    last_pushed_row: Option<i32>,
}

impl<'p> CellBuilder<'p> {
    fn push_cell(&mut self, cell: RawCell) -> Result<()> {
        let idx = self.pool.alloc_low(CELL_WORDS)?;
        let words = self.pool.cells_mut();
        words[idx] = cell.y;
        words[idx + 1] = cell.x;
        words[idx + 2] = cell.pos;
        words[idx + 3] = cell.dir.to_word();
        self.count += 1;
        Ok(())
    }

    fn add_line(&mut self, p0: Point<F26Dot6>, p1: Point<F26Dot6>) -> Result<()> {
        let y0 = p0.y.to_bits();
        let y1 = p1.y.to_bits();
        if y0 == y1 {
            return Ok(());
        }
        let dir = if y1 > y0 { Dir::Up } else { Dir::Down };
        let top = y0.min(y1);
        let bot = y0.max(y1);
        let first_row = top >> 6;
        let last_row = (bot - 1) >> 6;
        if last_row < first_row {
            return Ok(());
        }
        let dx = p1.x.to_bits() - p0.x.to_bits();
        let dy = y1 - y0;
        let mut row = first_row;
        while row <= last_row {
            if self.last_pushed_row != Some(row) {
                let row_y = row << 6;
                let x_at_row = p0.x.to_bits() + raster_types::mul_div(dx, row_y - y0, dy);
                self.push_cell(RawCell {
                    y: row,
                    x: x_at_row >> 6,
                    pos: x_at_row & (ONE_PIXEL - 1),
                    dir,
                })?;
                self.last_pushed_row = Some(row);
            }
            row += 1;
        }
        Ok(())
    }
}

impl OutlineSink for CellBuilder<'_> {
    fn move_to(&mut self, p: Point<F26Dot6>) -> Result<()> {
        self.current = p;
        self.last_pushed_row = None;
        Ok(())
    }

    fn line_to(&mut self, p: Point<F26Dot6>) -> Result<()> {
        self.add_line(self.current, p)?;
        self.current = p;
        Ok(())
    }

    fn conic_to(&mut self, c: Point<F26Dot6>, p: Point<F26Dot6>) -> Result<()> {
        let start = self.current;
        let mut result = Ok(());
        bezier::monotonize_quad(start, c, p, &mut |dir, arc| {
            if dir != bezier::Monotony::Flat {
                let threshold = bezier::dynamic_threshold_quad(arc, bezier::PRECISION_STEP_LOW);
                let mut prev = arc[0];
                bezier::flatten_quad(arc[0], arc[1], arc[2], threshold, &mut |pt| {
                    if result.is_ok() {
                        result = self.add_line(prev, pt);
                        prev = pt;
                    }
                })?;
            }
            Ok(())
        })?;
        self.current = p;
        result
    }

    fn cubic_to(&mut self, c1: Point<F26Dot6>, c2: Point<F26Dot6>, p: Point<F26Dot6>) -> Result<()> {
        let start = self.current;
        let mut result = Ok(());
        bezier::monotonize_cubic(start, c1, c2, p, &mut |dir, arc| {
            if dir != bezier::Monotony::Flat {
                let threshold = bezier::dynamic_threshold_cubic(arc, bezier::PRECISION_STEP_LOW);
                let mut prev = arc[0];
                bezier::flatten_cubic(arc[0], arc[1], arc[2], arc[3], threshold, &mut |pt| {
                    if result.is_ok() {
                        result = self.add_line(prev, pt);
                        prev = pt;
                    }
                })?;
            }
            Ok(())
        })?;
        self.current = p;
        result
    }
}

/// Non-recursive quicksort over `cells`, ordered by `(y, x)`, with a
/// median-of-three pivot and an insertion-sort cutoff at 4 elements —
/// the sort discipline `ftgrays2.c` uses for its cell array.
fn sort_cells(cells: &mut PoolCells<'_>) {
    fn key(c: RawCell) -> (i32, i32) {
        (c.y, c.x)
    }
    let mut stack = vec![(0usize, cells.len())];
    while let Some((lo, hi)) = stack.pop() {
        if hi - lo <= 4 {
            insertion_sort(cells, lo, hi);
            continue;
        }
        let mid = lo + (hi - lo) / 2;
        // median-of-three: reorder cells[lo], cells[mid], cells[hi - 1] so
        // the middle one is the median, then use it as the pivot.
        if key(cells.get(mid)) < key(cells.get(lo)) {
            cells.swap(mid, lo);
        }
        if key(cells.get(hi - 1)) < key(cells.get(lo)) {
            cells.swap(hi - 1, lo);
        }
        if key(cells.get(hi - 1)) < key(cells.get(mid)) {
            cells.swap(hi - 1, mid);
        }
        let pivot = key(cells.get(mid));
        cells.swap(mid, hi - 1);
        let mut store = lo;
        for i in lo..hi - 1 {
            if key(cells.get(i)) < pivot {
                cells.swap(i, store);
                store += 1;
            }
        }
        cells.swap(store, hi - 1);
        stack.push((lo, store));
        stack.push((store + 1, hi));
    }
}

fn insertion_sort(cells: &mut PoolCells<'_>, lo: usize, hi: usize) {
    for i in lo + 1..hi {
        let mut j = i;
        while j > lo {
            let a = cells.get(j);
            let b = cells.get(j - 1);
            if (a.y, a.x) < (b.y, b.x) {
                cells.swap(j, j - 1);
                j -= 1;
            } else {
                break;
            }
        }
    }
}

/// Renders `outline` via the cell path, delivering coverage spans to `sink`.
///
/// `clip_width` bounds the row (used both to clip cells and as the extent
/// of the trailing full-coverage run described in the module doc comment).
/// Cell storage is bump-allocated from `pool`.
pub fn render_cells(
    outline: &Outline,
    clip_width: i32,
    pool: &mut RenderPool,
    sink: &mut impl SpanSink,
) -> Result<()> {
    let base = pool.cursor();
    let mut builder = CellBuilder {
        pool,
        base,
        count: 0,
        current: Point::new(F26Dot6::ZERO, F26Dot6::ZERO),
        last_pushed_row: None,
    };
    decompose(outline, &mut builder)?;
    let count = builder.count;
    let pool = builder.pool;

    let mut cells = PoolCells { pool, base, count };
    cells.retain(|c| c.x >= 0 && c.x < clip_width);
    sort_cells(&mut cells);

    let mut idx = 0usize;
    let mut buffer: Vec<Span> = Vec::with_capacity(SPAN_BUFFER_CAPACITY);
    while idx < cells.len() {
        let row = cells.get(idx).y;
        let row_start = idx;
        while idx < cells.len() && cells.get(idx).y == row {
            idx += 1;
        }
        sweep_row(&cells, row_start, idx, clip_width, |x, len, coverage| {
            if buffer.len() == buffer.capacity() {
                sink.spans(row, &buffer);
                buffer.clear();
            }
            buffer.push(Span { x, len, coverage });
        });
        if !buffer.is_empty() {
            sink.spans(row, &buffer);
            buffer.clear();
        }
    }
    Ok(())
}

/// Sweeps one row's (already (y,x)-sorted) cells, `cells[lo..hi)`, into
/// coverage spans, grouping cells sharing the same `x`, tracking the
/// running signed `cover` window, and carrying a contiguous black run
/// (`carry_x`, the reference's `x_black`) across cell groups that have no
/// gray cell between them.
fn sweep_row(
    cells: &PoolCells<'_>,
    lo: usize,
    hi: usize,
    row_width: i32,
    mut emit: impl FnMut(i32, i32, u8),
) {
    let mut cover = 0i32;
    let mut carry_x: Option<i32> = None;
    let mut last_x = -1i32;
    let mut i = lo;
    while i < hi {
        let x = cells.get(i).x;
        let mut varea = 0i32;
        let mut delta = 0i32;
        while i < hi && cells.get(i).x == x {
            let c = cells.get(i);
            // full row height (ONE_PIXEL) times the horizontal portion of
            // the cell to the right of the crossing; this is what makes a
            // crossing at the cell's left edge (pos == 0) fully cover it.
            let contribution = ONE_PIXEL * (ONE_PIXEL - c.pos);
            match c.dir {
                Dir::Up => {
                    varea += contribution;
                    delta += 1;
                }
                Dir::Down => {
                    varea -= contribution;
                    delta -= 1;
                }
            }
            i += 1;
        }
        let area = 2 * varea; // harea is always zero in the vertical-only pass
        let full_area = 2 * ONE_PIXEL * ONE_PIXEL;
        let coverage = ((area.unsigned_abs() as u64 * 255) / full_area as u64).min(255) as u8;

        if cover != 0 && last_x + 1 < x && carry_x.is_none() {
            carry_x = Some(last_x + 1);
        }

        if coverage == 0 {
            if let Some(start) = carry_x.take() {
                emit(start, x - start, 255);
            }
        } else if coverage >= 255 {
            if carry_x.is_none() {
                carry_x = Some(x);
            }
        } else {
            if let Some(start) = carry_x.take() {
                emit(start, x - start, 255);
            }
            emit(x, 1, coverage);
        }

        cover += delta;
        last_x = x;
    }

    if cover != 0 {
        let start = carry_x.unwrap_or(last_x + 1);
        if start < row_width {
            emit(start, row_width - start, 255);
        }
    } else if let Some(start) = carry_x.take() {
        emit(start, (last_x + 1 - start).max(0), 255);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outline::{Outline, OutlineFlags, Tag};
    use crate::pool::MIN_POOL_SIZE;

    fn pt(x: i32, y: i32) -> Point<F26Dot6> {
        Point::new(F26Dot6::from_bits(x << 6), F26Dot6::from_bits(y << 6))
    }

    #[derive(Default)]
    struct Recorder(Vec<(i32, Vec<Span>)>);

    impl SpanSink for Recorder {
        fn spans(&mut self, y: i32, spans: &[Span]) {
            self.0.push((y, spans.to_vec()));
        }
    }

    #[test]
    fn square_rows_are_fully_covered() {
        let outline = Outline::new(
            vec![pt(0, 0), pt(8, 0), pt(8, 8), pt(0, 8)],
            vec![Tag::OnCurve; 4],
            vec![3],
            OutlineFlags::default(),
        );
        let mut pool = RenderPool::new(MIN_POOL_SIZE).unwrap();
        let mut rec = Recorder::default();
        render_cells(&outline, 8, &mut pool, &mut rec).unwrap();
        assert_eq!(rec.0.len(), 8);
        for (_, spans) in &rec.0 {
            let total: i32 = spans.iter().map(|s| s.len).sum();
            assert_eq!(total, 8);
            assert!(spans.iter().all(|s| s.coverage == 255));
        }
    }

    #[test]
    fn coverage_values_stay_in_range() {
        let outline = Outline::new(
            vec![pt(0, 0), pt(8, 16), pt(16, 0)],
            vec![Tag::OnCurve; 3],
            vec![2],
            OutlineFlags::default(),
        );
        let mut pool = RenderPool::new(MIN_POOL_SIZE).unwrap();
        let mut rec = Recorder::default();
        render_cells(&outline, 16, &mut pool, &mut rec).unwrap();
        for (_, spans) in &rec.0 {
            for span in spans {
                assert!(span.coverage <= 255);
                assert!(span.len > 0);
            }
        }
    }

    #[test]
    fn sort_cells_orders_by_y_then_x() {
        let mut pool = RenderPool::new(MIN_POOL_SIZE).unwrap();
        let base = pool.cursor();
        let raw = [
            RawCell { y: 2, x: 5, pos: 0, dir: Dir::Up },
            RawCell { y: 1, x: 9, pos: 0, dir: Dir::Down },
            RawCell { y: 1, x: 2, pos: 0, dir: Dir::Up },
            RawCell { y: 0, x: 0, pos: 0, dir: Dir::Up },
        ];
        let mut cells = PoolCells { pool: &mut pool, base, count: raw.len() };
        for (i, c) in raw.into_iter().enumerate() {
            cells.set(i, c);
        }
        sort_cells(&mut cells);
        let keys: Vec<(i32, i32)> = (0..cells.len()).map(|i| {
            let c = cells.get(i);
            (c.y, c.x)
        }).collect();
        assert_eq!(keys, vec![(0, 0), (1, 2), (1, 9), (2, 5)]);
    }

    #[test]
    fn cell_pool_overflow_propagates() {
        let outline = Outline::new(
            vec![pt(0, 0), pt(64, 0), pt(64, 64), pt(0, 64)],
            vec![Tag::OnCurve; 4],
            vec![3],
            OutlineFlags::default(),
        );
        let mut pool = RenderPool::new(MIN_POOL_SIZE).unwrap();
        pool.alloc_low(pool.capacity() - 2).unwrap();
        let mut rec = Recorder::default();
        assert_eq!(
            render_cells(&outline, 64, &mut pool, &mut rec),
            Err(crate::error::RasterError::Overflow)
        );
    }
}
