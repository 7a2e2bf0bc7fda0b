//! Builds ascending/descending "profiles" — the set of x-intersections of a
//! y-monotonic arc against the scanlines it spans — and the sorted list of
//! scanlines at which some profile starts or ends (the y-turn list).
//!
//! Grounded in `ftrast2.c`'s `New_Profile`/`End_Profile`/`Line_Up`/
//! `Bezier_Up` family: this module receives the same decomposition events as
//! [`crate::outline::OutlineSink`], but curves are first reduced to
//! y-monotonic line segments by [`crate::bezier`] so this module only ever
//! has to intersect straight lines against scanlines. As in the reference,
//! every profile's x-offset array is bump-allocated out of the caller's
//! [`RenderPool`] rather than the process heap; only the (small, one-per-arc)
//! `Profile` records themselves live in an ordinary `Vec`.
//!
//! Simplification versus the reference: coordinates stay in 26.6 work
//! precision throughout (the `high_precision` 22.10 path is not carried, see
//! the crate's design notes).

use crate::bezier::{self, Monotony};
use crate::error::{RasterError, Result};
use crate::outline::OutlineSink;
use crate::pool::RenderPool;
use raster_types::{F26Dot6, Point};

/// Vertical direction of one profile's arc.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Orientation {
    Ascending,
    Descending,
}

/// One y-monotonic run of x-intersections, one per scanline it spans.
///
/// The x-offsets themselves are not stored inline: they live in the
/// [`RenderPool`] passed to [`ProfileBuilder::new`], at `[x_start, x_start +
/// height)`. Use [`Profile::x_offsets`] to read them back.
#[derive(Clone, Debug)]
pub struct Profile {
    pub orientation: Orientation,
    /// First scanline this profile covers.
    pub start_y: i32,
    /// Start index of this profile's x-offsets inside the render pool.
    x_start: usize,
    /// Number of scanlines (and pool cells) this profile currently spans.
    height: usize,
    /// Index of the next profile opened within the same contour, if any.
    pub next_in_contour: Option<usize>,
    /// Scanlines (really, y-turn windows) remaining before the sweeper
    /// activates this profile; 0 once it belongs on the draw list.
    pub count_left: i32,
    /// Scratch x used while sweeping; refreshed each scanline.
    pub current_x: i32,
}

impl Profile {
    pub fn height(&self) -> i32 {
        self.height as i32
    }

    /// Reads this profile's x-intersections back out of `pool`.
    pub fn x_offsets<'p>(&self, pool: &'p RenderPool) -> &'p [i32] {
        &pool.cells()[self.x_start..self.x_start + self.height]
    }
}

/// Tracks what kind of arc is currently open, mirroring the reference
/// rasterizer's per-contour state machine.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
enum State {
    Unknown,
    Ascending,
    Descending,
}

/// Consumes outline decomposition events and produces [`Profile`] records
/// plus the sorted y-turn list, bump-allocating x-offset storage from a
/// caller-owned [`RenderPool`] as it goes.
pub struct ProfileBuilder<'p> {
    pool: &'p mut RenderPool,
    profiles: Vec<Profile>,
    y_turns: Vec<i32>,
    state: State,
    current: Point<F26Dot6>,
    open: Option<usize>,
    last_in_contour: Option<usize>,
    last_pushed_row: Option<i32>,
    /// Scanline row range this builder will produce x-offsets for,
    /// `[band.0, band.1)`; `None` means the whole outline. Restricting the
    /// band is what lets the driver retry a pool overflow on half the
    /// height instead of the whole glyph (see [`crate::driver`]'s
    /// sub-banding loop).
    band: Option<(i32, i32)>,
}

impl<'p> ProfileBuilder<'p> {
    pub fn new(pool: &'p mut RenderPool) -> Self {
        Self::new_banded(pool, None)
    }

    /// Like [`Self::new`], but only scanlines in `[y_min, y_max)` of
    /// `band` are decomposed into x-offsets; rows outside it are skipped as
    /// though they weren't part of the outline at all.
    pub fn new_banded(pool: &'p mut RenderPool, band: Option<(i32, i32)>) -> Self {
        Self {
            pool,
            profiles: Vec::new(),
            y_turns: Vec::new(),
            state: State::Unknown,
            current: Point::new(F26Dot6::ZERO, F26Dot6::ZERO),
            open: None,
            last_in_contour: None,
            last_pushed_row: None,
            band,
        }
    }

    /// Finalizes the last open contour; must be called once after an entire
    /// outline has been fed through [`crate::outline::decompose`].
    ///
    /// Fails with [`RasterError::InvalidOutline`] if no profile produced any
    /// y-turn (an outline with zero vertical extent has nothing to sweep).
    /// Assigns each profile's `count_left` to the y-turn index its
    /// `start_y` falls at, the scanline-sweeper's activation countdown (see
    /// [`crate::sweep`]).
    pub fn finish(mut self) -> Result<(Vec<Profile>, Vec<i32>)> {
        self.close_open_profile();
        if self.y_turns.is_empty() {
            return Err(RasterError::InvalidOutline);
        }
        for profile in &mut self.profiles {
            let turn_index = self
                .y_turns
                .iter()
                .position(|&y| y == profile.start_y)
                .unwrap_or(0);
            profile.count_left = turn_index as i32;
        }
        Ok((self.profiles, self.y_turns))
    }

    /// Closes the currently open profile (if any), recording its start and
    /// end scanlines in the y-turn list.
    fn close_open_profile(&mut self) {
        if let Some(idx) = self.open.take() {
            let profile = &self.profiles[idx];
            let height = profile.height();
            if height > 0 {
                let start = profile.start_y;
                self.insert_turn(start);
                self.insert_turn(start + height);
            }
        }
        self.last_pushed_row = None;
        self.state = State::Unknown;
    }

    fn insert_turn(&mut self, y: i32) {
        if let Err(pos) = self.y_turns.binary_search(&y) {
            self.y_turns.insert(pos, y);
        }
    }

    fn open_profile(&mut self, orientation: Orientation, start_row: i32) -> usize {
        let idx = self.profiles.len();
        self.profiles.push(Profile {
            orientation,
            start_y: start_row,
            x_start: self.pool.cursor(),
            height: 0,
            next_in_contour: None,
            count_left: 0,
            current_x: 0,
        });
        if let Some(prev) = self.last_in_contour {
            self.profiles[prev].next_in_contour = Some(idx);
        }
        self.last_in_contour = Some(idx);
        self.open = Some(idx);
        idx
    }

    fn add_line(&mut self, p0: Point<F26Dot6>, p1: Point<F26Dot6>) -> Result<()> {
        let y0 = p0.y.to_bits();
        let y1 = p1.y.to_bits();
        if y0 == y1 {
            return Ok(()); // horizontal: no vertical-sweep crossings
        }
        let orientation = if y1 > y0 {
            Orientation::Ascending
        } else {
            Orientation::Descending
        };
        let wanted_state = match orientation {
            Orientation::Ascending => State::Ascending,
            Orientation::Descending => State::Descending,
        };
        if self.state != wanted_state {
            self.close_open_profile();
        }
        let top = y0.min(y1);
        let bot = y0.max(y1);
        let first_row = top >> 6;
        let last_row = (bot - 1) >> 6;
        if last_row < first_row {
            return Ok(()); // sub-pixel tall segment, no scanline crossing
        }
        let (first_row, last_row) = match self.band {
            Some((y_min, y_max)) => {
                let clipped_first = first_row.max(y_min);
                let clipped_last = last_row.min(y_max - 1);
                if clipped_last < clipped_first {
                    return Ok(()); // this arc doesn't cross the current band
                }
                (clipped_first, clipped_last)
            }
            None => (first_row, last_row),
        };

        if self.open.is_none() {
            self.state = wanted_state;
            self.open_profile(orientation, first_row);
        }
        let idx = self.open.unwrap();

        let dx = p1.x.to_bits() - p0.x.to_bits();
        let dy = y1 - y0;
        let mut row = first_row;
        while row <= last_row {
            // The drop-out joint rule: an arc that ends exactly on a
            // scanline must not have its endpoint re-pushed by the next
            // arc starting from that same point.
            if self.last_pushed_row != Some(row) {
                let row_y = row << 6;
                let x = p0.x.to_bits() + raster_types::mul_div(dx, row_y - y0, dy);
                // bump-allocate one cell contiguous with this profile's
                // existing run; nothing else allocates from the low end
                // while a profile is open, so contiguity holds.
                self.pool.alloc_low(1)?;
                let cell = self.profiles[idx].x_start + self.profiles[idx].height;
                self.pool.cells_mut()[cell] = x;
                self.profiles[idx].height += 1;
                self.last_pushed_row = Some(row);
            }
            row += 1;
        }
        Ok(())
    }

    fn add_monotone_quad(&mut self, arc: [Point<F26Dot6>; 3]) -> Result<()> {
        let threshold = bezier::dynamic_threshold_quad(arc, bezier::PRECISION_STEP_LOW);
        let mut prev = arc[0];
        let mut result = Ok(());
        bezier::flatten_quad(arc[0], arc[1], arc[2], threshold, &mut |p| {
            if result.is_ok() {
                result = self.add_line(prev, p);
                prev = p;
            }
        })?;
        result
    }

    fn add_monotone_cubic(&mut self, arc: [Point<F26Dot6>; 4]) -> Result<()> {
        let threshold = bezier::dynamic_threshold_cubic(arc, bezier::PRECISION_STEP_LOW);
        let mut prev = arc[0];
        let mut result = Ok(());
        bezier::flatten_cubic(arc[0], arc[1], arc[2], arc[3], threshold, &mut |p| {
            if result.is_ok() {
                result = self.add_line(prev, p);
                prev = p;
            }
        })?;
        result
    }
}

impl OutlineSink for ProfileBuilder<'_> {
    fn move_to(&mut self, p: Point<F26Dot6>) -> Result<()> {
        self.close_open_profile();
        self.last_in_contour = None;
        self.current = p;
        Ok(())
    }

    fn line_to(&mut self, p: Point<F26Dot6>) -> Result<()> {
        self.add_line(self.current, p)?;
        self.current = p;
        Ok(())
    }

    fn conic_to(&mut self, c: Point<F26Dot6>, p: Point<F26Dot6>) -> Result<()> {
        let start = self.current;
        bezier::monotonize_quad(start, c, p, &mut |dir, arc| {
            if dir != Monotony::Flat {
                self.add_monotone_quad(arc)?;
            }
            Ok(())
        })?;
        self.current = p;
        Ok(())
    }

    fn cubic_to(&mut self, c1: Point<F26Dot6>, c2: Point<F26Dot6>, p: Point<F26Dot6>) -> Result<()> {
        let start = self.current;
        bezier::monotonize_cubic(start, c1, c2, p, &mut |dir, arc| {
            if dir != Monotony::Flat {
                self.add_monotone_cubic(arc)?;
            }
            Ok(())
        })?;
        self.current = p;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outline::decompose;
    use crate::outline::{Outline, OutlineFlags, Tag};
    use crate::pool::MIN_POOL_SIZE;

    fn pt(x: i32, y: i32) -> Point<F26Dot6> {
        Point::new(F26Dot6::from_bits(x << 6), F26Dot6::from_bits(y << 6))
    }

    #[test]
    fn square_produces_two_profiles_and_two_turns() {
        let points = vec![pt(0, 0), pt(16, 0), pt(16, 16), pt(0, 16)];
        let tags = vec![Tag::OnCurve; 4];
        let outline = Outline::new(points, tags, vec![3], OutlineFlags::default());
        let mut pool = RenderPool::new(MIN_POOL_SIZE).unwrap();
        let mut builder = ProfileBuilder::new(&mut pool);
        decompose(&outline, &mut builder).unwrap();
        let (profiles, turns) = builder.finish().unwrap();
        // one ascending edge (left, going down) and one descending edge
        // (right, going up); the two horizontal edges contribute nothing.
        assert_eq!(profiles.len(), 2);
        assert_eq!(turns, vec![0, 16]);
        for profile in &profiles {
            assert_eq!(profile.height(), 16);
            assert_eq!(profile.x_offsets(&pool).len(), 16);
        }
    }

    #[test]
    fn triangle_apex_has_single_scanline_profiles() {
        let points = vec![pt(0, 0), pt(8, 16), pt(16, 0)];
        let tags = vec![Tag::OnCurve; 3];
        let outline = Outline::new(points, tags, vec![2], OutlineFlags::default());
        let mut pool = RenderPool::new(MIN_POOL_SIZE).unwrap();
        let mut builder = ProfileBuilder::new(&mut pool);
        decompose(&outline, &mut builder).unwrap();
        let (profiles, turns) = builder.finish().unwrap();
        assert_eq!(turns.first().copied(), Some(0));
        assert_eq!(turns.last().copied(), Some(16));
        assert!(profiles.iter().all(|p| p.height() > 0));
    }

    #[test]
    fn zero_height_outline_is_invalid() {
        let points = vec![pt(0, 5), pt(10, 5), pt(20, 5)];
        let tags = vec![Tag::OnCurve; 3];
        let outline = Outline::new(points, tags, vec![2], OutlineFlags::default());
        let mut pool = RenderPool::new(MIN_POOL_SIZE).unwrap();
        let mut builder = ProfileBuilder::new(&mut pool);
        decompose(&outline, &mut builder).unwrap();
        assert_eq!(builder.finish().unwrap_err(), RasterError::InvalidOutline);
    }

    #[test]
    fn profiles_get_increasing_activation_countdowns() {
        // A taller shape than a square's two profiles: a triangle whose
        // apex profile starts at a later y-turn than the base edges, so its
        // `count_left` should be a later turn index, not zero.
        let points = vec![pt(0, 0), pt(8, 16), pt(16, 0)];
        let tags = vec![Tag::OnCurve; 3];
        let outline = Outline::new(points, tags, vec![2], OutlineFlags::default());
        let mut pool = RenderPool::new(MIN_POOL_SIZE).unwrap();
        let mut builder = ProfileBuilder::new(&mut pool);
        decompose(&outline, &mut builder).unwrap();
        let (profiles, turns) = builder.finish().unwrap();
        for profile in &profiles {
            let expected = turns.iter().position(|&y| y == profile.start_y).unwrap();
            assert_eq!(profile.count_left, expected as i32);
        }
    }

    #[test]
    fn pool_overflow_propagates_from_add_line() {
        let points = vec![pt(0, 0), pt(64, 0), pt(64, 64), pt(0, 64)];
        let tags = vec![Tag::OnCurve; 4];
        let outline = Outline::new(points, tags, vec![3], OutlineFlags::default());
        let mut pool = RenderPool::new(MIN_POOL_SIZE).unwrap();
        // Starve the pool down to a handful of cells so the profile's
        // x-offset run overflows partway through decomposition.
        pool.alloc_low(pool.capacity() - 2).unwrap();
        let mut builder = ProfileBuilder::new(&mut pool);
        assert_eq!(
            decompose(&outline, &mut builder),
            Err(RasterError::Overflow)
        );
    }
}
