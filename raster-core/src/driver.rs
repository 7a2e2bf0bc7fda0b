//! The public rendering entry point: validates inputs, picks a rendering
//! path, and retries in shrinking y-bands when the render pool is too small
//! to hold the whole outline's profile data at once.
//!
//! Grounded in `ftrast2.c`'s top-level `Render_Glyph`/`Convert_Glyph`: reset
//! takes ownership of a caller pool, and a single render call walks the
//! outline once, then sweeps it in one or more bands depending on how much
//! of the pool a full-height sweep would need.

use crate::bitmap::{Bitmap, PixelFormat};
use crate::cell::{self, SpanSink};
use crate::error::{RasterError, Result};
use crate::gray::{self, GrayPalette, FACTOR_GRAY17, FACTOR_GRAY5};
use crate::outline::Outline;
use crate::pool::RenderPool;
use crate::profile::ProfileBuilder;
use crate::sweep::{sweep_clamped, DropOutMode};

/// Maximum number of times a band may be halved before giving up.
const MAX_BAND_DEPTH: usize = 8;

/// Returns the half-open scanline row range `[min, max)` `outline`'s points
/// span, or `None` if it has no points. Used to seed the sub-banding loop's
/// initial band with the outline's actual extent instead of an arbitrary
/// range.
fn glyph_row_bounds(outline: &Outline) -> Option<(i32, i32)> {
    let mut min_y = i32::MAX;
    let mut max_y = i32::MIN;
    for p in outline.points() {
        let y = p.y.to_bits();
        min_y = min_y.min(y);
        max_y = max_y.max(y);
    }
    if min_y > max_y {
        return None;
    }
    Some((min_y >> 6, (max_y + 63) >> 6))
}

/// Where a render call delivers its output.
pub enum RenderTarget<'a> {
    /// The indirect path: fill a bitmap (B/W or gray, selected by
    /// [`RenderFlags::aa`]).
    Bitmap(&'a mut Bitmap),
    /// The direct path: emit coverage spans straight to a sink, clipped to
    /// `[0, clip_width)`. Only [`CellRaster`](crate::cell) implements this;
    /// requires [`RenderFlags::direct`].
    Spans {
        sink: &'a mut dyn SpanSink,
        clip_width: i32,
    },
}

/// Selects which rendering path [`RasterDriver::render`] takes.
#[derive(Copy, Clone, PartialEq, Eq, Default, Debug)]
pub struct RenderFlags {
    /// Anti-alias via the gray path instead of plain black-and-white.
    /// Ignored when `direct` is set (the direct/cell path is always
    /// anti-aliased).
    pub aa: bool,
    /// Use the direct cell-based coverage path instead of profiles. Only
    /// valid together with [`RenderTarget::Spans`].
    pub direct: bool,
}

/// Arguments to [`RasterDriver::render`].
pub struct RasterParams<'a> {
    pub outline: &'a Outline,
    pub target: RenderTarget<'a>,
    pub flags: RenderFlags,
}

/// Drives outline rasterization: owns the render pool and palette across
/// calls, the way a single `FT_Raster` instance is reset once and reused
/// for many glyphs.
pub struct RasterDriver {
    pool: Option<RenderPool>,
    palette: GrayPalette,
    drop_out: DropOutMode,
}

impl Default for RasterDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl RasterDriver {
    pub fn new() -> Self {
        Self {
            pool: None,
            palette: GrayPalette::new(vec![0, 1, 2, 3, 4]),
            drop_out: DropOutMode::Off,
        }
    }

    /// Installs a fresh render pool of `pool_size_bytes` bytes, discarding
    /// any previous one. Must be called before [`Self::render`].
    pub fn reset(&mut self, pool_size_bytes: usize) -> Result<()> {
        self.pool = Some(RenderPool::new(pool_size_bytes)?);
        Ok(())
    }

    pub fn set_drop_out_mode(&mut self, mode: DropOutMode) {
        self.drop_out = mode;
    }

    /// Installs a custom gray palette. `levels.len()` must be 2, 5, or 17.
    pub fn set_palette(&mut self, levels: Vec<u8>) -> Result<()> {
        if !matches!(levels.len(), 2 | 5 | 17) {
            return Err(RasterError::BadPaletteCount);
        }
        self.palette = GrayPalette::new(levels);
        Ok(())
    }

    /// Renders `params.outline` to `params.target`, selecting the path
    /// named by `params.flags`.
    ///
    /// Direct-mode output is only available through
    /// [`RenderTarget::Spans`]; requesting `flags.direct` against a
    /// [`RenderTarget::Bitmap`] (or vice versa) returns
    /// [`RasterError::Unimplemented`], since no path implements that
    /// combination.
    pub fn render(&mut self, params: RasterParams) -> Result<()> {
        let RasterParams { outline, target, flags } = params;
        match (flags.direct, target) {
            (true, RenderTarget::Spans { sink, clip_width }) => {
                self.render_direct(outline, clip_width, sink)
            }
            (false, RenderTarget::Bitmap(bitmap)) => {
                if flags.aa {
                    self.render_gray(outline, bitmap)
                } else {
                    self.render_bw(outline, bitmap)
                }
            }
            (true, RenderTarget::Bitmap(_)) | (false, RenderTarget::Spans { .. }) => {
                Err(RasterError::Unimplemented)
            }
        }
    }

    /// Renders `outline` into `bitmap` using the black-and-white path.
    ///
    /// Builds profiles for one y-band at a time, starting with the
    /// outline's whole extent. If the pool overflows partway through a
    /// band, that band is halved: the upper half is pushed on a stack (max
    /// depth [`MAX_BAND_DEPTH`]) and the lower half is retried against a
    /// freshly reset pool. The final bitmap does not depend on whether
    /// banding occurred, since each band only restricts which rows are
    /// decomposed and swept, never how they're computed.
    fn render_bw(&mut self, outline: &Outline, bitmap: &mut Bitmap) -> Result<()> {
        if bitmap.format() != PixelFormat::BlackAndWhite {
            return Err(RasterError::InvalidMap);
        }
        outline.validate()?;
        if self.pool.is_none() {
            return Err(RasterError::UninitialisedObject);
        }
        let (glyph_min, glyph_max) =
            glyph_row_bounds(outline).ok_or(RasterError::InvalidOutline)?;

        let mut band_stack: Vec<(i32, i32)> = Vec::new();
        let mut y_min = glyph_min;
        let mut y_max = glyph_max;
        let mut banded = false;
        loop {
            let pool = self.pool.as_mut().unwrap();
            pool.reset();
            let mut builder = ProfileBuilder::new_banded(pool, Some((y_min, y_max)));
            let decomposed = crate::outline::decompose(outline, &mut builder);
            match decomposed {
                Err(RasterError::Overflow) => {
                    if band_stack.len() >= MAX_BAND_DEPTH {
                        log::warn!(
                            "sub-banding exhausted at depth {} for band [{y_min}, {y_max})",
                            band_stack.len()
                        );
                        return Err(RasterError::InvalidOutline);
                    }
                    let mid = y_min + (y_max - y_min) / 2;
                    if mid <= y_min {
                        log::warn!(
                            "band [{y_min}, {y_max}) is degenerate, cannot sub-band further"
                        );
                        return Err(RasterError::InvalidOutline);
                    }
                    log::debug!("pool overflowed in band [{y_min}, {y_max}); splitting at {mid}");
                    band_stack.push((mid, y_max));
                    y_max = mid;
                    banded = true;
                    continue;
                }
                Err(e) => return Err(e),
                Ok(()) => {}
            }
            match builder.finish() {
                Ok((mut profiles, turns)) => {
                    let pool = self.pool.as_ref().unwrap();
                    sweep_clamped(
                        pool,
                        &mut profiles,
                        &turns,
                        y_min,
                        y_max,
                        self.drop_out,
                        |row, x0, x1| bitmap.set_bw_span(row, x0, x1),
                    );
                }
                // A band produced by splitting may legitimately contain no
                // geometry (all of it landed in the other half); only the
                // original, unsplit band having nothing to sweep is a real
                // error.
                Err(RasterError::InvalidOutline) if banded => {}
                Err(e) => return Err(e),
            }
            match band_stack.pop() {
                Some((next_min, next_max)) => {
                    y_min = next_min;
                    y_max = next_max;
                }
                None => break,
            }
        }
        Ok(())
    }

    /// Renders `outline` into `bitmap` using the anti-aliased gray path.
    ///
    /// Requires a palette of 5 or 17 levels (set via [`Self::set_palette`]
    /// or the 5-level default); a 2-level palette has no supersampling
    /// factor and is rejected with [`RasterError::AntiAliasUnsupported`].
    fn render_gray(&mut self, outline: &Outline, bitmap: &mut Bitmap) -> Result<()> {
        if bitmap.format() != PixelFormat::Gray {
            return Err(RasterError::InvalidMap);
        }
        outline.validate()?;
        let pool = self.pool.as_mut().ok_or(RasterError::UninitialisedObject)?;
        let factor = match self.palette.len() {
            5 => FACTOR_GRAY5,
            17 => FACTOR_GRAY17,
            _ => return Err(RasterError::AntiAliasUnsupported),
        };
        let rows = gray::render_gray(
            outline,
            bitmap.width(),
            bitmap.rows(),
            factor,
            &self.palette,
            self.drop_out,
            pool,
        )?;
        let width = bitmap.width() as usize;
        for (y, row) in rows.chunks(width).enumerate() {
            bitmap.set_gray_row(y as i32, row);
        }
        Ok(())
    }

    /// Renders `outline` directly as coverage spans via `sink`, without an
    /// intermediate [`Bitmap`] — the cell-based path, clipped to
    /// `[0, clip_width)`.
    fn render_direct(
        &mut self,
        outline: &Outline,
        clip_width: i32,
        sink: &mut dyn SpanSink,
    ) -> Result<()> {
        outline.validate()?;
        let pool = self.pool.as_mut().ok_or(RasterError::UninitialisedObject)?;
        cell::render_cells(outline, clip_width, pool, sink)
    }
}
