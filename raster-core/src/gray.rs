//! Anti-aliased gray output, built by resampling the black-and-white sweep
//! at 2× or 4× resolution and reducing each pixel's sub-samples through a
//! population-count table.
//!
//! Grounded in `ftgrays2.c`'s accumulator/`count_table` pair, simplified to
//! operate on explicit bitplanes instead of packed platform words (see the
//! "Endianness" design note: this emits per-byte rather than reading
//! multi-byte words at unknown alignment).

use crate::error::Result;
use crate::outline::Outline;
use crate::pool::RenderPool;
use crate::profile::ProfileBuilder;
use crate::sweep::{sweep, DropOutMode};
use raster_types::{F26Dot6, Point};

/// Vertical+horizontal supersampling factor for 5-level gray output (2×2
/// sub-pixel cells, per the reference accumulator layout).
pub const FACTOR_GRAY5: i32 = 2;
/// Supersampling factor for 17-level gray output (4×4 sub-pixel cells).
pub const FACTOR_GRAY17: i32 = 4;

/// Builds the 256-entry population-count table: `table[byte]` is the number
/// of set bits in `byte`. Rebuilt whenever the palette (and thus the
/// sub-sample factor) changes, per the driver's `set_palette`.
pub fn population_count_table() -> [u8; 256] {
    let mut table = [0u8; 256];
    for (byte, entry) in table.iter_mut().enumerate() {
        *entry = byte.count_ones() as u8;
    }
    table
}

/// A palette of 2, 5 or 17 output byte levels, index 0 background and the
/// last index full foreground coverage.
#[derive(Clone, Debug)]
pub struct GrayPalette {
    levels: Vec<u8>,
}

impl GrayPalette {
    /// Creates a palette. `levels.len()` must be 2, 5 or 17; the caller
    /// ([`crate::driver::RasterDriver::set_palette`]) is responsible for
    /// rejecting other counts with [`crate::error::RasterError::BadPaletteCount`].
    pub fn new(levels: Vec<u8>) -> Self {
        Self { levels }
    }

    pub fn default_for_factor(factor: i32) -> Self {
        let count = (factor * factor + 1) as usize;
        let levels = (0..count)
            .map(|i| (i * 255 / (count - 1)) as u8)
            .collect();
        Self { levels }
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn lookup(&self, coverage_count: usize) -> u8 {
        self.levels[coverage_count.min(self.levels.len() - 1)]
    }
}

fn scale_outline(outline: &Outline, factor: i32) -> Outline {
    let scaled_points: Vec<Point<F26Dot6>> = outline
        .points()
        .iter()
        .map(|p| {
            Point::new(
                F26Dot6::from_bits(p.x.to_bits() * factor),
                F26Dot6::from_bits(p.y.to_bits() * factor),
            )
        })
        .collect();
    Outline::new(
        scaled_points,
        outline.tags().to_vec(),
        outline.contour_ends().to_vec(),
        outline.flags(),
    )
}

/// Renders `outline` (in unscaled 26.6 pixel coordinates) into a gray-level
/// byte buffer of `width * height` bytes, row-major, using `palette` (which
/// must have `factor * factor + 1` entries).
///
/// Profile x-offset storage is bump-allocated from `pool`, exactly as the
/// black-and-white path does.
pub fn render_gray(
    outline: &Outline,
    width: i32,
    height: i32,
    factor: i32,
    palette: &GrayPalette,
    drop_out: DropOutMode,
    pool: &mut RenderPool,
) -> Result<Vec<u8>> {
    let scaled = scale_outline(outline, factor);
    let mut builder = ProfileBuilder::new(pool);
    crate::outline::decompose(&scaled, &mut builder)?;
    let (mut profiles, turns) = builder.finish()?;

    let sub_w = (width * factor) as usize;
    let sub_h = (height * factor) as usize;
    let mut bits = vec![false; sub_w * sub_h];
    sweep(pool, &mut profiles, &turns, drop_out, |row, x0, x1| {
        if row < 0 || row as usize >= sub_h {
            return;
        }
        let x0 = x0.clamp(0, sub_w as i32) as usize;
        let x1 = x1.clamp(0, sub_w as i32) as usize;
        let base = row as usize * sub_w;
        for bit in bits[base + x0..base + x1].iter_mut() {
            *bit = true;
        }
    });

    let popcount = population_count_table();
    let mut out = vec![0u8; (width * height) as usize];
    for py in 0..height {
        for px in 0..width {
            let mut coverage = 0usize;
            for sub_row in 0..factor {
                let row = (py * factor + sub_row) as usize;
                let mut byte = 0u8;
                for sub_col in 0..factor {
                    let col = (px * factor + sub_col) as usize;
                    if bits[row * sub_w + col] {
                        byte |= 1 << sub_col;
                    }
                }
                coverage += popcount[byte as usize] as usize;
            }
            out[(py * width + px) as usize] = palette.lookup(coverage);
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outline::{Outline, OutlineFlags, Tag};
    use crate::pool::MIN_POOL_SIZE;

    fn pt(x: i32, y: i32) -> Point<F26Dot6> {
        Point::new(F26Dot6::from_bits(x << 6), F26Dot6::from_bits(y << 6))
    }

    #[test]
    fn population_table_matches_count_ones() {
        let table = population_count_table();
        assert_eq!(table[0], 0);
        assert_eq!(table[0xFF], 8);
        assert_eq!(table[0b1010_1010], 4);
    }

    #[test]
    fn palette_idempotent_and_monotone() {
        let palette = GrayPalette::default_for_factor(FACTOR_GRAY5);
        assert_eq!(palette.len(), 5);
        assert_eq!(palette.lookup(0), 0);
        assert_eq!(palette.lookup(4), 255);
    }

    #[test]
    fn solid_square_is_full_coverage_everywhere() {
        let outline = Outline::new(
            vec![pt(0, 0), pt(8, 0), pt(8, 8), pt(0, 8)],
            vec![Tag::OnCurve; 4],
            vec![3],
            OutlineFlags::default(),
        );
        let palette = GrayPalette::default_for_factor(FACTOR_GRAY5);
        let mut pool = crate::pool::RenderPool::new(MIN_POOL_SIZE).unwrap();
        let out =
            render_gray(&outline, 8, 8, FACTOR_GRAY5, &palette, DropOutMode::Off, &mut pool)
                .unwrap();
        assert!(out.iter().all(|&b| b == 255));
    }

    #[test]
    fn triangle_apex_row_is_partially_covered() {
        let outline = Outline::new(
            vec![pt(0, 0), pt(8, 16), pt(16, 0)],
            vec![Tag::OnCurve; 3],
            vec![2],
            OutlineFlags::default(),
        );
        let palette = GrayPalette::default_for_factor(FACTOR_GRAY17);
        let mut pool = crate::pool::RenderPool::new(MIN_POOL_SIZE).unwrap();
        let out = render_gray(
            &outline,
            16,
            16,
            FACTOR_GRAY17,
            &palette,
            DropOutMode::Off,
            &mut pool,
        )
        .unwrap();
        let apex_row = &out[15 * 16..16 * 16];
        assert!(apex_row.iter().any(|&b| b > 0 && b < 255));
    }
}
