//! Walks the y-turn list and, for each scanline, sorts the active profiles
//! by x and pairs them into filled spans — the black-and-white path.
//!
//! Grounded in `ftrast2.c`'s `Draw_Sweep`/`Vertical_Sweep_Span`: profiles
//! move from a `wait` list to a `draw` list as the sweep crosses their
//! `start_y`, the draw list is kept x-sorted, and a signed window counter
//! (incrementing on an ascending edge, decrementing on a descending one)
//! determines in-fill spans. The wait-to-draw transition is driven by each
//! profile's `count_left`, decremented once per y-turn window exactly as
//! the reference counts down to a profile's activation.

use crate::pool::RenderPool;
use crate::profile::{Orientation, Profile};

/// Drop-out control mode, selecting which thin-feature pixels are force-lit
/// when a span would otherwise round away to nothing.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub enum DropOutMode {
    #[default]
    Off,
    /// Set the rightmost pixel of an undersized span.
    Mode1,
    /// Set only spans detected as a contour "stub"; rightmost pixel.
    Mode2,
    /// Set the pixel nearest the span's midpoint.
    Mode4,
    /// Set only spans detected as a contour "stub"; midpoint pixel.
    Mode5,
}

/// One pixel coordinate (26.6 work-precision unit size, i.e. `1 << 6`).
const PIXEL: i32 = 1 << 6;

/// Sweeps a set of profiles across their shared y-turn list, calling `emit`
/// with `(row, x_start_px, x_end_px)` (end exclusive) for each filled span.
///
/// `pool` must be the same [`RenderPool`] that built `profiles`' x-offset
/// runs (see [`crate::profile::ProfileBuilder`]).
pub fn sweep(
    pool: &RenderPool,
    profiles: &mut [Profile],
    y_turns: &[i32],
    drop_out: DropOutMode,
    mut emit: impl FnMut(i32, i32, i32),
) {
    let mut wait: Vec<usize> = (0..profiles.len()).collect();
    let mut draw: Vec<usize> = Vec::new();
    for window in y_turns.windows(2) {
        let (y0, y1) = (window[0], window[1]);

        // Move any wait-list profile whose countdown has reached zero onto
        // the draw list; everything else's countdown ticks down one step,
        // to be checked again at the next turn.
        wait.retain(|&idx| {
            if profiles[idx].count_left == 0 {
                draw.push(idx);
                false
            } else {
                profiles[idx].count_left -= 1;
                true
            }
        });

        for row in y0..y1 {
            for &idx in &draw {
                let profile = &mut profiles[idx];
                let local = (row - profile.start_y) as usize;
                if let Some(&x) = profile.x_offsets(pool).get(local) {
                    profile.current_x = x;
                }
            }
            draw.sort_by_key(|&idx| profiles[idx].current_x);

            let mut window_count = 0i32;
            let mut span_start: Option<i32> = None;
            for (pos, &idx) in draw.iter().enumerate() {
                let profile = &profiles[idx];
                let delta = match profile.orientation {
                    Orientation::Ascending => 1,
                    Orientation::Descending => -1,
                };
                let before = window_count;
                window_count += delta;
                if before == 0 && window_count != 0 {
                    span_start = Some(profile.current_x);
                } else if before != 0 && window_count == 0 {
                    if let Some(x0) = span_start.take() {
                        let x1 = profile.current_x;
                        emit_span(profiles, &draw, pos, row, x0, x1, drop_out, &mut emit);
                    }
                }
            }
        }
        draw.retain(|&idx| {
            let profile = &profiles[idx];
            profile.start_y + profile.height() != y1
        });
    }
}

#[allow(clippy::too_many_arguments)]
fn emit_span(
    profiles: &[Profile],
    active: &[usize],
    right_pos: usize,
    row: i32,
    x0: i32,
    x1: i32,
    drop_out: DropOutMode,
    emit: &mut impl FnMut(i32, i32, i32),
) {
    let px0 = x0 >> 6;
    let px1 = (x1 + PIXEL - 1) >> 6; // ceil: exclusive pixel bound
    if px1 > px0 {
        emit(row, px0, px1);
        return;
    }
    if drop_out == DropOutMode::Off {
        return;
    }
    let is_stub = match drop_out {
        DropOutMode::Mode2 | DropOutMode::Mode5 => {
            let right_idx = active[right_pos];
            let left_idx = active[right_pos.saturating_sub(1)];
            profiles[left_idx].next_in_contour == Some(right_idx)
                || profiles[right_idx].next_in_contour == Some(left_idx)
        }
        _ => true,
    };
    if !is_stub {
        return;
    }
    let px = match drop_out {
        DropOutMode::Mode1 | DropOutMode::Mode2 => x0 >> 6,
        DropOutMode::Mode4 | DropOutMode::Mode5 => (x0 + x1 + 1) / 2 >> 6,
        DropOutMode::Off => unreachable!(),
    };
    emit(row, px, px + 1);
}

/// Like [`sweep`], but only calls `emit` for rows inside `[y_min, y_max)`.
///
/// The activation bookkeeping still walks the full `y_turns` list so that a
/// profile which started before `y_min` is already active on entry to the
/// band; this is what lets the driver's sub-banding retry re-run the same
/// sweep over successive row ranges and get byte-identical output to an
/// unbanded render (see the "Sub-banding equivalence" property).
pub fn sweep_clamped(
    pool: &RenderPool,
    profiles: &mut [Profile],
    y_turns: &[i32],
    y_min: i32,
    y_max: i32,
    drop_out: DropOutMode,
    mut emit: impl FnMut(i32, i32, i32),
) {
    sweep(pool, profiles, y_turns, drop_out, |row, x0, x1| {
        if row >= y_min && row < y_max {
            emit(row, x0, x1);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outline::{decompose, Outline, OutlineFlags, Tag};
    use crate::pool::{RenderPool, MIN_POOL_SIZE};
    use crate::profile::ProfileBuilder;
    use raster_types::{F26Dot6, Point};

    fn pt(x: i32, y: i32) -> Point<F26Dot6> {
        Point::new(F26Dot6::from_bits(x << 6), F26Dot6::from_bits(y << 6))
    }

    fn build(
        pool: &mut RenderPool,
        points: Vec<Point<F26Dot6>>,
        tags: Vec<Tag>,
        ends: Vec<usize>,
    ) -> (Vec<crate::profile::Profile>, Vec<i32>) {
        let outline = Outline::new(points, tags, ends, OutlineFlags::default());
        let mut builder = ProfileBuilder::new(pool);
        decompose(&outline, &mut builder).unwrap();
        builder.finish().unwrap()
    }

    #[test]
    fn square_fills_every_row_full_width() {
        let mut pool = RenderPool::new(MIN_POOL_SIZE).unwrap();
        let (mut profiles, turns) = build(
            &mut pool,
            vec![pt(0, 0), pt(16, 0), pt(16, 16), pt(0, 16)],
            vec![Tag::OnCurve; 4],
            vec![3],
        );
        let mut spans = Vec::new();
        sweep(&pool, &mut profiles, &turns, DropOutMode::Off, |y, x0, x1| {
            spans.push((y, x0, x1));
        });
        assert_eq!(spans.len(), 16);
        for (_, x0, x1) in &spans {
            assert_eq!((*x0, *x1), (0, 16));
        }
    }

    #[test]
    fn triangle_apex_is_a_single_pixel() {
        let mut pool = RenderPool::new(MIN_POOL_SIZE).unwrap();
        let (mut profiles, turns) = build(
            &mut pool,
            vec![pt(0, 0), pt(8, 16), pt(16, 0)],
            vec![Tag::OnCurve; 3],
            vec![2],
        );
        let mut spans = Vec::new();
        sweep(&pool, &mut profiles, &turns, DropOutMode::Mode2, |y, x0, x1| {
            spans.push((y, x0, x1));
        });
        let apex_row = spans.iter().find(|(y, _, _)| *y == 15).unwrap();
        assert!(apex_row.2 - apex_row.1 <= 2);
    }

    #[test]
    fn profile_activates_exactly_at_its_start_turn() {
        // A taller shape whose apex profile has a later start_y than the
        // base edges; it must contribute no spans before its own turn.
        let mut pool = RenderPool::new(MIN_POOL_SIZE).unwrap();
        let (mut profiles, turns) = build(
            &mut pool,
            vec![pt(0, 0), pt(8, 16), pt(16, 0)],
            vec![Tag::OnCurve; 3],
            vec![2],
        );
        let mut spans = Vec::new();
        sweep(&pool, &mut profiles, &turns, DropOutMode::Off, |y, x0, x1| {
            spans.push((y, x0, x1));
        });
        assert_eq!(spans.iter().map(|(y, _, _)| *y).min(), Some(0));
        assert_eq!(spans.iter().map(|(y, _, _)| *y).max(), Some(15));
    }
}
