//! Quadratic and cubic Bézier flattening: splitting an arc into y-monotonic
//! sub-arcs and, within each, into line segments short enough that a scan
//! converter can treat them as straight.
//!
//! This has no direct counterpart in `skrifa` (which hands curves straight
//! to an outline consumer and never rasterizes them itself); the splitting
//! and classification here is grounded in `ftrast2.c`'s `Bezier_Up`/
//! `Curve_To` handling, re-expressed as de Casteljau halving over an
//! explicit stack instead of recursion.

use crate::error::{RasterError, Result};
use raster_types::{F26Dot6, Point};

/// Default flattening threshold in low (26.6) work precision.
pub const PRECISION_STEP_LOW: i32 = 32;
/// Default flattening threshold in high (22.10) work precision.
pub const PRECISION_STEP_HIGH: i32 = 128;

/// Bound on recursive (stack-based) subdivision depth, for both quadratic
/// and cubic arcs.
const MAX_STACK_DEPTH: usize = 32;

/// The vertical direction of a y-monotonic arc, or `Flat` if the arc has no
/// vertical extent at all.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Monotony {
    Ascending,
    Descending,
    Flat,
}

fn classify3(y0: i32, y1: i32, y2: i32) -> Option<Monotony> {
    if y0 == y1 && y1 == y2 {
        Some(Monotony::Flat)
    } else if y0 <= y1 && y1 <= y2 {
        Some(Monotony::Ascending)
    } else if y0 >= y1 && y1 >= y2 {
        Some(Monotony::Descending)
    } else {
        None
    }
}

fn classify4(y0: i32, y1: i32, y2: i32, y3: i32) -> Option<Monotony> {
    if y0 == y1 && y1 == y2 && y2 == y3 {
        Some(Monotony::Flat)
    } else if y0 <= y1 && y1 <= y2 && y2 <= y3 {
        Some(Monotony::Ascending)
    } else if y0 >= y1 && y1 >= y2 && y2 >= y3 {
        Some(Monotony::Descending)
    } else {
        None
    }
}

/// Classifies a quadratic arc's vertical monotony without splitting.
///
/// Returns `None` when the arc is not already y-monotone and must be split
/// before it can be classified (see [`split_quad`]).
pub fn classify_quad(p0: Point<F26Dot6>, p1: Point<F26Dot6>, p2: Point<F26Dot6>) -> Option<Monotony> {
    classify3(p0.y.to_bits(), p1.y.to_bits(), p2.y.to_bits())
}

/// Classifies a cubic arc's vertical monotony without splitting.
pub fn classify_cubic(
    p0: Point<F26Dot6>,
    p1: Point<F26Dot6>,
    p2: Point<F26Dot6>,
    p3: Point<F26Dot6>,
) -> Option<Monotony> {
    classify4(
        p0.y.to_bits(),
        p1.y.to_bits(),
        p2.y.to_bits(),
        p3.y.to_bits(),
    )
}

fn mid(a: Point<F26Dot6>, b: Point<F26Dot6>) -> Point<F26Dot6> {
    Point::new(
        F26Dot6::from_bits((a.x.to_bits() + b.x.to_bits() + 1) >> 1),
        F26Dot6::from_bits((a.y.to_bits() + b.y.to_bits() + 1) >> 1),
    )
}

/// Splits a quadratic arc at `t = 1/2` via de Casteljau's algorithm, into
/// two sub-arcs that share their joint point.
///
/// Returns `(left, right)`, each a 3-point control array.
pub fn split_quad(p: [Point<F26Dot6>; 3]) -> ([Point<F26Dot6>; 3], [Point<F26Dot6>; 3]) {
    let p01 = mid(p[0], p[1]);
    let p12 = mid(p[1], p[2]);
    let joint = mid(p01, p12);
    ([p[0], p01, joint], [joint, p12, p[2]])
}

/// Splits a cubic arc at `t = 1/2` via de Casteljau's algorithm.
pub fn split_cubic(p: [Point<F26Dot6>; 4]) -> ([Point<F26Dot6>; 4], [Point<F26Dot6>; 4]) {
    let p01 = mid(p[0], p[1]);
    let p12 = mid(p[1], p[2]);
    let p23 = mid(p[2], p[3]);
    let p012 = mid(p01, p12);
    let p123 = mid(p12, p23);
    let joint = mid(p012, p123);
    ([p[0], p01, p012, joint], [joint, p123, p23, p[3]])
}

/// Vertical extent (max y − min y) of a quadratic's control points, in raw
/// fixed-point bits. Used to decide whether an arc is flat enough to emit as
/// a single line.
fn quad_height(p: [Point<F26Dot6>; 3]) -> i32 {
    let ys = [p[0].y.to_bits(), p[1].y.to_bits(), p[2].y.to_bits()];
    ys.iter().max().unwrap() - ys.iter().min().unwrap()
}

fn cubic_height(p: [Point<F26Dot6>; 4]) -> i32 {
    let ys = [
        p[0].y.to_bits(),
        p[1].y.to_bits(),
        p[2].y.to_bits(),
        p[3].y.to_bits(),
    ];
    ys.iter().max().unwrap() - ys.iter().min().unwrap()
}

/// Computes a dynamic flattening threshold for a quadratic from its control
/// point spread, tighter than [`PRECISION_STEP_LOW`] for nearly-flat arcs.
///
/// The second difference `p0 - 2p1 + p2` measures how far the control point
/// bows away from the chord; a small second difference permits a looser
/// (larger) threshold without losing visual accuracy.
pub fn dynamic_threshold_quad(p: [Point<F26Dot6>; 3], base: i32) -> i32 {
    let dx = (p[0].x.to_bits() - 2 * p[1].x.to_bits() + p[2].x.to_bits()).unsigned_abs() as i32;
    let dy = (p[0].y.to_bits() - 2 * p[1].y.to_bits() + p[2].y.to_bits()).unsigned_abs() as i32;
    let second_diff = dx.max(dy);
    if second_diff == 0 {
        base * 4
    } else {
        (base * base / second_diff.max(1)).clamp(base / 4, base * 4)
    }
}

/// Computes a dynamic flattening threshold for a cubic from its second- and
/// third-order differences.
pub fn dynamic_threshold_cubic(p: [Point<F26Dot6>; 4], base: i32) -> i32 {
    let d2x = (p[0].x.to_bits() - 2 * p[1].x.to_bits() + p[2].x.to_bits()).unsigned_abs() as i32;
    let d2y = (p[0].y.to_bits() - 2 * p[1].y.to_bits() + p[2].y.to_bits()).unsigned_abs() as i32;
    let d3x = (p[3].x.to_bits() - 3 * p[2].x.to_bits() + 3 * p[1].x.to_bits() - p[0].x.to_bits())
        .unsigned_abs() as i32;
    let d3y = (p[3].y.to_bits() - 3 * p[2].y.to_bits() + 3 * p[1].y.to_bits() - p[0].y.to_bits())
        .unsigned_abs() as i32;
    let diff = d2x.max(d2y).max(d3x).max(d3y);
    if diff == 0 {
        base * 4
    } else {
        (base * base / diff.max(1)).clamp(base / 4, base * 4)
    }
}

/// Flattens a quadratic arc into line segments, calling `emit` with the
/// endpoint of each segment (the start point `p0` is assumed already current
/// and is never itself emitted).
///
/// Uses an explicit stack bounded to [`MAX_STACK_DEPTH`] entries rather than
/// recursion; an arc still too tall to flatten at the bottom of the stack is
/// force-emitted as a single segment rather than erroring, since 32 levels
/// of halving already reduces any representable 26.6 coordinate span below a
/// single sub-pixel unit.
pub fn flatten_quad(
    p0: Point<F26Dot6>,
    p1: Point<F26Dot6>,
    p2: Point<F26Dot6>,
    threshold: i32,
    emit: &mut impl FnMut(Point<F26Dot6>),
) -> Result<()> {
    let mut stack: [[Point<F26Dot6>; 3]; MAX_STACK_DEPTH] = [[p0, p1, p2]; MAX_STACK_DEPTH];
    let mut depth = 1usize;
    stack[0] = [p0, p1, p2];
    while depth > 0 {
        let arc = stack[depth - 1];
        let flat = classify3(arc[0].y.to_bits(), arc[1].y.to_bits(), arc[2].y.to_bits());
        let height = quad_height(arc);
        if height <= threshold || flat == Some(Monotony::Flat) || depth == MAX_STACK_DEPTH {
            emit(arc[2]);
            depth -= 1;
        } else {
            let (left, right) = split_quad(arc);
            stack[depth - 1] = right;
            if depth == MAX_STACK_DEPTH {
                // No room to push; approximate this level as one segment.
                emit(arc[2]);
                depth -= 1;
            } else {
                stack[depth] = left;
                depth += 1;
            }
        }
    }
    Ok(())
}

/// Flattens a cubic arc into line segments; see [`flatten_quad`] for the
/// stack discipline.
pub fn flatten_cubic(
    p0: Point<F26Dot6>,
    p1: Point<F26Dot6>,
    p2: Point<F26Dot6>,
    p3: Point<F26Dot6>,
    threshold: i32,
    emit: &mut impl FnMut(Point<F26Dot6>),
) -> Result<()> {
    let mut stack: [[Point<F26Dot6>; 4]; MAX_STACK_DEPTH] = [[p0, p1, p2, p3]; MAX_STACK_DEPTH];
    let mut depth = 1usize;
    stack[0] = [p0, p1, p2, p3];
    while depth > 0 {
        let arc = stack[depth - 1];
        let flat = classify4(
            arc[0].y.to_bits(),
            arc[1].y.to_bits(),
            arc[2].y.to_bits(),
            arc[3].y.to_bits(),
        );
        let height = cubic_height(arc);
        if height <= threshold || flat == Some(Monotony::Flat) || depth == MAX_STACK_DEPTH {
            emit(arc[3]);
            depth -= 1;
        } else {
            let (left, right) = split_cubic(arc);
            stack[depth - 1] = right;
            if depth == MAX_STACK_DEPTH {
                emit(arc[3]);
                depth -= 1;
            } else {
                stack[depth] = left;
                depth += 1;
            }
        }
    }
    Ok(())
}

/// Splits a quadratic arc into y-monotonic sub-arcs, calling `on_monotone`
/// with each sub-arc and its direction. Flat sub-arcs (zero vertical extent)
/// are discarded, matching the reference rasterizer's treatment of
/// horizontal features in the vertical sweep.
pub fn monotonize_quad(
    p0: Point<F26Dot6>,
    p1: Point<F26Dot6>,
    p2: Point<F26Dot6>,
    on_monotone: &mut impl FnMut(Monotony, [Point<F26Dot6>; 3]) -> Result<()>,
) -> Result<()> {
    let mut stack: [[Point<F26Dot6>; 3]; MAX_STACK_DEPTH] = [[p0, p1, p2]; MAX_STACK_DEPTH];
    let mut depth = 1usize;
    stack[0] = [p0, p1, p2];
    while depth > 0 {
        let arc = stack[depth - 1];
        depth -= 1;
        match classify3(arc[0].y.to_bits(), arc[1].y.to_bits(), arc[2].y.to_bits()) {
            Some(Monotony::Flat) => {}
            Some(dir) => on_monotone(dir, arc)?,
            None => {
                if depth + 2 > MAX_STACK_DEPTH {
                    return Err(RasterError::InvalidOutline);
                }
                let (left, right) = split_quad(arc);
                stack[depth] = right;
                stack[depth + 1] = left;
                depth += 2;
            }
        }
    }
    Ok(())
}

/// Splits a cubic arc into y-monotonic sub-arcs; see [`monotonize_quad`].
pub fn monotonize_cubic(
    p0: Point<F26Dot6>,
    p1: Point<F26Dot6>,
    p2: Point<F26Dot6>,
    p3: Point<F26Dot6>,
    on_monotone: &mut impl FnMut(Monotony, [Point<F26Dot6>; 4]) -> Result<()>,
) -> Result<()> {
    let mut stack: [[Point<F26Dot6>; 4]; MAX_STACK_DEPTH] = [[p0, p1, p2, p3]; MAX_STACK_DEPTH];
    let mut depth = 1usize;
    stack[0] = [p0, p1, p2, p3];
    while depth > 0 {
        let arc = stack[depth - 1];
        depth -= 1;
        match classify4(
            arc[0].y.to_bits(),
            arc[1].y.to_bits(),
            arc[2].y.to_bits(),
            arc[3].y.to_bits(),
        ) {
            Some(Monotony::Flat) => {}
            Some(dir) => on_monotone(dir, arc)?,
            None => {
                if depth + 2 > MAX_STACK_DEPTH {
                    return Err(RasterError::InvalidOutline);
                }
                let (left, right) = split_cubic(arc);
                stack[depth] = right;
                stack[depth + 1] = left;
                depth += 2;
            }
        }
    }
    Ok(())
}
