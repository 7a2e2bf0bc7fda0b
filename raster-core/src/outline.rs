//! The input outline and the walker that decomposes it into move/line/conic/
//! cubic events.
//!
//! This corresponds to `FT_Outline` and `FT_Outline_Decompose` in the
//! reference rasterizer, and plays the same role that
//! [`skrifa::outline::path::to_path`] plays for font-table outlines: taking
//! a parallel points/tags/contour-ends triple and turning it into a series
//! of drawing commands. The difference is the sink here receives
//! [`raster_types::F26Dot6`] points rather than `f32` ones, since the
//! rasterizer consumes coordinates before they are converted to a display
//! path.

use crate::error::{RasterError, Result};
use raster_types::{F26Dot6, Point};

/// Tag of a single outline point.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Tag {
    /// An on-curve (anchor) point.
    OnCurve,
    /// A quadratic (conic) Bézier control point.
    QuadraticControl,
    /// A cubic Bézier control point.
    CubicControl,
}

/// Flags that affect how an outline is filled and rendered.
#[derive(Copy, Clone, PartialEq, Eq, Default, Debug)]
pub struct OutlineFlags {
    /// Only run the vertical sweep; skip the horizontal sub-pass.
    pub single_pass: bool,
    /// Use 22.10 work precision instead of the default 26.6.
    pub high_precision: bool,
    /// Reverse the fill direction (PostScript-style, as opposed to
    /// TrueType's default winding).
    pub reverse_fill: bool,
}

/// A vector glyph outline: points, tags and contour boundaries.
///
/// Invariants (checked by [`Outline::validate`], not by the constructors):
/// a contour never begins with a cubic control; two successive quadratic
/// controls imply an on-curve point at their midpoint; two successive cubic
/// controls must be followed by an on-curve point or the contour's start.
#[derive(Clone, Debug)]
pub struct Outline {
    points: Vec<Point<F26Dot6>>,
    tags: Vec<Tag>,
    contour_ends: Vec<usize>,
    flags: OutlineFlags,
}

impl Outline {
    /// Creates a new outline from parallel points/tags and contour end
    /// indices (inclusive, into `points`).
    pub fn new(
        points: Vec<Point<F26Dot6>>,
        tags: Vec<Tag>,
        contour_ends: Vec<usize>,
        flags: OutlineFlags,
    ) -> Self {
        Self {
            points,
            tags,
            contour_ends,
            flags,
        }
    }

    pub fn points(&self) -> &[Point<F26Dot6>] {
        &self.points
    }

    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    pub fn contour_ends(&self) -> &[usize] {
        &self.contour_ends
    }

    pub fn flags(&self) -> OutlineFlags {
        self.flags
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty() || self.contour_ends.is_empty()
    }

    /// Validates structural invariants that do not depend on tag sequencing
    /// (that part is caught incrementally by [`decompose`] instead, which
    /// needs to walk the points anyway).
    pub fn validate(&self) -> Result<()> {
        if self.points.is_empty() || self.contour_ends.is_empty() {
            return Err(RasterError::InvalidOutline);
        }
        if self.points.len() != self.tags.len() {
            return Err(RasterError::InvalidOutline);
        }
        if *self.contour_ends.last().unwrap() + 1 != self.points.len() {
            return Err(RasterError::InvalidOutline);
        }
        let mut prev_end: isize = -1;
        for &end in &self.contour_ends {
            if (end as isize) <= prev_end {
                return Err(RasterError::InvalidOutline);
            }
            prev_end = end as isize;
        }
        Ok(())
    }
}

/// Receives decomposition events from [`decompose`].
///
/// Roughly equivalent to `FT_Outline_Funcs` in the reference rasterizer and
/// to [`skrifa::outline::pen::OutlinePen`] for font-table outlines, except
/// the points here stay in work-precision fixed point rather than being
/// converted to `f32`.
pub trait OutlineSink {
    /// Begin a new contour at `p`.
    fn move_to(&mut self, p: Point<F26Dot6>) -> Result<()>;
    /// Draw a line from the current point to `p`.
    fn line_to(&mut self, p: Point<F26Dot6>) -> Result<()>;
    /// Draw a quadratic arc from the current point through control `c` to
    /// `p`.
    fn conic_to(&mut self, c: Point<F26Dot6>, p: Point<F26Dot6>) -> Result<()>;
    /// Draw a cubic arc from the current point through controls `c1`, `c2`
    /// to `p`.
    fn cubic_to(&mut self, c1: Point<F26Dot6>, c2: Point<F26Dot6>, p: Point<F26Dot6>) -> Result<()>;
}

fn point_midpoint(a: Point<F26Dot6>, b: Point<F26Dot6>) -> Point<F26Dot6> {
    Point::new(
        F26Dot6::from_bits((a.x.to_bits() + b.x.to_bits()) / 2),
        F26Dot6::from_bits((a.y.to_bits() + b.y.to_bits()) / 2),
    )
}

/// Decomposes every contour of `outline` into `move_to`/`line_to`/
/// `conic_to`/`cubic_to` events on `sink`, in contour order.
///
/// Fails with [`RasterError::InvalidOutline`] if a contour starts with a
/// cubic control point, or if a cubic control point isn't followed by
/// another cubic control point and then an on-curve (or the implicit
/// contour-closing point).
pub fn decompose(outline: &Outline, sink: &mut impl OutlineSink) -> Result<()> {
    outline.validate()?;
    let points = outline.points();
    let tags = outline.tags();
    let mut start_ix = 0usize;
    for &end_ix in outline.contour_ends() {
        decompose_contour(&points[start_ix..=end_ix], &tags[start_ix..=end_ix], sink)?;
        start_ix = end_ix + 1;
    }
    Ok(())
}

fn decompose_contour(
    points: &[Point<F26Dot6>],
    tags: &[Tag],
    sink: &mut impl OutlineSink,
) -> Result<()> {
    if points.is_empty() {
        return Ok(());
    }
    let n = points.len();
    let first = points[0];
    let last = points[n - 1];
    let first_tag = tags[0];
    let last_tag = tags[n - 1];

    if first_tag == Tag::CubicControl {
        return Err(RasterError::InvalidOutline);
    }

    // Resolve the starting on-curve point and the index of the first point
    // that still needs to be consumed.
    let (start, mut cursor) = match first_tag {
        Tag::OnCurve => (first, 1),
        Tag::QuadraticControl => {
            if last_tag == Tag::OnCurve {
                (last, 0) // last point consumed as the start; don't revisit it
            } else {
                (point_midpoint(first, last), 0)
            }
        }
        Tag::CubicControl => unreachable!("checked above"),
    };
    sink.move_to(start)?;

    // When we started from `last`, the contour body is points[0..n-1] (the
    // final point was already used as the start and must not be replayed).
    let body_end = if first_tag == Tag::QuadraticControl && last_tag == Tag::OnCurve {
        n - 1
    } else {
        n
    };

    let mut pending = Pending::Empty;
    while cursor < body_end {
        pending.feed(points[cursor], tags[cursor], sink)?;
        cursor += 1;
    }
    // Close the contour back to `start`.
    pending.finish(start, sink)?;
    Ok(())
}

/// Accumulates control points between two on-curve points so that a run of
/// quadratics or cubics can be emitted as soon as the next on-curve (or
/// closing) point is known.
enum Pending {
    Empty,
    Quad(Point<F26Dot6>),
    Cubic1(Point<F26Dot6>),
    Cubic2(Point<F26Dot6>, Point<F26Dot6>),
}

impl Pending {
    fn feed(
        &mut self,
        p: Point<F26Dot6>,
        tag: Tag,
        sink: &mut impl OutlineSink,
    ) -> Result<()> {
        match (&*self, tag) {
            (Pending::Empty, Tag::OnCurve) => sink.line_to(p)?,
            (Pending::Empty, Tag::QuadraticControl) => *self = Pending::Quad(p),
            (Pending::Empty, Tag::CubicControl) => *self = Pending::Cubic1(p),
            (Pending::Quad(c), Tag::QuadraticControl) => {
                let mid = point_midpoint(*c, p);
                sink.conic_to(*c, mid)?;
                *self = Pending::Quad(p);
            }
            (Pending::Quad(c), Tag::OnCurve) => {
                sink.conic_to(*c, p)?;
                *self = Pending::Empty;
            }
            (Pending::Quad(_), Tag::CubicControl) => return Err(RasterError::InvalidOutline),
            (Pending::Cubic1(c1), Tag::CubicControl) => *self = Pending::Cubic2(*c1, p),
            (Pending::Cubic1(_), _) => return Err(RasterError::InvalidOutline),
            // The reference decomposer never inspects the tag of the point
            // following a cubic pair: it advances past the pair and passes
            // whatever point comes next straight to `cubic_to` as the
            // endpoint, on-curve or not. A third cubic control in a row is
            // therefore consumed as that endpoint verbatim, not folded into
            // a synthesized midpoint or treated as a fresh pair.
            (Pending::Cubic2(c1, c2), _) => {
                sink.cubic_to(*c1, *c2, p)?;
                *self = Pending::Empty;
            }
        }
        Ok(())
    }

    fn finish(self, start: Point<F26Dot6>, sink: &mut impl OutlineSink) -> Result<()> {
        match self {
            Pending::Empty => sink.line_to(start)?,
            Pending::Quad(c) => sink.conic_to(c, start)?,
            Pending::Cubic1(_) => return Err(RasterError::InvalidOutline),
            Pending::Cubic2(c1, c2) => sink.cubic_to(c1, c2, start)?,
        }
        Ok(())
    }
}
