//! Concrete end-to-end scenarios driving the public API, one per scanline
//! conversion case the engine is expected to handle.

use raster_core::{
    Bitmap, DropOutMode, GrayPalette, PixelFormat, RasterDriver, RasterError, RasterParams,
    RenderFlags, RenderTarget,
};
use raster_types::{F26Dot6, Point};

fn pt(x: i32, y: i32) -> Point<F26Dot6> {
    Point::new(F26Dot6::from_bits(x << 6), F26Dot6::from_bits(y << 6))
}

fn driver() -> RasterDriver {
    let mut d = RasterDriver::new();
    d.reset(4096).unwrap();
    d
}

fn render_bw(d: &mut RasterDriver, outline: &raster_core::Outline, bitmap: &mut Bitmap) -> raster_core::Result<()> {
    d.render(RasterParams {
        outline,
        target: RenderTarget::Bitmap(bitmap),
        flags: RenderFlags::default(),
    })
}

fn render_gray(d: &mut RasterDriver, outline: &raster_core::Outline, bitmap: &mut Bitmap) -> raster_core::Result<()> {
    d.render(RasterParams {
        outline,
        target: RenderTarget::Bitmap(bitmap),
        flags: RenderFlags { aa: true, direct: false },
    })
}

#[test]
fn square_fills_full_width_every_row() {
    let outline = raster_core::Outline::new(
        vec![pt(0, 0), pt(16, 0), pt(16, 16), pt(0, 16)],
        vec![raster_core::Tag::OnCurve; 4],
        vec![3],
        raster_core::OutlineFlags::default(),
    );
    let mut d = driver();
    d.set_drop_out_mode(DropOutMode::Mode2);
    let mut bitmap = Bitmap::new(16, 16, PixelFormat::BlackAndWhite).unwrap();
    render_bw(&mut d, &outline, &mut bitmap).unwrap();
    assert_eq!(bitmap.buffer(), vec![0xFFu8; 32]);
}

#[test]
fn triangle_apex_row_is_partially_lit_in_gray5() {
    let outline = raster_core::Outline::new(
        vec![pt(0, 0), pt(8, 16), pt(16, 0)],
        vec![raster_core::Tag::OnCurve; 3],
        vec![2],
        raster_core::OutlineFlags::default(),
    );
    let mut d = driver();
    d.set_palette(vec![0, 64, 128, 192, 255]).unwrap();
    let mut bitmap = Bitmap::new(16, 16, PixelFormat::Gray).unwrap();
    render_gray(&mut d, &outline, &mut bitmap).unwrap();
    let row15 = &bitmap.buffer()[15 * 16..16 * 16];
    assert!(row15.iter().any(|&b| matches!(b, 64 | 128 | 192)));
}

#[test]
fn degenerate_single_point_contour_is_invalid() {
    let outline = raster_core::Outline::new(
        vec![pt(5, 5)],
        vec![raster_core::Tag::OnCurve],
        vec![0],
        raster_core::OutlineFlags::default(),
    );
    let mut d = driver();
    let mut bitmap = Bitmap::new(8, 8, PixelFormat::BlackAndWhite).unwrap();
    assert_eq!(
        render_bw(&mut d, &outline, &mut bitmap).unwrap_err(),
        RasterError::InvalidOutline
    );
}

#[test]
fn open_outline_is_invalid() {
    // contour_ends says the contour closes at index 2, but there are 4
    // points: n_points != contour_ends.last() + 1.
    let outline = raster_core::Outline::new(
        vec![pt(0, 0), pt(4, 0), pt(4, 4), pt(0, 4)],
        vec![raster_core::Tag::OnCurve; 4],
        vec![2],
        raster_core::OutlineFlags::default(),
    );
    assert_eq!(outline.validate().unwrap_err(), RasterError::InvalidOutline);
}

fn circle_outline(radius: i32, cx: i32, cy: i32) -> raster_core::Outline {
    // Four quadratics approximating a circle, the reference kappa
    // construction for a 90-degree arc (k ~= 0.5523).
    let k = (radius as f64 * 0.5523) as i32;
    let pts = vec![
        pt(cx + radius, cy),
        pt(cx + radius, cy + k),
        pt(cx + k, cy + radius),
        pt(cx, cy + radius),
        pt(cx - k, cy + radius),
        pt(cx - radius, cy + k),
        pt(cx - radius, cy),
        pt(cx - radius, cy - k),
        pt(cx - k, cy - radius),
        pt(cx, cy - radius),
        pt(cx + k, cy - radius),
        pt(cx + radius, cy - k),
    ];
    let tags = vec![
        raster_core::Tag::OnCurve,
        raster_core::Tag::QuadraticControl,
        raster_core::Tag::OnCurve,
        raster_core::Tag::OnCurve,
        raster_core::Tag::QuadraticControl,
        raster_core::Tag::OnCurve,
        raster_core::Tag::OnCurve,
        raster_core::Tag::QuadraticControl,
        raster_core::Tag::OnCurve,
        raster_core::Tag::OnCurve,
        raster_core::Tag::QuadraticControl,
        raster_core::Tag::OnCurve,
    ];
    raster_core::Outline::new(pts, tags, vec![11], raster_core::OutlineFlags::default())
}

#[test]
fn circle_produces_a_closed_ring() {
    let outline = circle_outline(32, 32, 32);
    let mut d = driver();
    d.set_drop_out_mode(DropOutMode::Mode2);
    let mut bitmap = Bitmap::new(64, 64, PixelFormat::BlackAndWhite).unwrap();
    render_bw(&mut d, &outline, &mut bitmap).unwrap();

    // every scanline through the circle's vertical extent has at least one
    // lit pixel (the ring is closed, not broken by drop-out).
    for y in 2..62 {
        let base = (y * bitmap.pitch()) as usize;
        let row = &bitmap.buffer()[base..base + bitmap.pitch() as usize];
        assert!(
            row.iter().any(|&b| b != 0),
            "row {y} has no lit pixels"
        );
    }
}

#[test]
fn tiny_pool_forces_sub_banding_but_still_succeeds() {
    let outline = raster_core::Outline::new(
        vec![pt(0, 0), pt(64, 0), pt(64, 64), pt(0, 64)],
        vec![raster_core::Tag::OnCurve; 4],
        vec![3],
        raster_core::OutlineFlags::default(),
    );
    let mut d = RasterDriver::new();
    d.reset(4096).unwrap(); // exactly the minimum pool size
    let mut bitmap = Bitmap::new(64, 64, PixelFormat::BlackAndWhite).unwrap();
    render_bw(&mut d, &outline, &mut bitmap).unwrap();
    assert!(bitmap.buffer().iter().all(|&b| b == 0xFF));
}

#[test]
fn palette_application_is_idempotent() {
    let outline = raster_core::Outline::new(
        vec![pt(0, 0), pt(8, 0), pt(8, 8), pt(0, 8)],
        vec![raster_core::Tag::OnCurve; 4],
        vec![3],
        raster_core::OutlineFlags::default(),
    );
    let levels = vec![0u8, 64, 128, 192, 255];

    let mut first = driver();
    first.set_palette(levels.clone()).unwrap();
    let mut first_bmp = Bitmap::new(8, 8, PixelFormat::Gray).unwrap();
    render_gray(&mut first, &outline, &mut first_bmp).unwrap();

    let mut second = driver();
    second.set_palette(levels.clone()).unwrap();
    second.set_palette(levels).unwrap(); // applied twice
    let mut second_bmp = Bitmap::new(8, 8, PixelFormat::Gray).unwrap();
    render_gray(&mut second, &outline, &mut second_bmp).unwrap();

    assert_eq!(first_bmp.buffer(), second_bmp.buffer());
}

#[test]
fn same_pool_and_outline_render_bit_identically_twice() {
    let outline = raster_core::Outline::new(
        vec![pt(0, 0), pt(13, 0), pt(13, 9), pt(0, 9)],
        vec![raster_core::Tag::OnCurve; 4],
        vec![3],
        raster_core::OutlineFlags::default(),
    );
    let mut first_out = Vec::new();
    let mut second_out = Vec::new();
    for out in [&mut first_out, &mut second_out] {
        let mut d = driver();
        let mut bitmap = Bitmap::new(13, 9, PixelFormat::BlackAndWhite).unwrap();
        render_bw(&mut d, &outline, &mut bitmap).unwrap();
        out.extend_from_slice(bitmap.buffer());
    }
    assert_eq!(first_out, second_out);
}

#[test]
fn unreset_driver_reports_uninitialised() {
    let outline = raster_core::Outline::new(
        vec![pt(0, 0), pt(4, 0), pt(4, 4), pt(0, 4)],
        vec![raster_core::Tag::OnCurve; 4],
        vec![3],
        raster_core::OutlineFlags::default(),
    );
    let mut d = RasterDriver::new();
    let mut bitmap = Bitmap::new(4, 4, PixelFormat::BlackAndWhite).unwrap();
    assert_eq!(
        render_bw(&mut d, &outline, &mut bitmap).unwrap_err(),
        RasterError::UninitialisedObject
    );
}

#[test]
fn bad_palette_count_is_rejected() {
    let mut d = driver();
    assert_eq!(
        d.set_palette(vec![0, 1, 2]).unwrap_err(),
        RasterError::BadPaletteCount
    );
}

#[test]
fn default_gray_palette_has_five_levels() {
    let palette = GrayPalette::default_for_factor(2);
    assert_eq!(palette.len(), 5);
}
