//! Error types returned by the rasterizer.

use core::fmt;

/// Errors that may occur while rendering an outline.
///
/// These correspond one-to-one with the ten historical numeric error codes
/// of the C rasterizer this crate's algorithms are modeled on; [`as_code`]
/// recovers that numeric value for callers bridging to that contract (for
/// example an FFI shim living outside this crate). The idiomatic surface is
/// always `Result<T, RasterError>`, never the bare integer.
///
/// [`as_code`]: RasterError::as_code
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum RasterError {
    /// `reset` was never called, or was called with an empty pool.
    UninitialisedObject,
    /// The render pool ran out of space for the current band. Recovered
    /// internally by sub-banding; only escapes when the band stack is
    /// exhausted (see [`RasterError::InvalidOutline`]).
    Overflow,
    /// A profile or band computed a negative scanline height.
    NegativeHeight,
    /// The outline is malformed: a contour starts with a cubic control
    /// point, a cubic control isn't followed by another cubic, contour end
    /// indices disagree with the point count, zero y-turns were produced,
    /// or sub-banding exhausted its stack before the band fit in the pool.
    InvalidOutline,
    /// The target bitmap is malformed (zero width, pitch too small for the
    /// requested width, or a null buffer).
    InvalidMap,
    /// Anti-aliased rendering was requested from a path that does not
    /// support it.
    AntiAliasUnsupported,
    /// The render pool is smaller than the required minimum (4 KiB) or not
    /// a multiple of 8 bytes.
    InvalidPool,
    /// The requested combination of flags (e.g. `direct` outside
    /// [`CellRaster`](crate::cell)) is not implemented by any path.
    Unimplemented,
    /// [`set_palette`](crate::driver::RasterDriver::set_palette) was called
    /// with a count other than 2, 5, or 17.
    BadPaletteCount,
}

impl RasterError {
    /// The historical numeric error code, for FFI-style bridges.
    ///
    /// `Ok` (code `0`) has no corresponding variant since it is represented
    /// by `Result::Ok` in this crate's API.
    pub fn as_code(self) -> i32 {
        match self {
            Self::UninitialisedObject => 1,
            Self::Overflow => 2,
            Self::NegativeHeight => 3,
            Self::InvalidOutline => 4,
            Self::InvalidMap => 5,
            Self::AntiAliasUnsupported => 6,
            Self::InvalidPool => 7,
            Self::Unimplemented => 8,
            Self::BadPaletteCount => 9,
        }
    }
}

impl fmt::Display for RasterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UninitialisedObject => write!(f, "raster was never reset with a pool"),
            Self::Overflow => write!(f, "render pool overflowed for the current band"),
            Self::NegativeHeight => write!(f, "a profile computed a negative scanline height"),
            Self::InvalidOutline => write!(f, "the outline is malformed or could not be banded"),
            Self::InvalidMap => write!(f, "the target bitmap is malformed"),
            Self::AntiAliasUnsupported => {
                write!(f, "anti-aliased rendering is not supported by this path")
            }
            Self::InvalidPool => write!(f, "the render pool is too small or misaligned"),
            Self::Unimplemented => write!(f, "the requested rendering mode is not implemented"),
            Self::BadPaletteCount => write!(f, "palette length must be 2, 5, or 17"),
        }
    }
}

impl std::error::Error for RasterError {}

pub type Result<T> = core::result::Result<T, RasterError>;
