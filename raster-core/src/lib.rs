#![forbid(unsafe_code)]

//! Scan-line conversion of vector glyph outlines into bitmaps and coverage
//! spans: a from-scratch port of the classic profile/sweep rasterizer,
//! generalized to also expose a direct cell-based coverage path.

pub mod bezier;
pub mod bitmap;
pub mod cell;
pub mod driver;
pub mod error;
pub mod gray;
pub mod outline;
pub mod pool;
pub mod profile;
pub mod sweep;

pub use bitmap::{Bitmap, PixelFormat};
pub use cell::{Span, SpanSink};
pub use driver::{RasterDriver, RasterParams, RenderFlags, RenderTarget};
pub use error::{RasterError, Result};
pub use gray::GrayPalette;
pub use outline::{Outline, OutlineFlags, OutlineSink, Tag};
pub use pool::RenderPool;
pub use sweep::DropOutMode;
