//! Distributed histogram equalization for 8-bit raster images.
//!
//! Contrast enhancement over a row-partitioned image: a fixed group of
//! worker threads each histogram their own band, an all-reduce combines
//! the counts into one global histogram, every worker derives the same
//! lookup table from it, remaps its band and the bands are gathered back
//! into the full image. Color images go through the same pipeline on
//! their luminance channel via RGB<->HSL or RGB<->YUV transforms, or
//! channel by channel.
//!
//! The entry point is [`Pipeline`]:
//!
//! ```
//! use histeq::{GrayPlane, Pipeline};
//!
//! let img = GrayPlane::new(2, 2, vec![10, 10, 200, 90]).unwrap();
//! let enhanced = Pipeline::new(2).enhance_gray(&img).unwrap();
//! assert_eq!(enhanced.data.len(), 4);
//! ```
//!
//! Pixel buffers come in and go out as planar byte buffers (with
//! conversions to and from the `image` crate's types); decoding and
//! encoding raster files is the caller's business.

pub mod cluster;
pub mod color;
pub mod engine;
pub mod errors;
pub mod histogram;
pub mod logging;
pub mod lut;
pub mod partition;
pub mod planes;
pub mod profiler;
pub mod schedule;

#[cfg(test)]
mod tests;

pub use engine::{HslPath, LuminancePath, Pipeline, YuvPath};
pub use errors::{EqualizeError, Result};
pub use histogram::Histogram;
pub use lut::Lut;
pub use planes::{GrayPlane, HslPlanes, RgbPlanes, YuvPlanes};
pub use profiler::{
    LogObserver, NullObserver, PipelineObserver, RecordingObserver, Stage, StageEvent,
};
pub use schedule::{Schedule, SchedulePolicy};
