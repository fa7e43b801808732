//! Planar image buffers used by the equalization pipeline.
//!
//! Everything is 8 bits per channel and channel-separated: a color image is
//! three index-aligned byte planes rather than interleaved pixels, which is
//! what the row partitioner and the scatter/gather steps address. The HSL
//! and YUV forms only live for the duration of a color enhancement pass.

use crate::errors::{EqualizeError, Result};

/// Single-channel 8-bit image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrayPlane {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl GrayPlane {
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        check_shape(width, height, data.len())?;
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn from_luma(img: &image::GrayImage) -> Self {
        Self {
            width: img.width(),
            height: img.height(),
            data: img.as_raw().clone(),
        }
    }

    pub fn into_luma(self) -> image::GrayImage {
        // Shape was validated on construction
        image::GrayImage::from_raw(self.width, self.height, self.data)
            .expect("plane length matches dimensions")
    }
}

/// Color image as three index-aligned byte planes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RgbPlanes {
    pub width: u32,
    pub height: u32,
    pub r: Vec<u8>,
    pub g: Vec<u8>,
    pub b: Vec<u8>,
}

impl RgbPlanes {
    pub fn new(width: u32, height: u32, r: Vec<u8>, g: Vec<u8>, b: Vec<u8>) -> Result<Self> {
        check_shape(width, height, r.len())?;
        check_shape(width, height, g.len())?;
        check_shape(width, height, b.len())?;
        Ok(Self {
            width,
            height,
            r,
            g,
            b,
        })
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Deinterleave an `image` crate RGB image into planes.
    pub fn from_rgb(img: &image::RgbImage) -> Self {
        let n = img.width() as usize * img.height() as usize;
        let mut r = Vec::with_capacity(n);
        let mut g = Vec::with_capacity(n);
        let mut b = Vec::with_capacity(n);
        for px in img.pixels() {
            r.push(px[0]);
            g.push(px[1]);
            b.push(px[2]);
        }
        Self {
            width: img.width(),
            height: img.height(),
            r,
            g,
            b,
        }
    }

    /// Reinterleave the planes back into an `image` crate RGB image.
    pub fn into_rgb(self) -> image::RgbImage {
        let mut raw = Vec::with_capacity(self.r.len() * 3);
        for i in 0..self.r.len() {
            raw.push(self.r[i]);
            raw.push(self.g[i]);
            raw.push(self.b[i]);
        }
        image::RgbImage::from_raw(self.width, self.height, raw)
            .expect("plane length matches dimensions")
    }
}

/// Transient HSL form of a color image. Hue and saturation stay in
/// [0.0, 1.0]; lightness is quantized to a byte so it can be histogrammed.
#[derive(Debug, Clone)]
pub struct HslPlanes {
    pub width: u32,
    pub height: u32,
    pub h: Vec<f32>,
    pub s: Vec<f32>,
    pub l: Vec<u8>,
}

/// Transient YUV form of a color image, all channels in [0, 255].
#[derive(Debug, Clone)]
pub struct YuvPlanes {
    pub width: u32,
    pub height: u32,
    pub y: Vec<u8>,
    pub u: Vec<u8>,
    pub v: Vec<u8>,
}

fn check_shape(width: u32, height: u32, actual: usize) -> Result<()> {
    if actual != width as usize * height as usize {
        return Err(EqualizeError::ShapeMismatch {
            width,
            height,
            actual,
        });
    }
    Ok(())
}
