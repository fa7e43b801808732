//! Lookup-table construction from a cumulative distribution.

use crate::errors::{EqualizeError, Result};
use crate::histogram::{Histogram, LEVELS};
use crate::schedule::Schedule;

/// Precomputed mapping from input intensity to equalized output intensity.
///
/// Built once per pass from the combined histogram; read-only afterwards,
/// so any number of threads may apply it concurrently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lut {
    table: [u8; LEVELS],
}

impl Lut {
    /// Derive the table from a histogram and the normalization target
    /// `total`.
    ///
    /// `total` must be the pixel count of the entire image, not of the
    /// local partition: the histogram passed here is the globally combined
    /// one, and every worker has to derive the identical table from it.
    ///
    /// `lut[i] = round((cdf(i) - min) * 255 / (total - min))`, where `min`
    /// is the count in the first non-empty bin. A histogram with no samples
    /// or with `total - min <= 0` (a single-intensity image) has no usable
    /// distribution and is rejected.
    pub fn build(hist: &Histogram, total: u64) -> Result<Self> {
        let min = hist.first_nonzero().ok_or(EqualizeError::EmptyHistogram)?;
        if total <= min {
            return Err(EqualizeError::DegenerateHistogram { total });
        }
        let d = (total - min) as f64;

        let mut table = [0u8; LEVELS];
        let mut cdf = 0u64;
        for (i, &count) in hist.bins().iter().enumerate() {
            cdf += count;
            let level = ((cdf as f64 - min as f64) * 255.0 / d + 0.5) as i64;
            table[i] = level.clamp(0, 255) as u8;
        }
        Ok(Self { table })
    }

    #[inline]
    pub fn map(&self, v: u8) -> u8 {
        self.table[v as usize]
    }

    pub fn table(&self) -> &[u8; LEVELS] {
        &self.table
    }

    /// Remap a buffer through the table into a fresh output buffer,
    /// thread-parallel under the given schedule.
    pub fn remap(&self, input: &[u8], schedule: &Schedule) -> Vec<u8> {
        let mut out = vec![0u8; input.len()];
        schedule.for_each_chunk(input.len(), &mut out, |offset, out_chunk| {
            for (j, slot) in out_chunk.iter_mut().enumerate() {
                *slot = self.table[input[offset + j] as usize];
            }
        });
        out
    }
}
