//! Row-wise domain decomposition.
//!
//! An image is split into contiguous, non-overlapping bands of whole rows,
//! one band per worker, covering every row exactly once. Remainder rows are
//! spread round-robin over the first `height % workers` bands instead of
//! being piled onto the last worker, so no band is more than one row larger
//! than any other.

use crate::errors::{EqualizeError, Result};

/// One worker's share of the image, in both row and sample coordinates.
///
/// The sample fields are what scatter/gather use to address a worker's
/// slice inside a full-size plane: `samples` pixels starting at
/// `sample_offset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Partition {
    pub rank: usize,
    pub row_offset: u32,
    pub rows: u32,
    pub sample_offset: usize,
    pub samples: usize,
}

impl Partition {
    /// Borrow this worker's slice out of a full-size plane.
    pub fn slice_of<'a, T>(&self, plane: &'a [T]) -> &'a [T] {
        &plane[self.sample_offset..self.sample_offset + self.samples]
    }
}

/// Compute the band layout for `workers` workers over a `width` x `height`
/// image.
///
/// Fails when `workers` is zero or exceeds the row count: a worker with
/// zero rows would contribute nothing but still participate in every
/// collective, so the configuration is rejected up front.
pub fn layout(width: u32, height: u32, workers: usize) -> Result<Vec<Partition>> {
    if workers == 0 {
        return Err(EqualizeError::NoWorkers);
    }
    if workers as u64 > height as u64 {
        return Err(EqualizeError::TooManyWorkers {
            workers,
            rows: height,
        });
    }

    let base = height / workers as u32;
    let remainder = height % workers as u32;

    let mut parts = Vec::with_capacity(workers);
    let mut row = 0u32;
    for rank in 0..workers {
        let rows = if (rank as u32) < remainder { base + 1 } else { base };
        let samples = rows as usize * width as usize;
        parts.push(Partition {
            rank,
            row_offset: row,
            rows,
            sample_offset: row as usize * width as usize,
            samples,
        });
        row += rows;
    }

    log::debug!(
        "partitioned {}x{} image into {} bands ({} rows base, {} remainder)",
        width,
        height,
        workers,
        base,
        remainder
    );
    Ok(parts)
}

/// Per-worker (sample count, displacement) pairs, the addressing info a
/// scatter or gather needs over a full-size plane.
pub fn counts_and_displacements(parts: &[Partition]) -> (Vec<usize>, Vec<usize>) {
    let counts = parts.iter().map(|p| p.samples).collect();
    let displs = parts.iter().map(|p| p.sample_offset).collect();
    (counts, displs)
}
