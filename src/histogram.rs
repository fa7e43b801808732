//! Intensity histograms over 256 levels.

/// Number of intensity levels in an 8-bit channel.
pub const LEVELS: usize = 256;

/// Frequency count of intensity values over 256 bins.
///
/// Accumulation is strictly sequential: a histogram is only ever filled by
/// the single thread that owns it. Cross-thread combination goes through
/// [`Histogram::merge`], never through shared bin increments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Histogram {
    bins: [u64; LEVELS],
}

impl Default for Histogram {
    fn default() -> Self {
        Self { bins: [0; LEVELS] }
    }
}

impl Histogram {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count the samples of one buffer.
    pub fn of(samples: &[u8]) -> Self {
        let mut hist = Self::new();
        hist.accumulate(samples);
        hist
    }

    /// Fold a buffer of samples into the existing counts.
    pub fn accumulate(&mut self, samples: &[u8]) {
        for &v in samples {
            self.bins[v as usize] += 1;
        }
    }

    /// Element-wise sum, the reduction step that combines per-worker
    /// histograms into the global one.
    pub fn merge(&mut self, other: &Histogram) {
        for (bin, &count) in self.bins.iter_mut().zip(other.bins.iter()) {
            *bin += count;
        }
    }

    pub fn count(&self, level: u8) -> u64 {
        self.bins[level as usize]
    }

    /// Total number of samples counted.
    pub fn total(&self) -> u64 {
        self.bins.iter().sum()
    }

    /// Count held by the first non-empty bin, scanning upward from level 0.
    /// `None` when the histogram is empty.
    pub fn first_nonzero(&self) -> Option<u64> {
        self.bins.iter().copied().find(|&c| c > 0)
    }

    pub fn bins(&self) -> &[u64; LEVELS] {
        &self.bins
    }

    pub fn clear(&mut self) {
        self.bins = [0; LEVELS];
    }
}
