//! The equalization engine.
//!
//! One orchestration path serves every image representation:
//! partition the rows, build a local histogram per worker, all-reduce the
//! histograms, build the identical LUT on every worker from the full-image
//! pixel count, remap each band, gather. What varies between the grayscale,
//! RGB-per-channel, YUV and HSL variants is only how the channel to be
//! equalized is extracted and reinserted, captured by [`LuminancePath`].

use std::sync::Arc;

use crate::cluster::{Collective, WorkerGroup};
use crate::color;
use crate::errors::Result;
use crate::histogram::Histogram;
use crate::planes::{GrayPlane, HslPlanes, RgbPlanes, YuvPlanes};
use crate::lut::Lut;
use crate::profiler::{timed, NullObserver, PipelineObserver, Stage, StageEvent};
use crate::schedule::Schedule;

/// How a color pass pulls the channel to equalize out of its local RGB
/// band and rebuilds the band afterwards.
///
/// Both directions are pure per-band transforms, so each worker runs them
/// independently over its own rows; nothing here crosses worker
/// boundaries.
pub trait LuminancePath: Send + Sync {
    /// The channels carried unchanged while the luminance is equalized.
    type Chroma: Send;

    /// Pass label used in observer events.
    const PASS: &'static str;

    fn split(&self, band: &RgbPlanes, schedule: &Schedule) -> (Self::Chroma, Vec<u8>);

    fn merge(&self, chroma: Self::Chroma, luma: Vec<u8>, schedule: &Schedule) -> RgbPlanes;
}

/// Equalize the luma channel of the YUV form.
pub struct YuvPath;

impl LuminancePath for YuvPath {
    type Chroma = YuvPlanes;
    const PASS: &'static str = "yuv";

    fn split(&self, band: &RgbPlanes, schedule: &Schedule) -> (YuvPlanes, Vec<u8>) {
        let mut yuv = color::rgb_to_yuv(band, schedule);
        let luma = std::mem::take(&mut yuv.y);
        (yuv, luma)
    }

    fn merge(&self, mut chroma: YuvPlanes, luma: Vec<u8>, schedule: &Schedule) -> RgbPlanes {
        chroma.y = luma;
        color::yuv_to_rgb(&chroma, schedule)
    }
}

/// Equalize the lightness channel of the HSL form.
pub struct HslPath;

impl LuminancePath for HslPath {
    type Chroma = HslPlanes;
    const PASS: &'static str = "hsl";

    fn split(&self, band: &RgbPlanes, schedule: &Schedule) -> (HslPlanes, Vec<u8>) {
        let mut hsl = color::rgb_to_hsl(band, schedule);
        let lightness = std::mem::take(&mut hsl.l);
        (hsl, lightness)
    }

    fn merge(&self, mut chroma: HslPlanes, luma: Vec<u8>, schedule: &Schedule) -> RgbPlanes {
        chroma.l = luma;
        color::hsl_to_rgb(&chroma, schedule)
    }
}

/// Distributed histogram-equalization pipeline over a fixed worker count.
///
/// The worker count changes only the execution path, never the numbers: a
/// run with eight workers produces byte-identical output to a
/// single-worker run on the same image.
pub struct Pipeline {
    workers: usize,
    schedule: Schedule,
    observer: Arc<dyn PipelineObserver>,
}

impl Pipeline {
    /// A pipeline with the given worker count, the schedule taken from the
    /// environment, and no observer.
    pub fn new(workers: usize) -> Self {
        Self {
            workers,
            schedule: Schedule::from_env(),
            observer: Arc::new(NullObserver),
        }
    }

    pub fn with_schedule(mut self, schedule: Schedule) -> Self {
        self.schedule = schedule;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn PipelineObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Equalize a grayscale image; the whole image is the channel.
    pub fn enhance_gray(&self, img: &GrayPlane) -> Result<GrayPlane> {
        let group = WorkerGroup::new(img.width, img.height, self.workers)?;
        let total = img.pixel_count() as u64;

        let (data, elapsed) = timed(|| self.run_channel_pass(&group, "gray", &img.data, total));
        let data = data?;
        self.observer.pass_completed("gray", group.size(), elapsed);
        GrayPlane::new(img.width, img.height, data)
    }

    /// Equalize each of R, G and B independently, each channel with its
    /// own histogram and LUT.
    pub fn enhance_rgb(&self, img: &RgbPlanes) -> Result<RgbPlanes> {
        let group = WorkerGroup::new(img.width, img.height, self.workers)?;
        let total = img.pixel_count() as u64;

        let (channels, elapsed) = timed(|| -> Result<_> {
            let r = self.run_channel_pass(&group, "rgb", &img.r, total)?;
            let g = self.run_channel_pass(&group, "rgb", &img.g, total)?;
            let b = self.run_channel_pass(&group, "rgb", &img.b, total)?;
            Ok((r, g, b))
        });
        let (r, g, b) = channels?;
        self.observer.pass_completed("rgb", group.size(), elapsed);
        RgbPlanes::new(img.width, img.height, r, g, b)
    }

    /// Equalize the luma channel after an RGB -> YUV conversion.
    pub fn enhance_yuv(&self, img: &RgbPlanes) -> Result<RgbPlanes> {
        self.enhance_color(img, &YuvPath)
    }

    /// Equalize the lightness channel after an RGB -> HSL conversion.
    pub fn enhance_hsl(&self, img: &RgbPlanes) -> Result<RgbPlanes> {
        self.enhance_color(img, &HslPath)
    }

    fn enhance_color<P: LuminancePath>(&self, img: &RgbPlanes, path: &P) -> Result<RgbPlanes> {
        let group = WorkerGroup::new(img.width, img.height, self.workers)?;
        let total = img.pixel_count() as u64;
        tracing::debug!(
            pass = P::PASS,
            workers = group.size(),
            pixels = total,
            "color enhancement pass"
        );

        let (planes, elapsed) = timed(|| {
            group.run(|coll| {
                let rank = coll.rank();
                let part = *coll.partition();

                let (band, d) = timed(|| {
                    RgbPlanes::new(
                        img.width,
                        part.rows,
                        coll.scatter(&img.r),
                        coll.scatter(&img.g),
                        coll.scatter(&img.b),
                    )
                });
                let band = band?;
                self.emit(P::PASS, Stage::Scatter, rank, d);

                let ((chroma, luma), d) = timed(|| path.split(&band, &self.schedule));
                self.emit(P::PASS, Stage::ColorForward, rank, d);

                let equalized = self.equalize_band(coll, P::PASS, &luma, total)?;

                let (out, d) = timed(|| path.merge(chroma, equalized, &self.schedule));
                self.emit(P::PASS, Stage::ColorBackward, rank, d);

                Ok(vec![out.r, out.g, out.b])
            })
        });
        let mut planes = planes?.into_iter();
        let (r, g, b) = match (planes.next(), planes.next(), planes.next()) {
            (Some(r), Some(g), Some(b)) => (r, g, b),
            _ => unreachable!("every worker returns three channels"),
        };
        self.observer.pass_completed(P::PASS, group.size(), elapsed);
        RgbPlanes::new(img.width, img.height, r, g, b)
    }

    /// One full distributed pass over a single byte channel.
    fn run_channel_pass(
        &self,
        group: &WorkerGroup,
        pass: &'static str,
        plane: &[u8],
        total: u64,
    ) -> Result<Vec<u8>> {
        tracing::debug!(pass, workers = group.size(), pixels = total, "channel pass");
        let planes = group.run(|coll| {
            let rank = coll.rank();
            let (band, d) = timed(|| coll.scatter(plane));
            self.emit(pass, Stage::Scatter, rank, d);

            let out = self.equalize_band(coll, pass, &band, total)?;
            Ok(vec![out])
        })?;
        let mut planes = planes.into_iter();
        match planes.next() {
            Some(out) => Ok(out),
            None => unreachable!("every worker returns one channel"),
        }
    }

    /// The per-worker core shared by every representation:
    /// local histogram, all-reduce, LUT from the full-image total, remap.
    fn equalize_band(
        &self,
        coll: &Collective,
        pass: &'static str,
        band: &[u8],
        total: u64,
    ) -> Result<Vec<u8>> {
        let rank = coll.rank();

        // Sequential by contract: the bins belong to this worker alone
        let (local, d) = timed(|| Histogram::of(band));
        self.emit(pass, Stage::LocalHistogram, rank, d);

        let (combined, d) = timed(|| coll.all_reduce(&local));
        self.emit(pass, Stage::ReduceHistogram, rank, d);

        // Every rank builds from the identical combined histogram and the
        // same total, so a degenerate image fails all workers alike and
        // never strands the barrier.
        let (lut, d) = timed(|| Lut::build(&combined, total));
        let lut = lut?;
        self.emit(pass, Stage::BuildLut, rank, d);

        let (out, d) = timed(|| lut.remap(band, &self.schedule));
        self.emit(pass, Stage::Remap, rank, d);
        Ok(out)
    }

    fn emit(&self, pass: &'static str, stage: Stage, rank: usize, duration: std::time::Duration) {
        self.observer.stage_completed(&StageEvent {
            pass,
            stage,
            rank,
            duration,
        });
    }
}
