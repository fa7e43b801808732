//! Cross-module pipeline scenarios.

use crate::histogram::Histogram;
use crate::lut::Lut;
use crate::planes::{GrayPlane, RgbPlanes};
use crate::profiler::RecordingObserver;
use crate::schedule::{Schedule, SchedulePolicy};
use crate::Pipeline;
use std::sync::Arc;

fn textured_gray(width: u32, height: u32) -> GrayPlane {
    let n = (width * height) as usize;
    let data: Vec<u8> = (0..n).map(|i| ((i * 37 + i / 5) % 256) as u8).collect();
    GrayPlane::new(width, height, data).unwrap()
}

fn textured_rgb(width: u32, height: u32) -> RgbPlanes {
    let n = (width * height) as usize;
    RgbPlanes::new(
        width,
        height,
        (0..n).map(|i| ((i * 37) % 256) as u8).collect(),
        (0..n).map(|i| ((i * 101 + 17) % 256) as u8).collect(),
        (0..n).map(|i| ((i * 13 + 200) % 256) as u8).collect(),
    )
    .unwrap()
}

#[test]
fn four_pixel_image_is_invariant_to_worker_count() {
    // [0, 0, 128, 255] as a one-column image: two workers get rows
    // {0,1} and {2,3}, and the split must not change a single byte of
    // the result relative to the single-worker run.
    let img = GrayPlane::new(1, 4, vec![0, 0, 128, 255]).unwrap();

    let single = Pipeline::new(1).enhance_gray(&img).unwrap();
    let double = Pipeline::new(2).enhance_gray(&img).unwrap();
    let quad = Pipeline::new(4).enhance_gray(&img).unwrap();

    assert_eq!(single.data, vec![0, 0, 128, 255]);
    assert_eq!(double.data, single.data);
    assert_eq!(quad.data, single.data);
}

#[test]
fn gray_pipeline_matches_direct_lut_application() {
    // The distributed machinery must reduce to plain
    // histogram -> LUT -> remap over the whole image.
    let img = textured_gray(31, 17);
    let hist = Histogram::of(&img.data);
    let lut = Lut::build(&hist, img.pixel_count() as u64).unwrap();
    let expected: Vec<u8> = img.data.iter().map(|&v| lut.map(v)).collect();

    for workers in [1, 2, 5, 17] {
        let out = Pipeline::new(workers).enhance_gray(&img).unwrap();
        assert_eq!(out.data, expected, "workers = {}", workers);
    }
}

#[test]
fn worker_count_never_changes_color_results() {
    // 13 rows across 4 workers leaves a remainder, so this also covers
    // the uneven band layout.
    let img = textured_rgb(9, 13);
    let reference = Pipeline::new(1);

    let rgb_1 = reference.enhance_rgb(&img).unwrap();
    let yuv_1 = reference.enhance_yuv(&img).unwrap();
    let hsl_1 = reference.enhance_hsl(&img).unwrap();

    for workers in [2, 4, 13] {
        let pipeline = Pipeline::new(workers);
        assert_eq!(pipeline.enhance_rgb(&img).unwrap(), rgb_1);
        assert_eq!(pipeline.enhance_yuv(&img).unwrap(), yuv_1);
        assert_eq!(pipeline.enhance_hsl(&img).unwrap(), hsl_1);
    }
}

#[test]
fn schedule_policy_never_changes_results() {
    let img = textured_gray(40, 25);
    let reference = Pipeline::new(2).enhance_gray(&img).unwrap();

    for policy in [
        SchedulePolicy::Static,
        SchedulePolicy::Dynamic,
        SchedulePolicy::Guided,
        SchedulePolicy::Auto,
    ] {
        for chunk in [None, Some(1), Some(7), Some(100_000)] {
            let out = Pipeline::new(2)
                .with_schedule(Schedule::new(policy, chunk))
                .enhance_gray(&img)
                .unwrap();
            assert_eq!(out.data, reference.data, "{:?} chunk {:?}", policy, chunk);
        }
    }
}

#[test]
fn uniform_color_image_fails_the_luminance_passes() {
    // A single flat color has a single-valued luminance channel, which
    // leaves the LUT denominator at zero
    let n = 64;
    let img = RgbPlanes::new(8, 8, vec![90; n], vec![90; n], vec![90; n]).unwrap();

    for workers in [1, 2] {
        let pipeline = Pipeline::new(workers);
        assert_eq!(
            pipeline.enhance_yuv(&img).unwrap_err().error_code(),
            "DEGENERATE_HISTOGRAM"
        );
        assert_eq!(
            pipeline.enhance_hsl(&img).unwrap_err().error_code(),
            "DEGENERATE_HISTOGRAM"
        );
        assert_eq!(
            pipeline.enhance_rgb(&img).unwrap_err().error_code(),
            "DEGENERATE_HISTOGRAM"
        );
    }
}

#[test]
fn equalization_spreads_a_compressed_gradient() {
    // A narrow band of intensities should stretch toward the full range
    let data: Vec<u8> = (0..1000).map(|i| 100 + (i % 40) as u8).collect();
    let img = GrayPlane::new(40, 25, data).unwrap();
    let out = Pipeline::new(4).enhance_gray(&img).unwrap();

    let max = out.data.iter().copied().max().unwrap();
    let min = out.data.iter().copied().min().unwrap();
    assert_eq!(max, 255);
    assert!(min < 20);
}

#[test]
fn enhancement_returns_a_fresh_image() {
    let img = textured_gray(10, 10);
    let before = img.data.clone();
    let out = Pipeline::new(2).enhance_gray(&img).unwrap();
    assert_eq!(img.data, before);
    assert_ne!(out.data, before);
}

#[test]
fn observer_reconstructs_per_pass_timings() {
    let observer = Arc::new(RecordingObserver::new());
    let pipeline = Pipeline::new(2).with_observer(observer.clone());
    let img = textured_rgb(12, 8);

    pipeline.enhance_hsl(&img).unwrap();
    pipeline.enhance_yuv(&img).unwrap();

    let passes = observer.completed_passes();
    assert_eq!(passes.len(), 2);
    assert_eq!(passes[0].0, "hsl");
    assert_eq!(passes[1].0, "yuv");

    // Both color passes converted on every worker
    for pass in ["hsl", "yuv"] {
        let stats = observer
            .stage_stats(pass, crate::profiler::Stage::ColorForward)
            .unwrap();
        assert_eq!(stats.count, 2);
    }
}

#[test]
fn image_crate_interop_round_trip() {
    let img = image::GrayImage::from_fn(16, 16, |x, y| image::Luma([(x * 16 + y) as u8]));
    let plane = GrayPlane::from_luma(&img);
    let out = Pipeline::new(2).enhance_gray(&plane).unwrap().into_luma();
    assert_eq!(out.dimensions(), (16, 16));
}
