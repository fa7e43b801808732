//! Timing instrumentation as an external observer.
//!
//! The engine never keeps timing state of its own; it hands timestamped
//! stage events to whatever observer the caller plugs in. A benchmarking
//! harness can rebuild per-phase wall-clock tables from these events
//! without the pipeline knowing it is being watched.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Pipeline stages, in execution order within a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Scatter,
    ColorForward,
    LocalHistogram,
    ReduceHistogram,
    BuildLut,
    Remap,
    ColorBackward,
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Scatter => "scatter",
            Stage::ColorForward => "color_forward",
            Stage::LocalHistogram => "local_histogram",
            Stage::ReduceHistogram => "reduce_histogram",
            Stage::BuildLut => "build_lut",
            Stage::Remap => "remap",
            Stage::ColorBackward => "color_backward",
        }
    }
}

/// One completed stage on one worker.
#[derive(Debug, Clone)]
pub struct StageEvent {
    /// Which enhancement pass produced the event ("gray", "rgb", "yuv", "hsl").
    pub pass: &'static str,
    pub stage: Stage,
    pub rank: usize,
    pub duration: Duration,
}

/// Receives timestamped events from the engine. Called from worker
/// threads, so implementations must be thread-safe.
pub trait PipelineObserver: Send + Sync {
    fn stage_completed(&self, _event: &StageEvent) {}

    /// The whole pass finished and the output image is assembled.
    fn pass_completed(&self, _pass: &'static str, _workers: usize, _duration: Duration) {}
}

/// Discards every event.
#[derive(Debug, Default)]
pub struct NullObserver;

impl PipelineObserver for NullObserver {}

/// Forwards events to the `log` facade.
#[derive(Debug, Default)]
pub struct LogObserver;

impl PipelineObserver for LogObserver {
    fn stage_completed(&self, event: &StageEvent) {
        log::debug!(
            "{}: worker {} finished {} in {:.3}ms",
            event.pass,
            event.rank,
            event.stage.name(),
            event.duration.as_secs_f64() * 1000.0
        );
    }

    fn pass_completed(&self, pass: &'static str, workers: usize, duration: Duration) {
        log::info!(
            "{} pass completed across {} workers in {:.3}ms",
            pass,
            workers,
            duration.as_secs_f64() * 1000.0
        );
    }
}

/// Collects events for later inspection, with simple aggregate stats.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    stages: Mutex<HashMap<(&'static str, Stage), Vec<Duration>>>,
    passes: Mutex<Vec<(&'static str, Duration)>>,
}

#[derive(Debug, Clone)]
pub struct StageStats {
    pub count: usize,
    pub total_time: Duration,
    pub average_time: Duration,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stage_stats(&self, pass: &'static str, stage: Stage) -> Option<StageStats> {
        let stages = self
            .stages
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let samples = stages.get(&(pass, stage))?;
        if samples.is_empty() {
            return None;
        }
        let total: Duration = samples.iter().sum();
        Some(StageStats {
            count: samples.len(),
            total_time: total,
            average_time: total / samples.len() as u32,
        })
    }

    pub fn completed_passes(&self) -> Vec<(&'static str, Duration)> {
        self.passes
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl PipelineObserver for RecordingObserver {
    fn stage_completed(&self, event: &StageEvent) {
        self.stages
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .entry((event.pass, event.stage))
            .or_default()
            .push(event.duration);
    }

    fn pass_completed(&self, pass: &'static str, _workers: usize, duration: Duration) {
        self.passes
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push((pass, duration));
    }
}

/// Time a closure, returning its result alongside the elapsed wall clock.
pub fn timed<R>(f: impl FnOnce() -> R) -> (R, Duration) {
    let start = Instant::now();
    let result = f();
    (result, start.elapsed())
}
