//! Inner-loop thread scheduling.
//!
//! Elementwise stages (color transforms, LUT application) run across a
//! rayon pool in chunks whose size is steered by a policy picked up from
//! the environment, mirroring `schedule(runtime)` semantics: the policy
//! changes throughput only, never results.

use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use std::env;

/// Environment variable holding the schedule, e.g. `dynamic,4096`.
pub const SCHEDULE_ENV: &str = "HISTEQ_SCHEDULE";

const DEFAULT_DYNAMIC_CHUNK: usize = 4096;

lazy_static::lazy_static! {
    static ref COMPUTE_POOL: rayon::ThreadPool = {
        ThreadPoolBuilder::new()
            .num_threads(num_cpus::get())
            .thread_name(|i| format!("histeq-compute-{}", i))
            .build()
            .expect("Failed to create compute thread pool")
    };
}

/// How elementwise loops are carved into chunks for the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SchedulePolicy {
    /// One equal chunk per thread.
    #[default]
    Static,
    /// Many small fixed-size chunks, claimed as threads free up.
    Dynamic,
    /// Fewer, larger chunks than dynamic; a middle ground.
    Guided,
    /// Leave the split to the pool.
    Auto,
}

impl SchedulePolicy {
    /// Parse a policy name, falling back to the default on anything
    /// unrecognized. Configuration noise should not kill a run.
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "static" => Self::Static,
            "dynamic" => Self::Dynamic,
            "guided" => Self::Guided,
            "auto" => Self::Auto,
            other => {
                log::warn!(
                    "unknown schedule policy '{}', falling back to static",
                    other
                );
                Self::Static
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Static => "static",
            Self::Dynamic => "dynamic",
            Self::Guided => "guided",
            Self::Auto => "auto",
        }
    }
}

/// A scheduling policy plus an optional explicit chunk size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Schedule {
    pub policy: SchedulePolicy,
    pub chunk: Option<usize>,
}

impl Schedule {
    pub fn new(policy: SchedulePolicy, chunk: Option<usize>) -> Self {
        Self { policy, chunk }
    }

    /// Read the schedule from [`SCHEDULE_ENV`], format `policy[,chunk]`.
    /// Missing variable or malformed chunk degrade to defaults.
    pub fn from_env() -> Self {
        match env::var(SCHEDULE_ENV) {
            Ok(raw) => Self::parse(&raw),
            Err(_) => Self::default(),
        }
    }

    pub fn parse(raw: &str) -> Self {
        let mut parts = raw.splitn(2, ',');
        let policy = SchedulePolicy::parse(parts.next().unwrap_or(""));
        let chunk = parts.next().and_then(|c| match c.trim().parse::<usize>() {
            Ok(n) if n > 0 => Some(n),
            _ => {
                log::warn!("ignoring invalid chunk size '{}' in schedule", c.trim());
                None
            }
        });
        Self { policy, chunk }
    }

    /// Chunk length for a loop over `total` elements. Always at least 1.
    pub fn chunk_len(&self, total: usize) -> usize {
        let threads = COMPUTE_POOL.current_num_threads().max(1);
        let len = match (self.policy, self.chunk) {
            (_, Some(chunk)) => chunk,
            (SchedulePolicy::Static, None) => total.div_ceil(threads),
            (SchedulePolicy::Dynamic, None) => DEFAULT_DYNAMIC_CHUNK,
            (SchedulePolicy::Guided, None) => total.div_ceil(threads * 4),
            (SchedulePolicy::Auto, None) => total.div_ceil(threads * 2),
        };
        len.max(1)
    }

    /// Run a closure inside the shared compute pool.
    pub fn install<R: Send>(&self, op: impl FnOnce() -> R + Send) -> R {
        COMPUTE_POOL.install(op)
    }

    /// Drive an output buffer in parallel chunks. The closure receives the
    /// chunk's offset into the buffer and the chunk itself.
    pub fn for_each_chunk<T, F>(&self, total: usize, out: &mut [T], op: F)
    where
        T: Send,
        F: Fn(usize, &mut [T]) + Send + Sync,
    {
        let chunk = self.chunk_len(total);
        COMPUTE_POOL.install(|| {
            out.par_chunks_mut(chunk)
                .enumerate()
                .for_each(|(ci, slice)| op(ci * chunk, slice));
        });
    }
}
