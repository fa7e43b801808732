//! Fixed-size worker group with collective operations.
//!
//! One worker thread per partition, communicating only through three
//! collectives: a scatter that hands each worker its slice of the full
//! planes, an all-reduce that sums per-worker histograms into one combined
//! histogram visible to every worker, and a gather that splices per-worker
//! output slices back into full planes at the coordinator. Workers never
//! share mutable state outside those steps.

use std::sync::mpsc;
use std::sync::{Barrier, Mutex};
use std::thread;

use crate::errors::{EqualizeError, Result};
use crate::histogram::Histogram;
use crate::partition::{self, Partition};

/// The per-worker handle to the group's collectives.
pub struct Collective<'g> {
    partition: Partition,
    partitions: &'g [Partition],
    barrier: &'g Barrier,
    reduce_slot: &'g Mutex<Histogram>,
}

impl Collective<'_> {
    pub fn rank(&self) -> usize {
        self.partition.rank
    }

    pub fn size(&self) -> usize {
        self.partitions.len()
    }

    pub fn partition(&self) -> &Partition {
        &self.partition
    }

    /// Scatter: copy this worker's slice out of a full-size plane. Only the
    /// coordinator materializes the full plane; each worker owns its copy
    /// afterwards.
    pub fn scatter(&self, full_plane: &[u8]) -> Vec<u8> {
        self.partition.slice_of(full_plane).to_vec()
    }

    /// All-reduce: element-wise sum of every worker's local histogram.
    ///
    /// Acts as a barrier: no worker gets the combined histogram back until
    /// every worker has folded its local counts in.
    pub fn all_reduce(&self, local: &Histogram) -> Histogram {
        {
            let mut slot = self
                .reduce_slot
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            slot.merge(local);
        }
        self.barrier.wait();

        let combined = self
            .reduce_slot
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone();

        // Everyone must have taken their copy before the slot is cleared
        // for the next reduction.
        self.barrier.wait();
        if self.partition.rank == 0 {
            self.reduce_slot
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .clear();
        }
        self.barrier.wait();

        combined
    }
}

/// A fixed set of cooperating workers over one image's partition layout.
///
/// Membership is decided at construction and never changes; a failing
/// worker aborts the whole run.
pub struct WorkerGroup {
    width: u32,
    height: u32,
    partitions: Vec<Partition>,
}

impl WorkerGroup {
    pub fn new(width: u32, height: u32, workers: usize) -> Result<Self> {
        let partitions = partition::layout(width, height, workers)?;
        Ok(Self {
            width,
            height,
            partitions,
        })
    }

    pub fn size(&self) -> usize {
        self.partitions.len()
    }

    pub fn partitions(&self) -> &[Partition] {
        &self.partitions
    }

    /// Run one pipeline pass: spawn a thread per worker, execute `work` on
    /// each, and gather the returned output slices into full-size planes.
    ///
    /// `work` returns one output slice per channel, each of exactly the
    /// partition's sample count. The gather writes every worker's slices
    /// into disjoint regions of the coordinator's output planes, so no
    /// locking is needed beyond the result channel itself.
    pub fn run<W>(&self, work: W) -> Result<Vec<Vec<u8>>>
    where
        W: Fn(&Collective) -> Result<Vec<Vec<u8>>> + Send + Sync,
    {
        let barrier = Barrier::new(self.partitions.len());
        let reduce_slot = Mutex::new(Histogram::new());
        let (tx, rx) = mpsc::channel::<(usize, Result<Vec<Vec<u8>>>)>();

        let joined: Vec<(usize, thread::Result<()>)> = thread::scope(|scope| {
            let mut handles = Vec::with_capacity(self.partitions.len());
            for &part in &self.partitions {
                let tx = tx.clone();
                let work = &work;
                let barrier = &barrier;
                let reduce_slot = &reduce_slot;
                let partitions = self.partitions.as_slice();

                let handle = thread::Builder::new()
                    .name(format!("histeq-worker-{}", part.rank))
                    .spawn_scoped(scope, move || {
                        let collective = Collective {
                            partition: part,
                            partitions,
                            barrier,
                            reduce_slot,
                        };
                        let result = work(&collective);
                        // The coordinator may have bailed out already; a
                        // dead receiver is not this worker's problem
                        let _ = tx.send((part.rank, result));
                    })
                    .expect("Failed to spawn worker thread");
                handles.push((part.rank, handle));
            }
            handles
                .into_iter()
                .map(|(rank, handle)| (rank, handle.join()))
                .collect()
        });
        drop(tx);

        for (rank, joined) in joined {
            if joined.is_err() {
                return Err(EqualizeError::WorkerPanic { rank });
            }
        }

        // Gather: splice each worker's slices into the full planes
        let total = self.width as usize * self.height as usize;
        let mut planes: Vec<Vec<u8>> = Vec::new();
        let mut received = 0usize;
        for (rank, result) in rx.iter() {
            let slices = result?;
            let part = self.partitions[rank];
            if planes.is_empty() {
                planes = vec![vec![0u8; total]; slices.len()];
            }
            for (plane, slice) in planes.iter_mut().zip(slices) {
                debug_assert_eq!(slice.len(), part.samples);
                plane[part.sample_offset..part.sample_offset + part.samples]
                    .copy_from_slice(&slice);
            }
            received += 1;
            if received == self.partitions.len() {
                break;
            }
        }
        Ok(planes)
    }
}
