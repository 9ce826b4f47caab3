//! Ingest Ring Buffer
//!
//! Single-producer single-consumer sample queue between the audio callback
//! and the analysis worker. The backing storage is allocated once for the
//! largest supported transform plus one slot; the logical capacity is an
//! atomic that reconfiguration shrinks or grows without ever reallocating,
//! so the producer side stays allocation-free for the engine's lifetime.
//!
//! Cursors are monotonic counters reduced modulo the capacity on access.
//! The producer owns the write cursor, the consumer owns the read cursor;
//! each publishes its own cursor with a release store and observes the
//! other's with an acquire load.
//!
//! # Safety
//!
//! The engine guarantees at most one producer (`push_block`) and one
//! consumer (`read_exact`) at a time, and calls `clear`/`set_capacity`
//! only while the producer is suppressed and the worker is parked between
//! chunks. Under those rules the producer writes only slots the consumer
//! has released and vice versa, so the `UnsafeCell` accesses never alias.

use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicUsize, Ordering};

use spectra_dsp::FftSize;

/// Backing slots: enough for the largest transform plus one.
const BACKING_SLOTS: usize = FftSize::S65536.samples() + 1;

pub struct IngestRing {
    backing: Box<[UnsafeCell<f32>]>,
    capacity: AtomicUsize,
    write_pos: AtomicUsize,
    read_pos: AtomicUsize,
}

unsafe impl Send for IngestRing {}
unsafe impl Sync for IngestRing {}

impl IngestRing {
    /// Allocate the full-size backing and set the logical capacity.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.clamp(2, BACKING_SLOTS);
        Self {
            backing: (0..BACKING_SLOTS)
                .map(|_| UnsafeCell::new(0.0))
                .collect::<Vec<_>>()
                .into_boxed_slice(),
            capacity: AtomicUsize::new(capacity),
            write_pos: AtomicUsize::new(0),
            read_pos: AtomicUsize::new(0),
        }
    }

    /// Samples queued for the consumer.
    pub fn available(&self) -> usize {
        let write = self.write_pos.load(Ordering::Acquire);
        let read = self.read_pos.load(Ordering::Acquire);
        write.wrapping_sub(read)
    }

    /// Samples the producer can still enqueue.
    pub fn free(&self) -> usize {
        let capacity = self.capacity.load(Ordering::Relaxed);
        (capacity - 1).saturating_sub(self.available())
    }

    pub fn capacity(&self) -> usize {
        self.capacity.load(Ordering::Relaxed)
    }

    /// Enqueue one block, summing `channel_count` source channels starting
    /// at `source_channel` into a mono stream.
    ///
    /// Producer side, safe to call from the audio callback: no allocation,
    /// no locks. When the free space cannot hold the whole block, or the
    /// channel range is out of bounds, the block is dropped and `false`
    /// returned.
    pub fn push_block(
        &self,
        channels: &[&[f32]],
        source_channel: usize,
        channel_count: usize,
    ) -> bool {
        if channel_count == 0 || source_channel + channel_count > channels.len() {
            return false;
        }
        let block_len = channels[source_channel].len();
        if block_len == 0 || self.free() < block_len {
            return false;
        }

        let capacity = self.capacity.load(Ordering::Relaxed);
        let write = self.write_pos.load(Ordering::Relaxed);

        for (offset, &sample) in channels[source_channel].iter().enumerate() {
            let idx = (write + offset) % capacity;
            unsafe { *self.backing[idx].get() = sample };
        }
        for channel in &channels[source_channel + 1..source_channel + channel_count] {
            for (offset, &sample) in channel.iter().take(block_len).enumerate() {
                let idx = (write + offset) % capacity;
                unsafe { *self.backing[idx].get() += sample };
            }
        }

        self.write_pos
            .store(write.wrapping_add(block_len), Ordering::Release);
        true
    }

    /// Dequeue exactly `out.len()` samples. Consumer side.
    ///
    /// Returns `false` without touching `out` when fewer samples are
    /// queued.
    pub fn read_exact(&self, out: &mut [f32]) -> bool {
        if self.available() < out.len() {
            return false;
        }

        let capacity = self.capacity.load(Ordering::Relaxed);
        let read = self.read_pos.load(Ordering::Relaxed);

        for (offset, slot) in out.iter_mut().enumerate() {
            let idx = (read + offset) % capacity;
            *slot = unsafe { *self.backing[idx].get() };
        }

        self.read_pos
            .store(read.wrapping_add(out.len()), Ordering::Release);
        true
    }

    /// Drop all queued samples. Control path only.
    pub fn clear(&self) {
        self.write_pos.store(0, Ordering::Release);
        self.read_pos.store(0, Ordering::Release);
    }

    /// Change the logical capacity. Control path only; the caller must
    /// have cleared the ring first.
    pub fn set_capacity(&self, capacity: usize) {
        debug_assert_eq!(self.available(), 0);
        self.capacity
            .store(capacity.clamp(2, BACKING_SLOTS), Ordering::Release);
    }
}
