//! Analysis Worker
//!
//! The background thread that drains the ingest ring. Whenever a full
//! transform-size chunk is queued it windows the chunk, runs the magnitude
//! transform and folds the resulting frame into the averaging buffer;
//! otherwise it parks on the wake channel with a short timeout so shutdown
//! is always observed even when the producer goes quiet.
//!
//! Reconfiguration never talks to the worker directly: the control path
//! raises the suspend flag and takes the DSP mutex, which serializes with
//! any drain already in flight.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError};
use tracing::debug;

use crate::engine::EngineShared;

/// How long the worker parks before re-checking shutdown on its own.
pub(crate) const WAKE_TIMEOUT: Duration = Duration::from_millis(100);

pub(crate) fn run(shared: Arc<EngineShared>, wake: Receiver<()>) {
    debug!("analysis worker started");

    while !shared.shutdown.load(Ordering::Acquire) {
        if drain_one(&shared) {
            continue;
        }
        match wake.recv_timeout(WAKE_TIMEOUT) {
            Ok(()) | Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    shared.done.store(true, Ordering::Release);
    debug!("analysis worker stopped");
}

/// Process at most one chunk. Returns `false` when there is nothing to do.
fn drain_one(shared: &EngineShared) -> bool {
    if shared.suspended.load(Ordering::Acquire) {
        return false;
    }

    let mut dsp = shared.dsp.lock();
    let samples = dsp.size.samples();
    let bins = dsp.size.bins();
    if shared.ring.available() < samples {
        return false;
    }

    let state = &mut *dsp;
    let chunk = &mut state.chunk[..samples];
    if !shared.ring.read_exact(chunk) {
        return false;
    }

    state.window.apply(chunk);
    let frame = &mut state.frame[..bins];
    state.plans.magnitude_transform(state.size, chunk, frame);

    shared.averager.lock().push_frame(frame);
    shared.new_data.store(true, Ordering::Release);
    true
}
