//! # Output Staging Buffer
//!
//! A reusable byte region holding the most recent conversion output
//! before it is copied into the caller's destination.
//!
//! ## Growth Policy
//!
//! Capacity is tracked in frames (samples-per-channel) for a fixed
//! bytes-per-frame and only ever grows. It is reallocated exactly when
//! a pending conversion's upper-bound output size exceeds the current
//! capacity; old contents are discarded on growth, which is safe
//! because conversion output is produced fresh on every read and never
//! persists across calls. Allocation is lazy: a session that never
//! produces output never allocates.

use crate::error::{ReaderError, Result};
use crate::format::PcmFormat;
use tracing::debug;

/// Grow-only staging buffer for packed PCM bytes.
#[derive(Debug, Default)]
pub struct StagingBuffer {
    bytes: Vec<u8>,
    capacity_frames: usize,
}

impl StagingBuffer {
    /// Create an empty buffer. No storage is allocated until the first
    /// call to [`ensure_frames`](Self::ensure_frames).
    pub fn new() -> Self {
        Self::default()
    }

    /// Grow the buffer so it can hold at least `frames` frames of
    /// `bytes_per_frame` bytes each. A request at or below the current
    /// capacity is a no-op; the buffer never shrinks.
    ///
    /// Allocation failure is propagated as [`ReaderError::Allocation`]
    /// rather than aborting the process.
    pub fn ensure_frames(&mut self, frames: usize, bytes_per_frame: usize) -> Result<()> {
        if frames <= self.capacity_frames {
            return Ok(());
        }

        let needed_bytes = frames * bytes_per_frame;
        let additional = needed_bytes.saturating_sub(self.bytes.len());
        if additional > 0 {
            self.bytes
                .try_reserve_exact(additional)
                .map_err(|e| ReaderError::Allocation(format!("staging buffer: {e}")))?;
        }

        debug!(
            old_frames = self.capacity_frames,
            new_frames = frames,
            bytes = needed_bytes,
            "grew staging buffer"
        );
        self.capacity_frames = frames;
        Ok(())
    }

    /// Current capacity in frames. Monotonically non-decreasing across
    /// the owning session's lifetime.
    pub fn capacity_frames(&self) -> usize {
        self.capacity_frames
    }

    /// Discard the previous conversion output. Capacity is retained.
    pub fn reset(&mut self) {
        self.bytes.clear();
    }

    /// Pack interleaved normalized f32 samples into the buffer, appending
    /// them in the target representation.
    pub fn pack_samples(&mut self, samples: &[f32], format: &PcmFormat) {
        debug_assert!(
            self.bytes.len() + samples.len() * format.bytes_per_sample <= self.bytes.capacity(),
            "staging write exceeds reserved capacity"
        );
        for &sample in samples {
            format.write_sample(sample, &mut self.bytes);
        }
    }

    /// The packed bytes of the most recent conversion.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}
